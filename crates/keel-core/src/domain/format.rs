//! Output formats and their content types.
//!
//! A format is a short tag (`json`, `xml`, `rss`, ...) that picks both the
//! template variant (`show.json.tpl`) and the `Content-Type` header.

use crate::domain::error::DomainError;

/// Content type used when no format was requested.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html";

/// Format tag → MIME type.
pub const FORMAT_TYPES: &[(&str, &str)] = &[
    ("atom", "application/atom+xml"),
    ("css", "text/css"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("js", "text/javascript"),
    ("json", "application/json"),
    ("pdf", "application/pdf"),
    ("ps", "application/postscript"),
    ("rdf", "application/rdf+xml"),
    ("rss", "application/rss+xml"),
    ("rss2", "application/rss+xml"),
    ("rtf", "application/rtf"),
    ("text", "text/plain"),
    ("txt", "text/plain"),
    ("xhtml", "application/xhtml+xml"),
    ("xml", "application/xml"),
];

/// MIME type for `format`; `None` maps to [`DEFAULT_CONTENT_TYPE`].
pub fn content_type(format: Option<&str>) -> Option<&'static str> {
    match format {
        None => Some(DEFAULT_CONTENT_TYPE),
        Some(tag) => FORMAT_TYPES
            .iter()
            .find(|(known, _)| *known == tag)
            .map(|(_, mime)| *mime),
    }
}

pub fn is_known(tag: &str) -> bool {
    FORMAT_TYPES.iter().any(|(known, _)| *known == tag)
}

/// Checked conversion for formats set explicitly by application code.
pub fn validate(tag: &str) -> Result<(), DomainError> {
    if is_known(tag) {
        Ok(())
    } else {
        Err(DomainError::UnknownFormat(tag.to_owned()))
    }
}

/// Split a known format suffix off `segment`: `42.json` → (`42`, `json`).
///
/// Unknown suffixes are left in place so that values such as `v1.2` pass
/// through untouched.
pub fn split_suffix(segment: &str) -> Option<(&str, &str)> {
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || !is_known(ext) {
        return None;
    }
    Some((stem, ext))
}

/// `value` followed by `; charset=<charset>` when a charset is configured.
pub fn with_charset(mime: &str, charset: Option<&str>) -> String {
    match charset {
        Some(charset) if !charset.is_empty() => format!("{mime}; charset={charset}"),
        _ => mime.to_owned(),
    }
}
