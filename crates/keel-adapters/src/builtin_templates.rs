//! Views every controller can fall back on.
//!
//! These live under [`BUILTIN_VIEW_DIR`], the last directory of each
//! controller's search stack, so an application only needs to provide
//! them when it wants different markup.

use keel_core::application::BUILTIN_VIEW_DIR;

const ERROR_LIST: &str = r#"<div class="error">
{{#if errors}}
    <ul>
    {{#each errors}}
        <li>{{this}}</li>
    {{/each}}
    </ul>
{{else}}
    <p>No errors.</p>
{{/if}}
</div>"#;

const NOT_FOUND: &str = r#"<h1>Not Found</h1>
<p>The requested page could not be found.</p>
{{> errors}}"#;

const EXCEPTION: &str = r#"<h1>Error</h1>
<p>An unexpected error occurred while handling the request.</p>
{{> errors}}"#;

const ERROR: &str = r#"<h1>Error</h1>
{{> errors}}"#;

const NOT_FOUND_JSON: &str = r#"{"status": 404, "errors": {{json errors}}}"#;

const EXCEPTION_JSON: &str = r#"{"status": 500, "errors": {{json errors}}}"#;

const ERROR_JSON: &str = r#"{"errors": {{json errors}}}"#;

/// `(file, source)` for every built-in view, file names relative to
/// [`BUILTIN_VIEW_DIR`].
const VIEWS: &[(&str, &str)] = &[
    ("notFound.tpl", NOT_FOUND),
    ("notFound.json.tpl", NOT_FOUND_JSON),
    ("exception.tpl", EXCEPTION),
    ("exception.json.tpl", EXCEPTION_JSON),
    ("error.tpl", ERROR),
    ("error.json.tpl", ERROR_JSON),
];

/// Built-in views as `(path, source)` pairs ready for a template store.
///
/// The `{{> errors}}` include is expanded here so renderers never need
/// partial support.
pub fn all() -> impl Iterator<Item = (String, String)> {
    VIEWS.iter().map(|(file, source)| {
        (
            format!("{BUILTIN_VIEW_DIR}/{file}"),
            source.replace("{{> errors}}", ERROR_LIST),
        )
    })
}

/// Number of built-in views.
pub fn count() -> usize {
    VIEWS.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_live_under_builtin_dir() {
        let paths: Vec<_> = all().map(|(path, _)| path).collect();
        assert_eq!(paths.len(), count());
        assert!(paths.contains(&"keel/controller/view/notFound.tpl".to_string()));
        assert!(paths.contains(&"keel/controller/view/exception.json.tpl".to_string()));
    }

    #[test]
    fn error_list_is_inlined() {
        for (path, source) in all() {
            assert!(!source.contains("{{>"), "{path} still has an include");
        }
        let (_, not_found) = all()
            .find(|(path, _)| path.ends_with("notFound.tpl"))
            .unwrap();
        assert!(not_found.contains("{{#each errors}}"));
    }
}
