//! HTTP-like response accumulated during dispatch.

use serde::Serialize;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const LOCATION: &str = "Location";

/// Status, ordered headers and body handed back to the caller.
///
/// Header names compare case-insensitively. Setting an existing header
/// replaces its value in place, keeping its original position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, code: u16) {
        self.status = code;
    }

    /// Set `name` to `value`, overwriting any previous value.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        let index = self
            .headers
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))?;
        Some(self.headers.remove(index).1)
    }

    /// Headers in the order they were first set.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    pub fn take_body(&mut self) -> String {
        std::mem::take(&mut self.body)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status) && self.has_header(LOCATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_200_and_empty() {
        let r = Response::new();
        assert_eq!(r.status(), 200);
        assert_eq!(r.body(), "");
        assert_eq!(r.headers().count(), 0);
    }

    #[test]
    fn set_header_overwrites_in_place() {
        let mut r = Response::new();
        r.set_header("X-One", "1");
        r.set_header("Content-Type", "text/plain");
        r.set_header("content-type", "application/json");

        let headers: Vec<_> = r.headers().collect();
        assert_eq!(
            headers,
            [("X-One", "1"), ("Content-Type", "application/json")]
        );
    }

    #[test]
    fn header_lookup_ignores_case() {
        let mut r = Response::new();
        r.set_header("Location", "/home");
        assert_eq!(r.header("location"), Some("/home"));
        assert!(r.has_header("LOCATION"));
    }

    #[test]
    fn remove_header_returns_value() {
        let mut r = Response::new();
        r.set_header("X-Gone", "bye");
        assert_eq!(r.remove_header("x-gone").as_deref(), Some("bye"));
        assert!(!r.has_header("X-Gone"));
    }

    #[test]
    fn redirect_needs_status_and_location() {
        let mut r = Response::new();
        r.set_status(302);
        assert!(!r.is_redirect());
        r.set_header(LOCATION, "/x");
        assert!(r.is_redirect());
    }
}
