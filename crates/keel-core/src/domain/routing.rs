//! Route rewriting.
//!
//! A [`RouteResolver`] holds an ordered list of rewrite rules compiled
//! against a [`PlaceholderTable`]. Resolution joins the incoming segments
//! with `/`, tries each rule anchored at both ends, and applies the first
//! match's replacement. Later rules sharing a prefix with an earlier rule
//! are simply unreachable; nothing detects that.
//!
//! ```text
//! replace: {:alpha} => [a-zA-Z]+
//! rewrite: index/{:alpha} => index/main/$1
//!
//! ["index", "hello"]  ──►  ["index", "main", "hello"]
//! ```

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// One rewrite rule: `from` is a pattern template, `to` a replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    pub from: String,
    pub to: String,
}

impl RouteRule {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Mapping of `{:name}` tokens to regular-expression fragments.
///
/// Each placeholder contributes exactly one capture group to the expanded
/// pattern: fragments that are not already a single enclosing capture group
/// are wrapped in one, so `$1` always refers to the first placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceholderTable(BTreeMap<String, String>);

impl PlaceholderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The commonly used tokens.
    pub fn standard() -> Self {
        let mut table = Self::new();
        for (token, fragment) in [
            ("{:action}", "[a-z-]+"),
            ("{:alpha}", "[a-zA-Z]+"),
            ("{:alnum}", "[a-zA-Z0-9]+"),
            ("{:controller}", "[a-z-]+"),
            ("{:digit}", "[0-9]+"),
            ("{:param}", "[^/]+"),
            ("{:params}", ".*"),
            ("{:slug}", "[a-zA-Z0-9-]+"),
            ("{:word}", "[a-zA-Z0-9_]+"),
        ] {
            table.0.insert(token.into(), fragment.into());
        }
        table
    }

    /// Add or replace a token.
    pub fn insert(
        &mut self,
        token: impl Into<String>,
        fragment: impl Into<String>,
    ) -> Result<(), DomainError> {
        let token = token.into();
        if !is_token(&token) {
            return Err(DomainError::InvalidPlaceholder { token });
        }
        self.0.insert(token, fragment.into());
        Ok(())
    }

    /// Merge `other` on top of this table.
    pub fn extend(&mut self, other: &PlaceholderTable) {
        self.0
            .extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.0.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Substitute every known token in `pattern` with its fragment.
    pub fn expand(&self, pattern: &str) -> String {
        self.0
            .iter()
            .fold(pattern.to_owned(), |acc, (token, fragment)| {
                if acc.contains(token.as_str()) {
                    acc.replace(token.as_str(), &as_capture_group(fragment))
                } else {
                    acc
                }
            })
    }

    /// Reject malformed token names.
    pub fn validate(&self) -> Result<(), DomainError> {
        match self.0.keys().find(|token| !is_token(token)) {
            Some(token) => Err(DomainError::InvalidPlaceholder {
                token: token.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn is_token(token: &str) -> bool {
    token.len() > 3 && token.starts_with("{:") && token.ends_with('}')
}

/// Wrap `fragment` in a capture group unless it already is exactly one.
fn as_capture_group(fragment: &str) -> String {
    if is_single_capture_group(fragment) {
        fragment.to_owned()
    } else {
        format!("({fragment})")
    }
}

fn is_single_capture_group(fragment: &str) -> bool {
    let bytes = fragment.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'(' || bytes[bytes.len() - 1] != b')' {
        return false;
    }
    if fragment.starts_with("(?") {
        return false;
    }

    // The opening paren must close at the very last byte.
    let mut depth = 0usize;
    let mut escaped = false;
    let mut in_class = false;
    for (i, &b) in bytes.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' => escaped = true,
            b'[' if !in_class => in_class = true,
            b']' if in_class => in_class = false,
            b'(' if !in_class => depth += 1,
            b')' if !in_class => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i != bytes.len() - 1 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Convert `$1`, `${1}` and `\1` back-references to the `${1}` form the
/// regex crate expects; any other `$` is taken literally.
fn normalize_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len() + 4);
    let mut chars = replacement.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '$' | '\\' if chars.peek().is_some_and(char::is_ascii_digit) => {
                let mut digits = String::new();
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    digits.push(d);
                    chars.next();
                }
                out.push_str(&format!("${{{digits}}}"));
            }
            '$' if chars.peek() == Some(&'{') => {
                // Already braced; copy through verbatim up to the brace.
                out.push('$');
                for b in chars.by_ref() {
                    out.push(b);
                    if b == '}' {
                        break;
                    }
                }
            }
            '$' => out.push_str("$$"),
            other => out.push(other),
        }
    }

    out
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: RouteRule,
    pattern: Regex,
    replacement: String,
}

/// Ordered rewrite rules, compiled once at startup.
#[derive(Debug, Clone, Default)]
pub struct RouteResolver {
    rules: Vec<CompiledRule>,
}

impl RouteResolver {
    /// A resolver with no rules; every path passes through unchanged.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile `rules` in order, expanding placeholders from `placeholders`.
    pub fn new<I>(rules: I, placeholders: &PlaceholderTable) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = RouteRule>,
    {
        placeholders.validate()?;

        let rules = rules
            .into_iter()
            .map(|rule| {
                let expanded = placeholders.expand(rule.from.trim_matches('/'));
                let anchored = format!("^{}$", expanded.trim_matches('/'));
                let pattern =
                    Regex::new(&anchored).map_err(|e| DomainError::InvalidRoutePattern {
                        pattern: rule.from.clone(),
                        reason: e.to_string(),
                    })?;
                let replacement = normalize_replacement(rule.to.trim_matches('/'));
                Ok(CompiledRule {
                    rule,
                    pattern,
                    replacement,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The rule that would rewrite `segments`, if any.
    pub fn matching_rule(&self, segments: &[String]) -> Option<&RouteRule> {
        let candidate = candidate(segments);
        self.rules
            .iter()
            .find(|r| r.pattern.is_match(&candidate))
            .map(|r| &r.rule)
    }

    /// Rewrite `segments` with the first matching rule.
    ///
    /// Returns the input unchanged when no rule matches. A rewrite that
    /// produces an empty path yields a single empty segment.
    pub fn resolve(&self, segments: &[String]) -> Vec<String> {
        let candidate = candidate(segments);

        for compiled in &self.rules {
            if compiled.pattern.is_match(&candidate) {
                let rewritten = compiled
                    .pattern
                    .replace(&candidate, compiled.replacement.as_str());
                tracing::debug!(
                    from = %compiled.rule.from,
                    to = %compiled.rule.to,
                    path = %candidate,
                    rewritten = %rewritten,
                    "route rewritten"
                );
                return rewritten
                    .trim_matches('/')
                    .split('/')
                    .map(str::to_owned)
                    .collect();
            }
        }

        segments.to_vec()
    }
}

fn candidate(segments: &[String]) -> String {
    segments.join("/").trim_matches('/').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(path: &str) -> Vec<String> {
        path.split('/').map(str::to_owned).collect()
    }

    fn alpha_table() -> PlaceholderTable {
        let mut table = PlaceholderTable::new();
        table.insert("{:alpha}", "[a-zA-Z]+").unwrap();
        table
    }

    #[test]
    fn rewrites_with_placeholder_backreference() {
        let resolver = RouteResolver::new(
            [RouteRule::new("index/{:alpha}", "index/main/$1")],
            &alpha_table(),
        )
        .unwrap();

        assert_eq!(
            resolver.resolve(&segs("index/hello")),
            ["index", "main", "hello"]
        );
    }

    #[test]
    fn no_match_returns_input_unchanged() {
        let resolver = RouteResolver::new(
            [RouteRule::new("index/{:alpha}", "index/main/$1")],
            &alpha_table(),
        )
        .unwrap();

        let input = segs("blog/show/42/");
        assert_eq!(resolver.resolve(&input), input);
        assert!(resolver.matching_rule(&input).is_none());
    }

    #[test]
    fn first_matching_rule_wins() {
        let table = PlaceholderTable::standard();
        let resolver = RouteResolver::new(
            [
                RouteRule::new("/news/{:digit}/", "/article/show/$1/"),
                RouteRule::new("news/{:param}", "article/search/$1"),
            ],
            &table,
        )
        .unwrap();

        assert_eq!(resolver.resolve(&segs("news/7")), ["article", "show", "7"]);
        assert_eq!(
            resolver.resolve(&segs("news/rust")),
            ["article", "search", "rust"]
        );
    }

    #[test]
    fn rewritten_paths_do_not_rematch_earlier_rules() {
        let table = PlaceholderTable::standard();
        let rules = vec![
            RouteRule::new("blah", "index/main"),
            RouteRule::new("index/{:alpha}", "index/main/$1"),
            RouteRule::new("p/{:digit}", "page/show/$1"),
        ];
        let resolver = RouteResolver::new(rules.clone(), &table).unwrap();

        for input in ["blah", "index/hello", "p/12"] {
            let input = segs(input);
            let winner = resolver.matching_rule(&input).unwrap().clone();
            let winner_index = rules.iter().position(|r| *r == winner).unwrap();

            let rewritten = resolver.resolve(&input);
            let earlier = RouteResolver::new(rules[..winner_index].to_vec(), &table).unwrap();
            assert!(earlier.matching_rule(&rewritten).is_none());
        }
    }

    #[test]
    fn resolve_is_pure() {
        let resolver = RouteResolver::new(
            [RouteRule::new("index/{:alpha}", "index/main/$1")],
            &alpha_table(),
        )
        .unwrap();
        let input = segs("index/world");
        assert_eq!(resolver.resolve(&input), resolver.resolve(&input));
    }

    #[test]
    fn empty_rewrite_yields_single_blank_segment() {
        let resolver =
            RouteResolver::new([RouteRule::new("home", "/")], &PlaceholderTable::new()).unwrap();
        assert_eq!(resolver.resolve(&segs("home")), [""]);
    }

    #[test]
    fn already_grouped_fragments_are_not_double_wrapped() {
        let mut table = PlaceholderTable::new();
        table.insert("{:digit}", "([0-9]+)").unwrap();
        table.insert("{:slug}", "[a-z-]+").unwrap();

        let resolver = RouteResolver::new(
            [RouteRule::new("post/{:digit}/{:slug}", "post/show/$1/$2")],
            &table,
        )
        .unwrap();

        assert_eq!(
            resolver.resolve(&segs("post/12/hello-world")),
            ["post", "show", "12", "hello-world"]
        );
    }

    #[test]
    fn capture_group_detection() {
        assert!(is_single_capture_group("([0-9]+)"));
        assert!(is_single_capture_group("([()]+)"));
        assert!(!is_single_capture_group("(a)|(b)"));
        assert!(!is_single_capture_group("(?:ab)"));
        assert!(!is_single_capture_group("[a-z]+"));
    }

    #[test]
    fn replacement_normalization() {
        assert_eq!(normalize_replacement("a/$1"), "a/${1}");
        assert_eq!(normalize_replacement("a/$1b"), "a/${1}b");
        assert_eq!(normalize_replacement("a/\\2"), "a/${2}");
        assert_eq!(normalize_replacement("a/${3}"), "a/${3}");
        assert_eq!(normalize_replacement("cost/$"), "cost/$$");
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = RouteResolver::new([RouteRule::new("bad/(", "x")], &PlaceholderTable::new())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRoutePattern { .. }));
    }

    #[test]
    fn invalid_token_is_rejected() {
        let mut table = PlaceholderTable::new();
        assert!(table.insert("alpha", "[a-z]+").is_err());
    }
}
