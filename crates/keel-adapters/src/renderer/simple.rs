//! Mustache-style renderer for view and layout templates.
//!
//! Supported tags:
//!
//! | Tag                              | Output                                  |
//! |----------------------------------|-----------------------------------------|
//! | `{{ name }}`, `{{ post.title }}` | HTML-escaped value                      |
//! | `{{{ name }}}`                   | value without escaping                  |
//! | `{{json name}}`                  | value as JSON                           |
//! | `{{#each items}}…{{/each}}`      | body per element (`this`, `@index`, `@key`) |
//! | `{{#if flag}}…{{else}}…{{/if}}`  | body when the value is truthy           |
//! | `{{! comment }}`                 | nothing                                 |
//!
//! Missing variables render as empty text. Unclosed or mismatched tags are
//! rendering errors.

use serde_json::Value;
use tracing::instrument;

use keel_core::{
    application::{ApplicationError, ports::TemplateRenderer},
    domain::ViewState,
    error::KeelResult,
};

/// Renderer for `{{ }}` templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleRenderer;

impl SimpleRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateRenderer for SimpleRenderer {
    #[instrument(skip_all, fields(template = name))]
    fn render(&self, name: &str, source: &str, vars: &ViewState) -> KeelResult<String> {
        let failed = |reason: String| ApplicationError::RenderingFailed {
            reason: format!("{name}: {reason}"),
        };

        let tokens = tokenize(source).map_err(failed)?;
        let nodes = Parser::new(tokens).document().map_err(failed)?;

        let mut out = String::with_capacity(source.len());
        Scope::root(vars).write(&nodes, &mut out);
        Ok(out)
    }
}

// ── Tokens ────────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum Token<'s> {
    Text(&'s str),
    /// Contents of `{{ … }}`, trimmed.
    Tag(&'s str),
    /// Contents of `{{{ … }}}`, trimmed.
    Raw(&'s str),
}

fn tokenize(source: &str) -> Result<Vec<Token<'_>>, String> {
    let mut tokens = Vec::new();
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            tokens.push(Token::Text(&rest[..start]));
        }
        let offset = source.len() - rest.len() + start;
        let after = &rest[start..];

        let (token, consumed) = if let Some(inner) = after.strip_prefix("{{{") {
            let end = inner
                .find("}}}")
                .ok_or_else(|| format!("unclosed '{{{{{{' at byte {offset}"))?;
            (Token::Raw(inner[..end].trim()), 3 + end + 3)
        } else {
            let inner = &after[2..];
            let end = inner
                .find("}}")
                .ok_or_else(|| format!("unclosed '{{{{' at byte {offset}"))?;
            (Token::Tag(inner[..end].trim()), 2 + end + 2)
        };

        tokens.push(token);
        rest = &after[consumed..];
    }

    if !rest.is_empty() {
        tokens.push(Token::Text(rest));
    }
    Ok(tokens)
}

// ── Syntax tree ───────────────────────────────────────────────────────────────

#[derive(Debug)]
enum Node<'s> {
    Text(&'s str),
    Var { path: &'s str, escape: bool },
    Json(&'s str),
    Each {
        path: &'s str,
        body: Vec<Node<'s>>,
        otherwise: Vec<Node<'s>>,
    },
    If {
        path: &'s str,
        then: Vec<Node<'s>>,
        otherwise: Vec<Node<'s>>,
    },
}

/// What stopped a block.
enum End<'s> {
    Eof,
    Else,
    Close(&'s str),
}

struct Parser<'s> {
    tokens: std::vec::IntoIter<Token<'s>>,
}

impl<'s> Parser<'s> {
    fn new(tokens: Vec<Token<'s>>) -> Self {
        Self {
            tokens: tokens.into_iter(),
        }
    }

    fn document(mut self) -> Result<Vec<Node<'s>>, String> {
        match self.block()? {
            (nodes, End::Eof) => Ok(nodes),
            (_, End::Else) => Err("'{{else}}' outside of a block".into()),
            (_, End::Close(name)) => Err(format!("unexpected '{{{{/{name}}}}}'")),
        }
    }

    fn block(&mut self) -> Result<(Vec<Node<'s>>, End<'s>), String> {
        let mut nodes = Vec::new();

        while let Some(token) = self.tokens.next() {
            match token {
                Token::Text(text) => nodes.push(Node::Text(text)),
                Token::Raw(path) => nodes.push(Node::Var {
                    path,
                    escape: false,
                }),
                Token::Tag("else") => return Ok((nodes, End::Else)),
                Token::Tag(tag) => {
                    if let Some(name) = tag.strip_prefix('/') {
                        return Ok((nodes, End::Close(name.trim())));
                    }
                    if let Some(helper) = tag.strip_prefix('#') {
                        nodes.push(self.helper(helper.trim())?);
                    } else if let Some(path) = tag.strip_prefix("json ") {
                        nodes.push(Node::Json(path.trim()));
                    } else if !tag.starts_with('!') {
                        nodes.push(Node::Var {
                            path: tag,
                            escape: true,
                        });
                    }
                }
            }
        }

        Ok((nodes, End::Eof))
    }

    /// Parse `#each path` / `#if path` through its closing tag.
    fn helper(&mut self, tag: &'s str) -> Result<Node<'s>, String> {
        let (kind, path) = tag.split_once(char::is_whitespace).unwrap_or((tag, ""));
        let path = path.trim();
        if kind != "each" && kind != "if" {
            return Err(format!("unknown block helper '#{kind}'"));
        }
        if path.is_empty() {
            return Err(format!("'#{kind}' needs a variable"));
        }

        let (body, end) = self.block()?;
        let (otherwise, end) = match end {
            End::Else => self.block()?,
            other => (Vec::new(), other),
        };

        match end {
            End::Close(name) if name == kind => {}
            End::Close(name) => {
                return Err(format!("'#{kind}' closed by '/{name}'"));
            }
            End::Else => return Err(format!("second '{{{{else}}}}' in '#{kind}'")),
            End::Eof => return Err(format!("unclosed '#{kind} {path}'")),
        }

        Ok(if kind == "each" {
            Node::Each {
                path,
                body,
                otherwise,
            }
        } else {
            Node::If {
                path,
                then: body,
                otherwise,
            }
        })
    }
}

// ── Evaluation ────────────────────────────────────────────────────────────────

/// Variables visible while rendering: the view state plus the current
/// `#each` element, if any.
struct Scope<'v> {
    vars: &'v ViewState,
    item: Option<Item<'v>>,
    parent: Option<&'v Scope<'v>>,
}

#[derive(Clone, Copy)]
struct Item<'v> {
    value: &'v Value,
    index: usize,
    key: Option<&'v str>,
}

impl<'v> Scope<'v> {
    fn root(vars: &'v ViewState) -> Self {
        Self {
            vars,
            item: None,
            parent: None,
        }
    }

    fn lookup(&self, path: &str) -> Option<Value> {
        if let Some(item) = self.item {
            match path {
                "@index" => return Some(Value::from(item.index)),
                "@key" => return item.key.map(Value::from),
                "this" | "." => return Some(item.value.clone()),
                _ => {}
            }
            if let Some(rest) = path.strip_prefix("this.") {
                return walk(item.value, rest).cloned();
            }
            let first = path.split('.').next().unwrap_or(path);
            if let Value::Object(map) = item.value {
                if map.contains_key(first) {
                    return walk(item.value, path).cloned();
                }
            }
        }
        match self.parent {
            Some(parent) => parent.lookup(path),
            None => self.vars.lookup(path).cloned(),
        }
    }

    fn child<'c>(&'c self, item: Item<'c>) -> Scope<'c>
    where
        'v: 'c,
    {
        Scope {
            vars: self.vars,
            item: Some(item),
            parent: Some(self),
        }
    }

    fn write(&self, nodes: &[Node<'_>], out: &mut String) {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Var { path, escape } => {
                    let text = display(self.lookup(path).as_ref());
                    if *escape {
                        escape_html(&text, out);
                    } else {
                        out.push_str(&text);
                    }
                }
                Node::Json(path) => {
                    let value = self.lookup(path).unwrap_or(Value::Null);
                    out.push_str(&value.to_string());
                }
                Node::If {
                    path,
                    then,
                    otherwise,
                } => {
                    if truthy(self.lookup(path).as_ref()) {
                        self.write(then, out);
                    } else {
                        self.write(otherwise, out);
                    }
                }
                Node::Each {
                    path,
                    body,
                    otherwise,
                } => {
                    let value = self.lookup(path);
                    if !truthy(value.as_ref()) {
                        self.write(otherwise, out);
                        continue;
                    }
                    match value.as_ref() {
                        Some(Value::Array(items)) => {
                            for (index, value) in items.iter().enumerate() {
                                let item = Item {
                                    value,
                                    index,
                                    key: None,
                                };
                                self.child(item).write(body, out);
                            }
                        }
                        Some(Value::Object(map)) => {
                            for (index, (key, value)) in map.iter().enumerate() {
                                let item = Item {
                                    value,
                                    index,
                                    key: Some(key.as_str()),
                                };
                                self.child(item).write(body, out);
                            }
                        }
                        Some(scalar) => {
                            let item = Item {
                                value: scalar,
                                index: 0,
                                key: None,
                            };
                            self.child(item).write(body, out);
                        }
                        None => {}
                    }
                }
            }
        }
    }
}

fn walk<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |value, part| match value {
        Value::Object(map) => map.get(part),
        Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

fn display(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn escape_html(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::error::KeelError;
    use serde_json::json;

    fn render(source: &str, vars: &[(&str, Value)]) -> KeelResult<String> {
        let mut state = ViewState::new();
        for (key, value) in vars {
            state.assign(*key, value.clone());
        }
        SimpleRenderer::new().render("test.tpl", source, &state)
    }

    // ── variables ─────────────────────────────────────────────────────────

    #[test]
    fn substitutes_and_escapes() {
        let out = render("Hi {{ name }}!", &[("name", json!("<b>Al & Bo</b>"))]).unwrap();
        assert_eq!(out, "Hi &lt;b&gt;Al &amp; Bo&lt;/b&gt;!");
    }

    #[test]
    fn triple_braces_skip_escaping() {
        let out = render("{{{ body }}}", &[("body", json!("<p>x</p>"))]).unwrap();
        assert_eq!(out, "<p>x</p>");
    }

    #[test]
    fn missing_variable_is_empty() {
        assert_eq!(render("[{{ nope }}]", &[]).unwrap(), "[]");
    }

    #[test]
    fn dotted_paths_and_numbers() {
        let vars = [("post", json!({"title": "Hello", "tags": ["a", "b"], "views": 3}))];
        let out = render("{{post.title}} {{post.tags.1}} {{post.views}}", &vars).unwrap();
        assert_eq!(out, "Hello b 3");
    }

    #[test]
    fn json_tag_serialises_value() {
        let out = render("{{json errors}}", &[("errors", json!(["a", "b\"c"]))]).unwrap();
        assert_eq!(out, r#"["a","b\"c"]"#);
        assert_eq!(render("{{json missing}}", &[]).unwrap(), "null");
    }

    #[test]
    fn comments_render_nothing() {
        assert_eq!(render("a{{! note }}b", &[]).unwrap(), "ab");
    }

    // ── blocks ────────────────────────────────────────────────────────────

    #[test]
    fn each_over_array_with_index() {
        let out = render(
            "{{#each items}}{{@index}}={{this}};{{/each}}",
            &[("items", json!(["x", "y"]))],
        )
        .unwrap();
        assert_eq!(out, "0=x;1=y;");
    }

    #[test]
    fn each_over_objects_sees_fields_and_outer_vars() {
        let vars = [
            ("posts", json!([{"title": "A"}, {"title": "B"}])),
            ("site", json!("S")),
        ];
        let out = render("{{#each posts}}{{title}}@{{site}} {{/each}}", &vars).unwrap();
        assert_eq!(out, "A@S B@S ");
    }

    #[test]
    fn each_else_runs_for_empty_list() {
        let source = "{{#each items}}x{{else}}none{{/each}}";
        assert_eq!(render(source, &[("items", json!([]))]).unwrap(), "none");
    }

    #[test]
    fn if_else_follows_truthiness() {
        let source = "{{#if flag}}yes{{else}}no{{/if}}";
        assert_eq!(render(source, &[("flag", json!(true))]).unwrap(), "yes");
        assert_eq!(render(source, &[("flag", json!(0))]).unwrap(), "no");
        assert_eq!(render(source, &[("flag", json!(""))]).unwrap(), "no");
        assert_eq!(render(source, &[]).unwrap(), "no");
        assert_eq!(render(source, &[("flag", json!(["x"]))]).unwrap(), "yes");
    }

    #[test]
    fn nested_blocks() {
        let source = "{{#if items}}<ul>{{#each items}}<li>{{this}}</li>{{/each}}</ul>{{/if}}";
        let out = render(source, &[("items", json!(["a"]))]).unwrap();
        assert_eq!(out, "<ul><li>a</li></ul>");
    }

    // ── errors ────────────────────────────────────────────────────────────

    fn reason(result: KeelResult<String>) -> String {
        match result.unwrap_err() {
            KeelError::Application(ApplicationError::RenderingFailed { reason }) => reason,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unclosed_tag_fails() {
        assert!(reason(render("Hi {{ name", &[])).starts_with("test.tpl: unclosed"));
        assert!(reason(render("{{{ raw }}", &[])).contains("unclosed"));
    }

    #[test]
    fn unclosed_block_fails() {
        assert!(reason(render("{{#if x}}yes", &[])).contains("unclosed '#if x'"));
    }

    #[test]
    fn mismatched_close_fails() {
        assert!(reason(render("{{#if x}}y{{/each}}", &[])).contains("closed by '/each'"));
        assert!(reason(render("{{/if}}", &[])).contains("unexpected"));
        assert!(reason(render("{{else}}", &[])).contains("outside"));
    }

    #[test]
    fn unknown_helper_fails() {
        assert!(reason(render("{{#with x}}{{/with}}", &[])).contains("unknown block helper"));
    }

    // ── builtin views ─────────────────────────────────────────────────────

    #[test]
    fn builtin_views_render() {
        for (path, source) in crate::builtin_templates::all() {
            let out = render(&source, &[("errors", json!(["Controller: \"x\""]))]).unwrap();
            assert!(out.contains("Controller"), "{path}: {out}");
        }
    }
}
