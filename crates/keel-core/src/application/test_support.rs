//! In-crate fakes shared by the application tests.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::application::dispatch::Services;
use crate::application::ports::{TemplateRenderer, TemplateStore};
use crate::application::settings::DispatchSettings;
use crate::domain::ViewState;
use crate::error::KeelResult;

/// Template store keyed by full path. Entries starting with `*/` match the
/// same file name in any `app/controller/<Name>/view` directory.
pub struct TestTemplates {
    entries: HashMap<String, String>,
}

impl TestTemplates {
    pub fn standard() -> Self {
        let entries = [
            ("keel/controller/view/notFound.tpl", "notFound"),
            ("keel/controller/view/notFound.json.tpl", "{\"status\":404}"),
            ("keel/controller/view/exception.tpl", "exception:{{errors}}"),
            ("keel/controller/view/exception.json.tpl", "{\"status\":500}"),
            ("keel/controller/view/error.tpl", "error:{{errors}}"),
            ("app/layout/main.tpl", "<main>{{layout_content}}</main>"),
            ("*/index.tpl", "index"),
            ("*/index.json.tpl", "[]"),
            ("*/show.tpl", "show:{{id}}"),
            ("*/show.json.tpl", "{\"id\":\"{{id}}\"}"),
            ("*/show.xml.tpl", "<id>{{id}}</id>"),
            ("*/inner.tpl", "inner"),
            ("*/other.tpl", "other"),
            ("*/find.tpl", "find:{{id}}"),
        ];
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        }
    }
}

impl TemplateStore for TestTemplates {
    fn load(&self, path: &str) -> KeelResult<Option<String>> {
        if let Some(source) = self.entries.get(path) {
            return Ok(Some(source.clone()));
        }
        if path.starts_with("app/controller/") {
            if let Some((_, file)) = path.rsplit_once("/view/") {
                return Ok(self.entries.get(&format!("*/{file}")).cloned());
            }
        }
        Ok(None)
    }

    fn list(&self) -> KeelResult<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/// Replaces `{{ key }}` with the variable's text; arrays are joined with `,`.
pub struct TestRenderer;

impl TemplateRenderer for TestRenderer {
    fn render(&self, _name: &str, source: &str, vars: &ViewState) -> KeelResult<String> {
        let mut out = String::new();
        let mut rest = source;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let Some(len) = rest[start..].find("}}") else {
                rest = &rest[start..];
                break;
            };
            let key = rest[start + 2..start + len].trim();
            out.push_str(&text(vars.lookup(key)));
            rest = &rest[start + len + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| text(Some(item)))
            .collect::<Vec<_>>()
            .join(","),
        Some(other) => other.to_string(),
    }
}

pub fn services_with(settings: DispatchSettings) -> Arc<Services> {
    Arc::new(Services {
        settings,
        templates: Arc::new(TestTemplates::standard()),
        renderer: Arc::new(TestRenderer),
        session: None,
    })
}

pub fn services() -> Arc<Services> {
    services_with(DispatchSettings::default())
}
