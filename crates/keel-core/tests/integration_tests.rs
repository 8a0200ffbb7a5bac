//! Integration tests for keel-core, using only the public API.

use std::collections::HashMap;
use std::sync::Arc;

use keel_core::application::{
    Application, ControllerSpec, DispatchSettings, HookPoint, MapConfig, Resolution,
};
use keel_core::domain::{PlaceholderTable, RouteResolver, RouteRule, ViewState};
use keel_core::error::KeelResult;
use keel_core::prelude::{ConfigStore, TemplateRenderer, TemplateStore};
use serde_json::json;

struct Templates(HashMap<&'static str, &'static str>);

impl TemplateStore for Templates {
    fn load(&self, path: &str) -> KeelResult<Option<String>> {
        Ok(self.0.get(path).map(|s| (*s).to_owned()))
    }

    fn list(&self) -> KeelResult<Vec<String>> {
        Ok(self.0.keys().map(|k| (*k).to_owned()).collect())
    }
}

/// Renders `name|key=value;key=value` for the keys present in the source.
struct EchoRenderer;

impl TemplateRenderer for EchoRenderer {
    fn render(&self, _name: &str, source: &str, vars: &ViewState) -> KeelResult<String> {
        let mut out = String::from(source);
        for (key, value) in vars.iter() {
            let token = format!("[{key}]");
            if out.contains(&token) {
                let text = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                out = out.replace(&token, &text);
            }
        }
        Ok(out)
    }
}

fn templates() -> Arc<Templates> {
    Arc::new(Templates(HashMap::from([
        ("keel/controller/view/notFound.tpl", "not found: [errors]"),
        ("keel/controller/view/exception.tpl", "exception: [errors]"),
        ("keel/controller/view/error.tpl", "error"),
        ("app/controller/Blog/view/show.tpl", "post [id]"),
        ("app/controller/Index/view/main.tpl", "main [name]"),
        ("app/layout/site.tpl", "<body>[layout_content]</body>"),
    ])))
}

fn application(config: MapConfig) -> Application {
    let settings = DispatchSettings::from_store(&config).unwrap();

    let blog = ControllerSpec::builder("blog")
        .action("show", |cx, params| {
            cx.assign("id", params.first().cloned().unwrap_or_default());
            Ok(())
        })
        .action("broken", |_, _| {
            let parsed: Result<u32, _> = "x".parse::<u32>();
            parsed?;
            Ok(())
        })
        .build()
        .unwrap();

    let index = ControllerSpec::builder("index")
        .action("main", |cx, params| {
            cx.assign("name", params.first().cloned().unwrap_or_default());
            Ok(())
        })
        .hook(HookPoint::PreRender, |cx| {
            if cx.action() == "main" {
                cx.set_layout("site");
            }
            Ok(())
        })
        .build()
        .unwrap();

    Application::builder()
        .settings(settings)
        .templates(templates())
        .renderer(Arc::new(EchoRenderer))
        .controllers([blog, index])
        .build()
        .unwrap()
}

#[test]
fn root_with_nothing_configured_is_404() {
    let app = application(MapConfig::new());
    let outcome = app.dispatch("/").unwrap();

    assert_eq!(outcome.response.status(), 404);
    assert_eq!(outcome.controller.state().controller(), "");
    assert_eq!(
        outcome.response.header("Content-Type"),
        Some("text/html; charset=utf-8")
    );
}

#[test]
fn blog_show_dispatches_with_param() {
    let app = application(MapConfig::new());
    let outcome = app.dispatch("blog/show/42").unwrap();

    assert_eq!(outcome.response.status(), 200);
    assert_eq!(outcome.response.body(), "post 42");
    assert_eq!(outcome.controller.action(), "show");
}

#[test]
fn configured_rewrite_reaches_index_main() {
    let config = MapConfig::new().with(
        "routing",
        json!({
            "replace": { "{:alpha}": "[a-zA-Z]+" },
            "rewrite": [{ "from": "index/{:alpha}", "to": "index/main/$1" }]
        }),
    );
    let app = application(config);

    assert_eq!(app.route("index/hello").canonical, ["index", "main", "hello"]);
    let response = app.handle("index/hello").unwrap();
    assert_eq!(response.body(), "<body>main hello</body>");
}

#[test]
fn handler_error_yields_exception_view() {
    let app = application(MapConfig::new());
    let outcome = app.dispatch("/blog/broken").unwrap();

    assert_eq!(outcome.response.status(), 500);
    assert!(outcome.response.body().starts_with("exception: "));
    assert_eq!(outcome.controller.errors().len(), 1);
    assert!(outcome.controller.errors()[0].is_fault());
}

#[test]
fn default_controller_fallback_keeps_rest_of_path() {
    let config = MapConfig::new().with("default_controller", "index");
    let app = application(config);

    let plan = app.route("/alice");
    assert_eq!(plan.resolution, Resolution::DefaultController);
    assert_eq!(plan.dispatched, ["index", "alice"]);
}

#[test]
fn resolver_is_usable_standalone() {
    let resolver = RouteResolver::new(
        [RouteRule::new("p/{:digit}", "page/show/$1")],
        &PlaceholderTable::standard(),
    )
    .unwrap();
    let input = vec!["p".to_string(), "9".to_string()];
    assert_eq!(resolver.resolve(&input), ["page", "show", "9"]);
    assert_eq!(resolver.resolve(&input), resolver.resolve(&input));
}

#[test]
fn config_store_contract() {
    let mut config = MapConfig::new();
    config.set("charset", json!("iso-8859-1"));
    assert_eq!(config.get_or("charset", json!("utf-8")), json!("iso-8859-1"));

    let app = application(config);
    let response = app.handle("blog/show/1").unwrap();
    assert_eq!(
        response.header("Content-Type"),
        Some("text/html; charset=iso-8859-1")
    );
}
