//! End-to-end dispatch through the real adapters: templates on disk layered
//! over the built-in views, the mustache renderer, TOML configuration and
//! the in-memory session store.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use keel_adapters::{
    ConfigLoader, LayeredTemplateStore, LocalTemplateStore, MemorySessionStore,
    MemoryTemplateStore, SimpleRenderer,
};
use keel_core::application::{Application, ControllerSpec};
use serde_json::json;
use tempfile::TempDir;

// ── helpers ───────────────────────────────────────────────────────────────

fn write(root: &Path, path: &str, content: &str) {
    let file = root.join(path);
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, content).unwrap();
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let views = dir.path().join("templates");
    write(&views, "app/controller/Blog/view/show.tpl", "<h2>{{ title }}</h2>");
    write(
        &views,
        "app/controller/Blog/view/show.json.tpl",
        r#"{"title": {{json title}}}"#,
    );
    write(&views, "app/controller/Blog/view/count.tpl", "{{ visits }}");
    write(&views, "app/layout/main.tpl", "<html>{{{ layout_content }}}</html>");
    write(
        dir.path(),
        "keel.toml",
        r#"
default_controller = "blog"
default_layout = "main"

[[routing.rewrite]]
from = "post/{:digit}"
to = "blog/show/$1"
"#,
    );
    dir
}

fn application(dir: &TempDir, session: MemorySessionStore) -> Application {
    let settings = ConfigLoader::new()
        .without_env()
        .file(dir.path().join("keel.toml"))
        .load_settings()
        .unwrap();

    let templates = LayeredTemplateStore::new()
        .layer(Arc::new(LocalTemplateStore::new(dir.path().join("templates"))))
        .layer(Arc::new(MemoryTemplateStore::with_builtin().unwrap()));

    let blog = ControllerSpec::builder("blog")
        .action("show", |cx, params| {
            let id = params.first().cloned().unwrap_or_default();
            cx.assign("title", format!("Post <{id}>"));
            Ok(())
        })
        .action("count", |cx, _| {
            let session = cx.session()?;
            session.add("visits", 1)?;
            let visits = session.get_or("visits", json!([]))?;
            let total = visits.as_array().map_or(0, Vec::len);
            cx.assign("visits", total);
            Ok(())
        })
        .build()
        .unwrap();

    Application::builder()
        .settings(settings)
        .templates(Arc::new(templates))
        .renderer(Arc::new(SimpleRenderer::new()))
        .session(Arc::new(session))
        .controller(blog)
        .build()
        .unwrap()
}

// ── tests ─────────────────────────────────────────────────────────────────

#[test]
fn rewritten_route_renders_view_inside_layout() {
    let dir = project();
    let app = application(&dir, MemorySessionStore::new());

    let response = app.handle("/post/7").unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.body(), "<html><h2>Post &lt;7&gt;</h2></html>");
    assert_eq!(
        response.header("Content-Type"),
        Some("text/html; charset=utf-8")
    );
}

#[test]
fn json_suffix_picks_json_view_without_layout() {
    let dir = project();
    let app = application(&dir, MemorySessionStore::new());

    let response = app.handle("/blog/show/7.json").unwrap();

    assert_eq!(response.body(), r#"{"title": "Post <7>"}"#);
    assert!(
        response
            .header("Content-Type")
            .unwrap()
            .starts_with("application/json")
    );
}

#[test]
fn unknown_action_uses_builtin_not_found_view() {
    let dir = project();
    let app = application(&dir, MemorySessionStore::new());

    let response = app.handle("/blog/missing/3").unwrap();

    assert_eq!(response.status(), 404);
    assert!(response.body().starts_with("<html>"));
    assert!(response.body().contains("Not Found"));
    assert!(response.body().contains("Action: &quot;missing&quot;"));
    assert!(response.body().contains("Param 0: 3"));
}

#[test]
fn not_found_with_suffix_lacking_builtin_variant_stays_404() {
    let dir = project();
    let app = application(&dir, MemorySessionStore::new());

    for path in ["/blog/missing.xml", "/blog/missing.txt", "/nowhere/x.rss"] {
        let response = app.handle(path).unwrap();
        assert_eq!(response.status(), 404, "{path}");
        assert!(response.body().contains("Not Found"), "{path}");
        assert_eq!(
            response.header("Content-Type"),
            Some("text/html; charset=utf-8"),
            "{path}"
        );
    }

    // xhtml is a layout format, so the plain view is still wrapped.
    let response = app.handle("/blog/missing.xhtml").unwrap();
    assert_eq!(response.status(), 404);
    assert!(response.body().starts_with("<html>"));
    assert!(response.body().contains("Format: &quot;xhtml&quot;"));
}

#[test]
fn fallback_to_default_controller() {
    let dir = project();
    let app = application(&dir, MemorySessionStore::new());

    let plan = app.route("/show/9");
    assert_eq!(plan.controller, "blog");
    assert_eq!(plan.dispatched, ["blog", "show", "9"]);
}

#[test]
fn session_persists_across_requests() {
    let dir = project();
    let session = MemorySessionStore::new();
    let app = application(&dir, session.clone());

    assert_eq!(app.handle("/blog/count").unwrap().body(), "<html>1</html>");
    assert_eq!(app.handle("/blog/count").unwrap().body(), "<html>2</html>");
    assert!(keel_core::application::SessionStore::is_started(&session));
}
