//! The demo application the CLI dispatches against.
//!
//! Two controllers, `index` and `blog`, with their views held in memory.
//! Settings start from [`default_config`] and are overlaid by the
//! `--app-config` file and `KEEL__*` variables; `--views` puts a template
//! directory in front of the bundled views.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use keel_adapters::{
    ConfigLoader, LayeredTemplateStore, LocalTemplateStore, MemorySessionStore,
    MemoryTemplateStore, SimpleRenderer,
};
use keel_core::application::{
    Application, ControllerSpec, DispatchSettings, HookPoint, MapConfig, ports::TemplateStore,
};
use keel_core::error::KeelResult;

use crate::{
    cli::AppArgs,
    config::AppConfig,
    error::{CliError, CliResult},
};

struct Post {
    id: u32,
    title: &'static str,
    body: &'static str,
}

const POSTS: &[Post] = &[
    Post {
        id: 1,
        title: "Hello, Keel",
        body: "Paths become controller, action and params.",
    },
    Post {
        id: 2,
        title: "Rewrite rules",
        body: "post/{:digit} is rewritten to blog/show/$1 before dispatch.",
    },
    Post {
        id: 3,
        title: "Layouts",
        body: "Views render first, then the layout wraps them.",
    },
];

const VIEWS: &[(&str, &str)] = &[
    (
        "app/layout/main.tpl",
        r#"<!DOCTYPE html>
<html>
<head><title>{{#if title}}{{ title }}{{else}}Keel demo{{/if}}</title></head>
<body>
{{{ layout_content }}}
</body>
</html>"#,
    ),
    (
        "app/controller/Index/view/main.tpl",
        r#"<h1>{{ greeting }}</h1>
<p>Read <a href="/blog/list">the blog</a>.</p>"#,
    ),
    (
        "app/controller/Blog/view/list.tpl",
        r#"<ul>
{{#each posts}}  <li><a href="/post/{{ id }}">{{ title }}</a></li>
{{/each}}</ul>"#,
    ),
    ("app/controller/Blog/view/list.json.tpl", "{{json posts}}"),
    (
        "app/controller/Blog/view/show.tpl",
        r#"<article>
<h2>{{ post.title }}</h2>
<p>{{ post.body }}</p>
</article>"#,
    ),
    ("app/controller/Blog/view/show.json.tpl", "{{json post}}"),
];

/// Settings the demo starts from, before any file or environment overlay.
///
/// Overlays replace whole top-level keys, so a file with its own
/// `[routing]` table drops the demo rewrite rule.
pub fn default_config() -> MapConfig {
    MapConfig::new()
        .with("default_controller", "index")
        .with("default_layout", "main")
        .with(
            "routing",
            json!({
                "rewrite": [{ "from": "post/{:digit}", "to": "blog/show/$1" }]
            }),
        )
}

/// Effective dispatch settings for `args`.
pub fn settings(args: &AppArgs, config: &AppConfig) -> CliResult<DispatchSettings> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = args.app_config.as_ref().or(config.app.config_file.as_ref()) {
        debug!(path = %path.display(), "application settings file");
        loader = loader.file(path);
    }

    let mut merged = default_config();
    merged.merge(loader.load()?);
    Ok(DispatchSettings::from_store(&merged)?)
}

/// Build the demo application.
pub fn application(args: &AppArgs, config: &AppConfig) -> CliResult<Application> {
    let settings = settings(args, config)?;
    let templates = templates(args.views.as_ref().or(config.app.views.as_ref()))?;

    let app = Application::builder()
        .settings(settings)
        .templates(templates)
        .renderer(Arc::new(SimpleRenderer::new()))
        .session(Arc::new(MemorySessionStore::new()))
        .controllers(controllers()?)
        .build()?;
    Ok(app)
}

fn templates(views: Option<&PathBuf>) -> CliResult<Arc<dyn TemplateStore>> {
    let bundled = MemoryTemplateStore::with_builtin()?;
    for (path, source) in VIEWS {
        bundled.insert(*path, *source)?;
    }

    let Some(dir) = views else {
        return Ok(Arc::new(bundled));
    };
    if !dir.is_dir() {
        return Err(CliError::PathNotFound { path: dir.clone() });
    }

    let layered = LayeredTemplateStore::new()
        .layer(Arc::new(LocalTemplateStore::new(dir)))
        .layer(Arc::new(bundled));
    Ok(Arc::new(layered))
}

fn controllers() -> KeelResult<Vec<ControllerSpec>> {
    let index = ControllerSpec::builder("index")
        .default_action("main")
        .action("main", |cx, _| {
            cx.assign("greeting", "Welcome to Keel");
            Ok(())
        })
        .build()?;

    let blog = ControllerSpec::builder("blog")
        .default_action("list")
        .action_formats("*", ["json", "xhtml"])
        .action("list", |cx, _| {
            let posts: Vec<_> = POSTS
                .iter()
                .map(|p| json!({ "id": p.id, "title": p.title }))
                .collect();
            cx.assign("posts", posts);
            Ok(())
        })
        .action("show", |cx, params| {
            let id: u32 = cx.param(0, "").parse()?;
            let Some(post) = POSTS.iter().find(|p| p.id == id) else {
                return cx.error(format!("No post with id {id}"));
            };
            cx.assign(
                "post",
                json!({ "id": post.id, "title": post.title, "body": post.body }),
            );
            cx.assign("title", post.title);
            cx.session()?.set("last_viewed", id)?;
            debug!(id, params = params.len(), "post shown");
            Ok(())
        })
        .action("archive", |cx, _| {
            cx.redirect_no_cache("/blog/list");
            Ok(())
        })
        .hook(HookPoint::PreRender, |cx| {
            if !cx.vars().contains("title") {
                let title = format!("Blog: {}", cx.action());
                cx.assign("title", title);
            }
            Ok(())
        })
        .build()?;

    Ok(vec![index, blog])
}
