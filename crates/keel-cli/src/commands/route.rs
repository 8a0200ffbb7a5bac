//! `keel route`: explain where a path goes without running it.

use serde_json::json;

use crate::{
    cli::{AppArgs, OutputFormat, RouteArgs},
    config::AppConfig,
    demo,
    error::CliResult,
    output::OutputManager,
};

pub fn execute(
    args: RouteArgs,
    sources: &AppArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let app = demo::application(sources, &config)?;
    let plan = app.route(&args.path);

    if output.format() == OutputFormat::Json {
        output.json(&json!({
            "path": args.path,
            "canonical": plan.canonical,
            "rule": plan.rule.as_ref().map(|r| json!({ "from": r.from, "to": r.to })),
            "dispatched": plan.dispatched,
            "controller": plan.controller,
            "resolution": plan.resolution.to_string(),
            "action": plan.action,
            "action_found": plan.action_found,
            "params": plan.params,
            "format": plan.format,
        }))?;
        return Ok(());
    }

    let rule = plan
        .rule
        .as_ref()
        .map(|r| format!("{} => {}", r.from, r.to))
        .unwrap_or_else(|| "(none)".into());
    let controller = if plan.controller.is_empty() {
        "(generic)".to_owned()
    } else {
        plan.controller.clone()
    };
    let action = if plan.action_found {
        plan.action.clone()
    } else {
        format!("{} (not found)", plan.action)
    };

    output.field("canonical", &plan.canonical.join("/"))?;
    output.field("rule", &rule)?;
    output.field("dispatched", &plan.dispatched.join("/"))?;
    output.field("controller", &format!("{controller} ({})", plan.resolution))?;
    output.field("action", &action)?;
    output.field("params", &plan.params.join(", "))?;
    output.field("format", plan.format.as_deref().unwrap_or("(default)"))?;
    Ok(())
}
