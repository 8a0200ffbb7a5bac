//! `keel dispatch`: run one request through the demo application.

use chrono::Utc;
use serde_json::{Map, Value, json};
use tracing::instrument;

use keel_core::application::DispatchOutcome;

use crate::{
    cli::{AppArgs, DispatchArgs, OutputFormat},
    config::AppConfig,
    demo,
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all, fields(path = %args.path))]
pub fn execute(
    args: DispatchArgs,
    sources: &AppArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let app = demo::application(sources, &config)?;
    let mut outcome = app.dispatch(&args.path)?;

    if !outcome.response.has_header("Date") {
        outcome.response.set_header("Date", http_date());
    }

    if args.body_only {
        output.emit(outcome.response.body())?;
    } else if output.format() == OutputFormat::Json {
        output.json(&to_json(&outcome))?;
    } else {
        print_response(&outcome, &output)?;
    }
    Ok(())
}

fn print_response(outcome: &DispatchOutcome, output: &OutputManager) -> CliResult<()> {
    let response = &outcome.response;
    output.header(&format!(
        "HTTP {} {}",
        response.status(),
        reason_phrase(response.status())
    ))?;
    for (name, value) in response.headers() {
        output.field(name, value)?;
    }
    output.emit("")?;
    output.emit(response.body())?;
    output.info(&format!(
        "{} → {} ({}), request {}",
        display_controller(outcome.controller.state().controller()),
        outcome.controller.action(),
        outcome.resolution,
        outcome.request_id
    ))?;
    Ok(())
}

fn to_json(outcome: &DispatchOutcome) -> Value {
    let response = &outcome.response;
    let headers: Map<String, Value> = response
        .headers()
        .map(|(name, value)| (name.to_owned(), Value::from(value)))
        .collect();
    let errors: Vec<String> = outcome
        .controller
        .errors()
        .iter()
        .map(ToString::to_string)
        .collect();

    json!({
        "request_id": outcome.request_id.to_string(),
        "status": response.status(),
        "headers": headers,
        "body": response.body(),
        "controller": outcome.controller.state().controller(),
        "action": outcome.controller.action(),
        "resolution": outcome.resolution.to_string(),
        "errors": errors,
    })
}

fn display_controller(name: &str) -> &str {
    if name.is_empty() { "(generic)" } else { name }
}

/// RFC 7231 date, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
fn http_date() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "",
    }
}
