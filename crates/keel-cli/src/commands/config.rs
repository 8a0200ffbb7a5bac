//! `keel config`: inspect configuration values.

use serde_json::Value;

use crate::{
    cli::{AppArgs, ConfigCommands, OutputFormat},
    config::AppConfig,
    demo,
    error::{CliError, CliResult, config_error},
    output::OutputManager,
};

/// Dispatch to the correct config subcommand.
pub fn execute(
    cmd: ConfigCommands,
    sources: &AppArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    match cmd {
        ConfigCommands::Get { key } => {
            let value = config
                .get(&key)
                .ok_or(CliError::UnknownConfigKey { key: key.clone() })?;
            output.emit(&format!("{key} = {value}"))?;
        }

        ConfigCommands::List => {
            output.header("Current Configuration:")?;
            let serialised = toml::to_string_pretty(&config)
                .map_err(|e| config_error("failed to serialise config", e))?;
            output.emit(&serialised)?;
        }

        ConfigCommands::Settings => {
            let settings = demo::settings(sources, &config)?;
            if output.format() == OutputFormat::Json {
                let value = serde_json::to_value(&settings)
                    .map_err(|e| config_error("failed to serialise settings", e))?;
                output.json(&value)?;
            } else {
                output.header("Dispatch Settings:")?;
                output.emit(&settings_toml(&settings)?)?;
            }
        }

        ConfigCommands::Path => {
            output.emit(&AppConfig::config_path().display().to_string())?;
        }
    }

    Ok(())
}

// ── helpers ───────────────────────────────────────────────────────────────────

/// TOML has no null, so unset options are dropped before serialising.
fn settings_toml(settings: &impl serde::Serialize) -> CliResult<String> {
    let mut value =
        serde_json::to_value(settings).map_err(|e| config_error("failed to serialise settings", e))?;
    if let Value::Object(map) = &mut value {
        map.retain(|_, v| !v.is_null());
    }
    toml::to_string_pretty(&value).map_err(|e| config_error("failed to serialise settings", e))
}

// ── tests ─────────────────────────────────────────────────────────────────────
