//! Tracing subscriber initialisation.
//!
//! Only the CLI crate calls [`init_logging`]; `keel-core` and
//! `keel-adapters` only *emit* spans and events.
//!
//! # Verbosity mapping
//!
//! | Flag(s)  | Filter level |
//! |----------|--------------|
//! | (none)   | WARN         |
//! | `-v`     | INFO         |
//! | `-vv`    | DEBUG        |
//! | `-vvv`   | TRACE        |
//! | `--quiet`| ERROR        |
//!
//! The level comes from [`GlobalArgs::log_level`]; `RUST_LOG` overrides
//! it if set.

use std::io::IsTerminal as _;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{GlobalArgs, OutputFormat};

/// Initialise the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros fire. Fails if a
/// subscriber is already installed in this process.
pub fn init_logging(args: &GlobalArgs) -> anyhow::Result<()> {
    let level = args.log_level();

    // RUST_LOG wins; otherwise every keel crate gets the same level.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let use_ansi = !args.no_color && std::io::stderr().is_terminal();

    // Machine-readable output gets machine-readable logs.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(use_ansi)
        .with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry().with(filter);
    let result = if args.output_format == OutputFormat::Json {
        registry.with(fmt_layer.json()).try_init()
    } else {
        registry.with(fmt_layer).try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialise tracing: {e}"))
}

/// Filter applied when `RUST_LOG` is unset.
fn default_filter(level: &str) -> String {
    format!("keel={level},keel_core={level},keel_adapters={level}")
}
