//! Flags accepted by every `keel` subcommand.
//!
//! Two groups, both flattened into [`super::Cli`] with `global = true` so
//! they may appear before or after the subcommand:
//!
//! - [`GlobalArgs`]: logging, output and the CLI's own config file.
//! - [`AppArgs`]: where the demo application reads its dispatch settings
//!   and templates. `dispatch`, `route` and `config settings` use these;
//!   the other subcommands ignore them.

use std::path::PathBuf;

use clap::Args;

/// Logging, output and CLI configuration.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// `-v` logs each request, `-vv` adds routing and template lookups,
    /// `-vvv` traces every template path tried.
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Log more (-v requests, -vv dispatch, -vvv template lookups)"
    )]
    pub verbose: u8,

    /// Only errors reach stderr; responses are still printed.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose",
        help = "Only print responses and errors"
    )]
    pub quiet: bool,

    /// Plain headers and error messages. Also set by `NO_COLOR`.
    #[arg(long = "no-color", global = true, env = "NO_COLOR", help = "Disable colored output")]
    pub no_color: bool,

    /// Replaces the `.keel.toml` / user config lookup.
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        value_name = "FILE",
        help = "CLI configuration file"
    )]
    pub config: Option<PathBuf>,

    /// `json` prints responses and route plans as JSON documents.
    #[arg(
        long = "output-format",
        global = true,
        value_enum,
        default_value = "auto",
        help = "Output format"
    )]
    pub output_format: OutputFormat,

    #[command(flatten)]
    pub app: AppArgs,
}

impl GlobalArgs {
    /// Tracing level for the keel crates; `--quiet` wins over `-v`.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Where the demo application takes its settings and templates from.
///
/// Either flag falls back to the matching `app.*` key of the CLI config.
#[derive(Debug, Clone, Default, Args)]
pub struct AppArgs {
    /// Layered over the demo defaults; whole top-level keys are replaced.
    #[arg(
        long = "app-config",
        global = true,
        value_name = "FILE",
        help = "Application settings file (TOML)"
    )]
    pub app_config: Option<PathBuf>,

    /// Searched before the bundled views, e.g. `DIR/app/layout/main.tpl`.
    #[arg(
        long = "views",
        global = true,
        value_name = "DIR",
        help = "Template directory overriding the demo views"
    )]
    pub views: Option<PathBuf>,
}

/// How responses, plans and messages are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// `human` on a terminal, `plain` when piped.
    #[default]
    Auto,
    /// Coloured status line and headers.
    Human,
    /// Same layout without escape codes.
    Plain,
    /// One JSON document per command.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(verbose: u8, quiet: bool) -> GlobalArgs {
        GlobalArgs {
            verbose,
            quiet,
            ..GlobalArgs::default()
        }
    }

    #[test]
    fn log_level_follows_verbosity() {
        assert_eq!(args(0, false).log_level(), "warn");
        assert_eq!(args(1, false).log_level(), "info");
        assert_eq!(args(2, false).log_level(), "debug");
        assert_eq!(args(3, false).log_level(), "trace");
        assert_eq!(args(9, false).log_level(), "trace");
    }

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(args(0, true).log_level(), "error");
        assert_eq!(args(3, true).log_level(), "error");
    }

    #[test]
    fn app_sources_default_to_none() {
        let args = GlobalArgs::default();
        assert!(args.app.app_config.is_none());
        assert!(args.app.views.is_none());
        assert_eq!(args.output_format, OutputFormat::Auto);
    }
}
