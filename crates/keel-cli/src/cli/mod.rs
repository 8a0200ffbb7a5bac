//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{AppArgs, GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "keel",
    bin_name = "keel",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Dispatch requests through a Keel MVC application",
    long_about = "Keel routes a request path through rewrite rules to a \
                  controller and action, then renders its view and layout. \
                  This binary runs paths against the bundled demo application.",
    after_help = "EXAMPLES:\n\
        \x20 keel dispatch /blog/show/42\n\
        \x20 keel dispatch /post/7.json --output-format json\n\
        \x20 keel route /hello/world\n\
        \x20 keel completions bash > /usr/share/bash-completion/completions/keel",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a request and print the response.
    #[command(
        visible_alias = "d",
        about = "Dispatch a request path",
        after_help = "EXAMPLES:\n\
            \x20 keel dispatch /\n\
            \x20 keel dispatch /blog/show/42.json\n\
            \x20 keel dispatch '/blog/list?page=2' --views ./templates"
    )]
    Dispatch(DispatchArgs),

    /// Show where a path would be dispatched without running it.
    #[command(
        visible_alias = "r",
        about = "Explain routing for a path",
        after_help = "EXAMPLES:\n\
            \x20 keel route /post/7\n\
            \x20 keel route /unknown/thing --app-config keel.toml"
    )]
    Route(RouteArgs),

    /// Initialise a Keel configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 keel init           # default location\n\
            \x20 keel init --local   # .keel.toml in CWD"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 keel completions bash > ~/.local/share/bash-completion/completions/keel\n\
            \x20 keel completions zsh  > ~/.zfunc/_keel\n\
            \x20 keel completions fish > ~/.config/fish/completions/keel.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 keel config get output.format\n\
            \x20 keel config list\n\
            \x20 keel config settings --app-config keel.toml"
    )]
    Config(ConfigCommands),
}

// ── dispatch ──────────────────────────────────────────────────────────────────

/// Arguments for `keel dispatch`.
#[derive(Debug, Args)]
pub struct DispatchArgs {
    /// Request path, optionally with a query string.
    #[arg(value_name = "PATH", help = "Request path, e.g. /blog/show/42")]
    pub path: String,

    /// Print only the response body.
    #[arg(long = "body-only", help = "Print only the response body")]
    pub body_only: bool,
}

// ── route ─────────────────────────────────────────────────────────────────────

/// Arguments for `keel route`.
#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Request path to explain.
    #[arg(value_name = "PATH", help = "Request path, e.g. /post/7")]
    pub path: String,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `keel init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write to `.keel.toml` in the current directory.
    #[arg(
        long = "local",
        help = "Create local configuration in current directory"
    )]
    pub local: bool,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `keel completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `keel config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `output.format`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the effective dispatch settings of the demo application.
    Settings,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn parse_dispatch_command() {
        let cli = Cli::parse_from(["keel", "dispatch", "/blog/show/42", "--views", "tpl"]);
        assert_eq!(cli.global.app.views, Some(PathBuf::from("tpl")));
        match cli.command {
            Commands::Dispatch(args) => {
                assert_eq!(args.path, "/blog/show/42");
                assert!(!args.body_only);
            }
            other => panic!("expected Dispatch, got {other:?}"),
        }
    }

    #[test]
    fn dispatch_alias() {
        let cli = Cli::parse_from(["keel", "d", "/"]);
        assert!(matches!(cli.command, Commands::Dispatch(_)));
    }

    #[test]
    fn route_accepts_app_config() {
        let cli = Cli::parse_from(["keel", "route", "/post/7", "--app-config", "keel.toml"]);
        let Commands::Route(args) = cli.command else {
            panic!("expected Route command");
        };
        assert_eq!(args.path, "/post/7");
        assert_eq!(cli.global.app.app_config, Some(PathBuf::from("keel.toml")));
    }

    #[test]
    fn app_sources_are_accepted_before_the_subcommand() {
        let cli = Cli::parse_from(["keel", "--views", "tpl", "config", "settings"]);
        assert_eq!(cli.global.app.views, Some(PathBuf::from("tpl")));
        assert!(matches!(cli.command, Commands::Config(ConfigCommands::Settings)));
    }

    #[test]
    fn config_settings_subcommand() {
        let cli = Cli::parse_from(["keel", "config", "settings"]);
        assert!(matches!(cli.command, Commands::Config(ConfigCommands::Settings)));
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["keel", "--quiet", "--verbose", "route", "/"]);
        assert!(result.is_err());
    }

    #[test]
    fn path_is_required() {
        assert!(Cli::try_parse_from(["keel", "dispatch"]).is_err());
    }
}
