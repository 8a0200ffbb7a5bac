//! Root error type for Keel Core.
//!
//! Dispatch errors travel in two directions:
//!
//! - **Into handlers.** Actions and hooks return `HandlerResult`, so a
//!   `KeelError` raised by `forward`, `session()` or rendering is boxed
//!   with `?` like any other fault. `ControllerInstance::fetch` traps it,
//!   records it as an `ErrorEntry` with its cause chain and renders the
//!   `exception` view at status 500.
//! - **Out to the caller.** `Application::builder().build()` fails on
//!   invalid settings or rewrite rules, and `Application::handle` fails only
//!   when the `exception` view itself cannot be rendered.
//!
//! Every variant carries a [`category`](KeelError::category) and
//! [`suggestions`](KeelError::suggestions) for the CLI to display.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// Root error type for Keel Core operations.
#[derive(Debug, Error, Clone)]
pub enum KeelError {
    /// Invalid rewrite rules, placeholders, formats or controller names.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Dispatch and rendering failures.
    #[error("Application error: {0}")]
    Application(#[from] ApplicationError),

    /// Configuration that could not be loaded, e.g. an unreadable
    /// `keel.toml` or a malformed `KEEL__*` variable.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// An invariant of the dispatcher did not hold.
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl KeelError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Configuration { message } => vec![
                format!("Configuration issue: {}", message),
                "Check your keel.toml and KEEL__* environment variables".into(),
            ],
            Self::Internal { .. } => vec!["This appears to be a bug in Keel".into()],
        }
    }

    /// Category used for CLI styling and exit codes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
                crate::domain::ErrorCategory::Configuration => ErrorCategory::Configuration,
                crate::domain::ErrorCategory::NotFound => ErrorCategory::NotFound,
                crate::domain::ErrorCategory::Internal => ErrorCategory::Internal,
            },
            Self::Application(e) => e.category(),
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Configuration,
    Internal,
}

/// Convenient result type alias.
pub type KeelResult<T> = Result<T, KeelError>;
