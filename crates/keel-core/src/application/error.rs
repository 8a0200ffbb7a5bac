//! Application layer errors.
//!
//! These errors represent failures while dispatching a request or rendering
//! its templates. Invalid rewrite rules and formats are `DomainError`s from
//! `crate::domain`.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during dispatch and rendering.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// No directory in the search stack holds the template.
    #[error("Template '{name}' not found in search path [{}]", searched.join(", "))]
    TemplateNotFound { name: String, searched: Vec<String> },

    /// Template execution failed.
    #[error("Template rendering failed: {reason}")]
    RenderingFailed { reason: String },

    /// Template store could not be read.
    #[error("Template store error at {path}: {reason}")]
    TemplateStoreError { path: String, reason: String },

    /// Nested forwards went deeper than `max_forward_depth`.
    #[error("Forward to '{action}' exceeded the maximum depth of {depth}")]
    ForwardLimitExceeded { action: String, depth: usize },

    /// A hook callback returned an error.
    #[error("{point} hook failed")]
    HookFailed {
        point: String,
        #[source]
        source: Arc<dyn StdError + Send + Sync>,
    },

    /// A configuration value could not be turned into typed settings.
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSettings { key: String, reason: String },

    /// Session store access failed (lock poisoned, etc.).
    #[error("Session store error")]
    SessionLockError,

    /// Port/Adapter not configured.
    #[error("Required adapter not configured: {name}")]
    AdapterNotConfigured { name: &'static str },
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::TemplateNotFound { name, searched } => {
                let mut hints = vec![format!("Create '{name}' in one of:")];
                hints.extend(searched.iter().map(|dir| format!("  {dir}")));
                hints.push("Or register it with the in-memory template store".into());
                hints
            }
            Self::ForwardLimitExceeded { action, .. } => vec![
                format!("Action '{action}' is probably forwarding to itself"),
                "Raise max_forward_depth only if the nesting is intentional".into(),
            ],
            Self::InvalidSettings { key, .. } => vec![
                format!("Check the value of '{key}' in keel.toml"),
                "Run: keel config list to see the effective settings".into(),
            ],
            Self::SessionLockError => vec![
                "The session store is locked".into(),
                "Try again in a moment".into(),
            ],
            Self::AdapterNotConfigured { name } => vec![
                format!("Required component not configured: {}", name),
                "Pass it to Application::builder() before build()".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TemplateNotFound { .. }
            | Self::RenderingFailed { .. }
            | Self::TemplateStoreError { .. }
            | Self::ForwardLimitExceeded { .. }
            | Self::HookFailed { .. }
            | Self::SessionLockError => ErrorCategory::Internal,
            Self::InvalidSettings { .. } | Self::AdapterNotConfigured { .. } => {
                ErrorCategory::Configuration
            }
        }
    }
}
