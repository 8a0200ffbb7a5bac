// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (settings are validated once and errors may be reported twice)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (400-level equivalent)
    // ========================================================================
    #[error("Invalid route pattern '{pattern}': {reason}")]
    InvalidRoutePattern { pattern: String, reason: String },

    #[error("Invalid placeholder token '{token}': tokens look like {{:name}}")]
    InvalidPlaceholder { token: String },

    #[error("Unknown format '{0}'")]
    UnknownFormat(String),

    #[error("Invalid controller name '{name}': {reason}")]
    InvalidControllerName { name: String, reason: String },

    // ========================================================================
    // Constraint Violations
    // ========================================================================
    #[error("Required field missing: {field}")]
    MissingRequiredField { field: &'static str },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidRoutePattern { pattern, .. } => vec![
                format!("Check the rewrite rule starting with '{pattern}'"),
                "Placeholders are substituted literally before the pattern is compiled".into(),
                "Example: 'index/{:alpha}' = 'index/main/$1'".into(),
            ],
            Self::InvalidPlaceholder { token } => vec![
                format!("Rename '{token}' to the form {{:name}}"),
                "Example: '{:slug}' = '[a-zA-Z0-9-]+'".into(),
            ],
            Self::UnknownFormat(format) => vec![
                format!("'{format}' has no registered content type"),
                "Known formats: html, json, xml, txt, rss, atom, css, js, pdf".into(),
            ],
            Self::InvalidControllerName { name, .. } => vec![
                format!("Controller '{name}' cannot be registered"),
                "Controller names must be non-empty and contain no '/'".into(),
            ],
            Self::MissingRequiredField { field } => {
                vec![format!("Provide a value for '{field}'")]
            }
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidRoutePattern { .. } | Self::InvalidPlaceholder { .. } => {
                ErrorCategory::Configuration
            }
            Self::UnknownFormat(_) => ErrorCategory::NotFound,
            Self::InvalidControllerName { .. } | Self::MissingRequiredField { .. } => {
                ErrorCategory::Validation
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Configuration,
    NotFound,
    Internal,
}
