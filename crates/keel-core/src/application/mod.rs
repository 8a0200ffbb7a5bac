//! Application layer for Keel.
//!
//! This layer contains:
//! - **Services**: the front controller (`Application`)
//! - **Dispatch**: controllers, the action context and the render pipeline
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! Pure request values (URI, routes, response) live in `crate::domain`.

pub mod controller;
pub mod dispatch;
pub mod error;
pub mod ports;
pub mod registry;
pub mod render;
pub mod services;
pub mod session;
pub mod settings;

#[cfg(test)]
pub(crate) mod test_support;

pub use controller::{
    ActionHandler, BUILTIN_VIEW_DIR, ControllerBuilder, ControllerSpec, ERROR_ACTION,
    EXCEPTION_VIEW, HandlerError, HandlerResult, Hook, HookPoint, Hooks, NOT_FOUND_VIEW,
};
pub use dispatch::{ActionContext, ActionDescriptor, ControllerInstance, RequestState, Services};
pub use registry::{ControllerRegistry, Located, Resolution};
pub use render::TemplateSearchStack;
pub use services::{Application, ApplicationBuilder, DispatchOutcome, RoutePlan};
pub use session::Session;
pub use settings::{DispatchSettings, MapConfig, RoutingSettings};

// Re-export port traits (for adapter implementation)
pub use ports::{ConfigStore, SessionStore, TemplateRenderer, TemplateStore};

pub use error::ApplicationError;
