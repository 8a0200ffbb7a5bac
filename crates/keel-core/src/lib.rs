//! Keel Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers of Keel, a small
//! MVC request dispatcher: route rewriting, controller lookup with
//! fallback, a hook-driven action dispatcher and a view-then-layout render
//! pipeline.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             keel-cli (CLI)              │
//! │      (dispatch, route, config, ...)     │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │  (Application, ControllerInstance,      │
//! │   render pipeline)                      │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (TemplateStore, TemplateRenderer,       │
//! │  ConfigStore, SessionStore)             │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │     keel-adapters (Infrastructure)      │
//! │ (MemoryTemplateStore, SimpleRenderer,   │
//! │  ConfigLoader, MemorySessionStore)      │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │  (Uri, RouteResolver, Response, ...)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use keel_core::prelude::*;
//!
//! // 1. Describe a controller
//! let blog = ControllerSpec::builder("blog")
//!     .action("show", |cx, params| {
//!         cx.assign("id", params.first().cloned().unwrap_or_default());
//!         Ok(())
//!     })
//!     .build()?;
//!
//! // 2. Wire adapters and dispatch
//! let app = Application::builder()
//!     .templates(store)
//!     .renderer(renderer)
//!     .controller(blog)
//!     .build()?;
//! let response = app.handle("/blog/show/42")?;
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        ActionContext, Application, ControllerSpec, DispatchSettings, HandlerResult, HookPoint,
        MapConfig,
        ports::{ConfigStore, SessionStore, TemplateRenderer, TemplateStore},
    };
    pub use crate::domain::{ErrorEntry, Response, RouteRule, Uri, ViewState};
    pub use crate::error::{KeelError, KeelResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
