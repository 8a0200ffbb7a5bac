//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `keel-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `TemplateStore`: template lookup by logical path
//!   - `TemplateRenderer`: template execution
//!   - `ConfigStore`: configuration key/value lookup
//!   - `SessionStore`: segmented session and flash values
//!
//! - **Driving (Input) Ports**: `Application::handle`, called by the CLI

pub mod output;

pub use output::{ConfigStore, SessionStore, TemplateRenderer, TemplateStore};

#[cfg(test)]
pub use output::{MockTemplateRenderer, MockTemplateStore};
