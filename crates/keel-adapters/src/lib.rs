//! Infrastructure adapters for Keel.
//!
//! This crate implements the ports defined in `keel_core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod builtin_templates;
pub mod config_loader;
pub mod renderer;
pub mod session;
pub mod template_store;

// Re-export commonly used adapters
pub use config_loader::ConfigLoader;
pub use renderer::SimpleRenderer;
pub use session::MemorySessionStore;
pub use template_store::{LayeredTemplateStore, LocalTemplateStore, MemoryTemplateStore};
