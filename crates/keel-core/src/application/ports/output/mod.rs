//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what dispatch needs from external systems.
//! The `keel-adapters` crate provides implementations.

use serde_json::Value;

use crate::domain::ViewState;
use crate::error::KeelResult;

/// Port for template lookup.
///
/// Paths are logical, `/`-separated names such as
/// `app/controller/Blog/view/show.tpl`; how they map onto storage is up to
/// the adapter.
///
/// Implemented by:
/// - `keel_adapters::template_store::MemoryTemplateStore` (built-in views, tests)
/// - `keel_adapters::template_store::LocalTemplateStore` (templates on disk)
#[cfg_attr(test, mockall::automock)]
pub trait TemplateStore: Send + Sync {
    /// Template source at `path`, or `None` when the store has no such entry.
    fn load(&self, path: &str) -> KeelResult<Option<String>>;

    /// Every path the store can serve.
    fn list(&self) -> KeelResult<Vec<String>>;
}

/// Port for template execution.
///
/// Implemented by:
/// - `keel_adapters::renderer::SimpleRenderer` (`{{ var }}` substitution)
#[cfg_attr(test, mockall::automock)]
pub trait TemplateRenderer: Send + Sync {
    /// Execute `source` against `vars`. `name` is only used for diagnostics.
    fn render(&self, name: &str, source: &str, vars: &ViewState) -> KeelResult<String>;
}

/// Port for process-wide configuration.
///
/// Loaded once at startup and read-only afterwards; `set` exists for
/// loaders and tests.
pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    fn set(&mut self, key: &str, value: Value);

    /// Top-level keys in a stable order.
    fn keys(&self) -> Vec<String>;
}

/// Port for per-client session storage.
///
/// Values are grouped by segment (the controller name). Flash values are
/// removed the first time they are read. The store starts lazily on the
/// first write; reads on an unstarted store see nothing.
///
/// Implemented by:
/// - `keel_adapters::session::MemorySessionStore`
pub trait SessionStore: Send + Sync {
    fn is_started(&self) -> bool;

    fn has(&self, segment: &str, key: &str) -> KeelResult<bool>;

    fn get(&self, segment: &str, key: &str) -> KeelResult<Option<Value>>;

    fn set(&self, segment: &str, key: &str, value: Value) -> KeelResult<()>;

    /// Append `value` to the array at `key`, converting a scalar into an array.
    fn add(&self, segment: &str, key: &str, value: Value) -> KeelResult<()>;

    fn delete(&self, segment: &str, key: &str) -> KeelResult<()>;

    /// Clear every normal value in `segment`.
    fn reset(&self, segment: &str) -> KeelResult<()>;

    fn has_flash(&self, segment: &str, key: &str) -> KeelResult<bool>;

    fn set_flash(&self, segment: &str, key: &str, value: Value) -> KeelResult<()>;

    fn add_flash(&self, segment: &str, key: &str, value: Value) -> KeelResult<()>;

    /// Read and remove a flash value.
    fn take_flash(&self, segment: &str, key: &str) -> KeelResult<Option<Value>>;

    fn reset_flash(&self, segment: &str) -> KeelResult<()>;

    /// Clear both normal and flash values in `segment`.
    fn reset_all(&self, segment: &str) -> KeelResult<()>;
}
