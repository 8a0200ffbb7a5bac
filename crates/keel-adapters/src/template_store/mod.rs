//! Template store adapters.

pub mod layered;
pub mod local;
pub mod memory;

pub use layered::LayeredTemplateStore;
pub use local::LocalTemplateStore;
pub use memory::MemoryTemplateStore;
