//! Several template stores searched in order.

use std::sync::Arc;

use keel_core::{application::ports::TemplateStore, error::KeelResult};

/// Searches its layers in order; the first store holding a path wins.
///
/// Typical use puts a [`LocalTemplateStore`](super::LocalTemplateStore)
/// first and the built-in views last, so files on disk override them.
#[derive(Clone, Default)]
pub struct LayeredTemplateStore {
    layers: Vec<Arc<dyn TemplateStore>>,
}

impl LayeredTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer with lower priority than the existing ones.
    pub fn layer(mut self, store: Arc<dyn TemplateStore>) -> Self {
        self.layers.push(store);
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl std::fmt::Debug for LayeredTemplateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredTemplateStore")
            .field("layers", &self.layers.len())
            .finish()
    }
}

impl TemplateStore for LayeredTemplateStore {
    fn load(&self, path: &str) -> KeelResult<Option<String>> {
        for layer in &self.layers {
            if let Some(source) = layer.load(path)? {
                return Ok(Some(source));
            }
        }
        Ok(None)
    }

    fn list(&self) -> KeelResult<Vec<String>> {
        let mut paths = Vec::new();
        for layer in &self.layers {
            paths.extend(layer.list()?);
        }
        paths.sort();
        paths.dedup();
        Ok(paths)
    }
}
