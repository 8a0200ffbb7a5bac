//! In-memory template store with built-in views.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use keel_core::{
    application::{ApplicationError, ports::TemplateStore},
    error::KeelResult,
};

use crate::builtin_templates;

/// Thread-safe in-memory template store.
///
/// Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryTemplateStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the built-in `notFound`, `exception` and
    /// `error` views.
    pub fn with_builtin() -> KeelResult<Self> {
        let store = Self::new();
        store.load_builtin()?;
        Ok(store)
    }

    pub fn load_builtin(&self) -> KeelResult<()> {
        for (path, source) in builtin_templates::all() {
            self.insert(path, source)?;
        }
        Ok(())
    }

    /// Add or replace the template at `path`.
    pub fn insert(&self, path: impl Into<String>, source: impl Into<String>) -> KeelResult<()> {
        let mut inner = self.inner.write().map_err(|_| lock_error("insert"))?;
        inner.insert(path.into(), source.into());
        Ok(())
    }

    pub fn remove(&self, path: &str) -> KeelResult<Option<String>> {
        let mut inner = self.inner.write().map_err(|_| lock_error("remove"))?;
        Ok(inner.remove(path))
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) -> KeelResult<()> {
        let mut inner = self.inner.write().map_err(|_| lock_error("clear"))?;
        inner.clear();
        Ok(())
    }
}

impl<P: Into<String>, S: Into<String>> FromIterator<(P, S)> for MemoryTemplateStore {
    fn from_iter<I: IntoIterator<Item = (P, S)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(path, source)| (path.into(), source.into()))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(entries)),
        }
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn load(&self, path: &str) -> KeelResult<Option<String>> {
        let inner = self.inner.read().map_err(|_| lock_error(path))?;
        Ok(inner.get(path).cloned())
    }

    fn list(&self) -> KeelResult<Vec<String>> {
        let inner = self.inner.read().map_err(|_| lock_error("list"))?;
        let mut paths: Vec<_> = inner.keys().cloned().collect();
        paths.sort();
        Ok(paths)
    }
}

fn lock_error(path: &str) -> ApplicationError {
    ApplicationError::TemplateStoreError {
        path: path.to_owned(),
        reason: "lock poisoned".into(),
    }
}
