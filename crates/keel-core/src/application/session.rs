//! Controller-scoped view of the session store.

use serde_json::Value;

use crate::application::ports::SessionStore;
use crate::error::KeelResult;

/// Session values for one segment (the controller name).
pub struct Session<'a> {
    store: &'a dyn SessionStore,
    segment: &'a str,
}

impl<'a> Session<'a> {
    pub fn new(store: &'a dyn SessionStore, segment: &'a str) -> Self {
        Self { store, segment }
    }

    pub fn segment(&self) -> &str {
        self.segment
    }

    pub fn is_started(&self) -> bool {
        self.store.is_started()
    }

    pub fn has(&self, key: &str) -> KeelResult<bool> {
        self.store.has(self.segment, key)
    }

    pub fn get(&self, key: &str) -> KeelResult<Option<Value>> {
        self.store.get(self.segment, key)
    }

    /// Value at `key`, or `default` when unset.
    pub fn get_or(&self, key: &str, default: Value) -> KeelResult<Value> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) -> KeelResult<()> {
        self.store.set(self.segment, key, value.into())
    }

    pub fn add(&self, key: &str, value: impl Into<Value>) -> KeelResult<()> {
        self.store.add(self.segment, key, value.into())
    }

    pub fn delete(&self, key: &str) -> KeelResult<()> {
        self.store.delete(self.segment, key)
    }

    pub fn reset(&self) -> KeelResult<()> {
        self.store.reset(self.segment)
    }

    pub fn has_flash(&self, key: &str) -> KeelResult<bool> {
        self.store.has_flash(self.segment, key)
    }

    pub fn set_flash(&self, key: &str, value: impl Into<Value>) -> KeelResult<()> {
        self.store.set_flash(self.segment, key, value.into())
    }

    pub fn add_flash(&self, key: &str, value: impl Into<Value>) -> KeelResult<()> {
        self.store.add_flash(self.segment, key, value.into())
    }

    /// Read a flash value; it is gone afterwards.
    pub fn take_flash(&self, key: &str) -> KeelResult<Option<Value>> {
        self.store.take_flash(self.segment, key)
    }

    pub fn reset_flash(&self) -> KeelResult<()> {
        self.store.reset_flash(self.segment)
    }

    pub fn reset_all(&self) -> KeelResult<()> {
        self.store.reset_all(self.segment)
    }
}
