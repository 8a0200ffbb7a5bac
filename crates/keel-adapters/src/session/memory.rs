//! Process-local session storage.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use serde_json::{Map, Value};
use tracing::debug;

use keel_core::{
    application::{ApplicationError, ports::SessionStore},
    error::KeelResult,
};

type Segments = HashMap<String, Map<String, Value>>;

#[derive(Debug, Default)]
struct SessionState {
    started: bool,
    store: Segments,
    flash: Segments,
}

impl SessionState {
    fn start(&mut self) {
        if !self.started {
            debug!("session started");
            self.started = true;
        }
    }

    fn segment(&mut self, flash: bool, segment: &str) -> &mut Map<String, Value> {
        let segments = if flash {
            &mut self.flash
        } else {
            &mut self.store
        };
        segments.entry(segment.to_owned()).or_default()
    }

    fn lookup(&self, flash: bool, segment: &str, key: &str) -> Option<&Value> {
        if !self.started {
            return None;
        }
        let segments = if flash { &self.flash } else { &self.store };
        segments.get(segment)?.get(key)
    }
}

/// In-memory [`SessionStore`] for one client.
///
/// Starts on the first write. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    state: Arc<RwLock<SessionState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that behaves as if a previous request already started it.
    pub fn started() -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.write() {
            state.started = true;
        }
        store
    }

    /// Start the session explicitly. Starting twice has no effect.
    pub fn start(&self) -> KeelResult<()> {
        self.write()?.start();
        Ok(())
    }

    fn read(&self) -> KeelResult<RwLockReadGuard<'_, SessionState>> {
        Ok(self
            .state
            .read()
            .map_err(|_| ApplicationError::SessionLockError)?)
    }

    fn write(&self) -> KeelResult<RwLockWriteGuard<'_, SessionState>> {
        Ok(self
            .state
            .write()
            .map_err(|_| ApplicationError::SessionLockError)?)
    }

    fn push(&self, flash: bool, segment: &str, key: &str, value: Value) -> KeelResult<()> {
        let mut state = self.write()?;
        state.start();
        let entry = state
            .segment(flash, segment)
            .entry(key.to_owned())
            .or_insert_with(|| Value::Array(Vec::new()));
        match entry {
            Value::Array(items) => items.push(value),
            other => {
                let previous = other.take();
                *other = if previous.is_null() {
                    Value::Array(vec![value])
                } else {
                    Value::Array(vec![previous, value])
                };
            }
        }
        Ok(())
    }
}

impl SessionStore for MemorySessionStore {
    fn is_started(&self) -> bool {
        self.state.read().map(|s| s.started).unwrap_or(false)
    }

    fn has(&self, segment: &str, key: &str) -> KeelResult<bool> {
        Ok(self.read()?.lookup(false, segment, key).is_some())
    }

    fn get(&self, segment: &str, key: &str) -> KeelResult<Option<Value>> {
        Ok(self.read()?.lookup(false, segment, key).cloned())
    }

    fn set(&self, segment: &str, key: &str, value: Value) -> KeelResult<()> {
        let mut state = self.write()?;
        state.start();
        state.segment(false, segment).insert(key.to_owned(), value);
        Ok(())
    }

    fn add(&self, segment: &str, key: &str, value: Value) -> KeelResult<()> {
        self.push(false, segment, key, value)
    }

    fn delete(&self, segment: &str, key: &str) -> KeelResult<()> {
        let mut state = self.write()?;
        if let Some(values) = state.store.get_mut(segment) {
            values.remove(key);
        }
        Ok(())
    }

    fn reset(&self, segment: &str) -> KeelResult<()> {
        let mut state = self.write()?;
        if state.started {
            state.store.remove(segment);
        }
        Ok(())
    }

    fn has_flash(&self, segment: &str, key: &str) -> KeelResult<bool> {
        Ok(self.read()?.lookup(true, segment, key).is_some())
    }

    fn set_flash(&self, segment: &str, key: &str, value: Value) -> KeelResult<()> {
        let mut state = self.write()?;
        state.start();
        state.segment(true, segment).insert(key.to_owned(), value);
        Ok(())
    }

    fn add_flash(&self, segment: &str, key: &str, value: Value) -> KeelResult<()> {
        self.push(true, segment, key, value)
    }

    fn take_flash(&self, segment: &str, key: &str) -> KeelResult<Option<Value>> {
        let mut state = self.write()?;
        if !state.started {
            return Ok(None);
        }
        Ok(state.flash.get_mut(segment).and_then(|f| f.remove(key)))
    }

    fn reset_flash(&self, segment: &str) -> KeelResult<()> {
        let mut state = self.write()?;
        if state.started {
            state.flash.remove(segment);
        }
        Ok(())
    }

    fn reset_all(&self, segment: &str) -> KeelResult<()> {
        self.reset(segment)?;
        self.reset_flash(segment)
    }
}
