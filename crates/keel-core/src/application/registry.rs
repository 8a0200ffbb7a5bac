//! Controller lookup by first path segment, with fallback.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::application::controller::ControllerSpec;
use crate::domain::{Uri, naming};

/// How [`ControllerRegistry::locate`] picked a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The first segment named a registered controller.
    Direct,
    /// The default controller was used and its name prepended to the path.
    DefaultController,
    /// Nothing matched; the generic controller answers "not found".
    Generic,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Direct => "direct",
            Self::DefaultController => "default controller",
            Self::Generic => "generic",
        })
    }
}

/// Result of locating a controller.
#[derive(Debug, Clone)]
pub struct Located {
    pub spec: Arc<ControllerSpec>,
    /// The path the controller will dispatch, possibly with the default
    /// controller name in front.
    pub uri: Uri,
    pub resolution: Resolution,
}

/// Controllers registered at startup, keyed by `namespace + Name`.
#[derive(Debug, Clone)]
pub struct ControllerRegistry {
    namespace: String,
    controllers: HashMap<String, Arc<ControllerSpec>>,
    generic: Arc<ControllerSpec>,
}

impl ControllerRegistry {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            controllers: HashMap::new(),
            generic: Arc::new(ControllerSpec::generic()),
        }
    }

    /// Register `spec`, replacing any controller with the same identifier.
    pub fn register(&mut self, spec: ControllerSpec) -> Option<Arc<ControllerSpec>> {
        let id = naming::controller_id(&self.namespace, spec.name());
        debug!(%id, "controller registered");
        self.controllers.insert(id, Arc::new(spec))
    }

    pub fn get(&self, segment: &str) -> Option<&Arc<ControllerSpec>> {
        if segment.is_empty() {
            return None;
        }
        self.controllers
            .get(&naming::controller_id(&self.namespace, segment))
    }

    pub fn contains(&self, segment: &str) -> bool {
        self.get(segment).is_some()
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.controllers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Registered controllers, sorted by name.
    pub fn specs(&self) -> Vec<&Arc<ControllerSpec>> {
        let mut specs: Vec<_> = self.controllers.values().collect();
        specs.sort_by(|a, b| a.name().cmp(b.name()));
        specs
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn generic(&self) -> &Arc<ControllerSpec> {
        &self.generic
    }

    /// Pick the controller for `uri`.
    ///
    /// 1. The first segment names a registered controller.
    /// 2. Otherwise the default controller, if registered, with its name
    ///    placed in front of the path.
    /// 3. Otherwise the generic controller.
    pub fn locate(&self, uri: &Uri, default_controller: Option<&str>) -> Located {
        let first = uri.path().first().map(String::as_str).unwrap_or_default();

        if let Some(spec) = self.get(first) {
            return Located {
                spec: Arc::clone(spec),
                uri: uri.clone(),
                resolution: Resolution::Direct,
            };
        }

        if let Some((name, spec)) =
            default_controller.and_then(|name| self.get(name).map(|spec| (name, spec)))
        {
            debug!(requested = first, default = name, "falling back to default controller");
            return Located {
                spec: Arc::clone(spec),
                uri: uri.with_leading(name),
                resolution: Resolution::DefaultController,
            };
        }

        debug!(requested = first, "no controller found, using generic");
        Located {
            spec: Arc::clone(&self.generic),
            uri: uri.clone(),
            resolution: Resolution::Generic,
        }
    }
}

impl Default for ControllerRegistry {
    fn default() -> Self {
        Self::new(crate::application::settings::DEFAULT_NAMESPACE)
    }
}
