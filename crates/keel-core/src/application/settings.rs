//! Typed dispatch settings.
//!
//! Configuration arrives as loose key/value pairs through [`ConfigStore`].
//! [`DispatchSettings::from_store`] validates it once at startup; the result
//! is shared immutably for the life of the process.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::application::{ApplicationError, ports::ConfigStore};
use crate::domain::{PlaceholderTable, RouteResolver, RouteRule};
use crate::error::KeelResult;

pub const DEFAULT_NAMESPACE: &str = "App_Controller_";
pub const DEFAULT_LAYOUT_DIR: &str = "app/layout";

/// Rewrite configuration: placeholder tokens and ordered rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    /// Tokens merged over [`PlaceholderTable::standard`].
    pub replace: PlaceholderTable,
    /// Rules in priority order.
    pub rewrite: Vec<RouteRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    pub default_controller: Option<String>,
    pub default_action: Option<String>,
    pub default_layout: Option<String>,
    pub charset: Option<String>,
    pub controller_namespace: String,
    pub template_extension: String,
    pub layout_var: String,
    pub layout_dirs: Vec<String>,
    pub max_forward_depth: usize,
    pub routing: RoutingSettings,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            default_controller: None,
            default_action: None,
            default_layout: None,
            charset: Some("utf-8".into()),
            controller_namespace: DEFAULT_NAMESPACE.into(),
            template_extension: "tpl".into(),
            layout_var: "layout_content".into(),
            layout_dirs: vec![DEFAULT_LAYOUT_DIR.into()],
            max_forward_depth: 32,
            routing: RoutingSettings::default(),
        }
    }
}

impl DispatchSettings {
    /// Read and validate settings from a configuration store.
    ///
    /// Unknown keys are ignored; missing keys take their defaults.
    pub fn from_store(store: &dyn ConfigStore) -> KeelResult<Self> {
        let mut object = Map::new();
        for key in store.keys() {
            if let Some(value) = store.get(&key) {
                object.insert(key, value);
            }
        }

        let settings: Self = serde_json::from_value(Value::Object(object)).map_err(|e| {
            ApplicationError::InvalidSettings {
                key: "dispatch".into(),
                reason: e.to_string(),
            }
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check cross-field constraints and compile the rewrite rules once.
    pub fn validate(&self) -> KeelResult<()> {
        if self.max_forward_depth == 0 {
            return Err(ApplicationError::InvalidSettings {
                key: "max_forward_depth".into(),
                reason: "must be at least 1".into(),
            }
            .into());
        }
        if self.template_extension.is_empty() {
            return Err(ApplicationError::InvalidSettings {
                key: "template_extension".into(),
                reason: "must not be empty".into(),
            }
            .into());
        }
        self.resolver()?;
        Ok(())
    }

    /// Placeholder table in effect: standard tokens plus configured ones.
    pub fn placeholders(&self) -> PlaceholderTable {
        let mut table = PlaceholderTable::standard();
        table.extend(&self.routing.replace);
        table
    }

    pub fn resolver(&self) -> KeelResult<RouteResolver> {
        Ok(RouteResolver::new(
            self.routing.rewrite.iter().cloned(),
            &self.placeholders(),
        )?)
    }

    /// `name.ext` using the configured template extension.
    pub fn template_file(&self, name: &str) -> String {
        format!("{name}.{}", self.template_extension)
    }
}

/// In-memory [`ConfigStore`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapConfig {
    values: BTreeMap<String, Value>,
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level entries of a JSON object; anything else yields an empty store.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self {
                values: map.into_iter().collect(),
            },
            _ => Self::default(),
        }
    }

    /// Builder-style `set`.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.values.insert(key.to_owned(), value.into());
        self
    }

    /// Overlay every entry of `other`, replacing existing keys.
    pub fn merge(&mut self, other: MapConfig) {
        self.values.extend(other.values);
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone().into_iter().collect())
    }
}

impl ConfigStore for MapConfig {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_owned(), value);
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCategory, KeelError};
    use serde_json::json;

    #[test]
    fn empty_store_gives_defaults() {
        let settings = DispatchSettings::from_store(&MapConfig::new()).unwrap();
        assert_eq!(settings, DispatchSettings::default());
        assert_eq!(settings.charset.as_deref(), Some("utf-8"));
        assert_eq!(settings.layout_var, "layout_content");
    }

    #[test]
    fn reads_routing_tables() {
        let store = MapConfig::new()
            .with("default_controller", "index")
            .with(
                "routing",
                json!({
                    "replace": { "{:year}": "[0-9]{4}" },
                    "rewrite": [
                        { "from": "archive/{:year}", "to": "blog/archive/$1" },
                        { "from": "index/{:alpha}", "to": "index/main/$1" }
                    ]
                }),
            );

        let settings = DispatchSettings::from_store(&store).unwrap();
        assert_eq!(settings.default_controller.as_deref(), Some("index"));
        assert_eq!(settings.routing.rewrite.len(), 2);

        let resolver = settings.resolver().unwrap();
        let rewritten = resolver.resolve(&["archive".to_string(), "2024".to_string()]);
        assert_eq!(rewritten, ["blog", "archive", "2024"]);
        let rewritten = resolver.resolve(&["index".to_string(), "hello".to_string()]);
        assert_eq!(rewritten, ["index", "main", "hello"]);
    }

    #[test]
    fn wrong_type_is_a_configuration_error() {
        let store = MapConfig::new().with("max_forward_depth", "lots");
        let err = DispatchSettings::from_store(&store).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn zero_forward_depth_rejected() {
        let store = MapConfig::new().with("max_forward_depth", 0);
        assert!(matches!(
            DispatchSettings::from_store(&store),
            Err(KeelError::Application(ApplicationError::InvalidSettings { .. }))
        ));
    }

    #[test]
    fn bad_rewrite_pattern_rejected() {
        let store = MapConfig::new().with(
            "routing",
            json!({ "rewrite": [{ "from": "broken/(", "to": "x" }] }),
        );
        assert!(matches!(
            DispatchSettings::from_store(&store),
            Err(KeelError::Domain(_))
        ));
    }

    #[test]
    fn get_or_falls_back() {
        let store = MapConfig::new().with("charset", "latin-1");
        assert_eq!(store.get_or("charset", json!("utf-8")), json!("latin-1"));
        assert_eq!(store.get_or("missing", json!(7)), json!(7));
    }

    #[test]
    fn merge_overrides_keys() {
        let mut base = MapConfig::new().with("a", 1).with("b", 2);
        base.merge(MapConfig::new().with("b", 3));
        assert_eq!(base.get("b"), Some(json!(3)));
        assert_eq!(base.keys(), ["a", "b"]);
    }
}
