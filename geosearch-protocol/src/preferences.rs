//! Plugin preference resolution.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A plugin's active preference set for one request.
///
/// Built fresh per request: the plugin's fixed defaults, with any
/// request-supplied key/value pairs merged on top. Override wins on key
/// collision; keys absent from the override keep their defaults; keys
/// the core does not interpret are retained so downstream layers can
/// recognize them. Resolution has no failure modes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginPreferences {
    values: HashMap<String, String>,
}

impl PluginPreferences {
    /// Create an empty preference set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a preference set from key/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Merge `overrides` on top of the current values.
    ///
    /// An empty override map is the identity.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) {
        for (key, value) in overrides {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Look up a preference value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set a single preference value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all key/value pairs (unordered).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
