//! Display styles and the per-response style registry.
//!
//! Styles are stored once per response and referenced from result
//! entries by id, so many results sharing one style never duplicate the
//! definition. Field values stay as the raw preference strings (KML
//! `aabbggrr` colors, numeric scales as text); interpreting them is the
//! presentation layer's concern.

use crate::preferences::PluginPreferences;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Preference keys understood by the style resolver.
///
/// Request parameters using these keys override the plugin's built-in
/// style defaults; any other keys pass through untouched for layers
/// further down.
pub mod keys {
    pub const BALLOON_BG_COLOR: &str = "balloonstyle.bgcolor";
    pub const BALLOON_TEXT_COLOR: &str = "balloonstyle.textcolor";
    pub const BALLOON_TEXT: &str = "balloonstyle.text";
    pub const ICON_SCALE: &str = "iconstyle.scale";
    pub const ICON_HREF: &str = "iconstyle.href";
    pub const LINE_COLOR: &str = "linestyle.color";
    pub const LINE_WIDTH: &str = "linestyle.width";
    pub const POLY_COLOR: &str = "polystyle.color";
    pub const POLY_COLOR_MODE: &str = "polystyle.colormode";
    pub const POLY_FILL: &str = "polystyle.fill";
    pub const POLY_OUTLINE: &str = "polystyle.outline";
}

/// A visual style for rendered geometry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balloon_bg_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balloon_text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balloon_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_scale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poly_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poly_color_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poly_fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poly_outline: Option<String>,
}

impl StyleDefinition {
    /// Project the style fields out of a resolved preference set.
    pub fn from_preferences(prefs: &PluginPreferences) -> Self {
        let get = |key: &str| prefs.get(key).map(str::to_string);
        Self {
            balloon_bg_color: get(keys::BALLOON_BG_COLOR),
            balloon_text_color: get(keys::BALLOON_TEXT_COLOR),
            balloon_text: get(keys::BALLOON_TEXT),
            icon_scale: get(keys::ICON_SCALE),
            icon_href: get(keys::ICON_HREF),
            line_color: get(keys::LINE_COLOR),
            line_width: get(keys::LINE_WIDTH),
            poly_color: get(keys::POLY_COLOR),
            poly_color_mode: get(keys::POLY_COLOR_MODE),
            poly_fill: get(keys::POLY_FILL),
            poly_outline: get(keys::POLY_OUTLINE),
        }
    }
}

/// Style definitions keyed by identifier.
///
/// Registration is first-write-wins: re-registering an id is a no-op,
/// which makes per-row registration during assembly idempotent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleRegistry {
    styles: BTreeMap<String, StyleDefinition>,
}

impl StyleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a style under `id` unless one is already present.
    ///
    /// Returns whether the definition was inserted.
    pub fn register(&mut self, id: impl Into<String>, style: StyleDefinition) -> bool {
        use std::collections::btree_map::Entry;
        match self.styles.entry(id.into()) {
            Entry::Vacant(slot) => {
                slot.insert(style);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Look up a style by id.
    pub fn get(&self, id: &str) -> Option<&StyleDefinition> {
        self.styles.get(id)
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.styles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Iterate styles in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleDefinition)> {
        self.styles.iter().map(|(k, v)| (k.as_str(), v))
    }
}
