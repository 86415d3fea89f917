//! Presentation Configuration
//!
//! Icon assets and popup options handed to `MapLayer` at startup.

use serde::{Deserialize, Serialize};

/// Icon artwork is 299px square; markers draw it at a tenth of that.
const ICON_SCALE: f64 = 10.0;

/// One marker icon asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerIcon {
    pub url: String,
    /// Rendered size in pixels, `[width, height]`
    pub size: [f64; 2],
    /// Point of the icon placed on the position, `[x, y]`
    pub anchor: [f64; 2],
}

impl MarkerIcon {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            size: [299.0 / ICON_SCALE, 299.0 / ICON_SCALE],
            anchor: [153.0 / ICON_SCALE, 182.0 / ICON_SCALE],
        }
    }
}

/// Which of the two icon states a marker shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconVariant {
    Default,
    Highlighted,
}

/// The two icons a host supplies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconSet {
    pub default: MarkerIcon,
    pub highlighted: MarkerIcon,
}

impl IconSet {
    pub fn get(&self, variant: IconVariant) -> &MarkerIcon {
        match variant {
            IconVariant::Default => &self.default,
            IconVariant::Highlighted => &self.highlighted,
        }
    }
}

impl Default for IconSet {
    fn default() -> Self {
        Self {
            default: MarkerIcon::new("/catmap/catmeow.png"),
            highlighted: MarkerIcon::new("/catmap/catmeow_highlight.png"),
        }
    }
}

/// Options for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    pub icons: IconSet,
    /// Prefix for relative image references in popups
    pub image_base_url: Option<String>,
    /// Open every popup of a cat when it is selected
    pub open_popups_on_select: bool,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            icons: IconSet::default(),
            image_base_url: None,
            open_popups_on_select: true,
        }
    }
}

impl PresentationConfig {
    /// Parse from JSON; absent fields keep their defaults
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
