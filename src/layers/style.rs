//! Styles carried by vector and vector-tile layers.
//!
//! Drawing is the map widget's business; the layers only hold the style value
//! (static or computed per feature) and hand it out on request.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::layers::vector::Feature;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
}

/// Style information for rendering features; fields missing from JSON
/// keep their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub fill: Option<String>,
    pub stroke: Option<Stroke>,
    /// Point radius in pixels
    pub radius: Option<f64>,
    pub text: Option<String>,
    pub z_index: Option<i32>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: Some("rgba(51, 136, 255, 0.2)".to_string()),
            stroke: Some(Stroke {
                color: "#3388ff".to_string(),
                width: 1.25,
            }),
            radius: Some(5.0),
            text: None,
            z_index: None,
        }
    }
}

/// Per-feature style callback, called with the feature and the current resolution.
pub type StyleFunction = Arc<dyn Fn(&Feature, f64) -> Option<Style> + Send + Sync>;

#[derive(Clone)]
pub enum LayerStyle {
    Static(Style),
    Function(StyleFunction),
}

impl LayerStyle {
    pub fn function<F>(style_fn: F) -> Self
    where
        F: Fn(&Feature, f64) -> Option<Style> + Send + Sync + 'static,
    {
        LayerStyle::Function(Arc::new(style_fn))
    }

    /// Gets the style for a specific feature; `None` hides the feature.
    pub fn resolve(&self, feature: &Feature, resolution: f64) -> Option<Style> {
        match self {
            LayerStyle::Static(style) => Some(style.clone()),
            LayerStyle::Function(style_fn) => style_fn(feature, resolution),
        }
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        LayerStyle::Static(Style::default())
    }
}

impl From<Style> for LayerStyle {
    fn from(style: Style) -> Self {
        LayerStyle::Static(style)
    }
}

impl std::fmt::Debug for LayerStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerStyle::Static(style) => f.debug_tuple("Static").field(style).finish(),
            LayerStyle::Function(_) => f.write_str("Function(..)"),
        }
    }
}
