use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::layers::{
    image::ImageLayer, tile::TileLayer, vector::VectorLayer, vector_tile::VectorTileLayer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerType {
    Tile,
    Vector,
    Image,
    VectorTile,
    Custom,
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerType::Tile => write!(f, "tile"),
            LayerType::Vector => write!(f, "vector"),
            LayerType::Image => write!(f, "image"),
            LayerType::VectorTile => write!(f, "vectorTile"),
            LayerType::Custom => write!(f, "custom"),
        }
    }
}

/// State every renderable carries regardless of its variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerProperties {
    /// Unset until the layer is positioned explicitly or renumbered by a move.
    pub z_index: Option<i32>,
    pub opacity: f32,
    pub visible: bool,
}

impl LayerProperties {
    pub fn new() -> Self {
        Self {
            z_index: None,
            opacity: 1.0,
            visible: true,
        }
    }
}

impl Default for LayerProperties {
    fn default() -> Self {
        Self::new()
    }
}

/// An opaque renderer the registry stores without knowing how it draws.
pub trait CustomRenderable: Send + Sync + std::fmt::Debug {
    /// Short description used in logs
    fn describe(&self) -> &str;

    /// Dynamic casting support
    fn as_any(&self) -> &dyn std::any::Any;
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

/// The concrete renderable behind a layer
#[derive(Debug)]
pub enum LayerKind {
    Tile(TileLayer),
    Vector(VectorLayer),
    Image(ImageLayer),
    VectorTile(VectorTileLayer),
    Custom(Box<dyn CustomRenderable>),
}

impl LayerKind {
    pub fn layer_type(&self) -> LayerType {
        match self {
            LayerKind::Tile(_) => LayerType::Tile,
            LayerKind::Vector(_) => LayerType::Vector,
            LayerKind::Image(_) => LayerType::Image,
            LayerKind::VectorTile(_) => LayerType::VectorTile,
            LayerKind::Custom(_) => LayerType::Custom,
        }
    }
}

/// A renderable as attached to the map: shared properties plus its variant.
#[derive(Debug)]
pub struct MapLayer {
    pub properties: LayerProperties,
    pub kind: LayerKind,
}

impl MapLayer {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            properties: LayerProperties::new(),
            kind,
        }
    }

    pub fn layer_type(&self) -> LayerType {
        self.kind.layer_type()
    }
}

/// Shared handle to a renderable.
///
/// The registry and the map's layer collection hold clones of the same handle;
/// two handles refer to the same renderable exactly when [`LayerRef::ptr_eq`]
/// says so.
#[derive(Debug, Clone)]
pub struct LayerRef(Arc<RwLock<MapLayer>>);

impl LayerRef {
    pub fn new(kind: LayerKind) -> Self {
        Self::from_layer(MapLayer::new(kind))
    }

    pub fn from_layer(layer: MapLayer) -> Self {
        Self(Arc::new(RwLock::new(layer)))
    }

    /// Identity comparison, not structural equality
    pub fn ptr_eq(&self, other: &LayerRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn read(&self) -> RwLockReadGuard<'_, MapLayer> {
        self.0.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, MapLayer> {
        self.0.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn layer_type(&self) -> LayerType {
        self.read().layer_type()
    }

    pub fn is_visible(&self) -> bool {
        self.read().properties.visible
    }

    pub fn set_visible(&self, visible: bool) {
        self.write().properties.visible = visible;
    }

    pub fn z_index(&self) -> Option<i32> {
        self.read().properties.z_index
    }

    pub fn set_z_index(&self, z_index: i32) {
        self.write().properties.z_index = Some(z_index);
    }

    pub fn opacity(&self) -> f32 {
        self.read().properties.opacity
    }

    pub fn set_opacity(&self, opacity: f32) {
        self.write().properties.opacity = opacity.clamp(0.0, 1.0);
    }
}
