//! Configuration for the layer registry and the tile loader
//!
//! Every struct deserializes from JSON so a dashboard can ship its map
//! settings next to the rest of its configuration. Missing fields fall back to
//! the defaults below.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::constants::{
    DEFAULT_ZOOM_LEVELS, TILE_LAYER_KEY, TILE_LAYER_Z_INDEX, TOP_ANCHOR_LAYER_KEY,
};
use crate::Result;

/// Reserved keys and defaults used by [`crate::LayerManager`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerManagerConfig {
    /// Key whose layer always sits at index 0 of the map.
    pub tile_key: String,
    /// Key whose layer always sits at the last index of the map.
    pub top_anchor_key: String,
    /// Z-index assigned to the background layer when none is supplied.
    pub tile_z_index: i32,
}

impl Default for LayerManagerConfig {
    fn default() -> Self {
        Self {
            tile_key: TILE_LAYER_KEY.to_string(),
            top_anchor_key: TOP_ANCHOR_LAYER_KEY.to_string(),
            tile_z_index: TILE_LAYER_Z_INDEX,
        }
    }
}

impl LayerManagerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_reserved(&self, key: &str) -> bool {
        key == self.tile_key || key == self.top_anchor_key
    }
}

/// Configuration for the HTTP side of tile loading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLoaderConfig {
    /// Per-request timeout handed to the HTTP client; `None` leaves it to the
    /// client's own behaviour.
    #[serde(with = "optional_millis")]
    pub timeout: Option<Duration>,
    /// User agent sent with tile requests
    pub user_agent: String,
    /// Number of decoded tiles a vector-tile layer keeps around
    pub cache_size: usize,
    /// Zoom levels in the tile grid
    pub zoom_levels: usize,
}

impl Default for TileLoaderConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: concat!("agrimap/", env!("CARGO_PKG_VERSION")).to_string(),
            cache_size: 512,
            zoom_levels: DEFAULT_ZOOM_LEVELS,
        }
    }
}

/// Unified configuration presets for TileLoaderConfig
impl TileLoaderConfig {
    pub fn low_resource() -> Self {
        Self {
            cache_size: 64,
            ..Self::default()
        }
    }

    pub fn for_testing() -> Self {
        Self {
            timeout: Some(Duration::from_secs(5)),
            cache_size: 16,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

mod optional_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
