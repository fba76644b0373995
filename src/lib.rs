//! # agrimap
//!
//! Layer registry and vector-tile loading core for agricultural GIS dashboards.
//!
//! The crate sits between a map instance and remote GIS endpoints: it keeps an
//! ordered, keyed registry of heterogeneous layers whose z-order mirrors the
//! map's layer collection, builds layers from data that arrives asynchronously,
//! and loads MVT tiles with a loader that treats `204 No Content` as an empty
//! tile instead of a transport failure.

pub mod core;
pub mod data;
pub mod layers;
pub mod prelude;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    config::{LayerManagerConfig, TileLoaderConfig},
    geo::{Extent, LatLng, Point, Projection, TileCoord},
    map::{LayerEvent, Map, View},
};

pub use layers::{
    base::{LayerKind, LayerProperties, LayerRef, LayerType},
    factory::{create_vector_layer, VectorLayerOptions},
    manager::LayerManager,
    vector::{Feature, FeatureId, VectorLayer, VectorSource},
    wrapper::{LayerConfig, LayerWrapper},
    Pending,
};

pub use tiles::{
    format::{FeatureFormat, FormatType, GeoJsonFormat, MvtFormat},
    grid::TileGrid,
    loader::{load_features_with_204, TileLoadOutcome, TileLoader},
    source::{QueryParams, RequestMode, VectorTileSource},
    transport::{ReqwestTransport, TileRequest, TileResponse, TileTransport},
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A layer wrapper was built from an unsupported or incomplete variant.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The operation does not apply to the wrapped layer variant.
    #[error("Operation `{operation}` is not supported by {layer_type} layers")]
    UnsupportedOperation {
        operation: &'static str,
        layer_type: layers::base::LayerType,
    },

    /// The layer's source does not carry features.
    #[error("Layer `{0}` does not have a vector source")]
    InvalidSource(String),

    #[error("Layer `{0}` is not registered")]
    LayerNotFound(String),

    /// A transport other than `reqwest` could not complete the request.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Error type alias for convenience
pub type Error = MapError;
