//! Prelude module for common agrimap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use agrimap::prelude::*;`

pub use crate::core::{
    config::{LayerManagerConfig, TileLoaderConfig},
    geo::{Extent, LatLng, Point, Projection, TileCoord},
    map::{LayerEvent, Map, View},
};

pub use crate::data::geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry};

pub use crate::layers::{
    base::{CustomRenderable, LayerKind, LayerProperties, LayerRef, LayerType},
    factory::{create_vector_layer, VectorLayerOptions},
    image::ImageLayer,
    manager::LayerManager,
    style::{LayerStyle, Stroke, Style},
    tile::TileLayer,
    vector::{Feature, FeatureId, VectorLayer, VectorSource},
    vector_tile::{TileState, VectorTileLayer},
    wrapper::{LayerConfig, LayerWrapper},
    Pending,
};

pub use crate::tiles::{
    format::{FeatureFormat, FormatType, GeoJsonFormat, MvtFormat, ResponseBody},
    grid::TileGrid,
    loader::{load_features_with_204, TileLoadOutcome, TileLoader},
    source::{PreparedTile, QueryParams, RequestMode, VectorTileSource},
    transport::{HttpMethod, ReqwestTransport, TileRequest, TileResponse, TileTransport},
};

pub use crate::{Error as MapError, Result};

pub use std::sync::{Arc, RwLock};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub use futures::future::BoxFuture;
