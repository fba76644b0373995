//! The uniform handle the registry stores for every layer variant.
//!
//! Variant-specific operations are checked against the wrapped [`LayerKind`]
//! and fail with [`MapError::UnsupportedOperation`] instead of being silently
//! ignored.

use serde::{Deserialize, Serialize};

use crate::{
    core::geo::{Extent, Projection},
    data::geojson::GeoJson,
    layers::{
        base::{CustomRenderable, LayerKind, LayerRef, LayerType},
        image::ImageLayer,
        style::{LayerStyle, Style},
        tile::TileLayer,
        vector::{Feature, VectorLayer, VectorSource},
        vector_tile::VectorTileLayer,
    },
    tiles::{
        params::QueryParams,
        source::VectorTileSource,
    },
    MapError, Result,
};

/// Declarative description of a layer, as shipped in dashboard configuration.
///
/// ```json
/// {"type": "vectorTile", "baseUrl": "https://gis.example.kr", "layerName": "jeju_emd"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LayerConfig {
    Tile {
        url: Option<String>,
    },
    Vector {
        /// Inline GeoJSON, already in map projection
        #[serde(default)]
        features: Option<serde_json::Value>,
        #[serde(default)]
        style: Option<Style>,
    },
    Image {
        url: Option<String>,
        extent: Option<Extent>,
        #[serde(default)]
        projection: Option<Projection>,
    },
    VectorTile {
        #[serde(rename = "baseUrl")]
        base_url: Option<String>,
        /// Generic GIS layer; when absent the farm-field endpoint is used
        #[serde(default, rename = "layerName")]
        layer_name: Option<String>,
        #[serde(default)]
        params: Option<serde_json::Value>,
        /// Send `params` as a JSON body instead of the query string
        #[serde(default)]
        post: bool,
        #[serde(default)]
        style: Option<Style>,
    },
}

fn required<T>(value: Option<T>, field: &str, layer_type: &str) -> Result<T> {
    value.ok_or_else(|| {
        MapError::Configuration(format!("{} layer requires `{}`", layer_type, field))
    })
}

impl LayerConfig {
    /// Builds the renderable this configuration describes
    pub fn build(self) -> Result<LayerKind> {
        Ok(match self {
            LayerConfig::Tile { url } => LayerKind::Tile(TileLayer::new(required(url, "url", "tile")?)),
            LayerConfig::Vector { features, style } => {
                let features = match features {
                    Some(value) => GeoJson::from_value(value)?.to_features()?,
                    None => Vec::new(),
                };
                let style = style.map(LayerStyle::from).unwrap_or_default();
                LayerKind::Vector(VectorLayer::new(VectorSource::new(features), style))
            }
            LayerConfig::Image {
                url,
                extent,
                projection,
            } => {
                let image = ImageLayer::new(required(url, "url", "image")?, required(extent, "extent", "image")?);
                LayerKind::Image(image.with_projection(projection.unwrap_or_default()))
            }
            LayerConfig::VectorTile {
                base_url,
                layer_name,
                params,
                post,
                style,
            } => {
                let base_url = required(base_url, "baseUrl", "vectorTile")?;
                let params = QueryParams::from_value(params.unwrap_or(serde_json::Value::Null))?;
                let source = match layer_name {
                    Some(name) => {
                        let mut source = VectorTileSource::generic(&base_url, &name)?;
                        if !params.is_empty() {
                            let mut merged = source.query_params().clone();
                            merged.merge(params);
                            source.update_query_params(merged);
                        }
                        source
                    }
                    None if post => VectorTileSource::farmfield_post(&base_url, params)?,
                    None => VectorTileSource::farmfield(&base_url, params)?,
                };
                let mut layer = VectorTileLayer::new(source);
                if let Some(style) = style {
                    layer.style = style.into();
                }
                LayerKind::VectorTile(layer)
            }
        })
    }
}

/// A layer plus the metadata the registry keeps about it
#[derive(Debug, Clone)]
pub struct LayerWrapper {
    name: Option<String>,
    layer: LayerRef,
}

impl LayerWrapper {
    pub fn from_kind(kind: LayerKind, name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            layer: LayerRef::new(kind),
        }
    }

    /// Wraps the layer described by `config`.
    pub fn wrap(config: LayerConfig, name: Option<&str>) -> Result<Self> {
        Ok(Self::from_kind(config.build()?, name))
    }

    /// Like [`LayerWrapper::wrap`] from raw JSON; an unknown or missing
    /// `type` tag is a configuration error.
    pub fn from_value(value: serde_json::Value, name: Option<&str>) -> Result<Self> {
        let config: LayerConfig = serde_json::from_value(value)
            .map_err(|e| MapError::Configuration(e.to_string()))?;
        Self::wrap(config, name)
    }

    pub fn tile(layer: TileLayer, name: Option<&str>) -> Self {
        Self::from_kind(LayerKind::Tile(layer), name)
    }

    pub fn vector(layer: VectorLayer, name: Option<&str>) -> Self {
        Self::from_kind(LayerKind::Vector(layer), name)
    }

    pub fn image(layer: ImageLayer, name: Option<&str>) -> Self {
        Self::from_kind(LayerKind::Image(layer), name)
    }

    pub fn vector_tile(layer: VectorTileLayer, name: Option<&str>) -> Self {
        Self::from_kind(LayerKind::VectorTile(layer), name)
    }

    pub fn custom(renderer: Box<dyn CustomRenderable>, name: Option<&str>) -> Self {
        Self::from_kind(LayerKind::Custom(renderer), name)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The renderable handle shared with the map
    pub fn layer(&self) -> &LayerRef {
        &self.layer
    }

    pub fn layer_type(&self) -> LayerType {
        self.layer.layer_type()
    }

    pub fn is_visible(&self) -> bool {
        self.layer.is_visible()
    }

    pub fn set_visible(&self, visible: bool) {
        self.layer.set_visible(visible);
    }

    /// Flips visibility and returns the new state
    pub fn toggle_visible(&self) -> bool {
        let mut layer = self.layer.write();
        layer.properties.visible = !layer.properties.visible;
        layer.properties.visible
    }

    pub fn set_opacity(&self, opacity: f32) {
        self.layer.set_opacity(opacity);
    }

    pub fn set_style(&self, style: impl Into<LayerStyle>) -> Result<()> {
        let mut layer = self.layer.write();
        match &mut layer.kind {
            LayerKind::Vector(vector) => vector.style = style.into(),
            LayerKind::VectorTile(vector_tile) => vector_tile.style = style.into(),
            other => return Err(unsupported("set_style", other.layer_type())),
        }
        Ok(())
    }

    pub fn add_feature(&self, feature: Feature) -> Result<()> {
        self.with_vector_source("add_feature", |source| source.add_feature(feature))
    }

    /// Returns whether the feature was present
    pub fn remove_feature(&self, feature: &Feature) -> Result<bool> {
        self.with_vector_source("remove_feature", |source| source.remove_feature(feature))
    }

    /// Snapshot of the current features
    pub fn features(&self) -> Result<Vec<Feature>> {
        self.with_vector_source("features", |source| source.features().to_vec())
    }

    /// New filter parameters for a vector-tile layer
    pub fn update_query_params(&self, params: QueryParams) -> Result<()> {
        let mut layer = self.layer.write();
        match &mut layer.kind {
            LayerKind::VectorTile(vector_tile) => {
                vector_tile.update_query_params(params);
                Ok(())
            }
            other => Err(unsupported("update_query_params", other.layer_type())),
        }
    }

    /// Whether the renderable carries an in-memory feature source
    pub fn has_vector_source(&self) -> bool {
        matches!(self.layer.read().kind, LayerKind::Vector(_))
    }

    fn with_vector_source<R>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut VectorSource) -> R,
    ) -> Result<R> {
        let mut layer = self.layer.write();
        match &mut layer.kind {
            LayerKind::Vector(vector) => Ok(f(&mut vector.source)),
            other => Err(unsupported(operation, other.layer_type())),
        }
    }
}

fn unsupported(operation: &'static str, layer_type: LayerType) -> MapError {
    MapError::UnsupportedOperation {
        operation,
        layer_type,
    }
}
