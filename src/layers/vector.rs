use geo::BoundingRect;
use geo_types::Geometry;
use serde::{Deserialize, Serialize};

use crate::{core::geo::Extent, layers::style::LayerStyle};

/// Feature identifier as delivered by GeoJSON or MVT
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(u64),
    String(String),
}

impl From<u64> for FeatureId {
    fn from(id: u64) -> Self {
        FeatureId::Number(id)
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        FeatureId::String(id.to_string())
    }
}

impl From<String> for FeatureId {
    fn from(id: String) -> Self {
        FeatureId::String(id)
    }
}

/// A geometry with an optional id and free-form properties.
///
/// Geometries are in the coordinates of the map view (EPSG:3857 unless a
/// format was told otherwise).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    pub id: Option<FeatureId>,
    pub geometry: Option<Geometry<f64>>,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl Feature {
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            id: None,
            geometry: Some(geometry.into()),
            properties: serde_json::Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<FeatureId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a property to this feature
    pub fn with_property<V: Into<serde_json::Value>>(mut self, key: &str, value: V) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Get a property value
    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }

    /// Bounding box of the geometry, if it has one
    pub fn extent(&self) -> Option<Extent> {
        let rect = self.geometry.as_ref()?.bounding_rect()?;
        Some(Extent::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}

/// The feature-bearing source behind a vector layer
#[derive(Debug, Clone, Default)]
pub struct VectorSource {
    features: Vec<Feature>,
    revision: u64,
}

impl VectorSource {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            features,
            revision: 0,
        }
    }

    pub fn add_feature(&mut self, feature: Feature) {
        self.features.push(feature);
        self.changed();
    }

    pub fn add_features(&mut self, features: impl IntoIterator<Item = Feature>) {
        self.features.extend(features);
        self.changed();
    }

    /// Removes the first feature equal to `feature`; returns whether one was found.
    pub fn remove_feature(&mut self, feature: &Feature) -> bool {
        match self.features.iter().position(|f| f == feature) {
            Some(index) => {
                self.features.remove(index);
                self.changed();
                true
            }
            None => false,
        }
    }

    pub fn remove_feature_by_id(&mut self, id: &FeatureId) -> Option<Feature> {
        let index = self.features.iter().position(|f| f.id.as_ref() == Some(id))?;
        let removed = self.features.remove(index);
        self.changed();
        Some(removed)
    }

    pub fn feature_by_id(&self, id: &FeatureId) -> Option<&Feature> {
        self.features.iter().find(|f| f.id.as_ref() == Some(id))
    }

    pub fn clear(&mut self) {
        self.features.clear();
        self.changed();
    }

    /// Swaps the whole feature set in a single step.
    pub fn replace_features(&mut self, features: Vec<Feature>) {
        self.features = features;
        self.changed();
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn features_in_extent(&self, extent: &Extent) -> Vec<&Feature> {
        self.features
            .iter()
            .filter(|f| f.extent().is_some_and(|e| e.intersects(extent)))
            .collect()
    }

    /// Union of all feature extents
    pub fn extent(&self) -> Option<Extent> {
        self.features.iter().filter_map(Feature::extent).reduce(|a, b| {
            Extent::new(
                a.min_x.min(b.min_x),
                a.min_y.min(b.min_y),
                a.max_x.max(b.max_x),
                a.max_y.max(b.max_y),
            )
        })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Incremented on every mutation; lets a renderer skip unchanged sources.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn changed(&mut self) {
        self.revision += 1;
    }
}

/// A layer drawing an in-memory feature collection
#[derive(Debug, Clone, Default)]
pub struct VectorLayer {
    pub source: VectorSource,
    pub style: LayerStyle,
    /// Drop overlapping labels/symbols when drawing
    pub declutter: bool,
}

impl VectorLayer {
    pub fn new(source: VectorSource, style: LayerStyle) -> Self {
        Self {
            source,
            style,
            declutter: false,
        }
    }

    pub fn feature_count(&self) -> usize {
        self.source.len()
    }
}
