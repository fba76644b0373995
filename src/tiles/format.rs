//! Feature formats: how a tile response body becomes features.
//!
//! The loader picks the body representation from [`FeatureFormat::format_type`]
//! and hands the parsed body to the format.

use geo::MapCoords;
use geo_types::Coord;
use geozero::mvt::{tile, Message, Tile};
use geozero::ToGeo;

use crate::{
    core::{
        constants::MVT_DEFAULT_EXTENT,
        geo::{Extent, LatLng, Point, Projection},
    },
    data::geojson::GeoJson,
    layers::vector::{Feature, FeatureId},
    MapError, Result,
};

/// How the response body must be read before the format sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
    Json,
    Text,
    Xml,
    ArrayBuffer,
}

impl FormatType {
    pub fn is_binary(&self) -> bool {
        matches!(self, FormatType::ArrayBuffer)
    }
}

/// A response body read according to a [`FormatType`]
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
    /// Serialized XML document, kept as text for the format to parse
    Xml(String),
    Binary(Vec<u8>),
}

impl ResponseBody {
    /// Reads raw bytes as `format_type`. `None` means no usable body: empty
    /// text, or JSON that does not parse. Binary bodies are always usable,
    /// even when empty.
    pub fn parse(format_type: FormatType, bytes: &[u8]) -> Option<Self> {
        match format_type {
            FormatType::ArrayBuffer => Some(ResponseBody::Binary(bytes.to_vec())),
            FormatType::Json => serde_json::from_slice(bytes).ok().map(ResponseBody::Json),
            FormatType::Text => non_empty_text(bytes).map(ResponseBody::Text),
            FormatType::Xml => non_empty_text(bytes).map(ResponseBody::Xml),
        }
    }
}

fn non_empty_text(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    if text.trim().is_empty() {
        None
    } else {
        Some(text.into_owned())
    }
}

/// Where the features being read will be placed
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOptions {
    /// Map-unit extent of the tile (or request) being read
    pub extent: Extent,
    pub resolution: f64,
    /// Projection the features must end up in
    pub feature_projection: Projection,
}

/// Turns a parsed body into features
pub trait FeatureFormat: Send + Sync + std::fmt::Debug {
    fn format_type(&self) -> FormatType;

    fn read_features(&self, body: &ResponseBody, options: &ReadOptions) -> Result<Vec<Feature>>;

    /// Projection the body declares, if any
    fn read_projection(&self, body: &ResponseBody) -> Option<Projection>;
}

/// GeoJSON reader; reprojects WGS84 data into Web Mercator when asked
#[derive(Debug, Clone, PartialEq)]
pub struct GeoJsonFormat {
    /// Projection of the incoming data when the document names none
    pub data_projection: Projection,
}

impl GeoJsonFormat {
    pub fn new(data_projection: Projection) -> Self {
        Self { data_projection }
    }

    fn document(body: &ResponseBody) -> Result<GeoJson> {
        match body {
            ResponseBody::Json(value) => GeoJson::from_value(value.clone()),
            ResponseBody::Text(text) => GeoJson::from_str(text),
            _ => Err(MapError::Decode("GeoJSON needs a JSON or text body".to_string())),
        }
    }
}

impl Default for GeoJsonFormat {
    fn default() -> Self {
        Self::new(Projection::Wgs84)
    }
}

impl FeatureFormat for GeoJsonFormat {
    fn format_type(&self) -> FormatType {
        FormatType::Json
    }

    fn read_features(&self, body: &ResponseBody, options: &ReadOptions) -> Result<Vec<Feature>> {
        let document = Self::document(body)?;
        let data_projection = document.crs().unwrap_or_else(|| self.data_projection.clone());
        let mut features = document.to_features()?;

        match (&data_projection, &options.feature_projection) {
            (from, to) if from == to => {}
            (Projection::Wgs84, Projection::WebMercator) => {
                for feature in &mut features {
                    feature.geometry = feature.geometry.take().map(|g| {
                        g.map_coords(|c| {
                            let p = LatLng::new(c.y, c.x).to_mercator();
                            Coord { x: p.x, y: p.y }
                        })
                    });
                }
            }
            (Projection::WebMercator, Projection::Wgs84) => {
                for feature in &mut features {
                    feature.geometry = feature.geometry.take().map(|g| {
                        g.map_coords(|c| {
                            let ll = LatLng::from_mercator(Point::new(c.x, c.y));
                            Coord { x: ll.lng, y: ll.lat }
                        })
                    });
                }
            }
            (from, to) => {
                return Err(MapError::Decode(format!(
                    "cannot reproject GeoJSON from {} to {}",
                    from, to
                )))
            }
        }

        Ok(features)
    }

    fn read_projection(&self, body: &ResponseBody) -> Option<Projection> {
        let declared = Self::document(body).ok().and_then(|doc| doc.crs());
        Some(declared.unwrap_or_else(|| self.data_projection.clone()))
    }
}

/// Mapbox Vector Tile reader.
///
/// Tile-pixel geometries are scaled into the map-unit extent of the tile that
/// was requested. Each feature gets a `layer` property naming its MVT layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MvtFormat {
    /// Only read these MVT layers; all layers when `None`
    pub layers: Option<Vec<String>>,
}

/// Property holding the source MVT layer name
pub const MVT_LAYER_PROPERTY: &str = "layer";

impl MvtFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layers<I, S>(layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            layers: Some(layers.into_iter().map(Into::into).collect()),
        }
    }

    fn wants(&self, layer: &str) -> bool {
        self.layers
            .as_ref()
            .map_or(true, |names| names.iter().any(|n| n == layer))
    }

    fn read_layer(&self, layer: &tile::Layer, target: &Extent) -> Vec<Feature> {
        let tile_extent = layer.extent.unwrap_or(MVT_DEFAULT_EXTENT) as f64;
        let scale_x = target.width() / tile_extent;
        let scale_y = target.height() / tile_extent;

        let mut features = Vec::with_capacity(layer.features.len());
        for mvt_feature in &layer.features {
            let geometry = match mvt_feature.to_geo() {
                Ok(geometry) => geometry.map_coords(|c| Coord {
                    x: target.min_x + c.x * scale_x,
                    y: target.max_y - c.y * scale_y,
                }),
                Err(_e) => {
                    #[cfg(feature = "debug")]
                    log::warn!("skipping undecodable feature in MVT layer {}: {}", layer.name, _e);
                    continue;
                }
            };

            let mut properties = serde_json::Map::new();
            for pair in mvt_feature.tags.chunks_exact(2) {
                let key = layer.keys.get(pair[0] as usize);
                let value = layer.values.get(pair[1] as usize);
                if let (Some(key), Some(value)) = (key, value) {
                    properties.insert(key.clone(), mvt_value(value));
                }
            }
            properties.insert(
                MVT_LAYER_PROPERTY.to_string(),
                serde_json::Value::String(layer.name.clone()),
            );

            features.push(Feature {
                id: mvt_feature.id.map(FeatureId::Number),
                geometry: Some(geometry),
                properties,
            });
        }
        features
    }
}

fn mvt_value(value: &tile::Value) -> serde_json::Value {
    use serde_json::Value;

    if let Some(s) = &value.string_value {
        Value::String(s.clone())
    } else if let Some(b) = value.bool_value {
        Value::Bool(b)
    } else if let Some(i) = value.int_value.or(value.sint_value) {
        Value::from(i)
    } else if let Some(u) = value.uint_value {
        Value::from(u)
    } else if let Some(d) = value.double_value {
        Value::from(d)
    } else if let Some(f) = value.float_value {
        Value::from(f as f64)
    } else {
        Value::Null
    }
}

impl FeatureFormat for MvtFormat {
    fn format_type(&self) -> FormatType {
        FormatType::ArrayBuffer
    }

    fn read_features(&self, body: &ResponseBody, options: &ReadOptions) -> Result<Vec<Feature>> {
        let ResponseBody::Binary(bytes) = body else {
            return Err(MapError::Decode("MVT needs a binary body".to_string()));
        };
        let decoded = Tile::decode(bytes.as_slice()).map_err(|e| MapError::Decode(e.to_string()))?;

        Ok(decoded
            .layers
            .iter()
            .filter(|layer| self.wants(&layer.name))
            .flat_map(|layer| self.read_layer(layer, &options.extent))
            .collect())
    }

    fn read_projection(&self, _body: &ResponseBody) -> Option<Projection> {
        Some(Projection::WebMercator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{Geometry, Point as GeoPoint};

    // Layer "fields" with one point feature at tile pixel (2048, 1024),
    // id 9 and tag pummok = "감귤".
    fn sample_tile() -> Vec<u8> {
        let tile = Tile {
            layers: vec![tile::Layer {
                version: 2,
                name: "fields".to_string(),
                features: vec![tile::Feature {
                    id: Some(9),
                    tags: vec![0, 0],
                    r#type: Some(tile::GeomType::Point as i32),
                    // MoveTo(1), zigzag(2048), zigzag(1024)
                    geometry: vec![9, 4096, 2048],
                }],
                keys: vec!["pummok".to_string()],
                values: vec![tile::Value {
                    string_value: Some("감귤".to_string()),
                    ..Default::default()
                }],
                extent: Some(4096),
            }],
        };
        tile.encode_to_vec()
    }

    fn options(extent: Extent) -> ReadOptions {
        ReadOptions {
            extent,
            resolution: 1.0,
            feature_projection: Projection::WebMercator,
        }
    }

    #[test]
    fn test_parse_body_by_type() {
        assert_eq!(ResponseBody::parse(FormatType::Json, b""), None);
        assert_eq!(ResponseBody::parse(FormatType::Json, b"{not json"), None);
        assert_eq!(ResponseBody::parse(FormatType::Text, b"  "), None);
        assert_eq!(
            ResponseBody::parse(FormatType::Xml, b"<kml/>"),
            Some(ResponseBody::Xml("<kml/>".to_string()))
        );
        assert_eq!(
            ResponseBody::parse(FormatType::ArrayBuffer, b""),
            Some(ResponseBody::Binary(Vec::new()))
        );
    }

    #[test]
    fn test_mvt_feature_scaled_into_tile_extent() {
        let format = MvtFormat::new();
        let body = ResponseBody::Binary(sample_tile());
        let features = format
            .read_features(&body, &options(Extent::new(0.0, 0.0, 4096.0, 4096.0)))
            .unwrap();

        assert_eq!(features.len(), 1);
        assert_eq!(features[0].id, Some(FeatureId::Number(9)));
        assert_eq!(features[0].property("pummok").unwrap(), "감귤");
        assert_eq!(features[0].property(MVT_LAYER_PROPERTY).unwrap(), "fields");
        assert_eq!(
            features[0].geometry,
            Some(Geometry::Point(GeoPoint::new(2048.0, 3072.0)))
        );
    }

    #[test]
    fn test_mvt_layer_filter() {
        let format = MvtFormat::with_layers(["roads"]);
        let body = ResponseBody::Binary(sample_tile());
        let features = format
            .read_features(&body, &options(Extent::new(0.0, 0.0, 1.0, 1.0)))
            .unwrap();

        assert!(features.is_empty());
    }

    #[test]
    fn test_mvt_rejects_text_body() {
        let result = MvtFormat::new().read_features(
            &ResponseBody::Text("x".to_string()),
            &options(Extent::new(0.0, 0.0, 1.0, 1.0)),
        );
        assert!(matches!(result, Err(MapError::Decode(_))));
    }

    #[test]
    fn test_geojson_reprojected_to_mercator() {
        let body = ResponseBody::Json(serde_json::json!({
            "type": "Feature",
            "properties": {"name": "origin"},
            "geometry": {"type": "Point", "coordinates": [180.0, 0.0]}
        }));
        let format = GeoJsonFormat::default();
        let features = format
            .read_features(&body, &options(Extent::web_mercator()))
            .unwrap();

        let Some(Geometry::Point(p)) = &features[0].geometry else {
            panic!("expected a point");
        };
        assert!((p.x() - 20_037_508.342789244).abs() < 1e-6);
        assert!(p.y().abs() < 1e-6);
        assert_eq!(format.read_projection(&body), Some(Projection::Wgs84));
    }
}
