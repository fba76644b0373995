use geo_types::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use serde::{Deserialize, Serialize};

use crate::{
    core::geo::Projection,
    layers::vector::{Feature, FeatureId},
    MapError, Result,
};

/// A GeoJSON position; only the first two ordinates are used.
pub type Position = Vec<f64>;

/// GeoJSON geometry types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: Position,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonGeometry>,
    },
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(default)]
    pub id: Option<FeatureId>,
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Root GeoJSON object carrying features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJson {
    Feature(GeoJsonFeature),
    FeatureCollection {
        features: Vec<GeoJsonFeature>,
        /// Legacy named CRS member (`{"type":"name","properties":{"name":"EPSG:4326"}}`)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        crs: Option<serde_json::Value>,
    },
}

impl GeoJson {
    /// Parses a `Feature`, a `FeatureCollection`, or a bare geometry (wrapped
    /// into a feature without properties).
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let is_feature_object = matches!(
            value.get("type").and_then(|t| t.as_str()),
            Some("Feature") | Some("FeatureCollection")
        );
        if is_feature_object {
            return Ok(serde_json::from_value(value)?);
        }

        let geometry: GeoJsonGeometry = serde_json::from_value(value)?;
        Ok(GeoJson::Feature(GeoJsonFeature {
            id: None,
            geometry: Some(geometry),
            properties: None,
        }))
    }

    pub fn from_str(geojson_str: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(geojson_str)?)
    }

    /// Projection named by a legacy `crs` member, if any
    pub fn crs(&self) -> Option<Projection> {
        let GeoJson::FeatureCollection { crs: Some(crs), .. } = self else {
            return None;
        };
        let name = crs.get("properties")?.get("name")?.as_str()?;
        // urn:ogc:def:crs:EPSG::4326 style names
        let code = match name.rsplit_once("::") {
            Some((_, number)) => format!("EPSG:{}", number),
            None => name.to_string(),
        };
        Some(Projection::from_code(&code))
    }

    /// Gets all features in the document
    pub fn features(&self) -> Vec<&GeoJsonFeature> {
        match self {
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::FeatureCollection { features, .. } => features.iter().collect(),
        }
    }

    /// Converts every feature; the first malformed geometry aborts the read.
    pub fn to_features(&self) -> Result<Vec<Feature>> {
        self.features().into_iter().map(GeoJsonFeature::to_feature).collect()
    }
}

impl GeoJsonFeature {
    pub fn to_feature(&self) -> Result<Feature> {
        Ok(Feature {
            id: self.id.clone(),
            geometry: self.geometry.as_ref().map(GeoJsonGeometry::to_geometry).transpose()?,
            properties: self.properties.clone().unwrap_or_default(),
        })
    }
}

impl GeoJsonGeometry {
    /// Converts to a `geo-types` geometry without reprojecting
    pub fn to_geometry(&self) -> Result<Geometry<f64>> {
        Ok(match self {
            GeoJsonGeometry::Point { coordinates } => Point::from(coord(coordinates)?).into(),
            GeoJsonGeometry::LineString { coordinates } => line(coordinates)?.into(),
            GeoJsonGeometry::Polygon { coordinates } => polygon(coordinates)?.into(),
            GeoJsonGeometry::MultiPoint { coordinates } => MultiPoint::new(
                coordinates
                    .iter()
                    .map(|c| coord(c).map(Point::from))
                    .collect::<Result<_>>()?,
            )
            .into(),
            GeoJsonGeometry::MultiLineString { coordinates } => MultiLineString::new(
                coordinates.iter().map(|l| line(l)).collect::<Result<_>>()?,
            )
            .into(),
            GeoJsonGeometry::MultiPolygon { coordinates } => MultiPolygon::new(
                coordinates.iter().map(|p| polygon(p)).collect::<Result<_>>()?,
            )
            .into(),
            GeoJsonGeometry::GeometryCollection { geometries } => {
                Geometry::GeometryCollection(GeometryCollection::new_from(
                    geometries
                        .iter()
                        .map(GeoJsonGeometry::to_geometry)
                        .collect::<Result<_>>()?,
                ))
            }
        })
    }
}

fn coord(position: &[f64]) -> Result<Coord<f64>> {
    match position {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(MapError::Decode(format!(
            "GeoJSON position needs at least two ordinates, got {}",
            position.len()
        ))),
    }
}

fn line(positions: &[Position]) -> Result<LineString<f64>> {
    Ok(LineString::new(
        positions.iter().map(|p| coord(p)).collect::<Result<_>>()?,
    ))
}

fn polygon(rings: &[Vec<Position>]) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|r| line(r));
    let exterior = rings.next().transpose()?.unwrap_or_else(|| LineString::new(Vec::new()));
    Ok(Polygon::new(exterior, rings.collect::<Result<_>>()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geojson_parsing() {
        let geojson_str = r#"
        {
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "id": 17,
                    "properties": {"name": "제주시"},
                    "geometry": {
                        "type": "Point",
                        "coordinates": [126.5312, 33.4996, 12.0]
                    }
                }
            ]
        }
        "#;

        let geojson = GeoJson::from_str(geojson_str).unwrap();
        let features = geojson.to_features().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].id, Some(FeatureId::Number(17)));
        assert_eq!(
            features[0].geometry,
            Some(Geometry::Point(Point::new(126.5312, 33.4996)))
        );
        assert_eq!(features[0].property("name").unwrap(), "제주시");
    }

    #[test]
    fn test_bare_geometry_becomes_feature() {
        let geojson = GeoJson::from_str(
            r#"{"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}"#,
        )
        .unwrap();

        let features = geojson.to_features().unwrap();
        assert_eq!(features.len(), 1);
        assert!(matches!(features[0].geometry, Some(Geometry::Polygon(_))));
        assert!(features[0].properties.is_empty());
    }

    #[test]
    fn test_short_position_is_rejected() {
        let geometry = GeoJsonGeometry::Point {
            coordinates: vec![126.0],
        };
        assert!(matches!(geometry.to_geometry(), Err(MapError::Decode(_))));
    }

    #[test]
    fn test_geometry_collection() {
        let geojson = GeoJson::from_str(
            r#"{"type": "GeometryCollection", "geometries": [
                {"type": "Point", "coordinates": [126.5, 33.4]},
                {"type": "LineString", "coordinates": [[126.5, 33.4], [126.6, 33.5]]}
            ]}"#,
        )
        .unwrap();

        let features = geojson.to_features().unwrap();
        let Some(Geometry::GeometryCollection(collection)) = &features[0].geometry else {
            panic!("expected a geometry collection");
        };
        assert_eq!(collection.0.len(), 2);
        assert_eq!(collection.0[0], Geometry::Point(Point::new(126.5, 33.4)));
    }

    #[test]
    fn test_named_crs() {
        let geojson = GeoJson::from_str(
            r#"{"type": "FeatureCollection", "features": [],
                "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::3857"}}}"#,
        )
        .unwrap();

        assert_eq!(geojson.crs(), Some(Projection::WebMercator));
    }
}
