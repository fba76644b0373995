use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::core::constants::WEB_MERCATOR_HALF_WORLD;

/// Web Mercator projection constants
const EARTH_RADIUS: f64 = 6378137.0;
const MAX_LATITUDE: f64 = 85.0511287798;

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat >= -90.0 && self.lat <= 90.0 && self.lng >= -180.0 && self.lng <= 180.0
    }

    /// Clamps latitude to valid range
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
    }

    /// Converts to Web Mercator projection (EPSG:3857)
    pub fn to_mercator(&self) -> Point {
        let lat = Self::clamp_lat(self.lat);
        let x = self.lng.to_radians() * EARTH_RADIUS;
        let y = ((PI / 4.0 + lat.to_radians() / 2.0).tan().ln()) * EARTH_RADIUS;
        Point::new(x, y)
    }

    /// Creates LatLng from Web Mercator coordinates
    pub fn from_mercator(point: Point) -> Self {
        let lng = (point.x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (point.y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
        Self::new(lat, lng)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// A point in projected map units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Coordinate reference systems understood by the tile grid and formats.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Projection {
    /// Spherical Web Mercator, the projection of every tile grid in this crate.
    #[default]
    WebMercator,
    /// Geographic WGS84 longitude/latitude.
    Wgs84,
    /// Anything else, carried by code.
    Other(String),
}

impl Projection {
    pub fn code(&self) -> &str {
        match self {
            Projection::WebMercator => "EPSG:3857",
            Projection::Wgs84 => "EPSG:4326",
            Projection::Other(code) => code,
        }
    }

    /// Parses an `EPSG:xxxx` style code; unknown codes are kept verbatim.
    pub fn from_code(code: &str) -> Self {
        match code.to_ascii_uppercase().as_str() {
            "EPSG:3857" | "EPSG:900913" | "EPSG:102100" => Projection::WebMercator,
            "EPSG:4326" | "CRS:84" => Projection::Wgs84,
            _ => Projection::Other(code.to_string()),
        }
    }
}

impl From<String> for Projection {
    fn from(code: String) -> Self {
        Projection::from_code(&code)
    }
}

impl From<Projection> for String {
    fn from(projection: Projection) -> Self {
        projection.code().to_string()
    }
}

impl std::fmt::Display for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Axis-aligned rectangle in projected units: `[min_x, min_y, max_x, max_y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// The full Web Mercator world.
    pub fn web_mercator() -> Self {
        Self::new(
            -WEB_MERCATOR_HALF_WORLD,
            -WEB_MERCATOR_HALF_WORLD,
            WEB_MERCATOR_HALF_WORLD,
            WEB_MERCATOR_HALF_WORLD,
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Checks if the extent contains a point (edges included)
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Checks if the extent intersects with another extent
    pub fn intersects(&self, other: &Extent) -> bool {
        !(other.max_x < self.min_x
            || other.min_x > self.max_x
            || other.max_y < self.min_y
            || other.min_y > self.max_y)
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

impl From<[f64; 4]> for Extent {
    fn from(value: [f64; 4]) -> Self {
        Self::new(value[0], value[1], value[2], value[3])
    }
}

/// Represents a tile coordinate in the XYZ tile system (origin top-left)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Creates a tile coordinate from a LatLng and zoom level
    pub fn from_lat_lng(lat_lng: &LatLng, zoom: u8) -> Self {
        let lat_rad = LatLng::clamp_lat(lat_lng.lat).to_radians();
        let n = 2_f64.powi(zoom as i32);

        let x = ((lat_lng.lng + 180.0) / 360.0 * n).floor() as u32;
        let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor() as u32;

        Self::new(x, y, zoom)
    }

    /// Gets the parent tile at a lower zoom level
    pub fn parent(&self) -> Option<TileCoord> {
        if self.z == 0 {
            None
        } else {
            Some(TileCoord::new(self.x / 2, self.y / 2, self.z - 1))
        }
    }

    /// Tiles along one axis at zoom `z`; `None` when `2^z` does not fit in a `u64`
    pub fn tiles_per_axis(z: u8) -> Option<u64> {
        1_u64.checked_shl(z as u32)
    }

    /// Checks if the tile is valid for its zoom level
    pub fn is_valid(&self) -> bool {
        match Self::tiles_per_axis(self.z) {
            Some(max_coord) => (self.x as u64) < max_coord && (self.y as u64) < max_coord,
            // x and y are u32, so every coordinate fits past z = 63
            None => true,
        }
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_lng_creation() {
        let coord = LatLng::new(33.4996, 126.5312);
        assert_eq!(coord.lat, 33.4996);
        assert_eq!(coord.lng, 126.5312);
        assert!(coord.is_valid());
    }

    #[test]
    fn test_mercator_round_trip() {
        let jeju = LatLng::new(33.4996, 126.5312);
        let back = LatLng::from_mercator(jeju.to_mercator());

        assert!((back.lat - jeju.lat).abs() < 1e-9);
        assert!((back.lng - jeju.lng).abs() < 1e-9);
    }

    #[test]
    fn test_mercator_world_edge() {
        let edge = LatLng::new(0.0, 180.0).to_mercator();
        assert!((edge.x - WEB_MERCATOR_HALF_WORLD).abs() < 1e-6);
    }

    #[test]
    fn test_tile_parent() {
        let tile = TileCoord::new(5, 3, 3);
        assert_eq!(tile.parent(), Some(TileCoord::new(2, 1, 2)));
        assert_eq!(TileCoord::new(0, 0, 0).parent(), None);
        assert!(!TileCoord::new(8, 0, 3).is_valid());
    }

    #[test]
    fn test_deep_zoom_validity() {
        assert_eq!(TileCoord::tiles_per_axis(63), Some(1 << 63));
        assert_eq!(TileCoord::tiles_per_axis(64), None);
        assert!(TileCoord::new(u32::MAX, 0, 40).is_valid());
        assert!(TileCoord::new(u32::MAX, u32::MAX, 200).is_valid());
    }

    #[test]
    fn test_projection_codes() {
        assert_eq!(Projection::from_code("epsg:3857"), Projection::WebMercator);
        assert_eq!(Projection::from_code("EPSG:4326"), Projection::Wgs84);
        assert_eq!(Projection::from_code("EPSG:5186").code(), "EPSG:5186");
    }

    #[test]
    fn test_extent_intersects() {
        let a = Extent::new(0.0, 0.0, 10.0, 10.0);
        let b = Extent::new(5.0, 5.0, 15.0, 15.0);
        let c = Extent::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains(&Point::new(10.0, 0.0)));
    }
}
