use serde::{Deserialize, Serialize};

use crate::{
    core::geo::TileCoord,
    tiles::grid::TileGrid,
};

/// Configuration for a raster tile layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLayerOptions {
    /// URL template for tiles (e.g., "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png")
    pub url_template: String,
    /// Available subdomains for load balancing
    pub subdomains: Vec<String>,
    /// Attribution text
    pub attribution: String,
    /// Maximum zoom level for this tile source
    pub max_zoom: u8,
    /// Minimum zoom level for this tile source
    pub min_zoom: u8,
}

impl Default for TileLayerOptions {
    fn default() -> Self {
        Self {
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            subdomains: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            attribution: "© OpenStreetMap contributors".to_string(),
            max_zoom: 18,
            min_zoom: 0,
        }
    }
}

/// Background raster layer; the map widget fetches and draws the images.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    options: TileLayerOptions,
    grid: TileGrid,
}

impl TileLayer {
    /// Raster layer over `url_template` with no subdomain rotation
    pub fn new(url_template: impl Into<String>) -> Self {
        Self::with_options(TileLayerOptions {
            url_template: url_template.into(),
            subdomains: Vec::new(),
            attribution: String::new(),
            ..TileLayerOptions::default()
        })
    }

    pub fn with_options(options: TileLayerOptions) -> Self {
        Self {
            options,
            grid: TileGrid::default(),
        }
    }

    /// Create a tile layer for OpenStreetMap
    pub fn openstreetmap() -> Self {
        Self::with_options(TileLayerOptions::default())
    }

    /// Create a tile layer for satellite imagery
    pub fn satellite() -> Self {
        Self::with_options(TileLayerOptions {
            url_template: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}".to_string(),
            subdomains: vec![],
            attribution: "© Esri, Maxar, Earthstar Geographics".to_string(),
            ..TileLayerOptions::default()
        })
    }

    pub fn options(&self) -> &TileLayerOptions {
        &self.options
    }

    pub fn url_template(&self) -> &str {
        &self.options.url_template
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Concrete URL for `coord`; `None` outside the layer's zoom range.
    pub fn tile_url(&self, coord: TileCoord) -> Option<String> {
        if coord.z < self.options.min_zoom || coord.z > self.options.max_zoom || !coord.is_valid() {
            return None;
        }

        let mut url = self
            .options
            .url_template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string());

        if !self.options.subdomains.is_empty() {
            let index = (coord.x as usize + coord.y as usize) % self.options.subdomains.len();
            url = url.replace("{s}", &self.options.subdomains[index]);
        }
        Some(url)
    }
}
