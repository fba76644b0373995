//! Vector-tile source for the GIS tile endpoints.
//!
//! The base configuration (endpoint, grid, projection, format) is fixed at
//! construction. The filter parameters are the only mutable part and live in
//! [`TileQuery`], which rebuilds the URL template and POST body whenever they
//! change so the two can never drift apart.

use std::sync::Arc;

pub use crate::tiles::params::QueryParams;

use crate::{
    core::{
        constants::{FARMFIELD_MVT_PATH, GENERIC_MVT_PATH},
        geo::{Extent, Projection, TileCoord},
    },
    tiles::{
        format::{FeatureFormat, MvtFormat, ReadOptions},
        grid::TileGrid,
        transport::TileRequest,
    },
    Result,
};

/// How the filter parameters travel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Parameters on the query string
    Get,
    /// Parameters as a JSON body
    Post,
}

/// Current parameters plus everything derived from them
#[derive(Debug, Clone, PartialEq)]
struct TileQuery {
    params: QueryParams,
    url_template: String,
    body: Option<serde_json::Value>,
}

impl TileQuery {
    fn build(endpoint: &str, mode: RequestMode, params: QueryParams) -> Self {
        let tile_path = format!("{}/{{z}}/{{x}}/{{y}}", endpoint);
        let (url_template, body) = match mode {
            RequestMode::Get => {
                let query = params.to_query_string();
                if query.is_empty() {
                    (tile_path, None)
                } else {
                    (format!("{}?{}", tile_path, query), None)
                }
            }
            RequestMode::Post => (tile_path, Some(params.to_json())),
        };

        Self {
            params,
            url_template,
            body,
        }
    }
}

/// Everything needed to fetch and read one tile, captured at request time
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTile {
    pub coord: TileCoord,
    pub request: TileRequest,
    pub options: ReadOptions,
    /// Parameter generation the request was built from
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct VectorTileSource {
    endpoint: String,
    mode: RequestMode,
    grid: TileGrid,
    projection: Projection,
    format: Arc<dyn FeatureFormat>,
    query: TileQuery,
    generation: u64,
}

impl VectorTileSource {
    /// Source for `{base_url}{path}/{z}/{x}/{y}` reading MVT on the default grid.
    pub fn new(base_url: &str, path: &str, params: QueryParams, mode: RequestMode) -> Result<Self> {
        let base = url::Url::parse(base_url)?;
        let endpoint = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let query = TileQuery::build(&endpoint, mode, params);

        Ok(Self {
            endpoint,
            mode,
            grid: TileGrid::default(),
            projection: Projection::WebMercator,
            format: Arc::new(MvtFormat::new()),
            query,
            generation: 0,
        })
    }

    /// Generic GIS layer tiles, selected by `layer_name`
    pub fn generic(base_url: &str, layer_name: &str) -> Result<Self> {
        Self::new(
            base_url,
            GENERIC_MVT_PATH,
            QueryParams::new().with("layer_name", layer_name),
            RequestMode::Get,
        )
    }

    /// Farm-field tiles filtered through the query string
    pub fn farmfield(base_url: &str, params: QueryParams) -> Result<Self> {
        Self::new(base_url, FARMFIELD_MVT_PATH, params, RequestMode::Get)
    }

    /// Farm-field tiles filtered through a JSON POST body
    pub fn farmfield_post(base_url: &str, body: QueryParams) -> Result<Self> {
        Self::new(base_url, FARMFIELD_MVT_PATH, body, RequestMode::Post)
    }

    pub fn with_format(mut self, format: Arc<dyn FeatureFormat>) -> Self {
        self.format = format;
        self
    }

    /// Use a Web Mercator grid with more (or fewer) zoom levels
    pub fn with_zoom_levels(mut self, zoom_levels: usize) -> Self {
        self.grid = TileGrid::web_mercator(zoom_levels);
        self
    }

    /// Replaces the filter parameters. Requests prepared from now on use the
    /// new URL/body; requests prepared earlier keep their old generation.
    pub fn update_query_params(&mut self, params: QueryParams) {
        self.query = TileQuery::build(&self.endpoint, self.mode, params);
        self.generation += 1;

        #[cfg(feature = "debug")]
        log::debug!(
            "tile source {} now at generation {}: {}",
            self.endpoint,
            self.generation,
            self.query.url_template
        );
    }

    pub fn query_params(&self) -> &QueryParams {
        &self.query.params
    }

    /// URL with `{z}`, `{x}`, `{y}` placeholders
    pub fn url_template(&self) -> &str {
        &self.query.url_template
    }

    /// JSON body sent with every tile request in POST mode
    pub fn request_body(&self) -> Option<&serde_json::Value> {
        self.query.body.as_ref()
    }

    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn format(&self) -> &Arc<dyn FeatureFormat> {
        &self.format
    }

    pub fn tile_url(&self, coord: TileCoord) -> String {
        self.query
            .url_template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }

    pub fn tile_request(&self, coord: TileCoord) -> TileRequest {
        let url = self.tile_url(coord);
        let request = match &self.query.body {
            Some(body) => TileRequest::post_json(url, body.clone()),
            None => TileRequest::get(url),
        };
        request.binary(self.format.format_type().is_binary())
    }

    pub fn tile_extent(&self, coord: TileCoord) -> Option<Extent> {
        self.grid.tile_extent(coord)
    }

    /// Request and read options for `coord`; `None` when the tile is outside the grid.
    pub fn prepare_tile(&self, coord: TileCoord) -> Option<PreparedTile> {
        let resolution = self.grid.resolution(coord.z)?;
        if !coord.is_valid() {
            return None;
        }
        let extent = self.tile_extent(coord)?;

        Some(PreparedTile {
            coord,
            request: self.tile_request(coord),
            options: ReadOptions {
                extent,
                resolution,
                feature_projection: self.projection.clone(),
            },
            generation: self.generation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::transport::HttpMethod;
    use serde_json::json;

    const BASE: &str = "https://gis.example.kr";

    #[test]
    fn test_generic_tile_url() {
        let source = VectorTileSource::generic(BASE, "jeju_emd").unwrap();

        assert_eq!(
            source.tile_url(TileCoord::new(1746, 801, 11)),
            "https://gis.example.kr/api/common/v0/gis/mvt/11/1746/801?layer_name=jeju_emd"
        );
        let request = source.tile_request(TileCoord::new(0, 0, 0));
        assert_eq!(request.method, HttpMethod::Get);
        assert!(request.binary);
    }

    #[test]
    fn test_update_query_params_rebuilds_template() {
        let params = QueryParams::from_value(json!({"pummok": ["감귤"], "year": 2023})).unwrap();
        let mut source = VectorTileSource::farmfield(BASE, params).unwrap();
        let before = source.url_template().to_string();

        source.update_query_params(QueryParams::new().with("pummok", json!(["a", "b"])));

        assert_ne!(source.url_template(), before);
        assert_eq!(
            source.tile_url(TileCoord::new(3, 2, 2)),
            "https://gis.example.kr/api/common/v0/gis/farmfield/mvt/2/3/2?pummok=a&pummok=b"
        );
        assert_eq!(source.generation(), 1);
    }

    #[test]
    fn test_post_mode_sends_body() {
        let body = QueryParams::new().with("year", 2024).with("pummok", json!(["월동무"]));
        let mut source = VectorTileSource::farmfield_post(BASE, body).unwrap();

        let request = source.tile_request(TileCoord::new(0, 0, 0));
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "https://gis.example.kr/api/common/v0/gis/farmfield/mvt/0/0/0");
        assert_eq!(request.body, Some(json!({"year": 2024, "pummok": ["월동무"]})));
        assert_eq!(request.header("Content-Type"), Some("application/json"));

        source.update_query_params(QueryParams::new().with("year", 2025));
        assert_eq!(source.request_body(), Some(&json!({"year": 2025})));
    }

    #[test]
    fn test_base_url_validation() {
        assert!(VectorTileSource::generic("not a url", "x").is_err());
        let trailing = VectorTileSource::generic("http://localhost:8080/", "x").unwrap();
        assert!(trailing.url_template().starts_with("http://localhost:8080/api/common/v0/gis/mvt/{z}"));
    }

    #[test]
    fn test_prepare_tile_outside_grid() {
        let source = VectorTileSource::generic(BASE, "x").unwrap().with_zoom_levels(20);
        assert!(source.prepare_tile(TileCoord::new(4, 0, 2)).is_none());
        assert!(source.prepare_tile(TileCoord::new(0, 0, 21)).is_none());

        let prepared = source.prepare_tile(TileCoord::new(0, 0, 19)).unwrap();
        assert_eq!(prepared.options.resolution, 156543.03392804097 / 2_f64.powi(19));
        assert_eq!(prepared.generation, 0);
    }

    #[test]
    fn test_prepare_tile_far_past_grid() {
        let source = VectorTileSource::generic(BASE, "x").unwrap();
        assert!(source.prepare_tile(TileCoord::new(0, 0, 64)).is_none());
        assert!(source.prepare_tile(TileCoord::new(0, 0, u8::MAX)).is_none());
    }
}
