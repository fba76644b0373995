//! Core constants for the EPSG:3857 tile grid and the remote GIS endpoints.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Half the width of the Web Mercator world in meters.
pub const WEB_MERCATOR_HALF_WORLD: f64 = 20_037_508.342789244;

/// Resolution (meters per pixel) of zoom level 0 for 256px tiles.
pub const MAX_RESOLUTION: f64 = 156_543.033_928_040_97;

/// Zoom levels in the default vector-tile grid.
pub const DEFAULT_ZOOM_LEVELS: usize = 18;

/// Coordinate space of a single MVT tile when the layer omits `extent`.
pub const MVT_DEFAULT_EXTENT: u32 = 4096;

/// Registry key that pins a layer to the bottom of the map.
pub const TILE_LAYER_KEY: &str = "tile";

/// Registry key that pins a layer to the top of the map.
pub const TOP_ANCHOR_LAYER_KEY: &str = "highlight";

/// Z-index given to the background layer when the caller supplies none.
pub const TILE_LAYER_Z_INDEX: i32 = -1;

/// Path of the generic vector-tile endpoint, selected by `layer_name`.
pub const GENERIC_MVT_PATH: &str = "/api/common/v0/gis/mvt";

/// Path of the filtered farm-field vector-tile endpoint.
pub const FARMFIELD_MVT_PATH: &str = "/api/common/v0/gis/farmfield/mvt";
