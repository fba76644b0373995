//! The fixed XYZ tile grid over the Web Mercator world.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::core::{
    constants::{DEFAULT_ZOOM_LEVELS, MAX_RESOLUTION, TILE_SIZE},
    geo::{Extent, Point, TileCoord},
};

/// Grid shared by every source that does not ask for more zoom levels
pub static WEB_MERCATOR_GRID: Lazy<TileGrid> =
    Lazy::new(|| TileGrid::web_mercator(DEFAULT_ZOOM_LEVELS));

/// Resolutions and tile addressing for one projection extent (origin top-left)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    extent: Extent,
    resolutions: Vec<f64>,
    tile_size: u32,
}

impl TileGrid {
    /// Full EPSG:3857 extent with `zoom_levels` levels, resolution halving per level.
    pub fn web_mercator(zoom_levels: usize) -> Self {
        let resolutions = (0..zoom_levels.clamp(1, u8::MAX as usize + 1))
            .map(|z| MAX_RESOLUTION / 2_f64.powi(z as i32))
            .collect();

        Self {
            extent: Extent::web_mercator(),
            resolutions,
            tile_size: TILE_SIZE,
        }
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    pub fn resolutions(&self) -> &[f64] {
        &self.resolutions
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn min_zoom(&self) -> u8 {
        0
    }

    pub fn max_zoom(&self) -> u8 {
        (self.resolutions.len() - 1) as u8
    }

    pub fn resolution(&self, z: u8) -> Option<f64> {
        self.resolutions.get(z as usize).copied()
    }

    /// Zoom level whose resolution is closest to `resolution`
    pub fn zoom_for_resolution(&self, resolution: f64) -> u8 {
        self.resolutions
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let da = (*a - resolution).abs();
                let db = (*b - resolution).abs();
                da.total_cmp(&db)
            })
            .map(|(z, _)| z as u8)
            .unwrap_or(0)
    }

    fn tile_span(&self, z: u8) -> Option<f64> {
        Some(self.resolution(z)? * self.tile_size as f64)
    }

    /// Highest tile index along one axis at zoom `z`, capped to what `TileCoord` holds
    fn last_index(z: u8) -> u32 {
        TileCoord::tiles_per_axis(z)
            .map(|n| (n - 1).min(u32::MAX as u64) as u32)
            .unwrap_or(u32::MAX)
    }

    /// Map-unit extent covered by a tile
    pub fn tile_extent(&self, coord: TileCoord) -> Option<Extent> {
        let span = self.tile_span(coord.z)?;
        let min_x = self.extent.min_x + coord.x as f64 * span;
        let max_y = self.extent.max_y - coord.y as f64 * span;
        Some(Extent::new(min_x, max_y - span, min_x + span, max_y))
    }

    /// Tile containing `point` at zoom `z`; `None` outside the grid.
    pub fn tile_coord_for_point(&self, point: &Point, z: u8) -> Option<TileCoord> {
        if !self.extent.contains(point) {
            return None;
        }
        let span = self.tile_span(z)?;
        let last = Self::last_index(z);
        let x = (((point.x - self.extent.min_x) / span).floor() as u32).min(last);
        let y = (((self.extent.max_y - point.y) / span).floor() as u32).min(last);
        Some(TileCoord::new(x, y, z))
    }

    /// All tiles at zoom `z` intersecting `extent`, row by row
    pub fn tiles_in_extent(&self, extent: &Extent, z: u8) -> Vec<TileCoord> {
        let Some(span) = self.tile_span(z) else {
            return Vec::new();
        };
        if !self.extent.intersects(extent) {
            return Vec::new();
        }

        let last = Self::last_index(z) as f64;
        let clamp = |v: f64| v.floor().clamp(0.0, last) as u32;
        let min_x = clamp((extent.min_x - self.extent.min_x) / span);
        let max_x = clamp((extent.max_x - self.extent.min_x) / span);
        let min_y = clamp((self.extent.max_y - extent.max_y) / span);
        let max_y = clamp((self.extent.max_y - extent.min_y) / span);

        let width = (max_x - min_x) as usize + 1;
        let height = (max_y - min_y) as usize + 1;
        let mut tiles = Vec::with_capacity(width * height);
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                tiles.push(TileCoord::new(x, y, z));
            }
        }
        tiles
    }
}

impl Default for TileGrid {
    fn default() -> Self {
        WEB_MERCATOR_GRID.clone()
    }
}
