//! Vector-tile layer: per-tile load state over a [`VectorTileSource`].
//!
//! Tiles are loaded outside the layer (see [`crate::tiles::loader`]) and the
//! outcome is handed back through [`VectorTileLayer::apply_result`]. Results
//! prepared under an older parameter generation are dropped there, so a
//! request that was in flight while the filters changed never overwrites the
//! tile with stale data.

use lru::LruCache;
use std::num::NonZeroUsize;

use crate::{
    core::{config::TileLoaderConfig, geo::TileCoord},
    layers::{style::LayerStyle, vector::Feature},
    tiles::{
        loader::{TileLoadOutcome, TileLoader},
        params::QueryParams,
        source::{PreparedTile, VectorTileSource},
    },
};

const DEFAULT_CACHE_SIZE: usize = 512;

/// Load state of one tile
#[derive(Debug, Clone, PartialEq)]
pub enum TileState {
    Loading,
    Loaded(Vec<Feature>),
    /// Server reported no content; drawn with the interim tile
    Empty,
    /// Fetch or decode failed; drawn with the interim tile
    Error(String),
}

#[derive(Debug)]
struct TileEntry {
    generation: u64,
    state: TileState,
    /// Features of an older generation, drawn until this entry's own load lands
    interim: Option<Vec<Feature>>,
}

impl TileEntry {
    fn drawable(&self) -> Option<&[Feature]> {
        match &self.state {
            TileState::Loaded(features) => Some(features.as_slice()),
            TileState::Loading => self.interim.as_deref(),
            TileState::Empty | TileState::Error(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct VectorTileLayer {
    source: VectorTileSource,
    pub style: LayerStyle,
    pub declutter: bool,
    tiles: LruCache<TileCoord, TileEntry>,
}

impl VectorTileLayer {
    pub fn new(source: VectorTileSource) -> Self {
        Self::with_cache_size(source, DEFAULT_CACHE_SIZE)
    }

    pub fn with_cache_size(source: VectorTileSource, cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            source,
            style: LayerStyle::default(),
            declutter: false,
            tiles: LruCache::new(capacity),
        }
    }

    /// Cache size and grid depth taken from the loader settings
    pub fn from_config(source: VectorTileSource, config: &TileLoaderConfig) -> Self {
        Self::with_cache_size(source.with_zoom_levels(config.zoom_levels), config.cache_size)
    }

    pub fn with_style(mut self, style: impl Into<LayerStyle>) -> Self {
        self.style = style.into();
        self
    }

    pub fn source(&self) -> &VectorTileSource {
        &self.source
    }

    /// New filter parameters; cached tiles stay as interim content until
    /// their replacements load.
    pub fn update_query_params(&mut self, params: QueryParams) {
        self.source.update_query_params(params);
    }

    /// State of `coord` for the current parameters
    pub fn tile_state(&self, coord: TileCoord) -> Option<&TileState> {
        self.tiles
            .peek(&coord)
            .filter(|entry| entry.generation == self.source.generation())
            .map(|entry| &entry.state)
    }

    /// Whether `coord` has nothing loaded or loading for the current parameters
    pub fn needs_load(&self, coord: TileCoord) -> bool {
        self.tile_state(coord).is_none()
    }

    /// Marks `coord` as loading and returns what to fetch, unless it is
    /// already loading or loaded, or lies outside the grid.
    pub fn prepare_load(&mut self, coord: TileCoord) -> Option<PreparedTile> {
        if !self.needs_load(coord) {
            return None;
        }
        let prepared = self.source.prepare_tile(coord)?;
        let interim = match self.tiles.pop(&coord) {
            Some(TileEntry {
                state: TileState::Loaded(features),
                ..
            }) => Some(features),
            Some(entry) => entry.interim,
            None => None,
        };
        self.tiles.put(
            coord,
            TileEntry {
                generation: prepared.generation,
                state: TileState::Loading,
                interim,
            },
        );
        Some(prepared)
    }

    /// Stores a load outcome. Returns `false` when the result belongs to an
    /// older parameter generation and was discarded.
    pub fn apply_result(&mut self, tile: &PreparedTile, outcome: TileLoadOutcome) -> bool {
        if tile.generation != self.source.generation() {
            #[cfg(feature = "debug")]
            log::debug!(
                "discarding tile {} from generation {} (current {})",
                tile.coord,
                tile.generation,
                self.source.generation()
            );
            return false;
        }

        let state = match outcome {
            TileLoadOutcome::Loaded { features, .. } => TileState::Loaded(features),
            TileLoadOutcome::Empty => TileState::Empty,
            TileLoadOutcome::Failed(reason) => TileState::Error(reason),
        };
        self.tiles.put(
            tile.coord,
            TileEntry {
                generation: tile.generation,
                state,
                interim: None,
            },
        );
        true
    }

    /// Prepares, fetches and applies one tile. Returns the applied state, or
    /// `None` when nothing was fetched or the result went stale.
    pub async fn load_tile(&mut self, loader: &TileLoader, coord: TileCoord) -> Option<&TileState> {
        let prepared = self.prepare_load(coord)?;
        let format = self.source.format().clone();
        let outcome = loader.fetch(&prepared, format.as_ref()).await;
        if self.apply_result(&prepared, outcome) {
            self.tile_state(coord)
        } else {
            None
        }
    }

    /// Features to draw for `coord` and the tile they come from: the tile
    /// itself when loaded, otherwise the nearest loaded ancestor (interim
    /// tile). Content from older generations keeps being drawn while the
    /// tile reloads under new parameters.
    pub fn renderable_tile(&self, coord: TileCoord) -> Option<(TileCoord, &[Feature])> {
        let mut current = Some(coord);
        while let Some(tile) = current {
            if let Some(features) = self.tiles.peek(&tile).and_then(TileEntry::drawable) {
                return Some((tile, features));
            }
            current = tile.parent();
        }
        None
    }

    pub fn cached_tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn clear_tiles(&mut self) {
        self.tiles.clear();
    }
}
