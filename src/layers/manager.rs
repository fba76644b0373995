//! Keyed layer registry kept in lockstep with the map's layer collection.
//!
//! Positional rules:
//! - the layer under the tile key is always at index 0;
//! - the layer under the top-anchor key is always last;
//! - any other layer with a z-index goes right before the first layer whose
//!   z-index is strictly greater, and never outside the two reserved layers.
//!
//! Operations that await pending data take `&mut self` for the whole call, so
//! the pending value is resolved before the registry is touched and two calls
//! on the same manager cannot interleave.

use crate::{
    core::{config::LayerManagerConfig, map::Map},
    layers::{
        base::LayerKind,
        factory::{create_vector_layer, VectorLayerOptions},
        vector::Feature,
        wrapper::LayerWrapper,
        Pending,
    },
    prelude::HashMap,
    MapError, Result,
};

pub struct LayerManager {
    map: Map,
    config: LayerManagerConfig,
    /// All wrappers indexed by key
    layers: HashMap<String, LayerWrapper>,
    /// Keys in registration order
    keys: Vec<String>,
    next_generated: usize,
}

impl std::fmt::Debug for LayerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerManager")
            .field("map", &self.map)
            .field("config", &self.config)
            .field("keys", &self.keys)
            .finish()
    }
}

impl LayerManager {
    /// Registry over `map`; the map's layer collection must start empty or
    /// only hold layers this manager will never see.
    pub fn new(map: Map) -> Self {
        Self::with_config(map, LayerManagerConfig::default())
    }

    pub fn with_config(map: Map, config: LayerManagerConfig) -> Self {
        Self {
            map,
            config,
            layers: HashMap::default(),
            keys: Vec::new(),
            next_generated: 0,
        }
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    /// Mutable access for view changes and listeners; the layer collection
    /// itself stays under the manager's control.
    pub fn map_mut(&mut self) -> &mut Map {
        &mut self.map
    }

    pub fn config(&self) -> &LayerManagerConfig {
        &self.config
    }

    /// Registers a wrapper (awaiting it first when pending) and returns the
    /// effective key.
    ///
    /// The key defaults to the wrapper's name, or a generated `layer-N`. An
    /// existing entry under the same key is removed from the map first. When
    /// `z_index` is `None` the wrapper's own z-index, if any, positions it.
    ///
    /// A renderable already registered under another key is rejected with
    /// [`MapError::Configuration`]; each map entry belongs to exactly one key.
    pub async fn add_layer(
        &mut self,
        wrapper: impl Into<Pending<LayerWrapper>>,
        key: Option<&str>,
        z_index: Option<i32>,
    ) -> Result<String> {
        let wrapper = wrapper.into().resolve().await?;

        let key = match key.or_else(|| wrapper.name()) {
            Some(key) => key.to_string(),
            None => self.generate_key(),
        };

        let attached_elsewhere = self
            .layers
            .iter()
            .find(|(other, registered)| **other != key && registered.layer().ptr_eq(wrapper.layer()));
        if let Some((other, _)) = attached_elsewhere {
            return Err(MapError::Configuration(format!(
                "layer for {} is already registered under {}",
                key, other
            )));
        }

        if self.layers.contains_key(&key) {
            #[cfg(feature = "debug")]
            log::debug!("replacing layer {}", key);
            self.remove_layer(&key);
        }

        let layer = wrapper.layer().clone();
        let z_index = match z_index {
            Some(z) => Some(z),
            None if key == self.config.tile_key => {
                Some(layer.z_index().unwrap_or(self.config.tile_z_index))
            }
            None => layer.z_index(),
        };
        if let Some(z) = z_index {
            layer.set_z_index(z);
        }

        let index = self.insertion_index(&key, z_index);
        let _position = self.map.insert_layer(index, layer);

        #[cfg(feature = "debug")]
        log::debug!(
            "added {} layer {} at index {} (z-index {:?})",
            wrapper.layer_type(),
            key,
            _position,
            z_index
        );

        self.layers.insert(key.clone(), wrapper);
        self.keys.push(key.clone());
        Ok(key)
    }

    fn generate_key(&mut self) -> String {
        loop {
            let key = format!("layer-{}", self.next_generated);
            self.next_generated += 1;
            if !self.layers.contains_key(&key) {
                return key;
            }
        }
    }

    fn insertion_index(&self, key: &str, z_index: Option<i32>) -> usize {
        let len = self.map.len();
        if key == self.config.tile_key {
            return 0;
        }
        if key == self.config.top_anchor_key {
            return len;
        }

        let (min, max) = self.movable_bounds();
        let wanted = match z_index {
            Some(z) => self
                .map
                .layers()
                .iter()
                .position(|layer| layer.z_index().map_or(false, |other| other > z))
                .unwrap_or(len),
            None => len,
        };
        wanted.clamp(min, max)
    }

    /// First and one-past-last insertion slots between the reserved layers
    fn movable_bounds(&self) -> (usize, usize) {
        let min = self
            .reserved_index(&self.config.tile_key)
            .map_or(0, |index| index + 1);
        let max = self
            .reserved_index(&self.config.top_anchor_key)
            .unwrap_or(self.map.len());
        (min, max.max(min))
    }

    fn reserved_index(&self, key: &str) -> Option<usize> {
        let wrapper = self.layers.get(key)?;
        self.map.index_of(wrapper.layer())
    }

    fn index_of(&self, key: &str) -> Option<usize> {
        self.layers
            .get(key)
            .and_then(|wrapper| self.map.index_of(wrapper.layer()))
    }

    /// Removes the layer from the map and the registry; unknown keys are ignored.
    pub fn remove_layer(&mut self, key: &str) -> Option<LayerWrapper> {
        let wrapper = self.layers.remove(key)?;
        self.keys.retain(|k| k != key);
        self.map.remove_layer(wrapper.layer());

        #[cfg(feature = "debug")]
        log::debug!("removed layer {}", key);
        Some(wrapper)
    }

    pub fn remove_all_layers(&mut self) {
        self.keys.clear();
        self.layers.clear();
        self.map.clear_layers();
    }

    /// Removes everything but the background tile layer
    pub fn remove_all_except_tile_layer(&mut self) {
        let keys: Vec<String> = self
            .keys
            .iter()
            .filter(|key| **key != self.config.tile_key)
            .cloned()
            .collect();
        for key in keys {
            self.remove_layer(&key);
        }
    }

    /// Flips visibility; returns the new state, or `None` for unknown keys.
    pub fn toggle_layer(&self, key: &str) -> Option<bool> {
        self.layers.get(key).map(LayerWrapper::toggle_visible)
    }

    pub fn set_layer_visibility(&self, key: &str, visible: bool) {
        if let Some(wrapper) = self.layers.get(key) {
            wrapper.set_visible(visible);
        }
    }

    /// Moves a layer to `target_index`, clamped between the reserved layers,
    /// then renumbers every z-index to match its position. Returns whether the
    /// layer moved; reserved and unknown keys never do.
    pub fn move_layer(&mut self, key: &str, target_index: isize) -> bool {
        if self.config.is_reserved(key) {
            return false;
        }
        let Some(current) = self.index_of(key) else {
            return false;
        };

        let (min, end) = self.movable_bounds();
        let max = end.saturating_sub(1).max(min);
        let target = target_index.clamp(min as isize, max as isize) as usize;
        if target == current {
            return false;
        }

        self.map.move_layer(current, target);
        for (position, layer) in self.map.layers().iter().enumerate() {
            layer.set_z_index(position as i32);
        }

        #[cfg(feature = "debug")]
        log::debug!("moved layer {} from {} to {}", key, current, target);
        true
    }

    /// One step toward the bottom (lower index)
    pub fn move_layer_up(&mut self, key: &str) -> bool {
        match self.index_of(key) {
            Some(index) => self.move_layer(key, index as isize - 1),
            None => false,
        }
    }

    /// One step toward the top (higher index)
    pub fn move_layer_down(&mut self, key: &str) -> bool {
        match self.index_of(key) {
            Some(index) => self.move_layer(key, index as isize + 1),
            None => false,
        }
    }

    /// Swaps the features of a vector layer in one write; readers see either
    /// the old set or the new one.
    pub async fn replace_features(
        &mut self,
        key: &str,
        features: impl Into<Pending<Vec<Feature>>>,
    ) -> Result<()> {
        let features = features.into().resolve().await?;

        let wrapper = self
            .layers
            .get(key)
            .ok_or_else(|| MapError::LayerNotFound(key.to_string()))?;
        let mut layer = wrapper.layer().write();
        match &mut layer.kind {
            LayerKind::Vector(vector) => {
                #[cfg(feature = "debug")]
                log::debug!("replacing features of {} ({} new)", key, features.len());
                vector.source.replace_features(features);
                Ok(())
            }
            _ => Err(MapError::InvalidSource(key.to_string())),
        }
    }

    /// Makes the layer under `key` show `features`: replaces them when the key
    /// is registered, otherwise builds a vector layer and registers it.
    pub async fn add_or_replace_layer(
        &mut self,
        key: &str,
        features: impl Into<Pending<Vec<Feature>>>,
        options: Option<VectorLayerOptions>,
        name: Option<&str>,
    ) -> Result<String> {
        if self.layers.contains_key(key) {
            self.replace_features(key, features).await?;
            return Ok(key.to_string());
        }

        let options = options.unwrap_or_default();
        let z_index = options.z_index;
        let wrapper = create_vector_layer(features.into(), options, name).await?;
        self.add_layer(wrapper, Some(key), z_index).await
    }

    pub fn get_layer(&self, key: &str) -> Option<&LayerWrapper> {
        self.layers.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.layers.contains_key(key)
    }

    /// Entries in registration order
    pub fn get_all_layers(&self) -> Vec<(&str, &LayerWrapper)> {
        self.keys
            .iter()
            .filter_map(|key| self.layers.get(key).map(|w| (key.as_str(), w)))
            .collect()
    }

    /// Entries in the map's drawing order, bottom first
    pub fn get_ordered_layers(&self) -> Vec<(&str, &LayerWrapper)> {
        self.map
            .layers()
            .iter()
            .filter_map(|layer| {
                self.layers
                    .iter()
                    .find(|(_, wrapper)| wrapper.layer().ptr_eq(layer))
                    .map(|(key, wrapper)| (key.as_str(), wrapper))
            })
            .collect()
    }

    /// Keys in drawing order
    pub fn ordered_keys(&self) -> Vec<String> {
        self.get_ordered_layers()
            .into_iter()
            .map(|(key, _)| key.to_string())
            .collect()
    }

    /// Gets the number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Checks if the manager is empty
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{tile::TileLayer, vector::VectorLayer};
    use futures::executor::block_on;

    fn vector(name: Option<&str>) -> LayerWrapper {
        LayerWrapper::vector(VectorLayer::default(), name)
    }

    #[test]
    fn test_key_defaults() {
        let mut manager = LayerManager::new(Map::default());

        let named = block_on(manager.add_layer(vector(Some("regions")), None, None)).unwrap();
        let generated = block_on(manager.add_layer(vector(None), None, None)).unwrap();

        assert_eq!(named, "regions");
        assert_eq!(generated, "layer-0");
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_tile_goes_to_bottom_with_reserved_z() {
        let mut manager = LayerManager::new(Map::default());
        block_on(manager.add_layer(vector(None), Some("a"), None)).unwrap();
        block_on(manager.add_layer(LayerWrapper::tile(TileLayer::openstreetmap(), None), Some("tile"), None))
            .unwrap();

        assert_eq!(manager.ordered_keys(), vec!["tile", "a"]);
        assert_eq!(manager.get_layer("tile").unwrap().layer().z_index(), Some(-1));
    }

    #[test]
    fn test_same_renderable_under_two_keys_rejected() {
        let mut manager = LayerManager::new(Map::default());
        let shared = vector(None);

        block_on(manager.add_layer(shared.clone(), Some("a"), None)).unwrap();
        assert!(matches!(
            block_on(manager.add_layer(shared.clone(), Some("b"), None)),
            Err(MapError::Configuration(_))
        ));
        assert_eq!(manager.ordered_keys(), vec!["a"]);
        assert_eq!(manager.map().len(), 1);

        // re-registering under its own key is a plain replace
        block_on(manager.add_layer(shared, Some("a"), Some(4))).unwrap();
        assert_eq!(manager.ordered_keys(), vec!["a"]);
        assert_eq!(manager.map().len(), 1);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut manager = LayerManager::new(Map::default());
        assert!(manager.remove_layer("missing").is_none());
        assert_eq!(manager.toggle_layer("missing"), None);
        assert!(!manager.move_layer_up("missing"));
    }

    #[test]
    fn test_replace_features_errors() {
        let mut manager = LayerManager::new(Map::default());
        block_on(manager.add_layer(LayerWrapper::tile(TileLayer::openstreetmap(), None), Some("tile"), None))
            .unwrap();

        assert!(matches!(
            block_on(manager.replace_features("tile", Vec::<Feature>::new())),
            Err(MapError::InvalidSource(key)) if key == "tile"
        ));
        assert!(matches!(
            block_on(manager.replace_features("nope", Vec::<Feature>::new())),
            Err(MapError::LayerNotFound(_))
        ));
    }
}
