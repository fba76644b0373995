//! The live map: a view plus the ordered layer collection the widget draws.
//!
//! Index 0 is drawn first (bottom). Only the crate mutates the collection;
//! outside code reads it and observes changes through
//! [`Map::on_layers_changed`].

use crate::{
    core::{
        constants::MAX_RESOLUTION,
        geo::{LatLng, Point, Projection},
    },
    layers::base::LayerRef,
};

/// Change to the layer collection, reported to listeners after it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerEvent {
    Added { index: usize },
    Removed { index: usize },
    Moved { from: usize, to: usize },
}

type LayerListener = Box<dyn Fn(&LayerEvent) + Send + Sync>;

/// Center and zoom of the map
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub center: LatLng,
    pub zoom: f64,
    pub projection: Projection,
}

impl View {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self {
            center,
            zoom: zoom.max(0.0),
            projection: Projection::WebMercator,
        }
    }

    /// Map units per pixel at the current zoom
    pub fn resolution(&self) -> f64 {
        MAX_RESOLUTION / 2_f64.powf(self.zoom)
    }

    pub fn center_point(&self) -> Point {
        self.center.to_mercator()
    }
}

impl Default for View {
    /// Jeju island overview
    fn default() -> Self {
        Self::new(LatLng::new(33.38, 126.55), 10.0)
    }
}

pub struct Map {
    view: View,
    layers: Vec<LayerRef>,
    listeners: Vec<LayerListener>,
}

impl std::fmt::Debug for Map {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map")
            .field("view", &self.view)
            .field("layers", &self.layers.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for Map {
    fn default() -> Self {
        Self::new(View::default())
    }
}

impl Map {
    pub fn new(view: View) -> Self {
        Self {
            view,
            layers: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.view = View {
            center,
            zoom: zoom.max(0.0),
            projection: self.view.projection.clone(),
        };
    }

    /// Layers bottom to top
    pub fn layers(&self) -> &[LayerRef] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Position of `layer` in the collection, by identity
    pub fn index_of(&self, layer: &LayerRef) -> Option<usize> {
        self.layers.iter().position(|l| l.ptr_eq(layer))
    }

    pub fn on_layers_changed<F>(&mut self, listener: F)
    where
        F: Fn(&LayerEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Inserts at `index`, clamped to the end of the collection
    pub(crate) fn insert_layer(&mut self, index: usize, layer: LayerRef) -> usize {
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);
        self.notify(LayerEvent::Added { index });
        index
    }

    /// Removes `layer` if present and returns where it was
    pub(crate) fn remove_layer(&mut self, layer: &LayerRef) -> Option<usize> {
        let index = self.index_of(layer)?;
        self.layers.remove(index);
        self.notify(LayerEvent::Removed { index });
        Some(index)
    }

    pub(crate) fn move_layer(&mut self, from: usize, to: usize) {
        if from == to || from >= self.layers.len() {
            return;
        }
        let layer = self.layers.remove(from);
        let to = to.min(self.layers.len());
        self.layers.insert(to, layer);
        self.notify(LayerEvent::Moved { from, to });
    }

    pub(crate) fn clear_layers(&mut self) {
        while let Some(layer) = self.layers.last().cloned() {
            self.remove_layer(&layer);
        }
    }

    fn notify(&self, event: LayerEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }
}
