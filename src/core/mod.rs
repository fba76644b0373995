//! Map instance, geometry primitives and configuration shared by the layer
//! registry and the tile loading code.

pub mod config;
pub mod constants;
pub mod geo;
pub mod map;
