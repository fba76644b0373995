//! Vector-tile plumbing: grid, request building, transport and loading.

pub mod format;
pub mod grid;
pub mod loader;
pub mod params;
pub mod source;
pub mod transport;

// Re-exports for convenience
pub use loader::{load_features_with_204, TileLoadOutcome, TileLoader};
pub use source::{PreparedTile, RequestMode, VectorTileSource};
