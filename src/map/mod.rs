//! Tile-map data: the [`TileSource`] contract and an in-memory grid map.

pub mod grid;
pub mod source;

pub use grid::{GridMap, MapError, TileId};
pub use source::{LayerId, TileSource};
