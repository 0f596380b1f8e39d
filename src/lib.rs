//! Buffered scrolling renderer for orthogonal tile maps.
//!
//! *The viewport is small, the map is huge; repainting every tile each
//! frame is a waste.*  This crate keeps the visible region (plus a padding
//! margin) in a persistent off-screen [`Surface`] and reconciles it lazily:
//!
//! * [`OrthogonalRenderer::center`] only records the requested camera
//!   point; the next [`OrthogonalRenderer::draw`] performs a single
//!   reconciliation, shifting the buffer pixels in place and repainting
//!   only the newly exposed edge band.
//! * Foreground entities ([`Drawable`]s) are blitted over the map and then
//!   partially covered again by tiles from higher map layers, located
//!   through a [`QuadTree`] over the buffer's cells, so tall scenery
//!   correctly hides a character's feet without re-rendering the frame.
//!
//! Map data is consumed through the [`TileSource`] trait; [`GridMap`] is a
//! ready-made in-memory implementation.  See `src/bin/scroll_view.rs` for a
//! complete windowed example.

pub mod gfx;
pub mod map;
pub mod render;

pub use gfx::{Rect, Rgba, Surface};
pub use map::{GridMap, LayerId, MapError, TileId, TileSource};
pub use render::{Drawable, OrthogonalRenderer, QuadTree, RedrawQueue, RenderError, TileCoord};
