//! The rendering core: spatial index, redraw queue and the buffered
//! orthogonal renderer.
//!
//! The renderer owns an off-screen buffer slightly larger than the
//! viewport.  Camera moves scroll that buffer in place and repaint only the
//! exposed edge band; drawables composited on top get their depth order
//! repaired against higher map layers through the quadtree index.

pub mod orthogonal;
pub mod quadtree;
pub mod queue;

pub use orthogonal::{Drawable, OrthogonalRenderer, RenderError};
pub use quadtree::QuadTree;
pub use queue::{RedrawQueue, TileCoord};
