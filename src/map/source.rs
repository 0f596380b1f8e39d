//! The contract between the renderer and whatever owns the map.
//!
//! The renderer never parses map files or decodes assets; it consumes tile
//! data exclusively through [`TileSource`].  Any concrete map format adapts
//! to this trait.

use smallvec::SmallVec;

use crate::gfx::Surface;

/// Tile-layer index.  Ascending layers are drawn back-to-front.
pub type LayerId = u16;

/// Read-only provider of tile geometry and tile images.
///
/// A `None` from [`TileSource::tile_image`] is the ordinary "absent"
/// outcome: the position is outside the map or the cell is empty on that
/// layer.  It is never an error.
pub trait TileSource {
    /// Width of one tile in pixels.
    fn tile_width(&self) -> usize;

    /// Height of one tile in pixels.
    fn tile_height(&self) -> usize;

    /// Map width in tiles.
    fn width(&self) -> usize;

    /// Map height in tiles.
    fn height(&self) -> usize;

    /// Visible tile-layer indices, ascending.
    fn visible_tile_layers(&self) -> SmallVec<[LayerId; 8]>;

    /// The tile image at `(x, y)` on `layer`, if any.
    fn tile_image(&self, x: i32, y: i32, layer: LayerId) -> Option<&Surface>;
}
