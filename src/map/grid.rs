//! In-memory tile map.
//!
//! * Tile images live in a bank and are referred to by [`TileId`] handles;
//!   ids stay stable for the lifetime of the map.
//! * Each layer is a dense `width * height` grid of optional tile ids.
//! * Implements [`TileSource`], so it can back the renderer directly; it is
//!   also what the tests and the demo build their fixtures from.

use smallvec::SmallVec;

use crate::gfx::Surface;
use crate::map::source::{LayerId, TileSource};

/// Runtime handle for a tile image in the bank.
pub type TileId = u16;

/// Things that can go wrong when building or mutating a [`GridMap`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MapError {
    /// Maps must be at least one tile in each dimension.
    #[error("degenerate map: {0}x{1} tiles")]
    EmptyMap(usize, usize),

    /// Tiles must be at least one pixel in each dimension.
    #[error("degenerate tile size: {0}x{1}")]
    EmptyTile(usize, usize),

    /// Tile images must match the map's tile geometry.
    #[error("tile image is {0}x{1}, map tiles are {2}x{3}")]
    BadTileSize(usize, usize, usize, usize),

    /// Requested tile id was never handed out by `add_tile`.
    #[error("tile id {0} out of range")]
    BadTile(TileId),

    /// Requested layer was never created by `push_layer`.
    #[error("layer {0} out of range")]
    BadLayer(LayerId),

    /// Cell coordinates outside `[0, width) x [0, height)`.
    #[error("cell ({0}, {1}) outside the map")]
    BadCell(i32, i32),
}

#[derive(Debug)]
struct Layer {
    cells: Vec<Option<TileId>>,
    visible: bool,
}

#[derive(Debug)]
pub struct GridMap {
    width: usize,
    height: usize,
    tile_w: usize,
    tile_h: usize,
    tiles: Vec<Surface>,
    layers: Vec<Layer>,
}

impl GridMap {
    /// Create an empty map of `width * height` cells of `tile_w * tile_h`
    /// pixel tiles, with no layers yet.
    pub fn new(width: usize, height: usize, tile_w: usize, tile_h: usize) -> Result<GridMap, MapError> {
        if width == 0 || height == 0 {
            return Err(MapError::EmptyMap(width, height));
        }
        if tile_w == 0 || tile_h == 0 {
            return Err(MapError::EmptyTile(tile_w, tile_h));
        }
        Ok(GridMap {
            width,
            height,
            tile_w,
            tile_h,
            tiles: Vec::new(),
            layers: Vec::new(),
        })
    }

    /// Register a tile image and obtain its handle.
    pub fn add_tile(&mut self, tile: Surface) -> Result<TileId, MapError> {
        if tile.width() != self.tile_w || tile.height() != self.tile_h {
            return Err(MapError::BadTileSize(
                tile.width(),
                tile.height(),
                self.tile_w,
                self.tile_h,
            ));
        }
        let id = self.tiles.len() as TileId;
        self.tiles.push(tile);
        Ok(id)
    }

    /// Append an empty, visible layer on top of the existing ones.
    pub fn push_layer(&mut self) -> LayerId {
        let id = self.layers.len() as LayerId;
        self.layers.push(Layer {
            cells: vec![None; self.width * self.height],
            visible: true,
        });
        id
    }

    /// Place (or clear, with `None`) a tile in one cell.
    pub fn set_cell(
        &mut self,
        x: i32,
        y: i32,
        layer: LayerId,
        tile: Option<TileId>,
    ) -> Result<(), MapError> {
        if let Some(id) = tile {
            if id as usize >= self.tiles.len() {
                return Err(MapError::BadTile(id));
            }
        }
        if !(0..self.width as i32).contains(&x) || !(0..self.height as i32).contains(&y) {
            return Err(MapError::BadCell(x, y));
        }
        let idx = y as usize * self.width + x as usize;
        self.layers
            .get_mut(layer as usize)
            .ok_or(MapError::BadLayer(layer))?
            .cells[idx] = tile;
        Ok(())
    }

    pub fn cell(&self, x: i32, y: i32, layer: LayerId) -> Option<TileId> {
        if !(0..self.width as i32).contains(&x) || !(0..self.height as i32).contains(&y) {
            return None;
        }
        let layer = self.layers.get(layer as usize)?;
        layer.cells[y as usize * self.width + x as usize]
    }

    /// Hide or show a whole layer.
    pub fn set_layer_visible(&mut self, layer: LayerId, visible: bool) -> Result<(), MapError> {
        self.layers
            .get_mut(layer as usize)
            .ok_or(MapError::BadLayer(layer))?
            .visible = visible;
        Ok(())
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

impl TileSource for GridMap {
    fn tile_width(&self) -> usize {
        self.tile_w
    }

    fn tile_height(&self) -> usize {
        self.tile_h
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn visible_tile_layers(&self) -> SmallVec<[LayerId; 8]> {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, l)| l.visible)
            .map(|(i, _)| i as LayerId)
            .collect()
    }

    fn tile_image(&self, x: i32, y: i32, layer: LayerId) -> Option<&Surface> {
        let id = self.cell(x, y, layer)?;
        Some(&self.tiles[id as usize])
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
