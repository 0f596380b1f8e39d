//! Pending tile blits.
//!
//! The renderer never paints a tile the moment it is invalidated; it pushes
//! the coordinate here and drains the queue either incrementally
//! ([`RedrawQueue::take`], from `update`) or eagerly ([`RedrawQueue::take_all`],
//! from `flush`).  Entries are consumed in FIFO order and a coordinate may
//! appear more than once; the later blit simply overwrites the earlier
//! pixels.

use std::collections::VecDeque;

use crate::map::LayerId;

/// One cell of the map: grid position plus layer index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
    pub layer: LayerId,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32, layer: LayerId) -> TileCoord {
        TileCoord { x, y, layer }
    }
}

#[derive(Default)]
pub struct RedrawQueue {
    pending: VecDeque<TileCoord>,
}

impl RedrawQueue {
    pub fn new() -> RedrawQueue {
        RedrawQueue::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn push(&mut self, coord: TileCoord) {
        self.pending.push_back(coord);
    }

    pub fn extend<I: IntoIterator<Item = TileCoord>>(&mut self, coords: I) {
        self.pending.extend(coords);
    }

    /// Remove and return at most `max` entries, oldest first.
    pub fn take(&mut self, max: usize) -> Vec<TileCoord> {
        let n = max.min(self.pending.len());
        self.pending.drain(..n).collect()
    }

    /// Remove and return every entry.
    pub fn take_all(&mut self) -> Vec<TileCoord> {
        self.pending.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
