//! Quadtree over tile-cell rectangles.
//!
//! Answers "which buffer cells intersect this rectangle" during occlusion
//! repair.  Pure and immutable after construction:
//!
//! * An item overlapping **all four** quadrants is kept at the current node
//!   instead of being copied down every branch.
//! * An item touching a center line is duplicated into every quadrant it
//!   overlaps, so boundary queries can never miss it.
//! * Query results are value-compared `Rect`s; the cells indexed here are
//!   unique by construction.

use std::collections::HashSet;

use crate::gfx::Rect;

pub struct QuadTree {
    items: Vec<Rect>,
    cx: i32,
    cy: i32,
    nw: Option<Box<QuadTree>>,
    ne: Option<Box<QuadTree>>,
    se: Option<Box<QuadTree>>,
    sw: Option<Box<QuadTree>>,
}

impl QuadTree {
    /// Build a tree from `items` with at most `depth` levels of subdivision.
    ///
    /// `boundary` is the bounding box of all items; when `None` it is
    /// computed as their union.  Depth 0 degenerates to a flat linear scan.
    pub fn new(items: Vec<Rect>, depth: usize, boundary: Option<Rect>) -> QuadTree {
        let mut node = QuadTree {
            items: Vec::new(),
            cx: 0,
            cy: 0,
            nw: None,
            ne: None,
            se: None,
            sw: None,
        };

        if depth <= 1 || items.is_empty() {
            node.items = items;
            return node;
        }
        let depth = depth - 1;

        let boundary = boundary
            .unwrap_or_else(|| items[1..].iter().fold(items[0], |acc, r| acc.union(r)));
        let (cx, cy) = boundary.center();
        node.cx = cx;
        node.cy = cy;

        let mut nw_items = Vec::new();
        let mut ne_items = Vec::new();
        let mut se_items = Vec::new();
        let mut sw_items = Vec::new();

        for item in items {
            // Inclusive half-plane tests: which sub-quadrants does the item
            // overlap?
            let in_nw = item.left() <= cx && item.top() <= cy;
            let in_sw = item.left() <= cx && item.bottom() >= cy;
            let in_ne = item.right() >= cx && item.top() <= cy;
            let in_se = item.right() >= cx && item.bottom() >= cy;

            if in_nw && in_ne && in_se && in_sw {
                node.items.push(item);
            } else {
                if in_nw {
                    nw_items.push(item);
                }
                if in_ne {
                    ne_items.push(item);
                }
                if in_se {
                    se_items.push(item);
                }
                if in_sw {
                    sw_items.push(item);
                }
            }
        }

        let child = |items: Vec<Rect>, r: Rect| -> Option<Box<QuadTree>> {
            if items.is_empty() {
                None
            } else {
                Some(Box::new(QuadTree::new(items, depth, Some(r))))
            }
        };

        let (l, t) = (boundary.left(), boundary.top());
        let (r, b) = (boundary.right(), boundary.bottom());
        node.nw = child(nw_items, Rect::new(l, t, cx - l, cy - t));
        node.ne = child(ne_items, Rect::new(cx, t, r - cx, cy - t));
        node.se = child(se_items, Rect::new(cx, cy, r - cx, b - cy));
        node.sw = child(sw_items, Rect::new(l, cy, cx - l, b - cy));
        node
    }

    /// All stored items that overlap `rect`.
    pub fn hit(&self, rect: &Rect) -> HashSet<Rect> {
        let mut hits = HashSet::new();
        self.collect_hits(rect, &mut hits);
        hits
    }

    fn collect_hits(&self, rect: &Rect, out: &mut HashSet<Rect>) {
        out.extend(self.items.iter().filter(|i| i.intersects(rect)));

        // Descend only into quadrants the query can geometrically overlap,
        // using the same inclusive tests the items were distributed with.
        if rect.left() <= self.cx && rect.top() <= self.cy {
            if let Some(nw) = &self.nw {
                nw.collect_hits(rect, out);
            }
        }
        if rect.left() <= self.cx && rect.bottom() >= self.cy {
            if let Some(sw) = &self.sw {
                sw.collect_hits(rect, out);
            }
        }
        if rect.right() >= self.cx && rect.top() <= self.cy {
            if let Some(ne) = &self.ne {
                ne.collect_hits(rect, out);
            }
        }
        if rect.right() >= self.cx && rect.bottom() >= self.cy {
            if let Some(se) = &self.se {
                se.collect_hits(rect, out);
            }
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    /// `cols x rows` grid of `size`-pixel cells, the shape the renderer
    /// indexes.
    fn cell_grid(cols: i32, rows: i32, size: i32) -> Vec<Rect> {
        let mut cells = Vec::new();
        for y in 0..rows {
            for x in 0..cols {
                cells.push(Rect::new(x * size, y * size, size, size));
            }
        }
        cells
    }

    fn brute_force(items: &[Rect], query: &Rect) -> HashSet<Rect> {
        items.iter().filter(|r| r.intersects(query)).copied().collect()
    }

    #[test]
    fn hit_matches_brute_force_on_grid() {
        let cells = cell_grid(8, 8, 16);
        for depth in [0, 2, 4] {
            let tree = QuadTree::new(cells.clone(), depth, None);
            let queries = [
                Rect::new(0, 0, 16, 16),
                Rect::new(10, 10, 40, 24),
                Rect::new(60, 60, 10, 10), // straddles the grid center
                Rect::new(-5, -5, 8, 8),
                Rect::new(120, 120, 50, 50),
                Rect::new(200, 200, 4, 4), // off the grid entirely
                Rect::new(0, 0, 128, 128),
            ];
            for q in queries {
                assert_eq!(
                    tree.hit(&q),
                    brute_force(&cells, &q),
                    "depth {depth}, query {q:?}"
                );
            }
        }
    }

    #[test]
    fn centerline_item_found_from_either_side() {
        // one item straddling the vertical center line of a 4x1 strip
        let items = vec![
            Rect::new(0, 0, 10, 10),
            Rect::new(15, 0, 10, 10),
            Rect::new(30, 0, 10, 10),
        ];
        let tree = QuadTree::new(items, 4, Some(Rect::new(0, 0, 40, 10)));
        assert!(tree.hit(&Rect::new(12, 2, 2, 2)).contains(&Rect::new(15, 0, 10, 10)));
        assert!(tree.hit(&Rect::new(26, 2, 2, 2)).contains(&Rect::new(15, 0, 10, 10)));
    }

    #[test]
    fn depth_zero_is_flat_scan() {
        let cells = cell_grid(4, 4, 8);
        let tree = QuadTree::new(cells.clone(), 0, None);
        let q = Rect::new(3, 3, 20, 6);
        assert_eq!(tree.hit(&q), brute_force(&cells, &q));
    }

    #[test]
    fn empty_tree_hits_nothing() {
        let tree = QuadTree::new(Vec::new(), 4, None);
        assert!(tree.hit(&Rect::new(0, 0, 100, 100)).is_empty());
    }

    #[test]
    fn disjoint_query_hits_nothing() {
        let tree = QuadTree::new(cell_grid(4, 4, 8), 2, None);
        assert!(tree.hit(&Rect::new(-50, -50, 10, 10)).is_empty());
    }
}
