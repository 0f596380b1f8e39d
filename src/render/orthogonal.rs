//! Scrolling renderer for orthogonal tile maps.
//!
//! The renderer keeps an off-screen buffer a few tiles larger than the
//! viewport.  Camera moves shift the existing pixels in place and repaint
//! only the newly exposed edge band, so the per-frame cost is proportional
//! to how far the camera moved, not to the viewport size.  Foreground
//! drawables are composited on top and then partially covered again by map
//! tiles from higher layers, restoring depth order without re-rendering the
//! frame.
//!
//! Single-threaded by design: all buffer mutation happens inside the
//! caller's `draw`/`update`/`flush` calls, and `&mut self` keeps the redraw
//! queue single-consumer.

use glam::Vec2;
use thiserror::Error;

use crate::gfx::{Rect, Rgba, Surface};
use crate::map::{LayerId, TileSource};
use crate::render::quadtree::QuadTree;
use crate::render::queue::{RedrawQueue, TileCoord};

/// Subdivision levels for the buffer-cell index.  View grids are a few
/// hundred cells; one split already bounds a hit query to a quarter of them.
const QUADTREE_DEPTH: usize = 2;

/// An externally-owned entity composited over the map for one frame.
///
/// `rect` is in screen coordinates; map tiles on layers strictly above
/// `layer` will cover the image where they overlap it.
#[derive(Clone, Copy)]
pub struct Drawable<'a> {
    pub image: &'a Surface,
    pub rect: Rect,
    pub layer: LayerId,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    /// `draw` was called before a viewport size was configured and the draw
    /// area is empty, so no size could be inferred from it.
    #[error("viewport size not configured and draw area is empty")]
    NoViewport,
}

/// Buffered renderer for orthogonal (rectangular-grid) maps.
pub struct OrthogonalRenderer {
    /// Keep the camera inside the map bounds.
    pub clamp_camera: bool,
    /// Drain the whole redraw queue before every `draw`.  Disable to spread
    /// tile blits over `update` calls instead.
    pub flush_on_draw: bool,
    /// Tiles blitted per `update` call.
    pub update_rate: usize,
    /// Extra buffered tiles beyond the viewport; pre-fetch margin that hides
    /// scroll latency.  Takes effect on the next `set_size`.
    pub padding: usize,

    data: Box<dyn TileSource>,
    default_tile: Surface,
    background: Rgba,
    colorkey: Option<Rgba>,

    buffer: Surface,
    view: Rect,
    map_rect: Rect,
    cell_index: QuadTree,
    queue: RedrawQueue,

    size: Option<(usize, usize)>,
    half_w: i32,
    half_h: i32,
    offset_x: i32,
    offset_y: i32,
    previous_x: i32,
    previous_y: i32,
    pending_center: Option<Vec2>,
    idle: bool,
    blank: bool,
}

impl OrthogonalRenderer {
    /// Create a renderer over `data`.  When `size` is `None` the viewport is
    /// inferred from the draw area on the first `draw` call.
    pub fn new(data: Box<dyn TileSource>, size: Option<(usize, usize)>) -> OrthogonalRenderer {
        let mut r = OrthogonalRenderer {
            clamp_camera: false,
            flush_on_draw: true,
            update_rate: 10,
            padding: 4,
            data,
            default_tile: Surface::new(0, 0),
            background: 0,
            colorkey: None,
            buffer: Surface::new(0, 0),
            view: Rect::default(),
            map_rect: Rect::default(),
            cell_index: QuadTree::new(Vec::new(), 0, None),
            queue: RedrawQueue::new(),
            size: None,
            half_w: 0,
            half_h: 0,
            offset_x: 0,
            offset_y: 0,
            previous_x: 0,
            previous_y: 0,
            pending_center: None,
            idle: false,
            blank: true,
        };
        r.refresh_data();
        if let Some((w, h)) = size {
            r.set_size(w, h);
        }
        r
    }

    /*──────────────────────── configuration ─────────────────────────*/

    /// Set the viewport size in pixels and (re)build the buffer, the view
    /// rectangle and the cell index.  The buffer becomes blank; the next
    /// `draw` repaints it in full.
    pub fn set_size(&mut self, w: usize, h: usize) {
        let tw = self.data.tile_width();
        let th = self.data.tile_height();

        let buffer_w = w + tw * self.padding;
        let buffer_h = h + th * self.padding;
        self.buffer = Surface::new(buffer_w, buffer_h);
        if let Some(key) = self.colorkey {
            self.buffer.set_colorkey(Some(key));
            self.buffer.fill(key);
        }

        self.view = Rect::new(
            0,
            0,
            buffer_w.div_ceil(tw) as i32,
            buffer_h.div_ceil(th) as i32,
        );
        self.half_w = (w / 2) as i32;
        self.half_h = (h / 2) as i32;

        // index over the buffer's cell grid, in buffer-local pixel coords
        let mut cells = Vec::with_capacity((self.view.w * self.view.h) as usize);
        for y in 0..self.view.h {
            for x in 0..self.view.w {
                cells.push(Rect::new(
                    x * tw as i32,
                    y * th as i32,
                    tw as i32,
                    th as i32,
                ));
            }
        }
        self.cell_index = QuadTree::new(cells, QUADTREE_DEPTH, None);

        self.size = Some((w, h));
        self.queue.clear();
        self.offset_x = 0;
        self.offset_y = 0;
        self.previous_x = 0;
        self.previous_y = 0;
        self.idle = false;
        self.blank = true;
    }

    /// Swap the tile-data source.  The default tile is regenerated and, if a
    /// viewport is already configured, buffer and index are rebuilt (the new
    /// source may use different tile geometry).
    pub fn set_data(&mut self, data: Box<dyn TileSource>) {
        self.data = data;
        self.refresh_data();
        if let Some((w, h)) = self.size {
            self.set_size(w, h);
        }
    }

    /// Color treated as transparent when the buffer is blitted to the
    /// destination.  Setting a key clears the buffer to it; configure this
    /// before the first draw.
    pub fn set_colorkey(&mut self, key: Option<Rgba>) {
        self.colorkey = key;
        self.buffer.set_colorkey(key);
        if let Some(key) = key {
            self.buffer.fill(key);
        }
    }

    /// Color of the default tile substituted for absent base-layer tiles.
    pub fn set_background(&mut self, color: Rgba) {
        self.background = color;
        self.generate_default_tile();
    }

    /*──────────────────────── camera ────────────────────────────────*/

    /// Request the map be centered on `point` (world pixels).  The work is
    /// deferred: repeated calls within one frame coalesce into a single
    /// reconciliation on the next `draw`.
    pub fn center(&mut self, point: Vec2) {
        self.pending_center = Some(point);
    }

    /// Move the camera by `vector` pixels relative to the last center.
    pub fn scroll(&mut self, vector: Vec2) {
        self.center(Vec2::new(
            self.previous_x as f32 + vector.x,
            self.previous_y as f32 + vector.y,
        ));
    }

    /// Translation that maps world pixels to screen pixels for the most
    /// recently requested center.  Apply to entity positions to build the
    /// drawable rects passed to `draw`.
    pub fn sprite_offset(&self) -> Vec2 {
        let (cx, cy) = match self.pending_center {
            Some(p) => self.clamped_center(p),
            None => (self.previous_x, self.previous_y),
        };
        Vec2::new((self.half_w - cx) as f32, (self.half_h - cy) as f32)
    }

    /*──────────────────────── queue management ──────────────────────*/

    /// Mark one tile for repaint on the next draw.  Useful after mutating
    /// the map data.  For several tiles, prefer [`Self::update_queue`].
    pub fn update_tile(&mut self, coord: TileCoord) {
        self.queue.push(coord);
    }

    /// Mark a batch of tiles for repaint on the next draw.
    pub fn update_queue<I: IntoIterator<Item = TileCoord>>(&mut self, coords: I) {
        self.queue.extend(coords);
    }

    /// Blit up to `update_rate` queued tiles.  Calling this between draws
    /// spreads redraw cost across frames; `dt` is accepted for frame-loop
    /// compatibility and not used for pacing.
    pub fn update(&mut self, _dt: f32) {
        let batch = self.queue.take(self.update_rate);
        self.blit_tiles(&batch);
    }

    /// Blit every queued tile.
    pub fn flush(&mut self) {
        let batch = self.queue.take_all();
        self.blit_tiles(&batch);
    }

    /// Repaint the entire view.  Slow; normally only needed internally when
    /// the buffer is blank.
    pub fn redraw(&mut self) {
        self.queue.clear();
        let v = self.view;
        self.enqueue_region(v.left(), v.right(), v.top(), v.bottom());
        self.flush();
    }

    /*──────────────────────── drawing ───────────────────────────────*/

    /// Draw the map (and `drawables`, depth-corrected) onto `dest` within
    /// `area`.  Returns the screen rectangles that changed: the drawable
    /// rects when the camera was at rest, the whole `area` otherwise.
    pub fn draw(
        &mut self,
        dest: &mut Surface,
        area: Rect,
        drawables: &[Drawable],
    ) -> Result<Vec<Rect>, RenderError> {
        if self.size.is_none() {
            if area.is_empty() {
                return Err(RenderError::NoViewport);
            }
            self.set_size(area.w as usize, area.h as usize);
        }

        if let Some(point) = self.pending_center.take() {
            self.center_map(point);
        }
        if self.blank {
            self.redraw();
            self.blank = false;
            // a full repaint is never an at-rest frame
            self.idle = false;
        }
        if self.flush_on_draw && !self.queue.is_empty() {
            self.flush();
        }

        // buffer top-left on screen; the sub-tile offset pulls it up-left
        let ox = area.left() - self.offset_x;
        let oy = area.top() - self.offset_y;
        dest.blit_clipped(&self.buffer, ox, oy, area);

        let mut dirty = Vec::new();
        if !drawables.is_empty() {
            dirty = self.overdraw(dest, area, ox, oy, drawables);
        }

        if self.idle { Ok(dirty) } else { Ok(vec![area]) }
    }

    /*──────────────────────── accessors ─────────────────────────────*/

    /// The tile-grid window currently materialized in the buffer.
    pub fn view(&self) -> Rect {
        self.view
    }

    /// Number of tiles waiting in the redraw queue.
    pub fn pending_tiles(&self) -> usize {
        self.queue.len()
    }

    /// The off-screen buffer (for inspection; the renderer owns it).
    pub fn buffer(&self) -> &Surface {
        &self.buffer
    }

    /*──────────────────────── internals ─────────────────────────────*/

    fn refresh_data(&mut self) {
        let tw = self.data.tile_width();
        let th = self.data.tile_height();
        self.map_rect = Rect::new(
            0,
            0,
            (self.data.width() * tw) as i32,
            (self.data.height() * th) as i32,
        );
        self.generate_default_tile();
    }

    fn generate_default_tile(&mut self) {
        self.default_tile = Surface::filled(
            self.data.tile_width(),
            self.data.tile_height(),
            self.background,
        );
    }

    /// Clamp (when enabled) and round a requested center to whole pixels.
    fn clamped_center(&self, point: Vec2) -> (i32, i32) {
        let mut p = point;
        if self.clamp_camera {
            p.x = clamp_axis(p.x, self.half_w as f32, self.map_rect.w as f32);
            p.y = clamp_axis(p.y, self.half_h as f32, self.map_rect.h as f32);
        }
        (p.x.round() as i32, p.y.round() as i32)
    }

    /// The single per-frame reconciliation of a requested center.
    fn center_map(&mut self, point: Vec2) {
        let tw = self.data.tile_width() as i32;
        let th = self.data.tile_height() as i32;
        let hpad = (self.padding / 2) as i32;

        let (x, y) = self.clamped_center(point);

        // exact repeat of the previous center: nothing to reconcile
        if self.previous_x == x && self.previous_y == y {
            self.idle = true;
            return;
        }
        self.idle = false;

        // new view origin and sub-tile offset; floored division keeps the
        // offset in [0, tile) for negative coordinates too
        let left = (x - self.half_w).div_euclid(tw);
        let top = (y - self.half_h).div_euclid(th);
        self.offset_x = (x - self.half_w).rem_euclid(tw) + hpad * tw;
        self.offset_y = (y - self.half_h).rem_euclid(th) + hpad * th;

        let dx = left - hpad - self.view.x;
        let dy = top - hpad - self.view.y;

        if dx != 0 || dy != 0 {
            self.view.translate(dx, dy);
            // much faster than repainting: shift the surviving pixels and
            // queue only the exposed edge band
            self.buffer.scroll(-dx * tw, -dy * th);
            self.enqueue_edge_tiles(dx, dy);
        }

        self.previous_x = x;
        self.previous_y = y;
    }

    /// Queue the tiles exposed by a view shift of `(dx, dy)`.
    fn enqueue_edge_tiles(&mut self, dx: i32, dy: i32) {
        let v = self.view;

        if dx > 0 {
            let x0 = (v.right() - dx).max(v.left());
            self.enqueue_region(x0, v.right(), v.top(), v.bottom());
        } else if dx < 0 {
            let x1 = (v.left() - dx).min(v.right());
            self.enqueue_region(v.left(), x1, v.top(), v.bottom());
        }

        if dy > 0 {
            let y0 = (v.bottom() - dy).max(v.top());
            self.enqueue_region(v.left(), v.right(), y0, v.bottom());
        } else if dy < 0 {
            let y1 = (v.top() - dy).min(v.bottom());
            self.enqueue_region(v.left(), v.right(), v.top(), y1);
        }
    }

    /// Queue every `(x, y, layer)` in the region: rows outer, columns inner,
    /// layers innermost, ascending.
    fn enqueue_region(&mut self, x0: i32, x1: i32, y0: i32, y1: i32) {
        let layers = self.data.visible_tile_layers();
        for y in y0..y1 {
            for x in x0..x1 {
                for &layer in &layers {
                    self.queue.push(TileCoord::new(x, y, layer));
                }
            }
        }
    }

    /// Blit a drained batch of tile coordinates into the buffer.
    ///
    /// Absent tiles substitute the default tile on the base layer only;
    /// substituting on higher layers would erase lower-layer pixels.  With a
    /// colorkey the base layer first resets the cell to the key so stale
    /// pixels cannot survive a scroll.
    fn blit_tiles(&mut self, coords: &[TileCoord]) {
        if coords.is_empty() {
            return;
        }
        let tw = self.data.tile_width() as i32;
        let th = self.data.tile_height() as i32;
        let left_px = self.view.left() * tw;
        let top_px = self.view.top() * th;
        let base = self.data.visible_tile_layers().first().copied();

        for c in coords {
            let px = c.x * tw - left_px;
            let py = c.y * th - top_px;
            let is_base = Some(c.layer) == base;

            if let Some(key) = self.colorkey {
                if is_base {
                    self.buffer.fill_rect(Rect::new(px, py, tw, th), key);
                }
                if let Some(tile) = self.data.tile_image(c.x, c.y, c.layer) {
                    self.buffer.blit(tile, px, py);
                }
            } else {
                match self.data.tile_image(c.x, c.y, c.layer) {
                    Some(tile) => self.buffer.blit(tile, px, py),
                    None if is_base => self.buffer.blit(&self.default_tile, px, py),
                    None => {}
                }
            }
        }
    }

    /// Composite `drawables` over the already-blitted map and repair their
    /// depth order against higher map layers.
    fn overdraw(
        &self,
        dest: &mut Surface,
        area: Rect,
        ox: i32,
        oy: i32,
        drawables: &[Drawable],
    ) -> Vec<Rect> {
        let tw = self.data.tile_width() as i32;
        let th = self.data.tile_height() as i32;
        let layers = self.data.visible_tile_layers();
        let left = self.view.left();
        let top = self.view.top();

        // every drawable first sits provisionally above the whole map
        for d in drawables {
            dest.blit_clipped(d.image, d.rect.x, d.rect.y, area);
        }

        for d in drawables {
            // into buffer-local pixels, then back through the cell index
            let local = d.rect.translated(-ox, -oy);
            for cell in self.cell_index.hit(&local) {
                for &layer in layers.iter().filter(|&&l| l > d.layer) {
                    let tx = left + cell.x / tw;
                    let ty = top + cell.y / th;
                    // ties go to the drawable; absent tiles are skipped, not
                    // substituted
                    if let Some(tile) = self.data.tile_image(tx, ty, layer) {
                        dest.blit_clipped(tile, cell.x + ox, cell.y + oy, area);
                    }
                }
            }
        }

        drawables
            .iter()
            .filter_map(|d| d.rect.intersection(&area))
            .collect()
    }
}

/// Component-wise camera clamp.  A viewport meeting or exceeding the map on
/// an axis pins the camera to the map midpoint on that axis.
fn clamp_axis(v: f32, half: f32, extent: f32) -> f32 {
    if extent <= half * 2.0 {
        extent * 0.5
    } else {
        v.clamp(half, extent - half)
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::GridMap;
    use glam::vec2;
    use smallvec::SmallVec;
    use std::cell::RefCell;
    use std::rc::Rc;

    const TILE: usize = 8;

    /// Unique, never-zero color per map cell.
    fn color_at(x: usize, y: usize) -> Rgba {
        (0x0001_0000 * x as u32) + (0x0000_0100 * y as u32) + 1
    }

    /// `w x h` map with one layer of uniquely colored tiles.
    fn solid_map(w: usize, h: usize) -> GridMap {
        let mut map = GridMap::new(w, h, TILE, TILE).unwrap();
        let l0 = map.push_layer();
        for y in 0..h {
            for x in 0..w {
                let id = map
                    .add_tile(Surface::filled(TILE, TILE, color_at(x, y)))
                    .unwrap();
                map.set_cell(x as i32, y as i32, l0, Some(id)).unwrap();
            }
        }
        map
    }

    /// TileSource wrapper recording every `tile_image` request.
    struct CountingSource {
        inner: GridMap,
        requests: Rc<RefCell<Vec<(i32, i32, LayerId)>>>,
    }

    impl CountingSource {
        fn new(inner: GridMap) -> (CountingSource, Rc<RefCell<Vec<(i32, i32, LayerId)>>>) {
            let requests = Rc::new(RefCell::new(Vec::new()));
            (
                CountingSource {
                    inner,
                    requests: requests.clone(),
                },
                requests,
            )
        }
    }

    impl TileSource for CountingSource {
        fn tile_width(&self) -> usize {
            self.inner.tile_width()
        }
        fn tile_height(&self) -> usize {
            self.inner.tile_height()
        }
        fn width(&self) -> usize {
            self.inner.width()
        }
        fn height(&self) -> usize {
            self.inner.height()
        }
        fn visible_tile_layers(&self) -> SmallVec<[LayerId; 8]> {
            self.inner.visible_tile_layers()
        }
        fn tile_image(&self, x: i32, y: i32, layer: LayerId) -> Option<&Surface> {
            self.requests.borrow_mut().push((x, y, layer));
            self.inner.tile_image(x, y, layer)
        }
    }

    fn viewport() -> (Surface, Rect) {
        (Surface::new(40, 40), Rect::new(0, 0, 40, 40))
    }

    #[test]
    fn first_draw_fills_the_viewport() {
        let mut r = OrthogonalRenderer::new(Box::new(solid_map(10, 10)), Some((40, 40)));
        let (mut dest, area) = viewport();

        r.center(vec2(20.0, 20.0));
        let dirty = r.draw(&mut dest, area, &[]).unwrap();

        assert_eq!(dirty, vec![area]);
        assert_eq!(dest.get(0, 0), Some(color_at(0, 0)));
        assert_eq!(dest.get(20, 20), Some(color_at(2, 2)));
        assert_eq!(dest.get(39, 39), Some(color_at(4, 4)));
    }

    #[test]
    fn repeated_center_is_idle_and_paints_nothing() {
        let (source, requests) = CountingSource::new(solid_map(10, 10));
        let mut r = OrthogonalRenderer::new(Box::new(source), Some((40, 40)));
        let (mut dest, area) = viewport();

        r.center(vec2(20.0, 20.0));
        r.draw(&mut dest, area, &[]).unwrap();
        requests.borrow_mut().clear();

        r.center(vec2(20.0, 20.0));
        let dirty = r.draw(&mut dest, area, &[]).unwrap();

        assert_eq!(r.pending_tiles(), 0);
        assert!(requests.borrow().is_empty());
        assert!(dirty.is_empty());
    }

    #[test]
    fn one_tile_move_enqueues_exactly_one_band() {
        // padding 0: view extent equals the 5x5-tile viewport, so a one-tile
        // move must request exactly 5 tiles (one column x one layer)
        let (source, requests) = CountingSource::new(solid_map(10, 10));
        let mut r = OrthogonalRenderer::new(Box::new(source), None);
        r.padding = 0;
        r.set_size(40, 40);
        let (mut dest, area) = viewport();

        r.center(vec2(20.0, 20.0));
        r.draw(&mut dest, area, &[]).unwrap();
        let before = dest.clone();
        requests.borrow_mut().clear();

        r.center(vec2(28.0, 20.0));
        r.draw(&mut dest, area, &[]).unwrap();

        let reqs = requests.borrow();
        assert_eq!(reqs.len(), 5);
        assert!(reqs.iter().all(|&(x, _, _)| x == 5)); // the exposed column

        // surviving pixels were shifted, not repainted
        assert_eq!(dest.get(0, 0), before.get(8, 0));
        assert_eq!(dest.get(31, 39), before.get(39, 39));
        // the new column shows the next map column
        assert_eq!(dest.get(39, 0), Some(color_at(5, 0)));
    }

    #[test]
    fn one_tile_move_from_map_origin() {
        // camera at the map origin, then one tile right: negative view
        // coordinates must still produce a single exact band
        let (source, requests) = CountingSource::new(solid_map(10, 10));
        let mut r = OrthogonalRenderer::new(Box::new(source), None);
        r.padding = 0;
        r.set_size(40, 40);
        let (mut dest, area) = viewport();

        r.center(vec2(0.0, 0.0));
        r.draw(&mut dest, area, &[]).unwrap();
        let before = dest.clone();
        requests.borrow_mut().clear();

        r.center(vec2(8.0, 0.0));
        r.draw(&mut dest, area, &[]).unwrap();

        assert_eq!(requests.borrow().len(), 5);
        assert_eq!(dest.get(0, 30), before.get(8, 30));
        assert_eq!(dest.get(24, 24), before.get(32, 24));
    }

    #[test]
    fn center_sequences_converge_to_a_fresh_redraw() {
        let path = [
            vec2(20.0, 20.0),
            vec2(28.0, 20.0),
            vec2(36.0, 28.0),
            vec2(50.0, 44.0),
            vec2(12.0, 60.0),
            vec2(33.0, 33.0),
        ];

        let mut scrolled = OrthogonalRenderer::new(Box::new(solid_map(10, 10)), Some((40, 40)));
        let (mut dest_a, area) = viewport();
        for p in path {
            scrolled.center(p);
            scrolled.draw(&mut dest_a, area, &[]).unwrap();
        }

        let mut fresh = OrthogonalRenderer::new(Box::new(solid_map(10, 10)), Some((40, 40)));
        let (mut dest_b, _) = viewport();
        fresh.center(*path.last().unwrap());
        fresh.draw(&mut dest_b, area, &[]).unwrap();

        assert_eq!(dest_a.pixels(), dest_b.pixels());
    }

    #[test]
    fn clamped_requests_stay_inside_map_plus_padding() {
        let (source, requests) = CountingSource::new(solid_map(10, 10));
        let mut r = OrthogonalRenderer::new(Box::new(source), Some((40, 40)));
        r.clamp_camera = true;
        let (mut dest, area) = viewport();

        for p in [
            vec2(-100.0, -100.0),
            vec2(1000.0, 3.0),
            vec2(40.0, 1000.0),
            vec2(5.0, 5.0),
        ] {
            r.center(p);
            r.draw(&mut dest, area, &[]).unwrap();
        }

        let pad = 4_i32;
        for &(x, y, _) in requests.borrow().iter() {
            assert!((-pad..10 + pad).contains(&x), "x = {x}");
            assert!((-pad..10 + pad).contains(&y), "y = {y}");
        }
    }

    #[test]
    fn oversized_viewport_centers_on_map_midpoint() {
        // 3x3 map (24px) under a 40px viewport: clamping pins to midpoint
        let mut r = OrthogonalRenderer::new(Box::new(solid_map(3, 3)), Some((40, 40)));
        r.clamp_camera = true;
        let (mut dest, area) = viewport();

        r.center(vec2(100.0, 100.0));
        r.draw(&mut dest, area, &[]).unwrap();

        assert_eq!(r.sprite_offset(), vec2(8.0, 8.0)); // half(20) - midpoint(12)
    }

    #[test]
    fn occlusion_repair_restores_depth_order() {
        let mut map = solid_map(10, 10);
        let l1 = map.push_layer();
        let l2 = map.push_layer();
        let s = map.add_tile(Surface::filled(TILE, TILE, 0x55)).unwrap();
        let t = map.add_tile(Surface::filled(TILE, TILE, 0x77)).unwrap();
        map.set_cell(1, 1, l1, Some(s)).unwrap(); // same layer as the drawable
        map.set_cell(2, 2, l2, Some(t)).unwrap(); // above the drawable

        let mut r = OrthogonalRenderer::new(Box::new(map), Some((40, 40)));
        let (mut dest, area) = viewport();

        let sprite = Surface::filled(16, 16, 0xD0);
        let drawables = [Drawable {
            image: &sprite,
            rect: Rect::new(12, 12, 16, 16),
            layer: l1,
        }];

        r.center(vec2(20.0, 20.0));
        r.draw(&mut dest, area, &drawables).unwrap();

        // layer 2 tile covers the sprite where they overlap
        assert_eq!(dest.get(17, 17), Some(0x77));
        assert_eq!(dest.get(23, 23), Some(0x77));
        // same-layer tile loses the tie: the sprite stays on top
        assert_eq!(dest.get(13, 13), Some(0xD0));
        // sprite over plain base tiles is unobstructed
        assert_eq!(dest.get(26, 26), Some(0xD0));
        // untouched map pixels keep their tile color
        assert_eq!(dest.get(5, 5), Some(color_at(0, 0)));

        // at rest, only the drawable rects are reported dirty
        r.center(vec2(20.0, 20.0));
        let dirty = r.draw(&mut dest, area, &drawables).unwrap();
        assert_eq!(dirty, vec![Rect::new(12, 12, 16, 16)]);
    }

    #[test]
    fn size_is_inferred_from_the_draw_area() {
        let mut r = OrthogonalRenderer::new(Box::new(solid_map(10, 10)), None);
        let (mut dest, area) = viewport();

        r.draw(&mut dest, area, &[]).unwrap();

        assert_eq!(r.pending_tiles(), 0);
        assert_eq!(dest.get(0, 0), Some(color_at(0, 0)));
    }

    #[test]
    fn empty_draw_area_without_size_is_an_error() {
        let mut r = OrthogonalRenderer::new(Box::new(solid_map(10, 10)), None);
        let mut dest = Surface::new(0, 0);
        let err = r.draw(&mut dest, Rect::new(0, 0, 0, 0), &[]).unwrap_err();
        assert_eq!(err, RenderError::NoViewport);
    }

    #[test]
    fn update_drains_in_bounded_batches() {
        let mut r = OrthogonalRenderer::new(Box::new(solid_map(10, 10)), Some((40, 40)));
        let (mut dest, area) = viewport();
        r.draw(&mut dest, area, &[]).unwrap();

        r.update_queue([
            TileCoord::new(0, 0, 0),
            TileCoord::new(1, 0, 0),
            TileCoord::new(2, 0, 0),
        ]);
        r.update_rate = 2;

        r.update(0.0);
        assert_eq!(r.pending_tiles(), 1);
        r.update(0.0);
        assert_eq!(r.pending_tiles(), 0);
    }

    #[test]
    fn scroll_moves_relative_to_the_last_center() {
        let mut r = OrthogonalRenderer::new(Box::new(solid_map(10, 10)), Some((40, 40)));
        let (mut dest, area) = viewport();

        r.center(vec2(20.0, 20.0));
        r.draw(&mut dest, area, &[]).unwrap();

        r.scroll(vec2(8.0, 0.0));
        r.draw(&mut dest, area, &[]).unwrap();

        assert_eq!(r.sprite_offset(), vec2(-8.0, 0.0));
    }

    #[test]
    fn colorkey_keeps_empty_cells_transparent_across_scrolls() {
        const KEY: Rgba = 0xAB_CD_EF;
        const BACKDROP: Rgba = 0xBB;

        // full base layer except cell (0, 0)
        let mut map = GridMap::new(10, 10, TILE, TILE).unwrap();
        let l0 = map.push_layer();
        for y in 0..10 {
            for x in 0..10 {
                if (x, y) == (0, 0) {
                    continue;
                }
                let id = map
                    .add_tile(Surface::filled(TILE, TILE, color_at(x, y)))
                    .unwrap();
                map.set_cell(x as i32, y as i32, l0, Some(id)).unwrap();
            }
        }

        let mut r = OrthogonalRenderer::new(Box::new(map), Some((40, 40)));
        r.set_colorkey(Some(KEY));
        let area = Rect::new(0, 0, 40, 40);
        let mut dest = Surface::filled(40, 40, BACKDROP);

        r.center(vec2(20.0, 20.0));
        r.draw(&mut dest, area, &[]).unwrap();
        assert_eq!(dest.get(3, 3), Some(BACKDROP)); // hole shows through
        assert_eq!(dest.get(11, 3), Some(color_at(1, 0)));

        // scroll until the hole leaves the buffer, then come back: the cell
        // must be repainted transparent, not with stale pixels
        r.center(vec2(116.0, 20.0));
        r.draw(&mut dest, area, &[]).unwrap();
        r.center(vec2(20.0, 20.0));
        dest.fill(BACKDROP);
        r.draw(&mut dest, area, &[]).unwrap();
        assert_eq!(dest.get(3, 3), Some(BACKDROP));
    }

    #[test]
    fn set_data_rebuilds_for_new_tile_geometry() {
        let mut r = OrthogonalRenderer::new(Box::new(solid_map(10, 10)), Some((40, 40)));
        let (mut dest, area) = viewport();
        r.draw(&mut dest, area, &[]).unwrap();

        // swap in a map with 16px tiles; view extent must shrink to match
        let mut map = GridMap::new(6, 6, 16, 16).unwrap();
        let l0 = map.push_layer();
        let id = map.add_tile(Surface::filled(16, 16, 0x42)).unwrap();
        for y in 0..6 {
            for x in 0..6 {
                map.set_cell(x, y, l0, Some(id)).unwrap();
            }
        }
        r.set_data(Box::new(map));

        assert_eq!(r.view().w, (40 + 16 * 4_usize).div_ceil(16) as i32);
        r.center(vec2(48.0, 48.0));
        r.draw(&mut dest, area, &[]).unwrap();
        assert_eq!(dest.get(20, 20), Some(0x42));
    }
}
