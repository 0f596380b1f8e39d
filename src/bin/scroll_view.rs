//! Windowed scrolling demo.
//!
//! ```bash
//! cargo run --release --bin scroll_view -- --map-size 256
//! ```
//!
//! Arrow keys / WASD move the camera (hold Shift to go faster).  A sprite
//! bounces around the map on the ground layer; trees on the layer above it
//! cover it as it passes behind them.

use std::time::{Duration, Instant};

use clap::Parser;
use glam::{Vec2, vec2};
use minifb::{Key, Window, WindowOptions};

use tilescroll::{Drawable, GridMap, OrthogonalRenderer, Rect, Rgba, Surface};

const GRASS: [Rgba; 4] = [0x4C_8C_3A, 0x54_96_40, 0x47_84_36, 0x50_90_3C];
const WATER: Rgba = 0x2B_5F_9E;
const CANOPY: Rgba = 0x2E_6B_2F;
const TRUNK: Rgba = 0x5D_40_37;
const KEY: Rgba = 0x00FF_00FF; // magenta, never used by tiles

#[derive(Parser)]
#[command(about = "Scrolling tile-map viewer")]
struct Args {
    /// Window width in pixels
    #[arg(long, default_value_t = 960)]
    width: usize,

    /// Window height in pixels
    #[arg(long, default_value_t = 600)]
    height: usize,

    /// Map size in tiles per side
    #[arg(long, default_value_t = 128)]
    map_size: usize,

    /// Tile size in pixels
    #[arg(long, default_value_t = 32)]
    tile_size: usize,

    /// Let the camera leave the map bounds
    #[arg(long)]
    no_clamp: bool,
}

/// Small deterministic mixer so the map looks the same on every run.
fn cell_hash(x: usize, y: usize) -> u32 {
    let mut h = (x as u32).wrapping_mul(0x9E37_79B9) ^ (y as u32).wrapping_mul(0x85EB_CA6B);
    h ^= h >> 13;
    h = h.wrapping_mul(0xC2B2_AE35);
    h ^ (h >> 16)
}

fn ground_tile(size: usize, fill: Rgba) -> Surface {
    let mut s = Surface::filled(size, size, fill);
    // faint grid line on two edges so scrolling is visible
    let dark = fill.saturating_sub(0x000A_0A0A);
    s.fill_rect(Rect::new(0, 0, size as i32, 1), dark);
    s.fill_rect(Rect::new(0, 0, 1, size as i32), dark);
    s
}

fn tree_tile(size: usize) -> Surface {
    let sz = size as i32;
    let mut s = Surface::filled(size, size, KEY);
    s.set_colorkey(Some(KEY));
    s.fill_rect(Rect::new(sz / 8, 0, sz * 3 / 4, sz * 2 / 3), CANOPY);
    s.fill_rect(Rect::new(sz / 2 - sz / 10, sz * 2 / 3, (sz / 5).max(1), sz / 3), TRUNK);
    s
}

fn sprite_image(tile: usize) -> Surface {
    let w = (tile * 3 / 4) as i32;
    let h = (tile * 5 / 4) as i32;
    let mut s = Surface::filled(w as usize, h as usize, KEY);
    s.set_colorkey(Some(KEY));
    s.fill_rect(Rect::new(w / 6, h / 4, w * 2 / 3, h * 3 / 4), 0xC8_4B_31); // body
    s.fill_rect(Rect::new(w / 4, 0, w / 2, h / 4), 0xE8_C3_9E); // head
    s
}

fn build_map(size: usize, tile: usize) -> anyhow::Result<GridMap> {
    let mut map = GridMap::new(size, size, tile, tile)?;

    let mut ground_ids = Vec::new();
    for fill in GRASS {
        ground_ids.push(map.add_tile(ground_tile(tile, fill))?);
    }
    let water = map.add_tile(ground_tile(tile, WATER))?;
    let tree = map.add_tile(tree_tile(tile))?;

    let l0 = map.push_layer();
    let l1 = map.push_layer();
    for y in 0..size {
        for x in 0..size {
            let h = cell_hash(x, y);
            let ground = if h % 11 == 0 {
                water
            } else {
                ground_ids[(h % 4) as usize]
            };
            map.set_cell(x as i32, y as i32, l0, Some(ground))?;
            if h % 23 == 3 {
                map.set_cell(x as i32, y as i32, l1, Some(tree))?;
            }
        }
    }
    Ok(map)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let map = build_map(args.map_size, args.tile_size)?;

    let map_px = (args.map_size * args.tile_size) as f32;
    let mut renderer = OrthogonalRenderer::new(Box::new(map), Some((args.width, args.height)));
    renderer.clamp_camera = !args.no_clamp;

    let sprite = sprite_image(args.tile_size);
    let (sw, sh) = (sprite.width() as i32, sprite.height() as i32);

    let mut camera = vec2(map_px * 0.5, map_px * 0.5);
    let mut entity = camera + vec2(args.tile_size as f32 * 2.0, 0.0);
    let mut entity_vel = vec2(71.0, 53.0); // px/s, deliberately incommensurate

    let mut frame = Surface::new(args.width, args.height);
    let area = Rect::new(0, 0, args.width as i32, args.height as i32);

    let mut win = Window::new(
        "tilescroll demo",
        args.width,
        args.height,
        WindowOptions::default(),
    )?;
    win.set_target_fps(60);

    // ────────────────── benchmarking state ──────────────────────────────
    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();
    let mut last_frame = Instant::now();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let dt = last_frame.elapsed().as_secs_f32().min(0.1);
        last_frame = Instant::now();
        let t0 = Instant::now();

        /* --------------- camera movement ---------------------------------- */
        let mut dir = Vec2::ZERO;
        if win.is_key_down(Key::Left) || win.is_key_down(Key::A) {
            dir.x -= 1.0;
        }
        if win.is_key_down(Key::Right) || win.is_key_down(Key::D) {
            dir.x += 1.0;
        }
        if win.is_key_down(Key::Up) || win.is_key_down(Key::W) {
            dir.y -= 1.0;
        }
        if win.is_key_down(Key::Down) || win.is_key_down(Key::S) {
            dir.y += 1.0;
        }
        let fast = win.is_key_down(Key::LeftShift) || win.is_key_down(Key::RightShift);
        let speed = args.tile_size as f32 * if fast { 24.0 } else { 8.0 };
        camera += dir * speed * dt;

        /* --------------- bounce the entity -------------------------------- */
        entity += entity_vel * dt;
        if entity.x < 0.0 || entity.x > map_px {
            entity_vel.x = -entity_vel.x;
            entity.x = entity.x.clamp(0.0, map_px);
        }
        if entity.y < 0.0 || entity.y > map_px {
            entity_vel.y = -entity_vel.y;
            entity.y = entity.y.clamp(0.0, map_px);
        }

        /* --------------- draw ---------------------------------------------- */
        renderer.center(camera);

        // feet at the entity position, body extending upward
        let off = renderer.sprite_offset();
        let rect = Rect::new(
            (entity.x + off.x) as i32 - sw / 2,
            (entity.y + off.y) as i32 - sh,
            sw,
            sh,
        );
        let drawables = [Drawable {
            image: &sprite,
            rect,
            layer: 0,
        }];

        renderer.draw(&mut frame, area, &drawables)?;
        win.update_with_buffer(frame.pixels(), args.width, args.height)?;

        // ─────────── accumulate & report every ~3 s ────────────────────
        acc_time += t0.elapsed();
        acc_frames += 1;
        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames as f64;
            println!("avg frame: {:.2} ms  ({:.1} FPS)", avg_ms, 1000.0 / avg_ms);
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}
