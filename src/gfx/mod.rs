//! Pixel-level building blocks: integer rectangles and software surfaces.

pub mod rect;
pub mod surface;

pub use rect::Rect;
pub use surface::{Rgba, Surface};
