//! Raster basemap
//!
//! Tiles are fetched from a URL template, decoded off the UI thread and
//! uploaded as egui textures when they arrive.

pub mod cache;
pub mod loader;
pub mod source;

pub use cache::TileLayer;
pub use loader::{TileLoader, TileResponse};
pub use source::{TileSource, UrlTemplateSource};

use crate::core::constants::TILE_SIZE;
use crate::core::geo::{Point, TileCoord};
use crate::core::viewport::Viewport;

/// Highest zoom tile servers are asked for
pub const MAX_TILE_ZOOM: u8 = 19;

/// A tile and where it lands in the container
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedTile {
    /// Tile to fetch; `x` is wrapped into range
    pub coord: TileCoord,
    /// Top-left corner in container pixels
    pub min: Point,
    /// Edge length in container pixels
    pub size: f64,
}

/// Tiles covering the viewport at the nearest integer zoom, row by row.
/// Fractional zooms scale the tiles; longitude repeats across the
/// antimeridian, latitude does not.
pub fn visible_tiles(viewport: &Viewport) -> Vec<PlacedTile> {
    let z = viewport.zoom.round().clamp(0.0, MAX_TILE_ZOOM as f64) as u8;
    let scale = 2_f64.powf(viewport.zoom - z as f64);
    let tile = TILE_SIZE as f64;
    let tile_px = tile * scale;
    let n = 1_i64 << z;

    let center = viewport.project(&viewport.center, Some(z as f64));
    let half = viewport.size.multiply(0.5 / scale);

    let first_x = ((center.x - half.x) / tile).floor() as i64;
    let last_x = ((center.x + half.x) / tile).floor() as i64;
    let first_y = (((center.y - half.y) / tile).floor() as i64).max(0);
    let last_y = (((center.y + half.y) / tile).floor() as i64).min(n - 1);

    let mut tiles = Vec::new();
    for ty in first_y..=last_y {
        for tx in first_x..=last_x {
            let min = Point::new(
                (tx as f64 * tile - center.x) * scale + viewport.size.x / 2.0,
                (ty as f64 * tile - center.y) * scale + viewport.size.y / 2.0,
            );
            tiles.push(PlacedTile {
                coord: TileCoord::new(tx.rem_euclid(n) as u32, ty as u32, z),
                min,
                size: tile_px,
            });
        }
    }
    tiles
}
