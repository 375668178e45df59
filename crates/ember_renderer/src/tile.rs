//! Tile-based work partitioning.
//!
//! Divides the image into square tiles that can be rendered independently.
//! Tiles never overlap, so workers can write their pixels without locks.

use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Default tile size in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 32;

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// X coordinate of tile's top-left corner
    pub x: u32,
    /// Y coordinate of tile's top-left corner
    pub y: u32,
    /// Width of the tile in pixels
    pub width: u32,
    /// Height of the tile in pixels
    pub height: u32,
    /// Raster position of this tile in the grid. Stable across reordering,
    /// so it doubles as the tile's random seed key.
    pub index: usize,
}

impl Tile {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self { x, y, width, height, index }
    }

    /// Get the total number of pixels in this tile.
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Pixel coordinates in raster order.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.y..self.y + self.height).flat_map(move |y| (self.x..self.x + self.width).map(move |x| (x, y)))
    }
}

/// Order in which tiles are handed to workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileOrder {
    /// Random order; spreads expensive regions across the whole render.
    #[default]
    Shuffled,
    /// Closest to the image center first, like production bucket renderers.
    CenterOut,
    /// Left to right, top to bottom.
    Raster,
}

/// Generate tiles for an image in raster order, clipped at the edges.
pub fn generate_tiles(width: u32, height: u32, tile_size: u32) -> Vec<Tile> {
    let mut tiles = Vec::new();
    if tile_size == 0 {
        return tiles;
    }

    let mut index = 0;
    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let tw = tile_size.min(width - x);
            let th = tile_size.min(height - y);
            tiles.push(Tile::new(x, y, tw, th, index));
            index += 1;
            x += tile_size;
        }
        y += tile_size;
    }

    tiles
}

/// Reorder tiles in place. Tile indices are left untouched.
pub fn order_tiles(tiles: &mut [Tile], order: TileOrder, width: u32, height: u32, rng: &mut dyn RngCore) {
    match order {
        TileOrder::Shuffled => tiles.shuffle(rng),
        TileOrder::CenterOut => sort_center_out(tiles, width, height),
        TileOrder::Raster => tiles.sort_by_key(|tile| tile.index),
    }
}

/// Sort tiles by distance from image center.
fn sort_center_out(tiles: &mut [Tile], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;

    let distance = |tile: &Tile| {
        let tile_x = tile.x as f32 + tile.width as f32 / 2.0;
        let tile_y = tile.y as f32 + tile.height as f32 / 2.0;
        (tile_x - center_x).powi(2) + (tile_y - center_y).powi(2)
    };

    tiles.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
}
