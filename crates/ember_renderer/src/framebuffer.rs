//! Shared RGBA8 framebuffer written concurrently by render workers.

use image::RgbaImage;
use std::sync::atomic::{AtomicU32, Ordering};

/// Fixed-size grid of RGBA8 pixels.
///
/// Pixels are packed into `AtomicU32`s so workers can write through a
/// shared reference. Tiles never overlap, so each pixel has exactly one
/// writer and relaxed stores are enough; the join at the end of a render
/// publishes every write to the reader.
#[derive(Debug)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<AtomicU32>,
}

impl Framebuffer {
    /// Create a new framebuffer filled with transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: (0..len).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        y as usize * self.width as usize + x as usize
    }

    /// Set the pixel at (x, y).
    pub fn set(&self, x: u32, y: u32, rgba: [u8; 4]) {
        self.pixels[self.index(x, y)].store(u32::from_le_bytes(rgba), Ordering::Relaxed);
    }

    /// Raw RGBA bytes in row-major order.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| p.load(Ordering::Relaxed).to_le_bytes())
            .collect()
    }

    /// Hand the pixels over as an image for encoding or filtering.
    pub fn into_image(self) -> RgbaImage {
        // Length is width * height * 4 by construction.
        RgbaImage::from_raw(self.width, self.height, self.to_rgba())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }
}
