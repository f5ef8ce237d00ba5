use image::{Rgba, RgbaImage};

use crate::palette::Palette;

/// Paletted image produced by a successful quantization.
///
/// One index byte per pixel, rows packed back to back (`stride == width`),
/// origin at (0, 0).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    palette: Palette,
}

impl QuantizedImage {
    pub(crate) fn new(width: u32, height: u32, pixels: Vec<u8>, palette: Palette) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        debug_assert!(pixels.iter().all(|&i| usize::from(i) < palette.len()));
        Self {
            width,
            height,
            pixels,
            palette,
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row of indices, always equal to the width
    pub fn stride(&self) -> usize {
        self.width as usize
    }

    /// Palette indices, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Colors referenced by [`pixels`](Self::pixels)
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Palette index of pixel `(x, y)`
    pub fn index_at(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y as usize * self.stride() + x as usize).copied()
    }

    /// Color of pixel `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.index_at(x, y).and_then(|index| self.palette.get(index))
    }

    /// Expands the indices back to RGBA
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            self.pixel(x, y).unwrap_or(Rgba([0, 0, 0, 0]))
        })
    }

    /// Splits into indices and palette
    pub fn into_parts(self) -> (Vec<u8>, Palette) {
        (self.pixels, self.palette)
    }
}
