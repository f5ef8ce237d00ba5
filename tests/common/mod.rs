//! Shared test infrastructure.
//!
//! Each test file compiles its own copy of this module, so items may appear
//! unused from the perspective of a single test file.

#![allow(dead_code)]

pub mod mock_engine;

use image::{Rgba, RgbaImage};
use quantize_bridge::QuantizedImage;

/// Routes `log` output through the test harness when `RUST_LOG` is set.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Diagonal gradient with a handful of translucent pixels.
pub fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let a = if (x + y) % 7 == 0 { 128 } else { 255 };
        Rgba([r, g, 96, a])
    })
}

/// Image made of `colors` vertical stripes, one color each.
pub fn stripes(width: u32, height: u32, colors: &[[u8; 4]]) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, _| Rgba(colors[x as usize % colors.len()]))
}

/// Asserts the invariants every successful result must satisfy.
pub fn assert_well_formed(result: &QuantizedImage, width: u32, height: u32) {
    assert_eq!(result.width(), width);
    assert_eq!(result.height(), height);
    assert_eq!(result.stride(), width as usize);
    assert_eq!(result.pixels().len(), (width * height) as usize);
    assert!(!result.palette().is_empty());
    assert!(result.palette().len() <= 256);
    let palette_len = result.palette().len();
    for &index in result.pixels() {
        assert!(
            (index as usize) < palette_len,
            "index {} out of range for palette of {}",
            index,
            palette_len
        );
    }
}
