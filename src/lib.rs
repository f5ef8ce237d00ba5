//! Quantize images to 256 colors with libimagequant, without copying pixels that
//! are already in the engine's layout.
//!
//! Pixels in non-premultiplied RGBA8 are lent to the engine directly, cropped
//! views included: a view whose rows are not packed back to back is described
//! to the engine with one pointer per row instead of being copied. Anything
//! else is converted once into a packed buffer.
//!
//! ```no_run
//! use image::RgbaImage;
//! use quantize_bridge::{quantize, QuantizationOptions};
//!
//! let img = RgbaImage::from_fn(64, 64, |x, y| image::Rgba([x as u8 * 4, y as u8 * 4, 128, 255]));
//! let paletted = quantize(Some(&img), Some(&QuantizationOptions::new().dithering_level(1.0)))?;
//! println!("{}", paletted.palette());
//! # Ok::<(), quantize_bridge::QuantizeError>(())
//! ```

#![deny(missing_docs)]

pub use adapter::{adapt, unpremultiply, AdaptedBuffer, ImageView, PremultipliedRgba, RgbaSource};
pub use buffer::{PixelBuffer, BYTES_PER_PIXEL};
pub use engine::{Engine, Libimagequant};
pub use error::{check_status, map_status, status, QuantizeError, Status};
pub use options::QuantizationOptions;
pub use palette::Palette;
pub use quantized::QuantizedImage;
pub use session::Session;

mod adapter;
mod buffer;
pub mod engine;
mod error;
mod options;
mod palette;
mod quantized;
mod session;

/// Quantizes any RGBA source with libimagequant.
///
/// `None` for `image` fails with [`QuantizeError::NilImage`] before the engine
/// is touched. `None` for `options` uses [`QuantizationOptions::default`].
pub fn quantize<S: RgbaSource + ?Sized>(
    image: Option<&S>,
    options: Option<&QuantizationOptions>,
) -> Result<QuantizedImage, QuantizeError> {
    quantize_with(&Libimagequant, image, options)
}

/// Quantizes pixels already in engine layout, skipping normalization.
pub fn quantize_from_native_buffer(
    buffer: &PixelBuffer<'_>,
    options: Option<&QuantizationOptions>,
) -> Result<QuantizedImage, QuantizeError> {
    Session::new(&Libimagequant).run(buffer, &options.copied().unwrap_or_default())
}

/// Like [`quantize`], against any [`Engine`].
pub fn quantize_with<E: Engine, S: RgbaSource + ?Sized>(
    engine: &E,
    image: Option<&S>,
    options: Option<&QuantizationOptions>,
) -> Result<QuantizedImage, QuantizeError> {
    let image = image.ok_or(QuantizeError::NilImage)?;
    let options = options.copied().unwrap_or_default();
    let adapted = adapt(image);
    Session::new(engine).run(&adapted.view(), &options)
}
