//! The seam between this crate and a native quantization engine.
//!
//! [`Engine`] mirrors the engine's C API: opaque handles created and destroyed
//! in pairs, setters answering with a [`Status`], and two image constructors.
//! [`Libimagequant`] is the production implementation.

use image::Rgba;

use crate::error::Status;

mod liq;

pub use liq::Libimagequant;

/// C-style quantization API driven by a [`Session`](crate::Session).
///
/// Every handle returned by a `create_*` method (or by `quantize`) is passed
/// back to the matching `destroy_*` method exactly once.
pub trait Engine {
    /// Configuration handle
    type Attr;
    /// Image handle borrowing pixel memory for `'px`
    type Image<'px>;
    /// Quantization result handle
    type Output;

    /// Allocates a configuration handle with default settings
    fn create_attr(&self) -> Option<Self::Attr>;

    /// Releases a configuration handle
    fn destroy_attr(&self, attr: Self::Attr);

    /// Sets the minimum and target quality, 0-100
    fn set_quality(&self, attr: &mut Self::Attr, min: u32, max: u32) -> Status;

    /// Sets the speed/quality trade-off, 1-10
    fn set_speed(&self, attr: &mut Self::Attr, speed: i32) -> Status;

    /// Builds an image from packed RGBA rows, `width * height * 4` bytes long.
    fn create_image_flat<'px>(
        &self,
        attr: &Self::Attr,
        pixels: &'px [u8],
        width: u32,
        height: u32,
        gamma: f64,
    ) -> Result<Self::Image<'px>, Status>;

    /// Builds an image from one pointer per row.
    ///
    /// # Safety
    ///
    /// `rows` must hold `height` pointers, each valid for reads of `width * 4`
    /// bytes for as long as the returned image exists.
    unsafe fn create_image_rows<'px>(
        &self,
        attr: &Self::Attr,
        rows: &'px [*const u8],
        width: u32,
        height: u32,
        gamma: f64,
    ) -> Result<Self::Image<'px>, Status>;

    /// Releases an image handle
    fn destroy_image(&self, image: Self::Image<'_>);

    /// Generates a palette for `image`, storing the result handle in `out` on success
    fn quantize(
        &self,
        image: &mut Self::Image<'_>,
        attr: &mut Self::Attr,
        out: &mut Option<Self::Output>,
    ) -> Status;

    /// Sets error-diffusion strength for the next remap, 0.0-1.0
    fn set_dithering_level(&self, result: &mut Self::Output, level: f32) -> Status;

    /// Writes one palette index per pixel of `image` into `buffer`
    fn write_remapped(&self, result: &mut Self::Output, image: &mut Self::Image<'_>, buffer: &mut [u8]) -> Status;

    /// Copies the current palette out of the result handle
    fn copy_palette(&self, result: &mut Self::Output) -> Option<Vec<Rgba<u8>>>;

    /// Releases a result handle
    fn destroy_result(&self, result: Self::Output);
}
