//! Normalizes host images into the engine's pixel layout.
//!
//! Sources already holding non-premultiplied RGBA8 are lent to the engine as
//! they are. Everything else is converted pixel by pixel into a fresh,
//! tightly packed buffer.

use std::borrow::Cow;
use std::ops::Deref;

use image::{DynamicImage, GenericImageView, ImageBuffer, Pixel, Rgba};
use itertools::iproduct;

use crate::buffer::{Layout, PixelBuffer, BYTES_PER_PIXEL};

/// Anything that can describe itself as a grid of RGBA8 pixels.
pub trait RgbaSource {
    /// Width and height in pixels
    fn dimensions(&self) -> (u32, u32);

    /// Non-premultiplied RGBA value of one pixel
    fn rgba_at(&self, x: u32, y: u32) -> Rgba<u8>;

    /// A view of the pixels in engine layout, if the source already stores them that way
    fn native_buffer(&self) -> Option<PixelBuffer<'_>> {
        None
    }
}

/// Output of [`adapt`]: pixels in engine layout, borrowed or freshly converted.
#[derive(Debug, Clone)]
pub struct AdaptedBuffer<'a> {
    pixels: Cow<'a, [u8]>,
    layout: Layout,
}

impl AdaptedBuffer<'_> {
    /// View handed to the engine
    pub fn view(&self) -> PixelBuffer<'_> {
        self.layout.view(&self.pixels)
    }

    /// Whether the source pixels were used without copying
    pub fn is_borrowed(&self) -> bool {
        matches!(self.pixels, Cow::Borrowed(_))
    }
}

/// Brings `source` into engine layout, copying only when it has to.
pub fn adapt<S: RgbaSource + ?Sized>(source: &S) -> AdaptedBuffer<'_> {
    if let Some(view) = source.native_buffer() {
        return AdaptedBuffer {
            pixels: Cow::Borrowed(view.data()),
            layout: view.layout(),
        };
    }

    let (width, height) = source.dimensions();
    log::trace!("converting {}x{} image to RGBA8", width, height);
    let mut pixels = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
    for (y, x) in iproduct!(0..height, 0..width) {
        pixels.extend_from_slice(&source.rgba_at(x, y).0);
    }
    AdaptedBuffer {
        pixels: Cow::Owned(pixels),
        layout: Layout::packed(width, height),
    }
}

impl RgbaSource for PixelBuffer<'_> {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn rgba_at(&self, x: u32, y: u32) -> Rgba<u8> {
        self.get_pixel(x, y)
    }

    fn native_buffer(&self) -> Option<PixelBuffer<'_>> {
        Some(*self)
    }
}

impl<P, C> RgbaSource for ImageBuffer<P, C>
where
    P: Pixel<Subpixel = u8>,
    C: Deref<Target = [u8]>,
{
    fn dimensions(&self) -> (u32, u32) {
        ImageBuffer::dimensions(self)
    }

    fn rgba_at(&self, x: u32, y: u32) -> Rgba<u8> {
        self.get_pixel(x, y).to_rgba()
    }

    fn native_buffer(&self) -> Option<PixelBuffer<'_>> {
        if P::CHANNEL_COUNT as usize != BYTES_PER_PIXEL || P::COLOR_MODEL != "RGBA" {
            return None;
        }
        let (width, height) = ImageBuffer::dimensions(self);
        PixelBuffer::new(self.as_raw(), width, height).ok()
    }
}

impl RgbaSource for DynamicImage {
    fn dimensions(&self) -> (u32, u32) {
        GenericImageView::dimensions(self)
    }

    fn rgba_at(&self, x: u32, y: u32) -> Rgba<u8> {
        GenericImageView::get_pixel(self, x, y)
    }

    fn native_buffer(&self) -> Option<PixelBuffer<'_>> {
        self.as_rgba8().and_then(|rgba| rgba.native_buffer())
    }
}

/// Lends any [`GenericImageView`] with 8-bit channels.
///
/// Views are always converted, since their pixels are not reachable as bytes.
/// A `SubImage` reaches the trait through `Deref`, so wrap `&*sub`.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a, I: ?Sized>(pub &'a I);

impl<I, P> RgbaSource for ImageView<'_, I>
where
    I: GenericImageView<Pixel = P> + ?Sized,
    P: Pixel<Subpixel = u8>,
{
    fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    fn rgba_at(&self, x: u32, y: u32) -> Rgba<u8> {
        self.0.get_pixel(x, y).to_rgba()
    }
}

/// Packed RGBA8 with color channels premultiplied by alpha.
#[derive(Debug, Clone, Copy)]
pub struct PremultipliedRgba<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> PremultipliedRgba<'a> {
    /// Wraps `data`, which must hold at least `width * height * 4` bytes.
    pub fn new(data: &'a [u8], width: u32, height: u32) -> Result<Self, crate::QuantizeError> {
        PixelBuffer::new(data, width, height)?;
        Ok(Self { data, width, height })
    }
}

impl RgbaSource for PremultipliedRgba<'_> {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn rgba_at(&self, x: u32, y: u32) -> Rgba<u8> {
        let start = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = &self.data[start..start + BYTES_PER_PIXEL];
        unpremultiply([px[0], px[1], px[2], px[3]])
    }
}

/// Divides color channels by alpha, rounding to nearest.
pub fn unpremultiply([r, g, b, a]: [u8; 4]) -> Rgba<u8> {
    match a {
        0 => Rgba([0, 0, 0, 0]),
        255 => Rgba([r, g, b, a]),
        _ => {
            let a32 = u32::from(a);
            let channel = |c: u8| ((u32::from(c) * 255 + a32 / 2) / a32).min(255) as u8;
            Rgba([channel(r), channel(g), channel(b), a])
        }
    }
}
