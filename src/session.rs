//! One quantization call against an [`Engine`].
//!
//! The protocol is linear: configure, build the image, quantize, dither,
//! remap, copy the palette, tear down. Each engine handle lives in a
//! [`Scoped`] guard, so an early return releases exactly the handles created
//! so far, newest first.

use std::ops::{Deref, DerefMut};

use log::{debug, trace};

use crate::buffer::PixelBuffer;
use crate::engine::Engine;
use crate::error::{check_status, map_status};
use crate::options::QuantizationOptions;
use crate::palette::Palette;
use crate::quantized::QuantizedImage;
use crate::QuantizeError;

/// Owns one engine handle and releases it on drop.
struct Scoped<'e, E, T> {
    engine: &'e E,
    // taken only by drop
    handle: Option<T>,
    release: fn(&E, T),
    kind: &'static str,
}

impl<'e, E, T> Scoped<'e, E, T> {
    fn new(engine: &'e E, handle: T, release: fn(&E, T), kind: &'static str) -> Self {
        trace!("created {} handle", kind);
        Self {
            engine,
            handle: Some(handle),
            release,
            kind,
        }
    }
}

impl<E, T> Deref for Scoped<'_, E, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.handle.as_ref().expect("handle is held until drop")
    }
}

impl<E, T> DerefMut for Scoped<'_, E, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.handle.as_mut().expect("handle is held until drop")
    }
}

impl<E, T> Drop for Scoped<'_, E, T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            trace!("releasing {} handle", self.kind);
            (self.release)(self.engine, handle);
        }
    }
}

/// Pointers to the first visible byte of every row.
///
/// Each row is sliced out of the allocation before its pointer is taken, so a
/// row reaching past the end fails here instead of inside the engine.
fn row_pointers(buffer: &PixelBuffer<'_>) -> Result<Vec<*const u8>, QuantizeError> {
    let data = buffer.data();
    let row_bytes = buffer.row_bytes();
    buffer
        .row_offsets()
        .into_iter()
        .map(|offset| {
            let end = offset.saturating_add(row_bytes);
            data.get(offset..end)
                .map(<[u8]>::as_ptr)
                .ok_or(QuantizeError::BufferOutOfBounds {
                    required: end,
                    len: data.len(),
                })
        })
        .collect()
}

/// Single-use driver for one quantization call.
///
/// ```no_run
/// use quantize_bridge::{Libimagequant, PixelBuffer, QuantizationOptions, Session};
///
/// let pixels = vec![255u8; 16 * 16 * 4];
/// let buffer = PixelBuffer::new(&pixels, 16, 16)?;
/// let image = Session::new(&Libimagequant).run(&buffer, &QuantizationOptions::default())?;
/// assert_eq!(image.pixels().len(), 256);
/// # Ok::<(), quantize_bridge::QuantizeError>(())
/// ```
#[derive(Debug)]
pub struct Session<'e, E> {
    engine: &'e E,
}

impl<'e, E: Engine> Session<'e, E> {
    /// Prepares a call against `engine`
    pub fn new(engine: &'e E) -> Self {
        Self { engine }
    }

    /// Quantizes `buffer` and consumes the session.
    ///
    /// The pixels stay borrowed, and so cannot move or change, until this returns.
    pub fn run(self, buffer: &PixelBuffer<'_>, options: &QuantizationOptions) -> Result<QuantizedImage, QuantizeError> {
        let engine = self.engine;
        buffer.check_layout()?;
        let (width, height) = (buffer.width(), buffer.height());
        debug!(
            "quantizing {}x{} image ({} path), quality {}-{}, speed {}",
            width,
            height,
            if buffer.is_contiguous() { "flat" } else { "row" },
            options.min_quality,
            options.max_quality,
            options.speed
        );

        let mut attr = Scoped::new(engine, engine.create_attr().ok_or(QuantizeError::ConfigError)?, E::destroy_attr, "attr");
        check_status(engine.set_quality(&mut attr, options.min_quality, options.max_quality))
            .map_err(|err| rejected("quality", err))?;
        check_status(engine.set_speed(&mut attr, options.speed)).map_err(|err| rejected("speed", err))?;

        // must outlive the image handle, which borrows it
        let row_table: Vec<*const u8>;
        let created = match buffer.contiguous_pixels() {
            Some(pixels) => engine.create_image_flat(&attr, pixels, width, height, options.gamma),
            None => {
                row_table = row_pointers(buffer)?;
                trace!("built row table with {} entries", row_table.len());
                // Safety: every pointer addresses a full row inside `buffer`,
                // which stays borrowed until the image handle is gone
                unsafe { engine.create_image_rows(&attr, &row_table, width, height, options.gamma) }
            }
        };
        let mut image = Scoped::new(
            engine,
            created.map_err(|code| rejected("image", map_status(code)))?,
            E::destroy_image,
            "image",
        );

        let mut out = None;
        check_status(engine.quantize(&mut image, &mut attr, &mut out)).map_err(|err| rejected("quantize", err))?;
        let mut result = Scoped::new(engine, out.ok_or(QuantizeError::InvalidPointer)?, E::destroy_result, "result");

        check_status(engine.set_dithering_level(&mut result, options.dithering_level))
            .map_err(|err| rejected("dithering level", err))?;

        let mut indices = vec![0u8; width as usize * height as usize];
        check_status(engine.write_remapped(&mut result, &mut image, &mut indices)).map_err(|err| rejected("remap", err))?;

        // the engine's palette dies with the result handle
        let palette = engine.copy_palette(&mut result).ok_or(QuantizeError::InvalidPointer)?;
        trace!("copied {} palette entries", palette.len());

        drop(result);
        drop(image);
        drop(attr);

        Ok(QuantizedImage::new(width, height, indices, Palette::new(palette)))
    }
}

fn rejected(step: &str, err: QuantizeError) -> QuantizeError {
    debug!("engine rejected {}: {}", step, err);
    err
}
