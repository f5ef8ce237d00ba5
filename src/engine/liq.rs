use std::mem::MaybeUninit;

use image::Rgba;
use imagequant_sys::{liq_attr, liq_color, liq_image, liq_result};

use super::Engine;
use crate::buffer::BYTES_PER_PIXEL;
use crate::error::{status, Status};

/// libimagequant, driven through the C ABI exported by `imagequant-sys`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Libimagequant;

impl Engine for Libimagequant {
    type Attr = Box<liq_attr>;
    type Image<'px> = Box<liq_image<'px>>;
    type Output = Box<liq_result>;

    fn create_attr(&self) -> Option<Self::Attr> {
        imagequant_sys::liq_attr_create()
    }

    fn destroy_attr(&self, attr: Self::Attr) {
        imagequant_sys::liq_attr_destroy(Some(attr));
    }

    fn set_quality(&self, attr: &mut Self::Attr, min: u32, max: u32) -> Status {
        imagequant_sys::liq_set_quality(attr, min, max) as Status
    }

    fn set_speed(&self, attr: &mut Self::Attr, speed: i32) -> Status {
        imagequant_sys::liq_set_speed(attr, speed) as Status
    }

    fn create_image_flat<'px>(
        &self,
        attr: &Self::Attr,
        pixels: &'px [u8],
        width: u32,
        height: u32,
        gamma: f64,
    ) -> Result<Self::Image<'px>, Status> {
        // libimagequant probes the first byte before checking the size
        if width == 0 || height == 0 {
            return Err(status::BITMAP_NOT_AVAILABLE);
        }
        let required = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(BYTES_PER_PIXEL));
        if required.map_or(true, |required| pixels.len() < required) {
            return Err(status::BUFFER_TOO_SMALL);
        }
        // Safety: `pixels` covers width * height RGBA8 pixels for 'px
        unsafe { imagequant_sys::liq_image_create_rgba(attr, pixels.as_ptr().cast::<liq_color>(), width, height, gamma) }
            .ok_or(status::BITMAP_NOT_AVAILABLE)
    }

    unsafe fn create_image_rows<'px>(
        &self,
        attr: &Self::Attr,
        rows: &'px [*const u8],
        width: u32,
        height: u32,
        gamma: f64,
    ) -> Result<Self::Image<'px>, Status> {
        if width == 0 || height == 0 {
            return Err(status::BITMAP_NOT_AVAILABLE);
        }
        if rows.len() != height as usize {
            return Err(status::INVALID_POINTER);
        }
        imagequant_sys::liq_image_create_rgba_rows(attr, rows.as_ptr().cast::<*const liq_color>(), width, height, gamma)
            .ok_or(status::BITMAP_NOT_AVAILABLE)
    }

    fn destroy_image(&self, image: Self::Image<'_>) {
        imagequant_sys::liq_image_destroy(Some(image));
    }

    fn quantize(
        &self,
        image: &mut Self::Image<'_>,
        attr: &mut Self::Attr,
        out: &mut Option<Self::Output>,
    ) -> Status {
        let mut slot = MaybeUninit::uninit();
        let code = imagequant_sys::liq_image_quantize(image, attr, &mut slot) as Status;
        if code == status::OK {
            // Safety: the output slot is always written when quantization succeeds
            *out = unsafe { slot.assume_init() };
        }
        code
    }

    fn set_dithering_level(&self, result: &mut Self::Output, level: f32) -> Status {
        imagequant_sys::liq_set_dithering_level(result, level) as Status
    }

    fn write_remapped(&self, result: &mut Self::Output, image: &mut Self::Image<'_>, buffer: &mut [u8]) -> Status {
        if buffer.is_empty() {
            return status::BUFFER_TOO_SMALL;
        }
        // Safety: the engine writes at most buffer.len() bytes
        unsafe {
            imagequant_sys::liq_write_remapped_image(
                result,
                image,
                buffer.as_mut_ptr().cast::<MaybeUninit<u8>>(),
                buffer.len(),
            ) as Status
        }
    }

    fn copy_palette(&self, result: &mut Self::Output) -> Option<Vec<Rgba<u8>>> {
        let palette = imagequant_sys::liq_get_palette(result)?;
        let count = (palette.count as usize).min(palette.entries.len());
        Some(
            palette.entries[..count]
                .iter()
                .map(|c| Rgba([c.r, c.g, c.b, c.a]))
                .collect(),
        )
    }

    fn destroy_result(&self, result: Self::Output) {
        imagequant_sys::liq_result_destroy(Some(result));
    }
}
