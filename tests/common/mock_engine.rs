//! Instrumented stand-in for libimagequant.
//!
//! Counts live handles, records every call in order and can be told to fail
//! at a chosen step. Quantization is exact: every distinct color becomes one
//! palette entry, in first-seen order.

use std::cell::{Cell, RefCell};
use std::marker::PhantomData;

use image::Rgba;
use quantize_bridge::{status, Engine, Status};

/// Engine calls that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CreateAttr,
    SetQuality,
    SetSpeed,
    CreateImage,
    Quantize,
    SetDithering,
    WriteRemapped,
    CopyPalette,
}

#[derive(Debug)]
pub struct MockAttr {
    id: usize,
    min_quality: u32,
    max_quality: u32,
    speed: i32,
}

#[derive(Debug)]
pub struct MockImage<'px> {
    id: usize,
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
    _pixels: PhantomData<&'px [u8]>,
}

#[derive(Debug)]
pub struct MockResult {
    id: usize,
    palette: Vec<[u8; 4]>,
}

#[derive(Debug, Default)]
pub struct MockEngine {
    calls: RefCell<Vec<&'static str>>,
    next_id: Cell<usize>,
    live: RefCell<Vec<usize>>,
    failure: Cell<Option<(Step, Status)>>,
    last_dithering_level: Cell<Option<f32>>,
    last_gamma: Cell<Option<f64>>,
    last_image: RefCell<Vec<[u8; 4]>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `step` report `code` from now on
    pub fn fail_at(step: Step, code: Status) -> Self {
        let engine = Self::new();
        engine.failure.set(Some((step, code)));
        engine
    }

    /// Every engine call so far, in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    /// Handles created and not yet destroyed
    pub fn live_handles(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn last_dithering_level(&self) -> Option<f32> {
        self.last_dithering_level.get()
    }

    pub fn last_gamma(&self) -> Option<f64> {
        self.last_gamma.get()
    }

    /// Pixels the last image handle was built from, row-major
    pub fn last_image(&self) -> Vec<[u8; 4]> {
        self.last_image.borrow().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.borrow_mut().push(call);
    }

    fn injected(&self, step: Step) -> Option<Status> {
        match self.failure.get() {
            Some((failing, code)) if failing == step => Some(code),
            _ => None,
        }
    }

    fn acquire(&self) -> usize {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.live.borrow_mut().push(id);
        id
    }

    fn release(&self, id: usize) {
        let mut live = self.live.borrow_mut();
        let pos = live
            .iter()
            .position(|&live_id| live_id == id)
            .unwrap_or_else(|| panic!("handle {} released twice", id));
        live.remove(pos);
    }

    fn build_image<'px>(&self, width: u32, height: u32, gamma: f64, pixels: Vec<[u8; 4]>) -> MockImage<'px> {
        self.last_gamma.set(Some(gamma));
        *self.last_image.borrow_mut() = pixels.clone();
        MockImage {
            id: self.acquire(),
            width,
            height,
            pixels,
            _pixels: PhantomData,
        }
    }
}

fn to_pixels(bytes: &[u8]) -> impl Iterator<Item = [u8; 4]> + '_ {
    bytes.chunks_exact(4).map(|px| [px[0], px[1], px[2], px[3]])
}

impl Engine for MockEngine {
    type Attr = MockAttr;
    type Image<'px> = MockImage<'px>;
    type Output = MockResult;

    fn create_attr(&self) -> Option<MockAttr> {
        self.record("create_attr");
        if self.injected(Step::CreateAttr).is_some() {
            return None;
        }
        Some(MockAttr {
            id: self.acquire(),
            min_quality: 0,
            max_quality: 100,
            speed: 4,
        })
    }

    fn destroy_attr(&self, attr: MockAttr) {
        self.record("destroy_attr");
        self.release(attr.id);
    }

    fn set_quality(&self, attr: &mut MockAttr, min: u32, max: u32) -> Status {
        self.record("set_quality");
        if let Some(code) = self.injected(Step::SetQuality) {
            return code;
        }
        if max > 100 || min > max {
            return status::VALUE_OUT_OF_RANGE;
        }
        attr.min_quality = min;
        attr.max_quality = max;
        status::OK
    }

    fn set_speed(&self, attr: &mut MockAttr, speed: i32) -> Status {
        self.record("set_speed");
        if let Some(code) = self.injected(Step::SetSpeed) {
            return code;
        }
        if !(1..=10).contains(&speed) {
            return status::VALUE_OUT_OF_RANGE;
        }
        attr.speed = speed;
        status::OK
    }

    fn create_image_flat<'px>(
        &self,
        _attr: &MockAttr,
        pixels: &'px [u8],
        width: u32,
        height: u32,
        gamma: f64,
    ) -> Result<MockImage<'px>, Status> {
        self.record("create_image_flat");
        if let Some(code) = self.injected(Step::CreateImage) {
            return Err(code);
        }
        if width == 0 || height == 0 {
            return Err(status::BITMAP_NOT_AVAILABLE);
        }
        let len = width as usize * height as usize * 4;
        if pixels.len() < len {
            return Err(status::BUFFER_TOO_SMALL);
        }
        Ok(self.build_image(width, height, gamma, to_pixels(&pixels[..len]).collect()))
    }

    unsafe fn create_image_rows<'px>(
        &self,
        _attr: &MockAttr,
        rows: &'px [*const u8],
        width: u32,
        height: u32,
        gamma: f64,
    ) -> Result<MockImage<'px>, Status> {
        self.record("create_image_rows");
        if let Some(code) = self.injected(Step::CreateImage) {
            return Err(code);
        }
        if width == 0 || height == 0 {
            return Err(status::BITMAP_NOT_AVAILABLE);
        }
        assert_eq!(rows.len(), height as usize);
        let row_bytes = width as usize * 4;
        let pixels = rows
            .iter()
            .flat_map(|&row| to_pixels(std::slice::from_raw_parts(row, row_bytes)))
            .collect();
        Ok(self.build_image(width, height, gamma, pixels))
    }

    fn destroy_image(&self, image: MockImage<'_>) {
        self.record("destroy_image");
        self.release(image.id);
    }

    fn quantize(&self, image: &mut MockImage<'_>, attr: &mut MockAttr, out: &mut Option<MockResult>) -> Status {
        self.record("quantize");
        if let Some(code) = self.injected(Step::Quantize) {
            return code;
        }
        let mut palette: Vec<[u8; 4]> = Vec::new();
        for px in &image.pixels {
            if !palette.contains(px) {
                palette.push(*px);
            }
        }
        if palette.len() > 256 {
            if attr.min_quality > 0 {
                return status::QUALITY_TOO_LOW;
            }
            palette.truncate(256);
        }
        *out = Some(MockResult {
            id: self.acquire(),
            palette,
        });
        status::OK
    }

    fn set_dithering_level(&self, _result: &mut MockResult, level: f32) -> Status {
        self.record("set_dithering_level");
        if let Some(code) = self.injected(Step::SetDithering) {
            return code;
        }
        if !(0.0..=1.0).contains(&level) {
            return status::VALUE_OUT_OF_RANGE;
        }
        self.last_dithering_level.set(Some(level));
        status::OK
    }

    fn write_remapped(&self, result: &mut MockResult, image: &mut MockImage<'_>, buffer: &mut [u8]) -> Status {
        self.record("write_remapped");
        if let Some(code) = self.injected(Step::WriteRemapped) {
            return code;
        }
        if buffer.len() < image.width as usize * image.height as usize {
            return status::BUFFER_TOO_SMALL;
        }
        for (slot, px) in buffer.iter_mut().zip(&image.pixels) {
            let index = result.palette.iter().position(|c| c == px).unwrap_or(0);
            *slot = index as u8;
        }
        status::OK
    }

    fn copy_palette(&self, result: &mut MockResult) -> Option<Vec<Rgba<u8>>> {
        self.record("copy_palette");
        if self.injected(Step::CopyPalette).is_some() {
            return None;
        }
        Some(result.palette.iter().map(|&c| Rgba(c)).collect())
    }

    fn destroy_result(&self, result: MockResult) {
        self.record("destroy_result");
        self.release(result.id);
    }
}
