use image::Rgba;

use crate::QuantizeError;

/// Bytes per pixel in the engine's layout (non-premultiplied RGBA).
pub const BYTES_PER_PIXEL: usize = 4;

/// Borrowed view of RGBA pixels in the engine's layout.
///
/// Rows are `stride` bytes apart and the first pixel sits `origin` bytes into
/// `data`. The view never owns the pixels; the borrow keeps them pinned for as
/// long as the view, and any engine handle built from it, is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBuffer<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
    origin: usize,
}

/// Geometry of a view whose layout has already been checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    width: u32,
    height: u32,
    stride: usize,
    origin: usize,
}

impl Layout {
    /// Rows packed back to back from byte zero
    pub(crate) fn packed(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            stride: width as usize * BYTES_PER_PIXEL,
            origin: 0,
        }
    }

    /// Rebuilds the view over `data`, which must hold at least the bytes the
    /// layout was checked against.
    pub(crate) fn view(self, data: &[u8]) -> PixelBuffer<'_> {
        let buffer = PixelBuffer {
            data,
            width: self.width,
            height: self.height,
            stride: self.stride,
            origin: self.origin,
        };
        debug_assert_eq!(buffer.check_layout(), Ok(()));
        buffer
    }
}

impl<'a> PixelBuffer<'a> {
    /// Tightly packed pixels starting at the first byte of `data`.
    pub fn new(data: &'a [u8], width: u32, height: u32) -> Result<Self, QuantizeError> {
        Self::with_layout(data, width, height, width as usize * BYTES_PER_PIXEL, 0)
    }

    /// Pixels with an explicit row stride and origin, both in bytes.
    ///
    /// Fails if `stride < width * 4` or if the last row would run past the
    /// end of `data`.
    pub fn with_layout(
        data: &'a [u8],
        width: u32,
        height: u32,
        stride: usize,
        origin: usize,
    ) -> Result<Self, QuantizeError> {
        let buffer = Self {
            data,
            width,
            height,
            stride,
            origin,
        };
        buffer.check_layout()?;
        Ok(buffer)
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes between the starts of consecutive rows
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Byte offset of pixel (0, 0) within the backing allocation
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// The whole backing allocation, including bytes outside the view
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Bytes in one row of visible pixels
    pub fn row_bytes(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// Whether the rows are packed back to back from the start of the allocation.
    ///
    /// Only such buffers can be handed to the engine as a single flat pointer.
    pub fn is_contiguous(&self) -> bool {
        self.origin == 0 && self.stride == self.row_bytes()
    }

    pub(crate) fn layout(&self) -> Layout {
        Layout {
            width: self.width,
            height: self.height,
            stride: self.stride,
            origin: self.origin,
        }
    }

    /// Whether the view covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Restricts the view to a rectangle without copying.
    pub fn sub_rect(&self, x: u32, y: u32, width: u32, height: u32) -> Result<PixelBuffer<'a>, QuantizeError> {
        let fits_x = x.checked_add(width).map_or(false, |right| right <= self.width);
        let fits_y = y.checked_add(height).map_or(false, |bottom| bottom <= self.height);
        if !fits_x || !fits_y {
            return Err(QuantizeError::InvalidRect { x, y, width, height });
        }
        let origin = self.origin + y as usize * self.stride + x as usize * BYTES_PER_PIXEL;
        PixelBuffer::with_layout(self.data, width, height, self.stride, origin)
    }

    /// The visible pixels as one slice, when the buffer is contiguous.
    pub fn contiguous_pixels(&self) -> Option<&'a [u8]> {
        if !self.is_contiguous() {
            return None;
        }
        self.data.get(..self.row_bytes() * self.height as usize)
    }

    /// Start of each row, in bytes from the start of the allocation.
    pub fn row_offsets(&self) -> Vec<usize> {
        (0..self.height as usize)
            .map(|y| self.origin + y * self.stride)
            .collect()
    }

    /// Visible bytes of row `y`.
    pub fn row(&self, y: u32) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = self.origin + y as usize * self.stride;
        self.data.get(start..start + self.row_bytes())
    }

    /// Reads one pixel.
    ///
    /// # Panics
    ///
    /// If `(x, y)` lies outside the view.
    pub fn get_pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        assert!(x < self.width && y < self.height, "pixel ({}, {}) out of bounds", x, y);
        let start = self.origin + y as usize * self.stride + x as usize * BYTES_PER_PIXEL;
        let px = &self.data[start..start + BYTES_PER_PIXEL];
        Rgba([px[0], px[1], px[2], px[3]])
    }

    /// Verifies that every row lies inside the backing allocation.
    pub fn check_layout(&self) -> Result<(), QuantizeError> {
        let row_bytes = self.row_bytes();
        if self.stride < row_bytes {
            return Err(QuantizeError::StrideTooSmall {
                stride: self.stride,
                width: self.width,
            });
        }
        if self.is_empty() {
            return Ok(());
        }
        let required = (self.height as usize - 1)
            .checked_mul(self.stride)
            .and_then(|n| n.checked_add(self.origin))
            .and_then(|n| n.checked_add(row_bytes))
            .unwrap_or(usize::MAX);
        if required > self.data.len() {
            return Err(QuantizeError::BufferOutOfBounds {
                required,
                len: self.data.len(),
            });
        }
        Ok(())
    }
}
