//! Errors reported by a quantization call.
//!
//! Engine failures arrive as raw status codes and are translated by
//! [`map_status`]. The remaining kinds are raised on the host side before any
//! engine resource exists.

use std::ffi::c_int;

use thiserror::Error;

/// Raw engine status code.
pub type Status = c_int;

/// Engine status codes, as laid out in `libimagequant.h`.
pub mod status {
    use super::Status;

    /// Success.
    pub const OK: Status = 0;
    /// No palette satisfies the configured minimum quality.
    pub const QUALITY_TOO_LOW: Status = 99;
    /// A setter received a value outside its accepted range.
    pub const VALUE_OUT_OF_RANGE: Status = 100;
    /// Native allocation failed.
    pub const OUT_OF_MEMORY: Status = 101;
    /// Quantization was aborted.
    pub const ABORTED: Status = 102;
    /// The image handle could not be built.
    pub const BITMAP_NOT_AVAILABLE: Status = 103;
    /// Destination buffer is too small.
    pub const BUFFER_TOO_SMALL: Status = 104;
    /// A null or stale pointer was handed to the engine.
    pub const INVALID_POINTER: Status = 105;
    /// Operation not supported by this build of the engine.
    pub const UNSUPPORTED: Status = 106;
}

/// Everything that can go wrong during a quantization call.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QuantizeError {
    /// No image was supplied
    #[error("image is nil")]
    NilImage,
    /// The engine could not allocate its attribute handle
    #[error("libimagequant could not create an attribute handle")]
    ConfigError,
    /// Row stride is shorter than one row of pixels
    #[error("stride of {stride} bytes is too small for {width} RGBA pixels")]
    StrideTooSmall {
        /// Bytes per row as given
        stride: usize,
        /// Width in pixels
        width: u32,
    },
    /// A row reaches past the end of the backing allocation
    #[error("pixel data needs {required} bytes but only {len} are available")]
    BufferOutOfBounds {
        /// Bytes needed to reach the end of the last row
        required: usize,
        /// Length of the backing allocation
        len: usize,
    },
    /// A crop rectangle does not fit inside its parent view
    #[error("rectangle {width}x{height} at ({x}, {y}) is outside the image")]
    InvalidRect {
        /// Left edge
        x: u32,
        /// Top edge
        y: u32,
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// No palette meets the minimum quality
    #[error("libimagequant returned error: QUALITY_TOO_LOW")]
    QualityTooLow,
    /// The engine rejected a configuration value
    #[error("libimagequant returned error: VALUE_OUT_OF_RANGE")]
    ValueOutOfRange,
    /// Native allocation failed
    #[error("libimagequant returned error: OUT_OF_MEMORY")]
    OutOfMemory,
    /// The engine aborted quantization
    #[error("libimagequant returned error: ABORTED")]
    Aborted,
    /// The image handle could not be built from the buffer
    #[error("libimagequant returned error: BITMAP_NOT_AVAILABLE")]
    BitmapNotAvailable,
    /// The remap destination was too small
    #[error("libimagequant returned error: BUFFER_TOO_SMALL")]
    BufferTooSmall,
    /// A null or invalid pointer reached the engine
    #[error("libimagequant returned error: INVALID_POINTER")]
    InvalidPointer,
    /// A status code this crate does not know about
    #[error("libimagequant returned unknown error: {code}")]
    UnknownEngineError {
        /// The raw status code
        code: Status,
    },
}

/// Translates a non-OK engine status into an error.
///
/// `status::OK` is not an error and comes back as `UnknownEngineError { code: 0 }`;
/// use [`check_status`] when the code may be a success.
pub fn map_status(code: Status) -> QuantizeError {
    match code {
        status::QUALITY_TOO_LOW => QuantizeError::QualityTooLow,
        status::VALUE_OUT_OF_RANGE => QuantizeError::ValueOutOfRange,
        status::OUT_OF_MEMORY => QuantizeError::OutOfMemory,
        status::ABORTED => QuantizeError::Aborted,
        status::BITMAP_NOT_AVAILABLE => QuantizeError::BitmapNotAvailable,
        status::BUFFER_TOO_SMALL => QuantizeError::BufferTooSmall,
        status::INVALID_POINTER => QuantizeError::InvalidPointer,
        code => QuantizeError::UnknownEngineError { code },
    }
}

/// `Ok(())` for `status::OK`, the mapped error otherwise.
pub fn check_status(code: Status) -> Result<(), QuantizeError> {
    if code == status::OK {
        Ok(())
    } else {
        Err(map_status(code))
    }
}

impl QuantizeError {
    /// Whether the error was raised by the engine rather than by host-side checks.
    pub fn is_engine_error(&self) -> bool {
        !matches!(
            self,
            QuantizeError::NilImage
                | QuantizeError::StrideTooSmall { .. }
                | QuantizeError::BufferOutOfBounds { .. }
                | QuantizeError::InvalidRect { .. }
        )
    }
}
