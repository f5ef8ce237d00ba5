/// Settings forwarded to the engine for one quantization call.
///
/// Values are not checked here. The engine validates them and out-of-range
/// settings surface as [`QuantizeError::ValueOutOfRange`](crate::QuantizeError::ValueOutOfRange).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct QuantizationOptions {
    /// Lowest acceptable quality, 0-100. Quantization fails if it can't be met.
    pub min_quality: u32,
    /// Target quality, 0-100. The engine may stop once it is reached.
    pub max_quality: u32,
    /// 1-10. Higher is faster and lower quality.
    pub speed: i32,
    /// Error-diffusion strength used when remapping, 0.0-1.0. Zero disables dithering.
    pub dithering_level: f32,
    /// Input gamma. Zero selects the engine default (sRGB, about 0.45455).
    pub gamma: f64,
}

impl Default for QuantizationOptions {
    fn default() -> Self {
        Self {
            min_quality: 0,
            max_quality: 100,
            speed: 4,
            dithering_level: 0.0,
            gamma: 0.0,
        }
    }
}

impl QuantizationOptions {
    /// Same as `QuantizationOptions::default()`
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets both quality bounds
    pub fn quality(mut self, min: u32, max: u32) -> Self {
        self.min_quality = min;
        self.max_quality = max;
        self
    }

    /// Sets the speed/quality trade-off
    pub fn speed(mut self, speed: i32) -> Self {
        self.speed = speed;
        self
    }

    /// Sets the dithering strength
    pub fn dithering_level(mut self, level: f32) -> Self {
        self.dithering_level = level;
        self
    }

    /// Sets the input gamma
    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }
}
