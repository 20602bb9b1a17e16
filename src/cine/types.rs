//! Decoded-frame buffer and decode configuration.

/// Channel layout of a decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// One intensity sample per pixel.
    Gray,
    /// Interleaved R, G, B samples.
    Rgb,
}

impl PixelFormat {
    pub fn channels(&self) -> u32 {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
        }
    }
}

/// A single decoded frame: a flat `u16` buffer of exactly
/// `width * height * channels` samples, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u16>,
}

impl PixelBuffer {
    pub(crate) fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u16>) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * format.channels() as usize
        );
        Self {
            width,
            height,
            format,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn channels(&self) -> u32 {
        self.format.channels()
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u16> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Per-handle decode options.
#[derive(Debug, Clone)]
pub struct DecodeConfig {
    /// Decoded-frame cache capacity. `None` disables caching; with
    /// `Some(n)` the handle keeps up to `n` frames keyed by frame
    /// number and evicts the oldest insertion first. Hits return a
    /// clone of the cached buffer.
    pub frame_cache_capacity: Option<usize>,
    /// Whether to check header dimensions against `max_dimension`.
    pub validate_dimensions: bool,
    /// Largest width or height accepted at open, when set.
    pub max_dimension: Option<u32>,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            frame_cache_capacity: None,
            validate_dimensions: true,
            max_dimension: None,
        }
    }
}

impl DecodeConfig {
    pub fn builder() -> DecodeConfigBuilder {
        DecodeConfigBuilder::default()
    }
}

/// Builder for [`DecodeConfig`].
#[derive(Default)]
pub struct DecodeConfigBuilder {
    frame_cache_capacity: Option<Option<usize>>,
    validate_dimensions: Option<bool>,
    max_dimension: Option<Option<u32>>,
}

impl DecodeConfigBuilder {
    pub fn frame_cache_capacity(mut self, capacity: Option<usize>) -> Self {
        self.frame_cache_capacity = Some(capacity);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn max_dimension(mut self, max: Option<u32>) -> Self {
        self.max_dimension = Some(max);
        self
    }

    pub fn build(self) -> DecodeConfig {
        let default = DecodeConfig::default();
        DecodeConfig {
            frame_cache_capacity: self
                .frame_cache_capacity
                .unwrap_or(default.frame_cache_capacity),
            validate_dimensions: self
                .validate_dimensions
                .unwrap_or(default.validate_dimensions),
            max_dimension: self.max_dimension.unwrap_or(default.max_dimension),
        }
    }
}
