//! Canonical raw pixel buffers produced by the decode engine

use std::time::SystemTime;

use half::f16;

/// Channel layout and bit width actually stored in a [`RawImage`]'s data.
///
/// Every decoder normalizes into this closed set; nothing else ever reaches
/// the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Single 8-bit gray channel.
    Gray8,
    /// 8 bits per channel, blue first.
    Bgra8,
    /// 16 bits per channel, little-endian.
    Rgba16,
    /// 16-bit half floats per channel, little-endian.
    Rgba16F,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Bgra8 => 4,
            PixelFormat::Rgba16 => 8,
            PixelFormat::Rgba16F => 8,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PixelFormat::Gray8 => "gray8",
            PixelFormat::Bgra8 => "bgra8",
            PixelFormat::Rgba16 => "rgba16",
            PixelFormat::Rgba16F => "rgba16f",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GammaSpace {
    Linear,
    Srgb,
}

/// Guides downstream compression choice; never affects the stored pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionHint {
    #[default]
    Default,
    Grayscale,
    Hdr,
}

/// Canonical decode artifact: a complete, size-consistent pixel buffer with
/// explicit color-space and bit-depth metadata.
///
/// The buffer exclusively owns its pixels and its length always equals
/// `width * height * bytes_per_pixel(format)`; partial buffers are never
/// surfaced as success.
#[derive(Debug, Clone)]
pub struct RawImage {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
    is_srgb: bool,
    compression: CompressionHint,
    source_modification_time: Option<SystemTime>,
}

impl RawImage {
    /// Panics if `data` is not exactly `width * height * bytes_per_pixel`.
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            width as usize * height as usize * format.bytes_per_pixel(),
            "pixel buffer length does not match {}x{} {}",
            width,
            height,
            format.as_str()
        );

        Self {
            width,
            height,
            format,
            data,
            is_srgb: true,
            compression: CompressionHint::Default,
            source_modification_time: None,
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

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn is_srgb(&self) -> bool {
        self.is_srgb
    }

    /// Gamma space is derived from the sRGB flag, never set independently.
    pub fn gamma_space(&self) -> GammaSpace {
        if self.is_srgb {
            GammaSpace::Srgb
        } else {
            GammaSpace::Linear
        }
    }

    pub fn compression(&self) -> CompressionHint {
        self.compression
    }

    pub fn modification_time(&self) -> Option<SystemTime> {
        self.source_modification_time
    }

    pub(crate) fn set_srgb(&mut self, is_srgb: bool) {
        self.is_srgb = is_srgb;
    }

    pub(crate) fn set_compression(&mut self, hint: CompressionHint) {
        self.compression = hint;
    }

    pub(crate) fn set_modification_time(&mut self, time: SystemTime) {
        self.source_modification_time = Some(time);
    }

    /// Swaps the pixel payload, keeping color-space metadata.
    ///
    /// Panics on a size-inconsistent buffer, same as [`RawImage::new`].
    pub(crate) fn replace_pixels(&mut self, width: u32, height: u32, data: Vec<u8>) {
        assert_eq!(
            data.len(),
            width as usize * height as usize * self.format.bytes_per_pixel(),
        );
        self.width = width;
        self.height = height;
        self.data = data;
    }

    /// Flattens the buffer into tightly packed RGBA8 for the pixels-only
    /// path, regardless of the canonical format.
    pub fn to_rgba8_pixels(&self) -> Vec<u8> {
        let mut pixels = Vec::with_capacity(self.width as usize * self.height as usize * 4);

        match self.format {
            PixelFormat::Gray8 => {
                for &g in &self.data {
                    pixels.extend_from_slice(&[g, g, g, u8::MAX]);
                }
            }
            PixelFormat::Bgra8 => {
                for px in self.data.chunks_exact(4) {
                    pixels.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
                }
            }
            PixelFormat::Rgba16 => {
                for ch in self.data.chunks_exact(2) {
                    let v = u16::from_le_bytes([ch[0], ch[1]]);
                    pixels.push((v >> 8) as u8);
                }
            }
            PixelFormat::Rgba16F => {
                for ch in self.data.chunks_exact(2) {
                    let v = f16::from_le_bytes([ch[0], ch[1]]).to_f32();
                    pixels.push((v.clamp(0.0, 1.0) * 255.0).round() as u8);
                }
            }
        }

        pixels
    }
}
