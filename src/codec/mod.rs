//! Format dispatch: sniff a buffer, pick a codec, decode

mod bmp;
mod exr;
mod jpeg;
mod png;
mod tga;
mod tiff;

pub use bmp::BmpCodec;
pub use exr::ExrCodec;
pub use jpeg::JpegCodec;
pub use png::PngCodec;
pub use tga::TgaCodec;
pub use tiff::TiffCodec;

use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::raw_image::RawImage;

/// A decoder for one specific encoded image format.
///
/// Sniffing is based on magic bytes or structural header fields, never on a
/// filename, because input may be an in-memory buffer with no name.
pub trait Codec: Send + Sync {
    fn name(&self) -> &'static str;

    /// Cheap header check deciding whether this codec claims the buffer.
    fn sniff(&self, bytes: &[u8]) -> bool;

    /// Header-parsed dimensions, read before any pixel copy so the registry
    /// can enforce the resolution policy up front.
    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), ImportError>;

    fn decode(&self, bytes: &[u8]) -> Result<RawImage, ImportError>;

    fn allows_non_power_of_two(&self) -> bool {
        true
    }
}

/// Tries codecs in fixed priority order; the first whose sniff succeeds wins.
pub struct CodecRegistry {
    codecs: Vec<Box<dyn Codec>>,
    config: ImportConfig,
}

impl CodecRegistry {
    pub fn new(config: ImportConfig) -> Self {
        // Priority order: PNG, JPEG, BMP, TGA, EXR, TIFF. TGA sniffs on
        // structural header fields and must come after the magic-byte
        // formats.
        let codecs: Vec<Box<dyn Codec>> = vec![
            Box::new(PngCodec),
            Box::new(JpegCodec),
            Box::new(BmpCodec),
            Box::new(TgaCodec),
            Box::new(ExrCodec),
            Box::new(TiffCodec),
        ];

        Self { codecs, config }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<RawImage, ImportError> {
        for codec in &self.codecs {
            if !codec.sniff(bytes) {
                continue;
            }

            let (width, height) = codec.dimensions(bytes)?;
            if !self
                .config
                .is_resolution_valid(width, height, codec.allows_non_power_of_two())
            {
                return Err(ImportError::ResolutionRejected { width, height });
            }

            log::debug!("decoding {}x{} buffer as {}", width, height, codec.name());
            return codec.decode(bytes);
        }

        Err(ImportError::UnsupportedFormat)
    }
}

/// In-place RGBA -> BGRA channel swap shared by the 8-bit color codecs.
pub(crate) fn rgba8_into_bgra8(mut data: Vec<u8>) -> Vec<u8> {
    for px in data.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
    data
}

/// Little-endian flattening of a 16-bit RGBA buffer.
pub(crate) fn rgba16_into_bytes(samples: Vec<u16>) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for v in samples {
        data.extend_from_slice(&v.to_le_bytes());
    }
    data
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::raw_image::PixelFormat;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use std::io::Cursor;

    pub(crate) fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        image.write_to(&mut cursor, format).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn garbage_bytes_are_unsupported() {
        let registry = CodecRegistry::new(ImportConfig::default());
        let err = registry.decode(&[0xde, 0xad, 0xbe, 0xef, 0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat));

        let err = registry.decode(&[]).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat));
    }

    #[test]
    fn truncated_png_fails_decode_not_sniff() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, image::Rgba([1, 2, 3, 4])));
        let mut bytes = encode(image, ImageFormat::Png);
        bytes.truncate(bytes.len() / 2);

        let registry = CodecRegistry::new(ImportConfig::default());
        let err = registry.decode(&bytes).unwrap_err();
        assert!(matches!(err, ImportError::DecodeFailed { format: "png", .. }));
    }

    #[test]
    fn oversize_dimensions_are_rejected_before_decode() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 32, image::Rgba([0, 0, 0, 255])));
        let bytes = encode(image, ImageFormat::Png);

        let config = ImportConfig {
            max_texture_size: 48,
            ..ImportConfig::default()
        };
        let registry = CodecRegistry::new(config);
        let err = registry.decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            ImportError::ResolutionRejected { width: 64, height: 32 }
        ));
    }

    #[test]
    fn first_claiming_codec_wins() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, image::Rgba([9, 9, 9, 255])));
        let bytes = encode(image, ImageFormat::Bmp);

        let registry = CodecRegistry::new(ImportConfig::default());
        let decoded = registry.decode(&bytes).unwrap();
        assert_eq!(decoded.format(), PixelFormat::Bgra8);
    }
}
