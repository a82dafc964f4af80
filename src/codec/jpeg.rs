//! JPEG decoding, 8-bit gray and color only

use std::io::Cursor;

use image::codecs::jpeg::JpegDecoder;
use image::{ColorType, DynamicImage, ImageDecoder};

use super::{rgba8_into_bgra8, Codec};
use crate::error::ImportError;
use crate::raw_image::{CompressionHint, PixelFormat, RawImage};

const JPEG_MAGIC: [u8; 3] = [0xff, 0xd8, 0xff];

pub struct JpegCodec;

impl Codec for JpegCodec {
    fn name(&self) -> &'static str {
        "jpeg"
    }

    fn sniff(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(&JPEG_MAGIC)
    }

    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), ImportError> {
        let decoder = JpegDecoder::new(Cursor::new(bytes))
            .map_err(|e| ImportError::decode_failed("jpeg", e))?;
        Ok(decoder.dimensions())
    }

    fn decode(&self, bytes: &[u8]) -> Result<RawImage, ImportError> {
        let decoder = JpegDecoder::new(Cursor::new(bytes))
            .map_err(|e| ImportError::decode_failed("jpeg", e))?;
        let color = decoder.color_type();
        let (width, height) = decoder.dimensions();

        let image = DynamicImage::from_decoder(decoder)
            .map_err(|e| ImportError::decode_failed("jpeg", e))?;

        match color {
            ColorType::L8 => {
                let mut raw = RawImage::new(
                    width,
                    height,
                    PixelFormat::Gray8,
                    image.into_luma8().into_raw(),
                );
                raw.set_compression(CompressionHint::Grayscale);
                Ok(raw)
            }
            ColorType::Rgb8 | ColorType::Rgba8 => {
                let data = rgba8_into_bgra8(image.into_rgba8().into_raw());
                Ok(RawImage::new(width, height, PixelFormat::Bgra8, data))
            }
            other => Err(ImportError::UnsupportedLayout {
                format: "jpeg",
                detail: format!("only 8 bit depth JPEG images are supported, got {other:?}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tests::encode;
    use image::{GrayImage, ImageFormat, Luma, RgbImage};

    #[test]
    fn gray_jpeg_becomes_gray8_srgb() {
        let src = GrayImage::from_pixel(32, 32, Luma([128]));
        let bytes = encode(DynamicImage::ImageLuma8(src), ImageFormat::Jpeg);

        let raw = JpegCodec.decode(&bytes).unwrap();
        assert_eq!(raw.format(), PixelFormat::Gray8);
        assert!(raw.is_srgb());
        assert_eq!(raw.compression(), CompressionHint::Grayscale);
        assert_eq!(raw.data().len(), 32 * 32);
    }

    #[test]
    fn color_jpeg_becomes_bgra8() {
        let src = RgbImage::from_pixel(16, 16, image::Rgb([250, 0, 0]));
        let bytes = encode(DynamicImage::ImageRgb8(src), ImageFormat::Jpeg);

        let raw = JpegCodec.decode(&bytes).unwrap();
        assert_eq!(raw.format(), PixelFormat::Bgra8);
        assert!(raw.is_srgb());
        assert_eq!(raw.data().len(), 16 * 16 * 4);

        // lossy, but red should still dominate and land in the B-slot of BGRA
        let px = &raw.data()[..4];
        assert!(px[2] > 200, "red channel lost: {px:?}");
        assert_eq!(px[3], 255);
    }

    #[test]
    fn sniff_matches_soi_marker() {
        assert!(JpegCodec.sniff(&[0xff, 0xd8, 0xff, 0xe0]));
        assert!(!JpegCodec.sniff(&[0xff, 0xd8, 0x00]));
    }
}
