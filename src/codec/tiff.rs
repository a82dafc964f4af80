//! TIFF decoding: gray stays gray, 16-bit goes wide, color goes BGRA8

use std::io::Cursor;

use image::codecs::tiff::TiffDecoder;
use image::{ColorType, DynamicImage, ImageDecoder};

use super::{rgba16_into_bytes, rgba8_into_bgra8, Codec};
use crate::error::ImportError;
use crate::raw_image::{CompressionHint, PixelFormat, RawImage};

pub struct TiffCodec;

impl Codec for TiffCodec {
    fn name(&self) -> &'static str {
        "tiff"
    }

    fn sniff(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(b"II\x2a\x00") || bytes.starts_with(b"MM\x00\x2a")
    }

    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), ImportError> {
        let decoder = TiffDecoder::new(Cursor::new(bytes))
            .map_err(|e| ImportError::decode_failed("tiff", e))?;
        Ok(decoder.dimensions())
    }

    fn decode(&self, bytes: &[u8]) -> Result<RawImage, ImportError> {
        let decoder = TiffDecoder::new(Cursor::new(bytes))
            .map_err(|e| ImportError::decode_failed("tiff", e))?;
        let color = decoder.color_type();
        let (width, height) = decoder.dimensions();

        let image = DynamicImage::from_decoder(decoder)
            .map_err(|e| ImportError::decode_failed("tiff", e))?;

        match color {
            ColorType::L8 | ColorType::La8 => {
                let mut raw = RawImage::new(
                    width,
                    height,
                    PixelFormat::Gray8,
                    image.into_luma8().into_raw(),
                );
                raw.set_compression(CompressionHint::Grayscale);
                Ok(raw)
            }
            ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => {
                let data = rgba16_into_bytes(image.into_rgba16().into_raw());
                let mut raw = RawImage::new(width, height, PixelFormat::Rgba16, data);
                raw.set_srgb(false);
                Ok(raw)
            }
            ColorType::Rgb8 | ColorType::Rgba8 => {
                let data = rgba8_into_bgra8(image.into_rgba8().into_raw());
                Ok(RawImage::new(width, height, PixelFormat::Bgra8, data))
            }
            other => Err(ImportError::UnsupportedLayout {
                format: "tiff",
                detail: format!("unsupported TIFF sample layout: {other:?}"),
            }),
        }
    }
}
