//! OpenEXR decoding: always linear half-float RGBA with the HDR hint

use std::io::Cursor;

use half::f16;
use image::codecs::openexr::OpenExrDecoder;
use image::{DynamicImage, ImageDecoder};

use super::Codec;
use crate::error::ImportError;
use crate::raw_image::{CompressionHint, PixelFormat, RawImage};

const EXR_MAGIC: [u8; 4] = [0x76, 0x2f, 0x31, 0x01];

pub struct ExrCodec;

impl Codec for ExrCodec {
    fn name(&self) -> &'static str {
        "exr"
    }

    fn sniff(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(&EXR_MAGIC)
    }

    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), ImportError> {
        let decoder = OpenExrDecoder::new(Cursor::new(bytes))
            .map_err(|e| ImportError::decode_failed("exr", e))?;
        Ok(decoder.dimensions())
    }

    fn decode(&self, bytes: &[u8]) -> Result<RawImage, ImportError> {
        let decoder = OpenExrDecoder::new(Cursor::new(bytes))
            .map_err(|e| ImportError::decode_failed("exr", e))?;
        let (width, height) = decoder.dimensions();

        let image = DynamicImage::from_decoder(decoder)
            .map_err(|e| ImportError::decode_failed("exr", e))?;

        let rgba = image.into_rgba32f();
        let mut data = Vec::with_capacity(rgba.len() * 2);
        for &sample in rgba.as_raw() {
            data.extend_from_slice(&f16::from_f32(sample).to_le_bytes());
        }

        let mut raw = RawImage::new(width, height, PixelFormat::Rgba16F, data);
        raw.set_srgb(false);
        raw.set_compression(CompressionHint::Hdr);
        Ok(raw)
    }
}
