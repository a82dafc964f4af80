//! BMP decoding: everything normalizes to BGRA8

use std::io::Cursor;

use image::codecs::bmp::BmpDecoder;
use image::{DynamicImage, ImageDecoder};

use super::{rgba8_into_bgra8, Codec};
use crate::error::ImportError;
use crate::raw_image::{PixelFormat, RawImage};

pub struct BmpCodec;

impl Codec for BmpCodec {
    fn name(&self) -> &'static str {
        "bmp"
    }

    fn sniff(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(b"BM")
    }

    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), ImportError> {
        let decoder = BmpDecoder::new(Cursor::new(bytes))
            .map_err(|e| ImportError::decode_failed("bmp", e))?;
        Ok(decoder.dimensions())
    }

    fn decode(&self, bytes: &[u8]) -> Result<RawImage, ImportError> {
        let decoder = BmpDecoder::new(Cursor::new(bytes))
            .map_err(|e| ImportError::decode_failed("bmp", e))?;
        let (width, height) = decoder.dimensions();

        let image = DynamicImage::from_decoder(decoder)
            .map_err(|e| ImportError::decode_failed("bmp", e))?;

        // indexed, gray and true-color BMPs all collapse to BGRA8
        let data = rgba8_into_bgra8(image.into_rgba8().into_raw());
        Ok(RawImage::new(width, height, PixelFormat::Bgra8, data))
    }
}
