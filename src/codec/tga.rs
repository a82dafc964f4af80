//! TGA decoding: true-color, RLE, 8-bit indexed and grayscale
//!
//! TGA has no magic bytes; the sniff accepts exactly the four structural
//! (color map, image type) combinations the importer historically handled.
//! Anything TGA-shaped outside that set is left unclaimed and surfaces as an
//! unsupported format from the registry.

use std::io::Cursor;

use image::codecs::tga::TgaDecoder;
use image::DynamicImage;

use super::{rgba8_into_bgra8, Codec};
use crate::error::ImportError;
use crate::raw_image::{CompressionHint, PixelFormat, RawImage};

const HEADER_LEN: usize = 18;

const COLOR_MAPPED: u8 = 1;
const TRUE_COLOR: u8 = 2;
const GRAYSCALE: u8 = 3;
const RLE_TRUE_COLOR: u8 = 10;

struct TgaHeader {
    color_map_type: u8,
    image_type: u8,
    width: u16,
    height: u16,
    bits_per_pixel: u8,
}

impl TgaHeader {
    fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_LEN {
            return None;
        }
        Some(Self {
            color_map_type: bytes[1],
            image_type: bytes[2],
            width: u16::from_le_bytes([bytes[12], bytes[13]]),
            height: u16::from_le_bytes([bytes[14], bytes[15]]),
            bits_per_pixel: bytes[16],
        })
    }

    fn is_supported(&self) -> bool {
        match (self.color_map_type, self.image_type) {
            (0, TRUE_COLOR) | (0, GRAYSCALE) | (0, RLE_TRUE_COLOR) => true,
            // alpha stored as pseudo-color 8-bit TGA
            (1, COLOR_MAPPED) => self.bits_per_pixel == 8,
            _ => false,
        }
    }
}

pub struct TgaCodec;

impl Codec for TgaCodec {
    fn name(&self) -> &'static str {
        "tga"
    }

    fn sniff(&self, bytes: &[u8]) -> bool {
        TgaHeader::parse(bytes).is_some_and(|header| header.is_supported())
    }

    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), ImportError> {
        let header = TgaHeader::parse(bytes).ok_or(ImportError::UnsupportedFormat)?;
        Ok((u32::from(header.width), u32::from(header.height)))
    }

    fn decode(&self, bytes: &[u8]) -> Result<RawImage, ImportError> {
        let header = TgaHeader::parse(bytes).ok_or(ImportError::UnsupportedFormat)?;

        let decoder = TgaDecoder::new(Cursor::new(bytes))
            .map_err(|e| ImportError::decode_failed("tga", e))?;
        let image = DynamicImage::from_decoder(decoder)
            .map_err(|e| ImportError::decode_failed("tga", e))?;

        let width = u32::from(header.width);
        let height = u32::from(header.height);

        if header.image_type == GRAYSCALE {
            let mut raw = RawImage::new(
                width,
                height,
                PixelFormat::Gray8,
                image.into_luma8().into_raw(),
            );
            // grayscales default to linear as they are commonly used as masks
            raw.set_srgb(false);
            raw.set_compression(CompressionHint::Grayscale);
            return Ok(raw);
        }

        let data = rgba8_into_bgra8(image.into_rgba8().into_raw());
        Ok(RawImage::new(width, height, PixelFormat::Bgra8, data))
    }
}
