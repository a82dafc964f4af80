//! PNG decoding: 8 and 16 bit, gray and color, with zero-alpha repair

use std::io::Cursor;

use image::codecs::png::PngDecoder;
use image::{ColorType, DynamicImage, ImageDecoder};

use super::{rgba16_into_bytes, rgba8_into_bgra8, Codec};
use crate::error::ImportError;
use crate::raw_image::{CompressionHint, PixelFormat, RawImage};

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

pub struct PngCodec;

impl Codec for PngCodec {
    fn name(&self) -> &'static str {
        "png"
    }

    fn sniff(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(&PNG_MAGIC)
    }

    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), ImportError> {
        let decoder = PngDecoder::new(Cursor::new(bytes))
            .map_err(|e| ImportError::decode_failed("png", e))?;
        Ok(decoder.dimensions())
    }

    fn decode(&self, bytes: &[u8]) -> Result<RawImage, ImportError> {
        let decoder = PngDecoder::new(Cursor::new(bytes))
            .map_err(|e| ImportError::decode_failed("png", e))?;
        let color = decoder.color_type();
        let (width, height) = decoder.dimensions();

        let image = DynamicImage::from_decoder(decoder)
            .map_err(|e| ImportError::decode_failed("png", e))?;

        let raw = match color {
            ColorType::L8 | ColorType::La8 => {
                let mut raw = RawImage::new(
                    width,
                    height,
                    PixelFormat::Gray8,
                    image.into_luma8().into_raw(),
                );
                raw.set_compression(CompressionHint::Grayscale);
                raw
            }
            // 16-bit gray is upconverted: there is no canonical G16 layout
            ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => {
                let mut data = rgba16_into_bytes(image.into_rgba16().into_raw());
                repair_zero_alpha_rgba16(&mut data);
                let mut raw = RawImage::new(width, height, PixelFormat::Rgba16, data);
                raw.set_srgb(false);
                raw
            }
            ColorType::Rgb8 | ColorType::Rgba8 => {
                let mut data = rgba8_into_bgra8(image.into_rgba8().into_raw());
                repair_zero_alpha_bgra8(&mut data);
                RawImage::new(width, height, PixelFormat::Bgra8, data)
            }
            other => {
                return Err(ImportError::UnsupportedLayout {
                    format: "png",
                    detail: format!(
                        "only 8 and 16 bit depth PNG images are supported, got {other:?}"
                    ),
                })
            }
        };

        Ok(raw)
    }
}

/// Zeroes RGB wherever alpha is fully transparent, so stale color does not
/// fringe when the pixel is later alpha-blended.
fn repair_zero_alpha_bgra8(data: &mut [u8]) {
    for px in data.chunks_exact_mut(4) {
        if px[3] == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
        }
    }
}

fn repair_zero_alpha_rgba16(data: &mut [u8]) {
    for px in data.chunks_exact_mut(8) {
        if px[6] == 0 && px[7] == 0 {
            px[..6].fill(0);
        }
    }
}
