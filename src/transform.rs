//! Pre-upload transforms: percent resize over canonical buffers

use fast_image_resize as fr;
use fr::images::Image as FrImage;
use half::f16;
use serde::{Deserialize, Serialize};

use crate::raw_image::{PixelFormat, RawImage};

/// Sampling filter requested for the decoded texture. Also selects the
/// resampling algorithm when a percent resize runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterMode {
    Nearest,
    Bilinear,
    Trilinear,
    #[default]
    Default,
}

/// Caller-facing transform knobs carried by every read request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformParams {
    pub for_ui: bool,
    pub filter_mode: FilterMode,
    /// Keep N percent of the source width. 100 or anything outside (0, 100)
    /// is a no-op, not an error.
    pub percent_size_x: u32,
    /// Keep N percent of the source height, same rules as `percent_size_x`.
    pub percent_size_y: u32,
    /// Skip texture-side output and deliver flattened RGBA8 pixels instead.
    pub pixels_only: bool,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            for_ui: true,
            filter_mode: FilterMode::Default,
            percent_size_x: 100,
            percent_size_y: 100,
            pixels_only: false,
        }
    }
}

impl TransformParams {
    pub fn is_percent_size_valid(&self) -> bool {
        (1..100).contains(&self.percent_size_x) && (1..100).contains(&self.percent_size_y)
    }
}

/// Applies the percent resize when the params ask for one; otherwise returns
/// the image untouched, byte for byte.
pub fn apply_percent_resize(image: RawImage, params: &TransformParams) -> RawImage {
    if !params.is_percent_size_valid() {
        return image;
    }

    let new_width = (image.width() * params.percent_size_x / 100).max(1);
    let new_height = (image.height() * params.percent_size_y / 100).max(1);
    if new_width == image.width() && new_height == image.height() {
        return image;
    }

    log::debug!(
        "resizing {}x{} -> {}x{}",
        image.width(),
        image.height(),
        new_width,
        new_height
    );
    resize(image, new_width, new_height, params.filter_mode)
}

fn resize_alg(filter: FilterMode, downscaling: bool) -> fr::ResizeAlg {
    match filter {
        FilterMode::Nearest => fr::ResizeAlg::Nearest,
        FilterMode::Bilinear => fr::ResizeAlg::Convolution(fr::FilterType::Bilinear),
        FilterMode::Trilinear => fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom),
        FilterMode::Default => {
            if downscaling {
                // Downscaling: Lanczos3 preserves detail
                fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3)
            } else {
                // Upscaling: CatmullRom gives smoother results
                fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom)
            }
        }
    }
}

fn resize(mut image: RawImage, new_width: u32, new_height: u32, filter: FilterMode) -> RawImage {
    let (width, height) = (image.width(), image.height());
    let downscaling = new_width < width || new_height < height;
    let algorithm = resize_alg(filter, downscaling);

    // Half floats have no resampler; they take a round trip through f32.
    let (pixel_type, bytes_per_px, src_buffer) = match image.format() {
        PixelFormat::Gray8 => (fr::PixelType::U8, 1, image.data().to_vec()),
        PixelFormat::Bgra8 => (fr::PixelType::U8x4, 4, image.data().to_vec()),
        PixelFormat::Rgba16 => (fr::PixelType::U16x4, 8, image.data().to_vec()),
        PixelFormat::Rgba16F => {
            let mut widened = Vec::with_capacity(image.data().len() * 2);
            for ch in image.data().chunks_exact(2) {
                let v = f16::from_le_bytes([ch[0], ch[1]]).to_f32();
                widened.extend_from_slice(&v.to_ne_bytes());
            }
            (fr::PixelType::F32x4, 16, widened)
        }
    };

    let src_image = FrImage::from_vec_u8(width, height, src_buffer, pixel_type).unwrap();

    let dst_len = new_width as usize * new_height as usize * bytes_per_px;
    let mut dst_buffer = vec![0u8; dst_len];
    let mut dst_image =
        FrImage::from_slice_u8(new_width, new_height, &mut dst_buffer, pixel_type).unwrap();

    let mut resizer = fr::Resizer::new();
    resizer
        .resize(
            &src_image,
            &mut dst_image,
            Some(&fr::ResizeOptions::new().resize_alg(algorithm)),
        )
        .unwrap();

    if image.format() == PixelFormat::Rgba16F {
        let mut narrowed = Vec::with_capacity(dst_buffer.len() / 2);
        for ch in dst_buffer.chunks_exact(4) {
            let v = f32::from_ne_bytes([ch[0], ch[1], ch[2], ch[3]]);
            narrowed.extend_from_slice(&f16::from_f32(v).to_le_bytes());
        }
        dst_buffer = narrowed;
    }

    image.replace_pixels(new_width, new_height, dst_buffer);
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw_image::CompressionHint;

    fn gray(width: u32, height: u32) -> RawImage {
        let data = (0..width as usize * height as usize)
            .map(|i| (i % 251) as u8)
            .collect();
        RawImage::new(width, height, PixelFormat::Gray8, data)
    }

    #[test]
    fn fifty_percent_halves_both_dimensions() {
        let params = TransformParams {
            percent_size_x: 50,
            percent_size_y: 50,
            ..TransformParams::default()
        };
        let out = apply_percent_resize(gray(100, 100), &params);
        assert_eq!((out.width(), out.height()), (50, 50));
        assert_eq!(out.data().len(), 50 * 50);
    }

    #[test]
    fn hundred_percent_is_a_byte_for_byte_noop() {
        let src = gray(33, 21);
        let expected = src.data().to_vec();
        let out = apply_percent_resize(src, &TransformParams::default());
        assert_eq!((out.width(), out.height()), (33, 21));
        assert_eq!(out.data(), expected.as_slice());
    }

    #[test]
    fn out_of_range_percentages_are_noops() {
        for (px, py) in [(0, 50), (50, 0), (101, 50), (50, 200)] {
            let params = TransformParams {
                percent_size_x: px,
                percent_size_y: py,
                ..TransformParams::default()
            };
            let out = apply_percent_resize(gray(40, 40), &params);
            assert_eq!((out.width(), out.height()), (40, 40));
        }
    }

    #[test]
    fn resize_preserves_color_metadata() {
        let mut src = RawImage::new(8, 8, PixelFormat::Bgra8, vec![128; 8 * 8 * 4]);
        src.set_srgb(false);
        src.set_compression(CompressionHint::Grayscale);

        let params = TransformParams {
            percent_size_x: 25,
            percent_size_y: 25,
            ..TransformParams::default()
        };
        let out = apply_percent_resize(src, &params);
        assert_eq!((out.width(), out.height()), (2, 2));
        assert!(!out.is_srgb());
        assert_eq!(out.compression(), CompressionHint::Grayscale);
    }

    #[test]
    fn half_float_buffers_survive_the_f32_round_trip() {
        let mut data = Vec::new();
        for _ in 0..16 {
            for v in [0.25f32, 0.5, 2.0, 1.0] {
                data.extend_from_slice(&f16::from_f32(v).to_le_bytes());
            }
        }
        let src = {
            let mut raw = RawImage::new(4, 4, PixelFormat::Rgba16F, data);
            raw.set_srgb(false);
            raw
        };

        let params = TransformParams {
            percent_size_x: 50,
            percent_size_y: 50,
            filter_mode: FilterMode::Nearest,
            ..TransformParams::default()
        };
        let out = apply_percent_resize(src, &params);
        assert_eq!((out.width(), out.height()), (2, 2));
        assert_eq!(out.format(), PixelFormat::Rgba16F);

        let r = f16::from_le_bytes([out.data()[0], out.data()[1]]).to_f32();
        assert_eq!(r, 0.25);
    }

    #[test]
    fn nearest_filter_keeps_exact_values() {
        let src = RawImage::new(4, 4, PixelFormat::Gray8, vec![200; 16]);
        let params = TransformParams {
            percent_size_x: 50,
            percent_size_y: 50,
            filter_mode: FilterMode::Nearest,
            ..TransformParams::default()
        };
        let out = apply_percent_resize(src, &params);
        assert!(out.data().iter().all(|&g| g == 200));
    }
}
