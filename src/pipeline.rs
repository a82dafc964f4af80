//! Import orchestration: load bytes, dispatch to a codec, post-decode
//! transforms

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use crate::codec::CodecRegistry;
use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::raw_image::RawImage;
use crate::transform::{self, TransformParams};

/// Owns the codec registry and runs one request end to end. Constructed once
/// and handed to whichever worker executes requests; no global state.
pub struct ImportPipeline {
    registry: CodecRegistry,
}

impl ImportPipeline {
    pub fn new(config: ImportConfig) -> Self {
        Self {
            registry: CodecRegistry::new(config),
        }
    }

    pub fn config(&self) -> &ImportConfig {
        self.registry.config()
    }

    /// Decodes an in-memory buffer and applies the percent resize.
    pub fn import_bytes(
        &self,
        bytes: &[u8],
        params: &TransformParams,
    ) -> Result<RawImage, ImportError> {
        let image = self.registry.decode(bytes)?;
        Ok(transform::apply_percent_resize(image, params))
    }

    /// Reads a file fully into memory, stamps its modification time, then
    /// decodes like [`ImportPipeline::import_bytes`]. Missing file, I/O
    /// failure and oversize file are distinct errors.
    pub fn import_file(
        &self,
        path: &Path,
        params: &TransformParams,
    ) -> Result<RawImage, ImportError> {
        let (bytes, modification_time) = read_image_file(path, self.registry.config())?;

        let mut image = self.import_bytes(&bytes, params)?;
        if let Some(time) = modification_time {
            image.set_modification_time(time);
        }
        Ok(image)
    }
}

/// Whole-file read honoring the configured size cap. Returns the bytes and
/// the newest of the file's creation/modification timestamps.
pub fn read_image_file(
    path: &Path,
    config: &ImportConfig,
) -> Result<(Vec<u8>, Option<SystemTime>), ImportError> {
    if !path.exists() {
        return Err(ImportError::MissingFile(path.to_path_buf()));
    }

    let metadata = fs::metadata(path).map_err(|e| ImportError::io(path, e))?;
    let size = metadata.len();
    if size > config.max_file_size {
        return Err(ImportError::OversizeFile {
            path: path.to_path_buf(),
            size,
            limit: config.max_file_size,
        });
    }

    let modification_time = match (metadata.created().ok(), metadata.modified().ok()) {
        (Some(created), Some(modified)) => Some(created.max(modified)),
        (created, modified) => created.or(modified),
    };

    let bytes = fs::read(path).map_err(|e| ImportError::io(path, e))?;
    log::debug!("read {} bytes from {}", bytes.len(), path.display());

    Ok((bytes, modification_time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tests::encode;
    use crate::raw_image::PixelFormat;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let src = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        encode(DynamicImage::ImageRgba8(src), ImageFormat::Png)
    }

    #[test]
    fn file_import_decodes_and_stamps_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.png");
        fs::write(&path, png_bytes(20, 10)).unwrap();

        let pipeline = ImportPipeline::new(ImportConfig::default());
        let image = pipeline
            .import_file(&path, &TransformParams::default())
            .unwrap();

        assert_eq!((image.width(), image.height()), (20, 10));
        assert_eq!(image.format(), PixelFormat::Bgra8);
        assert!(image.modification_time().is_some());
    }

    #[test]
    fn in_memory_import_has_no_mtime() {
        let pipeline = ImportPipeline::new(ImportConfig::default());
        let image = pipeline
            .import_bytes(&png_bytes(8, 8), &TransformParams::default())
            .unwrap();
        assert!(image.modification_time().is_none());
    }

    #[test]
    fn missing_file_error_embeds_the_path() {
        let pipeline = ImportPipeline::new(ImportConfig::default());
        let err = pipeline
            .import_file(Path::new("/no/such/image.png"), &TransformParams::default())
            .unwrap_err();

        assert!(matches!(err, ImportError::MissingFile(_)));
        assert!(err.to_string().contains("/no/such/image.png"));
    }

    #[test]
    fn oversize_file_is_rejected_before_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        fs::write(&path, png_bytes(64, 64)).unwrap();

        let config = ImportConfig {
            max_file_size: 16,
            ..ImportConfig::default()
        };
        let pipeline = ImportPipeline::new(config);
        let err = pipeline
            .import_file(&path, &TransformParams::default())
            .unwrap_err();
        assert!(matches!(err, ImportError::OversizeFile { limit: 16, .. }));
    }

    #[test]
    fn percent_resize_runs_after_decode() {
        let pipeline = ImportPipeline::new(ImportConfig::default());
        let params = TransformParams {
            percent_size_x: 50,
            percent_size_y: 50,
            ..TransformParams::default()
        };
        let image = pipeline.import_bytes(&png_bytes(100, 100), &params).unwrap();
        assert_eq!((image.width(), image.height()), (50, 50));
    }
}
