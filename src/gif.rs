//! Animated GIF decoding on the shared thread pool
//!
//! Animated requests do not go through the dedicated reader thread: each one
//! runs as its own rayon task, because frames are consumed progressively
//! rather than as a single terminal buffer. Concurrent GIF decodes may
//! therefore complete in any order.

use std::io::Cursor;
use std::time::Duration;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, ImageDecoder};

use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::pipeline::read_image_file;
use crate::reader::{ImageSource, SubmitMode};
use crate::transform::FilterMode;

const GIF_MAGIC_87: &[u8; 6] = b"GIF87a";
const GIF_MAGIC_89: &[u8; 6] = b"GIF89a";

/// One fully composited animation frame, RGBA8.
#[derive(Debug, Clone)]
pub struct AnimatedFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub delay: Duration,
}

/// Playback artifact for a decoded GIF: frame storage plus a looping cursor,
/// sized to the decoded frame dimensions.
#[derive(Debug)]
pub struct AnimatedImage {
    width: u32,
    height: u32,
    frames: Vec<AnimatedFrame>,
    cursor: usize,
}

impl AnimatedImage {
    fn new(width: u32, height: u32, frames: Vec<AnimatedFrame>) -> Result<Self, ImportError> {
        if frames.is_empty() {
            return Err(ImportError::ResourceCreation(
                "animated image has no frames".into(),
            ));
        }
        Ok(Self {
            width,
            height,
            frames,
            cursor: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, index: usize) -> Option<&AnimatedFrame> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[AnimatedFrame] {
        &self.frames
    }

    /// Next frame for playback, wrapping at the end of the animation.
    pub fn next_frame(&mut self) -> &AnimatedFrame {
        let frame = &self.frames[self.cursor];
        self.cursor = (self.cursor + 1) % self.frames.len();
        frame
    }

    pub fn total_duration(&self) -> Duration {
        self.frames.iter().map(|f| f.delay).sum()
    }
}

/// Decodes and composites every frame of a GIF buffer.
pub fn decode_gif(bytes: &[u8]) -> Result<AnimatedImage, ImportError> {
    if !(bytes.starts_with(GIF_MAGIC_87) || bytes.starts_with(GIF_MAGIC_89)) {
        return Err(ImportError::UnsupportedFormat);
    }

    let decoder = GifDecoder::new(Cursor::new(bytes))
        .map_err(|e| ImportError::decode_failed("gif", e))?;
    let (width, height) = decoder.dimensions();

    let mut frames = Vec::new();
    for frame in decoder.into_frames() {
        let frame = frame.map_err(|e| ImportError::decode_failed("gif", e))?;
        let delay = Duration::from(frame.delay());
        let buffer = frame.into_buffer();
        frames.push(AnimatedFrame {
            width: buffer.width(),
            height: buffer.height(),
            rgba: buffer.into_raw(),
            delay,
        });
    }

    log::debug!("decoded {} gif frames at {width}x{height}", frames.len());
    AnimatedImage::new(width, height, frames)
}

/// One animated-image request.
#[derive(Debug)]
pub struct GifReadRequest {
    pub source: ImageSource,
    pub filter_mode: FilterMode,
}

impl GifReadRequest {
    pub fn from_file(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            source: ImageSource::File(path.into()),
            filter_mode: FilterMode::Default,
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            source: ImageSource::Bytes(bytes),
            filter_mode: FilterMode::Default,
        }
    }
}

/// Entry point for the animated path. Unlike [`crate::reader::ImageReader`]
/// there is no queue: every async request is its own pool task.
pub struct GifReader {
    config: ImportConfig,
}

impl GifReader {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    /// Submits a request; the sink receives either the playback artifact or
    /// an error, exactly once. `Sync` decodes inline on the calling thread.
    pub fn submit(
        &self,
        request: GifReadRequest,
        mode: SubmitMode,
        sink: impl FnOnce(Result<AnimatedImage, ImportError>) + Send + 'static,
    ) {
        match mode {
            SubmitMode::Sync => sink(self.process(request)),
            SubmitMode::Async => {
                let config = self.config.clone();
                rayon::spawn(move || {
                    let reader = GifReader { config };
                    sink(reader.process(request));
                });
            }
        }
    }

    /// Blocking convenience wrapper around a `Sync` submission.
    pub fn load_sync(&self, source: ImageSource) -> Result<AnimatedImage, ImportError> {
        self.process(GifReadRequest {
            source,
            filter_mode: FilterMode::Default,
        })
    }

    fn process(&self, request: GifReadRequest) -> Result<AnimatedImage, ImportError> {
        let bytes = match request.source {
            ImageSource::File(path) => read_image_file(&path, &self.config)?.0,
            ImageSource::Bytes(bytes) => bytes,
        };

        decode_gif(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, Rgba, RgbaImage};
    use std::sync::mpsc;

    fn sample_gif(frames: u32, width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut bytes);
            for i in 0..frames {
                let level = (i * 40) as u8;
                let image = RgbaImage::from_pixel(width, height, Rgba([level, 0, 0, 255]));
                let frame =
                    Frame::from_parts(image, 0, 0, Delay::from_numer_denom_ms(100, 1));
                encoder.encode_frames(std::iter::once(frame)).unwrap();
            }
        }
        bytes
    }

    #[test]
    fn gif_decodes_to_playback_frames() {
        let bytes = sample_gif(3, 12, 8);
        let mut animated = decode_gif(&bytes).unwrap();

        assert_eq!((animated.width(), animated.height()), (12, 8));
        assert_eq!(animated.frame_count(), 3);
        assert_eq!(animated.total_duration(), Duration::from_millis(300));

        let first = animated.next_frame();
        assert_eq!(first.rgba.len(), 12 * 8 * 4);
        animated.next_frame();
        animated.next_frame();
        // playback wraps
        assert_eq!(animated.next_frame().rgba[0], 0);
    }

    #[test]
    fn non_gif_bytes_are_unsupported() {
        let err = decode_gif(b"GIF99a oh no").unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat));
    }

    #[test]
    fn truncated_gif_is_a_decode_failure() {
        let mut bytes = sample_gif(2, 16, 16);
        bytes.truncate(bytes.len() / 3);
        let err = decode_gif(&bytes).unwrap_err();
        assert!(matches!(err, ImportError::DecodeFailed { format: "gif", .. }));
    }

    #[test]
    fn async_submit_delivers_exactly_one_notification() {
        let reader = GifReader::new(ImportConfig::default());
        let (tx, rx) = mpsc::channel();

        reader.submit(
            GifReadRequest::from_bytes(sample_gif(2, 8, 8)),
            SubmitMode::Async,
            move |outcome| tx.send(outcome).unwrap(),
        );

        let animated = rx
            .recv_timeout(Duration::from_secs(10))
            .unwrap()
            .unwrap();
        assert_eq!(animated.frame_count(), 2);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn file_requests_honor_the_size_cap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        std::fs::write(&path, sample_gif(2, 8, 8)).unwrap();

        let config = ImportConfig {
            max_file_size: 4,
            ..ImportConfig::default()
        };
        let reader = GifReader::new(config);
        let err = reader.load_sync(ImageSource::File(path)).unwrap_err();
        assert!(matches!(err, ImportError::OversizeFile { .. }));
    }

    #[test]
    fn sync_submit_runs_inline() {
        let reader = GifReader::new(ImportConfig::default());
        let (tx, rx) = mpsc::channel();

        reader.submit(
            GifReadRequest::from_bytes(sample_gif(1, 4, 4)),
            SubmitMode::Sync,
            move |outcome| tx.send(outcome.is_ok()).unwrap(),
        );

        // sync mode has already delivered by the time submit returns
        assert!(rx.try_recv().unwrap());
    }
}
