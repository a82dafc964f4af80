//! Asynchronous decoding of encoded images into canonical raw pixel buffers
//!
//! Unknown byte buffers are sniffed by header, decoded by the matching codec
//! (PNG, JPEG, BMP, TGA, EXR, TIFF; GIF on the animated path) and normalized
//! into a small closed set of pixel layouts with explicit color-space
//! metadata. Static images are processed one at a time on a dedicated
//! reader thread; animated GIFs each get their own thread-pool task.

pub mod codec;
pub mod config;
pub mod error;
pub mod gif;
pub mod pipeline;
pub mod raw_image;
pub mod reader;
pub mod transform;

// Re-export commonly used types
pub use config::ImportConfig;
pub use error::ImportError;
pub use gif::{AnimatedFrame, AnimatedImage, GifReadRequest, GifReader};
pub use pipeline::ImportPipeline;
pub use raw_image::{CompressionHint, GammaSpace, PixelFormat, RawImage};
pub use reader::{
    ImagePayload, ImageReadResult, ImageReader, ImageSource, ReadRequest, SubmitMode,
};
pub use transform::{FilterMode, TransformParams};
