//! Error types for the codec and rendering layers.

use std::path::PathBuf;

use crate::codec::ImageFormat;

/// Errors raised by [`Image`](crate::bitmap::Image) and the library facade.
///
/// Native failure signals (null bitmaps, `false` returns) never cross the
/// handle boundary; they are turned into one of these variants.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("No such file: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Unsupported format '{format}' for {operation}")]
    UnsupportedFormat {
        format: ImageFormat,
        operation: &'static str,
    },

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Failed to encode '{}' as {format}", path.display())]
    EncodeError { path: PathBuf, format: ImageFormat },

    #[error(
        "Crop rectangle ({left}, {top})-({right}, {bottom}) is outside a {width}x{height} image"
    )]
    InvalidBounds {
        left: u32,
        top: u32,
        right: u32,
        bottom: u32,
        width: u32,
        height: u32,
    },

    #[error("A {width}x{height} image does not fit in a 32-bit pixel buffer")]
    TooLarge { width: u32, height: u32 },

    #[error("Image handle used after release")]
    InvalidHandle,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the pixel renderer and its serializers.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Pixel buffer of {len} bytes does not hold {width}x{height} pixels at stride {stride}")]
    InvalidBuffer {
        width: u32,
        height: u32,
        stride: usize,
        len: usize,
    },

    #[error("Render text is empty")]
    EmptyText,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
