//! Entry points that scope an [`Image`]'s lifetime to a closure.

use std::path::Path;

use super::handle::Image;
use crate::codec::{MemoryCodec, NativeCodec};
use crate::error::ImageError;

/// An image library bound to one codec backend.
pub struct ImageLibrary<C = MemoryCodec> {
    codec: C,
}

impl Default for ImageLibrary<MemoryCodec> {
    fn default() -> Self {
        Self::new(MemoryCodec::new())
    }
}

impl<C: NativeCodec> ImageLibrary<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Decode `path` into an owned [`Image`].
    pub fn open(&self, path: &Path) -> Result<Image<'_>, ImageError> {
        Image::open(&self.codec, path)
    }

    /// Whether the codec recognizes `path` as an image. Never fails.
    pub fn is_image(&self, path: &Path) -> bool {
        path.is_file() && !self.codec.detect_format(path, 0).is_unknown()
    }

    /// Open `path`, run `body`, release the image whether or not `body`
    /// succeeded, and return `body`'s result.
    pub fn with_image<T, E, F>(&self, path: &Path, body: F) -> Result<T, E>
    where
        F: FnOnce(&Image<'_>) -> Result<T, E>,
        E: From<ImageError>,
    {
        let image = self.open(path)?;
        body(&image)
    }

    /// Like [`ImageLibrary::with_image`] for 32-bit BGRA pixels in memory.
    pub fn with_image_from_buffer<T, E, F>(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        stride: usize,
        body: F,
    ) -> Result<T, E>
    where
        F: FnOnce(&Image<'_>) -> Result<T, E>,
        E: From<ImageError>,
    {
        let image = Image::from_buffer(&self.codec, pixels, width, height, stride)?;
        body(&image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_path_is_not_found() {
        let library = ImageLibrary::default();
        let path = PathBuf::from("/definitely/not/here.png");
        let err = library.open(&path).unwrap_err();
        assert!(matches!(err, ImageError::NotFound { .. }));
        assert_eq!(library.codec().live_bitmaps(), 0);
    }

    #[test]
    fn test_is_image_never_fails() {
        let library = ImageLibrary::default();
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("notes.png");
        std::fs::write(&text, b"hello").unwrap();

        assert!(!library.is_image(&text));
        assert!(!library.is_image(dir.path()));
        assert!(!library.is_image(&dir.path().join("missing.png")));
    }

    #[test]
    fn test_with_image_from_buffer_releases() {
        let library = ImageLibrary::default();
        let pixels = [0u8; 8];
        let width = library
            .with_image_from_buffer(&pixels, 2, 1, 8, |image| image.width())
            .unwrap();
        assert_eq!(width, 2);
        assert_eq!(library.codec().live_bitmaps(), 0);
    }

    #[test]
    fn test_with_image_from_buffer_propagates_body_error() {
        let library = ImageLibrary::default();
        let pixels = [0u8; 4];
        let result: Result<(), ImageError> =
            library.with_image_from_buffer(&pixels, 1, 1, 4, |_| Err(ImageError::InvalidHandle));
        assert!(matches!(result, Err(ImageError::InvalidHandle)));
        assert_eq!(library.codec().live_bitmaps(), 0);
    }

    #[test]
    fn test_short_buffer_is_decode_error() {
        let library = ImageLibrary::default();
        let pixels = [0u8; 3];
        let result = library.with_image_from_buffer(&pixels, 1, 1, 4, |image| image.width());
        assert!(matches!(result, Err(ImageError::DecodeError(_))));
    }
}
