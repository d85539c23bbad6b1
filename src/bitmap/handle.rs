//! Owned image handle over a single native bitmap.

use std::fmt;
use std::path::Path;

use crate::codec::{
    aligned_pitch, ChannelMasks, Filter, ImageFormat, LoadFlags, NativeCodec, NativeRef,
};
use crate::error::ImageError;
use crate::pixels::{ChannelOrder, PixelBuffer};

/// Bits per pixel of every buffer exchanged with the codec.
const RAW_BPP: u32 = 32;

/// Sole owner of one native bitmap.
///
/// The bitmap is released exactly once: by [`Image::release`] or, failing
/// that, when the handle is dropped. Every derived image (crop, thumbnail,
/// rescale) is a new `Image` owning a new bitmap. `Image` is deliberately not
/// `Clone`.
pub struct Image<'c> {
    codec: &'c dyn NativeCodec,
    bitmap: Option<NativeRef>,
    format: ImageFormat,
}

impl<'c> Image<'c> {
    pub(super) fn adopt(
        codec: &'c dyn NativeCodec,
        bitmap: NativeRef,
        format: ImageFormat,
    ) -> Self {
        log::debug!("Acquired {:?} ({})", bitmap, format);
        Self {
            codec,
            bitmap: Some(bitmap),
            format,
        }
    }

    /// Decode the file at `path`. The format is detected from content.
    pub fn open(codec: &'c dyn NativeCodec, path: &Path) -> Result<Self, ImageError> {
        if !path.exists() {
            return Err(ImageError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let format = codec.detect_format(path, 0);
        if format.is_unknown() || !codec.supports_read(format) {
            return Err(ImageError::UnsupportedFormat {
                format,
                operation: "read",
            });
        }

        let bitmap = codec
            .load(format, path, LoadFlags::DEFAULT)
            .ok_or_else(|| {
                ImageError::DecodeError(format!(
                    "could not load '{}' as {}",
                    path.display(),
                    format
                ))
            })?;
        Ok(Self::adopt(codec, bitmap, format))
    }

    /// Build an image from 32-bit BGRA pixels, top row first.
    pub fn from_buffer(
        codec: &'c dyn NativeCodec,
        pixels: &[u8],
        width: u32,
        height: u32,
        stride: usize,
    ) -> Result<Self, ImageError> {
        Self::from_raw(codec, pixels, width, height, stride, ChannelMasks::RGBA)
    }

    /// Build an image from a [`PixelBuffer`], honoring its channel order.
    pub fn from_pixel_buffer(
        codec: &'c dyn NativeCodec,
        buffer: &PixelBuffer,
    ) -> Result<Self, ImageError> {
        Self::from_raw(
            codec,
            &buffer.data,
            buffer.width,
            buffer.height,
            buffer.stride,
            buffer.order.masks(),
        )
    }

    fn from_raw(
        codec: &'c dyn NativeCodec,
        pixels: &[u8],
        width: u32,
        height: u32,
        stride: usize,
        masks: ChannelMasks,
    ) -> Result<Self, ImageError> {
        let pitch = u32::try_from(stride)
            .map_err(|_| ImageError::DecodeError(format!("stride {} is too large", stride)))?;
        let bitmap = codec
            .convert_from_raw_bits(pixels, width, height, pitch, RAW_BPP, masks, true)
            .ok_or_else(|| {
                ImageError::DecodeError(format!(
                    "could not build a {}x{} bitmap from {} bytes at stride {}",
                    width,
                    height,
                    pixels.len(),
                    stride
                ))
            })?;
        Ok(Self::adopt(codec, bitmap, ImageFormat::Unknown))
    }

    pub(crate) fn live(&self) -> Result<NativeRef, ImageError> {
        self.bitmap.ok_or(ImageError::InvalidHandle)
    }

    pub(crate) fn codec(&self) -> &'c dyn NativeCodec {
        self.codec
    }

    pub fn width(&self) -> Result<u32, ImageError> {
        self.codec
            .width(self.live()?)
            .ok_or(ImageError::InvalidHandle)
    }

    pub fn height(&self) -> Result<u32, ImageError> {
        self.codec
            .height(self.live()?)
            .ok_or(ImageError::InvalidHandle)
    }

    pub fn bits_per_pixel(&self) -> Result<u32, ImageError> {
        self.codec
            .bits_per_pixel(self.live()?)
            .ok_or(ImageError::InvalidHandle)
    }

    /// Bytes per row of the buffer returned by [`Image::raw_pixels`].
    pub fn stride(&self) -> Result<usize, ImageError> {
        let width = self.width()?;
        match aligned_pitch(width, RAW_BPP) {
            Some(pitch) => Ok(pitch as usize),
            None => Err(ImageError::TooLarge {
                width,
                height: self.height()?,
            }),
        }
    }

    /// Source format; [`ImageFormat::Unknown`] for buffer-built images.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn format_name(&self) -> &'static str {
        self.format.symbol()
    }

    pub fn is_released(&self) -> bool {
        self.bitmap.is_none()
    }

    /// Copy the pixels out as top-down 32-bit BGRA.
    ///
    /// The returned buffer is `stride * height` bytes and owns its data.
    pub fn raw_pixels(&self) -> Result<PixelBuffer, ImageError> {
        let bitmap = self.live()?;
        let width = self.width()?;
        let height = self.height()?;
        let stride = self.stride()?;

        let len = stride
            .checked_mul(height as usize)
            .ok_or(ImageError::TooLarge { width, height })?;
        let mut data = vec![0u8; len];
        let converted = self.codec.convert_to_raw_bits(
            &mut data,
            bitmap,
            stride as u32,
            RAW_BPP,
            ChannelMasks::RGBA,
            true,
        );
        if !converted {
            return Err(ImageError::DecodeError(format!(
                "could not convert {:?} to raw pixels",
                bitmap
            )));
        }

        Ok(PixelBuffer {
            data,
            width,
            height,
            stride,
            order: ChannelOrder::Bgra,
        })
    }

    /// Copy the rectangle `[left, right) x [top, bottom)` into a new image.
    pub fn crop(&self, left: u32, top: u32, right: u32, bottom: u32) -> Result<Self, ImageError> {
        let bitmap = self.live()?;
        let (width, height) = (self.width()?, self.height()?);
        if right <= left || bottom <= top || right > width || bottom > height {
            return Err(ImageError::InvalidBounds {
                left,
                top,
                right,
                bottom,
                width,
                height,
            });
        }

        let cropped = self
            .codec
            .copy(bitmap, left, top, right, bottom)
            .ok_or_else(|| ImageError::DecodeError("crop returned no bitmap".to_string()))?;
        Ok(Self::adopt(self.codec, cropped, self.format))
    }

    /// Downscale so the longest side is at most `max_dimension`.
    pub fn thumbnail(&self, max_dimension: u32) -> Result<Self, ImageError> {
        let bitmap = self.live()?;
        let thumb = self
            .codec
            .make_thumbnail(bitmap, max_dimension, true)
            .ok_or_else(|| ImageError::DecodeError("thumbnail returned no bitmap".to_string()))?;
        Ok(Self::adopt(self.codec, thumb, self.format))
    }

    pub fn rescale(&self, width: u32, height: u32, filter: Filter) -> Result<Self, ImageError> {
        let bitmap = self.live()?;
        let scaled = self
            .codec
            .rescale(bitmap, width, height, filter)
            .ok_or_else(|| {
                ImageError::DecodeError(format!(
                    "rescale to {}x{} ({}) returned no bitmap",
                    width, height, filter
                ))
            })?;
        Ok(Self::adopt(self.codec, scaled, self.format))
    }

    /// Run `body` on a cropped copy; the copy is released when `body` returns.
    pub fn with_crop<T, E, F>(
        &self,
        left: u32,
        top: u32,
        right: u32,
        bottom: u32,
        body: F,
    ) -> Result<T, E>
    where
        F: FnOnce(&Image<'c>) -> Result<T, E>,
        E: From<ImageError>,
    {
        let cropped = self.crop(left, top, right, bottom)?;
        body(&cropped)
    }

    /// Run `body` on a thumbnail; the thumbnail is released when `body` returns.
    pub fn with_thumbnail<T, E, F>(&self, max_dimension: u32, body: F) -> Result<T, E>
    where
        F: FnOnce(&Image<'c>) -> Result<T, E>,
        E: From<ImageError>,
    {
        let thumb = self.thumbnail(max_dimension)?;
        body(&thumb)
    }

    /// Release the native bitmap now. Later accessor calls fail with
    /// [`ImageError::InvalidHandle`]; releasing again does nothing.
    pub fn release(&mut self) {
        if let Some(bitmap) = self.bitmap.take() {
            log::debug!("Releasing {:?}", bitmap);
            self.codec.unload(bitmap);
        }
    }
}

impl Drop for Image<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Image<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("bitmap", &self.bitmap)
            .field("format", &self.format)
            .finish()
    }
}
