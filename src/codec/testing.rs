//! Test double that wraps [`MemoryCodec`] and misbehaves on request.

use std::path::Path;

use super::binding::{NativeCodec, NativeRef};
use super::flags::{ChannelMasks, Filter, LoadFlags, SaveFlags};
use super::format::ImageFormat;
use super::memory::MemoryCodec;

#[derive(Default)]
pub(crate) struct FaultyCodec {
    pub inner: MemoryCodec,
    /// Panic inside `save` instead of encoding.
    pub panic_on_save: bool,
    /// Report this width for every bitmap.
    pub width: Option<u32>,
}

impl NativeCodec for FaultyCodec {
    fn detect_format(&self, path: &Path, sniff_len: usize) -> ImageFormat {
        self.inner.detect_format(path, sniff_len)
    }

    fn format_from_filename(&self, path: &Path) -> ImageFormat {
        self.inner.format_from_filename(path)
    }

    fn supports_read(&self, format: ImageFormat) -> bool {
        self.inner.supports_read(format)
    }

    fn supports_write(&self, format: ImageFormat) -> bool {
        self.inner.supports_write(format)
    }

    fn load(&self, format: ImageFormat, path: &Path, flags: LoadFlags) -> Option<NativeRef> {
        self.inner.load(format, path, flags)
    }

    fn unload(&self, bitmap: NativeRef) {
        self.inner.unload(bitmap)
    }

    fn save(&self, format: ImageFormat, bitmap: NativeRef, path: &Path, flags: SaveFlags) -> bool {
        if self.panic_on_save {
            panic!("encoder blew up on {:?}", bitmap);
        }
        self.inner.save(format, bitmap, path, flags)
    }

    fn width(&self, bitmap: NativeRef) -> Option<u32> {
        let width = self.inner.width(bitmap)?;
        Some(self.width.unwrap_or(width))
    }

    fn height(&self, bitmap: NativeRef) -> Option<u32> {
        self.inner.height(bitmap)
    }

    fn bits_per_pixel(&self, bitmap: NativeRef) -> Option<u32> {
        self.inner.bits_per_pixel(bitmap)
    }

    fn pitch(&self, bitmap: NativeRef) -> Option<u32> {
        self.inner.pitch(bitmap)
    }

    fn convert_to_raw_bits(
        &self,
        dest: &mut [u8],
        bitmap: NativeRef,
        pitch: u32,
        bpp: u32,
        masks: ChannelMasks,
        top_down: bool,
    ) -> bool {
        self.inner
            .convert_to_raw_bits(dest, bitmap, pitch, bpp, masks, top_down)
    }

    fn convert_from_raw_bits(
        &self,
        src: &[u8],
        width: u32,
        height: u32,
        pitch: u32,
        bpp: u32,
        masks: ChannelMasks,
        top_down: bool,
    ) -> Option<NativeRef> {
        self.inner
            .convert_from_raw_bits(src, width, height, pitch, bpp, masks, top_down)
    }

    fn copy(
        &self,
        bitmap: NativeRef,
        left: u32,
        top: u32,
        right: u32,
        bottom: u32,
    ) -> Option<NativeRef> {
        self.inner.copy(bitmap, left, top, right, bottom)
    }

    fn rescale(
        &self,
        bitmap: NativeRef,
        dst_width: u32,
        dst_height: u32,
        filter: Filter,
    ) -> Option<NativeRef> {
        self.inner.rescale(bitmap, dst_width, dst_height, filter)
    }

    fn make_thumbnail(
        &self,
        bitmap: NativeRef,
        max_dimension: u32,
        convert: bool,
    ) -> Option<NativeRef> {
        self.inner.make_thumbnail(bitmap, max_dimension, convert)
    }

    fn convert_to_24_bits(&self, bitmap: NativeRef) -> Option<NativeRef> {
        self.inner.convert_to_24_bits(bitmap)
    }
}
