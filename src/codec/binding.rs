//! The native codec interface.
//!
//! Every backend exposes the same flat, stateless set of entry points over
//! opaque bitmap references. Calls that allocate a bitmap hand back a fresh
//! [`NativeRef`] that the caller owns and must pass to
//! [`NativeCodec::unload`] exactly once. A `None` return is the backend's
//! "null bitmap" failure signal, not a fault.
//!
//! Nothing here tracks ownership; that is the job of
//! [`Image`](crate::bitmap::Image).

use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;

use super::flags::{ChannelMasks, Filter, LoadFlags, SaveFlags};
use super::format::ImageFormat;

/// Opaque, non-null reference to a bitmap living in the backend.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeRef(NonZeroUsize);

impl NativeRef {
    /// Wrap a raw backend value. Returns `None` for the null value.
    pub fn from_raw(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(NativeRef)
    }

    pub fn as_raw(self) -> usize {
        self.0.get()
    }
}

impl fmt::Debug for NativeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeRef({:#x})", self.0.get())
    }
}

/// Flat binding to an image codec library.
///
/// Accessors return `None` for references the backend does not know.
pub trait NativeCodec: Send + Sync {
    /// Sniff the file's content. `sniff_len == 0` lets the backend pick.
    /// Returns [`ImageFormat::Unknown`] when nothing matches.
    fn detect_format(&self, path: &Path, sniff_len: usize) -> ImageFormat;

    /// Guess a format from the file name's extension only.
    fn format_from_filename(&self, path: &Path) -> ImageFormat;

    fn supports_read(&self, format: ImageFormat) -> bool;

    fn supports_write(&self, format: ImageFormat) -> bool;

    fn load(&self, format: ImageFormat, path: &Path, flags: LoadFlags) -> Option<NativeRef>;

    /// Free a bitmap. Unknown references are ignored.
    fn unload(&self, bitmap: NativeRef);

    /// Encode `bitmap` to `path`. Returns `false` on any failure.
    fn save(&self, format: ImageFormat, bitmap: NativeRef, path: &Path, flags: SaveFlags) -> bool;

    fn width(&self, bitmap: NativeRef) -> Option<u32>;

    fn height(&self, bitmap: NativeRef) -> Option<u32>;

    fn bits_per_pixel(&self, bitmap: NativeRef) -> Option<u32>;

    /// Bytes per scanline of the bitmap's own storage.
    fn pitch(&self, bitmap: NativeRef) -> Option<u32>;

    /// Copy the bitmap's pixels into `dest` as `bpp`-bit pixels laid out
    /// with `pitch` bytes per row. `top_down` puts the top scanline first.
    /// Returns `false` if the reference is unknown or `dest` is too small.
    #[allow(clippy::too_many_arguments)]
    fn convert_to_raw_bits(
        &self,
        dest: &mut [u8],
        bitmap: NativeRef,
        pitch: u32,
        bpp: u32,
        masks: ChannelMasks,
        top_down: bool,
    ) -> bool;

    /// Build a new bitmap from caller memory.
    #[allow(clippy::too_many_arguments)]
    fn convert_from_raw_bits(
        &self,
        src: &[u8],
        width: u32,
        height: u32,
        pitch: u32,
        bpp: u32,
        masks: ChannelMasks,
        top_down: bool,
    ) -> Option<NativeRef>;

    /// Copy the sub-rectangle `[left, right) x [top, bottom)` into a new bitmap.
    fn copy(
        &self,
        bitmap: NativeRef,
        left: u32,
        top: u32,
        right: u32,
        bottom: u32,
    ) -> Option<NativeRef>;

    fn rescale(
        &self,
        bitmap: NativeRef,
        dst_width: u32,
        dst_height: u32,
        filter: Filter,
    ) -> Option<NativeRef>;

    /// Downscale so the longest side is at most `max_dimension`.
    /// `convert` asks for high dynamic range input to come back as 8-bit.
    fn make_thumbnail(
        &self,
        bitmap: NativeRef,
        max_dimension: u32,
        convert: bool,
    ) -> Option<NativeRef>;

    /// New 24-bit (no alpha) copy of the bitmap.
    fn convert_to_24_bits(&self, bitmap: NativeRef) -> Option<NativeRef>;
}

/// Bytes per scanline for `width` pixels of `bpp` bits, padded to 32 bits.
///
/// `None` when the pitch does not fit in a `u32`.
pub fn aligned_pitch(width: u32, bpp: u32) -> Option<u32> {
    let bits = u64::from(width) * u64::from(bpp);
    u32::try_from((bits + 31) / 32 * 4).ok()
}

/// Dimensions of a thumbnail whose longest side is `max_dimension`.
///
/// Never upscales; the short side keeps the aspect ratio and is at least 1.
pub fn thumbnail_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if max_dimension == 0 || (width <= max_dimension && height <= max_dimension) {
        return (width, height);
    }
    let scale = |side: u32, longest: u32| {
        let scaled = (side as u64 * max_dimension as u64 + longest as u64 / 2) / longest as u64;
        (scaled as u32).max(1)
    };
    if width >= height {
        (max_dimension, scale(height, width))
    } else {
        (scale(width, height), max_dimension)
    }
}
