//! FFI backend over the system `libfreeimage`.
//!
//! Enabled with the `freeimage` feature. A [`NativeRef`] is the `FIBITMAP*`
//! itself. The codec records every pointer FreeImage hands back and only
//! passes recorded pointers to the library, so unknown or already-unloaded
//! references are ignored instead of reaching `free`.

use libc::{c_char, c_int, c_uint};
use std::collections::HashSet;
use std::ffi::{CStr, CString};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, Once};

use super::binding::{NativeCodec, NativeRef};
use super::flags::{ChannelMasks, Filter, LoadFlags, SaveFlags};
use super::format::ImageFormat;

#[repr(C)]
struct FiBitmap {
    _private: [u8; 0],
}

type OutputMessageFn = extern "C" fn(fif: c_int, msg: *const c_char);

#[link(name = "freeimage")]
extern "C" {
    fn FreeImage_GetFileType(filename: *const c_char, size: c_int) -> c_int;
    fn FreeImage_GetFIFFromFilename(filename: *const c_char) -> c_int;
    fn FreeImage_FIFSupportsReading(fif: c_int) -> c_int;
    fn FreeImage_FIFSupportsWriting(fif: c_int) -> c_int;
    fn FreeImage_Load(fif: c_int, filename: *const c_char, flags: c_int) -> *mut FiBitmap;
    fn FreeImage_Unload(dib: *mut FiBitmap);
    fn FreeImage_Save(fif: c_int, dib: *mut FiBitmap, filename: *const c_char, flags: c_int)
        -> c_int;
    fn FreeImage_GetWidth(dib: *mut FiBitmap) -> c_uint;
    fn FreeImage_GetHeight(dib: *mut FiBitmap) -> c_uint;
    fn FreeImage_GetBPP(dib: *mut FiBitmap) -> c_uint;
    fn FreeImage_GetPitch(dib: *mut FiBitmap) -> c_uint;
    fn FreeImage_ConvertToRawBits(
        bits: *mut u8,
        dib: *mut FiBitmap,
        pitch: c_int,
        bpp: c_uint,
        red_mask: c_uint,
        green_mask: c_uint,
        blue_mask: c_uint,
        topdown: c_int,
    );
    fn FreeImage_ConvertFromRawBits(
        bits: *mut u8,
        width: c_int,
        height: c_int,
        pitch: c_int,
        bpp: c_uint,
        red_mask: c_uint,
        green_mask: c_uint,
        blue_mask: c_uint,
        topdown: c_int,
    ) -> *mut FiBitmap;
    fn FreeImage_Copy(
        dib: *mut FiBitmap,
        left: c_int,
        top: c_int,
        right: c_int,
        bottom: c_int,
    ) -> *mut FiBitmap;
    fn FreeImage_Rescale(
        dib: *mut FiBitmap,
        dst_width: c_int,
        dst_height: c_int,
        filter: c_int,
    ) -> *mut FiBitmap;
    fn FreeImage_MakeThumbnail(dib: *mut FiBitmap, max_pixel_size: c_int, convert: c_int)
        -> *mut FiBitmap;
    fn FreeImage_ConvertTo24Bits(dib: *mut FiBitmap) -> *mut FiBitmap;
    fn FreeImage_SetOutputMessage(omf: OutputMessageFn);
}

extern "C" fn output_message(fif: c_int, msg: *const c_char) {
    let text = if msg.is_null() {
        "(no message)".into()
    } else {
        // SAFETY: FreeImage passes a NUL-terminated string valid for the call.
        unsafe { CStr::from_ptr(msg) }.to_string_lossy()
    };
    log::warn!("freeimage [{}]: {}", ImageFormat::from_id(fif), text);
}

static INSTALL_OUTPUT_MESSAGE: Once = Once::new();

/// Codec backend that calls into `libfreeimage`.
pub struct FreeImageCodec {
    live: Mutex<HashSet<usize>>,
}

impl Default for FreeImageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FreeImageCodec {
    /// Create the backend and route FreeImage diagnostics into `log`.
    pub fn new() -> Self {
        INSTALL_OUTPUT_MESSAGE.call_once(|| {
            // SAFETY: the callback is a plain extern fn that outlives the process.
            unsafe { FreeImage_SetOutputMessage(output_message) };
        });
        Self {
            live: Mutex::new(HashSet::new()),
        }
    }

    /// Number of bitmaps allocated through this codec and not yet unloaded.
    pub fn live_bitmaps(&self) -> usize {
        self.registry().len()
    }

    fn registry(&self) -> MutexGuard<'_, HashSet<usize>> {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a pointer FreeImage just allocated. Null maps to `None`.
    fn track(&self, ptr: *mut FiBitmap) -> Option<NativeRef> {
        let bitmap = NativeRef::from_raw(ptr as usize)?;
        self.registry().insert(bitmap.as_raw());
        log::debug!("freeimage: allocated {:?}", bitmap);
        Some(bitmap)
    }

    /// Run `f` on the bitmap's pointer if this codec allocated it and it is
    /// still live. The registry stays locked for the call so a concurrent
    /// unload cannot free the bitmap underneath it.
    fn with_dib<T>(&self, bitmap: NativeRef, f: impl FnOnce(*mut FiBitmap) -> T) -> Option<T> {
        let live = self.registry();
        if !live.contains(&bitmap.as_raw()) {
            log::warn!("freeimage: unknown bitmap {:?}", bitmap);
            return None;
        }
        Some(f(bitmap.as_raw() as *mut FiBitmap))
    }
}

fn c_path(path: &Path) -> Option<CString> {
    let text = path.to_str()?;
    CString::new(text).ok()
}

fn to_int(value: u32) -> Option<c_int> {
    c_int::try_from(value).ok()
}

impl NativeCodec for FreeImageCodec {
    fn detect_format(&self, path: &Path, sniff_len: usize) -> ImageFormat {
        let (Some(name), Ok(size)) = (c_path(path), c_int::try_from(sniff_len)) else {
            return ImageFormat::Unknown;
        };
        // SAFETY: `name` is a valid C string for the duration of the call.
        ImageFormat::from_id(unsafe { FreeImage_GetFileType(name.as_ptr(), size) })
    }

    fn format_from_filename(&self, path: &Path) -> ImageFormat {
        let Some(name) = c_path(path) else {
            return ImageFormat::Unknown;
        };
        // SAFETY: `name` is a valid C string for the duration of the call.
        ImageFormat::from_id(unsafe { FreeImage_GetFIFFromFilename(name.as_ptr()) })
    }

    fn supports_read(&self, format: ImageFormat) -> bool {
        // SAFETY: pure query on an integer id.
        !format.is_unknown() && unsafe { FreeImage_FIFSupportsReading(format.id()) } != 0
    }

    fn supports_write(&self, format: ImageFormat) -> bool {
        // SAFETY: pure query on an integer id.
        !format.is_unknown() && unsafe { FreeImage_FIFSupportsWriting(format.id()) } != 0
    }

    fn load(&self, format: ImageFormat, path: &Path, flags: LoadFlags) -> Option<NativeRef> {
        let name = c_path(path)?;
        // SAFETY: `name` is a valid C string; a null result is mapped to None.
        self.track(unsafe { FreeImage_Load(format.id(), name.as_ptr(), flags.bits()) })
    }

    fn unload(&self, bitmap: NativeRef) {
        let mut live = self.registry();
        if !live.remove(&bitmap.as_raw()) {
            log::debug!("freeimage: unload of unknown {:?} ignored", bitmap);
            return;
        }
        // SAFETY: the pointer was live and has just left the registry, so no
        // other call can reach it again.
        unsafe { FreeImage_Unload(bitmap.as_raw() as *mut FiBitmap) };
        log::debug!("freeimage: released {:?}", bitmap);
    }

    fn save(&self, format: ImageFormat, bitmap: NativeRef, path: &Path, flags: SaveFlags) -> bool {
        let Some(name) = c_path(path) else {
            return false;
        };
        self.with_dib(bitmap, |dib| {
            // SAFETY: live bitmap, valid C string.
            unsafe { FreeImage_Save(format.id(), dib, name.as_ptr(), flags.bits()) != 0 }
        })
        .unwrap_or(false)
    }

    fn width(&self, bitmap: NativeRef) -> Option<u32> {
        // SAFETY: live bitmap.
        self.with_dib(bitmap, |dib| unsafe { FreeImage_GetWidth(dib) })
    }

    fn height(&self, bitmap: NativeRef) -> Option<u32> {
        // SAFETY: live bitmap.
        self.with_dib(bitmap, |dib| unsafe { FreeImage_GetHeight(dib) })
    }

    fn bits_per_pixel(&self, bitmap: NativeRef) -> Option<u32> {
        // SAFETY: live bitmap.
        self.with_dib(bitmap, |dib| unsafe { FreeImage_GetBPP(dib) })
    }

    fn pitch(&self, bitmap: NativeRef) -> Option<u32> {
        // SAFETY: live bitmap.
        self.with_dib(bitmap, |dib| unsafe { FreeImage_GetPitch(dib) })
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
        let (Some(height), Some(c_pitch)) = (self.height(bitmap), to_int(pitch)) else {
            return false;
        };
        if dest.len() < pitch as usize * height as usize {
            return false;
        }
        self.with_dib(bitmap, |dib| {
            // SAFETY: live bitmap; `dest` holds `pitch * height` bytes, which is
            // all FreeImage writes.
            unsafe {
                FreeImage_ConvertToRawBits(
                    dest.as_mut_ptr(),
                    dib,
                    c_pitch,
                    bpp,
                    masks.red,
                    masks.green,
                    masks.blue,
                    top_down as c_int,
                )
            };
        })
        .is_some()
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
        if src.len() < pitch as usize * height as usize {
            return None;
        }
        // SAFETY: FreeImage only reads `pitch * height` bytes from `src`; the
        // mutable cast is an artifact of its C signature.
        self.track(unsafe {
            FreeImage_ConvertFromRawBits(
                src.as_ptr() as *mut u8,
                to_int(width)?,
                to_int(height)?,
                to_int(pitch)?,
                bpp,
                masks.red,
                masks.green,
                masks.blue,
                top_down as c_int,
            )
        })
    }

    fn copy(
        &self,
        bitmap: NativeRef,
        left: u32,
        top: u32,
        right: u32,
        bottom: u32,
    ) -> Option<NativeRef> {
        let (l, t, r, b) = (to_int(left)?, to_int(top)?, to_int(right)?, to_int(bottom)?);
        // SAFETY: live bitmap; FreeImage validates the rectangle.
        let copied = self.with_dib(bitmap, |dib| unsafe { FreeImage_Copy(dib, l, t, r, b) })?;
        self.track(copied)
    }

    fn rescale(
        &self,
        bitmap: NativeRef,
        dst_width: u32,
        dst_height: u32,
        filter: Filter,
    ) -> Option<NativeRef> {
        let (w, h) = (to_int(dst_width)?, to_int(dst_height)?);
        // SAFETY: live bitmap.
        let scaled =
            self.with_dib(bitmap, |dib| unsafe { FreeImage_Rescale(dib, w, h, filter.id()) })?;
        self.track(scaled)
    }

    fn make_thumbnail(
        &self,
        bitmap: NativeRef,
        max_dimension: u32,
        convert: bool,
    ) -> Option<NativeRef> {
        let max = to_int(max_dimension)?;
        // SAFETY: live bitmap.
        let thumb = self.with_dib(bitmap, |dib| unsafe {
            FreeImage_MakeThumbnail(dib, max, convert as c_int)
        })?;
        self.track(thumb)
    }

    fn convert_to_24_bits(&self, bitmap: NativeRef) -> Option<NativeRef> {
        // SAFETY: live bitmap.
        let flat = self.with_dib(bitmap, |dib| unsafe { FreeImage_ConvertTo24Bits(dib) })?;
        self.track(flat)
    }
}
