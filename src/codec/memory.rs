//! In-process codec backend built on the `image` crate.
//!
//! Bitmaps live in a handle table owned by the codec; a [`NativeRef`] is just
//! a key into that table. Resampling goes through `fast_image_resize`, with
//! `image`'s own resizer as a fallback.

use fast_image_resize as fr;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{ColorType, DynamicImage, GrayImage, ImageReader, RgbImage, RgbaImage};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::binding::{aligned_pitch, thumbnail_dimensions, NativeCodec, NativeRef};
use super::flags::{ChannelMasks, Filter, LoadFlags, SaveFlags};
use super::format::ImageFormat;

/// Bytes read from the head of a file when the caller leaves it to us.
const DEFAULT_SNIFF_LEN: usize = 64;

const READABLE: &[ImageFormat] = &[
    ImageFormat::Bmp,
    ImageFormat::Ico,
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Pbm,
    ImageFormat::PbmRaw,
    ImageFormat::Pgm,
    ImageFormat::PgmRaw,
    ImageFormat::Ppm,
    ImageFormat::PpmRaw,
    ImageFormat::Targa,
    ImageFormat::Tiff,
    ImageFormat::Gif,
    ImageFormat::Hdr,
    ImageFormat::Exr,
    ImageFormat::Dds,
];

const WRITABLE: &[ImageFormat] = &[
    ImageFormat::Bmp,
    ImageFormat::Ico,
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Pgm,
    ImageFormat::PgmRaw,
    ImageFormat::Ppm,
    ImageFormat::PpmRaw,
    ImageFormat::Targa,
    ImageFormat::Tiff,
    ImageFormat::Gif,
];

/// Codec backend that keeps decoded bitmaps in process memory.
pub struct MemoryCodec {
    bitmaps: Mutex<HashMap<usize, DynamicImage>>,
    next_id: AtomicUsize,
}

impl Default for MemoryCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCodec {
    pub fn new() -> Self {
        Self {
            bitmaps: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Number of bitmaps currently allocated.
    pub fn live_bitmaps(&self) -> usize {
        self.table().len()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<usize, DynamicImage>> {
        self.bitmaps.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn insert(&self, image: DynamicImage) -> Option<NativeRef> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let bitmap = NativeRef::from_raw(id)?;
        self.table().insert(id, image);
        log::debug!("memory codec: allocated {:?}", bitmap);
        Some(bitmap)
    }

    fn with_bitmap<T>(&self, bitmap: NativeRef, f: impl FnOnce(&DynamicImage) -> T) -> Option<T> {
        let table = self.table();
        let image = table.get(&bitmap.as_raw());
        if image.is_none() {
            log::warn!("memory codec: unknown bitmap {:?}", bitmap);
        }
        image.map(f)
    }

    /// Run `f` on the bitmap and store its result as a new bitmap.
    fn derive(
        &self,
        bitmap: NativeRef,
        f: impl FnOnce(&DynamicImage) -> Option<DynamicImage>,
    ) -> Option<NativeRef> {
        let derived = self.with_bitmap(bitmap, f)??;
        self.insert(derived)
    }
}

impl NativeCodec for MemoryCodec {
    fn detect_format(&self, path: &Path, sniff_len: usize) -> ImageFormat {
        let len = if sniff_len == 0 { DEFAULT_SNIFF_LEN } else { sniff_len };
        let Some(head) = read_head(path, len) else {
            return ImageFormat::Unknown;
        };

        if let Ok(guessed) = image::guess_format(&head) {
            return match guessed {
                image::ImageFormat::Pnm => pnm_variant(&head),
                other => from_image_format(other),
            };
        }

        // Some formats (TGA) carry no magic; trust the extension only if
        // the header actually parses as that format.
        let candidate = self.format_from_filename(path);
        let Some(target) = to_image_format(candidate) else {
            return ImageFormat::Unknown;
        };
        let parses = ImageReader::open(path)
            .map(|mut reader| {
                reader.set_format(target);
                reader.into_dimensions().is_ok()
            })
            .unwrap_or(false);
        if parses {
            candidate
        } else {
            ImageFormat::Unknown
        }
    }

    fn format_from_filename(&self, path: &Path) -> ImageFormat {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return ImageFormat::Unknown;
        };
        match ext.to_ascii_lowercase().as_str() {
            "pbm" => ImageFormat::PbmRaw,
            "pgm" => ImageFormat::PgmRaw,
            "ppm" => ImageFormat::PpmRaw,
            other => ImageFormat::from_symbol(other)
                .or_else(|| image::ImageFormat::from_extension(other).map(from_image_format))
                .unwrap_or(ImageFormat::Unknown),
        }
    }

    fn supports_read(&self, format: ImageFormat) -> bool {
        READABLE.contains(&format)
    }

    fn supports_write(&self, format: ImageFormat) -> bool {
        WRITABLE.contains(&format)
    }

    fn load(&self, format: ImageFormat, path: &Path, flags: LoadFlags) -> Option<NativeRef> {
        if !self.supports_read(format) {
            log::warn!("memory codec: {} is not readable", format);
            return None;
        }
        let target = to_image_format(format)?;
        if flags != LoadFlags::DEFAULT {
            log::debug!("memory codec: ignoring load flags {:#x}", flags.bits());
        }

        let decoded = ImageReader::open(path)
            .map_err(image::ImageError::from)
            .and_then(|mut reader| {
                reader.set_format(target);
                reader.decode()
            });
        match decoded {
            Ok(image) => self.insert(image),
            Err(e) => {
                log::warn!("memory codec: failed to load {}: {}", path.display(), e);
                None
            }
        }
    }

    fn unload(&self, bitmap: NativeRef) {
        if self.table().remove(&bitmap.as_raw()).is_some() {
            log::debug!("memory codec: released {:?}", bitmap);
        } else {
            log::debug!("memory codec: unload of unknown {:?} ignored", bitmap);
        }
    }

    fn save(&self, format: ImageFormat, bitmap: NativeRef, path: &Path, flags: SaveFlags) -> bool {
        if !self.supports_write(format) {
            log::warn!("memory codec: {} is not writable", format);
            return false;
        }
        let result = self.with_bitmap(bitmap, |image| encode(image, format, path, flags));
        match result {
            Some(Ok(())) => true,
            Some(Err(e)) => {
                log::warn!("memory codec: failed to save {}: {}", path.display(), e);
                false
            }
            None => false,
        }
    }

    fn width(&self, bitmap: NativeRef) -> Option<u32> {
        self.with_bitmap(bitmap, |image| image.width())
    }

    fn height(&self, bitmap: NativeRef) -> Option<u32> {
        self.with_bitmap(bitmap, |image| image.height())
    }

    fn bits_per_pixel(&self, bitmap: NativeRef) -> Option<u32> {
        self.with_bitmap(bitmap, |image| image.color().bits_per_pixel() as u32)
    }

    fn pitch(&self, bitmap: NativeRef) -> Option<u32> {
        self.with_bitmap(bitmap, |image| {
            aligned_pitch(image.width(), image.color().bits_per_pixel() as u32)
        })
        .flatten()
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
        self.with_bitmap(bitmap, |image| {
            write_raw_bits(dest, image, pitch as usize, bpp, masks, top_down)
        })
        .unwrap_or(false)
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
        match read_raw_bits(src, width, height, pitch as usize, bpp, masks, top_down) {
            Some(image) => self.insert(image),
            None => {
                log::warn!(
                    "memory codec: rejected raw buffer ({} bytes, {}x{}, pitch {}, {} bpp)",
                    src.len(),
                    width,
                    height,
                    pitch,
                    bpp
                );
                None
            }
        }
    }

    fn copy(
        &self,
        bitmap: NativeRef,
        left: u32,
        top: u32,
        right: u32,
        bottom: u32,
    ) -> Option<NativeRef> {
        self.derive(bitmap, |image| {
            if right <= left || bottom <= top || right > image.width() || bottom > image.height() {
                return None;
            }
            Some(image.crop_imm(left, top, right - left, bottom - top))
        })
    }

    fn rescale(
        &self,
        bitmap: NativeRef,
        dst_width: u32,
        dst_height: u32,
        filter: Filter,
    ) -> Option<NativeRef> {
        if dst_width == 0 || dst_height == 0 {
            return None;
        }
        self.derive(bitmap, |image| Some(resize(image, dst_width, dst_height, filter)))
    }

    fn make_thumbnail(
        &self,
        bitmap: NativeRef,
        max_dimension: u32,
        convert: bool,
    ) -> Option<NativeRef> {
        if max_dimension == 0 {
            return None;
        }
        self.derive(bitmap, |image| {
            let source = if convert && !is_8_bit(image.color()) {
                to_8_bit(image)
            } else {
                image.clone()
            };
            let (width, height) =
                thumbnail_dimensions(source.width(), source.height(), max_dimension);
            if (width, height) == (source.width(), source.height()) {
                Some(source)
            } else {
                Some(resize(&source, width, height, Filter::Bilinear))
            }
        })
    }

    fn convert_to_24_bits(&self, bitmap: NativeRef) -> Option<NativeRef> {
        self.derive(bitmap, |image| Some(DynamicImage::ImageRgb8(image.to_rgb8())))
    }
}

fn read_head(path: &Path, len: usize) -> Option<Vec<u8>> {
    let file = File::open(path).ok()?;
    let mut head = Vec::with_capacity(len);
    file.take(len as u64).read_to_end(&mut head).ok()?;
    Some(head)
}

/// Refine a PNM guess using the `P1`..`P6` magic.
fn pnm_variant(head: &[u8]) -> ImageFormat {
    match head.get(..2) {
        Some(b"P1") => ImageFormat::Pbm,
        Some(b"P2") => ImageFormat::Pgm,
        Some(b"P3") => ImageFormat::Ppm,
        Some(b"P4") => ImageFormat::PbmRaw,
        Some(b"P5") => ImageFormat::PgmRaw,
        Some(b"P6") => ImageFormat::PpmRaw,
        _ => ImageFormat::Unknown,
    }
}

fn to_image_format(format: ImageFormat) -> Option<image::ImageFormat> {
    match format {
        ImageFormat::Bmp => Some(image::ImageFormat::Bmp),
        ImageFormat::Ico => Some(image::ImageFormat::Ico),
        ImageFormat::Jpeg => Some(image::ImageFormat::Jpeg),
        ImageFormat::Png => Some(image::ImageFormat::Png),
        ImageFormat::Pbm
        | ImageFormat::PbmRaw
        | ImageFormat::Pgm
        | ImageFormat::PgmRaw
        | ImageFormat::Ppm
        | ImageFormat::PpmRaw => Some(image::ImageFormat::Pnm),
        ImageFormat::Targa => Some(image::ImageFormat::Tga),
        ImageFormat::Tiff => Some(image::ImageFormat::Tiff),
        ImageFormat::Gif => Some(image::ImageFormat::Gif),
        ImageFormat::Hdr => Some(image::ImageFormat::Hdr),
        ImageFormat::Exr => Some(image::ImageFormat::OpenExr),
        ImageFormat::Dds => Some(image::ImageFormat::Dds),
        _ => None,
    }
}

fn from_image_format(format: image::ImageFormat) -> ImageFormat {
    match format {
        image::ImageFormat::Bmp => ImageFormat::Bmp,
        image::ImageFormat::Ico => ImageFormat::Ico,
        image::ImageFormat::Jpeg => ImageFormat::Jpeg,
        image::ImageFormat::Png => ImageFormat::Png,
        image::ImageFormat::Pnm => ImageFormat::PpmRaw,
        image::ImageFormat::Tga => ImageFormat::Targa,
        image::ImageFormat::Tiff => ImageFormat::Tiff,
        image::ImageFormat::Gif => ImageFormat::Gif,
        image::ImageFormat::Hdr => ImageFormat::Hdr,
        image::ImageFormat::OpenExr => ImageFormat::Exr,
        image::ImageFormat::Dds => ImageFormat::Dds,
        _ => ImageFormat::Unknown,
    }
}

fn is_8_bit(color: ColorType) -> bool {
    matches!(
        color,
        ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8
    )
}

fn to_8_bit(image: &DynamicImage) -> DynamicImage {
    if image.color().has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    }
}

/// Bring a resized RGBA result back to the source's channel layout.
fn restore_color(resized: DynamicImage, color: ColorType) -> DynamicImage {
    match color {
        ColorType::L8 => DynamicImage::ImageLuma8(resized.to_luma8()),
        ColorType::La8 => DynamicImage::ImageLumaA8(resized.to_luma_alpha8()),
        ColorType::Rgb8 => DynamicImage::ImageRgb8(resized.to_rgb8()),
        _ => resized,
    }
}

fn resize(image: &DynamicImage, width: u32, height: u32, filter: Filter) -> DynamicImage {
    match resize_with_fast_image_resize(image, width, height, filter) {
        Ok(resized) => restore_color(resized, image.color()),
        Err(err) => {
            log::warn!(
                "memory codec: fast_image_resize failed, falling back to image::resize_exact: {}",
                err
            );
            image.resize_exact(width, height, to_image_filter(filter))
        }
    }
}

fn resize_with_fast_image_resize(
    image: &DynamicImage,
    width: u32,
    height: u32,
    filter: Filter,
) -> Result<DynamicImage, String> {
    let src = image.to_rgba8();
    let (src_width, src_height) = src.dimensions();

    let src_image =
        fr::images::Image::from_vec_u8(src_width, src_height, src.into_raw(), fr::PixelType::U8x4)
            .map_err(|e| format!("failed to build source buffer: {}", e))?;

    let mut dst_image = fr::images::Image::new(width, height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options =
        fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(to_fast_filter(filter)));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| format!("resize failed: {}", e))?;

    let rgba = RgbaImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| "resized buffer has an unexpected length".to_string())?;

    Ok(DynamicImage::ImageRgba8(rgba))
}

fn to_fast_filter(filter: Filter) -> fr::FilterType {
    match filter {
        Filter::Box => fr::FilterType::Box,
        Filter::Bicubic => fr::FilterType::Mitchell,
        Filter::Bilinear => fr::FilterType::Bilinear,
        Filter::BSpline => fr::FilterType::Gaussian,
        Filter::CatmullRom => fr::FilterType::CatmullRom,
        Filter::Lanczos3 => fr::FilterType::Lanczos3,
    }
}

fn to_image_filter(filter: Filter) -> image::imageops::FilterType {
    match filter {
        Filter::Box => image::imageops::FilterType::Nearest,
        Filter::Bilinear => image::imageops::FilterType::Triangle,
        Filter::Bicubic | Filter::CatmullRom => image::imageops::FilterType::CatmullRom,
        Filter::BSpline => image::imageops::FilterType::Gaussian,
        Filter::Lanczos3 => image::imageops::FilterType::Lanczos3,
    }
}

/// Scanline `y` of an image of `height` rows, in destination order.
fn dest_row(y: u32, height: u32, top_down: bool) -> usize {
    if top_down {
        y as usize
    } else {
        (height - 1 - y) as usize
    }
}

fn write_raw_bits(
    dest: &mut [u8],
    image: &DynamicImage,
    pitch: usize,
    bpp: u32,
    masks: ChannelMasks,
    top_down: bool,
) -> bool {
    let (width, height) = (image.width(), image.height());
    let bytes_pp = (bpp / 8) as usize;
    if !matches!(bpp, 8 | 24 | 32)
        || pitch < width as usize * bytes_pp
        || dest.len() < pitch * height as usize
    {
        return false;
    }

    if bpp == 8 {
        let gray = image.to_luma8();
        for (y, row) in gray.rows().enumerate() {
            let start = dest_row(y as u32, height, top_down) * pitch;
            for (x, pixel) in row.enumerate() {
                dest[start + x] = pixel[0];
            }
        }
        return true;
    }

    let Some((r_off, g_off, b_off, a_off)) = masks.byte_offsets() else {
        return false;
    };
    if bpp == 24 && (r_off > 2 || g_off > 2 || b_off > 2) {
        return false;
    }

    let rgba = image.to_rgba8();
    for (y, row) in rgba.rows().enumerate() {
        let start = dest_row(y as u32, height, top_down) * pitch;
        for (x, pixel) in row.enumerate() {
            let base = start + x * bytes_pp;
            dest[base + r_off] = pixel[0];
            dest[base + g_off] = pixel[1];
            dest[base + b_off] = pixel[2];
            if bpp == 32 {
                dest[base + a_off] = pixel[3];
            }
        }
    }
    true
}

fn read_raw_bits(
    src: &[u8],
    width: u32,
    height: u32,
    pitch: usize,
    bpp: u32,
    masks: ChannelMasks,
    top_down: bool,
) -> Option<DynamicImage> {
    let bytes_pp = (bpp / 8) as usize;
    if width == 0
        || height == 0
        || !matches!(bpp, 8 | 24 | 32)
        || pitch < width as usize * bytes_pp
        || src.len() < pitch * height as usize
    {
        return None;
    }

    let source_row = |y: u32| {
        let start = dest_row(y, height, top_down) * pitch;
        &src[start..start + width as usize * bytes_pp]
    };

    if bpp == 8 {
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            data.extend_from_slice(source_row(y));
        }
        return GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8);
    }

    let (r_off, g_off, b_off, a_off) = masks.byte_offsets()?;
    if bpp == 24 {
        if r_off > 2 || g_off > 2 || b_off > 2 {
            return None;
        }
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for px in source_row(y).chunks_exact(3) {
                data.extend_from_slice(&[px[r_off], px[g_off], px[b_off]]);
            }
        }
        return RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8);
    }

    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for px in source_row(y).chunks_exact(4) {
            data.extend_from_slice(&[px[r_off], px[g_off], px[b_off], px[a_off]]);
        }
    }
    RgbaImage::from_raw(width, height, data).map(DynamicImage::ImageRgba8)
}

fn encode(
    image: &DynamicImage,
    format: ImageFormat,
    path: &Path,
    flags: SaveFlags,
) -> image::ImageResult<()> {
    // Encode fully in memory so a failed encode leaves the target untouched.
    let mut writer = Cursor::new(Vec::new());

    match format {
        ImageFormat::Jpeg => {
            if flags.contains(SaveFlags::JPEG_PROGRESSIVE) {
                log::debug!("memory codec: progressive JPEG unavailable, writing baseline");
            }
            let encoder = JpegEncoder::new_with_quality(&mut writer, flags.jpeg_quality());
            match image.color() {
                ColorType::L8 | ColorType::Rgb8 => image.write_with_encoder(encoder)?,
                _ => DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?,
            }
        }
        ImageFormat::Pgm | ImageFormat::PgmRaw => {
            let encoding = pnm_encoding(format, flags);
            let encoder = PnmEncoder::new(&mut writer).with_subtype(PnmSubtype::Graymap(encoding));
            if is_16_bit(image.color()) {
                DynamicImage::ImageLuma16(image.to_luma16()).write_with_encoder(encoder)?;
            } else {
                DynamicImage::ImageLuma8(image.to_luma8()).write_with_encoder(encoder)?;
            }
        }
        ImageFormat::Ppm | ImageFormat::PpmRaw => {
            let encoding = pnm_encoding(format, flags);
            let encoder = PnmEncoder::new(&mut writer).with_subtype(PnmSubtype::Pixmap(encoding));
            if is_16_bit(image.color()) {
                DynamicImage::ImageRgb16(image.to_rgb16()).write_with_encoder(encoder)?;
            } else {
                DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
            }
        }
        ImageFormat::Gif => {
            DynamicImage::ImageRgba8(image.to_rgba8())
                .write_to(&mut writer, image::ImageFormat::Gif)?;
        }
        other => {
            let Some(target) = to_image_format(other) else {
                return Err(image::ImageError::Unsupported(
                    image::error::UnsupportedError::from_format_and_kind(
                        image::error::ImageFormatHint::Unknown,
                        image::error::UnsupportedErrorKind::GenericFeature(other.to_string()),
                    ),
                ));
            };
            let keeps_wide = matches!(other, ImageFormat::Png | ImageFormat::Tiff);
            let color = image.color();
            let is_float = matches!(color, ColorType::Rgb32F | ColorType::Rgba32F);
            if is_float || (!keeps_wide && !is_8_bit(color)) {
                to_8_bit(image).write_to(&mut writer, target)?;
            } else {
                image.write_to(&mut writer, target)?;
            }
        }
    }

    std::fs::write(path, writer.into_inner())?;
    Ok(())
}

fn is_16_bit(color: ColorType) -> bool {
    matches!(
        color,
        ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16
    )
}

fn pnm_encoding(format: ImageFormat, flags: SaveFlags) -> SampleEncoding {
    let ascii = matches!(format, ImageFormat::Pgm | ImageFormat::Ppm)
        || flags.contains(SaveFlags::PNM_SAVE_ASCII);
    if ascii {
        SampleEncoding::Ascii
    } else {
        SampleEncoding::Binary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(codec: &MemoryCodec) -> NativeRef {
        // 2x2 BGRA: red, green / blue, white
        let pixels: [u8; 16] = [
            0, 0, 255, 255, 0, 255, 0, 255, //
            255, 0, 0, 255, 255, 255, 255, 255,
        ];
        codec
            .convert_from_raw_bits(&pixels, 2, 2, 8, 32, ChannelMasks::RGBA, true)
            .unwrap()
    }

    #[test]
    fn test_from_raw_bits_reports_dimensions() {
        let codec = MemoryCodec::new();
        let bitmap = checker(&codec);
        assert_eq!(codec.width(bitmap), Some(2));
        assert_eq!(codec.height(bitmap), Some(2));
        assert_eq!(codec.bits_per_pixel(bitmap), Some(32));
        assert_eq!(codec.pitch(bitmap), Some(8));
        codec.unload(bitmap);
    }

    #[test]
    fn test_raw_bits_roundtrip_top_down() {
        let codec = MemoryCodec::new();
        let bitmap = checker(&codec);
        let mut out = vec![0u8; 16];
        assert!(codec.convert_to_raw_bits(&mut out, bitmap, 8, 32, ChannelMasks::RGBA, true));
        assert_eq!(
            out,
            vec![0, 0, 255, 255, 0, 255, 0, 255, 255, 0, 0, 255, 255, 255, 255, 255]
        );
        codec.unload(bitmap);
    }

    #[test]
    fn test_raw_bits_bottom_up_flips_rows() {
        let codec = MemoryCodec::new();
        let bitmap = checker(&codec);
        let mut out = vec![0u8; 16];
        assert!(codec.convert_to_raw_bits(&mut out, bitmap, 8, 32, ChannelMasks::RGBA, false));
        assert_eq!(&out[..8], &[255, 0, 0, 255, 255, 255, 255, 255]);
        assert_eq!(&out[8..], &[0, 0, 255, 255, 0, 255, 0, 255]);
        codec.unload(bitmap);
    }

    #[test]
    fn test_raw_bits_honors_padded_pitch() {
        let codec = MemoryCodec::new();
        let bitmap = checker(&codec);
        let mut out = vec![0xAAu8; 24];
        assert!(codec.convert_to_raw_bits(&mut out, bitmap, 12, 32, ChannelMasks::RGBA, true));
        assert_eq!(&out[8..12], &[0xAA; 4]);
        assert_eq!(&out[12..16], &[255, 0, 0, 255]);
        codec.unload(bitmap);
    }

    #[test]
    fn test_raw_bits_rejects_short_destination() {
        let codec = MemoryCodec::new();
        let bitmap = checker(&codec);
        let mut out = vec![0u8; 15];
        assert!(!codec.convert_to_raw_bits(&mut out, bitmap, 8, 32, ChannelMasks::RGBA, true));
        codec.unload(bitmap);
    }

    #[test]
    fn test_from_raw_bits_rejects_short_source() {
        let codec = MemoryCodec::new();
        assert!(codec
            .convert_from_raw_bits(&[0; 15], 2, 2, 8, 32, ChannelMasks::RGBA, true)
            .is_none());
        assert_eq!(codec.live_bitmaps(), 0);
    }

    #[test]
    fn test_unload_unknown_is_noop() {
        let codec = MemoryCodec::new();
        let bitmap = checker(&codec);
        codec.unload(bitmap);
        codec.unload(bitmap);
        assert_eq!(codec.live_bitmaps(), 0);
        assert_eq!(codec.width(bitmap), None);
    }

    #[test]
    fn test_copy_is_independent_bitmap() {
        let codec = MemoryCodec::new();
        let bitmap = checker(&codec);
        let cropped = codec.copy(bitmap, 1, 0, 2, 2).unwrap();
        assert_ne!(cropped, bitmap);
        codec.unload(bitmap);
        assert_eq!(codec.width(cropped), Some(1));
        assert_eq!(codec.height(cropped), Some(2));
        codec.unload(cropped);
        assert_eq!(codec.live_bitmaps(), 0);
    }

    #[test]
    fn test_copy_rejects_degenerate_rect() {
        let codec = MemoryCodec::new();
        let bitmap = checker(&codec);
        assert!(codec.copy(bitmap, 1, 0, 1, 2).is_none());
        assert!(codec.copy(bitmap, 0, 0, 3, 2).is_none());
        assert_eq!(codec.live_bitmaps(), 1);
        codec.unload(bitmap);
    }

    #[test]
    fn test_rescale_keeps_channel_layout() {
        let codec = MemoryCodec::new();
        let bitmap = checker(&codec);
        let rgb = codec.convert_to_24_bits(bitmap).unwrap();
        let scaled = codec.rescale(rgb, 4, 6, Filter::Lanczos3).unwrap();
        assert_eq!(codec.width(scaled), Some(4));
        assert_eq!(codec.height(scaled), Some(6));
        assert_eq!(codec.bits_per_pixel(scaled), Some(24));
        for b in [bitmap, rgb, scaled] {
            codec.unload(b);
        }
    }

    #[test]
    fn test_rescale_to_zero_fails() {
        let codec = MemoryCodec::new();
        let bitmap = checker(&codec);
        assert!(codec.rescale(bitmap, 0, 2, Filter::Box).is_none());
        codec.unload(bitmap);
    }

    #[test]
    fn test_thumbnail_fits_longest_side() {
        let codec = MemoryCodec::new();
        let wide = codec
            .convert_from_raw_bits(&vec![128u8; 8 * 4 * 4], 8, 4, 32, 32, ChannelMasks::RGBA, true)
            .unwrap();
        let thumb = codec.make_thumbnail(wide, 4, true).unwrap();
        assert_eq!(codec.width(thumb), Some(4));
        assert_eq!(codec.height(thumb), Some(2));
        codec.unload(wide);
        codec.unload(thumb);
    }

    #[test]
    fn test_convert_to_24_bits_drops_alpha() {
        let codec = MemoryCodec::new();
        let bitmap = checker(&codec);
        let rgb = codec.convert_to_24_bits(bitmap).unwrap();
        assert_eq!(codec.bits_per_pixel(rgb), Some(24));
        assert_eq!(codec.bits_per_pixel(bitmap), Some(32));
        codec.unload(bitmap);
        codec.unload(rgb);
    }

    #[test]
    fn test_pnm_variant_magic() {
        assert_eq!(pnm_variant(b"P6\n1 1\n255\n"), ImageFormat::PpmRaw);
        assert_eq!(pnm_variant(b"P5"), ImageFormat::PgmRaw);
        assert_eq!(pnm_variant(b"P1"), ImageFormat::Pbm);
        assert_eq!(pnm_variant(b"P7"), ImageFormat::Unknown);
    }

    #[test]
    fn test_format_from_filename() {
        let codec = MemoryCodec::new();
        assert_eq!(codec.format_from_filename(Path::new("a.png")), ImageFormat::Png);
        assert_eq!(codec.format_from_filename(Path::new("a.JPG")), ImageFormat::Jpeg);
        assert_eq!(codec.format_from_filename(Path::new("a.tga")), ImageFormat::Targa);
        assert_eq!(codec.format_from_filename(Path::new("a.ppm")), ImageFormat::PpmRaw);
        assert_eq!(codec.format_from_filename(Path::new("a")), ImageFormat::Unknown);
        assert_eq!(codec.format_from_filename(Path::new("a.xyz")), ImageFormat::Unknown);
    }

    #[test]
    fn test_support_tables() {
        let codec = MemoryCodec::new();
        assert!(codec.supports_read(ImageFormat::Png));
        assert!(codec.supports_write(ImageFormat::Jpeg));
        assert!(codec.supports_read(ImageFormat::Hdr));
        assert!(!codec.supports_write(ImageFormat::Hdr));
        assert!(!codec.supports_read(ImageFormat::Unknown));
        assert!(!codec.supports_write(ImageFormat::Psd));
    }

    #[test]
    fn test_failed_encode_keeps_existing_file() {
        let codec = MemoryCodec::new();
        let pixels = vec![0u8; 300 * 4];
        let wide = codec
            .convert_from_raw_bits(&pixels, 300, 1, 1200, 32, ChannelMasks::RGBA, true)
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keep.ico");
        std::fs::write(&path, b"original").unwrap();

        // ICO frames are capped at 256 pixels a side
        assert!(!codec.save(ImageFormat::Ico, wide, &path, SaveFlags::DEFAULT));
        assert_eq!(std::fs::read(&path).unwrap(), b"original");
        codec.unload(wide);
    }

    #[test]
    fn test_sixteen_bit_pnm_keeps_depth() {
        let codec = MemoryCodec::new();
        let dir = tempfile::tempdir().unwrap();
        let cases: [(&str, &[u8], ImageFormat, u32); 2] = [
            (
                "wide.ppm",
                b"P6\n2 1\n65535\n\x12\x34\x56\x78\x9a\xbc\xde\xf0\x01\x02\x03\x04",
                ImageFormat::PpmRaw,
                48,
            ),
            (
                "wide.pgm",
                b"P5\n2 1\n65535\n\x12\x34\xab\xcd",
                ImageFormat::PgmRaw,
                16,
            ),
        ];

        for (name, bytes, format, bpp) in cases {
            let path = dir.path().join(name);
            std::fs::write(&path, bytes).unwrap();
            let bitmap = codec.load(format, &path, LoadFlags::DEFAULT).unwrap();
            assert_eq!(codec.bits_per_pixel(bitmap), Some(bpp), "{}", name);

            assert!(codec.save(format, bitmap, &path, SaveFlags::DEFAULT), "{}", name);
            codec.unload(bitmap);

            let reloaded = codec.load(format, &path, LoadFlags::DEFAULT).unwrap();
            assert_eq!(codec.bits_per_pixel(reloaded), Some(bpp), "{}", name);
            assert_eq!(codec.width(reloaded), Some(2), "{}", name);
            codec.unload(reloaded);
        }
    }
}
