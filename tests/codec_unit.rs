//! Unit tests for the native codec binding and its in-process backend.
//!
//! These tests drive `MemoryCodec` only through the `NativeCodec` trait:
//! - Format and flag tables
//! - Raw pixel conversion in both directions
//! - Geometric operations and ownership of their results

use pixel_markup::codec::{
    aligned_pitch, thumbnail_dimensions, ChannelMasks, Filter, ImageFormat, MemoryCodec,
    NativeCodec, NativeRef, SaveFlags,
};

fn codec() -> Box<dyn NativeCodec> {
    Box::new(MemoryCodec::new())
}

/// 3x2 BGRA gradient; pixel (x, y) has red = 40x, green = 100y, blue = 7.
fn gradient(codec: &dyn NativeCodec) -> NativeRef {
    let mut pixels = Vec::new();
    for y in 0..2u8 {
        for x in 0..3u8 {
            pixels.extend_from_slice(&[7, 100 * y, 40 * x, 255]);
        }
    }
    codec
        .convert_from_raw_bits(&pixels, 3, 2, 12, 32, ChannelMasks::RGBA, true)
        .expect("gradient bitmap")
}

fn raw(codec: &dyn NativeCodec, bitmap: NativeRef) -> Vec<u8> {
    let width = codec.width(bitmap).unwrap();
    let height = codec.height(bitmap).unwrap();
    let pitch = aligned_pitch(width, 32).unwrap();
    let mut out = vec![0u8; (pitch * height) as usize];
    assert!(codec.convert_to_raw_bits(&mut out, bitmap, pitch, 32, ChannelMasks::RGBA, true));
    out
}

// ==================== Format Table Tests ====================

#[test]
fn test_format_ids_follow_freeimage_numbering() {
    assert_eq!(ImageFormat::Unknown.id(), -1);
    assert_eq!(ImageFormat::Bmp.id(), 0);
    assert_eq!(ImageFormat::Jpeg.id(), 2);
    assert_eq!(ImageFormat::Png.id(), 13);
    assert_eq!(ImageFormat::Gif.id(), 25);
    assert_eq!(ImageFormat::Jp2.id(), 31);
}

#[test]
fn test_every_format_round_trips_through_id_and_symbol() {
    for format in ImageFormat::all() {
        assert_eq!(ImageFormat::from_id(format.id()), format);
        if !format.is_unknown() {
            assert_eq!(ImageFormat::from_symbol(format.symbol()), Some(format));
        }
    }
}

#[test]
fn test_unknown_ids_and_symbols() {
    assert_eq!(ImageFormat::from_id(999), ImageFormat::Unknown);
    assert_eq!(ImageFormat::from_symbol("unknown_format"), None);
    assert!("unknown_format".parse::<ImageFormat>().is_err());
}

#[test]
fn test_symbol_aliases() {
    assert_eq!(ImageFormat::from_symbol("jpg"), Some(ImageFormat::Jpeg));
    assert_eq!(ImageFormat::from_symbol("TIF"), Some(ImageFormat::Tiff));
    assert_eq!(ImageFormat::from_symbol("tga"), Some(ImageFormat::Targa));
}

// ==================== Flag Tests ====================

#[test]
fn test_jpeg_quality_tiers() {
    assert_eq!(SaveFlags::JPEG_QUALITYSUPERB.jpeg_quality(), 100);
    assert_eq!(SaveFlags::JPEG_QUALITYGOOD.jpeg_quality(), 75);
    assert_eq!(SaveFlags::JPEG_QUALITYNORMAL.jpeg_quality(), 50);
    assert_eq!(SaveFlags::JPEG_QUALITYAVERAGE.jpeg_quality(), 25);
    assert_eq!(SaveFlags::JPEG_QUALITYBAD.jpeg_quality(), 10);
    assert_eq!(SaveFlags::DEFAULT.jpeg_quality(), 75);
}

#[test]
fn test_progressive_combines_with_quality() {
    let flags = SaveFlags::JPEG_PROGRESSIVE | SaveFlags::JPEG_QUALITYBAD;
    assert_eq!(flags.bits(), 0x2800);
    assert!(flags.contains(SaveFlags::JPEG_PROGRESSIVE));
    assert_eq!(flags.jpeg_quality(), 10);
}

#[test]
fn test_filter_ids() {
    let ids: Vec<i32> = [
        Filter::Box,
        Filter::Bicubic,
        Filter::Bilinear,
        Filter::BSpline,
        Filter::CatmullRom,
        Filter::Lanczos3,
    ]
    .iter()
    .map(|f| f.id())
    .collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(Filter::default(), Filter::Bicubic);
}

#[test]
fn test_rgba_masks() {
    assert_eq!(ChannelMasks::RGBA.red, 0x00FF_0000);
    assert_eq!(ChannelMasks::RGBA.green, 0x0000_FF00);
    assert_eq!(ChannelMasks::RGBA.blue, 0x0000_00FF);
    assert_eq!(ChannelMasks::RGBA.byte_offsets(), Some((2, 1, 0, 3)));
}

// ==================== Raw Bits Tests ====================

#[test]
fn test_raw_bits_round_trip() {
    let codec = codec();
    let bitmap = gradient(codec.as_ref());
    assert_eq!(codec.width(bitmap), Some(3));
    assert_eq!(codec.height(bitmap), Some(2));
    assert_eq!(codec.bits_per_pixel(bitmap), Some(32));

    let bytes = raw(codec.as_ref(), bitmap);
    // pixel (2, 1): B G R A
    assert_eq!(&bytes[12 + 8..12 + 12], &[7, 100, 80, 255]);
    codec.unload(bitmap);
}

#[test]
fn test_bottom_up_flips_rows() {
    let codec = codec();
    let bitmap = gradient(codec.as_ref());
    let mut bottom_up = vec![0u8; 24];
    assert!(codec.convert_to_raw_bits(&mut bottom_up, bitmap, 12, 32, ChannelMasks::RGBA, false));
    // first row in memory is the image's last row (green = 100)
    assert_eq!(bottom_up[1], 100);
    assert_eq!(bottom_up[12 + 1], 0);
    codec.unload(bitmap);
}

#[test]
fn test_raw_bits_rejects_short_destination() {
    let codec = codec();
    let bitmap = gradient(codec.as_ref());
    let mut short = vec![0u8; 23];
    assert!(!codec.convert_to_raw_bits(&mut short, bitmap, 12, 32, ChannelMasks::RGBA, true));
    codec.unload(bitmap);
}

// ==================== Geometry Tests ====================

#[test]
fn test_copy_extracts_sub_rectangle() {
    let codec = codec();
    let bitmap = gradient(codec.as_ref());
    let copy = codec.copy(bitmap, 1, 1, 3, 2).expect("copy");
    assert_ne!(copy, bitmap);
    assert_eq!(codec.width(copy), Some(2));
    assert_eq!(codec.height(copy), Some(1));

    let bytes = raw(codec.as_ref(), copy);
    assert_eq!(&bytes[..4], &[7, 100, 40, 255]);

    codec.unload(bitmap);
    assert_eq!(codec.width(copy), Some(2));
    codec.unload(copy);
}

#[test]
fn test_rescale_every_filter() {
    let codec = codec();
    let bitmap = gradient(codec.as_ref());
    for filter in [
        Filter::Box,
        Filter::Bicubic,
        Filter::Bilinear,
        Filter::BSpline,
        Filter::CatmullRom,
        Filter::Lanczos3,
    ] {
        let scaled = codec.rescale(bitmap, 6, 4, filter).expect("rescale");
        assert_eq!(codec.width(scaled), Some(6), "{}", filter);
        assert_eq!(codec.height(scaled), Some(4), "{}", filter);
        codec.unload(scaled);
    }
    assert!(codec.rescale(bitmap, 0, 4, Filter::Box).is_none());
    codec.unload(bitmap);
}

#[test]
fn test_thumbnail_preserves_aspect() {
    let codec = codec();
    let pixels = vec![128u8; 40 * 10 * 4];
    let bitmap = codec
        .convert_from_raw_bits(&pixels, 40, 10, 160, 32, ChannelMasks::RGBA, true)
        .unwrap();
    let thumb = codec.make_thumbnail(bitmap, 8, true).unwrap();
    assert_eq!(codec.width(thumb), Some(8));
    assert_eq!(codec.height(thumb), Some(2));
    assert_eq!(thumbnail_dimensions(40, 10, 8), (8, 2));
    codec.unload(thumb);
    codec.unload(bitmap);
}

#[test]
fn test_convert_to_24_bits_drops_alpha() {
    let codec = codec();
    let bitmap = gradient(codec.as_ref());
    let flat = codec.convert_to_24_bits(bitmap).unwrap();
    assert_eq!(codec.bits_per_pixel(flat), Some(24));
    assert_eq!(codec.bits_per_pixel(bitmap), Some(32));
    codec.unload(flat);
    codec.unload(bitmap);
}

// ==================== Ownership Tests ====================

#[test]
fn test_unloaded_reference_is_unknown() {
    let codec = codec();
    let bitmap = gradient(codec.as_ref());
    codec.unload(bitmap);
    assert_eq!(codec.width(bitmap), None);
    assert!(codec.copy(bitmap, 0, 0, 1, 1).is_none());
    // second unload is a no-op
    codec.unload(bitmap);
}

#[test]
fn test_live_bitmap_count() {
    let memory = MemoryCodec::new();
    let a = gradient(&memory);
    let b = memory.convert_to_24_bits(a).unwrap();
    assert_eq!(memory.live_bitmaps(), 2);
    memory.unload(a);
    memory.unload(b);
    assert_eq!(memory.live_bitmaps(), 0);
}
