//! Load/save flag bitmasks, resampling filters and channel masks.
//!
//! Values mirror `FreeImage.h`. Only the JPEG save flags carry behavior in
//! this crate; the rest are passed through to the backend untouched.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

/// Flags passed to `NativeCodec::load`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LoadFlags(pub i32);

impl LoadFlags {
    pub const DEFAULT: LoadFlags = LoadFlags(0);
    pub const GIF_LOAD256: LoadFlags = LoadFlags(1);
    pub const GIF_PLAYBACK: LoadFlags = LoadFlags(2);
    pub const ICO_MAKEALPHA: LoadFlags = LoadFlags(1);
    pub const JPEG_FAST: LoadFlags = LoadFlags(0x0001);
    pub const JPEG_ACCURATE: LoadFlags = LoadFlags(0x0002);
    pub const JPEG_CMYK: LoadFlags = LoadFlags(0x0004);
    pub const PCD_BASE: LoadFlags = LoadFlags(1);
    pub const PCD_BASEDIV4: LoadFlags = LoadFlags(2);
    pub const PCD_BASEDIV16: LoadFlags = LoadFlags(3);
    pub const PNG_IGNOREGAMMA: LoadFlags = LoadFlags(1);
    pub const TARGA_LOAD_RGB888: LoadFlags = LoadFlags(1);
    pub const TIFF_CMYK: LoadFlags = LoadFlags(0x0001);

    pub fn bits(self) -> i32 {
        self.0
    }
}

/// Flags passed to `NativeCodec::save`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SaveFlags(pub i32);

impl SaveFlags {
    pub const DEFAULT: SaveFlags = SaveFlags(0);

    pub const BMP_SAVE_RLE: SaveFlags = SaveFlags(1);

    pub const EXR_FLOAT: SaveFlags = SaveFlags(0x0001);
    pub const EXR_NONE: SaveFlags = SaveFlags(0x0002);
    pub const EXR_ZIP: SaveFlags = SaveFlags(0x0004);
    pub const EXR_PIZ: SaveFlags = SaveFlags(0x0008);
    pub const EXR_PXR24: SaveFlags = SaveFlags(0x0010);
    pub const EXR_B44: SaveFlags = SaveFlags(0x0020);
    pub const EXR_LC: SaveFlags = SaveFlags(0x0040);

    pub const JPEG_QUALITYSUPERB: SaveFlags = SaveFlags(0x80);
    pub const JPEG_QUALITYGOOD: SaveFlags = SaveFlags(0x0100);
    pub const JPEG_QUALITYNORMAL: SaveFlags = SaveFlags(0x0200);
    pub const JPEG_QUALITYAVERAGE: SaveFlags = SaveFlags(0x0400);
    pub const JPEG_QUALITYBAD: SaveFlags = SaveFlags(0x0800);
    pub const JPEG_SUBSAMPLING_411: SaveFlags = SaveFlags(0x1000);
    pub const JPEG_PROGRESSIVE: SaveFlags = SaveFlags(0x2000);
    pub const JPEG_SUBSAMPLING_420: SaveFlags = SaveFlags(0x4000);
    pub const JPEG_SUBSAMPLING_422: SaveFlags = SaveFlags(0x8000);
    pub const JPEG_SUBSAMPLING_444: SaveFlags = SaveFlags(0x10000);

    pub const PNG_Z_BEST_SPEED: SaveFlags = SaveFlags(0x0001);
    pub const PNG_Z_DEFAULT_COMPRESSION: SaveFlags = SaveFlags(0x0006);
    pub const PNG_Z_BEST_COMPRESSION: SaveFlags = SaveFlags(0x0009);
    pub const PNG_Z_NO_COMPRESSION: SaveFlags = SaveFlags(0x0100);
    pub const PNG_INTERLACED: SaveFlags = SaveFlags(0x0200);

    pub const PNM_SAVE_RAW: SaveFlags = SaveFlags(0);
    pub const PNM_SAVE_ASCII: SaveFlags = SaveFlags(1);

    pub const TIFF_PACKBITS: SaveFlags = SaveFlags(0x0100);
    pub const TIFF_DEFLATE: SaveFlags = SaveFlags(0x0200);
    pub const TIFF_ADOBE_DEFLATE: SaveFlags = SaveFlags(0x0400);
    pub const TIFF_NONE: SaveFlags = SaveFlags(0x0800);
    pub const TIFF_CCITTFAX3: SaveFlags = SaveFlags(0x1000);
    pub const TIFF_CCITTFAX4: SaveFlags = SaveFlags(0x2000);
    pub const TIFF_LZW: SaveFlags = SaveFlags(0x4000);
    pub const TIFF_JPEG: SaveFlags = SaveFlags(0x8000);

    /// Mask covering the five JPEG quality tiers.
    const JPEG_QUALITY_MASK: i32 = 0x80 | 0x0100 | 0x0200 | 0x0400 | 0x0800;

    pub fn bits(self) -> i32 {
        self.0
    }

    pub fn contains(self, other: SaveFlags) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    /// Encoder quality (1-100) selected by the JPEG quality tier bits.
    ///
    /// With no tier set the codec default (good, 75) applies. When several
    /// tiers are set the best one wins.
    pub fn jpeg_quality(self) -> u8 {
        match self.0 & Self::JPEG_QUALITY_MASK {
            0 => 75,
            bits if bits & Self::JPEG_QUALITYSUPERB.0 != 0 => 100,
            bits if bits & Self::JPEG_QUALITYGOOD.0 != 0 => 75,
            bits if bits & Self::JPEG_QUALITYNORMAL.0 != 0 => 50,
            bits if bits & Self::JPEG_QUALITYAVERAGE.0 != 0 => 25,
            _ => 10,
        }
    }
}

impl BitOr for SaveFlags {
    type Output = SaveFlags;

    fn bitor(self, rhs: SaveFlags) -> SaveFlags {
        SaveFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for SaveFlags {
    fn bitor_assign(&mut self, rhs: SaveFlags) {
        self.0 |= rhs.0;
    }
}

/// Upsampling / downsampling filters for `NativeCodec::rescale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    /// Box, pulse, Fourier window, 1st order (constant) b-spline
    Box,
    /// Mitchell & Netravali's two-param cubic filter
    #[default]
    Bicubic,
    Bilinear,
    /// 4th order (cubic) b-spline
    BSpline,
    /// Catmull-Rom spline, Overhauser spline
    CatmullRom,
    Lanczos3,
}

impl Filter {
    /// FreeImage `FREE_IMAGE_FILTER` value.
    pub fn id(self) -> i32 {
        match self {
            Filter::Box => 0,
            Filter::Bicubic => 1,
            Filter::Bilinear => 2,
            Filter::BSpline => 3,
            Filter::CatmullRom => 4,
            Filter::Lanczos3 => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Filter::Box => "box",
            Filter::Bicubic => "bicubic",
            Filter::Bilinear => "bilinear",
            Filter::BSpline => "bspline",
            Filter::CatmullRom => "catmull-rom",
            Filter::Lanczos3 => "lanczos3",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "box" => Ok(Filter::Box),
            "bicubic" => Ok(Filter::Bicubic),
            "bilinear" => Ok(Filter::Bilinear),
            "bspline" | "b-spline" => Ok(Filter::BSpline),
            "catmull-rom" | "catmullrom" => Ok(Filter::CatmullRom),
            "lanczos3" | "lanczos" => Ok(Filter::Lanczos3),
            other => Err(format!("unknown filter '{}'", other)),
        }
    }
}

/// Bit masks locating each channel inside a 32-bit little-endian pixel word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelMasks {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
}

impl ChannelMasks {
    /// Red in bits 16-23, green 8-15, blue 0-7, alpha 24-31.
    /// In memory the bytes of each pixel read B, G, R, A.
    pub const RGBA: ChannelMasks = ChannelMasks {
        red: 0x00FF_0000,
        green: 0x0000_FF00,
        blue: 0x0000_00FF,
    };

    pub const ALPHA: u32 = 0xFF00_0000;

    /// Byte offset of each channel within a pixel, as (r, g, b, a).
    ///
    /// `None` unless every mask selects one whole byte and no two masks
    /// share a byte.
    pub fn byte_offsets(self) -> Option<(usize, usize, usize, usize)> {
        let offset = |mask: u32| {
            let shift = mask.trailing_zeros();
            (shift % 8 == 0 && shift < 32 && mask == 0xFF << shift).then_some((shift / 8) as usize)
        };
        let (r, g, b) = (offset(self.red)?, offset(self.green)?, offset(self.blue)?);
        if r == g || g == b || r == b {
            return None;
        }
        // Alpha takes whichever byte the colour masks leave free.
        Some((r, g, b, 6 - r - g - b))
    }
}

impl Default for ChannelMasks {
    fn default() -> Self {
        Self::RGBA
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_progressive_does_not_affect_quality() {
        let flags = SaveFlags::JPEG_QUALITYNORMAL | SaveFlags::JPEG_PROGRESSIVE;
        assert_eq!(flags.jpeg_quality(), 50);
        assert!(flags.contains(SaveFlags::JPEG_PROGRESSIVE));
        assert!(!SaveFlags::JPEG_QUALITYNORMAL.contains(SaveFlags::JPEG_PROGRESSIVE));
    }

    #[test]
    fn test_contains_zero_flag_is_false() {
        assert!(!SaveFlags(0x2000).contains(SaveFlags::DEFAULT));
    }

    #[test]
    fn test_filter_ids() {
        assert_eq!(Filter::Box.id(), 0);
        assert_eq!(Filter::Bicubic.id(), 1);
        assert_eq!(Filter::Bilinear.id(), 2);
        assert_eq!(Filter::BSpline.id(), 3);
        assert_eq!(Filter::CatmullRom.id(), 4);
        assert_eq!(Filter::Lanczos3.id(), 5);
    }

    #[test]
    fn test_filter_parse_roundtrip() {
        for filter in [
            Filter::Box,
            Filter::Bicubic,
            Filter::Bilinear,
            Filter::BSpline,
            Filter::CatmullRom,
            Filter::Lanczos3,
        ] {
            assert_eq!(filter.name().parse::<Filter>(), Ok(filter));
        }
        assert!("nearest".parse::<Filter>().is_err());
    }

    #[test]
    fn test_rgba_masks_byte_offsets() {
        // Little-endian word 0xAARRGGBB lays out as B, G, R, A.
        assert_eq!(ChannelMasks::RGBA.byte_offsets(), Some((2, 1, 0, 3)));
    }

    #[test]
    fn test_swapped_masks_byte_offsets() {
        let masks = ChannelMasks {
            red: 0x0000_00FF,
            green: 0x0000_FF00,
            blue: 0x00FF_0000,
        };
        assert_eq!(masks.byte_offsets(), Some((0, 1, 2, 3)));
    }

    #[test]
    fn test_invalid_masks_have_no_offsets() {
        let overlapping = ChannelMasks {
            red: 0x0000_00FF,
            green: 0x0000_00FF,
            blue: 0x00FF_0000,
        };
        assert_eq!(overlapping.byte_offsets(), None);

        let partial = ChannelMasks {
            red: 0x0000_0F00,
            ..ChannelMasks::RGBA
        };
        assert_eq!(partial.byte_offsets(), None);
    }
}
