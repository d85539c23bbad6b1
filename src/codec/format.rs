//! Image format identifiers and the process-wide format lookup table.
//!
//! Numeric ids follow the FreeImage `FREE_IMAGE_FORMAT` enumeration so that
//! both codec backends speak the same language.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Encoding of an image file, or `Unknown` for buffers that never came from
/// a decoded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageFormat {
    #[default]
    Unknown,
    Bmp,
    Ico,
    Jpeg,
    Jng,
    Koala,
    Lbm,
    Mng,
    Pbm,
    PbmRaw,
    Pcd,
    Pcx,
    Pgm,
    PgmRaw,
    Png,
    Ppm,
    PpmRaw,
    Ras,
    Targa,
    Tiff,
    Wbmp,
    Psd,
    Cut,
    Xbm,
    Xpm,
    Dds,
    Gif,
    Hdr,
    FaxG3,
    Sgi,
    Exr,
    J2k,
    Jp2,
}

/// id <-> format <-> symbol, in id order.
const FORMAT_TABLE: &[(i32, ImageFormat, &str)] = &[
    (-1, ImageFormat::Unknown, "unknown"),
    (0, ImageFormat::Bmp, "bmp"),
    (1, ImageFormat::Ico, "ico"),
    (2, ImageFormat::Jpeg, "jpeg"),
    (3, ImageFormat::Jng, "jng"),
    (4, ImageFormat::Koala, "koala"),
    (5, ImageFormat::Lbm, "lbm"),
    (6, ImageFormat::Mng, "mng"),
    (7, ImageFormat::Pbm, "pbm"),
    (8, ImageFormat::PbmRaw, "pbmraw"),
    (9, ImageFormat::Pcd, "pcd"),
    (10, ImageFormat::Pcx, "pcx"),
    (11, ImageFormat::Pgm, "pgm"),
    (12, ImageFormat::PgmRaw, "pgmraw"),
    (13, ImageFormat::Png, "png"),
    (14, ImageFormat::Ppm, "ppm"),
    (15, ImageFormat::PpmRaw, "ppmraw"),
    (16, ImageFormat::Ras, "ras"),
    (17, ImageFormat::Targa, "targa"),
    (18, ImageFormat::Tiff, "tiff"),
    (19, ImageFormat::Wbmp, "wbmp"),
    (20, ImageFormat::Psd, "psd"),
    (21, ImageFormat::Cut, "cut"),
    (22, ImageFormat::Xbm, "xbm"),
    (23, ImageFormat::Xpm, "xpm"),
    (24, ImageFormat::Dds, "dds"),
    (25, ImageFormat::Gif, "gif"),
    (26, ImageFormat::Hdr, "hdr"),
    (27, ImageFormat::FaxG3, "faxg3"),
    (28, ImageFormat::Sgi, "sgi"),
    (29, ImageFormat::Exr, "exr"),
    (30, ImageFormat::J2k, "j2k"),
    (31, ImageFormat::Jp2, "jp2"),
];

/// Extra spellings accepted on input. `iff` shares the LBM id.
const SYMBOL_ALIASES: &[(&str, ImageFormat)] = &[
    ("iff", ImageFormat::Lbm),
    ("jpg", ImageFormat::Jpeg),
    ("tga", ImageFormat::Targa),
    ("tif", ImageFormat::Tiff),
];

static BY_SYMBOL: Lazy<HashMap<&'static str, ImageFormat>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, ImageFormat> = FORMAT_TABLE
        .iter()
        .filter(|(_, format, _)| *format != ImageFormat::Unknown)
        .map(|(_, format, symbol)| (*symbol, *format))
        .collect();
    map.extend(SYMBOL_ALIASES.iter().copied());
    map
});

static BY_ID: Lazy<HashMap<i32, ImageFormat>> = Lazy::new(|| {
    FORMAT_TABLE
        .iter()
        .map(|(id, format, _)| (*id, *format))
        .collect()
});

impl ImageFormat {
    /// FreeImage format id (`-1` for unknown).
    pub fn id(self) -> i32 {
        self.entry().0
    }

    /// Lowercase symbol, e.g. `"jpeg"`.
    pub fn symbol(self) -> &'static str {
        self.entry().2
    }

    /// Look up a format by FreeImage id. Unrecognized ids map to `Unknown`.
    pub fn from_id(id: i32) -> Self {
        BY_ID.get(&id).copied().unwrap_or(ImageFormat::Unknown)
    }

    /// Look up a format by symbol (case-insensitive). `"unknown"` is not a
    /// valid target and yields `None`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        BY_SYMBOL.get(symbol.to_ascii_lowercase().as_str()).copied()
    }

    pub fn is_unknown(self) -> bool {
        self == ImageFormat::Unknown
    }

    /// Formats whose encoder cannot carry an alpha channel and must be fed a
    /// 24-bit bitmap.
    pub fn requires_24_bits(self) -> bool {
        matches!(self, ImageFormat::Jpeg)
    }

    /// Every known format, excluding `Unknown`.
    pub fn all() -> impl Iterator<Item = ImageFormat> {
        FORMAT_TABLE
            .iter()
            .map(|(_, format, _)| *format)
            .filter(|format| !format.is_unknown())
    }

    fn entry(self) -> &'static (i32, ImageFormat, &'static str) {
        FORMAT_TABLE
            .iter()
            .find(|(_, format, _)| *format == self)
            .unwrap_or(&FORMAT_TABLE[0])
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageFormat::from_symbol(s).ok_or_else(|| format!("format {:?} is not supported", s))
    }
}
