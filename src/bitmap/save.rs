//! Encoding an [`Image`] to disk.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::handle::Image;
use crate::codec::{ImageFormat, SaveFlags};
use crate::error::ImageError;

/// Lossy quality tier. Only JPEG honors it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Superb,
    #[default]
    Good,
    Normal,
    Average,
    Bad,
}

impl Quality {
    pub fn flag(self) -> SaveFlags {
        match self {
            Quality::Superb => SaveFlags::JPEG_QUALITYSUPERB,
            Quality::Good => SaveFlags::JPEG_QUALITYGOOD,
            Quality::Normal => SaveFlags::JPEG_QUALITYNORMAL,
            Quality::Average => SaveFlags::JPEG_QUALITYAVERAGE,
            Quality::Bad => SaveFlags::JPEG_QUALITYBAD,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Quality::Superb => "superb",
            Quality::Good => "good",
            Quality::Normal => "normal",
            Quality::Average => "average",
            Quality::Bad => "bad",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "superb" => Ok(Quality::Superb),
            "good" => Ok(Quality::Good),
            "normal" => Ok(Quality::Normal),
            "average" => Ok(Quality::Average),
            "bad" => Ok(Quality::Bad),
            _ => Err(format!(
                "Unknown quality '{}'. Available: superb, good, normal, average, bad",
                s
            )),
        }
    }
}

/// Options for [`Image::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveOptions {
    /// Target format; falls back to the source format, then the file extension
    pub format: Option<ImageFormat>,
    pub quality: Quality,
    /// Progressive JPEG
    pub progressive: bool,
}

impl SaveOptions {
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_progressive(mut self, progressive: bool) -> Self {
        self.progressive = progressive;
        self
    }

    /// Native save flags for `format`. Non-JPEG formats get none.
    pub fn flags(&self, format: ImageFormat) -> SaveFlags {
        let mut flags = SaveFlags::DEFAULT;
        if format.requires_24_bits() {
            if self.progressive {
                flags |= SaveFlags::JPEG_PROGRESSIVE;
            }
            flags |= self.quality.flag();
        }
        flags
    }
}

impl Image<'_> {
    /// Encode the image to `path`.
    ///
    /// The target format is the explicit override, else the source format,
    /// else whatever the path's extension names. JPEG goes through a
    /// temporary 24-bit copy that is released before returning.
    pub fn save(&self, path: &Path, options: &SaveOptions) -> Result<(), ImageError> {
        let codec = self.codec();
        let format = self.resolve_save_format(path, options)?;
        if !codec.supports_write(format) {
            return Err(ImageError::UnsupportedFormat {
                format,
                operation: "write",
            });
        }

        let bitmap = self.live()?;
        let flags = options.flags(format);
        log::debug!(
            "Saving {:?} to '{}' as {} (flags {:#x})",
            bitmap,
            path.display(),
            format,
            flags.bits()
        );

        let saved = if format.requires_24_bits() {
            let flat = codec.convert_to_24_bits(bitmap).ok_or_else(|| {
                ImageError::DecodeError("24-bit conversion returned no bitmap".to_string())
            })?;
            let flat = Image::adopt(codec, flat, format);
            codec.save(format, flat.live()?, path, flags)
        } else {
            codec.save(format, bitmap, path, flags)
        };

        if saved {
            Ok(())
        } else {
            Err(ImageError::EncodeError {
                path: path.to_path_buf(),
                format,
            })
        }
    }

    fn resolve_save_format(
        &self,
        path: &Path,
        options: &SaveOptions,
    ) -> Result<ImageFormat, ImageError> {
        let format = match options.format {
            Some(format) => format,
            None if !self.format().is_unknown() => self.format(),
            None => self.codec().format_from_filename(path),
        };
        if format.is_unknown() {
            return Err(ImageError::UnsupportedFormat {
                format,
                operation: "write",
            });
        }
        Ok(format)
    }
}
