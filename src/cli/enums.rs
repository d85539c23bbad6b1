//! CLI enum types for output format, JPEG quality and resampling filter options.

use clap::ValueEnum;

use crate::bitmap::Quality;
use crate::codec::Filter;

/// Serialization used by `render` and `frames`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Html,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        }
    }
}

/// JPEG quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QualityArg {
    Superb,
    Good,
    Normal,
    Average,
    Bad,
}

impl From<QualityArg> for Quality {
    fn from(q: QualityArg) -> Self {
        match q {
            QualityArg::Superb => Quality::Superb,
            QualityArg::Good => Quality::Good,
            QualityArg::Normal => Quality::Normal,
            QualityArg::Average => Quality::Average,
            QualityArg::Bad => Quality::Bad,
        }
    }
}

/// Resampling filter for `rescale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FilterArg {
    Box,
    #[default]
    Bicubic,
    Bilinear,
    #[value(name = "bspline")]
    BSpline,
    CatmullRom,
    Lanczos3,
}

impl From<FilterArg> for Filter {
    fn from(f: FilterArg) -> Self {
        match f {
            FilterArg::Box => Filter::Box,
            FilterArg::Bicubic => Filter::Bicubic,
            FilterArg::Bilinear => Filter::Bilinear,
            FilterArg::BSpline => Filter::BSpline,
            FilterArg::CatmullRom => Filter::CatmullRom,
            FilterArg::Lanczos3 => Filter::Lanczos3,
        }
    }
}
