//! CLI argument parsing with clap.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use super::enums::{FilterArg, OutputFormat, QualityArg};
use crate::codec::ImageFormat;

/// Render images as grids of colored characters
#[derive(Parser, Debug)]
#[command(name = "pixel-markup")]
#[command(version, about = "Render images as colored character markup", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render an image to HTML or JSON, one cell per pixel
    Render {
        image: PathBuf,

        /// Characters cycled over the pixels
        #[arg(short, long)]
        text: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, default_value = "html")]
        output_format: OutputFormat,

        /// Shrink the image so its longest side is at most N pixels first
        #[arg(long, value_name = "N")]
        thumbnail: Option<u32>,

        /// First pixel takes the first character of the text
        #[arg(long)]
        direct_indexing: bool,
    },
    /// Print format, dimensions, bit depth and stride
    Info { image: PathBuf },
    /// Re-encode an image
    Convert {
        input: PathBuf,
        output: PathBuf,

        /// Target format (default: source format)
        #[arg(long, short)]
        format: Option<ImageFormat>,

        /// JPEG quality
        #[arg(long, short)]
        quality: Option<QualityArg>,

        /// Progressive JPEG
        #[arg(long)]
        progressive: bool,
    },
    /// Save a rectangle of an image
    Crop {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        left: u32,
        #[arg(long)]
        top: u32,
        #[arg(long)]
        right: u32,
        #[arg(long)]
        bottom: u32,
    },
    /// Save a thumbnail whose longest side is at most --max pixels
    Thumbnail {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        max: u32,
    },
    /// Resample an image to an exact size
    Rescale {
        input: PathBuf,
        output: PathBuf,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[arg(long, default_value = "bicubic")]
        filter: FilterArg,
    },
    /// Render every image in a directory to numbered pages
    Frames {
        dir: PathBuf,
        out_dir: PathBuf,

        /// Characters cycled over the pixels
        #[arg(short, long)]
        text: Option<String>,

        #[arg(long, default_value = "html")]
        output_format: OutputFormat,

        /// First pixel takes the first character of the text
        #[arg(long)]
        direct_indexing: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}
