//! pixel-markup library crate.
//!
//! Decodes images through a pluggable native codec binding, hands their
//! pixels to a pure renderer, and serializes the result as a grid of
//! colored character cells.
//!
//! ```no_run
//! use pixel_markup::bitmap::ImageLibrary;
//! use pixel_markup::render::{render, RenderOptions};
//! use std::path::Path;
//!
//! let library = ImageLibrary::default();
//! let document = library.with_image(
//!     Path::new("cat.png"),
//!     |image| -> Result<_, Box<dyn std::error::Error>> {
//!         let pixels = image.raw_pixels()?;
//!         Ok(render(&pixels, "meow", &RenderOptions::default())?)
//!     },
//! );
//! ```

pub mod bitmap;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod pixels;
pub mod render;

pub use bitmap::{Image, ImageLibrary, Quality, SaveOptions};
pub use error::{ImageError, RenderError};
pub use pixels::{ChannelOrder, PixelBuffer};
