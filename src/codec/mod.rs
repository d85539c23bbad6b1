//! Binding to the native image codec.
//!
//! [`NativeCodec`] is the flat interface every backend implements. The
//! default backend is [`MemoryCodec`]; building with the `freeimage` feature
//! adds [`FreeImageCodec`], which calls the system library directly.

mod binding;
mod flags;
mod format;
#[cfg(feature = "freeimage")]
mod freeimage;
mod memory;
#[cfg(test)]
pub(crate) mod testing;

pub use binding::{aligned_pitch, thumbnail_dimensions, NativeCodec, NativeRef};
pub use flags::{ChannelMasks, Filter, LoadFlags, SaveFlags};
pub use format::ImageFormat;
#[cfg(feature = "freeimage")]
pub use freeimage::FreeImageCodec;
pub use memory::MemoryCodec;
