//! Owned image handles and the scoped-acquisition facade.

mod facade;
mod handle;
mod save;

pub use facade::ImageLibrary;
pub use handle::Image;
pub use save::{Quality, SaveOptions};
