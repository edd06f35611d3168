//! Image buffers used by the pipeline.
//!
//! - [`ImageRgba8`]: validated, borrowed RGBA input handed in by the caller.
//! - [`ImageF32`]: owned single-channel float buffer for stain channels.
//! - [`io`]: loading and saving helpers used by the command-line tool.
pub mod f32;
pub mod io;
pub mod rgba;
pub mod traits;

pub use self::f32::ImageF32;
pub use self::rgba::ImageRgba8;
pub use self::traits::{ImageView, ImageViewMut};
