//! Image processing module
//!
//! - Geometry for `Inside` and `Cover` fits (resize)
//! - Decode, resize and WebP encoding for each derivative (transformer)

pub mod resize;
pub mod transformer;

pub use resize::ImageResize;
pub use transformer::{Derivative, ImageInfo, ImageTransformer, TransformError};
