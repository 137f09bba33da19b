//! Folio Processing Library
//!
//! Upload validation and image transformation. Everything here is pure with respect
//! to storage: bytes in, derivatives or a rejection out.

#[cfg(feature = "image")]
pub mod image;
pub mod validator;

#[cfg(feature = "image")]
pub use self::image::{Derivative, ImageInfo, ImageResize, ImageTransformer, TransformError};
pub use validator::{normalize_mime_type, AssetValidator, ValidationError};
