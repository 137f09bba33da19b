pub mod asset;
pub mod storage;
pub mod upload;

pub use asset::{
    AssetKind, AssetPolicy, DerivativeSpec, FitMode, OutputFormat, MIB, MIME_SVG,
};
pub use storage::StoredAsset;
pub use upload::{UploadRequest, UploadedFile};
