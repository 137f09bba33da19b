//! Asset kinds and their immutable processing policies.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

pub const MIB: u64 = 1024 * 1024;

pub const MIME_SVG: &str = "image/svg+xml";

/// Category of uploaded image. Each kind has exactly one [`AssetPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    Cover,
    Picture,
    Icon,
    Avatar,
    ExperiencePhoto,
}

impl AssetKind {
    pub const ALL: [AssetKind; 5] = [
        AssetKind::Cover,
        AssetKind::Picture,
        AssetKind::Icon,
        AssetKind::Avatar,
        AssetKind::ExperiencePhoto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Cover => "cover",
            AssetKind::Picture => "picture",
            AssetKind::Icon => "icon",
            AssetKind::Avatar => "avatar",
            AssetKind::ExperiencePhoto => "experience-photo",
        }
    }

    /// Multipart form field carrying files of this kind.
    pub fn field_name(&self) -> &'static str {
        match self {
            AssetKind::Cover => "cover",
            AssetKind::Picture => "pictures",
            AssetKind::Icon => "icon",
            AssetKind::Avatar => "avatar",
            AssetKind::ExperiencePhoto => "image",
        }
    }

    /// Subdirectory (or object prefix) under the uploads root.
    pub fn storage_dir(&self) -> &'static str {
        match self {
            AssetKind::Cover => "projects/covers",
            AssetKind::Picture => "projects/pictures",
            AssetKind::Icon => "skills",
            AssetKind::Avatar => "avatars",
            AssetKind::ExperiencePhoto => "experiences",
        }
    }

    pub fn from_field_name(field: &str) -> Option<AssetKind> {
        AssetKind::ALL.into_iter().find(|k| k.field_name() == field)
    }

    pub fn policy(&self) -> &'static AssetPolicy {
        match self {
            AssetKind::Cover => &COVER_POLICY,
            AssetKind::Picture => &PICTURE_POLICY,
            AssetKind::Icon => &ICON_POLICY,
            AssetKind::Avatar => &AVATAR_POLICY,
            AssetKind::ExperiencePhoto => &EXPERIENCE_PHOTO_POLICY,
        }
    }

    /// Kinds accepting several files per request.
    pub fn is_batch(&self) -> bool {
        self.policy().max_file_count > 1
    }
}

impl Display for AssetKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown asset kind: {}", s))
    }
}

/// How a derivative is fitted into its target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Fit within the box, keep aspect ratio, never enlarge.
    Inside,
    /// Fill the exact box, cropping the overflow around the center.
    Cover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    WebP,
    Svg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Svg => "svg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::WebP => "image/webp",
            OutputFormat::Svg => MIME_SVG,
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivativeSpec {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub fit: FitMode,
    /// Encoder quality, 0-100
    pub quality: u8,
}

impl DerivativeSpec {
    /// `"400x400"` style size label used in response metadata.
    pub fn size_label(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Rule set applied to every file of one [`AssetKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetPolicy {
    pub allowed_mime_types: &'static [&'static str],
    pub allowed_extensions: &'static [&'static str],
    pub max_file_size: u64,
    pub max_file_count: usize,
    pub output_format: OutputFormat,
    /// Store vector input byte-identical instead of rasterizing it.
    pub vector_passthrough: bool,
    pub derivatives: &'static [DerivativeSpec],
}

impl AssetPolicy {
    pub fn allows_mime(&self, mime: &str) -> bool {
        self.allowed_mime_types.iter().any(|m| *m == mime)
    }

    pub fn allows_extension(&self, ext: &str) -> bool {
        self.allowed_extensions.iter().any(|e| *e == ext)
    }

    pub fn allowed_mime_list(&self) -> Vec<String> {
        self.allowed_mime_types.iter().map(|m| m.to_string()).collect()
    }

    pub fn derivative(&self, label: &str) -> Option<&DerivativeSpec> {
        self.derivatives.iter().find(|d| d.label == label)
    }
}

const RASTER_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];
const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

pub static COVER_POLICY: AssetPolicy = AssetPolicy {
    allowed_mime_types: RASTER_TYPES,
    allowed_extensions: RASTER_EXTENSIONS,
    max_file_size: 10 * MIB,
    max_file_count: 1,
    output_format: OutputFormat::WebP,
    vector_passthrough: false,
    derivatives: &[
        DerivativeSpec {
            label: "small",
            width: 400,
            height: 400,
            fit: FitMode::Cover,
            quality: 85,
        },
        DerivativeSpec {
            label: "large",
            width: 1000,
            height: 1000,
            fit: FitMode::Cover,
            quality: 92,
        },
    ],
};

pub static PICTURE_POLICY: AssetPolicy = AssetPolicy {
    allowed_mime_types: RASTER_TYPES,
    allowed_extensions: RASTER_EXTENSIONS,
    max_file_size: 10 * MIB,
    max_file_count: 10,
    output_format: OutputFormat::WebP,
    vector_passthrough: false,
    derivatives: &[DerivativeSpec {
        label: "full",
        width: 1200,
        height: 1200,
        fit: FitMode::Inside,
        quality: 90,
    }],
};

pub static ICON_POLICY: AssetPolicy = AssetPolicy {
    allowed_mime_types: &[
        MIME_SVG,
        "image/png",
        "image/jpeg",
        "image/jpg",
        "image/webp",
    ],
    allowed_extensions: &["svg", "png", "jpg", "jpeg", "webp"],
    max_file_size: 2 * MIB,
    max_file_count: 1,
    output_format: OutputFormat::WebP,
    vector_passthrough: true,
    derivatives: &[DerivativeSpec {
        label: "icon",
        width: 512,
        height: 512,
        fit: FitMode::Inside,
        quality: 90,
    }],
};

pub static AVATAR_POLICY: AssetPolicy = AssetPolicy {
    allowed_mime_types: &[
        "image/jpeg",
        "image/jpg",
        "image/png",
        "image/gif",
        "image/webp",
    ],
    allowed_extensions: &["jpg", "jpeg", "png", "gif", "webp"],
    max_file_size: 5 * MIB,
    max_file_count: 1,
    output_format: OutputFormat::WebP,
    vector_passthrough: false,
    derivatives: &[DerivativeSpec {
        label: "avatar",
        width: 400,
        height: 400,
        fit: FitMode::Cover,
        quality: 90,
    }],
};

pub static EXPERIENCE_PHOTO_POLICY: AssetPolicy = AssetPolicy {
    allowed_mime_types: RASTER_TYPES,
    allowed_extensions: RASTER_EXTENSIONS,
    max_file_size: 5 * MIB,
    max_file_count: 1,
    output_format: OutputFormat::WebP,
    vector_passthrough: false,
    derivatives: &[DerivativeSpec {
        label: "photo",
        width: 400,
        height: 400,
        fit: FitMode::Cover,
        quality: 90,
    }],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_policy_has_two_square_derivatives() {
        let policy = AssetKind::Cover.policy();
        assert_eq!(policy.derivatives.len(), 2);
        let small = policy.derivative("small").unwrap();
        let large = policy.derivative("large").unwrap();
        assert_eq!((small.width, small.height), (400, 400));
        assert_eq!((large.width, large.height), (1000, 1000));
        assert_eq!(small.fit, FitMode::Cover);
        assert_eq!(small.quality, 85);
        assert_eq!(large.size_label(), "1000x1000");
    }

    #[test]
    fn test_only_icon_passes_vectors_through() {
        for kind in AssetKind::ALL {
            let policy = kind.policy();
            assert_eq!(policy.vector_passthrough, kind == AssetKind::Icon);
            assert_eq!(policy.allows_mime(MIME_SVG), kind == AssetKind::Icon);
        }
    }

    #[test]
    fn test_picture_is_the_only_batch_kind() {
        let batch: Vec<_> = AssetKind::ALL.into_iter().filter(|k| k.is_batch()).collect();
        assert_eq!(batch, vec![AssetKind::Picture]);
        assert_eq!(AssetKind::Picture.policy().max_file_count, 10);
    }

    #[test]
    fn test_field_names_round_trip() {
        for kind in AssetKind::ALL {
            assert_eq!(AssetKind::from_field_name(kind.field_name()), Some(kind));
            assert_eq!(kind.as_str().parse::<AssetKind>().unwrap(), kind);
        }
        assert_eq!(AssetKind::from_field_name("photo"), None);
        assert_eq!(AssetKind::ExperiencePhoto.field_name(), "image");
    }

    #[test]
    fn test_asset_kind_serde() {
        let json = serde_json::to_string(&AssetKind::ExperiencePhoto).unwrap();
        assert_eq!(json, "\"experience-photo\"");
    }
}
