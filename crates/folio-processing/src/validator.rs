use folio_core::{AppError, AssetKind, AssetPolicy, UploadedFile};

/// Per-file validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Empty file")]
    EmptyFile,

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    UnsupportedType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Too many files: file {position} exceeds the limit of {max}")]
    TooManyFiles { position: usize, max: usize },
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyFile => AppError::NoFile("Uploaded file is empty".to_string()),
            ValidationError::FileTooLarge { size, max } => AppError::FileTooLarge { size, max },
            ValidationError::UnsupportedType {
                content_type,
                allowed,
            } => AppError::UnsupportedType {
                content_type,
                allowed,
            },
            ValidationError::InvalidExtension { extension, allowed } => {
                AppError::UnsupportedType {
                    content_type: format!(".{}", extension),
                    allowed,
                }
            }
            ValidationError::TooManyFiles { position, max } => AppError::TooManyFiles {
                count: position,
                max,
            },
        }
    }
}

/// Strip parameters (`; charset=...`) and normalize case.
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Checks uploaded files against one asset policy. Pure: no IO, no side effects.
#[derive(Debug, Clone, Copy)]
pub struct AssetValidator {
    policy: &'static AssetPolicy,
}

impl AssetValidator {
    pub fn new(policy: &'static AssetPolicy) -> Self {
        Self { policy }
    }

    pub fn for_kind(kind: AssetKind) -> Self {
        Self::new(kind.policy())
    }

    pub fn policy(&self) -> &'static AssetPolicy {
        self.policy
    }

    /// A file of exactly `max_file_size` bytes is accepted.
    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.policy.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.policy.max_file_size,
            });
        }

        Ok(())
    }

    /// Returns the normalized MIME type on success.
    pub fn validate_content_type(&self, content_type: &str) -> Result<String, ValidationError> {
        let normalized = normalize_mime_type(content_type);

        if !self.policy.allows_mime(&normalized) {
            return Err(ValidationError::UnsupportedType {
                content_type: content_type.to_string(),
                allowed: self.policy.allowed_mime_list(),
            });
        }

        Ok(normalized)
    }

    /// Names without an extension pass; a present extension must be allowed.
    pub fn validate_extension(&self, file: &UploadedFile) -> Result<(), ValidationError> {
        match file.extension() {
            Some(extension) if !self.policy.allows_extension(&extension) => {
                Err(ValidationError::InvalidExtension {
                    extension,
                    allowed: self
                        .policy
                        .allowed_extensions
                        .iter()
                        .map(|e| e.to_string())
                        .collect(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Validate a single file: type, then extension, then size.
    pub fn validate(&self, file: &UploadedFile) -> Result<String, ValidationError> {
        let mime = self.validate_content_type(&file.content_type)?;
        self.validate_extension(file)?;
        self.validate_file_size(file.size())?;
        Ok(mime)
    }

    /// Apply the count limit to a batch.
    ///
    /// The first `max_file_count` files are admitted; every file past the limit is
    /// rejected on its own so the rest of the batch still gets processed.
    pub fn partition_batch(
        &self,
        files: Vec<UploadedFile>,
    ) -> (Vec<UploadedFile>, Vec<(UploadedFile, ValidationError)>) {
        let max = self.policy.max_file_count;
        let mut admitted = Vec::with_capacity(files.len().min(max));
        let mut rejected = Vec::new();

        for (index, file) in files.into_iter().enumerate() {
            if index < max {
                admitted.push(file);
            } else {
                rejected.push((
                    file,
                    ValidationError::TooManyFiles {
                        position: index + 1,
                        max,
                    },
                ));
            }
        }

        (admitted, rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::MIB;

    fn file(name: &str, content_type: &str, size: usize) -> UploadedFile {
        UploadedFile::new("cover", name, content_type, vec![0u8; size])
    }

    #[test]
    fn test_normalize_mime_type() {
        assert_eq!(normalize_mime_type("Image/PNG"), "image/png");
        assert_eq!(
            normalize_mime_type("image/svg+xml; charset=utf-8"),
            "image/svg+xml"
        );
        assert_eq!(normalize_mime_type("  image/jpeg "), "image/jpeg");
    }

    #[test]
    fn test_validate_file_size_boundary() {
        let validator = AssetValidator::for_kind(AssetKind::Cover);
        let max = 10 * MIB;

        assert!(validator.validate_file_size(max).is_ok());
        assert_eq!(
            validator.validate_file_size(max + 1),
            Err(ValidationError::FileTooLarge { size: max + 1, max })
        );
        assert_eq!(validator.validate_file_size(0), Err(ValidationError::EmptyFile));
    }

    #[test]
    fn test_icon_size_limit_is_smaller() {
        let validator = AssetValidator::for_kind(AssetKind::Icon);
        assert!(validator.validate_file_size(2 * MIB).is_ok());
        assert!(validator.validate_file_size(2 * MIB + 1).is_err());
    }

    #[test]
    fn test_validate_content_type() {
        let validator = AssetValidator::for_kind(AssetKind::Cover);
        assert_eq!(validator.validate_content_type("image/JPEG").unwrap(), "image/jpeg");
        assert!(validator.validate_content_type("image/png").is_ok());

        let err = validator.validate_content_type("image/svg+xml").unwrap_err();
        match err {
            ValidationError::UnsupportedType { content_type, allowed } => {
                assert_eq!(content_type, "image/svg+xml");
                assert!(allowed.contains(&"image/png".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let icons = AssetValidator::for_kind(AssetKind::Icon);
        assert!(icons.validate_content_type("image/svg+xml").is_ok());
    }

    #[test]
    fn test_validate_extension() {
        let validator = AssetValidator::for_kind(AssetKind::Cover);
        assert!(validator.validate_extension(&file("a.JPG", "image/jpeg", 1)).is_ok());
        assert!(validator.validate_extension(&file("blob", "image/jpeg", 1)).is_ok());
        assert!(matches!(
            validator.validate_extension(&file("a.exe", "image/jpeg", 1)),
            Err(ValidationError::InvalidExtension { .. })
        ));
    }

    #[test]
    fn test_validate_checks_type_before_size() {
        let validator = AssetValidator::for_kind(AssetKind::Avatar);
        let oversized_text = file("notes.txt", "text/plain", (5 * MIB + 1) as usize);
        assert!(matches!(
            validator.validate(&oversized_text),
            Err(ValidationError::UnsupportedType { .. })
        ));

        let gif = file("me.gif", "image/gif", 10);
        assert_eq!(validator.validate(&gif).unwrap(), "image/gif");
    }

    #[test]
    fn test_partition_batch_rejects_only_excess() {
        let validator = AssetValidator::for_kind(AssetKind::Picture);
        let files: Vec<_> = (0..12)
            .map(|i| file(&format!("p{i}.png"), "image/png", 1))
            .collect();

        let (admitted, rejected) = validator.partition_batch(files);

        assert_eq!(admitted.len(), 10);
        assert_eq!(rejected.len(), 2);
        assert_eq!(admitted[0].file_name, "p0.png");
        assert_eq!(rejected[0].0.file_name, "p10.png");
        assert_eq!(
            rejected[1].1,
            ValidationError::TooManyFiles { position: 12, max: 10 }
        );
    }

    #[test]
    fn test_conversion_to_app_error() {
        let err: AppError = ValidationError::FileTooLarge { size: 11, max: 10 }.into();
        assert!(matches!(err, AppError::FileTooLarge { size: 11, max: 10 }));

        let err: AppError = ValidationError::EmptyFile.into();
        assert!(matches!(err, AppError::NoFile(_)));

        let err: AppError = ValidationError::InvalidExtension {
            extension: "exe".to_string(),
            allowed: vec![],
        }
        .into();
        assert!(matches!(err, AppError::UnsupportedType { .. }));
    }
}
