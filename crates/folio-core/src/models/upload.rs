use crate::models::asset::AssetKind;
use bytes::Bytes;

/// One in-memory file taken from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Form field the file arrived under
    pub field: String,
    pub file_name: String,
    /// Declared MIME type, as sent by the client
    pub content_type: String,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(
        field: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Lowercased filename extension, if the name has one.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }
}

/// All files of one request, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub files: Vec<UploadedFile>,
}

impl UploadRequest {
    pub fn new(files: Vec<UploadedFile>) -> Self {
        Self { files }
    }

    /// Files submitted under the field of `kind`, in arrival order.
    pub fn files_for(&self, kind: AssetKind) -> Vec<UploadedFile> {
        self.files
            .iter()
            .filter(|f| f.field == kind.field_name())
            .cloned()
            .collect()
    }

    /// Kinds present in the request, in [`AssetKind::ALL`] order.
    pub fn kinds(&self) -> Vec<AssetKind> {
        AssetKind::ALL
            .into_iter()
            .filter(|k| self.files.iter().any(|f| f.field == k.field_name()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_lowercased() {
        let file = UploadedFile::new("cover", "Holiday.JPG", "image/jpeg", vec![1u8, 2, 3]);
        assert_eq!(file.extension().as_deref(), Some("jpg"));
        assert_eq!(file.size(), 3);

        let bare = UploadedFile::new("cover", "blob", "image/jpeg", Vec::new());
        assert_eq!(bare.extension(), None);
    }

    #[test]
    fn test_request_groups_by_kind() {
        let request = UploadRequest::new(vec![
            UploadedFile::new("pictures", "a.png", "image/png", vec![1u8]),
            UploadedFile::new("cover", "c.png", "image/png", vec![1u8]),
            UploadedFile::new("pictures", "b.png", "image/png", vec![1u8]),
            UploadedFile::new("unrelated", "x.png", "image/png", vec![1u8]),
        ]);

        assert_eq!(request.kinds(), vec![AssetKind::Cover, AssetKind::Picture]);
        let pictures = request.files_for(AssetKind::Picture);
        assert_eq!(pictures.len(), 2);
        assert_eq!(pictures[0].file_name, "a.png");
        assert_eq!(pictures[1].file_name, "b.png");
        assert!(request.files_for(AssetKind::Icon).is_empty());
    }
}
