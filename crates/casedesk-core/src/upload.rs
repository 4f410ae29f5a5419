//! Upload requests and the file-type allow-list.

use std::path::Path;

use thiserror::Error;

/// File types the ingestion endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowedFileType {
    Jpeg,
    Png,
    Pdf,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FileTypeError {
    #[error("file type {mime} is not allowed (expected JPEG, PNG or PDF)")]
    Disallowed { mime: String },
    #[error("cannot determine file type of {0}")]
    Unknown(String),
}

impl AllowedFileType {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn from_mime(mime: &str) -> Result<Self, FileTypeError> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            "application/pdf" => Ok(Self::Pdf),
            other => Err(FileTypeError::Disallowed {
                mime: other.to_string(),
            }),
        }
    }

    /// Detect the type from the file extension and check it against the allow-list.
    pub fn detect(path: &Path) -> Result<Self, FileTypeError> {
        let mime = mime_guess::from_path(path)
            .first()
            .ok_or_else(|| FileTypeError::Unknown(path.display().to_string()))?;
        Self::from_mime(mime.essence_str())
    }
}

/// Multipart payload for `POST /documents`.
///
/// `document_type_id` and `management_document_id` are set for single
/// uploads and left empty for smart uploads, where the matcher decides.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub file_type: AllowedFileType,
    pub bytes: Vec<u8>,
    /// Display name, sent as `name`.
    pub name: String,
    pub management_id: String,
    pub document_type_id: Option<String>,
    pub management_document_id: Option<String>,
    pub form_category: Option<String>,
}

impl UploadRequest {
    /// Text form fields in wire order, skipping absent optionals.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("name", self.name.clone()),
            ("type", self.file_type.mime().to_string()),
            ("managementId", self.management_id.clone()),
        ];
        if let Some(id) = &self.document_type_id {
            fields.push(("documentTypeId", id.clone()));
        }
        if let Some(id) = &self.management_document_id {
            fields.push(("managementDocumentId", id.clone()));
        }
        if let Some(category) = &self.form_category {
            fields.push(("form_category", category.clone()));
        }
        fields
    }
}
