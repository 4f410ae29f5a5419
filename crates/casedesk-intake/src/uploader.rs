//! File validation and upload.
//!
//! Validation runs on the path alone so disallowed files are rejected
//! before the file is read or the backend is contacted.

use std::path::Path;

use casedesk_client::CaseBackend;
use casedesk_core::{AllowedFileType, DocumentRequirement, UploadRequest};
use tracing::info;

use crate::IntakeError;

/// Check a file against the allow-list without touching the filesystem.
pub fn check_file(path: &Path) -> Result<AllowedFileType, IntakeError> {
    AllowedFileType::detect(path).map_err(|source| IntakeError::DisallowedFileType {
        path: path.to_path_buf(),
        source,
    })
}

/// Read `path` and build the multipart request for case `case_id`.
///
/// With a `target`, the request carries the requirement and its document
/// type; without one the backend leaves assignment to the matcher.
pub async fn build_request(
    path: &Path,
    file_type: AllowedFileType,
    case_id: &str,
    target: Option<&DocumentRequirement>,
    form_category: Option<&str>,
) -> Result<UploadRequest, IntakeError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| IntakeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    Ok(UploadRequest {
        name: file_name.clone(),
        file_name,
        file_type,
        bytes,
        management_id: case_id.to_string(),
        document_type_id: target.and_then(|r| r.document_type_id.clone()),
        management_document_id: target.map(|r| r.id.clone()),
        form_category: form_category.map(str::to_string),
    })
}

/// Validate, read and upload one file. Returns the new document id.
pub async fn upload_file(
    backend: &dyn CaseBackend,
    path: &Path,
    case_id: &str,
    target: Option<&DocumentRequirement>,
    form_category: Option<&str>,
) -> Result<String, IntakeError> {
    let file_type = check_file(path)?;
    let request = build_request(path, file_type, case_id, target, form_category).await?;
    let document_id = backend.upload_document(&request).await?;
    info!(
        path = %path.display(),
        case_id,
        document_id = %document_id,
        "uploaded"
    );
    Ok(document_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeBackend, write_file};
    use casedesk_core::RequirementStatus;

    #[test]
    fn disallowed_type_is_rejected() {
        let err = check_file(Path::new("contract.docx")).unwrap_err();
        assert!(matches!(err, IntakeError::DisallowedFileType { .. }));
    }

    #[tokio::test]
    async fn disallowed_file_never_reaches_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "photo.gif");
        let backend = FakeBackend::new();

        let err = upload_file(&backend, &path, "case-1", None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, IntakeError::DisallowedFileType { .. }));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let backend = FakeBackend::new();
        let err = upload_file(&backend, Path::new("/nonexistent/scan.pdf"), "case-1", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::Io { .. }));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn targeted_request_carries_requirement() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "passport.jpg");
        let requirement = DocumentRequirement {
            id: "req-7".into(),
            name: "Passport".into(),
            required: true,
            document_type_id: Some("type-passport".into()),
            status: RequirementStatus::Pending,
            document_id: None,
        };

        let request = build_request(
            &path,
            AllowedFileType::Jpeg,
            "case-1",
            Some(&requirement),
            Some("individual"),
        )
        .await
        .unwrap();

        assert_eq!(request.file_name, "passport.jpg");
        assert_eq!(request.management_document_id.as_deref(), Some("req-7"));
        assert_eq!(request.document_type_id.as_deref(), Some("type-passport"));
        assert_eq!(request.form_category.as_deref(), Some("individual"));
        assert!(!request.bytes.is_empty());
    }

    #[tokio::test]
    async fn upload_returns_backend_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "statement.pdf");
        let backend = FakeBackend::new();

        let id = upload_file(&backend, &path, "case-1", None, None)
            .await
            .unwrap();

        assert_eq!(id, "doc-1");
        assert_eq!(backend.calls(), [Call::Upload("statement.pdf".into())]);
    }
}
