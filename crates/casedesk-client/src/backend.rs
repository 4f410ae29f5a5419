use async_trait::async_trait;
use casedesk_core::{Case, DocumentStatusReport, RequirementStatus, UploadRequest, UserRef};

use crate::ClientError;

/// Operations the intake flow needs from the case/document backend.
///
/// [`HttpBackend`](crate::HttpBackend) talks to the REST API; tests substitute
/// an in-memory implementation.
#[async_trait]
pub trait CaseBackend: Send + Sync {
    /// Ingest a file. Returns the new document id.
    async fn upload_document(&self, request: &UploadRequest) -> Result<String, ClientError>;

    async fn document_status(&self, document_id: &str) -> Result<DocumentStatusReport, ClientError>;

    async fn delete_document(&self, document_id: &str) -> Result<(), ClientError>;

    /// Set the status of one requirement of a case, linking the uploaded document.
    async fn update_document_status(
        &self,
        case_id: &str,
        requirement_id: &str,
        status: RequirementStatus,
        document_id: Option<&str>,
    ) -> Result<(), ClientError>;

    async fn get_case(&self, case_id: &str) -> Result<Case, ClientError>;

    async fn list_cases(&self, user_id: &str) -> Result<Vec<Case>, ClientError>;

    async fn related_users(&self, user_id: &str) -> Result<Vec<UserRef>, ClientError>;
}
