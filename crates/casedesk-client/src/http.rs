//! HTTP backend for the casedesk REST API.

use async_trait::async_trait;
use casedesk_core::{Case, DocumentStatusReport, RequirementStatus, Session, UploadRequest, UserRef};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{CaseBackend, ClientError};

/// REST client that authenticates every request with the session's bearer token.
pub struct HttpBackend {
    client: reqwest::Client,
    session: Session,
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(rename = "_id", alias = "id", alias = "documentId")]
    id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusUpdate<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    document_id: Option<&'a str>,
}

impl HttpBackend {
    pub fn new(session: Session) -> Self {
        Self {
            client: reqwest::Client::new(),
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Turn non-2xx responses into [`ClientError::Server`] with the body attached.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.session.url(path);
        debug!(url = %url, "GET");
        let resp = self
            .client
            .get(&url)
            .bearer_auth(self.session.token())
            .send()
            .await?;
        let bytes = Self::check(resp).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn upload_form(request: &UploadRequest) -> Result<Form, ClientError> {
    let file = Part::bytes(request.bytes.clone())
        .file_name(request.file_name.clone())
        .mime_str(request.file_type.mime())?;
    let form = request
        .form_fields()
        .into_iter()
        .fold(Form::new().part("file", file), |form, (key, value)| {
            form.text(key, value)
        });
    Ok(form)
}

#[async_trait]
impl CaseBackend for HttpBackend {
    async fn upload_document(&self, request: &UploadRequest) -> Result<String, ClientError> {
        let url = self.session.url("documents");
        info!(
            url = %url,
            file = %request.file_name,
            case_id = %request.management_id,
            bytes = request.bytes.len(),
            "uploading document"
        );
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.session.token())
            .multipart(upload_form(request)?)
            .send()
            .await?;
        let bytes = Self::check(resp).await?.bytes().await?;
        let uploaded: UploadResponse = serde_json::from_slice(&bytes)?;
        info!(document_id = %uploaded.id, "upload accepted");
        Ok(uploaded.id)
    }

    async fn document_status(&self, document_id: &str) -> Result<DocumentStatusReport, ClientError> {
        self.get_json(&format!("documents/{document_id}")).await
    }

    async fn delete_document(&self, document_id: &str) -> Result<(), ClientError> {
        let url = self.session.url(&format!("documents/{document_id}"));
        info!(url = %url, "deleting document");
        let resp = self
            .client
            .delete(&url)
            .bearer_auth(self.session.token())
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn update_document_status(
        &self,
        case_id: &str,
        requirement_id: &str,
        status: RequirementStatus,
        document_id: Option<&str>,
    ) -> Result<(), ClientError> {
        let url = self
            .session
            .url(&format!("management/{case_id}/documents/{requirement_id}"));
        info!(url = %url, status = status.as_str(), "updating requirement status");
        let resp = self
            .client
            .patch(&url)
            .bearer_auth(self.session.token())
            .json(&StatusUpdate {
                status: status.as_str(),
                document_id,
            })
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn get_case(&self, case_id: &str) -> Result<Case, ClientError> {
        self.get_json(&format!("management/{case_id}")).await
    }

    async fn list_cases(&self, user_id: &str) -> Result<Vec<Case>, ClientError> {
        let cases: Vec<Case> = self.get_json(&format!("management/user/{user_id}")).await?;
        info!(user_id, count = cases.len(), "fetched cases");
        Ok(cases)
    }

    async fn related_users(&self, user_id: &str) -> Result<Vec<UserRef>, ClientError> {
        self.get_json(&format!("users/{user_id}/related")).await
    }
}
