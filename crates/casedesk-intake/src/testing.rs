//! In-memory backend that records every call.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use casedesk_client::{CaseBackend, ClientError};
use casedesk_core::{
    Case, CaseStatus, DocumentRequirement, DocumentStatusReport, ExtractedData, RequirementStatus,
    UploadRequest, UserRef,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Upload(String),
    Status(String),
    Delete(String),
    Update {
        case_id: String,
        requirement_id: String,
        status: RequirementStatus,
        document_id: Option<String>,
    },
    GetCase(String),
    ListCases(String),
    RelatedUsers(String),
}

/// One scripted answer to a status query. The last step repeats forever.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    Pending,
    Extracted(&'static str),
    Failed,
    Error,
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    cases: Vec<Case>,
    related: HashMap<String, Vec<UserRef>>,
    failing_users: HashSet<String>,
    fail_updates: bool,
    file_scripts: HashMap<String, Vec<Step>>,
    doc_scripts: HashMap<String, VecDeque<Step>>,
    next_id: usize,
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn status_calls(&self, document_id: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Status(id) if id == document_id))
            .count()
    }

    pub fn add_case(&self, case: Case) {
        self.state().cases.push(case);
    }

    pub fn relate(&self, user_id: &str, users: Vec<UserRef>) {
        self.state().related.insert(user_id.to_string(), users);
    }

    pub fn fail_cases_for(&self, user_id: &str) {
        self.state().failing_users.insert(user_id.to_string());
    }

    pub fn fail_updates(&self) {
        self.state().fail_updates = true;
    }

    /// Status answers for whichever document gets uploaded from `file_name`.
    pub fn script_file(&self, file_name: &str, steps: Vec<Step>) {
        self.state().file_scripts.insert(file_name.to_string(), steps);
    }

    pub fn script_document(&self, document_id: &str, steps: Vec<Step>) {
        self.state()
            .doc_scripts
            .insert(document_id.to_string(), steps.into());
    }

    pub fn requirement_status(&self, case_id: &str, requirement_id: &str) -> Option<RequirementStatus> {
        self.state()
            .cases
            .iter()
            .find(|c| c.id == case_id)
            .and_then(|c| c.requirement(requirement_id))
            .map(|r| r.status)
    }
}

fn server_error(status: u16, body: &str) -> ClientError {
    ClientError::Server {
        status,
        body: body.to_string(),
    }
}

#[async_trait]
impl CaseBackend for FakeBackend {
    async fn upload_document(&self, request: &UploadRequest) -> Result<String, ClientError> {
        let mut state = self.state();
        state.calls.push(Call::Upload(request.file_name.clone()));
        state.next_id += 1;
        let id = format!("doc-{}", state.next_id);
        if let Some(steps) = state.file_scripts.get(&request.file_name).cloned() {
            state.doc_scripts.insert(id.clone(), steps.into());
        }
        Ok(id)
    }

    async fn document_status(&self, document_id: &str) -> Result<DocumentStatusReport, ClientError> {
        let mut state = self.state();
        state.calls.push(Call::Status(document_id.to_string()));
        let step = match state.doc_scripts.get_mut(document_id) {
            Some(steps) if steps.len() > 1 => steps.pop_front(),
            Some(steps) => steps.front().copied(),
            None => None,
        }
        .unwrap_or(Step::Pending);
        let report = |status: &str, doc_type: Option<&str>| DocumentStatusReport {
            id: document_id.to_string(),
            status: status.to_string(),
            processing_error: None,
            extracted_data: Some(ExtractedData {
                document_type: doc_type.map(str::to_string),
            }),
        };
        match step {
            Step::Pending => Ok(report("processing", None)),
            Step::Extracted(doc_type) => Ok(report("completed", Some(doc_type))),
            Step::Failed => Ok(report("failed", None)),
            Step::Error => Err(server_error(502, "bad gateway")),
        }
    }

    async fn delete_document(&self, document_id: &str) -> Result<(), ClientError> {
        self.state().calls.push(Call::Delete(document_id.to_string()));
        Ok(())
    }

    async fn update_document_status(
        &self,
        case_id: &str,
        requirement_id: &str,
        status: RequirementStatus,
        document_id: Option<&str>,
    ) -> Result<(), ClientError> {
        let mut state = self.state();
        state.calls.push(Call::Update {
            case_id: case_id.to_string(),
            requirement_id: requirement_id.to_string(),
            status,
            document_id: document_id.map(str::to_string),
        });
        if state.fail_updates {
            return Err(server_error(500, "update failed"));
        }
        let requirement = state
            .cases
            .iter_mut()
            .find(|c| c.id == case_id)
            .and_then(|c| c.documents.iter_mut().find(|d| d.id == requirement_id))
            .ok_or_else(|| server_error(404, "not found"))?;
        requirement.status = status;
        requirement.document_id = document_id.map(str::to_string);
        Ok(())
    }

    async fn get_case(&self, case_id: &str) -> Result<Case, ClientError> {
        let mut state = self.state();
        state.calls.push(Call::GetCase(case_id.to_string()));
        state
            .cases
            .iter()
            .find(|c| c.id == case_id)
            .cloned()
            .ok_or_else(|| server_error(404, "case not found"))
    }

    async fn list_cases(&self, user_id: &str) -> Result<Vec<Case>, ClientError> {
        let mut state = self.state();
        state.calls.push(Call::ListCases(user_id.to_string()));
        if state.failing_users.contains(user_id) {
            return Err(server_error(500, "boom"));
        }
        Ok(state
            .cases
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn related_users(&self, user_id: &str) -> Result<Vec<UserRef>, ClientError> {
        let mut state = self.state();
        state.calls.push(Call::RelatedUsers(user_id.to_string()));
        Ok(state.related.get(user_id).cloned().unwrap_or_default())
    }
}

pub fn case_with(id: &str, user_id: &str, requirements: &[(&str, &str, RequirementStatus)]) -> Case {
    Case {
        id: id.to_string(),
        user_id: user_id.to_string(),
        category: "Residence Permit".to_string(),
        status: CaseStatus::Pending,
        documents: requirements
            .iter()
            .map(|(rid, name, status)| DocumentRequirement {
                id: rid.to_string(),
                name: name.to_string(),
                required: true,
                document_type_id: Some(format!("type-{rid}")),
                status: *status,
                document_id: None,
            })
            .collect(),
        deadline: None,
    }
}

pub fn write_file(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"scan bytes").unwrap();
    path
}
