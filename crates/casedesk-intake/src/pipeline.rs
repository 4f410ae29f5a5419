//! Intake state machine.
//!
//! Every file moves `Uploading → Processing → {Matched, Unmatched, TimedOut,
//! Failed, Cancelled, UpdateFailed}`; files that fail validation go straight
//! to `Rejected` and never reach the backend. Uploads that end anywhere other
//! than `Matched` or `UpdateFailed` are deleted again as a compensating step.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use casedesk_client::CaseBackend;
use casedesk_core::{AllowedFileType, Case, PollConfig, RequirementStatus, Session, exact_match};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::matcher::{self, ProcessedDocument};
use crate::poller::{PollOutcome, poll_document};
use crate::reconciler::{CaseBook, reconcile};
use crate::uploader::{build_request, check_file};
use crate::{CancelToken, IntakeError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Uploading,
    Processing {
        document_id: String,
    },
    Matched {
        document_id: String,
        requirement_id: String,
        extracted_type: String,
        ambiguous: bool,
    },
    Unmatched {
        document_id: String,
        extracted_type: String,
    },
    TimedOut {
        document_id: String,
    },
    Failed {
        document_id: Option<String>,
        reason: String,
    },
    Cancelled {
        document_id: Option<String>,
    },
    Rejected {
        reason: String,
    },
    /// Matched, but the requirement could not be marked completed.
    UpdateFailed {
        document_id: String,
        requirement_id: String,
        reason: String,
    },
}

impl UploadState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uploading => "uploading",
            Self::Processing { .. } => "processing",
            Self::Matched { .. } => "matched",
            Self::Unmatched { .. } => "unmatched",
            Self::TimedOut { .. } => "timed-out",
            Self::Failed { .. } => "failed",
            Self::Cancelled { .. } => "cancelled",
            Self::Rejected { .. } => "rejected",
            Self::UpdateFailed { .. } => "update-failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Uploading | Self::Processing { .. })
    }

    pub fn can_advance_to(&self, next: &UploadState) -> bool {
        match self {
            Self::Uploading => matches!(
                next,
                Self::Processing { .. }
                    | Self::Rejected { .. }
                    | Self::Failed { document_id: None, .. }
                    | Self::Cancelled { document_id: None }
            ),
            Self::Processing { .. } => next.is_terminal() && !matches!(next, Self::Rejected { .. }),
            _ => false,
        }
    }

    /// Id of the uploaded document, once there is one.
    pub fn document_id(&self) -> Option<&str> {
        match self {
            Self::Uploading | Self::Rejected { .. } => None,
            Self::Processing { document_id }
            | Self::Matched { document_id, .. }
            | Self::Unmatched { document_id, .. }
            | Self::TimedOut { document_id }
            | Self::UpdateFailed { document_id, .. } => Some(document_id),
            Self::Failed { document_id, .. } | Self::Cancelled { document_id } => {
                document_id.as_deref()
            }
        }
    }

    /// Terminal states whose upload should not be kept.
    fn needs_cleanup(&self) -> bool {
        matches!(
            self,
            Self::Unmatched { .. } | Self::TimedOut { .. } | Self::Failed { .. } | Self::Cancelled { .. }
        ) && self.document_id().is_some()
    }
}

/// Final state of one file in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub state: UploadState,
    /// The compensating delete went through.
    pub deleted: bool,
}

impl FileReport {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            state: UploadState::Uploading,
            deleted: false,
        }
    }

    fn advance(&mut self, next: UploadState) {
        debug_assert!(
            self.state.can_advance_to(&next),
            "invalid transition {} -> {}",
            self.state.name(),
            next.name()
        );
        debug!(
            path = %self.path.display(),
            from = self.state.name(),
            to = next.name(),
            "upload state"
        );
        self.state = next;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub case_id: String,
    /// One entry per input path, in input order.
    pub files: Vec<FileReport>,
}

impl BatchReport {
    fn in_state<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FileReport> + 'a {
        self.files.iter().filter(move |f| f.state.name() == name)
    }

    pub fn matched(&self) -> impl Iterator<Item = &FileReport> {
        self.in_state("matched")
    }

    pub fn rejected(&self) -> impl Iterator<Item = &FileReport> {
        self.in_state("rejected")
    }

    pub fn update_failed(&self) -> impl Iterator<Item = &FileReport> {
        self.in_state("update-failed")
    }

    pub fn ambiguous(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|f| matches!(f.state, UploadState::Matched { ambiguous: true, .. }))
    }

    pub fn deleted(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.deleted)
    }
}

/// Result of a successful single upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleUpload {
    pub document_id: String,
    pub requirement_id: String,
    pub extracted_type: String,
}

/// Releases an in-flight document type when dropped.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    key: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut set = self.set.lock().unwrap_or_else(|e| e.into_inner());
        set.remove(&self.key);
    }
}

/// Runs uploads for one authenticated user.
pub struct IntakeSession {
    backend: Arc<dyn CaseBackend>,
    session: Session,
    poll: PollConfig,
    form_category: Option<String>,
    in_flight: Mutex<HashSet<String>>,
}

impl IntakeSession {
    pub fn new(backend: Arc<dyn CaseBackend>, session: Session, poll: PollConfig) -> Self {
        Self {
            backend,
            session,
            poll,
            form_category: None,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Sent as `form_category` with every upload.
    pub fn with_form_category(mut self, category: impl Into<String>) -> Self {
        self.form_category = Some(category.into());
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn claim(&self, key: &str) -> Result<InFlightGuard<'_>, IntakeError> {
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(key.to_string()) {
            return Err(IntakeError::AlreadyInFlight(key.to_string()));
        }
        Ok(InFlightGuard {
            set: &self.in_flight,
            key: key.to_string(),
        })
    }

    async fn load_case(&self, case_id: &str) -> Result<Case, IntakeError> {
        self.backend.get_case(case_id).await.map_err(|err| {
            if err.is_not_found() {
                IntakeError::CaseNotFound(case_id.to_string())
            } else {
                IntakeError::Client(err)
            }
        })
    }

    async fn discard(&self, report: &mut FileReport) {
        if !report.state.needs_cleanup() {
            return;
        }
        let Some(document_id) = report.state.document_id() else {
            return;
        };
        match self.backend.delete_document(document_id).await {
            Ok(()) => {
                info!(document_id, state = report.state.name(), "discarded upload");
                report.deleted = true;
            }
            Err(err) => warn!(document_id, error = %err, "could not delete upload"),
        }
    }

    /// Upload one file for a named requirement and complete it if the
    /// extracted type matches the requirement name exactly.
    pub async fn upload_single(
        &self,
        case_id: &str,
        requirement_id: &str,
        path: &Path,
        cancel: &CancelToken,
    ) -> Result<SingleUpload, IntakeError> {
        let file_type = check_file(path)?;

        let case = self.load_case(case_id).await?;
        let requirement = case
            .requirement(requirement_id)
            .ok_or_else(|| IntakeError::RequirementNotFound {
                case_id: case_id.to_string(),
                requirement_id: requirement_id.to_string(),
            })?;
        if requirement.status.is_satisfied() {
            return Err(IntakeError::RequirementSatisfied(requirement.name.clone()));
        }

        let key = requirement
            .document_type_id
            .as_deref()
            .unwrap_or(&requirement.id);
        let _guard = self.claim(key)?;

        let mut report = FileReport::new(path);
        let request = build_request(
            path,
            file_type,
            case_id,
            Some(requirement),
            self.form_category.as_deref(),
        )
        .await?;
        let document_id = self.backend.upload_document(&request).await?;
        report.advance(UploadState::Processing {
            document_id: document_id.clone(),
        });

        let outcome = poll_document(self.backend.as_ref(), &document_id, &self.poll, cancel).await;
        let result = match outcome {
            PollOutcome::Extracted(extracted) if exact_match(&extracted, &requirement.name) => {
                match self
                    .backend
                    .update_document_status(
                        case_id,
                        &requirement.id,
                        RequirementStatus::Completed,
                        Some(&document_id),
                    )
                    .await
                {
                    Ok(()) => {
                        info!(case_id, requirement = %requirement.name, document_id = %document_id, "requirement completed");
                        report.advance(UploadState::Matched {
                            document_id: document_id.clone(),
                            requirement_id: requirement.id.clone(),
                            extracted_type: extracted.clone(),
                            ambiguous: false,
                        });
                        Ok(SingleUpload {
                            document_id: document_id.clone(),
                            requirement_id: requirement.id.clone(),
                            extracted_type: extracted,
                        })
                    }
                    Err(source) => {
                        report.advance(UploadState::UpdateFailed {
                            document_id: document_id.clone(),
                            requirement_id: requirement.id.clone(),
                            reason: source.to_string(),
                        });
                        Err(IntakeError::UpdateFailed {
                            requirement: requirement.name.clone(),
                            source,
                        })
                    }
                }
            }
            PollOutcome::Extracted(extracted) => {
                report.advance(UploadState::Unmatched {
                    document_id: document_id.clone(),
                    extracted_type: extracted.clone(),
                });
                Err(IntakeError::DocumentTypeMismatch {
                    expected: requirement.name.clone(),
                    extracted,
                })
            }
            PollOutcome::Failed(reason) => {
                report.advance(UploadState::Failed {
                    document_id: Some(document_id.clone()),
                    reason: reason.clone(),
                });
                Err(IntakeError::ProcessingFailed {
                    document_id: document_id.clone(),
                    reason,
                })
            }
            PollOutcome::TimedOut => {
                report.advance(UploadState::TimedOut {
                    document_id: document_id.clone(),
                });
                Err(IntakeError::ProcessingTimedOut {
                    document_id: document_id.clone(),
                    attempts: self.poll.max_attempts,
                })
            }
            PollOutcome::Cancelled => {
                report.advance(UploadState::Cancelled {
                    document_id: Some(document_id.clone()),
                });
                Err(IntakeError::Cancelled)
            }
        };

        self.discard(&mut report).await;
        result
    }

    /// Upload a batch of files for a case and let the matcher pick requirements.
    ///
    /// Disallowed files are rejected up front. Valid files are uploaded one by
    /// one, then polled concurrently. Each assignment gets exactly one status
    /// update; every other upload gets exactly one delete.
    pub async fn smart_upload(
        &self,
        case_id: &str,
        paths: &[PathBuf],
        cancel: &CancelToken,
    ) -> Result<BatchReport, IntakeError> {
        let mut report = BatchReport {
            case_id: case_id.to_string(),
            files: paths.iter().map(|p| FileReport::new(p)).collect(),
        };

        let mut accepted: Vec<(usize, AllowedFileType)> = Vec::new();
        for (i, path) in paths.iter().enumerate() {
            match check_file(path) {
                Ok(file_type) => accepted.push((i, file_type)),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "rejected");
                    report.files[i].advance(UploadState::Rejected {
                        reason: err.to_string(),
                    });
                }
            }
        }
        if accepted.is_empty() {
            return Ok(report);
        }

        let case = self.load_case(case_id).await?;

        let mut processing: Vec<usize> = Vec::new();
        for (i, file_type) in accepted {
            if cancel.is_cancelled() {
                report.files[i].advance(UploadState::Cancelled { document_id: None });
                continue;
            }
            let uploaded = match build_request(
                &paths[i],
                file_type,
                case_id,
                None,
                self.form_category.as_deref(),
            )
            .await
            {
                Ok(request) => self
                    .backend
                    .upload_document(&request)
                    .await
                    .map_err(IntakeError::from),
                Err(err) => Err(err),
            };
            match uploaded {
                Ok(document_id) => {
                    report.files[i].advance(UploadState::Processing { document_id });
                    processing.push(i);
                }
                Err(err) => {
                    warn!(path = %paths[i].display(), error = %err, "upload failed");
                    report.files[i].advance(UploadState::Failed {
                        document_id: None,
                        reason: err.to_string(),
                    });
                }
            }
        }

        let document_ids: Vec<String> = processing
            .iter()
            .filter_map(|&i| report.files[i].state.document_id().map(str::to_string))
            .collect();
        let outcomes = join_all(
            document_ids
                .iter()
                .map(|id| poll_document(self.backend.as_ref(), id, &self.poll, cancel)),
        )
        .await;

        let mut classified = Vec::new();
        for ((&i, document_id), outcome) in processing.iter().zip(&document_ids).zip(outcomes) {
            match outcome {
                PollOutcome::Extracted(extracted_type) => classified.push((
                    i,
                    ProcessedDocument {
                        document_id: document_id.clone(),
                        extracted_type,
                    },
                )),
                PollOutcome::Failed(reason) => report.files[i].advance(UploadState::Failed {
                    document_id: Some(document_id.clone()),
                    reason,
                }),
                PollOutcome::TimedOut => report.files[i].advance(UploadState::TimedOut {
                    document_id: document_id.clone(),
                }),
                PollOutcome::Cancelled => report.files[i].advance(UploadState::Cancelled {
                    document_id: Some(document_id.clone()),
                }),
            }
        }

        let documents: Vec<ProcessedDocument> = classified.iter().map(|(_, d)| d.clone()).collect();
        let batch = matcher::assign(&case, &documents);

        for (i, document) in classified {
            let assignment = batch
                .assignments
                .iter()
                .find(|a| a.document_id == document.document_id);
            let Some(assignment) = assignment else {
                report.files[i].advance(UploadState::Unmatched {
                    document_id: document.document_id,
                    extracted_type: document.extracted_type,
                });
                continue;
            };
            let next = match self
                .backend
                .update_document_status(
                    case_id,
                    &assignment.requirement_id,
                    RequirementStatus::Completed,
                    Some(&assignment.document_id),
                )
                .await
            {
                Ok(()) => UploadState::Matched {
                    document_id: assignment.document_id.clone(),
                    requirement_id: assignment.requirement_id.clone(),
                    extracted_type: assignment.extracted_type.clone(),
                    ambiguous: assignment.ambiguous,
                },
                Err(err) => {
                    warn!(
                        requirement = %assignment.requirement_name,
                        error = %err,
                        "status update failed"
                    );
                    UploadState::UpdateFailed {
                        document_id: assignment.document_id.clone(),
                        requirement_id: assignment.requirement_id.clone(),
                        reason: err.to_string(),
                    }
                }
            };
            report.files[i].advance(next);
        }

        for file in &mut report.files {
            self.discard(file).await;
        }

        info!(
            case_id,
            files = report.files.len(),
            matched = report.matched().count(),
            deleted = report.deleted().count(),
            rejected = report.rejected().count(),
            "smart upload finished"
        );
        Ok(report)
    }

    /// Re-fetch every case visible to the session user.
    pub async fn reconcile(&self) -> Result<CaseBook, IntakeError> {
        Ok(reconcile(self.backend.as_ref(), self.session.user_id()).await?)
    }
}
