use std::path::PathBuf;

use casedesk_client::ClientError;
use casedesk_core::FileTypeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("{}: {source}", path.display())]
    DisallowedFileType {
        path: PathBuf,
        #[source]
        source: FileTypeError,
    },

    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("an upload for document type {0} is already in progress")]
    AlreadyInFlight(String),

    #[error("case {0} not found")]
    CaseNotFound(String),

    #[error("case {case_id} has no document requirement {requirement_id}")]
    RequirementNotFound {
        case_id: String,
        requirement_id: String,
    },

    #[error("requirement '{0}' is already satisfied")]
    RequirementSatisfied(String),

    #[error("uploaded document is '{extracted}', expected '{expected}'")]
    DocumentTypeMismatch { expected: String, extracted: String },

    #[error("document {document_id} was not classified after {attempts} attempts")]
    ProcessingTimedOut { document_id: String, attempts: u32 },

    #[error("processing of document {document_id} failed: {reason}")]
    ProcessingFailed { document_id: String, reason: String },

    #[error("upload cancelled")]
    Cancelled,

    #[error("updating requirement '{requirement}' failed: {source}")]
    UpdateFailed {
        requirement: String,
        #[source]
        source: ClientError,
    },
}
