//! Document intake: upload → classification polling → requirement matching → reconciliation.

pub mod cancel;
mod error;
pub mod matcher;
pub mod pipeline;
pub mod poller;
pub mod reconciler;
pub mod uploader;

#[cfg(test)]
mod testing;

pub use cancel::{CancelHandle, CancelToken};
pub use error::IntakeError;
pub use matcher::{Assignment, BatchMatch, ProcessedDocument};
pub use pipeline::{BatchReport, FileReport, IntakeSession, SingleUpload, UploadState};
pub use poller::{PollOutcome, poll_document};
pub use reconciler::{CaseBook, reconcile};
