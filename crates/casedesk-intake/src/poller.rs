//! Polling a document until the backend has classified it.

use casedesk_client::CaseBackend;
use casedesk_core::PollConfig;
use tracing::{debug, info, warn};

use crate::CancelToken;

/// How polling ended. Only `Extracted` is a success; running out of
/// attempts is a soft outcome the caller decides how to handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Extracted(String),
    Failed(String),
    TimedOut,
    Cancelled,
}

/// Query `document_id` until it has an extracted type, fails, the attempt
/// budget runs out, or `cancel` fires.
///
/// A failing status query consumes an attempt; there is no other retry.
pub async fn poll_document(
    backend: &dyn CaseBackend,
    document_id: &str,
    config: &PollConfig,
    cancel: &CancelToken,
) -> PollOutcome {
    for attempt in 0..config.max_attempts {
        if cancel.is_cancelled() {
            info!(document_id, attempt, "polling cancelled");
            return PollOutcome::Cancelled;
        }

        match backend.document_status(document_id).await {
            Ok(report) => {
                if let Some(doc_type) = report.extracted_type() {
                    info!(document_id, attempt, doc_type, "document classified");
                    return PollOutcome::Extracted(doc_type.to_string());
                }
                if let Some(reason) = report.failure() {
                    warn!(document_id, attempt, reason, "document processing failed");
                    return PollOutcome::Failed(reason.to_string());
                }
                debug!(document_id, attempt, status = %report.status, "not classified yet");
            }
            Err(err) => {
                warn!(document_id, attempt, error = %err, "status query failed");
            }
        }

        if attempt + 1 < config.max_attempts {
            tokio::select! {
                _ = tokio::time::sleep(config.interval(attempt)) => {}
                _ = cancel.cancelled() => {
                    info!(document_id, attempt, "polling cancelled");
                    return PollOutcome::Cancelled;
                }
            }
        }
    }

    warn!(document_id, attempts = config.max_attempts, "document not classified in time");
    PollOutcome::TimedOut
}
