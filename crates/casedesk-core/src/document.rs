//! Processing status of an uploaded document.

use serde::{Deserialize, Serialize};

/// Classification output attached once backend processing finishes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedData {
    #[serde(default)]
    pub document_type: Option<String>,
}

/// Status of an uploaded document as returned by `GET /documents/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatusReport {
    #[serde(rename = "_id")]
    pub id: String,
    /// Backend lifecycle string (`pending`, `processing`, `completed`, `failed`, ...).
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "processing_error")]
    pub processing_error: Option<String>,
    #[serde(default)]
    pub extracted_data: Option<ExtractedData>,
}

/// The backend sends `processingError` as either a message or a boolean flag.
fn processing_error<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) | Some(serde_json::Value::Bool(false)) => None,
        Some(serde_json::Value::Bool(true)) => Some("processing error".to_string()),
        Some(serde_json::Value::String(s)) if s.is_empty() => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

impl DocumentStatusReport {
    /// Extracted type, if present and non-blank.
    pub fn extracted_type(&self) -> Option<&str> {
        self.extracted_data
            .as_ref()
            .and_then(|d| d.document_type.as_deref())
            .filter(|t| !t.trim().is_empty())
    }

    /// Processing ended without a usable result.
    pub fn failure(&self) -> Option<&str> {
        if let Some(err) = self.processing_error.as_deref() {
            return Some(err);
        }
        if self.status.eq_ignore_ascii_case("failed") {
            return Some("processing failed");
        }
        None
    }
}
