//! Cases (management entries) and the document requirements they track.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a case as reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    #[default]
    Pending,
    Completed,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

/// State of a single document slot within a case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementStatus {
    #[default]
    Pending,
    Uploaded,
    Approved,
    Completed,
}

impl RequirementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Uploaded => "uploaded",
            Self::Approved => "approved",
            Self::Completed => "completed",
        }
    }

    /// Approved and completed slots no longer accept uploads.
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Approved | Self::Completed)
    }
}

/// One required or optional document slot within a [`Case`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequirement {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type_id: Option<String>,
    #[serde(default)]
    pub status: RequirementStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

fn default_required() -> bool {
    true
}

impl DocumentRequirement {
    pub fn is_open(&self) -> bool {
        !self.status.is_satisfied()
    }
}

/// A law-firm workflow instance tracking one client's document collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: CaseStatus,
    #[serde(default)]
    pub documents: Vec<DocumentRequirement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

/// Completion summary over the required slots of a case.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseProgress {
    pub satisfied: usize,
    pub required: usize,
    /// 0–100. A case with no required slots is 100.
    pub percent: u8,
    /// First open required slot, in list order.
    pub next_pending: Option<String>,
}

impl Case {
    pub fn requirement(&self, requirement_id: &str) -> Option<&DocumentRequirement> {
        self.documents.iter().find(|d| d.id == requirement_id)
    }

    pub fn open_requirements(&self) -> impl Iterator<Item = &DocumentRequirement> {
        self.documents.iter().filter(|d| d.is_open())
    }

    /// A case is complete once the backend says so or every required slot is satisfied.
    pub fn is_complete(&self) -> bool {
        self.status == CaseStatus::Completed
            || self
                .documents
                .iter()
                .filter(|d| d.required)
                .all(|d| d.status.is_satisfied())
    }

    pub fn progress(&self) -> CaseProgress {
        let required: Vec<&DocumentRequirement> =
            self.documents.iter().filter(|d| d.required).collect();
        let satisfied = required.iter().filter(|d| d.status.is_satisfied()).count();
        let percent = if required.is_empty() {
            100
        } else {
            (satisfied * 100 / required.len()) as u8
        };
        let next_pending = required
            .iter()
            .find(|d| d.is_open())
            .map(|d| d.name.clone());

        CaseProgress {
            satisfied,
            required: required.len(),
            percent,
            next_pending,
        }
    }
}

/// A backend user, either the session owner or someone related to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn requirement(id: &str, name: &str, status: RequirementStatus) -> DocumentRequirement {
        DocumentRequirement {
            id: id.into(),
            name: name.into(),
            required: true,
            document_type_id: Some(format!("type-{id}")),
            status,
            document_id: None,
        }
    }

    fn visa_case() -> Case {
        let mut optional = requirement("r3", "Cover Letter", RequirementStatus::Pending);
        optional.required = false;
        Case {
            id: "case-1".into(),
            user_id: "user-1".into(),
            category: "Work Visa".into(),
            status: CaseStatus::Pending,
            documents: vec![
                requirement("r1", "Passport", RequirementStatus::Completed),
                requirement("r2", "Bank Statement", RequirementStatus::Uploaded),
                optional,
            ],
            deadline: None,
        }
    }

    #[test]
    fn satisfied_statuses() {
        assert!(!RequirementStatus::Pending.is_satisfied());
        assert!(!RequirementStatus::Uploaded.is_satisfied());
        assert!(RequirementStatus::Approved.is_satisfied());
        assert!(RequirementStatus::Completed.is_satisfied());
    }

    #[test]
    fn progress_counts_required_only() {
        let progress = visa_case().progress();
        assert_eq!(progress.satisfied, 1);
        assert_eq!(progress.required, 2);
        assert_eq!(progress.percent, 50);
        assert_eq!(progress.next_pending.as_deref(), Some("Bank Statement"));
    }

    #[test]
    fn progress_without_required_slots_is_full() {
        let mut case = visa_case();
        case.documents.clear();
        let progress = case.progress();
        assert_eq!(progress.percent, 100);
        assert!(progress.next_pending.is_none());
        assert!(case.is_complete());
    }

    #[test]
    fn complete_ignores_optional_slots() {
        let mut case = visa_case();
        case.documents[1].status = RequirementStatus::Approved;
        assert!(case.is_complete());
        assert_eq!(case.open_requirements().count(), 1);
    }

    #[test]
    fn backend_completed_status_wins() {
        let mut case = visa_case();
        case.status = CaseStatus::Completed;
        assert!(case.is_complete());
    }

    #[test]
    fn case_from_backend_json() {
        let json = r#"{
            "_id": "65f0c0",
            "userId": "u-9",
            "category": "Family Reunification",
            "status": "pending",
            "deadline": "2026-11-01T00:00:00Z",
            "documents": [
                {"_id": "d1", "name": "Passport", "documentTypeId": "t1", "status": "pending"},
                {"_id": "d2", "name": "Marriage Certificate", "required": false, "status": "approved", "documentId": "doc-4"}
            ]
        }"#;
        let case: Case = serde_json::from_str(json).unwrap();
        assert_eq!(case.user_id, "u-9");
        assert!(case.documents[0].required);
        assert!(!case.documents[1].required);
        assert_eq!(case.documents[1].document_id.as_deref(), Some("doc-4"));
        assert_eq!(case.requirement("d1").unwrap().name, "Passport");
        assert!(case.deadline.is_some());
    }
}
