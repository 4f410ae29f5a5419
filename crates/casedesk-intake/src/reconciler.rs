//! Refreshing local case state from the backend after mutations.

use std::collections::HashSet;

use casedesk_client::{CaseBackend, ClientError};
use casedesk_core::Case;
use tracing::{info, warn};

/// Snapshot of every case visible to a user, replaced wholesale on each refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseBook {
    cases: Vec<Case>,
}

impl CaseBook {
    pub fn new(cases: Vec<Case>) -> Self {
        Self { cases }
    }

    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    pub fn get(&self, case_id: &str) -> Option<&Case> {
        self.cases.iter().find(|c| c.id == case_id)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Cases that are not complete yet.
    pub fn pending_count(&self) -> usize {
        self.cases.iter().filter(|c| !c.is_complete()).count()
    }
}

/// Fetch the cases of `user_id` and of every related user.
///
/// The user's own cases must load; a related user whose cases fail to load
/// is logged and skipped. Cases seen twice keep their first occurrence.
pub async fn reconcile(backend: &dyn CaseBackend, user_id: &str) -> Result<CaseBook, ClientError> {
    let mut cases = backend.list_cases(user_id).await?;

    let related = match backend.related_users(user_id).await {
        Ok(users) => users,
        Err(err) => {
            warn!(user_id, error = %err, "could not load related users");
            Vec::new()
        }
    };
    for user in related.iter().filter(|u| u.id != user_id) {
        match backend.list_cases(&user.id).await {
            Ok(more) => cases.extend(more),
            Err(err) => warn!(user_id = %user.id, error = %err, "skipping related user's cases"),
        }
    }

    let mut seen = HashSet::new();
    cases.retain(|c| seen.insert(c.id.clone()));

    let book = CaseBook::new(cases);
    info!(
        user_id,
        related = related.len(),
        cases = book.len(),
        pending = book.pending_count(),
        "reconciled cases"
    );
    Ok(book)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeBackend, case_with};
    use casedesk_core::{RequirementStatus, UserRef};

    #[tokio::test]
    async fn merges_related_users_and_dedupes() {
        let backend = FakeBackend::new();
        backend.add_case(case_with("c1", "user-1", &[("r1", "Passport", RequirementStatus::Pending)]));
        backend.add_case(case_with("c2", "user-2", &[("r2", "Passport", RequirementStatus::Completed)]));
        backend.relate(
            "user-1",
            vec![
                UserRef { id: "user-2".into(), name: "Spouse".into() },
                UserRef { id: "user-1".into(), name: "Self".into() },
            ],
        );

        let book = reconcile(&backend, "user-1").await.unwrap();

        assert_eq!(book.len(), 2);
        assert_eq!(book.pending_count(), 1);
        assert!(book.get("c2").is_some());
        assert_eq!(
            backend.calls(),
            [
                Call::ListCases("user-1".into()),
                Call::RelatedUsers("user-1".into()),
                Call::ListCases("user-2".into()),
            ]
        );
    }

    #[tokio::test]
    async fn failing_related_user_is_skipped() {
        let backend = FakeBackend::new();
        backend.add_case(case_with("c1", "user-1", &[("r1", "Passport", RequirementStatus::Pending)]));
        backend.relate("user-1", vec![UserRef { id: "ghost".into(), name: String::new() }]);
        backend.fail_cases_for("ghost");

        let book = reconcile(&backend, "user-1").await.unwrap();

        assert_eq!(book.len(), 1);
    }

    #[tokio::test]
    async fn own_cases_must_load() {
        let backend = FakeBackend::new();
        backend.fail_cases_for("user-1");
        assert!(reconcile(&backend, "user-1").await.is_err());
    }
}
