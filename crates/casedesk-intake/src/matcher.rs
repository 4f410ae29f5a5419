//! Assigning classified uploads to a case's open requirements.
//!
//! A requirement is a candidate for a document when it is open and its name
//! equals or is contained in the document's extracted type. Assignment is a
//! maximum-cardinality bipartite matching found with augmenting paths, so an
//! early document never blocks a later one that has fewer options.
//!
//! Ties are broken deterministically: documents in upload order, and each
//! document tries exact-name candidates before contained ones, then
//! requirement list order. Any assignment made where either side had a
//! choice is flagged `ambiguous` for manual review.

use casedesk_core::{Case, MatchKind, classify};
use tracing::{debug, info};

/// An upload that finished processing with a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedDocument {
    pub document_id: String,
    pub extracted_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub document_id: String,
    pub requirement_id: String,
    pub requirement_name: String,
    pub extracted_type: String,
    pub kind: MatchKind,
    pub ambiguous: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchMatch {
    /// In document order.
    pub assignments: Vec<Assignment>,
    /// Document ids with no assignment, in document order.
    pub unmatched: Vec<String>,
}

/// Compute the assignment of `documents` to the open requirements of `case`.
pub fn assign(case: &Case, documents: &[ProcessedDocument]) -> BatchMatch {
    let open: Vec<_> = case.open_requirements().collect();

    // candidates[d] = (requirement index, kind), best first.
    let candidates: Vec<Vec<(usize, MatchKind)>> = documents
        .iter()
        .map(|doc| {
            let mut found: Vec<(usize, MatchKind)> = open
                .iter()
                .enumerate()
                .filter_map(|(r, req)| classify(&doc.extracted_type, &req.name).map(|k| (r, k)))
                .collect();
            found.sort_by_key(|&(r, kind)| (kind, r));
            found
        })
        .collect();

    let mut demand = vec![0usize; open.len()];
    for found in &candidates {
        for &(r, _) in found {
            demand[r] += 1;
        }
    }

    let mut owner: Vec<Option<usize>> = vec![None; open.len()];
    for d in 0..documents.len() {
        let mut visited = vec![false; open.len()];
        if !augment(d, &candidates, &mut owner, &mut visited) {
            debug!(document_id = %documents[d].document_id, "no augmenting path");
        }
    }

    let mut assigned_to: Vec<Option<usize>> = vec![None; documents.len()];
    for (r, d) in owner.iter().enumerate() {
        if let Some(d) = d {
            assigned_to[*d] = Some(r);
        }
    }

    let mut result = BatchMatch::default();
    for (d, doc) in documents.iter().enumerate() {
        match assigned_to[d] {
            Some(r) => {
                let kind = candidates[d]
                    .iter()
                    .find(|(cand, _)| *cand == r)
                    .map(|(_, k)| *k)
                    .unwrap_or(MatchKind::Contained);
                let requirement = open[r];
                let ambiguous = candidates[d].len() > 1 || demand[r] > 1;
                info!(
                    document_id = %doc.document_id,
                    requirement = %requirement.name,
                    ambiguous,
                    "assigned"
                );
                result.assignments.push(Assignment {
                    document_id: doc.document_id.clone(),
                    requirement_id: requirement.id.clone(),
                    requirement_name: requirement.name.clone(),
                    extracted_type: doc.extracted_type.clone(),
                    kind,
                    ambiguous,
                });
            }
            None => {
                info!(
                    document_id = %doc.document_id,
                    extracted_type = %doc.extracted_type,
                    "no open requirement matches"
                );
                result.unmatched.push(doc.document_id.clone());
            }
        }
    }
    result
}

/// Kuhn's augmenting path step for document `d`.
///
/// A free candidate always wins over displacing an earlier document, so
/// documents keep their preferred slot unless that would cost a match.
fn augment(
    d: usize,
    candidates: &[Vec<(usize, MatchKind)>],
    owner: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for &(r, _) in &candidates[d] {
        if !visited[r] && owner[r].is_none() {
            visited[r] = true;
            owner[r] = Some(d);
            return true;
        }
    }
    for &(r, _) in &candidates[d] {
        if visited[r] {
            continue;
        }
        visited[r] = true;
        if let Some(other) = owner[r] {
            if augment(other, candidates, owner, visited) {
                owner[r] = Some(d);
                return true;
            }
        }
    }
    false
}
