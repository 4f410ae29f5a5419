//! Plain-text rendering of cases, listings and intake results.

use casedesk_core::{Case, DocumentStatusReport, Page};
use casedesk_intake::{BatchReport, SingleUpload, UploadState};

const MAX_CATEGORY_WIDTH: usize = 28;

// ── Listing ──

pub fn case_table(page: &Page<&Case>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<26} {:<28} {:<10} {:>8}  {}\n",
        "ID", "CATEGORY", "STATUS", "PROGRESS", "DEADLINE"
    ));
    for case in &page.items {
        let progress = case.progress();
        let status = if case.is_complete() { "completed" } else { "pending" };
        let ratio = format!("{}/{}", progress.satisfied, progress.required);
        out.push_str(&format!(
            "{:<26} {:<28} {:<10} {:>8}  {}\n",
            case.id,
            truncate(&case.category, MAX_CATEGORY_WIDTH),
            status,
            ratio,
            deadline(case),
        ));
    }
    out.push_str(&format!(
        "page {}/{} ({} cases)\n",
        page.page,
        page.pages.max(1),
        page.total
    ));
    out
}

// ── Case card ──

pub fn case_card(case: &Case) -> String {
    let progress = case.progress();
    let mut out = format!("=== {} ===\n", case.category);
    out.push_str(&format!("  {:<14} {}\n", "id", case.id));
    out.push_str(&format!("  {:<14} {}\n", "owner", case.user_id));
    out.push_str(&format!("  {:<14} {}\n", "status", case.status.as_str()));
    out.push_str(&format!("  {:<14} {}\n", "deadline", deadline(case)));
    out.push_str(&format!(
        "  {:<14} {}% ({}/{} required)\n",
        "progress", progress.percent, progress.satisfied, progress.required
    ));
    if let Some(next) = &progress.next_pending {
        out.push_str(&format!("  {:<14} {}\n", "next", next));
    }
    out.push('\n');
    out.push_str("Documents\n");
    for doc in &case.documents {
        let marker = if doc.status.is_satisfied() { "x" } else { " " };
        let optional = if doc.required { "" } else { " (optional)" };
        out.push_str(&format!(
            "  [{marker}] {:<30} {:<10} {}{optional}\n",
            doc.name,
            doc.status.as_str(),
            doc.id
        ));
    }
    out
}

// ── Intake results ──

pub fn single_result(done: &SingleUpload) -> String {
    format!(
        "matched '{}' -> requirement {} (document {})\n",
        done.extracted_type, done.requirement_id, done.document_id
    )
}

pub fn batch_result(report: &BatchReport) -> String {
    let mut out = format!("Smart upload for case {}\n", report.case_id);
    for file in &report.files {
        let name = file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.path.display().to_string());
        let detail = match &file.state {
            UploadState::Matched {
                requirement_id,
                extracted_type,
                ambiguous,
                ..
            } => {
                let flag = if *ambiguous { "  [review: ambiguous]" } else { "" };
                format!("'{extracted_type}' -> {requirement_id}{flag}")
            }
            UploadState::Unmatched { extracted_type, .. } => {
                format!("'{extracted_type}' matches no open requirement")
            }
            UploadState::Failed { reason, .. }
            | UploadState::Rejected { reason }
            | UploadState::UpdateFailed { reason, .. } => reason.clone(),
            UploadState::TimedOut { .. } => "not classified in time".to_string(),
            UploadState::Cancelled { .. } => "cancelled".to_string(),
            UploadState::Uploading | UploadState::Processing { .. } => String::new(),
        };
        let deleted = if file.deleted { " (deleted)" } else { "" };
        out.push_str(&format!(
            "  {:<28} {:<14} {detail}{deleted}\n",
            name,
            file.state.name()
        ));
    }
    out
}

pub fn document_status(report: &DocumentStatusReport) -> String {
    let mut out = format!("  {:<14} {}\n", "document", report.id);
    out.push_str(&format!("  {:<14} {}\n", "status", report.status));
    out.push_str(&format!(
        "  {:<14} {}\n",
        "type",
        report.extracted_type().unwrap_or("-")
    ));
    if let Some(reason) = report.failure() {
        out.push_str(&format!("  {:<14} {}\n", "error", reason));
    }
    out
}

fn deadline(case: &Case) -> String {
    case.deadline
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
