//! Batch summary and checklist verification

use shared_types::{AnalysisSummary, DocumentType, Finding, IssueRecord};
use tracing::info;

use crate::classify::{classify_process, required_documents};

/// Review outcome of one uploaded file
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DocumentReview {
    pub file_name: String,
    pub document_type: DocumentType,
    pub findings: Vec<Finding>,
}

impl DocumentReview {
    pub fn issue_records(&self) -> impl Iterator<Item = IssueRecord> + '_ {
        self.findings.iter().map(|f| IssueRecord {
            document: self.document_type,
            issue: f.issue.clone(),
            severity: f.severity,
            suggestion: f.suggest.clone(),
            pattern: f.pattern.clone(),
            cite: f.cite.clone(),
        })
    }
}

/// Aggregate per-file reviews: infer the process, check the uploaded documents against
/// its checklist and collect every issue.
pub fn build_summary(reviews: &[DocumentReview]) -> AnalysisSummary {
    let uploaded_types: Vec<DocumentType> = reviews.iter().map(|r| r.document_type).collect();
    let process = classify_process(&uploaded_types);
    let required = required_documents(process);

    let missing_documents: Vec<DocumentType> = required
        .iter()
        .filter(|doc| !uploaded_types.contains(*doc))
        .copied()
        .collect();

    let issues_found: Vec<IssueRecord> = reviews.iter().flat_map(|r| r.issue_records()).collect();

    info!(
        "Batch of {} document(s): process {}, {} missing, {} issue(s)",
        reviews.len(),
        process,
        missing_documents.len(),
        issues_found.len()
    );

    AnalysisSummary {
        process,
        documents_uploaded: reviews.len(),
        required_documents: required.len(),
        missing_document: missing_documents.first().copied(),
        missing_documents,
        uploaded_types,
        issues_found,
    }
}

/// Checklist and issue overview shown to the user
pub fn user_message(summary: &AnalysisSummary) -> String {
    let mut message = format!(
        "It appears you're attempting **{}** in ADGM. You provided {} of {} required docs. ",
        summary.process.title(),
        summary.documents_uploaded,
        summary.required_documents
    );

    if let Some(missing) = summary.missing_document {
        message.push_str(&format!(
            "The missing document appears to be: '{}'.\n\n",
            missing
        ));
    }

    message.push_str("Key issues:\n");
    if summary.issues_found.is_empty() {
        message.push_str("None found.");
    } else {
        let lines: Vec<String> = summary
            .issues_found
            .iter()
            .map(|i| format!("- {}: {}", i.document, i.issue))
            .collect();
        message.push_str(&lines.join("\n"));
    }
    message
}

/// User message followed by the legal explanation
pub fn compose_message(summary: &AnalysisSummary, explanation: &str) -> String {
    format!("{}\n\n{}", user_message(summary), explanation)
}
