//! API handlers for the review server
//!
//! Provides REST endpoints for:
//! - Batch document review (classify, scan, annotate, checklist, explanation)
//! - Raw text scanning
//! - Document type and process listing

use std::fs;
use std::path::Path;

use axum::{extract::State, Json};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use compliance_engine::patterns::{keywords_for, PROCESS_DEFINITIONS};
use compliance_engine::{build_summary, compose_message, ComplianceEngine, DocumentReview};
use corpus_core::EXPLAIN_ISSUES_QUERY;
use shared_types::{AnalysisSummary, DocumentType, Finding};

use crate::error::ServerError;
use crate::AppState;

/// Prefix of annotated copies
pub const REVIEWED_PREFIX: &str = "reviewed_";
/// Name of the downloadable summary
pub const SUMMARY_FILE_NAME: &str = "analysis_summary.json";

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "review-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Supported document types response
#[derive(Serialize)]
pub struct DocumentTypesResponse {
    pub success: bool,
    pub document_types: Vec<DocumentTypeInfo>,
    pub processes: Vec<ProcessInfo>,
    pub total_types: usize,
}

#[derive(Serialize)]
pub struct DocumentTypeInfo {
    pub name: DocumentType,
    pub keywords: Vec<&'static str>,
}

#[derive(Serialize)]
pub struct ProcessInfo {
    pub name: String,
    pub keywords: Vec<&'static str>,
    pub required_documents: Vec<DocumentType>,
}

/// Handler: GET /api/document-types
pub async fn handle_list_document_types() -> Json<DocumentTypesResponse> {
    let document_types: Vec<DocumentTypeInfo> = DocumentType::KNOWN
        .iter()
        .map(|t| DocumentTypeInfo {
            name: *t,
            keywords: keywords_for(*t).to_vec(),
        })
        .collect();

    let processes = PROCESS_DEFINITIONS
        .iter()
        .map(|def| ProcessInfo {
            name: def.process.name().to_string(),
            keywords: def.keywords.to_vec(),
            required_documents: def.required.to_vec(),
        })
        .collect();

    let total_types = document_types.len();
    Json(DocumentTypesResponse {
        success: true,
        document_types,
        processes,
        total_types,
    })
}

/// Raw text scan request
#[derive(Deserialize)]
pub struct ScanRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct ScanResponse {
    pub success: bool,
    pub findings: Vec<Finding>,
    pub finding_count: usize,
}

/// Handler: POST /api/scan
pub async fn handle_scan(
    State(state): State<AppState>,
    Json(req): Json<ScanRequest>,
) -> Json<ScanResponse> {
    debug!("Scan request: {} chars", req.text.len());
    let findings = state.engine.check_text(&req.text);
    let finding_count = findings.len();
    Json(ScanResponse {
        success: true,
        findings,
        finding_count,
    })
}

/// One uploaded file
#[derive(Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub data_base64: String,
}

/// Batch review request body
#[derive(Deserialize)]
pub struct ReviewRequest {
    pub files: Vec<UploadedFile>,
}

/// Reviewed copy of one uploaded file
#[derive(Debug, Serialize)]
pub struct ReviewedFile {
    pub original: String,
    pub file_name: String,
    pub data_base64: String,
    /// False when annotation failed and the original bytes are returned instead
    pub annotated: bool,
}

#[derive(Serialize)]
pub struct ReviewResponse {
    pub success: bool,
    pub summary: AnalysisSummary,
    pub message: String,
    pub explanation: String,
    pub reviewed: Vec<ReviewedFile>,
    pub summary_json_base64: String,
}

/// Handler: POST /api/review
pub async fn handle_review(
    State(state): State<AppState>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>, ServerError> {
    if req.files.is_empty() {
        return Err(ServerError::InvalidRequest("No files uploaded".to_string()));
    }

    // Validate the whole batch before anything touches disk
    let mut files = Vec::with_capacity(req.files.len());
    for file in req.files {
        let name = validate_file_name(&file.name)?;
        let data = STANDARD.decode(file.data_base64.trim()).map_err(|e| {
            ServerError::InvalidRequest(format!("File '{}' is not valid base64: {}", name, e))
        })?;
        files.push((name, data));
    }
    info!("Review request: {} file(s)", files.len());

    let engine = state.engine.clone();
    let (summary, reviewed) = tokio::task::spawn_blocking(move || review_batch(&engine, files))
        .await
        .map_err(|e| ServerError::Internal(format!("Review task failed: {}", e)))??;

    let explanation = state.rag.explain(EXPLAIN_ISSUES_QUERY).await;
    let message = compose_message(&summary, &explanation);

    let summary_json = serde_json::to_vec_pretty(&summary)
        .map_err(|e| ServerError::Internal(format!("Cannot serialize summary: {}", e)))?;

    Ok(Json(ReviewResponse {
        success: true,
        summary,
        message,
        explanation,
        reviewed,
        summary_json_base64: STANDARD.encode(summary_json),
    }))
}

/// Run every file of a batch through the engine inside one temporary directory,
/// removed when this returns.
fn review_batch(
    engine: &ComplianceEngine,
    files: Vec<(String, Vec<u8>)>,
) -> Result<(AnalysisSummary, Vec<ReviewedFile>), ServerError> {
    let workdir = TempDir::new()?;
    let mut reviews: Vec<DocumentReview> = Vec::with_capacity(files.len());
    let mut reviewed = Vec::new();

    for (name, data) in files {
        let src = workdir.path().join(&name);
        let reviewed_name = format!("{}{}", REVIEWED_PREFIX, name);
        let dst = workdir.path().join(&reviewed_name);
        fs::write(&src, &data)?;

        let outcome = engine
            .process_file(&src, &dst)
            .map_err(|e| ServerError::from_review(&name, e))?;

        if !outcome.review.findings.is_empty() {
            let (bytes, annotated) = match &outcome.reviewed_path {
                Some(path) => (fs::read(path)?, true),
                None => {
                    warn!("Returning original bytes of {} as its reviewed copy", name);
                    (data, false)
                }
            };
            reviewed.push(ReviewedFile {
                original: name.clone(),
                file_name: reviewed_name,
                data_base64: STANDARD.encode(bytes),
                annotated,
            });
        }
        reviews.push(outcome.review);
    }

    Ok((build_summary(&reviews), reviewed))
}

/// Accept a bare `.docx` file name; anything with a directory part is rejected
pub fn validate_file_name(name: &str) -> Result<String, ServerError> {
    let trimmed = name.trim();
    let base = Path::new(trimmed)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    if trimmed.is_empty() || base != trimmed || trimmed.contains('\\') {
        return Err(ServerError::InvalidRequest(format!(
            "Invalid file name '{}'",
            name
        )));
    }
    let lower = trimmed.to_lowercase();
    if !lower.ends_with(".docx") || lower.len() == ".docx".len() {
        return Err(ServerError::InvalidRequest(format!(
            "Only .docx files are supported, got '{}'",
            name
        )));
    }
    Ok(trimmed.to_string())
}
