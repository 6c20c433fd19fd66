pub mod annotate;
pub mod classify;
pub mod error;
pub mod extractors;
pub mod patterns;
pub mod rules;
pub mod scanner;
pub mod summary;

use std::path::{Path, PathBuf};

use shared_docx::DocxDocument;
use shared_types::Finding;
use tracing::{info, warn};

pub use annotate::{annotate, annotate_file, AnnotatedDocument, Annotation, AnnotationKind};
pub use classify::{classify_process, classify_type, required_documents};
pub use error::ReviewError;
pub use scanner::ClauseScanner;
pub use summary::{build_summary, compose_message, user_message, DocumentReview};

/// Result of running one file through classify, scan and annotate
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub review: DocumentReview,
    /// Annotated copy, written only when the file had findings
    pub reviewed_path: Option<PathBuf>,
}

/// ComplianceEngine entry point
pub struct ComplianceEngine {
    scanner: ClauseScanner,
}

impl ComplianceEngine {
    pub fn new() -> Self {
        Self {
            scanner: ClauseScanner::new(),
        }
    }

    pub fn with_scanner(scanner: ClauseScanner) -> Self {
        Self { scanner }
    }

    /// Classify and scan an opened document
    pub fn review_document(&self, document: &DocxDocument, file_name: &str) -> DocumentReview {
        let document_type = classify_type(document, file_name);
        let findings = self.scanner.scan(document);
        info!(
            "{}: classified as {}, {} finding(s)",
            file_name,
            document_type,
            findings.len()
        );
        DocumentReview {
            file_name: file_name.to_string(),
            document_type,
            findings,
        }
    }

    /// Open, classify and scan the document at `path`
    pub fn review_file<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<(DocxDocument, DocumentReview), ReviewError> {
        let path = path.as_ref();
        let document = DocxDocument::open(path).map_err(|source| ReviewError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let review = self.review_document(&document, &file_name);
        Ok((document, review))
    }

    /// Review `src` and, when it has findings, write an annotated copy to `dst`.
    ///
    /// Only an unreadable source is an error. If the annotated copy cannot be written the
    /// failure is logged and `reviewed_path` stays `None`.
    pub fn process_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        src: P,
        dst: Q,
    ) -> Result<FileOutcome, ReviewError> {
        let (document, review) = self.review_file(src.as_ref())?;
        if review.findings.is_empty() {
            return Ok(FileOutcome {
                review,
                reviewed_path: None,
            });
        }

        let dst = dst.as_ref();
        let written = if annotate::same_file(src.as_ref(), dst) {
            Err(ReviewError::DestinationIsSource(dst.to_path_buf()))
        } else {
            annotate(document, &review.findings).and_then(|annotated| annotated.save(dst))
        };
        let reviewed_path = match written {
            Ok(()) => Some(dst.to_path_buf()),
            Err(err) => {
                warn!("Could not write reviewed copy of {}: {}", review.file_name, err);
                None
            }
        };

        Ok(FileOutcome {
            review,
            reviewed_path,
        })
    }

    /// Scan raw text
    pub fn check_text(&self, text: &str) -> Vec<Finding> {
        self.scanner.scan_text(text)
    }
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::new()
    }
}
