//! Reviewer annotations
//!
//! Each finding becomes a native comment anchored to the first paragraph containing its
//! pattern, or to the last paragraph when nothing matches. When the package cannot take a
//! native comment the finding is written as a visible `[REVIEWER NOTE]` paragraph instead.
//! Native comment failures never reach the caller.

use std::fs;
use std::path::Path;

use chrono::Utc;
use shared_docx::comments::{anchor_comment, comment_element};
use shared_docx::{CommentsPart, DocxDocument, DocxError};
use shared_types::Finding;
use tracing::{debug, info, warn};

use crate::error::ReviewError;

pub const COMMENT_AUTHOR: &str = "Corporate Agent";
pub const COMMENT_INITIALS: &str = "AI";
pub const FALLBACK_PREFIX: &str = "[REVIEWER NOTE]";

/// How a finding ended up in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Comment { id: u32 },
    FallbackNote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub issue: String,
    pub pattern: String,
    /// Body paragraph carrying the comment, or the appended note paragraph
    pub paragraph: usize,
    pub kind: AnnotationKind,
}

/// Annotation state for one document: the document itself, its comments part once
/// loaded, and the next comment id to hand out.
pub struct AnnotationSession {
    document: DocxDocument,
    comments: Option<CommentsPart>,
    next_comment_id: u32,
    /// Paragraphs present before annotation started; notes appended later are never anchors
    original_paragraphs: usize,
    date: String,
    annotations: Vec<Annotation>,
}

impl AnnotationSession {
    pub fn new(document: DocxDocument) -> Self {
        let date = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        Self::with_date(document, date)
    }

    /// Session stamping every comment with a fixed date
    pub fn with_date(document: DocxDocument, date: String) -> Self {
        let original_paragraphs = document.paragraph_count();
        Self {
            document,
            comments: None,
            next_comment_id: 0,
            original_paragraphs,
            date,
            annotations: Vec::new(),
        }
    }

    /// Paragraph a finding with `pattern` should be attached to.
    ///
    /// An empty pattern, or one no paragraph contains, anchors to the last paragraph.
    /// `None` only for a document without paragraphs.
    pub fn anchor_for(&self, pattern: &str) -> Option<usize> {
        let last = self.original_paragraphs.checked_sub(1)?;
        if pattern.is_empty() {
            return Some(last);
        }
        let pattern = pattern.to_lowercase();
        let matched = self
            .document
            .paragraphs()
            .into_iter()
            .take(self.original_paragraphs)
            .find(|p| p.text.to_lowercase().contains(&pattern))
            .map(|p| p.index);
        Some(matched.unwrap_or(last))
    }

    /// Record one finding, as a native comment when possible and as a note otherwise
    pub fn annotate_finding(&mut self, finding: &Finding) {
        if finding.issue.trim().is_empty() {
            debug!("Skipping finding without issue text (pattern {:?})", finding.pattern);
            return;
        }

        match self.add_comment(finding) {
            Ok((id, paragraph)) => {
                debug!("Comment {} anchored to paragraph {}", id, paragraph);
                self.annotations.push(Annotation {
                    issue: finding.issue.clone(),
                    pattern: finding.pattern.clone(),
                    paragraph,
                    kind: AnnotationKind::Comment { id },
                });
            }
            Err(err) => {
                warn!(
                    "Native comment failed for '{}', adding reviewer note: {}",
                    finding.issue, err
                );
                match self.add_note(finding) {
                    Ok(paragraph) => self.annotations.push(Annotation {
                        issue: finding.issue.clone(),
                        pattern: finding.pattern.clone(),
                        paragraph,
                        kind: AnnotationKind::FallbackNote,
                    }),
                    Err(err) => warn!("Reviewer note for '{}' dropped: {}", finding.issue, err),
                }
            }
        }
    }

    /// Insert a native comment. Nothing is written to the document unless the anchor
    /// paragraph and comments part are both available.
    pub fn add_comment(&mut self, finding: &Finding) -> Result<(u32, usize), DocxError> {
        let paragraph = self
            .anchor_for(&finding.pattern)
            .ok_or_else(|| DocxError::Malformed("no paragraph to anchor a comment".to_string()))?;

        if self.comments.is_none() {
            let part = CommentsPart::open_or_create(&mut self.document)?;
            self.next_comment_id = self.next_comment_id.max(part.next_free_id()?);
            self.comments = Some(part);
        }
        let comments = self
            .comments
            .as_mut()
            .ok_or_else(|| DocxError::Malformed("comments part not loaded".to_string()))?;
        let anchor = self
            .document
            .paragraph_element_mut(paragraph)
            .ok_or_else(|| DocxError::Malformed(format!("paragraph {} not found", paragraph)))?;

        let id = self.next_comment_id;
        let next_id = id
            .checked_add(1)
            .ok_or_else(|| DocxError::Malformed("comment ids exhausted".to_string()))?;
        comments.push(comment_element(
            id,
            COMMENT_AUTHOR,
            COMMENT_INITIALS,
            &self.date,
            &finding.note_text(),
        ))?;
        anchor_comment(anchor, id);
        self.next_comment_id = next_id;

        Ok((id, paragraph))
    }

    /// Append a visible reviewer note paragraph at the end of the document
    pub fn add_note(&mut self, finding: &Finding) -> Result<usize, DocxError> {
        let text = format!("{} {}", FALLBACK_PREFIX, finding.note_text());
        self.document.append_paragraph(&text)
    }

    /// Write the comments part back and hand over the annotated document
    pub fn finish(mut self) -> Result<AnnotatedDocument, ReviewError> {
        if let Some(comments) = &self.comments {
            comments.store(&mut self.document)?;
        }
        Ok(AnnotatedDocument {
            document: self.document,
            annotations: self.annotations,
        })
    }
}

/// A document copy carrying reviewer comments or notes
#[derive(Debug, Clone)]
pub struct AnnotatedDocument {
    pub document: DocxDocument,
    pub annotations: Vec<Annotation>,
}

impl AnnotatedDocument {
    pub fn comment_count(&self) -> usize {
        self.annotations
            .iter()
            .filter(|a| matches!(a.kind, AnnotationKind::Comment { .. }))
            .count()
    }

    pub fn fallback_count(&self) -> usize {
        self.annotations
            .iter()
            .filter(|a| a.kind == AnnotationKind::FallbackNote)
            .count()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ReviewError> {
        Ok(self.document.to_bytes()?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ReviewError> {
        self.document.save(path)?;
        Ok(())
    }
}

/// Annotate `document` with every finding, in order
pub fn annotate(document: DocxDocument, findings: &[Finding]) -> Result<AnnotatedDocument, ReviewError> {
    let mut session = AnnotationSession::new(document);
    for finding in findings {
        session.annotate_finding(finding);
    }
    let annotated = session.finish()?;
    info!(
        "Annotated document: {} comment(s), {} reviewer note(s)",
        annotated.comment_count(),
        annotated.fallback_count()
    );
    Ok(annotated)
}

/// Annotate the document at `src` and write the result to `dst`. `src` is never modified.
pub fn annotate_file<P: AsRef<Path>, Q: AsRef<Path>>(
    src: P,
    dst: Q,
    findings: &[Finding],
) -> Result<AnnotatedDocument, ReviewError> {
    let src = src.as_ref();
    let dst = dst.as_ref();
    if same_file(src, dst) {
        return Err(ReviewError::DestinationIsSource(dst.to_path_buf()));
    }

    let document = DocxDocument::open(src).map_err(|source| ReviewError::Unreadable {
        path: src.to_path_buf(),
        source,
    })?;
    let annotated = annotate(document, findings)?;
    annotated.save(dst)?;
    Ok(annotated)
}

/// True if both paths name the same file
pub(crate) fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RULES;
    use pretty_assertions::assert_eq;
    use shared_types::Severity;
    use tempfile::tempdir;

    fn finding(pattern: &str, issue: &str) -> Finding {
        Finding {
            pattern: pattern.to_string(),
            issue: issue.to_string(),
            severity: Severity::Medium,
            suggest: "fix it".to_string(),
            cite: "Companies Regulations 2020 s.47".to_string(),
        }
    }

    fn reopen(annotated: &AnnotatedDocument) -> DocxDocument {
        DocxDocument::from_bytes(&annotated.to_bytes().unwrap()).unwrap()
    }

    fn note_paragraphs(doc: &DocxDocument) -> Vec<String> {
        doc.paragraphs()
            .into_iter()
            .map(|p| p.text)
            .filter(|t| t.starts_with(FALLBACK_PREFIX))
            .collect()
    }

    #[test]
    fn test_signed_by_round_trip_has_exactly_one_marker() {
        let doc = DocxDocument::new_with_paragraphs(&["This form is signed by the director."]);
        let signed_by = RULES.iter().find(|r| r.pattern == "signed by").unwrap();

        let annotated = annotate(doc, &[signed_by.to_finding()]).unwrap();
        let reopened = reopen(&annotated);

        let refs = reopened.comment_reference_ids();
        let notes = note_paragraphs(&reopened);
        assert_eq!(refs.len() + notes.len(), 1);
        assert_eq!(refs, vec![0]);

        let comments = reopened.comments().unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].author, COMMENT_AUTHOR);
        assert_eq!(comments[0].initials, COMMENT_INITIALS);
        assert_eq!(comments[0].text, signed_by.to_finding().note_text());
    }

    #[test]
    fn test_fallback_note_when_relationships_are_missing() {
        let mut doc = DocxDocument::new_with_paragraphs(&["This form is signed by the director."]);
        doc.remove_part("word/_rels/document.xml.rels");

        let f = finding("signed by", "Missing signatory block / no signatures found");
        let annotated = annotate(doc, &[f.clone()]).unwrap();
        assert_eq!(annotated.fallback_count(), 1);
        assert_eq!(annotated.comment_count(), 0);

        let reopened = reopen(&annotated);
        assert!(reopened.comment_reference_ids().is_empty());
        assert_eq!(
            note_paragraphs(&reopened),
            vec![format!("{} {}", FALLBACK_PREFIX, f.note_text())]
        );
        // original paragraph is left as it was
        assert_eq!(reopened.paragraphs()[0].text, "This form is signed by the director.");
    }

    #[test]
    fn test_comment_ids_increase_from_zero() {
        let doc = DocxDocument::new_with_paragraphs(&["courts of dubai", "ubo not named", "signed by"]);
        let findings = vec![
            finding("courts of", "Jurisdiction clause does not specify ADGM"),
            finding("ubo", "UBO declaration missing or not referenced"),
            finding("signed by", "Missing signatory block / no signatures found"),
        ];

        let annotated = annotate(doc, &findings).unwrap();
        let kinds: Vec<AnnotationKind> = annotated.annotations.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                AnnotationKind::Comment { id: 0 },
                AnnotationKind::Comment { id: 1 },
                AnnotationKind::Comment { id: 2 },
            ]
        );
        let paragraphs: Vec<usize> = annotated.annotations.iter().map(|a| a.paragraph).collect();
        assert_eq!(paragraphs, vec![0, 1, 2]);

        let ids: Vec<u32> = reopen(&annotated).comments().unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_unmatched_and_empty_patterns_anchor_to_last_paragraph() {
        let doc = DocxDocument::new_with_paragraphs(&["first", "second", "third"]);
        let findings = vec![
            finding("nowhere", "Pattern not present"),
            finding("", "Document-level issue"),
            finding("SECOND", "Case-insensitive match"),
        ];

        let annotated = annotate(doc, &findings).unwrap();
        let paragraphs: Vec<usize> = annotated.annotations.iter().map(|a| a.paragraph).collect();
        assert_eq!(paragraphs, vec![2, 2, 1]);
        assert_eq!(annotated.comment_count(), 3);
    }

    #[test]
    fn test_empty_document_gets_notes_only() {
        let doc = DocxDocument::new_with_paragraphs(&[]);
        let findings = vec![
            finding("", "Missing signatory block or signature lines"),
            finding("ubo", "UBO declaration missing or not referenced"),
        ];

        let annotated = annotate(doc, &findings).unwrap();
        assert_eq!(annotated.fallback_count(), 2);

        let reopened = reopen(&annotated);
        assert_eq!(reopened.paragraph_count(), 2);
        assert_eq!(note_paragraphs(&reopened).len(), 2);
        assert!(reopened.comments().unwrap().is_empty());
    }

    #[test]
    fn test_findings_without_issue_are_skipped() {
        let doc = DocxDocument::new_with_paragraphs(&["clause"]);
        let annotated = annotate(doc, &[finding("clause", "  ")]).unwrap();
        assert!(annotated.annotations.is_empty());
        assert!(reopen(&annotated).comment_reference_ids().is_empty());
    }

    #[test]
    fn test_exhausted_comment_ids_fall_back_to_note() {
        let mut doc = DocxDocument::new_with_paragraphs(&["disputes go to the courts of dubai"]);
        let mut part = CommentsPart::open_or_create(&mut doc).unwrap();
        part.push(comment_element(u32::MAX, "Someone", "S", "2024-01-01T00:00:00Z", "old"))
            .unwrap();
        part.store(&mut doc).unwrap();
        let doc = DocxDocument::from_bytes(&doc.to_bytes().unwrap()).unwrap();

        let f = finding("courts of", "Jurisdiction clause does not specify ADGM");
        let annotated = annotate(doc, &[f.clone()]).unwrap();
        assert_eq!(annotated.comment_count(), 0);
        assert_eq!(annotated.fallback_count(), 1);

        let reopened = reopen(&annotated);
        assert!(reopened.comment_reference_ids().is_empty());
        assert_eq!(
            note_paragraphs(&reopened),
            vec![format!("{} {}", FALLBACK_PREFIX, f.note_text())]
        );
    }

    #[test]
    fn test_second_pass_continues_existing_comment_ids() {
        let doc = DocxDocument::new_with_paragraphs(&["ubo", "courts of"]);
        let first = annotate(doc, &[finding("ubo", "UBO issue")]).unwrap();

        let second = annotate(reopen(&first), &[finding("courts of", "Jurisdiction issue")]).unwrap();
        assert_eq!(second.annotations[0].kind, AnnotationKind::Comment { id: 1 });

        let ids: Vec<u32> = reopen(&second).comments().unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_annotate_file_writes_destination_only() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("articles.docx");
        let dst = dir.path().join("reviewed_articles.docx");
        DocxDocument::new_with_paragraphs(&["signed by the director"])
            .save(&src)
            .unwrap();
        let before = fs::read(&src).unwrap();

        let annotated =
            annotate_file(&src, &dst, &[finding("signed by", "Missing signatory block")]).unwrap();
        assert_eq!(annotated.comment_count(), 1);

        assert_eq!(fs::read(&src).unwrap(), before);
        let written = DocxDocument::open(&dst).unwrap();
        assert_eq!(written.comment_reference_ids(), vec![0]);
    }

    #[test]
    fn test_annotate_file_refuses_to_overwrite_source() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("articles.docx");
        DocxDocument::new_with_paragraphs(&["clause"]).save(&src).unwrap();

        let same = dir.path().join(".").join("articles.docx");
        let result = annotate_file(&src, &same, &[finding("clause", "Issue")]);
        assert!(matches!(result, Err(ReviewError::DestinationIsSource(_))));
    }

    #[test]
    fn test_annotate_file_reports_unreadable_source() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("broken.docx");
        fs::write(&src, b"not a zip").unwrap();

        let result = annotate_file(&src, dir.path().join("out.docx"), &[finding("x", "Issue")]);
        assert!(matches!(result, Err(ReviewError::Unreadable { .. })));
    }
}
