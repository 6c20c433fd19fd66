//! Document type and legal process classification
//!
//! Both classifiers are first-match over declaration order. When text mentions
//! keywords of several document types, the earlier-declared type wins.

use std::collections::HashSet;
use std::path::Path;

use shared_docx::DocxDocument;
use shared_types::{DocumentType, LegalProcess};
use tracing::debug;

use crate::extractors::text::classification_text;
use crate::patterns::{
    ProcessDefinition, DOCUMENT_TYPE_KEYWORDS, MIN_REQUIRED_OVERLAP, PROCESS_DEFINITIONS,
};

/// Best-guess type of a document: its text first, then its file name, else `Unknown`
pub fn classify_type(document: &DocxDocument, filename: &str) -> DocumentType {
    let text = classification_text(document);
    if let Some(found) = classify_text(&text) {
        debug!("Classified {} as {} from text", filename, found);
        return found;
    }
    if let Some(found) = classify_filename(filename) {
        debug!("Classified {} as {} from file name", filename, found);
        return found;
    }
    DocumentType::Unknown
}

/// First document type with a keyword contained in `text`
pub fn classify_text(text: &str) -> Option<DocumentType> {
    let text = text.to_lowercase();
    DOCUMENT_TYPE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(doc_type, _)| *doc_type)
}

/// First document type whose keyword shows up in the file name, either with spaces
/// turned into underscores or as its first word alone
pub fn classify_filename(filename: &str) -> Option<DocumentType> {
    let name = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| filename.to_lowercase());

    DOCUMENT_TYPE_KEYWORDS
        .iter()
        .find(|(_, keywords)| {
            keywords.iter().any(|kw| {
                let underscored = kw.replace(' ', "_");
                let first_word = kw.split_whitespace().next().unwrap_or(kw);
                name.contains(&underscored) || name.contains(first_word)
            })
        })
        .map(|(doc_type, _)| *doc_type)
}

/// Infer the legal process from the document types of one upload batch.
///
/// A process is inferred once at least [`MIN_REQUIRED_OVERLAP`] distinct documents of its
/// required list are present; the first such process wins. Otherwise the process
/// keywords are checked against the remaining labels, those outside the process's
/// required list, so a single required document never decides the process alone.
pub fn classify_process(labels: &[DocumentType]) -> LegalProcess {
    infer_process(labels, PROCESS_DEFINITIONS)
}

/// [`classify_process`] over an explicit definition table
pub fn infer_process(labels: &[DocumentType], definitions: &[ProcessDefinition]) -> LegalProcess {
    let uploaded: HashSet<DocumentType> = labels.iter().copied().collect();

    for def in definitions {
        let found = def
            .required
            .iter()
            .filter(|doc| uploaded.contains(*doc))
            .count();
        if found >= MIN_REQUIRED_OVERLAP {
            return def.process;
        }
    }

    // Keywords naming a required document ("articles of association") are matched only
    // through the overlap count above.
    for def in definitions {
        let joined = labels
            .iter()
            .filter(|label| !def.required.contains(*label))
            .map(|label| label.label())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if def.keywords.iter().any(|kw| joined.contains(kw)) {
            return def.process;
        }
    }

    LegalProcess::Unknown
}

/// Documents a process requires, in checklist order
pub fn required_documents(process: LegalProcess) -> &'static [DocumentType] {
    PROCESS_DEFINITIONS
        .iter()
        .find(|def| def.process == process)
        .map(|def| def.required)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_memorandum_from_text() {
        let doc = DocxDocument::new_with_paragraphs(&["MEMORANDUM OF ASSOCIATION", "of Acme Ltd"]);
        assert_eq!(
            classify_type(&doc, "upload.docx"),
            DocumentType::MemorandumOfAssociation
        );
    }

    #[test]
    fn test_board_resolution_from_filename() {
        let doc = DocxDocument::new_with_paragraphs(&["Minutes of a meeting held on Monday"]);
        assert_eq!(
            classify_type(&doc, "board_resolution_final.docx"),
            DocumentType::BoardResolution
        );
    }

    #[test]
    fn test_filename_uses_basename_only() {
        assert_eq!(
            classify_filename("/tmp/board_resolution/notes.docx"),
            None
        );
        assert_eq!(
            classify_filename("/tmp/uploads/UBO_form.docx"),
            Some(DocumentType::UboDeclarationForm)
        );
    }

    #[test]
    fn test_unknown_when_nothing_matches() {
        let doc = DocxDocument::new_with_paragraphs(&["Lease of office premises"]);
        assert_eq!(classify_type(&doc, "lease.docx"), DocumentType::Unknown);
    }

    #[test]
    fn test_earlier_declared_type_wins_on_ambiguous_text() {
        let text = "board resolution approving the articles of association";
        assert_eq!(classify_text(text), Some(DocumentType::ArticlesOfAssociation));
    }

    #[test]
    fn test_text_keyword_may_span_paragraphs() {
        let doc = DocxDocument::new_with_paragraphs(&["Register of", "Members"]);
        assert_eq!(
            classify_type(&doc, "x.docx"),
            DocumentType::RegisterOfMembersAndDirectors
        );
    }

    #[test]
    fn test_incorporation_from_two_required_documents() {
        let labels = [
            DocumentType::ArticlesOfAssociation,
            DocumentType::UboDeclarationForm,
        ];
        assert_eq!(classify_process(&labels), LegalProcess::Incorporation);
    }

    #[test]
    fn test_single_required_document_is_unknown() {
        assert_eq!(
            classify_process(&[DocumentType::ArticlesOfAssociation]),
            LegalProcess::Unknown
        );
        assert_eq!(
            classify_process(&[
                DocumentType::IncorporationApplicationForm,
                DocumentType::IncorporationApplicationForm,
            ]),
            LegalProcess::Unknown
        );
    }

    #[test]
    fn test_no_labels_is_unknown() {
        assert_eq!(classify_process(&[]), LegalProcess::Unknown);
        assert_eq!(
            classify_process(&[DocumentType::Unknown, DocumentType::BoardResolution]),
            LegalProcess::Unknown
        );
    }

    #[test]
    fn test_keyword_fallback_uses_labels_outside_required_list() {
        let definitions = [ProcessDefinition {
            process: LegalProcess::Incorporation,
            keywords: &["board resolution"],
            required: &[
                DocumentType::ArticlesOfAssociation,
                DocumentType::MemorandumOfAssociation,
            ],
        }];

        assert_eq!(
            infer_process(&[DocumentType::BoardResolution], &definitions),
            LegalProcess::Incorporation
        );
        assert_eq!(
            infer_process(&[DocumentType::UboDeclarationForm], &definitions),
            LegalProcess::Unknown
        );
    }

    #[test]
    fn test_required_label_keyword_does_not_decide_process() {
        let definitions = [ProcessDefinition {
            process: LegalProcess::Incorporation,
            keywords: &["articles of association"],
            required: &[
                DocumentType::ArticlesOfAssociation,
                DocumentType::MemorandumOfAssociation,
            ],
        }];
        assert_eq!(
            infer_process(&[DocumentType::ArticlesOfAssociation], &definitions),
            LegalProcess::Unknown
        );
    }

    #[test]
    fn test_required_documents() {
        assert_eq!(required_documents(LegalProcess::Incorporation).len(), 5);
        assert!(required_documents(LegalProcess::Unknown).is_empty());
    }

    proptest! {
        /// Order and duplicates of the uploaded labels never change the inferred process
        #[test]
        fn process_ignores_order_and_duplicates(indices in proptest::collection::vec(0usize..9, 0..8)) {
            let all: Vec<DocumentType> = DocumentType::KNOWN
                .iter()
                .copied()
                .chain(std::iter::once(DocumentType::Unknown))
                .collect();
            let labels: Vec<DocumentType> = indices.iter().map(|i| all[*i]).collect();
            let mut reversed = labels.clone();
            reversed.reverse();
            let mut doubled = labels.clone();
            doubled.extend(labels.iter().copied());

            let expected = classify_process(&labels);
            prop_assert_eq!(classify_process(&reversed), expected);
            prop_assert_eq!(classify_process(&doubled), expected);
        }

        /// Arbitrary file names never panic and always produce a label
        #[test]
        fn filename_classification_never_panics(name in "\\PC{0,40}") {
            let doc = DocxDocument::new_with_paragraphs(&[]);
            let _ = classify_type(&doc, &name);
        }
    }
}
