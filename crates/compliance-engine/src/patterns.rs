//! Keyword tables and detection patterns for ADGM filings

use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{DocumentType, LegalProcess};

/// Phrases that place disputes before the onshore UAE federal court system
pub const FEDERAL_COURT_PHRASES: &[&str] = &["federal courts", "u.a.e. federal"];

/// Short name of the target jurisdiction, as it appears in lowercased text
pub const JURISDICTION_SHORT_NAME: &str = "adgm";

/// Permissive-language occurrences needed before drafting is treated as systemically ambiguous.
/// Fewer occurrences are taken as incidental use.
pub const PERMISSIVE_LANGUAGE_THRESHOLD: usize = 3;

/// Distinct required documents of a process that must be present before the process is inferred
pub const MIN_REQUIRED_OVERLAP: usize = 2;

lazy_static! {
    /// Markers of a signatory block. None of these matching means no block was found;
    /// an empty document therefore always reports a missing block.
    pub static ref SIGNATURE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"\bsigned\b").unwrap(),
        Regex::new(r"\bsignature\b").unwrap(),
        Regex::new(r"\bdate:\b").unwrap(),
        Regex::new(r"\bname:\b").unwrap(),
    ];
}

/// Keywords per document type, in classification priority order
pub const DOCUMENT_TYPE_KEYWORDS: &[(DocumentType, &[&str])] = &[
    (
        DocumentType::ArticlesOfAssociation,
        &["articles of association", "articles of association (aoa)"],
    ),
    (
        DocumentType::MemorandumOfAssociation,
        &["memorandum of association", "memorandum of association (moa)"],
    ),
    (DocumentType::BoardResolution, &["board resolution"]),
    (DocumentType::ShareholderResolution, &["shareholder resolution"]),
    (
        DocumentType::IncorporationApplicationForm,
        &["incorporation application", "application for incorporation"],
    ),
    (
        DocumentType::UboDeclarationForm,
        &["ubo declaration", "ultimate beneficial owner"],
    ),
    (
        DocumentType::RegisterOfMembersAndDirectors,
        &["register of members", "register of directors"],
    ),
    (
        DocumentType::ChangeOfRegisteredAddressNotice,
        &["change of registered address", "registered address change"],
    ),
];

/// A legal process and the filings it needs
#[derive(Debug, Clone, Copy)]
pub struct ProcessDefinition {
    pub process: LegalProcess,
    pub keywords: &'static [&'static str],
    pub required: &'static [DocumentType],
}

/// Known processes, in inference priority order
pub const PROCESS_DEFINITIONS: &[ProcessDefinition] = &[ProcessDefinition {
    process: LegalProcess::Incorporation,
    keywords: &["incorporation", "articles of association", "ubo declaration"],
    required: &[
        DocumentType::ArticlesOfAssociation,
        DocumentType::MemorandumOfAssociation,
        DocumentType::IncorporationApplicationForm,
        DocumentType::UboDeclarationForm,
        DocumentType::RegisterOfMembersAndDirectors,
    ],
}];

/// Keywords registered for a document type (empty for `Unknown`)
pub fn keywords_for(document_type: DocumentType) -> &'static [&'static str] {
    DOCUMENT_TYPE_KEYWORDS
        .iter()
        .find(|(t, _)| *t == document_type)
        .map(|(_, kws)| *kws)
        .unwrap_or(&[])
}

/// Definition of a process, if it is a known one
pub fn process_definition(process: LegalProcess) -> Option<&'static ProcessDefinition> {
    PROCESS_DEFINITIONS.iter().find(|def| def.process == process)
}

/// Count non-overlapping occurrences of `needle` in `text`
pub fn count_occurrences(text: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    text.matches(needle).count()
}

/// True if any signatory-block marker appears in `text`
pub fn has_signature_marker(text: &str) -> bool {
    SIGNATURE_PATTERNS.iter().any(|re| re.is_match(text))
}
