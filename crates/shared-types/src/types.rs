use std::fmt;

/// One flagged compliance issue with the metadata needed to annotate and report it.
///
/// `pattern` is the lowercased trigger text that was found in the document. It may be
/// empty, in which case annotation anchors to the end of the document instead of a
/// specific paragraph.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Finding {
    pub pattern: String,
    pub issue: String,
    pub severity: Severity,
    pub suggest: String,
    pub cite: String, // e.g., "Companies Regulations 2020 s.6"
}

impl Finding {
    /// Deduplication identity: two findings with the same issue and pattern are the same finding.
    pub fn dedup_key(&self) -> (&str, &str) {
        (self.issue.as_str(), self.pattern.as_str())
    }

    /// Body text used for reviewer comments and fallback notes
    pub fn note_text(&self) -> String {
        format!(
            "{} \u{2013} {}\nSuggestion: {}",
            self.issue, self.cite, self.suggest
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        };
        f.write_str(s)
    }
}

/// Corporate filing document types recognised by the classifier.
///
/// Declaration order matters: classification is first-match in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DocumentType {
    #[serde(rename = "Articles of Association")]
    ArticlesOfAssociation,
    #[serde(rename = "Memorandum of Association")]
    MemorandumOfAssociation,
    #[serde(rename = "Board Resolution")]
    BoardResolution,
    #[serde(rename = "Shareholder Resolution")]
    ShareholderResolution,
    #[serde(rename = "Incorporation Application Form")]
    IncorporationApplicationForm,
    #[serde(rename = "UBO Declaration Form")]
    UboDeclarationForm,
    #[serde(rename = "Register of Members and Directors")]
    RegisterOfMembersAndDirectors,
    #[serde(rename = "Change of Registered Address Notice")]
    ChangeOfRegisteredAddressNotice,
    Unknown,
}

impl DocumentType {
    /// All known types in classification order (excludes `Unknown`)
    pub const KNOWN: [DocumentType; 8] = [
        DocumentType::ArticlesOfAssociation,
        DocumentType::MemorandumOfAssociation,
        DocumentType::BoardResolution,
        DocumentType::ShareholderResolution,
        DocumentType::IncorporationApplicationForm,
        DocumentType::UboDeclarationForm,
        DocumentType::RegisterOfMembersAndDirectors,
        DocumentType::ChangeOfRegisteredAddressNotice,
    ];

    /// Human-readable label, as shown in summaries
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::ArticlesOfAssociation => "Articles of Association",
            DocumentType::MemorandumOfAssociation => "Memorandum of Association",
            DocumentType::BoardResolution => "Board Resolution",
            DocumentType::ShareholderResolution => "Shareholder Resolution",
            DocumentType::IncorporationApplicationForm => "Incorporation Application Form",
            DocumentType::UboDeclarationForm => "UBO Declaration Form",
            DocumentType::RegisterOfMembersAndDirectors => "Register of Members and Directors",
            DocumentType::ChangeOfRegisteredAddressNotice => "Change of Registered Address Notice",
            DocumentType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Multi-document legal procedure inferred from a batch of uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegalProcess {
    Incorporation,
    Unknown,
}

impl LegalProcess {
    pub fn name(&self) -> &'static str {
        match self {
            LegalProcess::Incorporation => "incorporation",
            LegalProcess::Unknown => "unknown",
        }
    }

    /// Title-cased name for user-facing prose ("Incorporation")
    pub fn title(&self) -> &'static str {
        match self {
            LegalProcess::Incorporation => "Incorporation",
            LegalProcess::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for LegalProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One finding as reported in a batch summary, tagged with the document it came from
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IssueRecord {
    pub document: DocumentType,
    pub issue: String,
    pub severity: Severity,
    pub suggestion: String,
    pub pattern: String,
    pub cite: String,
}

/// Aggregate result of reviewing one upload batch
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnalysisSummary {
    pub process: LegalProcess,
    pub documents_uploaded: usize,
    pub required_documents: usize,
    pub missing_document: Option<DocumentType>,
    pub missing_documents: Vec<DocumentType>,
    pub uploaded_types: Vec<DocumentType>,
    pub issues_found: Vec<IssueRecord>,
}
