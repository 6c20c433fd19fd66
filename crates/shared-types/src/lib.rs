pub mod types;

pub use types::{AnalysisSummary, DocumentType, Finding, IssueRecord, LegalProcess, Severity};
