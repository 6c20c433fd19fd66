use crate::patterns::{FEDERAL_COURT_PHRASES, JURISDICTION_SHORT_NAME};
use shared_types::{Finding, Severity};

pub const FEDERAL_COURTS_ISSUE: &str =
    "Document references UAE Federal Courts rather than ADGM jurisdiction";

/// Flag documents that send disputes to the UAE federal courts without mentioning ADGM.
/// `text` must already be lowercased.
pub fn check_federal_courts(text: &str) -> Option<Finding> {
    let references_federal = FEDERAL_COURT_PHRASES.iter().any(|p| text.contains(p));
    if !references_federal || text.contains(JURISDICTION_SHORT_NAME) {
        return None;
    }

    Some(Finding {
        pattern: "federal courts".to_string(),
        issue: FEDERAL_COURTS_ISSUE.to_string(),
        severity: Severity::High,
        suggest: "Replace jurisdiction references with ADGM courts / exclusive ADGM jurisdiction language."
            .to_string(),
        cite: "ADGM Companies Regulations 2020 s.6".to_string(),
    })
}
