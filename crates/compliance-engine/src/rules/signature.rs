use crate::patterns::has_signature_marker;
use shared_types::{Finding, Severity};

pub const MISSING_SIGNATORY_ISSUE: &str = "Missing signatory block or signature lines";

/// Flag text with no signatory-block markers at all. `text` must already be lowercased.
pub fn check_signatory_block(text: &str) -> Option<Finding> {
    if has_signature_marker(text) {
        return None;
    }

    Some(Finding {
        pattern: "signatory".to_string(),
        issue: MISSING_SIGNATORY_ISSUE.to_string(),
        severity: Severity::Medium,
        suggest: "Add a signatory section with name, designation, signature and date.".to_string(),
        cite: "Companies Regulations 2020 s.47".to_string(),
    })
}
