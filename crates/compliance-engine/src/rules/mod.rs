//! Static rule table for ADGM drafting checks
//!
//! Rules are evaluated in declaration order; that order is also the order of the
//! resulting findings. Two checks that are not plain substring rules live in their
//! own modules: the federal-court reference check runs before the table, the
//! signatory-block check after it.

pub mod jurisdiction;
pub mod signature;

use shared_types::{Finding, Severity};

/// When a rule fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Pattern appears at least once
    Present,
    /// Pattern appears at least the scanner's permissive-language threshold number of times
    Repeated,
}

/// Template for a finding
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub pattern: &'static str,
    pub issue: &'static str,
    pub severity: Severity,
    pub suggest: &'static str,
    pub cite: &'static str,
    pub trigger: Trigger,
}

impl Rule {
    pub fn to_finding(&self) -> Finding {
        Finding {
            pattern: self.pattern.to_string(),
            issue: self.issue.to_string(),
            severity: self.severity,
            suggest: self.suggest.to_string(),
            cite: self.cite.to_string(),
        }
    }
}

pub const RULES: &[Rule] = &[
    Rule {
        pattern: "courts of",
        issue: "Jurisdiction clause does not specify ADGM",
        severity: Severity::High,
        suggest: "Replace with 'the courts of the Abu Dhabi Global Market (ADGM)'.",
        cite: "Companies Regulations 2020 s.6",
        trigger: Trigger::Present,
    },
    Rule {
        pattern: "signed by",
        issue: "Missing signatory block / no signatures found",
        severity: Severity::Medium,
        suggest: "Insert a signatory block with name, position, signature line and date.",
        cite: "Companies Regulations 2020 s.47",
        trigger: Trigger::Present,
    },
    Rule {
        pattern: "ubo",
        issue: "UBO declaration missing or not referenced",
        severity: Severity::High,
        suggest: "Include a completed UBO declaration form as required for incorporation.",
        cite: "ADGM Registry guidance on beneficial ownership",
        trigger: Trigger::Present,
    },
    Rule {
        pattern: " may ",
        issue: "Ambiguous / permissive language (uses 'may' extensively in critical clauses)",
        severity: Severity::Medium,
        suggest: "Use clearer mandatory language where required (e.g., 'shall' or 'must').",
        cite: "Companies Regulations 2020 - general drafting standards",
        trigger: Trigger::Repeated,
    },
];
