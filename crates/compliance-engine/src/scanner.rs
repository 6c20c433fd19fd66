//! Clause scanner
//!
//! Findings come out in evaluation order: federal-court check, then the rule table in
//! declaration order, then the signatory-block check. Duplicates by (issue, pattern)
//! are dropped, keeping the first.

use std::collections::HashSet;

use shared_docx::DocxDocument;
use shared_types::Finding;
use tracing::debug;

use crate::extractors::text::scan_text;
use crate::patterns::{count_occurrences, PERMISSIVE_LANGUAGE_THRESHOLD};
use crate::rules::jurisdiction::check_federal_courts;
use crate::rules::signature::check_signatory_block;
use crate::rules::{Trigger, RULES};

#[derive(Debug, Clone, Copy)]
pub struct ClauseScanner {
    permissive_threshold: usize,
}

impl ClauseScanner {
    pub fn new() -> Self {
        Self {
            permissive_threshold: PERMISSIVE_LANGUAGE_THRESHOLD,
        }
    }

    /// Override how many occurrences a repeated-trigger rule needs before it fires
    pub fn with_permissive_threshold(mut self, threshold: usize) -> Self {
        self.permissive_threshold = threshold;
        self
    }

    pub fn permissive_threshold(&self) -> usize {
        self.permissive_threshold
    }

    /// Scan a document's paragraphs
    pub fn scan(&self, document: &DocxDocument) -> Vec<Finding> {
        self.scan_buffer(&scan_text(document))
    }

    /// Scan raw text. Paragraphs should be separated by newlines.
    pub fn scan_text(&self, text: &str) -> Vec<Finding> {
        self.scan_buffer(&text.to_lowercase())
    }

    fn scan_buffer(&self, text: &str) -> Vec<Finding> {
        let mut findings = Vec::new();

        findings.extend(check_federal_courts(text));

        for rule in RULES {
            if rule.pattern.trim().is_empty() || !text.contains(rule.pattern) {
                continue;
            }
            let fires = match rule.trigger {
                Trigger::Present => true,
                Trigger::Repeated => {
                    count_occurrences(text, rule.pattern) >= self.permissive_threshold
                }
            };
            if fires {
                findings.push(rule.to_finding());
            }
        }

        findings.extend(check_signatory_block(text));

        let findings = dedup_findings(findings);
        debug!("Scan produced {} finding(s)", findings.len());
        findings
    }
}

impl Default for ClauseScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop findings whose (issue, pattern) was already seen, preserving order
pub fn dedup_findings(findings: Vec<Finding>) -> Vec<Finding> {
    let keep: Vec<bool> = {
        let mut seen = HashSet::new();
        findings.iter().map(|f| seen.insert(f.dedup_key())).collect()
    };
    findings
        .into_iter()
        .zip(keep)
        .filter_map(|(f, first)| first.then_some(f))
        .collect()
}
