//! Prompt text and placeholder answers

use crate::retriever::Passage;

pub const SYSTEM_PROMPT: &str = "You are an ADGM legal assistant. \
Always cite ADGM regulations when answering (e.g., 'Companies Regulations 2020 s.6').";

/// Query asked after a batch review
pub const EXPLAIN_ISSUES_QUERY: &str =
    "Explain why each flagged issue matters under ADGM law and propose compliant wording.";

pub const INDEX_UNAVAILABLE_PLACEHOLDER: &str = "Legal rationale unavailable (RAG backend not configured). \
The ADGM knowledge index could not be reached. Please build the index and start the review server with --index-url.";

pub const NO_MODEL_PLACEHOLDER: &str = "Legal rationale unavailable (RAG backend not configured). \
No LLM API key found or LLM client could not be initialized. Please set GROQ_API_KEY in your environment.";

pub const FAILED_PLACEHOLDER: &str =
    "Legal rationale unavailable (RAG/LLM invocation failed or timed out).";

/// User turn: retrieved passages as context, then the question
pub fn build_user_prompt(passages: &[Passage], query: &str) -> String {
    let context = passages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("---\nCONTEXT:\n{}\n---\n\nQ: {}\nA:", context, query)
}
