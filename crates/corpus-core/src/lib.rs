//! Corpus Core - retrieval-augmented legal explanations
//!
//! This crate provides:
//! - Configuration for the knowledge index and language model
//! - A retriever over an external ADGM knowledge index
//! - An OpenAI-compatible chat-completion client
//! - `RagContext`, the optional-capability context behind `explain(query)`

pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod retriever;

// Re-export commonly used types
pub use config::RagConfig;
pub use context::{placeholder_for, RagContext};
pub use error::RagError;
pub use llm::{ChatCompletionClient, LanguageModel};
pub use prompt::EXPLAIN_ISSUES_QUERY;
pub use retriever::{HttpRetriever, Passage, Retriever};
