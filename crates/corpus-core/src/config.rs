//! Configuration for the retrieval and language-model collaborator

use std::time::Duration;

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
/// Groq's OpenAI-compatible endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 800;
pub const DEFAULT_TOP_K: usize = 6;
pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;

/// Settings for explanation requests
#[derive(Debug, Clone, PartialEq)]
pub struct RagConfig {
    /// Base URL of the knowledge index service. `None` means no index is configured.
    pub index_url: Option<String>,
    /// Language-model API key. `None` means no model is configured.
    pub api_key: Option<String>,
    /// Chat-completions base URL
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Passages retrieved per query
    pub top_k: usize,
    /// Upper bound for one whole explanation (retrieval plus completion)
    pub timeout: Duration,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            index_url: None,
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            top_k: DEFAULT_TOP_K,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl RagConfig {
    pub fn with_index_url(mut self, url: &str) -> Self {
        self.index_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Blank keys and URLs count as not configured
    pub fn has_index(&self) -> bool {
        self.index_url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}
