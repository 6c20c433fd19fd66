//! Explanation context
//!
//! Holds the optional index and model capabilities, decided once at startup. `explain`
//! never fails: any missing capability or runtime error turns into a placeholder answer.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::RagConfig;
use crate::error::RagError;
use crate::llm::{ChatCompletionClient, LanguageModel};
use crate::prompt::{
    build_user_prompt, FAILED_PLACEHOLDER, INDEX_UNAVAILABLE_PLACEHOLDER, NO_MODEL_PLACEHOLDER,
    SYSTEM_PROMPT,
};
use crate::retriever::{HttpRetriever, Retriever};

#[derive(Clone)]
pub struct RagContext {
    retriever: Option<Arc<dyn Retriever>>,
    model: Option<Arc<dyn LanguageModel>>,
    top_k: usize,
    timeout: Duration,
}

impl RagContext {
    /// Context with neither an index nor a model
    pub fn unconfigured() -> Self {
        let defaults = RagConfig::default();
        Self {
            retriever: None,
            model: None,
            top_k: defaults.top_k,
            timeout: defaults.timeout,
        }
    }

    /// Build the capabilities the configuration allows
    pub fn from_config(config: &RagConfig) -> Self {
        let retriever: Option<Arc<dyn Retriever>> = match &config.index_url {
            Some(url) if config.has_index() => Some(Arc::new(HttpRetriever::new(url))),
            _ => None,
        };
        let model: Option<Arc<dyn LanguageModel>> = match ChatCompletionClient::from_config(config) {
            Ok(client) => Some(Arc::new(client)),
            Err(err) => {
                info!("Language model disabled: {}", err);
                None
            }
        };

        info!(
            "Explanation context: index {}, model {}",
            if retriever.is_some() { "configured" } else { "absent" },
            if model.is_some() { "configured" } else { "absent" }
        );

        Self {
            retriever,
            model,
            top_k: config.top_k,
            timeout: config.timeout,
        }
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn with_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.retriever.is_some() && self.model.is_some()
    }

    /// Explain `query` from retrieved passages, or return a placeholder
    pub async fn explain(&self, query: &str) -> String {
        match self.try_explain(query).await {
            Ok(answer) => answer,
            Err(err) => {
                warn!("Explanation unavailable: {}", err);
                placeholder_for(&err).to_string()
            }
        }
    }

    /// Explain `query`, bounded by the configured timeout
    pub async fn try_explain(&self, query: &str) -> Result<String, RagError> {
        let retriever = self
            .retriever
            .as_ref()
            .ok_or_else(|| RagError::IndexUnavailable("no knowledge index configured".to_string()))?;
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| RagError::ModelUnavailable("no language model configured".to_string()))?;

        let work = async {
            let passages = retriever.retrieve(query, self.top_k).await?;
            let prompt = build_user_prompt(&passages, query);
            model.complete(SYSTEM_PROMPT, &prompt).await
        };

        match timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(RagError::Timeout(self.timeout.as_millis() as u64)),
        }
    }
}

impl Default for RagContext {
    fn default() -> Self {
        Self::unconfigured()
    }
}

/// Placeholder shown in place of an explanation that could not be produced
pub fn placeholder_for(err: &RagError) -> &'static str {
    match err {
        RagError::IndexUnavailable(_) => INDEX_UNAVAILABLE_PLACEHOLDER,
        RagError::ModelUnavailable(_) => NO_MODEL_PLACEHOLDER,
        RagError::Http(_) | RagError::Timeout(_) | RagError::EmptyResponse => FAILED_PLACEHOLDER,
    }
}
