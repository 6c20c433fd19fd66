//! Knowledge index access
//!
//! The index itself (built from the ADGM reference PDFs) lives in a separate service.
//! This module only asks it for the passages closest to a query.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RagError;

/// One retrieved chunk of reference text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Passage {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            source: None,
            score: None,
        }
    }
}

/// Source of passages semantically related to a query
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `k` passages, most relevant first
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Passage>, RagError>;
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    k: usize,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    passages: Vec<Passage>,
}

/// Retriever backed by an index service answering `POST {base}/query`
pub struct HttpRetriever {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRetriever {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                .user_agent(concat!("review-server/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Passage>, RagError> {
        let url = format!("{}/query", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&QueryRequest { query, k })
            .send()
            .await
            .map_err(|e| RagError::IndexUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RagError::IndexUnavailable(format!("{} returned {}", url, status)));
        }

        let body: QueryResponse = response.json().await?;
        let mut passages = body.passages;
        passages.truncate(k);
        debug!("Retrieved {} passage(s) from {}", passages.len(), url);
        Ok(passages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_response_tolerates_missing_fields() {
        let body: QueryResponse =
            serde_json::from_str(r#"{"passages":[{"text":"s.6"},{"text":"s.47","score":0.8}]}"#)
                .unwrap();
        assert_eq!(body.passages.len(), 2);
        assert_eq!(body.passages[0], Passage::new("s.6"));
        assert_eq!(body.passages[1].score, Some(0.8));

        let empty: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.passages.is_empty());
    }

    #[test]
    fn test_base_url_is_normalized() {
        assert_eq!(HttpRetriever::new("http://index:9000/").base_url(), "http://index:9000");
    }

    #[tokio::test]
    async fn test_unreachable_index_is_reported_as_unavailable() {
        // port 9 (discard) on localhost is not expected to run an HTTP service
        let retriever = HttpRetriever::new("http://127.0.0.1:9");
        let result = retriever.retrieve("jurisdiction", 3).await;
        assert!(matches!(result, Err(RagError::IndexUnavailable(_))));
    }
}
