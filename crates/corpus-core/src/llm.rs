//! Chat-completion client (OpenAI-compatible API, Groq by default)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RagConfig;
use crate::error::RagError;

/// A model that answers one system + user turn
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, RagError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct ChatCompletionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionClient {
    /// Client for the configured endpoint. Fails when no API key is set.
    pub fn from_config(config: &RagConfig) -> Result<Self, RagError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| RagError::ModelUnavailable("no API key configured".to_string()))?;

        Ok(Self {
            http: reqwest::Client::builder()
                .user_agent(concat!("review-server/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for ChatCompletionClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, RagError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::ModelUnavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(RagError::ModelUnavailable(format!("API key rejected ({})", status)));
        }
        if !status.is_success() {
            return Err(RagError::Http(format!("{} returned {}", url, status)));
        }

        let body: ChatResponse = response.json().await?;
        debug!("Chat completion from {} returned {} choice(s)", self.model, body.choices.len());
        first_answer(body)
    }
}

fn first_answer(body: ChatResponse) -> Result<String, RagError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(RagError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_client_requires_api_key() {
        let result = ChatCompletionClient::from_config(&RagConfig::default());
        assert!(matches!(result, Err(RagError::ModelUnavailable(_))));

        let client = ChatCompletionClient::from_config(&RagConfig::default().with_api_key("gsk_test"));
        assert_eq!(client.map(|c| c.model().to_string()).ok().as_deref(), Some("llama-3.3-70b-versatile"));
    }

    #[test]
    fn test_request_serializes_openai_shape() {
        let request = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.2,
            max_tokens: 800,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 800);
    }

    #[test]
    fn test_first_answer() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  Under s.6 ...  "}}]}"#,
        )
        .unwrap();
        assert_eq!(first_answer(body).unwrap(), "Under s.6 ...");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(first_answer(empty), Err(RagError::EmptyResponse));

        let blank: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"   "}}]}"#).unwrap();
        assert_eq!(first_answer(blank), Err(RagError::EmptyResponse));
    }
}
