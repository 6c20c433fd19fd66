use thiserror::Error;

/// Errors from the knowledge index or the language model
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RagError {
    #[error("Knowledge index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Language model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Explanation timed out after {0} ms")]
    Timeout(u64),

    #[error("Language model returned an empty answer")]
    EmptyResponse,
}

impl From<reqwest::Error> for RagError {
    fn from(err: reqwest::Error) -> Self {
        RagError::Http(err.to_string())
    }
}
