use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApolloError {
    /// The body was JSON but did not match the declared response type.
    #[error("Schema validation failed: {source}")]
    Validation {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// The body could not be read as JSON at all.
    #[error("Failed to decode response body: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Socket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),
}

impl ApolloError {
    /// Classifies a failed typed deserialization. Data errors mean the payload
    /// was well-formed JSON of the wrong shape; anything else means the body was
    /// not usable JSON.
    pub fn from_body(source: serde_json::Error, body: String) -> Self {
        match source.classify() {
            serde_json::error::Category::Data => ApolloError::Validation { source, body },
            _ => ApolloError::Decode { source, body },
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ApolloError::Validation { .. })
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            ApolloError::Http { status, .. } => Some(*status),
            ApolloError::Request(e) => e.status(),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            ApolloError::Http { body, .. }
            | ApolloError::Validation { body, .. }
            | ApolloError::Decode { body, .. } => Some(body),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApolloError>;
