use std::error::Error as StdError;

use thiserror::Error;

use crate::config::KNOWLEDGE_BASE_ID_ENV;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Service,
}

/// Failures raised while talking to the knowledge-base search service.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(
        "no AWS credentials found (set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY or configure a shared profile)"
    )]
    MissingCredentials,
    #[error("credential provider `{provider}` failed: {message}")]
    CredentialProvider { provider: String, message: String },
    #[error("invalid endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("request to knowledge base timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64, source: reqwest::Error },
    #[error("request to knowledge base failed: {}", describe_chain(.0))]
    Transport(#[source] reqwest::Error),
    #[error("knowledge base returned {status}{}: {message}", status_suffix(.error_type))]
    Status { status: u16, error_type: Option<String>, message: String },
    #[error("malformed knowledge base response: {0}")]
    Decode(String),
    #[error("failed to encode retrieve request: {0}")]
    Encode(#[source] serde_json::Error),
}

fn status_suffix(error_type: &Option<String>) -> String {
    error_type.as_deref().map(|kind| format!(" ({kind})")).unwrap_or_default()
}

/// Joins an error with its `source()` chain, skipping repeated messages.
pub(crate) fn describe_chain(error: &dyn StdError) -> String {
    let mut parts = vec![error.to_string()];
    let mut current = error.source();
    while let Some(cause) = current {
        let message = cause.to_string();
        if parts.last() != Some(&message) {
            parts.push(message);
        }
        current = cause.source();
    }
    parts.join(": ")
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Environment variable {setting} is not set")]
    MissingSetting { setting: &'static str },
    #[error("error occurred during retrieval: {0}")]
    Service(#[from] ClientError),
}

impl RetrievalError {
    pub fn missing_knowledge_base_id() -> Self {
        Self::MissingSetting { setting: KNOWLEDGE_BASE_ID_ENV }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingSetting { .. } => ErrorKind::Configuration,
            Self::Service(_) => ErrorKind::Service,
        }
    }
}
