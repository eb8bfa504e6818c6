use serde::{Serialize, Serializer};

use crate::domain::record::RetrievalRecord;
use crate::errors::{ErrorKind, RetrievalError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

/// Uniform wrapper handed back to the calling agent.
///
/// Serializes as `{"status", "results", "error_message"?}`; the error variant
/// always carries an empty result list.
#[derive(Clone, Debug, PartialEq)]
pub enum ResultEnvelope {
    Success { results: Vec<RetrievalRecord> },
    Error { kind: ErrorKind, message: String },
}

impl ResultEnvelope {
    pub fn success(results: Vec<RetrievalRecord>) -> Self {
        Self::Success { results }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Error { kind, message: message.into() }
    }

    pub fn status(&self) -> EnvelopeStatus {
        match self {
            Self::Success { .. } => EnvelopeStatus::Success,
            Self::Error { .. } => EnvelopeStatus::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn results(&self) -> &[RetrievalRecord] {
        match self {
            Self::Success { results } => results,
            Self::Error { .. } => &[],
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Error { message, .. } => Some(message),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Error { kind, .. } => Some(*kind),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|error| {
            serde_json::json!({
                "status": EnvelopeStatus::Error,
                "results": [],
                "error_message": format!("envelope serialization failed: {error}"),
            })
        })
    }
}

impl From<Result<Vec<RetrievalRecord>, RetrievalError>> for ResultEnvelope {
    fn from(value: Result<Vec<RetrievalRecord>, RetrievalError>) -> Self {
        match value {
            Ok(results) => Self::success(results),
            Err(error) => Self::error(error.kind(), error.to_string()),
        }
    }
}

#[derive(Serialize)]
struct EnvelopeWire<'a> {
    status: EnvelopeStatus,
    results: &'a [RetrievalRecord],
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<&'a str>,
}

impl Serialize for ResultEnvelope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        EnvelopeWire {
            status: self.status(),
            results: self.results(),
            error_message: self.error_message(),
        }
        .serialize(serializer)
    }
}
