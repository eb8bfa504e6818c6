use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Placeholder source used when the upstream hit carries no location.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// One normalized search hit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrievalRecord {
    pub content: String,
    pub source: String,
    pub score: f64,
    pub metadata: BTreeMap<String, String>,
}

impl Default for RetrievalRecord {
    fn default() -> Self {
        Self {
            content: String::new(),
            source: UNKNOWN_SOURCE.to_string(),
            score: 0.0,
            metadata: BTreeMap::new(),
        }
    }
}
