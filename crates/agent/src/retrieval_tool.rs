use anyhow::{Context, Result};
use async_trait::async_trait;
use kbseek_core::Retriever;
use serde::Deserialize;
use serde_json::Value;

use crate::tools::Tool;

pub const RETRIEVAL_TOOL_NAME: &str = "bedrock_kb_retrieval";

#[derive(Debug, Deserialize)]
struct RetrievalToolInput {
    query: String,
}

/// Exposes the knowledge-base [`Retriever`] to the agent.
///
/// Retrieval failures come back as an error envelope inside `Ok`; only a
/// malformed tool input is reported as `Err`.
pub struct KnowledgeBaseRetrievalTool {
    retriever: Retriever,
}

impl KnowledgeBaseRetrievalTool {
    pub fn new(retriever: Retriever) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for KnowledgeBaseRetrievalTool {
    fn name(&self) -> &'static str {
        RETRIEVAL_TOOL_NAME
    }

    fn description(&self) -> &'static str {
        "Search the knowledge base for passages relevant to `query`. Returns `status` \
         (success|error), `results` (content, source, score, metadata) and `error_message` \
         when the search failed."
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let input: RetrievalToolInput = serde_json::from_value(input)
            .context("bedrock_kb_retrieval expects an object with a string `query` field")?;
        let envelope = self.retriever.retrieve(&input.query).await;
        Ok(envelope.to_json())
    }
}
