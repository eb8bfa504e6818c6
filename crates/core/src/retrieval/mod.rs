//! Retrieval adapter: one query in, one [`ResultEnvelope`] out.
//!
//! The flow is strictly linear:
//! 1. resolve the knowledge-base id from [`RetrieverSettings`] (no client is
//!    built when it is missing),
//! 2. build a client through the [`ClientFactory`], resolving credentials,
//! 3. issue a single `Retrieve` call with the fixed vector-search settings,
//! 4. map the hits into [`RetrievalRecord`]s in upstream order.
//!
//! Every failure is folded into the error envelope; nothing is retried.

pub mod bedrock;
pub mod credentials;
pub mod response;
pub mod sigv4;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{AppConfig, KnowledgeBaseConfig};
use crate::domain::envelope::ResultEnvelope;
use crate::domain::record::RetrievalRecord;
use crate::errors::{ClientError, RetrievalError};

pub use bedrock::{BedrockClient, BedrockClientFactory};
pub use credentials::{CredentialChain, CredentialSource, ResolvedCredentials};
pub use response::RetrieveResponse;

/// Upper bound on hits requested per query.
pub const MAX_RESULTS: u32 = 7;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveRequest {
    #[serde(skip)]
    pub knowledge_base_id: String,
    pub retrieval_query: RetrievalQuery,
    pub retrieval_configuration: RetrievalConfiguration,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RetrievalQuery {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfiguration {
    pub vector_search_configuration: VectorSearchConfiguration,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorSearchConfiguration {
    pub number_of_results: u32,
}

impl RetrieveRequest {
    pub fn new(knowledge_base_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            knowledge_base_id: knowledge_base_id.into(),
            retrieval_query: RetrievalQuery { text: query.into() },
            retrieval_configuration: RetrievalConfiguration {
                vector_search_configuration: VectorSearchConfiguration {
                    number_of_results: MAX_RESULTS,
                },
            },
        }
    }
}

#[async_trait]
pub trait KnowledgeBaseClient: Send + Sync {
    async fn retrieve(&self, request: &RetrieveRequest) -> Result<RetrieveResponse, ClientError>;
}

/// Builds one client per retrieval; credential lookup happens here.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn build(&self, region: Option<&str>) -> Result<Box<dyn KnowledgeBaseClient>, ClientError>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RetrieverSettings {
    pub knowledge_base_id: Option<String>,
    pub region: Option<String>,
}

impl From<&KnowledgeBaseConfig> for RetrieverSettings {
    fn from(config: &KnowledgeBaseConfig) -> Self {
        Self { knowledge_base_id: config.id.clone(), region: config.region.clone() }
    }
}

pub struct Retriever {
    settings: RetrieverSettings,
    factory: Box<dyn ClientFactory>,
}

impl Retriever {
    pub fn new<F>(settings: RetrieverSettings, factory: F) -> Self
    where
        F: ClientFactory + 'static,
    {
        Self { settings, factory: Box::new(factory) }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            RetrieverSettings::from(&config.knowledge_base),
            BedrockClientFactory::from_config(config),
        )
    }

    pub async fn retrieve(&self, query: &str) -> ResultEnvelope {
        let correlation_id = Uuid::new_v4().to_string();
        info!(
            event_name = "retrieval.request.start",
            correlation_id = %correlation_id,
            query_chars = query.chars().count(),
            "knowledge base retrieval started"
        );

        let outcome = self.try_retrieve(query).await;
        match &outcome {
            Ok(records) => info!(
                event_name = "retrieval.request.success",
                correlation_id = %correlation_id,
                result_count = records.len(),
                "knowledge base retrieval completed"
            ),
            Err(error) => warn!(
                event_name = "retrieval.request.error",
                correlation_id = %correlation_id,
                error_kind = ?error.kind(),
                error = %error,
                "knowledge base retrieval failed"
            ),
        }

        ResultEnvelope::from(outcome)
    }

    pub async fn try_retrieve(&self, query: &str) -> Result<Vec<RetrievalRecord>, RetrievalError> {
        let knowledge_base_id = self
            .settings
            .knowledge_base_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(RetrievalError::missing_knowledge_base_id)?;

        let client = self.factory.build(self.settings.region.as_deref()).await?;
        let request = RetrieveRequest::new(knowledge_base_id, query);
        let response = client.retrieve(&request).await?;

        Ok(response.into_records())
    }
}
