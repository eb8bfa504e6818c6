use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::config::AppConfig;
use crate::errors::ClientError;
use crate::retrieval::credentials::CredentialChain;
use crate::retrieval::response::RetrieveResponse;
use crate::retrieval::sigv4::{uri_encode, SigV4Signer, SignableRequest};
use crate::retrieval::{ClientFactory, KnowledgeBaseClient, RetrieveRequest};

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";
const SIGNING_SERVICE: &str = "bedrock";
const JSON_CONTENT_TYPE: &str = "application/json";

pub fn default_endpoint(region: &str) -> String {
    format!("https://bedrock-agent-runtime.{region}.amazonaws.com")
}

#[derive(Clone, Debug)]
pub struct BedrockClientFactory {
    credentials: CredentialChain,
    endpoint_url: Option<String>,
    timeout: Duration,
}

impl BedrockClientFactory {
    pub fn new(credentials: CredentialChain, endpoint_url: Option<String>, timeout: Duration) -> Self {
        Self { credentials, endpoint_url, timeout }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            CredentialChain::from_config(&config.aws),
            config.knowledge_base.endpoint_url.clone(),
            Duration::from_secs(config.knowledge_base.timeout_secs),
        )
    }
}

#[async_trait]
impl ClientFactory for BedrockClientFactory {
    async fn build(&self, region: Option<&str>) -> Result<Box<dyn KnowledgeBaseClient>, ClientError> {
        let region = region.unwrap_or(DEFAULT_REGION);

        let endpoint = self.endpoint_url.clone().unwrap_or_else(|| default_endpoint(region));
        let endpoint = Url::parse(&endpoint).map_err(|error| ClientError::InvalidEndpoint {
            endpoint: endpoint.clone(),
            reason: error.to_string(),
        })?;
        if endpoint.host_str().is_none() {
            return Err(ClientError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "endpoint has no host".to_string(),
            });
        }

        let resolved = self.credentials.resolve(region).await?;
        let http = Client::builder().timeout(self.timeout).build().map_err(ClientError::Build)?;

        Ok(Box::new(BedrockClient {
            http,
            endpoint,
            timeout: self.timeout,
            signer: SigV4Signer::new(resolved.credentials, region, SIGNING_SERVICE),
        }))
    }
}

/// `bedrock-agent-runtime` client for the `Retrieve` operation.
pub struct BedrockClient {
    http: Client,
    endpoint: Url,
    timeout: Duration,
    signer: SigV4Signer,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceErrorBody {
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

impl BedrockClient {
    fn retrieve_url(&self, knowledge_base_id: &str) -> Url {
        let mut url = self.endpoint.clone();
        let path = format!(
            "{}/knowledgebases/{}/retrieve",
            self.endpoint.path().trim_end_matches('/'),
            uri_encode(knowledge_base_id)
        );
        url.set_path(&path);
        url
    }

    fn transport_error(&self, error: reqwest::Error) -> ClientError {
        if error.is_timeout() {
            ClientError::Timeout { timeout_secs: self.timeout.as_secs(), source: error }
        } else {
            ClientError::Transport(error)
        }
    }
}

fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

#[async_trait]
impl KnowledgeBaseClient for BedrockClient {
    async fn retrieve(&self, request: &RetrieveRequest) -> Result<RetrieveResponse, ClientError> {
        let body = serde_json::to_vec(request).map_err(ClientError::Encode)?;
        let url = self.retrieve_url(&request.knowledge_base_id);
        let host = host_header(&url);

        let signed_headers = self.signer.sign(
            &SignableRequest {
                method: "POST",
                host: &host,
                path: url.path(),
                query: url.query().unwrap_or_default(),
                headers: &[("content-type", JSON_CONTENT_TYPE)],
                payload: &body,
            },
            Utc::now(),
        );

        debug!(
            event_name = "retrieval.http.send",
            url = %url,
            body_bytes = body.len(),
            "sending retrieve request"
        );

        let mut builder = self
            .http
            .post(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(ACCEPT, JSON_CONTENT_TYPE);
        for (name, value) in signed_headers {
            builder = builder.header(name, value);
        }

        let response =
            builder.body(body).send().await.map_err(|error| self.transport_error(error))?;
        let status = response.status();

        if !status.is_success() {
            let error_type = response
                .headers()
                .get("x-amzn-errortype")
                .and_then(|value| value.to_str().ok())
                .map(|value| value.split(':').next().unwrap_or(value).to_string())
                .filter(|value| !value.is_empty());
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ServiceErrorBody>(&raw)
                .ok()
                .and_then(|body| body.message)
                .filter(|message| !message.trim().is_empty())
                .or_else(|| Some(raw.trim().to_string()).filter(|text| !text.is_empty()))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

            return Err(ClientError::Status { status: status.as_u16(), error_type, message });
        }

        let raw = response.bytes().await.map_err(|error| self.transport_error(error))?;
        serde_json::from_slice::<RetrieveResponse>(&raw)
            .map_err(|error| ClientError::Decode(error.to_string()))
    }
}
