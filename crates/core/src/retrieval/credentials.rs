//! Credential resolution for signed requests.
//!
//! Access keys set in kbseek configuration (file or `AWS_ACCESS_KEY_ID` /
//! `AWS_SECRET_ACCESS_KEY`) always win. Without them the standard AWS
//! provider chain is walked in order: shared profile files (including SSO
//! and `credential_process` profiles), web identity token, container
//! credentials endpoint, then instance metadata. A provider that has nothing
//! to offer hands over to the next one; any other provider failure stops the
//! walk.

use std::fmt;

use aws_config::ecs::EcsCredentialsProvider;
use aws_config::imds::credentials::ImdsCredentialsProvider;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_config::provider_config::ProviderConfig;
use aws_config::web_identity_token::WebIdentityTokenCredentialsProvider;
use aws_config::Region;
use aws_credential_types::provider::error::CredentialsError;
use aws_credential_types::provider::ProvideCredentials;
use tracing::debug;

use crate::config::AwsConfig;
use crate::errors::{describe_chain, ClientError};
use crate::retrieval::sigv4::Credentials;

const DEFAULT_PROFILE: &str = "default";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialSource {
    Configured,
    Profile(String),
    WebIdentity,
    Container,
    InstanceMetadata,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configured => f.write_str("configured access keys"),
            Self::Profile(name) => write!(f, "shared profile `{name}`"),
            Self::WebIdentity => f.write_str("web identity token"),
            Self::Container => f.write_str("container credentials endpoint"),
            Self::InstanceMetadata => f.write_str("instance metadata service"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedCredentials {
    pub credentials: Credentials,
    pub source: CredentialSource,
}

#[derive(Clone, Debug, Default)]
pub struct CredentialChain {
    configured: Option<Credentials>,
    profile: Option<String>,
}

impl CredentialChain {
    pub fn new(configured: Option<Credentials>, profile: Option<String>) -> Self {
        Self { configured, profile }
    }

    pub fn from_config(aws: &AwsConfig) -> Self {
        let configured = match (&aws.access_key_id, &aws.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) if aws.has_credentials() => {
                Some(Credentials {
                    access_key_id: access_key_id.clone(),
                    secret_access_key: secret_access_key.clone(),
                    session_token: aws.session_token.clone(),
                })
            }
            _ => None,
        };

        Self::new(configured, aws.profile.clone())
    }

    pub async fn resolve(&self, region: &str) -> Result<ResolvedCredentials, ClientError> {
        if let Some(credentials) = &self.configured {
            return Ok(ResolvedCredentials {
                credentials: credentials.clone(),
                source: CredentialSource::Configured,
            });
        }

        let provider_config =
            ProviderConfig::without_region().with_region(Some(Region::new(region.to_string())));

        let mut profile_provider = ProfileFileCredentialsProvider::builder().configure(&provider_config);
        if let Some(profile) = &self.profile {
            profile_provider = profile_provider.profile_name(profile.clone());
        }
        let profile_name = self.profile.clone().unwrap_or_else(|| DEFAULT_PROFILE.to_string());

        let providers: [(CredentialSource, Box<dyn ProvideCredentials>); 4] = [
            (CredentialSource::Profile(profile_name), Box::new(profile_provider.build())),
            (
                CredentialSource::WebIdentity,
                Box::new(WebIdentityTokenCredentialsProvider::builder().configure(&provider_config).build()),
            ),
            (
                CredentialSource::Container,
                Box::new(EcsCredentialsProvider::builder().configure(&provider_config).build()),
            ),
            (
                CredentialSource::InstanceMetadata,
                Box::new(ImdsCredentialsProvider::builder().configure(&provider_config).build()),
            ),
        ];

        for (source, provider) in providers {
            match provider.provide_credentials().await {
                Ok(found) => {
                    debug!(
                        event_name = "retrieval.credentials.resolved",
                        source = %source,
                        "aws credentials resolved"
                    );
                    return Ok(ResolvedCredentials {
                        credentials: Credentials {
                            access_key_id: found.access_key_id().to_string(),
                            secret_access_key: found.secret_access_key().to_string().into(),
                            session_token: found.session_token().map(|token| token.to_string().into()),
                        },
                        source,
                    });
                }
                Err(CredentialsError::CredentialsNotLoaded(_)) => {
                    debug!(
                        event_name = "retrieval.credentials.skipped",
                        source = %source,
                        "credential provider had nothing to offer"
                    );
                }
                Err(error) => {
                    return Err(ClientError::CredentialProvider {
                        provider: source.to_string(),
                        message: describe_chain(&error),
                    });
                }
            }
        }

        Err(ClientError::MissingCredentials)
    }
}
