//! Typed view of the `Retrieve` response body and its mapping into
//! [`RetrievalRecord`]s.
//!
//! Every upstream field is optional. Defaults are applied only in
//! [`RetrievalResultItem::into_record`]: empty content, the `unknown` source
//! placeholder, a zero score, and metadata built from complete attribute pairs.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::domain::record::{RetrievalRecord, UNKNOWN_SOURCE};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveResponse {
    #[serde(default)]
    pub retrieval_results: Option<Vec<RetrievalResultItem>>,
    #[serde(default)]
    pub next_token: Option<String>,
}

impl RetrieveResponse {
    /// Maps every hit in upstream order; nothing is dropped or re-sorted.
    pub fn into_records(self) -> Vec<RetrievalRecord> {
        self.retrieval_results
            .unwrap_or_default()
            .into_iter()
            .map(RetrievalResultItem::into_record)
            .collect()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResultItem {
    #[serde(default)]
    pub content: Option<ResultContent>,
    #[serde(default)]
    pub location: Option<ResultLocation>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub metadata: Option<ResultMetadata>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ResultContent {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultLocation {
    #[serde(default)]
    pub s3_location: Option<UriLocation>,
    #[serde(default)]
    pub web_location: Option<UrlLocation>,
    #[serde(default)]
    pub confluence_location: Option<UrlLocation>,
    #[serde(default)]
    pub salesforce_location: Option<UrlLocation>,
    #[serde(default)]
    pub share_point_location: Option<UrlLocation>,
    #[serde(default)]
    pub kendra_document_location: Option<UriLocation>,
    #[serde(default)]
    pub custom_document_location: Option<IdLocation>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UriLocation {
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UrlLocation {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct IdLocation {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ResultMetadata {
    #[serde(default)]
    pub attributes: Option<Vec<MetadataAttribute>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MetadataAttribute {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<AttributeValue>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AttributeValue {
    #[serde(default)]
    pub text: Option<String>,
}

impl ResultLocation {
    /// First non-empty location string, S3 first.
    pub fn source(self) -> Option<String> {
        let url = |location: Option<UrlLocation>| location.and_then(|location| location.url);
        let candidates = [
            self.s3_location.and_then(|location| location.uri),
            url(self.web_location),
            url(self.confluence_location),
            url(self.salesforce_location),
            url(self.share_point_location),
            self.kendra_document_location.and_then(|location| location.uri),
            self.custom_document_location.and_then(|location| location.id),
            self.uri,
        ];

        candidates.into_iter().flatten().find(|value| !value.is_empty())
    }
}

impl ResultMetadata {
    /// Later duplicates of a key replace earlier ones.
    pub fn into_map(self) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        for attribute in self.attributes.unwrap_or_default() {
            let key = attribute.key.filter(|key| !key.is_empty());
            let value = attribute.value.and_then(|value| value.text).filter(|text| !text.is_empty());
            if let (Some(key), Some(value)) = (key, value) {
                metadata.insert(key, value);
            }
        }
        metadata
    }
}

impl RetrievalResultItem {
    pub fn into_record(self) -> RetrievalRecord {
        RetrievalRecord {
            content: self.content.and_then(|content| content.text).unwrap_or_default(),
            source: self
                .location
                .and_then(ResultLocation::source)
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
            score: self.score.unwrap_or(0.0),
            metadata: self.metadata.map(ResultMetadata::into_map).unwrap_or_default(),
        }
    }
}
