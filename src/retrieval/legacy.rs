//! HTTP client for the legacy document index
//!
//! The previous index deployment exposes a `GET /query` endpoint returning
//! a bare array of documents with nested metadata. Kept as the second link
//! of the retrieval chain until the old service is decommissioned.

use crate::error::{Result, VialyError};
use crate::retrieval::{Passage, Retriever};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Client for the legacy document index service
pub struct LegacyIndexRetriever {
    client: Client,
    base_url: String,
}

/// One document in the legacy response array
#[derive(Debug, Deserialize)]
struct LegacyHit {
    content: String,
    #[serde(default)]
    metadata: LegacyMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct LegacyMetadata {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    page: Option<u32>,
}

impl LegacyIndexRetriever {
    /// Create a client for the legacy index at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("vialy/0.2.0")
            .build()
            .map_err(|e| VialyError::Retrieval(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::info!(%base_url, "initialized legacy index retriever");

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl Retriever for LegacyIndexRetriever {
    fn name(&self) -> &str {
        "legacy-index"
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>> {
        let url = format!("{}/query", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("k", &k.to_string())])
            .send()
            .await
            .map_err(|e| VialyError::Retrieval(format!("legacy index request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(VialyError::Retrieval(format!(
                "legacy index returned status {}",
                response.status()
            ))
            .into());
        }

        let hits: Vec<LegacyHit> = response
            .json()
            .await
            .map_err(|e| VialyError::Retrieval(format!("invalid legacy index response: {}", e)))?;

        Ok(hits
            .into_iter()
            .map(|hit| {
                Passage::new(
                    &hit.content,
                    hit.metadata
                        .source
                        .as_deref()
                        .unwrap_or("documento_desconocido"),
                    hit.metadata.page,
                )
            })
            .collect())
    }
}
