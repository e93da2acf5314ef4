//! HTTP client for the primary document index
//!
//! Speaks the JSON search API of the current index deployment: a `POST
//! /search` with the query and passage count, answered with scored hits and
//! their source metadata.

use crate::error::{Result, VialyError};
use crate::retrieval::{Passage, Retriever};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout for index requests; retrieval is an enrichment and must not
/// stall the pipeline for long
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Client for the primary document index service
///
/// # Examples
///
/// ```
/// use vialy::retrieval::HttpIndexRetriever;
///
/// let retriever = HttpIndexRetriever::new("http://localhost:6333");
/// assert!(retriever.is_ok());
/// ```
pub struct HttpIndexRetriever {
    client: Client,
    base_url: String,
}

/// Request body for the search endpoint
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    k: usize,
}

/// Response from the search endpoint
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// One scored hit
#[derive(Debug, Deserialize)]
struct SearchHit {
    text: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    page: Option<u32>,
}

impl HttpIndexRetriever {
    /// Create a client for the index at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("vialy/0.2.0")
            .build()
            .map_err(|e| VialyError::Retrieval(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::info!(%base_url, "initialized index retriever");

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl Retriever for HttpIndexRetriever {
    fn name(&self) -> &str {
        "index"
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&SearchRequest { query, k })
            .send()
            .await
            .map_err(|e| VialyError::Retrieval(format!("index request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(VialyError::Retrieval(format!(
                "index returned status {}",
                response.status()
            ))
            .into());
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| VialyError::Retrieval(format!("invalid index response: {}", e)))?;

        Ok(body
            .results
            .into_iter()
            .map(|hit| {
                Passage::new(
                    &hit.text,
                    hit.source.as_deref().unwrap_or("documento_desconocido"),
                    hit.page,
                )
            })
            .collect())
    }
}
