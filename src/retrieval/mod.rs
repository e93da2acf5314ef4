//! Retrieval of relevant traffic-code passages
//!
//! The pipeline talks to whatever document index is deployed through the
//! [`Retriever`] trait, and a [`RetrieverChain`] tries a ranked list of
//! backends in order until one answers. Retrieval is an enrichment: when
//! every backend is down the chain yields an empty list and the pipeline
//! degrades to an empty-context prompt instead of failing the request.

pub mod index;
pub mod legacy;

pub use index::HttpIndexRetriever;
pub use legacy::LegacyIndexRetriever;

use crate::error::Result;
use crate::text::{collapse_whitespace, truncate_chars};
use async_trait::async_trait;
use serde::Serialize;

/// Citation snippets are capped at this many characters
pub const SNIPPET_MAX_CHARS: usize = 300;

/// Where a passage came from, as reported back to the caller
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    /// Source file name (base name only)
    pub file: String,
    pub page: Option<u32>,
    /// Display excerpt, truncated to [`SNIPPET_MAX_CHARS`]
    pub snippet: String,
}

/// One retrieved passage
///
/// `text` is the full passage with whitespace collapsed, as handed to the
/// prompt composer; only the citation snippet is truncated.
#[derive(Debug, Clone)]
pub struct Passage {
    pub text: String,
    pub source: SourceRef,
}

impl Passage {
    /// Normalizes a raw hit into a passage
    ///
    /// Collapses internal whitespace, strips the source path down to its
    /// base name, and builds the truncated citation snippet.
    pub fn new(raw_text: &str, source_path: &str, page: Option<u32>) -> Self {
        let text = collapse_whitespace(raw_text);
        let snippet = if text.chars().count() > SNIPPET_MAX_CHARS {
            format!("{}...", truncate_chars(&text, SNIPPET_MAX_CHARS))
        } else {
            text.clone()
        };
        let file = source_path
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("documento_desconocido")
            .to_string();

        Self {
            text,
            source: SourceRef {
                file,
                page,
                snippet,
            },
        }
    }
}

/// A document index backend
///
/// Implementations return the top-k passages relevant to a query. They may
/// error; only the [`RetrieverChain`] decides what an error means.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>>;
}

/// Ranked list of retrieval backends, tried in order
///
/// The preferred backend comes first; a legacy implementation can follow.
/// The first backend that answers wins, even with zero passages, so the
/// composer never needs to know which implementation served the request.
pub struct RetrieverChain {
    backends: Vec<Box<dyn Retriever>>,
}

impl RetrieverChain {
    pub fn new(backends: Vec<Box<dyn Retriever>>) -> Self {
        Self { backends }
    }

    /// A chain with no backends; every retrieval degrades to empty
    pub fn empty() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    /// Retrieves the top-k passages for a query
    ///
    /// Never fails: backend errors are logged and the next backend is
    /// tried; when the list is exhausted the result is an empty vec.
    pub async fn retrieve(&self, query: &str, k: usize) -> Vec<Passage> {
        for backend in &self.backends {
            match backend.search(query, k).await {
                Ok(passages) => {
                    tracing::debug!(
                        backend = backend.name(),
                        count = passages.len(),
                        "retrieval served"
                    );
                    return passages;
                }
                Err(e) => {
                    tracing::warn!(
                        backend = backend.name(),
                        error = %e,
                        "retrieval backend failed, trying next"
                    );
                }
            }
        }

        if !self.backends.is_empty() {
            tracing::warn!("all retrieval backends failed; continuing without context");
        }
        Vec::new()
    }
}

/// Joins passages into the retrieval-context block for prompt injection
///
/// Returns `None` when there are no passages; the composer substitutes its
/// explicit no-information placeholder.
pub fn format_rag_context(passages: &[Passage]) -> Option<String> {
    if passages.is_empty() {
        return None;
    }
    Some(
        passages
            .iter()
            .map(|p| format!("- {}", p.text))
            .collect::<Vec<_>>()
            .join("\n\n"),
    )
}
