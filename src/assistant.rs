//! The request pipeline
//!
//! Stitches classification, session tracking, context digestion, retrieval,
//! prompt composition, generation, and caching into one request/response
//! cycle. All collaborators are constructed once and injected; there is no
//! ambient global state.
//!
//! Per-request flow: input validation → session upsert → classification and
//! intent (pure) → cache check (on a hit the session binding still happens)
//! → history and digest fetch → retrieval (degrades to empty) → prompt
//! composition → deadline-bounded generation (no retry) → cache write, turn
//! append, context update.

use crate::cache::{fingerprint, CachedAnswer, ResponseCache};
use crate::classify::{estimate_intent, Category, Classifier, Intent};
use crate::config::Config;
use crate::context::ContextTracker;
use crate::error::{Result, VialyError};
use crate::prompts::PromptComposer;
use crate::providers::{create_generator, Generator};
use crate::retrieval::{
    format_rag_context, HttpIndexRetriever, LegacyIndexRetriever, Retriever, RetrieverChain,
    SourceRef,
};
use crate::session::{SessionInfo, SessionManager};
use crate::storage::SqliteStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Violations and citations shown in a digest, at most
const DIGEST_MAX_ITEMS: usize = 5;

/// Structured answer to one query
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    /// Whether retrieved passages backed the answer
    pub context_used: bool,
    pub session_id: String,
    pub category: Category,
    pub intent: Intent,
}

/// Aggregate service state
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub active_sessions: usize,
    pub cache_entries: usize,
}

/// The conversational query-processing pipeline
///
/// Constructed once at process start and shared by reference across
/// request handlers; every piece of shared mutable state (cache, store)
/// is safe under concurrent requests.
pub struct Assistant {
    classifier: Classifier,
    sessions: SessionManager,
    contexts: ContextTracker,
    retriever: RetrieverChain,
    generator: Box<dyn Generator>,
    cache: ResponseCache,
    composer: PromptComposer,
    top_k: usize,
    generation_timeout: Duration,
    min_query_chars: usize,
}

impl Assistant {
    /// Builds the full pipeline from configuration
    ///
    /// Wires the configured store, the retrieval chain (primary index
    /// first, legacy second when configured), and the generation backend.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = Arc::new(match &config.session.db_path {
            Some(path) => SqliteStore::new_with_path(path)?,
            None => SqliteStore::new()?,
        });

        let mut backends: Vec<Box<dyn Retriever>> = vec![Box::new(HttpIndexRetriever::new(
            config.retrieval.index_url.as_str(),
        )?)];
        if let Some(legacy_url) = &config.retrieval.legacy_url {
            backends.push(Box::new(LegacyIndexRetriever::new(legacy_url.as_str())?));
        }

        let generator = create_generator(&config.provider)?;

        Ok(Self::new(
            store,
            RetrieverChain::new(backends),
            generator,
            config,
        ))
    }

    /// Builds the pipeline from explicit parts
    ///
    /// Used directly in tests, where the retriever chain and generator are
    /// stand-ins.
    pub fn new(
        store: Arc<SqliteStore>,
        retriever: RetrieverChain,
        generator: Box<dyn Generator>,
        config: &Config,
    ) -> Self {
        Self {
            classifier: Classifier::new(),
            sessions: SessionManager::new(
                Arc::clone(&store),
                config.session.max_history,
                config.session.timeout_hours,
            ),
            contexts: ContextTracker::new(store),
            retriever,
            generator,
            cache: ResponseCache::new(config.cache.max_entries),
            composer: PromptComposer::new(config.pipeline.fast_mode),
            top_k: config.retrieval.top_k,
            generation_timeout: Duration::from_secs(config.pipeline.generation_timeout_seconds),
            min_query_chars: config.pipeline.min_query_chars,
        }
    }

    /// Answers one query within a session
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a missing owner or a too-short query, rejected
    ///   before any side effect
    /// - `ServiceUnavailable` when generation fails or exceeds its
    ///   deadline; nothing is cached or appended in that case
    pub async fn ask(
        &self,
        query: &str,
        owner_id: &str,
        session_id: Option<&str>,
    ) -> Result<AskResponse> {
        let query = query.trim();
        if query.chars().count() < self.min_query_chars {
            return Err(VialyError::InvalidInput(format!(
                "query must be at least {} characters",
                self.min_query_chars
            ))
            .into());
        }

        let session_id = self.sessions.get_or_create_session(owner_id, session_id)?;

        let category = self.classifier.classify(query);
        let intent = estimate_intent(query);
        tracing::info!(%session_id, %category, intent = intent.code(), "query analyzed");

        let cache_key = fingerprint(query);
        if let Some(hit) = self.cache.lookup(&cache_key) {
            tracing::info!(%session_id, "answering from cache");
            self.bind_turn(&session_id, query, &hit.answer, hit.category);
            return Ok(AskResponse {
                answer: hit.answer,
                sources: hit.sources,
                context_used: hit.context_used,
                session_id,
                category: hit.category,
                intent: hit.intent,
            });
        }

        let history = self
            .sessions
            .get_history(&session_id, Some(self.sessions.max_history()));

        let digest = if self.contexts.should_include_context(&session_id) {
            Some(
                self.contexts
                    .get_formatted_context(&session_id, DIGEST_MAX_ITEMS),
            )
        } else {
            None
        };

        let passages = self.retriever.retrieve(query, self.top_k).await;
        let rag_context = format_rag_context(&passages);
        let sources: Vec<SourceRef> = passages.iter().map(|p| p.source.clone()).collect();
        let context_used = !sources.is_empty();

        let prompt = self.composer.compose(
            category,
            query,
            rag_context.as_deref(),
            &history,
            digest.as_deref(),
        );

        let answer = match tokio::time::timeout(
            self.generation_timeout,
            self.generator.generate(&prompt),
        )
        .await
        {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                tracing::error!(%session_id, error = %e, "generation failed");
                return Err(VialyError::ServiceUnavailable(format!(
                    "generation failed: {}",
                    e
                ))
                .into());
            }
            Err(_) => {
                tracing::error!(%session_id, "generation deadline exceeded");
                return Err(VialyError::ServiceUnavailable(
                    "generation deadline exceeded".to_string(),
                )
                .into());
            }
        };

        self.cache.insert(
            cache_key,
            CachedAnswer {
                answer: answer.clone(),
                sources: sources.clone(),
                context_used,
                category,
                intent,
            },
        );
        self.bind_turn(&session_id, query, &answer, category);

        Ok(AskResponse {
            answer,
            sources,
            context_used,
            session_id,
            category,
            intent,
        })
    }

    /// Session binding performed on every answered request, cached or not:
    /// turn append plus context update. Both absorb their own failures.
    fn bind_turn(&self, session_id: &str, query: &str, answer: &str, category: Category) {
        self.sessions.append_turn(session_id, query, answer, category);
        if let Err(e) = self.contexts.update(session_id, query, answer, category) {
            tracing::warn!(%session_id, error = %e, "failed to update context");
        }
    }

    /// Deletes a session's history; returns whether the session existed
    pub fn clear_history(&self, session_id: &str) -> Result<bool> {
        self.sessions.clear_history(session_id)
    }

    /// Summary of one session, if it exists
    pub fn session_info(&self, session_id: &str) -> Result<Option<SessionInfo>> {
        self.sessions.session_info(session_id)
    }

    /// Number of active sessions, after opportunistic expiry cleanup
    pub fn active_sessions(&self) -> Result<usize> {
        if let Err(e) = self.sessions.cleanup_expired() {
            tracing::warn!(error = %e, "expired-session cleanup failed");
        }
        self.sessions.active_session_count()
    }

    /// Aggregate service state
    pub fn status(&self) -> Result<ServiceStatus> {
        Ok(ServiceStatus {
            active_sessions: self.active_sessions()?,
            cache_entries: self.cache.len(),
        })
    }

    /// Drops all cached answers
    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!("response cache cleared");
    }
}
