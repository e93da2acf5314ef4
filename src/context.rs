//! Per-session conversation context
//!
//! Accumulates topics, detected violations, cited statute articles, and
//! salient Q/A pairs across turns, and renders the compact digest injected
//! into prompts. All mutation is additive and every bounded list is trimmed
//! to its cap immediately after each append.

use crate::classify::Category;
use crate::error::Result;
use crate::reference;
use crate::storage::SqliteStore;
use crate::text::truncate_chars;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Sentinel digest for a session with no accumulated context
pub const NO_CONTEXT: &str = "Sin contexto previo.";

const MAX_SALIENT_QUESTIONS: usize = 5;
const MAX_KEY_ANSWERS: usize = 10;
const KEY_ANSWER_MAX_CHARS: usize = 500;
/// Questions of 3 words or fewer are not considered substantial
const MIN_SALIENT_WORDS: usize = 4;
/// Replies this short carry no answer worth keeping
const MIN_KEY_ANSWER_CHARS: usize = 21;

/// Statute citation patterns: "Artículo"/"Art." spellings crossed with
/// plain or hyphenated numerals ("29", "131-D.4") and letter-dot
/// identifiers ("D.1"), all case-insensitive.
static CITATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)Artículo\s+(\d+(?:-[A-F]\.\d+)?)",
        r"(?i)Art\.\s+(\d+(?:-[A-F]\.\d+)?)",
        r"(?i)Artículo\s+([A-F]\.\d+)",
        r"(?i)Art\.\s+([A-F]\.\d+)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// One remembered question/answer pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyAnswer {
    pub question: String,
    /// Truncated to 500 characters
    pub answer: String,
    pub category: Category,
    pub timestamp: DateTime<Utc>,
}

/// Accumulated context of one conversation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Category labels seen so far, lower-cased, insertion-ordered, unique
    pub topics: Vec<String>,
    /// First category ever assigned; immutable once set
    pub primary_topic: Option<String>,
    /// Violation keys detected in user turns
    pub violations_mentioned: Vec<String>,
    /// Article identifiers extracted from system replies
    pub statute_references_cited: Vec<String>,
    /// Up to 5 most recent substantial user questions
    pub salient_questions: Vec<String>,
    /// Up to 10 most recent remembered answers
    pub key_answers: Vec<KeyAnswer>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ConversationContext {
    /// Folds one completed turn into the context
    ///
    /// Steps run in a fixed order: topic append, violation detection over
    /// the user text, citation extraction over the system reply, primary
    /// topic, salient question, key answer, timestamp.
    pub fn apply_turn(&mut self, user_text: &str, system_text: &str, category: Category) {
        let topic = category.as_str().to_lowercase();
        if !self.topics.contains(&topic) {
            self.topics.push(topic);
        }

        for key in reference::detect_violations(user_text) {
            if !self.violations_mentioned.iter().any(|v| v.as_str() == key) {
                self.violations_mentioned.push(key.to_string());
            }
        }

        for citation in extract_citations(system_text) {
            if !self.statute_references_cited.contains(&citation) {
                self.statute_references_cited.push(citation);
            }
        }

        if self.primary_topic.is_none() {
            self.primary_topic = Some(category.as_str().to_string());
        }

        if user_text.split_whitespace().count() >= MIN_SALIENT_WORDS {
            let normalized = user_text.trim().to_lowercase();
            let duplicate = self
                .salient_questions
                .iter()
                .any(|q| q.trim().to_lowercase() == normalized);
            if !duplicate {
                self.salient_questions.push(user_text.to_string());
                let len = self.salient_questions.len();
                if len > MAX_SALIENT_QUESTIONS {
                    self.salient_questions.drain(0..len - MAX_SALIENT_QUESTIONS);
                }
            }
        }

        if system_text.chars().count() >= MIN_KEY_ANSWER_CHARS {
            self.key_answers.push(KeyAnswer {
                question: user_text.to_string(),
                answer: truncate_chars(system_text, KEY_ANSWER_MAX_CHARS),
                category,
                timestamp: Utc::now(),
            });
            let len = self.key_answers.len();
            if len > MAX_KEY_ANSWERS {
                self.key_answers.drain(0..len - MAX_KEY_ANSWERS);
            }
        }

        self.updated_at = Some(Utc::now());
    }

    /// Whether the digest is worth injecting into a prompt
    ///
    /// True once the session has at least one topic or one detected
    /// violation; a session's first turn has neither, and injecting an
    /// empty digest would only add noise.
    pub fn has_signal(&self) -> bool {
        !self.topics.is_empty() || !self.violations_mentioned.is_empty()
    }

    /// Renders the human-readable digest for prompt injection
    pub fn render_digest(&self, max_items: usize) -> String {
        let mut parts = Vec::new();

        if let Some(primary) = &self.primary_topic {
            parts.push(format!("📌 Tema Principal: {}", primary));
        }

        if !self.topics.is_empty() {
            parts.push(format!("🏷️ Temas: {}", self.topics.join(", ")));
        }

        if !self.violations_mentioned.is_empty() {
            let names: Vec<String> = self
                .violations_mentioned
                .iter()
                .take(max_items)
                .map(|key| title_case(key))
                .collect();
            parts.push(format!(
                "⚠️ Infracciones Mencionadas: {}",
                names.join(", ")
            ));
        }

        if !self.statute_references_cited.is_empty() {
            let articles: Vec<&str> = self
                .statute_references_cited
                .iter()
                .take(max_items)
                .map(String::as_str)
                .collect();
            parts.push(format!("📜 Artículos: {}", articles.join(", ")));
        }

        if !self.salient_questions.is_empty() {
            parts.push("❓ Preguntas Principales:".to_string());
            let skip = self.salient_questions.len().saturating_sub(3);
            for q in self.salient_questions.iter().skip(skip) {
                parts.push(format!("  • {}", q));
            }
        }

        if parts.is_empty() {
            NO_CONTEXT.to_string()
        } else {
            parts.join("\n")
        }
    }
}

/// Extracts statute citations from a reply, in match order, de-duplicated
fn extract_citations(text: &str) -> Vec<String> {
    let mut citations = Vec::new();
    for pattern in CITATION_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                let citation = m.as_str().to_string();
                if !citations.contains(&citation) {
                    citations.push(citation);
                }
            }
        }
    }
    citations
}

/// "exceso_velocidad" -> "Exceso Velocidad"
fn title_case(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Store-backed manager for per-session conversation contexts
pub struct ContextTracker {
    store: Arc<SqliteStore>,
}

impl ContextTracker {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }

    /// Loads a session's context, or an empty one if none is stored yet
    ///
    /// The empty context is not persisted until the first `update`.
    pub fn get_or_create(&self, session_id: &str) -> Result<ConversationContext> {
        match self.store.load_context_json(session_id)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(ConversationContext::default()),
        }
    }

    /// Folds one completed turn into the stored context
    pub fn update(
        &self,
        session_id: &str,
        user_text: &str,
        system_text: &str,
        category: Category,
    ) -> Result<()> {
        let mut context = self.get_or_create(session_id)?;
        context.apply_turn(user_text, system_text, category);
        self.store
            .save_context_json(session_id, &serde_json::to_string(&context)?)?;
        tracing::debug!(%session_id, "conversation context updated");
        Ok(())
    }

    /// Renders the digest for prompt injection
    ///
    /// Falls back to the no-context sentinel on any storage failure; the
    /// digest is an enrichment, never a reason to fail a request.
    pub fn get_formatted_context(&self, session_id: &str, max_items: usize) -> String {
        match self.get_or_create(session_id) {
            Ok(context) => context.render_digest(max_items),
            Err(e) => {
                tracing::warn!(%session_id, error = %e, "failed to load context");
                NO_CONTEXT.to_string()
            }
        }
    }

    /// Whether the session has accumulated enough context to inject
    pub fn should_include_context(&self, session_id: &str) -> bool {
        self.get_or_create(session_id)
            .map(|c| c.has_signal())
            .unwrap_or(false)
    }
}
