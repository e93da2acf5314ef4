//! Category-specific prompt composition
//!
//! Selects one of five fixed templates by query category and fills in the
//! literal user query, the retrieval context, the turn history, and the
//! conversation digest. Any input that is absent gets an explicit Spanish
//! placeholder rather than an empty slot, so the generation backend always
//! sees a complete prompt.

mod templates;

use crate::classify::Category;
use crate::reference;
use crate::text::truncate_chars;

/// Placeholder when retrieval produced no passages
pub const NO_RAG_CONTEXT: &str = "No hay documentos específicos para esta consulta.";

/// Placeholder when the session has no prior turns
pub const NO_HISTORY_PLACEHOLDER: &str = "Sin conversación previa.";

/// Placeholder when the conversation digest is not injected
pub const NO_CONVERSATION_CONTEXT: &str = "Sin contexto previo en esta conversación.";

/// Fast-mode prompts cap the retrieval block at this many characters
const FAST_RAG_CONTEXT_MAX_CHARS: usize = 1000;

/// Placeholder for fast-mode prompts with no retrieval context
const FAST_NO_RAG_CONTEXT: &str = "Sin info específica.";

/// Composer of generation prompts
///
/// In fast mode the reduced template set is used: history and digest are
/// ignored entirely and the retrieval context is truncated, trading
/// conversational continuity for latency.
///
/// # Examples
///
/// ```
/// use vialy::classify::Category;
/// use vialy::prompts::PromptComposer;
///
/// let composer = PromptComposer::new(false);
/// let prompt = composer.compose(
///     Category::Multa,
///     "¿Cuánto es la multa por exceso de velocidad?",
///     None,
///     "",
///     None,
/// );
/// assert!(prompt.contains("¿Cuánto es la multa por exceso de velocidad?"));
/// assert!(prompt.contains("Tipo C = 15 SMLDV"));
/// ```
pub struct PromptComposer {
    fast_mode: bool,
}

impl PromptComposer {
    pub fn new(fast_mode: bool) -> Self {
        Self { fast_mode }
    }

    pub fn fast_mode(&self) -> bool {
        self.fast_mode
    }

    /// Composes the generation prompt for one request
    ///
    /// `rag_context` and `digest` are `None` when retrieval found nothing
    /// or the session has no accumulated context; `history` may be empty.
    /// Never fails: every category maps to a template, with `General` as
    /// the fallback for anything unrecognized upstream.
    pub fn compose(
        &self,
        category: Category,
        query: &str,
        rag_context: Option<&str>,
        history: &str,
        digest: Option<&str>,
    ) -> String {
        if self.fast_mode {
            self.compose_fast(category, query, rag_context)
        } else {
            self.compose_full(category, query, rag_context, history, digest)
        }
    }

    fn compose_full(
        &self,
        category: Category,
        query: &str,
        rag_context: Option<&str>,
        history: &str,
        digest: Option<&str>,
    ) -> String {
        let template = match category {
            Category::Multa => templates::MULTA,
            Category::Requisito => templates::REQUISITO,
            Category::Normativa => templates::NORMATIVA,
            Category::Procedimiento => templates::PROCEDIMIENTO,
            Category::General => templates::GENERAL,
        };

        let rag = non_empty(rag_context).unwrap_or(NO_RAG_CONTEXT);
        let history = if history.trim().is_empty() {
            NO_HISTORY_PLACEHOLDER
        } else {
            history
        };
        let digest = non_empty(digest).unwrap_or(NO_CONVERSATION_CONTEXT);

        render(template, query, rag, history, digest)
    }

    fn compose_fast(&self, category: Category, query: &str, rag_context: Option<&str>) -> String {
        let template = match category {
            Category::Multa => templates::FAST_MULTA,
            Category::Requisito => templates::FAST_REQUISITO,
            Category::Normativa => templates::FAST_NORMATIVA,
            Category::Procedimiento => templates::FAST_PROCEDIMIENTO,
            Category::General => templates::FAST_GENERAL,
        };

        let rag = match non_empty(rag_context) {
            Some(ctx) => truncate_chars(ctx, FAST_RAG_CONTEXT_MAX_CHARS),
            None => FAST_NO_RAG_CONTEXT.to_string(),
        };

        render(template, query, &rag, "", "")
    }
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new(false)
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// Substitutes every template marker; markers a template does not carry are
/// no-ops, so the reference blocks can be applied unconditionally
fn render(template: &str, query: &str, rag_context: &str, history: &str, digest: &str) -> String {
    template
        .replace("{query}", query)
        .replace("{context}", digest)
        .replace("{rag_context}", rag_context)
        .replace("{history}", history)
        .replace("{smldv}", &reference::format_pesos(reference::SMLDV_2025))
        .replace("{fine_table}", &reference::fine_tier_table())
        .replace("{violation_values}", &reference::violation_values_table())
        .replace("{documents}", &reference::required_documents_list())
        .replace("{costs}", &reference::procedure_costs_list())
        .replace(
            "{tipo_c_valor}",
            &reference::format_pesos(reference::FineTier::C.pesos()),
        )
        .replace(
            "{tipo_d_valor}",
            &reference::format_pesos(reference::FineTier::D.pesos()),
        )
}
