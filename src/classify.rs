//! Query classification and intent estimation
//!
//! Both decisions are pure functions of the lower-cased query text: no
//! external calls, no failure modes. A wrong-but-present category is always
//! preferable to blocking the pipeline, so the zero-signal answer is
//! `Category::General`, never an error.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Maximum number of memoized classifications kept before the memo resets
const MEMO_CAPACITY: usize = 256;

/// Query category
///
/// Serialized uppercase (`MULTA`, `REQUISITO`, ...) to match the wire and
/// storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Multa,
    Requisito,
    Normativa,
    Procedimiento,
    General,
}

impl Category {
    /// Categories carrying keyword sets, in tie-break order
    ///
    /// When two categories score the same, the first one here wins.
    const SCORED: [Category; 4] = [
        Category::Multa,
        Category::Requisito,
        Category::Normativa,
        Category::Procedimiento,
    ];

    /// Uppercase label used in storage and responses
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Multa => "MULTA",
            Category::Requisito => "REQUISITO",
            Category::Normativa => "NORMATIVA",
            Category::Procedimiento => "PROCEDIMIENTO",
            Category::General => "GENERAL",
        }
    }

    /// Human-friendly name for display surfaces
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Multa => "Sanciones y Multas",
            Category::Requisito => "Requisitos y Documentación",
            Category::Normativa => "Normativa Legal",
            Category::Procedimiento => "Procedimientos y Trámites",
            Category::General => "Consulta General",
        }
    }

    /// Parses a category label, case-insensitively
    ///
    /// Unrecognized labels resolve to `General` rather than failing; the
    /// prompt composer relies on this for its template fallback.
    ///
    /// # Examples
    ///
    /// ```
    /// use vialy::classify::Category;
    ///
    /// assert_eq!(Category::parse("multa"), Category::Multa);
    /// assert_eq!(Category::parse("NO-EXISTE"), Category::General);
    /// ```
    pub fn parse(label: &str) -> Category {
        match label.trim().to_uppercase().as_str() {
            "MULTA" => Category::Multa,
            "REQUISITO" => Category::Requisito,
            "NORMATIVA" => Category::Normativa,
            "PROCEDIMIENTO" => Category::Procedimiento,
            _ => Category::General,
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Category::Multa => &[
                "multa",
                "sanción",
                "penalización",
                "cuánto",
                "infracción",
                "comparendo",
                "pagar",
            ],
            Category::Requisito => &[
                "documento",
                "requisito",
                "necesito",
                "tramite",
                "permiso",
                "llevar",
                "presentar",
            ],
            Category::Normativa => &[
                "ley",
                "artículo",
                "norma",
                "código",
                "dice",
                "establece",
                "legal",
            ],
            Category::Procedimiento => &[
                "cómo", "pasos", "proceso", "renovar", "obtener", "hacer", "dónde",
            ],
            Category::General => &[],
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User intent behind a query
///
/// Serialized as its numeric wire code: 1 = specific information,
/// 2 = explanation, 3 = advice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Info,
    Explain,
    Advice,
}

impl Intent {
    pub fn code(self) -> u8 {
        match self {
            Intent::Info => 1,
            Intent::Explain => 2,
            Intent::Advice => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Intent> {
        match code {
            1 => Some(Intent::Info),
            2 => Some(Intent::Explain),
            3 => Some(Intent::Advice),
            _ => None,
        }
    }
}

impl Serialize for Intent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for Intent {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        Intent::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid intent code: {}", code)))
    }
}

/// Estimates the intent of a query
///
/// Advice phrases are checked before explanation phrases: a query matching
/// both ("cómo funciona...") is advice-seeking.
///
/// # Examples
///
/// ```
/// use vialy::classify::{estimate_intent, Intent};
///
/// assert_eq!(estimate_intent("¿Cómo renuevo mi licencia?"), Intent::Advice);
/// assert_eq!(estimate_intent("¿Por qué existe el SOAT?"), Intent::Explain);
/// assert_eq!(estimate_intent("valor del SOAT 2025"), Intent::Info);
/// ```
pub fn estimate_intent(query: &str) -> Intent {
    let lower = query.to_lowercase();

    const ADVICE: [&str; 4] = ["cómo", "pasos", "proceso", "debo"];
    const EXPLAIN: [&str; 4] = ["qué es", "por qué", "explica", "funciona"];

    if ADVICE.iter().any(|w| lower.contains(w)) {
        Intent::Advice
    } else if EXPLAIN.iter().any(|w| lower.contains(w)) {
        Intent::Explain
    } else {
        Intent::Info
    }
}

/// Keyword-based query classifier with a bounded memo
///
/// Classification is deterministic and idempotent, so results are memoized
/// by lower-cased query text. The memo is cleared wholesale when full; a
/// re-derivation is cheaper than eviction bookkeeping at this size.
///
/// # Examples
///
/// ```
/// use vialy::classify::{Category, Classifier};
///
/// let classifier = Classifier::new();
/// let cat = classifier.classify("¿Cuánto es la multa por exceso de velocidad?");
/// assert_eq!(cat, Category::Multa);
/// ```
pub struct Classifier {
    memo: RwLock<HashMap<String, Category>>,
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            memo: RwLock::new(HashMap::new()),
        }
    }

    /// Classifies a query into a category
    ///
    /// Never fails: a poisoned memo lock only disables memoization, and a
    /// query with no keyword signal classifies as `General`.
    pub fn classify(&self, query: &str) -> Category {
        let lower = query.to_lowercase();

        if let Ok(memo) = self.memo.read() {
            if let Some(category) = memo.get(&lower) {
                return *category;
            }
        }

        let category = classify_keywords(&lower);

        if let Ok(mut memo) = self.memo.write() {
            if memo.len() >= MEMO_CAPACITY {
                memo.clear();
            }
            memo.insert(lower, category);
        }

        tracing::debug!(%category, "query classified");
        category
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Scores each category by the number of its keywords present as substrings
/// of the lower-cased query; the strictly highest score wins, ties resolve
/// to the first category in `Category::SCORED`, zero resolves to `General`.
fn classify_keywords(lower: &str) -> Category {
    let mut best = Category::General;
    let mut best_score = 0usize;

    for category in Category::SCORED {
        let score = category
            .keywords()
            .iter()
            .filter(|kw| lower.contains(*kw))
            .count();
        if score > best_score {
            best = category;
            best_score = score;
        }
    }

    best
}
