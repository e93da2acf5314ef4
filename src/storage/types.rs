use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    /// Storage representation
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }

    /// Label used when rendering history into prompts
    pub fn display_label(self) -> &'static str {
        match self {
            Sender::User => "Usuario",
            Sender::Assistant => "Asistente",
        }
    }

    pub fn parse(s: &str) -> Option<Sender> {
        match s {
            "user" => Some(Sender::User),
            "assistant" => Some(Sender::Assistant),
            _ => None,
        }
    }
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Ended,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Ended => "ended",
        }
    }

    pub fn parse(s: &str) -> Option<SessionStatus> {
        match s {
            "active" => Some(SessionStatus::Active),
            "ended" => Some(SessionStatus::Ended),
            _ => None,
        }
    }
}

/// One stored conversation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    /// Opaque unique session token
    pub session_id: String,
    /// External identity the session belongs to
    pub owner_id: String,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

/// One stored message row
///
/// A logical turn is a user row and an assistant row created together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTurn {
    pub sender: Sender,
    pub text: String,
    /// Classification of the user utterance that started the turn
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}
