//! Error types for Vialy
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Vialy operations
///
/// This enum encompasses all possible errors that can occur during
/// query processing, configuration loading, provider interactions,
/// retrieval, and session persistence.
#[derive(Error, Debug)]
pub enum VialyError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Client input errors (missing owner, query too short)
    ///
    /// Rejected before any side effect takes place.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generation backend errors (API calls, authentication, etc.)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Generation backend unavailable or deadline exceeded
    ///
    /// Distinguishable from `Provider` so callers can report a degraded
    /// service rather than a generic failure.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Retrieval backend errors
    ///
    /// The pipeline absorbs these into an empty retrieval context; they
    /// only surface from the individual retriever clients.
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Session or context persistence errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Session referenced but not found
    ///
    /// Logged and absorbed during turn appends; session creation and
    /// population are separate calls.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// SQLite errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for Vialy operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
