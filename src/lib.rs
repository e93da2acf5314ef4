//! Vialy - Conversational assistant for the Colombian traffic code
//!
//! This library implements the conversational query-processing pipeline
//! behind Vialy: query classification, per-session conversational memory,
//! retrieval-context assembly, category-specific prompt composition,
//! response caching, and the policy stitching these into one
//! request/response cycle.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `assistant`: the request pipeline wiring every component together
//! - `classify`: query category classification and intent estimation
//! - `context`: per-session conversation context and digest rendering
//! - `session`: session identity, turn history, and expiry
//! - `storage`: SQLite persistence for sessions, turns, and contexts
//! - `retrieval`: document index clients and the ranked fallback chain
//! - `prompts`: category prompt templates and composition
//! - `providers`: text-generation backends (Gemini, Ollama)
//! - `cache`: FIFO response cache keyed by query fingerprint
//! - `reference`: immutable traffic-code reference tables
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use vialy::{Assistant, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let assistant = Assistant::from_config(&config)?;
//!     let response = assistant
//!         .ask("¿Cuánto es la multa por exceso de velocidad?", "user-1", None)
//!         .await?;
//!     println!("{}", response.answer);
//!     Ok(())
//! }
//! ```

pub mod assistant;
pub mod cache;
pub mod classify;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod prompts;
pub mod providers;
pub mod reference;
pub mod retrieval;
pub mod session;
pub mod storage;
pub mod text;

// Re-export commonly used types
pub use assistant::{AskResponse, Assistant, ServiceStatus};
pub use classify::{Category, Intent};
pub use config::Config;
pub use error::{Result, VialyError};
