//! Command-line interface definition for Vialy
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for one-shot questions, interactive chat, and
//! session maintenance.

use clap::{Parser, Subcommand};

/// Vialy - Conversational assistant for the Colombian traffic code
///
/// Ask natural-language questions about the Código Nacional de Tránsito;
/// answers combine retrieved passages from the code with per-session
/// conversational memory.
#[derive(Parser, Debug, Clone)]
#[command(name = "vialy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the session database path
    #[arg(long)]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Vialy
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Ask a single question
    Ask {
        /// The question text
        query: String,

        /// Identity the session belongs to
        #[arg(short, long)]
        owner: String,

        /// Existing session token to continue
        #[arg(short, long)]
        session: Option<String>,

        /// Override the provider from config (gemini, ollama)
        #[arg(short, long)]
        provider: Option<String>,

        /// Use the reduced fast-mode prompts (no history or context)
        #[arg(long)]
        fast: bool,
    },

    /// Start an interactive chat session
    Chat {
        /// Identity the session belongs to
        #[arg(short, long)]
        owner: String,

        /// Existing session token to resume
        #[arg(short, long)]
        session: Option<String>,

        /// Override the provider from config (gemini, ollama)
        #[arg(short, long)]
        provider: Option<String>,

        /// Use the reduced fast-mode prompts (no history or context)
        #[arg(long)]
        fast: bool,
    },

    /// Show service status (active sessions after expiry cleanup)
    Status,

    /// Show one session's details
    Info {
        /// Session token
        session: String,
    },

    /// Delete a session's history
    Clear {
        /// Session token
        session: String,
    },
}

impl Commands {
    /// Provider override carried by the subcommand, if any
    pub fn provider_override(&self) -> Option<&str> {
        match self {
            Commands::Ask { provider, .. } | Commands::Chat { provider, .. } => provider.as_deref(),
            _ => None,
        }
    }

    /// Whether the subcommand requested fast mode
    pub fn fast_override(&self) -> bool {
        match self {
            Commands::Ask { fast, .. } | Commands::Chat { fast, .. } => *fast,
            _ => false,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            storage_path: None,
            command: Commands::Status,
        }
    }
}
