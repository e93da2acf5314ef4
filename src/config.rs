//! Configuration management for Vialy
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, VialyError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Vialy
///
/// Holds everything the pipeline needs: the generation provider, the
/// retrieval backends, session behavior, cache sizing, and pipeline knobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Generation provider configuration (Gemini, Ollama)
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Document index configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Session and history configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Response cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Request pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Generation provider configuration
///
/// Specifies which backend to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use ("gemini" or "ollama")
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

    /// Gemini configuration
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
}

fn default_provider_type() -> String {
    "gemini".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            gemini: GeminiConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

/// Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Model to use
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// API key; usually supplied via the GOOGLE_API_KEY environment
    /// variable rather than the config file
    #[serde(default)]
    pub api_key: Option<String>,

    /// Optional API base URL override (useful for tests and local mocks)
    #[serde(default)]
    pub api_base: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Response length cap in tokens
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_output_tokens() -> u32 {
    1000
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_gemini_model(),
            api_key: None,
            api_base: None,
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model to use
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:latest".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
            temperature: default_temperature(),
        }
    }
}

/// Document index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Primary index service URL
    #[serde(default = "default_index_url")]
    pub index_url: String,

    /// Legacy index service URL; tried when the primary fails
    #[serde(default)]
    pub legacy_url: Option<String>,

    /// Passages retrieved per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_index_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_top_k() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            index_url: default_index_url(),
            legacy_url: None,
            top_k: default_top_k(),
        }
    }
}

/// Session and history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Turn pairs injected into prompts
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Idle hours before a session expires
    #[serde(default = "default_session_timeout_hours")]
    pub timeout_hours: i64,

    /// Database file override; defaults to the user data directory
    #[serde(default)]
    pub db_path: Option<String>,
}

fn default_max_history() -> usize {
    crate::session::DEFAULT_MAX_HISTORY
}

fn default_session_timeout_hours() -> i64 {
    crate::session::DEFAULT_SESSION_TIMEOUT_HOURS
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            timeout_hours: default_session_timeout_hours(),
            db_path: None,
        }
    }
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum cached answers before FIFO eviction
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

fn default_cache_max_entries() -> usize {
    crate::cache::DEFAULT_CACHE_CAPACITY
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_cache_max_entries(),
        }
    }
}

/// Request pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Use the reduced prompt set that skips history and context
    #[serde(default)]
    pub fast_mode: bool,

    /// Deadline for one generation call, in seconds
    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_seconds: u64,

    /// Queries shorter than this are rejected
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,
}

fn default_generation_timeout() -> u64 {
    60
}

fn default_min_query_chars() -> usize {
    3
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fast_mode: false,
            generation_timeout_seconds: default_generation_timeout(),
            min_query_chars: default_min_query_chars(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| VialyError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| VialyError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider_type) = std::env::var("VIALY_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(api_key) = std::env::var("GOOGLE_API_KEY") {
            if !api_key.is_empty() {
                self.provider.gemini.api_key = Some(api_key);
            }
        }

        if let Ok(model) = std::env::var("VIALY_GEMINI_MODEL") {
            self.provider.gemini.model = model;
        }

        if let Ok(host) = std::env::var("VIALY_OLLAMA_HOST") {
            self.provider.ollama.host = host;
        }

        if let Ok(model) = std::env::var("VIALY_OLLAMA_MODEL") {
            self.provider.ollama.model = model;
        }

        if let Ok(url) = std::env::var("VIALY_INDEX_URL") {
            self.retrieval.index_url = url;
        }

        if let Ok(url) = std::env::var("VIALY_LEGACY_INDEX_URL") {
            self.retrieval.legacy_url = Some(url);
        }

        if let Ok(top_k) = std::env::var("VIALY_TOP_K") {
            if let Ok(value) = top_k.parse() {
                self.retrieval.top_k = value;
            } else {
                tracing::warn!("Invalid VIALY_TOP_K: {}", top_k);
            }
        }

        if let Ok(fast) = std::env::var("VIALY_FAST_MODE") {
            match fast.parse::<bool>() {
                Ok(value) => self.pipeline.fast_mode = value,
                Err(_) => tracing::warn!("Invalid VIALY_FAST_MODE: {}", fast),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(db_path) = &cli.storage_path {
            self.session.db_path = Some(db_path.clone());
        }

        if let Some(provider) = cli.command.provider_override() {
            self.provider.provider_type = provider.to_string();
        }

        if cli.command.fast_override() {
            self.pipeline.fast_mode = true;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.provider.provider_type.is_empty() {
            return Err(VialyError::Config("Provider type cannot be empty".to_string()).into());
        }

        let valid_providers = ["gemini", "ollama"];
        if !valid_providers.contains(&self.provider.provider_type.as_str()) {
            return Err(VialyError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                valid_providers.join(", ")
            ))
            .into());
        }

        if self.retrieval.top_k == 0 {
            return Err(VialyError::Config("retrieval.top_k must be greater than 0".to_string()).into());
        }

        if self.retrieval.top_k > 20 {
            return Err(VialyError::Config(
                "retrieval.top_k must be less than or equal to 20".to_string(),
            )
            .into());
        }

        if self.session.max_history == 0 {
            return Err(VialyError::Config(
                "session.max_history must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.timeout_hours <= 0 {
            return Err(VialyError::Config(
                "session.timeout_hours must be greater than 0".to_string(),
            )
            .into());
        }

        if self.cache.max_entries == 0 {
            return Err(VialyError::Config(
                "cache.max_entries must be greater than 0".to_string(),
            )
            .into());
        }

        if self.pipeline.generation_timeout_seconds == 0 {
            return Err(VialyError::Config(
                "pipeline.generation_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.pipeline.min_query_chars == 0 {
            return Err(VialyError::Config(
                "pipeline.min_query_chars must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
