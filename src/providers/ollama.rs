//! Ollama provider implementation
//!
//! Connects to a local or remote Ollama server through the non-streaming
//! `/api/generate` endpoint. Useful as a self-hosted alternative when no
//! Gemini API key is available.

use crate::config::OllamaConfig;
use crate::error::{Result, VialyError};
use crate::providers::Generator;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama API generator
///
/// # Examples
///
/// ```
/// use vialy::config::OllamaConfig;
/// use vialy::providers::OllamaGenerator;
///
/// let config = OllamaConfig {
///     host: "http://localhost:11434".to_string(),
///     model: "llama3.2:latest".to_string(),
///     temperature: 0.3,
/// };
/// let generator = OllamaGenerator::new(config);
/// assert!(generator.is_ok());
/// ```
pub struct OllamaGenerator {
    client: Client,
    config: OllamaConfig,
}

/// Request body for /api/generate
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Response body from /api/generate
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

impl OllamaGenerator {
    /// Create a new Ollama generator
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent("vialy/0.2.0")
            .build()
            .map_err(|e| VialyError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            host = %config.host,
            model = %config.model,
            "initialized Ollama provider"
        );

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.config.host.trim_end_matches('/'));

        let request = OllamaRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| VialyError::Provider(format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(VialyError::Provider(format!(
                "Ollama returned status {}",
                response.status()
            ))
            .into());
        }

        let body: OllamaResponse = response
            .json()
            .await
            .map_err(|e| VialyError::Provider(format!("invalid Ollama response: {}", e)))?;

        if body.response.trim().is_empty() {
            return Err(
                VialyError::Provider("Ollama response contained no text".to_string()).into(),
            );
        }

        Ok(body.response.trim().to_string())
    }
}
