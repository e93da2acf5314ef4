//! Gemini provider implementation
//!
//! Talks to the Generative Language API's `generateContent` endpoint. This
//! is the backend the production deployment runs on; the API key comes from
//! configuration or the `GOOGLE_API_KEY` environment variable, and the base
//! URL can be overridden to point at a mock server in tests.

use crate::config::GeminiConfig;
use crate::error::{Result, VialyError};
use crate::providers::Generator;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Gemini API generator
///
/// # Examples
///
/// ```
/// use vialy::config::GeminiConfig;
/// use vialy::providers::GeminiGenerator;
///
/// let config = GeminiConfig {
///     api_key: Some("test-key".to_string()),
///     ..GeminiConfig::default()
/// };
/// let generator = GeminiGenerator::new(config);
/// assert!(generator.is_ok());
/// ```
pub struct GeminiGenerator {
    client: Client,
    config: GeminiConfig,
    api_key: String,
}

/// Request body for generateContent
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

/// Response body from generateContent
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiGenerator {
    /// Create a new Gemini generator
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no API key is available, and a
    /// provider error if HTTP client initialization fails.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                VialyError::Config(
                    "Gemini API key is not set (config or GOOGLE_API_KEY)".to_string(),
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent("vialy/0.2.0")
            .build()
            .map_err(|e| VialyError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(model = %config.model, "initialized Gemini provider");

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        let base = self
            .config
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/');
        format!(
            "{}/v1beta/models/{}:generateContent",
            base, self.config.model
        )
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| VialyError::Provider(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VialyError::Provider(format!(
                "Gemini returned status {}: {}",
                status, body
            ))
            .into());
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| VialyError::Provider(format!("invalid Gemini response: {}", e)))?;

        let text = body
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .concat()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(
                VialyError::Provider("Gemini response contained no text".to_string()).into(),
            );
        }

        Ok(text.trim().to_string())
    }
}
