//! Generation backend abstraction and implementations
//!
//! This module contains the text-generation trait and the Gemini and
//! Ollama backends, plus the config-driven factory that selects one.

pub mod base;
pub mod gemini;
pub mod ollama;

pub use base::Generator;
pub use gemini::GeminiGenerator;
pub use ollama::OllamaGenerator;

use crate::config::ProviderConfig;
use crate::error::Result;

/// Create a generator instance based on configuration
///
/// # Arguments
///
/// * `config` - Provider configuration naming the backend and its settings
///
/// # Returns
///
/// Returns a boxed generator instance
///
/// # Errors
///
/// Returns error if the provider type is invalid or initialization fails
pub fn create_generator(config: &ProviderConfig) -> Result<Box<dyn Generator>> {
    match config.provider_type.as_str() {
        "gemini" => Ok(Box::new(GeminiGenerator::new(config.gemini.clone())?)),
        "ollama" => Ok(Box::new(OllamaGenerator::new(config.ollama.clone())?)),
        other => Err(crate::error::VialyError::Provider(format!(
            "Unknown provider type: {}",
            other
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeminiConfig, OllamaConfig};

    fn provider_config(provider_type: &str) -> ProviderConfig {
        ProviderConfig {
            provider_type: provider_type.to_string(),
            gemini: GeminiConfig {
                api_key: Some("test-key".to_string()),
                ..GeminiConfig::default()
            },
            ollama: OllamaConfig::default(),
        }
    }

    #[test]
    fn test_create_generator_gemini() {
        let generator = create_generator(&provider_config("gemini")).unwrap();
        assert_eq!(generator.name(), "gemini");
    }

    #[test]
    fn test_create_generator_ollama() {
        let generator = create_generator(&provider_config("ollama")).unwrap();
        assert_eq!(generator.name(), "ollama");
    }

    #[test]
    fn test_create_generator_invalid_type() {
        assert!(create_generator(&provider_config("invalid")).is_err());
    }

    #[test]
    fn test_create_generator_gemini_without_key_fails() {
        let mut config = provider_config("gemini");
        config.gemini.api_key = None;
        assert!(create_generator(&config).is_err());
    }
}
