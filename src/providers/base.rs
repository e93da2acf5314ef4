//! Base generator trait for text-generation backends
//!
//! The pipeline composes one flat prompt per request and hands it to
//! whichever backend is configured. Backends are potentially slow and
//! potentially unavailable; the caller owns the deadline and surfaces
//! failures as a degraded-service response.

use crate::error::Result;
use async_trait::async_trait;

/// A text-generation backend
///
/// All generation backends (Gemini, Ollama) implement this trait. One call
/// per request, no retry: a failed generation is surfaced to the request
/// rather than silently retried, to avoid duplicate billable calls.
///
/// # Examples
///
/// ```
/// use vialy::providers::Generator;
/// use vialy::error::Result;
/// use async_trait::async_trait;
///
/// struct CannedGenerator;
///
/// #[async_trait]
/// impl Generator for CannedGenerator {
///     fn name(&self) -> &str {
///         "canned"
///     }
///
///     async fn generate(&self, _prompt: &str) -> Result<String> {
///         Ok("respuesta".to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait Generator: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Completes the given prompt into an answer
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable, rejects the request,
    /// or answers with an unusable body.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
