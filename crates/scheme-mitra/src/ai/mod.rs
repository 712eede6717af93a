//! Clients for the remote Azure AI services.
//!
//! Both clients share the same degradation contract: missing credentials are
//! a valid state surfaced as `Unconfigured`, and no remote failure is allowed
//! to take the process down.

pub mod analytics;
pub mod openai;

use std::time::Duration;

pub use analytics::{AnalysisError, EntityAnalysis, RecognizedEntity, TextAnalyticsClient};
pub use openai::AzureOpenAiClient;

/// Remote calls block the request flow for at most this long. No retry, no
/// backoff; a timeout degrades the affected card only.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Error enumeration for text-generation failures.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Azure OpenAI credentials are not configured")]
    Unconfigured,
    #[error("generation request timed out")]
    Timeout,
    #[error("generation request failed with HTTP status {status}")]
    Http { status: u16 },
    #[error("generation transport error: {0}")]
    Transport(String),
    #[error("generation response missing expected fields")]
    MalformedResponse,
}

/// Seam to the remote chat-completion service so the explainer can be
/// exercised with stubs.
#[async_trait::async_trait]
pub trait ExplanationGenerator: Send + Sync {
    async fn generate(
        &self,
        instruction: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, GenerationError>;
}

pub(crate) fn shared_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()
}
