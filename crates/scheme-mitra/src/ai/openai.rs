use serde::Deserialize;
use serde_json::json;

use super::{ExplanationGenerator, GenerationError};
use crate::config::AzureOpenAiConfig;

const TEMPERATURE: f64 = 0.7;
const TOP_P: f64 = 0.95;

/// Client for the Azure OpenAI chat-completions deployment.
#[derive(Debug, Clone)]
pub struct AzureOpenAiClient {
    http: reqwest::Client,
    config: AzureOpenAiConfig,
}

impl AzureOpenAiClient {
    pub fn new(config: AzureOpenAiConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_http(super::shared_http_client()?, config))
    }

    /// Reuse an existing HTTP client; the caller owns the timeout policy.
    pub fn with_http(http: reqwest::Client, config: AzureOpenAiConfig) -> Self {
        Self { http, config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn completion_url(&self, endpoint: &str) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            self.config.deployment,
            AzureOpenAiConfig::API_VERSION,
        )
    }
}

#[async_trait::async_trait]
impl ExplanationGenerator for AzureOpenAiClient {
    async fn generate(
        &self,
        instruction: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, GenerationError> {
        let (endpoint, api_key) = match (&self.config.endpoint, &self.config.api_key) {
            (Some(endpoint), Some(api_key)) => (endpoint, api_key),
            _ => return Err(GenerationError::Unconfigured),
        };

        let body = json!({
            "messages": [
                { "role": "system", "content": instruction },
                { "role": "user", "content": prompt },
            ],
            "temperature": TEMPERATURE,
            "max_tokens": max_tokens,
            "top_p": TOP_P,
        });

        let response = self
            .http
            .post(self.completion_url(endpoint))
            .header("api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Http {
                status: status.as_u16(),
            });
        }

        let completion: ChatCompletion = response.json().await.map_err(map_request_error)?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or(GenerationError::MalformedResponse)
    }
}

fn map_request_error(err: reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout
    } else if err.is_decode() {
        GenerationError::MalformedResponse
    } else {
        GenerationError::Transport(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}
