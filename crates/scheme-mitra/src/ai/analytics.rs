use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::TextAnalyticsConfig;

const ENTITIES_PATH: &str = "/text/analytics/v3.1/entities/recognition/general";

/// Error enumeration for entity-recognition failures. Mirrors the generation
/// contract: unconfigured credentials degrade, they never crash.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Azure Text Analytics credentials are not configured")]
    Unconfigured,
    #[error("analysis request timed out")]
    Timeout,
    #[error("analysis request failed with HTTP status {status}")]
    Http { status: u16 },
    #[error("analysis transport error: {0}")]
    Transport(String),
    #[error("analysis response missing expected fields")]
    MalformedResponse,
}

/// A single entity recognized in the submitted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedEntity {
    pub text: String,
    pub category: String,
    #[serde(rename = "confidenceScore")]
    pub confidence: f64,
}

/// Entities extracted from one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityAnalysis {
    pub entities: Vec<RecognizedEntity>,
}

/// Client for the Azure Text Analytics entity-recognition endpoint.
///
/// Kept alongside the generation client per the service surface; it feeds its
/// own route and is intentionally not part of the scoring pipeline.
#[derive(Debug, Clone)]
pub struct TextAnalyticsClient {
    http: reqwest::Client,
    config: TextAnalyticsConfig,
}

impl TextAnalyticsClient {
    pub fn new(config: TextAnalyticsConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_http(super::shared_http_client()?, config))
    }

    pub fn with_http(http: reqwest::Client, config: TextAnalyticsConfig) -> Self {
        Self { http, config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    pub async fn recognize_entities(
        &self,
        text: &str,
        language: &str,
    ) -> Result<EntityAnalysis, AnalysisError> {
        let (endpoint, api_key) = match (&self.config.endpoint, &self.config.api_key) {
            (Some(endpoint), Some(api_key)) => (endpoint, api_key),
            _ => return Err(AnalysisError::Unconfigured),
        };

        let url = format!("{}{}", endpoint.trim_end_matches('/'), ENTITIES_PATH);
        let body = json!({
            "documents": [
                { "id": "1", "language": language, "text": text },
            ],
        });

        let response = self
            .http
            .post(url)
            .header("Ocp-Apim-Subscription-Key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Http {
                status: status.as_u16(),
            });
        }

        let payload: EntitiesResponse = response.json().await.map_err(map_request_error)?;
        let document = payload
            .documents
            .into_iter()
            .next()
            .ok_or(AnalysisError::MalformedResponse)?;

        Ok(EntityAnalysis {
            entities: document.entities,
        })
    }
}

fn map_request_error(err: reqwest::Error) -> AnalysisError {
    if err.is_timeout() {
        AnalysisError::Timeout
    } else if err.is_decode() {
        AnalysisError::MalformedResponse
    } else {
        AnalysisError::Transport(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct EntitiesResponse {
    #[serde(default)]
    documents: Vec<EntitiesDocument>,
}

#[derive(Debug, Deserialize)]
struct EntitiesDocument {
    #[serde(default)]
    entities: Vec<RecognizedEntity>,
}
