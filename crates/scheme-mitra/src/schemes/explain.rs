use std::sync::Arc;

use crate::ai::{ExplanationGenerator, GenerationError};

use super::catalog::SchemeRecord;
use super::matching::match_score;

/// System instruction sent with every explanation request.
pub const EXPLAINER_INSTRUCTION: &str = "You are a helpful assistant that explains Indian \
government schemes in simple, non-legal language. Be concise and clear.";

/// Token budget for a single explanation.
pub const EXPLANATION_TOKEN_BUDGET: u32 = 150;

/// Explanation text with its provenance. Both variants carry displayable
/// text, so rendering code never branches on errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplanationText {
    /// Produced by the remote generation service.
    Generated(String),
    /// Warning text standing in for a failed or unconfigured remote call.
    Degraded(String),
}

impl ExplanationText {
    pub fn as_str(&self) -> &str {
        match self {
            ExplanationText::Generated(text) | ExplanationText::Degraded(text) => text,
        }
    }

    pub fn into_inner(self) -> String {
        match self {
            ExplanationText::Generated(text) | ExplanationText::Degraded(text) => text,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ExplanationText::Degraded(_))
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            ExplanationText::Generated(_) => "generated",
            ExplanationText::Degraded(_) => "degraded",
        }
    }
}

/// Outcome of one explanation request: display text plus the keyword match
/// score, which is computed whether or not the remote call succeeded.
#[derive(Debug, Clone)]
pub struct Explanation {
    pub scheme_id: String,
    pub text: ExplanationText,
    pub match_score: u8,
}

/// Composes eligibility prompts and pairs generated text with match scores.
pub struct EligibilityExplainer<G> {
    generator: Arc<G>,
}

impl<G> EligibilityExplainer<G>
where
    G: ExplanationGenerator,
{
    pub fn new(generator: Arc<G>) -> Self {
        Self { generator }
    }

    /// Explain why the profile might qualify for the scheme.
    ///
    /// Infallible by contract: remote failures of any kind come back as
    /// `ExplanationText::Degraded` and the match score is always present.
    pub async fn explain(&self, scheme: &SchemeRecord, profile_text: &str) -> Explanation {
        let prompt = eligibility_prompt(scheme, profile_text);
        let score = match_score(scheme, profile_text);

        let text = match self
            .generator
            .generate(EXPLAINER_INSTRUCTION, &prompt, EXPLANATION_TOKEN_BUDGET)
            .await
        {
            Ok(content) => ExplanationText::Generated(content),
            Err(err) => {
                tracing::warn!(scheme = %scheme.id, error = %err, "explanation degraded");
                ExplanationText::Degraded(degraded_notice(&err))
            }
        };

        Explanation {
            scheme_id: scheme.id.clone(),
            text,
            match_score: score,
        }
    }
}

fn eligibility_prompt(scheme: &SchemeRecord, profile_text: &str) -> String {
    format!(
        "Scheme Name: {}\n\
         Ministry: {}\n\
         Beneficiary Type: {}\n\
         Benefit: {}\n\n\
         User Profile: {}\n\n\
         Based on the scheme details and user profile:\n\
         1. Briefly explain (2-3 sentences) why this user MIGHT be eligible\n\
         2. Mention any potential eligibility gaps\n\
         3. Suggest next steps\n\n\
         Keep language simple and non-legal.",
        scheme.name, scheme.ministry, scheme.beneficiary, scheme.benefit, profile_text,
    )
}

fn degraded_notice(err: &GenerationError) -> String {
    match err {
        GenerationError::Unconfigured => "⚠️ Azure OpenAI not configured. Set \
            AZURE_OPENAI_API_KEY and AZURE_OPENAI_ENDPOINT to enable eligibility explanations."
            .to_string(),
        other => format!("⚠️ Eligibility explanation unavailable: {other}"),
    }
}
