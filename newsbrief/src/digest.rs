// Digest generation: prompt rendering and the single model round trip
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::BriefError;
use crate::llm::{LlmProvider, LlmRequest};

/// Low sampling temperature, favoring determinism
pub const DIGEST_TEMPERATURE: f32 = 0.2;

/// Fixed instruction appended to every prompt. The model is asked, not forced,
/// to follow it; the output is returned unchecked.
pub const DIGEST_INSTRUCTION: &str = "Summarize in exactly 5 bullet points. \
Use ONLY the news items above as source material. \
End with a Sources section listing the URLs.";

/// Model identity and sampling used for every digest request
#[derive(Debug, Clone, PartialEq)]
pub struct DigestSettings {
    pub model: String,
    pub temperature: f32,
}

impl Default for DigestSettings {
    fn default() -> Self {
        Self {
            model: common::DEFAULT_LLM_MODEL.to_string(),
            temperature: DIGEST_TEMPERATURE,
        }
    }
}

/// Turns a topic and its rendered items block into a digest
#[derive(Clone)]
pub struct DigestGenerator {
    provider: Arc<dyn LlmProvider>,
    settings: DigestSettings,
}

impl DigestGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: DigestSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &DigestSettings {
        &self.settings
    }

    /// Three fixed parts: topic line, items block verbatim, instruction.
    pub fn build_prompt(topic: &str, items_block: &str) -> String {
        format!(
            "Topic: {}\n\nNews items:\n{}\n\n{}",
            topic, items_block, DIGEST_INSTRUCTION
        )
    }

    pub async fn generate(&self, topic: &str, items_block: &str) -> Result<String, BriefError> {
        let request = LlmRequest {
            model: Some(self.settings.model.clone()),
            temperature: Some(self.settings.temperature),
            ..LlmRequest::new(Self::build_prompt(topic, items_block))
        };

        match self.provider.generate(request).await {
            Ok(response) => {
                info!(
                    topic,
                    model = %response.model,
                    total_tokens = response.usage.total_tokens,
                    "digest generated"
                );
                Ok(response.content)
            }
            Err(e) => {
                warn!(topic, error = %e, "digest generation failed");
                Err(BriefError::ModelUnavailable(format!("{:#}", e)))
            }
        }
    }
}
