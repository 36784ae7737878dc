pub mod anthropic;
pub mod openai_compatible;
pub mod provider;
pub mod sse;
pub mod types;

use std::sync::Arc;

pub use anthropic::AnthropicProvider;
pub use openai_compatible::OpenAiCompatibleProvider;
pub use provider::{CompletionClient, CompletionStream};
pub use types::{ChatMessage, ChatRequest, Role};

use crate::core::config::{LlmSettings, ProviderKind};

/// Builds the completion client selected by `llm.provider`.
pub fn build_completion_client(settings: &LlmSettings) -> Arc<dyn CompletionClient> {
    match settings.provider {
        ProviderKind::Anthropic => {
            if settings.api_key.is_none() {
                tracing::warn!(
                    "No Anthropic API key configured; chat requests will fail until llm.api_key or ANTHROPIC_API_KEY is set"
                );
            }
            Arc::new(AnthropicProvider::new(
                settings.base_url.clone(),
                settings.api_key.clone(),
            ))
        }
        ProviderKind::OpenAiCompatible => Arc::new(OpenAiCompatibleProvider::new(
            settings.base_url.clone(),
            settings.api_key.clone(),
        )),
    }
}
