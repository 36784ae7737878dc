use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::ChatRequest;
use crate::core::errors::ApiError;

/// Receiver of incremental text fragments. An `Err` item is terminal; the
/// channel closing without one means the upstream finished cleanly.
pub type CompletionStream = mpsc::Receiver<Result<String, ApiError>>;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// return the provider name (e.g. "anthropic", "openai_compatible")
    fn name(&self) -> &str;

    /// completion (non-streaming)
    async fn complete(&self, request: ChatRequest) -> Result<String, ApiError>;

    /// completion (streaming)
    async fn stream(&self, request: ChatRequest) -> Result<CompletionStream, ApiError>;
}
