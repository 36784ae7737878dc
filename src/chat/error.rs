use thiserror::Error;

use crate::core::errors::ApiError;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Failed to retrieve article context: {0}")]
    Retrieval(#[source] ApiError),

    #[error("Completion failed: {0}")]
    Completion(#[source] ApiError),

    #[error("Failed to persist chat history: {0}")]
    Persistence(#[source] ApiError),
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Completion(ApiError::Upstream(msg)) => ApiError::Upstream(msg),
            ChatError::Completion(inner) => ApiError::Upstream(inner.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_failures_map_to_upstream() {
        let err: ApiError = ChatError::Completion(ApiError::Upstream("429".to_string())).into();
        assert!(matches!(err, ApiError::Upstream(msg) if msg == "429"));
    }

    #[test]
    fn storage_failures_map_to_internal() {
        let err: ApiError = ChatError::Retrieval(ApiError::Internal("db".to_string())).into();
        assert!(matches!(err, ApiError::Internal(_)));
        let err: ApiError = ChatError::Persistence(ApiError::Internal("db".to_string())).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
