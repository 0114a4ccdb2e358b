// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like "classify a post") lives in domain functions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseEmbeddingService)

use async_trait::async_trait;

// =============================================================================
// Embedding Errors
// =============================================================================

/// Failure from the remote embedding service.
///
/// The variants only matter for logging and reporting. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// No credential configured, or the remote side rejected it.
    #[error("embedding service is not configured: {0}")]
    Configuration(String),

    /// Network failure, timeout, or a non-success response.
    #[error("embedding request failed: {0}")]
    Transient(String),

    /// The response arrived but did not contain a usable vector.
    #[error("embedding response was malformed: {0}")]
    DataIntegrity(String),
}

impl EmbeddingError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, EmbeddingError::Configuration(_))
    }

    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            EmbeddingError::Configuration(_) => "configuration",
            EmbeddingError::Transient(_) => "transient",
            EmbeddingError::DataIntegrity(_) => "data_integrity",
        }
    }
}

// =============================================================================
// Embedding Service Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseEmbeddingService: Send + Sync {
    /// Generate an embedding for text (returns a `dimensions()`-length vector)
    async fn generate(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Length of every vector this service returns
    fn dimensions(&self) -> usize;
}
