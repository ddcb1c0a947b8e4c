//! Error handling for the ATS scorer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScorerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding generation error: {0}")]
    Embedding(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, ScorerError>;

/// Convert anyhow errors from model2vec to our custom error type
impl From<anyhow::Error> for ScorerError {
    fn from(err: anyhow::Error) -> Self {
        ScorerError::ModelError(format!("{:#}", err))
    }
}

/// Failures of the embedding collaborator.
///
/// These never reach the caller of `score_document`: the engine recovers
/// from them with the Jaccard fallback and flags the report as degraded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    #[error("embedding model unavailable: {0}")]
    Unavailable(String),

    #[error("embedding call failed: {0}")]
    Failed(String),

    #[error("embedding call timed out after {0} ms")]
    Timeout(u64),

    #[error("embedding dimensions don't match: {0} vs {1}")]
    DimensionMismatch(usize, usize),

    #[error("embedder returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },
}

impl From<CollaboratorError> for ScorerError {
    fn from(err: CollaboratorError) -> Self {
        ScorerError::Embedding(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    fn load_weights() -> Result<()> {
        let missing: anyhow::Result<()> = Err(anyhow::anyhow!("model.safetensors not found"));
        missing.context("Failed to load model from /models/potion")?;
        Ok(())
    }

    #[test]
    fn test_anyhow_context_kept() {
        match load_weights() {
            Err(ScorerError::ModelError(message)) => {
                assert_eq!(message, "Failed to load model from /models/potion: model.safetensors not found");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_collaborator_error_becomes_embedding_error() {
        let err: ScorerError = CollaboratorError::Timeout(50).into();
        assert!(matches!(err, ScorerError::Embedding(ref m) if m.contains("50 ms")));
    }
}
