//! Skill phrase embeddings using Model2Vec

use crate::error::{CollaboratorError, Result};
use anyhow::Context;
use model2vec_rs::model::StaticModel;
use std::path::Path;
use std::time::Instant;

/// Text to vector collaborator.
///
/// Implementations are shared read-only across concurrent scoring runs, so
/// `embed` takes `&self` and must not rely on interior mutation.
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    /// Embed every text, returning unit-length vectors in input order
    fn embed(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, CollaboratorError>;
}

/// Static Model2Vec embeddings loaded from a local model directory
pub struct Model2VecEmbedder {
    model: StaticModel,
    model_name: String,
    batch_size: usize,
}

impl Model2VecEmbedder {
    pub fn load(model_path: &Path, model_name: &str, batch_size: usize) -> Result<Self> {
        let start_time = Instant::now();
        log::info!("Loading Model2Vec embedding model from: {}", model_path.display());

        let model = StaticModel::from_pretrained(
            model_path,
            None, // token
            None, // normalize
            None, // subfolder
        )
        .with_context(|| format!("Failed to load model from {}", model_path.display()))?;

        log::info!("Model loaded in {:.2?}", start_time.elapsed());

        Ok(Self {
            model,
            model_name: model_name.to_string(),
            batch_size: batch_size.max(1),
        })
    }
}

impl Embedder for Model2VecEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn embed(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, CollaboratorError> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let batch_embeddings = self.model.encode(batch);
            if batch_embeddings.len() != batch.len() {
                return Err(CollaboratorError::CountMismatch {
                    expected: batch.len(),
                    got: batch_embeddings.len(),
                });
            }
            embeddings.extend(batch_embeddings.into_iter().map(normalize));
        }

        Ok(embeddings)
    }
}

/// Scale a vector to unit length. Zero vectors are returned unchanged.
pub fn normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
    vector
}

/// Cosine similarity clamped to [0, 1]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> std::result::Result<f32, CollaboratorError> {
    if a.len() != b.len() {
        return Err(CollaboratorError::DimensionMismatch(a.len(), b.len()));
    }

    if a.is_empty() {
        return Ok(0.0);
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    let score = if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    };

    Ok(score.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let score = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap();
        assert!((score - 1.0).abs() < 1e-6);

        let score = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_negative_similarity_is_clamped() {
        let score = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let result = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]);
        assert_eq!(result, Err(CollaboratorError::DimensionMismatch(2, 3)));
    }

    #[test]
    fn test_zero_and_empty_vectors() {
        assert_eq!(cosine_similarity(&[], &[]).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_normalize() {
        let unit = normalize(vec![3.0, 4.0]);
        assert!((unit[0] - 0.6).abs() < 1e-6);
        assert!((unit[1] - 0.8).abs() < 1e-6);

        assert_eq!(normalize(vec![0.0, 0.0]), vec![0.0, 0.0]);
    }
}
