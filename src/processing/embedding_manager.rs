//! Embedding model catalog, download and local resolution

use crate::error::{Result, ScorerError};
use crate::processing::embeddings::Model2VecEmbedder;
use hf_hub::api::tokio::Api;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Model used when nothing else is configured
pub const DEFAULT_EMBEDDING_MODEL: &str = "potion-base-8M";

/// Files fetched from the hub; only the weights and tokenizer are required
const MODEL_FILES: [(&str, bool); 4] = [
    ("model.safetensors", true),
    ("tokenizer.json", true),
    ("config.json", false),
    ("README.md", false),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingModelInfo {
    pub name: String,
    pub repo_id: String,
    pub size_mb: u64,
    pub dimensions: u32,
    pub description: String,
}

/// Keeps track of which catalog models exist under `models_dir`
pub struct EmbeddingModelManager {
    models_dir: PathBuf,
    catalog: BTreeMap<String, EmbeddingModelInfo>,
}

fn catalog_entry(name: &str, repo_id: &str, size_mb: u64, dimensions: u32, description: &str) -> EmbeddingModelInfo {
    EmbeddingModelInfo {
        name: name.to_string(),
        repo_id: repo_id.to_string(),
        size_mb,
        dimensions,
        description: description.to_string(),
    }
}

impl EmbeddingModelManager {
    pub async fn new(models_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&models_dir)
            .await
            .map_err(|e| ScorerError::ModelError(format!("Failed to create models directory: {}", e)))?;

        let mut catalog = BTreeMap::new();
        catalog.insert(
            "potion-base-8M".to_string(),
            catalog_entry(
                "Potion Base 8M",
                "minishlab/potion-base-8M",
                33,
                256,
                "Compact static embeddings, good default for short skill phrases",
            ),
        );
        catalog.insert(
            "potion-base-32M".to_string(),
            catalog_entry(
                "Potion Base 32M",
                "minishlab/potion-base-32M",
                130,
                512,
                "Larger static embeddings with better phrase separation",
            ),
        );
        catalog.insert(
            "m2v-base".to_string(),
            catalog_entry(
                "Model2Vec Base",
                "minishlab/M2V_base_output",
                90,
                256,
                "Original Model2Vec distillation",
            ),
        );

        Ok(Self { models_dir, catalog })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn list_models(&self) -> impl Iterator<Item = (&String, &EmbeddingModelInfo)> {
        self.catalog.iter()
    }

    pub fn get_model_info(&self, model_id: &str) -> Option<&EmbeddingModelInfo> {
        self.catalog.get(model_id)
    }

    /// Accepts a catalog id, a hub repo id or a display name (case-insensitive)
    pub fn resolve_model_id(&self, input: &str) -> Option<String> {
        if self.catalog.contains_key(input) {
            return Some(input.to_string());
        }

        let input_lower = input.to_lowercase();
        self.catalog
            .iter()
            .find(|(_, info)| info.repo_id == input || info.name.to_lowercase() == input_lower)
            .map(|(id, _)| id.clone())
    }

    fn model_dir(&self, model_id: &str) -> PathBuf {
        self.models_dir.join(model_id)
    }

    /// A model directory is usable once its required files are present
    pub async fn is_model_downloaded(&self, model_id: &str) -> bool {
        let dir = self.model_dir(model_id);
        for (file, required) in MODEL_FILES {
            if required && fs::metadata(dir.join(file)).await.is_err() {
                return false;
            }
        }
        true
    }

    /// Local directory of a downloaded model.
    ///
    /// `model` may also be a path to a model directory outside `models_dir`.
    pub async fn local_model_path(&self, model: &str) -> Option<PathBuf> {
        let explicit = PathBuf::from(model);
        if explicit.is_dir() && explicit.join("tokenizer.json").exists() {
            return Some(explicit);
        }

        let model_id = self.resolve_model_id(model).unwrap_or_else(|| model.to_string());
        if self.is_model_downloaded(&model_id).await {
            Some(self.model_dir(&model_id))
        } else {
            None
        }
    }

    /// Download a catalog model from the Hugging Face Hub
    pub async fn download_model(&self, model: &str) -> Result<PathBuf> {
        let model_id = self
            .resolve_model_id(model)
            .ok_or_else(|| ScorerError::ModelError(format!("Unknown embedding model: {}", model)))?;
        let info = &self.catalog[&model_id];
        let model_dir = self.model_dir(&model_id);

        if self.is_model_downloaded(&model_id).await {
            log::info!("Embedding model {} already present at {}", model_id, model_dir.display());
            return Ok(model_dir);
        }

        log::info!("Downloading embedding model {} ({} MB) from {}", info.name, info.size_mb, info.repo_id);

        fs::create_dir_all(&model_dir)
            .await
            .map_err(|e| ScorerError::ModelError(format!("Failed to create model directory: {}", e)))?;

        let api = Api::new().map_err(|e| ScorerError::ModelError(format!("Failed to initialize HF API: {}", e)))?;
        let repo = api.model(info.repo_id.clone());

        for (file, required) in MODEL_FILES {
            match repo.get(file).await {
                Ok(cached_path) => {
                    fs::copy(&cached_path, model_dir.join(file))
                        .await
                        .map_err(|e| ScorerError::ModelError(format!("Failed to copy {}: {}", file, e)))?;
                    log::debug!("Downloaded {}", file);
                }
                Err(e) if !required => log::warn!("Optional file {} not found: {}", file, e),
                Err(e) => {
                    return Err(ScorerError::ModelError(format!(
                        "Failed to download required file {}: {}",
                        file, e
                    )))
                }
            }
        }

        log::info!("Embedding model {} ready", model_id);
        Ok(model_dir)
    }

    /// Local path for `model`, downloading it first when needed
    pub async fn ensure_model_available(&self, model: &str) -> Result<PathBuf> {
        match self.local_model_path(model).await {
            Some(path) => Ok(path),
            None => self.download_model(model).await,
        }
    }

    /// Make `model` available locally and load it off the async runtime
    pub async fn load_embedder(&self, model: &str, batch_size: usize) -> Result<Model2VecEmbedder> {
        let model_path = self.ensure_model_available(model).await?;
        let model_name = self.resolve_model_id(model).unwrap_or_else(|| model.to_string());

        tokio::task::spawn_blocking(move || Model2VecEmbedder::load(&model_path, &model_name, batch_size))
            .await
            .map_err(|e| ScorerError::ModelError(format!("Model loading task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_manager_creates_models_dir() {
        let temp_dir = TempDir::new().unwrap();
        let models_dir = temp_dir.path().join("models");

        let manager = EmbeddingModelManager::new(models_dir.clone()).await.unwrap();
        assert!(models_dir.is_dir());
        assert!(manager.get_model_info(DEFAULT_EMBEDDING_MODEL).is_some());
        assert_eq!(manager.list_models().count(), 3);
    }

    #[tokio::test]
    async fn test_resolve_model_id() {
        let temp_dir = TempDir::new().unwrap();
        let manager = EmbeddingModelManager::new(temp_dir.path().to_path_buf()).await.unwrap();

        assert_eq!(manager.resolve_model_id("potion-base-8M"), Some("potion-base-8M".to_string()));
        assert_eq!(
            manager.resolve_model_id("minishlab/potion-base-8M"),
            Some("potion-base-8M".to_string())
        );
        assert_eq!(manager.resolve_model_id("potion base 8m"), Some("potion-base-8M".to_string()));
        assert_eq!(manager.resolve_model_id("not-a-model"), None);
    }

    #[tokio::test]
    async fn test_download_detection() {
        let temp_dir = TempDir::new().unwrap();
        let manager = EmbeddingModelManager::new(temp_dir.path().to_path_buf()).await.unwrap();

        assert!(!manager.is_model_downloaded("potion-base-8M").await);
        assert!(manager.local_model_path("potion-base-8M").await.is_none());

        let model_dir = temp_dir.path().join("potion-base-8M");
        std::fs::create_dir_all(&model_dir).unwrap();
        std::fs::write(model_dir.join("model.safetensors"), b"").unwrap();
        std::fs::write(model_dir.join("tokenizer.json"), b"{}").unwrap();

        assert!(manager.is_model_downloaded("potion-base-8M").await);
        assert_eq!(manager.local_model_path("Potion Base 8M").await, Some(model_dir));
    }

    #[tokio::test]
    async fn test_unknown_model_download_fails() {
        let temp_dir = TempDir::new().unwrap();
        let manager = EmbeddingModelManager::new(temp_dir.path().to_path_buf()).await.unwrap();

        let result = manager.download_model("not-a-model").await;
        assert!(matches!(result, Err(ScorerError::ModelError(_))));
    }
}
