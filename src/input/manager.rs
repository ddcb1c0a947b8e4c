//! Input manager routing files to the right extractor

use crate::error::{Result, ScorerError};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{MarkdownExtractor, PlainTextExtractor, TextExtractor};
use log::info;
use std::collections::HashMap;
use std::path::Path;

pub struct InputManager {
    cache: HashMap<String, String>,
    enable_cache: bool,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            enable_cache: true,
        }
    }

    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    /// Read `path` as plain text. Only `.txt` and `.md` files are accepted.
    pub async fn extract_text(&mut self, path: &Path) -> Result<String> {
        let path_str = path.to_string_lossy().to_string();

        if self.enable_cache {
            if let Some(cached_text) = self.cache.get(&path_str) {
                info!("Using cached text for: {}", path.display());
                return Ok(cached_text.clone());
            }
        }

        if !path.exists() {
            return Err(ScorerError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let text = match FileType::from_path(path) {
            FileType::Text => {
                info!("Reading plain text file: {}", path.display());
                PlainTextExtractor.extract(path).await?
            }
            FileType::Markdown => {
                info!("Processing markdown file: {}", path.display());
                MarkdownExtractor.extract(path).await?
            }
            FileType::Binary => {
                return Err(ScorerError::UnsupportedFormat(format!(
                    "{}: extract the text first and pass a .txt or .md file",
                    path.display()
                )));
            }
            FileType::Unknown => {
                return Err(ScorerError::UnsupportedFormat(format!(
                    "Unsupported file type for: {}",
                    path.display()
                )));
            }
        };

        if self.enable_cache {
            self.cache.insert(path_str, text.clone());
        }

        Ok(text)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_markdown_is_stripped_and_cached() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("resume.md");
        std::fs::write(&path, "## Skills\n\n- **Rust**\n- SQL\n").unwrap();

        let mut manager = InputManager::new();
        let text = manager.extract_text(&path).await.unwrap();

        assert_eq!(text, "Skills\n- Rust\n- SQL");
        assert_eq!(manager.cache_size(), 1);

        manager.clear_cache();
        assert_eq!(manager.cache_size(), 0);
    }

    #[tokio::test]
    async fn test_pdf_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("resume.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let result = InputManager::new().extract_text(&path).await;
        assert!(matches!(result, Err(ScorerError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let mut manager = InputManager::new().with_cache(false);
        let result = manager.extract_text(Path::new("/definitely/not/here.txt")).await;

        assert!(matches!(result, Err(ScorerError::InvalidInput(_))));
    }
}
