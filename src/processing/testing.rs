//! Deterministic embedders for unit tests

use crate::error::CollaboratorError;
use crate::processing::embeddings::{normalize, Embedder};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Embeds text as normalized ASCII letter counts.
///
/// Phrases with no letters in common have similarity 0, identical phrases 1.
/// Aliases embed one phrase as if it were another.
#[derive(Default)]
pub(crate) struct LetterEmbedder {
    aliases: HashMap<String, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl LetterEmbedder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_alias(mut self, text: &str, embed_as: &str) -> Self {
        self.aliases.insert(text.to_lowercase(), embed_as.to_lowercase());
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn letters(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; 26];
        for c in text.to_ascii_lowercase().chars().filter(|c| c.is_ascii_lowercase()) {
            vector[(c as u8 - b'a') as usize] += 1.0;
        }
        normalize(vector)
    }
}

impl Embedder for LetterEmbedder {
    fn model_name(&self) -> &str {
        "letter-test"
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let source = self.aliases.get(&lower).unwrap_or(&lower);
                Self::letters(source)
            })
            .collect())
    }
}

pub(crate) struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn model_name(&self) -> &str {
        "failing-test"
    }

    fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, CollaboratorError> {
        Err(CollaboratorError::Unavailable("model not loaded".to_string()))
    }
}
