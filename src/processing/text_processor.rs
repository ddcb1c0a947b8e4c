//! Text processing and normalization

use regex::Regex;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Shortest token (exclusive) considered a keyword candidate
const MIN_KEYWORD_LEN: usize = 3;

pub struct TextProcessor {
    stop_words: HashSet<&'static str>,
    word_regex: Regex,
    whitespace_regex: Regex,
    symbol_regex: Regex,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor {
    pub fn new() -> Self {
        let word_regex = Regex::new(r"\w+").expect("Invalid word regex");
        let whitespace_regex = Regex::new(r"\s+").expect("Invalid whitespace regex");
        // Keep characters that belong to skill names such as "c++", "c#", "node.js"
        let symbol_regex = Regex::new(r"[^\w\s+\-.#]").expect("Invalid symbol regex");

        Self {
            stop_words: Self::create_stop_words(),
            word_regex,
            whitespace_regex,
            symbol_regex,
        }
    }

    /// Lowercase `\w+` tokens, in document order
    pub fn words(&self, text: &str) -> Vec<String> {
        let lower = text.trim().to_lowercase();
        self.word_regex
            .find_iter(&lower)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Tokenize text into lowercase words using Unicode segmentation,
    /// dropping stop words
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .map(|word| word.to_lowercase())
            .filter(|word| !self.stop_words.contains(word.as_str()))
            .collect()
    }

    /// Words eligible for the keyword frequency table
    pub fn keyword_candidates(&self, text: &str) -> Vec<String> {
        self.words(text)
            .into_iter()
            .filter(|w| w.chars().count() > MIN_KEYWORD_LEN && !self.is_stop_word(w))
            .collect()
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Lowercase, strip symbols that never occur in skill names and collapse whitespace
    pub fn clean_for_matching(&self, text: &str) -> String {
        let normalized = self.normalize_unicode(text);
        let stripped = self.symbol_regex.replace_all(&normalized, " ");
        self.whitespace_regex
            .replace_all(&stripped, " ")
            .trim()
            .to_lowercase()
    }

    /// Calculate text similarity using Jaccard similarity on tokens
    pub fn jaccard(&self, text1: &str, text2: &str) -> f32 {
        let set1: HashSet<String> = self.tokenize(text1).into_iter().collect();
        let set2: HashSet<String> = self.tokenize(text2).into_iter().collect();

        let intersection = set1.intersection(&set2).count();
        let union = set1.union(&set2).count();

        if union == 0 {
            0.0
        } else {
            intersection as f32 / union as f32
        }
    }

    /// Coarse relevance used when the job description yields no skills.
    ///
    /// Share of distinct job-description words that also appear in the
    /// resume, doubled and capped at 100.
    pub fn keyword_overlap(&self, resume_text: &str, job_text: &str) -> u8 {
        let resume_words: HashSet<String> = resume_text
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let job_words: HashSet<String> = job_text
            .trim()
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        if job_words.is_empty() {
            return 0;
        }

        let shared = resume_words.intersection(&job_words).count();
        let percentage = (shared as f32 / job_words.len() as f32) * 100.0 * 2.0;
        percentage.min(100.0) as u8
    }

    /// Normalize Unicode characters
    fn normalize_unicode(&self, text: &str) -> String {
        text.chars()
            .map(|c| match c {
                '\u{2018}' | '\u{2019}' => '\'', // Smart quotes to regular quotes
                '\u{201C}' | '\u{201D}' => '"',
                '\u{2013}' | '\u{2014}' => '-',
                '\u{00A0}' => ' ',
                _ => c,
            })
            .collect()
    }

    /// Common English function words
    fn create_stop_words() -> HashSet<&'static str> {
        [
            "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "for", "from",
            "has", "have", "had", "he", "she", "i", "in", "into", "is", "it", "its", "me",
            "my", "of", "on", "or", "our", "so", "than", "that", "the", "their", "them",
            "then", "there", "these", "they", "this", "those", "to", "was", "we", "were",
            "what", "when", "where", "which", "while", "who", "will", "with", "would",
            "you", "your", "about", "also", "any", "both", "each", "more", "most", "other",
            "over", "some", "such", "through", "under", "very", "can", "could", "should",
            "may", "might", "must", "shall", "do", "does", "did", "not", "no", "nor",
            "only", "own", "same", "too", "just", "all", "am", "if", "up", "out", "us",
        ]
        .into_iter()
        .collect()
    }
}
