//! Signal extraction from raw resume text

use crate::processing::text_processor::TextProcessor;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Number of entries kept in the keyword frequency table
pub const TOP_KEYWORD_LIMIT: usize = 12;

/// Sentinel reported for contact details that were not found
pub const NOT_AVAILABLE: &str = "N/A";

/// Action verbs recognised as strong resume vocabulary
pub const POWER_VERBS: [&str; 12] = [
    "architected",
    "developed",
    "led",
    "managed",
    "analyzed",
    "created",
    "designed",
    "implemented",
    "optimized",
    "spearheaded",
    "built",
    "engineered",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Section {
    Experience,
    Education,
    Skills,
    Projects,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Experience,
        Section::Education,
        Section::Skills,
        Section::Projects,
    ];

    fn pattern(&self) -> &'static str {
        match self {
            Section::Experience => {
                r"(?m)(?:work|professional|relevant)\s+experience|employment\s+history|work\s+history|^\s*experience\s*:?\s*$"
            }
            Section::Education => r"education|academic|qualification",
            Section::Skills => r"skills|expertise",
            Section::Projects => r"projects|portfolio",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Experience => write!(f, "Experience"),
            Section::Education => write!(f, "Education"),
            Section::Skills => write!(f, "Skills"),
            Section::Projects => write!(f, "Projects"),
        }
    }
}

/// Everything the audit needs to know about a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentFeatures {
    pub word_count: usize,
    pub bullet_count: usize,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: bool,
    pub section_presence: BTreeMap<Section, bool>,
    pub metric_count: usize,
    pub verb_count: usize,
    pub power_verbs: Vec<String>,
    pub top_keywords: Vec<(String, usize)>,
}

impl DocumentFeatures {
    pub fn email_or_na(&self) -> &str {
        self.email.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn phone_or_na(&self) -> &str {
        self.phone.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    /// `None` when the section was never looked for
    pub fn has_section(&self, section: Section) -> Option<bool> {
        self.section_presence.get(&section).copied()
    }
}

/// Pattern-based feature extractor. Build once and reuse.
pub struct FeatureExtractor {
    text_processor: TextProcessor,
    email_regex: Regex,
    phone_regex: Regex,
    metric_regex: Regex,
    verb_regexes: Vec<(&'static str, Regex)>,
    section_regexes: Vec<(Section, Regex)>,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor {
    pub fn new() -> Self {
        let email_regex = Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}")
            .expect("Invalid email regex");

        let phone_regex = Regex::new(r"(\+\d{1,2}\s?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}")
            .expect("Invalid phone regex");

        let metric_regex = Regex::new(r"\d+(?:,\d+)*(?:\.\d+)?\s*(?:%|\$|M|K|\+|k|m|Yrs|yrs)")
            .expect("Invalid metric regex");

        let verb_regexes = POWER_VERBS
            .iter()
            .map(|verb| {
                let regex = Regex::new(&format!(r"(?i)\b{}\b", verb)).expect("Invalid verb regex");
                (*verb, regex)
            })
            .collect();

        let section_regexes = Section::ALL
            .iter()
            .map(|section| {
                let regex = Regex::new(section.pattern()).expect("Invalid section regex");
                (*section, regex)
            })
            .collect();

        Self {
            text_processor: TextProcessor::new(),
            email_regex,
            phone_regex,
            metric_regex,
            verb_regexes,
            section_regexes,
        }
    }

    /// Extract all signals. Never fails; empty text yields empty features.
    pub fn extract(&self, text: &str) -> DocumentFeatures {
        let lower = text.trim().to_lowercase();

        let section_presence = self
            .section_regexes
            .iter()
            .map(|(section, regex)| (*section, regex.is_match(&lower)))
            .collect();

        let power_verbs: Vec<String> = self
            .verb_regexes
            .iter()
            .filter(|(_, regex)| regex.is_match(text))
            .map(|(verb, _)| verb.to_string())
            .collect();

        DocumentFeatures {
            word_count: self.text_processor.words(text).len(),
            bullet_count: Self::count_bullets(text),
            email: self.email_regex.find(text).map(|m| m.as_str().to_string()),
            phone: self.phone_regex.find(text).map(|m| m.as_str().trim().to_string()),
            linkedin: lower.contains("linkedin.com/in/"),
            section_presence,
            metric_count: self.metric_regex.find_iter(text).count(),
            verb_count: power_verbs.len(),
            power_verbs,
            top_keywords: self.top_keywords(text, TOP_KEYWORD_LIMIT),
        }
    }

    fn count_bullets(text: &str) -> usize {
        text.matches('•').count() + text.matches("- ").count() + text.matches("* ").count()
    }

    /// Most frequent keyword candidates, ties broken by first occurrence
    pub fn top_keywords(&self, text: &str, limit: usize) -> Vec<(String, usize)> {
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

        for (position, word) in self.text_processor.keyword_candidates(text).into_iter().enumerate() {
            counts.entry(word).or_insert((0, position)).0 += 1;
        }

        let mut keywords: Vec<(String, usize, usize)> = counts
            .into_iter()
            .map(|(word, (count, first_seen))| (word, count, first_seen))
            .collect();
        keywords.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.2.cmp(&b.2)));

        keywords
            .into_iter()
            .take(limit)
            .map(|(word, count, _)| (word, count))
            .collect()
    }
}
