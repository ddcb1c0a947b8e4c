//! Skill resolution from free text

use crate::error::{Result, ScorerError};
use crate::processing::text_processor::TextProcessor;
use aho_corasick::{AhoCorasick, MatchKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// (pattern, display name) pairs for technical skills
const TECHNICAL_SKILLS: &[(&str, &str)] = &[
    ("python", "Python"),
    ("java", "Java"),
    ("c++", "C++"),
    ("sql", "SQL"),
    ("html", "HTML"),
    ("css", "CSS"),
    ("javascript", "JavaScript"),
    ("react", "React"),
    ("node.js", "Node.js"),
    ("tensorflow", "TensorFlow"),
    ("pytorch", "PyTorch"),
    ("machine learning", "Machine Learning"),
    ("data analysis", "Data Analysis"),
    ("data visualization", "Data Visualization"),
    ("aws", "AWS"),
    ("azure", "Azure"),
    ("gcp", "GCP"),
    ("power bi", "Power BI"),
    ("tableau", "Tableau"),
    ("django", "Django"),
    ("flask", "Flask"),
    ("scikit-learn", "Scikit-learn"),
    ("nlp", "NLP"),
    ("docker", "Docker"),
    ("kubernetes", "Kubernetes"),
    ("git", "Git"),
    ("jenkins", "Jenkins"),
    ("linux", "Linux"),
    ("excel", "Excel"),
    ("spark", "Spark"),
    ("hadoop", "Hadoop"),
];

const SOFT_SKILLS: &[(&str, &str)] = &[
    ("communication", "Communication"),
    ("leadership", "Leadership"),
    ("teamwork", "Teamwork"),
    ("problem solving", "Problem Solving"),
    ("time management", "Time Management"),
    ("adaptability", "Adaptability"),
    ("critical thinking", "Critical Thinking"),
    ("creativity", "Creativity"),
    ("collaboration", "Collaboration"),
    ("decision making", "Decision Making"),
    ("emotional intelligence", "Emotional Intelligence"),
    ("negotiation", "Negotiation"),
    ("conflict resolution", "Conflict Resolution"),
];

/// Keywords that place a skill in a group, checked in group order
const GROUP_KEYWORDS: &[(SkillGroup, &[&str])] = &[
    (
        SkillGroup::Languages,
        &[
            "python", "java", "c++", "javascript", "html", "css", "sql", "bash", "r", "go",
            "ruby", "php", "swift", "kotlin",
        ],
    ),
    (
        SkillGroup::Frameworks,
        &[
            "react", "node.js", "django", "flask", "tensorflow", "pytorch", "scikit-learn",
            "angular", "vue", "spring", "fastapi", "pandas", "numpy",
        ],
    ),
    (
        SkillGroup::CloudDevOps,
        &[
            "aws", "azure", "gcp", "docker", "kubernetes", "git", "jenkins", "linux", "jira",
            "terraform", "ansible", "ci/cd",
        ],
    ),
    (
        SkillGroup::DataScience,
        &[
            "machine learning", "deep learning", "nlp", "computer vision", "statistics",
            "analysis", "visualization", "power bi", "tableau", "excel", "spark", "hadoop",
        ],
    ),
    (
        SkillGroup::SoftSkills,
        &[
            "communication", "leadership", "teamwork", "problem solving", "time management",
            "adaptability", "critical thinking", "creativity", "collaboration",
            "decision making", "emotional intelligence", "negotiation", "conflict resolution",
        ],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillGroup {
    Languages,
    Frameworks,
    CloudDevOps,
    DataScience,
    SoftSkills,
    General,
}

impl fmt::Display for SkillGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SkillGroup::Languages => "Languages",
            SkillGroup::Frameworks => "Frameworks",
            SkillGroup::CloudDevOps => "Cloud/DevOps",
            SkillGroup::DataScience => "Data Science",
            SkillGroup::SoftSkills => "Soft Skills",
            SkillGroup::General => "General",
        };
        write!(f, "{}", name)
    }
}

/// Group a skill by keyword. A keyword matches when it equals the skill or
/// appears in it as a whole word.
pub fn skill_group(skill: &str) -> SkillGroup {
    let lower = skill.trim().to_lowercase();

    GROUP_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| contains_phrase(&lower, k)))
        .map(|(group, _)| *group)
        .unwrap_or(SkillGroup::General)
}

fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack
        .match_indices(phrase)
        .any(|(start, _)| is_word_bounded(haystack, start, start + phrase.len()))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

/// Trim, drop empties and remove case-insensitive duplicates, keeping the
/// first spelling seen
pub fn dedupe_skills<I, S>(skills: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    skills
        .into_iter()
        .filter_map(|skill| {
            let trimmed = skill.as_ref().trim();
            if trimmed.is_empty() || !seen.insert(trimmed.to_lowercase()) {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSkills {
    pub technical: Vec<String>,
    pub soft: Vec<String>,
}

impl ExtractedSkills {
    /// Technical skills followed by soft skills
    pub fn combined(&self) -> Vec<String> {
        dedupe_skills(self.technical.iter().chain(self.soft.iter()))
    }

    pub fn is_empty(&self) -> bool {
        self.technical.is_empty() && self.soft.is_empty()
    }
}

/// Turns document text into skill phrases
pub trait SkillExtractor: Send + Sync {
    fn extract_skills(&self, text: &str) -> ExtractedSkills;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkillKind {
    Technical,
    Soft,
}

/// Dictionary-backed extractor over a fixed skill vocabulary.
///
/// Matching is case-insensitive, prefers the longest phrase and only accepts
/// hits on word boundaries, so "Java" is not found inside "JavaScript".
pub struct DictionarySkillExtractor {
    matcher: AhoCorasick,
    entries: Vec<(String, SkillKind)>,
    text_processor: TextProcessor,
}

impl DictionarySkillExtractor {
    pub fn new() -> Result<Self> {
        Self::with_custom_skills(Vec::new())
    }

    /// Extend the technical vocabulary with extra skill names
    pub fn with_custom_skills(additional_skills: Vec<String>) -> Result<Self> {
        let mut patterns: Vec<String> = Vec::new();
        let mut entries: Vec<(String, SkillKind)> = Vec::new();

        let builtin = TECHNICAL_SKILLS
            .iter()
            .map(|(p, d)| (p.to_string(), d.to_string(), SkillKind::Technical))
            .chain(
                SOFT_SKILLS
                    .iter()
                    .map(|(p, d)| (p.to_string(), d.to_string(), SkillKind::Soft)),
            );
        let custom = additional_skills
            .into_iter()
            .map(|s| (s.trim().to_lowercase(), s.trim().to_string(), SkillKind::Technical));

        let mut seen = HashSet::new();
        for (pattern, display, kind) in builtin.chain(custom) {
            if pattern.is_empty() || !seen.insert(pattern.clone()) {
                continue;
            }
            patterns.push(pattern);
            entries.push((display, kind));
        }

        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(&patterns)
            .map_err(|e| ScorerError::InvalidInput(format!("Failed to build skill matcher: {}", e)))?;

        Ok(Self {
            matcher,
            entries,
            text_processor: TextProcessor::new(),
        })
    }

    pub fn vocabulary_size(&self) -> usize {
        self.entries.len()
    }
}

impl SkillExtractor for DictionarySkillExtractor {
    fn extract_skills(&self, text: &str) -> ExtractedSkills {
        let cleaned = self.text_processor.clean_for_matching(text);
        let mut skills = ExtractedSkills::default();
        let mut found = HashSet::new();

        for mat in self.matcher.find_iter(&cleaned) {
            if !is_word_bounded(&cleaned, mat.start(), mat.end()) {
                continue;
            }

            let id = mat.pattern().as_usize();
            if !found.insert(id) {
                continue;
            }

            let (display, kind) = &self.entries[id];
            match kind {
                SkillKind::Technical => skills.technical.push(display.clone()),
                SkillKind::Soft => skills.soft.push(display.clone()),
            }
        }

        skills
    }
}

impl Default for DictionarySkillExtractor {
    fn default() -> Self {
        Self::new().expect("Failed to create default skill extractor")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_technical_and_soft() {
        let extractor = DictionarySkillExtractor::new().unwrap();
        let skills = extractor.extract_skills(
            "Built ML services in Python and Docker. Strong communication and problem solving.",
        );

        assert_eq!(skills.technical, vec!["Python", "Docker"]);
        assert_eq!(skills.soft, vec!["Communication", "Problem Solving"]);
    }

    #[test]
    fn test_longest_match_and_word_boundaries() {
        let extractor = DictionarySkillExtractor::new().unwrap();

        let skills = extractor.extract_skills("JavaScript and Node.js, plus some C++");
        assert_eq!(skills.technical, vec!["JavaScript", "Node.js", "C++"]);

        let skills = extractor.extract_skills("Sparkling gitlab pipelines");
        assert!(skills.technical.is_empty());
    }

    #[test]
    fn test_duplicates_collapse_to_first_occurrence() {
        let extractor = DictionarySkillExtractor::new().unwrap();
        let skills = extractor.extract_skills("SQL, aws, Sql again, AWS again");

        assert_eq!(skills.technical, vec!["SQL", "AWS"]);
    }

    #[test]
    fn test_custom_skills() {
        let extractor = DictionarySkillExtractor::with_custom_skills(vec!["Rust".to_string()]).unwrap();
        let skills = extractor.extract_skills("Systems work in rust and python");

        assert_eq!(skills.technical, vec!["Rust", "Python"]);
        assert!(extractor.vocabulary_size() > TECHNICAL_SKILLS.len());
    }

    #[test]
    fn test_empty_text() {
        let extractor = DictionarySkillExtractor::new().unwrap();
        assert!(extractor.extract_skills("").is_empty());
    }

    #[test]
    fn test_skill_groups() {
        assert_eq!(skill_group("Python"), SkillGroup::Languages);
        assert_eq!(skill_group("Node.js"), SkillGroup::Frameworks);
        assert_eq!(skill_group("AWS"), SkillGroup::CloudDevOps);
        assert_eq!(skill_group("Data Visualization"), SkillGroup::DataScience);
        assert_eq!(skill_group("Critical Thinking"), SkillGroup::SoftSkills);
        assert_eq!(skill_group("Docker"), SkillGroup::CloudDevOps);
        assert_eq!(skill_group("Underwater Basket Weaving"), SkillGroup::General);
        assert_eq!(SkillGroup::CloudDevOps.to_string(), "Cloud/DevOps");
    }

    #[test]
    fn test_dedupe_skills() {
        let skills = dedupe_skills(vec![" Python", "python", "", "SQL", "Sql ", "AWS"]);
        assert_eq!(skills, vec!["Python", "SQL", "AWS"]);
    }

    #[test]
    fn test_combined_keeps_order() {
        let skills = ExtractedSkills {
            technical: vec!["Python".to_string(), "SQL".to_string()],
            soft: vec!["Leadership".to_string()],
        };
        assert_eq!(skills.combined(), vec!["Python", "SQL", "Leadership"]);
    }
}
