//! Semantic skill matching
//!
//! Every requirement skill is compared against every resume skill through
//! the [`Embedder`] collaborator. The best resume skill decides the
//! requirement's category, and the categories (or, with critical skills, the
//! raw similarities) roll up into [`MatchStats`].

use crate::config::MatchThresholds;
use crate::error::CollaboratorError;
use crate::processing::embeddings::{cosine_similarity, Embedder};
use crate::processing::skills::dedupe_skills;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Weight of a critical requirement relative to a regular one
const CRITICAL_WEIGHT: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchCategory {
    HighMatch,
    PartialMatch,
    LowMatch,
}

impl fmt::Display for MatchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchCategory::HighMatch => write!(f, "High Match"),
            MatchCategory::PartialMatch => write!(f, "Partial Match"),
            MatchCategory::LowMatch => write!(f, "Low Match"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub requirement_skill: String,
    pub best_resume_skill: String,
    pub similarity: f32,
    pub category: MatchCategory,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    pub overall: u8,
    pub matched: usize,
    pub partial: usize,
    pub missing: usize,
    pub total: usize,
}

/// Requirement skills the caller wants weighted double. Case-insensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CriticalSkills {
    skills: HashSet<String>,
}

impl CriticalSkills {
    pub fn new<I, S>(skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let skills = skills
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self { skills }
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.skills.contains(&skill.trim().to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn sorted(&self) -> Vec<String> {
        let mut skills: Vec<String> = self.skills.iter().cloned().collect();
        skills.sort();
        skills
    }

    fn weight(&self, skill: &str) -> f32 {
        if self.contains(skill) {
            CRITICAL_WEIGHT
        } else {
            1.0
        }
    }
}

/// Per-requirement matches plus their aggregate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub matches: Vec<SkillMatch>,
    pub stats: MatchStats,
}

impl MatchOutcome {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn low_matches(&self) -> impl Iterator<Item = &SkillMatch> {
        self.matches.iter().filter(|m| m.category == MatchCategory::LowMatch)
    }

    /// Overall score if the `upgrades` requirements were fully matched.
    ///
    /// Aggregated with the same policy as `stats.overall`.
    pub fn project_overall(&self, upgrades: &[String], critical: &CriticalSkills) -> u8 {
        let upgraded = CriticalSkills::new(upgrades);
        let projected: Vec<SkillMatch> = self
            .matches
            .iter()
            .map(|m| {
                if upgraded.contains(&m.requirement_skill) {
                    SkillMatch {
                        similarity: 1.0,
                        category: MatchCategory::HighMatch,
                        ..m.clone()
                    }
                } else {
                    m.clone()
                }
            })
            .collect();

        summarize(&projected, critical).overall
    }
}

fn percentage(value: f32) -> u8 {
    (value * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Count categories and compute `overall`.
///
/// Without critical skills: `(matched + 0.5 * partial) / total`. With
/// critical skills: weighted mean of the similarities, critical counting
/// double.
fn summarize(matches: &[SkillMatch], critical: &CriticalSkills) -> MatchStats {
    let total = matches.len();
    if total == 0 {
        return MatchStats::default();
    }

    let count = |category| matches.iter().filter(|m| m.category == category).count();
    let matched = count(MatchCategory::HighMatch);
    let partial = count(MatchCategory::PartialMatch);
    let missing = count(MatchCategory::LowMatch);

    let overall = if critical.is_empty() {
        percentage((matched as f32 + 0.5 * partial as f32) / total as f32)
    } else {
        let (weighted, weights) = matches.iter().fold((0.0_f32, 0.0_f32), |(sum, weights), m| {
            let weight = critical.weight(&m.requirement_skill);
            (sum + weight * m.similarity, weights + weight)
        });
        percentage(weighted / weights)
    };

    MatchStats {
        overall,
        matched,
        partial,
        missing,
        total,
    }
}

pub struct SimilarityEngine {
    thresholds: MatchThresholds,
}

impl SimilarityEngine {
    pub fn new(thresholds: MatchThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &MatchThresholds {
        &self.thresholds
    }

    pub fn classify(&self, similarity: f32) -> MatchCategory {
        if similarity >= self.thresholds.match_threshold {
            MatchCategory::HighMatch
        } else if similarity >= self.thresholds.partial_threshold {
            MatchCategory::PartialMatch
        } else {
            MatchCategory::LowMatch
        }
    }

    /// Match every requirement skill against the resume skills.
    ///
    /// Either set empty yields an empty outcome without calling the embedder.
    pub fn compute(
        &self,
        embedder: &dyn Embedder,
        resume_skills: &[String],
        requirement_skills: &[String],
        critical: &CriticalSkills,
    ) -> Result<MatchOutcome, CollaboratorError> {
        let resume_skills = dedupe_skills(resume_skills);
        let requirement_skills = dedupe_skills(requirement_skills);

        if resume_skills.is_empty() || requirement_skills.is_empty() {
            return Ok(MatchOutcome::empty());
        }

        let texts: Vec<String> = resume_skills
            .iter()
            .chain(requirement_skills.iter())
            .cloned()
            .collect();
        let embeddings = embedder.embed(&texts)?;
        if embeddings.len() != texts.len() {
            return Err(CollaboratorError::CountMismatch {
                expected: texts.len(),
                got: embeddings.len(),
            });
        }

        let (resume_vectors, requirement_vectors) = embeddings.split_at(resume_skills.len());
        let resume_lower: Vec<String> = resume_skills.iter().map(|s| s.to_lowercase()).collect();

        let mut matches = Vec::with_capacity(requirement_skills.len());
        for (requirement, requirement_vector) in requirement_skills.iter().zip(requirement_vectors) {
            let requirement_lower = requirement.to_lowercase();

            let (best_index, similarity) = match resume_lower.iter().position(|r| *r == requirement_lower) {
                Some(index) => (index, 1.0),
                None => {
                    let mut best = (0, f32::NEG_INFINITY);
                    for (index, resume_vector) in resume_vectors.iter().enumerate() {
                        let score = cosine_similarity(requirement_vector, resume_vector)?;
                        if score > best.1 {
                            best = (index, score);
                        }
                    }
                    best
                }
            };

            matches.push(SkillMatch {
                requirement_skill: requirement.clone(),
                best_resume_skill: resume_skills[best_index].clone(),
                similarity,
                category: self.classify(similarity),
            });
        }

        let stats = summarize(&matches, critical);
        log::debug!(
            "Matched {} requirement skills: {} high, {} partial, {} low, overall {}",
            stats.total,
            stats.matched,
            stats.partial,
            stats.missing,
            stats.overall
        );

        Ok(MatchOutcome { matches, stats })
    }

    /// [`compute`](Self::compute) through an optional memo cache
    pub fn compute_cached(
        &self,
        embedder: &dyn Embedder,
        resume_skills: &[String],
        requirement_skills: &[String],
        critical: &CriticalSkills,
        cache: Option<&SimilarityCache>,
    ) -> Result<MatchOutcome, CollaboratorError> {
        let Some(cache) = cache else {
            return self.compute(embedder, resume_skills, requirement_skills, critical);
        };

        let key = SimilarityCache::key(resume_skills, requirement_skills, &self.thresholds, critical);
        if let Some(outcome) = cache.get(&key) {
            log::debug!("Similarity cache hit");
            return Ok(outcome);
        }

        let outcome = self.compute(embedder, resume_skills, requirement_skills, critical)?;
        cache.insert(key, outcome.clone());
        Ok(outcome)
    }
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self::new(MatchThresholds::default())
    }
}

/// Explicit memo of similarity outcomes, safe to share between tasks.
///
/// Keys ignore skill order and case. Failed computations are not stored.
#[derive(Debug, Default)]
pub struct SimilarityCache {
    entries: Mutex<HashMap<String, MatchOutcome>>,
}

impl SimilarityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// SHA-256 over the canonical form of one request
    pub fn key(
        resume_skills: &[String],
        requirement_skills: &[String],
        thresholds: &MatchThresholds,
        critical: &CriticalSkills,
    ) -> String {
        fn canonical(skills: &[String]) -> Vec<String> {
            let mut lower: Vec<String> = dedupe_skills(skills).iter().map(|s| s.to_lowercase()).collect();
            lower.sort();
            lower
        }

        let mut hasher = Sha256::new();
        for group in [canonical(resume_skills), canonical(requirement_skills), critical.sorted()] {
            for skill in group {
                hasher.update(skill.as_bytes());
                hasher.update([0x1f_u8]);
            }
            hasher.update([0x1e_u8]);
        }
        hasher.update(thresholds.match_threshold.to_le_bytes());
        hasher.update(thresholds.partial_threshold.to_le_bytes());

        format!("{:x}", hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Option<MatchOutcome> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn insert(&self, key: String, outcome: MatchOutcome) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, outcome);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::testing::{FailingEmbedder, LetterEmbedder};

    fn skills(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_match_short_circuit() {
        let engine = SimilarityEngine::default();
        let outcome = engine
            .compute(
                &LetterEmbedder::new(),
                &skills(&["Rust", " python "]),
                &skills(&["PYTHON"]),
                &CriticalSkills::default(),
            )
            .unwrap();

        let m = &outcome.matches[0];
        assert_eq!(m.similarity, 1.0);
        assert_eq!(m.category, MatchCategory::HighMatch);
        assert_eq!(m.best_resume_skill, "python");
    }

    #[test]
    fn test_python_sql_aws_scenario() {
        let engine = SimilarityEngine::new(MatchThresholds::new(0.8, 0.5));
        let outcome = engine
            .compute(
                &LetterEmbedder::new(),
                &skills(&["Python", "SQL"]),
                &skills(&["Python", "SQL", "AWS"]),
                &CriticalSkills::default(),
            )
            .unwrap();

        let stats = outcome.stats;
        assert_eq!(stats.matched, 2);
        assert_eq!(stats.total, 3);
        assert!(stats.partial <= 1);
        assert!(stats.missing <= 1);
        assert_eq!(stats.partial + stats.missing, 1);

        // "aws" shares only the letter s with "sql"
        let aws = &outcome.matches[2];
        assert_eq!(aws.best_resume_skill, "SQL");
        assert_eq!(aws.category, MatchCategory::LowMatch);
        assert_eq!(stats.overall, 67);
    }

    #[test]
    fn test_counts_sum_to_total() {
        let engine = SimilarityEngine::new(MatchThresholds::new(0.6, 0.3));
        let embedder = LetterEmbedder::new();
        let outcome = engine
            .compute(
                &embedder,
                &skills(&["Docker", "Kubernetes", "Leadership"]),
                &skills(&["Docker Swarm", "Helm", "Teamwork", "Leadership", "Go"]),
                &CriticalSkills::default(),
            )
            .unwrap();

        let stats = outcome.stats;
        assert_eq!(stats.matched + stats.partial + stats.missing, stats.total);
        assert_eq!(stats.total, 5);
    }

    #[test]
    fn test_empty_sets_skip_embedding() {
        let engine = SimilarityEngine::default();
        let embedder = LetterEmbedder::new();

        let outcome = engine
            .compute(&embedder, &[], &[], &CriticalSkills::default())
            .unwrap();
        assert_eq!(outcome, MatchOutcome::empty());

        let outcome = engine
            .compute(&embedder, &skills(&["Python"]), &[], &CriticalSkills::default())
            .unwrap();
        assert_eq!(outcome.stats, MatchStats::default());
        assert!(outcome.matches.is_empty());

        assert_eq!(embedder.calls(), 0);
    }

    #[test]
    fn test_adding_exact_skill_increases_overall() {
        let engine = SimilarityEngine::default();
        let embedder = LetterEmbedder::new();
        let requirements = skills(&["Python", "Kubernetes"]);

        let before = engine
            .compute(&embedder, &skills(&["Python"]), &requirements, &CriticalSkills::default())
            .unwrap();
        assert_eq!(before.matches[1].category, MatchCategory::LowMatch);

        let after = engine
            .compute(
                &embedder,
                &skills(&["Python", "kubernetes"]),
                &requirements,
                &CriticalSkills::default(),
            )
            .unwrap();

        assert!(after.stats.overall > before.stats.overall);
        assert_eq!(after.stats.overall, 100);
    }

    #[test]
    fn test_ties_keep_first_resume_skill() {
        let engine = SimilarityEngine::default();
        let embedder = LetterEmbedder::new()
            .with_alias("Postgres", "sql")
            .with_alias("MySQL", "sql");

        let outcome = engine
            .compute(
                &embedder,
                &skills(&["Postgres", "MySQL"]),
                &skills(&["Databases"]),
                &CriticalSkills::default(),
            )
            .unwrap();

        assert_eq!(outcome.matches[0].best_resume_skill, "Postgres");
    }

    #[test]
    fn test_critical_weighting() {
        let engine = SimilarityEngine::default();
        let embedder = LetterEmbedder::new();
        let resume = skills(&["Python"]);
        let requirements = skills(&["Python", "Go"]);

        let plain = engine
            .compute(&embedder, &resume, &requirements, &CriticalSkills::default())
            .unwrap();
        // one match, one miss
        assert_eq!(plain.stats.overall, 50);

        // Go is critical: (1 * 1.0 + 2 * sim(go, python)) / 3
        let critical = CriticalSkills::new(["go"]);
        let weighted = engine.compute(&embedder, &resume, &requirements, &critical).unwrap();
        let go = weighted.matches[1].similarity;
        let expected = ((1.0 + 2.0 * go) / 3.0 * 100.0).round() as u8;

        assert_eq!(weighted.stats.overall, expected);

        // A fully matched critical skill pulls the score up instead
        let critical = CriticalSkills::new(["PYTHON"]);
        let weighted = engine.compute(&embedder, &resume, &requirements, &critical).unwrap();
        assert!(weighted.stats.overall > plain.stats.overall);
    }

    #[test]
    fn test_project_overall() {
        let engine = SimilarityEngine::default();
        let outcome = engine
            .compute(
                &LetterEmbedder::new(),
                &skills(&["Python"]),
                &skills(&["Python", "SQL"]),
                &CriticalSkills::default(),
            )
            .unwrap();

        assert_eq!(outcome.stats.overall, 50);
        assert_eq!(outcome.project_overall(&skills(&["sql"]), &CriticalSkills::default()), 100);
        assert_eq!(outcome.project_overall(&[], &CriticalSkills::default()), 50);
    }

    #[test]
    fn test_collaborator_failure_is_returned() {
        let engine = SimilarityEngine::default();
        let result = engine.compute(
            &FailingEmbedder,
            &skills(&["Python"]),
            &skills(&["SQL"]),
            &CriticalSkills::default(),
        );

        assert!(matches!(result, Err(CollaboratorError::Unavailable(_))));
    }

    #[test]
    fn test_cache_hit_skips_embedding() {
        let engine = SimilarityEngine::default();
        let embedder = LetterEmbedder::new();
        let cache = SimilarityCache::new();
        let resume = skills(&["Python", "SQL"]);
        let requirements = skills(&["SQL", "AWS"]);
        let critical = CriticalSkills::default();

        let first = engine
            .compute_cached(&embedder, &resume, &requirements, &critical, Some(&cache))
            .unwrap();
        let second = engine
            .compute_cached(&embedder, &resume, &requirements, &critical, Some(&cache))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(embedder.calls(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_key_is_canonical() {
        let thresholds = MatchThresholds::default();
        let critical = CriticalSkills::default();

        let a = SimilarityCache::key(&skills(&["Python", "SQL"]), &skills(&["AWS"]), &thresholds, &critical);
        let b = SimilarityCache::key(&skills(&["sql", "python"]), &skills(&["aws"]), &thresholds, &critical);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let c = SimilarityCache::key(&skills(&["Python", "SQL"]), &skills(&["AWS"]), &MatchThresholds::lenient(), &critical);
        assert_ne!(a, c);

        let d = SimilarityCache::key(
            &skills(&["Python", "SQL"]),
            &skills(&["AWS"]),
            &thresholds,
            &CriticalSkills::new(["aws"]),
        );
        assert_ne!(a, d);

        // Resume and requirement groups are not interchangeable
        let e = SimilarityCache::key(&skills(&["AWS"]), &skills(&["Python", "SQL"]), &thresholds, &critical);
        assert_ne!(a, e);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let engine = SimilarityEngine::default();
        let cache = SimilarityCache::new();

        let result = engine.compute_cached(
            &FailingEmbedder,
            &skills(&["Python"]),
            &skills(&["SQL"]),
            &CriticalSkills::default(),
            Some(&cache),
        );

        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
