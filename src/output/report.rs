//! Final report produced by one scoring run

use crate::config::{AuditPreset, BlendPolicy};
use crate::processing::aggregator::SkillGap;
use crate::processing::audit::AuditCheck;
use crate::processing::features::DocumentFeatures;
use crate::processing::similarity::{MatchStats, SkillMatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the relevance score was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelevanceMethod {
    /// Embedding-based skill matching
    Semantic,
    /// Token Jaccard over the documents, used when embeddings fail
    JaccardFallback,
    /// Word overlap with the job description when it yields no skills
    KeywordOverlap,
    /// No job description supplied
    NotApplicable,
}

impl RelevanceMethod {
    pub fn description(&self) -> &'static str {
        match self {
            RelevanceMethod::Semantic => "semantic skill match",
            RelevanceMethod::JaccardFallback => "keyword overlap (embedding model unavailable)",
            RelevanceMethod::KeywordOverlap => "keyword overlap (no skills found in job description)",
            RelevanceMethod::NotApplicable => "no job description",
        }
    }
}

impl fmt::Display for RelevanceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    /// Model that produced the semantic match, if one was used
    pub embedding_model: Option<String>,
    pub audit_preset: AuditPreset,
    pub blend: BlendPolicy,
    pub version: String,
}

impl ReportMetadata {
    pub fn new(embedding_model: Option<String>, audit_preset: AuditPreset, blend: BlendPolicy) -> Self {
        Self {
            generated_at: Utc::now(),
            embedding_model,
            audit_preset,
            blend,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    /// Composite score in [0, 95]
    pub score: f32,
    pub quality_score: f32,
    pub relevance_score: f32,
    pub checks: Vec<AuditCheck>,
    pub match_details: Vec<SkillMatch>,
    pub stats: MatchStats,
    pub missing_keywords: Vec<String>,
    pub skill_gaps: Vec<SkillGap>,
    pub relevance_method: RelevanceMethod,
    /// Set whenever relevance came from a fallback instead of semantic matching
    pub degraded: bool,
    /// Caps that lowered the quality or final score
    pub penalties_applied: Vec<String>,
    pub features: DocumentFeatures,
    pub metadata: ReportMetadata,
}

impl FinalReport {
    pub fn has_job_description(&self) -> bool {
        self.relevance_method != RelevanceMethod::NotApplicable
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &AuditCheck> {
        self.checks.iter().filter(|c| !c.status)
    }

    pub fn verdict(&self) -> &'static str {
        match self.score {
            s if s >= 80.0 => "Strong candidate for ATS screening",
            s if s >= 65.0 => "Competitive, with a few gaps to close",
            s if s >= 50.0 => "Needs targeted improvements",
            _ => "Significant rework recommended",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relevance_method_serializes_by_name() {
        let json = serde_json::to_string(&RelevanceMethod::JaccardFallback).unwrap();
        assert_eq!(json, "\"JaccardFallback\"");
    }

    #[test]
    fn test_metadata_defaults() {
        let metadata = ReportMetadata::new(None, AuditPreset::Standard, BlendPolicy::default());

        assert_eq!(metadata.version, env!("CARGO_PKG_VERSION"));
        assert!(metadata.embedding_model.is_none());
    }
}
