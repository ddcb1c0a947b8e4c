//! Scoring engine: audit, skill matching and aggregation for one document

use crate::config::{AuditConfig, EmbeddingConfig, MatchThresholds, ScoringConfig};
use crate::error::{CollaboratorError, Result};
use crate::output::report::{FinalReport, RelevanceMethod, ReportMetadata};
use crate::processing::aggregator::{missing_keywords, skill_gaps, ScoreAggregator};
use crate::processing::audit::{round_to_tenth, AuditEngine, QualityReport};
use crate::processing::embeddings::Embedder;
use crate::processing::features::FeatureExtractor;
use crate::processing::similarity::{CriticalSkills, MatchOutcome, MatchStats, SimilarityCache, SimilarityEngine};
use crate::processing::skills::{dedupe_skills, DictionarySkillExtractor, SkillExtractor};
use crate::processing::text_processor::TextProcessor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Job descriptions at or below this many trimmed characters count as absent
const MIN_JOB_DESCRIPTION_CHARS: usize = 10;

/// Inputs for one scoring run
#[derive(Debug, Clone, Default)]
pub struct ScoreRequest {
    pub resume_text: String,
    pub jd_text: Option<String>,
    /// Pre-resolved skills; extracted from the text when `None`
    pub resume_skills: Option<Vec<String>>,
    pub jd_skills: Option<Vec<String>>,
    pub critical_skills: Vec<String>,
}

impl ScoreRequest {
    pub fn new(resume_text: impl Into<String>) -> Self {
        Self {
            resume_text: resume_text.into(),
            ..Default::default()
        }
    }

    pub fn with_job_description(mut self, jd_text: impl Into<String>) -> Self {
        self.jd_text = Some(jd_text.into());
        self
    }

    pub fn with_resume_skills(mut self, skills: Vec<String>) -> Self {
        self.resume_skills = Some(skills);
        self
    }

    pub fn with_jd_skills(mut self, skills: Vec<String>) -> Self {
        self.jd_skills = Some(skills);
        self
    }

    pub fn with_critical_skills(mut self, skills: Vec<String>) -> Self {
        self.critical_skills = skills;
        self
    }

    fn job_text(&self) -> Option<&str> {
        self.jd_text
            .as_deref()
            .map(str::trim)
            .filter(|text| text.chars().count() > MIN_JOB_DESCRIPTION_CHARS)
    }

    /// A job description is present if its text is long enough or its
    /// skills were supplied directly
    pub fn has_job_description(&self) -> bool {
        self.job_text().is_some() || self.jd_skills.as_ref().is_some_and(|skills| !skills.is_empty())
    }
}

struct Relevance {
    outcome: MatchOutcome,
    method: RelevanceMethod,
    score: Option<f32>,
}

impl Relevance {
    /// Relevance from a coarse percentage; no per-skill detail
    fn proxy(method: RelevanceMethod, percentage: f32) -> Self {
        let percentage = percentage.clamp(0.0, 100.0);
        Self {
            outcome: MatchOutcome {
                matches: Vec::new(),
                stats: MatchStats {
                    overall: percentage.round() as u8,
                    ..MatchStats::default()
                },
            },
            method,
            score: Some(round_to_tenth(percentage)),
        }
    }

    fn degraded(&self) -> bool {
        matches!(self.method, RelevanceMethod::JaccardFallback | RelevanceMethod::KeywordOverlap)
    }
}

pub struct ScoringEngine {
    embedder: Option<Arc<dyn Embedder>>,
    skill_extractor: Arc<dyn SkillExtractor>,
    feature_extractor: FeatureExtractor,
    text_processor: TextProcessor,
    embedding: EmbeddingConfig,
    semaphore: Arc<Semaphore>,
    cache: Option<Arc<SimilarityCache>>,
}

impl ScoringEngine {
    /// `embedder` is `None` when no model could be loaded; relevance then
    /// always comes from the Jaccard fallback.
    pub fn new(embedder: Option<Arc<dyn Embedder>>, embedding: EmbeddingConfig) -> Result<Self> {
        embedding.validate()?;

        Ok(Self {
            embedder,
            skill_extractor: Arc::new(DictionarySkillExtractor::new()?),
            feature_extractor: FeatureExtractor::new(),
            text_processor: TextProcessor::new(),
            semaphore: Arc::new(Semaphore::new(embedding.max_concurrency)),
            embedding,
            cache: None,
        })
    }

    pub fn with_skill_extractor(mut self, skill_extractor: Arc<dyn SkillExtractor>) -> Self {
        self.skill_extractor = skill_extractor;
        self
    }

    /// Memoize similarity outcomes in `cache`, which may be shared with
    /// other engines
    pub fn with_cache(mut self, cache: Arc<SimilarityCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn embedding_model(&self) -> Option<&str> {
        self.embedder.as_ref().map(|e| e.model_name())
    }

    /// Document quality only, no job description involved
    pub fn score_quality(&self, resume_text: &str, audit: &AuditConfig) -> QualityReport {
        let features = self.feature_extractor.extract(resume_text);
        AuditEngine::new(*audit).run(&features)
    }

    pub async fn score_document(&self, request: &ScoreRequest, config: &ScoringConfig) -> Result<FinalReport> {
        config.validate()?;

        let features = self.feature_extractor.extract(&request.resume_text);
        let quality = AuditEngine::new(config.audit).run(&features);
        log::info!("Quality score: {:.1}", quality.score);

        let critical = CriticalSkills::new(&request.critical_skills);

        let relevance = if request.has_job_description() {
            self.relevance(request, &critical, config.thresholds).await
        } else {
            log::info!("No job description supplied, scoring quality only");
            Relevance {
                outcome: MatchOutcome::empty(),
                method: RelevanceMethod::NotApplicable,
                score: None,
            }
        };

        let aggregate = ScoreAggregator::new(config.blend, config.penalties).aggregate(quality.score, relevance.score);
        log::info!(
            "Final score: {:.1} (relevance via {:?})",
            aggregate.score,
            relevance.method
        );

        let embedding_model = match relevance.method {
            RelevanceMethod::Semantic => self.embedding_model().map(str::to_string),
            _ => None,
        };

        let mut penalties_applied = quality.penalties_applied;
        penalties_applied.extend(aggregate.penalties_applied);

        Ok(FinalReport {
            score: aggregate.score,
            quality_score: quality.score,
            relevance_score: relevance.score.unwrap_or(0.0),
            checks: quality.checks,
            missing_keywords: missing_keywords(&relevance.outcome),
            skill_gaps: skill_gaps(&relevance.outcome, &critical),
            match_details: relevance.outcome.matches.clone(),
            stats: relevance.outcome.stats,
            degraded: relevance.degraded(),
            relevance_method: relevance.method,
            penalties_applied,
            features,
            metadata: ReportMetadata::new(embedding_model, config.audit.preset, config.blend),
        })
    }

    fn resolve_skills(&self, supplied: Option<&[String]>, text: &str) -> Vec<String> {
        match supplied {
            Some(skills) => dedupe_skills(skills),
            None => self.skill_extractor.extract_skills(text).combined(),
        }
    }

    async fn relevance(&self, request: &ScoreRequest, critical: &CriticalSkills, thresholds: MatchThresholds) -> Relevance {
        let job_text = request.job_text().unwrap_or_default();
        let resume_skills = self.resolve_skills(request.resume_skills.as_deref(), &request.resume_text);
        let jd_skills = self.resolve_skills(request.jd_skills.as_deref(), job_text);

        if jd_skills.is_empty() {
            let overlap = self.text_processor.keyword_overlap(&request.resume_text, job_text);
            log::warn!("No skills found in job description, using keyword overlap ({}%)", overlap);
            return Relevance::proxy(RelevanceMethod::KeywordOverlap, overlap as f32);
        }

        match self.semantic_match(resume_skills.clone(), jd_skills.clone(), critical.clone(), thresholds).await {
            Ok(outcome) => Relevance {
                score: Some(outcome.stats.overall as f32),
                outcome,
                method: RelevanceMethod::Semantic,
            },
            Err(e) => {
                let similarity = if job_text.is_empty() {
                    self.text_processor.jaccard(&resume_skills.join(" "), &jd_skills.join(" "))
                } else {
                    self.text_processor.jaccard(&request.resume_text, job_text)
                };
                log::warn!("Semantic matching unavailable ({}), using Jaccard fallback", e);
                Relevance::proxy(RelevanceMethod::JaccardFallback, similarity * 100.0)
            }
        }
    }

    /// Run the similarity engine on a blocking worker, bounded by the
    /// semaphore and the configured timeout
    async fn semantic_match(
        &self,
        resume_skills: Vec<String>,
        jd_skills: Vec<String>,
        critical: CriticalSkills,
        thresholds: MatchThresholds,
    ) -> std::result::Result<MatchOutcome, CollaboratorError> {
        if !self.embedding.enabled {
            return Err(CollaboratorError::Unavailable("embeddings disabled".to_string()));
        }
        let embedder = self
            .embedder
            .clone()
            .ok_or_else(|| CollaboratorError::Unavailable("no embedding model loaded".to_string()))?;

        let semaphore = self.semaphore.clone();
        let cache = self.cache.clone();
        // One deadline covers both waiting for a slot and the embedding work
        let work = async move {
            let permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| CollaboratorError::Failed(e.to_string()))?;

            let task = tokio::task::spawn_blocking(move || {
                // Released when the worker finishes, even after a timeout
                let _permit = permit;
                SimilarityEngine::new(thresholds).compute_cached(
                    embedder.as_ref(),
                    &resume_skills,
                    &jd_skills,
                    &critical,
                    cache.as_deref(),
                )
            });

            let outcome = task
                .await
                .map_err(|join_error| CollaboratorError::Failed(format!("embedding worker failed: {}", join_error)))??;
            Ok::<MatchOutcome, CollaboratorError>(outcome)
        };

        let timeout_ms = self.embedding.timeout_ms;
        match tokio::time::timeout(Duration::from_millis(timeout_ms), work).await {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::Timeout(timeout_ms)),
        }
    }
}
