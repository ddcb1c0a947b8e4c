//! Configuration management for the ATS scorer

use crate::error::{Result, ScorerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tolerance used when checking that blend weights sum to 1.0
const WEIGHT_EPSILON: f32 = 1e-4;

/// Highest final score any configuration may report
pub const MAX_FINAL_SCORE: f32 = 95.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub scoring: ScoringConfig,
    pub embedding: EmbeddingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    pub default_embedding_model: String,
}

/// Everything that shapes a single scoring run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub thresholds: MatchThresholds,
    pub blend: BlendPolicy,
    pub audit: AuditConfig,
    pub penalties: PenaltyPolicy,
}

/// Similarity cut-offs used to classify a requirement skill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchThresholds {
    pub match_threshold: f32,
    pub partial_threshold: f32,
}

/// Relative weight of the quality and relevance axes in the final score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendPolicy {
    pub quality_weight: f32,
    pub relevance_weight: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendPreset {
    QualityFirst,
    RelevanceFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditPreset {
    Standard,
    Strict,
    Custom,
}

/// Point value awarded for each impact level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactPoints {
    pub critical: f32,
    pub high: f32,
    pub medium: f32,
    pub low: f32,
}

/// Audit tuning: impact points plus the critical-section caps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    pub preset: AuditPreset,
    /// Ceiling on the quality score when no Experience section is found
    pub missing_experience_cap: f32,
    /// Ceiling on the quality score when both Education and Skills are missing
    pub missing_education_and_skills_cap: f32,
    pub points: ImpactPoints,
}

/// Penalties applied by the aggregator after blending.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyPolicy {
    /// Relevance below this value triggers the low-relevance cap
    pub relevance_floor: f32,
    pub low_relevance_cap: f32,
    /// Highest final score ever reported
    pub score_ceiling: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub enabled: bool,
    pub timeout_ms: u64,
    pub max_concurrency: usize,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ats-scorer")
            .join("models");

        Self {
            models_dir,
            default_embedding_model: "potion-base-8M".to_string(),
        }
    }
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            match_threshold: 0.8,
            partial_threshold: 0.5,
        }
    }
}

impl MatchThresholds {
    pub fn new(match_threshold: f32, partial_threshold: f32) -> Self {
        Self {
            match_threshold,
            partial_threshold,
        }
    }

    /// Looser cut-offs used by the interactive skill matcher
    pub fn lenient() -> Self {
        Self::new(0.75, 0.45)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("match_threshold", self.match_threshold),
            ("partial_threshold", self.partial_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScorerError::Configuration(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.partial_threshold >= self.match_threshold {
            return Err(ScorerError::Configuration(format!(
                "partial_threshold ({}) must be lower than match_threshold ({})",
                self.partial_threshold, self.match_threshold
            )));
        }

        Ok(())
    }
}

impl Default for BlendPolicy {
    fn default() -> Self {
        Self::quality_first()
    }
}

impl BlendPolicy {
    pub fn new(quality_weight: f32, relevance_weight: f32) -> Self {
        Self {
            quality_weight,
            relevance_weight,
        }
    }

    /// 60% document quality, 40% job relevance
    pub fn quality_first() -> Self {
        Self::new(0.6, 0.4)
    }

    /// 40% document quality, 60% job relevance
    pub fn relevance_first() -> Self {
        Self::new(0.4, 0.6)
    }

    pub fn from_preset(preset: BlendPreset) -> Self {
        match preset {
            BlendPreset::QualityFirst => Self::quality_first(),
            BlendPreset::RelevanceFirst => Self::relevance_first(),
        }
    }

    /// Name of the matching preset, if any
    pub fn preset_name(&self) -> &'static str {
        if *self == Self::quality_first() {
            "quality-first"
        } else if *self == Self::relevance_first() {
            "relevance-first"
        } else {
            "custom"
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.quality_weight < 0.0 || self.relevance_weight < 0.0 {
            return Err(ScorerError::Configuration(format!(
                "blend weights must be non-negative, got {} / {}",
                self.quality_weight, self.relevance_weight
            )));
        }

        let sum = self.quality_weight + self.relevance_weight;
        if (sum - 1.0).abs() > WEIGHT_EPSILON {
            return Err(ScorerError::Configuration(format!(
                "blend weights must sum to 1.0, got {} + {} = {}",
                self.quality_weight, self.relevance_weight, sum
            )));
        }

        Ok(())
    }
}

impl ImpactPoints {
    pub fn standard() -> Self {
        Self {
            critical: 9.5,
            high: 4.8,
            medium: 2.5,
            low: 1.0,
        }
    }

    pub fn strict() -> Self {
        Self {
            critical: 12.0,
            high: 6.0,
            medium: 3.0,
            low: 1.0,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl AuditConfig {
    pub fn standard() -> Self {
        Self {
            preset: AuditPreset::Standard,
            points: ImpactPoints::standard(),
            missing_experience_cap: 45.0,
            missing_education_and_skills_cap: 55.0,
        }
    }

    pub fn strict() -> Self {
        Self {
            preset: AuditPreset::Strict,
            points: ImpactPoints::strict(),
            missing_experience_cap: 40.0,
            missing_education_and_skills_cap: 50.0,
        }
    }

    pub fn from_preset(preset: AuditPreset) -> Self {
        match preset {
            AuditPreset::Strict => Self::strict(),
            AuditPreset::Standard | AuditPreset::Custom => Self::standard(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let points = self.points;
        for (name, value) in [
            ("critical", points.critical),
            ("high", points.high),
            ("medium", points.medium),
            ("low", points.low),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(ScorerError::Configuration(format!(
                    "impact points for '{}' must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        validate_percentage("missing_experience_cap", self.missing_experience_cap)?;
        validate_percentage(
            "missing_education_and_skills_cap",
            self.missing_education_and_skills_cap,
        )
    }
}

impl Default for PenaltyPolicy {
    fn default() -> Self {
        Self {
            relevance_floor: 20.0,
            low_relevance_cap: 40.0,
            score_ceiling: MAX_FINAL_SCORE,
        }
    }
}

impl PenaltyPolicy {
    pub fn validate(&self) -> Result<()> {
        validate_percentage("relevance_floor", self.relevance_floor)?;
        validate_percentage("low_relevance_cap", self.low_relevance_cap)?;
        validate_percentage("score_ceiling", self.score_ceiling)?;
        if self.score_ceiling > MAX_FINAL_SCORE {
            return Err(ScorerError::Configuration(format!(
                "score_ceiling must not exceed {}, got {}",
                MAX_FINAL_SCORE, self.score_ceiling
            )));
        }
        Ok(())
    }
}

impl ScoringConfig {
    /// Fail fast on settings that can only be a programming mistake
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        self.blend.validate()?;
        self.audit.validate()?;
        self.penalties.validate()
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 10_000,
            max_concurrency: 4,
            batch_size: 64,
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(ScorerError::Configuration(
                "embedding.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ScorerError::Configuration(
                "embedding.batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Console,
            detailed: false,
            color_output: true,
        }
    }
}

fn validate_percentage(name: &str, value: f32) -> Result<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ScorerError::Configuration(format!(
            "{} must be within [0, 100], got {}",
            name, value
        )));
    }
    Ok(())
}

impl Config {
    /// Load from the default location, creating it with defaults on first run
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| ScorerError::Configuration(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ScorerError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("ats-scorer")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()?;
        self.embedding.validate()
    }

    pub fn models_dir(&self) -> &PathBuf {
        &self.models.models_dir
    }
}
