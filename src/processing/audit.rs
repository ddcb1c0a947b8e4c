//! Rule-based resume quality audit
//!
//! A fixed, ordered catalog of checks runs against [`DocumentFeatures`].
//! Each check emits one [`AuditCheck`]; passing checks earn the point value
//! of their impact and every emitted check adds its points to the maximum.
//! Missing critical sections cap the normalized score.

use crate::config::{AuditConfig, ImpactPoints};
use crate::processing::features::{DocumentFeatures, Section};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const MIN_WORDS: usize = 450;
const MAX_WORDS: usize = 1200;
const MIN_BULLETS: usize = 10;
const STRONG_METRIC_COUNT: usize = 5;
const WEAK_METRIC_COUNT: usize = 2;
const MIN_POWER_VERBS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckCategory {
    Essentials,
    Structure,
    Content,
    Formatting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Impact {
    Critical,
    High,
    Medium,
    Low,
}

impl Impact {
    pub fn points(&self, points: &ImpactPoints) -> f32 {
        match self {
            Impact::Critical => points.critical,
            Impact::High => points.high,
            Impact::Medium => points.medium,
            Impact::Low => points.low,
        }
    }
}

impl fmt::Display for CheckCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One entry of the audit ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditCheck {
    pub category: CheckCategory,
    pub name: String,
    pub status: bool,
    pub feedback: String,
    pub impact: Impact,
}

/// Result of one audit run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Normalized score in [0, 100], one decimal
    pub score: f32,
    pub raw_score: f32,
    pub max_possible_score: f32,
    pub checks: Vec<AuditCheck>,
    /// Human-readable description of every cap that lowered the score
    pub penalties_applied: Vec<String>,
}

impl QualityReport {
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.status).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &AuditCheck> {
        self.checks.iter().filter(|c| !c.status)
    }
}

struct CheckOutcome {
    status: bool,
    feedback: String,
    impact: Impact,
}

impl CheckOutcome {
    fn new(status: bool, feedback: impl Into<String>, impact: Impact) -> Self {
        Self {
            status,
            feedback: feedback.into(),
            impact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckKind {
    TextSelectability,
    WordCount,
    BulletPoints,
    EmailAddress,
    PhoneNumber,
    LinkedInProfile,
    SectionHeader(Section),
    QuantifiableImpact,
    PowerVerbs,
}

impl CheckKind {
    fn category(&self) -> CheckCategory {
        match self {
            CheckKind::TextSelectability | CheckKind::WordCount | CheckKind::BulletPoints => {
                CheckCategory::Formatting
            }
            CheckKind::EmailAddress | CheckKind::PhoneNumber | CheckKind::LinkedInProfile => {
                CheckCategory::Essentials
            }
            CheckKind::SectionHeader(_) => CheckCategory::Structure,
            CheckKind::QuantifiableImpact | CheckKind::PowerVerbs => CheckCategory::Content,
        }
    }

    fn name(&self) -> String {
        match self {
            CheckKind::TextSelectability => "Text Selectability".to_string(),
            CheckKind::WordCount => "Word Count".to_string(),
            CheckKind::BulletPoints => "Bullet Points".to_string(),
            CheckKind::EmailAddress => "Email Address".to_string(),
            CheckKind::PhoneNumber => "Phone Number".to_string(),
            CheckKind::LinkedInProfile => "LinkedIn Profile".to_string(),
            CheckKind::SectionHeader(section) => format!("{} Section", section),
            CheckKind::QuantifiableImpact => "Quantifiable Impact".to_string(),
            CheckKind::PowerVerbs => "Power Verbs".to_string(),
        }
    }

    /// Impact recorded when the predicate cannot be evaluated
    fn default_impact(&self) -> Impact {
        match self {
            CheckKind::TextSelectability
            | CheckKind::EmailAddress
            | CheckKind::PhoneNumber
            | CheckKind::QuantifiableImpact => Impact::Critical,
            _ => Impact::High,
        }
    }

    fn evaluate(&self, features: &DocumentFeatures) -> Option<CheckOutcome> {
        let outcome = match self {
            // Input is always extracted plain text by the time it reaches us
            CheckKind::TextSelectability => {
                CheckOutcome::new(true, "OCR-free plain text detected.", Impact::Critical)
            }
            CheckKind::WordCount => {
                let words = features.word_count;
                if (MIN_WORDS..=MAX_WORDS).contains(&words) {
                    CheckOutcome::new(true, format!("Optimal length ({} words).", words), Impact::High)
                } else if words < MIN_WORDS {
                    CheckOutcome::new(
                        false,
                        format!("Too short ({} words). Aim for {}+.", words, MIN_WORDS),
                        Impact::High,
                    )
                } else {
                    CheckOutcome::new(
                        false,
                        format!("Too long ({} words). Keep under {}.", words, MAX_WORDS),
                        Impact::Medium,
                    )
                }
            }
            CheckKind::BulletPoints => {
                if features.bullet_count > MIN_BULLETS {
                    CheckOutcome::new(
                        true,
                        format!("Good list usage ({} bullets).", features.bullet_count),
                        Impact::High,
                    )
                } else {
                    CheckOutcome::new(false, "Use more bullet points for readability.", Impact::High)
                }
            }
            CheckKind::EmailAddress => match &features.email {
                Some(email) => CheckOutcome::new(true, format!("Found: {}", email), Impact::Critical),
                None => CheckOutcome::new(false, "Missing contact email.", Impact::Critical),
            },
            CheckKind::PhoneNumber => match &features.phone {
                Some(_) => CheckOutcome::new(true, "Contact number detected.", Impact::Critical),
                None => CheckOutcome::new(false, "No phone number found.", Impact::Critical),
            },
            CheckKind::LinkedInProfile => {
                if features.linkedin {
                    CheckOutcome::new(true, "Profile link active.", Impact::High)
                } else {
                    CheckOutcome::new(false, "Add your LinkedIn URL.", Impact::High)
                }
            }
            CheckKind::SectionHeader(section) => {
                if features.has_section(*section)? {
                    CheckOutcome::new(true, format!("Found '{}' header.", section), Impact::High)
                } else {
                    CheckOutcome::new(false, format!("Missing '{}' section.", section), Impact::High)
                }
            }
            CheckKind::QuantifiableImpact => {
                let metrics = features.metric_count;
                if metrics >= STRONG_METRIC_COUNT {
                    CheckOutcome::new(true, format!("Found {}+ metrics.", metrics), Impact::Critical)
                } else if metrics >= WEAK_METRIC_COUNT {
                    CheckOutcome::new(
                        false,
                        format!("Only {} metrics found. Quantify more.", metrics),
                        Impact::High,
                    )
                } else {
                    CheckOutcome::new(false, "No hard numbers found. Quantify success.", Impact::Critical)
                }
            }
            CheckKind::PowerVerbs => {
                if features.verb_count >= MIN_POWER_VERBS {
                    CheckOutcome::new(
                        true,
                        format!("Strong action vocabulary ({} verbs).", features.verb_count),
                        Impact::High,
                    )
                } else {
                    CheckOutcome::new(
                        false,
                        "Use more action verbs (e.g. Led, Built, Analyzed).",
                        Impact::High,
                    )
                }
            }
        };

        Some(outcome)
    }

    fn run(&self, features: &DocumentFeatures) -> AuditCheck {
        let outcome = self.evaluate(features).unwrap_or_else(|| {
            CheckOutcome::new(false, "Could not be evaluated for this document.", self.default_impact())
        });

        AuditCheck {
            category: self.category(),
            name: self.name(),
            status: outcome.status,
            feedback: outcome.feedback,
            impact: outcome.impact,
        }
    }
}

/// The fixed check catalog, in reporting order
fn default_catalog() -> Vec<CheckKind> {
    let mut catalog = vec![
        CheckKind::TextSelectability,
        CheckKind::WordCount,
        CheckKind::BulletPoints,
        CheckKind::EmailAddress,
        CheckKind::PhoneNumber,
        CheckKind::LinkedInProfile,
    ];
    catalog.extend(Section::ALL.iter().map(|s| CheckKind::SectionHeader(*s)));
    catalog.push(CheckKind::QuantifiableImpact);
    catalog.push(CheckKind::PowerVerbs);
    catalog
}

pub struct AuditEngine {
    catalog: Vec<CheckKind>,
    config: AuditConfig,
}

impl AuditEngine {
    pub fn new(config: AuditConfig) -> Self {
        Self {
            catalog: default_catalog(),
            config,
        }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Run every check and score the resulting ledger
    pub fn run(&self, features: &DocumentFeatures) -> QualityReport {
        let checks: Vec<AuditCheck> = self.catalog.iter().map(|kind| kind.run(features)).collect();
        self.score_ledger(checks, &features.section_presence)
    }

    /// Score an audit ledger.
    ///
    /// Sections missing from `sections` count as absent.
    pub fn score_ledger(&self, checks: Vec<AuditCheck>, sections: &BTreeMap<Section, bool>) -> QualityReport {
        let points = &self.config.points;

        let raw_score: f32 = checks
            .iter()
            .filter(|c| c.status)
            .map(|c| c.impact.points(points))
            .sum();
        let max_possible_score: f32 = checks.iter().map(|c| c.impact.points(points)).sum();

        let mut score = if max_possible_score > 0.0 {
            (raw_score / max_possible_score) * 100.0
        } else {
            0.0
        };

        let present = |section: Section| sections.get(&section).copied().unwrap_or(false);
        let mut penalties_applied = Vec::new();

        if !present(Section::Experience) {
            let cap = self.config.missing_experience_cap;
            if score > cap {
                penalties_applied.push(format!("Experience section missing: capped at {}", cap));
            }
            score = score.min(cap);
        }

        if !present(Section::Education) && !present(Section::Skills) {
            let cap = self.config.missing_education_and_skills_cap;
            if score > cap {
                penalties_applied.push(format!("Education and Skills sections missing: capped at {}", cap));
            }
            score = score.min(cap);
        }

        let score = round_to_tenth(score.clamp(0.0, 100.0));

        log::debug!(
            "Audit scored {:.1} ({:.1}/{:.1} points, {} penalties)",
            score,
            raw_score,
            max_possible_score,
            penalties_applied.len()
        );

        QualityReport {
            score,
            raw_score,
            max_possible_score,
            checks,
            penalties_applied,
        }
    }
}

impl Default for AuditEngine {
    fn default() -> Self {
        Self::new(AuditConfig::default())
    }
}

pub(crate) fn round_to_tenth(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}
