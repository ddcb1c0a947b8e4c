//! Blend quality and relevance into the final score

use crate::config::{BlendPolicy, PenaltyPolicy, MAX_FINAL_SCORE};
use crate::processing::audit::round_to_tenth;
use crate::processing::similarity::{CriticalSkills, MatchOutcome};
use crate::processing::skills::{skill_group, SkillGroup};
use serde::{Deserialize, Serialize};

/// A requirement skill the resume does not cover
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGap {
    pub skill: String,
    pub similarity: f32,
    pub critical: bool,
    pub group: SkillGroup,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateScore {
    pub score: f32,
    pub penalties_applied: Vec<String>,
}

pub struct ScoreAggregator {
    blend: BlendPolicy,
    penalties: PenaltyPolicy,
}

impl ScoreAggregator {
    pub fn new(blend: BlendPolicy, penalties: PenaltyPolicy) -> Self {
        Self { blend, penalties }
    }

    /// Final score from the two axes. `relevance` is `None` when there is no
    /// job description, in which case quality alone counts.
    pub fn aggregate(&self, quality: f32, relevance: Option<f32>) -> AggregateScore {
        let mut penalties_applied = Vec::new();

        let mut score = match relevance {
            None => quality,
            Some(relevance) => {
                let blended = quality * self.blend.quality_weight + relevance * self.blend.relevance_weight;

                if relevance < self.penalties.relevance_floor && blended > self.penalties.low_relevance_cap {
                    penalties_applied.push(format!(
                        "Relevance below {}: capped at {}",
                        self.penalties.relevance_floor, self.penalties.low_relevance_cap
                    ));
                    self.penalties.low_relevance_cap
                } else {
                    blended
                }
            }
        };

        let ceiling = self.penalties.score_ceiling.min(MAX_FINAL_SCORE);
        if score > ceiling {
            penalties_applied.push(format!("Capped at {}", ceiling));
        }
        score = score.clamp(0.0, ceiling);

        AggregateScore {
            score: round_to_tenth(score),
            penalties_applied,
        }
    }
}

/// Low-match requirement skills, least similar first
pub fn missing_keywords(outcome: &MatchOutcome) -> Vec<String> {
    let mut low: Vec<_> = outcome.low_matches().collect();
    low.sort_by(|a, b| a.similarity.total_cmp(&b.similarity));
    low.into_iter().map(|m| m.requirement_skill.clone()).collect()
}

/// Low-match requirement skills, critical first, then least similar first
pub fn skill_gaps(outcome: &MatchOutcome, critical: &CriticalSkills) -> Vec<SkillGap> {
    let mut gaps: Vec<SkillGap> = outcome
        .low_matches()
        .map(|m| SkillGap {
            skill: m.requirement_skill.clone(),
            similarity: m.similarity,
            critical: critical.contains(&m.requirement_skill),
            group: skill_group(&m.requirement_skill),
        })
        .collect();

    gaps.sort_by(|a, b| {
        b.critical
            .cmp(&a.critical)
            .then_with(|| a.similarity.total_cmp(&b.similarity))
    });
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::similarity::{MatchCategory, MatchStats, SkillMatch};

    fn low(skill: &str, similarity: f32) -> SkillMatch {
        SkillMatch {
            requirement_skill: skill.to_string(),
            best_resume_skill: "Python".to_string(),
            similarity,
            category: MatchCategory::LowMatch,
        }
    }

    fn outcome() -> MatchOutcome {
        let high = SkillMatch {
            requirement_skill: "Python".to_string(),
            best_resume_skill: "Python".to_string(),
            similarity: 1.0,
            category: MatchCategory::HighMatch,
        };

        MatchOutcome {
            matches: vec![high, low("Docker", 0.3), low("Leadership", 0.1), low("AWS", 0.3)],
            stats: MatchStats {
                overall: 25,
                matched: 1,
                partial: 0,
                missing: 3,
                total: 4,
            },
        }
    }

    #[test]
    fn test_quality_first_blend() {
        let aggregator = ScoreAggregator::new(BlendPolicy::quality_first(), PenaltyPolicy::default());
        let result = aggregator.aggregate(80.0, Some(50.0));

        assert_eq!(result.score, 68.0);
        assert!(result.penalties_applied.is_empty());
    }

    #[test]
    fn test_relevance_first_blend() {
        let aggregator = ScoreAggregator::new(BlendPolicy::relevance_first(), PenaltyPolicy::default());
        assert_eq!(aggregator.aggregate(80.0, Some(50.0)).score, 62.0);
    }

    #[test]
    fn test_no_job_description_uses_quality() {
        let aggregator = ScoreAggregator::new(BlendPolicy::default(), PenaltyPolicy::default());

        assert_eq!(aggregator.aggregate(72.34, None).score, 72.3);
        assert_eq!(aggregator.aggregate(100.0, None).score, 95.0);
    }

    #[test]
    fn test_low_relevance_cap() {
        let aggregator = ScoreAggregator::new(BlendPolicy::default(), PenaltyPolicy::default());
        let result = aggregator.aggregate(100.0, Some(10.0));

        // 64 blended, capped to 40
        assert_eq!(result.score, 40.0);
        assert_eq!(result.penalties_applied.len(), 1);

        // Already under the cap: unchanged
        assert_eq!(aggregator.aggregate(30.0, Some(10.0)).score, 22.0);
    }

    #[test]
    fn test_final_score_bounds() {
        let penalties = PenaltyPolicy::default();

        for step in 0..=10 {
            let quality_weight = step as f32 / 10.0;
            let aggregator = ScoreAggregator::new(BlendPolicy::new(quality_weight, 1.0 - quality_weight), penalties);

            for (quality, relevance) in [(0.0, 0.0), (100.0, 100.0), (100.0, 0.0), (0.0, 100.0), (55.5, 19.9)] {
                let score = aggregator.aggregate(quality, Some(relevance)).score;
                assert!((0.0..=95.0).contains(&score), "score {} out of range", score);
            }
        }
    }

    #[test]
    fn test_ceiling_never_above_95() {
        let penalties = PenaltyPolicy {
            score_ceiling: 100.0,
            ..PenaltyPolicy::default()
        };
        let aggregator = ScoreAggregator::new(BlendPolicy::default(), penalties);

        assert_eq!(aggregator.aggregate(100.0, Some(100.0)).score, 95.0);
        assert_eq!(aggregator.aggregate(100.0, None).score, 95.0);
    }

    #[test]
    fn test_missing_keywords_order() {
        assert_eq!(missing_keywords(&outcome()), vec!["Leadership", "Docker", "AWS"]);
    }

    #[test]
    fn test_skill_gaps_put_critical_first() {
        let critical = CriticalSkills::new(["aws"]);
        let gaps = skill_gaps(&outcome(), &critical);

        let names: Vec<&str> = gaps.iter().map(|g| g.skill.as_str()).collect();
        assert_eq!(names, vec!["AWS", "Leadership", "Docker"]);
        assert!(gaps[0].critical);
        assert_eq!(gaps[0].group, SkillGroup::CloudDevOps);
        assert_eq!(gaps[1].group, SkillGroup::SoftSkills);
    }
}
