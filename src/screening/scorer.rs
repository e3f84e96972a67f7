//! PHQ-9 style severity scoring
//!
//! Item points come from frequency language in the observation text. The
//! parser only models a couple of PHQ-9 items, so a constant offset stands
//! in for the rest. Band thresholds are inclusive lower bounds.

use crate::config::ScoringConfig;
use crate::records::{relation_code, Observation, Process};
use serde::{Deserialize, Serialize};

const PSYCHOLOGY_DOMAIN: &str = "@Psychology@ClinicalPsychology";

/// Patient id used when an assessment has no observations to draw one from
pub const UNKNOWN_PATIENT: &str = "Unknown";

/// Maximum attainable PHQ-9 total
pub const PHQ9_MAX_SCORE: u32 = 27;

/// Depression severity bands, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Minimal,
    Moderate,
    ModeratelySevere,
    Severe,
}

impl Severity {
    /// Map a total score to its band; a total equal to a threshold takes that band
    pub fn from_total(total: u32) -> Self {
        match total {
            t if t >= 20 => Self::Severe,
            t if t >= 15 => Self::ModeratelySevere,
            t if t >= 10 => Self::Moderate,
            _ => Self::Minimal,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Severe => "Severe depression",
            Self::ModeratelySevere => "Moderately severe depression",
            Self::Moderate => "Moderate depression",
            Self::Minimal => "Minimal depression",
        }
    }

    pub fn recommendations(&self) -> &'static [&'static str] {
        match self {
            Self::Severe => &["Urgent psychiatric referral", "Therapy + medication evaluation"],
            Self::ModeratelySevere => &[
                "Therapy referral",
                "Consider medication",
                "Follow-up in 2 weeks",
            ],
            Self::Moderate => &[
                "Therapy consideration",
                "Lifestyle interventions",
                "Monitor symptoms",
            ],
            Self::Minimal => &["Watchful waiting", "Self-care strategies"],
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Points awarded to one scored observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemScore {
    pub concept: String,
    pub points: u32,
}

impl ItemScore {
    fn frequency_label(&self) -> &'static str {
        match self.points {
            0 => "Not at all",
            1 => "Several days",
            2 => "More than half the days",
            _ => "Nearly every day",
        }
    }
}

/// Outcome of a PHQ-9 assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub patient_id: String,
    pub total_score: u32,
    pub severity: Severity,
    pub recommendations: Vec<String>,
    pub item_scores: Vec<ItemScore>,
}

/// Heuristic PHQ-9 scorer
pub struct SeverityScorer {
    config: ScoringConfig,
    markers: Vec<String>,
}

impl SeverityScorer {
    pub fn new(config: ScoringConfig) -> Self {
        let markers = config
            .high_frequency_markers
            .iter()
            .map(|m| m.to_lowercase())
            .collect();
        Self { config, markers }
    }

    /// Score a set of observations
    pub fn score(&self, observations: &[Observation]) -> Assessment {
        let item_scores: Vec<ItemScore> = observations
            .iter()
            .filter(|obs| obs.concept.contains(&self.config.scored_concept))
            .map(|obs| ItemScore {
                concept: obs.concept.clone(),
                points: self.item_points(&obs.value),
            })
            .collect();

        let total_score =
            item_scores.iter().map(|s| s.points).sum::<u32>() + self.config.unmodeled_offset;
        let severity = Severity::from_total(total_score);

        let patient_id = observations
            .first()
            .map(|obs| obs.patient_id.clone())
            .unwrap_or_else(|| UNKNOWN_PATIENT.to_string());

        tracing::debug!(%patient_id, total_score, %severity, "PHQ-9 assessment scored");

        Assessment {
            patient_id,
            total_score,
            severity,
            recommendations: severity
                .recommendations()
                .iter()
                .map(|r| r.to_string())
                .collect(),
            item_scores,
        }
    }

    fn item_points(&self, value: &str) -> u32 {
        let value = value.to_lowercase();
        if self.markers.iter().any(|m| value.contains(m.as_str())) {
            self.config.high_frequency_points
        } else {
            self.config.default_points
        }
    }
}

impl Default for SeverityScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

/// Audit-trail records for an assessment: item scores, total, then severity
pub fn assessment_processes(assessment: &Assessment) -> Vec<Process> {
    let mut processes: Vec<Process> = assessment
        .item_scores
        .iter()
        .enumerate()
        .map(|(i, item)| {
            Process::new(
                &assessment.patient_id,
                "PHQ-9",
                relation_code("ScaleScore", PSYCHOLOGY_DOMAIN),
                format!(
                    "Item {} ({}): Score {} ({})",
                    i + 1,
                    item.concept,
                    item.points,
                    item.frequency_label()
                ),
            )
        })
        .collect();

    processes.push(Process::new(
        &assessment.patient_id,
        "PHQ-9",
        relation_code("TotalScore", PSYCHOLOGY_DOMAIN),
        assessment.total_score.to_string(),
    ));
    processes.push(Process::new(
        &assessment.patient_id,
        "Depression",
        relation_code("Severity", PSYCHOLOGY_DOMAIN),
        assessment.severity.label(),
    ));

    processes
}
