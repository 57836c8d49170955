//! Core types for the analytics pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw survey records, normalized submissions, and the dashboard
//! output consumed by presentation layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw survey record: arbitrary source headers mapped to scalar values.
///
/// Keys arrive in any casing and punctuation (spreadsheet headers, form
/// platform field names, full question text). The map preserves source key
/// order, which the resolver relies on for first-key-wins collision handling.
pub type RawSubmission = serde_json::Map<String, serde_json::Value>;

/// Behavioral segment defined by high/low thresholds on motivation and ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuadrantId {
    HighMHighA,
    HighMLowA,
    LowMHighA,
    LowMLowA,
}

/// Threshold above which (inclusive) a 1-5 score counts as "high"
pub const HIGH_SCORE_THRESHOLD: f64 = 3.0;

impl QuadrantId {
    /// All quadrants in canonical display order
    pub const ALL: [QuadrantId; 4] = [
        QuadrantId::HighMHighA,
        QuadrantId::HighMLowA,
        QuadrantId::LowMHighA,
        QuadrantId::LowMLowA,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuadrantId::HighMHighA => "high_m_high_a",
            QuadrantId::HighMLowA => "high_m_low_a",
            QuadrantId::LowMHighA => "low_m_high_a",
            QuadrantId::LowMLowA => "low_m_low_a",
        }
    }

    /// Human-readable segment label
    pub fn label(&self) -> &'static str {
        match self {
            QuadrantId::HighMHighA => "High Motivation / High Ability",
            QuadrantId::HighMLowA => "High Motivation / Low Ability",
            QuadrantId::LowMHighA => "Low Motivation / High Ability",
            QuadrantId::LowMLowA => "Low Motivation / Low Ability",
        }
    }

    /// Classify a submission from its motivation and ability scores.
    ///
    /// A submission missing either score has no quadrant and is excluded
    /// from every quadrant-keyed aggregate.
    pub fn classify(motivation: Option<f64>, ability: Option<f64>) -> Option<QuadrantId> {
        let (m, a) = (motivation?, ability?);
        let high_m = m >= HIGH_SCORE_THRESHOLD;
        let high_a = a >= HIGH_SCORE_THRESHOLD;
        Some(match (high_m, high_a) {
            (true, true) => QuadrantId::HighMHighA,
            (true, false) => QuadrantId::HighMLowA,
            (false, true) => QuadrantId::LowMHighA,
            (false, false) => QuadrantId::LowMLowA,
        })
    }
}

/// One canonical submission derived from exactly one raw record.
///
/// Immutable after creation; a rebuild replaces it wholesale. Every metric is
/// nullable because survey data is expected to be incomplete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSubmission {
    /// Stable id (from the source record, or generated)
    pub id: String,
    /// Composite motivation score (1-5)
    pub motivation: Option<f64>,
    /// Composite ability score (1-5)
    pub ability: Option<f64>,
    /// Descriptive norms score (1-5, how common the behavior is perceived to be)
    pub descriptive_norms: Option<f64>,
    /// Injunctive norms score (1-5, how approved the behavior is perceived to be)
    pub injunctive_norms: Option<f64>,
    /// Composite system readiness score (1-5)
    pub system_readiness: Option<f64>,
    /// Whether the respondent currently performs the target behavior
    pub current_use: Option<bool>,
    /// Facilitator prompt exposure index (1-5, 1 = least exposure)
    pub facilitator_index: Option<f64>,
    /// Spark prompt exposure index (1-5, 1 = least exposure)
    pub spark_index: Option<f64>,
    /// Signal prompt exposure index (1-5, 1 = least exposure)
    pub signal_index: Option<f64>,
    /// Submission timestamp, when one parses from the source record
    pub submitted_at: Option<DateTime<Utc>>,
    /// Quadrant tag; None when motivation or ability is missing
    pub quadrant: Option<QuadrantId>,
}

/// A count statistic with an optional period-over-period change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountStat {
    pub value: usize,
    /// Percentage (or percentage-point) change between trend windows;
    /// None when fewer than 4 timestamped submissions exist
    pub change: Option<f64>,
}

/// A mean-score statistic with an optional absolute change between windows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreStat {
    pub value: Option<f64>,
    pub change: Option<f64>,
}

/// Headline numbers for the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_respondents: CountStat,
    pub current_users: CountStat,
    pub average_motivation: ScoreStat,
    pub average_ability: ScoreStat,
    /// Latest parseable submission timestamp across the batch
    pub last_updated: Option<DateTime<Utc>>,
}

/// Per-quadrant aggregate counts and rates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuadrantInsight {
    pub quadrant: QuadrantId,
    pub count: usize,
    /// Share of quadrant-classified submissions (0-100)
    pub percentage: f64,
    /// Current-use rate among bucket members with a known use status (0-1)
    pub current_use_rate: Option<f64>,
    pub average_motivation: Option<f64>,
    pub average_ability: Option<f64>,
}

/// One scatter-plot point; emitted only when ability, motivation, and
/// current use are all known
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub id: String,
    pub motivation: f64,
    pub ability: f64,
    pub current_use: bool,
    /// Mean of descriptive and injunctive norms
    pub norms: Option<f64>,
    pub system_readiness: Option<f64>,
}

/// Narrative summary of one behavioral segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub quadrant: QuadrantId,
    pub label: String,
    pub count: usize,
    /// Share of ALL submissions, including unclassified ones (0-100)
    pub percentage: f64,
    /// Generated insight sentences derived from bucket statistics
    pub insights: Vec<String>,
    /// Fixed, quadrant-specific guidance (not derived from data)
    pub recommendations: Vec<String>,
}

/// Mean prompt-exposure indices within one quadrant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptEffectivenessRow {
    pub quadrant: QuadrantId,
    pub facilitator: Option<f64>,
    pub spark: Option<f64>,
    pub signal: Option<f64>,
}

/// Effect-size class for a regression-style insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectStrength {
    Strong,
    Moderate,
    Weak,
    Indirect,
}

impl EffectStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectStrength::Strong => "strong",
            EffectStrength::Moderate => "moderate",
            EffectStrength::Weak => "weak",
            EffectStrength::Indirect => "indirect",
        }
    }
}

/// Mean-difference comparison for one predictor between current users and
/// non-users.
///
/// Despite the regression-style field names, this is a descriptive heuristic:
/// beta is a raw mean difference and `p_label` is derived from the same
/// magnitude thresholds as `strength`, not from any statistical test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionInsight {
    pub predictor: String,
    pub user_mean: Option<f64>,
    pub non_user_mean: Option<f64>,
    /// user_mean - non_user_mean; None when either group has no data
    pub beta: Option<f64>,
    pub strength: EffectStrength,
    /// Heuristic label ("<0.01", "<0.05", "<0.10", "n.s.", "n/a")
    pub p_label: String,
    pub interpretation: String,
}

/// One human-readable model-summary row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummaryRow {
    pub label: String,
    pub value: String,
    pub helper: Option<String>,
}

/// Complete dashboard payload, rebuilt in full on every analytics run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardAnalytics {
    pub stats: DashboardStats,
    pub quadrants: Vec<QuadrantInsight>,
    pub scatter: Vec<ScatterPoint>,
    pub segments: Vec<SegmentSummary>,
    pub prompt_effectiveness: Vec<PromptEffectivenessRow>,
    pub regression: Vec<RegressionInsight>,
    pub model_summary: Vec<ModelSummaryRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_uses_inclusive_threshold() {
        assert_eq!(
            QuadrantId::classify(Some(3.0), Some(3.0)),
            Some(QuadrantId::HighMHighA)
        );
        assert_eq!(
            QuadrantId::classify(Some(4.0), Some(2.0)),
            Some(QuadrantId::HighMLowA)
        );
        assert_eq!(
            QuadrantId::classify(Some(2.9), Some(3.1)),
            Some(QuadrantId::LowMHighA)
        );
        assert_eq!(
            QuadrantId::classify(Some(1.0), Some(1.0)),
            Some(QuadrantId::LowMLowA)
        );
    }

    #[test]
    fn classify_requires_both_scores() {
        assert_eq!(QuadrantId::classify(None, Some(4.0)), None);
        assert_eq!(QuadrantId::classify(Some(4.0), None), None);
        assert_eq!(QuadrantId::classify(None, None), None);
    }

    #[test]
    fn quadrant_serializes_snake_case() {
        let json = serde_json::to_string(&QuadrantId::HighMLowA).unwrap();
        assert_eq!(json, "\"high_m_low_a\"");
        assert_eq!(QuadrantId::HighMLowA.as_str(), "high_m_low_a");
    }
}
