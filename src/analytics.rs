//! Dashboard aggregation
//!
//! A pure reduction over the full normalized batch into the
//! `DashboardAnalytics` payload: totals, per-quadrant insights, scatter data,
//! segment summaries, the prompt-effectiveness matrix, mean-difference
//! "regression" insights, and the time-windowed trend comparison.
//!
//! The regression block is a descriptive heuristic, not a fitted model: beta
//! is the raw difference between user and non-user means, and the p-like
//! labels are derived from the same magnitude thresholds as the strength
//! class. The thresholds are preserved exactly for output compatibility.

use chrono::{DateTime, Utc};

use crate::types::{
    AnalyticsSubmission, CountStat, DashboardAnalytics, DashboardStats, EffectStrength,
    ModelSummaryRow, PromptEffectivenessRow, QuadrantId, QuadrantInsight, RegressionInsight,
    ScatterPoint, ScoreStat, SegmentSummary,
};

/// Build the complete dashboard payload from a normalized batch.
///
/// Stateless and recomputed from scratch on every call; submissions with no
/// quadrant are excluded from quadrant-keyed aggregates but still count
/// toward the overall totals.
pub fn build_dashboard(submissions: &[AnalyticsSubmission]) -> DashboardAnalytics {
    let buckets = quadrant_buckets(submissions);
    let trend = compute_trend(submissions);

    let total = submissions.len();
    let current_users = submissions
        .iter()
        .filter(|s| s.current_use == Some(true))
        .count();

    let stats = DashboardStats {
        total_respondents: CountStat {
            value: total,
            change: trend.total,
        },
        current_users: CountStat {
            value: current_users,
            change: trend.users,
        },
        average_motivation: ScoreStat {
            value: mean(submissions.iter().filter_map(|s| s.motivation)),
            change: trend.motivation,
        },
        average_ability: ScoreStat {
            value: mean(submissions.iter().filter_map(|s| s.ability)),
            change: trend.ability,
        },
        last_updated: submissions.iter().filter_map(|s| s.submitted_at).max(),
    };

    DashboardAnalytics {
        stats,
        quadrants: quadrant_insights(&buckets),
        scatter: scatter_points(submissions),
        segments: segment_summaries(&buckets, total),
        prompt_effectiveness: prompt_effectiveness(&buckets),
        regression: regression_insights(submissions),
        model_summary: model_summary(submissions, &buckets),
    }
}

/// Arithmetic mean, None when the iterator is empty
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

fn quadrant_index(quadrant: QuadrantId) -> usize {
    match quadrant {
        QuadrantId::HighMHighA => 0,
        QuadrantId::HighMLowA => 1,
        QuadrantId::LowMHighA => 2,
        QuadrantId::LowMLowA => 3,
    }
}

struct Buckets<'a> {
    by_quadrant: [Vec<&'a AnalyticsSubmission>; 4],
}

impl<'a> Buckets<'a> {
    fn get(&self, quadrant: QuadrantId) -> &[&'a AnalyticsSubmission] {
        &self.by_quadrant[quadrant_index(quadrant)]
    }

    /// Total submissions that landed in any bucket
    fn classified_total(&self) -> usize {
        self.by_quadrant.iter().map(Vec::len).sum()
    }
}

fn quadrant_buckets(submissions: &[AnalyticsSubmission]) -> Buckets<'_> {
    let mut by_quadrant: [Vec<&AnalyticsSubmission>; 4] = Default::default();
    for submission in submissions {
        if let Some(quadrant) = submission.quadrant {
            by_quadrant[quadrant_index(quadrant)].push(submission);
        }
    }
    Buckets { by_quadrant }
}

/// Current-use rate among members with a known use status
fn use_rate(members: &[&AnalyticsSubmission]) -> Option<f64> {
    let known: Vec<bool> = members.iter().filter_map(|s| s.current_use).collect();
    if known.is_empty() {
        return None;
    }
    let users = known.iter().filter(|&&u| u).count();
    Some(users as f64 / known.len() as f64)
}

fn quadrant_insights(buckets: &Buckets<'_>) -> Vec<QuadrantInsight> {
    let denominator = buckets.classified_total().max(1) as f64;
    QuadrantId::ALL
        .into_iter()
        .map(|quadrant| {
            let members = buckets.get(quadrant);
            QuadrantInsight {
                quadrant,
                count: members.len(),
                percentage: members.len() as f64 / denominator * 100.0,
                current_use_rate: use_rate(members),
                average_motivation: mean(members.iter().filter_map(|s| s.motivation)),
                average_ability: mean(members.iter().filter_map(|s| s.ability)),
            }
        })
        .collect()
}

fn scatter_points(submissions: &[AnalyticsSubmission]) -> Vec<ScatterPoint> {
    submissions
        .iter()
        .filter_map(|s| {
            let (motivation, ability, current_use) = (s.motivation?, s.ability?, s.current_use?);
            let norms = match (s.descriptive_norms, s.injunctive_norms) {
                (Some(d), Some(i)) => Some((d + i) / 2.0),
                (Some(d), None) => Some(d),
                (None, Some(i)) => Some(i),
                (None, None) => None,
            };
            Some(ScatterPoint {
                id: s.id.clone(),
                motivation,
                ability,
                current_use,
                norms,
                system_readiness: s.system_readiness,
            })
        })
        .collect()
}

/// Fixed, quadrant-specific guidance; intentionally not derived from data
fn recommendations(quadrant: QuadrantId) -> Vec<String> {
    let lines: &[&str] = match quadrant {
        QuadrantId::HighMHighA => &[
            "Maintain light-touch signal prompts; this group acts on reminders.",
            "Recruit members as peer champions to reach lower-norm segments.",
            "Watch for ability regressions when the system changes.",
        ],
        QuadrantId::HighMLowA => &[
            "Prioritize facilitator prompts: training, home visits, and peer demonstrations.",
            "Simplify the first steps of the workflow to lower the ability barrier.",
            "Pair members with high-ability peers in the same location.",
        ],
        QuadrantId::LowMHighA => &[
            "Lead with spark prompts: success stories and supervisor encouragement.",
            "Make the personal benefit of the system concrete and immediate.",
            "Make supervisor support visible to strengthen injunctive norms.",
        ],
        QuadrantId::LowMLowA => &[
            "Combine spark and facilitator prompts in a single guided session.",
            "Address system readiness blockers before individual outreach.",
            "Revisit this group after motivation or ability improves elsewhere.",
        ],
    };
    lines.iter().map(|s| s.to_string()).collect()
}

fn segment_summaries(buckets: &Buckets<'_>, grand_total: usize) -> Vec<SegmentSummary> {
    let denominator = grand_total.max(1) as f64;
    QuadrantId::ALL
        .into_iter()
        .map(|quadrant| {
            let members = buckets.get(quadrant);
            let percentage = members.len() as f64 / denominator * 100.0;

            let mut insights = vec![format!(
                "{} respondents ({:.1}% of all submissions) fall into this segment.",
                members.len(),
                percentage
            )];
            if let Some(rate) = use_rate(members) {
                insights.push(format!(
                    "{:.0}% of segment members with a known status currently use the system.",
                    rate * 100.0
                ));
            }
            if let (Some(m), Some(a)) = (
                mean(members.iter().filter_map(|s| s.motivation)),
                mean(members.iter().filter_map(|s| s.ability)),
            ) {
                insights.push(format!(
                    "Average motivation is {m:.1} and average ability is {a:.1} within the segment."
                ));
            }

            SegmentSummary {
                quadrant,
                label: quadrant.label().to_string(),
                count: members.len(),
                percentage,
                insights,
                recommendations: recommendations(quadrant),
            }
        })
        .collect()
}

fn prompt_effectiveness(buckets: &Buckets<'_>) -> Vec<PromptEffectivenessRow> {
    QuadrantId::ALL
        .into_iter()
        .map(|quadrant| {
            let members = buckets.get(quadrant);
            PromptEffectivenessRow {
                quadrant,
                facilitator: mean(members.iter().filter_map(|s| s.facilitator_index)),
                spark: mean(members.iter().filter_map(|s| s.spark_index)),
                signal: mean(members.iter().filter_map(|s| s.signal_index)),
            }
        })
        .collect()
}

/// The eight predictors compared between current users and non-users
const PREDICTORS: &[(&str, fn(&AnalyticsSubmission) -> Option<f64>)] = &[
    ("Motivation", |s| s.motivation),
    ("Ability", |s| s.ability),
    ("Descriptive norms", |s| s.descriptive_norms),
    ("Injunctive norms", |s| s.injunctive_norms),
    ("System readiness", |s| s.system_readiness),
    ("Facilitator prompts", |s| s.facilitator_index),
    ("Spark prompts", |s| s.spark_index),
    ("Signal prompts", |s| s.signal_index),
];

/// |beta| class thresholds, shared by `strength` and the p-like label
fn classify_beta(beta: Option<f64>) -> (EffectStrength, &'static str) {
    match beta {
        None => (EffectStrength::Indirect, "n/a"),
        Some(b) => {
            let magnitude = b.abs();
            if magnitude >= 1.0 {
                (EffectStrength::Strong, "<0.01")
            } else if magnitude >= 0.6 {
                (EffectStrength::Moderate, "<0.05")
            } else if magnitude >= 0.3 {
                (EffectStrength::Weak, "<0.10")
            } else {
                (EffectStrength::Indirect, "n.s.")
            }
        }
    }
}

fn interpretation(predictor: &str, beta: Option<f64>) -> String {
    match beta {
        None => format!(
            "Not enough data to compare {} between current users and non-users.",
            predictor.to_lowercase()
        ),
        Some(b) if b > 0.0 => format!(
            "{predictor} runs higher among current users (+{b:.2} on average)."
        ),
        Some(b) if b < 0.0 => format!(
            "{predictor} runs lower among current users ({b:.2} on average)."
        ),
        Some(_) => format!(
            "{predictor} shows no difference between current users and non-users."
        ),
    }
}

fn regression_insights(submissions: &[AnalyticsSubmission]) -> Vec<RegressionInsight> {
    let users: Vec<&AnalyticsSubmission> = submissions
        .iter()
        .filter(|s| s.current_use == Some(true))
        .collect();
    let non_users: Vec<&AnalyticsSubmission> = submissions
        .iter()
        .filter(|s| s.current_use == Some(false))
        .collect();

    PREDICTORS
        .iter()
        .map(|(name, value_of)| {
            let user_mean = mean(users.iter().filter_map(|s| value_of(s)));
            let non_user_mean = mean(non_users.iter().filter_map(|s| value_of(s)));
            let beta = match (user_mean, non_user_mean) {
                (Some(u), Some(n)) => Some(u - n),
                _ => None,
            };
            let (strength, p_label) = classify_beta(beta);
            RegressionInsight {
                predictor: name.to_string(),
                user_mean,
                non_user_mean,
                beta,
                strength,
                p_label: p_label.to_string(),
                interpretation: interpretation(name, beta),
            }
        })
        .collect()
}

struct TrendChanges {
    total: Option<f64>,
    users: Option<f64>,
    motivation: Option<f64>,
    ability: Option<f64>,
}

const NO_TREND: TrendChanges = TrendChanges {
    total: None,
    users: None,
    motivation: None,
    ability: None,
};

/// Split timestamped submissions at the midpoint into earlier/recent windows
/// and compare them. Fewer than 4 timestamped submissions means no trend:
/// every change field stays None, never zero.
fn compute_trend(submissions: &[AnalyticsSubmission]) -> TrendChanges {
    let mut timestamped: Vec<(&AnalyticsSubmission, DateTime<Utc>)> = submissions
        .iter()
        .filter_map(|s| s.submitted_at.map(|ts| (s, ts)))
        .collect();
    if timestamped.len() < 4 {
        return NO_TREND;
    }
    timestamped.sort_by_key(|(_, ts)| *ts);

    let mid = timestamped.len() / 2;
    let (earlier, recent) = timestamped.split_at(mid);
    let earlier: Vec<&AnalyticsSubmission> = earlier.iter().map(|(s, _)| *s).collect();
    let recent: Vec<&AnalyticsSubmission> = recent.iter().map(|(s, _)| *s).collect();

    // Earlier window is non-empty because mid >= 2 here.
    let total = Some((recent.len() as f64 - earlier.len() as f64) / earlier.len() as f64 * 100.0);

    let users = match (use_rate(&earlier), use_rate(&recent)) {
        (Some(e), Some(r)) => Some((r - e) * 100.0),
        _ => None,
    };
    let motivation = match (
        mean(earlier.iter().filter_map(|s| s.motivation)),
        mean(recent.iter().filter_map(|s| s.motivation)),
    ) {
        (Some(e), Some(r)) => Some(r - e),
        _ => None,
    };
    let ability = match (
        mean(earlier.iter().filter_map(|s| s.ability)),
        mean(recent.iter().filter_map(|s| s.ability)),
    ) {
        (Some(e), Some(r)) => Some(r - e),
        _ => None,
    };

    TrendChanges {
        total,
        users,
        motivation,
        ability,
    }
}

fn model_summary(
    submissions: &[AnalyticsSubmission],
    buckets: &Buckets<'_>,
) -> Vec<ModelSummaryRow> {
    let known: Vec<bool> = submissions.iter().filter_map(|s| s.current_use).collect();
    let users = known.iter().filter(|&&u| u).count();
    let use_row = if known.is_empty() {
        ModelSummaryRow {
            label: "Current use rate".to_string(),
            value: "n/a".to_string(),
            helper: Some("No respondents reported a use status.".to_string()),
        }
    } else {
        ModelSummaryRow {
            label: "Current use rate".to_string(),
            value: format!("{:.1}%", users as f64 / known.len() as f64 * 100.0),
            helper: Some(format!(
                "{users} of {} respondents with a known use status.",
                known.len()
            )),
        }
    };

    let norms_value = mean(submissions.iter().filter_map(|s| s.descriptive_norms));
    let norms_row = ModelSummaryRow {
        label: "Average descriptive norms".to_string(),
        value: norms_value
            .map(|v| format!("{v:.2} / 5"))
            .unwrap_or_else(|| "n/a".to_string()),
        helper: Some("How common respondents believe use is among people like them.".to_string()),
    };

    let readiness_value = mean(submissions.iter().filter_map(|s| s.system_readiness));
    let readiness_row = ModelSummaryRow {
        label: "Average system readiness".to_string(),
        value: readiness_value
            .map(|v| format!("{v:.2} / 5"))
            .unwrap_or_else(|| "n/a".to_string()),
        helper: Some("Mean of the reliability, integration, and infrastructure scores.".to_string()),
    };

    // Ties resolve to the first quadrant in canonical order.
    let largest = QuadrantId::ALL
        .into_iter()
        .filter(|q| !buckets.get(*q).is_empty())
        .reduce(|best, q| {
            if buckets.get(q).len() > buckets.get(best).len() {
                q
            } else {
                best
            }
        });
    let largest_row = match largest {
        Some(quadrant) => {
            let count = buckets.get(quadrant).len();
            let share = count as f64 / buckets.classified_total().max(1) as f64 * 100.0;
            ModelSummaryRow {
                label: "Largest segment".to_string(),
                value: quadrant.label().to_string(),
                helper: Some(format!(
                    "{count} respondents ({share:.1}% of classified submissions)."
                )),
            }
        }
        None => ModelSummaryRow {
            label: "Largest segment".to_string(),
            value: "n/a".to_string(),
            helper: None,
        },
    };

    vec![use_row, norms_row, readiness_row, largest_row]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sub(id: &str, motivation: Option<f64>, ability: Option<f64>) -> AnalyticsSubmission {
        AnalyticsSubmission {
            id: id.to_string(),
            quadrant: QuadrantId::classify(motivation, ability),
            motivation,
            ability,
            descriptive_norms: None,
            injunctive_norms: None,
            system_readiness: None,
            current_use: None,
            facilitator_index: None,
            spark_index: None,
            signal_index: None,
            submitted_at: None,
        }
    }

    fn at(day: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap())
    }

    #[test]
    fn unclassified_counts_toward_total_but_no_bucket() {
        let submissions = vec![
            sub("a", Some(4.0), Some(4.0)),
            sub("b", Some(2.0), Some(4.0)),
            sub("c", None, Some(4.0)),
        ];
        let dashboard = build_dashboard(&submissions);

        assert_eq!(dashboard.stats.total_respondents.value, 3);
        let bucket_sum: usize = dashboard.quadrants.iter().map(|q| q.count).sum();
        assert_eq!(bucket_sum, 2);
        assert!(bucket_sum <= submissions.len());
    }

    #[test]
    fn bucket_sum_equals_total_when_fully_scored() {
        let submissions = vec![
            sub("a", Some(4.0), Some(4.0)),
            sub("b", Some(2.0), Some(2.0)),
        ];
        let dashboard = build_dashboard(&submissions);
        let bucket_sum: usize = dashboard.quadrants.iter().map(|q| q.count).sum();
        assert_eq!(bucket_sum, 2);
    }

    #[test]
    fn quadrant_percentage_uses_classified_denominator() {
        let submissions = vec![
            sub("a", Some(4.0), Some(4.0)),
            sub("b", Some(4.0), Some(4.0)),
            sub("c", None, None),
        ];
        let dashboard = build_dashboard(&submissions);
        let high = &dashboard.quadrants[0];
        assert_eq!(high.quadrant, QuadrantId::HighMHighA);
        assert!((high.percentage - 100.0).abs() < 1e-9);
    }

    #[test]
    fn segment_percentage_uses_grand_total() {
        let submissions = vec![
            sub("a", Some(4.0), Some(4.0)),
            sub("b", Some(4.0), Some(4.0)),
            sub("c", None, None),
        ];
        let dashboard = build_dashboard(&submissions);
        let segment = &dashboard.segments[0];
        assert_eq!(segment.quadrant, QuadrantId::HighMHighA);
        // 2 of 3 total submissions, not 2 of 2 classified.
        assert!((segment.percentage - 66.666).abs() < 0.01);
        assert!(!segment.recommendations.is_empty());
    }

    #[test]
    fn empty_batch_produces_zeroes_not_panics() {
        let dashboard = build_dashboard(&[]);
        assert_eq!(dashboard.stats.total_respondents.value, 0);
        for insight in &dashboard.quadrants {
            assert_eq!(insight.count, 0);
            assert_eq!(insight.percentage, 0.0);
            assert_eq!(insight.current_use_rate, None);
        }
        assert_eq!(dashboard.model_summary.len(), 4);
        assert_eq!(dashboard.model_summary[3].value, "n/a");
    }

    #[test]
    fn scatter_requires_motivation_ability_and_use() {
        let mut complete = sub("a", Some(4.0), Some(3.0));
        complete.current_use = Some(true);
        complete.descriptive_norms = Some(4.0);
        complete.injunctive_norms = Some(2.0);
        let missing_use = sub("b", Some(4.0), Some(3.0));

        let dashboard = build_dashboard(&[complete, missing_use]);
        assert_eq!(dashboard.scatter.len(), 1);
        assert_eq!(dashboard.scatter[0].id, "a");
        assert_eq!(dashboard.scatter[0].norms, Some(3.0));
    }

    #[test]
    fn regression_thresholds_and_labels() {
        let mut user = sub("a", Some(5.0), Some(4.0));
        user.current_use = Some(true);
        let mut non_user = sub("b", Some(2.0), Some(3.5));
        non_user.current_use = Some(false);

        let dashboard = build_dashboard(&[user, non_user]);
        let motivation = &dashboard.regression[0];
        assert_eq!(motivation.beta, Some(3.0));
        assert_eq!(motivation.strength, EffectStrength::Strong);
        assert_eq!(motivation.p_label, "<0.01");

        let ability = &dashboard.regression[1];
        assert_eq!(ability.beta, Some(0.5));
        assert_eq!(ability.strength, EffectStrength::Weak);
        assert_eq!(ability.p_label, "<0.10");

        // No norms data on either side: beta null, "n/a" label.
        let norms = &dashboard.regression[2];
        assert_eq!(norms.beta, None);
        assert_eq!(norms.strength, EffectStrength::Indirect);
        assert_eq!(norms.p_label, "n/a");
    }

    #[test]
    fn regression_has_eight_predictors() {
        let dashboard = build_dashboard(&[]);
        assert_eq!(dashboard.regression.len(), 8);
    }

    #[test]
    fn fewer_than_four_timestamps_means_no_trend() {
        let mut submissions = vec![
            sub("a", Some(4.0), Some(4.0)),
            sub("b", Some(2.0), Some(2.0)),
            sub("c", Some(3.0), Some(3.0)),
        ];
        for (i, s) in submissions.iter_mut().enumerate() {
            s.submitted_at = at(i as u32 + 1);
        }
        let dashboard = build_dashboard(&submissions);
        assert_eq!(dashboard.stats.total_respondents.change, None);
        assert_eq!(dashboard.stats.current_users.change, None);
        assert_eq!(dashboard.stats.average_motivation.change, None);
        assert_eq!(dashboard.stats.average_ability.change, None);
    }

    #[test]
    fn untimestamped_batch_still_aggregates() {
        let submissions = vec![
            sub("a", Some(4.0), Some(4.0)),
            sub("b", Some(2.0), Some(2.0)),
            sub("c", Some(4.0), Some(2.0)),
            sub("d", Some(2.0), Some(4.0)),
        ];
        let dashboard = build_dashboard(&submissions);
        assert_eq!(dashboard.stats.last_updated, None);
        assert_eq!(dashboard.stats.total_respondents.change, None);
        let bucket_sum: usize = dashboard.quadrants.iter().map(|q| q.count).sum();
        assert_eq!(bucket_sum, 4);
        assert_eq!(dashboard.segments.len(), 4);
    }

    #[test]
    fn trend_split_compares_halves() {
        let mut submissions = Vec::new();
        for day in 1..=4u32 {
            let mut s = sub(&format!("s{day}"), Some(day as f64), Some(3.0));
            s.submitted_at = at(day);
            s.current_use = Some(day > 2);
            submissions.push(s);
        }
        let dashboard = build_dashboard(&submissions);

        // Halves of equal size: count change 0%.
        assert_eq!(dashboard.stats.total_respondents.change, Some(0.0));
        // Use rate goes 0% -> 100%: +100 percentage points.
        assert_eq!(dashboard.stats.current_users.change, Some(100.0));
        // Motivation mean goes 1.5 -> 3.5: +2.0 absolute.
        assert_eq!(dashboard.stats.average_motivation.change, Some(2.0));
        assert_eq!(dashboard.stats.average_ability.change, Some(0.0));
        assert_eq!(dashboard.stats.last_updated, at(4));
    }

    #[test]
    fn prompt_effectiveness_averages_within_bucket() {
        let mut a = sub("a", Some(4.0), Some(4.0));
        a.signal_index = Some(5.0);
        let mut b = sub("b", Some(4.0), Some(4.0));
        b.signal_index = Some(3.0);
        let dashboard = build_dashboard(&[a, b]);
        let row = &dashboard.prompt_effectiveness[0];
        assert_eq!(row.quadrant, QuadrantId::HighMHighA);
        assert_eq!(row.signal, Some(4.0));
        assert_eq!(row.facilitator, None);
    }

    #[test]
    fn model_summary_is_deterministic() {
        let mut a = sub("a", Some(4.0), Some(4.0));
        a.current_use = Some(true);
        a.descriptive_norms = Some(4.0);
        let mut b = sub("b", Some(2.0), Some(2.0));
        b.current_use = Some(false);
        b.descriptive_norms = Some(2.0);

        let first = build_dashboard(&[a.clone(), b.clone()]);
        let second = build_dashboard(&[a, b]);
        assert_eq!(first.model_summary.len(), 4);
        assert_eq!(first.model_summary[0].value, "50.0%");
        assert_eq!(
            first.model_summary[0].helper.as_deref(),
            Some("1 of 2 respondents with a known use status.")
        );
        assert_eq!(first.model_summary[1].value, "3.00 / 5");
        for (row_a, row_b) in first.model_summary.iter().zip(&second.model_summary) {
            assert_eq!(row_a.value, row_b.value);
        }
    }
}
