//! Submission normalization
//!
//! Produces one canonical `AnalyticsSubmission` per raw record: the
//! normalized key index is built once, composite metrics are derived from it,
//! and for each canonical field an explicitly configured column value wins
//! over the derived value. Records are processed independently with no shared
//! mutable state, so a batch can be normalized in any order or in parallel.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::fieldmap::MetricField;
use crate::interpret::{parse_bool, parse_likert};
use crate::metrics;
use crate::pipeline::PipelineConfig;
use crate::resolver::NormalizedRecord;
use crate::types::{AnalyticsSubmission, QuadrantId, RawSubmission};

/// Source of generated submission ids.
///
/// Injectable so tests can supply deterministic ids. Generated ids must be
/// collision-resistant within a batch; global uniqueness is not required.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Default generator: random v4 UUIDs
#[derive(Debug, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic generator for tests: `<prefix>-1`, `<prefix>-2`, ...
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", self.prefix, n)
    }
}

/// Ordered token hints for an existing source identifier
const ID_HINTS: &[&[&str]] = &[
    &["submission", "id"],
    &["response", "id"],
    &["respondent", "id"],
    &["record", "id"],
    &["uuid"],
];

/// Timestamp candidates, in the order the first parseable one wins:
/// explicit submission time, then end time, then start time
const TIMESTAMP_HINTS: &[&[&str]] = &[
    &["submitted", "at"],
    &["submission", "time"],
    &["timestamp"],
    &["end", "time"],
    &["ended", "at"],
    &["start", "time"],
    &["started", "at"],
];

/// Normalizer for converting raw records into canonical submissions
pub struct SubmissionNormalizer<'a> {
    config: &'a PipelineConfig,
    ids: &'a dyn IdGenerator,
}

impl<'a> SubmissionNormalizer<'a> {
    pub fn new(config: &'a PipelineConfig, ids: &'a dyn IdGenerator) -> Self {
        Self { config, ids }
    }

    /// Normalize one raw record. Never fails; unresolvable fields become None.
    pub fn normalize(&self, raw: &RawSubmission) -> AnalyticsSubmission {
        let record = NormalizedRecord::from_raw(raw);
        let map = &self.config.field_map;

        let score = |field: MetricField| {
            record.resolve_field(field, map).and_then(parse_likert)
        };

        let motivation = score(MetricField::Motivation).or_else(|| metrics::derive_motivation(&record));
        let ability = score(MetricField::Ability).or_else(|| metrics::derive_ability(&record));
        let descriptive_norms = score(MetricField::DescriptiveNorms)
            .or_else(|| metrics::derive_descriptive_norms(&record));
        let injunctive_norms = score(MetricField::InjunctiveNorms)
            .or_else(|| metrics::derive_injunctive_norms(&record));
        let system_readiness = score(MetricField::SystemReadiness)
            .or_else(|| metrics::derive_system_readiness(&record));
        let current_use = record
            .resolve_field(MetricField::CurrentUse, map)
            .and_then(parse_bool)
            .or_else(|| metrics::derive_current_use(&record));
        let facilitator_index = score(MetricField::FacilitatorIndex)
            .or_else(|| metrics::derive_prompt_index(&record, metrics::FACILITATOR_CHANNELS));
        let spark_index = score(MetricField::SparkIndex)
            .or_else(|| metrics::derive_prompt_index(&record, metrics::SPARK_CHANNELS));
        let signal_index = score(MetricField::SignalIndex)
            .or_else(|| metrics::derive_prompt_index(&record, metrics::SIGNAL_CHANNELS));

        AnalyticsSubmission {
            id: self.resolve_id(&record),
            quadrant: QuadrantId::classify(motivation, ability),
            motivation,
            ability,
            descriptive_norms,
            injunctive_norms,
            system_readiness,
            current_use,
            facilitator_index,
            spark_index,
            signal_index,
            submitted_at: resolve_timestamp(&record),
        }
    }

    /// Prefer an existing identifier from the source, else generate one
    fn resolve_id(&self, record: &NormalizedRecord) -> String {
        let existing = record
            .get("id")
            .or_else(|| ID_HINTS.iter().find_map(|hint| record.find_by_tokens(hint)))
            .and_then(scalar_to_id);
        existing.unwrap_or_else(|| self.ids.generate())
    }
}

fn scalar_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First timestamp candidate that parses as a valid date; missing or
/// malformed values are simply skipped, never an error
fn resolve_timestamp(record: &NormalizedRecord) -> Option<DateTime<Utc>> {
    TIMESTAMP_HINTS
        .iter()
        .filter_map(|hint| record.find_by_tokens(hint))
        .find_map(parse_datetime)
}

/// Parse the date formats spreadsheet and form exports actually emit
pub fn parse_datetime(value: &Value) -> Option<DateTime<Utc>> {
    let s = match value {
        Value::String(s) => s.trim(),
        _ => return None,
    };
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            let naive = date.and_hms_opt(0, 0, 0)?;
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn raw(pairs: &[(&str, Value)]) -> RawSubmission {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn normalize(pairs: &[(&str, Value)]) -> AnalyticsSubmission {
        let config = PipelineConfig::default();
        let ids = SequentialIdGenerator::new("test");
        SubmissionNormalizer::new(&config, &ids).normalize(&raw(pairs))
    }

    #[test]
    fn explicit_column_beats_derived_composite() {
        let submission = normalize(&[
            ("motivation_score", json!(2)),
            ("C1", json!("Extremely")),
            ("C2", json!("Extremely")),
        ]);
        assert_eq!(submission.motivation, Some(2.0));
    }

    #[test]
    fn derived_composite_fills_missing_column() {
        let submission = normalize(&[
            ("C1", json!("Extremely")),
            ("C2", json!("Very much")),
            ("C3", json!("Very enjoyable")),
            ("C4", json!("Fully accepted")),
        ]);
        assert_eq!(submission.motivation, Some(5.0));
    }

    #[test]
    fn current_use_yes_no_and_unsure() {
        assert_eq!(normalize(&[("B2", json!("yes"))]).current_use, Some(true));
        assert_eq!(normalize(&[("B2", json!("No"))]).current_use, Some(false));
        assert_eq!(normalize(&[("B2", json!("not sure"))]).current_use, None);
    }

    #[test]
    fn quadrant_assignment() {
        let submission = normalize(&[
            ("motivation_score", json!(4)),
            ("ability_score", json!(2)),
        ]);
        assert_eq!(submission.quadrant, Some(QuadrantId::HighMLowA));

        let submission = normalize(&[("motivation_score", json!(4))]);
        assert_eq!(submission.quadrant, None);
    }

    #[test]
    fn source_id_is_preferred() {
        let submission = normalize(&[("Response ID", json!("R-042")), ("B2", json!("yes"))]);
        assert_eq!(submission.id, "R-042");
    }

    #[test]
    fn generated_ids_are_unique_within_batch() {
        let config = PipelineConfig::default();
        let ids = SequentialIdGenerator::new("sub");
        let normalizer = SubmissionNormalizer::new(&config, &ids);
        let a = normalizer.normalize(&raw(&[("B2", json!("yes"))]));
        let b = normalizer.normalize(&raw(&[("B2", json!("no"))]));
        assert_eq!(a.id, "sub-1");
        assert_eq!(b.id, "sub-2");
    }

    #[test]
    fn timestamp_prefers_submission_time_over_start_time() {
        let submission = normalize(&[
            ("Start time", json!("2024-03-01 09:00:00")),
            ("Submitted At", json!("2024-03-01T10:30:00Z")),
        ]);
        let ts = submission.submitted_at.unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T10:30:00+00:00");
    }

    #[test]
    fn malformed_timestamp_is_skipped() {
        let submission = normalize(&[
            ("Submitted At", json!("soonish")),
            ("End time", json!("2024-03-02")),
        ]);
        assert!(submission.submitted_at.is_some());

        let submission = normalize(&[("Submitted At", json!("soonish"))]);
        assert_eq!(submission.submitted_at, None);
    }

    #[test]
    fn spreadsheet_date_formats_parse() {
        assert!(parse_datetime(&json!("2024-03-01 14:00")).is_some());
        assert!(parse_datetime(&json!("03/01/2024 14:00")).is_some());
        assert!(parse_datetime(&json!("2024-03-01")).is_some());
        assert!(parse_datetime(&json!("yesterday")).is_none());
        assert!(parse_datetime(&json!(42)).is_none());
    }
}
