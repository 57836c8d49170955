//! Pipeline orchestration
//!
//! Public API for the analytics pipeline: raw records are normalized
//! independently per record, then reduced into the dashboard payload. The
//! whole run is a pure, synchronous transform; the only shared state is the
//! static questionnaire registry and the resolved field map, both read-only.

use crate::analytics::build_dashboard;
use crate::fieldmap::FieldMap;
use crate::normalizer::{IdGenerator, SubmissionNormalizer, UuidIdGenerator};
use crate::types::{AnalyticsSubmission, DashboardAnalytics, RawSubmission};

/// Configuration for one analytics run, resolved by the caller up front
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub field_map: FieldMap,
}

impl PipelineConfig {
    pub fn new(field_map: FieldMap) -> Self {
        Self { field_map }
    }
}

/// Run the full pipeline over a batch of raw records.
///
/// Convenience entry point with default configuration and random ids.
/// Never fails: malformed per-record data degrades to null metrics.
///
/// # Example
/// ```ignore
/// let analytics = run_pipeline(&records, &PipelineConfig::default());
/// println!("{}", serde_json::to_string_pretty(&analytics)?);
/// ```
pub fn run_pipeline(raw: &[RawSubmission], config: &PipelineConfig) -> DashboardAnalytics {
    AnalyticsProcessor::with_config(config.clone()).analyze(raw)
}

/// Processor holding per-run configuration and the id source.
///
/// Hosts serving many concurrent requests should give each request its own
/// submission batch; the processor itself holds no batch state.
pub struct AnalyticsProcessor {
    config: PipelineConfig,
    ids: Box<dyn IdGenerator>,
}

impl Default for AnalyticsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsProcessor {
    /// Default configuration with random UUID ids
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            config,
            ids: Box::new(UuidIdGenerator),
        }
    }

    /// Replace the id source, e.g. with a deterministic generator in tests
    pub fn with_id_generator(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Normalize a batch without aggregating
    pub fn normalize_batch(&self, raw: &[RawSubmission]) -> Vec<AnalyticsSubmission> {
        let normalizer = SubmissionNormalizer::new(&self.config, self.ids.as_ref());
        raw.iter().map(|record| normalizer.normalize(record)).collect()
    }

    /// Normalize and aggregate a batch into the dashboard payload
    pub fn analyze(&self, raw: &[RawSubmission]) -> DashboardAnalytics {
        let submissions = self.normalize_batch(raw);
        build_dashboard(&submissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::SequentialIdGenerator;
    use crate::types::QuadrantId;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(pairs: &[(&str, serde_json::Value)]) -> RawSubmission {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn sample_batch() -> Vec<RawSubmission> {
        vec![
            record(&[
                ("Response ID", json!("r1")),
                ("C1", json!("Extremely")),
                ("C2", json!("Very much")),
                ("C3", json!("Very enjoyable")),
                ("C4", json!("Fully accepted")),
                ("D1", json!(4)),
                ("D2", json!(4)),
                ("B2", json!("yes")),
                ("F1", json!("Common")),
                ("Submitted At", json!("2024-03-04T10:00:00Z")),
            ]),
            record(&[
                ("Response ID", json!("r2")),
                ("motivation_score", json!(2)),
                ("ability_score", json!(4)),
                ("B2", json!("no")),
                ("Submitted At", json!("2024-03-05T10:00:00Z")),
            ]),
            record(&[
                ("Response ID", json!("r3")),
                ("C1", json!("Not at all")),
                ("D1", json!(1)),
                ("B2", json!("not sure")),
            ]),
        ]
    }

    #[test]
    fn end_to_end_batch() {
        let analytics = run_pipeline(&sample_batch(), &PipelineConfig::default());

        assert_eq!(analytics.stats.total_respondents.value, 3);
        assert_eq!(analytics.stats.current_users.value, 1);

        let bucket_sum: usize = analytics.quadrants.iter().map(|q| q.count).sum();
        assert_eq!(bucket_sum, 3);

        // Only two timestamped submissions: no trend.
        assert_eq!(analytics.stats.total_respondents.change, None);
        assert!(analytics.stats.last_updated.is_some());
    }

    #[test]
    fn normalize_batch_resolves_each_record() {
        let processor = AnalyticsProcessor::new();
        let submissions = processor.normalize_batch(&sample_batch());

        assert_eq!(submissions.len(), 3);
        assert_eq!(submissions[0].id, "r1");
        assert_eq!(submissions[0].motivation, Some(5.0));
        assert_eq!(submissions[0].ability, Some(4.0));
        assert_eq!(submissions[0].quadrant, Some(QuadrantId::HighMHighA));
        assert_eq!(submissions[1].quadrant, Some(QuadrantId::LowMHighA));
        assert_eq!(submissions[2].quadrant, Some(QuadrantId::LowMLowA));
        assert_eq!(submissions[2].current_use, None);
    }

    #[test]
    fn deterministic_ids_via_injected_generator() {
        let processor = AnalyticsProcessor::new()
            .with_id_generator(Box::new(SequentialIdGenerator::new("row")));
        let submissions =
            processor.normalize_batch(&[record(&[("B2", json!("yes"))]), record(&[])]);
        assert_eq!(submissions[0].id, "row-1");
        assert_eq!(submissions[1].id, "row-2");
    }

    #[test]
    fn output_is_json_serializable() {
        let analytics = run_pipeline(&sample_batch(), &PipelineConfig::default());
        let json = serde_json::to_string(&analytics).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["stats"]["total_respondents"]["value"].is_number());
        assert_eq!(parsed["quadrants"].as_array().unwrap().len(), 4);
        assert_eq!(parsed["regression"].as_array().unwrap().len(), 8);
    }
}
