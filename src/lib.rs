//! Quadrant Analytics - normalization and scoring pipeline for behavioral
//! survey submissions
//!
//! Transforms loosely-structured survey records into a consistent analytical
//! model scored against a behavioral framework (motivation, ability, social
//! norms, system readiness, prompt exposure, and current use), through a
//! deterministic pipeline: field resolution → value interpretation → metric
//! derivation → submission normalization → dashboard aggregation.
//!
//! ## Modules
//!
//! - **registry**: static questionnaire catalog used for semantic matching
//! - **resolver**: raw header reconciliation onto canonical fields
//! - **interpret**: free-text and numeric value interpretation (Likert, yes/no)
//! - **metrics**: composite score and prompt-exposure derivation
//! - **normalizer**: per-record canonical submissions with quadrant tags
//! - **analytics**: whole-batch dashboard aggregation
//! - **ingest**: the fail-fast boundary turning bytes into records

pub mod analytics;
pub mod error;
pub mod fieldmap;
pub mod ingest;
pub mod interpret;
pub mod metrics;
pub mod normalizer;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod types;

pub use analytics::build_dashboard;
pub use error::IngestError;
pub use fieldmap::{FieldMap, MetricField};
pub use normalizer::{IdGenerator, SequentialIdGenerator, SubmissionNormalizer, UuidIdGenerator};
pub use pipeline::{run_pipeline, AnalyticsProcessor, PipelineConfig};
pub use types::{AnalyticsSubmission, DashboardAnalytics, QuadrantId, RawSubmission};

/// Pipeline version embedded in CLI output
pub const PIPELINE_VERSION: &str = env!("CARGO_PKG_VERSION");
