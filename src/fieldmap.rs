//! Field map configuration
//!
//! Binds each canonical metric to the column name we expect in source data.
//! Defaults cover the common export shapes; callers override individual
//! columns when a source uses different headers. Per the pipeline's design,
//! overrides are resolved by the caller (CLI, host service) and passed in
//! explicitly; the core never reads the environment.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Canonical metric fields the resolver can bind a source column to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    Motivation,
    Ability,
    DescriptiveNorms,
    InjunctiveNorms,
    SystemReadiness,
    CurrentUse,
    FacilitatorIndex,
    SparkIndex,
    SignalIndex,
}

impl MetricField {
    /// All canonical fields in resolution order
    pub const ALL: [MetricField; 9] = [
        MetricField::Motivation,
        MetricField::Ability,
        MetricField::DescriptiveNorms,
        MetricField::InjunctiveNorms,
        MetricField::SystemReadiness,
        MetricField::CurrentUse,
        MetricField::FacilitatorIndex,
        MetricField::SparkIndex,
        MetricField::SignalIndex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricField::Motivation => "motivation",
            MetricField::Ability => "ability",
            MetricField::DescriptiveNorms => "descriptive_norms",
            MetricField::InjunctiveNorms => "injunctive_norms",
            MetricField::SystemReadiness => "system_readiness",
            MetricField::CurrentUse => "current_use",
            MetricField::FacilitatorIndex => "facilitator_index",
            MetricField::SparkIndex => "spark_index",
            MetricField::SignalIndex => "signal_index",
        }
    }

    /// Parse a canonical field name (as used in override files and env keys)
    pub fn from_key(key: &str) -> Option<MetricField> {
        MetricField::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(key))
    }

    /// Default expected column name in source exports
    pub fn default_column(&self) -> &'static str {
        match self {
            MetricField::Motivation => "motivation_score",
            MetricField::Ability => "ability_score",
            MetricField::DescriptiveNorms => "descriptive_norms",
            MetricField::InjunctiveNorms => "injunctive_norms",
            MetricField::SystemReadiness => "system_readiness",
            MetricField::CurrentUse => "current_use",
            MetricField::FacilitatorIndex => "facilitator_index",
            MetricField::SparkIndex => "spark_index",
            MetricField::SignalIndex => "signal_index",
        }
    }
}

/// Canonical field -> expected source column name.
///
/// Built once per analytics run and treated as read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMap {
    columns: HashMap<MetricField, String>,
}

impl Default for FieldMap {
    fn default() -> Self {
        let columns = MetricField::ALL
            .into_iter()
            .map(|f| (f, f.default_column().to_string()))
            .collect();
        Self { columns }
    }
}

impl FieldMap {
    /// Defaults with the given columns overridden
    pub fn with_overrides<I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (MetricField, String)>,
    {
        let mut map = Self::default();
        for (field, column) in overrides {
            map.columns.insert(field, column);
        }
        map
    }

    pub fn set(&mut self, field: MetricField, column: impl Into<String>) {
        self.columns.insert(field, column.into());
    }

    /// The column name configured for a canonical field
    pub fn column(&self, field: MetricField) -> &str {
        self.columns
            .get(&field)
            .map(String::as_str)
            .unwrap_or_else(|| field.default_column())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_field() {
        let map = FieldMap::default();
        for field in MetricField::ALL {
            assert!(!map.column(field).is_empty());
        }
        assert_eq!(map.column(MetricField::Motivation), "motivation_score");
    }

    #[test]
    fn overrides_replace_only_named_columns() {
        let map = FieldMap::with_overrides([(MetricField::CurrentUse, "uses_now".to_string())]);
        assert_eq!(map.column(MetricField::CurrentUse), "uses_now");
        assert_eq!(map.column(MetricField::Ability), "ability_score");
    }

    #[test]
    fn from_key_round_trips() {
        for field in MetricField::ALL {
            assert_eq!(MetricField::from_key(field.as_str()), Some(field));
        }
        assert_eq!(MetricField::from_key("MOTIVATION"), Some(MetricField::Motivation));
        assert_eq!(MetricField::from_key("nope"), None);
    }
}
