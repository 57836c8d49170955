//! Field resolution
//!
//! Maps arbitrary raw record keys (spreadsheet headers, form platform field
//! names, full question text) onto canonical fields. Resolution order:
//!
//! 1. Exact match against the field map's configured column (normalized).
//! 2. Ordered token-set hints per field; a key matches when its normalized
//!    token set is a superset of the hint's tokens.
//! 3. Questionnaire-driven fallback: tokens from the question id, its text
//!    (tokens of 3+ characters), optionally unioned with a choice option's
//!    label and value tokens.
//!
//! Lookups are pure map reads over a record-local normalized index, so
//! resolving the same field twice always yields the same value. When several
//! keys carry the same token set, the first key encountered while building
//! the index wins and later duplicates are ignored.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::fieldmap::{FieldMap, MetricField};
use crate::registry::{self, Question};
use crate::types::RawSubmission;

/// Normalize a raw header into canonical token form: lower-case, camelCase
/// boundaries split, non-alphanumeric runs collapsed to single underscores,
/// leading/trailing underscores trimmed.
pub fn normalize_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    let mut prev_lower_or_digit = false;
    let mut prev_underscore = true; // suppresses a leading underscore
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            if ch.is_uppercase() && prev_lower_or_digit {
                out.push('_');
            }
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
            prev_lower_or_digit = ch.is_lowercase() || ch.is_numeric();
            prev_underscore = false;
        } else {
            if !prev_underscore {
                out.push('_');
                prev_underscore = true;
            }
            prev_lower_or_digit = false;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Split a normalized key into its tokens
pub fn tokens_of(normalized: &str) -> Vec<String> {
    normalized
        .split('_')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Significant tokens (3+ characters) of a question's text
pub fn question_text_tokens(question: &Question) -> Vec<String> {
    let mut tokens: Vec<String> = tokens_of(&normalize_key(question.text))
        .into_iter()
        .filter(|t| t.len() >= 3)
        .collect();
    tokens.sort();
    tokens.dedup();
    tokens
}

struct Entry {
    key: String,
    tokens: HashSet<String>,
    value: Value,
}

/// Record-local index of normalized keys to values.
///
/// Entries keep source order; exact lookups go through a hash map.
pub struct NormalizedRecord {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl NormalizedRecord {
    /// Build the index from a raw record, first-key-wins on collisions
    pub fn from_raw(raw: &RawSubmission) -> Self {
        let mut entries = Vec::with_capacity(raw.len());
        let mut index = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            let normalized = normalize_key(key);
            if normalized.is_empty() || index.contains_key(&normalized) {
                continue;
            }
            let tokens = tokens_of(&normalized).into_iter().collect();
            index.insert(normalized.clone(), entries.len());
            entries.push(Entry {
                key: normalized,
                tokens,
                value: value.clone(),
            });
        }
        Self { entries, index }
    }

    /// Exact lookup by normalized key
    pub fn get(&self, normalized_key: &str) -> Option<&Value> {
        self.index
            .get(normalized_key)
            .map(|&i| &self.entries[i].value)
    }

    /// First entry (in source order) whose token set contains all of `tokens`
    pub fn find_by_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> Option<&Value> {
        self.entries
            .iter()
            .find(|e| tokens.iter().all(|t| e.tokens.contains(t.as_ref())))
            .map(|e| &e.value)
    }

    /// Resolve a canonical field through the full cascade
    pub fn resolve_field(&self, field: MetricField, map: &FieldMap) -> Option<&Value> {
        if let Some(value) = self.get(&normalize_key(map.column(field))) {
            return Some(value);
        }
        for hint in field_hints(field) {
            if let Some(value) = self.find_by_tokens(hint) {
                return Some(value);
            }
        }
        fallback_question(field).and_then(|id| self.resolve_question(id))
    }

    /// Resolve the value answering one registered question.
    ///
    /// Tries the question id as an exact key, then as a token, then the
    /// question's significant text tokens, then text tokens unioned with
    /// each choice option's label/value tokens.
    pub fn resolve_question(&self, question_id: &str) -> Option<&Value> {
        let question = registry::question(question_id)?;
        let id_key = normalize_key(question.id);
        if let Some(value) = self.get(&id_key) {
            return Some(value);
        }
        if let Some(value) = self.find_by_tokens(&[id_key.as_str()]) {
            return Some(value);
        }
        let text_tokens = question_text_tokens(question);
        if let Some(value) = self.find_by_tokens(&text_tokens) {
            return Some(value);
        }
        if let Some(list) = question.choices.and_then(registry::choice_list) {
            for option in list.options {
                let mut unioned = text_tokens.clone();
                unioned.extend(tokens_of(&normalize_key(option.label)));
                unioned.extend(tokens_of(&normalize_key(option.value)));
                unioned.sort();
                unioned.dedup();
                if let Some(value) = self.find_by_tokens(&unioned) {
                    return Some(value);
                }
            }
        }
        None
    }

    /// Iterate normalized keys in source order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }
}

/// Ordered token-set hints per canonical field; earlier hints are more
/// specific and win over later ones
fn field_hints(field: MetricField) -> &'static [&'static [&'static str]] {
    match field {
        MetricField::Motivation => &[&["motivation", "score"], &["motivation"]],
        MetricField::Ability => &[&["ability", "score"], &["ability"]],
        MetricField::DescriptiveNorms => &[&["descriptive", "norms"], &["descriptive"]],
        MetricField::InjunctiveNorms => &[&["injunctive", "norms"], &["injunctive"]],
        MetricField::SystemReadiness => &[&["system", "readiness"], &["readiness"]],
        MetricField::CurrentUse => &[
            &["current", "use"],
            &["currently", "using"],
            &["using", "now"],
        ],
        MetricField::FacilitatorIndex => &[&["facilitator", "index"], &["facilitator"]],
        MetricField::SparkIndex => &[&["spark", "index"], &["spark"]],
        MetricField::SignalIndex => &[&["signal", "index"], &["signal"]],
    }
}

/// Registry question answering a canonical field directly, where one exists
fn fallback_question(field: MetricField) -> Option<&'static str> {
    match field {
        MetricField::DescriptiveNorms => Some(registry::DESCRIPTIVE_NORMS_QUESTION),
        MetricField::InjunctiveNorms => Some(registry::INJUNCTIVE_NORMS_QUESTION),
        MetricField::CurrentUse => Some(registry::CURRENT_USE_QUESTION),
        _ => None,
    }
}
