//! Metric derivation
//!
//! Computes composite scores from resolved per-question values when no
//! precomputed column exists:
//! - composite Likert means (motivation, ability, system readiness)
//! - single-question norms scores
//! - prompt-exposure indices on the model's inverted 1-5 scale
//! - the current-use fallback from the free-text method-in-use answer

use serde_json::Value;

use crate::interpret::{parse_bool, parse_likert, parse_number};
use crate::registry::{
    ABILITY_QUESTIONS, CURRENT_USE_QUESTION, DESCRIPTIVE_NORMS_QUESTION,
    INJUNCTIVE_NORMS_QUESTION, METHOD_IN_USE_QUESTION, MOTIVATION_QUESTIONS,
    PROMPT_LIKELIHOOD_QUESTION, SYSTEM_READINESS_QUESTIONS,
};
use crate::resolver::NormalizedRecord;

/// Token groups locating each facilitator-prompt channel in a record.
///
/// Facilitator prompts make the behavior easier to perform.
pub const FACILITATOR_CHANNELS: &[&[&str]] = &[&["home", "visit"], &["training"], &["peer"]];

/// Spark prompts supply motivation.
pub const SPARK_CHANNELS: &[&[&str]] = &[&["success", "story"], &["supervisor"]];

/// Signal prompts are plain reminders.
pub const SIGNAL_CHANNELS: &[&[&str]] = &[&["sms"], &["poster"], &["radio"]];

/// Tokens of the "no prompts received" indicator answer
pub const NO_PROMPTS_TOKENS: &[&str] = &["no", "prompts"];

/// Arithmetic mean of the non-null constituent Likert scores.
///
/// Null constituents are ignored, not zero-filled; all-null yields None.
fn composite_mean(record: &NormalizedRecord, question_ids: &[&str]) -> Option<f64> {
    let scores: Vec<f64> = question_ids
        .iter()
        .filter_map(|id| record.resolve_question(id))
        .filter_map(parse_likert)
        .collect();
    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

/// Composite motivation from C1-C4
pub fn derive_motivation(record: &NormalizedRecord) -> Option<f64> {
    composite_mean(record, MOTIVATION_QUESTIONS)
}

/// Composite ability from D1-D6
pub fn derive_ability(record: &NormalizedRecord) -> Option<f64> {
    composite_mean(record, ABILITY_QUESTIONS)
}

/// Composite system readiness from G1-G3
pub fn derive_system_readiness(record: &NormalizedRecord) -> Option<f64> {
    composite_mean(record, SYSTEM_READINESS_QUESTIONS)
}

/// Descriptive norms map directly to F1, no averaging
pub fn derive_descriptive_norms(record: &NormalizedRecord) -> Option<f64> {
    record
        .resolve_question(DESCRIPTIVE_NORMS_QUESTION)
        .and_then(parse_likert)
}

/// Injunctive norms map directly to F2
pub fn derive_injunctive_norms(record: &NormalizedRecord) -> Option<f64> {
    record
        .resolve_question(INJUNCTIVE_NORMS_QUESTION)
        .and_then(parse_likert)
}

/// Derive one prompt-exposure index from a group of channel token sets.
///
/// Polarity: the index lives on an inverted 1-5 scale where 1 means least
/// exposure. A true "no prompts received" indicator therefore short-circuits
/// the whole index to 1 regardless of other sub-answers. Otherwise the valid
/// 0/1 exposures across the group's channels are averaged and the [0,1]
/// ratio rescaled to 1-5 via `ratio * 4 + 1`. When no exposure signal
/// resolves at all, the general prompt-likelihood question (E2) is the last
/// resort.
pub fn derive_prompt_index(record: &NormalizedRecord, channels: &[&[&str]]) -> Option<f64> {
    if let Some(indicator) = record.find_by_tokens(NO_PROMPTS_TOKENS) {
        if channel_exposure(indicator) == Some(true) {
            return Some(1.0);
        }
    }

    let exposures: Vec<bool> = channels
        .iter()
        .filter_map(|tokens| record.find_by_tokens(tokens))
        .filter_map(channel_exposure)
        .collect();
    if !exposures.is_empty() {
        let hits = exposures.iter().filter(|&&e| e).count() as f64;
        let ratio = hits / exposures.len() as f64;
        return Some(ratio * 4.0 + 1.0);
    }

    record
        .resolve_question(PROMPT_LIKELIHOOD_QUESTION)
        .and_then(parse_likert)
}

/// Whether the respondent currently performs the target behavior.
///
/// Falls back to inferring true from a non-empty free-text method-in-use
/// answer when the direct yes/no question is unresolvable.
pub fn derive_current_use(record: &NormalizedRecord) -> Option<bool> {
    if let Some(answer) = record.resolve_question(CURRENT_USE_QUESTION) {
        if let Some(flag) = parse_bool(answer) {
            return Some(flag);
        }
    }
    match record.resolve_question(METHOD_IN_USE_QUESTION) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(true),
        _ => None,
    }
}

/// Exposure parse for one channel answer: boolean/yes-no parse, then plain
/// substring yes/no detection, then a >0 numeric test
fn channel_exposure(value: &Value) -> Option<bool> {
    if let Some(flag) = parse_bool(value) {
        return Some(flag);
    }
    if let Value::String(s) = value {
        let s = s.trim().to_lowercase();
        if s.contains("yes") {
            return Some(true);
        }
        if s.contains("no") {
            return Some(false);
        }
    }
    parse_number(value).map(|n| n > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawSubmission;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> NormalizedRecord {
        let raw: RawSubmission = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        NormalizedRecord::from_raw(&raw)
    }

    #[test]
    fn motivation_from_free_text_answers() {
        let rec = record(&[
            ("C1", json!("Extremely")),
            ("C2", json!("Very much")),
            ("C3", json!("Very enjoyable")),
            ("C4", json!("Fully accepted")),
        ]);
        assert_eq!(derive_motivation(&rec), Some(5.0));
    }

    #[test]
    fn composite_ignores_null_constituents() {
        let rec = record(&[
            ("C1", json!(4)),
            ("C2", json!("no idea what this means")),
            ("C3", json!(2)),
        ]);
        // Mean of 4 and 2 only; the unmatched answer is ignored.
        assert_eq!(derive_motivation(&rec), Some(3.0));
    }

    #[test]
    fn composite_is_null_when_all_constituents_are_null() {
        let rec = record(&[("C1", json!("banana")), ("unrelated", json!(3))]);
        assert_eq!(derive_motivation(&rec), None);
    }

    #[test]
    fn ability_averages_six_questions() {
        let rec = record(&[
            ("D1", json!(5)),
            ("D2", json!(4)),
            ("D3", json!(3)),
            ("D4", json!(2)),
            ("D5", json!(1)),
            ("D6", json!(3)),
        ]);
        assert_eq!(derive_ability(&rec), Some(3.0));
    }

    #[test]
    fn norms_are_single_question() {
        let rec = record(&[("F1", json!("Common")), ("F2", json!("Very supportive"))]);
        assert_eq!(derive_descriptive_norms(&rec), Some(4.0));
        assert_eq!(derive_injunctive_norms(&rec), Some(5.0));
    }

    #[test]
    fn no_prompts_indicator_short_circuits_to_one() {
        let rec = record(&[
            ("E1_no_prompts_received", json!("yes")),
            ("E1_sms_reminder", json!("yes")),
            ("E1_home_visit", json!("yes")),
        ]);
        assert_eq!(derive_prompt_index(&rec, FACILITATOR_CHANNELS), Some(1.0));
        assert_eq!(derive_prompt_index(&rec, SPARK_CHANNELS), Some(1.0));
        assert_eq!(derive_prompt_index(&rec, SIGNAL_CHANNELS), Some(1.0));
    }

    #[test]
    fn exposure_ratio_rescales_to_one_to_five() {
        let rec = record(&[
            ("E1_sms_reminder", json!("yes")),
            ("E1_poster", json!("no")),
        ]);
        // 1 of 2 valid exposures: 0.5 * 4 + 1 = 3
        assert_eq!(derive_prompt_index(&rec, SIGNAL_CHANNELS), Some(3.0));
    }

    #[test]
    fn full_exposure_is_five() {
        let rec = record(&[
            ("E1_sms_reminder", json!(1)),
            ("E1_poster", json!(true)),
            ("E1_radio_message", json!("yes")),
        ]);
        assert_eq!(derive_prompt_index(&rec, SIGNAL_CHANNELS), Some(5.0));
    }

    #[test]
    fn prompt_index_falls_back_to_likelihood_question() {
        let rec = record(&[("E2", json!("Likely"))]);
        assert_eq!(derive_prompt_index(&rec, SIGNAL_CHANNELS), Some(4.0));
    }

    #[test]
    fn prompt_index_is_null_without_any_signal() {
        let rec = record(&[("unrelated", json!("x"))]);
        assert_eq!(derive_prompt_index(&rec, SIGNAL_CHANNELS), None);
    }

    #[test]
    fn current_use_direct_and_fallback() {
        assert_eq!(derive_current_use(&record(&[("B2", json!("yes"))])), Some(true));
        assert_eq!(derive_current_use(&record(&[("B2", json!("No"))])), Some(false));
        assert_eq!(derive_current_use(&record(&[("B2", json!("not sure"))])), None);
        // Unresolvable B2, but a non-empty method answer implies use.
        assert_eq!(
            derive_current_use(&record(&[("B3", json!("paper register"))])),
            Some(true)
        );
        assert_eq!(derive_current_use(&record(&[("B3", json!("  "))])), None);
    }
}
