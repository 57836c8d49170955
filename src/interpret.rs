//! Value interpretation
//!
//! Converts one raw cell value into exactly one of {number, boolean, null}.
//! Survey answers arrive as numbers, yes/no strings, or free-text Likert-like
//! phrases; anything unrecognized degrades to null rather than erroring.
//!
//! The Likert inference is an explicit ordered rule table rather than nested
//! conditionals so that precedence is auditable and testable per rule. The
//! ordering is deliberate: specific multi-word phrases run before single-word
//! fallbacks so that, e.g., "not at all confident" never reaches the generic
//! "confident" rule.

use serde_json::Value;

/// Parse a numeric value: finite numbers pass through, numeric strings parse
/// via standard decimal conversion, everything else is None.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Parse a yes/no style value.
///
/// Explicit "not applicable / unknown / unsure / refused"-class answers yield
/// None, distinct from false. Unmatched values also yield None.
pub fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f > 0.0),
        Value::String(s) => parse_bool_str(s),
        _ => None,
    }
}

fn parse_bool_str(s: &str) -> Option<bool> {
    let s = s.trim().to_lowercase();
    if s.is_empty() || is_null_class(&s) {
        return None;
    }
    match s.as_str() {
        "yes" | "true" | "1" | "y" => return Some(true),
        "no" | "false" | "0" | "n" => return Some(false),
        _ => {}
    }
    // Last resort: word-boundary search inside longer answers
    if contains_word(&s, "yes") {
        return Some(true);
    }
    if contains_word(&s, "no") || contains_word(&s, "none") {
        return Some(false);
    }
    if s.contains("not using") || s.contains("not currently") {
        return Some(false);
    }
    if contains_word(&s, "using") && !contains_word(&s, "not") {
        return Some(true);
    }
    None
}

/// Infer a 1-5 Likert score from a raw value.
///
/// Numbers clamp into [1,5] (values in between pass through unclamped).
/// Strings run through the null-class check, a numeric parse, and then the
/// ordered phrase cascade. No match yields None.
pub fn parse_likert(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).map(clamp_likert),
        Value::String(s) => parse_likert_str(s),
        _ => None,
    }
}

fn clamp_likert(n: f64) -> f64 {
    if n <= 0.0 {
        1.0
    } else if n >= 5.0 {
        5.0
    } else {
        n
    }
}

fn parse_likert_str(s: &str) -> Option<f64> {
    let s = s.trim().to_lowercase();
    if s.is_empty() || is_null_class(&s) {
        return None;
    }
    if let Ok(n) = s.parse::<f64>() {
        if n.is_finite() {
            return Some(clamp_likert(n));
        }
    }
    LIKERT_RULES
        .iter()
        .find(|rule| rule.matcher.matches(&s))
        .map(|rule| rule.score)
}

/// Answers that mean "no usable value" for both boolean and Likert parsing,
/// distinct from a negative answer
fn is_null_class(s: &str) -> bool {
    const EXACT: &[&str] = &["n/a", "na", "-", "--"];
    const PHRASES: &[&str] = &[
        "don't know",
        "dont know",
        "do not know",
        "not applicable",
        "not sure",
        "unsure",
        "unknown",
        "refused",
        "prefer not",
        "no answer",
        "can't say",
        "cannot say",
    ];
    EXACT.contains(&s) || PHRASES.iter().any(|p| s.contains(p))
}

/// True when `word` appears in `haystack` bounded by non-alphanumeric
/// characters (or the string edges). The stack carries no regex crate, so
/// this is the word-boundary search used throughout the cascade.
fn contains_word(haystack: &str, word: &str) -> bool {
    let bytes = haystack.as_bytes();
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(word) {
        let begin = start + pos;
        let end = begin + word.len();
        let left_ok = begin == 0 || !bytes[begin - 1].is_ascii_alphanumeric();
        let right_ok = end == bytes.len() || !bytes[end].is_ascii_alphanumeric();
        if left_ok && right_ok {
            return true;
        }
        start = begin + 1;
    }
    false
}

/// How a Likert rule matches a lower-cased answer
enum Matcher {
    /// Substring match, used for multi-word phrases
    Phrase(&'static str),
    /// Whole-word match, used for single-word cues
    Word(&'static str),
}

impl Matcher {
    fn matches(&self, s: &str) -> bool {
        match self {
            Matcher::Phrase(p) => s.contains(p),
            Matcher::Word(w) => contains_word(s, w),
        }
    }
}

struct LikertRule {
    matcher: Matcher,
    score: f64,
}

const fn phrase(p: &'static str, score: f64) -> LikertRule {
    LikertRule {
        matcher: Matcher::Phrase(p),
        score,
    }
}

const fn word(w: &'static str, score: f64) -> LikertRule {
    LikertRule {
        matcher: Matcher::Word(w),
        score,
    }
}

/// The ordered phrase cascade. First matching rule wins.
///
/// Precedence, in order:
/// 1. "somewhat X" positive phrasings (4) and negative phrasings (2)
/// 2. strong-positive cues (5)
/// 3. moderate-positive cues (4)
/// 4. neutral cues (3)
/// 5. moderate-negative cues (2)
/// 6. strong-negative cues (1)
/// 7. domain word pairs, each with a strong/moderate split; within a pair the
///    negated and intensified forms run before the bare word
static LIKERT_RULES: &[LikertRule] = &[
    // 1. "somewhat" phrasings
    phrase("somewhat agree", 4.0),
    phrase("somewhat likely", 4.0),
    phrase("somewhat easy", 4.0),
    phrase("somewhat confident", 4.0),
    phrase("somewhat common", 4.0),
    phrase("somewhat supportive", 4.0),
    phrase("somewhat reliable", 4.0),
    phrase("somewhat important", 4.0),
    phrase("somewhat accepted", 4.0),
    phrase("somewhat interested", 4.0),
    phrase("somewhat ready", 4.0),
    phrase("somewhat enjoyable", 4.0),
    phrase("somewhat well", 4.0),
    phrase("somewhat disagree", 2.0),
    phrase("somewhat unlikely", 2.0),
    phrase("somewhat difficult", 2.0),
    phrase("somewhat hard", 2.0),
    phrase("somewhat uncommon", 2.0),
    phrase("somewhat unreliable", 2.0),
    phrase("somewhat unsupportive", 2.0),
    // 2. strong positive
    phrase("strongly agree", 5.0),
    phrase("very much", 5.0),
    phrase("all the time", 5.0),
    phrase("a great deal", 5.0),
    word("extremely", 5.0),
    word("completely", 5.0),
    word("totally", 5.0),
    word("fully", 5.0),
    word("absolutely", 5.0),
    word("definitely", 5.0),
    word("always", 5.0),
    word("excellent", 5.0),
    // 3. moderate positive
    phrase("quite a bit", 4.0),
    phrase("most of the time", 4.0),
    word("mostly", 4.0),
    word("often", 4.0),
    word("quite", 4.0),
    word("generally", 4.0),
    // 4. neutral
    phrase("in between", 3.0),
    phrase("neither agree nor disagree", 3.0),
    word("neutral", 3.0),
    word("neither", 3.0),
    word("moderately", 3.0),
    word("moderate", 3.0),
    word("average", 3.0),
    word("sometimes", 3.0),
    word("mixed", 3.0),
    word("okay", 3.0),
    // 5. moderate negative
    phrase("not very", 2.0),
    phrase("not really", 2.0),
    phrase("a little", 2.0),
    word("slightly", 2.0),
    word("rarely", 2.0),
    word("seldom", 2.0),
    // 6. strong negative
    phrase("not at all", 1.0),
    phrase("strongly disagree", 1.0),
    phrase("none at all", 1.0),
    word("never", 1.0),
    word("terrible", 1.0),
    // 7. domain word pairs (strong/moderate split per pair)
    word("disagree", 2.0),
    word("agree", 4.0),
    phrase("very unlikely", 1.0),
    word("unlikely", 2.0),
    phrase("very likely", 5.0),
    word("likely", 4.0),
    phrase("very easy", 5.0),
    phrase("much easier", 5.0),
    phrase("very difficult", 1.0),
    phrase("very hard", 1.0),
    phrase("much harder", 1.0),
    word("easier", 4.0),
    word("easy", 4.0),
    word("harder", 2.0),
    word("difficult", 2.0),
    word("hard", 2.0),
    phrase("very common", 5.0),
    phrase("very uncommon", 1.0),
    phrase("very rare", 1.0),
    word("uncommon", 2.0),
    word("rare", 2.0),
    word("common", 4.0),
    phrase("very supportive", 5.0),
    phrase("not supportive", 2.0),
    word("unsupportive", 2.0),
    word("supportive", 4.0),
    phrase("very reliable", 5.0),
    phrase("not reliable", 2.0),
    word("unreliable", 2.0),
    word("reliable", 4.0),
    phrase("very confident", 5.0),
    phrase("not confident", 2.0),
    word("confident", 4.0),
    phrase("very well", 5.0),
    phrase("very poorly", 1.0),
    word("poorly", 2.0),
    word("well", 4.0),
    phrase("very enjoyable", 5.0),
    phrase("not enjoyable", 2.0),
    word("enjoyable", 4.0),
    phrase("widely accepted", 5.0),
    phrase("not accepted", 2.0),
    word("accepted", 4.0),
    phrase("very important", 5.0),
    phrase("not important", 2.0),
    word("unimportant", 2.0),
    word("important", 4.0),
    phrase("very interested", 5.0),
    phrase("not interested", 2.0),
    word("uninterested", 2.0),
    word("interested", 4.0),
    phrase("very willing", 5.0),
    word("unwilling", 2.0),
    word("willing", 4.0),
    phrase("not ready", 2.0),
    word("ready", 4.0),
    phrase("very good", 5.0),
    phrase("very poor", 1.0),
    word("good", 4.0),
    word("poor", 2.0),
];
