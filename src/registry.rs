//! Questionnaire registry
//!
//! Static catalog of survey questions and their choice lists. The resolver
//! uses it for semantic field matching: a raw header that carries the tokens
//! of a question's id, text, or one of its choice labels can be mapped back
//! to that question even when no configured column name matches.
//!
//! The registry is immutable, process-wide data. It is never mutated after
//! startup and is safe for concurrent reads.

use serde::Serialize;

/// Question response type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Open,
    Number,
    Single,
    Multi,
    Matrix,
    Note,
}

/// One option in a Likert or categorical choice list
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChoiceOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Ordered option set for one question
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChoiceList {
    pub id: &'static str,
    pub options: &'static [ChoiceOption],
}

/// One questionnaire entry
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Question {
    pub id: &'static str,
    pub text: &'static str,
    pub kind: QuestionKind,
    /// Id of the choice list this question draws from, if any
    pub choices: Option<&'static str>,
}

/// Look up a question by id (case-insensitive)
pub fn question(id: &str) -> Option<&'static Question> {
    QUESTIONS.iter().find(|q| q.id.eq_ignore_ascii_case(id))
}

/// Look up a choice list by id
pub fn choice_list(id: &str) -> Option<&'static ChoiceList> {
    CHOICE_LISTS.iter().find(|c| c.id == id)
}

/// The choice list attached to a question, if it has one
pub fn choices_for(question_id: &str) -> Option<&'static ChoiceList> {
    question(question_id)?.choices.and_then(choice_list)
}

macro_rules! options {
    ($(($value:expr, $label:expr)),+ $(,)?) => {
        &[$(ChoiceOption { value: $value, label: $label }),+]
    };
}

pub static CHOICE_LISTS: &[ChoiceList] = &[
    ChoiceList {
        id: "yes_no",
        options: options![("yes", "Yes"), ("no", "No")],
    },
    ChoiceList {
        id: "role",
        options: options![
            ("frontline", "Frontline worker"),
            ("supervisor", "Supervisor"),
            ("manager", "Program manager"),
            ("other", "Other"),
        ],
    },
    ChoiceList {
        id: "likert_amount",
        options: options![
            ("1", "Not at all"),
            ("2", "A little"),
            ("3", "Moderately"),
            ("4", "Quite a bit"),
            ("5", "Extremely"),
        ],
    },
    ChoiceList {
        id: "likert_importance",
        options: options![
            ("1", "Not at all important"),
            ("2", "Slightly important"),
            ("3", "Moderately important"),
            ("4", "Important"),
            ("5", "Very much"),
        ],
    },
    ChoiceList {
        id: "likert_enjoyment",
        options: options![
            ("1", "Not at all enjoyable"),
            ("2", "Not very enjoyable"),
            ("3", "Neutral"),
            ("4", "Enjoyable"),
            ("5", "Very enjoyable"),
        ],
    },
    ChoiceList {
        id: "likert_acceptance",
        options: options![
            ("1", "Not accepted"),
            ("2", "Rarely accepted"),
            ("3", "Mixed"),
            ("4", "Somewhat accepted"),
            ("5", "Fully accepted"),
        ],
    },
    ChoiceList {
        id: "likert_ease",
        options: options![
            ("1", "Very difficult"),
            ("2", "Difficult"),
            ("3", "Neither easy nor difficult"),
            ("4", "Easy"),
            ("5", "Very easy"),
        ],
    },
    ChoiceList {
        id: "likert_confidence",
        options: options![
            ("1", "Not at all confident"),
            ("2", "Not confident"),
            ("3", "Moderately confident"),
            ("4", "Confident"),
            ("5", "Very confident"),
        ],
    },
    ChoiceList {
        id: "likert_likelihood",
        options: options![
            ("1", "Very unlikely"),
            ("2", "Unlikely"),
            ("3", "Neither likely nor unlikely"),
            ("4", "Likely"),
            ("5", "Very likely"),
        ],
    },
    ChoiceList {
        id: "likert_commonality",
        options: options![
            ("1", "Very rare"),
            ("2", "Uncommon"),
            ("3", "Mixed"),
            ("4", "Common"),
            ("5", "Very common"),
        ],
    },
    ChoiceList {
        id: "likert_support",
        options: options![
            ("1", "Not at all"),
            ("2", "Not supportive"),
            ("3", "Neutral"),
            ("4", "Supportive"),
            ("5", "Very supportive"),
        ],
    },
    ChoiceList {
        id: "likert_reliability",
        options: options![
            ("1", "Not at all"),
            ("2", "Unreliable"),
            ("3", "Mixed"),
            ("4", "Reliable"),
            ("5", "Very reliable"),
        ],
    },
    ChoiceList {
        id: "likert_quality",
        options: options![
            ("1", "Very poorly"),
            ("2", "Poorly"),
            ("3", "Moderately"),
            ("4", "Well"),
            ("5", "Very well"),
        ],
    },
    ChoiceList {
        id: "e1_channels",
        options: options![
            ("home_visit", "Home visit from a support worker"),
            ("training_session", "Hands-on training session"),
            ("peer_demo", "Demonstration by a colleague or peer"),
            ("success_story", "Success story shared by another user"),
            ("supervisor_message", "Encouragement from a supervisor"),
            ("sms_reminder", "SMS or app reminder"),
            ("poster", "Poster or leaflet at your workplace"),
            ("radio_message", "Radio or community announcement"),
            ("no_prompts", "I have not received any prompts"),
        ],
    },
];

pub static QUESTIONS: &[Question] = &[
    Question {
        id: "A1",
        text: "What is your role?",
        kind: QuestionKind::Single,
        choices: Some("role"),
    },
    Question {
        id: "A2",
        text: "How many years have you worked in your current position?",
        kind: QuestionKind::Number,
        choices: None,
    },
    Question {
        id: "B1",
        text: "Had you heard of the system before today?",
        kind: QuestionKind::Single,
        choices: Some("yes_no"),
    },
    Question {
        id: "B2",
        text: "Are you currently using the system in your day-to-day work?",
        kind: QuestionKind::Single,
        choices: Some("yes_no"),
    },
    Question {
        id: "B3",
        text: "Which tool or method do you currently use for this task?",
        kind: QuestionKind::Open,
        choices: None,
    },
    Question {
        id: "C1",
        text: "How much do you want to use the system for this task?",
        kind: QuestionKind::Single,
        choices: Some("likert_amount"),
    },
    Question {
        id: "C2",
        text: "How important is it to you personally to use the system?",
        kind: QuestionKind::Single,
        choices: Some("likert_importance"),
    },
    Question {
        id: "C3",
        text: "How enjoyable do you find working with the system?",
        kind: QuestionKind::Single,
        choices: Some("likert_enjoyment"),
    },
    Question {
        id: "C4",
        text: "How accepted is using the system among the people you work with?",
        kind: QuestionKind::Single,
        choices: Some("likert_acceptance"),
    },
    Question {
        id: "D1",
        text: "How easy is it for you to access the system when you need it?",
        kind: QuestionKind::Single,
        choices: Some("likert_ease"),
    },
    Question {
        id: "D2",
        text: "How confident are you in your ability to use the system without help?",
        kind: QuestionKind::Single,
        choices: Some("likert_confidence"),
    },
    Question {
        id: "D3",
        text: "How easy is it to fit the system into your daily routine?",
        kind: QuestionKind::Single,
        choices: Some("likert_ease"),
    },
    Question {
        id: "D4",
        text: "How manageable are the time and cost of using the system?",
        kind: QuestionKind::Single,
        choices: Some("likert_ease"),
    },
    Question {
        id: "D5",
        text: "How easy is it to get help when the system does not work as expected?",
        kind: QuestionKind::Single,
        choices: Some("likert_ease"),
    },
    Question {
        id: "D6",
        text: "How easy is it to explain the system to someone else?",
        kind: QuestionKind::Single,
        choices: Some("likert_ease"),
    },
    Question {
        id: "E1",
        text: "In the past three months, which reminders or encouragements about the system have you received?",
        kind: QuestionKind::Multi,
        choices: Some("e1_channels"),
    },
    Question {
        id: "E2",
        text: "How likely are you to act on a reminder about the system when you receive one?",
        kind: QuestionKind::Single,
        choices: Some("likert_likelihood"),
    },
    Question {
        id: "F1",
        text: "How common is it for people like you to use the system?",
        kind: QuestionKind::Single,
        choices: Some("likert_commonality"),
    },
    Question {
        id: "F2",
        text: "How supportive are your supervisors and peers of you using the system?",
        kind: QuestionKind::Single,
        choices: Some("likert_support"),
    },
    Question {
        id: "G1",
        text: "How reliable is the system when you use it?",
        kind: QuestionKind::Single,
        choices: Some("likert_reliability"),
    },
    Question {
        id: "G2",
        text: "How well does the system work with the tools you already use?",
        kind: QuestionKind::Single,
        choices: Some("likert_quality"),
    },
    Question {
        id: "G3",
        text: "How ready is your workplace infrastructure (power, connectivity, devices) for the system?",
        kind: QuestionKind::Single,
        choices: Some("likert_quality"),
    },
];

/// Motivation composite constituents
pub const MOTIVATION_QUESTIONS: &[&str] = &["C1", "C2", "C3", "C4"];

/// Ability composite constituents
pub const ABILITY_QUESTIONS: &[&str] = &["D1", "D2", "D3", "D4", "D5", "D6"];

/// System readiness composite constituents
pub const SYSTEM_READINESS_QUESTIONS: &[&str] = &["G1", "G2", "G3"];

/// Single-question metrics
pub const DESCRIPTIVE_NORMS_QUESTION: &str = "F1";
pub const INJUNCTIVE_NORMS_QUESTION: &str = "F2";
pub const CURRENT_USE_QUESTION: &str = "B2";
pub const METHOD_IN_USE_QUESTION: &str = "B3";
pub const PROMPT_LIKELIHOOD_QUESTION: &str = "E2";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert!(question("c2").is_some());
        assert!(question("C2").is_some());
        assert!(question("Z9").is_none());
    }

    #[test]
    fn every_composite_constituent_is_registered() {
        for id in MOTIVATION_QUESTIONS
            .iter()
            .chain(ABILITY_QUESTIONS)
            .chain(SYSTEM_READINESS_QUESTIONS)
        {
            assert!(question(id).is_some(), "missing question {id}");
        }
    }

    #[test]
    fn every_choice_reference_resolves() {
        for q in QUESTIONS {
            if let Some(list_id) = q.choices {
                assert!(choice_list(list_id).is_some(), "missing list {list_id}");
            }
        }
    }

    #[test]
    fn likert_lists_are_five_point() {
        for list in CHOICE_LISTS.iter().filter(|l| l.id.starts_with("likert_")) {
            assert_eq!(list.options.len(), 5, "list {} is not 5-point", list.id);
        }
    }
}
