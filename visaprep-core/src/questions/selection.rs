//! Per-level question selection.
//!
//! Selection is intentionally randomized: each call shuffles every category
//! with a fresh RNG, so two sessions at the same level get different
//! questions. Only the count and category coverage are fixed.

use super::QuestionBank;
use crate::types::{Level, Question};
use rand::seq::SliceRandom;

/// Categories in the order they are asked.
pub const CATEGORY_ORDER: [&str; 7] = [
    "Purpose of Study",
    "Academic Background",
    "University Choice",
    "Financial Capability",
    "Family/Sponsor Info",
    "Post-Graduation Plans",
    "Immigration Intent",
];

/// Full rule table used by the hard (default) level: 12 questions.
const HARD_RULES: [(&str, usize); 7] = [
    ("Purpose of Study", 2),
    ("Academic Background", 2),
    ("University Choice", 2),
    ("Financial Capability", 2),
    ("Family/Sponsor Info", 1),
    ("Post-Graduation Plans", 2),
    ("Immigration Intent", 1),
];

/// Categories drawn once each at the easy level.
const EASY_CATEGORIES: [&str; 4] = [
    "Purpose of Study",
    "University Choice",
    "Financial Capability",
    "Post-Graduation Plans",
];

/// A fixed question asked at the start of every session.
#[derive(Debug, Clone, Copy)]
pub struct MandatoryQuestion {
    pub id: &'static str,
    pub category: &'static str,
    pub text: &'static str,
}

impl MandatoryQuestion {
    fn to_question(self) -> Question {
        Question::new(self.id, self.category, self.text)
    }
}

pub const COLLEGE_QUESTION: MandatoryQuestion = MandatoryQuestion {
    id: "q0_college",
    category: "College",
    text: "Which college or university will you be attending in the United States?",
};

pub const MAJOR_QUESTION: MandatoryQuestion = MandatoryQuestion {
    id: "q0_major",
    category: "Major",
    text: "What will you be studying, and at what degree level?",
};

/// Prepended to every selection, in this order.
pub const MANDATORY_QUESTIONS: [MandatoryQuestion; 2] = [COLLEGE_QUESTION, MAJOR_QUESTION];

/// Per-category draw counts for a level, in asking order.
pub fn selection_rules(level: Level) -> Vec<(&'static str, usize)> {
    match level {
        Level::Hard => HARD_RULES.to_vec(),
        Level::Medium => CATEGORY_ORDER.iter().map(|c| (*c, 1)).collect(),
        Level::Easy => CATEGORY_ORDER
            .iter()
            .filter(|c| EASY_CATEGORIES.contains(c))
            .map(|c| (*c, 1))
            .collect(),
    }
}

/// Pick the question list for a new session.
///
/// Returns the two mandatory questions followed by the level's draws. A
/// category with fewer questions than its rule asks for contributes what it
/// has; an empty category contributes nothing.
pub fn select_for_level(bank: &QuestionBank, level: Level) -> Vec<Question> {
    let mut rng = rand::thread_rng();
    let mut selected: Vec<Question> = MANDATORY_QUESTIONS
        .iter()
        .map(|q| q.to_question())
        .collect();
    let mut ordinal = 0;

    for (category, count) in selection_rules(level) {
        let mut available: Vec<&String> = bank.questions(category).iter().collect();
        if available.is_empty() {
            tracing::warn!(category, "No questions available for category");
            continue;
        }

        available.shuffle(&mut rng);
        let suffix = sanitize_category(category);

        for text in available.into_iter().take(count) {
            ordinal += 1;
            selected.push(Question::new(
                format!("q{}_{}", ordinal, suffix),
                category,
                text.as_str(),
            ));
        }
    }

    tracing::debug!(level = %level, count = selected.len(), "Selected session questions");
    selected
}

/// Convert a category name into an id suffix.
///
/// ASCII letters and digits are kept, spaces and `/` become `_`, everything
/// else is dropped.
pub fn sanitize_category(category: &str) -> String {
    category
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() => Some(c),
            ' ' | '/' => Some('_'),
            _ => None,
        })
        .collect()
}
