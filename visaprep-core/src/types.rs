//! Core domain types for visaprep
//!
//! These types describe one mock interview: the questions selected for it,
//! the answers given, the grader's verdicts, and the cumulative risk scores.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Session** | One complete attempt at the mock interview, first question to completion |
//! | **Rubric** | The fixed criteria and thresholds the grader applies to one answer |
//! | **Analysis** | The grader's structured verdict for one answer |
//! | **Score Delta** | The signed adjustment applied to session risk buckets after one answer |
//! | **Follow-up** | An extra question asked when an answer is not specific enough |
//!
//! All JSON field names are snake_case; these types are the wire shapes
//! returned to callers of the interview engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::EvalResult;

// ============================================
// Questions
// ============================================

/// One interview question.
///
/// Questions are copied by value into each session; nothing shares a mutable
/// question across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Stable id, e.g. `q3_University_Choice` or `q0_college`
    pub id: String,
    /// Category name from the question bank (e.g. "Purpose of Study")
    pub category: String,
    /// Full question text
    pub text: String,
    /// Linear next question in the graph model ("" or "end" terminate)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub next_id: String,
    /// Follow-up question ids allowed after this question (graph model)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub followup_candidates: Vec<String>,
}

impl Question {
    pub fn new(id: impl Into<String>, category: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            text: text.into(),
            next_id: String::new(),
            followup_candidates: Vec::new(),
        }
    }
}

/// Interview difficulty, deciding how many questions are drawn per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// One question from each of four core categories
    Easy,
    /// One question from every category
    Medium,
    /// The full selection-rule table
    #[default]
    Hard,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Easy => "easy",
            Level::Medium => "medium",
            Level::Hard => "hard",
        }
    }

    /// Parse a level string, falling back to [`Level::Hard`] for anything
    /// unrecognized (including the empty string).
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Level::Easy),
            "medium" => Ok(Level::Medium),
            "hard" => Ok(Level::Hard),
            other => Err(format!("unknown level: {}", other)),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// Grader verdict
// ============================================

/// Sub-scores of the 3-criteria rubric (each 1–5, total 3–15).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalysisScores {
    pub migration_intent: i32,
    pub goal_understanding: i32,
    pub answer_length: i32,
    pub total_score: i32,
}

impl AnalysisScores {
    /// Build scores with the total derived from the three criteria.
    pub fn new(migration_intent: i32, goal_understanding: i32, answer_length: i32) -> Self {
        Self {
            migration_intent,
            goal_understanding,
            answer_length,
            total_score: migration_intent + goal_understanding + answer_length,
        }
    }

    pub fn criteria_sum(&self) -> i32 {
        self.migration_intent + self.goal_understanding + self.answer_length
    }
}

/// Per-criterion explanation text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeedbackByCriterion {
    #[serde(default)]
    pub migration_intent: String,
    #[serde(default)]
    pub goal_understanding: String,
    #[serde(default)]
    pub answer_length: String,
}

/// Structured feedback attached to a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructuredFeedback {
    /// 1–3 sentence summary
    #[serde(default)]
    pub overall: String,
    #[serde(default)]
    pub by_criterion: FeedbackByCriterion,
    /// Actionable improvement suggestions
    #[serde(default)]
    pub improvements: Vec<String>,
}

impl StructuredFeedback {
    /// All feedback text joined with spaces, for keyword heuristics.
    pub fn full_text(&self) -> String {
        let mut parts: Vec<&str> = vec![
            self.overall.as_str(),
            self.by_criterion.migration_intent.as_str(),
            self.by_criterion.goal_understanding.as_str(),
            self.by_criterion.answer_length.as_str(),
        ];
        parts.extend(self.improvements.iter().map(String::as_str));
        parts
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The grader's verdict for one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub scores: AnalysisScores,
    /// Excellent, Good, Average or Weak
    #[serde(default)]
    pub classification: String,
    #[serde(default)]
    pub feedback: StructuredFeedback,
}

// ============================================
// Session
// ============================================

/// Cumulative risk buckets for a session.
///
/// Each bucket is the sum of the deltas applied so far and may go up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scores {
    pub academic: i32,
    pub financial: i32,
    pub intent_to_return: i32,
    pub overall_risk: i32,
}

/// One student response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    /// Snapshot of the question text at answer time
    pub question_text: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Grader verdict, absent when grading failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResponse>,
    /// Internal score model derived from the verdict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval: Option<EvalResult>,
}

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Finished,
    Aborted,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Finished => "finished",
            SessionStatus::Aborted => "aborted",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State of one full interview attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub level: Level,
    /// Id of `selected_questions[question_index]` while active, empty once finished
    pub current_question: String,
    pub selected_questions: Vec<Question>,
    pub question_index: usize,
    pub answers: Vec<Answer>,
    pub scores: Scores,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<SessionSummary>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// The question under the cursor, if any remain.
    pub fn current(&self) -> Option<&Question> {
        self.selected_questions.get(self.question_index)
    }

    /// Look up a selected question by id.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.selected_questions.iter().find(|q| q.id == id)
    }

    /// Whether an answer for this question id was already recorded.
    pub fn has_answered(&self, question_id: &str) -> bool {
        self.answers.iter().any(|a| a.question_id == question_id)
    }

    /// Number of answers carrying a grader verdict.
    pub fn graded_answers(&self) -> usize {
        self.answers.iter().filter(|a| a.analysis.is_some()).count()
    }
}

/// Overall assessment of a completed interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub total_questions: usize,
    pub average_score: f64,
    pub overall_grade: String,
    pub strong_areas: Vec<String>,
    pub weak_areas: Vec<String>,
    pub common_red_flags: Vec<String>,
    pub recommendation: String,
    pub completed_at: DateTime<Utc>,
}
