//! Score adapter: grader verdict → internal score model.
//!
//! The grader speaks the 3–15 rubric. Session bookkeeping works on a coarser
//! model ([`EvalResult`]): 0–10 quality metrics, a follow-up hint, and a
//! [`ScoreDelta`] applied to the session's cumulative risk buckets.
//!
//! Fixed formulas (with `pct = to_percentage(total_score)` truncated):
//!
//! | Field | Formula |
//! |-------|---------|
//! | quality | `min(pct / 10, 10)` |
//! | clarity | `min(answer_length * 2, 10)` (length is a clarity proxy) |
//! | confidence | `min(goal_understanding * 2, 10)` (goals are a confidence proxy) |
//! | intent_to_return_risk | `max(10 - pct / 10, 0)` |
//! | needs_followup | `pct < followup_below` |
//!
//! The proxies are heuristics, not semantic equivalents.

use crate::error::{Error, Result};
use crate::grading::rubric::{MAX_TOTAL_SCORE, MIN_TOTAL_SCORE};
use crate::types::{AnalysisResponse, Question, Scores, Session};
use serde::{Deserialize, Serialize};

/// Thresholds and magnitudes used to turn a verdict into a score delta.
///
/// Percentages refer to [`to_percentage`] of the verdict's total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScoringPolicy {
    /// Below this percentage an answer needs a follow-up
    #[serde(default = "default_followup_below")]
    pub followup_below: i32,
    /// Below this percentage risk buckets are penalized
    #[serde(default = "default_penalty_below")]
    pub penalty_below: i32,
    /// At or above this percentage risk buckets are reduced
    #[serde(default = "default_reward_from")]
    pub reward_from: i32,
    /// Added to the buckets on a poor answer
    #[serde(default = "default_penalty")]
    pub penalty: i32,
    /// Subtracted from the buckets on a strong answer
    #[serde(default = "default_reward")]
    pub reward: i32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            followup_below: default_followup_below(),
            penalty_below: default_penalty_below(),
            reward_from: default_reward_from(),
            penalty: default_penalty(),
            reward: default_reward(),
        }
    }
}

impl ScoringPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.penalty_below > self.reward_from {
            return Err(Error::Config(
                "scoring.penalty_below must not exceed scoring.reward_from".to_string(),
            ));
        }
        if self.penalty < 0 || self.reward < 0 {
            return Err(Error::Config(
                "scoring.penalty and scoring.reward must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_followup_below() -> i32 {
    70
}

fn default_penalty_below() -> i32 {
    60
}

fn default_reward_from() -> i32 {
    80
}

fn default_penalty() -> i32 {
    5
}

fn default_reward() -> i32 {
    3
}

/// Signed adjustment to the session's risk buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreDelta {
    pub academic: i32,
    pub financial: i32,
    pub intent_to_return: i32,
    pub overall_risk: i32,
}

/// Internal evaluation of one answer, derived from the grader verdict.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvalResult {
    /// 0–10
    pub quality: i32,
    /// 0–10
    pub clarity: i32,
    /// 0–10
    pub confidence: i32,
    pub flags: Vec<String>,
    /// 0–10
    pub intent_to_return_risk: i32,
    #[serde(rename = "suggested_followup_type")]
    pub suggested_followup: Option<FollowupType>,
    pub needs_followup: bool,
    pub score_delta: ScoreDelta,
}

// ============================================
// Follow-up keyword classifier
// ============================================

/// Area a follow-up question should probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowupType {
    ClarifyPurpose,
    ClarifyUniversity,
    ClarifyFinancial,
    ClarifyHomeTies,
}

impl FollowupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowupType::ClarifyPurpose => "clarify_purpose",
            FollowupType::ClarifyUniversity => "clarify_university",
            FollowupType::ClarifyFinancial => "clarify_financial",
            FollowupType::ClarifyHomeTies => "clarify_home_ties",
        }
    }
}

impl std::fmt::Display for FollowupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered keyword table; the first entry with any keyword present wins.
pub const FOLLOWUP_KEYWORDS: [(FollowupType, &[&str]); 4] = [
    (
        FollowupType::ClarifyPurpose,
        &["purpose", "study", "why", "goal"],
    ),
    (
        FollowupType::ClarifyUniversity,
        &["university", "school", "college", "program"],
    ),
    (
        FollowupType::ClarifyFinancial,
        &["financial", "money", "fund", "sponsor", "income"],
    ),
    (
        FollowupType::ClarifyHomeTies,
        &["home", "country", "return", "ties", "family"],
    ),
];

/// Best-effort guess of the follow-up area from free-text feedback.
///
/// Plain case-insensitive substring search over [`FOLLOWUP_KEYWORDS`]. This
/// is a heuristic and is kept apart from the numeric rubric on purpose.
pub fn classify_followup(feedback: &str) -> Option<FollowupType> {
    let lower = feedback.to_lowercase();
    FOLLOWUP_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(kind, _)| *kind)
}

// ============================================
// Conversion
// ============================================

/// Rescale a rubric total onto 0–100.
///
/// Values outside the rubric range are clamped first.
pub fn to_percentage(total_score: i32) -> f64 {
    let clamped = total_score.clamp(MIN_TOTAL_SCORE, MAX_TOTAL_SCORE);
    f64::from(clamped - MIN_TOTAL_SCORE) * 100.0 / f64::from(MAX_TOTAL_SCORE - MIN_TOTAL_SCORE)
}

/// Which cumulative bucket a question category feeds, besides overall risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBucket {
    Academic,
    Financial,
    IntentToReturn,
}

/// Category → bucket lookup. Categories not listed only affect overall risk.
pub fn bucket_for_category(category: &str) -> Option<RiskBucket> {
    match category {
        "Academic Background" => Some(RiskBucket::Academic),
        "Financial Capability" => Some(RiskBucket::Financial),
        "Immigration Intent" | "Post-Graduation Plans" => Some(RiskBucket::IntentToReturn),
        _ => None,
    }
}

/// Score delta for an answer at `percentage` to a question in `category`.
pub fn delta_for(percentage: i32, category: &str, policy: &ScoringPolicy) -> ScoreDelta {
    let amount = if percentage < policy.penalty_below {
        policy.penalty
    } else if percentage >= policy.reward_from {
        -policy.reward
    } else {
        return ScoreDelta::default();
    };

    let mut delta = ScoreDelta {
        overall_risk: amount,
        ..Default::default()
    };
    match bucket_for_category(category) {
        Some(RiskBucket::Academic) => delta.academic = amount,
        Some(RiskBucket::Financial) => delta.financial = amount,
        Some(RiskBucket::IntentToReturn) => delta.intent_to_return = amount,
        None => {}
    }
    delta
}

/// Convert a grader verdict into the internal evaluation model.
pub fn to_eval(analysis: &AnalysisResponse, question: &Question, policy: &ScoringPolicy) -> EvalResult {
    let scores = &analysis.scores;
    let percentage = to_percentage(scores.total_score) as i32;

    let quality = (percentage / 10).min(10);
    let clarity = (scores.answer_length * 2).min(10);
    let confidence = (scores.goal_understanding * 2).min(10);
    let intent_to_return_risk = (10 - percentage / 10).max(0);

    let needs_followup = percentage < policy.followup_below;
    let suggested_followup = if needs_followup {
        classify_followup(&analysis.feedback.full_text())
    } else {
        None
    };

    let mut flags = Vec::new();
    if !analysis.classification.trim().is_empty() {
        flags.push(format!("classification:{}", analysis.classification));
    }
    if !analysis.feedback.overall.trim().is_empty() {
        flags.push(format!("feedback:{}", analysis.feedback.overall));
    }

    EvalResult {
        quality,
        clarity,
        confidence,
        flags,
        intent_to_return_risk,
        suggested_followup,
        needs_followup,
        score_delta: to_delta(analysis, question, policy),
    }
}

/// Score delta for a verdict on `question`.
pub fn to_delta(analysis: &AnalysisResponse, question: &Question, policy: &ScoringPolicy) -> ScoreDelta {
    let percentage = to_percentage(analysis.scores.total_score) as i32;
    delta_for(percentage, &question.category, policy)
}

/// Accumulate a delta into the session's risk buckets.
pub fn apply(session: &mut Session, delta: &ScoreDelta) {
    add(&mut session.scores, delta);
}

fn add(scores: &mut Scores, delta: &ScoreDelta) {
    scores.academic += delta.academic;
    scores.financial += delta.financial;
    scores.intent_to_return += delta.intent_to_return;
    scores.overall_risk += delta.overall_risk;
}

/// Adapt a verdict and fold its delta into the session, returning the evaluation.
pub fn apply_analysis(
    session: &mut Session,
    analysis: &AnalysisResponse,
    question: &Question,
    policy: &ScoringPolicy,
) -> EvalResult {
    let eval = to_eval(analysis, question, policy);
    apply(session, &eval.score_delta);
    eval
}
