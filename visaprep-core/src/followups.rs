//! Follow-up decision for graph-shaped interviews.
//!
//! A question graph links each [`Question`] to a linear `next_id` and a set of
//! allowed follow-up ids. After an answer is evaluated, [`decide_next`] picks
//! either a follow-up probing the weak area or the linear successor.
//!
//! The interview engine advances through a fixed list instead; this module is
//! the extension point for scripted, branching interviews.

use crate::scoring::{EvalResult, FollowupType};
use crate::types::{Question, Session};

/// Sentinel `next_id` that ends an interview.
pub const END_MARKER: &str = "end";

/// What to ask after the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    Ask(String),
    End,
}

/// Follow-up question ids per follow-up type, in preference order.
pub fn followup_candidates(kind: FollowupType) -> &'static [&'static str] {
    match kind {
        FollowupType::ClarifyPurpose => &["q1f_clarify_purpose"],
        FollowupType::ClarifyUniversity => &["q2f_university_exact"],
        FollowupType::ClarifyFinancial => &["q5f_finance_clarify", "q6f_finance_detail"],
        FollowupType::ClarifyHomeTies => &["q7f_home_country_career", "q8f_ties_detail"],
    }
}

/// Decide the next question after `current` was answered.
///
/// A follow-up is chosen only when the evaluation asks for one, the
/// follow-up is allowed by `current`, and it has not been answered yet.
pub fn decide_next(current: &Question, session: &Session, eval: &EvalResult) -> NextStep {
    if eval.needs_followup {
        if let Some(kind) = eval.suggested_followup {
            let pick = followup_candidates(kind).iter().find(|id| {
                current.followup_candidates.iter().any(|c| c == *id) && !session.has_answered(id)
            });
            if let Some(id) = pick {
                tracing::debug!(from = %current.id, followup = %id, kind = %kind, "Asking follow-up");
                return NextStep::Ask((*id).to_string());
            }
        }
    }

    match current.next_id.as_str() {
        "" | END_MARKER => NextStep::End,
        next => NextStep::Ask(next.to_string()),
    }
}
