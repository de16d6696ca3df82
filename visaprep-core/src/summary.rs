//! End-of-session report.

use crate::error::{Error, Result};
use crate::grading::rubric::{Criterion, RED_FLAG_UP_TO, STRONG_FROM, WEAK_UP_TO};
use crate::types::{AnalysisResponse, Session, SessionSummary};
use chrono::Utc;

/// Aggregate every graded answer of `session` into a summary.
///
/// Answers whose grading failed are skipped. Returns [`Error::NoAnswers`]
/// when nothing was graded.
pub fn summarize(session: &Session) -> Result<SessionSummary> {
    let analyses: Vec<&AnalysisResponse> = session
        .answers
        .iter()
        .filter_map(|a| a.analysis.as_ref())
        .collect();

    if analyses.is_empty() {
        return Err(Error::NoAnswers(session.id.clone()));
    }

    let total: i32 = analyses.iter().map(|a| a.scores.total_score).sum();
    let average_score = f64::from(total) / analyses.len() as f64;

    Ok(SessionSummary {
        session_id: session.id.clone(),
        total_questions: analyses.len(),
        average_score,
        overall_grade: grade_from_score(average_score as i32).to_string(),
        strong_areas: recurring(&analyses, |s| s >= STRONG_FROM),
        weak_areas: recurring(&analyses, |s| s <= WEAK_UP_TO),
        common_red_flags: red_flags(&analyses),
        recommendation: recommendation(average_score).to_string(),
        completed_at: Utc::now(),
    })
}

/// Letter grade for a (truncated) average total.
pub fn grade_from_score(score: i32) -> &'static str {
    match score {
        s if s >= 15 => "A",
        s if s >= 13 => "B",
        s if s >= 11 => "C",
        _ => "D",
    }
}

/// Advice for an average total.
pub fn recommendation(average_score: f64) -> &'static str {
    if average_score >= 15.0 {
        "Excellent performance! You're well-prepared. Stay confident and keep your delivery natural during the actual interview."
    } else if average_score >= 13.0 {
        "Good foundation. Review the feedback for each answer and practice the improved versions, aiming to be more specific and confident."
    } else if average_score >= 11.0 {
        "You need more practice. Give specific examples, show strong ties to your home country, and state clear post-graduation plans."
    } else if average_score >= 8.0 {
        "Significant improvement needed. Work through the weak areas one at a time and consider practicing with an advisor."
    } else {
        "Major revision required. Rebuild your answers around why this program, how it is funded, and what brings you home afterwards."
    }
}

/// Criteria whose score matched `pred` in at least half of the analyses.
fn recurring(analyses: &[&AnalysisResponse], pred: impl Fn(i32) -> bool) -> Vec<String> {
    Criterion::ALL
        .iter()
        .filter(|c| {
            let count = analyses.iter().filter(|a| pred(c.score(&a.scores))).count();
            count > 0 && count * 2 >= analyses.len()
        })
        .map(|c| c.label().to_string())
        .collect()
}

fn red_flags(analyses: &[&AnalysisResponse]) -> Vec<String> {
    Criterion::ALL
        .iter()
        .filter(|c| {
            analyses
                .iter()
                .any(|a| c.score(&a.scores) <= RED_FLAG_UP_TO)
        })
        .map(|c| c.red_flag().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnalysisScores, Answer, Level, Scores, SessionStatus};

    fn session(scores: &[Option<(i32, i32, i32)>]) -> Session {
        let now = Utc::now();
        Session {
            id: "summary-session".to_string(),
            user_id: None,
            level: Level::Easy,
            current_question: String::new(),
            selected_questions: Vec::new(),
            question_index: scores.len(),
            answers: scores
                .iter()
                .enumerate()
                .map(|(i, s)| Answer {
                    question_id: format!("q{i}"),
                    question_text: String::new(),
                    text: "answer".to_string(),
                    created_at: now,
                    analysis: s.map(|(a, b, c)| AnalysisResponse {
                        scores: AnalysisScores::new(a, b, c),
                        classification: String::new(),
                        feedback: Default::default(),
                    }),
                    eval: None,
                })
                .collect(),
            scores: Scores::default(),
            status: SessionStatus::Finished,
            created_at: now,
            updated_at: now,
            summary: None,
        }
    }

    #[test]
    fn test_no_graded_answers_is_error() {
        let err = summarize(&session(&[None, None])).unwrap_err();
        assert!(matches!(err, Error::NoAnswers(_)));
    }

    #[test]
    fn test_average_over_graded_answers_only() {
        // 14 and 13, one ungraded
        let summary = summarize(&session(&[Some((5, 5, 4)), None, Some((5, 4, 4))])).unwrap();
        assert_eq!(summary.total_questions, 2);
        assert_eq!(summary.average_score, 13.5);
        assert_eq!(summary.overall_grade, "B");
    }

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(grade_from_score(15), "A");
        assert_eq!(grade_from_score(14), "B");
        assert_eq!(grade_from_score(13), "B");
        assert_eq!(grade_from_score(12), "C");
        assert_eq!(grade_from_score(11), "C");
        assert_eq!(grade_from_score(10), "D");
        assert_eq!(grade_from_score(3), "D");
    }

    #[test]
    fn test_recommendation_bands_are_distinct() {
        let texts = [15.0, 13.0, 11.0, 8.0, 5.0].map(recommendation);
        for (i, a) in texts.iter().enumerate() {
            for b in &texts[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(recommendation(14.9), recommendation(13.0));
        assert!(recommendation(7.9).starts_with("Major revision required"));
    }

    #[test]
    fn test_strengths_weaknesses_and_flags() {
        let summary = summarize(&session(&[
            Some((5, 2, 4)),
            Some((5, 3, 4)),
            Some((4, 4, 1)),
        ]))
        .unwrap();

        assert_eq!(
            summary.strong_areas,
            vec!["No immigration intent", "Appropriate answer length"]
        );
        assert_eq!(summary.weak_areas, vec!["Clear understanding of academic goals"]);
        assert_eq!(
            summary.common_red_flags,
            vec!["Unclear academic goals", "Poor answer structure or length"]
        );
    }

    #[test]
    fn test_single_answer_half_rule() {
        let summary = summarize(&session(&[Some((5, 5, 5))])).unwrap();
        assert_eq!(summary.strong_areas.len(), 3);
        assert!(summary.weak_areas.is_empty());
        assert!(summary.common_red_flags.is_empty());
        assert_eq!(summary.overall_grade, "A");
    }
}
