//! LLM grading of interview answers.
//!
//! [`Grader`] builds the conversation for one answer (rubric prompt, prior
//! Q/A pairs with their verdicts, then the new pair), sends it through a
//! [`CompletionClient`], and parses the reply into a validated
//! [`AnalysisResponse`].

mod http;
pub mod rubric;

pub use http::HttpCompletionClient;

use crate::config::GraderConfig;
use crate::error::{Error, Result};
use crate::types::{AnalysisResponse, Session};
use serde::{Deserialize, Serialize};

/// One chat message sent to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Chat-completion interface used for grading.
pub trait CompletionClient: Send + Sync {
    /// Send the conversation and return the assistant's reply text.
    fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Create the default HTTP-backed completion client.
pub fn create_completion_client(config: &GraderConfig) -> Result<Box<dyn CompletionClient>> {
    Ok(Box::new(HttpCompletionClient::new(config)?))
}

/// Grades answers with the fixed rubric.
pub struct Grader {
    client: Box<dyn CompletionClient>,
    retry_once: bool,
}

impl Grader {
    pub fn new(client: Box<dyn CompletionClient>) -> Self {
        Self {
            client,
            retry_once: false,
        }
    }

    /// Build a grader backed by the HTTP client.
    pub fn from_config(config: &GraderConfig) -> Result<Self> {
        Ok(Self::new(create_completion_client(config)?).with_retry_once(config.retry_once))
    }

    /// Retry a transient transport failure once, immediately.
    pub fn with_retry_once(mut self, retry_once: bool) -> Self {
        self.retry_once = retry_once;
        self
    }

    /// Grade `answer` to `question` in the context of `session`'s prior answers.
    pub fn analyze(&self, session: &Session, question: &str, answer: &str) -> Result<AnalysisResponse> {
        let messages = build_messages(session, question, answer);
        let raw = match self.client.complete(&messages) {
            Err(e) if self.retry_once && e.is_transient() => {
                tracing::warn!(session_id = %session.id, error = %e, "Grading call failed, retrying once");
                self.client.complete(&messages)?
            }
            other => other?,
        };

        let analysis = parse_analysis(&raw)?;
        tracing::debug!(
            session_id = %session.id,
            total_score = analysis.scores.total_score,
            classification = %analysis.classification,
            "Answer graded"
        );
        Ok(analysis)
    }

    /// Grade a single question/answer pair with no session context.
    pub fn analyze_single(&self, question: &str, answer: &str) -> Result<AnalysisResponse> {
        let messages = vec![
            ChatMessage::system(rubric::SYSTEM_PROMPT),
            ChatMessage::user(format_pair(question, answer)),
        ];
        let raw = self.client.complete(&messages)?;
        parse_analysis(&raw)
    }
}

fn format_pair(question: &str, answer: &str) -> String {
    format!("Question: {}\nStudent's Answer: {}", question, answer)
}

/// Conversation for grading one answer.
///
/// Every prior answer becomes a `user` message, followed by an `assistant`
/// message with its verdict JSON when one exists.
pub fn build_messages(session: &Session, question: &str, answer: &str) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(rubric::SYSTEM_PROMPT)];

    for prev in &session.answers {
        messages.push(ChatMessage::user(format_pair(&prev.question_text, &prev.text)));
        if let Some(analysis) = &prev.analysis {
            match serde_json::to_string(analysis) {
                Ok(json) => messages.push(ChatMessage::assistant(json)),
                Err(e) => {
                    tracing::warn!(question_id = %prev.question_id, error = %e, "Skipping prior verdict")
                }
            }
        }
    }

    messages.push(ChatMessage::user(format_pair(question, answer)));
    messages
}

/// Strip a surrounding markdown code fence, if any.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

/// Parse and validate the grader's reply.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResponse> {
    let content = strip_code_fence(raw);
    let analysis: AnalysisResponse = serde_json::from_str(content)
        .map_err(|e| Error::GradingFormat(format!("failed to parse analysis: {e}")))?;
    validate(analysis)
}

/// Enforce the rubric on a parsed verdict.
///
/// Sub-scores outside 1–5 are rejected. A total that disagrees with the
/// criteria is recomputed, and a missing or unknown classification is
/// derived from the total.
pub fn validate(mut analysis: AnalysisResponse) -> Result<AnalysisResponse> {
    for criterion in rubric::Criterion::ALL {
        let score = criterion.score(&analysis.scores);
        if !(rubric::MIN_CRITERION_SCORE..=rubric::MAX_CRITERION_SCORE).contains(&score) {
            return Err(Error::GradingFormat(format!(
                "{} score {} outside {}..={}",
                criterion.as_str(),
                score,
                rubric::MIN_CRITERION_SCORE,
                rubric::MAX_CRITERION_SCORE
            )));
        }
    }

    let sum = analysis.scores.criteria_sum();
    if analysis.scores.total_score != sum {
        tracing::debug!(
            reported = analysis.scores.total_score,
            computed = sum,
            "Recomputing total score"
        );
        analysis.scores.total_score = sum;
    }

    if !rubric::CLASSIFICATIONS.contains(&analysis.classification.as_str()) {
        analysis.classification = rubric::classify(sum).to_string();
    }

    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnalysisScores, Answer, Level, Scores, SessionStatus};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const GOOD_REPLY: &str = r#"{"scores":{"migration_intent":5,"goal_understanding":4,"answer_length":4,"total_score":13},"classification":"Good","feedback":{"overall":"Solid.","by_criterion":{"migration_intent":"","goal_understanding":"","answer_length":""},"improvements":["Be specific"]}}"#;

    struct MockClient {
        response: String,
        seen: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
    }

    impl CompletionClient for MockClient {
        fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.seen.lock().unwrap().push(messages.to_vec());
            Ok(self.response.clone())
        }
    }

    /// Fails with a 503 the first `failures` times, then answers.
    struct FlakyClient {
        failures: usize,
        calls: AtomicUsize,
    }

    impl CompletionClient for FlakyClient {
        fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(Error::GradingTransport {
                    status: Some(503),
                    message: "unavailable".to_string(),
                })
            } else {
                Ok(GOOD_REPLY.to_string())
            }
        }
    }

    fn empty_session() -> Session {
        let now = Utc::now();
        Session {
            id: "session-grade".to_string(),
            user_id: None,
            level: Level::Easy,
            current_question: "q0_college".to_string(),
            selected_questions: Vec::new(),
            question_index: 0,
            answers: Vec::new(),
            scores: Scores::default(),
            status: SessionStatus::Active,
            created_at: now,
            updated_at: now,
            summary: None,
        }
    }

    fn answer(id: &str, analysis: Option<AnalysisResponse>) -> Answer {
        Answer {
            question_id: id.to_string(),
            question_text: format!("Text of {id}"),
            text: format!("Answer to {id}"),
            created_at: Utc::now(),
            analysis,
            eval: None,
        }
    }

    #[test]
    fn analyze_sends_history_and_parses_reply() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let grader = Grader::new(Box::new(MockClient {
            response: format!("```json\n{GOOD_REPLY}\n```"),
            seen: seen.clone(),
        }));

        let mut session = empty_session();
        let prior = parse_analysis(GOOD_REPLY).unwrap();
        session.answers.push(answer("q0_college", Some(prior)));
        session.answers.push(answer("q0_major", None));

        let analysis = grader
            .analyze(&session, "Why this university?", "Strong AI lab.")
            .unwrap();
        assert_eq!(analysis.scores.total_score, 13);

        let calls = seen.lock().unwrap();
        let roles: Vec<&str> = calls[0].iter().map(|m| m.role.as_str()).collect();
        // system, q0 user + verdict, q0_major user only, new pair
        assert_eq!(roles, vec!["system", "user", "assistant", "user", "user"]);
        assert_eq!(
            calls[0].last().unwrap().content,
            "Question: Why this university?\nStudent's Answer: Strong AI lab."
        );
    }

    #[test]
    fn strip_code_fence_variants() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {}  "), "{}");
    }

    #[test]
    fn parse_rejects_out_of_range_scores() {
        let raw = r#"{"scores":{"migration_intent":6,"goal_understanding":4,"answer_length":4,"total_score":14}}"#;
        let err = parse_analysis(raw).unwrap_err();
        assert!(matches!(err, Error::GradingFormat(_)));

        let raw = r#"{"scores":{"migration_intent":0,"goal_understanding":4,"answer_length":4,"total_score":8}}"#;
        assert!(parse_analysis(raw).is_err());
    }

    #[test]
    fn parse_rejects_prose() {
        let err = parse_analysis("I think this answer is good.").unwrap_err();
        assert!(err.is_grading());
    }

    #[test]
    fn validate_recomputes_total_and_classification() {
        let analysis = AnalysisResponse {
            scores: AnalysisScores {
                migration_intent: 5,
                goal_understanding: 5,
                answer_length: 5,
                total_score: 12,
            },
            classification: "Superb".to_string(),
            feedback: Default::default(),
        };
        let fixed = validate(analysis).unwrap();
        assert_eq!(fixed.scores.total_score, 15);
        assert_eq!(fixed.classification, "Excellent");
    }

    #[test]
    fn validate_keeps_known_classification() {
        let analysis = AnalysisResponse {
            scores: AnalysisScores::new(4, 4, 3),
            classification: "Good".to_string(),
            feedback: Default::default(),
        };
        assert_eq!(validate(analysis).unwrap().classification, "Good");
    }

    #[test]
    fn retry_once_recovers_from_transient_failure() {
        let grader = Grader::new(Box::new(FlakyClient {
            failures: 1,
            calls: AtomicUsize::new(0),
        }))
        .with_retry_once(true);
        assert!(grader.analyze(&empty_session(), "Q", "A").is_ok());
    }

    #[test]
    fn no_retry_by_default() {
        let grader = Grader::new(Box::new(FlakyClient {
            failures: 1,
            calls: AtomicUsize::new(0),
        }));
        let err = grader.analyze(&empty_session(), "Q", "A").unwrap_err();
        assert!(matches!(err, Error::GradingTransport { status: Some(503), .. }));
    }

    #[test]
    fn retry_happens_only_once() {
        let grader = Grader::new(Box::new(FlakyClient {
            failures: 2,
            calls: AtomicUsize::new(0),
        }))
        .with_retry_once(true);
        assert!(grader.analyze(&empty_session(), "Q", "A").is_err());
    }
}
