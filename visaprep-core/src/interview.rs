//! Interview orchestration.
//!
//! [`Interview`] drives a session through its selected question list:
//!
//! 1. `create_session` selects questions for the level and stores the session
//! 2. `submit_answer` records an answer, grades it, applies the score delta
//!    and moves the cursor
//! 3. once the list is exhausted the session is finished and summarized
//!
//! Grading is fail-open: when the grader errors the answer is kept without a
//! verdict and the interview continues.
//!
//! Concurrent submissions to the *same* session are not serialized here;
//! callers that share a session across threads must do that themselves.

use crate::api::{
    grade_for_classification, ChatRequest, ChatResponse, CreateSessionRequest,
    CreateSessionResponse, SubmitAnswerRequest, SubmitAnswerResponse,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::grading::Grader;
use crate::questions::QuestionBank;
use crate::scoring::{self, ScoringPolicy};
use crate::store::SessionStore;
use crate::summary;
use crate::types::{AnalysisResponse, Answer, Level, Session, SessionStatus};
use chrono::Utc;

/// The interview engine.
///
/// All operations are blocking. With the HTTP grader from
/// [`Interview::from_config`] they must not be called from inside a tokio
/// runtime; async callers go through `tokio::task::spawn_blocking`.
pub struct Interview {
    store: SessionStore,
    bank: QuestionBank,
    grader: Grader,
    policy: ScoringPolicy,
}

impl Interview {
    pub fn new(store: SessionStore, bank: QuestionBank, grader: Grader, policy: ScoringPolicy) -> Self {
        Self {
            store,
            bank,
            grader,
            policy,
        }
    }

    /// Build an engine with the HTTP grader described by `config`.
    pub fn from_config(config: &Config, bank: QuestionBank) -> Result<Self> {
        let grader = Grader::from_config(&config.grader)?;
        Ok(Self::new(
            SessionStore::new(config.store),
            bank,
            grader,
            config.scoring,
        ))
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Snapshot of a stored session.
    pub fn session(&self, session_id: &str) -> Result<Session> {
        self.store
            .get(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    /// Start a session and return its first question.
    pub fn create_session(&self, req: CreateSessionRequest) -> Result<CreateSessionResponse> {
        let session = self.start_session(req.user_id.clone(), req.level())?;
        let first = session
            .current()
            .ok_or_else(|| Error::QuestionNotFound(session.current_question.clone()))?;

        Ok(CreateSessionResponse {
            session_id: session.id.clone(),
            question_id: first.id.clone(),
            question_text: first.text.clone(),
            total_questions: session.selected_questions.len(),
        })
    }

    fn start_session(&self, user_id: Option<String>, level: Level) -> Result<Session> {
        let mut session = self.store.create(user_id, level);
        session.selected_questions = self.bank.select(level);

        let first_id = session
            .selected_questions
            .first()
            .map(|q| q.id.clone())
            .ok_or_else(|| Error::Config("question selection is empty".to_string()))?;
        session.current_question = first_id;
        self.store.save(&mut session);

        tracing::info!(
            session_id = %session.id,
            level = %level,
            questions = session.selected_questions.len(),
            "Interview session started"
        );
        Ok(session)
    }

    /// Record an answer for the session's current question.
    pub fn submit_answer(
        &self,
        session_id: &str,
        req: SubmitAnswerRequest,
    ) -> Result<SubmitAnswerResponse> {
        self.submit(session_id, &req).map(|(_, resp)| resp)
    }

    fn submit(&self, session_id: &str, req: &SubmitAnswerRequest) -> Result<(Session, SubmitAnswerResponse)> {
        req.validate()?;
        let mut session = self.session(session_id)?;

        if !session.is_active() {
            let resp = state_response(&session, None);
            return Ok((session, resp));
        }

        let question = session
            .question(&req.question_id)
            .cloned()
            .ok_or_else(|| Error::QuestionNotFound(req.question_id.clone()))?;

        if session.has_answered(&question.id) {
            tracing::debug!(session_id, question_id = %question.id, "Duplicate answer ignored");
            if session.current().is_some_and(|q| session.has_answered(&q.id)) {
                skip_answered(&mut session);
                self.store.save(&mut session);
            }
            let resp = state_response(&session, None);
            return Ok((session, resp));
        }

        if question.id != session.current_question {
            return Err(Error::Validation(format!(
                "question {} is not the current question ({})",
                question.id, session.current_question
            )));
        }

        let analysis = match self.grader.analyze(&session, &question.text, &req.answer) {
            Ok(analysis) => Some(analysis),
            Err(e) if e.is_grading() => {
                tracing::warn!(
                    session_id,
                    question_id = %question.id,
                    error = %e,
                    "Grading failed, recording answer without analysis"
                );
                None
            }
            Err(e) => return Err(e),
        };

        let eval = analysis
            .as_ref()
            .map(|a| scoring::apply_analysis(&mut session, a, &question, &self.policy));

        session.answers.push(Answer {
            question_id: question.id.clone(),
            question_text: question.text.clone(),
            text: req.answer.clone(),
            created_at: Utc::now(),
            analysis: analysis.clone(),
            eval,
        });

        advance(&mut session);
        self.store.save(&mut session);

        let resp = state_response(&session, analysis);
        Ok((session, resp))
    }

    /// Conversational variant of create + submit.
    ///
    /// An absent or unknown `session_id` starts a new session and returns its
    /// first question. Otherwise the last `user` message answers the current
    /// question.
    pub fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
        let existing = req
            .session_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .and_then(|id| self.store.get(id));

        let session = match existing {
            Some(session) => session,
            None => {
                let session = self.start_session(None, Level::parse_or_default(&req.level))?;
                let first = session
                    .current()
                    .ok_or_else(|| Error::QuestionNotFound(session.current_question.clone()))?;
                return Ok(ChatResponse {
                    content: first.text.clone(),
                    session_id: session.id.clone(),
                    question_id: first.id.clone(),
                    is_new_session: true,
                    ..Default::default()
                });
            }
        };

        if !session.is_active() {
            return Ok(finished_chat(&session, None));
        }

        let answer = match req.last_user_message() {
            Some(answer) => answer.to_string(),
            None if req.messages.is_empty() => {
                let current = session
                    .current()
                    .ok_or_else(|| Error::QuestionNotFound(session.current_question.clone()))?;
                return Ok(ChatResponse {
                    content: current.text.clone(),
                    session_id: session.id.clone(),
                    question_id: current.id.clone(),
                    scores: Some(session.scores),
                    ..Default::default()
                });
            }
            None => return Err(Error::Validation("no user message found".to_string())),
        };

        let submit = SubmitAnswerRequest {
            question_id: session.current_question.clone(),
            answer,
        };
        let (session, resp) = self.submit(&session.id, &submit)?;

        if resp.finished {
            return Ok(finished_chat(&session, resp.analysis));
        }

        let grade = resp
            .analysis
            .as_ref()
            .map(|a| grade_for_classification(&a.classification).to_string())
            .unwrap_or_default();
        let suggestions = resp
            .analysis
            .as_ref()
            .map(|a| a.feedback.improvements.clone())
            .unwrap_or_default();

        Ok(ChatResponse {
            content: resp.next_question_text.unwrap_or_default(),
            session_id: session.id,
            question_id: resp.next_question_id.unwrap_or_default(),
            finished: false,
            scores: Some(resp.scores),
            is_new_session: false,
            analysis: resp.analysis,
            grade,
            suggestions,
        })
    }

    /// End an active session early. Terminal sessions are returned unchanged.
    pub fn abort_session(&self, session_id: &str) -> Result<Session> {
        let mut session = self.session(session_id)?;
        if session.is_active() {
            session.status = SessionStatus::Aborted;
            session.current_question.clear();
            self.store.save(&mut session);
            tracing::info!(session_id, answers = session.answers.len(), "Interview session aborted");
        }
        Ok(session)
    }
}

/// Move the cursor past the current question, finishing when none remain.
fn advance(session: &mut Session) {
    session.question_index += 1;
    sync_cursor(session);
}

/// Move the cursor past questions that already have answers.
fn skip_answered(session: &mut Session) {
    while session.current().is_some_and(|q| session.has_answered(&q.id)) {
        session.question_index += 1;
    }
    sync_cursor(session);
}

fn sync_cursor(session: &mut Session) {
    match session.current().map(|q| q.id.clone()) {
        Some(id) => session.current_question = id,
        None => finish(session),
    }
}

fn finish(session: &mut Session) {
    session.status = SessionStatus::Finished;
    session.current_question.clear();
    session.summary = match summary::summarize(session) {
        Ok(summary) => Some(summary),
        Err(e) => {
            tracing::debug!(session_id = %session.id, error = %e, "No summary for session");
            None
        }
    };
    tracing::info!(
        session_id = %session.id,
        answers = session.answers.len(),
        graded = session.graded_answers(),
        grade = session.summary.as_ref().map(|s| s.overall_grade.as_str()).unwrap_or("-"),
        "Interview session finished"
    );
}

fn state_response(session: &Session, analysis: Option<AnalysisResponse>) -> SubmitAnswerResponse {
    let current = session.current().filter(|_| session.is_active());
    SubmitAnswerResponse {
        next_question_id: current.map(|q| q.id.clone()),
        next_question_text: current.map(|q| q.text.clone()),
        finished: !session.is_active(),
        scores: session.scores,
        current_question: current.map(|q| q.id.clone()),
        analysis,
        summary: session.summary.clone(),
    }
}

fn finished_chat(session: &Session, analysis: Option<AnalysisResponse>) -> ChatResponse {
    let grade = analysis
        .as_ref()
        .map(|a| grade_for_classification(&a.classification).to_string())
        .unwrap_or_default();
    ChatResponse {
        content: completion_message(session),
        session_id: session.id.clone(),
        finished: true,
        scores: Some(session.scores),
        analysis,
        grade,
        ..Default::default()
    }
}

/// Closing message for a terminal session.
///
/// Uses the summary when one exists, otherwise a rough assessment from the
/// average of the four risk buckets.
pub fn completion_message(session: &Session) -> String {
    if session.status == SessionStatus::Aborted {
        return "This practice session was ended before completion. Start a new session whenever you are ready to try again.".to_string();
    }

    if let Some(summary) = &session.summary {
        return format!(
            "Thank you for completing the interview practice session! Your overall grade is: {} (Average Score: {:.1}). {} Good luck with your visa interview!",
            summary.overall_grade, summary.average_score, summary.recommendation
        );
    }

    let s = &session.scores;
    let avg_risk = f64::from(s.academic + s.financial + s.intent_to_return + s.overall_risk) / 4.0;
    let assessment = if avg_risk < 25.0 {
        "excellent"
    } else if avg_risk < 50.0 {
        "good"
    } else if avg_risk < 75.0 {
        "moderate"
    } else {
        "needs improvement"
    };

    format!(
        "Thank you for completing the interview practice session! Your overall assessment is: {}. Keep practicing to improve your answers and confidence. Good luck with your visa interview!",
        assessment
    )
}
