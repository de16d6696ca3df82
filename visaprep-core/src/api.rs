//! Request and response shapes for the interview operations.
//!
//! These are the JSON bodies a router layer would accept and return. Field
//! names are snake_case and optional fields are omitted when empty.

use crate::error::{Error, Result};
use crate::grading::ChatMessage;
use crate::types::{AnalysisResponse, Level, Scores, SessionSummary};
use serde::{Deserialize, Serialize};

fn is_false(b: &bool) -> bool {
    !*b
}

/// Start a new interview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Level name; empty or unknown means hard
    #[serde(default)]
    pub level: String,
}

impl CreateSessionRequest {
    pub fn level(&self) -> Level {
        Level::parse_or_default(&self.level)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub question_id: String,
    pub question_text: String,
    pub total_questions: usize,
}

/// One answer to the current question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: String,
    pub answer: String,
}

impl SubmitAnswerRequest {
    pub fn validate(&self) -> Result<()> {
        if self.question_id.trim().is_empty() {
            return Err(Error::Validation("question_id is required".to_string()));
        }
        if self.answer.trim().is_empty() {
            return Err(Error::Validation("answer must not be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitAnswerResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_question_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_question_text: Option<String>,
    pub finished: bool,
    pub scores: Scores,
    /// Question still awaiting an answer, when not finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_question: Option<String>,
    /// Verdict for the answer just submitted, if grading succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<SessionSummary>,
}

/// Conversational entry point: create or continue a session in one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Level for a newly created session
    #[serde(default)]
    pub level: String,
}

impl ChatRequest {
    /// Content of the last `user` message, if any is non-empty.
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .filter(|c| !c.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Next question text or the completion message
    pub content: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub session_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub question_id: String,
    pub finished: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<Scores>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_new_session: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResponse>,
    /// Letter grade for the answer just given
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub grade: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// Letter grade for a verdict classification (A–F), empty when unknown.
pub fn grade_for_classification(classification: &str) -> &'static str {
    match classification.trim().to_ascii_lowercase().as_str() {
        "excellent" => "A",
        "good" => "B",
        "average" => "C",
        "weak" => "D",
        "poor" => "F",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_level_defaults_to_hard() {
        let req: CreateSessionRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.level(), Level::Hard);
        let req: CreateSessionRequest = serde_json::from_str(r#"{"level":"easy"}"#).unwrap();
        assert_eq!(req.level(), Level::Easy);
    }

    #[test]
    fn test_submit_validation() {
        let ok = SubmitAnswerRequest {
            question_id: "q0_college".to_string(),
            answer: "MIT".to_string(),
        };
        assert!(ok.validate().is_ok());

        let blank = SubmitAnswerRequest {
            question_id: "q0_college".to_string(),
            answer: "   ".to_string(),
        };
        assert!(matches!(blank.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_last_user_message_skips_assistant() {
        let req = ChatRequest {
            messages: vec![
                ChatMessage::user("first"),
                ChatMessage::user("second"),
                ChatMessage::assistant("question?"),
            ],
            ..Default::default()
        };
        assert_eq!(req.last_user_message(), Some("second"));

        let none = ChatRequest {
            messages: vec![ChatMessage::assistant("hi")],
            ..Default::default()
        };
        assert_eq!(none.last_user_message(), None);
    }

    #[test]
    fn test_chat_response_omits_empty_fields() {
        let resp = ChatResponse {
            content: "Why the US?".to_string(),
            session_id: "s1".to_string(),
            question_id: "q0_college".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&resp).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.get("finished"), Some(&serde_json::json!(false)));
        assert!(!obj.contains_key("is_new_session"));
        assert!(!obj.contains_key("analysis"));
        assert!(!obj.contains_key("suggestions"));
        assert!(!obj.contains_key("grade"));
    }

    #[test]
    fn test_grade_for_classification() {
        assert_eq!(grade_for_classification("Excellent"), "A");
        assert_eq!(grade_for_classification("good"), "B");
        assert_eq!(grade_for_classification("Average"), "C");
        assert_eq!(grade_for_classification("Weak"), "D");
        assert_eq!(grade_for_classification("Poor"), "F");
        assert_eq!(grade_for_classification("Unknown"), "");
    }
}
