//! Error types for visaprep-core

use thiserror::Error;

/// Main error type for the visaprep-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error (missing credential, missing question category, bad config file)
    #[error("configuration error: {0}")]
    Config(String),

    /// Session not found
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Question not found in the session's selection
    #[error("question not found: {0}")]
    QuestionNotFound(String),

    /// Grading endpoint could not be reached or answered with a non-success status
    #[error("grading transport error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    GradingTransport {
        status: Option<u16>,
        message: String,
    },

    /// Grader answered, but not with the expected verdict shape
    #[error("grading format error: {0}")]
    GradingFormat(String),

    /// Malformed request
    #[error("validation error: {0}")]
    Validation(String),

    /// Summary requested for a session without graded answers
    #[error("no graded answers in session {0}")]
    NoAnswers(String),
}

impl Error {
    /// Whether this error came from the grading boundary.
    ///
    /// Grading errors degrade a turn but never abort a session.
    pub fn is_grading(&self) -> bool {
        matches!(
            self,
            Error::GradingTransport { .. } | Error::GradingFormat(_)
        )
    }

    /// Whether a single immediate retry could help.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::GradingTransport { status: None, .. } => true,
            Error::GradingTransport {
                status: Some(code), ..
            } => *code >= 500 || *code == 429,
            _ => false,
        }
    }
}

/// Result type alias for visaprep-core
pub type Result<T> = std::result::Result<T, Error>;
