//! # visaprep-core
//!
//! Core library for visaprep - a mock F1 visa interview practice engine.
//!
//! This library provides:
//! - Question bank loading and per-level question selection
//! - An in-memory session store with idle/capacity retention
//! - LLM grading of answers against a fixed 3-criteria rubric
//! - Score aggregation, follow-up decisions and end-of-session summaries
//! - Configuration management and logging infrastructure
//!
//! ## Flow
//!
//! A session is created with a fixed list of questions. Each answer is graded
//! by the [`grading::Grader`], the verdict is translated into a score delta by
//! [`scoring`], and the cursor moves to the next question. When the list is
//! exhausted the session is finished and summarized by [`summary`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use visaprep_core::{Config, Interview, QuestionBank};
//! use visaprep_core::api::CreateSessionRequest;
//!
//! let config = Config::load().expect("failed to load config");
//! let bank = QuestionBank::locate(config.questions.resolved_path().as_deref())
//!     .expect("failed to load questions");
//! let interview = Interview::from_config(&config, bank).expect("grader not configured");
//!
//! let created = interview
//!     .create_session(CreateSessionRequest::default())
//!     .expect("failed to start session");
//! println!("{}", created.question_text);
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use grading::{CompletionClient, Grader};
pub use interview::Interview;
pub use questions::QuestionBank;
pub use store::SessionStore;
pub use types::*;

// Public modules
pub mod api;
pub mod config;
pub mod error;
pub mod followups;
pub mod grading;
pub mod interview;
pub mod logging;
pub mod questions;
pub mod scoring;
pub mod store;
pub mod summary;
pub mod types;
