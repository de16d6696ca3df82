//! Question bank loading.
//!
//! The bank is a JSON object mapping category name to a list of question
//! texts. It is loaded once at startup and validated against the selection
//! rule table: every category the rules draw from must be present.
//!
//! ```json
//! {
//!   "Purpose of Study": ["Why do you want to study in the United States?", "..."],
//!   "Academic Background": ["..."]
//! }
//! ```

mod selection;

pub use selection::{
    sanitize_category, select_for_level, selection_rules, MandatoryQuestion, COLLEGE_QUESTION,
    CATEGORY_ORDER, MAJOR_QUESTION, MANDATORY_QUESTIONS,
};

use crate::error::{Error, Result};
use crate::types::{Level, Question};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const QUESTIONS_FILE: &str = "questions.json";
const QUESTIONS_DATA_FILE: &str = "data/questions.json";

/// Validated category → question-text mapping.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    categories: HashMap<String, Vec<String>>,
    source: Option<PathBuf>,
}

impl QuestionBank {
    /// Parse and validate a bank from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let categories: HashMap<String, Vec<String>> = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("failed to parse question bank: {}", e)))?;
        Self::from_categories(categories)
    }

    /// Validate an already-built category map.
    pub fn from_categories(categories: HashMap<String, Vec<String>>) -> Result<Self> {
        for category in CATEGORY_ORDER {
            if !categories.contains_key(category) {
                return Err(Error::Config(format!(
                    "required category '{}' not found in question bank",
                    category
                )));
            }
        }

        Ok(Self {
            categories,
            source: None,
        })
    }

    /// Load a bank from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read question file {:?}: {}", path, e))
        })?;
        let mut bank = Self::from_json(&content)?;
        bank.source = Some(path.to_path_buf());

        tracing::info!(
            path = %path.display(),
            categories = bank.categories.len(),
            questions = bank.total_questions(),
            "Loaded question bank"
        );
        Ok(bank)
    }

    /// Find and load the question file.
    ///
    /// An explicit path is loaded as-is and its errors are returned. Without
    /// one, the [`QuestionBank::search_paths`] candidates are tried in order;
    /// the first that loads wins and when every candidate fails the last error
    /// is returned.
    pub fn locate(explicit: Option<&Path>) -> Result<Self> {
        Self::locate_in(explicit, &Self::search_paths())
    }

    fn locate_in(explicit: Option<&Path>, candidates: &[PathBuf]) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let mut last_err = None;
        for path in candidates {
            match Self::load(path) {
                Ok(bank) => return Ok(bank),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Question file candidate rejected");
                    last_err = Some(e);
                }
            }
        }

        Err(match last_err {
            Some(e) => Error::Config(format!(
                "could not load {} from any of {} candidate paths: {}",
                QUESTIONS_FILE,
                candidates.len(),
                e
            )),
            None => Error::Config("no question file candidates".to_string()),
        })
    }

    /// Fallback paths tried by [`QuestionBank::locate`] when no explicit path
    /// is given:
    /// 1. working directory: `questions.json`, `data/questions.json`
    /// 2. executable directory: `questions.json`, `data/questions.json`
    /// 3. the same relative paths, unresolved
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(wd) = std::env::current_dir() {
            paths.push(wd.join(QUESTIONS_FILE));
            paths.push(wd.join(QUESTIONS_DATA_FILE));
        }

        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
        {
            paths.push(exe_dir.join(QUESTIONS_FILE));
            paths.push(exe_dir.join(QUESTIONS_DATA_FILE));
        }

        paths.push(PathBuf::from(QUESTIONS_FILE));
        paths.push(PathBuf::from(QUESTIONS_DATA_FILE));

        let mut seen = std::collections::HashSet::new();
        paths.retain(|p| seen.insert(p.clone()));
        paths
    }

    /// Questions for a category, empty if the category is unknown.
    pub fn questions(&self, category: &str) -> &[String] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Category names, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.categories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn total_questions(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// File the bank was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Select a fresh question list for a session at `level`.
    pub fn select(&self, level: Level) -> Vec<Question> {
        select_for_level(self, level)
    }
}
