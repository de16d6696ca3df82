//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/visaprep/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/visaprep/` (~/.config/visaprep/)
//! - State/Logs: `$XDG_STATE_HOME/visaprep/` (~/.local/state/visaprep/)
//!
//! A few settings can also come from the environment:
//! - `OPENAI_API_KEY` / `GPT_API_KEY`: grader credential
//! - `VISAPREP_GRADER_ENDPOINT`: grader endpoint override
//! - `VISAPREP_QUESTIONS`: question file path

use crate::error::{Error, Result};
use crate::scoring::ScoringPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default chat-completion endpoint for the grader.
pub const DEFAULT_GRADER_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Environment variables checked (in order) for the grader credential.
pub const API_KEY_ENV_VARS: [&str; 2] = ["OPENAI_API_KEY", "GPT_API_KEY"];

const ENDPOINT_ENV_VAR: &str = "VISAPREP_GRADER_ENDPOINT";
const QUESTIONS_ENV_VAR: &str = "VISAPREP_QUESTIONS";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Grading endpoint configuration
    #[serde(default)]
    pub grader: GraderConfig,

    /// Question source configuration
    #[serde(default)]
    pub questions: QuestionsConfig,

    /// Session retention
    #[serde(default)]
    pub store: StoreConfig,

    /// Score adapter thresholds
    #[serde(default)]
    pub scoring: ScoringPolicy,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Grader (LLM chat-completion) configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GraderConfig {
    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,
    /// API endpoint (optional, uses the OpenAI chat-completions URL)
    pub endpoint: Option<String>,
    /// API key (can also use env var)
    pub api_key: Option<String>,
    /// HTTP request timeout in seconds
    #[serde(default = "default_grader_timeout")]
    pub timeout_secs: u64,
    /// Completion token cap
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Retry once, immediately, after a transient transport failure
    #[serde(default)]
    pub retry_once: bool,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: None,
            api_key: None,
            timeout_secs: default_grader_timeout(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            retry_once: false,
        }
    }
}

impl GraderConfig {
    /// Endpoint to call: config value, then env override, then the default.
    pub fn resolved_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .or_else(|| std::env::var(ENDPOINT_ENV_VAR).ok())
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GRADER_ENDPOINT.to_string())
    }

    /// Credential to send: config value, then `OPENAI_API_KEY`, then `GPT_API_KEY`.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                API_KEY_ENV_VARS
                    .iter()
                    .filter_map(|var| std::env::var(var).ok())
                    .find(|k| !k.trim().is_empty())
            })
    }

    /// Whether a grader can be constructed without a configuration error.
    pub fn is_ready(&self) -> bool {
        self.resolved_api_key().is_some()
    }
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_grader_timeout() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.3
}

/// Question source configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct QuestionsConfig {
    /// Explicit path to the question JSON file
    pub path: Option<PathBuf>,
}

impl QuestionsConfig {
    /// Explicit path from config, falling back to `VISAPREP_QUESTIONS`.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path
            .clone()
            .or_else(|| std::env::var_os(QUESTIONS_ENV_VAR).map(PathBuf::from))
    }
}

/// Session retention configuration
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct StoreConfig {
    /// Maximum number of sessions kept in memory
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Minutes without an update before a session is dropped
    #[serde(default = "default_idle_ttl_minutes")]
    pub idle_ttl_minutes: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            idle_ttl_minutes: default_idle_ttl_minutes(),
        }
    }
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_idle_ttl_minutes() -> u64 {
    24 * 60
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the engine misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.grader.timeout_secs == 0 {
            return Err(Error::Config(
                "grader.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.store.max_sessions == 0 {
            return Err(Error::Config(
                "store.max_sessions must be at least 1".to_string(),
            ));
        }
        self.scoring.validate()
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/visaprep/config.toml` (~/.config/visaprep/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("visaprep").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/visaprep/` (~/.local/state/visaprep/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("visaprep")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/visaprep/visaprep.log` (~/.local/state/visaprep/visaprep.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("visaprep.log")
    }
}
