//! visaprep - mock F1 visa interview practice
//!
//! Commands:
//! - `practice`: run an interactive interview on the terminal
//! - `questions`: preview the questions a session at a level would get
//! - `grade`: grade a single question/answer pair and print the verdict
//! - `check`: validate configuration, question file and grader readiness
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/visaprep/config.toml (~/.config/visaprep/config.toml)
//! - Logs: $XDG_STATE_HOME/visaprep/visaprep.log (~/.local/state/visaprep/visaprep.log)

mod practice;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use visaprep_core::{Config, Grader, Level, QuestionBank};

#[derive(Parser)]
#[command(name = "visaprep")]
#[command(about = "Practice the F1 visa interview with graded feedback")]
#[command(version)]
struct Args {
    /// Question file (overrides config and VISAPREP_QUESTIONS)
    #[arg(long, global = true)]
    questions: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run an interactive practice interview
    Practice {
        /// Difficulty: easy, medium or hard
        #[arg(short, long, default_value = "hard")]
        level: String,

        /// Optional user id recorded on the session
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Preview a question selection
    Questions {
        /// Difficulty: easy, medium or hard
        #[arg(short, long, default_value = "hard")]
        level: String,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Grade one answer and print the verdict as JSON
    Grade {
        /// Question asked by the officer
        #[arg(short, long)]
        question: String,

        /// Student's answer
        #[arg(short, long)]
        answer: String,
    },

    /// Check configuration, question file and grader setup
    Check,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        visaprep_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let questions_path = args.questions.or_else(|| config.questions.resolved_path());
    tracing::debug!(questions = ?questions_path, "Resolved question file");

    match args.command {
        Command::Practice { level, user } => {
            let bank = load_bank(questions_path.as_deref())?;
            practice::run(&config, bank, parse_level(&level)?, user)
        }
        Command::Questions { level, format } => {
            let bank = load_bank(questions_path.as_deref())?;
            cmd_questions(&bank, parse_level(&level)?, &format)
        }
        Command::Grade { question, answer } => cmd_grade(&config, &question, &answer),
        Command::Check => cmd_check(&config, questions_path.as_deref()),
    }
}

fn load_bank(path: Option<&std::path::Path>) -> Result<QuestionBank> {
    QuestionBank::locate(path).context("failed to load question bank")
}

fn parse_level(level: &str) -> Result<Level> {
    level
        .parse::<Level>()
        .map_err(|e| anyhow::anyhow!("{e} (expected easy, medium or hard)"))
}

fn cmd_questions(bank: &QuestionBank, level: Level, format: &str) -> Result<()> {
    let selected = bank.select(level);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&selected)?);
        }
        "text" => {
            println!("{} questions ({} level)", selected.len(), level);
            println!();
            for (i, q) in selected.iter().enumerate() {
                println!("{:>2}. [{}] {}", i + 1, q.category, q.text);
            }
        }
        other => anyhow::bail!("unknown format '{}' (expected text or json)", other),
    }

    Ok(())
}

fn cmd_grade(config: &Config, question: &str, answer: &str) -> Result<()> {
    if answer.trim().is_empty() {
        anyhow::bail!("answer must not be empty");
    }

    let grader = Grader::from_config(&config.grader).context("failed to create grader")?;
    let analysis = grader
        .analyze_single(question, answer)
        .context("grading failed")?;

    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

fn cmd_check(config: &Config, questions_path: Option<&std::path::Path>) -> Result<()> {
    println!("visaprep Configuration");
    println!("======================");
    println!();

    let config_path = Config::config_path();
    let config_state = if config_path.exists() {
        "found"
    } else {
        "not found, using defaults"
    };
    println!("Config file:     {} ({})", config_path.display(), config_state);
    println!("Log file:        {}", visaprep_core::logging::log_file_path().display());
    println!();

    println!("Grader");
    println!("  Model:         {}", config.grader.model);
    println!("  Endpoint:      {}", config.grader.resolved_endpoint());
    println!("  Timeout:       {}s", config.grader.timeout_secs);
    println!("  Retry once:    {}", config.grader.retry_once);
    println!(
        "  API key:       {}",
        if config.grader.is_ready() {
            "configured"
        } else {
            "missing (set grader.api_key or OPENAI_API_KEY)"
        }
    );
    println!();

    println!("Sessions");
    println!("  Max sessions:  {}", config.store.max_sessions);
    println!("  Idle TTL:      {} min", config.store.idle_ttl_minutes);
    println!();

    let bank = load_bank(questions_path)?;
    println!("Questions");
    if let Some(source) = bank.source() {
        println!("  File:          {}", source.display());
    }
    for category in bank.categories() {
        println!("  {:<24} {}", category, bank.questions(category).len());
    }
    println!("  Total:         {}", bank.total_questions());

    Ok(())
}
