//! Interactive practice session on stdin/stdout.

use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use visaprep_core::api::{grade_for_classification, CreateSessionRequest, SubmitAnswerRequest};
use visaprep_core::interview::completion_message;
use visaprep_core::scoring::to_percentage;
use visaprep_core::{AnalysisResponse, Config, Interview, Level, QuestionBank};

/// Typed instead of an answer to end the session early
const QUIT_COMMANDS: [&str; 2] = [":q", ":quit"];

pub fn run(config: &Config, bank: QuestionBank, level: Level, user: Option<String>) -> Result<()> {
    let interview = Interview::from_config(config, bank).context("failed to create grader")?;

    let created = interview
        .create_session(CreateSessionRequest {
            user_id: user,
            level: level.to_string(),
        })
        .context("failed to start session")?;
    let session_id = created.session_id;
    tracing::info!(session_id = %session_id, level = %level, "Practice session started");

    println!(
        "Mock F1 visa interview: {} questions ({} level). Type {} to stop.",
        created.total_questions, level, QUIT_COMMANDS[0]
    );

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut question_id = created.question_id;
    let mut question_text = created.question_text;
    let mut number = 1;

    loop {
        println!();
        println!("Q{}/{}: {}", number, created.total_questions, question_text);
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            interview.abort_session(&session_id)?;
            println!();
            println!("Input closed, session ended.");
            return Ok(());
        };
        let answer = line.context("failed to read answer")?;
        let answer = answer.trim();

        if QUIT_COMMANDS.contains(&answer) {
            let session = interview.abort_session(&session_id)?;
            println!("{}", completion_message(&session));
            return Ok(());
        }
        if answer.is_empty() {
            println!("Please type an answer.");
            continue;
        }

        let resp = interview.submit_answer(
            &session_id,
            SubmitAnswerRequest {
                question_id: question_id.clone(),
                answer: answer.to_string(),
            },
        )?;

        match &resp.analysis {
            Some(analysis) => print_feedback(analysis),
            None => println!("(Grading unavailable for this answer; moving on.)"),
        }

        match (resp.next_question_id, resp.next_question_text) {
            (Some(id), Some(text)) if !resp.finished => {
                question_id = id;
                question_text = text;
                number += 1;
            }
            _ => break,
        }
    }

    let session = interview.session(&session_id)?;
    println!();
    println!("{}", completion_message(&session));

    if let Some(summary) = &session.summary {
        print_list("Strong areas", &summary.strong_areas);
        print_list("Weak areas", &summary.weak_areas);
        print_list("Red flags", &summary.common_red_flags);
    }

    Ok(())
}

fn print_feedback(analysis: &AnalysisResponse) {
    let scores = &analysis.scores;
    println!(
        "  {} ({}/15, {:.0}%) grade {}",
        analysis.classification,
        scores.total_score,
        to_percentage(scores.total_score),
        grade_for_classification(&analysis.classification)
    );
    println!(
        "  migration intent {} | goal understanding {} | answer length {}",
        scores.migration_intent, scores.goal_understanding, scores.answer_length
    );
    if !analysis.feedback.overall.is_empty() {
        println!("  {}", analysis.feedback.overall);
    }
    for tip in &analysis.feedback.improvements {
        println!("  - {}", tip);
    }
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{}:", title);
    for item in items {
        println!("  - {}", item);
    }
}
