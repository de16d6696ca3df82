//! The fixed 3-criteria grading rubric.
//!
//! Each criterion is scored 1–5, so a total is always within 3–15.

/// Lowest score of a single criterion.
pub const MIN_CRITERION_SCORE: i32 = 1;
/// Highest score of a single criterion.
pub const MAX_CRITERION_SCORE: i32 = 5;
/// Lowest possible total (three criteria at 1).
pub const MIN_TOTAL_SCORE: i32 = 3;
/// Highest possible total (three criteria at 5).
pub const MAX_TOTAL_SCORE: i32 = 15;

/// Lowest total classified as Good.
pub const GOOD_FROM: i32 = 13;
/// Lowest total classified as Average.
pub const AVERAGE_FROM: i32 = 11;

/// Criteria at or above this score count as a strength.
pub const STRONG_FROM: i32 = 4;
/// Criteria at or below this score count as a weakness.
pub const WEAK_UP_TO: i32 = 3;
/// Criteria at or below this score raise a red flag.
pub const RED_FLAG_UP_TO: i32 = 2;

/// Rubric criteria, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    MigrationIntent,
    GoalUnderstanding,
    AnswerLength,
}

impl Criterion {
    pub const ALL: [Criterion; 3] = [
        Criterion::MigrationIntent,
        Criterion::GoalUnderstanding,
        Criterion::AnswerLength,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::MigrationIntent => "migration_intent",
            Criterion::GoalUnderstanding => "goal_understanding",
            Criterion::AnswerLength => "answer_length",
        }
    }

    /// Label used when the criterion is a recurring strength or weakness.
    pub fn label(&self) -> &'static str {
        match self {
            Criterion::MigrationIntent => "No immigration intent",
            Criterion::GoalUnderstanding => "Clear understanding of academic goals",
            Criterion::AnswerLength => "Appropriate answer length",
        }
    }

    /// Label used when the criterion scored low enough to be a red flag.
    pub fn red_flag(&self) -> &'static str {
        match self {
            Criterion::MigrationIntent => "Shows potential immigration intent",
            Criterion::GoalUnderstanding => "Unclear academic goals",
            Criterion::AnswerLength => "Poor answer structure or length",
        }
    }

    pub fn score(&self, scores: &crate::types::AnalysisScores) -> i32 {
        match self {
            Criterion::MigrationIntent => scores.migration_intent,
            Criterion::GoalUnderstanding => scores.goal_understanding,
            Criterion::AnswerLength => scores.answer_length,
        }
    }
}

/// Verdict labels the grader may return.
pub const CLASSIFICATIONS: [&str; 4] = ["Excellent", "Good", "Average", "Weak"];

/// Classification for a rubric total.
pub fn classify(total_score: i32) -> &'static str {
    match total_score {
        t if t >= MAX_TOTAL_SCORE => "Excellent",
        t if t >= GOOD_FROM => "Good",
        t if t >= AVERAGE_FROM => "Average",
        _ => "Weak",
    }
}

/// System message sent at the top of every grading conversation.
pub const SYSTEM_PROMPT: &str = r#"You are an F1 visa interview grading engine. You grade ONE student answer at a time.

Each user message contains the officer's question and the student's answer:
Question: <question>
Student's Answer: <answer>

TASK
1) Score the answer on 3 criteria, each an integer from 1 to 5:
   - migration_intent
   - goal_understanding
   - answer_length
2) total_score = migration_intent + goal_understanding + answer_length.
3) classification from total_score: 15 => "Excellent", 13-14 => "Good", 11-12 => "Average", 3-10 => "Weak".
4) Feedback: "overall" (1-3 sentences), "by_criterion" (1-2 sentences per criterion), "improvements" (1-3 short actionable tips).

GENERAL RULES
- Grade only what is written. Do not invent facts.
- Judge content and structure, not accent or minor grammar mistakes. Simple, direct style is fine.
- First decide whether the question is about goals and intent ("Why the US?", "Plans after graduation?") or factual ("Who is sponsoring you?", "What is your university?"). Apply the full rubric to goal and intent questions. For factual questions do not penalize the student for not discussing long-term goals.

migration_intent
5 = clear intent to return home, with concrete plans or ties there (family, career, a business), and no interest in staying in the US.
3 = education focused, vague references to US "opportunities", no explicit plan to stay.
1 = wants to work, live or stay in the US, speaks negatively about the home country as a reason to leave, or lists several foreign countries as alternatives.
For purely factual questions with nothing risky in the answer, give 5.

goal_understanding
5 = explains why this country, university and major fit a concrete future plan, especially at home.
3 = knows the major and university and has goals, but the reasoning is generic.
1 = no clear goals and no link between the studies and the future.
For factual questions answered correctly and clearly, give 5.

answer_length
5 = length fits the question: 2-5 sentences with detail for goal questions, short and complete for factual ones.
3 = slightly too short or too long, main information present.
1 = clearly incomplete, or long and off-topic.

OUTPUT
Return ONLY a JSON object with exactly this structure:
{
  "scores": {"migration_intent": 0, "goal_understanding": 0, "answer_length": 0, "total_score": 0},
  "classification": "",
  "feedback": {
    "overall": "",
    "by_criterion": {"migration_intent": "", "goal_understanding": "", "answer_length": ""},
    "improvements": []
  }
}
No markdown, no backticks, no other keys, no text outside the JSON."#;
