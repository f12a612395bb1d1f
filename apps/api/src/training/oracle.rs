//! Content Oracle — the external generator and grader of daily tasks.
//!
//! The progression state machine only sees the `ContentOracle` trait. Any
//! failure an implementation reports is absorbed by the caller into a
//! deterministic fallback (`TaskPayload::placeholder`, `Verdict::fallback`),
//! so a degraded model never blocks a user's progress.
//!
//! `AppState` holds an `Arc<dyn ContentOracle>`; production wires `LlmOracle`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError};
use crate::training::phase::Phase;
use crate::training::prompts::{
    GRADE_PROMPT_TEMPLATE, GRADE_SYSTEM, TASK_PROMPT_TEMPLATE, TASK_SYSTEM,
};

const TEXT_REFLECTION: &str = "text_reflection";
/// Submissions longer than this (after trimming) pass when grading is degraded.
const FALLBACK_MIN_SUBMISSION_CHARS: usize = 20;

const TASK_TEMPERATURE: f32 = 0.8;
const GRADE_TEMPERATURE: f32 = 0.3;

/// A generated daily task. Stored verbatim as the user's `current_task`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub title: String,
    pub description: String,
    #[serde(default = "default_verification_type")]
    pub verification_type: String,
}

fn default_verification_type() -> String {
    TEXT_REFLECTION.to_string()
}

impl TaskPayload {
    /// Deterministic stand-in used when the oracle cannot produce a task.
    pub fn placeholder(day: u32) -> Self {
        Self {
            title: format!("Day {day} Challenge"),
            description: "Research a key topic in your field and write a short reflection \
                on what you learned and how it applies to your goal."
                .to_string(),
            verification_type: TEXT_REFLECTION.to_string(),
        }
    }

    fn is_usable(&self) -> bool {
        !self.title.trim().is_empty() && !self.description.trim().is_empty()
    }
}

/// Pass/fail outcome of grading one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(default)]
    pub passed: bool,
    #[serde(default = "default_feedback")]
    pub feedback: String,
}

fn default_feedback() -> String {
    "Recorded.".to_string()
}

impl Verdict {
    /// Deterministic stand-in used when the oracle cannot grade.
    /// Depends only on the submission length.
    pub fn fallback(submission: &str) -> Self {
        let passed = submission.trim().chars().count() > FALLBACK_MIN_SUBMISSION_CHARS;
        let feedback = if passed {
            "Good effort! Your submission has been recorded."
        } else {
            "Please provide more detail about what you did and learned."
        };
        Self {
            passed,
            feedback: feedback.to_string(),
        }
    }
}

/// Why an oracle call could not be used. Never leaves the training module.
#[derive(Debug, Error)]
pub enum OracleDegraded {
    #[error("oracle call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("oracle returned an unusable payload: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait ContentOracle: Send + Sync {
    async fn generate_task(
        &self,
        phase: Phase,
        day: u32,
        topic: &str,
    ) -> Result<TaskPayload, OracleDegraded>;

    async fn grade(&self, task: &TaskPayload, submission: &str)
        -> Result<Verdict, OracleDegraded>;
}

/// Oracle backed by the shared LLM client.
pub struct LlmOracle {
    llm: LlmClient,
}

impl LlmOracle {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ContentOracle for LlmOracle {
    async fn generate_task(
        &self,
        phase: Phase,
        day: u32,
        topic: &str,
    ) -> Result<TaskPayload, OracleDegraded> {
        let prompt = build_task_prompt(phase, day, topic);
        let system = format!("{TASK_SYSTEM} {JSON_ONLY_SYSTEM}");
        let task: TaskPayload = self
            .llm
            .call_json(&prompt, &system, Some(TASK_TEMPERATURE))
            .await?;

        if !task.is_usable() {
            return Err(OracleDegraded::Malformed(
                "task is missing a title or description".to_string(),
            ));
        }
        Ok(task)
    }

    async fn grade(
        &self,
        task: &TaskPayload,
        submission: &str,
    ) -> Result<Verdict, OracleDegraded> {
        let prompt = build_grade_prompt(task, submission);
        let system = format!("{GRADE_SYSTEM} {JSON_ONLY_SYSTEM}");
        Ok(self
            .llm
            .call_json(&prompt, &system, Some(GRADE_TEMPERATURE))
            .await?)
    }
}

fn build_grade_prompt(task: &TaskPayload, submission: &str) -> String {
    fill_template(
        GRADE_PROMPT_TEMPLATE,
        &[
            ("title", task.title.as_str()),
            ("description", task.description.as_str()),
            ("submission", submission),
        ],
    )
}

fn build_task_prompt(phase: Phase, day: u32, topic: &str) -> String {
    let limit = phase
        .day_limit()
        .map(|l| l.to_string())
        .unwrap_or_else(|| "open-ended".to_string());
    let day = day.to_string();
    fill_template(
        TASK_PROMPT_TEMPLATE,
        &[
            ("phase", phase.as_str()),
            ("focus", phase.focus()),
            ("day", day.as_str()),
            ("limit", limit.as_str()),
            ("topic", topic),
        ],
    )
}

/// Single pass over the template: inserted values are never rescanned, so
/// braces inside a title or a submission come through verbatim.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let hit = values
            .iter()
            .find(|(key, _)| tail.starts_with(key) && tail[key.len()..].starts_with('}'));
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
