// Prompt constants for the training oracle.
// Composed with llm_client::prompts::JSON_ONLY_SYSTEM at call time.

pub const TASK_SYSTEM: &str = "You are a career mentor designing one daily practice task \
    for a student working through a staged training program.";

/// Task generation prompt. Replace `{phase}`, `{focus}`, `{day}`, `{limit}` and `{topic}`.
pub const TASK_PROMPT_TEMPLATE: &str = r#"Create one specific, actionable task for today.

Training phase: {phase} ({focus})
Day: {day} of {limit}
Career goal: {topic}

The task must be completable in a single day and verifiable from a written
reflection the student submits afterwards.

Return a JSON object with this EXACT schema:
{
  "title": "Short task title",
  "description": "2-3 sentences explaining exactly what to do today.",
  "verification_type": "text_reflection"
}"#;

pub const GRADE_SYSTEM: &str = "You are a strict but fair evaluator of daily training tasks. \
    You judge effort and relevance, not polish.";

/// Grading prompt. Replace `{title}`, `{description}` and `{submission}`.
pub const GRADE_PROMPT_TEMPLATE: &str = r#"Task title: {title}
Task description: {description}

Student submission:
"""
{submission}
"""

Did the student make a genuine effort to complete this task?

Return a JSON object with this EXACT schema:
{
  "passed": true,
  "feedback": "One sentence of feedback addressed to the student."
}"#;
