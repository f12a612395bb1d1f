//! Progression State Machine — owns one `TrainingProgress` per user and
//! advances day/phase on oracle verdicts.
//!
//! Transition rule on a passing verdict: when `day >= day_limit(phase)` the
//! user moves to `phase.next()` on day 1, otherwise to `day + 1`. Once in
//! the terminal phase no further tasks are generated.
//!
//! Oracle failures are absorbed here and replaced by deterministic fallbacks,
//! so every call leaves the record in a well-defined state.

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::training::oracle::{ContentOracle, TaskPayload, Verdict};
use crate::training::phase::{DayStatus, Phase};

/// Topic used for task generation when neither the caller nor config names one.
pub const DEFAULT_TOPIC: &str = "General Career Success";

#[derive(Debug, Error)]
pub enum ProgressionError {
    /// A task is already waiting for a submission today. Carries that task so
    /// callers can hand it back instead of generating another.
    #[error("a task is already active for today")]
    TaskAlreadyActive { task: TaskPayload },

    #[error("there is no active task to submit against")]
    NoActiveTask,

    #[error("the training program is complete; no further tasks are generated")]
    PhaseComplete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingProgress {
    pub user_id: Uuid,
    pub phase: Phase,
    /// 1-indexed, reset to 1 on every phase change.
    pub day: u32,
    pub day_status: DayStatus,
    /// Present iff a task is awaiting a (passing) submission for the current day.
    pub current_task: Option<TaskPayload>,
    pub submission_text: Option<String>,
    pub feedback: Option<String>,
    /// Storage revision this copy was read at. Used for optimistic saves.
    pub revision: i64,
}

impl TrainingProgress {
    /// Fresh record for a user who has never trained.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            phase: Phase::Basic,
            day: 1,
            day_status: DayStatus::Pending,
            current_task: None,
            submission_text: None,
            feedback: None,
            revision: 0,
        }
    }

    fn active_task(&self) -> Option<&TaskPayload> {
        match (&self.current_task, self.day_status) {
            (Some(task), DayStatus::Pending) => Some(task),
            _ => None,
        }
    }

    fn advance(&mut self) {
        match self.phase.day_limit() {
            Some(limit) if self.day >= limit => {
                let from = self.phase;
                self.phase = from.next();
                self.day = 1;
                info!(
                    "User {} advanced from {} to {}",
                    self.user_id, from, self.phase
                );
            }
            _ => self.day += 1,
        }
    }
}

/// Generates today's task, or hands back the one already waiting.
///
/// Fails with `PhaseComplete` in the terminal phase without consulting the
/// oracle, and with `TaskAlreadyActive` when a pending task exists; callers
/// treat the latter as success.
pub async fn start_task(
    progress: &mut TrainingProgress,
    oracle: &dyn ContentOracle,
    topic: &str,
) -> Result<TaskPayload, ProgressionError> {
    if progress.phase.is_terminal() {
        return Err(ProgressionError::PhaseComplete);
    }
    if let Some(task) = progress.active_task() {
        return Err(ProgressionError::TaskAlreadyActive { task: task.clone() });
    }

    let task = match oracle
        .generate_task(progress.phase, progress.day, topic)
        .await
    {
        Ok(task) => task,
        Err(e) => {
            warn!(
                "Task generation degraded for user {} ({} day {}): {e}",
                progress.user_id, progress.phase, progress.day
            );
            TaskPayload::placeholder(progress.day)
        }
    };

    progress.current_task = Some(task.clone());
    progress.day_status = DayStatus::Pending;
    progress.submission_text = None;
    progress.feedback = None;

    Ok(task)
}

/// Grades a submission against the current task and applies the transition.
///
/// Submission and feedback are recorded whatever the outcome. A failed
/// verdict keeps the task so the same day can be retried.
pub async fn submit(
    progress: &mut TrainingProgress,
    oracle: &dyn ContentOracle,
    submission_text: &str,
) -> Result<Verdict, ProgressionError> {
    let task = progress
        .current_task
        .as_ref()
        .ok_or(ProgressionError::NoActiveTask)?;

    let verdict = match oracle.grade(task, submission_text).await {
        Ok(verdict) => verdict,
        Err(e) => {
            warn!(
                "Grading degraded for user {} ({} day {}): {e}",
                progress.user_id, progress.phase, progress.day
            );
            Verdict::fallback(submission_text)
        }
    };

    progress.submission_text = Some(submission_text.to_string());
    progress.feedback = Some(verdict.feedback.clone());

    if verdict.passed {
        progress.day_status = DayStatus::Completed;
        progress.advance();
        progress.current_task = None;
    } else {
        progress.day_status = DayStatus::Failed;
    }

    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::oracle::OracleDegraded;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Oracle whose grading outcome is fixed up front. Counts every call.
    struct ScriptedOracle {
        passes: bool,
        broken: bool,
        generated: AtomicUsize,
        graded: AtomicUsize,
    }

    impl ScriptedOracle {
        fn passing() -> Self {
            Self::with(true, false)
        }

        fn failing() -> Self {
            Self::with(false, false)
        }

        fn broken() -> Self {
            Self::with(false, true)
        }

        fn with(passes: bool, broken: bool) -> Self {
            Self {
                passes,
                broken,
                generated: AtomicUsize::new(0),
                graded: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.generated.load(Ordering::SeqCst) + self.graded.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentOracle for ScriptedOracle {
        async fn generate_task(
            &self,
            phase: Phase,
            day: u32,
            topic: &str,
        ) -> Result<TaskPayload, OracleDegraded> {
            let n = self.generated.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Err(OracleDegraded::Malformed("not json".to_string()));
            }
            Ok(TaskPayload {
                title: format!("{phase} day {day} #{n}"),
                description: format!("Practice {topic}"),
                verification_type: "text_reflection".to_string(),
            })
        }

        async fn grade(
            &self,
            _task: &TaskPayload,
            _submission: &str,
        ) -> Result<Verdict, OracleDegraded> {
            self.graded.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Err(OracleDegraded::Malformed("not json".to_string()));
            }
            Ok(Verdict {
                passed: self.passes,
                feedback: if self.passes { "Nice." } else { "Try again." }.to_string(),
            })
        }
    }

    fn progress_at(phase: Phase, day: u32) -> TrainingProgress {
        TrainingProgress {
            phase,
            day,
            ..TrainingProgress::new(Uuid::new_v4())
        }
    }

    async fn complete_day(progress: &mut TrainingProgress, oracle: &ScriptedOracle) {
        start_task(progress, oracle, DEFAULT_TOPIC).await.unwrap();
        let verdict = submit(progress, oracle, "I did the work today.").await.unwrap();
        assert!(verdict.passed);
    }

    #[test]
    fn test_new_progress_starts_at_basic_day_one() {
        let progress = TrainingProgress::new(Uuid::new_v4());
        assert_eq!(progress.phase, Phase::Basic);
        assert_eq!(progress.day, 1);
        assert_eq!(progress.day_status, DayStatus::Pending);
        assert!(progress.current_task.is_none());
    }

    #[tokio::test]
    async fn test_full_phase_of_passes_moves_to_next_phase() {
        let oracle = ScriptedOracle::passing();
        for phase in [Phase::Basic, Phase::Intermediate, Phase::Expert] {
            let limit = phase.day_limit().unwrap();
            let mut progress = progress_at(phase, 1);
            for _ in 0..limit {
                complete_day(&mut progress, &oracle).await;
            }
            assert_eq!(progress.phase, phase.next(), "after {limit} passes in {phase}");
            assert_eq!(progress.day, 1);
        }
    }

    #[tokio::test]
    async fn test_pass_mid_phase_increments_day_and_clears_task() {
        let oracle = ScriptedOracle::passing();
        let mut progress = progress_at(Phase::Basic, 3);
        complete_day(&mut progress, &oracle).await;

        assert_eq!(progress.phase, Phase::Basic);
        assert_eq!(progress.day, 4);
        assert_eq!(progress.day_status, DayStatus::Completed);
        assert!(progress.current_task.is_none());
        assert_eq!(progress.feedback.as_deref(), Some("Nice."));
    }

    #[tokio::test]
    async fn test_start_task_twice_returns_same_task() {
        let oracle = ScriptedOracle::passing();
        let mut progress = progress_at(Phase::Basic, 1);

        let first = start_task(&mut progress, &oracle, DEFAULT_TOPIC).await.unwrap();
        let second = start_task(&mut progress, &oracle, DEFAULT_TOPIC).await;

        match second {
            Err(ProgressionError::TaskAlreadyActive { task }) => assert_eq!(task, first),
            other => panic!("expected TaskAlreadyActive, got {other:?}"),
        }
        assert_eq!(oracle.generated.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_task_clears_previous_submission() {
        let oracle = ScriptedOracle::passing();
        let mut progress = progress_at(Phase::Basic, 2);
        progress.submission_text = Some("yesterday".to_string());
        progress.feedback = Some("ok".to_string());
        progress.day_status = DayStatus::Completed;

        start_task(&mut progress, &oracle, "Marketing").await.unwrap();

        assert_eq!(progress.day_status, DayStatus::Pending);
        assert!(progress.submission_text.is_none());
        assert!(progress.feedback.is_none());
        assert!(progress.current_task.is_some());
    }

    #[tokio::test]
    async fn test_submit_without_task_fails_and_leaves_feedback() {
        let oracle = ScriptedOracle::passing();
        let mut progress = progress_at(Phase::Intermediate, 5);
        progress.feedback = Some("earlier feedback".to_string());
        let before = progress.clone();

        let result = submit(&mut progress, &oracle, "anything at all here").await;

        assert!(matches!(result, Err(ProgressionError::NoActiveTask)));
        assert_eq!(progress, before);
        assert_eq!(oracle.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_day_and_task() {
        let oracle = ScriptedOracle::failing();
        let mut progress = progress_at(Phase::Expert, 12);
        let task = start_task(&mut progress, &oracle, DEFAULT_TOPIC).await.unwrap();

        let verdict = submit(&mut progress, &oracle, "meh").await.unwrap();

        assert!(!verdict.passed);
        assert_eq!(progress.phase, Phase::Expert);
        assert_eq!(progress.day, 12);
        assert_eq!(progress.day_status, DayStatus::Failed);
        assert_eq!(progress.current_task, Some(task));
        assert_eq!(progress.submission_text.as_deref(), Some("meh"));
        assert_eq!(progress.feedback.as_deref(), Some("Try again."));
    }

    #[tokio::test]
    async fn test_failed_day_can_be_resubmitted_or_regenerated() {
        let oracle = ScriptedOracle::failing();
        let mut progress = progress_at(Phase::Basic, 1);
        start_task(&mut progress, &oracle, DEFAULT_TOPIC).await.unwrap();
        submit(&mut progress, &oracle, "first try").await.unwrap();

        // Resubmitting against the same task is allowed.
        assert!(submit(&mut progress, &oracle, "second try").await.is_ok());

        // So is asking for a fresh task on the same day.
        let regenerated = start_task(&mut progress, &oracle, DEFAULT_TOPIC).await.unwrap();
        assert_eq!(progress.current_task, Some(regenerated));
        assert_eq!(progress.day_status, DayStatus::Pending);
        assert_eq!(progress.day, 1);
    }

    #[tokio::test]
    async fn test_real_world_is_complete_and_skips_oracle() {
        let oracle = ScriptedOracle::passing();
        let mut progress = progress_at(Phase::RealWorld, 1);

        let result = start_task(&mut progress, &oracle, DEFAULT_TOPIC).await;

        assert!(matches!(result, Err(ProgressionError::PhaseComplete)));
        assert_eq!(oracle.calls(), 0);
        assert!(progress.current_task.is_none());
    }

    #[tokio::test]
    async fn test_finishing_expert_reaches_terminal_phase() {
        let oracle = ScriptedOracle::passing();
        let mut progress = progress_at(Phase::Expert, 30);
        complete_day(&mut progress, &oracle).await;

        assert_eq!(progress.phase, Phase::RealWorld);
        assert!(matches!(
            start_task(&mut progress, &oracle, DEFAULT_TOPIC).await,
            Err(ProgressionError::PhaseComplete)
        ));
    }

    #[tokio::test]
    async fn test_broken_oracle_still_produces_placeholder_task() {
        let oracle = ScriptedOracle::broken();
        let mut progress = progress_at(Phase::Intermediate, 9);

        let task = start_task(&mut progress, &oracle, DEFAULT_TOPIC).await.unwrap();

        assert_eq!(task, TaskPayload::placeholder(9));
        assert_eq!(progress.current_task, Some(task));
        assert_eq!(progress.day_status, DayStatus::Pending);
    }

    #[tokio::test]
    async fn test_broken_oracle_grades_deterministically() {
        let oracle = ScriptedOracle::broken();

        let mut long = progress_at(Phase::Basic, 15);
        start_task(&mut long, &oracle, DEFAULT_TOPIC).await.unwrap();
        let verdict = submit(&mut long, &oracle, "A detailed reflection on my research.")
            .await
            .unwrap();
        assert!(verdict.passed);
        assert_eq!(long.phase, Phase::Intermediate);
        assert_eq!(long.day, 1);
        assert_eq!(long.day_status, DayStatus::Completed);

        let mut short = progress_at(Phase::Basic, 15);
        start_task(&mut short, &oracle, DEFAULT_TOPIC).await.unwrap();
        let verdict = submit(&mut short, &oracle, "done").await.unwrap();
        assert!(!verdict.passed);
        assert_eq!(short.phase, Phase::Basic);
        assert_eq!(short.day, 15);
        assert_eq!(short.day_status, DayStatus::Failed);
        assert_eq!(short.feedback, Some(verdict.feedback));
    }
}
