//! Phase and day-status vocabulary plus the fixed day-limit policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named stage of the training program. Ordered: a user only ever moves
/// forward through these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Basic,
    Intermediate,
    Expert,
    RealWorld,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Basic,
        Phase::Intermediate,
        Phase::Expert,
        Phase::RealWorld,
    ];

    /// Number of days in the phase. `None` for the open-ended terminal phase.
    pub fn day_limit(self) -> Option<u32> {
        match self {
            Phase::Basic => Some(15),
            Phase::Intermediate => Some(15),
            Phase::Expert => Some(30),
            Phase::RealWorld => None,
        }
    }

    /// The phase that follows this one. `RealWorld` is its own successor.
    pub fn next(self) -> Phase {
        match self {
            Phase::Basic => Phase::Intermediate,
            Phase::Intermediate => Phase::Expert,
            Phase::Expert | Phase::RealWorld => Phase::RealWorld,
        }
    }

    /// No tasks are generated once a user reaches a terminal phase.
    pub fn is_terminal(self) -> bool {
        self.day_limit().is_none()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Basic => "basic",
            Phase::Intermediate => "intermediate",
            Phase::Expert => "expert",
            Phase::RealWorld => "real_world",
        }
    }

    /// Short description of what the phase focuses on, fed to the task generator.
    pub fn focus(self) -> &'static str {
        match self {
            Phase::Basic => "foundations, mindset and basic research",
            Phase::Intermediate => "skill building and simple projects",
            Phase::Expert => "advanced application and case studies",
            Phase::RealWorld => "independent real-world practice",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownValue::new("phase", s))
    }
}

/// Progress on the current day's task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    /// A task may exist but nothing has been submitted for it yet.
    Pending,
    /// The last submission passed; the day has already been advanced.
    Completed,
    /// The last submission was rejected; the same day is retried.
    Failed,
}

impl DayStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DayStatus::Pending => "pending",
            DayStatus::Completed => "completed",
            DayStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DayStatus::Pending),
            "completed" => Ok(DayStatus::Completed),
            "failed" => Ok(DayStatus::Failed),
            other => Err(UnknownValue::new("day_status", other)),
        }
    }
}

/// A stored enum column held a value this build does not recognise.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownValue {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
