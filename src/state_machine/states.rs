use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states of an export instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// No export has been requested yet
    #[default]
    Idle,
    /// The create-export call is in flight
    Submitting,
    /// The job exists and its status is being checked
    Polling,
    /// The artifact is ready
    Succeeded,
    /// The export failed or timed out
    Failed,
}

impl JobState {
    /// Check if this is a terminal state (no further automatic transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// The externally observed progress flag
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Submitting | Self::Polling)
    }

    /// Check if a new export request may start a run from this state
    pub fn accepts_new_run(&self) -> bool {
        !self.is_in_progress()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Polling => "polling",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "submitting" => Ok(Self::Submitting),
            "polling" => Ok(Self::Polling),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid job state: {s}")),
        }
    }
}
