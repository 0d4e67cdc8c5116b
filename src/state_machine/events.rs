use crate::error::ExportError;
use crate::models::{ExportArtifact, JobId};

/// Events that drive export state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportEvent {
    /// Begin a new run with the given status-check budget
    Start { attempt_budget: u32 },
    /// The backend accepted the export and it needs polling
    JobCreated(JobId),
    /// The artifact is ready for retrieval
    Complete(ExportArtifact),
    /// The run failed
    Fail(ExportError),
}

impl ExportEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::JobCreated(_) => "job_created",
            Self::Complete(_) => "complete",
            Self::Fail(_) => "fail",
        }
    }

    /// Check if this event ends a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Fail(_))
    }
}
