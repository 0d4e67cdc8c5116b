use serde::Serialize;

use super::events::ExportEvent;
use super::states::JobState;
use crate::error::ExportError;
use crate::models::{ExportArtifact, JobId};

/// Terminal result of an export run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportOutcome {
    Succeeded(ExportArtifact),
    Failed {
        #[serde(serialize_with = "serialize_error")]
        error: ExportError,
    },
}

fn serialize_error<S: serde::Serializer>(
    error: &ExportError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

impl ExportOutcome {
    pub fn failed(error: ExportError) -> Self {
        Self::Failed { error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn artifact(&self) -> Option<&ExportArtifact> {
        match self {
            Self::Succeeded(artifact) => Some(artifact),
            Self::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ExportError> {
        match self {
            Self::Succeeded(_) => None,
            Self::Failed { error } => Some(error),
        }
    }
}

/// Observable view of one orchestrator instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobSnapshot {
    /// Number of runs started so far; the current run when one is active
    pub run: u64,
    pub state: JobState,
    pub attempts_remaining: u32,
    pub job_id: Option<JobId>,
    /// Set once the current run reaches a terminal state
    pub outcome: Option<ExportOutcome>,
}

impl JobSnapshot {
    pub fn in_progress(&self) -> bool {
        self.state.is_in_progress()
    }

    pub(crate) fn apply(&mut self, target: JobState, event: ExportEvent) {
        self.state = target;
        match event {
            ExportEvent::Start { attempt_budget } => {
                self.run += 1;
                self.attempts_remaining = attempt_budget;
                self.job_id = None;
                self.outcome = None;
            }
            ExportEvent::JobCreated(job_id) => {
                self.job_id = Some(job_id);
            }
            ExportEvent::Complete(artifact) => {
                self.job_id = Some(artifact.job_id.clone());
                self.outcome = Some(ExportOutcome::Succeeded(artifact));
            }
            ExportEvent::Fail(error) => {
                self.outcome = Some(ExportOutcome::failed(error));
            }
        }
    }
}
