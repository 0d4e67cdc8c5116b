//! # Submission & Polling Engine
//!
//! Issues the creation request for a resource and, when the backend reports
//! the artifact is not yet available, checks its status on a fixed interval
//! until it is ready or the attempt budget runs out.
//!
//! Each attempt waits first and checks second, so even the first status check
//! happens one interval after submission.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::ExportBackend;
use crate::constants::{default_poll_interval, DEFAULT_MAX_POLL_ATTEMPTS};
use crate::error::{ExportError, Result};
use crate::models::{ExportFormat, ExportRequest, JobId, ResourceKey};

/// How a failed status check is treated while polling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorPolicy {
    /// Abort the run with the transport error
    #[default]
    FailFast,
    /// Count the failed check as a spent attempt and keep polling
    ConsumeAttempt,
}

/// Polling cadence and budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub interval: Duration,
    pub transport_error_policy: TransportErrorPolicy,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            interval: default_poll_interval(),
            transport_error_policy: TransportErrorPolicy::default(),
        }
    }
}

/// Whether a freshly created job still needs polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Ready,
    Pending,
}

/// Validated result of a creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedJob {
    pub job_id: JobId,
    pub completion: Completion,
}

/// Outcome of a single status check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    Ready,
    NotYet,
    Error(ExportError),
}

/// Drives the create call and the status checks against an [`ExportBackend`]
#[derive(Clone)]
pub struct SubmissionEngine {
    backend: Arc<dyn ExportBackend>,
    format: ExportFormat,
}

impl std::fmt::Debug for SubmissionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionEngine")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl SubmissionEngine {
    pub fn new(backend: Arc<dyn ExportBackend>, format: ExportFormat) -> Self {
        Self { backend, format }
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// Issue the creation request for `key`.
    ///
    /// A creation response without a job id fails with
    /// [`ExportError::MissingJobId`]; no polling is attempted for it.
    pub async fn submit(&self, key: &ResourceKey) -> Result<SubmittedJob> {
        let request = ExportRequest::new(key.clone(), self.format);
        let created = self
            .backend
            .create_export(&request)
            .await
            .map_err(|e| ExportError::transport("create_export", e))?;

        let job_id = created
            .job_id
            .ok_or(ExportError::MissingJobId)
            .and_then(JobId::new)?;

        // Backends without a readiness flag deliver synchronously
        let completion = match created.has_content {
            Some(false) => Completion::Pending,
            Some(true) | None => Completion::Ready,
        };

        debug!(resource = %key, job_id = %job_id, ?completion, "Export job created");
        Ok(SubmittedJob { job_id, completion })
    }

    /// Perform one status check
    pub async fn check_once(&self, job_id: &JobId) -> PollStep {
        match self.backend.export_status(job_id).await {
            Ok(status) if status.ready => PollStep::Ready,
            Ok(_) => PollStep::NotYet,
            Err(e) => PollStep::Error(ExportError::transport("export_status", e)),
        }
    }

    /// Poll until the artifact is ready, returning the attempt that saw it.
    ///
    /// `on_attempt` receives the remaining budget after every check. At most
    /// `max_attempts` checks are made; running out yields
    /// [`ExportError::Timeout`].
    pub async fn poll_until_ready<F>(
        &self,
        job_id: &JobId,
        settings: &PollSettings,
        mut on_attempt: F,
    ) -> Result<u32>
    where
        F: FnMut(u32),
    {
        let max_attempts = settings.max_attempts;

        for attempt in 1..=max_attempts {
            tokio::time::sleep(settings.interval).await;

            let step = self.check_once(job_id).await;
            on_attempt(max_attempts - attempt);

            match step {
                PollStep::Ready => {
                    debug!(job_id = %job_id, attempt, "Export content ready");
                    return Ok(attempt);
                }
                PollStep::NotYet => {
                    debug!(job_id = %job_id, attempt, max_attempts, "Export content not ready");
                }
                PollStep::Error(error) => match settings.transport_error_policy {
                    TransportErrorPolicy::FailFast => return Err(error),
                    TransportErrorPolicy::ConsumeAttempt => {
                        warn!(
                            job_id = %job_id,
                            attempt,
                            error = %error,
                            "Status check failed, counting it as a spent attempt"
                        );
                    }
                },
            }
        }

        Err(ExportError::Timeout {
            attempts: max_attempts,
        })
    }
}
