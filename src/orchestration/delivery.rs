//! # Result Delivery
//!
//! Turns the terminal result of a run into side effects: user-facing
//! notifications and, on success only, retrieval of the artifact.

use std::sync::Arc;
use tracing::{error, info};

use crate::client::ExportBackend;
use crate::constants::{messages, operations};
use crate::error::ExportError;
use crate::logging::log_error;
use crate::models::{ExportArtifact, ExportFormat, JobId, ResourceKey};

/// User-facing notification surface; calls are fire-and-forget
pub trait Notifier: Send + Sync + 'static {
    fn info(&self, message: &str);
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Retrieves a finished artifact, e.g. by opening its location
pub trait ArtifactOpener: Send + Sync + 'static {
    fn open(&self, artifact: &ExportArtifact);
}

/// Notifier that emits tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn info(&self, message: &str) {
        info!(notification = "info", "{message}");
    }

    fn success(&self, message: &str) {
        info!(notification = "success", "{message}");
    }

    fn error(&self, message: &str) {
        error!(notification = "error", "{message}");
    }
}

/// Opener that only logs the retrieval location
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingOpener;

impl ArtifactOpener for LoggingOpener {
    fn open(&self, artifact: &ExportArtifact) {
        info!(
            job_id = %artifact.job_id,
            format = %artifact.format,
            url = %artifact.url,
            "Export artifact available"
        );
    }
}

/// Notification and retrieval for finished runs
#[derive(Clone)]
pub struct ResultDelivery {
    backend: Arc<dyn ExportBackend>,
    notifier: Arc<dyn Notifier>,
    opener: Arc<dyn ArtifactOpener>,
}

impl std::fmt::Debug for ResultDelivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultDelivery").finish_non_exhaustive()
    }
}

impl ResultDelivery {
    pub fn new(
        backend: Arc<dyn ExportBackend>,
        notifier: Arc<dyn Notifier>,
        opener: Arc<dyn ArtifactOpener>,
    ) -> Self {
        Self {
            backend,
            notifier,
            opener,
        }
    }

    pub fn notify_started(&self) {
        self.notifier.info(messages::EXPORT_STARTED);
    }

    /// Derive the artifact for a finished job without touching the network
    pub fn artifact_for(&self, job_id: JobId, format: ExportFormat) -> ExportArtifact {
        let url = self.backend.determine_export_url(&job_id);
        ExportArtifact {
            job_id,
            url,
            format,
        }
    }

    pub fn deliver_success(&self, key: &ResourceKey, artifact: &ExportArtifact) {
        self.notifier.success(messages::EXPORT_COMPLETE);
        self.opener.open(artifact);
        info!(resource = %key, job_id = %artifact.job_id, "Export delivered");
    }

    pub fn deliver_failure(&self, key: &ResourceKey, error: &ExportError) {
        self.notifier.error(messages::EXPORT_FAILED);
        log_error(
            "result_delivery",
            operations::EXPORT_FAILED,
            &error.to_string(),
            Some(&key.to_string()),
        );
    }
}
