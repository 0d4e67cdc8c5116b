//! # Export Orchestrator
//!
//! Caller-facing entry point. A trigger for a resource either joins the run
//! already in flight for that resource or schedules a new run through the
//! debounce gate. A run walks the instance through
//! `Submitting -> Polling -> Succeeded/Failed`, delivers the result, and then
//! publishes the terminal outcome that the run's handles resolve on.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::debounce::DebounceGate;
use super::delivery::{ArtifactOpener, Notifier, ResultDelivery};
use super::handle::{ExportHandle, SuccessCallback};
use super::poller::{Completion, PollSettings, SubmissionEngine};
use crate::client::ExportBackend;
use crate::constants::{default_debounce, operations};
use crate::error::Result;
use crate::logging::log_export_operation;
use crate::models::{ExportArtifact, ExportFormat, ResourceKey};
use crate::registry::{InstanceRegistry, RegistryStats};
use crate::state_machine::{ExportEvent, JobSnapshot, OrchestratorInstance};

/// Tunables for an [`ExportOrchestrator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    pub debounce: Duration,
    pub poll: PollSettings,
    pub export_format: ExportFormat,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            debounce: default_debounce(),
            poll: PollSettings::default(),
            export_format: ExportFormat::default(),
        }
    }
}

struct Inner {
    registry: InstanceRegistry,
    debounce: DebounceGate<ResourceKey>,
    engine: SubmissionEngine,
    delivery: ResultDelivery,
    settings: OrchestratorSettings,
}

/// Debounced, keyed export orchestration; cheap to clone
#[derive(Clone)]
pub struct ExportOrchestrator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ExportOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportOrchestrator")
            .field("settings", &self.inner.settings)
            .field("registry", &self.inner.registry.stats())
            .finish_non_exhaustive()
    }
}

impl ExportOrchestrator {
    pub fn new(
        backend: Arc<dyn ExportBackend>,
        notifier: Arc<dyn Notifier>,
        opener: Arc<dyn ArtifactOpener>,
        settings: OrchestratorSettings,
    ) -> Self {
        let engine = SubmissionEngine::new(backend.clone(), settings.export_format);
        let delivery = ResultDelivery::new(backend, notifier, opener);

        Self {
            inner: Arc::new(Inner {
                registry: InstanceRegistry::new(),
                debounce: DebounceGate::new(),
                engine,
                delivery,
                settings,
            }),
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.inner.settings
    }

    /// Trigger an export of `key`.
    ///
    /// While a run for `key` is submitting or polling the trigger joins it;
    /// otherwise a run is scheduled after the debounce window, superseding
    /// any run still waiting in that window. The handle resolves with the
    /// outcome of the run it joined or of the next run to start for `key`,
    /// and `on_success` is invoked by the handle only if that outcome is a
    /// success.
    pub fn export_item(
        &self,
        key: ResourceKey,
        on_success: Option<SuccessCallback>,
    ) -> ExportHandle {
        let instance = self.inner.registry.resolve(&key);
        let snapshots = instance.subscribe();
        let reservation = instance.reserve_run();
        let resource = key.to_string();

        if reservation.joined {
            log_export_operation(
                operations::EXPORT_JOINED,
                &resource,
                Some(reservation.run),
                instance.state().as_str(),
                None,
            );
            return ExportHandle::new(key, snapshots, reservation, on_success);
        }

        log_export_operation(
            operations::EXPORT_REQUESTED,
            &resource,
            Some(reservation.run),
            "debouncing",
            None,
        );

        let inner = Arc::clone(&self.inner);
        let run_key = key.clone();
        self.inner
            .debounce
            .schedule(key.clone(), self.inner.settings.debounce, async move {
                inner.run_export(run_key, instance).await;
            });

        ExportHandle::new(key, snapshots, reservation, on_success)
    }

    /// Whether a run for `key` is submitting or polling
    pub fn export_in_progress(&self, key: &ResourceKey) -> bool {
        self.inner
            .registry
            .get(key)
            .map(|instance| instance.in_progress())
            .unwrap_or(false)
    }

    /// Whether a trigger for `key` is still waiting out the debounce window
    pub fn export_pending(&self, key: &ResourceKey) -> bool {
        self.inner.debounce.is_pending(key)
    }

    pub fn snapshot(&self, key: &ResourceKey) -> Option<JobSnapshot> {
        self.inner.registry.get(key).map(|instance| instance.snapshot())
    }

    /// Observe every snapshot published for `key`, creating its instance if needed
    pub fn subscribe(&self, key: &ResourceKey) -> watch::Receiver<JobSnapshot> {
        self.inner.registry.resolve(key).subscribe()
    }

    pub fn registry_stats(&self) -> RegistryStats {
        self.inner.registry.stats()
    }

    /// Resources with an instance since the last teardown
    pub fn resources(&self) -> Vec<ResourceKey> {
        self.inner.registry.keys()
    }

    /// Cancel pending triggers and forget every instance.
    ///
    /// Runs already submitted finish in the background; handles whose run
    /// never started resolve as abandoned.
    pub fn teardown(&self) {
        let cancelled = self.inner.debounce.cancel_all();
        self.inner.registry.teardown();
        debug!(cancelled, "Export orchestrator torn down");
    }
}

impl Inner {
    async fn run_export(&self, key: ResourceKey, instance: Arc<OrchestratorInstance>) {
        let resource = key.to_string();
        let started = match instance.transition(ExportEvent::Start {
            attempt_budget: self.settings.poll.max_attempts,
        }) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                // A run that cleared the debounce gate earlier is still active
                debug!(resource = %resource, error = %e, "Export already running, trigger joined it");
                return;
            }
        };
        let run = started.run;

        log_export_operation(
            operations::EXPORT_SUBMITTING,
            &resource,
            Some(run),
            started.state.as_str(),
            None,
        );
        self.delivery.notify_started();

        let result = self.execute(&key, &instance, run).await;
        self.finish(&key, &instance, run, result);
    }

    async fn execute(
        &self,
        key: &ResourceKey,
        instance: &OrchestratorInstance,
        run: u64,
    ) -> Result<ExportArtifact> {
        let submitted = self.engine.submit(key).await?;

        if submitted.completion == Completion::Pending {
            if let Err(e) = instance.transition(ExportEvent::JobCreated(submitted.job_id.clone())) {
                warn!(resource = %key, run, error = %e, "Unexpected state after submission");
            }
            log_export_operation(
                operations::EXPORT_POLLING,
                &key.to_string(),
                Some(run),
                instance.state().as_str(),
                Some(submitted.job_id.as_str()),
            );

            self.engine
                .poll_until_ready(&submitted.job_id, &self.settings.poll, |remaining| {
                    instance.record_attempt(remaining)
                })
                .await?;
        }

        Ok(self
            .delivery
            .artifact_for(submitted.job_id, self.engine.format()))
    }

    /// Deliver side effects first, then publish the terminal state
    fn finish(
        &self,
        key: &ResourceKey,
        instance: &OrchestratorInstance,
        run: u64,
        result: Result<ExportArtifact>,
    ) {
        let resource = key.to_string();
        let event = match result {
            Ok(artifact) => {
                self.delivery.deliver_success(key, &artifact);
                log_export_operation(
                    operations::EXPORT_SUCCEEDED,
                    &resource,
                    Some(run),
                    "succeeded",
                    Some(&artifact.url),
                );
                ExportEvent::Complete(artifact)
            }
            Err(error) => {
                self.delivery.deliver_failure(key, &error);
                log_export_operation(
                    operations::EXPORT_FAILED,
                    &resource,
                    Some(run),
                    "failed",
                    Some(error.kind()),
                );
                ExportEvent::Fail(error)
            }
        };

        if let Err(e) = instance.transition(event) {
            warn!(resource = %resource, run, error = %e, "Could not publish export outcome");
        }
    }
}
