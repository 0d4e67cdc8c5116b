//! # Export Handle
//!
//! What a caller gets back from a trigger. Each handle is pinned to one run
//! of its instance: the run already in flight when it joined, or the next run
//! to start otherwise. Triggers superseded during the debounce window share
//! that next run with the trigger that superseded them. The handle resolves
//! with its run's outcome even when it is awaited after later runs.

use futures::future::BoxFuture;
use std::future::IntoFuture;
use tokio::sync::watch;

use crate::error::ExportError;
use crate::models::{ExportArtifact, ResourceKey};
use crate::state_machine::{ExportOutcome, JobSnapshot, RunReservation};

/// Invoked with the artifact once, and only when the run succeeds
pub type SuccessCallback = Box<dyn FnOnce(&ExportArtifact) + Send + 'static>;

pub struct ExportHandle {
    key: ResourceKey,
    snapshots: watch::Receiver<JobSnapshot>,
    reservation: RunReservation,
    on_success: Option<SuccessCallback>,
}

impl std::fmt::Debug for ExportHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportHandle")
            .field("key", &self.key)
            .field("run", &self.reservation.run)
            .field("joined", &self.reservation.joined)
            .field("has_callback", &self.on_success.is_some())
            .finish()
    }
}

impl ExportHandle {
    pub(crate) fn new(
        key: ResourceKey,
        snapshots: watch::Receiver<JobSnapshot>,
        reservation: RunReservation,
        on_success: Option<SuccessCallback>,
    ) -> Self {
        Self {
            key,
            snapshots,
            reservation,
            on_success,
        }
    }

    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Run number whose outcome this handle resolves with
    pub fn run(&self) -> u64 {
        self.reservation.run
    }

    /// Whether this trigger joined a run that was already in flight
    pub fn joined(&self) -> bool {
        self.reservation.joined
    }

    /// Latest published snapshot, without waiting
    pub fn snapshot(&self) -> JobSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Wait for the outcome, invoking the success callback if there is one.
    ///
    /// Resolves with [`ExportError::Abandoned`] if the orchestrator is torn
    /// down before the run reaches a terminal state.
    pub async fn wait(mut self) -> ExportOutcome {
        let receiver = &mut self.reservation.outcome;
        let outcome = loop {
            if let Some(outcome) = receiver.borrow_and_update().clone() {
                break outcome;
            }

            if receiver.changed().await.is_err() {
                break receiver
                    .borrow()
                    .clone()
                    .unwrap_or_else(|| ExportOutcome::failed(ExportError::Abandoned));
            }
        };

        if let (Some(callback), Some(artifact)) = (self.on_success.take(), outcome.artifact()) {
            callback(artifact);
        }

        outcome
    }
}

impl IntoFuture for ExportHandle {
    type Output = ExportOutcome;
    type IntoFuture = BoxFuture<'static, ExportOutcome>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}
