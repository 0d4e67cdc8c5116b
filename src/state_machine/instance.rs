//! # Orchestrator Instance
//!
//! Per-resource export state. All transitions of one instance go through a
//! single `watch` channel update, so they are strictly sequential and every
//! subscriber observes the same ordered sequence of snapshots.
//!
//! Terminal outcomes are additionally published per run. A caller reserves
//! the run it belongs to with [`OrchestratorInstance::reserve_run`] and keeps
//! that run's outcome even after later runs overwrite the snapshot.

use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::watch;
use tracing::debug;

use super::errors::{StateMachineError, StateMachineResult};
use super::events::ExportEvent;
use super::snapshot::{ExportOutcome, JobSnapshot};
use super::states::JobState;
use crate::models::ResourceKey;

/// Claim on the outcome of one run of an instance
#[derive(Debug)]
pub struct RunReservation {
    /// Run whose outcome `outcome` will carry
    pub run: u64,
    /// The run was already submitting or polling when reserved
    pub joined: bool,
    /// Holds `None` until the run finishes; closed if the instance is dropped first
    pub outcome: watch::Receiver<Option<ExportOutcome>>,
}

/// Export state owned by exactly one [`ResourceKey`]
#[derive(Debug)]
pub struct OrchestratorInstance {
    key: ResourceKey,
    snapshot_tx: watch::Sender<JobSnapshot>,
    // Runs with at least one reservation and no outcome yet
    run_outcomes: Mutex<HashMap<u64, watch::Sender<Option<ExportOutcome>>>>,
}

impl OrchestratorInstance {
    /// Create a fresh `Idle` instance
    pub fn new(key: ResourceKey) -> Self {
        let (snapshot_tx, _) = watch::channel(JobSnapshot::default());
        Self {
            key,
            snapshot_tx,
            run_outcomes: Mutex::new(HashMap::new()),
        }
    }

    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    pub fn snapshot(&self) -> JobSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn state(&self) -> JobState {
        self.snapshot_tx.borrow().state
    }

    pub fn in_progress(&self) -> bool {
        self.state().is_in_progress()
    }

    /// Receive every snapshot published from now on
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Reserve the outcome of the active run, or of the next run to start
    /// when none is active.
    pub fn reserve_run(&self) -> RunReservation {
        let mut run_outcomes = self.run_outcomes.lock();
        let (run, joined) = {
            let snapshot = self.snapshot_tx.borrow();
            if snapshot.in_progress() {
                (snapshot.run, true)
            } else {
                (snapshot.run + 1, false)
            }
        };

        let outcome = run_outcomes
            .entry(run)
            .or_insert_with(|| watch::channel(None).0)
            .subscribe();

        RunReservation {
            run,
            joined,
            outcome,
        }
    }

    /// Number of runs that still have reservations waiting on them
    pub fn reserved_runs(&self) -> usize {
        self.run_outcomes.lock().len()
    }

    /// Attempt to transition the instance, returning the new snapshot
    pub fn transition(&self, event: ExportEvent) -> StateMachineResult<JobSnapshot> {
        // Held across the update so a reservation never misses a terminal outcome
        let mut run_outcomes = self.run_outcomes.lock();
        let event_type = event.event_type();
        let terminal = event.is_terminal();
        let mut result = Err(StateMachineError::InvalidTransition {
            from: JobState::Idle,
            event: event_type,
        });

        self.snapshot_tx.send_if_modified(|snapshot| {
            let from = snapshot.state;
            match Self::determine_target_state(from, &event) {
                Ok(target) => {
                    snapshot.apply(target, event);
                    debug!(
                        resource = %self.key,
                        run = snapshot.run,
                        from = %from,
                        to = %target,
                        event = event_type,
                        "Export state transition"
                    );
                    result = Ok(snapshot.clone());
                    true
                }
                Err(err) => {
                    result = Err(err);
                    false
                }
            }
        });

        if let (true, Ok(snapshot)) = (terminal, &result) {
            if let Some(slot) = run_outcomes.remove(&snapshot.run) {
                slot.send_replace(snapshot.outcome.clone());
            }
        }

        result
    }

    /// Record the remaining status-check budget while polling
    pub fn record_attempt(&self, attempts_remaining: u32) {
        self.snapshot_tx.send_if_modified(|snapshot| {
            if snapshot.state != JobState::Polling {
                return false;
            }
            snapshot.attempts_remaining = attempts_remaining;
            true
        });
    }

    /// Determine the target state based on current state and event
    pub fn determine_target_state(
        current_state: JobState,
        event: &ExportEvent,
    ) -> StateMachineResult<JobState> {
        let target = match (current_state, event) {
            // A new run may begin from rest or from either terminal state
            (JobState::Idle | JobState::Succeeded | JobState::Failed, ExportEvent::Start { .. }) => {
                JobState::Submitting
            }

            (JobState::Submitting, ExportEvent::JobCreated(_)) => JobState::Polling,

            // Synchronous backends complete straight from submission
            (JobState::Submitting | JobState::Polling, ExportEvent::Complete(_)) => {
                JobState::Succeeded
            }

            (JobState::Submitting | JobState::Polling, ExportEvent::Fail(_)) => JobState::Failed,

            (from_state, event) => {
                return Err(StateMachineError::InvalidTransition {
                    from: from_state,
                    event: event.event_type(),
                })
            }
        };

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use crate::models::{ExportArtifact, ExportFormat, JobId};

    fn artifact(id: &str) -> ExportArtifact {
        ExportArtifact {
            job_id: JobId::new(id).unwrap(),
            url: format!("http://localhost/exports/{id}/content"),
            format: ExportFormat::Png,
        }
    }

    #[test]
    fn test_state_transitions() {
        let start = ExportEvent::Start { attempt_budget: 20 };
        assert_eq!(
            OrchestratorInstance::determine_target_state(JobState::Idle, &start).unwrap(),
            JobState::Submitting
        );
        assert_eq!(
            OrchestratorInstance::determine_target_state(JobState::Failed, &start).unwrap(),
            JobState::Submitting
        );
        assert_eq!(
            OrchestratorInstance::determine_target_state(
                JobState::Submitting,
                &ExportEvent::JobCreated(JobId::new("abc").unwrap())
            )
            .unwrap(),
            JobState::Polling
        );
        assert_eq!(
            OrchestratorInstance::determine_target_state(
                JobState::Submitting,
                &ExportEvent::Complete(artifact("abc"))
            )
            .unwrap(),
            JobState::Succeeded
        );
        assert_eq!(
            OrchestratorInstance::determine_target_state(
                JobState::Polling,
                &ExportEvent::Fail(ExportError::Timeout { attempts: 20 })
            )
            .unwrap(),
            JobState::Failed
        );
    }

    #[test]
    fn test_invalid_transitions() {
        // Cannot start while a run is active
        let start = ExportEvent::Start { attempt_budget: 20 };
        assert!(OrchestratorInstance::determine_target_state(JobState::Polling, &start).is_err());
        assert!(
            OrchestratorInstance::determine_target_state(JobState::Submitting, &start).is_err()
        );

        // Cannot complete without a run
        let err = OrchestratorInstance::determine_target_state(
            JobState::Idle,
            &ExportEvent::Complete(artifact("abc")),
        )
        .unwrap_err();
        assert_eq!(
            err,
            StateMachineError::InvalidTransition {
                from: JobState::Idle,
                event: "complete"
            }
        );

        // Polling is only entered from submission
        assert!(OrchestratorInstance::determine_target_state(
            JobState::Polling,
            &ExportEvent::JobCreated(JobId::new("abc").unwrap())
        )
        .is_err());
    }

    #[test]
    fn test_transition_updates_snapshot() {
        let instance = OrchestratorInstance::new(ResourceKey::dashboard(42));
        assert_eq!(instance.state(), JobState::Idle);
        assert!(!instance.in_progress());

        let snapshot = instance
            .transition(ExportEvent::Start { attempt_budget: 5 })
            .unwrap();
        assert_eq!(snapshot.run, 1);
        assert_eq!(snapshot.attempts_remaining, 5);
        assert!(instance.in_progress());

        instance
            .transition(ExportEvent::JobCreated(JobId::new("abc").unwrap()))
            .unwrap();
        instance.record_attempt(4);
        assert_eq!(instance.snapshot().attempts_remaining, 4);
        assert_eq!(instance.snapshot().job_id, Some(JobId::new("abc").unwrap()));

        let done = instance
            .transition(ExportEvent::Complete(artifact("abc")))
            .unwrap();
        assert_eq!(done.state, JobState::Succeeded);
        assert!(done.outcome.as_ref().unwrap().is_success());
        assert!(!instance.in_progress());

        // A new run clears the previous outcome
        let restarted = instance
            .transition(ExportEvent::Start { attempt_budget: 5 })
            .unwrap();
        assert_eq!(restarted.run, 2);
        assert!(restarted.outcome.is_none());
        assert!(restarted.job_id.is_none());
    }

    #[test]
    fn test_reserved_outcome_survives_later_runs() {
        let instance = OrchestratorInstance::new(ResourceKey::dashboard(1));

        let first = instance.reserve_run();
        assert_eq!(first.run, 1);
        assert!(!first.joined);
        assert_eq!(instance.reserved_runs(), 1);

        instance
            .transition(ExportEvent::Start { attempt_budget: 20 })
            .unwrap();
        let joined = instance.reserve_run();
        assert_eq!(joined.run, 1);
        assert!(joined.joined);

        instance
            .transition(ExportEvent::Complete(artifact("first")))
            .unwrap();
        assert_eq!(instance.reserved_runs(), 0);

        // A second run fails and overwrites the snapshot
        let second = instance.reserve_run();
        assert_eq!(second.run, 2);
        instance
            .transition(ExportEvent::Start { attempt_budget: 20 })
            .unwrap();
        instance
            .transition(ExportEvent::Fail(ExportError::MissingJobId))
            .unwrap();

        let kept = first.outcome.borrow().clone().unwrap();
        assert_eq!(kept.artifact().unwrap().job_id.as_str(), "first");
        assert_eq!(*joined.outcome.borrow(), Some(kept));
        assert_eq!(
            second.outcome.borrow().as_ref().and_then(ExportOutcome::error),
            Some(&ExportError::MissingJobId)
        );
    }

    #[test]
    fn test_dropping_instance_closes_reservations() {
        let instance = OrchestratorInstance::new(ResourceKey::insight(2));
        let reservation = instance.reserve_run();
        drop(instance);

        assert!(reservation.outcome.has_changed().is_err());
        assert!(reservation.outcome.borrow().is_none());
    }

    #[test]
    fn test_rejected_transition_leaves_state_untouched() {
        let instance = OrchestratorInstance::new(ResourceKey::insight(7));
        let mut rx = instance.subscribe();

        assert!(instance
            .transition(ExportEvent::Fail(ExportError::MissingJobId))
            .is_err());
        assert_eq!(instance.snapshot(), JobSnapshot::default());
        assert!(!rx.has_changed().unwrap());

        // Budget updates outside of polling are ignored
        instance.record_attempt(3);
        assert_eq!(instance.snapshot().attempts_remaining, 0);
    }
}
