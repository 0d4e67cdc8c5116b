// State machine module for export job lifecycle
//
// Each resource owns one instance whose state moves through
// Idle -> Submitting -> Polling -> Succeeded/Failed under the control of
// the orchestration layer.

pub mod errors;
pub mod events;
pub mod instance;
pub mod snapshot;
pub mod states;

// Re-export main types for convenient access
pub use errors::{StateMachineError, StateMachineResult};
pub use events::ExportEvent;
pub use instance::{OrchestratorInstance, RunReservation};
pub use snapshot::{ExportOutcome, JobSnapshot};
pub use states::JobState;
