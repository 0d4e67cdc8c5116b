//! # Orchestration Engine
//!
//! Turns export triggers into tracked background jobs.
//!
//! ## Core Components
//!
//! - **DebounceGate**: per-key quiet window, last trigger wins
//! - **SubmissionEngine**: create call plus bounded wait-then-check polling
//! - **ResultDelivery**: notifications and artifact retrieval
//! - **ExportHandle**: awaitable outcome of a trigger, owns the success callback
//! - **ExportOrchestrator**: ties the above to the per-resource instances
//!
//! ```text
//! export_item ──► DebounceGate ──► run_export
//!                                    │ submit ──► poll_until_ready
//!                                    │ deliver
//!                                    └► terminal snapshot ──► ExportHandle
//! ```

pub mod debounce;
pub mod delivery;
pub mod handle;
pub mod orchestrator;
pub mod poller;

// Re-export core types and components for easy access
pub use debounce::DebounceGate;
pub use delivery::{ArtifactOpener, LoggingOpener, Notifier, ResultDelivery, TracingNotifier};
pub use handle::{ExportHandle, SuccessCallback};
pub use orchestrator::{ExportOrchestrator, OrchestratorSettings};
pub use poller::{
    Completion, PollSettings, PollStep, SubmissionEngine, SubmittedJob, TransportErrorPolicy,
};
