#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Export Orchestrator
//!
//! Asynchronous export-job orchestration: turns a user-triggered "export this
//! resource" request into a reliably tracked background job.
//!
//! ## Overview
//!
//! A trigger for a resource passes a per-resource debounce window, is
//! submitted to the export service, and is then polled on a fixed interval
//! under an attempt budget. The outcome is delivered as notifications, an
//! optional artifact retrieval, and an awaitable [`ExportHandle`].
//!
//! ## Module Organization
//!
//! - [`models`] - Resource keys, job ids, formats and artifacts
//! - [`state_machine`] - Per-resource `Idle → Submitting → Polling → Succeeded/Failed` instances
//! - [`registry`] - One instance per resource key
//! - [`orchestration`] - Debounce gate, polling engine, delivery and the orchestrator
//! - [`client`] - Backend seam and the HTTP client
//! - [`config`] - YAML configuration with environment overrides
//! - [`error`] - Domain error taxonomy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use export_orchestrator::client::{ExportApiClient, ExportApiConfig};
//! use export_orchestrator::orchestration::{
//!     ExportOrchestrator, LoggingOpener, OrchestratorSettings, TracingNotifier,
//! };
//! use export_orchestrator::models::ResourceKey;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ExportApiClient::new(ExportApiConfig::default())?;
//! let orchestrator = ExportOrchestrator::new(
//!     Arc::new(client),
//!     Arc::new(TracingNotifier),
//!     Arc::new(LoggingOpener),
//!     OrchestratorSettings::default(),
//! );
//!
//! let outcome = orchestrator.export_item(ResourceKey::dashboard(42), None).await;
//! println!("export finished: {outcome:?}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod registry;
pub mod state_machine;
pub mod test_helpers;

pub use client::{ExportApiClient, ExportApiConfig, ExportBackend};
pub use config::{ConfigManager, ConfigurationError, ExporterConfig};
pub use error::{ExportError, Result};
pub use models::{ExportArtifact, ExportFormat, JobId, ResourceKey, ResourceKind};
pub use orchestration::{
    ExportHandle, ExportOrchestrator, OrchestratorSettings, PollSettings, SuccessCallback,
    TransportErrorPolicy,
};
pub use registry::InstanceRegistry;
pub use state_machine::{ExportOutcome, JobSnapshot, JobState};
