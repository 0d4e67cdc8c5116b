//! # Export Backend Client
//!
//! Everything the orchestrator needs to reach the export service:
//!
//! - **ExportBackend**: the async seam the orchestration layer depends on
//! - **ExportApiClient**: reqwest implementation for both API shapes
//! - **ClientError**: transport-level failures

pub mod backend;
pub mod error;
pub mod export_client;

pub use backend::{CreatedExport, ExportBackend};
pub use error::{ClientError, ClientResult};
pub use export_client::{ApiProtocol, ExportApiClient, ExportApiConfig};
