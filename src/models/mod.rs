pub mod job;
pub mod resource_key;

// Re-export core models for easy access
pub use job::{ExportArtifact, ExportFormat, ExportRequest, JobId, PollResult};
pub use resource_key::{ResourceIdentity, ResourceKey, ResourceKind};
