//! # Export Backend Seam
//!
//! The orchestrator talks to the export service only through
//! [`ExportBackend`], so the HTTP client can be replaced by an in-process
//! double in tests or by another transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::ClientResult;
use crate::models::{ExportRequest, JobId, PollResult};

/// Raw creation response, before the orchestrator validates it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedExport {
    /// Backend job identifier, absent when the backend omitted it
    pub job_id: Option<String>,
    /// Readiness reported at creation time; `None` when the backend has no
    /// separate readiness signal
    pub has_content: Option<bool>,
}

impl CreatedExport {
    pub fn pending(job_id: impl Into<String>) -> Self {
        Self {
            job_id: Some(job_id.into()),
            has_content: Some(false),
        }
    }

    pub fn ready(job_id: impl Into<String>) -> Self {
        Self {
            job_id: Some(job_id.into()),
            has_content: Some(true),
        }
    }
}

/// Operations the orchestrator needs from the export service
#[async_trait]
pub trait ExportBackend: Send + Sync + 'static {
    /// Ask the backend to create an export job
    async fn create_export(&self, request: &ExportRequest) -> ClientResult<CreatedExport>;

    /// Check whether the job's artifact is ready
    async fn export_status(&self, job_id: &JobId) -> ClientResult<PollResult>;

    /// Retrieval location for a job's artifact; pure, no network access
    fn determine_export_url(&self, job_id: &JobId) -> String;
}
