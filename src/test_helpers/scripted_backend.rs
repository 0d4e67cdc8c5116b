//! # Scripted Backend
//!
//! An [`ExportBackend`] whose responses are queued up front. Creation calls
//! pop from the creation script and fall back to a pending job `"job-1"`;
//! status checks pop from the status script and fall back to "not ready".

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::client::{ClientError, ClientResult, CreatedExport, ExportBackend};
use crate::models::{ExportRequest, JobId, PollResult};

pub const SCRIPTED_BASE_URL: &str = "https://exports.test";

#[derive(Debug, Default)]
pub struct ScriptedBackend {
    creations: Mutex<VecDeque<ClientResult<CreatedExport>>>,
    statuses: Mutex<VecDeque<ClientResult<PollResult>>>,
    requests: Mutex<Vec<ExportRequest>>,
    status_checks: AtomicUsize,
    create_delay: Option<Duration>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_creation(self, created: CreatedExport) -> Self {
        self.creations.lock().push_back(Ok(created));
        self
    }

    pub fn with_creation_error(self, error: ClientError) -> Self {
        self.creations.lock().push_back(Err(error));
        self
    }

    /// Queue status checks; `true` means the artifact is ready
    pub fn with_statuses(self, ready: impl IntoIterator<Item = bool>) -> Self {
        self.statuses
            .lock()
            .extend(ready.into_iter().map(|r| Ok(PollResult { ready: r })));
        self
    }

    pub fn with_status_error(self, error: ClientError) -> Self {
        self.statuses.lock().push_back(Err(error));
        self
    }

    /// Hold every creation call for `delay` before answering
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    pub fn create_calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<ExportRequest> {
        self.requests.lock().clone()
    }

    pub fn status_calls(&self) -> usize {
        self.status_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExportBackend for ScriptedBackend {
    async fn create_export(&self, request: &ExportRequest) -> ClientResult<CreatedExport> {
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        self.creations
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(CreatedExport::pending("job-1")))
    }

    async fn export_status(&self, _job_id: &JobId) -> ClientResult<PollResult> {
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(PollResult::not_ready()))
    }

    fn determine_export_url(&self, job_id: &JobId) -> String {
        format!("{SCRIPTED_BASE_URL}/exports/{job_id}/content?download=true")
    }
}
