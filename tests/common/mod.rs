//! Shared setup for the integration suites.

#![allow(dead_code)]

pub mod canned_server;

use std::sync::Arc;
use std::time::Duration;

use export_orchestrator::orchestration::{ExportOrchestrator, OrchestratorSettings};
use export_orchestrator::test_helpers::{RecordingNotifier, RecordingOpener, ScriptedBackend};
use export_orchestrator::ExportBackend;

pub struct TestHarness<B> {
    pub orchestrator: ExportOrchestrator,
    pub backend: Arc<B>,
    pub notifier: Arc<RecordingNotifier>,
    pub opener: Arc<RecordingOpener>,
}

pub fn harness_with<B: ExportBackend>(backend: B, settings: OrchestratorSettings) -> TestHarness<B> {
    let backend = Arc::new(backend);
    let notifier = Arc::new(RecordingNotifier::new());
    let opener = Arc::new(RecordingOpener::new());
    let orchestrator = ExportOrchestrator::new(
        backend.clone(),
        notifier.clone(),
        opener.clone(),
        settings,
    );

    TestHarness {
        orchestrator,
        backend,
        notifier,
        opener,
    }
}

/// Harness with default timings: 1s debounce, 20 checks every 2s
pub fn harness(backend: ScriptedBackend) -> TestHarness<ScriptedBackend> {
    harness_with(backend, OrchestratorSettings::default())
}

/// Settings for suites that run on the real clock
pub fn fast_settings() -> OrchestratorSettings {
    let mut settings = OrchestratorSettings {
        debounce: Duration::ZERO,
        ..OrchestratorSettings::default()
    };
    settings.poll.interval = Duration::from_millis(10);
    settings
}
