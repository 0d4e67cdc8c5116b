//! End-to-end lifecycle of export runs against a scripted backend.
//!
//! All tests run on tokio's paused clock, so debounce windows and poll
//! intervals elapse instantly while keeping their relative order.

mod common;

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use common::{harness, harness_with};
use export_orchestrator::client::{ClientError, CreatedExport};
use export_orchestrator::constants::messages;
use export_orchestrator::test_helpers::{Notification, ScriptedBackend};
use export_orchestrator::{
    ExportArtifact, ExportError, ExportOutcome, JobState, OrchestratorSettings, ResourceKey,
    SuccessCallback, TransportErrorPolicy,
};

fn counting_callback() -> (SuccessCallback, Arc<Mutex<Vec<ExportArtifact>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let callback: SuccessCallback = {
        let seen = seen.clone();
        Box::new(move |artifact: &ExportArtifact| seen.lock().push(artifact.clone()))
    };
    (callback, seen)
}

#[tokio::test(start_paused = true)]
async fn test_success_path_transition_sequence() {
    let h = harness(
        ScriptedBackend::new()
            .with_create_delay(Duration::from_millis(100))
            .with_creation(CreatedExport::pending("abc"))
            .with_statuses([false, false, false, true]),
    );
    let key = ResourceKey::dashboard(42);

    let mut receiver = h.orchestrator.subscribe(&key);
    let collector = tokio::spawn(async move {
        let mut states = vec![receiver.borrow_and_update().state];
        while receiver.changed().await.is_ok() {
            let state = receiver.borrow_and_update().state;
            if states.last() != Some(&state) {
                states.push(state);
            }
            if state.is_terminal() {
                break;
            }
        }
        states
    });

    let (callback, seen) = counting_callback();
    let outcome = h.orchestrator.export_item(key.clone(), Some(callback)).await;

    assert_eq!(
        collector.await.unwrap(),
        vec![
            JobState::Idle,
            JobState::Submitting,
            JobState::Polling,
            JobState::Succeeded
        ]
    );

    let artifact = outcome.artifact().cloned().unwrap();
    assert_eq!(artifact.job_id.as_str(), "abc");
    assert_eq!(
        artifact.url,
        "https://exports.test/exports/abc/content?download=true"
    );
    assert_eq!(*seen.lock(), vec![artifact.clone()]);
    assert_eq!(h.opener.opened(), vec![artifact]);
    assert_eq!(h.backend.create_calls(), 1);
    assert_eq!(h.backend.status_calls(), 4);
    assert_eq!(
        h.notifier.notifications(),
        vec![
            Notification::Info(messages::EXPORT_STARTED.to_string()),
            Notification::Success(messages::EXPORT_COMPLETE.to_string()),
        ]
    );

    let snapshot = h.orchestrator.snapshot(&key).unwrap();
    assert_eq!(snapshot.run, 1);
    assert_eq!(snapshot.attempts_remaining, 16);
}

#[tokio::test(start_paused = true)]
async fn test_missing_id_fails_immediately() {
    let h = harness(ScriptedBackend::new().with_creation(CreatedExport::default()));
    let (callback, seen) = counting_callback();

    let outcome = h
        .orchestrator
        .export_item(ResourceKey::dashboard(42), Some(callback))
        .await;

    assert_eq!(outcome.error(), Some(&ExportError::MissingJobId));
    assert_eq!(h.backend.status_calls(), 0);
    assert!(seen.lock().is_empty());
    assert!(h.opener.opened().is_empty());
    assert_eq!(
        h.orchestrator.snapshot(&ResourceKey::dashboard(42)).unwrap().state,
        JobState::Failed
    );
}

#[tokio::test(start_paused = true)]
async fn test_synchronous_backend_skips_polling() {
    let h = harness(ScriptedBackend::new().with_creation(CreatedExport {
        job_id: Some("sync-1".to_string()),
        has_content: None,
    }));

    let outcome = h.orchestrator.export_item(ResourceKey::insight(5), None).await;

    assert!(outcome.is_success());
    assert_eq!(h.backend.status_calls(), 0);
    assert_eq!(h.opener.opened().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_attempt_budget_exhaustion() {
    let h = harness(ScriptedBackend::new().with_creation(CreatedExport::pending("slow")));
    let (callback, seen) = counting_callback();
    let started = tokio::time::Instant::now();

    let outcome = h
        .orchestrator
        .export_item(ResourceKey::dashboard(1), Some(callback))
        .await;

    assert_eq!(outcome.error(), Some(&ExportError::Timeout { attempts: 20 }));
    assert_eq!(h.backend.status_calls(), 20);
    assert!(seen.lock().is_empty());
    assert!(h.opener.opened().is_empty());
    // 1s debounce plus 20 intervals of 2s
    assert!(started.elapsed() >= Duration::from_secs(41));

    let snapshot = h.orchestrator.snapshot(&ResourceKey::dashboard(1)).unwrap();
    assert_eq!(snapshot.state, JobState::Failed);
    assert_eq!(snapshot.attempts_remaining, 0);
    assert_eq!(
        h.notifier.notifications().last(),
        Some(&Notification::Error(messages::EXPORT_FAILED.to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_rapid_triggers_coalesce_into_one_submission() {
    let h = harness(
        ScriptedBackend::new()
            .with_creation(CreatedExport::pending("abc"))
            .with_statuses([true]),
    );
    let key = ResourceKey::dashboard(42);

    let mut handles = Vec::new();
    let mut seen_all = Vec::new();
    for _ in 0..5 {
        let (callback, seen) = counting_callback();
        seen_all.push(seen);
        handles.push(h.orchestrator.export_item(key.clone(), Some(callback)));
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    assert!(h.orchestrator.export_pending(&key));
    assert!(!h.orchestrator.export_in_progress(&key));

    let outcomes = futures::future::join_all(handles.into_iter().map(|h| h.wait())).await;

    assert_eq!(h.backend.create_calls(), 1);
    let first = &outcomes[0];
    assert!(first.is_success());
    assert!(outcomes.iter().all(|o| o == first));
    // One retrieval, but every caller's callback sees the artifact once
    assert_eq!(h.opener.opened().len(), 1);
    assert!(seen_all.iter().all(|seen| seen.lock().len() == 1));
    assert_eq!(
        h.notifier
            .notifications()
            .iter()
            .filter(|n| matches!(n, Notification::Info(_)))
            .count(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_trigger_during_polling_joins_run() {
    let h = harness(
        ScriptedBackend::new()
            .with_creation(CreatedExport::pending("abc"))
            .with_statuses([false, false, true]),
    );
    let key = ResourceKey::insight(3);

    let first = h.orchestrator.export_item(key.clone(), None);
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert!(h.orchestrator.export_in_progress(&key));
    assert_eq!(h.orchestrator.snapshot(&key).unwrap().state, JobState::Polling);

    let second = h.orchestrator.export_item(key.clone(), None);
    assert!(second.joined());

    let (a, b) = tokio::join!(first.wait(), second.wait());
    assert!(a.is_success());
    assert_eq!(a, b);
    assert_eq!(h.backend.create_calls(), 1);
    assert_eq!(h.orchestrator.snapshot(&key).unwrap().run, 1);
}

#[tokio::test(start_paused = true)]
async fn test_distinct_keys_are_independent() {
    let h = harness(
        ScriptedBackend::new()
            .with_creation(CreatedExport::ready("one"))
            .with_creation(CreatedExport::ready("two")),
    );

    let a = h.orchestrator.export_item(ResourceKey::dashboard(1), None);
    let b = h.orchestrator.export_item(ResourceKey::dashboard(2), None);
    let (a, b) = tokio::join!(a.wait(), b.wait());

    assert!(a.is_success());
    assert!(b.is_success());
    assert_ne!(a, b);
    assert_eq!(h.backend.create_calls(), 2);
    assert_eq!(h.orchestrator.registry_stats().total_instances, 2);
    assert_eq!(h.orchestrator.registry_stats().in_progress, 0);
    let resources = h.orchestrator.resources();
    assert_eq!(resources.len(), 2);
    assert!(resources.contains(&ResourceKey::dashboard(1)));
    assert!(resources.contains(&ResourceKey::dashboard(2)));
}

#[tokio::test(start_paused = true)]
async fn test_new_run_after_terminal_state() {
    let h = harness(
        ScriptedBackend::new()
            .with_creation(CreatedExport::default())
            .with_creation(CreatedExport::ready("second")),
    );
    let key = ResourceKey::dashboard(8);

    let first = h.orchestrator.export_item(key.clone(), None).await;
    assert_eq!(first.error(), Some(&ExportError::MissingJobId));

    let second = h.orchestrator.export_item(key.clone(), None).await;
    assert_eq!(second.artifact().unwrap().job_id.as_str(), "second");
    assert_eq!(h.orchestrator.snapshot(&key).unwrap().run, 2);
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_fails_fast_by_default() {
    let h = harness(
        ScriptedBackend::new()
            .with_creation(CreatedExport::pending("abc"))
            .with_status_error(ClientError::api_error(502, "bad gateway"))
            .with_statuses([true]),
    );

    let outcome = h.orchestrator.export_item(ResourceKey::dashboard(1), None).await;

    match outcome {
        ExportOutcome::Failed {
            error: ExportError::TransportError { operation, .. },
        } => assert_eq!(operation, "export_status"),
        other => panic!("expected transport failure, got {other:?}"),
    }
    assert_eq!(h.backend.status_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_can_consume_an_attempt() {
    let mut settings = OrchestratorSettings::default();
    settings.poll.transport_error_policy = TransportErrorPolicy::ConsumeAttempt;
    let h = harness_with(
        ScriptedBackend::new()
            .with_creation(CreatedExport::pending("abc"))
            .with_status_error(ClientError::api_error(502, "bad gateway"))
            .with_statuses([true]),
        settings,
    );

    let outcome = h.orchestrator.export_item(ResourceKey::dashboard(1), None).await;

    assert!(outcome.is_success());
    assert_eq!(h.backend.status_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_create_failure_is_a_transport_error() {
    let h = harness(
        ScriptedBackend::new().with_creation_error(ClientError::api_error(500, "boom")),
    );

    let outcome = h.orchestrator.export_item(ResourceKey::dashboard(1), None).await;

    assert_eq!(outcome.error().map(ExportError::kind), Some("transport_error"));
    assert_eq!(h.backend.status_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_cancels_pending_triggers() {
    let h = harness(ScriptedBackend::new());
    let handle = h.orchestrator.export_item(ResourceKey::dashboard(1), None);

    h.orchestrator.teardown();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(handle.await.error(), Some(&ExportError::Abandoned));
    assert_eq!(h.backend.create_calls(), 0);
    assert_eq!(h.orchestrator.registry_stats().total_instances, 0);
    assert!(h.orchestrator.resources().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_late_awaited_handle_keeps_its_own_run() {
    let h = harness(
        ScriptedBackend::new()
            .with_creation(CreatedExport::ready("first"))
            .with_creation_error(ClientError::api_error(500, "boom")),
    );
    let key = ResourceKey::dashboard(42);
    let (callback, seen) = counting_callback();

    let first = h.orchestrator.export_item(key.clone(), Some(callback));
    tokio::time::sleep(Duration::from_secs(3)).await;
    let second = h.orchestrator.export_item(key.clone(), None);
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(h.orchestrator.snapshot(&key).unwrap().state, JobState::Failed);
    assert_eq!((first.run(), second.run()), (1, 2));

    let outcome = first.await;
    assert_eq!(outcome.artifact().unwrap().job_id.as_str(), "first");
    assert_eq!(seen.lock().len(), 1);

    let later = second.await;
    assert_eq!(later.error().map(ExportError::kind), Some("transport_error"));
}

#[tokio::test(start_paused = true)]
async fn test_superseded_handle_awaited_after_next_run() {
    let h = harness(
        ScriptedBackend::new()
            .with_creation(CreatedExport::ready("one"))
            .with_creation(CreatedExport::ready("two")),
    );
    let key = ResourceKey::insight(11);
    let (early_callback, early_seen) = counting_callback();
    let (late_callback, late_seen) = counting_callback();

    let superseded = h.orchestrator.export_item(key.clone(), Some(early_callback));
    tokio::time::sleep(Duration::from_millis(500)).await;
    let superseding = h.orchestrator.export_item(key.clone(), Some(late_callback));
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(h.backend.create_calls(), 1);

    // Another run completes before either handle is awaited
    h.orchestrator.export_item(key.clone(), None).await;
    assert_eq!(h.orchestrator.snapshot(&key).unwrap().run, 2);

    let (a, b) = tokio::join!(superseded.wait(), superseding.wait());
    assert_eq!(a, b);
    assert_eq!(a.artifact().unwrap().job_id.as_str(), "one");
    assert_eq!(early_seen.lock().len(), 1);
    assert_eq!(late_seen.lock()[0].job_id.as_str(), "one");
    assert_eq!(h.backend.create_calls(), 2);
}
