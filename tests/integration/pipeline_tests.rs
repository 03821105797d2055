//! End-to-end runs of the measure/score/report pipeline in manual mode

use crate::support::{
    collect_events, finish, slow_metrics, Behavior, FailingStore, Harness, ScriptedCapability,
};
use pagegauge::storage::{MemoryStore, TaskStore};
use pagegauge::task::{SubmitRequest, TaskMode};
use pagegauge::{OrchestratorError, ProgressEvent, TaskStatus};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_manual_run_produces_sorted_report() {
    let capability = ScriptedCapability::new()
        .on("https://slow.test/", Behavior::Metrics(slow_metrics()));
    let store = Arc::new(MemoryStore::new());
    let orchestrator = Harness::new(capability)
        .store(store.clone())
        .build();

    let task_id = orchestrator
        .submit(SubmitRequest::manual(["https://slow.test", "https://fast.test/"]))
        .unwrap();
    assert_eq!(finish(&orchestrator, &task_id).await, TaskStatus::Completed);

    let task = orchestrator.get_task(&task_id).unwrap();
    let report = orchestrator.get_report(&task_id).unwrap();

    assert_eq!(report.task_id, task_id);
    assert_eq!(report.mode, TaskMode::Manual);
    assert!(report.seed_url.is_none());
    assert!(report.generated_at >= task.created_at);
    assert_eq!(report.results.len(), 2);
    assert!(report.failures.is_empty());
    assert!(report.skipped.is_empty());
    assert!(report.is_fully_accounted());

    // Best score first
    assert_eq!(report.results[0].url, "https://fast.test/");
    assert_eq!(report.results[1].url, "https://slow.test/");
    assert!(report.results[0].overall_score > report.results[1].overall_score);

    // Discovery order follows the submitted list
    let discovered: Vec<_> = report.discovered_urls.iter().map(|d| d.url.as_str()).collect();
    assert_eq!(discovered, vec!["https://slow.test/", "https://fast.test/"]);
    assert!(report.discovered_urls.iter().all(|d| d.depth == 0));

    let progress = orchestrator.get_progress(&task_id).unwrap();
    assert_eq!(progress.percent, 100);
    assert_eq!(progress.status, TaskStatus::Completed);

    let stored = store.load_report(&task_id).await.unwrap().unwrap();
    assert_eq!(stored.results.len(), 2);
    let stored_task = store.load_task(&task_id).await.unwrap().unwrap();
    assert_eq!(stored_task.status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_one_failing_url_does_not_abort_the_batch() {
    let capability = ScriptedCapability::new()
        .on("https://b.test/", Behavior::Fail("connection reset"));
    let orchestrator = Harness::new(capability).build();

    let task_id = orchestrator
        .submit(SubmitRequest::manual([
            "https://a.test/",
            "https://b.test/",
            "https://c.test/",
        ]))
        .unwrap();
    assert_eq!(finish(&orchestrator, &task_id).await, TaskStatus::Completed);

    let report = orchestrator.get_report(&task_id).unwrap();
    let measured: Vec<_> = report.results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(measured.len(), 2);
    assert!(measured.contains(&"https://a.test/"));
    assert!(measured.contains(&"https://c.test/"));

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].url, "https://b.test/");
    assert!(report.failures[0].reason.contains("connection reset"));
    assert!(!report.failures[0].timed_out);
    assert!(report.is_fully_accounted());
}

#[tokio::test(start_paused = true)]
async fn test_hanging_measurement_is_recorded_as_timeout() {
    let capability = ScriptedCapability::new().on("https://stuck.test/", Behavior::Hang);
    let orchestrator = Harness::new(capability)
        .measurement_timeout(Duration::from_secs(2))
        .build();

    let task_id = orchestrator
        .submit(SubmitRequest::manual(["https://stuck.test/", "https://ok.test/"]))
        .unwrap();
    assert_eq!(finish(&orchestrator, &task_id).await, TaskStatus::Completed);

    let report = orchestrator.get_report(&task_id).unwrap();
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].url, "https://ok.test/");
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].timed_out);
}

#[tokio::test]
async fn test_event_stream_order() {
    let orchestrator = Harness::new(ScriptedCapability::new()).build();
    let mut events = orchestrator.subscribe();

    let task_id = orchestrator
        .submit(SubmitRequest::manual([
            "https://a.test/",
            "https://b.test/",
            "https://c.test/",
        ]))
        .unwrap();
    let events = collect_events(&mut events, &task_id).await;

    assert!(matches!(events.first(), Some(ProgressEvent::Started { .. })));
    match events.last() {
        Some(ProgressEvent::Completed { report, .. }) => assert_eq!(report.results.len(), 3),
        other => panic!("expected a completed event, got {:?}", other),
    }

    let mut last_percent = 0;
    let mut seqs = Vec::new();
    for event in &events {
        if let ProgressEvent::Progress { percent, log, .. } = event {
            assert!(*percent >= last_percent, "percent went backwards");
            last_percent = *percent;
            seqs.push(log.seq);
        }
    }
    assert_eq!(last_percent, 100);
    assert_eq!(seqs, (0..seqs.len() as u64).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_persisted_log_trail_matches_progress() {
    let store = Arc::new(MemoryStore::new());
    let orchestrator = Harness::new(ScriptedCapability::new())
        .store(store.clone())
        .build();

    let task_id = orchestrator
        .submit(SubmitRequest::manual(["https://a.test/"]))
        .unwrap();
    finish(&orchestrator, &task_id).await;

    let progress = orchestrator.get_progress(&task_id).unwrap();
    let stored = store.load_logs(&task_id).await.unwrap();
    assert_eq!(stored, progress.logs);
    assert_eq!(progress.logs[0].message, "task started");
    assert!(progress
        .last_log()
        .unwrap()
        .message
        .starts_with("task completed: 1 measured, 0 failed"));
}

#[tokio::test]
async fn test_workers_bound_concurrent_measurements() {
    let mut capability = ScriptedCapability::new();
    let urls: Vec<String> = (0..6).map(|i| format!("https://site{}.test/", i)).collect();
    for url in &urls {
        capability = capability.on(url, Behavior::Metrics(slow_metrics()));
    }
    let orchestrator = Harness::new(capability.clone()).workers(3).build();

    let task_id = orchestrator.submit(SubmitRequest::manual(urls.clone())).unwrap();
    assert_eq!(finish(&orchestrator, &task_id).await, TaskStatus::Completed);

    let report = orchestrator.get_report(&task_id).unwrap();
    assert_eq!(report.results.len(), 6);
    assert!(capability.peak_concurrency() <= 3);
    assert!(capability.peak_concurrency() >= 1);

    // Equal scores keep discovery order
    let measured: Vec<_> = report.results.iter().map(|r| r.url.clone()).collect();
    assert_eq!(measured, urls);
}

#[tokio::test]
async fn test_report_persistence_failure_fails_task() {
    let orchestrator = Harness::new(ScriptedCapability::new())
        .store(Arc::new(FailingStore::failing_reports()))
        .build();
    let mut events = orchestrator.subscribe();

    let task_id = orchestrator
        .submit(SubmitRequest::manual(["https://a.test/"]))
        .unwrap();
    let events = collect_events(&mut events, &task_id).await;

    match events.last() {
        Some(ProgressEvent::Failed { error, .. }) => assert!(error.contains("report")),
        other => panic!("expected a failed event, got {:?}", other),
    }
    assert_eq!(finish(&orchestrator, &task_id).await, TaskStatus::Failed);
    assert!(matches!(
        orchestrator.get_report(&task_id),
        Err(OrchestratorError::NotReady {
            status: TaskStatus::Failed,
            ..
        })
    ));
}

#[tokio::test]
async fn test_task_persistence_failure_fails_before_measuring() {
    let capability = ScriptedCapability::new();
    let orchestrator = Harness::new(capability.clone())
        .store(Arc::new(FailingStore::failing_tasks()))
        .build();

    let task_id = orchestrator
        .submit(SubmitRequest::manual(["https://a.test/"]))
        .unwrap();
    assert_eq!(finish(&orchestrator, &task_id).await, TaskStatus::Failed);
    assert!(capability.navigated().is_empty());
}

#[tokio::test]
async fn test_log_persistence_failure_is_tolerated() {
    let orchestrator = Harness::new(ScriptedCapability::new())
        .store(Arc::new(FailingStore::failing_logs()))
        .build();

    let task_id = orchestrator
        .submit(SubmitRequest::manual(["https://a.test/"]))
        .unwrap();
    assert_eq!(finish(&orchestrator, &task_id).await, TaskStatus::Completed);
    assert!(!orchestrator.get_progress(&task_id).unwrap().logs.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stalled_report_write_fails_task() {
    let orchestrator = Harness::new(ScriptedCapability::new())
        .store(Arc::new(FailingStore::hanging_reports()))
        .persist_timeout(Duration::from_secs(2))
        .build();
    let mut events = orchestrator.subscribe();

    let task_id = orchestrator
        .submit(SubmitRequest::manual(["https://a.test/"]))
        .unwrap();
    let events = collect_events(&mut events, &task_id).await;

    match events.last() {
        Some(ProgressEvent::Failed { error, .. }) => {
            assert!(error.contains("did not finish within"), "{}", error)
        }
        other => panic!("expected a failed event, got {:?}", other),
    }
    assert_eq!(finish(&orchestrator, &task_id).await, TaskStatus::Failed);
}
