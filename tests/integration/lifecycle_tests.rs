//! Task lifecycle: commands, queries and cancellation

use crate::support::{
    collect_events, finish, Behavior, FailingStore, FakeSite, Gate, Harness, ScriptedCapability,
};
use pagegauge::storage::{MemoryStore, TaskStore};
use pagegauge::task::{SubmitRequest, TaskId};
use pagegauge::{InputError, OrchestratorError, ProgressEvent, TaskStatus};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_invalid_submission_creates_no_task() {
    let orchestrator = Harness::new(ScriptedCapability::new()).build();

    let empty = orchestrator.submit(SubmitRequest::manual(Vec::<String>::new()));
    assert!(matches!(
        empty,
        Err(OrchestratorError::Input(InputError::Validation(_)))
    ));

    let bad_url = orchestrator.submit(SubmitRequest::manual(["ftp://files.test/"]));
    assert!(matches!(
        bad_url,
        Err(OrchestratorError::Input(InputError::InvalidUrl(_)))
    ));

    let deep = orchestrator.submit(SubmitRequest::crawl("https://site.test/").with_max_depth(99));
    assert!(matches!(deep, Err(OrchestratorError::Input(_))));

    assert!(orchestrator.list_tasks().is_empty());
}

#[tokio::test]
async fn test_unknown_task_is_not_found() {
    let orchestrator = Harness::new(ScriptedCapability::new()).build();
    let missing = TaskId::new("no-such-task");

    assert!(matches!(
        orchestrator.cancel(&missing),
        Err(OrchestratorError::NotFound(_))
    ));
    assert!(matches!(
        orchestrator.get_progress(&missing),
        Err(OrchestratorError::NotFound(_))
    ));
    assert!(matches!(
        orchestrator.get_report(&missing),
        Err(OrchestratorError::NotFound(_))
    ));
    assert!(matches!(
        orchestrator.wait(&missing).await,
        Err(OrchestratorError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_report_not_ready_while_running() {
    let gate = Arc::new(Gate::default());
    let capability =
        ScriptedCapability::new().on("https://gate.test/", Behavior::Gated(gate.clone()));
    let orchestrator = Harness::new(capability).build();

    let task_id = orchestrator
        .submit(SubmitRequest::manual(["https://gate.test/"]))
        .unwrap();
    gate.entered().await;

    assert_eq!(
        orchestrator.get_task(&task_id).unwrap().status,
        TaskStatus::Running
    );
    assert!(matches!(
        orchestrator.get_report(&task_id),
        Err(OrchestratorError::NotReady {
            status: TaskStatus::Running,
            ..
        })
    ));
    assert!(matches!(
        orchestrator.purge(&task_id),
        Err(OrchestratorError::InvalidState { .. })
    ));

    gate.release();
    assert_eq!(finish(&orchestrator, &task_id).await, TaskStatus::Completed);
    assert!(orchestrator.get_report(&task_id).is_ok());
}

#[tokio::test]
async fn test_cancel_mid_run_yields_partial_report() {
    let gate = Arc::new(Gate::default());
    let capability =
        ScriptedCapability::new().on("https://b.test/", Behavior::Gated(gate.clone()));
    let orchestrator = Harness::new(capability.clone()).build();
    let mut events = orchestrator.subscribe();

    let task_id = orchestrator
        .submit(SubmitRequest::manual([
            "https://a.test/",
            "https://b.test/",
            "https://c.test/",
            "https://d.test/",
        ]))
        .unwrap();

    // b is in flight; cancelling lets it finish but starts nothing else
    gate.entered().await;
    orchestrator.cancel(&task_id).unwrap();
    orchestrator.cancel(&task_id).unwrap();
    let cancelled_at = Instant::now();
    gate.release();

    let events = collect_events(&mut events, &task_id).await;
    assert!(cancelled_at.elapsed() < Duration::from_secs(5));
    assert!(matches!(events.last(), Some(ProgressEvent::Cancelled { .. })));
    assert_eq!(finish(&orchestrator, &task_id).await, TaskStatus::Cancelled);

    assert!(matches!(
        orchestrator.get_report(&task_id),
        Err(OrchestratorError::NotReady {
            status: TaskStatus::Cancelled,
            ..
        })
    ));
    let report = orchestrator.get_partial_report(&task_id).unwrap();
    assert!(report.is_partial());
    assert!(report.is_fully_accounted());
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.skipped, vec!["https://c.test/", "https://d.test/"]);
    assert_eq!(capability.navigated(), vec!["https://a.test/", "https://b.test/"]);

    let progress = orchestrator.get_progress(&task_id).unwrap();
    assert_eq!(progress.percent, 50);
    assert_eq!(progress.status, TaskStatus::Cancelled);
    assert!(progress
        .last_log()
        .unwrap()
        .message
        .contains("2 of 4 URLs processed"));
}

#[tokio::test]
async fn test_terminal_task_cannot_be_cancelled() {
    let orchestrator = Harness::new(ScriptedCapability::new()).build();
    let task_id = orchestrator
        .submit(SubmitRequest::manual(["https://a.test/"]))
        .unwrap();
    assert_eq!(finish(&orchestrator, &task_id).await, TaskStatus::Completed);

    assert!(matches!(
        orchestrator.cancel(&task_id),
        Err(OrchestratorError::InvalidState {
            status: TaskStatus::Completed,
            ..
        })
    ));
    assert_eq!(
        orchestrator.get_task(&task_id).unwrap().status,
        TaskStatus::Completed
    );
    // Waiting again on a finished task resolves immediately
    assert_eq!(finish(&orchestrator, &task_id).await, TaskStatus::Completed);
}

#[tokio::test]
async fn test_purge_forgets_task_but_keeps_records() {
    let store = Arc::new(MemoryStore::new());
    let orchestrator = Harness::new(ScriptedCapability::new())
        .store(store.clone())
        .build();
    let task_id = orchestrator
        .submit(SubmitRequest::manual(["https://a.test/"]))
        .unwrap();
    finish(&orchestrator, &task_id).await;

    orchestrator.purge(&task_id).unwrap();
    assert!(matches!(
        orchestrator.get_task(&task_id),
        Err(OrchestratorError::NotFound(_))
    ));
    assert!(orchestrator.list_tasks().is_empty());
    assert!(store.load_task(&task_id).await.unwrap().is_some());
    assert!(store.load_report(&task_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_tasks_run_independently() {
    let gate = Arc::new(Gate::default());
    let capability =
        ScriptedCapability::new().on("https://held.test/", Behavior::Gated(gate.clone()));
    let orchestrator = Harness::new(capability).build();

    let held = orchestrator
        .submit(SubmitRequest::manual(["https://held.test/"]))
        .unwrap();
    gate.entered().await;
    let quick = orchestrator
        .submit(SubmitRequest::manual(["https://quick.test/"]))
        .unwrap();

    assert_eq!(finish(&orchestrator, &quick).await, TaskStatus::Completed);
    assert_eq!(
        orchestrator.get_task(&held).unwrap().status,
        TaskStatus::Running
    );

    let tasks: Vec<_> = orchestrator.list_tasks().into_iter().map(|t| t.id).collect();
    assert_eq!(tasks, vec![held.clone(), quick.clone()]);

    gate.release();
    assert_eq!(finish(&orchestrator, &held).await, TaskStatus::Completed);
}

#[tokio::test]
async fn test_cancel_during_discovery_measures_nothing() {
    let gate = Arc::new(Gate::default());
    let site = FakeSite::default()
        .page("https://site.test/", &["/a"])
        .gated("https://site.test/a", gate.clone());
    let capability = ScriptedCapability::new();
    let orchestrator = Harness::new(capability.clone()).site(site).build();

    let task_id = orchestrator
        .submit(SubmitRequest::crawl("https://site.test/").with_max_depth(1))
        .unwrap();

    // The seed has been read and the crawl is stuck on its first link
    gate.entered().await;
    orchestrator.cancel(&task_id).unwrap();

    assert_eq!(finish(&orchestrator, &task_id).await, TaskStatus::Cancelled);
    gate.release();

    let progress = orchestrator.get_progress(&task_id).unwrap();
    assert_eq!(progress.percent, 0);
    assert!(capability.navigated().is_empty());

    let report = orchestrator.get_partial_report(&task_id).unwrap();
    assert_eq!(report.discovered_urls.len(), 1);
    assert!(report.results.is_empty());
    assert_eq!(report.skipped, vec!["https://site.test/"]);
    assert!(report.is_fully_accounted());
}

#[tokio::test]
async fn test_cancel_while_report_is_persisted_is_refused() {
    let gate = Arc::new(Gate::default());
    let orchestrator = Harness::new(ScriptedCapability::new())
        .store(Arc::new(FailingStore::gated_reports(gate.clone())))
        .build();
    let mut events = orchestrator.subscribe();

    let task_id = orchestrator
        .submit(SubmitRequest::manual(["https://a.test/"]))
        .unwrap();

    // Every URL is measured and the report write is in progress
    gate.entered().await;
    assert!(matches!(
        orchestrator.cancel(&task_id),
        Err(OrchestratorError::InvalidState {
            status: TaskStatus::Running,
            ..
        })
    ));
    gate.release();

    let events = collect_events(&mut events, &task_id).await;
    assert!(matches!(events.last(), Some(ProgressEvent::Completed { .. })));
    assert_eq!(finish(&orchestrator, &task_id).await, TaskStatus::Completed);
    let report = orchestrator.get_report(&task_id).unwrap();
    assert_eq!(report.results.len(), 1);
}
