//! Polling cadence, termination and teardown

use autopilot::poller::{PollEvent, StatusPoller};
use autopilot_sdk::{ApiError, GenerationBackend, ProjectStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::common::*;

const PERIOD: Duration = Duration::from_secs(5);

fn spawn(backend: &Arc<MockBackend>) -> (StatusPoller, mpsc::UnboundedReceiver<PollEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let backend: Arc<dyn GenerationBackend> = backend.clone();
    (StatusPoller::spawn(backend, "p1", PERIOD, tx), rx)
}

fn status_of(event: &PollEvent) -> Option<&ProjectStatus> {
    match event {
        PollEvent::Status(p) | PollEvent::Finished(p) => Some(&p.status),
        PollEvent::Failed(_) => None,
    }
}

#[tokio::test(start_paused = true)]
async fn test_stops_after_terminal_status() {
    let backend = Arc::new(MockBackend::with_project("p1", "PENDING"));
    backend.script_statuses("p1", &["PARSING", "GENERATING", "DONE"]);
    let (poller, mut rx) = spawn(&backend);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.len(), 3);
    assert_eq!(status_of(&events[0]), Some(&ProjectStatus::Parsing));
    assert_eq!(status_of(&events[1]), Some(&ProjectStatus::Generating));
    assert!(matches!(&events[2], PollEvent::Finished(p) if p.status == ProjectStatus::Done));

    tokio::time::sleep(PERIOD * 10).await;
    assert_eq!(backend.get_project_calls(), 3);
    assert!(poller.is_finished());
}

#[tokio::test(start_paused = true)]
async fn test_failed_is_terminal_too() {
    let backend = Arc::new(MockBackend::with_project("p1", "GENERATING"));
    backend.script_statuses("p1", &["FAILED"]);
    let (_poller, mut rx) = spawn(&backend);

    let event = rx.recv().await.unwrap();
    assert!(matches!(event, PollEvent::Finished(ref p) if p.status == ProjectStatus::Failed));
    assert!(rx.recv().await.is_none());
    assert_eq!(backend.get_project_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_first_fetch_waits_one_period() {
    let backend = Arc::new(MockBackend::with_project("p1", "PARSING"));
    let (poller, _rx) = spawn(&backend);

    tokio::time::sleep(PERIOD - Duration::from_millis(1)).await;
    assert_eq!(backend.get_project_calls(), 0);

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(backend.get_project_calls(), 1);
    poller.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_failures_keep_polling() {
    let backend = Arc::new(MockBackend::with_project("p1", "PARSING"));
    backend.script(
        "p1",
        vec![
            Err(ApiError::transport("connection refused")),
            Err(ApiError::server(500, "Internal error")),
            Ok(project("p1", "DONE")),
        ],
    );
    let (_poller, mut rx) = spawn(&backend);

    let mut failures = 0;
    let mut finished = false;
    while let Some(event) = rx.recv().await {
        match event {
            PollEvent::Failed(e) => {
                assert!(e.is_transient());
                failures += 1;
            }
            PollEvent::Finished(_) => finished = true,
            PollEvent::Status(_) => {}
        }
    }
    assert_eq!(failures, 2);
    assert!(finished);
    assert_eq!(backend.get_project_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_polling() {
    let backend = Arc::new(MockBackend::with_project("p1", "PARSING"));
    let (poller, mut rx) = spawn(&backend);

    assert!(matches!(rx.recv().await, Some(PollEvent::Status(_))));
    poller.cancel();
    poller.join().await;

    let calls = backend.get_project_calls();
    tokio::time::sleep(PERIOD * 10).await;
    assert_eq!(backend.get_project_calls(), calls);
    assert!(rx.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_result_dropped_after_cancel() {
    let backend = Arc::new(MockBackend::with_project("p1", "PARSING"));
    backend.set_project_delay(Duration::from_secs(10));
    let (poller, mut rx) = spawn(&backend);

    // Fetch starts at 5s and would resolve at 15s
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(backend.get_project_calls(), 1);
    poller.cancel();
    poller.join().await;

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(rx.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_cancels() {
    let backend = Arc::new(MockBackend::with_project("p1", "PARSING"));
    let (poller, mut rx) = spawn(&backend);
    drop(poller);

    tokio::time::sleep(PERIOD * 3).await;
    assert_eq!(backend.get_project_calls(), 0);
    assert!(rx.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_slow_fetches_never_overlap() {
    let backend = Arc::new(MockBackend::with_project("p1", "GENERATING"));
    backend.set_project_delay(PERIOD * 3);
    let (poller, mut rx) = spawn(&backend);

    tokio::time::sleep(PERIOD * 20).await;
    poller.cancel();
    poller.join().await;

    assert_eq!(backend.max_in_flight(), 1);
    // Skipped ticks are not replayed: one fetch per three periods at most
    assert!(backend.get_project_calls() <= 7);
    while let Ok(event) = rx.try_recv() {
        assert!(matches!(event, PollEvent::Status(_)));
    }
}
