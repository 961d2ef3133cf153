//! Status page lifecycle against the mock backend

use autopilot::poller::StatusPoller;
use autopilot::views::{FilesView, StatusView};
use autopilot::pipeline::Pipeline;
use autopilot_sdk::{
    ApiError, CreateProjectRequest, GenerationBackend, ProjectStatus, Severity, StepStatus,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::common::*;

#[tokio::test]
async fn test_initial_load_failure_is_blocking() {
    let backend = MockBackend::new();
    let mut view = StatusView::new("missing");
    let err = view.load(&backend).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(
        view.load_error.as_deref(),
        Some("Project with id missing not found")
    );
    assert!(!view.needs_polling());
    assert!(!view.actions_enabled());
}

#[tokio::test(start_paused = true)]
async fn test_end_to_end_generation() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MockBackend::new());
    backend.set_tree(sample_tree());
    backend.set_content("/src/app.ts", "export const app = express();\n");

    let created = backend
        .create_project(&CreateProjectRequest {
            name: "shop".into(),
            tech_stack: "node-react".into(),
        })
        .await
        .unwrap();
    assert_eq!(created.status, ProjectStatus::Pending);
    let id = created.id;

    let upload = complete_form(dir.path()).read_upload().await.unwrap();
    backend.upload_specs(&id, &upload).await.unwrap();
    backend.generate(&id).await.unwrap();

    let mut view = StatusView::new(id.clone());
    view.load(backend.as_ref()).await.unwrap();
    assert_eq!(view.step, StepStatus::Parsing);
    assert!(!view.actions_enabled());

    backend.script_statuses(&id, &["PARSING", "GENERATING", "DONE"]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let poller = StatusPoller::spawn(
        backend.clone() as Arc<dyn GenerationBackend>,
        id.clone(),
        Duration::from_secs(5),
        tx,
    );

    let mut seen = Vec::new();
    while let Some(event) = rx.recv().await {
        let stopped = view.apply_poll(event);
        seen.push(view.step);
        if !stopped {
            assert!(!view.actions_enabled());
        }
    }
    poller.join().await;

    assert_eq!(
        seen,
        vec![StepStatus::Parsing, StepStatus::Generating, StepStatus::Ready]
    );
    assert!(view.actions_enabled());
    assert!(!view.needs_polling());
    assert_eq!(view.logs.last().unwrap().severity, Severity::Success);

    let mut files = FilesView::new(id.clone(), 64);
    files.load_tree(backend.as_ref()).await.unwrap();
    assert!(files.tree.as_ref().unwrap().is_file("/src/app.ts"));
    files.open_file(backend.as_ref(), "/src/app.ts").await.unwrap();
    assert_eq!(
        files.content.as_deref(),
        Some("export const app = express();\n")
    );
}

#[tokio::test]
async fn test_retry_refreshes_from_server() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new();
    let created = backend
        .create_project(&CreateProjectRequest {
            name: "shop".into(),
            tech_stack: "node-react".into(),
        })
        .await
        .unwrap();
    let upload = complete_form(dir.path()).read_upload().await.unwrap();
    backend.upload_specs(&created.id, &upload).await.unwrap();

    let mut view = StatusView::new(created.id.clone());
    view.load(&backend).await.unwrap();
    assert!(view.can_retry());

    view.retry_generation(&backend).await.unwrap();
    assert_eq!(backend.generate_calls(), 1);
    // The status comes from the re-read, not from the generate call
    assert_eq!(view.status(), Some(&ProjectStatus::Parsing));
    assert!(!view.can_retry());
    assert!(view.retry_generation(&backend).await.is_err());
    assert_eq!(backend.generate_calls(), 1);
}

#[tokio::test]
async fn test_retry_failure_keeps_status() {
    let backend = MockBackend::with_project("p1", "PENDING");
    backend.fail_generate(ApiError::server(500, "Specification files missing"));

    let mut view = StatusView::new("p1");
    view.load(&backend).await.unwrap();
    let err = view.retry_generation(&backend).await.unwrap_err();

    assert_eq!(err.to_string(), "Specification files missing");
    assert_eq!(view.status(), Some(&ProjectStatus::Pending));
    assert!(view.can_retry());
    assert_eq!(view.logs.count(Severity::Error), 1);
}

#[tokio::test]
async fn test_pipeline_project_starts_parsing() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new();
    let launched = Pipeline::new(&backend)
        .launch(&complete_form(dir.path()))
        .await
        .unwrap();

    let mut view = StatusView::new(launched.project_id);
    view.load(&backend).await.unwrap();
    assert_eq!(view.step, StepStatus::Parsing);
    assert!(view.needs_polling());
}
