//! Files page: stale content guard and the optimize workflow

use autopilot::views::{ContentTicket, FilesView};
use autopilot_sdk::{ApiError, ApiResult, FileContentResponse, FileOutcome, GenerationBackend};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::common::*;

async fn loaded_view(backend: &MockBackend) -> FilesView {
    let mut view = FilesView::new("p1", 64);
    view.load_tree(backend).await.unwrap();
    view
}

fn backend_with_files() -> Arc<MockBackend> {
    let backend = Arc::new(MockBackend::with_project("p1", "DONE"));
    backend.set_tree(sample_tree());
    backend.set_content("/src/a.ts", "A");
    backend.set_content("/src/b.ts", "B");
    backend.set_content("/src/app.ts", "APP");
    backend
}

/// Run a content fetch in the background, reporting back over `tx`
fn fetch(
    backend: &Arc<MockBackend>,
    ticket: ContentTicket,
    tx: &mpsc::UnboundedSender<(ContentTicket, ApiResult<FileContentResponse>)>,
) {
    let backend = Arc::clone(backend);
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = backend.get_file_content("p1", &ticket.path).await;
        let _ = tx.send((ticket, result));
    });
}

#[tokio::test(start_paused = true)]
async fn test_later_selection_wins_when_earlier_arrives_last() {
    let backend = backend_with_files();
    backend.set_content_delay("/src/a.ts", Duration::from_secs(5));
    backend.set_content_delay("/src/b.ts", Duration::from_secs(1));
    let mut view = loaded_view(&backend).await;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let a = view.begin_select("/src/a.ts").unwrap();
    fetch(&backend, a, &tx);
    let b = view.begin_select("/src/b.ts").unwrap();
    fetch(&backend, b, &tx);
    drop(tx);

    let mut applied = Vec::new();
    while let Some((ticket, result)) = rx.recv().await {
        if view.finish_select(&ticket, result) {
            applied.push(ticket.path.clone());
        }
        assert_ne!(view.content.as_deref(), Some("A"));
    }

    assert_eq!(applied, vec!["/src/b.ts"]);
    assert_eq!(view.selected_file.as_deref(), Some("/src/b.ts"));
    assert_eq!(view.content.as_deref(), Some("B"));
}

#[tokio::test(start_paused = true)]
async fn test_later_selection_stays_loading_until_its_own_result() {
    let backend = backend_with_files();
    backend.set_content_delay("/src/a.ts", Duration::from_secs(1));
    backend.set_content_delay("/src/b.ts", Duration::from_secs(5));
    let mut view = loaded_view(&backend).await;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let a = view.begin_select("/src/a.ts").unwrap();
    fetch(&backend, a, &tx);
    let b = view.begin_select("/src/b.ts").unwrap();
    fetch(&backend, b, &tx);

    let (ticket, result) = rx.recv().await.unwrap();
    assert_eq!(ticket.path, "/src/a.ts");
    assert!(!view.finish_select(&ticket, result));
    assert!(view.content_loading);
    assert!(view.content.is_none());

    let (ticket, result) = rx.recv().await.unwrap();
    assert!(view.finish_select(&ticket, result));
    assert_eq!(view.content.as_deref(), Some("B"));
}

#[tokio::test]
async fn test_content_error_is_shown_in_viewer() {
    let backend = backend_with_files();
    let mut view = loaded_view(&backend).await;
    let err = view
        .open_file(backend.as_ref(), "/package.json")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "File not found");
    assert_eq!(view.content_error.as_deref(), Some("File not found"));
    assert!(!view.content_loading);
}

#[tokio::test]
async fn test_optimize_mixed_outcome() {
    let backend = backend_with_files();
    backend.set_optimize_response(Ok(vec![
        (
            "/src/a.ts".to_string(),
            FileOutcome {
                success: true,
                message: "Optimized".to_string(),
            },
        ),
        (
            "/src/b.ts".to_string(),
            FileOutcome {
                success: false,
                message: "syntax error".to_string(),
            },
        ),
    ]));
    let mut view = loaded_view(&backend).await;

    view.toggle_selection("/src/a.ts");
    view.toggle_selection("/src/b.ts");
    view.optimize(backend.as_ref()).await.unwrap();

    assert_eq!(
        backend.optimize_calls(),
        vec![vec!["/src/a.ts".to_string(), "/src/b.ts".to_string()]]
    );
    let successes: Vec<_> = view.optimize_results.iter().filter(|l| l.success).collect();
    let failures: Vec<_> = view.optimize_results.iter().filter(|l| !l.success).collect();
    assert_eq!(successes.len(), 1);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].path, "/src/b.ts");
    assert_eq!(failures[0].message, "syntax error");
    assert!(view.selected_for_optimization.is_empty());
    assert!(!view.optimize_in_progress);
}

#[tokio::test]
async fn test_empty_selection_sends_nothing() {
    let backend = backend_with_files();
    let mut view = loaded_view(&backend).await;
    let err = view.optimize(backend.as_ref()).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(err.to_string(), "Select at least one file to optimize");
    assert!(backend.optimize_calls().is_empty());
}

#[tokio::test]
async fn test_optimize_failure_leaves_viewer_alone() {
    let backend = backend_with_files();
    backend.set_optimize_response(Err(ApiError::server(503, "Optimizer unavailable")));
    let mut view = loaded_view(&backend).await;
    view.open_file(backend.as_ref(), "/src/a.ts").await.unwrap();

    view.toggle_selection("/src/a.ts");
    let err = view.optimize(backend.as_ref()).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(view.selected_for_optimization.is_empty());
    assert_eq!(view.content.as_deref(), Some("A"));
    assert_eq!(view.logs.last().unwrap().message, "Optimizer unavailable");
}

#[tokio::test]
async fn test_optimize_refreshes_open_file() {
    let backend = backend_with_files();
    let mut view = loaded_view(&backend).await;
    view.open_file(backend.as_ref(), "/src/app.ts").await.unwrap();
    assert_eq!(view.content.as_deref(), Some("APP"));

    backend.set_content("/src/app.ts", "APP (optimized)");
    view.toggle_selection("/src/app.ts");
    view.optimize(backend.as_ref()).await.unwrap();
    assert_eq!(view.content.as_deref(), Some("APP (optimized)"));
}

#[tokio::test]
async fn test_contract_violation_in_tree_is_reported() {
    let backend = MockBackend::with_project("p1", "DONE");
    backend.set_tree(autopilot_sdk::FileTreeNode::directory(
        "shop",
        "/",
        vec![
            autopilot_sdk::FileTreeNode::file("a.ts", "/a.ts"),
            autopilot_sdk::FileTreeNode::file("a.ts", "/a.ts"),
        ],
    ));
    let mut view = FilesView::new("p1", 64);
    let err = view.load_tree(&backend).await.unwrap_err();
    assert!(matches!(err, ApiError::Contract(_)));
    assert!(view.tree.is_none());
    assert!(view.tree_error.is_some());
}
