//! One-shot commands and recent-project history

use autopilot::cli::Command;
use autopilot::commands::{self, Context};
use autopilot::config::Settings;
use autopilot::history::RecentProjects;
use autopilot_sdk::GenerationBackend;
use std::path::Path;
use std::sync::Arc;

use super::common::*;

fn context(backend: Arc<MockBackend>, dir: &Path) -> Context {
    let settings = Settings {
        poll_interval_ms: 100,
        history_limit: 2,
        ..Settings::default()
    };
    Context {
        backend: backend as Arc<dyn GenerationBackend>,
        settings,
        history_path: dir.join("history.json"),
    }
}

async fn run(ctx: &Context, command: Command) -> anyhow::Result<String> {
    let mut out = Vec::new();
    commands::run(ctx, command, &mut out).await?;
    Ok(String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_create_is_remembered() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(Arc::new(MockBackend::new()), dir.path());

    for name in ["one", "two", "three"] {
        let output = run(
            &ctx,
            Command::Create {
                name: name.into(),
                tech_stack: "node-react".into(),
            },
        )
        .await
        .unwrap();
        assert!(output.contains("PENDING"));
    }

    let history = RecentProjects::load_from(&ctx.history_path);
    let names: Vec<&str> = history.projects.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["three", "two"]);

    let output = run(&ctx, Command::Recent).await.unwrap();
    assert!(output.starts_with("proj-3"));
    assert!(!output.contains("proj-1"));
}

#[tokio::test]
async fn test_create_rejects_blank_name() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(Arc::new(MockBackend::new()), dir.path());
    let err = run(
        &ctx,
        Command::Create {
            name: "  ".into(),
            tech_stack: "node-react".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("required"));
}

#[tokio::test]
async fn test_tree_lists_every_node() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MockBackend::with_project("p1", "DONE"));
    backend.set_tree(sample_tree());
    let ctx = context(backend, dir.path());

    let output = run(
        &ctx,
        Command::Tree {
            project_id: "p1".into(),
        },
    )
    .await
    .unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(
        lines,
        vec!["shop/", "  src/", "    app.ts", "    a.ts", "    b.ts", "  package.json"]
    );
}

#[tokio::test]
async fn test_optimize_prints_each_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MockBackend::with_project("p1", "DONE"));
    backend.set_tree(sample_tree());
    let ctx = context(backend, dir.path());

    let output = run(
        &ctx,
        Command::Optimize {
            project_id: "p1".into(),
            paths: vec!["/src/a.ts".into(), "/src/b.ts".into()],
        },
    )
    .await
    .unwrap();
    assert!(output.contains("✓ /src/a.ts: Optimized"));
    assert!(output.contains("✓ /src/b.ts: Optimized"));

    let err = run(
        &ctx,
        Command::Optimize {
            project_id: "p1".into(),
            paths: vec!["/nope.ts".into()],
        },
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("/nope.ts"));
}

#[tokio::test(start_paused = true)]
async fn test_status_watch_follows_to_done() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MockBackend::with_project("p1", "PARSING"));
    backend.script_statuses("p1", &["PARSING", "GENERATING", "DONE"]);
    let ctx = context(backend.clone(), dir.path());

    let output = run(
        &ctx,
        Command::Status {
            project_id: "p1".into(),
            watch: true,
        },
    )
    .await
    .unwrap();
    assert!(output.contains("Parsing specification files"));
    assert!(output.contains("Generating project files"));
    assert!(output.contains("Project generation completed successfully"));
    assert!(output.contains("autopilot tree p1"));
}

#[tokio::test]
async fn test_status_of_failed_project_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(Arc::new(MockBackend::with_project("p1", "FAILED")), dir.path());
    let err = run(
        &ctx,
        Command::Status {
            project_id: "p1".into(),
            watch: false,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Project generation failed");
}

#[tokio::test]
async fn test_new_without_watch() {
    let dir = tempfile::tempdir().unwrap();
    let specs = tempfile::tempdir().unwrap();
    let form_dir = specs.path();
    complete_form(form_dir);
    let backend = Arc::new(MockBackend::new());
    let ctx = context(backend.clone(), dir.path());

    let output = run(
        &ctx,
        Command::New {
            name: "shop".into(),
            tech_stack: "node-react".into(),
            features: form_dir.join("features.xlsx"),
            apis: form_dir.join("apis.xlsx"),
            database: form_dir.join("database.xlsx"),
            tech_stack_file: form_dir.join("tech_stack.xlsx"),
            no_watch: true,
        },
    )
    .await
    .unwrap();
    assert!(output.contains("Project proj-1 created"));
    assert_eq!(backend.generate_calls(), 1);
    assert_eq!(
        RecentProjects::load_from(&ctx.history_path)
            .projects
            .iter()
            .find(|p| p.id == "proj-1")
            .map(|p| p.name.clone()),
        Some("shop".to_string())
    );
}

#[tokio::test]
async fn test_server_error_message_is_surfaced() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(Arc::new(MockBackend::new()), dir.path());
    let err = run(
        &ctx,
        Command::Cat {
            project_id: "p1".into(),
            path: "/src/app.ts".into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "File not found");
}

#[tokio::test]
async fn test_optimize_repeated_path_is_sent_once() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MockBackend::with_project("p1", "DONE"));
    backend.set_tree(sample_tree());
    let ctx = context(backend.clone(), dir.path());

    let output = run(
        &ctx,
        Command::Optimize {
            project_id: "p1".into(),
            paths: vec!["/src/a.ts".into(), "/src/a.ts".into()],
        },
    )
    .await
    .unwrap();
    assert_eq!(output.matches("✓ /src/a.ts").count(), 1);
    assert_eq!(backend.optimize_calls(), vec![vec!["/src/a.ts".to_string()]]);
}
