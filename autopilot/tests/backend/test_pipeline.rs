//! Create, upload, generate

use autopilot::pipeline::Pipeline;
use autopilot::upload::UploadForm;
use autopilot_sdk::{ApiError, GenerationBackend, ProjectStatus, SpecKind, SpecUpload};

use super::common::*;

#[tokio::test]
async fn test_launch_runs_every_stage() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new();
    let launched = Pipeline::new(&backend)
        .launch(&complete_form(dir.path()))
        .await
        .unwrap();

    assert_eq!(launched.created.status, ProjectStatus::Pending);
    assert_eq!(launched.upload.uploaded_files.len(), 4);
    assert_eq!(backend.generate_calls(), 1);

    let uploaded = backend.uploaded(&launched.project_id);
    assert_eq!(uploaded.len(), 4);
    assert_eq!(uploaded[&SpecKind::TechStack].file_name, "tech_stack.xlsx");
    assert_eq!(
        backend.stored_status(&launched.project_id),
        Some(ProjectStatus::Parsing)
    );
}

#[tokio::test]
async fn test_invalid_form_sends_nothing() {
    let backend = MockBackend::new();
    let form = UploadForm::new("shop", "").with_file(SpecKind::Features, "features.xlsx");
    let err = Pipeline::new(&backend).launch(&form).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert!(err.to_string().contains("Tech stack is required"));
    assert!(err.to_string().contains("Database file is required"));
    assert_eq!(backend.generate_calls(), 0);
    assert!(backend.uploaded("proj-1").is_empty());
}

#[tokio::test]
async fn test_generate_failure_is_returned() {
    let dir = tempfile::tempdir().unwrap();
    let backend = MockBackend::new();
    backend.fail_generate(ApiError::server(500, "Failed to start project generation"));
    let err = Pipeline::new(&backend)
        .launch(&complete_form(dir.path()))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
    // The project and its uploads stay on the server
    assert_eq!(backend.uploaded("proj-1").len(), 4);
    assert_eq!(backend.stored_status("proj-1"), Some(ProjectStatus::Pending));
}

#[tokio::test]
async fn test_reupload_overwrites_same_kind() {
    let backend = MockBackend::with_project("p1", "PENDING");

    let first = SpecUpload::new()
        .with(SpecKind::Features, "features.xlsx", b"v1".to_vec())
        .with(SpecKind::Apis, "apis.xlsx", b"apis".to_vec());
    backend.upload_specs("p1", &first).await.unwrap();

    let second = SpecUpload::new().with(SpecKind::Features, "features-v2.xlsx", b"v2".to_vec());
    backend.upload_specs("p1", &second).await.unwrap();

    let uploaded = backend.uploaded("p1");
    assert_eq!(uploaded.len(), 2);
    assert_eq!(uploaded[&SpecKind::Features].file_name, "features-v2.xlsx");
    assert_eq!(uploaded[&SpecKind::Features].bytes, b"v2".to_vec());
    assert_eq!(uploaded[&SpecKind::Apis].bytes, b"apis".to_vec());
}

#[tokio::test]
async fn test_generate_requires_all_uploads() {
    let backend = MockBackend::with_project("p1", "PENDING");
    let partial = SpecUpload::new().with(SpecKind::Features, "features.xlsx", Vec::new());
    backend.upload_specs("p1", &partial).await.unwrap();

    let err = backend.generate("p1").await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(backend.stored_status("p1"), Some(ProjectStatus::Pending));
}
