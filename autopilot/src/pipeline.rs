//! Create, upload and generate in one go

use autopilot_sdk::{
    ApiResult, CreateProjectResponse, GenerateResponse, GenerationBackend, UploadSpecsResponse,
};
use tracing::{info, warn};

use crate::upload::UploadForm;

/// A project whose generation has been requested
#[derive(Debug, Clone, PartialEq)]
pub struct Launched {
    pub project_id: String,
    pub created: CreateProjectResponse,
    pub upload: UploadSpecsResponse,
    pub generate: GenerateResponse,
}

pub struct Pipeline<'a> {
    backend: &'a dyn GenerationBackend,
}

impl<'a> Pipeline<'a> {
    pub fn new(backend: &'a dyn GenerationBackend) -> Self {
        Self { backend }
    }

    /// Run the whole submission for a form that passes the upload gate.
    ///
    /// Stops at the first failing stage and returns that stage's error. A
    /// project created before a later stage failed is left on the server.
    pub async fn launch(&self, form: &UploadForm) -> ApiResult<Launched> {
        form.validate()?;
        let upload = form.read_upload().await?;

        let created = self.backend.create_project(&form.create_request()).await?;
        let project_id = created.id.clone();
        info!(project_id = %project_id, name = %form.name.trim(), "project created");

        let uploaded = match self.backend.upload_specs(&project_id, &upload).await {
            Ok(response) => response,
            Err(e) => {
                warn!(project_id = %project_id, error = %e, "spec upload failed");
                return Err(e);
            }
        };
        info!(
            project_id = %project_id,
            files = uploaded.uploaded_files.len(),
            "specifications uploaded"
        );

        let generate = match self.backend.generate(&project_id).await {
            Ok(response) => response,
            Err(e) => {
                warn!(project_id = %project_id, error = %e, "generation request failed");
                return Err(e);
            }
        };

        Ok(Launched {
            project_id,
            created,
            upload: uploaded,
            generate,
        })
    }
}
