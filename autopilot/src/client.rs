//! HTTP implementation of [`GenerationBackend`]
//!
//! One request per call. Non-2xx responses are turned into
//! [`ApiError::Server`] carrying the body's `detail`, or a per-operation
//! fallback message when the body has none.

use autopilot_sdk::{
    async_trait, ApiError, ApiResult, CreateProjectRequest, CreateProjectResponse,
    FileContentResponse, FileTreeNode, GenerateResponse, GenerationBackend, HealthResponse,
    OptimizeFilesRequest, OptimizeFilesResponse, Project, SpecUpload, UploadSpecsResponse,
};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Error body shape of every non-2xx response
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: serde_json::Value,
}

/// Client for the generation API
///
/// Construct once at startup and share it (behind an `Arc`) with every view.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::validation(format!("Invalid API URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::validation(format!(
                "API URL cannot be used as a base: {}",
                base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `GET /projects/{id}/files/content?path=...` with the path encoded
    pub fn file_content_url(&self, project_id: &str, path: &str) -> Url {
        let mut url = self.endpoint(&["projects", project_id, "files", "content"]);
        url.query_pairs_mut().append_pair("path", path);
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, fallback: &str) -> ApiResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::transport(format!("{}: {}", fallback, e)))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::transport(format!("{}: {}", fallback, e)))?;

        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        if !status.is_success() {
            return Err(error_from_body(status.as_u16(), &body, fallback));
        }
        decode_body(&body, fallback)
    }
}

/// Build the error for a non-2xx response.
///
/// A string `detail` is used as-is; any other JSON `detail` (validation
/// errors come back as arrays) is rendered compactly; a missing, empty or
/// unparsable body yields `fallback`.
pub fn error_from_body(status: u16, body: &[u8], fallback: &str) -> ApiError {
    let detail = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| match parsed.detail {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.trim().is_empty() => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });
    ApiError::server(status, detail.unwrap_or_else(|| fallback.to_string()))
}

/// Decode a 2xx body into the documented type, untransformed
pub fn decode_body<T: DeserializeOwned>(body: &[u8], fallback: &str) -> ApiResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::decode(format!("{}: unexpected response body ({})", fallback, e)))
}

fn multipart_form(upload: &SpecUpload) -> ApiResult<Form> {
    let mut form = Form::new();
    for (kind, file) in upload.iter() {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(XLSX_MIME)
            .map_err(|e| ApiError::validation(format!("Invalid upload part {}: {}", kind, e)))?;
        form = form.part(kind.field_name(), part);
    }
    Ok(form)
}

#[async_trait]
impl GenerationBackend for HttpBackend {
    async fn create_project(
        &self,
        request: &CreateProjectRequest,
    ) -> ApiResult<CreateProjectResponse> {
        debug!(name = %request.name, "creating project");
        let url = self.endpoint(&["projects"]);
        self.send(self.http.post(url).json(request), "Failed to create project")
            .await
    }

    async fn get_project(&self, project_id: &str) -> ApiResult<Project> {
        let url = self.endpoint(&["projects", project_id]);
        self.send(self.http.get(url), "Failed to fetch project").await
    }

    async fn upload_specs(
        &self,
        project_id: &str,
        upload: &SpecUpload,
    ) -> ApiResult<UploadSpecsResponse> {
        debug!(project_id, parts = upload.len(), "uploading specifications");
        let form = multipart_form(upload)?;
        let url = self.endpoint(&["projects", project_id, "upload-specs"]);
        self.send(
            self.http.post(url).multipart(form),
            "Failed to upload specifications",
        )
        .await
    }

    async fn generate(&self, project_id: &str) -> ApiResult<GenerateResponse> {
        debug!(project_id, "triggering generation");
        let url = self.endpoint(&["projects", project_id, "generate"]);
        self.send(self.http.post(url), "Failed to start project generation")
            .await
    }

    async fn get_files(&self, project_id: &str) -> ApiResult<FileTreeNode> {
        let url = self.endpoint(&["projects", project_id, "files"]);
        self.send(self.http.get(url), "Failed to fetch files").await
    }

    async fn get_file_content(
        &self,
        project_id: &str,
        path: &str,
    ) -> ApiResult<FileContentResponse> {
        let url = self.file_content_url(project_id, path);
        self.send(self.http.get(url), "Failed to fetch file content")
            .await
    }

    async fn optimize_files(
        &self,
        project_id: &str,
        files: &[String],
    ) -> ApiResult<OptimizeFilesResponse> {
        debug!(project_id, count = files.len(), "optimizing files");
        let url = self.endpoint(&["projects", project_id, "optimize"]);
        let body = OptimizeFilesRequest {
            files: files.to_vec(),
        };
        self.send(self.http.post(url).json(&body), "Failed to optimize files")
            .await
    }

    async fn health(&self) -> ApiResult<HealthResponse> {
        let url = self.endpoint(&["health"]);
        self.send(self.http.get(url), "Health check failed").await
    }
}
