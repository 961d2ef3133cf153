//! Shared model for the AutoPilot project generator client
//!
//! Wire types for the generation API, the project lifecycle and its
//! presentation vocabulary, log entries shown by the views, and the
//! [`GenerationBackend`] trait every consumer talks through.

mod error;

pub use error::{ApiError, ApiResult};

use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use uuid::Uuid;

// Re-export async trait for convenience
pub use async_trait::async_trait;

// ============================================================================
// Project lifecycle
// ============================================================================

/// Lifecycle status as transmitted by the server
///
/// `PENDING -> PARSING -> GENERATING -> DONE`, with `FAILED` reachable from
/// any non-terminal status. Strings outside the known set are kept verbatim
/// in [`ProjectStatus::Unknown`] instead of failing the whole payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProjectStatus {
    Pending,
    Parsing,
    Generating,
    Done,
    Failed,
    Unknown(String),
}

impl ProjectStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Parsing => "PARSING",
            Self::Generating => "GENERATING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
            Self::Unknown(raw) => raw,
        }
    }

    /// `DONE` and `FAILED` admit no further server-side progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    fn rank(&self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Parsing => Some(1),
            Self::Generating => Some(2),
            Self::Done => Some(3),
            Self::Failed | Self::Unknown(_) => None,
        }
    }

    /// Whether observing `next` after `self` respects the lifecycle order.
    ///
    /// Re-observing the same status is always allowed. Unknown statuses
    /// cannot be judged and are accepted.
    pub fn can_transition_to(&self, next: &ProjectStatus) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next) {
            (_, Self::Failed) => true,
            (Some(from), next) => match next.rank() {
                Some(to) => to > from,
                None => true,
            },
            (None, _) => true,
        }
    }

    /// Presentation step for the step indicator. Total over every status.
    pub fn step(&self) -> StepStatus {
        match self {
            Self::Pending => StepStatus::Uploaded,
            Self::Parsing => StepStatus::Parsing,
            Self::Generating => StepStatus::Generating,
            Self::Done => StepStatus::Ready,
            Self::Failed => StepStatus::Error,
            Self::Unknown(_) => StepStatus::Uploaded,
        }
    }
}

impl From<String> for ProjectStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PENDING" => Self::Pending,
            "PARSING" => Self::Parsing,
            "GENERATING" => Self::Generating,
            "DONE" => Self::Done,
            "FAILED" => Self::Failed,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<&str> for ProjectStatus {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<ProjectStatus> for String {
    fn from(status: ProjectStatus) -> Self {
        match status {
            ProjectStatus::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation vocabulary used by the step indicator and status badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Uploaded,
    Parsing,
    Generating,
    Ready,
    Error,
}

impl StepStatus {
    /// Steps shown in the indicator, in progression order
    pub const PROGRESSION: [StepStatus; 4] = [
        StepStatus::Uploaded,
        StepStatus::Parsing,
        StepStatus::Generating,
        StepStatus::Ready,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Parsing => "parsing",
            Self::Generating => "generating",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }

    /// Badge label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Uploaded => "Uploaded",
            Self::Parsing => "Parsing",
            Self::Generating => "Generating",
            Self::Ready => "Ready",
            Self::Error => "Error",
        }
    }

    /// Step indicator caption
    pub fn caption(&self) -> &'static str {
        match self {
            Self::Uploaded => "Uploaded",
            Self::Parsing => "Parsing Excel Files",
            Self::Generating => "Generating Project",
            Self::Ready => "Ready",
            Self::Error => "Failed",
        }
    }

    fn position(&self) -> Option<usize> {
        Self::PROGRESSION.iter().position(|step| step == self)
    }

    /// Completed/current/pending state of every progression step.
    ///
    /// `Error` is not part of the progression, so every step reads pending.
    pub fn indicator(&self) -> Vec<(StepStatus, StepState)> {
        let current = self.position();
        Self::PROGRESSION
            .iter()
            .enumerate()
            .map(|(idx, step)| {
                let state = match current {
                    Some(cur) if idx < cur => StepState::Completed,
                    Some(cur) if idx == cur => StepState::Current,
                    _ => StepState::Pending,
                };
                (*step, state)
            })
            .collect()
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Completed,
    Current,
    Pending,
}

// ============================================================================
// Wire types
// ============================================================================

/// Project as returned by `GET /projects/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub tech_stack: String,
    pub status: ProjectStatus,
    #[serde(default)]
    pub current_step: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Project {
    pub fn created(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.created_at).ok()
    }

    pub fn updated(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.updated_at).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub tech_stack: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProjectResponse {
    pub id: String,
    pub status: ProjectStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadSpecsResponse {
    pub project_id: String,
    pub status: ProjectStatus,
    pub message: String,
    #[serde(default)]
    pub uploaded_files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub message: String,
    pub project_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Node type in the generated file tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "file")]
    File,
    /// The backend's tree builder also emits `folder`
    #[serde(rename = "directory", alias = "folder")]
    Directory,
}

/// A node of the generated project's file tree, identified by `path`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTreeNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileTreeNode>>,
}

impl FileTreeNode {
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::File,
            children: None,
        }
    }

    pub fn directory(
        name: impl Into<String>,
        path: impl Into<String>,
        children: Vec<FileTreeNode>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Directory,
            children: Some(children),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileContentResponse {
    pub project_id: String,
    pub file_path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeFilesRequest {
    pub files: Vec<String>,
}

/// Per-file result of an optimize call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Response of `POST /projects/{id}/optimize`
///
/// `results` keeps the order in which the server listed the paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeFilesResponse {
    pub project_id: String,
    #[serde(with = "ordered_results")]
    pub results: Vec<(String, FileOutcome)>,
}

/// Mismatch between submitted paths and the keys of an optimize response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyCoverage {
    /// Submitted paths the response omitted
    pub missing: Vec<String>,
    /// Keys nobody asked for, or repeated keys
    pub extra: Vec<String>,
}

impl KeyCoverage {
    pub fn is_exact(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

impl fmt::Display for KeyCoverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "missing [{}], unexpected [{}]",
            self.missing.join(", "),
            self.extra.join(", ")
        )
    }
}

impl OptimizeFilesResponse {
    /// Compare result keys against the submitted path set
    pub fn coverage(&self, submitted: &BTreeSet<String>) -> KeyCoverage {
        let mut seen = HashSet::new();
        let mut extra = Vec::new();
        for (path, _) in &self.results {
            if !submitted.contains(path) || !seen.insert(path.as_str()) {
                extra.push(path.clone());
            }
        }
        let missing = submitted
            .iter()
            .filter(|path| !seen.contains(path.as_str()))
            .cloned()
            .collect();
        KeyCoverage { missing, extra }
    }
}

mod ordered_results {
    use super::FileOutcome;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S>(results: &Vec<(String, FileOutcome)>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(results.len()))?;
        for (path, outcome) in results {
            map.serialize_entry(path, outcome)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, FileOutcome)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ResultsVisitor;

        impl<'de> Visitor<'de> for ResultsVisitor {
            type Value = Vec<(String, FileOutcome)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of file path to optimize outcome")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut results = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((path, outcome)) = access.next_entry::<String, FileOutcome>()? {
                    results.push((path, outcome));
                }
                Ok(results)
            }
        }

        deserializer.deserialize_map(ResultsVisitor)
    }
}

// ============================================================================
// Specification uploads
// ============================================================================

/// The four spreadsheet inputs a project is generated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecKind {
    Features,
    Apis,
    Database,
    TechStack,
}

impl SpecKind {
    pub const ALL: [SpecKind; 4] = [
        SpecKind::Features,
        SpecKind::Apis,
        SpecKind::Database,
        SpecKind::TechStack,
    ];

    /// Multipart part name
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Features => "features",
            Self::Apis => "apis",
            Self::Database => "database",
            Self::TechStack => "tech_stack",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Features => "Features",
            Self::Apis => "APIs",
            Self::Database => "Database",
            Self::TechStack => "Tech Stack",
        }
    }
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Set of spec files to send in one upload; one file per kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecUpload {
    files: BTreeMap<SpecKind, SpecFile>,
}

impl SpecUpload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a file, replacing any earlier file of the same kind
    pub fn with(mut self, kind: SpecKind, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(kind, file_name, bytes);
        self
    }

    pub fn insert(&mut self, kind: SpecKind, file_name: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(
            kind,
            SpecFile {
                file_name: file_name.into(),
                bytes,
            },
        );
    }

    pub fn get(&self, kind: SpecKind) -> Option<&SpecFile> {
        self.files.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SpecKind, &SpecFile)> {
        self.files.iter().map(|(kind, file)| (*kind, file))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

// ============================================================================
// View logs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// A line in a view's log panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Local>,
    pub message: String,
    pub severity: Severity,
}

impl LogEntry {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Local::now(),
            message: message.into(),
            severity,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }
}

// ============================================================================
// Backend trait
// ============================================================================

/// Remote operations of the generation service
///
/// Implementations perform exactly one request per call: no retries, no
/// caching. Failures are normalized into [`ApiError`].
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn create_project(
        &self,
        request: &CreateProjectRequest,
    ) -> ApiResult<CreateProjectResponse>;

    async fn get_project(&self, project_id: &str) -> ApiResult<Project>;

    async fn upload_specs(
        &self,
        project_id: &str,
        upload: &SpecUpload,
    ) -> ApiResult<UploadSpecsResponse>;

    /// Ask the server to start (or restart) generation
    async fn generate(&self, project_id: &str) -> ApiResult<GenerateResponse>;

    async fn get_files(&self, project_id: &str) -> ApiResult<FileTreeNode>;

    async fn get_file_content(&self, project_id: &str, path: &str)
        -> ApiResult<FileContentResponse>;

    async fn optimize_files(
        &self,
        project_id: &str,
        files: &[String],
    ) -> ApiResult<OptimizeFilesResponse>;

    async fn health(&self) -> ApiResult<HealthResponse>;
}
