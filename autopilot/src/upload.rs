//! Upload gate for a new project
//!
//! Collects the project name, tech stack and the four spreadsheet paths.
//! Nothing is sent until every rule passes.

use autopilot_sdk::{ApiError, ApiResult, CreateProjectRequest, SpecKind, SpecUpload};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadForm {
    pub name: String,
    pub tech_stack: String,
    files: BTreeMap<SpecKind, PathBuf>,
}

/// Spreadsheet check on the file extension, case-insensitive
pub fn is_xlsx(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("xlsx"))
}

impl UploadForm {
    pub fn new(name: impl Into<String>, tech_stack: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tech_stack: tech_stack.into(),
            files: BTreeMap::new(),
        }
    }

    /// Choose the file for `kind`, replacing any earlier choice
    pub fn set_file(&mut self, kind: SpecKind, path: impl Into<PathBuf>) -> Option<PathBuf> {
        self.files.insert(kind, path.into())
    }

    pub fn with_file(mut self, kind: SpecKind, path: impl Into<PathBuf>) -> Self {
        self.set_file(kind, path);
        self
    }

    pub fn file(&self, kind: SpecKind) -> Option<&Path> {
        self.files.get(&kind).map(PathBuf::as_path)
    }

    pub fn missing_kinds(&self) -> Vec<SpecKind> {
        SpecKind::ALL
            .iter()
            .copied()
            .filter(|kind| !self.files.contains_key(kind))
            .collect()
    }

    /// Every rule the form currently breaks, in display order
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() {
            problems.push("Project name is required".to_string());
        }
        if self.tech_stack.trim().is_empty() {
            problems.push("Tech stack is required".to_string());
        }
        for kind in self.missing_kinds() {
            problems.push(format!("{} file is required", kind.label()));
        }
        for (kind, path) in &self.files {
            if !is_xlsx(path) {
                problems.push(format!(
                    "{} file must be an .xlsx spreadsheet: {}",
                    kind.label(),
                    path.display()
                ));
            }
        }
        problems
    }

    pub fn validate(&self) -> ApiResult<()> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(problems.join("; ")))
        }
    }

    pub fn can_generate(&self) -> bool {
        self.problems().is_empty()
    }

    pub fn create_request(&self) -> CreateProjectRequest {
        CreateProjectRequest {
            name: self.name.trim().to_string(),
            tech_stack: self.tech_stack.trim().to_string(),
        }
    }

    /// Read every chosen spreadsheet into memory
    pub async fn read_upload(&self) -> ApiResult<SpecUpload> {
        let mut upload = SpecUpload::new();
        for (kind, path) in &self.files {
            let bytes = tokio::fs::read(path).await.map_err(|e| {
                ApiError::validation(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(kind.field_name())
                .to_string();
            upload.insert(*kind, file_name, bytes);
        }
        Ok(upload)
    }
}
