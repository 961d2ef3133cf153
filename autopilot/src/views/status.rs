//! Status page state
//!
//! Holds the view's cached copy of the project, the step shown in the
//! indicator and the log panel. The server is the only source of status
//! changes: the view requests generation and re-reads the project, it never
//! sets a status itself.

use autopilot_sdk::{
    ApiError, ApiResult, GenerateResponse, GenerationBackend, LogEntry, Project, ProjectStatus,
    Severity, StepStatus,
};
use tracing::{debug, info, warn};

use super::LogPanel;
use crate::poller::PollEvent;

#[derive(Debug, Clone)]
pub struct StatusView {
    pub project_id: String,
    pub project: Option<Project>,
    pub step: StepStatus,
    pub logs: LogPanel,
    /// Failure of the one-shot initial load; blocks the page
    pub load_error: Option<String>,
    pub loading: bool,
    pub retry_in_progress: bool,
    /// Failed polls since the last successful one
    pub poll_failures: usize,
}

fn status_message(status: &ProjectStatus) -> (Severity, String) {
    match status {
        ProjectStatus::Pending => (Severity::Info, "Waiting for generation to start".into()),
        ProjectStatus::Parsing => (Severity::Info, "Parsing specification files".into()),
        ProjectStatus::Generating => (Severity::Info, "Generating project files".into()),
        ProjectStatus::Done => (
            Severity::Success,
            "Project generation completed successfully".into(),
        ),
        ProjectStatus::Failed => (Severity::Error, "Project generation failed".into()),
        ProjectStatus::Unknown(raw) => (Severity::Warning, format!("Unrecognized status: {}", raw)),
    }
}

impl StatusView {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            project: None,
            step: StepStatus::Uploaded,
            logs: LogPanel::new(),
            load_error: None,
            loading: false,
            retry_in_progress: false,
            poll_failures: 0,
        }
    }

    pub fn status(&self) -> Option<&ProjectStatus> {
        self.project.as_ref().map(|p| &p.status)
    }

    /// One-shot initial load. Failure is blocking: it is kept in
    /// `load_error` and no polling should start.
    pub async fn load(&mut self, backend: &dyn GenerationBackend) -> ApiResult<()> {
        self.loading = true;
        let result = backend.get_project(&self.project_id).await;
        self.finish_load(result)
    }

    pub fn finish_load(&mut self, result: ApiResult<Project>) -> ApiResult<()> {
        self.loading = false;
        match result {
            Ok(project) => {
                self.load_error = None;
                self.reset_from(project);
                Ok(())
            }
            Err(e) => {
                warn!(project_id = %self.project_id, error = %e, "initial project load failed");
                self.load_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Replace the cached project and rebuild the log from its payload
    pub fn reset_from(&mut self, project: Project) {
        self.logs.clear();
        self.logs.info(format!(
            "Project {} ({})",
            project.name, project.tech_stack
        ));
        let (severity, message) = status_message(&project.status);
        self.logs.push(LogEntry::new(severity, message));
        if let Some(step) = &project.current_step {
            self.logs.info(step.clone());
        }
        self.step = project.status.step();
        self.poll_failures = 0;
        self.project = Some(project);
    }

    /// Apply an authoritative refresh, appending log lines for what changed
    pub fn apply_project(&mut self, project: Project) {
        let Some(previous) = self.project.as_ref() else {
            self.reset_from(project);
            return;
        };

        if previous.status != project.status {
            if !previous.status.can_transition_to(&project.status) {
                warn!(
                    project_id = %self.project_id,
                    from = %previous.status,
                    to = %project.status,
                    "server reported a status regression"
                );
            }
            let (severity, message) = status_message(&project.status);
            self.logs.push(LogEntry::new(severity, message));
            if let Some(step) = &project.current_step {
                self.logs.info(step.clone());
            }
        } else if previous.current_step != project.current_step {
            if let Some(step) = &project.current_step {
                self.logs.info(step.clone());
            }
        }

        self.step = project.status.step();
        self.poll_failures = 0;
        self.project = Some(project);
    }

    /// Apply a re-read that may have been overtaken by a poll result.
    ///
    /// The copy with the later `updated_at` wins. When the timestamps are
    /// equal or unparsable, a refresh that would step backwards in the
    /// lifecycle is taken as the older copy. Returns whether it was applied.
    pub fn apply_refresh(&mut self, project: Project) -> bool {
        if let Some(current) = self.project.as_ref() {
            let stale = match (project.updated(), current.updated()) {
                (Some(fetched), Some(cached)) if fetched != cached => fetched < cached,
                _ => !current.status.can_transition_to(&project.status),
            };
            if stale {
                debug!(
                    project_id = %self.project_id,
                    cached = %current.status,
                    fetched = %project.status,
                    "dropping refresh older than the cached project"
                );
                return false;
            }
        }
        self.apply_project(project);
        true
    }

    /// Apply one poll event. Returns true once polling has stopped.
    ///
    /// Failed polls never move the step to `error`; only a `FAILED` status
    /// from the server does.
    pub fn apply_poll(&mut self, event: PollEvent) -> bool {
        match event {
            PollEvent::Status(project) => {
                self.apply_project(project);
                false
            }
            PollEvent::Finished(project) => {
                self.apply_project(project);
                true
            }
            PollEvent::Failed(_) => {
                self.poll_failures += 1;
                false
            }
        }
    }

    /// Whether the recurring poll should run
    pub fn needs_polling(&self) -> bool {
        self.load_error.is_none() && self.status().map_or(false, |s| !s.is_terminal())
    }

    /// Retry is offered only while the project is still pending
    pub fn can_retry(&self) -> bool {
        !self.retry_in_progress && self.status() == Some(&ProjectStatus::Pending)
    }

    pub fn begin_retry(&mut self) -> ApiResult<()> {
        if self.retry_in_progress {
            return Err(ApiError::validation("Generation request already in progress"));
        }
        if self.status() != Some(&ProjectStatus::Pending) {
            return Err(ApiError::validation(
                "Generation can only be started while the project is pending",
            ));
        }
        self.retry_in_progress = true;
        self.logs.info("Requesting project generation");
        Ok(())
    }

    /// Record the generate call's outcome. The cached status is untouched;
    /// the caller re-reads the project afterwards.
    pub fn finish_retry(&mut self, result: &ApiResult<GenerateResponse>) {
        self.retry_in_progress = false;
        match result {
            Ok(response) => {
                info!(project_id = %self.project_id, "generation requested");
                self.logs.success(response.message.clone());
            }
            Err(e) => {
                warn!(project_id = %self.project_id, error = %e, "generation request failed");
                self.logs.error(e.to_string());
            }
        }
    }

    /// Request generation, then re-read the authoritative status
    pub async fn retry_generation(&mut self, backend: &dyn GenerationBackend) -> ApiResult<()> {
        self.begin_retry()?;
        let result = backend.generate(&self.project_id).await;
        self.finish_retry(&result);

        match backend.get_project(&self.project_id).await {
            Ok(project) => {
                self.apply_refresh(project);
            }
            Err(e) => self.logs.error(format!("Failed to refresh status: {}", e)),
        }

        result.map(|_| ())
    }

    /// View/download actions become available only once generation is done
    pub fn actions_enabled(&self) -> bool {
        self.status() == Some(&ProjectStatus::Done)
    }
}
