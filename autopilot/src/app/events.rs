//! Results delivered from background tasks to the UI loop

use autopilot_sdk::{
    ApiResult, FileContentResponse, FileTreeNode, GenerateResponse, OptimizeFilesResponse, Project,
};
use tracing::debug;
use uuid::Uuid;

use super::App;
use crate::views::{ContentTicket, OptimizeTicket};

#[derive(Debug)]
pub enum AppEvent {
    /// Initial project load finished
    Loaded(ApiResult<Project>),

    /// Retry-generation finished, followed by a status re-read
    Retried {
        generate: ApiResult<GenerateResponse>,
        refreshed: ApiResult<Project>,
    },

    TreeLoaded(ApiResult<FileTreeNode>),

    Content {
        ticket: ContentTicket,
        result: ApiResult<FileContentResponse>,
    },

    Optimized {
        ticket: OptimizeTicket,
        result: ApiResult<OptimizeFilesResponse>,
    },
}

impl App {
    pub fn handle_event(&mut self, view_id: Uuid, event: AppEvent) {
        if view_id == self.status_view_id {
            self.handle_status_event(event);
        } else if view_id == self.files_view_id && self.files.is_some() {
            self.handle_files_event(event);
        } else {
            debug!(%view_id, "dropping event for a closed view");
        }
    }

    fn handle_status_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Loaded(result) => {
                if self.status.finish_load(result).is_ok() {
                    self.start_polling();
                }
            }
            AppEvent::Retried {
                generate,
                refreshed,
            } => {
                self.status.finish_retry(&generate);
                match refreshed {
                    Ok(project) => {
                        self.status.apply_refresh(project);
                    }
                    Err(e) => self
                        .status
                        .logs
                        .error(format!("Failed to refresh status: {}", e)),
                }
                self.start_polling();
            }
            other => debug!(?other, "unexpected event for the status view"),
        }
    }

    fn handle_files_event(&mut self, event: AppEvent) {
        let Some(view) = self.files.as_mut() else {
            return;
        };
        match event {
            AppEvent::TreeLoaded(result) => {
                // The error is already recorded on the view
                let _ = view.finish_tree_load(result);
                self.tree_cursor = 0;
            }
            AppEvent::Content { ticket, result } => {
                view.finish_select(&ticket, result);
            }
            AppEvent::Optimized { ticket, result } => {
                if let Some(refetch) = view.finish_optimize(&ticket, result) {
                    self.fetch_content(refetch);
                }
            }
            other => debug!(?other, "unexpected event for the files view"),
        }
    }
}
