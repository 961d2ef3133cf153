//! Files page state
//!
//! Tree browsing, the file viewer and the optimize panel. Expansion and
//! optimize selection are sets of paths kept apart from the tree itself.
//!
//! Content fetches and optimize calls are split into `begin_*` / `finish_*`
//! halves so an event loop can run the request elsewhere and hand the
//! result back. Each content fetch carries a token; a result whose token is
//! no longer current is dropped, so the last selection always wins.

use autopilot_sdk::{
    ApiError, ApiResult, FileContentResponse, FileTreeNode, GenerationBackend,
    OptimizeFilesResponse,
};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

use super::LogPanel;
use crate::tree::FileTree;

/// A content fetch in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTicket {
    pub token: u64,
    pub path: String,
}

/// An optimize call in flight; `paths` is the submitted set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizeTicket {
    pub paths: BTreeSet<String>,
}

impl OptimizeTicket {
    pub fn files(&self) -> Vec<String> {
        self.paths.iter().cloned().collect()
    }
}

/// One rendered line of the optimize results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLine {
    pub path: String,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct FilesView {
    pub project_id: String,
    max_depth: usize,

    pub tree: Option<FileTree>,
    pub tree_loading: bool,
    pub tree_error: Option<String>,
    pub expanded: HashSet<String>,

    pub selected_for_optimization: BTreeSet<String>,

    pub selected_file: Option<String>,
    pub content: Option<String>,
    pub content_loading: bool,
    pub content_error: Option<String>,
    content_token: u64,

    pub optimize_in_progress: bool,
    pub optimize_results: Vec<ResultLine>,

    pub logs: LogPanel,
}

impl FilesView {
    pub fn new(project_id: impl Into<String>, max_depth: usize) -> Self {
        Self {
            project_id: project_id.into(),
            max_depth,
            tree: None,
            tree_loading: false,
            tree_error: None,
            expanded: HashSet::new(),
            selected_for_optimization: BTreeSet::new(),
            selected_file: None,
            content: None,
            content_loading: false,
            content_error: None,
            content_token: 0,
            optimize_in_progress: false,
            optimize_results: Vec::new(),
            logs: LogPanel::new(),
        }
    }

    // ------------------------------------------------------------------
    // Tree
    // ------------------------------------------------------------------

    pub fn begin_tree_load(&mut self) {
        self.tree_loading = true;
        self.tree_error = None;
    }

    pub fn finish_tree_load(&mut self, result: ApiResult<FileTreeNode>) -> ApiResult<()> {
        self.tree_loading = false;
        let built = result.and_then(|root| FileTree::build(&root, self.max_depth));
        match built {
            Ok(tree) => {
                debug!(project_id = %self.project_id, nodes = tree.len(), "file tree loaded");
                // Drop state for paths that no longer exist
                self.expanded.retain(|path| tree.contains(path));
                self.selected_for_optimization
                    .retain(|path| tree.contains(path));
                self.expanded.insert(tree.root().path.clone());
                self.tree = Some(tree);
                Ok(())
            }
            Err(e) => {
                warn!(project_id = %self.project_id, error = %e, "file tree load failed");
                self.tree_error = Some(e.to_string());
                self.logs.error(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn load_tree(&mut self, backend: &dyn GenerationBackend) -> ApiResult<()> {
        self.begin_tree_load();
        let result = backend.get_files(&self.project_id).await;
        self.finish_tree_load(result)
    }

    /// Expand or collapse a directory. Returns the new expanded state.
    pub fn toggle_expanded(&mut self, path: &str) -> bool {
        let is_dir = self
            .tree
            .as_ref()
            .and_then(|tree| tree.get(path))
            .map_or(false, |entry| entry.is_dir());
        if !is_dir {
            return false;
        }
        if self.expanded.remove(path) {
            false
        } else {
            self.expanded.insert(path.to_string());
            true
        }
    }

    /// Add or remove a path from the optimize selection. Returns whether it
    /// is selected afterwards.
    pub fn toggle_selection(&mut self, path: &str) -> bool {
        let known = self.tree.as_ref().map_or(false, |tree| tree.contains(path));
        if !known {
            return false;
        }
        if self.selected_for_optimization.remove(path) {
            false
        } else {
            self.selected_for_optimization.insert(path.to_string());
            true
        }
    }

    /// Add a path to the optimize selection. Selecting it again is a no-op.
    /// Returns false for paths outside the loaded tree.
    pub fn select_for_optimization(&mut self, path: &str) -> bool {
        let known = self.tree.as_ref().map_or(false, |tree| tree.contains(path));
        if known {
            self.selected_for_optimization.insert(path.to_string());
        }
        known
    }

    // ------------------------------------------------------------------
    // Viewer
    // ------------------------------------------------------------------

    /// Select a file for viewing and issue a ticket for its content.
    ///
    /// Directories and unknown paths are ignored. Any earlier ticket becomes
    /// stale.
    pub fn begin_select(&mut self, path: &str) -> Option<ContentTicket> {
        let is_file = self.tree.as_ref().map_or(false, |tree| tree.is_file(path));
        if !is_file {
            return None;
        }
        Some(self.issue_content_ticket(path))
    }

    fn issue_content_ticket(&mut self, path: &str) -> ContentTicket {
        self.content_token += 1;
        self.selected_file = Some(path.to_string());
        self.content = None;
        self.content_error = None;
        self.content_loading = true;
        ContentTicket {
            token: self.content_token,
            path: path.to_string(),
        }
    }

    /// Whether `ticket` still belongs to the current selection
    pub fn is_current(&self, ticket: &ContentTicket) -> bool {
        ticket.token == self.content_token && self.selected_file.as_deref() == Some(&ticket.path)
    }

    /// Commit fetched content. Returns false (and changes nothing) when the
    /// ticket was superseded by a later selection.
    pub fn finish_select(
        &mut self,
        ticket: &ContentTicket,
        result: ApiResult<FileContentResponse>,
    ) -> bool {
        if !self.is_current(ticket) {
            debug!(path = %ticket.path, token = ticket.token, "discarding stale file content");
            return false;
        }
        self.content_loading = false;
        match result {
            Ok(response) => {
                self.content = Some(response.content);
                self.content_error = None;
            }
            Err(e) => {
                warn!(path = %ticket.path, error = %e, "file content fetch failed");
                self.content = None;
                self.content_error = Some(e.to_string());
            }
        }
        true
    }

    pub async fn open_file(&mut self, backend: &dyn GenerationBackend, path: &str) -> ApiResult<()> {
        let Some(ticket) = self.begin_select(path) else {
            return Err(ApiError::validation(format!("Not a file: {}", path)));
        };
        let result = backend.get_file_content(&self.project_id, &ticket.path).await;
        let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
        self.finish_select(&ticket, result);
        outcome
    }

    // ------------------------------------------------------------------
    // Optimize
    // ------------------------------------------------------------------

    pub fn can_optimize(&self) -> bool {
        !self.optimize_in_progress && !self.selected_for_optimization.is_empty()
    }

    /// Snapshot the selection for submission
    pub fn begin_optimize(&mut self) -> ApiResult<OptimizeTicket> {
        if self.optimize_in_progress {
            return Err(ApiError::validation("An optimize request is already in progress"));
        }
        if self.selected_for_optimization.is_empty() {
            return Err(ApiError::validation("Select at least one file to optimize"));
        }
        self.optimize_in_progress = true;
        self.optimize_results.clear();
        let paths = self.selected_for_optimization.clone();
        self.logs
            .info(format!("Optimizing {} file(s)", paths.len()));
        Ok(OptimizeTicket { paths })
    }

    /// Record an optimize response.
    ///
    /// The selection is cleared whatever the outcome. Result lines follow
    /// the server's order; submitted paths the server left out get a failure
    /// line of their own and keys nobody asked for are reported and dropped.
    /// Returns a content ticket when the file on display was among those
    /// optimized and needs re-fetching.
    pub fn finish_optimize(
        &mut self,
        ticket: &OptimizeTicket,
        result: ApiResult<OptimizeFilesResponse>,
    ) -> Option<ContentTicket> {
        self.optimize_in_progress = false;
        self.selected_for_optimization.clear();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(project_id = %self.project_id, error = %e, "optimize request failed");
                self.logs.error(e.to_string());
                return None;
            }
        };

        let coverage = response.coverage(&ticket.paths);
        if !coverage.is_exact() {
            warn!(
                project_id = %self.project_id,
                missing = ?coverage.missing,
                extra = ?coverage.extra,
                "optimize results do not match the submitted files"
            );
            self.logs
                .warning(format!("Optimize results do not match submission: {}", coverage));
        }

        let mut seen = HashSet::new();
        let mut lines = Vec::with_capacity(ticket.paths.len());
        for (path, outcome) in response.results {
            if ticket.paths.contains(&path) && seen.insert(path.clone()) {
                lines.push(ResultLine {
                    path,
                    success: outcome.success,
                    message: outcome.message,
                });
            }
        }
        for path in coverage.missing {
            lines.push(ResultLine {
                path,
                success: false,
                message: "No result returned for this file".to_string(),
            });
        }

        let succeeded = lines.iter().filter(|line| line.success).count();
        if succeeded == lines.len() {
            self.logs.success(format!("Optimized {} file(s)", succeeded));
        } else {
            self.logs.warning(format!(
                "Optimized {} of {} file(s)",
                succeeded,
                lines.len()
            ));
        }
        self.optimize_results = lines;

        let displayed = self.selected_file.clone()?;
        if ticket.paths.contains(&displayed) {
            Some(self.issue_content_ticket(&displayed))
        } else {
            None
        }
    }

    /// Submit the selection, then refresh the viewer if its file changed
    pub async fn optimize(&mut self, backend: &dyn GenerationBackend) -> ApiResult<()> {
        let ticket = self.begin_optimize()?;
        let result = backend
            .optimize_files(&self.project_id, &ticket.files())
            .await;
        let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);

        if let Some(refetch) = self.finish_optimize(&ticket, result) {
            let content = backend
                .get_file_content(&self.project_id, &refetch.path)
                .await;
            self.finish_select(&refetch, content);
        }
        outcome
    }
}
