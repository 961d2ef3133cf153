//! Interactive application state
//!
//! The App owns a tokio runtime; the draw/input loop stays synchronous and
//! every remote call runs as a task registered against the view that asked
//! for it. Results come back over a channel and are applied between frames.

use anyhow::{Context, Result};
use autopilot_sdk::GenerationBackend;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::Settings;
use crate::poller::{PollEvent, StatusPoller};
use crate::task_registry::TaskRegistry;
use crate::tree::TreeEntry;
use crate::views::{FilesView, StatusView};

mod events;
mod navigation;

pub use events::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Status,
    Files,
}

/// Files screen pane with keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilesPane {
    Tree,
    Viewer,
}

pub struct App {
    pub backend: Arc<dyn GenerationBackend>,
    pub settings: Settings,
    pub screen: Screen,
    pub should_quit: bool,

    // Status screen
    pub status: StatusView,
    pub status_view_id: Uuid,
    poller: Option<StatusPoller>,

    // Files screen; torn down when leaving the screen
    pub files: Option<FilesView>,
    pub files_view_id: Uuid,
    pub files_pane: FilesPane,
    pub tree_cursor: usize,
    pub viewer_scroll: u16,
    pub filter: String,
    pub filter_active: bool,

    registry: TaskRegistry,
    events_tx: mpsc::UnboundedSender<(Uuid, AppEvent)>,
    events_rx: mpsc::UnboundedReceiver<(Uuid, AppEvent)>,
    poll_tx: mpsc::UnboundedSender<PollEvent>,
    poll_rx: mpsc::UnboundedReceiver<PollEvent>,

    // Tokio runtime for async operations
    tokio_runtime: tokio::runtime::Runtime,
}

impl App {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        settings: Settings,
        project_id: impl Into<String>,
    ) -> Result<Self> {
        let tokio_runtime =
            tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (poll_tx, poll_rx) = mpsc::unbounded_channel();

        Ok(Self {
            backend,
            settings,
            screen: Screen::Status,
            should_quit: false,
            status: StatusView::new(project_id),
            status_view_id: Uuid::new_v4(),
            poller: None,
            files: None,
            files_view_id: Uuid::new_v4(),
            files_pane: FilesPane::Tree,
            tree_cursor: 0,
            viewer_scroll: 0,
            filter: String::new(),
            filter_active: false,
            registry: TaskRegistry::new(),
            events_tx,
            events_rx,
            poll_tx,
            poll_rx,
            tokio_runtime,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.status.project_id
    }

    /// Kick off the initial project load
    pub fn start(&mut self) {
        self.status.loading = true;
        let backend = Arc::clone(&self.backend);
        let project_id = self.status.project_id.clone();
        self.spawn_view_task(self.status_view_id, async move {
            AppEvent::Loaded(backend.get_project(&project_id).await)
        });
    }

    /// Run `task` for `view_id`; its result is delivered unless the view is
    /// torn down first.
    fn spawn_view_task<F>(&self, view_id: Uuid, task: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let token = self
            .tokio_runtime
            .block_on(self.registry.token_for(view_id));
        let tx = self.events_tx.clone();
        let handle = self.tokio_runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                event = task => {
                    if !token.is_cancelled() {
                        let _ = tx.send((view_id, event));
                    }
                }
            }
        });
        self.tokio_runtime
            .block_on(self.registry.register(view_id, handle));
    }

    fn start_polling(&mut self) {
        if self.poller.is_some() || !self.status.needs_polling() {
            return;
        }
        let token = self
            .tokio_runtime
            .block_on(self.registry.token_for(self.status_view_id));
        let mut poller = {
            // The poller spawns onto whichever runtime is entered
            let _guard = self.tokio_runtime.enter();
            StatusPoller::spawn_with_token(
                Arc::clone(&self.backend),
                self.status.project_id.clone(),
                self.settings.poll_interval(),
                self.poll_tx.clone(),
                token.child_token(),
            )
        };
        if let Some(handle) = poller.take_handle() {
            self.tokio_runtime
                .block_on(self.registry.register(self.status_view_id, handle));
        }
        self.poller = Some(poller);
    }

    fn stop_polling(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
    }

    /// Apply everything that arrived since the last frame
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.poll_rx.try_recv() {
            if self.status.apply_poll(event) {
                self.stop_polling();
            }
        }
        while let Ok((view_id, event)) = self.events_rx.try_recv() {
            self.handle_event(view_id, event);
        }
    }

    // ------------------------------------------------------------------
    // Files screen
    // ------------------------------------------------------------------

    pub fn open_files(&mut self) {
        if !self.status.actions_enabled() {
            self.status
                .logs
                .warning("Files are available once generation is done");
            return;
        }
        self.screen = Screen::Files;
        if self.files.is_some() {
            return;
        }

        let mut view = FilesView::new(
            self.status.project_id.clone(),
            self.settings.max_tree_depth,
        );
        view.begin_tree_load();
        self.files = Some(view);
        self.files_view_id = Uuid::new_v4();
        self.files_pane = FilesPane::Tree;
        self.tree_cursor = 0;
        self.viewer_scroll = 0;
        self.filter.clear();
        self.filter_active = false;

        let backend = Arc::clone(&self.backend);
        let project_id = self.status.project_id.clone();
        self.spawn_view_task(self.files_view_id, async move {
            AppEvent::TreeLoaded(backend.get_files(&project_id).await)
        });
    }

    /// Leave the files screen, cancelling anything it still has in flight
    pub fn close_files(&mut self) {
        self.tokio_runtime
            .block_on(self.registry.cancel_all(&self.files_view_id));
        self.files = None;
        self.screen = Screen::Status;
    }

    /// Rows shown in the tree pane: filter hits when filtering, otherwise
    /// the expanded tree
    pub fn file_rows(&self) -> Vec<&TreeEntry> {
        let Some(view) = self.files.as_ref() else {
            return Vec::new();
        };
        let Some(tree) = view.tree.as_ref() else {
            return Vec::new();
        };
        if self.filter.is_empty() {
            tree.visible_rows(&view.expanded)
        } else {
            tree.search(&self.filter)
        }
    }

    fn fetch_content(&self, ticket: crate::views::ContentTicket) {
        let backend = Arc::clone(&self.backend);
        let project_id = self.status.project_id.clone();
        self.spawn_view_task(self.files_view_id, async move {
            let result = backend.get_file_content(&project_id, &ticket.path).await;
            AppEvent::Content { ticket, result }
        });
    }

    pub fn activate_row(&mut self) {
        let Some(entry) = self.file_rows().get(self.tree_cursor).map(|e| (*e).clone()) else {
            return;
        };
        let Some(view) = self.files.as_mut() else {
            return;
        };
        if entry.is_dir() {
            view.toggle_expanded(&entry.path);
            return;
        }
        if let Some(ticket) = view.begin_select(&entry.path) {
            self.viewer_scroll = 0;
            self.fetch_content(ticket);
        }
    }

    pub fn toggle_row_selection(&mut self) {
        let Some(path) = self
            .file_rows()
            .get(self.tree_cursor)
            .map(|e| e.path.clone())
        else {
            return;
        };
        if let Some(view) = self.files.as_mut() {
            view.toggle_selection(&path);
        }
    }

    pub fn submit_optimize(&mut self) {
        let Some(view) = self.files.as_mut() else {
            return;
        };
        let ticket = match view.begin_optimize() {
            Ok(ticket) => ticket,
            Err(e) => {
                view.logs.error(e.to_string());
                return;
            }
        };
        let backend = Arc::clone(&self.backend);
        let project_id = self.status.project_id.clone();
        self.spawn_view_task(self.files_view_id, async move {
            let result = backend.optimize_files(&project_id, &ticket.files()).await;
            AppEvent::Optimized { ticket, result }
        });
    }

    // ------------------------------------------------------------------
    // Status screen
    // ------------------------------------------------------------------

    pub fn retry_generation(&mut self) {
        if let Err(e) = self.status.begin_retry() {
            self.status.logs.warning(e.to_string());
            return;
        }
        let backend = Arc::clone(&self.backend);
        let project_id = self.status.project_id.clone();
        self.spawn_view_task(self.status_view_id, async move {
            let generate = backend.generate(&project_id).await;
            let refreshed = backend.get_project(&project_id).await;
            AppEvent::Retried {
                generate,
                refreshed,
            }
        });
    }

    /// Cancel every background task (on app shutdown)
    pub fn shutdown(&mut self) {
        self.stop_polling();
        self.tokio_runtime
            .block_on(self.registry.cancel_everything());
    }
}
