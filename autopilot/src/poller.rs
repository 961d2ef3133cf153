//! Status polling controller
//!
//! A single background task per view fetches the project on a fixed period
//! until a terminal status is observed. Fetches are serialized: while one is
//! outstanding, ticks that fall due are skipped rather than queued. Failed
//! fetches are reported and polling carries on.
//!
//! Teardown goes through a [`CancellationToken`]. Once it is cancelled no
//! further events are delivered, even for a fetch that was already in flight.

use autopilot_sdk::{ApiError, GenerationBackend, Project};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of one poll tick
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// Non-terminal status fetched; polling continues
    Status(Project),
    /// Terminal status fetched; polling has stopped for good
    Finished(Project),
    /// Fetch failed; polling continues on the next tick
    Failed(ApiError),
}

/// Handle to a running poll task
///
/// Dropping the handle cancels the task.
pub struct StatusPoller {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl StatusPoller {
    /// Start polling `project_id` every `period`. The first fetch happens one
    /// period after the call; the initial load is the caller's business.
    pub fn spawn(
        backend: Arc<dyn GenerationBackend>,
        project_id: impl Into<String>,
        period: Duration,
        events: mpsc::UnboundedSender<PollEvent>,
    ) -> Self {
        Self::spawn_with_token(backend, project_id, period, events, CancellationToken::new())
    }

    /// Like [`StatusPoller::spawn`], cancelled through `token` as well
    pub fn spawn_with_token(
        backend: Arc<dyn GenerationBackend>,
        project_id: impl Into<String>,
        period: Duration,
        events: mpsc::UnboundedSender<PollEvent>,
        token: CancellationToken,
    ) -> Self {
        let project_id = project_id.into();
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            poll_loop(backend, project_id, period, events, task_token).await;
        });
        Self {
            token,
            handle: Some(handle),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Take the join handle, e.g. to hand it to a task registry.
    pub fn take_handle(&mut self) -> Option<JoinHandle<()>> {
        self.handle.take()
    }

    /// Wait for the task to exit (terminal status, cancellation, or the
    /// receiving side going away).
    pub async fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn poll_loop(
    backend: Arc<dyn GenerationBackend>,
    project_id: String,
    period: Duration,
    events: mpsc::UnboundedSender<PollEvent>,
    token: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    debug!(project_id = %project_id, period_ms = period.as_millis() as u64, "polling started");

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let fetched = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            result = backend.get_project(&project_id) => result,
        };

        // A fetch that resolved alongside teardown must not be applied
        if token.is_cancelled() {
            break;
        }

        let event = match fetched {
            Ok(project) if project.status.is_terminal() => {
                info!(project_id = %project_id, status = %project.status, "project reached terminal status");
                let _ = events.send(PollEvent::Finished(project));
                return;
            }
            Ok(project) => PollEvent::Status(project),
            Err(e) => {
                warn!(project_id = %project_id, error = %e, "status poll failed");
                PollEvent::Failed(e)
            }
        };

        if events.send(event).is_err() {
            debug!(project_id = %project_id, "poll receiver dropped");
            return;
        }
    }

    debug!(project_id = %project_id, "polling cancelled");
}
