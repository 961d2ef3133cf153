//! Task registry for background task lifecycle management
//!
//! Work spawned for a view (status polling, content fetches, optimize calls)
//! is registered under the view's id. Each view gets one cancellation token
//! shared by all of its tasks, so tearing the view down both signals the
//! tasks and aborts whatever is still running.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Default)]
struct ViewTasks {
    token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

pub struct TaskRegistry {
    tasks: Arc<Mutex<HashMap<Uuid, ViewTasks>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Cancellation token shared by every task of `view_id`
    pub async fn token_for(&self, view_id: Uuid) -> CancellationToken {
        let mut tasks = self.tasks.lock().await;
        tasks.entry(view_id).or_default().token.clone()
    }

    /// Track a spawned task for cleanup
    pub async fn register(&self, view_id: Uuid, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().await;
        let entry = tasks.entry(view_id).or_default();
        entry.handles.retain(|h| !h.is_finished());
        entry.handles.push(handle);
    }

    /// Number of unfinished tasks for a view
    pub async fn running(&self, view_id: &Uuid) -> usize {
        let tasks = self.tasks.lock().await;
        tasks.get(view_id).map_or(0, |entry| {
            entry.handles.iter().filter(|h| !h.is_finished()).count()
        })
    }

    /// Cancel all tasks for a view
    pub async fn cancel_all(&self, view_id: &Uuid) {
        let mut tasks = self.tasks.lock().await;
        if let Some(entry) = tasks.remove(view_id) {
            entry.token.cancel();
            for handle in entry.handles {
                handle.abort();
            }
        }
    }

    /// Cancel all tasks (on app shutdown)
    pub async fn cancel_everything(&self) {
        let mut tasks = self.tasks.lock().await;
        for (_, entry) in tasks.drain() {
            entry.token.cancel();
            for handle in entry.handles {
                handle.abort();
            }
        }
    }
}

impl Clone for TaskRegistry {
    fn clone(&self) -> Self {
        Self {
            tasks: Arc::clone(&self.tasks),
        }
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}
