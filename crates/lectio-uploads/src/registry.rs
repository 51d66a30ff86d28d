//! In-memory upload task registry.
//!
//! Tracks every in-flight upload for progress display. Completed tasks are
//! evicted automatically after a short residence so a finished upload shows
//! its success briefly and then disappears; failed tasks stay until removed
//! so the error remains visible.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use uuid::Uuid;

use lectio_core::{MediaKind, UploadStatus, UploadTask};

/// Shared registry of upload tasks.
///
/// Thread-safe and async-compatible using tokio's RwLock. Cloning is cheap
/// and every clone observes the same state.
#[derive(Clone)]
pub struct UploadRegistry {
    tasks: Arc<RwLock<HashMap<Uuid, UploadTask>>>,
    evict_after: Duration,
}

impl UploadRegistry {
    pub fn new(evict_after: Duration) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            evict_after,
        }
    }

    pub fn from_config(config: &lectio_core::Config) -> Self {
        Self::new(config.evict_completed_after())
    }

    /// Insert a fresh task in its initial state and return its id.
    pub async fn register(&self, title: impl Into<String>, kind: MediaKind) -> Uuid {
        let task = UploadTask::new(title, kind);
        let id = task.id;
        self.tasks.write().await.insert(id, task);
        tracing::debug!(task_id = %id, "Upload task registered");
        id
    }

    /// Overwrite a task's progress and status.
    ///
    /// Unknown ids are ignored so a late update cannot resurrect an evicted
    /// task. A transition into `Completed` schedules eviction; tasks in
    /// `Error` are never scheduled and stay until removed.
    pub async fn update_progress(&self, id: Uuid, progress: u8, status: UploadStatus) {
        let previous = {
            let mut tasks = self.tasks.write().await;
            let Some(task) = tasks.get_mut(&id) else {
                tracing::debug!(task_id = %id, "Progress update for unknown task ignored");
                return;
            };
            let previous = task.status;
            task.progress = progress.min(100);
            task.status = status;
            previous
        };

        if status == UploadStatus::Completed && previous != UploadStatus::Completed {
            self.schedule_eviction(id);
        }
    }

    /// Remove a task. Removing an absent task is a no-op.
    pub async fn remove(&self, id: Uuid) {
        self.tasks.write().await.remove(&id);
    }

    pub async fn get(&self, id: Uuid) -> Option<UploadTask> {
        self.tasks.read().await.get(&id).cloned()
    }

    /// All tracked tasks in stable display order, oldest first.
    pub async fn snapshot(&self) -> Vec<UploadTask> {
        let tasks = self.tasks.read().await;
        let mut tasks: Vec<UploadTask> = tasks.values().cloned().collect();
        tasks.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        tasks
    }

    fn schedule_eviction(&self, id: Uuid) {
        let registry = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(registry.evict_after).await;
            registry.remove(id).await;
            tracing::debug!(task_id = %id, "Completed upload task evicted");
        });
    }
}

impl Default for UploadRegistry {
    fn default() -> Self {
        Self::from_config(&lectio_core::Config::default())
    }
}
