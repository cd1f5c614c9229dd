use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::TaskStore;
use crate::error::StoreError;
use crate::task::{NewTask, Task, TaskChanges, TaskId, UserId};

/// In-memory row store for tests and demos. Rows are kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Task>>,
    calls: AtomicUsize,
    failing: AtomicBool,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps for `latency` before touching the rows.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Seeds rows directly, bypassing the call counter.
    pub fn seed(&self, rows: impl IntoIterator<Item = Task>) {
        self.rows.lock().extend(rows);
    }

    /// While set, every call fails with a transport error and changes nothing.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn rows(&self) -> Vec<Task> {
        self.rows.lock().clone()
    }

    async fn enter(&self, op: &'static str) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            debug!(op, "memory store failing on purpose");
            return Err(StoreError::Transport(format!("{op}: store offline")));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn select_by_owner(&self, owner: UserId) -> Result<Vec<Task>, StoreError> {
        self.enter("select").await?;
        // Reverse first so rows sharing a timestamp keep newest-inserted first.
        let mut owned: Vec<Task> = self
            .rows
            .lock()
            .iter()
            .rev()
            .filter(|task| task.owner_id == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn insert(&self, rows: Vec<NewTask>) -> Result<Vec<Task>, StoreError> {
        self.enter("insert").await?;
        if rows.iter().any(|row| row.title.trim().is_empty()) {
            return Err(StoreError::Rejected {
                status: 400,
                message: "title must not be empty".to_string(),
            });
        }

        let now = Utc::now();
        let inserted: Vec<Task> = rows
            .into_iter()
            .map(|row| Task {
                id: Uuid::new_v4(),
                title: row.title,
                notes: row.notes,
                completed: row.completed,
                owner_id: row.owner_id,
                created_at: now,
                updated_at: now,
            })
            .collect();

        self.rows.lock().extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn update(&self, id: TaskId, changes: &TaskChanges) -> Result<(), StoreError> {
        self.enter("update").await?;
        let mut rows = self.rows.lock();
        let row = rows
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(StoreError::NotFound(id))?;
        changes.apply_to(row);
        Ok(())
    }

    async fn delete(&self, id: TaskId) -> Result<(), StoreError> {
        self.enter("delete").await?;
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|task| task.id != id);
        if rows.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}
