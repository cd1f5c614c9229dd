//! The remote row store holding the `tasks` collection.

mod memory;
mod rest;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use rest::RestStore;

use crate::error::StoreError;
use crate::task::{NewTask, Task, TaskChanges, TaskId, UserId};

/// Owner-scoped record store. Every call may fail with a transport or
/// validation error; callers never retry.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All rows owned by `owner`, newest first.
    async fn select_by_owner(&self, owner: UserId) -> Result<Vec<Task>, StoreError>;

    /// Inserts all rows or none; returns the stored rows in insertion order.
    async fn insert(&self, rows: Vec<NewTask>) -> Result<Vec<Task>, StoreError>;

    async fn update(&self, id: TaskId, changes: &TaskChanges) -> Result<(), StoreError>;

    async fn delete(&self, id: TaskId) -> Result<(), StoreError>;
}
