//! Queue backend abstraction (spec.md §4.3).
//!
//! Grounded on `grab/spider/queue_backend/backend.py::QueueInterface`: a
//! small pluggable contract so the in-memory implementation can later be
//! swapped for a persistent one (Redis, SQLite, ...) without touching the
//! services that use it — mirrored here as an `async_trait` so a future
//! backend can do network I/O without changing the trait shape.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::task::Task;

/// Returned by [`QueueBackend::get`] when no task is ready yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEmpty;

#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Enqueues `task`. If `schedule_time` is set, the task is held until
    /// that instant instead of being immediately ready.
    async fn put(&self, task: Task, priority: u32, schedule_time: Option<DateTime<Utc>>);

    /// Pops the next ready task in priority order (lowest `priority` first),
    /// promoting any overdue scheduled tasks first. Returns [`QueueEmpty`]
    /// if nothing is ready.
    async fn get(&self) -> Result<Task, QueueEmpty>;

    /// Ready tasks plus still-scheduled tasks.
    async fn size(&self) -> usize;

    /// Drops all queued and scheduled tasks.
    async fn clear(&self);

    /// Releases backend resources. A no-op for the in-memory backend.
    async fn close(&self);
}
