//! In-memory queue backend.
//!
//! Grounded directly on `grab/spider/queue_backend/memory.py`: a priority
//! heap for ready tasks plus a separate list for scheduled ones. `get()`
//! walks the scheduled list first and promotes every overdue entry into the
//! ready heap at priority `1` before popping — reproduced here exactly as
//! the source has it (see SPEC_FULL.md §9: this is a deliberately preserved
//! quirk, not a bug), rather than re-deriving "fixed" behavior.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{QueueBackend, QueueEmpty};
use crate::task::Task;

/// Priority assigned to a scheduled task promoted into the ready heap
/// (`self.put(task, 1)` in the source).
const PROMOTED_PRIORITY: u32 = 1;

struct HeapEntry {
    priority: u32,
    seq: u64,
    task: Task,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}
impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; wrapping in Reverse makes the lowest
        // priority (and, within a priority, the earliest insertion) compare
        // greatest, so `pop()` returns it first.
        (Reverse(self.priority), Reverse(self.seq))
            .cmp(&(Reverse(other.priority), Reverse(other.seq)))
    }
}

struct State {
    heap: BinaryHeap<HeapEntry>,
    scheduled: Vec<(DateTime<Utc>, Task)>,
}

/// Default, process-local [`QueueBackend`].
pub struct MemoryQueueBackend {
    state: Mutex<State>,
    next_seq: AtomicU64,
}

impl MemoryQueueBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                heap: BinaryHeap::new(),
                scheduled: Vec::new(),
            }),
            next_seq: AtomicU64::new(0),
        }
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, AtomicOrdering::Relaxed)
    }
}

impl Default for MemoryQueueBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueBackend for MemoryQueueBackend {
    async fn put(&self, task: Task, priority: u32, schedule_time: Option<DateTime<Utc>>) {
        let mut state = self.state.lock().await;
        match schedule_time {
            None => {
                let seq = self.next_seq();
                state.heap.push(HeapEntry { priority, seq, task });
            }
            Some(at) => state.scheduled.push((at, task)),
        }
    }

    async fn get(&self) -> Result<Task, QueueEmpty> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        let (due, not_due): (Vec<_>, Vec<_>) =
            state.scheduled.drain(..).partition(|(at, _)| *at <= now);
        state.scheduled = not_due;
        for (_, task) in due {
            let seq = self.next_seq();
            state.heap.push(HeapEntry {
                priority: PROMOTED_PRIORITY,
                seq,
                task,
            });
        }

        state.heap.pop().map(|entry| entry.task).ok_or(QueueEmpty)
    }

    async fn size(&self) -> usize {
        let state = self.state.lock().await;
        state.heap.len() + state.scheduled.len()
    }

    async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.heap.clear();
        state.scheduled.clear();
    }

    async fn close(&self) {}
}
