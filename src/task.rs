//! Spider task entity (spec.md §3/§4.4).
//!
//! Grounded on `grab/spider/task.py::Task`: a named unit of work carrying the
//! request configuration to issue plus the bookkeeping a spider needs to
//! retry it intelligently. `network_try_count` and `task_try_count` are kept
//! as independent counters (see SPEC_FULL.md §9 — Open Question resolution):
//! a transport failure bumps the former, a handler-raised integrity failure
//! bumps the latter, and each is checked against its own configured limit.

use chrono::{DateTime, Utc};

use crate::request::RequestOverrides;

/// A unit of crawl work bound to a named handler.
#[derive(Debug, Clone)]
pub struct Task {
    /// Name of the handler this task dispatches to on success
    /// (`task_<name>` in the source; an explicit [`crate::spider::HandlerTable`]
    /// lookup key here).
    pub name: String,
    /// Request configuration to build a [`crate::request::Request`] from.
    pub overrides: RequestOverrides,
    /// Scheduling priority; lower values are serviced first. `u32` so the
    /// "promote overdue scheduled task to priority 1" rule can't underflow.
    pub priority: u32,
    /// If set, this task is not ready until this wall-clock instant.
    pub schedule_time: Option<DateTime<Utc>>,
    /// Number of times this task has been re-submitted after a transport
    /// (network-layer) failure.
    pub network_try_count: u32,
    /// Number of times this task has been re-submitted after a handler-raised
    /// integrity failure.
    pub task_try_count: u32,
    /// Arbitrary caller-attached data, carried through unchanged across
    /// clones and retries (`Task.kwargs` bucket in the source).
    pub user_data: Option<serde_json::Value>,
    /// When set, the dispatcher's response-code validity check (spec.md
    /// §4.7) is bypassed entirely and the response always reaches the
    /// parser, whatever its status code.
    pub raw: bool,
}

impl Task {
    pub fn new(name: impl Into<String>, overrides: RequestOverrides) -> Self {
        Self {
            name: name.into(),
            overrides,
            priority: 0,
            schedule_time: None,
            network_try_count: 0,
            task_try_count: 0,
            user_data: None,
            raw: false,
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Marks this task `raw`: its response skips the dispatcher's status
    /// code validity check and always reaches the parser.
    pub fn with_raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    pub fn with_schedule_time(mut self, at: DateTime<Utc>) -> Self {
        self.schedule_time = Some(at);
        self
    }

    pub fn with_user_data(mut self, data: serde_json::Value) -> Self {
        self.user_data = Some(data);
        self
    }

    /// Produces a retry clone for a transport failure: bumps
    /// `network_try_count`, drops any `schedule_time` (retries are immediate,
    /// not re-scheduled), keeps priority and overrides untouched.
    pub fn for_network_retry(&self) -> Self {
        let mut clone = self.clone();
        clone.network_try_count += 1;
        clone.schedule_time = None;
        clone
    }

    /// Produces a retry clone for a handler-raised integrity failure: bumps
    /// `task_try_count` instead of `network_try_count`.
    pub fn for_task_retry(&self) -> Self {
        let mut clone = self.clone();
        clone.task_try_count += 1;
        clone.schedule_time = None;
        clone
    }
}
