//! The spider's internal services (spec.md §4.5-4.9).
//!
//! Grounded on `grab/spider/service/{task_generator,task_dispatcher}.py`'s
//! `BaseService` pattern: each service owns a worker loop that checks
//! `worker.stop_event` / `worker.process_pause_signal()` every iteration and
//! communicates with its neighbors over queues. Here that becomes one
//! [`crate::worker::WorkerControl`] per service plus `tokio::sync::mpsc`
//! channels standing in for `queue.Queue` — see SPEC_FULL.md §5.

pub mod network_pool;
pub mod parser_pool;
pub mod task_dispatcher;
pub mod task_generator;

pub use task_dispatcher::DispatchResult;
