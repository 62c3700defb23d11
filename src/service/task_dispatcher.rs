//! Central result classifier (spec.md §4.7).
//!
//! Grounded on `task_dispatcher.py::process_service_result` /
//! `process_network_result`: every result produced anywhere in the spider —
//! a new task, a network outcome, a handler-raised integrity failure, a
//! fatal error — funnels through one classifier. The source dispatches by
//! `isinstance` on a dynamically-typed `result`; [`DispatchResult`] makes
//! that an explicit, exhaustive enum match instead, which is the "tagged
//! variant over runtime type switch" design noted in SPEC_FULL.md §9.
//!
//! `process_network_result`'s validity check (spec.md §4.7: "a task flagged
//! `raw` bypasses code checks; otherwise the response is valid iff `ok` and
//! ... `is_valid_network_response_code`") is [`is_valid_network_response_code`]
//! below. `ok` is already implied here — an `Err` outcome never reaches this
//! check, it takes the transport-retry branch directly.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::document::Document;
use crate::error::{FatalError, GrabError, IntegrityFailure, ParserError};
use crate::queue::QueueBackend;
use crate::stats::Stats;
use crate::task::Task;
use crate::worker::WorkerControl;

/// Every kind of result a service can hand back to the dispatcher.
pub enum DispatchResult {
    /// A handler produced a new task to crawl.
    NewTask(Task),
    /// A handler produced nothing.
    None,
    /// A handler raised an integrity failure against `task`'s response —
    /// the task is retried (bounded by `task_try_limit`), distinct from a
    /// transport-level network failure.
    IntegrityFailure { task: Task, error: IntegrityFailure },
    /// A handler raised an arbitrary, non-integrity error while processing
    /// `task` (if known).
    HandlerError {
        task: Option<Task>,
        handler_name: String,
        error: ParserError,
    },
    /// A handler raised a [`FatalError`]: the whole spider run should stop.
    Fatal(FatalError),
    /// The network pool finished `task`: either a [`Document`] ready for
    /// the parser pool, or a transport failure to retry.
    NetworkResult {
        task: Task,
        outcome: Result<Document, GrabError>,
    },
}

/// The dispatcher's worker loop. Polls `input` with a short timeout so it
/// can still observe `control`'s stop/pause signal between messages,
/// mirroring the source's `queue.get(True, 0.1)`.
pub async fn run(
    mut input: mpsc::Receiver<DispatchResult>,
    queue: Arc<dyn QueueBackend>,
    parser_tx: mpsc::Sender<(Document, Task)>,
    stats: Arc<Stats>,
    control: Arc<WorkerControl>,
    network_try_limit: u32,
    task_try_limit: u32,
) {
    loop {
        if !control.checkpoint().await {
            return;
        }
        match tokio::time::timeout(Duration::from_millis(100), input.recv()).await {
            Ok(Some(result)) => {
                process_result(
                    result,
                    &queue,
                    &parser_tx,
                    &stats,
                    &control,
                    network_try_limit,
                    task_try_limit,
                )
                .await;
            }
            Ok(None) => return,
            Err(_) => continue,
        }
    }
}

async fn process_result(
    result: DispatchResult,
    queue: &Arc<dyn QueueBackend>,
    parser_tx: &mpsc::Sender<(Document, Task)>,
    stats: &Arc<Stats>,
    control: &Arc<WorkerControl>,
    network_try_limit: u32,
    task_try_limit: u32,
) {
    match result {
        DispatchResult::NewTask(task) => {
            let priority = task.priority;
            let schedule_time = task.schedule_time;
            queue.put(task, priority, schedule_time).await;
        }
        DispatchResult::None => {}
        DispatchResult::IntegrityFailure { task, error } => {
            stats.inc(&format!("integrity:{}", error.name));
            if task.task_try_count < task_try_limit {
                let retry = task.for_task_retry();
                let priority = retry.priority;
                queue.put(retry, priority, None).await;
            } else {
                warn!(task = %task.name, "task try limit exhausted after integrity failure");
                stats.inc("task-try-limit:exhausted");
            }
        }
        DispatchResult::HandlerError {
            task,
            handler_name,
            error,
        } => {
            error!(handler = %handler_name, task = ?task.as_ref().map(|t| &t.name), %error, "handler error");
            stats.inc("parser:error");
        }
        DispatchResult::Fatal(err) => {
            error!(%err, "fatal error, stopping spider");
            stats.inc("fatal-error");
            control.stop();
        }
        DispatchResult::NetworkResult { task, outcome } => {
            stats.inc("spider:request");
            match outcome {
                Ok(doc) => {
                    if task.raw || is_valid_network_response_code(doc.code) {
                        debug!(task = %task.name, code = doc.code, "network result ready for parsing");
                        let _ = parser_tx.send((doc, task)).await;
                    } else {
                        stats.inc("network:invalid-code");
                        if task.network_try_count < network_try_limit {
                            warn!(task = %task.name, code = doc.code, "invalid response code, retrying");
                            let retry = task.for_network_retry();
                            let priority = retry.priority;
                            queue.put(retry, priority, None).await;
                        } else {
                            error!(task = %task.name, code = doc.code, "network try limit exhausted after invalid response code");
                            stats.inc("network-try-limit:exhausted");
                        }
                    }
                }
                Err(err) => {
                    if task.network_try_count < network_try_limit {
                        warn!(task = %task.name, %err, "network error, retrying");
                        let retry = task.for_network_retry();
                        let priority = retry.priority;
                        queue.put(retry, priority, None).await;
                    } else {
                        error!(task = %task.name, %err, "network try limit exhausted");
                        stats.inc("network-try-limit:exhausted");
                    }
                }
            }
        }
    }
}

/// Content-level validity of a network response's status code, independent
/// of transport-level success (spec.md §4.7). Server errors (5xx) are
/// treated as not yet a usable document and retried like a transport
/// failure; everything below that — including 4xx, which is a legitimate
/// answer from the server for the parser to act on — is handed to the
/// parser pool.
fn is_valid_network_response_code(code: u16) -> bool {
    code < 500
}
