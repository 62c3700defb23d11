//! Parser worker pool (spec.md §4.9).
//!
//! Grounded on `task_dispatcher.py::process_service_result`'s handling of
//! parser results (nothing, a `Task`, an iterable of `Task`s, a
//! `ResponseNotValid`-like integrity failure, or an arbitrary exception) and
//! on the explicit-handler-table design note in SPEC_FULL.md §9 — handler
//! lookup is a plain [`HandlerTable`](crate::spider::HandlerTable) map keyed
//! by task name, not a `task_<name>` attribute scan.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::document::Document;
use crate::error::ParserError;
use crate::service::task_dispatcher::DispatchResult;
use crate::spider::{HandlerOutcome, HandlerTable};
use crate::task::Task;
use crate::worker::WorkerControl;

pub async fn run(
    mut input: mpsc::Receiver<(Document, Task)>,
    handlers: Arc<HandlerTable>,
    dispatcher_tx: mpsc::Sender<DispatchResult>,
    control: Arc<WorkerControl>,
) {
    loop {
        if !control.checkpoint().await {
            return;
        }

        match tokio::time::timeout(Duration::from_millis(100), input.recv()).await {
            Ok(Some((doc, task))) => {
                let handler_name = task.name.clone();
                let outcome = match handlers.get(&handler_name) {
                    Some(handler) => (handler.as_ref())(doc, task.clone()).await,
                    None => Err(ParserError::new(
                        handler_name.clone(),
                        "no handler registered for this task name",
                    )),
                };

                // A handler may hand back any number of follow-up tasks
                // (spec.md §4.9): each becomes its own `DispatchResult::NewTask`
                // sent to the dispatcher.
                let dispatches = match outcome {
                    Ok(HandlerOutcome::NewTask(t)) => vec![DispatchResult::NewTask(t)],
                    Ok(HandlerOutcome::NewTasks(tasks)) => {
                        tasks.into_iter().map(DispatchResult::NewTask).collect()
                    }
                    Ok(HandlerOutcome::None) => vec![DispatchResult::None],
                    Ok(HandlerOutcome::IntegrityFailure(error)) => {
                        vec![DispatchResult::IntegrityFailure { task, error }]
                    }
                    Ok(HandlerOutcome::Fatal(error)) => vec![DispatchResult::Fatal(error)],
                    Err(error) => vec![DispatchResult::HandlerError {
                        task: Some(task),
                        handler_name,
                        error,
                    }],
                };

                for dispatch in dispatches {
                    if dispatcher_tx.send(dispatch).await.is_err() {
                        return;
                    }
                }
            }
            Ok(None) => return,
            Err(_) => continue,
        }
    }
}
