//! A handler returning several follow-up tasks at once (spec.md §4.9,
//! §6 — "a handler may return nothing, a Task, or an iterable of Tasks").

use std::sync::Arc;
use std::time::Duration;

use arachne::document::Document;
use arachne::queue::memory::MemoryQueueBackend;
use arachne::queue::QueueBackend;
use arachne::service::task_dispatcher;
use arachne::service::parser_pool;
use arachne::stats::Stats;
use arachne::task::Task;
use arachne::worker::WorkerControl;
use arachne::{HandlerFuture, HandlerOutcome, HandlerTable, RequestOverrides};
use tokio::sync::mpsc;

#[tokio::test]
async fn handler_returning_several_tasks_enqueues_all_of_them() {
    let queue: Arc<dyn QueueBackend> = Arc::new(MemoryQueueBackend::new());
    let stats = Arc::new(Stats::new());
    let control = Arc::new(WorkerControl::new());

    let (dispatcher_tx, dispatcher_rx) = mpsc::channel(16);
    let (parser_tx, parser_rx) = mpsc::channel(16);

    let dispatcher_handle = tokio::spawn(task_dispatcher::run(
        dispatcher_rx,
        queue.clone(),
        parser_tx,
        stats.clone(),
        control.clone(),
        10,
        10,
    ));

    let mut handlers = HandlerTable::new();
    handlers.register(
        "listing",
        Arc::new(|_doc: Document, _task: Task| -> HandlerFuture {
            Box::pin(async move {
                let follow_ups = (0..3)
                    .map(|i| {
                        Task::new(
                            "fetch",
                            RequestOverrides::default().url(format!("http://example.com/{i}")),
                        )
                    })
                    .collect();
                Ok(HandlerOutcome::NewTasks(follow_ups))
            })
        }),
    );
    let handlers = Arc::new(handlers);

    let parser_handle = tokio::spawn(parser_pool::run(
        parser_rx,
        handlers,
        dispatcher_tx.clone(),
        control.clone(),
    ));

    let seed = Task::new("listing", RequestOverrides::default().url("http://example.com/"));
    let doc = Document::new(
        url::Url::parse("http://example.com/").unwrap(),
        reqwest::StatusCode::OK,
        reqwest::header::HeaderMap::new(),
        b"<html></html>".to_vec(),
        Vec::new(),
    );
    dispatcher_tx
        .send(task_dispatcher::DispatchResult::NetworkResult {
            task: seed,
            outcome: Ok(doc),
        })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(queue.size().await, 3, "all three follow-up tasks were enqueued");

    control.stop();
    drop(dispatcher_tx);
    let _ = dispatcher_handle.await;
    let _ = parser_handle.await;
}
