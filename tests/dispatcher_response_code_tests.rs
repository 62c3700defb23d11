//! Response-code validity classification in the dispatcher (spec.md §4.7):
//! a `raw` task bypasses the check; otherwise 5xx is retried like a
//! transport failure and anything else reaches the parser.

use std::sync::Arc;
use std::time::Duration;

use arachne::document::Document;
use arachne::queue::memory::MemoryQueueBackend;
use arachne::queue::QueueBackend;
use arachne::service::task_dispatcher::{self, DispatchResult};
use arachne::service::parser_pool;
use arachne::stats::Stats;
use arachne::task::Task;
use arachne::worker::WorkerControl;
use arachne::{HandlerFuture, HandlerOutcome, HandlerTable, RequestOverrides};
use tokio::sync::mpsc;

fn doc_with_code(code: u16) -> Document {
    Document::new(
        url::Url::parse("http://example.com/").unwrap(),
        reqwest::StatusCode::from_u16(code).unwrap(),
        reqwest::header::HeaderMap::new(),
        Vec::new(),
        Vec::new(),
    )
}

async fn run_harness() -> (
    Arc<dyn QueueBackend>,
    Arc<Stats>,
    Arc<WorkerControl>,
    mpsc::Sender<DispatchResult>,
    tokio::task::JoinHandle<()>,
    tokio::task::JoinHandle<()>,
    mpsc::Receiver<u16>,
) {
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

    let (seen_tx, seen_rx) = mpsc::channel(8);
    let mut handlers = HandlerTable::new();
    handlers.register(
        "fetch",
        Arc::new(move |doc: Document, _task: Task| -> HandlerFuture {
            let seen_tx = seen_tx.clone();
            Box::pin(async move {
                let _ = seen_tx.send(doc.code).await;
                Ok(HandlerOutcome::None)
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

    (
        queue,
        stats,
        control,
        dispatcher_tx,
        dispatcher_handle,
        parser_handle,
        seen_rx,
    )
}

#[tokio::test]
async fn server_error_is_retried_not_parsed() {
    let (queue, stats, control, dispatcher_tx, dispatcher_handle, parser_handle, mut seen_rx) =
        run_harness().await;

    let task = Task::new("fetch", RequestOverrides::default().url("http://example.com/"));
    dispatcher_tx
        .send(DispatchResult::NetworkResult {
            task,
            outcome: Ok(doc_with_code(503)),
        })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(stats.get("network:invalid-code"), 1);
    assert_eq!(queue.size().await, 1, "the 503 response was re-enqueued, not parsed");
    assert!(
        seen_rx.try_recv().is_err(),
        "the parser must never see a task whose response failed the validity check"
    );

    control.stop();
    drop(dispatcher_tx);
    let _ = dispatcher_handle.await;
    let _ = parser_handle.await;
}

#[tokio::test]
async fn client_error_reaches_parser() {
    let (queue, _stats, control, dispatcher_tx, dispatcher_handle, parser_handle, mut seen_rx) =
        run_harness().await;

    let task = Task::new("fetch", RequestOverrides::default().url("http://example.com/"));
    dispatcher_tx
        .send(DispatchResult::NetworkResult {
            task,
            outcome: Ok(doc_with_code(404)),
        })
        .await
        .unwrap();

    let code = tokio::time::timeout(Duration::from_secs(1), seen_rx.recv())
        .await
        .expect("handler should run for a 404")
        .expect("channel open");
    assert_eq!(code, 404);
    assert_eq!(queue.size().await, 0);

    control.stop();
    drop(dispatcher_tx);
    let _ = dispatcher_handle.await;
    let _ = parser_handle.await;
}

#[tokio::test]
async fn raw_task_bypasses_code_check() {
    let (queue, _stats, control, dispatcher_tx, dispatcher_handle, parser_handle, mut seen_rx) =
        run_harness().await;

    let task = Task::new("fetch", RequestOverrides::default().url("http://example.com/")).with_raw(true);
    dispatcher_tx
        .send(DispatchResult::NetworkResult {
            task,
            outcome: Ok(doc_with_code(500)),
        })
        .await
        .unwrap();

    let code = tokio::time::timeout(Duration::from_secs(1), seen_rx.recv())
        .await
        .expect("raw task must reach the parser regardless of status code")
        .expect("channel open");
    assert_eq!(code, 500);
    assert_eq!(queue.size().await, 0);

    control.stop();
    drop(dispatcher_tx);
    let _ = dispatcher_handle.await;
    let _ = parser_handle.await;
}
