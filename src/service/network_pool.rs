//! Network worker pool (spec.md §4.8).
//!
//! Grounded on SPEC_FULL.md §9's "one `Client` per worker" design note: each
//! worker owns a private [`Client`](crate::client::Client) over the shared
//! [`Transport`](crate::transport::Transport), so cookie state never needs
//! cross-worker synchronization. The poll-the-queue-with-a-short-sleep
//! idiom mirrors the source's `queue.get(True, 0.1)` pattern used throughout
//! `grab/spider/service`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::client::Client;
use crate::queue::{QueueBackend, QueueEmpty};
use crate::service::task_dispatcher::DispatchResult;
use crate::transport::Transport;
use crate::worker::WorkerControl;

pub async fn run(
    worker_id: usize,
    queue: Arc<dyn QueueBackend>,
    transport: Arc<dyn Transport>,
    dispatcher_tx: mpsc::Sender<DispatchResult>,
    control: Arc<WorkerControl>,
    reuse_cookies: bool,
) {
    let mut client = Client::with_transport(transport);
    if !reuse_cookies {
        client
            .setup("reuse_cookies", serde_json::json!(false))
            .expect("reuse_cookies is a recognized client option");
    }

    loop {
        if !control.checkpoint().await {
            return;
        }

        match queue.get().await {
            Ok(task) => {
                debug!(worker_id, task = %task.name, "network worker picked up task");
                let outcome = client.request(task.overrides.clone()).await;
                if dispatcher_tx
                    .send(DispatchResult::NetworkResult { task, outcome })
                    .await
                    .is_err()
                {
                    return;
                }
            }
            Err(QueueEmpty) => {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    }
}
