//! Feeds the initial task stream into the queue (spec.md §4.6).
//!
//! Grounded on `task_generator.py::TaskGeneratorService`: pulls from the
//! caller's task iterator only while the queue is below a threshold
//! (`max(200, thread_number * 2)`), so an unbounded generator doesn't race
//! ahead of what the network pool can consume, and backs off to a short
//! sleep once the queue is full enough.

use std::sync::Arc;
use std::time::Duration;

use crate::queue::QueueBackend;
use crate::task::Task;
use crate::worker::WorkerControl;

/// Minimum queue-refill threshold, matching the source's floor of 200.
const MIN_THRESHOLD: usize = 200;

pub async fn run(
    mut generator: Box<dyn Iterator<Item = Task> + Send>,
    queue: Arc<dyn QueueBackend>,
    control: Arc<WorkerControl>,
    thread_number: usize,
) {
    let threshold = MIN_THRESHOLD.max(thread_number * 2);
    loop {
        if !control.checkpoint().await {
            return;
        }

        let queue_size = queue.size().await;
        if queue_size >= threshold {
            tokio::time::sleep(Duration::from_millis(100)).await;
            continue;
        }

        let mut remaining = threshold - queue_size;
        while remaining > 0 {
            if control.is_paused() {
                break;
            }
            match generator.next() {
                Some(task) => {
                    let priority = task.priority;
                    let schedule_time = task.schedule_time;
                    queue.put(task, priority, schedule_time).await;
                    remaining -= 1;
                }
                None => return,
            }
        }
    }
}
