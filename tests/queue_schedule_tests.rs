//! Queue priority/scheduling scenario from spec.md §8 (S7).

use std::time::Duration;

use arachne::queue::memory::MemoryQueueBackend;
use arachne::queue::QueueBackend;
use arachne::task::Task;
use arachne::RequestOverrides;
use chrono::Utc;

fn task(name: &str) -> Task {
    Task::new(name, RequestOverrides::default().url("http://example.com/"))
}

#[tokio::test]
async fn s7_priority_and_schedule_ordering() {
    let queue = MemoryQueueBackend::new();

    queue.put(task("A"), 2, None).await;
    queue.put(task("B"), 1, None).await;
    let schedule_at = Utc::now() + chrono::Duration::milliseconds(300);
    queue.put(task("C"), 1, Some(schedule_at)).await;

    assert_eq!(queue.get().await.unwrap().name, "B");
    assert_eq!(queue.get().await.unwrap().name, "A");
    assert!(queue.get().await.is_err(), "C is not due yet");

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(queue.get().await.unwrap().name, "C");
}
