//! Spider runtime: wires services together and owns the run loop
//! (spec.md §4.5, §8).
//!
//! Grounded on `grab/spider/base.py::Spider`: `add_task` applies the
//! configured [`PriorityMode`] to tasks added without an explicit priority,
//! `find_task_handler` becomes the explicit [`HandlerTable`] lookup (the
//! source's `task_<name>` attribute convention has no analogue here — see
//! SPEC_FULL.md §9), and the run loop's idle/shutdown check stands in for
//! the source's `should_shutdown` polling of `task_queue`/`fatal_error_queue`.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::{PriorityMode, SpiderConfig};
use crate::document::Document;
use crate::error::{FatalError, GrabError, IntegrityFailure, ParserError};
use crate::queue::memory::MemoryQueueBackend;
use crate::queue::QueueBackend;
use crate::service::{network_pool, parser_pool, task_dispatcher, task_generator};
use crate::stats::Stats;
use crate::task::Task;
use crate::transport::{ReqwestTransport, Transport};
use crate::worker::WorkerControl;

/// What a handler reports back about a (document, task) pair (spec.md §4.9,
/// §6): nothing, a single follow-up task, or any number of them — the core
/// crawl fan-out operation, e.g. a listing-page handler enqueuing every link
/// it found.
pub enum HandlerOutcome {
    NewTask(Task),
    NewTasks(Vec<Task>),
    None,
    IntegrityFailure(IntegrityFailure),
    Fatal(FatalError),
}

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<HandlerOutcome, ParserError>> + Send>>;
/// A registered handler: takes the parsed document and the task that
/// produced it, returns what the spider should do next.
pub type Handler = Arc<dyn Fn(Document, Task) -> HandlerFuture + Send + Sync>;

/// Explicit name-to-handler map (spec.md §4.5/§9): replaces the source's
/// runtime `task_<name>` method-name convention with a lookup the compiler
/// can see end to end.
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<String, Handler>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, handler: Handler) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn get(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }
}

/// The spider runtime.
pub struct Spider {
    config: SpiderConfig,
    queue: Arc<dyn QueueBackend>,
    transport: Arc<dyn Transport>,
    handlers: HandlerTable,
    stats: Arc<Stats>,
}

impl Spider {
    pub fn new(config: SpiderConfig) -> Result<Self, GrabError> {
        Ok(Self::with_backends(
            config,
            Arc::new(MemoryQueueBackend::new()),
            Arc::new(ReqwestTransport::new()?),
        ))
    }

    pub fn with_backends(
        config: SpiderConfig,
        queue: Arc<dyn QueueBackend>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            queue,
            transport,
            handlers: HandlerTable::new(),
            stats: Arc::new(Stats::new()),
        }
    }

    pub fn register_handler(&mut self, name: impl Into<String>, handler: Handler) {
        self.handlers.register(name, handler);
    }

    pub fn stats(&self) -> Arc<Stats> {
        self.stats.clone()
    }

    /// Enqueues `task`, assigning a priority from [`PriorityMode`] if the
    /// caller left it at the zero sentinel (unset).
    pub async fn add_task(&self, mut task: Task) {
        if task.priority == 0 {
            task.priority = match self.config.priority_mode {
                PriorityMode::Const => crate::config::DEFAULT_PRIORITY,
                PriorityMode::Random => rand::thread_rng().gen_range(1..=crate::config::DEFAULT_PRIORITY),
            };
        }
        let priority = task.priority;
        let schedule_time = task.schedule_time;
        self.queue.put(task, priority, schedule_time).await;
    }

    /// Runs the spider to completion: drains `initial_tasks` into the
    /// queue, processes everything reachable from them through the
    /// network and parser pools, and returns once the system goes idle —
    /// the queue is empty, the generator is exhausted, and the parser pool
    /// has nothing outstanding.
    pub async fn run(self, initial_tasks: Box<dyn Iterator<Item = Task> + Send>) -> Arc<Stats> {
        let control = Arc::new(WorkerControl::new());
        let handlers = Arc::new(self.handlers);
        let (dispatcher_tx, dispatcher_rx) = mpsc::channel(1024);
        let (parser_tx, parser_rx) = mpsc::channel(1024);

        let generator_handle: JoinHandle<()> = tokio::spawn(task_generator::run(
            initial_tasks,
            self.queue.clone(),
            control.clone(),
            self.config.thread_number,
        ));

        let dispatcher_handle = tokio::spawn(task_dispatcher::run(
            dispatcher_rx,
            self.queue.clone(),
            parser_tx,
            self.stats.clone(),
            control.clone(),
            self.config.network_try_limit,
            self.config.task_try_limit,
        ));

        let parser_handle = tokio::spawn(parser_pool::run(
            parser_rx,
            handlers,
            dispatcher_tx.clone(),
            control.clone(),
        ));

        let mut network_handles = Vec::with_capacity(self.config.thread_number);
        for worker_id in 0..self.config.thread_number {
            network_handles.push(tokio::spawn(network_pool::run(
                worker_id,
                self.queue.clone(),
                self.transport.clone(),
                dispatcher_tx.clone(),
                control.clone(),
                self.config.reuse_cookies,
            )));
        }
        drop(dispatcher_tx);

        Self::wait_until_idle(&self.queue, &generator_handle, &control).await;
        control.stop();

        let _ = generator_handle.await;
        let _ = dispatcher_handle.await;
        let _ = parser_handle.await;
        for handle in network_handles {
            let _ = handle.await;
        }

        info!(stats = ?self.stats.snapshot(), "spider run finished");
        self.stats
    }

    /// Polls until the task generator has finished and the queue has been
    /// empty for a few consecutive checks — a simple idle heuristic in
    /// place of the source's `fatal_error_queue`/shutdown-flag monitoring,
    /// since this crate has no cross-process coordination to watch.
    async fn wait_until_idle(
        queue: &Arc<dyn QueueBackend>,
        generator_handle: &JoinHandle<()>,
        control: &Arc<WorkerControl>,
    ) {
        const REQUIRED_EMPTY_TICKS: u32 = 5;
        let mut empty_ticks = 0;
        loop {
            if control.is_stopped() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            if !generator_handle.is_finished() {
                empty_ticks = 0;
                continue;
            }
            if queue.size().await == 0 {
                empty_ticks += 1;
                if empty_ticks >= REQUIRED_EMPTY_TICKS {
                    return;
                }
            } else {
                empty_ticks = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestOverrides;

    fn ok_handler() -> Handler {
        Arc::new(|_doc: Document, _task: Task| -> HandlerFuture {
            Box::pin(async { Ok(HandlerOutcome::None) })
        })
    }

    #[test]
    fn handler_table_round_trips() {
        let mut table = HandlerTable::new();
        table.register("index", ok_handler());
        assert!(table.get("index").is_some());
        assert!(table.get("missing").is_none());
    }

    #[tokio::test]
    async fn add_task_assigns_const_priority_when_unset() {
        let spider = Spider::new(SpiderConfig::default()).unwrap();
        let task = Task::new("t", RequestOverrides::default().url("http://example.com/"));
        assert_eq!(task.priority, 0);
        spider.add_task(task).await;
        let queued = spider.queue.get().await.unwrap();
        assert_eq!(queued.priority, crate::config::DEFAULT_PRIORITY);
    }
}
