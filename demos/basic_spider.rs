//! Minimal end-to-end example: one handler, one seed task.
//!
//! Run with `cargo run --example basic_spider -- <url>`.

use std::env;
use std::sync::Arc;

use arachne::{
    Document, Handler, HandlerFuture, HandlerOutcome, HandlerTable, RequestOverrides, Spider,
    SpiderConfig, Task,
};

fn log_title_handler() -> Handler {
    Arc::new(|doc: Document, _task: Task| -> HandlerFuture {
        Box::pin(async move {
            println!("fetched {} ({} bytes)", doc.url, doc.body.len());
            Ok(HandlerOutcome::None)
        })
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    arachne::init_tracing();

    let url = env::args().nth(1).unwrap_or_else(|| "https://example.com".to_string());

    let mut spider = Spider::new(SpiderConfig::default())?;
    spider.register_handler("fetch", log_title_handler());

    let seed = Task::new("fetch", RequestOverrides::default().url(url));
    let stats = spider.run(Box::new(std::iter::once(seed))).await;

    println!("final stats: {:?}", stats.snapshot());
    Ok(())
}
