//! A concurrent web crawling framework: a redirect-following HTTP client
//! with a cookie jar, a pluggable [`Transport`](transport::Transport), and a
//! priority-queue-driven [`Spider`](spider::Spider) runtime that fans work
//! out across a network pool and a parser pool.
//!
//! Grounded throughout on `grab` (see `DESIGN.md` for the per-module
//! ledger). Command-line entry points, DOM selection, and distributed
//! coordination across processes are out of scope — see `SPEC_FULL.md` §1.

pub mod client;
pub mod config;
pub mod connection_pool;
pub mod cookie;
pub mod document;
pub mod error;
pub mod queue;
pub mod request;
pub mod service;
pub mod spider;
pub mod stats;
pub mod task;
pub mod transport;
pub mod worker;

pub use client::Client;
pub use config::SpiderConfig;
pub use cookie::{Cookie, CookieJar};
pub use document::Document;
pub use error::GrabError;
pub use request::{Request, RequestOverrides};
pub use spider::{Handler, HandlerFuture, HandlerOutcome, HandlerTable, Spider};
pub use task::Task;

/// Installs a `tracing-subscriber` `fmt` layer driven by `RUST_LOG`
/// (defaulting to `info`). Optional — callers that already manage their own
/// subscriber should skip this.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
