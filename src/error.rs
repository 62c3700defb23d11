//! Error taxonomy for the HTTP engine and the spider runtime.
//!
//! Kinds, not types: every failure mode named in the design is one variant of
//! [`GrabError`] (surfaced to callers of [`crate::client::Client`]). Retryable
//! conditions — integrity failures, invalid network responses — never become
//! an `Err`; they are represented as data
//! ([`crate::service::task_dispatcher::DispatchResult`]) so the dispatcher's
//! exhaustive match can act on them directly instead of falling through to a
//! catch-all error.

use thiserror::Error;

/// Errors surfaced directly to a caller of [`crate::client::Client::request`].
#[derive(Error, Debug)]
pub enum GrabError {
    /// Bad configuration key, missing URL, or an unknown option on
    /// reconstruction. Never retried.
    #[error("misuse: {0}")]
    Misuse(String),

    /// Connection refused, DNS failure, timeout, TLS error — anything the
    /// transport boundary raises. Wrapped uniformly.
    #[error("transport error: {0}")]
    Transport(#[from] Box<dyn std::error::Error + Send + Sync>),

    /// Redirect depth exceeded `redirect_limit`.
    #[error("too many redirects (limit exceeded)")]
    TooManyRedirects,
}

impl GrabError {
    pub fn misuse(msg: impl Into<String>) -> Self {
        GrabError::Misuse(msg.into())
    }
}

/// A marker error a parser handler raises to signal that a response did not
/// pass validation. Caught by the dispatcher and turned into a task retry,
/// never propagated to the spider's caller.
#[derive(Error, Debug, Clone)]
#[error("integrity failure: {name}")]
pub struct IntegrityFailure {
    /// Name used verbatim in the `integrity:<name>` stat label.
    pub name: String,
}

impl IntegrityFailure {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A marker error a parser handler raises to signal an unrecoverable
/// condition. Forwarded to the fatal-error channel; triggers spider shutdown.
#[derive(Error, Debug, Clone)]
#[error("fatal error: {message}")]
pub struct FatalError {
    pub message: String,
}

impl FatalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Arbitrary exception a user handler raised that is neither an
/// [`IntegrityFailure`] nor a [`FatalError`]. Reported via
/// `Spider::process_parser_error`, never propagated.
#[derive(Error, Debug)]
#[error("parser error in handler '{handler_name}': {message}")]
pub struct ParserError {
    pub handler_name: String,
    pub message: String,
}

impl ParserError {
    pub fn new(handler_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            handler_name: handler_name.into(),
            message: message.into(),
        }
    }
}
