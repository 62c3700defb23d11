//! The crawling client ("Grab") — spec.md §4.1.
//!
//! Grounded on `grab.base.Grab`: `request()` owns the redirect-following
//! loop the source implements as a `while True` around
//! `self.transport.request()` / `prepare_response()`, `submit()` layers
//! caller overrides on top of a form-derived request, and `clone()` /
//! `setup()` mirror `Grab.clone()` / `Grab.setup()`. The HTTP client
//! construction itself (proxy, timeouts, pool tuning) is the teacher's
//! `client.rs::build_client`, relocated into [`crate::transport::ReqwestTransport`]
//! since this crate's `Transport` is the pluggable seam, not `Client` itself.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cookie::{Cookie, CookieJar};
use crate::document::Document;
use crate::error::GrabError;
use crate::request::{Request, RequestOverrides};
use crate::transport::{ReqwestTransport, Transport};

/// On-disk / wire form of a [`Client`]'s durable state (spec.md §6): the one
/// recognized config key plus the flattened cookie jar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedClient {
    pub reuse_cookies: bool,
    pub default_user_agent: String,
    pub cookies: Vec<Cookie>,
}

/// Generates a randomized default User-Agent, one per `Client` (spec.md §8
/// scenarios S3/S4: requests from one client share it, requests from fresh
/// clients tend not to).
fn generate_default_user_agent() -> String {
    let build_tag: u32 = rand::thread_rng().gen();
    format!("arachne/{} (+{build_tag:08x})", env!("CARGO_PKG_VERSION"))
}

/// A crawling client: owns a cookie jar, a pluggable [`Transport`], and the
/// small set of recognized per-client options (spec.md §6).
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    jar: CookieJar,
    reuse_cookies: bool,
    default_user_agent: String,
}

impl Client {
    /// Builds a `Client` backed by the default [`ReqwestTransport`].
    pub fn new() -> Result<Self, GrabError> {
        Ok(Self::with_transport(Arc::new(ReqwestTransport::new()?)))
    }

    /// Builds a `Client` over a caller-supplied transport (tests typically
    /// use this with a transport that talks to a `wiremock::MockServer`).
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            jar: CookieJar::new(),
            reuse_cookies: true,
            default_user_agent: generate_default_user_agent(),
        }
    }

    /// Sets a recognized client option. `reuse_cookies` is the only key
    /// currently defined (spec.md §6); anything else is a misuse error —
    /// the runtime counterpart to [`RequestOverrides`]'s compile-time closed
    /// key set, kept here because this entry point is inherently
    /// stringly-keyed (config loaded from outside the program).
    pub fn setup(&mut self, key: &str, value: serde_json::Value) -> Result<(), GrabError> {
        match key {
            "reuse_cookies" => {
                self.reuse_cookies = value
                    .as_bool()
                    .ok_or_else(|| GrabError::misuse("reuse_cookies expects a boolean"))?;
                Ok(())
            }
            other => Err(GrabError::misuse(format!("unknown client option: '{other}'"))),
        }
    }

    pub fn clear_cookies(&mut self) {
        self.jar.clear();
    }

    pub fn cookie_jar(&self) -> &CookieJar {
        &self.jar
    }

    /// Performs one logical request, following redirects per
    /// `overrides.follow_location` up to `overrides.redirect_limit` hops
    /// (spec.md §4.1, invariant: redirects preserve the original HTTP
    /// method across every 3xx code, including 303 — no browser-style
    /// downgrade to GET).
    pub async fn request(&mut self, overrides: RequestOverrides) -> Result<Document, GrabError> {
        let mut req = Request::from_overrides(overrides)?;
        if req.user_agent.is_none() {
            req.user_agent = Some(self.default_user_agent.clone());
        }

        let mut redirects_followed = 0u32;
        loop {
            self.transport.reset();
            debug!(url = %req.url, method = %req.method, "issuing request");
            let raw = self.transport.request(&req, &self.jar).await?;
            let doc = self.transport.prepare_response(&req, raw)?;

            if self.reuse_cookies {
                for cookie in &doc.cookies {
                    self.jar.set_cookie(cookie.clone());
                }
            }

            if !req.follow_location {
                return Ok(doc);
            }
            let Some(location) = doc.find_redirect_url() else {
                return Ok(doc);
            };
            if redirects_followed >= req.redirect_limit {
                warn!(url = %doc.url, limit = req.redirect_limit, "redirect limit exceeded");
                return Err(GrabError::TooManyRedirects);
            }
            redirects_followed += 1;
            let next_url = doc
                .url
                .join(&location)
                .map_err(|e| GrabError::misuse(format!("invalid redirect location '{location}': {e}")))?;
            req = req.rebuilt_with_url(next_url);
        }
    }

    /// Submits a document-derived form, layering `overrides` on top of it
    /// (spec.md §4.1). Requires a `Document::form_request_overrides`
    /// implementation from the caller's own DOM layer — see
    /// [`Document::form_request_overrides`].
    pub async fn submit(
        &mut self,
        document: &Document,
        overrides: RequestOverrides,
    ) -> Result<Document, GrabError> {
        let form_overrides = document.form_request_overrides()?;
        self.request(form_overrides.merge(overrides)).await
    }

    pub fn to_persisted(&self) -> PersistedClient {
        PersistedClient {
            reuse_cookies: self.reuse_cookies,
            default_user_agent: self.default_user_agent.clone(),
            cookies: self.jar.to_vec(),
        }
    }

    pub fn restore(&mut self, persisted: PersistedClient) {
        self.reuse_cookies = persisted.reuse_cookies;
        self.default_user_agent = persisted.default_user_agent;
        self.jar = CookieJar::build_jar(persisted.cookies);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_rejects_unknown_key() {
        let mut client = Client::with_transport(Arc::new(
            crate::transport::ReqwestTransport::new().unwrap(),
        ));
        let err = client.setup("not_a_real_key", serde_json::json!(true)).unwrap_err();
        assert!(matches!(err, GrabError::Misuse(_)));
    }

    #[test]
    fn setup_accepts_reuse_cookies() {
        let mut client = Client::with_transport(Arc::new(
            crate::transport::ReqwestTransport::new().unwrap(),
        ));
        client.setup("reuse_cookies", serde_json::json!(false)).unwrap();
        assert!(!client.reuse_cookies);
    }

    #[test]
    fn persist_round_trips_cookies_and_config() {
        let mut client = Client::with_transport(Arc::new(
            crate::transport::ReqwestTransport::new().unwrap(),
        ));
        client.jar.set_cookie(Cookie::new("sid", "abc", "example.com"));
        client.setup("reuse_cookies", serde_json::json!(false)).unwrap();

        let persisted = client.to_persisted();
        let json = serde_json::to_string(&persisted).unwrap();
        let restored: PersistedClient = serde_json::from_str(&json).unwrap();

        let mut fresh = Client::with_transport(Arc::new(
            crate::transport::ReqwestTransport::new().unwrap(),
        ));
        fresh.restore(restored);
        assert!(!fresh.reuse_cookies);
        assert_eq!(fresh.jar.len(), 1);
    }
}
