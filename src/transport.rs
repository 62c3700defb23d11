//! Pluggable HTTP executor (spec.md §4.2).
//!
//! Grounded on `client.rs::build_client` for `reqwest::ClientBuilder`
//! assembly (proxy, timeouts, connection-pool tuning). The source's
//! `Transport` stores the raw response from `request()` as implicit instance
//! state for a later `prepare_response()` call; here `request` returns the
//! [`RawResponse`] by value and `prepare_response` takes it as a parameter.
//! That is the Rust-idiomatic rendering of the same two-phase protocol —
//! explicit data flow instead of interior-mutable scratch state — and it is
//! what lets a `Transport` be shared (`Arc<dyn Transport>`) across
//! concurrently-running Clients without a lock on every request.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;

use crate::connection_pool::PoolConfig;
use crate::cookie::{Cookie, CookieJar};
use crate::document::Document;
use crate::error::GrabError;
use crate::request::{Request, RequestBody};

/// The raw, not-yet-wrapped result of one network exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub url: url::Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Converts a lower-level transport failure into the system's error
/// taxonomy. The source models this as a context manager
/// (`wrap_transport_error`); here it is a plain conversion function called at
/// every transport call site, the idiomatic Rust equivalent of a "scoped
/// region that wraps errors".
pub fn wrap_transport_error(err: reqwest::Error) -> GrabError {
    GrabError::Transport(Box::new(err))
}

/// Contract every pluggable transport implements.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs the network exchange. `jar` supplies the cookies to attach.
    async fn request(&self, req: &Request, jar: &CookieJar) -> Result<RawResponse, GrabError>;

    /// Converts a raw response into a [`Document`], extracting `Set-Cookie`
    /// headers into [`Cookie`] records.
    fn prepare_response(&self, req: &Request, raw: RawResponse) -> Result<Document, GrabError>;

    /// Releases any transport-held state ahead of the next logical request.
    /// A no-op for the default stateless transport; present so transports
    /// that do carry per-exchange state (connection affinity, TLS session
    /// tickets) have a defined reset point between redirect hops.
    fn reset(&self) {}
}

/// Default transport: a connection-pooling `reqwest::Client`.
///
/// Redirects are never followed by the underlying client — `Client`'s own
/// redirect loop (spec.md §4.1) owns that decision, so this transport is
/// built with `redirect::Policy::none()`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, GrabError> {
        Self::with_pool_config(PoolConfig::default())
    }

    pub fn with_pool_config(pool_config: PoolConfig) -> Result<Self, GrabError> {
        let builder = pool_config
            .apply_to_builder(reqwest::Client::builder())
            .redirect(reqwest::redirect::Policy::none());
        let client = builder
            .build()
            .map_err(|e| GrabError::Transport(Box::new(e)))?;
        Ok(Self { client })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new().expect("default reqwest client configuration must build")
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(&self, req: &Request, jar: &CookieJar) -> Result<RawResponse, GrabError> {
        // A per-request proxy needs its own client (reqwest bakes proxy
        // configuration into the client, not the request); everything else
        // reuses the shared pooled client built at construction time.
        let dedicated_client;
        let client = if let Some(proxy) = &req.proxy {
            let mut builder = reqwest::Client::builder()
                .proxy(proxy.to_reqwest_proxy()?)
                .redirect(reqwest::redirect::Policy::none());
            if let Some(connect_timeout) = req.connect_timeout {
                builder = builder.connect_timeout(connect_timeout);
            }
            dedicated_client = builder
                .build()
                .map_err(|e| GrabError::Transport(Box::new(e)))?;
            &dedicated_client
        } else {
            &self.client
        };

        let mut builder = client
            .request(req.method.clone(), req.url.clone())
            .headers(req.headers.clone());

        if let Some(ua) = &req.user_agent {
            builder = builder.header("User-Agent", ua.as_str());
        }

        let now = chrono::Utc::now().timestamp();
        let host = req.url.host_str().unwrap_or_default();
        let cookie_header: String = jar
            .matching(host, req.url.path(), now)
            .into_iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");
        if !cookie_header.is_empty() {
            builder = builder.header("Cookie", cookie_header);
        }

        if let Some(body) = &req.body {
            builder = match body {
                RequestBody::Bytes(b) => builder.body(b.clone()),
                RequestBody::Form(pairs) => builder.form(pairs),
            };
        }

        if let Some(timeout) = req.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(wrap_transport_error)?;

        let url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(wrap_transport_error)?.to_vec();

        Ok(RawResponse {
            url,
            status,
            headers,
            body,
        })
    }

    fn prepare_response(&self, _req: &Request, raw: RawResponse) -> Result<Document, GrabError> {
        let cookies = raw
            .headers
            .get_all("set-cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|s| parse_set_cookie(s, raw.url.host_str().unwrap_or_default()))
            .collect();

        Ok(Document::new(raw.url, raw.status, raw.headers, raw.body, cookies))
    }
}

/// Minimal `Set-Cookie` parser: `name=value` plus a handful of well-known
/// attributes. Full RFC 6265 attribute parsing (SameSite, Max-Age arithmetic
/// with Secure-without-https rejection, etc.) is beyond what any caller here
/// exercises; this covers the attributes the jar actually models.
fn parse_set_cookie(raw: &str, default_domain: &str) -> Option<Cookie> {
    let mut parts = raw.split(';');
    let (name, value) = parts.next()?.trim().split_once('=')?;
    let mut cookie = Cookie::new(name.trim(), value.trim(), default_domain);
    for attr in parts {
        let attr = attr.trim();
        let (key, val) = attr.split_once('=').unwrap_or((attr, ""));
        match key.to_ascii_lowercase().as_str() {
            "domain" => cookie.domain = val.trim_start_matches('.').to_string(),
            "path" => cookie.path = val.to_string(),
            "secure" => cookie.secure = true,
            "httponly" => cookie.http_only = true,
            _ => {}
        }
    }
    Some(cookie)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_set_cookie() {
        let cookie = parse_set_cookie("sid=abc123; Path=/; HttpOnly", "example.com").unwrap();
        assert_eq!(cookie.name, "sid");
        assert_eq!(cookie.value, "abc123");
        assert_eq!(cookie.path, "/");
        assert!(cookie.http_only);
    }

    #[test]
    fn domain_attribute_overrides_default() {
        let cookie = parse_set_cookie("a=b; Domain=.example.com", "other.com").unwrap();
        assert_eq!(cookie.domain, "example.com");
    }
}
