//! Response wrapper.
//!
//! DOM selection and form extraction are explicitly out of scope (spec.md
//! §1) — `Document` exposes only the data those external collaborators would
//! need (headers, body, url) plus the one DOM-dependent contract
//! (`form_request_overrides`) named without an implementation, following the
//! framework's pattern of naming external contracts rather than faking them.

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use url::Url;

use crate::cookie::Cookie;
use crate::error::GrabError;
use crate::request::RequestOverrides;

const REDIRECT_CODES: [u16; 5] = [301, 302, 303, 307, 308];

/// A response value (spec.md §3).
#[derive(Debug, Clone)]
pub struct Document {
    pub url: Url,
    pub code: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub cookies: Vec<Cookie>,
}

impl Document {
    pub fn new(url: Url, code: StatusCode, headers: HeaderMap, body: Vec<u8>, cookies: Vec<Cookie>) -> Self {
        Self {
            url,
            code: code.as_u16(),
            headers,
            body,
            cookies,
        }
    }

    /// Invariant (spec.md §3): if `code` is a redirect status and `Location`
    /// is present, returns the (possibly relative) target.
    pub fn find_redirect_url(&self) -> Option<String> {
        if !REDIRECT_CODES.contains(&self.code) {
            return None;
        }
        self.headers
            .get("Location")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    }

    /// DOM-dependent contract named by the spec but not implemented here:
    /// extracting a submittable form from this document's body. Selector
    /// engines are an external collaborator (spec.md §1); callers that need
    /// `Client::submit` must supply the overrides derived from their own
    /// form-extraction layer via [`crate::client::Client::submit`]'s
    /// `overrides` parameter instead of relying on this method.
    pub fn form_request_overrides(&self) -> Result<RequestOverrides, GrabError> {
        Err(GrabError::misuse(
            "form extraction is an external collaborator; no default implementation",
        ))
    }
}
