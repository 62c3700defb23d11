//! Session cookie jar.
//!
//! Grounded on `grab.cookies`/`grab.util.cookies` (domain defaulted from the
//! request host when unset) and shaped like the jar sketches surveyed in
//! `other_examples` (`xurtis-cookie-jar::jar`, `reqwest::cookie`) — a flat,
//! `(domain, path, name)`-keyed set rather than a domain/path tree, since the
//! spec calls for a simple set with replace-on-insert semantics, not
//! hierarchical matching.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single cookie record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub expires: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
}

impl Cookie {
    /// A cookie added without an explicit domain defaults to the request
    /// URL's host (spec.md §3, Cookie invariant).
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    fn key(&self) -> (String, String, String) {
        (self.domain.clone(), self.path.clone(), self.name.clone())
    }
}

/// Session cookie store keyed by `(domain, path, name)`; insertion replaces
/// an existing entry with the same key. Iteration order is unspecified.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    entries: HashMap<(String, String, String), Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a cookie.
    pub fn set_cookie(&mut self, cookie: Cookie) {
        self.entries.insert(cookie.key(), cookie);
    }

    /// All cookies currently stored (unspecified order).
    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Cookies that should be attached to a request against `host` and
    /// `path` (a domain-suffix / path-prefix match, skipping expired entries).
    pub fn matching(&self, host: &str, path: &str, now: i64) -> Vec<&Cookie> {
        self.entries
            .values()
            .filter(|c| domain_matches(&c.domain, host) && path.starts_with(c.path.as_str()))
            .filter(|c| c.expires.map(|exp| exp > now).unwrap_or(true))
            .collect()
    }

    /// Rebuild a jar from a flat list of cookie records (the on-disk /
    /// serialized form described in spec.md §6).
    pub fn build_jar(cookies: Vec<Cookie>) -> Self {
        let mut jar = Self::new();
        for c in cookies {
            jar.set_cookie(c);
        }
        jar
    }

    /// Flatten the jar to a list, e.g. for serialization.
    pub fn to_vec(&self) -> Vec<Cookie> {
        self.entries.values().cloned().collect()
    }
}

fn domain_matches(cookie_domain: &str, host: &str) -> bool {
    host == cookie_domain || host.ends_with(&format!(".{cookie_domain}"))
}
