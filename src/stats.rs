//! Spider-wide counters (spec.md §4.5/§7).
//!
//! Grounded on the source's `Spider.stat` (a `Counter`-backed accumulator
//! bumped from handlers and services alike — `self.stat.inc('ok')`, `self
//! .stat.inc('network-error')`). A plain mutex-guarded map is enough here;
//! there is no percentile/histogram tracking to carry over from the
//! teacher's load-test metrics stack, since this crate drops the
//! request-latency distribution concerns that module existed for.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct Stats {
    counters: Mutex<HashMap<String, i64>>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the named counter by one, creating it at zero if absent.
    pub fn inc(&self, label: &str) {
        self.inc_by(label, 1);
    }

    pub fn inc_by(&self, label: &str, amount: i64) {
        let mut counters = self.counters.lock().expect("stats mutex poisoned");
        *counters.entry(label.to_string()).or_insert(0) += amount;
    }

    pub fn get(&self, label: &str) -> i64 {
        let counters = self.counters.lock().expect("stats mutex poisoned");
        counters.get(label).copied().unwrap_or(0)
    }

    /// A point-in-time copy of every counter, for logging or inspection.
    pub fn snapshot(&self) -> HashMap<String, i64> {
        self.counters.lock().expect("stats mutex poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inc_creates_and_accumulates() {
        let stats = Stats::new();
        stats.inc("ok");
        stats.inc("ok");
        stats.inc("network-error");
        assert_eq!(stats.get("ok"), 2);
        assert_eq!(stats.get("network-error"), 1);
        assert_eq!(stats.get("never-touched"), 0);
    }

    #[test]
    fn snapshot_is_independent_copy() {
        let stats = Stats::new();
        stats.inc("a");
        let snap = stats.snapshot();
        stats.inc("a");
        assert_eq!(snap.get("a"), Some(&1));
        assert_eq!(stats.get("a"), 2);
    }
}
