//! Telemetry sink abstraction and the in-memory implementation.
//!
//! Events are pushed to an injected sink keyed by exchange account, so hosts
//! choose where telemetry lands and tests can inspect it. The sink is
//! append-only; an out-of-process listener drains it.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

/// Namespace prefixed onto event names that lack one.
pub const EVENT_NAMESPACE: &str = "aps";

/// Terminal segment appended while a name has fewer than three segments.
pub const EVENT_TERMINAL: &str = "event";

/// An ephemeral telemetry record. Never read back by the adapter.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryEvent {
    pub name: String,
    pub detail: Value,
    /// Emission time, milliseconds since the Unix epoch.
    pub at: i64,
}

impl TelemetryEvent {
    pub fn new(name: impl Into<String>, detail: Value) -> Self {
        Self {
            name: name.into(),
            detail,
            at: Utc::now().timestamp_millis(),
        }
    }
}

/// Destination for adapter telemetry, keyed by exchange account.
pub trait TelemetrySink: Send + Sync {
    /// Append an event to the account's queue, creating the queue on first
    /// use.
    fn push(&self, account: &str, event: TelemetryEvent);

    /// Write to the account's auxiliary key/value store.
    fn put(&self, account: &str, key: &str, value: Value);
}

/// Per-account slot inside the in-memory sink.
#[derive(Debug, Default)]
pub struct AccountQueue {
    pub events: Vec<TelemetryEvent>,
    pub store: HashMap<String, Value>,
}

/// In-memory sink suitable for single-process hosts and tests.
#[derive(Debug, Default)]
pub struct InMemoryTelemetrySink {
    accounts: Mutex<HashMap<String, AccountQueue>>,
}

impl InMemoryTelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded for an account.
    pub fn events_for(&self, account: &str) -> Vec<TelemetryEvent> {
        let accounts = self
            .accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        accounts
            .get(account)
            .map(|queue| queue.events.clone())
            .unwrap_or_default()
    }

    /// Number of events recorded for an account.
    pub fn event_count(&self, account: &str) -> usize {
        let accounts = self
            .accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        accounts.get(account).map_or(0, |queue| queue.events.len())
    }

    /// Read a value from the account's auxiliary store.
    pub fn store_value(&self, account: &str, key: &str) -> Option<Value> {
        let accounts = self
            .accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        accounts
            .get(account)
            .and_then(|queue| queue.store.get(key).cloned())
    }

    /// True when no account has recorded anything.
    pub fn is_empty(&self) -> bool {
        let accounts = self
            .accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        accounts.is_empty()
    }
}

impl TelemetrySink for InMemoryTelemetrySink {
    fn push(&self, account: &str, event: TelemetryEvent) {
        let mut accounts = self
            .accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        accounts
            .entry(account.to_string())
            .or_default()
            .events
            .push(event);
    }

    fn put(&self, account: &str, key: &str, value: Value) {
        let mut accounts = self
            .accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        accounts
            .entry(account.to_string())
            .or_default()
            .store
            .insert(key.to_string(), value);
    }
}

/// Normalize an event name: prefix the namespace when absent, then append the
/// terminal segment while the name has fewer than three slash segments.
pub fn normalize_event_name(name: &str) -> String {
    let mut full = if name == EVENT_NAMESPACE || name.starts_with("aps/") {
        name.to_string()
    } else {
        format!("{EVENT_NAMESPACE}/{name}")
    };
    while full.split('/').count() < 3 {
        full.push('/');
        full.push_str(EVENT_TERMINAL);
    }
    full
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_adds_namespace_and_terminal() {
        assert_eq!(normalize_event_name("buildRequests"), "aps/buildRequests/event");
        assert_eq!(
            normalize_event_name("buildRequests/didError"),
            "aps/buildRequests/didError"
        );
        assert_eq!(normalize_event_name("aps/onBidWon"), "aps/onBidWon/event");
        assert_eq!(normalize_event_name("aps/x/y"), "aps/x/y");
        assert_eq!(normalize_event_name("aps/a/b/c"), "aps/a/b/c");
    }

    #[test]
    fn test_normalize_bare_namespace() {
        assert_eq!(normalize_event_name("aps"), "aps/event/event");
    }

    #[test]
    fn test_sink_lazily_creates_account_queue() {
        let sink = InMemoryTelemetrySink::new();
        assert!(sink.is_empty());
        assert_eq!(sink.event_count("5128"), 0);

        sink.push("5128", TelemetryEvent::new("aps/test/event", json!({})));
        assert_eq!(sink.event_count("5128"), 1);
        assert_eq!(sink.event_count("other"), 0);
    }

    #[test]
    fn test_sink_queue_is_append_only() {
        let sink = InMemoryTelemetrySink::new();
        sink.push("a", TelemetryEvent::new("aps/one/event", json!({"n": 1})));
        sink.push("a", TelemetryEvent::new("aps/two/event", json!({"n": 2})));

        let events = sink.events_for("a");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "aps/one/event");
        assert_eq!(events[1].name, "aps/two/event");
    }

    #[test]
    fn test_sink_auxiliary_store() {
        let sink = InMemoryTelemetrySink::new();
        sink.put("a", "lastRender", json!("bid-1"));
        assert_eq!(sink.store_value("a", "lastRender"), Some(json!("bid-1")));
        assert_eq!(sink.store_value("a", "missing"), None);
        assert_eq!(sink.store_value("b", "lastRender"), None);
    }
}
