//! Event names and payloads

use serde::{Deserialize, Serialize};

/// Separator between an event's namespace and its simple name
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Payload handed to every listener of a dispatched event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventArgs {
    /// Fully qualified event name
    pub name: String,
    /// Event-specific data
    #[serde(default)]
    pub data: serde_json::Value,
}

impl EventArgs {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: normalize_event_name(&name.into()),
            data: serde_json::Value::Null,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// A parsed event name
///
/// `App\Orders::onPlaced` splits into namespace `App\Orders` and simple name
/// `onPlaced`. A name without a namespace is its own simple name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventName {
    pub namespace: Option<String>,
    pub event: String,
    pub full: String,
}

impl EventName {
    pub fn parse(name: &str) -> Self {
        let full = normalize_event_name(name);
        match full.rsplit_once(NAMESPACE_SEPARATOR) {
            Some((namespace, event)) if !namespace.is_empty() && !event.is_empty() => Self {
                namespace: Some(namespace.to_string()),
                event: event.to_string(),
                full: full.clone(),
            },
            _ => Self {
                namespace: None,
                event: full.clone(),
                full,
            },
        }
    }
}

/// Strip leading namespace separators (`\`) from an event name
pub fn normalize_event_name(name: &str) -> String {
    name.trim_start_matches('\\').to_string()
}
