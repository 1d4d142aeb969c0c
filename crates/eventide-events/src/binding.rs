//! Declared event maps and the binding parser
//!
//! A listener declares its events as an [`EventMap`], a list of
//! [`Subscription`] entries in one of four shapes:
//!
//! | Shape | Example (JSON) | Bindings |
//! |---|---|---|
//! | bare event name | `["Shop::onCheckout"]` | `(Shop::onCheckout, onCheckout, -)` |
//! | event → method | `{"UserCreated": "onUserCreated"}` | `(UserCreated, onUserCreated, -)` |
//! | event → [method, priority] | `{"UserCreated": ["audit", 10]}` | `(UserCreated, audit, 10)` |
//! | event → [[method, priority], ...] | `{"UserCreated": [["a", 5], ["b", 0]]}` | one per pair |
//!
//! [`parse_bindings`] normalizes a map into [`EventBinding`] triples and
//! [`validate_class`] additionally checks every method against a
//! [`ClassInfo`].

use serde_json::Value;

use crate::error::{EventsError, Result};
use crate::event::{normalize_event_name, EventName};
use crate::listener::ClassInfo;

/// Priority used when a binding does not carry one
pub const DEFAULT_PRIORITY: i32 = 0;

/// One declared entry of an event map
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subscription {
    /// Bound to the method named after the event's simple name
    Event(String),
    Method { event: String, method: String },
    Prioritized { event: String, method: String, priority: i32 },
    Multiple { event: String, handlers: Vec<(String, i32)> },
}

impl Subscription {
    pub fn event(&self) -> &str {
        match self {
            Subscription::Event(event)
            | Subscription::Method { event, .. }
            | Subscription::Prioritized { event, .. }
            | Subscription::Multiple { event, .. } => event,
        }
    }
}

/// A normalized `(event, method, priority)` triple
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventBinding {
    pub event: String,
    pub method: String,
    pub priority: Option<i32>,
}

impl EventBinding {
    pub fn effective_priority(&self) -> i32 {
        self.priority.unwrap_or(DEFAULT_PRIORITY)
    }
}

/// An ordered list of declared subscriptions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMap {
    entries: Vec<Subscription>,
}

impl EventMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// `[EventName, ...]`
    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.entries.push(Subscription::Event(event.into()));
        self
    }

    /// `[EventName => method, ...]`
    pub fn method(mut self, event: impl Into<String>, method: impl Into<String>) -> Self {
        self.entries.push(Subscription::Method {
            event: event.into(),
            method: method.into(),
        });
        self
    }

    /// `[EventName => [method, priority], ...]`
    pub fn prioritized(
        mut self,
        event: impl Into<String>,
        method: impl Into<String>,
        priority: i32,
    ) -> Self {
        self.entries.push(Subscription::Prioritized {
            event: event.into(),
            method: method.into(),
            priority,
        });
        self
    }

    /// `[EventName => [[method, priority], ...], ...]`
    pub fn multiple<I, M>(mut self, event: impl Into<String>, handlers: I) -> Self
    where
        I: IntoIterator<Item = (M, i32)>,
        M: Into<String>,
    {
        self.entries.push(Subscription::Multiple {
            event: event.into(),
            handlers: handlers
                .into_iter()
                .map(|(method, priority)| (method.into(), priority))
                .collect(),
        });
        self
    }

    pub fn push(&mut self, subscription: Subscription) {
        self.entries.push(subscription);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a JSON declaration
    ///
    /// Accepts an array whose items are event-name strings or objects, or a
    /// single object. Object values must be a method string, a
    /// `[method, priority]` pair, or a list of such pairs.
    pub fn from_value(value: &Value) -> Result<Self> {
        let mut map = EventMap::new();
        match value {
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::String(event) => map.push(Subscription::Event(event.clone())),
                        Value::Object(_) => map.entries.extend(Self::from_value(item)?.entries),
                        other => {
                            return Err(EventsError::InvalidState(format!(
                                "Positional event declarations must be event names, got {}",
                                other
                            )))
                        }
                    }
                }
            }
            Value::Object(object) => {
                for (event, params) in object {
                    map.push(parse_keyed(event, params)?);
                }
            }
            other => {
                return Err(EventsError::InvalidState(format!(
                    "Event map has to be declared as an array or an object, got {}",
                    other
                )))
            }
        }
        Ok(map)
    }
}

impl FromIterator<Subscription> for EventMap {
    fn from_iter<I: IntoIterator<Item = Subscription>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn parse_keyed(event: &str, params: &Value) -> Result<Subscription> {
    let invalid = || {
        EventsError::InvalidState(format!(
            "Unrecognized declaration for event {}: {}",
            event, params
        ))
    };

    match params {
        Value::String(method) => Ok(Subscription::Method {
            event: event.to_string(),
            method: method.clone(),
        }),
        Value::Array(items) => match items.first() {
            Some(Value::String(_)) => {
                let (method, priority) = parse_pair(items).ok_or_else(invalid)?;
                Ok(Subscription::Prioritized {
                    event: event.to_string(),
                    method,
                    priority,
                })
            }
            Some(Value::Array(_)) => {
                let handlers = items
                    .iter()
                    .map(|item| match item {
                        Value::Array(pair) => parse_pair(pair),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(invalid)?;
                Ok(Subscription::Multiple {
                    event: event.to_string(),
                    handlers,
                })
            }
            _ => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}

/// `[method]` or `[method, priority]`
fn parse_pair(items: &[Value]) -> Option<(String, i32)> {
    let method = items.first()?.as_str()?.to_string();
    let priority = match items.get(1) {
        None => DEFAULT_PRIORITY,
        Some(value) => i32::try_from(value.as_i64()?).ok()?,
    };
    if items.len() > 2 {
        return None;
    }
    Some((method, priority))
}

/// Normalize a declared event map into bindings, in declaration order
pub fn parse_bindings(map: &EventMap) -> Vec<EventBinding> {
    let mut bindings = Vec::with_capacity(map.len());
    for subscription in map.iter() {
        match subscription {
            Subscription::Event(name) => {
                let parsed = EventName::parse(name);
                bindings.push(EventBinding {
                    event: parsed.full,
                    method: parsed.event,
                    priority: None,
                });
            }
            Subscription::Method { event, method } => bindings.push(EventBinding {
                event: normalize_event_name(event),
                method: method.clone(),
                priority: None,
            }),
            Subscription::Prioritized {
                event,
                method,
                priority,
            } => bindings.push(EventBinding {
                event: normalize_event_name(event),
                method: method.clone(),
                priority: Some(*priority),
            }),
            Subscription::Multiple { event, handlers } => {
                let event = normalize_event_name(event);
                bindings.extend(handlers.iter().map(|(method, priority)| EventBinding {
                    event: event.clone(),
                    method: method.clone(),
                    priority: Some(*priority),
                }));
            }
        }
    }
    bindings
}

/// Parse a class's declared events and check every bound method exists
///
/// Every pair of a multi-handler declaration is checked individually.
pub fn validate_class(class: &ClassInfo) -> Result<Vec<EventBinding>> {
    let bindings = parse_bindings(class.declared_events());
    for binding in &bindings {
        if !class.has_method(&binding.method) {
            return Err(EventsError::member_access(class.name(), &binding.method));
        }
    }
    Ok(bindings)
}

/// Distinct event names of a binding set, in first-seen order
pub fn event_names(bindings: &[EventBinding]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for binding in bindings {
        if !names.contains(&binding.event) {
            names.push(binding.event.clone());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn binding(event: &str, method: &str, priority: Option<i32>) -> EventBinding {
        EventBinding {
            event: event.to_string(),
            method: method.to_string(),
            priority,
        }
    }

    #[test]
    fn test_bare_event_binds_simple_name() {
        let map = EventMap::new().event("\\Shop::onCheckout").event("onLogin");
        assert_eq!(
            parse_bindings(&map),
            vec![
                binding("Shop::onCheckout", "onCheckout", None),
                binding("onLogin", "onLogin", None),
            ]
        );
    }

    #[test]
    fn test_event_to_method() {
        let map = EventMap::new().method("UserCreated", "onUserCreated");
        assert_eq!(
            parse_bindings(&map),
            vec![binding("UserCreated", "onUserCreated", None)]
        );
    }

    #[test]
    fn test_event_to_method_with_priority() {
        let map = EventMap::new().prioritized("UserCreated", "audit", 10);
        assert_eq!(
            parse_bindings(&map),
            vec![binding("UserCreated", "audit", Some(10))]
        );
        assert_eq!(parse_bindings(&map)[0].effective_priority(), 10);
    }

    #[test]
    fn test_event_to_many_methods() {
        let map = EventMap::new().multiple("UserCreated", [("a", 5), ("b", -1)]);
        assert_eq!(
            parse_bindings(&map),
            vec![
                binding("UserCreated", "a", Some(5)),
                binding("UserCreated", "b", Some(-1)),
            ]
        );
    }

    #[test]
    fn test_from_value_all_shapes() {
        let value = json!([
            "Shop::onCheckout",
            {
                "UserCreated": "onUserCreated",
                "UserDeleted": ["onUserDeleted", 20],
                "OrderPlaced": [["reserve", 10], ["notify"]]
            }
        ]);

        let map = EventMap::from_value(&value).unwrap();
        let bindings = parse_bindings(&map);
        assert_eq!(bindings.len(), 5);
        assert!(bindings.contains(&binding("Shop::onCheckout", "onCheckout", None)));
        assert!(bindings.contains(&binding("UserCreated", "onUserCreated", None)));
        assert!(bindings.contains(&binding("UserDeleted", "onUserDeleted", Some(20))));
        assert!(bindings.contains(&binding("OrderPlaced", "reserve", Some(10))));
        assert!(bindings.contains(&binding("OrderPlaced", "notify", Some(0))));
    }

    #[test]
    fn test_from_value_rejects_unrecognized_shapes() {
        for value in [
            json!("UserCreated"),
            json!(42),
            json!([1, 2]),
            json!({"UserCreated": 3}),
            json!({"UserCreated": []}),
            json!({"UserCreated": ["m", "high"]}),
            json!({"UserCreated": [["m", 1], "n"]}),
        ] {
            assert!(
                matches!(EventMap::from_value(&value), Err(EventsError::InvalidState(_))),
                "accepted {}",
                value
            );
        }
    }

    #[test]
    fn test_subscription_event_name_for_every_shape() {
        let map = EventMap::new()
            .event("A::onA")
            .method("B", "b")
            .prioritized("C", "c", 1)
            .multiple("D", [("d", 2)]);
        let events: Vec<&str> = map.iter().map(Subscription::event).collect();
        assert_eq!(events, ["A::onA", "B", "C", "D"]);
    }

    #[test]
    fn test_event_names_deduplicates() {
        let map = EventMap::new()
            .method("A", "x")
            .prioritized("\\A", "y", 3)
            .event("B");
        assert_eq!(event_names(&parse_bindings(&map)), vec!["A", "B"]);
    }

    #[test]
    fn test_validate_checks_every_pair_of_multiple() {
        let events = EventMap::new()
            .event("Shop::onCheckout")
            .multiple("Shop::onRefund", [("refund", 0), ("missing", 5)]);
        let class = ClassInfo::new("CheckoutListener", events, ["onCheckout", "refund"]);
        match validate_class(&class) {
            Err(EventsError::MemberAccess { class, method }) => {
                assert_eq!(class, "CheckoutListener");
                assert_eq!(method, "missing");
            }
            other => panic!("expected MemberAccess, got {:?}", other),
        }
    }

    #[test]
    fn test_member_access_message_names_class_and_method() {
        let error = EventsError::member_access("CheckoutListener", "missing");
        assert_eq!(
            error.to_string(),
            "Event listener CheckoutListener::missing() is not implemented."
        );
    }
}
