//! Event dispatcher for registering and invoking listeners

pub mod manager;

pub use manager::EventManager;

use std::fmt;
use std::sync::Arc;

use crate::error::{EventsError, Result};
use crate::event::EventArgs;
use crate::listener::{same_target, EventCallback, EventSubscriber};

/// Trait for dispatching events to registered listeners
///
/// The dispatcher owns listener ordering: higher priorities run first, equal
/// priorities run in registration order.
pub trait EventDispatcher: Send + Sync {
    /// Register a bare callback for one event
    fn add_event_listener(&self, event: &str, callback: EventCallback, priority: i32)
        -> Result<()>;

    /// Register every binding the subscriber declares
    fn add_event_subscriber(&self, subscriber: Arc<dyn EventSubscriber>) -> Result<()>;

    /// Listeners for one event, or for every event when `event` is `None`
    fn get_listeners(&self, event: Option<&str>) -> Result<Vec<RegisteredListener>>;

    /// Whether at least one listener is registered for `event`
    fn has_listeners(&self, event: &str) -> Result<bool>;

    /// Invoke the listeners of `args.name`, returning how many ran
    fn dispatch_event(&self, args: &EventArgs) -> Result<usize>;
}

/// The target a registered listener invokes
#[derive(Clone)]
pub enum ListenerHandle {
    Callback(EventCallback),
    Method {
        subscriber: Arc<dyn EventSubscriber>,
        method: String,
    },
}

impl ListenerHandle {
    fn same_as(&self, other: &ListenerHandle) -> bool {
        match (self, other) {
            (ListenerHandle::Callback(a), ListenerHandle::Callback(b)) => same_target(a, b),
            (
                ListenerHandle::Method {
                    subscriber: a,
                    method: method_a,
                },
                ListenerHandle::Method {
                    subscriber: b,
                    method: method_b,
                },
            ) => method_a == method_b && same_target(a, b),
            _ => false,
        }
    }
}

/// A listener as held by the dispatcher
#[derive(Clone)]
pub struct RegisteredListener {
    pub event: String,
    pub priority: i32,
    pub handle: ListenerHandle,
    sequence: u64,
}

impl RegisteredListener {
    pub(crate) fn new(event: String, priority: i32, handle: ListenerHandle, sequence: u64) -> Self {
        Self {
            event,
            priority,
            handle,
            sequence,
        }
    }

    pub fn invoke(&self, args: &EventArgs) -> Result<()> {
        match &self.handle {
            ListenerHandle::Callback(callback) => callback(args),
            ListenerHandle::Method { subscriber, method } => subscriber.call(method, args),
        }
    }

    /// Handler method name, for subscriber-backed listeners
    pub fn method(&self) -> Option<&str> {
        match &self.handle {
            ListenerHandle::Callback(_) => None,
            ListenerHandle::Method { method, .. } => Some(method),
        }
    }

    /// Whether this listener is backed by `subscriber`
    pub fn belongs_to(&self, subscriber: &Arc<dyn EventSubscriber>) -> bool {
        match &self.handle {
            ListenerHandle::Method { subscriber: own, .. } => same_target(own, subscriber),
            ListenerHandle::Callback(_) => false,
        }
    }

    pub(crate) fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(crate) fn duplicates(&self, other: &RegisteredListener) -> bool {
        self.event == other.event && self.handle.same_as(&other.handle)
    }
}

impl fmt::Debug for RegisteredListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredListener")
            .field("event", &self.event)
            .field("priority", &self.priority)
            .field("method", &self.method())
            .finish()
    }
}

pub(crate) fn lock_error(e: impl fmt::Display) -> EventsError {
    EventsError::LockPoisoned(format!("Failed to acquire listener lock: {}", e))
}
