//! Listener capabilities
//!
//! A resolved listener comes in one of two shapes:
//!
//! - a bare [`EventCallback`], bound to exactly one event at registration time
//! - an [`EventSubscriber`], which enumerates all of its own bindings and
//!   handles them by method name
//!
//! [`ListenerClass`] describes a subscriber type statically. Its metadata is
//! captured in a [`ClassInfo`] so the shape of a listener can be inspected
//! without constructing it.

use std::fmt;
use std::sync::Arc;

use crate::binding::EventMap;
use crate::error::Result;
use crate::event::EventArgs;

/// A bare invocable listener
pub type EventCallback = Arc<dyn Fn(&EventArgs) -> Result<()> + Send + Sync>;

/// A self-describing listener
pub trait EventSubscriber: Send + Sync {
    /// The events this subscriber listens to and the methods bound to them
    fn subscribed_events(&self) -> EventMap;

    /// Invoke the handler named `method`
    ///
    /// Implementations return [`EventsError::MemberAccess`] for unknown
    /// methods.
    ///
    /// [`EventsError::MemberAccess`]: crate::EventsError::MemberAccess
    fn call(&self, method: &str, args: &EventArgs) -> Result<()>;
}

/// Static, construction-free description of a subscriber type
pub trait ListenerClass: EventSubscriber + Sized + 'static {
    /// Name used in diagnostics
    fn class_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// The declared event map, available without an instance
    fn declared_events() -> EventMap;

    /// Names of the handler methods `call` understands
    fn methods() -> &'static [&'static str];
}

/// Captured listener class metadata
///
/// Holds the declared event map and the handler method names of a listener
/// type, taken at registration time without building an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    name: String,
    events: EventMap,
    methods: Vec<String>,
}

impl ClassInfo {
    pub fn of<T: ListenerClass>() -> Self {
        Self::new(T::class_name(), T::declared_events(), T::methods().iter().copied())
    }

    /// Describe a listener class from explicit metadata
    pub fn new<I, M>(name: impl Into<String>, events: EventMap, methods: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        Self {
            name: name.into(),
            events,
            methods: methods.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_events(&self) -> &EventMap {
        &self.events
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m == method)
    }
}

/// A resolved listener, as produced by a listener service
#[derive(Clone)]
pub enum Listener {
    Callback(EventCallback),
    Subscriber(Arc<dyn EventSubscriber>),
}

impl Listener {
    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(&EventArgs) -> Result<()> + Send + Sync + 'static,
    {
        Listener::Callback(Arc::new(callback))
    }

    pub fn subscriber<S: EventSubscriber + 'static>(subscriber: S) -> Self {
        Listener::Subscriber(Arc::new(subscriber))
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listener::Callback(_) => f.write_str("Listener::Callback"),
            Listener::Subscriber(_) => f.write_str("Listener::Subscriber"),
        }
    }
}

/// Compare two shared handles by the address of their data
pub(crate) fn same_target<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
