//! Eventide Events
//!
//! Listener declarations and the event manager that invokes them.
//!
//! # Overview
//!
//! Listeners declare the events they handle as an [`EventMap`]. The binding
//! parser ([`parse_bindings`], [`validate_class`]) normalizes those
//! declarations into `(event, method, priority)` triples and checks that the
//! bound methods exist, using only static [`ClassInfo`] metadata.
//!
//! The [`EventManager`] is a priority-ordered dispatcher. It accepts bare
//! callbacks for a single event and [`EventSubscriber`]s that register every
//! binding they declare in one call.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use eventide_events::{EventArgs, EventDispatcher, EventManager};
//!
//! let manager = EventManager::new();
//! manager
//!     .add_event_listener("UserCreated", Arc::new(|_: &EventArgs| Ok(())), 0)
//!     .unwrap();
//!
//! let handled = manager.dispatch_event(&EventArgs::new("UserCreated")).unwrap();
//! assert_eq!(handled, 1);
//! ```
//!
//! # Thread Safety
//!
//! All components are `Send + Sync`.

pub mod binding;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod listener;

pub use binding::{
    event_names, parse_bindings, validate_class, EventBinding, EventMap, Subscription,
    DEFAULT_PRIORITY,
};
pub use dispatcher::{EventDispatcher, EventManager, ListenerHandle, RegisteredListener};
pub use error::{EventsError, Result};
pub use event::{normalize_event_name, EventArgs, EventName};
pub use listener::{ClassInfo, EventCallback, EventSubscriber, Listener, ListenerClass};
