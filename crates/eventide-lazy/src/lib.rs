//! Lazy event listener registration
//!
//! This crate sits between the [`eventide_di`] container and the
//! [`eventide_events`] dispatcher. Listener services are tagged in the
//! container and described by static [`ClassInfo`] metadata; nothing is
//! constructed until an event they handle is looked up.
//!
//! # Architecture
//!
//! 1. **Index** (`index`): validates tagged listener declarations and builds
//!    the `event -> services` subscription index
//! 2. **Manager** (`manager`): resolves the services indexed for an event on
//!    its first lookup and hands them to the dispatcher
//! 3. **Extension** (`extension`): installs the manager as a shared container
//!    service
//! 4. **Configuration** (`config`): tag and service names
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use eventide_di::{Container, Definition};
//! use eventide_events::{ClassInfo, EventArgs, EventDispatcher, Listener};
//! use eventide_lazy::{EventsExtension, TAG_LISTENER};
//!
//! let container = Arc::new(Container::new());
//! container.add(
//!     Definition::new("audit", |_| Ok(Arc::new(Listener::subscriber(AuditListener::new()))))
//!         .tag(TAG_LISTENER)
//!         .class(ClassInfo::of::<AuditListener>()),
//! )?;
//!
//! let extension = EventsExtension::register(&container, &serde_json::json!({}))?;
//! let manager = extension.manager(&container)?;
//!
//! // AuditListener is built here, on the first dispatch of an event it declares.
//! manager.dispatch_event(&EventArgs::new("UserCreated"))?;
//! ```
//!
//! [`ClassInfo`]: eventide_events::ClassInfo

pub mod config;
pub mod error;
pub mod extension;
pub mod index;
pub mod manager;

pub use config::{EventsConfig, EVENT_MANAGER, TAG_LISTENER, TAG_SUBSCRIBER};
pub use error::{LazyEventsError, Result};
pub use extension::{load_manager, EventsExtension};
pub use index::{
    build_index, EntryState, ListenerDescriptor, SubscriptionIndex, SubscriptionIndexBuilder,
};
pub use manager::LazyEventManager;
