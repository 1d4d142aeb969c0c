//! Error types for lazy listener registration
//!
//! Everything here is raised while the extension is registered or the index
//! is built. These errors indicate a configuration or declaration defect and
//! abort setup. Dispatch-time resolution failures are reported through
//! [`EventsError::ListenerResolution`] instead.

use eventide_di::DIError;
use eventide_events::EventsError;
use thiserror::Error;

/// Errors raised while installing the lazy event manager
#[derive(Debug, Error)]
pub enum LazyEventsError {
    /// Configuration is neither an options mapping nor a config service name
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A tagged listener is not declared in a recognized way
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A declared binding method does not exist on the listener class
    #[error("Event listener {class}::{method}() is not implemented.")]
    MemberAccess { class: String, method: String },

    #[error("Container error: {0}")]
    Container(#[source] DIError),

    #[error("Dispatcher error: {0}")]
    Dispatcher(#[source] EventsError),
}

impl From<EventsError> for LazyEventsError {
    fn from(error: EventsError) -> Self {
        match error {
            EventsError::InvalidState(message) => LazyEventsError::InvalidState(message),
            EventsError::MemberAccess { class, method } => {
                LazyEventsError::MemberAccess { class, method }
            }
            other => LazyEventsError::Dispatcher(other),
        }
    }
}

impl From<DIError> for LazyEventsError {
    /// Factory failures that carry a `LazyEventsError` are unwrapped so the
    /// original declaration error reaches the caller unchanged.
    fn from(error: DIError) -> Self {
        match error {
            DIError::FactoryFailed { name, source } => match source.downcast::<LazyEventsError>() {
                Ok(inner) => *inner,
                Err(source) => LazyEventsError::Container(DIError::FactoryFailed { name, source }),
            },
            other => LazyEventsError::Container(other),
        }
    }
}

/// Result type for lazy registration operations
pub type Result<T> = std::result::Result<T, LazyEventsError>;
