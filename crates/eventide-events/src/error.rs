//! Error types for the events system
//!
//! Declaration errors (`InvalidState`, `MemberAccess`) are raised while a
//! listener's declared event map is parsed. They indicate a programming or
//! configuration defect and are never retried.
//!
//! Dispatch-time errors (`HandlerFailed`, `ListenerResolution`) surface to the
//! caller of the dispatcher. A resolution failure keeps the original error as
//! its source so callers can inspect it unchanged.

use thiserror::Error;

/// Errors that can occur in the events system
#[derive(Debug, Error)]
pub enum EventsError {
    /// A declared event map is not in a recognized shape
    #[error("Invalid listener declaration: {0}")]
    InvalidState(String),

    /// A declared binding method does not exist on the listener class
    #[error("Event listener {class}::{method}() is not implemented.")]
    MemberAccess { class: String, method: String },

    /// A listener handler reported a failure
    ///
    /// The dispatcher logs these and keeps invoking the remaining handlers.
    #[error("Handler for event {event} failed: {reason}")]
    HandlerFailed { event: String, reason: String },

    /// Every handler registered for an event failed
    #[error("All handlers failed for event {event}: {details}")]
    AllHandlersFailed { event: String, details: String },

    /// The service backing a lazily registered listener could not be produced
    #[error("Failed to resolve listener service {service}: {source}")]
    ListenerResolution {
        service: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The container backing lazily registered listeners has been dropped
    #[error("Listener container is no longer available")]
    ContainerUnavailable,

    /// Internal state lock was poisoned by a panicking thread
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl EventsError {
    pub fn member_access(class: impl Into<String>, method: impl Into<String>) -> Self {
        EventsError::MemberAccess {
            class: class.into(),
            method: method.into(),
        }
    }

    pub fn handler_failed(event: impl Into<String>, reason: impl ToString) -> Self {
        EventsError::HandlerFailed {
            event: event.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for events operations
pub type Result<T> = std::result::Result<T, EventsError>;
