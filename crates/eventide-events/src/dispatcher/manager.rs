//! Priority-ordered event manager

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, error, info};

use super::{lock_error, EventDispatcher, ListenerHandle, RegisteredListener};
use crate::binding::parse_bindings;
use crate::error::{EventsError, Result};
use crate::event::{normalize_event_name, EventArgs};
use crate::listener::{EventCallback, EventSubscriber};

/// Default implementation of [`EventDispatcher`]
///
/// Registering the same callback or the same subscriber method twice for an
/// event is a no-op. Handler failures are isolated: a failing handler is
/// logged and the remaining handlers still run.
#[derive(Default)]
pub struct EventManager {
    listeners: RwLock<HashMap<String, Vec<RegisteredListener>>>,
    sequence: AtomicU64,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, event: &str, priority: i32, handle: ListenerHandle) -> Result<bool> {
        let event = normalize_event_name(event);
        let candidate = RegisteredListener::new(
            event.clone(),
            priority,
            handle,
            self.sequence.fetch_add(1, Ordering::Relaxed),
        );

        let mut listeners = self.listeners.write().map_err(lock_error)?;
        let registered = listeners.entry(event).or_default();
        if registered.iter().any(|existing| existing.duplicates(&candidate)) {
            return Ok(false);
        }
        registered.push(candidate);
        Ok(true)
    }

    fn sorted(mut listeners: Vec<RegisteredListener>) -> Vec<RegisteredListener> {
        listeners.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.sequence().cmp(&b.sequence()))
        });
        listeners
    }
}

impl EventDispatcher for EventManager {
    fn add_event_listener(
        &self,
        event: &str,
        callback: EventCallback,
        priority: i32,
    ) -> Result<()> {
        if self.insert(event, priority, ListenerHandle::Callback(callback))? {
            debug!(event = %event, priority, "Registered event listener");
        }
        Ok(())
    }

    fn add_event_subscriber(&self, subscriber: Arc<dyn EventSubscriber>) -> Result<()> {
        let bindings = parse_bindings(&subscriber.subscribed_events());
        let mut added = 0;
        for binding in &bindings {
            let handle = ListenerHandle::Method {
                subscriber: subscriber.clone(),
                method: binding.method.clone(),
            };
            if self.insert(&binding.event, binding.effective_priority(), handle)? {
                added += 1;
            }
        }
        debug!(
            bindings = bindings.len(),
            added, "Registered event subscriber"
        );
        Ok(())
    }

    fn get_listeners(&self, event: Option<&str>) -> Result<Vec<RegisteredListener>> {
        let listeners = self.listeners.read().map_err(lock_error)?;
        match event {
            Some(event) => Ok(listeners
                .get(&normalize_event_name(event))
                .cloned()
                .map(Self::sorted)
                .unwrap_or_default()),
            None => {
                let mut events: Vec<&String> = listeners.keys().collect();
                events.sort();
                Ok(events
                    .into_iter()
                    .flat_map(|event| Self::sorted(listeners[event].clone()))
                    .collect())
            }
        }
    }

    fn has_listeners(&self, event: &str) -> Result<bool> {
        let listeners = self.listeners.read().map_err(lock_error)?;
        Ok(listeners
            .get(&normalize_event_name(event))
            .map(|registered| !registered.is_empty())
            .unwrap_or(false))
    }

    fn dispatch_event(&self, args: &EventArgs) -> Result<usize> {
        // Snapshot so handlers can register further listeners without deadlocking.
        let listeners = self.get_listeners(Some(&args.name))?;
        let handler_count = listeners.len();

        if listeners.is_empty() {
            debug!(event = %args.name, "No listeners registered for event");
            return Ok(0);
        }

        info!(
            event = %args.name,
            handler_count,
            "Dispatching event"
        );

        let mut failures = Vec::new();
        for listener in listeners {
            if let Err(e) = listener.invoke(args) {
                error!(
                    event = %args.name,
                    method = ?listener.method(),
                    error = %e,
                    "Event handler failed"
                );
                failures.push(e);
            }
        }

        if !failures.is_empty() && failures.len() == handler_count {
            let details = failures
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(EventsError::AllHandlersFailed {
                event: args.name.clone(),
                details,
            });
        }

        Ok(handler_count)
    }
}
