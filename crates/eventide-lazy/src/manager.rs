//! Lazy event manager
//!
//! Wraps an [`EventDispatcher`] and defers listener construction until an
//! event is first looked up. On the first lookup of a pending event every
//! service indexed for it is resolved through the container, handed to the
//! dispatcher, and the event is marked resolved. Later lookups go straight to
//! the dispatcher.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, ThreadId};

use tracing::{debug, info, warn};

use eventide_di::ServiceLocator;
use eventide_events::{
    normalize_event_name, EventArgs, EventCallback, EventDispatcher, EventManager, EventSubscriber,
    EventsError, Listener, RegisteredListener, Result, DEFAULT_PRIORITY,
};

use crate::index::{EntryState, SubscriptionIndex};

struct IndexState {
    index: SubscriptionIndex,
    /// Thread resolving each claimed event
    owners: HashMap<String, ThreadId>,
}

/// Event dispatcher that resolves indexed listeners on first use
///
/// A lookup claims a pending event under the index lock, then resolves its
/// services with the lock released. Concurrent lookups of a claimed event
/// wait until the claim is settled, so each service is resolved once.
/// Listener factories may query the manager: a lookup of the event being
/// resolved on the same thread sees the listeners registered so far.
///
/// A subscriber is registered for all of its declared events at once, and
/// its service is dropped from every one of them in the index. A failed or
/// panicking resolution leaves the unresolved services pending.
pub struct LazyEventManager {
    state: Mutex<IndexState>,
    settled: Condvar,
    container: Weak<dyn ServiceLocator>,
    dispatcher: Arc<dyn EventDispatcher>,
}

/// An event claimed for resolution
///
/// Dropping the claim settles the entry and wakes waiting lookups.
struct Claim<'a> {
    manager: &'a LazyEventManager,
    event: &'a str,
    complete: bool,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        let mut state = self.manager.lock_state();
        state.owners.remove(self.event);
        if self.complete {
            state.index.mark_resolved(self.event);
        } else {
            state.index.mark_pending(self.event);
        }
        self.manager.settled.notify_all();
    }
}

impl LazyEventManager {
    /// Create a manager over a fresh [`EventManager`]
    pub fn new(index: SubscriptionIndex, container: Weak<dyn ServiceLocator>) -> Self {
        Self::with_dispatcher(index, container, Arc::new(EventManager::new()))
    }

    pub fn with_dispatcher(
        index: SubscriptionIndex,
        container: Weak<dyn ServiceLocator>,
        dispatcher: Arc<dyn EventDispatcher>,
    ) -> Self {
        Self {
            state: Mutex::new(IndexState {
                index,
                owners: HashMap::new(),
            }),
            settled: Condvar::new(),
            container,
            dispatcher,
        }
    }

    /// The wrapped dispatcher
    pub fn dispatcher(&self) -> &Arc<dyn EventDispatcher> {
        &self.dispatcher
    }

    /// Event names whose listeners have not been resolved yet
    pub fn pending_events(&self) -> Vec<String> {
        self.lock_state().index.pending_events()
    }

    pub fn is_pending(&self, event: &str) -> bool {
        self.lock_state()
            .index
            .is_pending(&normalize_event_name(event))
    }

    /// A copy of the current index
    pub fn index(&self) -> SubscriptionIndex {
        self.lock_state().index.clone()
    }

    /// Resolve the pending listeners for `event`, or for every unresolved
    /// event when `event` is `None`
    pub fn initialize(&self, event: Option<&str>) -> Result<()> {
        match event {
            Some(event) => self.initialize_event(&normalize_event_name(event)),
            None => {
                let events: Vec<String> = {
                    let state = self.lock_state();
                    state
                        .index
                        .events()
                        .filter(|event| state.index.state(event) != Some(EntryState::Resolved))
                        .map(str::to_string)
                        .collect()
                };
                for event in &events {
                    self.initialize_event(event)?;
                }
                Ok(())
            }
        }
    }

    fn initialize_event(&self, event: &str) -> Result<()> {
        let Some((mut claim, services)) = self.claim(event) else {
            return Ok(());
        };
        let container = self
            .container
            .upgrade()
            .ok_or(EventsError::ContainerUnavailable)?;

        for service in &services {
            // A subscriber resolved for another event may already cover it.
            if !self.lock_state().index.is_service_pending(event, service) {
                continue;
            }

            let instance = container
                .get(service)
                .map_err(|e| EventsError::ListenerResolution {
                    service: service.clone(),
                    source: Box::new(e),
                })?;

            let covered = match instance.downcast_ref::<Listener>() {
                Some(Listener::Callback(callback)) => {
                    self.dispatcher
                        .add_event_listener(event, callback.clone(), DEFAULT_PRIORITY)?;
                    debug!(event = %event, service = %service, "Registered lazy listener");
                    vec![event.to_string()]
                }
                Some(Listener::Subscriber(subscriber)) => {
                    self.dispatcher.add_event_subscriber(subscriber.clone())?;
                    debug!(event = %event, service = %service, "Registered lazy subscriber");
                    self.lock_state().index.events_for(service).to_vec()
                }
                None => {
                    warn!(
                        event = %event,
                        service = %service,
                        "Listener service resolved to neither a callback nor a subscriber"
                    );
                    vec![event.to_string()]
                }
            };

            let mut state = self.lock_state();
            for bound in &covered {
                state.index.mark_service_resolved(bound, service);
            }
        }

        claim.complete = true;
        info!(
            event = %event,
            services = services.len(),
            "Initialized listeners for event"
        );
        Ok(())
    }

    /// Claim `event` for resolution by the current thread
    ///
    /// Waits while another thread holds the claim. Returns `None` when there
    /// is nothing to resolve, including when this thread already holds it.
    fn claim<'a>(&'a self, event: &'a str) -> Option<(Claim<'a>, Vec<String>)> {
        let current = thread::current().id();
        let mut state = self.lock_state();
        loop {
            match state.index.state(event) {
                Some(EntryState::Pending) => break,
                Some(EntryState::Resolving) if state.owners.get(event) != Some(&current) => {
                    state = self
                        .settled
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                _ => return None,
            }
        }

        state.index.mark_resolving(event);
        state.owners.insert(event.to_string(), current);
        let services = state.index.pending_services(event);
        drop(state);

        let claim = Claim {
            manager: self,
            event,
            complete: false,
        };
        Some((claim, services))
    }

    fn lock_state(&self) -> MutexGuard<'_, IndexState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Subscription index lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl EventDispatcher for LazyEventManager {
    fn add_event_listener(
        &self,
        event: &str,
        callback: EventCallback,
        priority: i32,
    ) -> Result<()> {
        self.dispatcher.add_event_listener(event, callback, priority)
    }

    fn add_event_subscriber(&self, subscriber: Arc<dyn EventSubscriber>) -> Result<()> {
        self.dispatcher.add_event_subscriber(subscriber)
    }

    fn get_listeners(&self, event: Option<&str>) -> Result<Vec<RegisteredListener>> {
        self.initialize(event)?;
        self.dispatcher.get_listeners(event)
    }

    fn has_listeners(&self, event: &str) -> Result<bool> {
        self.initialize(Some(event))?;
        self.dispatcher.has_listeners(event)
    }

    fn dispatch_event(&self, args: &EventArgs) -> Result<usize> {
        self.initialize(Some(&args.name))?;
        self.dispatcher.dispatch_event(args)
    }
}
