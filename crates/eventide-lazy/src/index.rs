//! Subscription index
//!
//! The index maps every declared event name to the listener services that
//! still have to be resolved for it, plus a reverse map from service name to
//! the events it declares. It is built from static class metadata only; no
//! listener is constructed while building it.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use eventide_di::ServiceDescriptor;
use eventide_events::{event_names, validate_class, ClassInfo};

use crate::error::{LazyEventsError, Result};

/// A tagged listener service and the class metadata describing it
#[derive(Debug, Clone)]
pub struct ListenerDescriptor {
    pub service: String,
    pub class: ClassInfo,
}

impl ListenerDescriptor {
    pub fn new(service: impl Into<String>, class: ClassInfo) -> Self {
        Self {
            service: service.into(),
            class,
        }
    }
}

impl TryFrom<&ServiceDescriptor> for ListenerDescriptor {
    type Error = LazyEventsError;

    fn try_from(descriptor: &ServiceDescriptor) -> Result<Self> {
        let class = descriptor.class::<ClassInfo>().ok_or_else(|| {
            LazyEventsError::InvalidState(format!(
                "Listeners have to be defined with listener class metadata. {} listener is defined in a different way.",
                descriptor.name()
            ))
        })?;
        Ok(Self::new(descriptor.name(), class.clone()))
    }
}

/// Lifecycle of one event name in the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Some services declared for the event have not been resolved yet
    Pending,
    /// A lookup is currently resolving the pending services
    Resolving,
    /// The dispatcher holds every listener declared for the event
    Resolved,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    pending: BTreeSet<String>,
    state: EntryState,
}

/// `event -> pending services` index with a `service -> events` reverse map
#[derive(Debug, Clone, Default)]
pub struct SubscriptionIndex {
    events: BTreeMap<String, IndexEntry>,
    listeners: BTreeMap<String, Vec<String>>,
}

impl SubscriptionIndex {
    pub fn state(&self, event: &str) -> Option<EntryState> {
        self.events.get(event).map(|entry| entry.state)
    }

    pub fn is_pending(&self, event: &str) -> bool {
        self.state(event) == Some(EntryState::Pending)
    }

    /// Services still to be resolved for `event`, in name order
    pub fn pending_services(&self, event: &str) -> Vec<String> {
        self.events
            .get(event)
            .map(|entry| entry.pending.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_service_pending(&self, event: &str, service: &str) -> bool {
        self.events
            .get(event)
            .map(|entry| entry.pending.contains(service))
            .unwrap_or(false)
    }

    /// Pending event names, in index order
    pub fn pending_events(&self) -> Vec<String> {
        self.events
            .iter()
            .filter(|(_, entry)| entry.state == EntryState::Pending)
            .map(|(event, _)| event.clone())
            .collect()
    }

    /// Every event name the index has seen, pending or resolved
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(String::as_str)
    }

    /// Events declared by a listener service
    pub fn events_for(&self, service: &str) -> &[String] {
        self.listeners
            .get(service)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Listener services the index was built from
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.listeners.keys().map(String::as_str)
    }

    /// Whether nothing is left to resolve
    pub fn is_empty(&self) -> bool {
        self.events
            .values()
            .all(|entry| entry.state == EntryState::Resolved)
    }

    /// Number of pending event names
    pub fn pending_len(&self) -> usize {
        self.events
            .values()
            .filter(|entry| entry.state == EntryState::Pending)
            .count()
    }

    /// Drop `service` from the pending set of `event`
    ///
    /// A pending entry whose set becomes empty is resolved. An entry being
    /// resolved is left to the lookup that claimed it.
    pub(crate) fn mark_service_resolved(&mut self, event: &str, service: &str) {
        if let Some(entry) = self.events.get_mut(event) {
            entry.pending.remove(service);
            if entry.pending.is_empty() && entry.state == EntryState::Pending {
                entry.state = EntryState::Resolved;
            }
        }
    }

    pub(crate) fn mark_resolving(&mut self, event: &str) {
        if let Some(entry) = self.events.get_mut(event) {
            entry.state = EntryState::Resolving;
        }
    }

    /// Hand an interrupted entry back to later lookups
    pub(crate) fn mark_pending(&mut self, event: &str) {
        if let Some(entry) = self.events.get_mut(event) {
            entry.state = if entry.pending.is_empty() {
                EntryState::Resolved
            } else {
                EntryState::Pending
            };
        }
    }

    pub(crate) fn mark_resolved(&mut self, event: &str) {
        if let Some(entry) = self.events.get_mut(event) {
            entry.pending.clear();
            entry.state = EntryState::Resolved;
        }
    }
}

/// Folds listener descriptors into a [`SubscriptionIndex`]
#[derive(Debug, Default)]
pub struct SubscriptionIndexBuilder {
    listeners: BTreeMap<String, Vec<String>>,
}

impl SubscriptionIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a listener's declared bindings and record its event names
    pub fn add(&mut self, descriptor: &ListenerDescriptor) -> Result<&mut Self> {
        let bindings = validate_class(&descriptor.class)?;
        let events = event_names(&bindings);

        debug!(
            service = %descriptor.service,
            class = descriptor.class.name(),
            bindings = bindings.len(),
            events = ?events,
            "Indexed listener"
        );

        self.listeners.insert(descriptor.service.clone(), events);
        Ok(self)
    }

    /// Invert the per-listener event sets into the event-keyed index
    pub fn build(self) -> SubscriptionIndex {
        let mut events: BTreeMap<String, IndexEntry> = BTreeMap::new();
        for (service, names) in &self.listeners {
            for event in names {
                events
                    .entry(event.clone())
                    .or_insert_with(|| IndexEntry {
                        pending: BTreeSet::new(),
                        state: EntryState::Pending,
                    })
                    .pending
                    .insert(service.clone());
            }
        }

        SubscriptionIndex {
            events,
            listeners: self.listeners,
        }
    }
}

/// Build the index for a batch of tagged services
///
/// The first invalid declaration aborts the whole batch.
pub fn build_index(descriptors: &[ServiceDescriptor]) -> Result<SubscriptionIndex> {
    let mut builder = SubscriptionIndexBuilder::new();
    for descriptor in descriptors {
        builder.add(&ListenerDescriptor::try_from(descriptor)?)?;
    }
    let index = builder.build();

    info!(
        listeners = descriptors.len(),
        events = index.pending_len(),
        "Built subscription index"
    );
    Ok(index)
}
