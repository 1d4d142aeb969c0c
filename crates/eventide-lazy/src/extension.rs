//! Container integration
//!
//! [`EventsExtension`] installs the lazy event manager as a shared service.
//! The manager is assembled the first time the service is resolved: tagged
//! listeners are indexed, eager subscribers are registered, and the result is
//! cached by the container.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use eventide_di::{Container, DIError, DIResult, ServiceLocator, ServiceProvider};
use eventide_events::{EventDispatcher, EventsError, Listener};

use crate::config::EventsConfig;
use crate::error::{LazyEventsError, Result};
use crate::index::build_index;
use crate::manager::LazyEventManager;

/// Installs a [`LazyEventManager`] into a [`Container`]
#[derive(Debug, Clone)]
pub struct EventsExtension {
    config: EventsConfig,
}

impl EventsExtension {
    pub fn new(config: EventsConfig) -> Self {
        Self { config }
    }

    /// Normalize `source` and install the manager service
    ///
    /// `source` is an options object or the name of a configuration service
    /// already registered in `container`.
    pub fn register(container: &Arc<Container>, source: &Value) -> Result<Self> {
        let extension = Self::new(EventsConfig::resolve(source, container)?);
        extension.install(container)?;
        Ok(extension)
    }

    pub fn config(&self) -> &EventsConfig {
        &self.config
    }

    /// Register the manager as a shared service under the configured name
    pub fn install(&self, container: &Arc<Container>) -> Result<()> {
        let handle = Arc::downgrade(container);
        let config = self.config.clone();
        let service = self.config.manager_service.clone();

        container.set_shared(service.clone(), move |_: &Container| {
            let container = handle.upgrade().ok_or_else(|| {
                DIError::factory(
                    config.manager_service.clone(),
                    LazyEventsError::Dispatcher(EventsError::ContainerUnavailable),
                )
            })?;
            load_manager(&container, &config)
                .map(Arc::new)
                .map_err(|e| DIError::factory(config.manager_service.clone(), e))
        })?;

        info!(
            service = %service,
            listener_tag = %self.config.listener_tag,
            subscriber_tag = %self.config.subscriber_tag,
            "Installed lazy event manager"
        );
        Ok(())
    }

    /// Fetch the installed manager, building it on first use
    pub fn manager(&self, container: &Container) -> Result<Arc<LazyEventManager>> {
        Ok(container.get_as::<LazyEventManager>(&self.config.manager_service)?)
    }
}

impl ServiceProvider for EventsExtension {
    fn name(&self) -> &'static str {
        "events"
    }

    fn register(&self, container: &Arc<Container>) -> DIResult<()> {
        self.install(container).map_err(|e| match e {
            LazyEventsError::Container(inner) => inner,
            other => DIError::factory(self.config.manager_service.clone(), other),
        })
    }

    fn validate(&self, container: &Container) -> DIResult<()> {
        if container.has(&self.config.manager_service) {
            Ok(())
        } else {
            Err(DIError::ServiceNotRegistered {
                name: self.config.manager_service.clone(),
            })
        }
    }
}

/// Assemble a manager from the services currently registered in `container`
///
/// Listener declarations are validated before anything is resolved. Services
/// carrying the subscriber tag are resolved immediately and must produce an
/// event subscriber.
pub fn load_manager(container: &Arc<Container>, config: &EventsConfig) -> Result<LazyEventManager> {
    let listeners = container.services_by_tag(&config.listener_tag)?;
    let index = build_index(&listeners)?;

    let locator: Arc<dyn ServiceLocator> = container.clone();
    let manager = LazyEventManager::new(index, Arc::downgrade(&locator));

    for descriptor in container.services_by_tag(&config.subscriber_tag)? {
        let instance = container.get(descriptor.name())?;
        match instance.downcast_ref::<Listener>() {
            Some(Listener::Subscriber(subscriber)) => {
                manager.add_event_subscriber(subscriber.clone())?;
                debug!(service = %descriptor.name(), "Registered eager subscriber");
            }
            _ => {
                return Err(LazyEventsError::InvalidState(format!(
                    "Subscriber {} has to resolve to an event subscriber.",
                    descriptor.name()
                )))
            }
        }
    }

    Ok(manager)
}
