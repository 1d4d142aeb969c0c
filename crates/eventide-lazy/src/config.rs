//! Extension configuration
//!
//! The extension accepts its options either as a JSON object or as the name of
//! a container service holding them:
//!
//! ```json
//! {
//!   "listener_tag": "eventide.events.listener",
//!   "subscriber_tag": "eventide.events.subscriber",
//!   "manager_service": "eventide.events.manager"
//! }
//! ```
//!
//! Every option is optional. Unknown options are rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use eventide_di::Container;

use crate::error::{LazyEventsError, Result};

/// Tag for listeners that are indexed and resolved on first dispatch
pub const TAG_LISTENER: &str = "eventide.events.listener";
/// Tag for subscribers registered as soon as the manager is built
pub const TAG_SUBSCRIBER: &str = "eventide.events.subscriber";
/// Service name the lazy manager is installed under
pub const EVENT_MANAGER: &str = "eventide.events.manager";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventsConfig {
    pub listener_tag: String,
    pub subscriber_tag: String,
    pub manager_service: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            listener_tag: TAG_LISTENER.to_string(),
            subscriber_tag: TAG_SUBSCRIBER.to_string(),
            manager_service: EVENT_MANAGER.to_string(),
        }
    }
}

impl EventsConfig {
    /// Normalize a configuration source
    ///
    /// `source` is either an options object or a string naming a container
    /// service that holds an [`EventsConfig`] or an options object.
    pub fn resolve(source: &Value, container: &Container) -> Result<Self> {
        match source {
            Value::Object(_) => Self::from_options(source),
            Value::String(service) => Self::from_service(service, container),
            other => Err(LazyEventsError::InvalidArgument(format!(
                "Config has to be either a map or a configuration service name within the container, got {}",
                other
            ))),
        }
    }

    fn from_options(options: &Value) -> Result<Self> {
        let config: EventsConfig = serde_json::from_value(options.clone())
            .map_err(|e| {
                LazyEventsError::InvalidArgument(format!("Invalid events config: {}", e))
            })?;
        config.validate()?;
        Ok(config)
    }

    fn from_service(service: &str, container: &Container) -> Result<Self> {
        let instance = container.get(service).map_err(|e| {
            LazyEventsError::InvalidArgument(format!(
                "Configuration service {} cannot be resolved: {}",
                service, e
            ))
        })?;

        if let Some(config) = instance.downcast_ref::<EventsConfig>() {
            config.validate()?;
            return Ok(config.clone());
        }
        match instance.downcast_ref::<Value>() {
            Some(options) if options.is_object() => Self::from_options(options),
            _ => Err(LazyEventsError::InvalidArgument(format!(
                "Configuration service {} does not hold an events configuration",
                service
            ))),
        }
    }

    fn validate(&self) -> Result<()> {
        let fields = [
            ("listener_tag", &self.listener_tag),
            ("subscriber_tag", &self.subscriber_tag),
            ("manager_service", &self.manager_service),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(LazyEventsError::InvalidArgument(format!(
                    "{} must not be empty",
                    field
                )));
            }
        }
        if self.listener_tag == self.subscriber_tag {
            return Err(LazyEventsError::InvalidArgument(
                "listener_tag and subscriber_tag must differ".to_string(),
            ));
        }
        Ok(())
    }
}
