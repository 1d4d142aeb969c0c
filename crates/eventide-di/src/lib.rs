//! Dependency Injection Container for Eventide
//!
//! This crate provides a named-service container: every service is registered
//! under a unique name, may carry any number of tags for bulk enumeration, and
//! may carry opaque class metadata that describes the service without building
//! it.
//!
//! ## Quick Start
//!
//! ```rust
//! use eventide_di::{Container, Definition};
//! use std::sync::Arc;
//!
//! let container = Container::new();
//! container
//!     .add(Definition::new("greeter", |_| Ok(Arc::new(String::from("hello")))).tag("greetings"))
//!     .unwrap();
//!
//! let greeter = container.get_as::<String>("greeter").unwrap();
//! assert_eq!(greeter.as_str(), "hello");
//! assert_eq!(container.services_by_tag("greetings").unwrap().len(), 1);
//! ```

pub mod provider;

pub use provider::{ServiceProvider, ServiceProviderRegistry};

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Type-erased service instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Opaque, construction-free description attached to a service definition.
pub type ClassMetadata = Arc<dyn Any + Send + Sync>;

type Factory = Arc<dyn Fn(&Container) -> DIResult<Instance> + Send + Sync>;

/// Errors that can occur during dependency injection operations
#[derive(Debug, thiserror::Error)]
pub enum DIError {
    #[error("Service not registered: {name}")]
    ServiceNotRegistered { name: String },

    #[error("Service already registered: {name}")]
    ServiceAlreadyRegistered { name: String },

    #[error("Service {name} is not of type {expected}")]
    InvalidServiceType { name: String, expected: &'static str },

    #[error("Factory for service {name} failed: {source}")]
    FactoryFailed {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Container lock poisoned: {0}")]
    LockPoisoned(String),
}

impl DIError {
    /// Wrap an error raised inside a service factory.
    pub fn factory<E>(name: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DIError::FactoryFailed {
            name: name.into(),
            source: Box::new(error),
        }
    }
}

pub type DIResult<T> = Result<T, DIError>;

/// Service lifetime management
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceLifetime {
    /// Service is created once, on first resolution, and reused afterwards
    Shared,
    /// Service is created each time it's requested
    Transient,
}

/// A service definition waiting to be added to a [`Container`].
pub struct Definition {
    name: String,
    factory: Factory,
    lifetime: ServiceLifetime,
    tags: Vec<String>,
    class: Option<ClassMetadata>,
}

impl Definition {
    /// Create a shared service definition backed by a factory
    pub fn new<F, T>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Container) -> DIResult<Arc<T>> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |container: &Container| -> DIResult<Instance> {
            let result = factory(container)?;
            Ok(result as Instance)
        });

        Self {
            name: name.into(),
            factory,
            lifetime: ServiceLifetime::Shared,
            tags: Vec::new(),
            class: None,
        }
    }

    /// Rebuild the service on every resolution
    pub fn transient(mut self) -> Self {
        self.lifetime = ServiceLifetime::Transient;
        self
    }

    /// Cache the service after its first resolution (the default)
    pub fn shared(mut self) -> Self {
        self.lifetime = ServiceLifetime::Shared;
        self
    }

    /// Add a tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// Attach class metadata readable without running the factory
    pub fn class<C>(mut self, class: C) -> Self
    where
        C: Any + Send + Sync,
    {
        self.class = Some(Arc::new(class));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Read-only view of a registered service, as returned by tag enumeration.
#[derive(Clone)]
pub struct ServiceDescriptor {
    name: String,
    tags: Vec<String>,
    lifetime: ServiceLifetime,
    class: Option<ClassMetadata>,
}

impl ServiceDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn lifetime(&self) -> ServiceLifetime {
        self.lifetime
    }

    /// Class metadata downcast to `C`, if present and of that type
    pub fn class<C: Any>(&self) -> Option<&C> {
        self.class.as_ref().and_then(|class| class.downcast_ref::<C>())
    }

    pub fn has_class(&self) -> bool {
        self.class.is_some()
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("lifetime", &self.lifetime)
            .field("has_class", &self.class.is_some())
            .finish()
    }
}

/// The lookup surface consumers of the container depend on.
pub trait ServiceLocator: Send + Sync {
    /// Enumerate descriptors of every service carrying `tag`, in registration order
    fn services_by_tag(&self, tag: &str) -> DIResult<Vec<ServiceDescriptor>>;

    /// Resolve a service by name, applying the container's sharing policy
    fn get(&self, name: &str) -> DIResult<Instance>;
}

struct ServiceEntry {
    seq: u64,
    factory: Factory,
    lifetime: ServiceLifetime,
    tags: Vec<String>,
    class: Option<ClassMetadata>,
    instance: Option<Instance>,
}

#[derive(Default)]
struct Registry {
    next_seq: u64,
    services: HashMap<String, ServiceEntry>,
}

/// The dependency injection container
pub struct Container {
    registry: RwLock<Registry>,
}

impl Container {
    /// Create a new empty container
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
        }
    }

    /// Add a service definition
    pub fn add(&self, definition: Definition) -> DIResult<()> {
        let mut registry = self
            .registry
            .write()
            .map_err(|e| DIError::LockPoisoned(format!("Failed to acquire write lock: {}", e)))?;

        if registry.services.contains_key(&definition.name) {
            return Err(DIError::ServiceAlreadyRegistered {
                name: definition.name,
            });
        }

        let seq = registry.next_seq;
        registry.next_seq += 1;

        debug!(
            service = %definition.name,
            lifetime = ?definition.lifetime,
            tags = ?definition.tags,
            "Registered service"
        );

        registry.services.insert(
            definition.name,
            ServiceEntry {
                seq,
                factory: definition.factory,
                lifetime: definition.lifetime,
                tags: definition.tags,
                class: definition.class,
                instance: None,
            },
        );
        Ok(())
    }

    /// Register a transient service
    pub fn set<F, T>(&self, name: impl Into<String>, factory: F) -> DIResult<()>
    where
        F: Fn(&Container) -> DIResult<Arc<T>> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        self.add(Definition::new(name, factory).transient())
    }

    /// Register a shared service, built lazily on first resolution
    pub fn set_shared<F, T>(&self, name: impl Into<String>, factory: F) -> DIResult<()>
    where
        F: Fn(&Container) -> DIResult<Arc<T>> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        self.add(Definition::new(name, factory))
    }

    /// Register an already-built value as a shared service
    pub fn set_instance<T>(&self, name: impl Into<String>, value: Arc<T>) -> DIResult<()>
    where
        T: Send + Sync + 'static,
    {
        self.add(Definition::new(name, move |_| Ok(value.clone())))
    }

    /// Resolve a service instance by name
    ///
    /// The factory runs without the container lock held. If two threads race
    /// on the first resolution of a shared service, the first stored instance
    /// wins and both callers receive it.
    pub fn get(&self, name: &str) -> DIResult<Instance> {
        let (factory, lifetime) = {
            let registry = self
                .registry
                .read()
                .map_err(|e| DIError::LockPoisoned(format!("Failed to acquire read lock: {}", e)))?;

            let entry = registry
                .services
                .get(name)
                .ok_or_else(|| DIError::ServiceNotRegistered {
                    name: name.to_string(),
                })?;

            if let Some(instance) = &entry.instance {
                return Ok(instance.clone());
            }

            (entry.factory.clone(), entry.lifetime)
        };

        debug!(service = %name, lifetime = ?lifetime, "Building service");
        let instance = factory(self)?;

        match lifetime {
            ServiceLifetime::Transient => Ok(instance),
            ServiceLifetime::Shared => {
                let mut registry = self.registry.write().map_err(|e| {
                    DIError::LockPoisoned(format!("Failed to acquire write lock: {}", e))
                })?;
                let entry = registry
                    .services
                    .get_mut(name)
                    .ok_or_else(|| DIError::ServiceNotRegistered {
                        name: name.to_string(),
                    })?;
                Ok(entry.instance.get_or_insert(instance).clone())
            }
        }
    }

    /// Resolve a service and downcast it to `T`
    pub fn get_as<T>(&self, name: &str) -> DIResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.get(name)?
            .downcast::<T>()
            .map_err(|_| DIError::InvalidServiceType {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Check if a service is registered
    pub fn has(&self, name: &str) -> bool {
        self.registry
            .read()
            .map(|registry| registry.services.contains_key(name))
            .unwrap_or(false)
    }

    /// Check whether a shared service has already been built
    pub fn is_resolved(&self, name: &str) -> bool {
        self.registry
            .read()
            .map(|registry| {
                registry
                    .services
                    .get(name)
                    .map(|entry| entry.instance.is_some())
                    .unwrap_or(false)
            })
            .unwrap_or(false)
    }

    /// Enumerate descriptors of services carrying `tag`, in registration order
    pub fn services_by_tag(&self, tag: &str) -> DIResult<Vec<ServiceDescriptor>> {
        let registry = self
            .registry
            .read()
            .map_err(|e| DIError::LockPoisoned(format!("Failed to acquire read lock: {}", e)))?;

        let mut tagged: Vec<(u64, ServiceDescriptor)> = registry
            .services
            .iter()
            .filter(|(_, entry)| entry.tags.iter().any(|t| t == tag))
            .map(|(name, entry)| {
                (
                    entry.seq,
                    ServiceDescriptor {
                        name: name.clone(),
                        tags: entry.tags.clone(),
                        lifetime: entry.lifetime,
                        class: entry.class.clone(),
                    },
                )
            })
            .collect();
        tagged.sort_by_key(|(seq, _)| *seq);

        Ok(tagged.into_iter().map(|(_, descriptor)| descriptor).collect())
    }

    /// Get the number of registered services
    pub fn service_count(&self) -> usize {
        self.registry
            .read()
            .map(|registry| registry.services.len())
            .unwrap_or(0)
    }

    /// Clear all registered services
    pub fn clear(&self) -> DIResult<()> {
        let mut registry = self
            .registry
            .write()
            .map_err(|e| DIError::LockPoisoned(format!("Failed to acquire write lock: {}", e)))?;
        registry.services.clear();
        info!("Cleared all services from container");
        Ok(())
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceLocator for Container {
    fn services_by_tag(&self, tag: &str) -> DIResult<Vec<ServiceDescriptor>> {
        Container::services_by_tag(self, tag)
    }

    fn get(&self, name: &str) -> DIResult<Instance> {
        Container::get(self, name)
    }
}
