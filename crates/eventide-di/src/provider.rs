//! Service Provider trait for bootstrapping the container
//!
//! Extensions implement [`ServiceProvider`] to install their services into a
//! [`Container`]. A [`ServiceProviderRegistry`] runs a batch of providers in
//! priority order and then lets each one validate the result.
//!
//! ```rust,ignore
//! use eventide_di::{Container, DIResult, ServiceProvider};
//! use std::sync::Arc;
//!
//! pub struct ClockProvider;
//!
//! impl ServiceProvider for ClockProvider {
//!     fn name(&self) -> &'static str {
//!         "clock"
//!     }
//!
//!     fn register(&self, container: &Arc<Container>) -> DIResult<()> {
//!         container.set_shared("clock", |_| Ok(Arc::new(SystemClock::default())))
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::{Container, DIResult};

/// Trait for types that can install services into the container.
///
/// Providers receive the container behind an `Arc` so that services they
/// register can keep a weak handle back to it.
pub trait ServiceProvider: Send + Sync {
    /// Returns the name of this service provider.
    ///
    /// Used for logging and debugging.
    fn name(&self) -> &'static str;

    /// Returns the priority of this service provider.
    ///
    /// Lower values are registered first. Default is 100.
    fn priority(&self) -> u32 {
        100
    }

    /// Register services with the container.
    fn register(&self, container: &Arc<Container>) -> DIResult<()>;

    /// Optional: Validate that required services are registered.
    ///
    /// Called after all providers have registered their services.
    #[allow(unused_variables)]
    fn validate(&self, container: &Container) -> DIResult<()> {
        Ok(())
    }
}

/// Registry for managing service providers.
pub struct ServiceProviderRegistry {
    providers: Vec<Arc<dyn ServiceProvider>>,
}

impl ServiceProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Add a service provider to the registry.
    pub fn add<P: ServiceProvider + 'static>(&mut self, provider: P) -> &mut Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Add a shared service provider to the registry.
    pub fn add_boxed(&mut self, provider: Arc<dyn ServiceProvider>) -> &mut Self {
        self.providers.push(provider);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// List all provider names.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Register all providers with the container.
    ///
    /// Providers are sorted by priority (stable, so equal priorities keep
    /// insertion order) and registered in order.
    pub fn register_all(&self, container: &Arc<Container>) -> DIResult<()> {
        let mut sorted: Vec<_> = self.providers.iter().collect();
        sorted.sort_by_key(|p| p.priority());

        tracing::info!("Registering {} service providers", sorted.len());

        for provider in sorted {
            tracing::debug!(
                "Registering provider '{}' (priority: {})",
                provider.name(),
                provider.priority()
            );
            provider.register(container)?;
        }

        for provider in &self.providers {
            provider.validate(container)?;
        }

        tracing::info!("All service providers registered successfully");
        Ok(())
    }
}

impl Default for ServiceProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
