//! Service provider registration.
//!
//! Each module contributes a registrar function keyed by module name. The
//! registrar runs during boot with mutable access to the hook bus and the
//! service container.

use std::collections::HashMap;
use std::fmt;

use crate::hook::HookBus;
use crate::module::Module;

/// Registrar signature for a module's service provider
pub type Registrar = Box<dyn Fn(&Module, &mut BootContext<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Mutable state handed to registrars
pub struct BootContext<'a> {
    pub hooks: &'a mut HookBus,
    pub container: &'a mut ServiceContainer,
}

/// Registrars by module name
#[derive(Default)]
pub struct ProviderRegistry {
    registrars: HashMap<String, Registrar>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.registrars.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ProviderRegistry")
            .field("modules", &names)
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the provider for `module`, replacing any previous one
    pub fn register<F>(&mut self, module: &str, registrar: F)
    where
        F: Fn(&Module, &mut BootContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.registrars
            .insert(module.to_string(), Box::new(registrar));
    }

    pub fn get(&self, module: &str) -> Option<&Registrar> {
        self.registrars.get(module)
    }

    pub fn contains(&self, module: &str) -> bool {
        self.registrars.contains_key(module)
    }

    pub fn len(&self) -> usize {
        self.registrars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrars.is_empty()
    }
}

/// Record of providers registered with the application
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceContainer {
    providers: Vec<String>,
}

impl ServiceContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider; returns `false` if it was already registered
    pub fn register_provider(&mut self, provider: impl Into<String>) -> bool {
        let provider = provider.into();
        if self.providers.contains(&provider) {
            return false;
        }
        self.providers.push(provider);
        true
    }

    pub fn is_registered(&self, provider: &str) -> bool {
        self.providers.iter().any(|p| p == provider)
    }

    /// Providers in registration order
    pub fn providers(&self) -> &[String] {
        &self.providers
    }
}
