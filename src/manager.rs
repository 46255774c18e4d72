//! Module discovery and boot lifecycle.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::config::{DependencyCheck, ModulesConfig};
use crate::error::ExtError;
use crate::hook::{events, HookBus};
use crate::module::Module;
use crate::provider::{BootContext, ProviderRegistry};
use crate::scanner::{dir_name, module_directories};

/// Outcome of booting one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootOutcome {
    /// Provider found and registered under this name
    Registered(String),
    /// No provider registered for the module
    NoProvider,
    /// Boot failed; the error was logged and published
    Failed(String),
}

/// Registry of discovered modules
#[derive(Debug, Clone)]
pub struct ModuleManager {
    config: ModulesConfig,
    modules: BTreeMap<String, Module>,
    disabled: BTreeMap<String, Module>,
}

impl ModuleManager {
    pub fn new(config: ModulesConfig) -> Self {
        Self {
            config,
            modules: BTreeMap::new(),
            disabled: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &ModulesConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.path
    }

    /// Scan the module root and register every enabled module
    ///
    /// Returns the number of active modules. A missing root is not an error.
    pub fn discover(&mut self, hooks: &HookBus) -> Result<usize, ExtError> {
        let root = self.config.path.clone();
        if !root.is_dir() {
            debug!(root = %root.display(), "module root does not exist, skipping discovery");
            return Ok(0);
        }

        let directories = module_directories(&root)?;
        hooks.fire(
            events::MODULES_DISCOVER_BEFORE,
            json!(directories
                .iter()
                .map(|d| d.display().to_string())
                .collect::<Vec<_>>()),
        );

        let scanned: Vec<(Module, Result<bool, ExtError>)> = directories
            .into_par_iter()
            .map(|dir| {
                let module = Module::new(dir_name(&dir), dir);
                let enabled = module.is_enabled();
                (module, enabled)
            })
            .collect();

        for (module, enabled) in scanned {
            match enabled {
                Ok(true) => {
                    debug!(module = %module.name(), "module discovered");
                    hooks.fire(events::MODULE_DISCOVERED, module.to_payload());
                    self.disabled.remove(module.name());
                    self.modules.insert(module.name().to_string(), module);
                }
                Ok(false) => {
                    debug!(module = %module.name(), "module is disabled");
                    self.modules.remove(module.name());
                    self.disabled.insert(module.name().to_string(), module);
                }
                Err(e) => {
                    warn!(module = %module.name(), error = %e, "skipping module with unreadable manifest");
                }
            }
        }

        hooks.fire(events::MODULES_DISCOVER_AFTER, json!(self.names()));
        info!(active = self.modules.len(), disabled = self.disabled.len(), "module discovery finished");

        Ok(self.modules.len())
    }

    /// Boot one module inside a failure boundary
    ///
    /// Errors never propagate: they are logged, published on
    /// `module.boot.failed` and reported as [`BootOutcome::Failed`].
    pub fn boot(
        &self,
        module: &Module,
        providers: &ProviderRegistry,
        ctx: &mut BootContext<'_>,
    ) -> BootOutcome {
        match self.try_boot(module, providers, ctx) {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = e.to_string();
                error!(module = %module.name(), error = %message, "module boot failed");
                ctx.hooks.fire(
                    events::MODULE_BOOT_FAILED,
                    json!({
                        "module": module.to_payload(),
                        "error": message,
                    }),
                );
                BootOutcome::Failed(message)
            }
        }
    }

    fn try_boot(
        &self,
        module: &Module,
        providers: &ProviderRegistry,
        ctx: &mut BootContext<'_>,
    ) -> Result<BootOutcome, ExtError> {
        ctx.hooks.fire(events::MODULE_BOOT_BEFORE, module.to_payload());

        if self.config.dependency_check == DependencyCheck::OnBoot {
            module.check_dependencies(|dep| self.has(dep))?;
        }

        // Module hooks are in place before its provider runs
        ctx.hooks.fire(events::MODULE_HOOKS_REGISTERED, module.to_payload());

        let outcome = match providers.get(module.name()) {
            Some(registrar) => {
                let class = module.provider_class(&self.config.namespace, &self.config.structure.providers);
                registrar(module, &mut *ctx).map_err(|e| ExtError::ProviderFailed {
                    module: module.name().to_string(),
                    message: format!("{e:#}"),
                })?;
                ctx.container.register_provider(class.clone());
                debug!(module = %module.name(), provider = %class, "provider registered");
                BootOutcome::Registered(class)
            }
            None => {
                debug!(module = %module.name(), "no provider registered");
                BootOutcome::NoProvider
            }
        };

        ctx.hooks.fire(events::MODULE_BOOT_AFTER, module.to_payload());

        Ok(outcome)
    }

    /// Active modules, ordered by name
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// Discovered modules whose manifest says `enabled: false`
    pub fn disabled(&self) -> impl Iterator<Item = &Module> {
        self.disabled.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }

    pub fn find(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Enable a known module and make it active
    ///
    /// Returns `Ok(false)` for unknown modules and modules without a manifest.
    pub fn enable(&mut self, name: &str, hooks: &HookBus) -> Result<bool, ExtError> {
        let Some(module) = self.modules.get(name).or_else(|| self.disabled.get(name)) else {
            return Ok(false);
        };
        if !module.enable(hooks)? {
            return Ok(false);
        }
        if let Some(module) = self.disabled.remove(name) {
            self.modules.insert(name.to_string(), module);
        }
        Ok(true)
    }

    /// Disable a known module and drop it from the active set
    ///
    /// Returns `Ok(false)` for unknown modules and modules without a manifest.
    pub fn disable(&mut self, name: &str, hooks: &HookBus) -> Result<bool, ExtError> {
        let Some(module) = self.modules.get(name).or_else(|| self.disabled.get(name)) else {
            return Ok(false);
        };
        if !module.disable(hooks)? {
            return Ok(false);
        }
        if let Some(module) = self.modules.remove(name) {
            self.disabled.insert(name.to_string(), module);
        }
        Ok(true)
    }

    /// Register a module from `path` (default `<root>/<name>`)
    ///
    /// Returns `None` when the directory does not exist.
    pub fn install(
        &mut self,
        name: &str,
        path: Option<&Path>,
        hooks: &HookBus,
    ) -> Option<&Module> {
        hooks.fire(events::MODULE_INSTALL_BEFORE, Value::String(name.to_string()));

        let path: PathBuf = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.path.join(name));
        if !path.is_dir() {
            warn!(module = %name, path = %path.display(), "module directory not found, not installing");
            return None;
        }

        let module = Module::new(name, path);
        hooks.fire(events::MODULE_INSTALL_AFTER, module.to_payload());
        info!(module = %name, "module installed");

        self.disabled.remove(name);
        self.modules.insert(name.to_string(), module);
        self.modules.get(name)
    }

    /// Remove a module from the registry; files on disk are left alone
    pub fn uninstall(&mut self, name: &str, hooks: &HookBus) -> bool {
        let Some(module) = self.modules.get(name) else {
            return false;
        };

        hooks.fire(events::MODULE_UNINSTALL_BEFORE, module.to_payload());
        self.modules.remove(name);
        hooks.fire(events::MODULE_UNINSTALL_AFTER, Value::String(name.to_string()));
        info!(module = %name, "module uninstalled");

        true
    }
}
