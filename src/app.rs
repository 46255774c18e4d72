//! Application bootstrap.
//!
//! [`Application`] owns the hook bus, the module registry, provider
//! registrars and the service container, and runs the boot lifecycle:
//!
//! 1. `modules.init`
//! 2. discovery (when `auto_discover` is set)
//! 3. per module: `module.load.before`, boot, `module.load.after`
//! 4. `modules.boot`

use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::ExtError;
use crate::hook::{events, HookBus};
use crate::manager::{BootOutcome, ModuleManager};
use crate::module::Module;
use crate::provider::{BootContext, ProviderRegistry, ServiceContainer};
use crate::scaffold::snake;
use crate::session::Session;
use crate::theme::Themes;
use crate::view::{FileViewFinder, ThemeViewFinder, ViewFinder};

/// Per-module results of one boot run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootReport {
    pub outcomes: Vec<(String, BootOutcome)>,
}

impl BootReport {
    pub fn registered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, BootOutcome::Registered(_)))
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|(name, outcome)| match outcome {
            BootOutcome::Failed(message) => Some((name.as_str(), message.as_str())),
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }
}

#[derive(Debug)]
pub struct Application {
    settings: Settings,
    hooks: HookBus,
    modules: ModuleManager,
    providers: ProviderRegistry,
    container: ServiceContainer,
    themes: Themes,
}

impl Application {
    pub fn new(settings: Settings) -> Self {
        Self {
            hooks: HookBus::new(),
            modules: ModuleManager::new(settings.modules.clone()),
            providers: ProviderRegistry::new(),
            container: ServiceContainer::new(),
            themes: Themes::new(settings.themes.clone()),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn hooks(&self) -> &HookBus {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut HookBus {
        &mut self.hooks
    }

    pub fn modules(&self) -> &ModuleManager {
        &self.modules
    }

    /// Registry and hook bus together, for enable/disable/install calls
    pub fn modules_mut(&mut self) -> (&mut ModuleManager, &HookBus) {
        (&mut self.modules, &self.hooks)
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn providers_mut(&mut self) -> &mut ProviderRegistry {
        &mut self.providers
    }

    pub fn container(&self) -> &ServiceContainer {
        &self.container
    }

    pub fn themes(&self) -> &Themes {
        &self.themes
    }

    /// Run the boot lifecycle once
    ///
    /// Discovery errors abort the run; a failing module never stops the
    /// others and shows up in the report instead.
    pub fn boot(&mut self) -> Result<BootReport, ExtError> {
        self.hooks.fire(events::MODULES_INIT, Value::Null);

        if self.settings.modules.auto_discover {
            self.modules.discover(&self.hooks)?;
        }

        let modules: Vec<Module> = self.modules.modules().cloned().collect();
        let mut report = BootReport::default();

        for module in &modules {
            self.hooks.fire(events::MODULE_LOAD_BEFORE, module.to_payload());

            let mut ctx = BootContext {
                hooks: &mut self.hooks,
                container: &mut self.container,
            };
            let outcome = self.modules.boot(module, &self.providers, &mut ctx);

            self.hooks.fire(events::MODULE_LOAD_AFTER, module.to_payload());
            report.outcomes.push((module.name().to_string(), outcome));
        }

        self.hooks.fire(events::MODULES_BOOT, json!(self.modules.names()));

        if report.has_failures() {
            warn!(
                failed = report.failed().count(),
                total = report.outcomes.len(),
                "boot finished with failures"
            );
        } else {
            info!(modules = report.outcomes.len(), "boot finished");
        }
        Ok(report)
    }

    /// View finder for a request carrying `session`
    ///
    /// Theme views are searched first, then the configured view paths. The
    /// theme namespace points at the current theme's views and every active
    /// module's views are reachable under its name.
    pub fn view_finder(&self, session: &Session) -> ThemeViewFinder<FileViewFinder> {
        let theme = self.themes.current(session);
        let admin = self.themes.admin_current(session);

        let mut finder = ThemeViewFinder::new(
            FileViewFinder::from_config(&self.settings.views),
            &self.settings.themes,
        );
        finder.set_theme(&theme).set_admin_theme(admin.name());

        let theme_views = theme.views_dir();
        if theme_views.is_dir() {
            finder.add_namespace(&self.settings.themes.namespace, vec![theme_views]);
        }

        let views_dir = &self.settings.modules.structure.views;
        for module in self.modules.modules() {
            let hint: PathBuf = module.path().join(views_dir);
            if !hint.is_dir() {
                continue;
            }
            let snake_name = snake(module.name());
            if snake_name != module.name() {
                finder.add_namespace(&snake_name, vec![hint.clone()]);
            }
            finder.add_namespace(module.name(), vec![hint]);
        }

        finder
    }
}
