//! CLI arguments and project settings.
//!
//! Settings are read from `cmf-extensions.toml` in the project root (or the
//! file given with `--config`). Every key has a default, so a project
//! without a settings file behaves like a stock installation.

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ExtError;

/// Settings file looked up in the project root
pub const SETTINGS_FILE: &str = "cmf-extensions.toml";

/// Module, theme and view tooling for CMF applications
#[derive(Parser, Debug)]
#[command(name = "cmf-ext")]
#[command(version)]
#[command(about = "Module, theme and view tooling for CMF applications")]
pub struct Cli {
    /// Project root directory
    #[arg(short, long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Settings file (defaults to <root>/cmf-extensions.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a new module skeleton
    #[command(name = "make:module")]
    MakeModule {
        /// Module name
        name: String,
    },

    /// Create a new theme skeleton
    #[command(name = "make:theme")]
    MakeTheme {
        /// Theme name
        name: String,
        /// Create an admin theme
        #[arg(long)]
        admin: bool,
        /// Replace an existing theme
        #[arg(long)]
        force: bool,
    },

    /// List discovered modules
    #[command(name = "module:list")]
    ModuleList,

    /// Enable a module
    #[command(name = "module:enable")]
    ModuleEnable { name: String },

    /// Disable a module
    #[command(name = "module:disable")]
    ModuleDisable { name: String },

    /// Verify that a module's dependencies are loaded
    #[command(name = "module:check")]
    ModuleCheck { name: String },

    /// List available themes
    #[command(name = "theme:list")]
    ThemeList,

    /// Print the public URL of a theme asset
    #[command(name = "theme:asset")]
    ThemeAsset {
        /// Asset path relative to the theme's assets directory
        path: String,
        /// Theme name (defaults to the configured default theme)
        #[arg(long)]
        theme: Option<String>,
    },

    /// Resolve a view name to a template file
    #[command(name = "view:find")]
    ViewFind {
        /// View name, e.g. theme::index or blog::index.index
        name: String,
        /// Active front theme
        #[arg(long)]
        theme: Option<String>,
        /// Active admin theme
        #[arg(long)]
        admin_theme: Option<String>,
    },

    /// Run the module boot lifecycle and report the outcome
    Boot,
}

/// When module dependencies are verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyCheck {
    /// Only through an explicit `module:check` / `check_dependencies` call
    #[default]
    Manual,
    /// Before each module's provider is registered
    OnBoot,
}

/// Directory layout inside a module
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModuleStructure {
    pub controllers: String,
    pub providers: String,
    pub routes: String,
    pub models: String,
    pub migrations: String,
    pub seeders: String,
    pub views: String,
}

impl Default for ModuleStructure {
    fn default() -> Self {
        Self {
            controllers: "Http/Controllers".to_string(),
            providers: "Providers".to_string(),
            routes: "Routes".to_string(),
            models: "Models".to_string(),
            migrations: "Database/Migrations".to_string(),
            seeders: "Database/Seeders".to_string(),
            views: "Views".to_string(),
        }
    }
}

impl ModuleStructure {
    /// All directories in creation order
    pub fn directories(&self) -> [&str; 7] {
        [
            self.controllers.as_str(),
            self.providers.as_str(),
            self.routes.as_str(),
            self.models.as_str(),
            self.migrations.as_str(),
            self.seeders.as_str(),
            self.views.as_str(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    /// Directory holding one subdirectory per module
    pub path: PathBuf,
    /// Namespace prefix of generated module classes
    pub namespace: String,
    pub structure: ModuleStructure,
    /// Scan the module root during boot
    pub auto_discover: bool,
    pub dependency_check: DependencyCheck,
    /// Directory with `<type>.stub` overrides for `make:module`
    pub stubs_path: Option<PathBuf>,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("app"),
            namespace: "App".to_string(),
            structure: ModuleStructure::default(),
            auto_discover: true,
            dependency_check: DependencyCheck::Manual,
            stubs_path: None,
        }
    }
}

/// Directory layout inside a theme
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ThemeStructure {
    pub assets: String,
    pub views: String,
    pub config: String,
}

impl Default for ThemeStructure {
    fn default() -> Self {
        Self {
            assets: "assets".to_string(),
            views: "views".to_string(),
            config: "config".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ThemesConfig {
    /// Directory holding one subdirectory per theme
    pub path: PathBuf,
    /// Front theme used when the session has none
    pub default: String,
    /// Admin theme used when the session has none
    pub admin_default: String,
    /// Public URL prefix of the theme directory
    pub url: String,
    /// View namespace mapped to the current theme's views
    pub namespace: String,
    pub structure: ThemeStructure,
}

impl Default for ThemesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("public/themes"),
            default: "default".to_string(),
            admin_default: "admin_default".to_string(),
            url: "/themes".to_string(),
            namespace: "theme".to_string(),
            structure: ThemeStructure::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ViewsConfig {
    /// Default view search paths, in order
    pub paths: Vec<PathBuf>,
    /// Template extensions, in order of preference
    pub extensions: Vec<String>,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            paths: vec![PathBuf::from("resources/views")],
            extensions: vec!["blade.php".to_string(), "php".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub filter: Option<String>,
}

/// Project settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub modules: ModulesConfig,
    pub themes: ThemesConfig,
    pub views: ViewsConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Parse settings from TOML text
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ExtError> {
        toml::from_str(text).map_err(|source| ExtError::InvalidConfig {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load settings for the project at `root`
    ///
    /// An explicit `file` must exist; the implicit settings file is optional.
    /// Relative paths are resolved against `root`.
    pub fn load(root: &Path, file: Option<&Path>) -> Result<Self, ExtError> {
        let settings = match file {
            Some(path) => Self::from_toml(&fs::read_to_string(path)?, path)?,
            None => {
                let path = root.join(SETTINGS_FILE);
                if path.is_file() {
                    Self::from_toml(&fs::read_to_string(&path)?, &path)?
                } else {
                    Self::default()
                }
            }
        };

        Ok(settings.rooted_at(root))
    }

    /// Resolve every relative path against `root`
    pub fn rooted_at(mut self, root: &Path) -> Self {
        self.modules.path = root.join(&self.modules.path);
        self.modules.stubs_path = self.modules.stubs_path.map(|p| root.join(p));
        self.themes.path = root.join(&self.themes.path);
        self.views.paths = self.views.paths.iter().map(|p| root.join(p)).collect();
        self
    }
}
