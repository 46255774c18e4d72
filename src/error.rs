use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by module, theme and view operations
#[derive(Error, Debug)]
pub enum ExtError {
    #[error("View [{view}] not found in theme [{theme}].")]
    ThemeViewNotFound { view: String, theme: String },

    #[error("View [{view}] not found in admin theme [{theme}].")]
    AdminThemeViewNotFound { view: String, theme: String },

    #[error("View [{view}] not found.")]
    ViewNotFound { view: String },

    #[error("No hint path defined for [{namespace}].")]
    NoViewHint { namespace: String },

    #[error("Module {module} requires {dependency} module.")]
    MissingDependency { module: String, dependency: String },

    #[error("Invalid manifest: {path}")]
    InvalidManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Module [{name}] already exists at {path}")]
    ModuleExists { name: String, path: PathBuf },

    #[error("Theme [{name}] already exists at {path}")]
    ThemeExists { name: String, path: PathBuf },

    #[error("Invalid name: '{name}'")]
    InvalidName { name: String },

    #[error("Invalid configuration file: {path}")]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to create directory: {path}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Service provider for module {module} failed: {message}")]
    ProviderFailed { module: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
