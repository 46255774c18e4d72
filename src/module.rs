//! Modules and their `module.json` manifests.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::ExtError;
use crate::hook::{events, HookBus};

/// Marker file identifying a module directory
pub const MODULE_MANIFEST: &str = "module.json";

/// Typed view of `module.json`
///
/// Keys this crate does not know about are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A module directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    name: String,
    path: PathBuf,
}

impl Module {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(MODULE_MANIFEST)
    }

    /// Hook payload describing this module
    pub fn to_payload(&self) -> Value {
        json!({
            "name": self.name,
            "path": self.path.display().to_string(),
        })
    }

    /// Parsed manifest, `None` when the module has no `module.json`
    pub fn manifest(&self) -> Result<Option<ModuleManifest>, ExtError> {
        let Some(raw) = self.read_raw()? else {
            return Ok(None);
        };
        serde_json::from_value(raw)
            .map(Some)
            .map_err(|source| ExtError::InvalidManifest {
                path: self.manifest_path(),
                source,
            })
    }

    /// Whether the module is enabled; a missing file or key means enabled
    ///
    /// Only the `enabled` key is read, so other fields may hold any type.
    pub fn is_enabled(&self) -> Result<bool, ExtError> {
        Ok(self
            .config_value("enabled")?
            .and_then(|value| value.as_bool())
            .unwrap_or(true))
    }

    /// Raw manifest value for `key`
    pub fn config_value(&self, key: &str) -> Result<Option<Value>, ExtError> {
        Ok(self
            .read_raw()?
            .and_then(|raw| raw.get(key).cloned()))
    }

    /// Mark the module enabled and fire `module.enabled`
    ///
    /// Returns `Ok(false)` when the module has no manifest.
    pub fn enable(&self, hooks: &HookBus) -> Result<bool, ExtError> {
        self.set_enabled(true, hooks)
    }

    /// Mark the module disabled and fire `module.disabled`
    ///
    /// Returns `Ok(false)` when the module has no manifest.
    pub fn disable(&self, hooks: &HookBus) -> Result<bool, ExtError> {
        self.set_enabled(false, hooks)
    }

    /// Fail on the first declared dependency that `is_loaded` rejects
    pub fn check_dependencies(&self, is_loaded: impl Fn(&str) -> bool) -> Result<(), ExtError> {
        let Some(Value::Array(dependencies)) = self.config_value("dependencies")? else {
            return Ok(());
        };

        match dependencies
            .iter()
            .filter_map(Value::as_str)
            .find(|dep| !is_loaded(dep))
        {
            Some(dependency) => Err(ExtError::MissingDependency {
                module: self.name.clone(),
                dependency: dependency.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Conventional provider class, e.g. `App\Blog\Providers\BlogServiceProvider`
    pub fn provider_class(&self, namespace: &str, providers_dir: &str) -> String {
        format!(
            "{}\\{}\\{}\\{}ServiceProvider",
            namespace,
            self.name,
            providers_dir.replace('/', "\\"),
            self.name
        )
    }

    fn read_raw(&self) -> Result<Option<Value>, ExtError> {
        let path = self.manifest_path();
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| ExtError::InvalidManifest { path, source })
    }

    /// Read the whole manifest, flip `enabled`, write the whole manifest back
    ///
    /// The new content goes to a sibling file that is renamed over the
    /// original. Concurrent writers are not coordinated.
    fn set_enabled(&self, enabled: bool, hooks: &HookBus) -> Result<bool, ExtError> {
        let Some(mut raw) = self.read_raw()? else {
            debug!(module = %self.name, "no manifest, leaving enabled state untouched");
            return Ok(false);
        };

        let path = self.manifest_path();
        let Some(object) = raw.as_object_mut() else {
            return Err(ExtError::InvalidManifest {
                path,
                source: serde::de::Error::custom("manifest is not a JSON object"),
            });
        };
        object.insert("enabled".to_string(), Value::Bool(enabled));

        let content = serde_json::to_string_pretty(&raw).map_err(|source| {
            ExtError::InvalidManifest {
                path: path.clone(),
                source,
            }
        })?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, content).map_err(|source| ExtError::WriteFailed {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &path).map_err(|source| ExtError::WriteFailed {
            path: path.clone(),
            source,
        })?;

        let event = if enabled {
            events::MODULE_ENABLED
        } else {
            events::MODULE_DISABLED
        };
        info!(module = %self.name, enabled, "module state changed");
        hooks.fire(event, self.to_payload());

        Ok(true)
    }
}
