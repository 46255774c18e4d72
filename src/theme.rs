//! Themes, the active theme per session, and request theme selection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::ThemesConfig;
use crate::error::ExtError;
use crate::scanner::{dir_name, theme_directories};
use crate::session::{
    Session, CURRENT_ADMIN_THEME, CURRENT_THEME, REQUESTED_ADMIN_THEME, REQUESTED_THEME,
};

/// Theme metadata file
pub const THEME_MANIFEST: &str = "theme.json";

/// Template file suffix
pub const VIEW_SUFFIX: &str = ".blade.php";

/// Typed view of `theme.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A theme directory under the theme root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    name: String,
    path: PathBuf,
    url: String,
    assets_dir: String,
    views_dir: String,
    config_dir: String,
}

impl Theme {
    pub fn new(name: &str, config: &ThemesConfig) -> Self {
        Self {
            name: name.to_string(),
            path: config.path.join(name),
            url: config.url.trim_end_matches('/').to_string(),
            assets_dir: config.structure.assets.clone(),
            views_dir: config.structure.views.clone(),
            config_dir: config.structure.config.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Public URL of an asset; the file is not checked
    pub fn asset(&self, path: &str) -> String {
        format!("{}/{}/{}/{}", self.url, self.name, self.assets_dir, path)
    }

    /// Directory holding the theme's templates
    pub fn views_dir(&self) -> PathBuf {
        self.path.join(&self.views_dir)
    }

    /// Template path for a dotted view name
    pub fn view_path(&self, view: &str) -> PathBuf {
        self.views_dir()
            .join(format!("{}{}", view.replace('.', "/"), VIEW_SUFFIX))
    }

    /// Location of `theme.json`, if any
    ///
    /// The theme root is checked before the theme's config directory.
    pub fn manifest_path(&self) -> Option<PathBuf> {
        [
            self.path.join(THEME_MANIFEST),
            self.path.join(&self.config_dir).join(THEME_MANIFEST),
        ]
        .into_iter()
        .find(|p| p.is_file())
    }

    pub fn manifest(&self) -> Result<Option<ThemeManifest>, ExtError> {
        let Some(raw) = self.read_raw()? else {
            return Ok(None);
        };
        serde_json::from_value(raw)
            .map(Some)
            .map_err(|source| ExtError::InvalidManifest {
                path: self.manifest_path().unwrap_or_else(|| self.path.join(THEME_MANIFEST)),
                source,
            })
    }

    /// Manifest value for `key`, or `default` when the file or key is absent
    pub fn config_value(&self, key: &str, default: Value) -> Result<Value, ExtError> {
        Ok(self
            .read_raw()?
            .and_then(|raw| raw.get(key).cloned())
            .unwrap_or(default))
    }

    fn read_raw(&self) -> Result<Option<Value>, ExtError> {
        let Some(path) = self.manifest_path() else {
            return Ok(None);
        };
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| ExtError::InvalidManifest { path, source })
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Theme lookup and per-session theme selection
#[derive(Debug, Clone)]
pub struct Themes {
    config: ThemesConfig,
}

impl Themes {
    pub fn new(config: ThemesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ThemesConfig {
        &self.config
    }

    pub fn theme(&self, name: &str) -> Theme {
        Theme::new(name, &self.config)
    }

    pub fn default_theme(&self) -> Theme {
        self.theme(&self.config.default)
    }

    pub fn default_admin_theme(&self) -> Theme {
        self.theme(&self.config.admin_default)
    }

    /// Active front theme for this session
    pub fn current(&self, session: &Session) -> Theme {
        self.theme(session.get(CURRENT_THEME).unwrap_or(self.config.default.as_str()))
    }

    /// Active admin theme for this session
    pub fn admin_current(&self, session: &Session) -> Theme {
        self.theme(
            session
                .get(CURRENT_ADMIN_THEME)
                .unwrap_or(self.config.admin_default.as_str()),
        )
    }

    /// Make `name` the active front theme
    ///
    /// Returns `false` and leaves the session untouched when the theme
    /// directory does not exist.
    pub fn set(&self, session: &mut Session, name: &str) -> bool {
        self.activate(session, CURRENT_THEME, name)
    }

    /// Make `name` the active admin theme; same contract as [`Themes::set`]
    pub fn set_admin(&self, session: &mut Session, name: &str) -> bool {
        self.activate(session, CURRENT_ADMIN_THEME, name)
    }

    fn activate(&self, session: &mut Session, key: &str, name: &str) -> bool {
        if !is_theme_name(name) || !self.theme(name).exists() {
            debug!(theme = %name, "theme does not exist, keeping current selection");
            return false;
        }
        session.put(key, name);
        true
    }

    /// Every theme directory under the theme root, sorted by name
    pub fn all(&self) -> Result<Vec<Theme>, ExtError> {
        Ok(theme_directories(&self.config.path)?
            .iter()
            .map(|dir| self.theme(&dir_name(dir)))
            .collect())
    }

    /// Choose the front and admin themes for one request
    ///
    /// A query parameter wins and is remembered in the session; otherwise
    /// the remembered choice is used; otherwise the configured default.
    /// Themes that do not exist fall back to the configured defaults.
    pub fn select_for_request(
        &self,
        session: &mut Session,
        theme_query: Option<&str>,
        admin_query: Option<&str>,
    ) -> (Theme, Theme) {
        let front = requested(session, REQUESTED_THEME, theme_query)
            .unwrap_or_else(|| self.config.default.clone());
        if !self.set(session, &front) {
            session.put(CURRENT_THEME, self.config.default.clone());
        }

        let admin = requested(session, REQUESTED_ADMIN_THEME, admin_query)
            .unwrap_or_else(|| self.config.admin_default.clone());
        if !self.set_admin(session, &admin) {
            session.put(CURRENT_ADMIN_THEME, self.config.admin_default.clone());
        }

        (self.current(session), self.admin_current(session))
    }
}

/// A theme name is a single directory name under the theme root
fn is_theme_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
}

fn requested(session: &mut Session, key: &str, query: Option<&str>) -> Option<String> {
    match query.filter(|q| !q.is_empty()) {
        Some(name) => {
            session.put(key, name);
            Some(name.to_string())
        }
        None => session
            .get(key)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup(themes: &[&str]) -> (TempDir, Themes) {
        let temp = TempDir::new().unwrap();
        for name in themes {
            fs::create_dir_all(temp.path().join(name).join("views")).unwrap();
        }
        let config = ThemesConfig {
            path: temp.path().to_path_buf(),
            ..ThemesConfig::default()
        };
        (temp, Themes::new(config))
    }

    // ==================== Theme tests ====================

    #[test]
    fn test_asset_url() {
        let (_temp, themes) = setup(&[]);
        let theme = themes.theme("dark");
        assert_eq!(theme.asset("css/style.css"), "/themes/dark/assets/css/style.css");
    }

    #[test]
    fn test_asset_url_trailing_slash_base() {
        let config = ThemesConfig {
            url: "https://cdn.example.com/themes/".to_string(),
            ..ThemesConfig::default()
        };
        let theme = Theme::new("dark", &config);
        assert_eq!(
            theme.asset("js/app.js"),
            "https://cdn.example.com/themes/dark/assets/js/app.js"
        );
    }

    #[test]
    fn test_view_path() {
        let (temp, themes) = setup(&["default"]);
        let theme = themes.theme("default");
        assert_eq!(
            theme.view_path("layouts.default"),
            temp.path().join("default/views/layouts/default.blade.php")
        );
    }

    #[test]
    fn test_exists() {
        let (_temp, themes) = setup(&["default"]);
        assert!(themes.theme("default").exists());
        assert!(!themes.theme("missing").exists());
    }

    #[test]
    fn test_config_value_from_root_manifest() {
        let (temp, themes) = setup(&["default"]);
        fs::write(
            temp.path().join("default").join(THEME_MANIFEST),
            r#"{"name": "default", "version": "1.0.0", "author": "Jane"}"#,
        )
        .unwrap();

        let theme = themes.theme("default");
        assert_eq!(theme.config_value("author", json!(null)).unwrap(), json!("Jane"));
        assert_eq!(theme.config_value("missing", json!("x")).unwrap(), json!("x"));

        let manifest = theme.manifest().unwrap().unwrap();
        assert_eq!(manifest.version, "1.0.0");
        assert_eq!(manifest.description, "");
    }

    #[test]
    fn test_config_value_from_config_dir() {
        let (temp, themes) = setup(&["default"]);
        let config_dir = temp.path().join("default").join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(THEME_MANIFEST), r#"{"description": "Nested"}"#).unwrap();

        let theme = themes.theme("default");
        assert_eq!(
            theme.config_value("description", json!(null)).unwrap(),
            json!("Nested")
        );
    }

    #[test]
    fn test_config_value_without_manifest_uses_default() {
        let (_temp, themes) = setup(&["default"]);
        let theme = themes.theme("default");
        assert_eq!(theme.config_value("name", json!("fallback")).unwrap(), json!("fallback"));
        assert!(theme.manifest().unwrap().is_none());
    }

    // ==================== Themes tests ====================

    #[test]
    fn test_current_defaults() {
        let (_temp, themes) = setup(&[]);
        let session = Session::new();
        assert_eq!(themes.current(&session).name(), "default");
        assert_eq!(themes.admin_current(&session).name(), "admin_default");
    }

    #[test]
    fn test_set_existing_theme() {
        let (_temp, themes) = setup(&["default", "dark"]);
        let mut session = Session::new();

        assert!(themes.set(&mut session, "dark"));
        assert_eq!(themes.current(&session).name(), "dark");
    }

    #[test]
    fn test_set_missing_theme_keeps_previous() {
        let (_temp, themes) = setup(&["default", "dark"]);
        let mut session = Session::new();
        themes.set(&mut session, "dark");

        assert!(!themes.set(&mut session, "nonexistent"));
        assert_eq!(themes.current(&session).name(), "dark");
    }

    #[test]
    fn test_set_rejects_names_outside_theme_root() {
        let (temp, themes) = setup(&["default"]);
        fs::create_dir_all(temp.path().join("default/nested")).unwrap();
        let mut session = Session::new();

        assert!(!themes.set(&mut session, ".."));
        assert!(!themes.set(&mut session, "default/nested"));
        assert!(!themes.set(&mut session, "default\\nested"));
        assert!(!themes.set_admin(&mut session, "../default"));
        assert!(session.get(CURRENT_THEME).is_none());
        assert!(session.get(CURRENT_ADMIN_THEME).is_none());
    }

    #[test]
    fn test_set_admin() {
        let (_temp, themes) = setup(&["admin_blue"]);
        let mut session = Session::new();

        assert!(themes.set_admin(&mut session, "admin_blue"));
        assert!(!themes.set_admin(&mut session, "admin_red"));
        assert_eq!(themes.admin_current(&session).name(), "admin_blue");
        assert_eq!(themes.current(&session).name(), "default");
    }

    #[test]
    fn test_all_sorted() {
        let (_temp, themes) = setup(&["zen", "default", "admin_default"]);
        let names: Vec<String> = themes
            .all()
            .unwrap()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, vec!["admin_default", "default", "zen"]);
    }

    // ==================== select_for_request tests ====================

    #[test]
    fn test_select_query_wins_and_is_remembered() {
        let (_temp, themes) = setup(&["default", "dark", "admin_default"]);
        let mut session = Session::new();

        let (front, admin) = themes.select_for_request(&mut session, Some("dark"), None);
        assert_eq!(front.name(), "dark");
        assert_eq!(admin.name(), "admin_default");

        let (front, _) = themes.select_for_request(&mut session, None, None);
        assert_eq!(front.name(), "dark");
    }

    #[test]
    fn test_select_unknown_theme_falls_back_to_default() {
        let (_temp, themes) = setup(&["default", "admin_default"]);
        let mut session = Session::new();

        let (front, admin) =
            themes.select_for_request(&mut session, Some("ghost"), Some("admin_ghost"));
        assert_eq!(front.name(), "default");
        assert_eq!(admin.name(), "admin_default");
    }

    #[test]
    fn test_select_ignores_relative_theme_names() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("public");
        for dir in ["public/default", "public/admin_default", "private"] {
            fs::create_dir_all(temp.path().join(dir)).unwrap();
        }
        let themes = Themes::new(ThemesConfig {
            path: root,
            ..ThemesConfig::default()
        });
        let mut session = Session::new();

        let (front, admin) =
            themes.select_for_request(&mut session, Some("../private"), Some("../private"));
        assert_eq!(front.name(), "default");
        assert_eq!(admin.name(), "admin_default");
        assert_eq!(session.get(CURRENT_THEME), Some("default"));
        assert_eq!(session.get(CURRENT_ADMIN_THEME), Some("admin_default"));
    }

    #[test]
    fn test_select_admin_query() {
        let (_temp, themes) = setup(&["default", "admin_default", "admin_blue"]);
        let mut session = Session::new();

        let (_, admin) = themes.select_for_request(&mut session, None, Some("admin_blue"));
        assert_eq!(admin.name(), "admin_blue");
        assert_eq!(session.get(REQUESTED_ADMIN_THEME), Some("admin_blue"));
    }
}
