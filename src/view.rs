//! View name resolution.
//!
//! A view name is classified once by [`ViewName::parse`] and then resolved
//! against an ordered list of candidate files. Theme and admin theme views
//! must exist in their theme; module views fall back to the default finder.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::config::{ThemesConfig, ViewsConfig};
use crate::error::ExtError;
use crate::theme::{Theme, VIEW_SUFFIX};

const THEME_PREFIX: &str = "theme::";
const ADMIN_PREFIX: &str = "admin::";
const NAMESPACE_DELIMITER: &str = "::";
const ADMIN_SEGMENT: &str = "admin.";
const MODULES_DIR: &str = "modules";

/// A classified view name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewName {
    /// `theme::x`, looked up in the active front theme
    Theme(String),
    /// `admin::x`, looked up in the active admin theme
    AdminTheme(String),
    /// `module::x`, looked up in the front theme's module views
    Module { module: String, view: String },
    /// `module::admin.x`, looked up in the admin theme's module views
    AdminModule { module: String, view: String },
    /// Plain view name, handled by the default finder
    Default(String),
}

impl ViewName {
    pub fn parse(name: &str) -> Self {
        if let Some(view) = name.strip_prefix(THEME_PREFIX) {
            return ViewName::Theme(view.to_string());
        }
        if let Some(view) = name.strip_prefix(ADMIN_PREFIX) {
            return ViewName::AdminTheme(view.to_string());
        }

        match name.split_once(NAMESPACE_DELIMITER) {
            Some((module, view)) if view.contains(ADMIN_SEGMENT) => ViewName::AdminModule {
                module: module.to_string(),
                view: view.replace(ADMIN_SEGMENT, ""),
            },
            Some((module, view)) => ViewName::Module {
                module: module.to_string(),
                view: view.to_string(),
            },
            None => ViewName::Default(name.to_string()),
        }
    }
}

/// Resolves view names to template files
pub trait ViewFinder {
    fn find(&self, name: &str) -> Result<PathBuf, ExtError>;

    fn add_location(&mut self, path: PathBuf);

    fn prepend_location(&mut self, path: PathBuf);

    fn add_namespace(&mut self, namespace: &str, hints: Vec<PathBuf>);
}

/// Default finder: ordered search paths plus namespace hint paths
#[derive(Debug, Clone, Default)]
pub struct FileViewFinder {
    paths: Vec<PathBuf>,
    hints: HashMap<String, Vec<PathBuf>>,
    extensions: Vec<String>,
}

impl FileViewFinder {
    pub fn new(paths: Vec<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            paths,
            hints: HashMap::new(),
            extensions,
        }
    }

    pub fn from_config(config: &ViewsConfig) -> Self {
        Self::new(config.paths.clone(), config.extensions.clone())
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn hints(&self, namespace: &str) -> Option<&[PathBuf]> {
        self.hints.get(namespace).map(Vec::as_slice)
    }

    fn find_in_paths(&self, name: &str, paths: &[PathBuf]) -> Option<PathBuf> {
        let relative = name.replace('.', "/");
        paths.iter().find_map(|dir| {
            self.extensions
                .iter()
                .map(|ext| dir.join(format!("{relative}.{ext}")))
                .find(|candidate| candidate.is_file())
        })
    }
}

impl ViewFinder for FileViewFinder {
    fn find(&self, name: &str) -> Result<PathBuf, ExtError> {
        let found = match name.split_once(NAMESPACE_DELIMITER) {
            Some((namespace, view)) => {
                let hints = self.hints.get(namespace).ok_or_else(|| ExtError::NoViewHint {
                    namespace: namespace.to_string(),
                })?;
                self.find_in_paths(view, hints)
            }
            None => self.find_in_paths(name, &self.paths),
        };

        found.ok_or_else(|| ExtError::ViewNotFound {
            view: name.to_string(),
        })
    }

    fn add_location(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    fn prepend_location(&mut self, path: PathBuf) {
        self.paths.insert(0, path);
    }

    fn add_namespace(&mut self, namespace: &str, hints: Vec<PathBuf>) {
        self.hints
            .entry(namespace.to_string())
            .or_default()
            .extend(hints);
    }
}

/// Theme-aware finder wrapping a default finder
#[derive(Debug, Clone)]
pub struct ThemeViewFinder<F: ViewFinder = FileViewFinder> {
    fallback: F,
    themes_root: PathBuf,
    views_dir: String,
    theme: String,
    admin_theme: String,
    theme_paths: Vec<PathBuf>,
}

impl<F: ViewFinder> ThemeViewFinder<F> {
    /// Finder using the configured default front and admin themes
    pub fn new(fallback: F, config: &ThemesConfig) -> Self {
        Self {
            fallback,
            themes_root: config.path.clone(),
            views_dir: config.structure.views.clone(),
            theme: config.default.clone(),
            admin_theme: config.admin_default.clone(),
            theme_paths: Vec::new(),
        }
    }

    /// Activate `theme` and put its views ahead of the default search paths
    pub fn set_theme(&mut self, theme: &Theme) -> &mut Self {
        self.theme = theme.name().to_string();

        let views = theme.views_dir();
        if views.is_dir() && !self.theme_paths.contains(&views) {
            self.fallback.prepend_location(views.clone());
            self.theme_paths.push(views);
        }
        self
    }

    pub fn set_admin_theme(&mut self, name: &str) -> &mut Self {
        self.admin_theme = name.to_string();
        self
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn admin_theme(&self) -> &str {
        &self.admin_theme
    }

    pub fn fallback(&self) -> &F {
        &self.fallback
    }

    /// Theme files tried for `name`, in order; empty for default views
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        match ViewName::parse(name) {
            ViewName::Theme(view) => self.theme_candidates(&self.theme, &view),
            ViewName::AdminTheme(view) => self.theme_candidates(&self.admin_theme, &view),
            ViewName::Module { module, view } => {
                self.module_candidates(&self.theme, &module, &view)
            }
            ViewName::AdminModule { module, view } => {
                self.module_candidates(&self.admin_theme, &module, &view)
            }
            ViewName::Default(_) => Vec::new(),
        }
    }

    fn theme_candidates(&self, theme: &str, view: &str) -> Vec<PathBuf> {
        let root = self.themes_root.join(theme);
        let views = root.join(&self.views_dir);
        let mut candidates = Vec::with_capacity(3);

        if view.starts_with('/') {
            candidates.push(template(&views, view));
        }
        if let Some(segments) = structured_segments(view, 2..=3) {
            candidates.push(template(&root, &segments.join("/")));
        }
        candidates.push(template(&views, &view.replace('.', "/")));

        dedup(candidates)
    }

    fn module_candidates(&self, theme: &str, module: &str, view: &str) -> Vec<PathBuf> {
        let root = self.themes_root.join(theme);
        let module_views = root.join(&self.views_dir).join(MODULES_DIR).join(module);
        let mut candidates = Vec::with_capacity(3);

        if view.starts_with('/') {
            candidates.push(template(&module_views, view));
        }
        if let Some(segments) = structured_segments(view, 2..=usize::MAX) {
            candidates.push(template(&root.join(module), &segments.join("/")));
        }
        candidates.push(template(&module_views, &view.replace('.', "/")));

        dedup(candidates)
    }
}

impl<F: ViewFinder> ViewFinder for ThemeViewFinder<F> {
    fn find(&self, name: &str) -> Result<PathBuf, ExtError> {
        let parsed = ViewName::parse(name);
        if let ViewName::Default(_) = parsed {
            return self.fallback.find(name);
        }

        if let Some(found) = self.candidates(name).into_iter().find(|c| {
            trace!(candidate = %c.display(), "trying view candidate");
            c.is_file()
        }) {
            return Ok(found);
        }

        match parsed {
            ViewName::Theme(view) => Err(ExtError::ThemeViewNotFound {
                view,
                theme: self.theme.clone(),
            }),
            ViewName::AdminTheme(view) => Err(ExtError::AdminThemeViewNotFound {
                view,
                theme: self.admin_theme.clone(),
            }),
            ViewName::Module { .. } | ViewName::AdminModule { .. } | ViewName::Default(_) => {
                self.fallback.find(name)
            }
        }
    }

    fn add_location(&mut self, path: PathBuf) {
        self.fallback.add_location(path);
    }

    fn prepend_location(&mut self, path: PathBuf) {
        self.fallback.prepend_location(path);
    }

    fn add_namespace(&mut self, namespace: &str, hints: Vec<PathBuf>) {
        self.fallback.add_namespace(namespace, hints);
    }
}

/// `<base>/<relative>.blade.php`; a leading `/` on `relative` is ignored
fn template(base: &Path, relative: &str) -> PathBuf {
    base.join(format!(
        "{}{}",
        relative.trim_start_matches('/'),
        VIEW_SUFFIX
    ))
}

/// Dotted segments when their count falls in `range` and none is empty
fn structured_segments(view: &str, range: std::ops::RangeInclusive<usize>) -> Option<Vec<&str>> {
    if view.starts_with('/') {
        return None;
    }
    let segments: Vec<&str> = view.split('.').collect();
    if range.contains(&segments.len()) && segments.iter().all(|s| !s.is_empty()) {
        Some(segments)
    } else {
        None
    }
}

fn dedup(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut unique: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for path in paths {
        if !unique.contains(&path) {
            unique.push(path);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs;
    use tempfile::TempDir;

    /// Fallback that records how often it was consulted
    #[derive(Default)]
    struct CountingFinder {
        calls: Cell<usize>,
        answer: Option<PathBuf>,
        prepended: Vec<PathBuf>,
    }

    impl ViewFinder for CountingFinder {
        fn find(&self, name: &str) -> Result<PathBuf, ExtError> {
            self.calls.set(self.calls.get() + 1);
            self.answer.clone().ok_or_else(|| ExtError::ViewNotFound {
                view: name.to_string(),
            })
        }

        fn add_location(&mut self, _path: PathBuf) {}

        fn prepend_location(&mut self, path: PathBuf) {
            self.prepended.push(path);
        }

        fn add_namespace(&mut self, _namespace: &str, _hints: Vec<PathBuf>) {}
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<div></div>").unwrap();
    }

    fn themes_config(root: &Path) -> ThemesConfig {
        ThemesConfig {
            path: root.join("themes"),
            ..ThemesConfig::default()
        }
    }

    // ==================== ViewName::parse tests ====================

    #[test]
    fn test_parse_theme() {
        assert_eq!(
            ViewName::parse("theme::layouts.default"),
            ViewName::Theme("layouts.default".to_string())
        );
    }

    #[test]
    fn test_parse_admin_theme() {
        assert_eq!(
            ViewName::parse("admin::index"),
            ViewName::AdminTheme("index".to_string())
        );
    }

    #[test]
    fn test_parse_module() {
        assert_eq!(
            ViewName::parse("blog::index.index"),
            ViewName::Module {
                module: "blog".to_string(),
                view: "index.index".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_admin_module_strips_segment() {
        assert_eq!(
            ViewName::parse("blog::admin.post.edit"),
            ViewName::AdminModule {
                module: "blog".to_string(),
                view: "post.edit".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_default() {
        assert_eq!(
            ViewName::parse("welcome"),
            ViewName::Default("welcome".to_string())
        );
    }

    // ==================== FileViewFinder tests ====================

    #[test]
    fn test_file_finder_searches_paths_in_order() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        touch(&second.join("pages/home.blade.php"));
        touch(&first.join("pages/home.php"));

        let finder = FileViewFinder::new(
            vec![first.clone(), second],
            vec!["blade.php".to_string(), "php".to_string()],
        );
        assert_eq!(finder.find("pages.home").unwrap(), first.join("pages/home.php"));
    }

    #[test]
    fn test_file_finder_namespace_hints() {
        let temp = TempDir::new().unwrap();
        let hint = temp.path().join("blog-views");
        touch(&hint.join("index.blade.php"));

        let mut finder = FileViewFinder::from_config(&ViewsConfig::default());
        finder.add_namespace("blog", vec![hint.clone()]);

        assert_eq!(finder.find("blog::index").unwrap(), hint.join("index.blade.php"));
        assert!(matches!(
            finder.find("shop::index"),
            Err(ExtError::NoViewHint { .. })
        ));
    }

    #[test]
    fn test_file_finder_not_found() {
        let temp = TempDir::new().unwrap();
        let finder = FileViewFinder::new(vec![temp.path().to_path_buf()], vec!["blade.php".to_string()]);
        match finder.find("missing") {
            Err(ExtError::ViewNotFound { view }) => assert_eq!(view, "missing"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_file_finder_prepend_location() {
        let mut finder = FileViewFinder::new(vec![PathBuf::from("/b")], Vec::new());
        finder.prepend_location(PathBuf::from("/a"));
        finder.add_location(PathBuf::from("/c"));
        assert_eq!(
            finder.paths(),
            &[PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")]
        );
    }

    // ==================== theme:: tests ====================

    #[test]
    fn test_theme_view_generic_candidate() {
        let temp = TempDir::new().unwrap();
        let config = themes_config(temp.path());
        let file = config.path.join("default/views/layouts/default.blade.php");
        touch(&file);

        let finder = ThemeViewFinder::new(CountingFinder::default(), &config);
        assert_eq!(finder.find("theme::layouts.default").unwrap(), file);
        assert_eq!(finder.fallback().calls.get(), 0);
    }

    #[test]
    fn test_theme_view_structured_candidate_wins_over_generic() {
        let temp = TempDir::new().unwrap();
        let config = themes_config(temp.path());
        let structured = config.path.join("default/home/index.blade.php");
        let generic = config.path.join("default/views/home/index.blade.php");
        touch(&structured);
        touch(&generic);

        let finder = ThemeViewFinder::new(CountingFinder::default(), &config);
        assert_eq!(finder.find("theme::home.index").unwrap(), structured);
    }

    #[test]
    fn test_theme_view_absolute_style_name() {
        let temp = TempDir::new().unwrap();
        let config = themes_config(temp.path());
        let file = config.path.join("default/views/partials/nav.blade.php");
        touch(&file);

        let finder = ThemeViewFinder::new(CountingFinder::default(), &config);
        assert_eq!(finder.find("theme::/partials/nav").unwrap(), file);
    }

    #[test]
    fn test_theme_view_missing_is_hard_error() {
        let temp = TempDir::new().unwrap();
        let config = themes_config(temp.path());
        let fallback = CountingFinder {
            answer: Some(PathBuf::from("/never/used.blade.php")),
            ..CountingFinder::default()
        };

        let finder = ThemeViewFinder::new(fallback, &config);
        match finder.find("theme::home.index") {
            Err(ExtError::ThemeViewNotFound { view, theme }) => {
                assert_eq!(view, "home.index");
                assert_eq!(theme, "default");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(finder.fallback().calls.get(), 0);
    }

    #[test]
    fn test_admin_theme_view_uses_admin_theme() {
        let temp = TempDir::new().unwrap();
        let config = themes_config(temp.path());
        let file = config.path.join("admin_blue/views/form.blade.php");
        touch(&file);

        let mut finder = ThemeViewFinder::new(CountingFinder::default(), &config);
        finder.set_admin_theme("admin_blue");
        assert_eq!(finder.find("admin::form").unwrap(), file);

        finder.set_admin_theme("admin_default");
        let err = finder.find("admin::form").unwrap_err();
        assert_eq!(
            err.to_string(),
            "View [form] not found in admin theme [admin_default]."
        );
    }

    // ==================== module view tests ====================

    #[test]
    fn test_module_view_structured_path_skips_fallback() {
        let temp = TempDir::new().unwrap();
        let config = themes_config(temp.path());
        let file = config.path.join("default/blog/index/index.blade.php");
        touch(&file);

        let finder = ThemeViewFinder::new(CountingFinder::default(), &config);
        assert_eq!(finder.find("blog::index.index").unwrap(), file);
        assert_eq!(finder.fallback().calls.get(), 0);
    }

    #[test]
    fn test_module_view_theme_modules_directory() {
        let temp = TempDir::new().unwrap();
        let config = themes_config(temp.path());
        let file = config.path.join("default/views/modules/blog/index.blade.php");
        touch(&file);

        let finder = ThemeViewFinder::new(CountingFinder::default(), &config);
        assert_eq!(finder.find("blog::index").unwrap(), file);
    }

    #[test]
    fn test_module_view_falls_back_to_default_finder() {
        let temp = TempDir::new().unwrap();
        let config = themes_config(temp.path());
        let fallback = CountingFinder {
            answer: Some(PathBuf::from("/app/Blog/Views/index.blade.php")),
            ..CountingFinder::default()
        };

        let finder = ThemeViewFinder::new(fallback, &config);
        assert_eq!(
            finder.find("blog::index").unwrap(),
            PathBuf::from("/app/Blog/Views/index.blade.php")
        );
        assert_eq!(finder.fallback().calls.get(), 1);
    }

    #[test]
    fn test_module_view_fallback_error_propagates() {
        let temp = TempDir::new().unwrap();
        let config = themes_config(temp.path());
        let finder = ThemeViewFinder::new(CountingFinder::default(), &config);

        assert!(matches!(
            finder.find("blog::missing"),
            Err(ExtError::ViewNotFound { .. })
        ));
    }

    #[test]
    fn test_admin_module_view_uses_admin_theme() {
        let temp = TempDir::new().unwrap();
        let config = themes_config(temp.path());
        let file = config.path.join("admin_default/views/modules/blog/posts.blade.php");
        touch(&file);

        let finder = ThemeViewFinder::new(CountingFinder::default(), &config);
        assert_eq!(finder.find("blog::admin.posts").unwrap(), file);
    }

    #[test]
    fn test_module_fallback_with_real_finder_and_hints() {
        let temp = TempDir::new().unwrap();
        let config = themes_config(temp.path());
        let module_views = temp.path().join("app/Blog/Views");
        touch(&module_views.join("index.blade.php"));

        let mut finder = ThemeViewFinder::new(FileViewFinder::from_config(&ViewsConfig::default()), &config);
        finder.add_namespace("blog", vec![module_views.clone()]);

        assert_eq!(
            finder.find("blog::index").unwrap(),
            module_views.join("index.blade.php")
        );
    }

    // ==================== default & set_theme tests ====================

    #[test]
    fn test_default_view_delegates() {
        let temp = TempDir::new().unwrap();
        let config = themes_config(temp.path());
        let finder = ThemeViewFinder::new(CountingFinder::default(), &config);

        assert!(finder.find("welcome").is_err());
        assert_eq!(finder.fallback().calls.get(), 1);
        assert!(finder.candidates("welcome").is_empty());
    }

    #[test]
    fn test_set_theme_prepends_views_once() {
        let temp = TempDir::new().unwrap();
        let config = themes_config(temp.path());
        fs::create_dir_all(config.path.join("dark/views")).unwrap();
        let dark = Theme::new("dark", &config);
        let ghost = Theme::new("ghost", &config);

        let mut finder = ThemeViewFinder::new(CountingFinder::default(), &config);
        finder.set_theme(&dark).set_theme(&dark);
        finder.set_theme(&ghost);

        assert_eq!(finder.theme(), "ghost");
        assert_eq!(finder.fallback().prepended, vec![config.path.join("dark/views")]);
    }

    #[test]
    fn test_set_theme_makes_theme_views_default_searchable() {
        let temp = TempDir::new().unwrap();
        let config = themes_config(temp.path());
        let file = config.path.join("dark/views/welcome.blade.php");
        touch(&file);

        let mut finder = ThemeViewFinder::new(
            FileViewFinder::new(Vec::new(), vec!["blade.php".to_string()]),
            &config,
        );
        finder.set_theme(&Theme::new("dark", &config));

        assert_eq!(finder.find("welcome").unwrap(), file);
    }

    #[test]
    fn test_candidates_order() {
        let temp = TempDir::new().unwrap();
        let config = themes_config(temp.path());
        let finder = ThemeViewFinder::new(CountingFinder::default(), &config);
        let root = config.path.join("default");

        assert_eq!(
            finder.candidates("theme::blog.post.show"),
            vec![
                root.join("blog/post/show.blade.php"),
                root.join("views/blog/post/show.blade.php"),
            ]
        );
        assert_eq!(
            finder.candidates("theme::index"),
            vec![root.join("views/index.blade.php")]
        );
        assert_eq!(
            finder.candidates("blog::/index"),
            vec![root.join("views/modules/blog/index.blade.php")]
        );
    }
}
