//! `make:module` and `make:theme` generators.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::ExtError;
use crate::module::MODULE_MANIFEST;
use crate::stubs::{self, StubKind, Stubs};
use crate::theme::THEME_MANIFEST;

/// Prefix carried by every admin theme name
pub const ADMIN_THEME_PREFIX: &str = "admin_";

/// What a generator created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldReport {
    pub name: String,
    pub path: PathBuf,
    pub directories: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
}

impl ScaffoldReport {
    fn new(name: String, path: PathBuf) -> Self {
        Self {
            name,
            path,
            directories: Vec::new(),
            files: Vec::new(),
        }
    }

    fn create_dir(&mut self, path: PathBuf) -> Result<(), ExtError> {
        if !path.is_dir() {
            fs::create_dir_all(&path).map_err(|source| ExtError::CreateDirFailed {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "created directory");
        }
        self.directories.push(path);
        Ok(())
    }

    fn write(&mut self, path: PathBuf, contents: &str) -> Result<(), ExtError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| ExtError::CreateDirFailed {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        fs::write(&path, contents).map_err(|source| ExtError::WriteFailed {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "wrote file");
        self.files.push(path);
        Ok(())
    }
}

/// Generate a module skeleton under the configured module root
pub fn make_module(settings: &Settings, name: &str) -> Result<ScaffoldReport, ExtError> {
    let name = studly(name);
    ensure_valid(&name, |c| c.is_ascii_alphanumeric())?;

    let modules = &settings.modules;
    let structure = &modules.structure;
    ensure_root(&modules.path)?;

    let path = modules.path.join(&name);
    if path.exists() {
        return Err(ExtError::ModuleExists { name, path });
    }

    let module_namespace = format!("{}\\{}", modules.namespace, name);
    let stubs = Stubs::new(modules.stubs_path.as_deref())
        .with("{{ModuleName}}", name.as_str())
        .with("{{moduleName}}", camel(&name))
        .with("{{module_name}}", snake(&name))
        .with("{{module_route}}", name.to_lowercase())
        .with(
            "{{ControllersNamespace}}",
            namespace_of(&module_namespace, &structure.controllers),
        )
        .with(
            "{{ProvidersNamespace}}",
            namespace_of(&module_namespace, &structure.providers),
        )
        .with("{{ModuleRoot}}", module_root_expr(&structure.providers))
        .with("{{RoutesDir}}", structure.routes.as_str())
        .with("{{ViewsDir}}", structure.views.as_str())
        .with("{{MigrationsDir}}", structure.migrations.as_str());

    let mut report = ScaffoldReport::new(name.clone(), path.clone());
    report.create_dir(path.clone())?;
    for dir in structure.directories() {
        report.create_dir(path.join(dir))?;
    }

    let routes = path.join(&structure.routes);
    report.write(routes.join("web.php"), &stubs.render(StubKind::WebRoutes)?)?;
    report.write(routes.join("api.php"), &stubs.render(StubKind::ApiRoutes)?)?;
    report.write(
        path.join(&structure.providers)
            .join(format!("{name}ServiceProvider.php")),
        &stubs.render(StubKind::Provider)?,
    )?;
    report.write(
        path.join(&structure.controllers)
            .join(format!("{name}Controller.php")),
        &stubs.render(StubKind::Controller)?,
    )?;
    report.write(path.join(MODULE_MANIFEST), &stubs.render(StubKind::Manifest)?)?;
    report.write(path.join("hooks.php"), &stubs.render(StubKind::Hooks)?)?;

    let index = path.join(&structure.views).join("index.blade.php");
    if !index.exists() {
        report.write(index, &stubs.render(StubKind::View)?)?;
    }

    info!(module = %name, path = %path.display(), "module created");
    Ok(report)
}

/// Generate a theme skeleton under the configured theme root
///
/// An existing theme is left untouched unless `force` is set, in which case
/// it is removed before the new skeleton is written.
pub fn make_theme(
    settings: &Settings,
    name: &str,
    admin: bool,
    force: bool,
) -> Result<ScaffoldReport, ExtError> {
    let mut name = kebab(name);
    ensure_valid(&name, |c| c.is_ascii_alphanumeric() || c == '-' || c == '_')?;
    if admin && !name.starts_with(ADMIN_THEME_PREFIX) {
        name = format!("{ADMIN_THEME_PREFIX}{name}");
    }

    let themes = &settings.themes;
    let structure = &themes.structure;
    ensure_root(&themes.path)?;

    let path = themes.path.join(&name);
    if path.exists() {
        if !force {
            return Err(ExtError::ThemeExists { name, path });
        }
        warn!(theme = %name, "replacing existing theme");
        fs::remove_dir_all(&path).map_err(|source| ExtError::WriteFailed {
            path: path.clone(),
            source,
        })?;
    }

    let stubs = Stubs::new(None)
        .with("{{ThemeName}}", name.as_str())
        .with("{{ThemeTitle}}", upper_first(&name));

    let assets = path.join(&structure.assets);
    let views = path.join(&structure.views);

    let mut report = ScaffoldReport::new(name.clone(), path.clone());
    for dir in [
        path.clone(),
        assets.join("images"),
        assets.join("css"),
        assets.join("js"),
        views.clone(),
        views.join("modules"),
        views.join("layouts"),
        path.join("lang"),
        path.join(&structure.config),
    ] {
        report.create_dir(dir)?;
    }

    report.write(path.join(THEME_MANIFEST), &stubs.fill(stubs::THEME_JSON))?;
    report.write(assets.join("css/style.css"), stubs::THEME_STYLE)?;
    report.write(assets.join("js/app.js"), &stubs.fill(stubs::THEME_SCRIPT))?;

    let layout = stubs.fill(stubs::THEME_LAYOUT);
    if admin {
        report.write(views.join("layouts/admin.blade.php"), &layout)?;
        report.write(views.join("index.blade.php"), &stubs.fill(stubs::ADMIN_INDEX))?;
        report.write(views.join("form.blade.php"), stubs::ADMIN_FORM)?;
    } else {
        report.write(views.join("layouts/default.blade.php"), &layout)?;
        report.write(views.join("index.blade.php"), &stubs.fill(stubs::THEME_INDEX))?;
    }

    info!(theme = %name, admin, path = %path.display(), "theme created");
    Ok(report)
}

fn ensure_root(root: &Path) -> Result<(), ExtError> {
    if !root.is_dir() {
        fs::create_dir_all(root).map_err(|source| ExtError::CreateDirFailed {
            path: root.to_path_buf(),
            source,
        })?;
        info!(path = %root.display(), "created root directory");
    }
    Ok(())
}

fn ensure_valid(name: &str, allowed: impl Fn(char) -> bool) -> Result<(), ExtError> {
    if name.is_empty() || !name.chars().all(allowed) {
        return Err(ExtError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// `App\Blog` + `Http/Controllers` -> `App\Blog\Http\Controllers`
fn namespace_of(module_namespace: &str, dir: &str) -> String {
    format!("{}\\{}", module_namespace, dir.replace('/', "\\"))
}

/// PHP expression for the module root as seen from the providers directory
fn module_root_expr(providers_dir: &str) -> String {
    let depth = providers_dir.split('/').filter(|s| !s.is_empty()).count();
    format!("dirname(__DIR__, {})", depth.max(1))
}

fn upper_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `blog-post` / `blog_post` / `blog post` -> `BlogPost`
pub fn studly(name: &str) -> String {
    name.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(upper_first)
        .collect()
}

/// `BlogPost` -> `blogPost`
pub fn camel(name: &str) -> String {
    let studly = studly(name);
    let mut chars = studly.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `BlogPost` -> `blog_post`
pub fn snake(name: &str) -> String {
    delimit(name, '_')
}

/// `BlueSky` / `blue sky` -> `blue-sky`
pub fn kebab(name: &str) -> String {
    delimit(name, '-')
}

fn delimit(name: &str, delimiter: char) -> String {
    let squashed: String = name.split_whitespace().map(upper_first).collect();
    let mut out = String::with_capacity(squashed.len() + 4);
    for (i, c) in squashed.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            out.push(delimiter);
        }
        out.extend(c.to_lowercase());
    }
    out
}
