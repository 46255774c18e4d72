use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::error::ExtError;
use crate::module::MODULE_MANIFEST;

/// Application directories that are never treated as modules
pub const EXCLUDED_DIRECTORIES: &[&str] = &[
    "Http",
    "Console",
    "Exceptions",
    "Providers",
    "Events",
    "Jobs",
    "Mail",
    "Notifications",
    "Policies",
    "Rules",
    "Models",
    "Middleware",
    "Listeners",
    "View",
    "Services",
];

/// Immediate subdirectories of `root`, sorted by name
///
/// A missing root yields an empty list.
pub fn subdirectories(root: &Path) -> Result<Vec<PathBuf>, ExtError> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut dirs = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| match e.into_io_error() {
            Some(io) => ExtError::Io(io),
            None => ExtError::Io(std::io::Error::other("filesystem loop")),
        })?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }

    Ok(dirs)
}

/// Whether `dir`'s name is on the reserved list
#[inline]
pub fn is_excluded(dir: &Path) -> bool {
    dir.file_name()
        .and_then(|name| name.to_str())
        .map(|name| EXCLUDED_DIRECTORIES.contains(&name))
        .unwrap_or(false)
}

/// Module candidates under `root`: non-reserved directories with a manifest
#[must_use = "this returns the module directories which should be processed"]
pub fn module_directories(root: &Path) -> Result<Vec<PathBuf>, ExtError> {
    let dirs = subdirectories(root)?;

    // Order is preserved by the indexed parallel iterator
    Ok(dirs
        .into_par_iter()
        .filter(|dir| !is_excluded(dir))
        .filter(|dir| dir.join(MODULE_MANIFEST).is_file())
        .collect())
}

/// Theme directories under `root`
pub fn theme_directories(root: &Path) -> Result<Vec<PathBuf>, ExtError> {
    subdirectories(root)
}

/// Final path component as an owned string
pub fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}
