//! Request-scoped session state.

use std::collections::HashMap;

/// Session key holding the active front theme name
pub const CURRENT_THEME: &str = "current_theme";
/// Session key holding the active admin theme name
pub const CURRENT_ADMIN_THEME: &str = "current_admin_theme";
/// Session key remembering the front theme requested via query string
pub const REQUESTED_THEME: &str = "theme";
/// Session key remembering the admin theme requested via query string
pub const REQUESTED_ADMIN_THEME: &str = "admin_theme";

/// Key/value store for one client session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    values: HashMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn put(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn forget(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }
}
