//! Priority-ordered hook bus.
//!
//! Listeners subscribe to a named event with a priority; lower numbers run
//! first and equal priorities run in registration order. Firing threads the
//! payload through every listener: a listener that returns `Some` replaces
//! the running value, one that returns `None` leaves it untouched.
//!
//! The bus is an ordinary value owned by the application bootstrap and
//! handed to the components that publish or subscribe.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde_json::Value;
use tracing::trace;

/// Priority used when the caller has no preference
pub const DEFAULT_PRIORITY: i32 = 10;

/// Event names published by module and theme lifecycle code
pub mod events {
    pub const MODULES_INIT: &str = "modules.init";
    pub const MODULES_BOOT: &str = "modules.boot";
    pub const MODULES_DISCOVER_BEFORE: &str = "modules.discover.before";
    pub const MODULES_DISCOVER_AFTER: &str = "modules.discover.after";
    pub const MODULE_DISCOVERED: &str = "module.discovered";
    pub const MODULE_BOOT_BEFORE: &str = "module.boot.before";
    pub const MODULE_BOOT_AFTER: &str = "module.boot.after";
    pub const MODULE_BOOT_FAILED: &str = "module.boot.failed";
    pub const MODULE_LOAD_BEFORE: &str = "module.load.before";
    pub const MODULE_LOAD_AFTER: &str = "module.load.after";
    pub const MODULE_INSTALL_BEFORE: &str = "module.install.before";
    pub const MODULE_INSTALL_AFTER: &str = "module.install.after";
    pub const MODULE_UNINSTALL_BEFORE: &str = "module.uninstall.before";
    pub const MODULE_UNINSTALL_AFTER: &str = "module.uninstall.after";
    pub const MODULE_ENABLED: &str = "module.enabled";
    pub const MODULE_DISABLED: &str = "module.disabled";
    pub const MODULE_HOOKS_REGISTERED: &str = "module.hooks.registered";
}

/// Handle returned by [`HookBus::listen`], used to remove a single listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Box<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

struct Listener {
    id: ListenerId,
    callback: Callback,
}

/// Registry of hook listeners keyed by event name
#[derive(Default)]
pub struct HookBus {
    listeners: HashMap<String, BTreeMap<i32, Vec<Listener>>>,
    next_id: u64,
}

impl fmt::Debug for HookBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<(&str, usize)> = self
            .listeners
            .keys()
            .map(|event| (event.as_str(), self.listener_count(event)))
            .collect();
        counts.sort_unstable();
        f.debug_struct("HookBus").field("listeners", &counts).finish()
    }
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `callback` to `event`
    pub fn listen<F>(&mut self, event: &str, priority: i32, callback: F) -> ListenerId
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;

        self.listeners
            .entry(event.to_string())
            .or_default()
            .entry(priority)
            .or_default()
            .push(Listener {
                id,
                callback: Box::new(callback),
            });

        id
    }

    /// Remove one listener, or every listener of `event` when `id` is `None`
    pub fn remove_listener(&mut self, event: &str, id: Option<ListenerId>) {
        let Some(id) = id else {
            self.listeners.remove(event);
            return;
        };

        let Some(buckets) = self.listeners.get_mut(event) else {
            return;
        };

        for bucket in buckets.values_mut() {
            bucket.retain(|listener| listener.id != id);
        }
        buckets.retain(|_, bucket| !bucket.is_empty());

        if buckets.is_empty() {
            self.listeners.remove(event);
        }
    }

    /// Run every listener of `event` in priority order, chaining return values
    pub fn fire(&self, event: &str, payload: Value) -> Value {
        trace!(hook = %format!("modules.hook.{event}"), "firing hook");

        let mut result = payload;
        for listener in self.ordered(event) {
            if let Some(value) = (listener.callback)(&result) {
                result = value;
            }
        }
        result
    }

    /// Return the first `Some` produced by a listener of `event`
    ///
    /// Every listener sees the original payload. When no listener answers,
    /// the payload itself is returned.
    pub fn one(&self, event: &str, payload: Value) -> Value {
        for listener in self.ordered(event) {
            if let Some(value) = (listener.callback)(&payload) {
                return value;
            }
        }
        payload
    }

    pub fn has_listeners(&self, event: &str) -> bool {
        self.listeners.contains_key(event)
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .get(event)
            .map(|buckets| buckets.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Names of events with at least one listener, sorted
    pub fn events(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.listeners.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn ordered<'a>(&'a self, event: &str) -> impl Iterator<Item = &'a Listener> + 'a {
        self.listeners
            .get(event)
            .into_iter()
            .flat_map(|buckets| buckets.values())
            .flatten()
    }
}
