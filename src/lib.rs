//! # CMF Extensions
//!
//! Module, theme and hook infrastructure for a PHP CMF.
//!
//! A project root holds self-describing module directories (each with a
//! `module.json` manifest) and theme directories under a public theme root.
//! This crate discovers and boots modules, dispatches hook events between
//! them, selects per-session themes and resolves theme-aware view names.
//!
//! ## Features
//!
//! - Priority-ordered hook bus with value-chaining listeners
//! - Parallel module discovery with per-module failure isolation
//! - Session-scoped front and admin theme selection
//! - `theme::`, `admin::` and `module::view` name resolution
//! - `make:module` / `make:theme` skeleton generators
//!
//! ## Usage
//!
//! ```ignore
//! use cmf_extensions::app::Application;
//! use cmf_extensions::config::Settings;
//!
//! let mut app = Application::new(Settings::load(&root, None)?);
//! let report = app.boot()?;
//! ```

/// Application bootstrap and boot lifecycle
pub mod app;

/// CLI arguments and project settings
pub mod config;

/// Error types for module, theme and view operations
pub mod error;

/// Hook bus
pub mod hook;

/// Subscriber setup for `tracing`
pub mod logging;

/// Module registry
pub mod manager;

/// Single module and its manifest
pub mod module;

/// Service provider registrars and the service container
pub mod provider;

/// Module and theme skeleton generators
pub mod scaffold;

/// Module and theme directory scanning
pub mod scanner;

/// Per-request key/value session
pub mod session;

/// Built-in scaffolding templates
pub mod stubs;

/// Themes and theme selection
pub mod theme;

/// View name resolution
pub mod view;
