//! Brisk - A YAML-based static asset build runner
//!
//! Brisk reads a brisk.yml buildfile describing tasks, their targets and
//! aliases, and runs them through built-in adapters: concatenation,
//! stylesheet compilation and minification, banners, linting, copying,
//! documentation and watching.

// Public modules
pub mod adapters;
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod ui;
pub mod watch;

// Re-export commonly used types
pub use error::{BriskError, Result};

/// Current version of Brisk
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
