//! Execution context for task running
//!
//! The context carries what every adapter needs besides its own target:
//! the project directory and how chatty to be.

use crate::ui;
use std::env;
use std::path::{Path, PathBuf};

/// Execution context shared by the runner and adapters
#[derive(Debug, Clone)]
pub struct Context {
    /// Project directory; every pattern and path is relative to it
    pub base_dir: PathBuf,

    /// Buildfile path
    pub config_path: Option<PathBuf>,

    /// Verbosity level
    pub verbosity: Verbosity,
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

impl Context {
    /// Create a new context rooted at the current directory
    pub fn new() -> Self {
        Context {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_path: None,
            verbosity: Verbosity::Normal,
        }
    }

    /// Create a context with a specific project directory
    pub fn with_base_dir(mut self, dir: PathBuf) -> Self {
        self.base_dir = dir;
        self
    }

    /// Set the buildfile path
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    /// Set verbosity level
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Path relative to the project directory, for messages
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.base_dir)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{}", ui::info(message));
        }
    }

    /// Print warning message
    pub fn print_warn(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{}", ui::warn(message));
        }
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        if self.verbosity >= Verbosity::Quiet {
            eprintln!("{}", ui::error(message));
        }
    }

    /// Print debug message (only in verbose mode)
    pub fn print_debug(&self, message: &str) {
        if self.verbosity >= Verbosity::Verbose {
            eprintln!("{}", ui::debug(message));
        }
    }

    /// Report a file written by an adapter
    pub fn print_created(&self, path: &Path) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{}", ui::created(&self.display_path(path)));
        }
    }

    /// Print task start message
    pub fn print_task_start(&self, task_name: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("\n{}", ui::task_header(task_name));
        }
    }

    /// Print task complete message
    pub fn print_task_complete(&self, task_name: &str) {
        self.print_debug(&format!("Task completed: {}", task_name));
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_new() {
        let ctx = Context::new();
        assert_eq!(ctx.verbosity, Verbosity::Normal);
        assert!(ctx.config_path.is_none());
    }

    #[test]
    fn test_verbosity_levels() {
        assert!(Verbosity::Verbose > Verbosity::Normal);
        assert!(Verbosity::Normal > Verbosity::Quiet);
        assert!(Verbosity::Quiet > Verbosity::Silent);
    }

    #[test]
    fn test_with_verbosity() {
        let ctx = Context::new().with_verbosity(Verbosity::Verbose);
        assert_eq!(ctx.verbosity, Verbosity::Verbose);
    }

    #[test]
    fn test_display_path() {
        let ctx = Context::new().with_base_dir(PathBuf::from("/project"));
        assert_eq!(
            ctx.display_path(Path::new("/project/static/js/main.js")),
            "static/js/main.js"
        );
        assert_eq!(ctx.display_path(Path::new("/elsewhere/a.js")), "/elsewhere/a.js");
    }
}
