//! Error types for Brisk

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Brisk operations
pub type Result<T> = std::result::Result<T, BriskError>;

/// Main error type for Brisk
#[derive(Error, Debug)]
pub enum BriskError {
    /// Buildfile and template errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task resolution errors
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// Failures reported by an adapter
    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The file watcher could not be started or stopped unexpectedly
    #[error("Watch error: {0}")]
    Watch(String),
}

/// Buildfile parsing, validation and template errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find buildfile (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Task '{task}' uses unknown adapter '{adapter}'")]
    UnknownAdapter { task: String, adapter: String },

    #[error("Invalid template '{template}': {reason}")]
    TemplateSyntax { template: String, reason: String },

    #[error("Template nesting too deep while resolving '{0}' (circular reference?)")]
    TemplateDepth(String),

    #[error("'{0}' is not defined")]
    UndefinedReference(String),

    #[error("Circular task alias detected: {0}")]
    CircularAlias(String),
}

/// Task resolution errors
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Task '{0}' is not defined")]
    Unknown(String),

    #[error("Circular task reference: {0}")]
    Cyclic(String),
}

/// Errors reported by adapters while transforming files
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No source files found for '{0}'")]
    NoInputFiles(String),

    #[error("Invalid glob pattern '{pattern}': {error}")]
    Pattern { pattern: String, error: String },

    #[error("Option '{0}' is required but not provided")]
    MissingOption(String),

    #[error("Invalid option value for '{name}': {error}")]
    InvalidOption { name: String, error: String },

    #[error("Failed to compile '{path}': {message}")]
    Stylesheet { path: PathBuf, message: String },

    #[error("Failed to parse '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("{0} lint problem(s) found")]
    Lint(usize),

    #[error("Refusing to delete '{0}' outside the project directory (set force: true)")]
    OutsideProject(PathBuf),

    #[error("{0}")]
    Unsupported(String),
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for task resolution
pub type TaskResult<T> = std::result::Result<T, TaskError>;

/// Specialized result type for adapters
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

impl AdapterError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        AdapterError::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        AdapterError::Write {
            path: path.into(),
            source,
        }
    }
}
