//! Task execution engine
//!
//! This module handles target normalization, file expansion, alias
//! resolution and the sequential runner.

pub mod context;
pub mod files;
pub mod registry;
pub mod run;
pub mod target;

// Re-export main types
pub use context::*;
pub use files::*;
pub use registry::*;
pub use run::*;
pub use target::*;
