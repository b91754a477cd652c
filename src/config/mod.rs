//! Buildfile parsing, validation and template resolution
//!
//! This module handles discovery and parsing of brisk.yml buildfiles,
//! validation of their structure, and the template-aware config store.

pub mod parse;
pub mod schema;
pub mod store;
pub mod template;
pub mod types;

// Re-export main types
pub use parse::*;
pub use schema::*;
pub use store::*;
pub use template::Template;
pub use types::*;
