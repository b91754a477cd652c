//! Built-in adapters
//!
//! An adapter is a transformation bound to a leaf task. It receives one
//! resolved target and its expanded file pairs, and writes its outputs.
//! Adapters overwrite outputs unconditionally and create parent directories.

pub mod banner;
pub mod clean;
pub mod concat;
pub mod copy;
pub mod css;
pub mod cssmin;
pub mod docs;
pub mod fetch;
pub mod js_lexer;
pub mod jsmin;
pub mod legacy;
pub mod lint;
pub mod prefix;
pub mod stylesheet;
pub mod watch;

use crate::error::{AdapterError, AdapterResult};
use crate::runner::{Context, FilePair, TargetConfig};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// A transformation applied to one target
pub trait Adapter: Send + Sync {
    fn kind(&self) -> AdapterKind;

    /// Transform `files` according to `target`'s options
    fn apply(&self, ctx: &Context, target: &TargetConfig, files: &[FilePair]) -> AdapterResult<()>;
}

/// The closed set of built-in adapter kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    Fetch,
    Concat,
    Stylesheet,
    Prefix,
    Legacy,
    CssMin,
    JsMin,
    Banner,
    Copy,
    Lint,
    Docs,
    Clean,
    Watch,
}

impl AdapterKind {
    pub const ALL: [AdapterKind; 13] = [
        AdapterKind::Fetch,
        AdapterKind::Concat,
        AdapterKind::Stylesheet,
        AdapterKind::Prefix,
        AdapterKind::Legacy,
        AdapterKind::CssMin,
        AdapterKind::JsMin,
        AdapterKind::Banner,
        AdapterKind::Copy,
        AdapterKind::Lint,
        AdapterKind::Docs,
        AdapterKind::Clean,
        AdapterKind::Watch,
    ];

    /// Parse the buildfile `adapter:` value
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            AdapterKind::Fetch => "fetch",
            AdapterKind::Concat => "concat",
            AdapterKind::Stylesheet => "stylesheet",
            AdapterKind::Prefix => "prefix",
            AdapterKind::Legacy => "legacy",
            AdapterKind::CssMin => "cssmin",
            AdapterKind::JsMin => "jsmin",
            AdapterKind::Banner => "banner",
            AdapterKind::Copy => "copy",
            AdapterKind::Lint => "lint",
            AdapterKind::Docs => "docs",
            AdapterKind::Clean => "clean",
            AdapterKind::Watch => "watch",
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The built-in implementation of `kind`
pub fn for_kind(kind: AdapterKind) -> Arc<dyn Adapter> {
    match kind {
        AdapterKind::Fetch => Arc::new(fetch::Fetch),
        AdapterKind::Concat => Arc::new(concat::Concat),
        AdapterKind::Stylesheet => Arc::new(stylesheet::Stylesheet),
        AdapterKind::Prefix => Arc::new(prefix::Prefix),
        AdapterKind::Legacy => Arc::new(legacy::Legacy),
        AdapterKind::CssMin => Arc::new(cssmin::CssMin),
        AdapterKind::JsMin => Arc::new(jsmin::JsMin),
        AdapterKind::Banner => Arc::new(banner::Banner),
        AdapterKind::Copy => Arc::new(copy::CopyFiles),
        AdapterKind::Lint => Arc::new(lint::Lint),
        AdapterKind::Docs => Arc::new(docs::Docs),
        AdapterKind::Clean => Arc::new(clean::Clean),
        AdapterKind::Watch => Arc::new(watch::Watch),
    }
}

/// Read a source file as text
pub(crate) fn read_text(path: &Path) -> AdapterResult<String> {
    fs::read_to_string(path).map_err(|e| AdapterError::read(path, e))
}

/// Write an output file, creating its parent directories
pub(crate) fn write_text(ctx: &Context, path: &Path, contents: &str) -> AdapterResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| AdapterError::write(parent, e))?;
        }
    }
    fs::write(path, contents).map_err(|e| AdapterError::write(path, e))?;
    ctx.print_created(path);
    Ok(())
}

/// Read every existing source of a pair, warning about the missing ones
pub(crate) fn read_sources(ctx: &Context, pair: &FilePair) -> AdapterResult<Vec<String>> {
    let mut contents = Vec::new();
    for src in &pair.src {
        if src.is_file() {
            contents.push(read_text(src)?);
        } else if !src.exists() {
            ctx.print_warn(&format!(
                "Source file \"{}\" not found.",
                ctx.display_path(src)
            ));
        }
    }
    Ok(contents)
}

/// Output path of a one-to-one transformation: the dest, or the source in place
pub(crate) fn output_path<'a>(pair: &'a FilePair, src: &'a Path) -> &'a Path {
    match &pair.dest {
        Some(dest) => dest.as_path(),
        None => src,
    }
}

/// Resolve `.` and `..` lexically, without touching the disk
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
        assert_eq!(
            normalize_path(Path::new("src/vendor/../static/img")),
            PathBuf::from("src/static/img")
        );
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in AdapterKind::ALL {
            assert_eq!(AdapterKind::from_name(kind.name()), Some(kind));
            assert_eq!(for_kind(kind).kind(), kind);
        }
    }

    #[test]
    fn test_unknown_kind() {
        assert_eq!(AdapterKind::from_name("less"), None);
        assert_eq!(AdapterKind::from_name(""), None);
    }

    #[test]
    fn test_write_text_creates_parents() {
        let temp = tempfile::TempDir::new().unwrap();
        let ctx = Context::new()
            .with_base_dir(temp.path().to_path_buf())
            .with_verbosity(crate::runner::Verbosity::Silent);
        let out = temp.path().join("static/css/main.css");
        write_text(&ctx, &out, "a{}").unwrap();
        assert_eq!(read_text(&out).unwrap(), "a{}");
    }
}
