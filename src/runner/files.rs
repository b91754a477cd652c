//! Glob expansion of source patterns
//!
//! Patterns apply left to right. A pattern starting with `!` removes matching
//! entries accumulated so far; any other pattern appends matches that are not
//! already present. Missing directories simply match nothing.

use crate::error::{AdapterError, AdapterResult};
use crate::runner::Context;
use glob::MatchOptions;
use globset::{GlobBuilder, GlobMatcher};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

/// One file mapping of a target, after template resolution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileMapping {
    /// Directory the source patterns are relative to
    pub cwd: Option<String>,

    /// Source patterns
    pub src: Vec<String>,

    /// Destination file, or directory when `expand` is set
    pub dest: Option<String>,

    /// Produce one pair per matched source
    pub expand: bool,

    /// Drop the source directories from expanded destinations
    pub flatten: bool,

    /// Replace the extension of expanded destinations
    pub ext: Option<String>,
}

/// A resolved source list and where it goes
#[derive(Debug, Clone, PartialEq)]
pub struct FilePair {
    pub src: Vec<PathBuf>,
    pub dest: Option<PathBuf>,
    /// The destination was written with a trailing `/`
    pub dest_is_dir: bool,
}

impl FilePair {
    /// Sources that exist as regular files
    pub fn existing_files(&self) -> impl Iterator<Item = &PathBuf> {
        self.src.iter().filter(|p| p.is_file())
    }

    /// Destination label for messages
    pub fn label(&self) -> String {
        match &self.dest {
            Some(dest) => dest.display().to_string(),
            None => self
                .src
                .first()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Expand patterns against `base_dir`, returning paths relative to it
pub fn expand(base_dir: &Path, patterns: &[String]) -> AdapterResult<Vec<PathBuf>> {
    let mut unmatched = Vec::new();
    expand_collecting(base_dir, patterns, &mut unmatched)
}

/// Expand every mapping of a target into file pairs rooted at the project directory
pub fn expand_mappings(ctx: &Context, mappings: &[FileMapping]) -> AdapterResult<Vec<FilePair>> {
    let base = ctx.base_dir.as_path();
    let mut pairs = Vec::new();
    let mut unmatched = Vec::new();

    for mapping in mappings {
        let cwd = match &mapping.cwd {
            Some(cwd) => base.join(cwd),
            None => base.to_path_buf(),
        };
        let matched = expand_collecting(&cwd, &mapping.src, &mut unmatched)?;

        if mapping.expand {
            for rel in matched {
                let mut dest_rel = if mapping.flatten {
                    rel.file_name().map(PathBuf::from).unwrap_or_else(|| rel.clone())
                } else {
                    rel.clone()
                };
                if let Some(ext) = &mapping.ext {
                    dest_rel = replace_extension(&dest_rel, ext);
                }
                let dest = match &mapping.dest {
                    Some(dest) => base.join(dest).join(&dest_rel),
                    None => base.join(&dest_rel),
                };
                pairs.push(FilePair {
                    src: vec![cwd.join(&rel)],
                    dest: Some(dest),
                    dest_is_dir: false,
                });
            }
        } else {
            pairs.push(FilePair {
                src: matched.iter().map(|rel| cwd.join(rel)).collect(),
                dest: mapping.dest.as_ref().map(|dest| base.join(dest)),
                dest_is_dir: mapping.dest.as_ref().is_some_and(|d| d.ends_with('/')),
            });
        }
    }

    for pattern in unmatched {
        ctx.print_debug(&format!("Pattern '{}' matched no files", pattern));
    }

    Ok(pairs)
}

fn expand_collecting(
    base_dir: &Path,
    patterns: &[String],
    unmatched: &mut Vec<String>,
) -> AdapterResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for pattern in patterns {
        if let Some(excluded) = pattern.strip_prefix('!') {
            let matcher = exclusion_matcher(excluded)?;
            files.retain(|file| {
                if matcher.is_match(file) {
                    seen.remove(file);
                    false
                } else {
                    true
                }
            });
            continue;
        }

        let matches = glob_relative(base_dir, pattern)?;
        if matches.is_empty() {
            unmatched.push(pattern.clone());
        }
        for path in matches {
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }

    Ok(files)
}

fn glob_relative(base_dir: &Path, pattern: &str) -> AdapterResult<Vec<PathBuf>> {
    let full = if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        format!(
            "{}/{}",
            glob::Pattern::escape(&base_dir.to_string_lossy()),
            pattern
        )
    };

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let entries = glob::glob_with(&full, options).map_err(|e| AdapterError::Pattern {
        pattern: pattern.to_string(),
        error: e.to_string(),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                let path = e.path().to_path_buf();
                return Err(AdapterError::read(path, io::Error::from(e)));
            }
        };
        let rel = path
            .strip_prefix(base_dir)
            .map(Path::to_path_buf)
            .unwrap_or(path);
        paths.push(rel);
    }
    Ok(paths)
}

fn exclusion_matcher(pattern: &str) -> AdapterResult<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| AdapterError::Pattern {
            pattern: format!("!{}", pattern),
            error: e.to_string(),
        })
}

/// Replace everything after the first `.` of the file name with `ext`
fn replace_extension(path: &Path, ext: &str) -> PathBuf {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return path.to_path_buf();
    };
    let stem = name.split('.').next().unwrap_or(&name);
    let ext = if ext.is_empty() || ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    };
    path.with_file_name(format!("{}{}", stem, ext))
}
