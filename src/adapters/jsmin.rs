//! JavaScript minification
//!
//! Whitespace-and-comment removal over the token stream. Line breaks are
//! kept only where dropping them could change automatic semicolon insertion.

use crate::adapters::js_lexer::{self, is_word_byte, Token, TokenKind};
use crate::adapters::{output_path, read_text, write_text, Adapter, AdapterKind};
use crate::error::{AdapterError, AdapterResult};
use crate::runner::{Context, FilePair, TargetConfig};
use std::path::Path;

pub struct JsMin;

/// Which comments survive minification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreserveComments {
    None,
    /// Only `/*!` comments
    Some,
    All,
}

impl Adapter for JsMin {
    fn kind(&self) -> AdapterKind {
        AdapterKind::JsMin
    }

    fn apply(&self, ctx: &Context, target: &TargetConfig, files: &[FilePair]) -> AdapterResult<()> {
        let preserve = preserve_option(target)?;
        if target.bool_option("sourceMap", false)? {
            ctx.print_debug("Source maps are not generated");
        }

        for pair in files {
            let sources: Vec<_> = pair.existing_files().collect();
            if sources.is_empty() {
                return Err(AdapterError::NoInputFiles(pair.label()));
            }

            let mut chunks = Vec::new();
            for src in &sources {
                chunks.push(minify_file(src, preserve)?);
            }
            // a newline keeps each file's last statement terminated
            let output = chunks.join("\n");
            write_text(ctx, output_path(pair, sources[0]), &output)?;
        }
        Ok(())
    }
}

fn preserve_option(target: &TargetConfig) -> AdapterResult<PreserveComments> {
    match target.str_option("preserveComments")?.as_deref() {
        None | Some("false") | Some("none") => Ok(PreserveComments::None),
        Some("some") => Ok(PreserveComments::Some),
        Some("all") | Some("true") => Ok(PreserveComments::All),
        Some(other) => Err(AdapterError::InvalidOption {
            name: "preserveComments".to_string(),
            error: format!("expected some, all or false, got '{}'", other),
        }),
    }
}

fn minify_file(path: &Path, preserve: PreserveComments) -> AdapterResult<String> {
    let source = read_text(path)?;
    minify(&source, preserve).map_err(|e| AdapterError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Minify JavaScript source
pub fn minify(source: &str, preserve: PreserveComments) -> Result<String, js_lexer::LexError> {
    let tokens = js_lexer::tokenize(source)?;
    let mut out = String::with_capacity(source.len());
    let mut prev: Option<&Token> = None;

    for token in &tokens {
        if token.kind == TokenKind::Comment {
            if keep_comment(token.text, preserve) {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(token.text);
                out.push('\n');
                prev = None;
            }
            continue;
        }

        if let Some(p) = prev {
            if token.newline_before && breaks_statement(p, token) {
                out.push('\n');
            } else if needs_space(p, token) {
                out.push(' ');
            }
        }
        out.push_str(token.text);
        prev = Some(token);
    }

    Ok(out.trim_end().to_string())
}

fn keep_comment(text: &str, preserve: PreserveComments) -> bool {
    match preserve {
        PreserveComments::None => false,
        PreserveComments::Some => text.starts_with("/*!"),
        PreserveComments::All => true,
    }
}

/// Joining these two tokens without a separator would merge them
fn needs_space(prev: &Token, next: &Token) -> bool {
    let (Some(&last), Some(&first)) = (prev.text.as_bytes().last(), next.text.as_bytes().first())
    else {
        return false;
    };

    if is_word_byte(last) && is_word_byte(first) {
        return true;
    }
    if (last == b'+' || last == b'-') && first == last {
        return true;
    }
    // `a / /re/` or `/re/ * b` would open a comment
    if last == b'/' && (first == b'/' || first == b'*') {
        return true;
    }
    // `1 .toString()` must not become `1.toString()`
    prev.kind == TokenKind::Word
        && first == b'.'
        && prev.text.bytes().all(|b| b.is_ascii_digit())
}

/// A line break between these tokens may end a statement
fn breaks_statement(prev: &Token, next: &Token) -> bool {
    let (Some(&last), Some(&first)) = (prev.text.as_bytes().last(), next.text.as_bytes().first())
    else {
        return false;
    };

    let ends = is_word_byte(last)
        || prev.kind == TokenKind::Regex
        || matches!(last, b'}' | b')' | b']' | b'+' | b'-' | b'"' | b'\'' | b'`');
    let starts = is_word_byte(first)
        || next.kind == TokenKind::Regex
        || matches!(first, b'{' | b'[' | b'(' | b'+' | b'-' | b'!' | b'~' | b'"' | b'\'' | b'`');
    ends && starts
}
