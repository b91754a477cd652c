//! CSS minification

use crate::adapters::css::{comment_end, string_end};
use crate::adapters::{output_path, read_text, write_text, Adapter, AdapterKind};
use crate::error::{AdapterError, AdapterResult};
use crate::runner::{Context, FilePair, TargetConfig};

pub struct CssMin;

impl Adapter for CssMin {
    fn kind(&self) -> AdapterKind {
        AdapterKind::CssMin
    }

    fn apply(&self, ctx: &Context, target: &TargetConfig, files: &[FilePair]) -> AdapterResult<()> {
        let keep_special = target.bool_option("keepSpecialComments", true)?;

        for pair in files {
            let sources: Vec<_> = pair.existing_files().collect();
            if sources.is_empty() {
                return Err(AdapterError::NoInputFiles(pair.label()));
            }

            let mut minified = Vec::new();
            let mut original_len = 0;
            for src in &sources {
                let css = read_text(src)?;
                original_len += css.len();
                minified.push(minify(&css, keep_special));
            }
            let output = minified.join("");

            let dest = output_path(pair, sources[0]);
            write_text(ctx, dest, &output)?;
            ctx.print_debug(&format!(
                "{}: {} -> {} bytes",
                ctx.display_path(dest),
                original_len,
                output.len()
            ));
        }
        Ok(())
    }
}

/// Minify a stylesheet, keeping strings and (optionally) `/*!` comments intact
pub fn minify(css: &str, keep_special: bool) -> String {
    let src = css.as_bytes();
    let mut out = String::with_capacity(css.len());
    let mut i = 0;
    let mut pending_space = false;

    while i < src.len() {
        let c = src[i];
        match c {
            b'/' if src.get(i + 1) == Some(&b'*') => {
                let end = comment_end(src, i);
                if keep_special && src.get(i + 2) == Some(&b'!') {
                    out.push_str(&css[i..end]);
                    // special comments keep their own line
                    if end < src.len() {
                        out.push('\n');
                    }
                    pending_space = false;
                }
                i = end;
            }
            b'"' | b'\'' => {
                flush_space(&mut out, &mut pending_space, c);
                let end = string_end(src, i);
                out.push_str(&css[i..end]);
                i = end;
            }
            _ if c.is_ascii_whitespace() => {
                pending_space = true;
                i += 1;
            }
            _ => {
                flush_space(&mut out, &mut pending_space, c);
                if c == b'}' && out.ends_with(';') {
                    out.pop();
                }
                // copy the whole UTF-8 sequence
                let len = utf8_len(c);
                out.push_str(&css[i..(i + len).min(src.len())]);
                i += len;
            }
        }
    }

    out.trim().to_string()
}

/// Emit a pending space unless punctuation on either side makes it redundant
fn flush_space(out: &mut String, pending: &mut bool, next: u8) {
    if !*pending {
        return;
    }
    *pending = false;
    let prev = match out.as_bytes().last() {
        Some(&b) => b,
        None => return,
    };
    if is_tight(prev) || is_tight(next) || prev == b':' || prev == b'\n' {
        return;
    }
    out.push(' ');
}

fn is_tight(c: u8) -> bool {
    matches!(c, b'{' | b'}' | b';' | b',' | b'>')
}

fn utf8_len(first: u8) -> usize {
    match first {
        0xF0..=0xFF => 4,
        0xE0..=0xEF => 3,
        0xC0..=0xDF => 2,
        _ => 1,
    }
}
