//! Flatten media queries for browsers without media query support
//!
//! Every `@media` block whose conditions hold for a viewport of
//! `legacyWidth` em is unwrapped in place; every other `@media` block is
//! dropped. The rest of the stylesheet is kept as is.

use crate::adapters::css::{self, Node};
use crate::adapters::{output_path, read_text, write_text, Adapter, AdapterKind};
use crate::error::{AdapterError, AdapterResult};
use crate::runner::{Context, FilePair, TargetConfig};

pub struct Legacy;

/// Default viewport width in em (960px at 16px per em)
const DEFAULT_LEGACY_WIDTH: f64 = 60.0;

const PX_PER_EM: f64 = 16.0;

impl Adapter for Legacy {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Legacy
    }

    fn apply(&self, ctx: &Context, target: &TargetConfig, files: &[FilePair]) -> AdapterResult<()> {
        let width = target.f64_option("legacyWidth", DEFAULT_LEGACY_WIDTH)?;

        for pair in files {
            let sources: Vec<_> = pair.existing_files().collect();
            if sources.is_empty() {
                return Err(AdapterError::NoInputFiles(pair.label()));
            }

            let mut output = String::new();
            for src in &sources {
                let nodes = css::parse(&read_text(src)?);
                output.push_str(&css::serialize(&flatten(nodes, width)));
            }
            write_text(ctx, output_path(pair, sources[0]), &output)?;
        }
        Ok(())
    }
}

/// Unwrap matching media blocks and drop the others, at any depth
pub fn flatten(nodes: Vec<Node>, width: f64) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        let is_media = node.at_rule_name() == Some("media");
        match node {
            Node::Rule { prelude, children } if is_media => {
                let query = prelude["@media".len()..].trim();
                if media_matches(query, width) {
                    out.extend(flatten(children, width));
                }
            }
            Node::Rule { prelude, children } => out.push(Node::Rule {
                prelude,
                children: flatten(children, width),
            }),
            other => out.push(other),
        }
    }
    out
}

/// A comma-separated query list holds when any of its queries holds
pub fn media_matches(query_list: &str, width: f64) -> bool {
    query_list
        .split(',')
        .any(|query| query_matches(query.trim(), width))
}

fn query_matches(query: &str, width: f64) -> bool {
    let lower = query.to_ascii_lowercase();
    let mut rest = lower.as_str().trim();

    if rest.starts_with("not ") {
        return false;
    }
    if let Some(tail) = rest.strip_prefix("only ") {
        rest = tail.trim_start();
    }

    // optional media type
    if !rest.starts_with('(') {
        let (media_type, tail) = match rest.find(char::is_whitespace) {
            Some(i) => (&rest[..i], rest[i..].trim_start()),
            None => (rest, ""),
        };
        if !matches!(media_type, "" | "all" | "screen") {
            return false;
        }
        rest = match tail.strip_prefix("and") {
            Some(tail) => tail.trim_start(),
            None if tail.is_empty() => return true,
            None => return false,
        };
    }

    for condition in rest.split(" and ") {
        let condition = condition.trim();
        let Some(inner) = condition
            .strip_prefix('(')
            .and_then(|c| c.strip_suffix(')'))
        else {
            return false;
        };
        if !feature_matches(inner, width) {
            return false;
        }
    }
    true
}

fn feature_matches(feature: &str, width: f64) -> bool {
    let Some((name, value)) = feature.split_once(':') else {
        return false;
    };
    let Some(value) = to_em(value.trim()) else {
        return false;
    };
    match name.trim() {
        "min-width" => value <= width,
        "max-width" => value >= width,
        _ => false,
    }
}

/// Length in em; `px` is converted at 16px per em
fn to_em(length: &str) -> Option<f64> {
    let (number, factor) = if let Some(n) = length.strip_suffix("rem") {
        (n, 1.0)
    } else if let Some(n) = length.strip_suffix("em") {
        (n, 1.0)
    } else if let Some(n) = length.strip_suffix("px") {
        (n, 1.0 / PX_PER_EM)
    } else if length == "0" {
        ("0", 1.0)
    } else {
        return None;
    };
    number.trim().parse::<f64>().ok().map(|n| n * factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(css: &str) -> String {
        css::serialize(&flatten(css::parse(css), DEFAULT_LEGACY_WIDTH))
    }

    #[test]
    fn test_min_width_at_or_below_is_unwrapped() {
        let out = flat(".a { b: c }\n@media screen and (min-width: 30em) { .d { e: f } }");
        assert_eq!(out, ".a {\n  b: c;\n}\n.d {\n  e: f;\n}\n");
    }

    #[test]
    fn test_min_width_above_is_dropped() {
        let out = flat("@media (min-width: 75em) { .wide { e: f } }");
        assert_eq!(out, "");
    }

    #[test]
    fn test_max_width() {
        assert!(media_matches("(max-width: 60em)", 60.0));
        assert!(!media_matches("(max-width: 59.9375em)", 60.0));
        assert!(media_matches("(min-width: 600px) and (max-width: 1200px)", 60.0));
    }

    #[test]
    fn test_px_converted() {
        assert!(media_matches("(min-width: 960px)", 60.0));
        assert!(!media_matches("(min-width: 961px)", 60.0));
    }

    #[test]
    fn test_media_types() {
        assert!(media_matches("all and (min-width: 10em)", 60.0));
        assert!(media_matches("only screen and (min-width: 10em)", 60.0));
        assert!(media_matches("screen", 60.0));
        assert!(!media_matches("print", 60.0));
        assert!(!media_matches("not screen and (min-width: 10em)", 60.0));
        assert!(media_matches("print, screen and (min-width: 10em)", 60.0));
    }

    #[test]
    fn test_unknown_features_drop() {
        assert!(!media_matches("(orientation: landscape)", 60.0));
        assert!(!media_matches("(min-resolution: 2dppx)", 60.0));
    }

    #[test]
    fn test_nested_media_flattened() {
        let out = flat("@media (min-width: 10em) { @media (min-width: 20em) { .x { y: z } } }");
        assert_eq!(out, ".x {\n  y: z;\n}\n");
    }

    #[test]
    fn test_other_at_rules_kept() {
        let out = flat("@font-face { font-family: x }");
        assert_eq!(out, "@font-face {\n  font-family: x;\n}\n");
    }
}
