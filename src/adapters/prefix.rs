//! Vendor prefixing from a fixed table
//!
//! For every declaration whose property (or value) needs a vendor variant,
//! the prefixed copies are inserted just before the standard declaration,
//! unless the block already declares them.

use crate::adapters::css::{self, Node};
use crate::adapters::{output_path, read_text, write_text, Adapter, AdapterKind};
use crate::error::AdapterResult;
use crate::runner::{Context, FilePair, TargetConfig};
use std::collections::HashSet;

pub struct Prefix;

/// Properties and the prefixes they get
const PROPERTIES: &[(&str, &[&str])] = &[
    ("animation", &["-webkit-"]),
    ("animation-delay", &["-webkit-"]),
    ("animation-direction", &["-webkit-"]),
    ("animation-duration", &["-webkit-"]),
    ("animation-fill-mode", &["-webkit-"]),
    ("animation-iteration-count", &["-webkit-"]),
    ("animation-name", &["-webkit-"]),
    ("animation-timing-function", &["-webkit-"]),
    ("appearance", &["-webkit-", "-moz-"]),
    ("backface-visibility", &["-webkit-"]),
    ("box-sizing", &["-webkit-", "-moz-"]),
    ("column-count", &["-webkit-", "-moz-"]),
    ("column-gap", &["-webkit-", "-moz-"]),
    ("columns", &["-webkit-", "-moz-"]),
    ("flex", &["-webkit-", "-ms-"]),
    ("flex-direction", &["-webkit-", "-ms-"]),
    ("flex-wrap", &["-webkit-", "-ms-"]),
    ("hyphens", &["-webkit-", "-moz-", "-ms-"]),
    ("justify-content", &["-webkit-"]),
    ("align-items", &["-webkit-"]),
    ("perspective", &["-webkit-"]),
    ("transform", &["-webkit-", "-ms-"]),
    ("transform-origin", &["-webkit-", "-ms-"]),
    ("transition", &["-webkit-"]),
    ("transition-duration", &["-webkit-"]),
    ("transition-property", &["-webkit-"]),
    ("transition-timing-function", &["-webkit-"]),
    ("user-select", &["-webkit-", "-moz-", "-ms-"]),
];

/// `(property, value)` pairs whose value needs vendor variants
const VALUES: &[(&str, &str, &[&str])] = &[
    ("display", "flex", &["-webkit-flex", "-ms-flexbox"]),
    ("display", "inline-flex", &["-webkit-inline-flex", "-ms-inline-flexbox"]),
];

/// At-rules duplicated under a prefixed name
const AT_RULES: &[(&str, &str)] = &[("keyframes", "-webkit-keyframes")];

impl Adapter for Prefix {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Prefix
    }

    fn apply(&self, ctx: &Context, _target: &TargetConfig, files: &[FilePair]) -> AdapterResult<()> {
        for pair in files {
            for src in pair.existing_files() {
                let css = read_text(src)?;
                let output = prefix_stylesheet(&css);
                write_text(ctx, output_path(pair, src), &output)?;
            }
        }
        Ok(())
    }
}

/// Add vendor prefixes to a whole stylesheet
pub fn prefix_stylesheet(css: &str) -> String {
    let nodes = css::parse(css);
    css::serialize(&prefix_nodes(nodes))
}

fn prefix_nodes(nodes: Vec<Node>) -> Vec<Node> {
    let present: HashSet<(String, String)> = nodes
        .iter()
        .filter_map(|node| match node {
            Node::Declaration { property, value } => Some((property.clone(), value.clone())),
            _ => None,
        })
        .collect();
    let properties: HashSet<&str> = present.iter().map(|(p, _)| p.as_str()).collect();
    let preludes: HashSet<String> = nodes
        .iter()
        .filter_map(|node| match node {
            Node::Rule { prelude, .. } => Some(prelude.clone()),
            _ => None,
        })
        .collect();

    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes.iter().cloned() {
        match node {
            Node::Declaration { property, value } => {
                for prefixed in prefixed_properties(&property) {
                    if !properties.contains(prefixed.as_str()) {
                        out.push(Node::Declaration {
                            property: prefixed,
                            value: value.clone(),
                        });
                    }
                }
                for prefixed in prefixed_values(&property, &value) {
                    if !present.contains(&(property.clone(), prefixed.to_string())) {
                        out.push(Node::Declaration {
                            property: property.clone(),
                            value: prefixed.to_string(),
                        });
                    }
                }
                out.push(Node::Declaration { property, value });
            }
            Node::Rule { prelude, children } => {
                let children = prefix_nodes(children);
                if let Some(copy) = prefixed_at_rule(&prelude) {
                    if !preludes.contains(&copy) {
                        out.push(Node::Rule {
                            prelude: copy,
                            children: children.clone(),
                        });
                    }
                }
                out.push(Node::Rule { prelude, children });
            }
            other => out.push(other),
        }
    }
    out
}

fn prefixed_properties(property: &str) -> Vec<String> {
    PROPERTIES
        .iter()
        .find(|(name, _)| *name == property)
        .map(|(_, prefixes)| {
            prefixes
                .iter()
                .map(|prefix| format!("{}{}", prefix, property))
                .collect()
        })
        .unwrap_or_default()
}

fn prefixed_values(property: &str, value: &str) -> &'static [&'static str] {
    VALUES
        .iter()
        .find(|(p, v, _)| *p == property && *v == value)
        .map(|(_, _, values)| *values)
        .unwrap_or(&[])
}

fn prefixed_at_rule(prelude: &str) -> Option<String> {
    let rest = prelude.strip_prefix('@')?;
    AT_RULES.iter().find_map(|(name, prefixed)| {
        rest.strip_prefix(name)
            .filter(|tail| tail.starts_with(char::is_whitespace))
            .map(|tail| format!("@{}{}", prefixed, tail))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_transform() {
        let out = prefix_stylesheet(".a { transform: rotate(45deg); color: red }");
        assert_eq!(
            out,
            ".a {\n  -webkit-transform: rotate(45deg);\n  -ms-transform: rotate(45deg);\n  transform: rotate(45deg);\n  color: red;\n}\n"
        );
    }

    #[test]
    fn test_existing_prefix_not_duplicated() {
        let out = prefix_stylesheet(".a { -webkit-transition: all 1s; transition: all 1s }");
        assert_eq!(out.matches("-webkit-transition").count(), 1);
    }

    #[test]
    fn test_display_flex_values() {
        let out = prefix_stylesheet(".row { display: flex }");
        assert!(out.contains("display: -webkit-flex;"));
        assert!(out.contains("display: -ms-flexbox;"));
        assert!(out.contains("display: flex;"));
        let webkit = out.find("-webkit-flex").unwrap();
        let standard = out.find("display: flex").unwrap();
        assert!(webkit < standard);
    }

    #[test]
    fn test_inside_media_and_keyframes() {
        let out = prefix_stylesheet(
            "@media screen { .a { box-sizing: border-box } }\n@keyframes spin { to { transform: none } }",
        );
        assert!(out.contains("    -moz-box-sizing: border-box;"));
        assert!(out.contains("@-webkit-keyframes spin {"));
        assert!(out.contains("@keyframes spin {"));
    }

    #[test]
    fn test_untouched_properties() {
        let out = prefix_stylesheet("a { color: red }");
        assert_eq!(out, "a {\n  color: red;\n}\n");
    }
}
