//! Minimal CSS scanner
//!
//! Splits a stylesheet into rules, declarations and comments without
//! interpreting selectors or values. Strings, comments and parentheses are
//! respected when looking for `{`, `}` and `;`, which is all the rewriting
//! adapters need.

use std::fmt::Write;

/// One item of a stylesheet or of a block
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `prelude { children }`: style rules and block at-rules alike
    Rule { prelude: String, children: Vec<Node> },
    /// `property: value`
    Declaration { property: String, value: String },
    /// `@import url(x)` and other statements without a block
    Statement(String),
    /// A comment, delimiters included
    Comment(String),
}

impl Node {
    /// The at-rule name of a block (`media` for `@media screen {...}`)
    pub fn at_rule_name(&self) -> Option<&str> {
        match self {
            Node::Rule { prelude, .. } => prelude
                .strip_prefix('@')
                .map(|rest| rest.split(|c: char| c.is_whitespace() || c == '(').next().unwrap_or("")),
            _ => None,
        }
    }
}

/// Parse a stylesheet. Unbalanced input is closed at end of file.
pub fn parse(source: &str) -> Vec<Node> {
    let mut parser = Parser {
        src: source.as_bytes(),
        text: source,
        pos: 0,
    };
    parser.block()
}

/// Render nodes as indented CSS
pub fn serialize(nodes: &[Node]) -> String {
    let mut out = String::new();
    write_nodes(&mut out, nodes, 0);
    out
}

fn write_nodes(out: &mut String, nodes: &[Node], depth: usize) {
    let indent = "  ".repeat(depth);
    for node in nodes {
        match node {
            Node::Rule { prelude, children } => {
                let _ = writeln!(out, "{}{} {{", indent, prelude);
                write_nodes(out, children, depth + 1);
                let _ = writeln!(out, "{}}}", indent);
            }
            Node::Declaration { property, value } => {
                let _ = writeln!(out, "{}{}: {};", indent, property, value);
            }
            Node::Statement(text) => {
                let _ = writeln!(out, "{}{};", indent, text);
            }
            Node::Comment(text) => {
                let _ = writeln!(out, "{}{}", indent, text);
            }
        }
    }
}

/// Index just past the string literal opening at `start`
pub fn string_end(src: &[u8], start: usize) -> usize {
    let quote = src[start];
    let mut i = start + 1;
    while i < src.len() {
        match src[i] {
            b'\\' => i += 2,
            c if c == quote => return i + 1,
            b'\n' => return i,
            _ => i += 1,
        }
    }
    src.len()
}

/// Index just past the comment opening at `start`
pub fn comment_end(src: &[u8], start: usize) -> usize {
    let mut i = start + 2;
    while i + 1 < src.len() {
        if src[i] == b'*' && src[i + 1] == b'/' {
            return i + 2;
        }
        i += 1;
    }
    src.len()
}

struct Parser<'a> {
    src: &'a [u8],
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Items up to the matching `}` (consumed) or end of input
    fn block(&mut self) -> Vec<Node> {
        let mut nodes = Vec::new();
        loop {
            self.skip_whitespace();
            if self.pos >= self.src.len() {
                return nodes;
            }
            match self.src[self.pos] {
                b'}' => {
                    self.pos += 1;
                    return nodes;
                }
                b';' => self.pos += 1,
                b'/' if self.peek(1) == Some(b'*') => {
                    let end = comment_end(self.src, self.pos);
                    nodes.push(Node::Comment(self.text[self.pos..end].to_string()));
                    self.pos = end;
                }
                _ => nodes.push(self.item()),
            }
        }
    }

    /// A declaration, a statement or a rule with its block
    fn item(&mut self) -> Node {
        let start = self.pos;
        let mut depth = 0usize;

        while self.pos < self.src.len() {
            match self.src[self.pos] {
                b'"' | b'\'' => self.pos = string_end(self.src, self.pos),
                b'/' if self.peek(1) == Some(b'*') => self.pos = comment_end(self.src, self.pos),
                b'(' => {
                    depth += 1;
                    self.pos += 1;
                }
                b')' => {
                    depth = depth.saturating_sub(1);
                    self.pos += 1;
                }
                b'{' if depth == 0 => {
                    let prelude = collapse(&self.text[start..self.pos]);
                    self.pos += 1;
                    let children = self.block();
                    return Node::Rule { prelude, children };
                }
                b';' if depth == 0 => {
                    let node = leaf(&self.text[start..self.pos]);
                    self.pos += 1;
                    return node;
                }
                // closing brace of the enclosing block ends the last declaration
                b'}' if depth == 0 => return leaf(&self.text[start..self.pos]),
                _ => self.pos += 1,
            }
        }
        leaf(&self.text[start..])
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }
}

fn leaf(text: &str) -> Node {
    let text = text.trim();
    if text.starts_with('@') {
        return Node::Statement(collapse(text));
    }
    match text.split_once(':') {
        Some((property, value)) => Node::Declaration {
            property: property.trim().to_string(),
            value: value.trim().to_string(),
        },
        None => Node::Statement(collapse(text)),
    }
}

/// Collapse runs of whitespace to single spaces
fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rules_and_declarations() {
        let nodes = parse("a { color: red; margin:0 }\n@import url(x.css);");
        assert_eq!(
            nodes,
            vec![
                Node::Rule {
                    prelude: "a".to_string(),
                    children: vec![
                        Node::Declaration {
                            property: "color".to_string(),
                            value: "red".to_string()
                        },
                        Node::Declaration {
                            property: "margin".to_string(),
                            value: "0".to_string()
                        },
                    ],
                },
                Node::Statement("@import url(x.css)".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_nested_media() {
        let nodes = parse("@media screen and (min-width: 30em) { .a { b: c } }");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].at_rule_name(), Some("media"));
        match &nodes[0] {
            Node::Rule { prelude, children } => {
                assert_eq!(prelude, "@media screen and (min-width: 30em)");
                assert_eq!(children.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_braces_in_strings_and_urls() {
        let nodes = parse(r#"a:after { content: "}{"; background: url(data:x;{}) }"#);
        match &nodes[0] {
            Node::Rule { children, .. } => {
                assert_eq!(children.len(), 2);
                assert_eq!(
                    children[0],
                    Node::Declaration {
                        property: "content".to_string(),
                        value: "\"}{\"".to_string()
                    }
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_comments_are_kept() {
        let nodes = parse("/*! keep */ a { /* inner */ b: c; }");
        assert_eq!(nodes[0], Node::Comment("/*! keep */".to_string()));
        match &nodes[1] {
            Node::Rule { children, .. } => {
                assert_eq!(children[0], Node::Comment("/* inner */".to_string()))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_serialize() {
        let css = serialize(&parse("a{color:red}@media print{b{c:d}}"));
        assert_eq!(
            css,
            "a {\n  color: red;\n}\n@media print {\n  b {\n    c: d;\n  }\n}\n"
        );
    }

    #[test]
    fn test_unterminated_block() {
        let nodes = parse("a { color: red");
        assert_eq!(nodes.len(), 1);
    }
}
