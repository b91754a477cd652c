//! Template parsing for `<%= expr %>` strings
//!
//! Templates are parsed into a small typed expression tree once, so that a
//! malformed template is reported when the buildfile is loaded rather than in
//! the middle of a run. Evaluation happens in [`crate::config::store`].

use crate::error::{ConfigError, ConfigResult};
use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<%(=?)(.*?)%>").unwrap());

/// One step of a path expression
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Expression inside a `<%= %>` tag
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// String or number literal
    Literal(String),
    /// Reference to another configuration value
    Path(Vec<Segment>),
    /// `a + b + ...`
    Concat(Vec<Expr>),
}

/// A piece of a template string
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    Expr(Expr),
}

/// A parsed template string
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub parts: Vec<Part>,
}

impl Template {
    /// Quick check used to skip parsing of plain strings
    pub fn is_template(s: &str) -> bool {
        s.contains("<%")
    }

    /// Parse a template string
    pub fn parse(source: &str) -> ConfigResult<Self> {
        let syntax = |reason: &str| ConfigError::TemplateSyntax {
            template: source.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = Vec::new();
        let mut last = 0;

        for caps in TAG_RE.captures_iter(source) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let text = &source[last..whole.start()];
            if text.contains("<%") {
                return Err(syntax("unterminated tag"));
            }
            if !text.is_empty() {
                parts.push(Part::Text(text.to_string()));
            }

            if caps[1].is_empty() {
                return Err(syntax("only <%= expression %> tags are supported"));
            }

            let expr = parse_expr(&caps[2]).map_err(|reason| syntax(&reason))?;
            parts.push(Part::Expr(expr));
            last = whole.end();
        }

        let rest = &source[last..];
        if rest.contains("<%") {
            return Err(syntax("unterminated tag"));
        }
        if !rest.is_empty() {
            parts.push(Part::Text(rest.to_string()));
        }

        Ok(Template { parts })
    }

    /// If the whole template is a single path reference, return it.
    ///
    /// Such templates evaluate to the referenced value itself, so a list can
    /// be referenced from another list position.
    pub fn as_single_path(&self) -> Option<&[Segment]> {
        match self.parts.as_slice() {
            [Part::Expr(Expr::Path(path))] => Some(path),
            _ => None,
        }
    }
}

/// Render a path for error messages
pub fn path_to_string(path: &[Segment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            Segment::Key(key) if out.is_empty() => out.push_str(key),
            Segment::Key(key) => {
                out.push('.');
                out.push_str(key);
            }
            Segment::Index(i) => out.push_str(&format!("[{}]", i)),
        }
    }
    out
}

/// Split a dotted path such as `loc.src` into segments
pub fn parse_path(path: &str) -> ConfigResult<Vec<Segment>> {
    match parse_expr(path) {
        Ok(Expr::Path(segments)) => Ok(segments),
        Ok(_) => Err(ConfigError::TemplateSyntax {
            template: path.to_string(),
            reason: "expected a path".to_string(),
        }),
        Err(reason) => Err(ConfigError::TemplateSyntax {
            template: path.to_string(),
            reason,
        }),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Number(String),
    Dot,
    Plus,
    LBracket,
    RBracket,
}

fn tokenize(src: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            '\'' | '"' => {
                let quote = c;
                let mut value = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err("unterminated string literal".to_string()),
                        Some('\\') => {
                            match chars.get(i + 1) {
                                Some('n') => value.push('\n'),
                                Some(&other) => value.push(other),
                                None => return Err("unterminated string literal".to_string()),
                            }
                            i += 2;
                        }
                        Some(&ch) if ch == quote => {
                            i += 1;
                            break;
                        }
                        Some(&ch) => {
                            value.push(ch);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(value));
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                tokens.push(Token::Number(chars[start..i].iter().collect()));
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }

    Ok(tokens)
}

fn parse_expr(src: &str) -> Result<Expr, String> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }

    let mut pos = 0;
    let mut terms = vec![parse_term(&tokens, &mut pos)?];
    while pos < tokens.len() {
        if tokens[pos] != Token::Plus {
            return Err(format!("unexpected token {:?}", tokens[pos]));
        }
        pos += 1;
        terms.push(parse_term(&tokens, &mut pos)?);
    }

    if terms.len() == 1 {
        Ok(terms.remove(0))
    } else {
        Ok(Expr::Concat(terms))
    }
}

fn parse_term(tokens: &[Token], pos: &mut usize) -> Result<Expr, String> {
    match tokens.get(*pos) {
        Some(Token::Str(s)) => {
            *pos += 1;
            Ok(Expr::Literal(s.clone()))
        }
        Some(Token::Number(n)) => {
            *pos += 1;
            Ok(Expr::Literal(n.clone()))
        }
        Some(Token::Ident(name)) => {
            *pos += 1;
            let mut path = vec![Segment::Key(name.clone())];
            loop {
                match tokens.get(*pos) {
                    Some(Token::Dot) => match tokens.get(*pos + 1) {
                        Some(Token::Ident(key)) => {
                            path.push(Segment::Key(key.clone()));
                            *pos += 2;
                        }
                        Some(Token::Number(n)) => {
                            path.push(index_segment(n)?);
                            *pos += 2;
                        }
                        _ => return Err("expected a name after '.'".to_string()),
                    },
                    Some(Token::LBracket) => {
                        let segment = match tokens.get(*pos + 1) {
                            Some(Token::Str(key)) => Segment::Key(key.clone()),
                            Some(Token::Number(n)) => index_segment(n)?,
                            _ => return Err("expected a string or index inside '[]'".to_string()),
                        };
                        if tokens.get(*pos + 2) != Some(&Token::RBracket) {
                            return Err("missing ']'".to_string());
                        }
                        path.push(segment);
                        *pos += 3;
                    }
                    _ => break,
                }
            }
            Ok(Expr::Path(path))
        }
        Some(other) => Err(format!("unexpected token {:?}", other)),
        None => Err("expression ends unexpectedly".to_string()),
    }
}

fn index_segment(n: &str) -> Result<Segment, String> {
    n.parse::<usize>()
        .map(Segment::Index)
        .map_err(|_| format!("invalid index '{}'", n))
}
