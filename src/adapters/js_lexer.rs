//! JavaScript tokenizer
//!
//! Good enough to strip whitespace and comments safely and to drive simple
//! lint checks: it knows strings, template literals, regular expression
//! literals and comments, and it records whether a line break preceded each
//! token.

/// Token categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifiers, keywords and numbers
    Word,
    /// Quoted strings and template literals
    Str,
    Regex,
    Punct,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// A line break occurred since the previous non-comment token
    pub newline_before: bool,
    /// 1-based position of the first character
    pub line: usize,
    pub col: usize,
}

impl Token<'_> {
    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == text
    }

    pub fn is_word(&self, text: &str) -> bool {
        self.kind == TokenKind::Word && self.text == text
    }
}

/// A tokenizing failure with its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at line {}, column {}", self.message, self.line, self.col)
    }
}

/// Punctuators, longest first
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "**", "<<", ">>",
];

/// Keywords after which `/` starts a regular expression
const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

pub fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LexError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    text: &'a str,
    src: &'a [u8],
    pos: usize,
    line: usize,
    line_start: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Lexer {
            text,
            src: text.as_bytes(),
            pos: 0,
            line: 1,
            line_start: 0,
        }
    }

    fn run(mut self) -> Result<Vec<Token<'a>>, LexError> {
        let mut tokens: Vec<Token<'a>> = Vec::new();
        let mut newline = false;

        loop {
            newline |= self.skip_whitespace();
            if self.pos >= self.src.len() {
                return Ok(tokens);
            }

            let start = self.pos;
            let (line, col) = (self.line, start - self.line_start + 1);
            let c = self.src[start];
            let next = self.src.get(start + 1).copied();

            let kind = match c {
                b'/' if next == Some(b'/') => {
                    while self.pos < self.src.len() && self.src[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                    TokenKind::Comment
                }
                b'/' if next == Some(b'*') => {
                    self.block_comment(line, col)?;
                    TokenKind::Comment
                }
                b'/' if regex_allowed(last_significant(&tokens)) => {
                    self.regex(line, col)?;
                    TokenKind::Regex
                }
                b'"' | b'\'' => {
                    self.string(c, line, col)?;
                    TokenKind::Str
                }
                b'`' => {
                    self.template(line, col)?;
                    TokenKind::Str
                }
                b'.' if next.is_some_and(|n| n.is_ascii_digit()) => {
                    self.number();
                    TokenKind::Word
                }
                _ if c.is_ascii_digit() => {
                    self.number();
                    TokenKind::Word
                }
                _ if is_word_byte(c) => {
                    while self.pos < self.src.len() && is_word_byte(self.src[self.pos]) {
                        self.pos += 1;
                    }
                    TokenKind::Word
                }
                _ => {
                    let rest = &self.text[start..];
                    let len = PUNCTUATORS
                        .iter()
                        .find(|p| rest.starts_with(**p))
                        .map(|p| p.len())
                        .unwrap_or(1);
                    self.pos += len;
                    TokenKind::Punct
                }
            };

            let text = &self.text[start..self.pos];
            tokens.push(Token {
                kind,
                text,
                newline_before: newline,
                line,
                col,
            });
            if kind == TokenKind::Comment {
                newline |= text.contains('\n');
            } else {
                newline = false;
            }
        }
    }

    /// Skip whitespace, reporting whether it contained a line break
    fn skip_whitespace(&mut self) -> bool {
        let mut newline = false;
        while self.pos < self.src.len() {
            match self.src[self.pos] {
                b'\n' => {
                    newline = true;
                    self.pos += 1;
                    self.line += 1;
                    self.line_start = self.pos;
                }
                b' ' | b'\t' | b'\r' | 0x0b | 0x0c => self.pos += 1,
                // no-break space and BOM
                0xC2 if self.src.get(self.pos + 1) == Some(&0xA0) => self.pos += 2,
                0xEF if self.src[self.pos..].starts_with(&[0xEF, 0xBB, 0xBF]) => self.pos += 3,
                _ => break,
            }
        }
        newline
    }

    fn block_comment(&mut self, line: usize, col: usize) -> Result<(), LexError> {
        self.pos += 2;
        while self.pos + 1 < self.src.len() {
            if self.src[self.pos] == b'*' && self.src[self.pos + 1] == b'/' {
                self.pos += 2;
                return Ok(());
            }
            self.advance();
        }
        Err(error("Unterminated comment", line, col))
    }

    fn string(&mut self, quote: u8, line: usize, col: usize) -> Result<(), LexError> {
        self.pos += 1;
        while self.pos < self.src.len() {
            match self.src[self.pos] {
                b'\\' => {
                    self.pos += 1;
                    if self.pos < self.src.len() {
                        self.advance();
                    }
                }
                b'\n' => break,
                c if c == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Err(error("Unterminated string", line, col))
    }

    fn template(&mut self, line: usize, col: usize) -> Result<(), LexError> {
        self.pos += 1;
        while self.pos < self.src.len() {
            match self.src[self.pos] {
                b'\\' => {
                    self.pos += 1;
                    if self.pos < self.src.len() {
                        self.advance();
                    }
                }
                b'`' => {
                    self.pos += 1;
                    return Ok(());
                }
                b'$' if self.src.get(self.pos + 1) == Some(&b'{') => {
                    self.pos += 2;
                    self.substitution(line, col)?;
                }
                _ => self.advance(),
            }
        }
        Err(error("Unterminated template literal", line, col))
    }

    /// Skip a `${ ... }` body up to its closing brace
    fn substitution(&mut self, line: usize, col: usize) -> Result<(), LexError> {
        let mut depth = 1usize;
        while self.pos < self.src.len() {
            let c = self.src[self.pos];
            match c {
                b'{' => {
                    depth += 1;
                    self.pos += 1;
                }
                b'}' => {
                    depth -= 1;
                    self.pos += 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                b'"' | b'\'' => {
                    let (l, k) = (self.line, self.pos - self.line_start + 1);
                    self.string(c, l, k)?;
                }
                b'`' => {
                    let (l, k) = (self.line, self.pos - self.line_start + 1);
                    self.template(l, k)?;
                }
                _ => self.advance(),
            }
        }
        Err(error("Unterminated template literal", line, col))
    }

    fn regex(&mut self, line: usize, col: usize) -> Result<(), LexError> {
        self.pos += 1;
        let mut in_class = false;
        while self.pos < self.src.len() {
            match self.src[self.pos] {
                b'\\' => self.pos += 2,
                b'\n' => break,
                b'[' => {
                    in_class = true;
                    self.pos += 1;
                }
                b']' => {
                    in_class = false;
                    self.pos += 1;
                }
                b'/' if !in_class => {
                    self.pos += 1;
                    while self.pos < self.src.len() && is_word_byte(self.src[self.pos]) {
                        self.pos += 1;
                    }
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Err(error("Unterminated regular expression", line, col))
    }

    fn number(&mut self) {
        while self.pos < self.src.len() {
            let c = self.src[self.pos];
            let exponent_sign = (c == b'+' || c == b'-')
                && matches!(self.src[self.pos - 1], b'e' | b'E')
                && !is_hex_literal(self.number_start());
            if is_word_byte(c) || c == b'.' || exponent_sign {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn number_start(&self) -> &str {
        let start = self.text[..self.pos]
            .rfind(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '.' || ch == '_'))
            .map(|i| i + 1)
            .unwrap_or(0);
        &self.text[start..self.pos]
    }

    /// Step over one byte, keeping line numbers current
    fn advance(&mut self) {
        if self.src[self.pos] == b'\n' {
            self.line += 1;
            self.line_start = self.pos + 1;
        }
        self.pos += 1;
    }
}

fn is_hex_literal(text: &str) -> bool {
    text.starts_with("0x") || text.starts_with("0X")
}

fn error(message: &str, line: usize, col: usize) -> LexError {
    LexError {
        message: message.to_string(),
        line,
        col,
    }
}

fn last_significant<'t, 'a>(tokens: &'t [Token<'a>]) -> Option<&'t Token<'a>> {
    tokens.iter().rev().find(|t| t.kind != TokenKind::Comment)
}

/// Whether a `/` after `prev` opens a regular expression rather than dividing
fn regex_allowed(prev: Option<&Token>) -> bool {
    match prev {
        None => true,
        Some(token) => match token.kind {
            TokenKind::Word => REGEX_KEYWORDS.iter().any(|k| *k == token.text),
            TokenKind::Str | TokenKind::Regex => false,
            TokenKind::Punct => !matches!(token.text, ")" | "]" | "++" | "--"),
            TokenKind::Comment => true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<(TokenKind, &str)> {
        tokenize(src)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds("var x = a >>> 2;"),
            vec![
                (TokenKind::Word, "var"),
                (TokenKind::Word, "x"),
                (TokenKind::Punct, "="),
                (TokenKind::Word, "a"),
                (TokenKind::Punct, ">>>"),
                (TokenKind::Word, "2"),
                (TokenKind::Punct, ";"),
            ]
        );
    }

    #[test]
    fn test_regex_versus_division() {
        let tokens = kinds("a = b / c; d = /x[/]y/g.test(e); return /z/");
        assert!(tokens.contains(&(TokenKind::Punct, "/")));
        assert!(tokens.contains(&(TokenKind::Regex, "/x[/]y/g")));
        assert!(tokens.contains(&(TokenKind::Regex, "/z/")));
    }

    #[test]
    fn test_strings_and_templates() {
        let tokens = kinds(r#"f('it\'s', "a // b", `x ${ {a: "}"}.a } y`)"#);
        assert_eq!(tokens[2], (TokenKind::Str, r"'it\'s'"));
        assert_eq!(tokens[4], (TokenKind::Str, "\"a // b\""));
        assert_eq!(tokens[6].0, TokenKind::Str);
        assert!(tokens[6].1.ends_with("y`"));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1.5e-3 + .5 - 0xFF"),
            vec![
                (TokenKind::Word, "1.5e-3"),
                (TokenKind::Punct, "+"),
                (TokenKind::Word, ".5"),
                (TokenKind::Punct, "-"),
                (TokenKind::Word, "0xFF"),
            ]
        );
    }

    #[test]
    fn test_newline_flags_and_positions() {
        let tokens = tokenize("a\n/* c\n */ b").unwrap();
        assert!(!tokens[0].newline_before);
        assert!(tokens[1].newline_before);
        assert_eq!(tokens[1].kind, TokenKind::Comment);
        assert!(tokens[2].newline_before);
        assert_eq!((tokens[2].line, tokens[2].col), (3, 5));
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("var s = 'abc").unwrap_err();
        assert_eq!((err.line, err.col), (1, 9));
    }
}
