//! JavaScript lint checks driven by options

use crate::adapters::js_lexer::{self, Token, TokenKind};
use crate::adapters::{read_text, Adapter, AdapterKind};
use crate::error::{AdapterError, AdapterResult};
use crate::runner::{Context, FilePair, TargetConfig};
use colored::Colorize;
use std::fmt;

pub struct Lint;

/// Quote style required by `quotmark`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quotes {
    Off,
    /// Whatever the first string uses
    Consistent,
    Single,
    Double,
}

/// Enabled checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LintOptions {
    pub curly: bool,
    pub quotmark: Quotes,
    pub strict: bool,
    /// Allow `eval`
    pub evil: bool,
    pub noarg: bool,
    pub plusplus: bool,
    /// Allow `== null`
    pub eqnull: bool,
    pub camelcase: bool,
    /// Allow `debugger`
    pub debug: bool,
}

impl Default for LintOptions {
    fn default() -> Self {
        LintOptions {
            curly: false,
            quotmark: Quotes::Off,
            strict: false,
            evil: false,
            noarg: false,
            plusplus: false,
            eqnull: false,
            camelcase: false,
            debug: false,
        }
    }
}

impl LintOptions {
    pub fn from_target(target: &TargetConfig) -> AdapterResult<Self> {
        let quotmark = match target.option("quotmark") {
            None => Quotes::Off,
            Some(value) => match (value.as_bool(), value.as_str()) {
                (Some(true), _) => Quotes::Consistent,
                (Some(false), _) => Quotes::Off,
                (_, Some("single")) => Quotes::Single,
                (_, Some("double")) => Quotes::Double,
                _ => {
                    return Err(AdapterError::InvalidOption {
                        name: "quotmark".to_string(),
                        error: "expected true, false, single or double".to_string(),
                    })
                }
            },
        };

        Ok(LintOptions {
            curly: target.bool_option("curly", false)?,
            quotmark,
            strict: target.bool_option("strict", false)?,
            evil: target.bool_option("evil", false)?,
            noarg: target.bool_option("noarg", false)?,
            plusplus: target.bool_option("plusplus", false)?,
            eqnull: target.bool_option("eqnull", false)?,
            camelcase: target.bool_option("camelcase", false)?,
            debug: target.bool_option("debug", false)?,
        })
    }
}

/// One problem found in a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub line: usize,
    pub col: usize,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.line, self.col, self.message)
    }
}

impl Adapter for Lint {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Lint
    }

    fn apply(&self, ctx: &Context, target: &TargetConfig, files: &[FilePair]) -> AdapterResult<()> {
        let options = LintOptions::from_target(target)?;
        let mut checked = 0;
        let mut total = 0;

        for pair in files {
            for src in pair.existing_files() {
                let issues = check(&read_text(src)?, &options);
                checked += 1;
                for issue in &issues {
                    ctx.print_error(&format!(
                        "{}:{}:{} {}",
                        ctx.display_path(src).bold(),
                        issue.line,
                        issue.col,
                        issue.message
                    ));
                }
                total += issues.len();
            }
        }

        if total > 0 {
            return Err(AdapterError::Lint(total));
        }
        ctx.print_info(&format!("{} file(s) lint free.", checked));
        Ok(())
    }
}

/// Run every enabled check over `source`
pub fn check(source: &str, options: &LintOptions) -> Vec<Issue> {
    let tokens = match js_lexer::tokenize(source) {
        Ok(tokens) => tokens,
        Err(e) => {
            return vec![Issue {
                line: e.line,
                col: e.col,
                message: e.message,
            }]
        }
    };
    let code: Vec<&Token> = tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Comment)
        .collect();

    let mut issues = Vec::new();
    if options.curly {
        check_curly(&code, &mut issues);
    }
    if options.quotmark != Quotes::Off {
        check_quotes(&code, options.quotmark, &mut issues);
    }
    if options.strict && !code.iter().any(|t| is_use_strict(t)) {
        issues.push(Issue {
            line: 1,
            col: 1,
            message: "Missing \"use strict\" statement.".to_string(),
        });
    }

    for (i, token) in code.iter().enumerate() {
        let next = code.get(i + 1);
        let prev = i.checked_sub(1).and_then(|p| code.get(p));

        if !options.evil && token.is_word("eval") && next.is_some_and(|n| n.is_punct("(")) {
            issues.push(issue(token, "eval can be harmful."));
        }
        if options.noarg
            && token.is_word("arguments")
            && next.is_some_and(|n| n.is_punct("."))
            && code
                .get(i + 2)
                .is_some_and(|n| n.is_word("callee") || n.is_word("caller"))
        {
            issues.push(issue(token, "Avoid arguments.callee and arguments.caller."));
        }
        if options.plusplus && (token.is_punct("++") || token.is_punct("--")) {
            issues.push(issue(token, &format!("Unexpected use of '{}'.", token.text)));
        }
        if !options.eqnull && (token.is_punct("==") || token.is_punct("!=")) {
            let null_side = next.is_some_and(|n| n.is_word("null"))
                || prev.is_some_and(|p| p.is_word("null"));
            if null_side {
                issues.push(issue(
                    token,
                    &format!("Use '{}=' to compare with 'null'.", token.text),
                ));
            }
        }
        if options.camelcase && token.kind == TokenKind::Word && !is_camel_or_constant(token.text) {
            issues.push(issue(
                token,
                &format!("Identifier '{}' is not in camel case.", token.text),
            ));
        }
        if !options.debug && token.is_word("debugger") {
            issues.push(issue(token, "Forgotten 'debugger' statement?"));
        }
    }

    issues.sort_by_key(|i| (i.line, i.col));
    issues
}

fn issue(token: &Token, message: &str) -> Issue {
    Issue {
        line: token.line,
        col: token.col,
        message: message.to_string(),
    }
}

fn is_use_strict(token: &Token) -> bool {
    token.kind == TokenKind::Str && matches!(token.text, "\"use strict\"" | "'use strict'")
}

fn check_quotes(code: &[&Token], mode: Quotes, issues: &mut Vec<Issue>) {
    let mut expected = match mode {
        Quotes::Single => Some(b'\''),
        Quotes::Double => Some(b'"'),
        _ => None,
    };
    let message = match mode {
        Quotes::Single => "Strings must use singlequote.",
        Quotes::Double => "Strings must use doublequote.",
        _ => "Mixed double and single quotes.",
    };

    for token in code.iter().filter(|t| t.kind == TokenKind::Str) {
        let quote = token.text.as_bytes()[0];
        if quote == b'`' {
            continue;
        }
        match expected {
            None => expected = Some(quote),
            Some(q) if q != quote => issues.push(issue(token, message)),
            Some(_) => {}
        }
    }
}

/// `if`/`for`/`while` bodies and `else`/`do` must be blocks
fn check_curly(code: &[&Token], issues: &mut Vec<Issue>) {
    for (i, token) in code.iter().enumerate() {
        let body = if token.is_word("if") || token.is_word("for") || token.is_word("while") {
            // a `while` closing a do-while has no body
            if token.is_word("while") && i > 0 && code[i - 1].is_punct("}") && ends_do_block(code, i - 1) {
                continue;
            }
            match matching_paren(code, i + 1) {
                Some(close) => close + 1,
                None => continue,
            }
        } else if token.is_word("else") {
            if code.get(i + 1).is_some_and(|n| n.is_word("if")) {
                continue;
            }
            i + 1
        } else if token.is_word("do") {
            i + 1
        } else {
            continue;
        };

        if let Some(next) = code.get(body) {
            if !next.is_punct("{") {
                issues.push(issue(
                    next,
                    &format!("Expected '{{' and instead saw '{}'.", next.text),
                ));
            }
        }
    }
}

/// Index of the `)` matching the `(` at `open`
fn matching_paren(code: &[&Token], open: usize) -> Option<usize> {
    if !code.get(open)?.is_punct("(") {
        return None;
    }
    let mut depth = 0usize;
    for (offset, token) in code[open..].iter().enumerate() {
        if token.is_punct("(") {
            depth += 1;
        } else if token.is_punct(")") {
            depth -= 1;
            if depth == 0 {
                return Some(open + offset);
            }
        }
    }
    None
}

/// Whether the `}` at `close` ends the body of a `do`
fn ends_do_block(code: &[&Token], close: usize) -> bool {
    let mut depth = 0usize;
    for i in (0..=close).rev() {
        if code[i].is_punct("}") {
            depth += 1;
        } else if code[i].is_punct("{") {
            depth -= 1;
            if depth == 0 {
                return i > 0 && code[i - 1].is_word("do");
            }
        }
    }
    false
}

fn is_camel_or_constant(word: &str) -> bool {
    let trimmed = word.trim_matches('_');
    if !trimmed.contains('_') || word.starts_with(|c: char| c.is_ascii_digit()) {
        return true;
    }
    // UPPER_CASE constants are fine
    !trimmed.chars().any(|c| c.is_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only(f: impl FnOnce(&mut LintOptions)) -> LintOptions {
        let mut options = LintOptions {
            evil: true,
            eqnull: true,
            debug: true,
            ..Default::default()
        };
        f(&mut options);
        options
    }

    fn messages(source: &str, options: &LintOptions) -> Vec<String> {
        check(source, options).iter().map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_clean_file_has_no_issues() {
        let src = "(function () {\n  'use strict';\n  if (a) {\n    b();\n  }\n}());\n";
        let options = LintOptions {
            curly: true,
            quotmark: Quotes::Single,
            strict: true,
            noarg: true,
            camelcase: true,
            ..Default::default()
        };
        assert!(check(src, &options).is_empty());
    }

    #[test]
    fn test_curly() {
        let options = only(|o| o.curly = true);
        let issues = messages("if (a) b();\nelse c();\nfor (;;) { d(); }", &options);
        assert_eq!(
            issues,
            vec![
                "1:8 Expected '{' and instead saw 'b'.",
                "2:6 Expected '{' and instead saw 'c'.",
            ]
        );
        assert!(messages("do { x(); } while (y);", &options).is_empty());
        assert!(messages("if (a) {} else if (b) {}", &options).is_empty());
    }

    #[test]
    fn test_quotmark() {
        let consistent = only(|o| o.quotmark = Quotes::Consistent);
        assert_eq!(messages("a('x', \"y\");", &consistent).len(), 1);

        let double = only(|o| o.quotmark = Quotes::Double);
        assert_eq!(messages("a(\"x\", 'y');", &double), vec!["1:8 Strings must use doublequote."]);
    }

    #[test]
    fn test_strict() {
        let options = only(|o| o.strict = true);
        assert_eq!(messages("var a = 1;", &options).len(), 1);
        assert!(messages("\"use strict\";\nvar a = 1;", &options).is_empty());
    }

    #[test]
    fn test_defaults_forbid_eval_eqnull_debugger() {
        let issues = messages(
            "eval('x');\nif (a == null) {}\ndebugger;",
            &LintOptions::default(),
        );
        assert_eq!(issues.len(), 3);
        assert!(issues[0].starts_with("1:1 eval"));
        assert!(issues[1].starts_with("2:7 Use '==='"));
    }

    #[test]
    fn test_noarg_and_plusplus() {
        let options = only(|o| {
            o.noarg = true;
            o.plusplus = true;
        });
        let issues = messages("arguments.callee(i++);", &options);
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_camelcase() {
        let options = only(|o| o.camelcase = true);
        assert!(messages("var fooBar = MAX_SIZE + _private;", &options).is_empty());
        assert_eq!(messages("var foo_bar;", &options), vec!["1:5 Identifier 'foo_bar' is not in camel case."]);
    }

    #[test]
    fn test_syntax_error_is_an_issue() {
        let issues = check("var s = 'oops", &LintOptions::default());
        assert_eq!(issues.len(), 1);
        assert_eq!((issues[0].line, issues[0].col), (1, 9));
    }
}
