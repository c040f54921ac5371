use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    ast::{Rule, RuleKind},
    error::GrammarSyntaxError,
    parser::compile_expr,
};

type Result<T> = std::result::Result<T, GrammarSyntaxError>;

/// Number reserved for `@pass` rules.
pub const PASS_NUMBER: &str = "0";

/// A line which opens a new rule, `[12] Symbol ::=`.
static RULE_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[[\w.]+\]\s*\w*\s*::=").unwrap());
static RULE_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[([\w.]+)\]\s*(\w*)$").unwrap());
static TOKEN_SYMBOL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z_]+$").unwrap());

struct Pending {
    line: u32,
    pass: bool,
    text: String,
}

struct Segmenter<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
    at_line_start: bool,
    /// Once set, every later rule is a token rule.
    token_mode: bool,
    current: Option<Pending>,
    numbers: HashSet<String>,
    rules: Vec<Rule>,
}

impl<'a> Segmenter<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            at_line_start: true,
            token_mode: false,
            current: None,
            numbers: HashSet::new(),
            rules: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Rule>> {
        while let Some(c) = self.src[self.pos..].chars().next() {
            let rest = &self.src[self.pos..];

            if c.is_whitespace() {
                if c == '\n' {
                    self.line += 1;
                    self.at_line_start = true;
                }
                if let Some(current) = &mut self.current {
                    if !current.text.is_empty() {
                        current.text.push(c);
                    }
                }
                self.pos += c.len_utf8();
                continue;
            }

            if rest.starts_with("/*") {
                let Some(end) = rest[2..].find("*/") else {
                    return Err(GrammarSyntaxError::new("unterminated comment")
                        .in_rule(self.line, None));
                };
                let comment = &rest[..end + 4];
                self.line += comment.matches('\n').count() as u32;
                self.pos += comment.len();
                continue;
            }

            if rest.starts_with("@terminals") {
                self.finish()?;
                log::debug!("token rules from line {}", self.line);
                self.token_mode = true;
                self.at_line_start = false;
                self.pos += "@terminals".len();
                continue;
            }

            let pass = rest.starts_with("@pass");
            if pass || (self.at_line_start && RULE_START.is_match(rest)) {
                self.finish()?;
                self.current = Some(Pending {
                    line: self.line,
                    pass,
                    text: String::new(),
                });
            }

            let Some(current) = &mut self.current else {
                return Err(GrammarSyntaxError::new("expected a rule").in_rule(self.line, None));
            };
            let end = [rest.find('\n'), rest.find("/*")]
                .into_iter()
                .flatten()
                .min()
                .unwrap_or(rest.len());
            current.text.push_str(&rest[..end]);
            self.pos += end;
            self.at_line_start = false;
        }

        self.finish()?;
        Ok(self.rules)
    }

    fn finish(&mut self) -> Result<()> {
        let Some(Pending { line, pass, text }) = self.current.take() else {
            return Ok(());
        };
        let text = text.trim_end();

        let rule = match pass {
            true => {
                let body = text.trim_start_matches("@pass").trim_start();
                let body = body.strip_prefix("::=").unwrap_or(body);
                let expr =
                    compile_expr(body).map_err(|e| e.in_rule(line, Some(PASS_NUMBER)))?;
                Rule::new(PASS_NUMBER, None, RuleKind::Pass, expr)
            }
            false => {
                let Some((head, body)) = text.split_once("::=") else {
                    return Err(GrammarSyntaxError::new("missing ::=").in_rule(line, None));
                };
                let Some(captures) = RULE_HEAD.captures(head.trim()) else {
                    return Err(GrammarSyntaxError::new(format!(
                        "malformed rule head {:?}",
                        head.trim()
                    ))
                    .in_rule(line, None));
                };
                let number = &captures[1];
                let symbol = &captures[2];
                if symbol.is_empty() {
                    return Err(GrammarSyntaxError::new("missing symbol").in_rule(line, Some(number)));
                }

                if TOKEN_SYMBOL.is_match(symbol) {
                    self.token_mode = true;
                }
                let kind = match self.token_mode {
                    true => RuleKind::Token,
                    false => RuleKind::Rule,
                };
                let expr = compile_expr(body).map_err(|e| e.in_rule(line, Some(number)))?;
                Rule::new(number, Some(symbol), kind, expr)
            }
        };

        if !self.numbers.insert(rule.number.clone()) {
            return Err(GrammarSyntaxError::new("duplicate rule number")
                .in_rule(line, Some(&rule.number)));
        }
        log::debug!("line {line}: {rule}");

        self.rules.push(Rule {
            original_text: text.to_owned(),
            line,
            ..rule
        });
        Ok(())
    }
}

/// Splits grammar text into rules and compiles each of them, in source order.
pub fn compile(src: &str) -> Result<Vec<Rule>> {
    Segmenter::new(src).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;

    #[test]
    fn test_segmentation() {
        let src = "/* header\n comment */\n[1] a ::= b\n    c /* trailing */\n\n[2] b ::= [a-z]\n";
        let rules = compile(src).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].line, 3);
        assert_eq!(rules[0].original_text, "[1] a ::= b\n    c");
        assert_eq!(
            rules[0].expr,
            Expr::Seq(vec![Expr::Id("b".into()), Expr::Id("c".into())])
        );
        assert_eq!(rules[1].line, 6);
        assert_eq!(rules[1].expr, Expr::Range("a-z".into()));
    }

    #[test]
    fn test_range_at_line_start_continues_rule() {
        let rules = compile("[1] a ::= b\n[c] d").unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(
            rules[0].expr,
            Expr::Seq(vec![
                Expr::Id("b".into()),
                Expr::Range("c".into()),
                Expr::Id("d".into()),
            ])
        );
    }

    #[test]
    fn test_pass() {
        let rules = compile("[1] a ::= 'x'\n@pass [ \\t]+\n").unwrap();
        assert_eq!(rules[1].number, PASS_NUMBER);
        assert_eq!(rules[1].symbol, None);
        assert_eq!(rules[1].kind, RuleKind::Pass);
        assert_eq!(rules[1].expr, Expr::Plus(Box::new(Expr::Range(" \\t".into()))));
    }

    #[test]
    fn test_errors() {
        let err = compile("[1] a ::= b\n\n[2] c ::= d -").unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.rule.as_deref(), Some("2"));

        let err = compile("[1] a ::= b\n[1] c ::= d").unwrap_err();
        assert_eq!(err.message, "duplicate rule number");

        let err = compile("[1] ::= b").unwrap_err();
        assert_eq!(err.message, "missing symbol");

        assert!(compile("a ::= b").is_err());
        assert!(compile("[1] a ::= b /* open").is_err());
    }
}
