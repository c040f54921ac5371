//! S-expression form of a grammar.
//!
//! A rule is written as `(number symbol kind expr)`:
//!
//! ```text
//! ("2" Prolog rule (seq (opt BaseDecl) (star PrefixDecl)))
//! ```
//!
//! Expressions are `(seq ..)`, `(alt ..)`, `(diff a b)`, `(opt a)`, `(star a)`,
//! `(plus a)`, `(range "a-z")`, `(hex "#x20")`, quoted literals, bare
//! identifiers and `()` for the absent expression. A missing symbol is `nil`.

use std::fmt::{self, Display, Write};

use crate::{
    ast::{Expr, Rule, RuleKind},
    error::SxpError,
};

/// Displays its contents as an S-expression.
pub struct Sxp<T>(pub T);

struct Quoted<'a>(&'a str);

impl Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        for c in self.0.chars() {
            match c {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                '\t' => f.write_str("\\t")?,
                c => f.write_char(c)?,
            }
        }
        f.write_char('"')
    }
}

fn list(f: &mut fmt::Formatter<'_>, head: &str, children: &[&Expr]) -> fmt::Result {
    write!(f, "({head}")?;
    for child in children {
        write!(f, " {}", Sxp(*child))?;
    }
    f.write_char(')')
}

impl Display for Sxp<&Expr> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expr::Seq(c) => list(f, "seq", &c.iter().collect::<Vec<_>>()),
            Expr::Alt(c) => list(f, "alt", &c.iter().collect::<Vec<_>>()),
            Expr::Diff(a, b) => list(f, "diff", &[&**a, &**b]),
            Expr::Opt(a) => list(f, "opt", &[&**a]),
            Expr::Star(a) => list(f, "star", &[&**a]),
            Expr::Plus(a) => list(f, "plus", &[&**a]),
            Expr::Literal(l) => write!(f, "{}", Quoted(l)),
            Expr::Range(r) => write!(f, "(range {})", Quoted(r)),
            Expr::Hex(h) => write!(f, "(hex {})", Quoted(h)),
            Expr::Id(id) => f.write_str(id),
            Expr::Empty => f.write_str("()"),
        }
    }
}

impl Display for Sxp<&Rule> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = self.0;
        write!(
            f,
            "({} {} {} {})",
            Quoted(&rule.number),
            rule.symbol.as_deref().unwrap_or("nil"),
            rule.kind.as_str(),
            Sxp(&rule.expr)
        )
    }
}

impl Display for Sxp<&[Rule]> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for rule in self.0 {
            write!(f, "\n {}", Sxp(rule))?;
        }
        f.write_str("\n)")
    }
}

#[derive(Debug)]
enum Value {
    List(Vec<Value>, usize),
    Atom(String, usize),
    Str(String, usize),
}

impl Value {
    fn offset(&self) -> usize {
        match self {
            Value::List(_, o) | Value::Atom(_, o) | Value::Str(_, o) => *o,
        }
    }
}

fn error<T>(message: impl Into<String>, offset: usize) -> Result<T, SxpError> {
    Err(SxpError {
        message: message.into(),
        offset,
    })
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
}

impl Reader<'_> {
    fn skip_whitespace(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn value(&mut self) -> Result<Value, SxpError> {
        self.skip_whitespace();
        let src = self.src;
        let start = self.pos;
        let mut chars = src[start..].chars();
        match chars.next() {
            None => error("unexpected end of input", start),
            Some('(') => {
                self.pos += 1;
                let mut items = Vec::new();
                loop {
                    self.skip_whitespace();
                    match src[self.pos..].chars().next() {
                        Some(')') => {
                            self.pos += 1;
                            return Ok(Value::List(items, start));
                        }
                        None => return error("unterminated list", start),
                        Some(_) => items.push(self.value()?),
                    }
                }
            }
            Some(')') => error("unexpected ')'", start),
            Some('"') => {
                let mut text = String::new();
                let mut len = 1;
                loop {
                    let Some(c) = chars.next() else {
                        return error("unterminated string", start);
                    };
                    len += c.len_utf8();
                    match c {
                        '"' => break,
                        '\\' => {
                            let Some(escaped) = chars.next() else {
                                return error("unterminated string", start);
                            };
                            len += escaped.len_utf8();
                            text.push(match escaped {
                                'n' => '\n',
                                'r' => '\r',
                                't' => '\t',
                                other => other,
                            });
                        }
                        c => text.push(c),
                    }
                }
                self.pos += len;
                Ok(Value::Str(text, start))
            }
            Some(_) => {
                let rest = &src[start..];
                let len = rest
                    .find(|c: char| c.is_whitespace() || c == '(' || c == ')' || c == '"')
                    .unwrap_or(rest.len());
                self.pos += len;
                Ok(Value::Atom(rest[..len].to_owned(), start))
            }
        }
    }

    fn values(&mut self) -> Result<Vec<Value>, SxpError> {
        let mut values = Vec::new();
        loop {
            self.skip_whitespace();
            if self.pos == self.src.len() {
                return Ok(values);
            }
            values.push(self.value()?);
        }
    }
}

fn expr(value: Value) -> Result<Expr, SxpError> {
    let (items, offset) = match value {
        Value::Atom(id, _) => return Ok(Expr::Id(id)),
        Value::Str(literal, _) => return Ok(Expr::Literal(literal)),
        Value::List(items, offset) => (items, offset),
    };

    let mut items = items.into_iter();
    let head = match items.next() {
        None => return Ok(Expr::Empty),
        Some(Value::Atom(head, _)) => head,
        Some(other) => return error("expected an operator", other.offset()),
    };
    let args = items.collect::<Vec<_>>();

    let string = |args: Vec<Value>| -> Result<String, SxpError> {
        match <[Value; 1]>::try_from(args) {
            Ok([Value::Str(s, _)]) => Ok(s),
            _ => error(format!("{head} takes a single string"), offset),
        }
    };
    let unary = |args: Vec<Value>| -> Result<Box<Expr>, SxpError> {
        match <[Value; 1]>::try_from(args) {
            Ok([a]) => Ok(Box::new(expr(a)?)),
            _ => error(format!("{head} takes one operand"), offset),
        }
    };

    Ok(match head.as_str() {
        "seq" => Expr::Seq(args.into_iter().map(expr).collect::<Result<_, _>>()?),
        "alt" => Expr::Alt(args.into_iter().map(expr).collect::<Result<_, _>>()?),
        "diff" => match <[Value; 2]>::try_from(args) {
            Ok([a, b]) => Expr::Diff(Box::new(expr(a)?), Box::new(expr(b)?)),
            _ => return error("diff takes two operands", offset),
        },
        "opt" => Expr::Opt(unary(args)?),
        "star" => Expr::Star(unary(args)?),
        "plus" => Expr::Plus(unary(args)?),
        "range" => Expr::Range(string(args)?),
        "hex" => Expr::Hex(string(args)?),
        _ => return error(format!("unknown operator {head}"), offset),
    })
}

fn rule(value: Value) -> Result<Rule, SxpError> {
    let offset = value.offset();
    let Value::List(items, _) = value else {
        return error("expected a rule", offset);
    };
    let Ok([number, symbol, kind, body]) = <[Value; 4]>::try_from(items) else {
        return error("a rule is (number symbol kind expr)", offset);
    };

    let number = match number {
        Value::Str(number, _) => number,
        other => return error("expected a rule number", other.offset()),
    };
    let symbol = match symbol {
        Value::Atom(s, _) if s == "nil" => None,
        Value::Atom(s, _) => Some(s),
        other => return error("expected a symbol", other.offset()),
    };
    let kind = match kind {
        Value::Atom(k, o) => match RuleKind::from_name(&k) {
            Some(kind) => kind,
            None => return error(format!("unknown rule kind {k}"), o),
        },
        other => return error("expected a rule kind", other.offset()),
    };

    Ok(Rule::new(&number, symbol.as_deref(), kind, expr(body)?))
}

/// Reads rules written by [`Sxp`], either wrapped in one list or one after another.
pub fn parse_rules(src: &str) -> Result<Vec<Rule>, SxpError> {
    let mut values = Reader { src, pos: 0 }.values()?;

    let wrapped = match values.as_slice() {
        [Value::List(items, _)] => items.iter().all(|v| matches!(v, Value::List(..))),
        _ => false,
    };
    if wrapped {
        if let Some(Value::List(items, _)) = values.pop() {
            values = items;
        }
    }

    values.into_iter().map(rule).collect()
}

/// Reads a single expression.
pub fn parse_expr(src: &str) -> Result<Expr, SxpError> {
    let mut reader = Reader { src, pos: 0 };
    let value = reader.value()?;
    reader.skip_whitespace();
    if reader.pos != src.len() {
        return error("trailing input", reader.pos);
    }
    expr(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::compile_expr;

    #[test]
    fn test_write() {
        let rule = Rule::new(
            "2",
            Some("Prolog"),
            RuleKind::Rule,
            compile_expr("BaseDecl? PrefixDecl*").unwrap(),
        );
        assert_eq!(
            Sxp(&rule).to_string(),
            r#"("2" Prolog rule (seq (opt BaseDecl) (star PrefixDecl)))"#
        );

        let pass = Rule::new("0", None, RuleKind::Pass, Expr::Empty);
        assert_eq!(Sxp(&pass).to_string(), r#"("0" nil pass ())"#);

        let expr = compile_expr(r#"'"' | [^"\\] - #x20 | ()"#).unwrap();
        assert_eq!(
            Sxp(&expr).to_string(),
            r##"(alt "\"" (diff (range "^\"\\\\") (hex "#x20")) (seq))"##
        );
    }

    #[test]
    fn test_read() {
        let expr = compile_expr(r#"a ('b"' | [x-z]+)? - c"#).unwrap();
        assert_eq!(parse_expr(&Sxp(&expr).to_string()).unwrap(), expr);

        let rules = parse_rules(r#"("1" a rule b) ("2" B token (seq))"#).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].kind, RuleKind::Token);
        assert_eq!(rules[1].expr, Expr::Seq(vec![]));
    }

    #[test]
    fn test_read_errors() {
        assert_eq!(parse_expr("(opt a b)").unwrap_err().offset, 0);
        assert!(parse_expr("(frob a)").is_err());
        assert!(parse_expr("(seq a").is_err());
        assert!(parse_expr("\"open").is_err());
        assert!(parse_rules(r#"("1" a nope b)"#).is_err());
        assert!(parse_rules(r#"(1 a rule b)"#).is_err());
    }
}
