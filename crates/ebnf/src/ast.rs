use std::fmt::{self, Display, Write};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Rule,
    Token,
    Pass,
}

impl RuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::Rule => "rule",
            RuleKind::Token => "token",
            RuleKind::Pass => "pass",
        }
    }

    pub fn from_name(name: &str) -> Option<RuleKind> {
        match name {
            "rule" => Some(RuleKind::Rule),
            "token" => Some(RuleKind::Token),
            "pass" => Some(RuleKind::Pass),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Expr {
    Seq(Vec<Expr>),
    Alt(Vec<Expr>),
    Diff(Box<Expr>, Box<Expr>),
    Opt(Box<Expr>),
    Star(Box<Expr>),
    Plus(Box<Expr>),
    Literal(String),
    /// The text between the brackets of a character class.
    Range(String),
    /// A `#x` codepoint, including the `#`.
    Hex(String),
    Id(String),
    /// No expression at all, as opposed to the empty sequence.
    Empty,
}

impl Expr {
    /// Binding strength when printed, higher binds tighter.
    fn precedence(&self) -> u8 {
        match self {
            Expr::Alt(_) => 0,
            Expr::Seq(children) if !children.is_empty() => 1,
            Expr::Diff(..) => 2,
            Expr::Opt(_) | Expr::Star(_) | Expr::Plus(_) => 3,
            _ => 4,
        }
    }

    /// Identifiers referenced by the expression, in order of first occurrence.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Seq(children) | Expr::Alt(children) => {
                for child in children {
                    child.collect_references(out);
                }
            }
            Expr::Diff(a, b) => {
                a.collect_references(out);
                b.collect_references(out);
            }
            Expr::Opt(a) | Expr::Star(a) | Expr::Plus(a) => a.collect_references(out),
            Expr::Id(id) => {
                if !out.contains(&id.as_str()) {
                    out.push(id);
                }
            }
            Expr::Literal(_) | Expr::Range(_) | Expr::Hex(_) | Expr::Empty => {}
        }
    }
}

struct Operand<'a>(&'a Expr, u8);

impl Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Operand(expr, min) = *self;
        match expr.precedence() < min {
            true => write!(f, "({expr})"),
            false => write!(f, "{expr}"),
        }
    }
}

/// Prints the expression in EBNF notation, parenthesized only where needed.
impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Seq(children) if children.is_empty() => f.write_str("()"),
            Expr::Seq(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_char(' ')?;
                    }
                    write!(f, "{}", Operand(child, 2))?;
                }
                Ok(())
            }
            Expr::Alt(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{}", Operand(child, 1))?;
                }
                Ok(())
            }
            Expr::Diff(a, b) => write!(f, "{} - {}", Operand(a, 3), Operand(b, 4)),
            Expr::Opt(a) => write!(f, "{}?", Operand(a, 4)),
            Expr::Star(a) => write!(f, "{}*", Operand(a, 4)),
            Expr::Plus(a) => write!(f, "{}+", Operand(a, 4)),
            Expr::Literal(l) if l.contains('"') => write!(f, "'{l}'"),
            Expr::Literal(l) => write!(f, "\"{l}\""),
            Expr::Range(r) => write!(f, "[{r}]"),
            Expr::Hex(h) => f.write_str(h),
            Expr::Id(id) => f.write_str(id),
            Expr::Empty => Ok(()),
        }
    }
}

/// A single rule of a grammar.
///
/// Equality disregards where the rule came from, only its number, symbol,
/// kind and expression are compared.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Rule {
    pub number: String,
    /// Absent only for `@pass` rules.
    pub symbol: Option<String>,
    pub kind: RuleKind,
    pub expr: Expr,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub original_text: String,
    #[serde(default)]
    pub line: u32,
}

impl Rule {
    pub fn new(number: &str, symbol: Option<&str>, kind: RuleKind, expr: Expr) -> Rule {
        Rule {
            number: number.to_owned(),
            symbol: symbol.map(str::to_owned),
            kind,
            expr,
            original_text: String::new(),
            line: 0,
        }
    }

    pub fn is_token(&self) -> bool {
        self.kind == RuleKind::Token
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
            && self.symbol == other.symbol
            && self.kind == other.kind
            && self.expr == other.expr
    }
}
impl Eq for Rule {}

impl Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.symbol) {
            (RuleKind::Pass, _) => write!(f, "@pass {}", self.expr),
            (_, Some(symbol)) => write!(f, "[{}] {symbol} ::= {}", self.number, self.expr),
            (_, None) => write!(f, "[{}] ::= {}", self.number, self.expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Expr {
        Expr::Id(s.into())
    }

    #[test]
    fn display_parenthesizes_by_precedence() {
        let expr = Expr::Seq(vec![
            Expr::Opt(Box::new(Expr::Alt(vec![id("a"), id("b")]))),
            Expr::Diff(
                Box::new(Expr::Star(Box::new(id("c")))),
                Box::new(Expr::Seq(vec![id("d"), id("e")])),
            ),
            Expr::Literal("x".into()),
            Expr::Plus(Box::new(Expr::Range("a-z".into()))),
        ]);
        assert_eq!(expr.to_string(), r#"(a | b)? c* - (d e) "x" [a-z]+"#);
    }

    #[test]
    fn display_quotes() {
        assert_eq!(Expr::Literal("\"".into()).to_string(), "'\"'");
        assert_eq!(Expr::Literal("'".into()).to_string(), "\"'\"");
        assert_eq!(Expr::Seq(vec![]).to_string(), "()");
    }

    #[test]
    fn references_are_unique() {
        let expr = Expr::Seq(vec![id("a"), Expr::Alt(vec![id("b"), id("a")])]);
        assert_eq!(expr.references(), ["a", "b"]);
    }
}
