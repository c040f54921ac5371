//! Turtle description of a grammar, every rule becomes a resource carrying
//! its original text as a comment and its expression as nested `ebnf:` terms.

use std::fmt::{self, Display, Write};

use crate::ast::{Expr, Rule, RuleKind};

const PREFIXES: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("dc", "http://purl.org/dc/terms/"),
    ("ebnf", "http://www.w3.org/ns/ebnf#"),
    ("re", "http://www.w3.org/2000/10/swap/grammar/regex#"),
];

pub const DEFAULT_BASE: &str = "http://example.org/grammar#";

/// A Turtle string literal.
pub struct Escaped<'a>(pub &'a str);

impl Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        for c in self.0.chars() {
            match c {
                '\\' => f.write_str("\\\\")?,
                '"' => f.write_str("\\\"")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                '\t' => f.write_str("\\t")?,
                c => f.write_char(c)?,
            }
        }
        f.write_char('"')
    }
}

/// The regular expression matching a range or codepoint.
fn pattern(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Range(r) => Some(format!("[{r}]")),
        Expr::Hex(h) => Some(match h.strip_prefix("#x") {
            Some(digits) if u32::from_str_radix(digits, 16).is_ok() => format!("\\x{{{digits}}}"),
            _ => h.clone(),
        }),
        _ => None,
    }
}

/// The expression in object position.
struct Node<'a>(&'a Expr);

impl Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expr::Id(id) => write!(f, ":{id}"),
            Expr::Literal(l) => write!(f, "{}", Escaped(l)),
            Expr::Empty => f.write_str("rdf:nil"),
            expr => write!(f, "[ {} ]", Predicates(expr)),
        }
    }
}

fn collection(f: &mut fmt::Formatter<'_>, name: &str, items: &[&Expr]) -> fmt::Result {
    write!(f, "ebnf:{name} (")?;
    for item in items {
        write!(f, " {}", Node(item))?;
    }
    f.write_str(" )")
}

/// The expression as the predicates of the resource describing it.
struct Predicates<'a>(&'a Expr);

impl Display for Predicates<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expr = self.0;
        match expr {
            Expr::Seq(items) => collection(f, "seq", &items.iter().collect::<Vec<_>>()),
            Expr::Alt(items) => collection(f, "alt", &items.iter().collect::<Vec<_>>()),
            Expr::Diff(a, b) => collection(f, "diff", &[&**a, &**b]),
            Expr::Opt(a) => write!(f, "ebnf:opt {}", Node(a)),
            Expr::Star(a) => write!(f, "ebnf:star {}", Node(a)),
            Expr::Plus(a) => write!(f, "ebnf:plus {}", Node(a)),
            Expr::Range(_) | Expr::Hex(_) => {
                let pattern = pattern(expr).unwrap_or_default();
                write!(f, "re:matches {}", Escaped(&pattern))
            }
            Expr::Id(_) | Expr::Literal(_) | Expr::Empty => collection(f, "seq", &[expr]),
        }
    }
}

/// Writes a grammar as Turtle, local names resolve against `base`.
pub struct Ttl<'a> {
    pub rules: &'a [Rule],
    pub base: &'a str,
}

impl Display for Ttl<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (prefix, iri) in PREFIXES {
            writeln!(f, "@prefix {prefix}: <{iri}> .")?;
        }
        writeln!(f, "@prefix : <{}> .", self.base)?;

        for rule in self.rules {
            f.write_char('\n')?;
            match &rule.symbol {
                Some(symbol) => write!(f, ":{symbol} rdfs:label {};\n ", Escaped(symbol))?,
                None => f.write_str("[]")?,
            }
            writeln!(f, " rdf:value {};", Escaped(&rule.number))?;
            if !rule.original_text.is_empty() {
                writeln!(f, "  rdfs:comment {};", Escaped(&rule.original_text))?;
            }
            let class = match rule.kind {
                RuleKind::Rule => "ebnf:NonTerminal",
                RuleKind::Token => "ebnf:Terminal",
                RuleKind::Pass => "ebnf:Pass",
            };
            writeln!(f, "  a {class};")?;
            writeln!(f, "  {} .", Predicates(&rule.expr))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::compile;

    #[test]
    fn test_escaping() {
        assert_eq!(
            Escaped("say \"hi\"\\\n\tok").to_string(),
            r#""say \"hi\"\\\n\tok""#
        );
    }

    #[test]
    fn test_rule() {
        let rules = compile("[2] Prolog ::= BaseDecl? \"\\\" | [a-z]\n@pass #x20+").unwrap();
        let ttl = Ttl {
            rules: &rules,
            base: DEFAULT_BASE,
        }
        .to_string();

        assert!(ttl.contains("@prefix : <http://example.org/grammar#> ."));
        assert!(ttl.contains(":Prolog rdfs:label \"Prolog\";"));
        assert!(ttl.contains(r#"rdfs:comment "[2] Prolog ::= BaseDecl? \"\\\" | [a-z]";"#));
        assert!(ttl.contains(
            r#"ebnf:alt ( [ ebnf:seq ( [ ebnf:opt :BaseDecl ] "\\" ) ] [ re:matches "[a-z]" ] ) ."#
        ));
        assert!(ttl.contains("[] rdf:value \"0\";"));
        assert!(ttl.contains(r#"ebnf:plus [ re:matches "\\x{20}" ] ."#));
    }
}
