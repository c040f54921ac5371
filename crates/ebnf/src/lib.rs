//! Compiler for W3C style EBNF grammar text.
//!
//! ```text
//! [1] Document ::= Statement*
//! [2] Statement ::= Subject Predicate Object '.'
//! @terminals
//! [3] IRI ::= '<' [^<>"{}|^`\\]* '>'
//! @pass [ \t\r\n]+
//! ```
//!
//! Every rule is compiled into an [`Expr`] tree, the resulting [`Ebnf`] can
//! be written back out as S-expressions, Turtle or JSON.

pub mod ast;
pub mod error;
mod lexer;
mod parser;
pub mod rules;
pub mod sxp;
pub mod ttl;

use serde::{Deserialize, Serialize};

pub use ast::{Expr, Rule, RuleKind};
pub use error::{GrammarSyntaxError, SxpError};
pub use parser::compile_expr;
pub use rules::compile;

/// A compiled grammar, rules in source order.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize, Debug)]
#[serde(transparent)]
pub struct Ebnf {
    rules: Vec<Rule>,
}

impl Ebnf {
    pub fn compile(src: &str) -> Result<Ebnf, GrammarSyntaxError> {
        let rules = rules::compile(src)?;
        log::debug!("compiled {} rules", rules.len());
        Ok(Ebnf { rules })
    }

    pub fn from_sxp(src: &str) -> Result<Ebnf, SxpError> {
        Ok(Ebnf {
            rules: sxp::parse_rules(src)?,
        })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn lookup(&self, symbol: &str) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|rule| rule.symbol.as_deref() == Some(symbol))
    }

    /// The first rule which is not a `@pass` rule.
    pub fn start(&self) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.kind != RuleKind::Pass)
    }

    pub fn to_sxp(&self) -> String {
        sxp::Sxp(self.rules.as_slice()).to_string()
    }

    pub fn to_ttl(&self, base: &str) -> String {
        ttl::Ttl {
            rules: &self.rules,
            base,
        }
        .to_string()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<Vec<Rule>> for Ebnf {
    fn from(rules: Vec<Rule>) -> Self {
        Ebnf { rules }
    }
}
