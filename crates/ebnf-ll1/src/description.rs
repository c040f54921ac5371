//! Loading a [`Language`] from a JSON description.
//!
//! ```json
//! {
//!   "terminals": [
//!     { "name": "NUM", "pattern": "[0-9]+" },
//!     { "name": null, "pattern": "[-+*/()]" }
//!   ],
//!   "start": "expr",
//!   "branch": {
//!     "expr": { "NUM": ["NUM", "tail"], "(": ["(", "expr", ")", "tail"] },
//!     "tail": { "+": ["+", "expr"], "ebnf:empty": [] }
//!   },
//!   "follow": { "expr": [")"], "tail": [")"] }
//! }
//! ```
//!
//! Names are classified when loading: a declared terminal name is a terminal,
//! a name with a branch entry is a production, anything else is a literal.

use std::{collections::BTreeMap, io::Read};

use serde::{Deserialize, Serialize};

use crate::{
    error::LanguageError,
    language::{Language, LanguageBuilder},
    lexer::LexerOptions,
    table::{Lookahead, Term},
};

/// The branch table key of the empty expansion.
pub const EMPTY_KEY: &str = "ebnf:empty";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct TerminalDescription {
    /// `None` for literal terminals.
    pub name: Option<String>,
    pub pattern: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unescape: bool,
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct LanguageDescription {
    /// In priority order.
    pub terminals: Vec<TerminalDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default)]
    pub branch: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub follow: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unescape_codepoints: bool,
}

impl LanguageDescription {
    pub fn from_json(src: &str) -> Result<LanguageDescription, LanguageError> {
        Ok(serde_json::from_str(src)?)
    }

    pub fn from_reader(reader: impl Read) -> Result<LanguageDescription, LanguageError> {
        Ok(serde_json::from_reader(reader)?)
    }

    fn is_terminal(&self, name: &str) -> bool {
        self.terminals
            .iter()
            .any(|t| t.name.as_deref() == Some(name))
    }

    fn lookahead(&self, builder: &mut LanguageBuilder, name: &str) -> Lookahead {
        match self.is_terminal(name) {
            true => Lookahead::Terminal(builder.terminal_symbol(name)),
            false => Lookahead::Literal(name.into()),
        }
    }

    fn term(&self, builder: &mut LanguageBuilder, name: &str) -> Term {
        if !self.is_terminal(name) && self.branch.contains_key(name) {
            return Term::Production(builder.production(name));
        }
        self.lookahead(builder, name).into()
    }

    fn options(&self) -> Result<LexerOptions, LanguageError> {
        let invalid = |name: &str| {
            let name = name.to_owned();
            move |error| LanguageError::InvalidPattern {
                terminal: name,
                error,
            }
        };

        let mut options = LexerOptions::default().unescape_codepoints(self.unescape_codepoints);
        if let Some(whitespace) = &self.whitespace {
            options = options
                .whitespace(whitespace)
                .map_err(invalid("whitespace"))?;
        }
        if let Some(comment) = &self.comment {
            options = options
                .comment(Some(comment))
                .map_err(invalid("comment"))?;
        }
        Ok(options)
    }

    pub fn to_language(&self) -> Result<Language, LanguageError> {
        let mut builder = Language::builder();

        for terminal in &self.terminals {
            match (&terminal.name, terminal.unescape) {
                (Some(name), false) => {
                    builder.terminal(name, &terminal.pattern)?;
                }
                (Some(name), true) => {
                    builder.unescaped_terminal(name, &terminal.pattern)?;
                }
                (None, _) => builder.literal_pattern(&terminal.pattern)?,
            }
        }

        // productions are interned first, in name order, so handles are stable
        for production in self.branch.keys() {
            builder.production(production);
        }

        for (production, branches) in &self.branch {
            let handle = builder.production(production);
            builder.declare(handle);
            for (lookahead, expansion) in branches {
                if lookahead == EMPTY_KEY {
                    builder.empty(handle);
                    continue;
                }
                let lookahead = self.lookahead(&mut builder, lookahead);
                let expansion = expansion
                    .iter()
                    .map(|name| self.term(&mut builder, name))
                    .collect::<Vec<_>>();
                builder.branch(handle, lookahead, expansion);
            }
        }

        for (production, follows) in &self.follow {
            let handle = builder.production(production);
            let lookaheads = follows
                .iter()
                .map(|name| self.lookahead(&mut builder, name))
                .collect::<Vec<_>>();
            builder.follow(handle, lookaheads);
        }

        if let Some(start) = &self.start {
            if !self.branch.contains_key(start) {
                return Err(LanguageError::UnknownProduction(start.clone()));
            }
            let start = builder.production(start);
            builder.start(start);
        }

        builder.options(self.options()?);
        Ok(builder.build())
    }
}
