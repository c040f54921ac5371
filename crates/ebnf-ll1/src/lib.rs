//! Runtime for table driven LL(1) parsing.
//!
//! A [`Language`] bundles the ordered terminal patterns the [`Lexer`] tokenizes
//! with and the precomputed branch and FOLLOW tables; the [`Parser`] walks
//! those tables with an explicit stack and calls back into a [`Grammar`] of
//! semantic actions.

pub mod description;
pub mod error;
pub mod grammar;
pub mod language;
pub mod lexer;
pub mod parser;
pub mod scanner;
pub mod symbol;
pub mod table;
pub mod unescape;

pub use description::LanguageDescription;
pub use error::{LanguageError, LexError, ParseError, ParseErrorKind};
pub use grammar::{Grammar, GrammarBuilder};
pub use language::{lit, Language, LanguageBuilder};
pub use lexer::{Lexer, LexerOptions, TerminalTable, Token};
pub use parser::{ParseOptions, ParseReport, Parser};
pub use symbol::{ProductionHandle, RcString, Symbols, TerminalHandle};
pub use table::{Lookahead, Term};
