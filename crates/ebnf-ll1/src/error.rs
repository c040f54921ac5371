use std::{error, fmt, io};

/// The lexer could not produce the next token.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LexError {
    /// No terminal pattern matches at the current position.
    InvalidToken { lexeme: String, line: u32 },
    /// Reading more input from a streamed source failed, the lexer is exhausted afterwards.
    Io { message: String, line: u32 },
}

impl LexError {
    pub(crate) fn io(err: io::Error, line: u32) -> LexError {
        LexError::Io {
            message: err.to_string(),
            line,
        }
    }
    pub fn line(&self) -> u32 {
        match self {
            LexError::InvalidToken { line, .. } | LexError::Io { line, .. } => *line,
        }
    }
    /// The text at the offending position, empty for I/O failures.
    pub fn lexeme(&self) -> &str {
        match self {
            LexError::InvalidToken { lexeme, .. } => lexeme,
            LexError::Io { .. } => "",
        }
    }
}

impl error::Error for LexError {}
impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::InvalidToken { lexeme, line } => {
                write!(f, "Invalid token {lexeme:?} at line {line}")
            }
            LexError::Io { message, line } => {
                write!(f, "Failed to read input after line {line}: {message}")
            }
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ParseErrorKind {
    Lex(LexError),
    /// The lookahead token is not valid at this point of the production.
    Syntax { expected: Vec<String> },
    /// Input ended while the production still required something.
    UnexpectedEnd { expected: Vec<String> },
    /// The branch table has no entry at all for the production, the tables do not
    /// belong together.
    Structural,
    /// The start production was completed before the end of input.
    TrailingInput,
}

/// An error encountered by the [`Parser`](crate::parser::Parser).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: u32,
    /// The innermost production being parsed when the error occured.
    pub production: Option<String>,
    /// The representation of the offending token.
    pub found: Option<String>,
}

impl ParseError {
    pub fn is_lex(&self) -> bool {
        matches!(self.kind, ParseErrorKind::Lex(_))
    }
    pub fn is_syntax(&self) -> bool {
        matches!(
            self.kind,
            ParseErrorKind::Syntax { .. } | ParseErrorKind::UnexpectedEnd { .. }
        )
    }
    pub fn is_structural(&self) -> bool {
        matches!(self.kind, ParseErrorKind::Structural)
    }
}

impl error::Error for ParseError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.kind {
            ParseErrorKind::Lex(err) => Some(err),
            _ => None,
        }
    }
}

struct ExpectedDisplay<'a>(&'a [String]);
impl fmt::Display for ExpectedDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            [] => write!(f, "nothing"),
            [one] => write!(f, "{one}"),
            many => write!(f, "one of {}", many.join(", ")),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParseErrorKind::Lex(err) => write!(f, "{err}")?,
            ParseErrorKind::Syntax { expected } => {
                write!(f, "Expected {}", ExpectedDisplay(expected))?
            }
            ParseErrorKind::UnexpectedEnd { expected } => write!(
                f,
                "End of input before end of production, expected {}",
                ExpectedDisplay(expected)
            )?,
            ParseErrorKind::Structural => write!(f, "No branches found for production")?,
            ParseErrorKind::TrailingInput => write!(f, "Finished processing before end of input")?,
        }
        if let Some(found) = &self.found {
            write!(f, ", found {found}")?;
        }
        if !matches!(self.kind, ParseErrorKind::Lex(_)) {
            write!(f, " at line {}", self.line)?;
        }
        if let Some(production) = &self.production {
            write!(f, ", production = {production}")?;
        }
        Ok(())
    }
}

/// A terminal table or language description could not be built.
#[derive(Debug)]
pub enum LanguageError {
    InvalidPattern {
        terminal: String,
        error: regex::Error,
    },
    InvalidDescription(serde_json::Error),
    UnknownProduction(String),
}

impl error::Error for LanguageError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            LanguageError::InvalidPattern { error, .. } => Some(error),
            LanguageError::InvalidDescription(error) => Some(error),
            LanguageError::UnknownProduction(_) => None,
        }
    }
}

impl fmt::Display for LanguageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageError::InvalidPattern { terminal, error } => {
                write!(f, "Invalid pattern for terminal {terminal}\n{error}")
            }
            LanguageError::InvalidDescription(e) => write!(f, "Invalid language description\n{e}"),
            LanguageError::UnknownProduction(name) => {
                write!(f, "Production {name} has no branch table entry")
            }
        }
    }
}

impl From<serde_json::Error> for LanguageError {
    fn from(value: serde_json::Error) -> Self {
        LanguageError::InvalidDescription(value)
    }
}
