use std::{fmt::Debug, io::BufRead};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::LexError,
    scanner::{Scanner, HIGH_WATER, LOW_WATER},
    symbol::{RcString, Symbols, TerminalHandle},
    table::Lookahead,
    unescape::unescape_string,
};

/// Compiles a pattern so that it only matches at the start of the haystack.
pub fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})"))
}

static WHITESPACE: Lazy<Regex> = Lazy::new(|| anchored(r"[ \t\r\n]+").unwrap());
static COMMENT: Lazy<Regex> = Lazy::new(|| anchored(r"#[^\n]*").unwrap());
static MULTILINE_START: Lazy<Regex> = Lazy::new(|| anchored(r#"'''|""""#).unwrap());

/// How many characters of an unmatchable lexeme are kept for diagnostics.
const MAX_LEXEME_CHARS: usize = 100;

#[derive(Clone, Debug)]
pub struct TerminalRule {
    pub kind: Option<TerminalHandle>,
    pub pattern: Regex,
    /// Decode string escapes in the matched text.
    pub unescape: bool,
}

/// The ordered terminal patterns of a language.
///
/// Order is priority: the lexer commits to the first rule whose pattern
/// matches, later rules are not consulted even if they would match more text.
#[derive(Clone, Default, Debug)]
pub struct TerminalTable {
    rules: Vec<TerminalRule>,
}

impl TerminalTable {
    pub fn new() -> TerminalTable {
        Self::default()
    }
    /// Appends a rule, a `kind` of `None` declares a literal terminal which is identified by its text.
    pub fn push(
        &mut self,
        kind: Option<TerminalHandle>,
        pattern: &str,
        unescape: bool,
    ) -> Result<(), regex::Error> {
        let pattern = anchored(pattern)?;
        self.rules.push(TerminalRule {
            kind,
            pattern,
            unescape,
        });
        Ok(())
    }
    pub fn rules(&self) -> &[TerminalRule] {
        &self.rules
    }
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

#[derive(Clone, Debug)]
pub struct LexerOptions {
    /// Skipped between tokens, newlines in it are counted.
    pub whitespace: Regex,
    /// Skipped between tokens, must not span lines.
    pub comment: Option<Regex>,
    /// Recognizes the opening delimiter of terminals that may span lines. When
    /// streaming, input is read at such a position until the delimiter recurs.
    pub multiline_start: Option<Regex>,
    /// Decode `\uXXXX` and `\UXXXXXXXX` throughout the input before scanning it.
    pub unescape_codepoints: bool,
    pub low_water: usize,
    pub high_water: usize,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self {
            whitespace: WHITESPACE.clone(),
            comment: Some(COMMENT.clone()),
            multiline_start: Some(MULTILINE_START.clone()),
            unescape_codepoints: false,
            low_water: LOW_WATER,
            high_water: HIGH_WATER,
        }
    }
}

impl LexerOptions {
    pub fn whitespace(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.whitespace = anchored(pattern)?;
        Ok(self)
    }
    pub fn comment(mut self, pattern: Option<&str>) -> Result<Self, regex::Error> {
        self.comment = pattern.map(anchored).transpose()?;
        Ok(self)
    }
    pub fn multiline_start(mut self, pattern: Option<&str>) -> Result<Self, regex::Error> {
        self.multiline_start = pattern.map(anchored).transpose()?;
        Ok(self)
    }
    pub fn unescape_codepoints(mut self, unescape: bool) -> Self {
        self.unescape_codepoints = unescape;
        self
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    /// `None` for literal terminals, which are identified by their text.
    pub kind: Option<TerminalHandle>,
    pub text: String,
    /// The line the token starts on.
    pub line: u32,
}

impl Token {
    /// Whether the token is accepted where `lookahead` is expected; named
    /// terminals compare by kind, literals by exact text.
    pub fn matches(&self, lookahead: &Lookahead) -> bool {
        match lookahead {
            Lookahead::Terminal(kind) => self.kind == Some(*kind),
            Lookahead::Literal(text) => self.text == **text,
        }
    }

    /// The key this token is looked up by in branch tables.
    pub fn lookahead(&self) -> Lookahead {
        match self.kind {
            Some(kind) => Lookahead::Terminal(kind),
            None => Lookahead::Literal(RcString::from(self.text.as_str())),
        }
    }

    /// The representation of the token for diagnostics, its kind or its quoted text.
    pub fn describe(&self, symbols: &Symbols) -> String {
        match self.kind {
            Some(kind) => format!("{} {:?}", symbols.terminal_name(kind), self.text),
            None => format!("{:?}", self.text),
        }
    }
}

/// Turns text into tokens on demand, with one token of lookahead.
///
/// Tokens are produced lazily, an unmatchable position is only reported once
/// the lookahead reaches it.
pub struct Lexer<'a> {
    scanner: Scanner<'a>,
    table: &'a TerminalTable,
    options: LexerOptions,
    line: u32,
    first: Option<Token>,
    exhausted: bool,
    fused: bool,
}

impl<'a> Lexer<'a> {
    pub fn tokenize(src: &'a str, table: &'a TerminalTable, options: LexerOptions) -> Lexer<'a> {
        let scanner = Scanner::new(src, options.unescape_codepoints);
        Self::with_scanner(scanner, table, options)
    }

    pub fn from_reader(
        reader: impl BufRead + 'a,
        table: &'a TerminalTable,
        options: LexerOptions,
    ) -> Lexer<'a> {
        let scanner = Scanner::from_reader(reader, options.unescape_codepoints)
            .with_water_marks(options.low_water, options.high_water);
        Self::with_scanner(scanner, table, options)
    }

    fn with_scanner(
        scanner: Scanner<'a>,
        table: &'a TerminalTable,
        options: LexerOptions,
    ) -> Lexer<'a> {
        Lexer {
            scanner,
            table,
            options,
            line: 1,
            first: None,
            exhausted: false,
            fused: false,
        }
    }

    /// The current line, 1-based.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// The lookahead token, without consuming it. `None` once input is exhausted.
    ///
    /// On error the position is left at the offending text, calling this again
    /// reports the same error; [`Lexer::recover`] moves past it.
    pub fn first(&mut self) -> Result<Option<&Token>, LexError> {
        if self.first.is_none() && !self.exhausted {
            match self.next_token() {
                Ok(Some(token)) => self.first = Some(token),
                Ok(None) => self.exhausted = true,
                Err(err) => {
                    if let LexError::Io { .. } = err {
                        self.exhausted = true;
                    }
                    return Err(err);
                }
            }
        }
        Ok(self.first.as_ref())
    }

    /// Consumes and returns the lookahead token.
    pub fn shift(&mut self) -> Result<Option<Token>, LexError> {
        self.first()?;
        Ok(self.first.take())
    }

    /// Skips unmatchable text up to the next whitespace or comment, as many
    /// times as needed, and returns the next valid token.
    pub fn recover(&mut self) -> Result<Option<&Token>, LexError> {
        if self.first.is_none() && !self.exhausted {
            loop {
                if self.skip_whitespace()? {
                    self.exhausted = true;
                    break;
                }
                if let Some(token) = self.match_token()? {
                    self.first = Some(token);
                    break;
                }
                let len = self.lexeme_len();
                let skipped = self.scanner.advance(len);
                log::trace!("recover: skipped {skipped:?}");
            }
        }
        Ok(self.first.as_ref())
    }

    fn io_error(&mut self, err: std::io::Error) -> LexError {
        self.exhausted = true;
        LexError::io(err, self.line)
    }

    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        if self.skip_whitespace()? {
            return Ok(None);
        }
        match self.match_token()? {
            Some(token) => Ok(Some(token)),
            None => {
                let len = self.lexeme_len();
                let lexeme: String = self.scanner.rest()[..len]
                    .chars()
                    .take(MAX_LEXEME_CHARS)
                    .collect();
                Err(LexError::InvalidToken {
                    lexeme,
                    line: self.line,
                })
            }
        }
    }

    /// Skips whitespace and comments, returns whether the end of input was reached.
    fn skip_whitespace(&mut self) -> Result<bool, LexError> {
        loop {
            if self.scanner.is_at_end().map_err(|e| self.io_error(e))? {
                return Ok(true);
            }
            if let Some(len) = self.scanner.match_len(&self.options.whitespace) {
                if len > 0 {
                    let skipped = self.scanner.advance(len);
                    self.line += count_lines(skipped);
                    continue;
                }
            }
            if let Some(comment) = &self.options.comment {
                if let Some(len) = self.scanner.match_len(comment) {
                    if len > 0 {
                        self.scanner.advance(len);
                        continue;
                    }
                }
            }
            return Ok(false);
        }
    }

    /// Tries the terminal rules in order and commits to the first match.
    fn match_token(&mut self) -> Result<Option<Token>, LexError> {
        self.feed_multiline()?;

        let table = self.table;
        for rule in table.rules() {
            // an empty token would never advance
            let len = self.scanner.match_len(&rule.pattern).filter(|&len| len > 0);
            if let Some(len) = len {
                let line = self.line;
                let matched = self.scanner.advance(len);
                self.line += count_lines(matched);

                let text = match rule.unescape {
                    true => unescape_string(matched).into_owned(),
                    false => matched.to_owned(),
                };
                return Ok(Some(Token {
                    kind: rule.kind,
                    text,
                    line,
                }));
            }
        }
        Ok(None)
    }

    /// If the cursor is at the start of a multi-line terminal, reads input until
    /// its opening delimiter occurs again or the input ends.
    fn feed_multiline(&mut self) -> Result<(), LexError> {
        let Some(start) = &self.options.multiline_start else {
            return Ok(());
        };
        if !self.scanner.is_streaming() {
            return Ok(());
        }
        let Some(len) = self.scanner.match_len(start).filter(|&len| len > 0) else {
            return Ok(());
        };

        let delimiter = self.scanner.rest()[..len].to_owned();
        while !self.scanner.rest()[len..].contains(&delimiter) {
            match self.scanner.feed() {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => return Err(self.io_error(e)),
            }
        }
        Ok(())
    }

    /// Length of the text up to the next whitespace or comment, at least one character.
    fn lexeme_len(&self) -> usize {
        let rest = self.scanner.rest();
        let comment = self.options.comment.as_ref();
        rest.char_indices()
            .skip(1)
            .map(|(i, _)| i)
            .find(|&i| {
                let tail = &rest[i..];
                self.options.whitespace.is_match(tail)
                    || comment.map_or(false, |c| c.is_match(tail))
            })
            .unwrap_or(rest.len())
    }
}

fn count_lines(text: &str) -> u32 {
    text.bytes().filter(|&b| b == b'\n').count() as u32
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        match self.shift() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.fused = true;
                None
            }
            Err(err) => {
                self.fused = true;
                Some(Err(err))
            }
        }
    }
}

impl Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("line", &self.line)
            .field("first", &self.first)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}
