use std::io::BufRead;

use crate::{
    error::LanguageError,
    lexer::{Lexer, LexerOptions, TerminalTable},
    symbol::{ProductionHandle, Symbols, TerminalHandle},
    table::{BranchTable, FollowTable, Lookahead, Term},
};

/// Everything the driver needs to know about a concrete language, the
/// terminals it is tokenized with and its precomputed LL(1) tables.
#[derive(Clone, Debug)]
pub struct Language {
    pub symbols: Symbols,
    pub terminals: TerminalTable,
    pub branch: BranchTable,
    pub follow: FollowTable,
    pub start: Option<ProductionHandle>,
    pub options: LexerOptions,
}

impl Language {
    pub fn builder() -> LanguageBuilder {
        LanguageBuilder::default()
    }

    pub fn tokenize<'a>(&'a self, src: &'a str) -> Lexer<'a> {
        Lexer::tokenize(src, &self.terminals, self.options.clone())
    }

    pub fn tokenize_reader<'a>(&'a self, reader: impl BufRead + 'a) -> Lexer<'a> {
        Lexer::from_reader(reader, &self.terminals, self.options.clone())
    }

    /// Looks up a production which has an entry in the branch table.
    pub fn production(&self, name: &str) -> Result<ProductionHandle, LanguageError> {
        self.symbols
            .production(name)
            .filter(|&p| self.branch.contains(p))
            .ok_or_else(|| LanguageError::UnknownProduction(name.to_owned()))
    }

    pub fn terminal(&self, name: &str) -> Option<TerminalHandle> {
        self.symbols.terminal(name)
    }
}

#[derive(Default)]
pub struct LanguageBuilder {
    symbols: Symbols,
    terminals: TerminalTable,
    branch: BranchTable,
    follow: FollowTable,
    start: Option<ProductionHandle>,
    options: LexerOptions,
}

impl LanguageBuilder {
    fn push_terminal(
        &mut self,
        kind: Option<TerminalHandle>,
        label: &str,
        pattern: &str,
        unescape: bool,
    ) -> Result<(), LanguageError> {
        self.terminals
            .push(kind, pattern, unescape)
            .map_err(|error| LanguageError::InvalidPattern {
                terminal: label.to_owned(),
                error,
            })
    }

    /// Appends a named terminal, terminals are tried in the order they are added.
    pub fn terminal(&mut self, name: &str, pattern: &str) -> Result<TerminalHandle, LanguageError> {
        let kind = self.symbols.intern_terminal(name);
        self.push_terminal(Some(kind), name, pattern, false)?;
        Ok(kind)
    }

    /// Appends a named terminal whose matched text has its escapes decoded.
    pub fn unescaped_terminal(
        &mut self,
        name: &str,
        pattern: &str,
    ) -> Result<TerminalHandle, LanguageError> {
        let kind = self.symbols.intern_terminal(name);
        self.push_terminal(Some(kind), name, pattern, true)?;
        Ok(kind)
    }

    /// Appends a literal terminal matching exactly `text`.
    pub fn literal(&mut self, text: &str) -> Result<(), LanguageError> {
        self.push_terminal(None, text, &regex::escape(text), false)
    }

    /// Appends a pattern whose matches become literal tokens, identified by their text.
    pub fn literal_pattern(&mut self, pattern: &str) -> Result<(), LanguageError> {
        self.push_terminal(None, pattern, pattern, false)
    }

    pub fn production(&mut self, name: &str) -> ProductionHandle {
        self.symbols.intern_production(name)
    }

    /// Interns a terminal name without giving it a pattern.
    pub fn terminal_symbol(&mut self, name: &str) -> TerminalHandle {
        self.symbols.intern_terminal(name)
    }

    /// Gives `production` a branch table entry, even if it has no branches.
    pub fn declare(&mut self, production: ProductionHandle) -> &mut Self {
        self.branch.entry(production);
        self
    }

    pub fn branch(
        &mut self,
        production: ProductionHandle,
        lookahead: Lookahead,
        expansion: impl IntoIterator<Item = Term>,
    ) -> &mut Self {
        let expansion = expansion.into_iter().collect::<Vec<_>>();
        self.branch
            .entry(production)
            .insert(lookahead, expansion.into());
        self
    }

    /// Lets `production` expand to nothing.
    pub fn empty(&mut self, production: ProductionHandle) -> &mut Self {
        self.branch.entry(production).set_empty();
        self
    }

    pub fn follow(
        &mut self,
        production: ProductionHandle,
        lookaheads: impl IntoIterator<Item = Lookahead>,
    ) -> &mut Self {
        let set = self.follow.entry(production);
        for lookahead in lookaheads {
            set.insert(lookahead);
        }
        self
    }

    pub fn start(&mut self, production: ProductionHandle) -> &mut Self {
        self.start = Some(production);
        self
    }

    pub fn options(&mut self, options: LexerOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Language {
        Language {
            symbols: self.symbols,
            terminals: self.terminals,
            branch: self.branch,
            follow: self.follow,
            start: self.start,
            options: self.options,
        }
    }
}

/// Shorthand for a literal [`Lookahead`].
pub fn lit(text: &str) -> Lookahead {
    Lookahead::Literal(text.into())
}
