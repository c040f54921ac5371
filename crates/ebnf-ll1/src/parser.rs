use crate::{
    error::{LexError, ParseError, ParseErrorKind},
    grammar::Grammar,
    language::Language,
    lexer::{Lexer, Token},
    symbol::ProductionHandle,
    table::{Expansion, Term},
};

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct ParseOptions {
    /// Abort on the first error instead of recovering from it.
    pub validate: bool,
}

/// The outcome of a parse which ran to completion.
#[derive(Debug)]
pub struct ParseReport<D> {
    /// The data of the root, the parent of the start production.
    pub data: D,
    /// Errors which were recovered from, in the order they were encountered.
    pub errors: Vec<ParseError>,
}

impl<D> ParseReport<D> {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A table driven LL(1) parser.
///
/// Productions are expanded on an explicit stack, so the depth of the input is
/// only bounded by memory.
pub struct Parser<'a, D, C> {
    language: &'a Language,
    grammar: &'a Grammar<D, C>,
    options: ParseOptions,
}

impl<'a, D: Default, C> Parser<'a, D, C> {
    pub fn new(language: &'a Language, grammar: &'a Grammar<D, C>) -> Parser<'a, D, C> {
        Parser {
            language,
            grammar,
            options: ParseOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Parses the tokens of `lexer` as `start`.
    ///
    /// Every production which was started has been finished by the time this
    /// returns, also when it returns an error.
    pub fn parse(
        &self,
        lexer: Lexer<'_>,
        start: ProductionHandle,
        context: &mut C,
    ) -> Result<ParseReport<D>, ParseError> {
        let mut run = Run {
            language: self.language,
            grammar: self.grammar,
            options: self.options,
            lexer,
            context,
            stack: Vec::new(),
            root: D::default(),
            slots: Vec::new(),
            errors: Vec::new(),
            recovering: false,
            consumed: 0,
            last_recovery: None,
        };

        let result = run.run(start);
        run.unwind();

        match result {
            Ok(()) => Ok(ParseReport {
                data: run.root,
                errors: run.errors,
            }),
            Err(err) => Err(err),
        }
    }
}

struct Frame {
    production: ProductionHandle,
    /// The chosen expansion, `None` until the production is started.
    expansion: Option<Expansion>,
    next: usize,
    started: bool,
}

impl Frame {
    fn new(production: ProductionHandle) -> Frame {
        Frame {
            production,
            expansion: None,
            next: 0,
            started: false,
        }
    }

    fn next_term(&mut self) -> Option<Term> {
        let term = self.expansion.as_ref()?.get(self.next)?.clone();
        self.next += 1;
        Some(term)
    }
}

struct Run<'a, 'l, 'c, D, C> {
    language: &'a Language,
    grammar: &'a Grammar<D, C>,
    options: ParseOptions,
    lexer: Lexer<'l>,
    context: &'c mut C,
    stack: Vec<Frame>,
    root: D,
    /// The data of every started frame, in stack order.
    slots: Vec<D>,
    errors: Vec<ParseError>,
    recovering: bool,
    /// Number of tokens consumed so far.
    consumed: usize,
    /// The value of `consumed` when the last recovery finished.
    last_recovery: Option<usize>,
}

impl<D: Default, C> Run<'_, '_, '_, D, C> {
    fn run(&mut self, start: ProductionHandle) -> Result<(), ParseError> {
        let language = self.language;
        log::debug!("parse {}", language.symbols.production_name(start));
        self.stack.push(Frame::new(start));

        'outer: while let Some(top) = self.stack.last() {
            if !top.started {
                let production = top.production;
                let token = self.lookahead()?;
                self.start_frame();

                let Some(branches) = language.branch.get(production) else {
                    let found = token.as_ref().map(|t| self.describe(t));
                    self.error(ParseErrorKind::Structural, found)?;
                    self.choose(None);
                    continue;
                };

                let expansion = match &token {
                    Some(token) => match branches.get(token) {
                        Some(expansion) => Some(expansion.clone()),
                        None if branches.accepts_empty() => None,
                        None => {
                            let expected = branches.expected(&language.symbols);
                            let found = self.describe(token);
                            self.error(ParseErrorKind::Syntax { expected }, Some(found))?;
                            self.recover()?;
                            continue;
                        }
                    },
                    None if branches.accepts_empty() => None,
                    None => {
                        let expected = branches.expected(&language.symbols);
                        self.error(ParseErrorKind::UnexpectedEnd { expected }, None)?;
                        self.unwind();
                        break;
                    }
                };
                self.choose(expansion);
            }

            loop {
                let Some(frame) = self.stack.last_mut() else {
                    break 'outer;
                };
                let production = frame.production;
                let Some(term) = frame.next_term() else {
                    break;
                };
                let Some(lookahead) = term.as_lookahead() else {
                    if let Term::Production(child) = term {
                        log::trace!(
                            "{:indent$}push {}",
                            "",
                            language.symbols.production_name(child),
                            indent = self.stack.len()
                        );
                        self.stack.push(Frame::new(child));
                    }
                    continue 'outer;
                };

                let expected = || vec![lookahead.display(&language.symbols).to_string()];
                match self.lookahead()? {
                    Some(token) if token.matches(&lookahead) => {
                        self.accept(production, &term, token)
                    }
                    Some(token) => {
                        let kind = ParseErrorKind::Syntax {
                            expected: expected(),
                        };
                        let found = self.describe(&token);
                        self.error(kind, Some(found))?;
                        self.recover()?;
                        continue 'outer;
                    }
                    None => {
                        let kind = ParseErrorKind::UnexpectedEnd {
                            expected: expected(),
                        };
                        self.error(kind, None)?;
                        self.unwind();
                        break 'outer;
                    }
                }
            }

            self.pop();
        }

        if let Some(token) = self.lookahead()? {
            let found = self.describe(&token);
            self.error(ParseErrorKind::TrailingInput, Some(found))?;
        }
        Ok(())
    }

    fn describe(&self, token: &Token) -> String {
        token.describe(&self.language.symbols)
    }

    /// The lookahead token, lex errors are reported and skipped.
    fn lookahead(&mut self) -> Result<Option<Token>, ParseError> {
        loop {
            let err = match self.lexer.first() {
                Ok(token) => return Ok(token.cloned()),
                Err(err) => err,
            };
            self.lex_error(err)?;

            match self.lexer.recover() {
                Ok(token) => return Ok(token.cloned()),
                // the lexer is exhausted after an I/O failure
                Err(err) => self.lex_error(err)?,
            }
        }
    }

    fn lex_error(&mut self, err: LexError) -> Result<(), ParseError> {
        let line = err.line();
        self.report(ParseError {
            kind: ParseErrorKind::Lex(err),
            line,
            production: self.current_production(),
            found: None,
        })
    }

    fn current_production(&self) -> Option<String> {
        let frame = self.stack.last()?;
        Some(self.language.symbols.production_name(frame.production).to_string())
    }

    fn error(&mut self, kind: ParseErrorKind, found: Option<String>) -> Result<(), ParseError> {
        let line = match self.lexer.first() {
            Ok(Some(token)) => token.line,
            _ => self.lexer.line(),
        };
        self.report(ParseError {
            kind,
            line,
            production: self.current_production(),
            found,
        })
    }

    fn report(&mut self, error: ParseError) -> Result<(), ParseError> {
        if self.recovering {
            log::debug!("suppressed: {error}");
            return Ok(());
        }
        if self.options.validate {
            return Err(error);
        }
        log::warn!("{error}");
        self.errors.push(error);
        Ok(())
    }

    fn start_frame(&mut self) {
        let Some(frame) = self.stack.last_mut() else {
            return;
        };
        frame.started = true;
        let production = frame.production;

        log::trace!(
            "{:indent$}start {}",
            "",
            self.language.symbols.production_name(production),
            indent = self.stack.len() - 1
        );

        let mut data = D::default();
        let grammar = self.grammar;
        match self.slots.last_mut() {
            Some(parent) => grammar.on_start(production, parent, &mut data, self.context),
            None => grammar.on_start(production, &mut self.root, &mut data, self.context),
        }
        self.slots.push(data);
    }

    /// Adopts an expansion for the started top frame, `None` is the empty expansion.
    fn choose(&mut self, expansion: Option<Expansion>) {
        if let Some(frame) = self.stack.last_mut() {
            frame.expansion = Some(expansion.unwrap_or_else(|| Expansion::from(Vec::new())));
            frame.next = 0;
        }
    }

    fn accept(&mut self, production: ProductionHandle, term: &Term, token: Token) {
        // the token is the cached lookahead, shifting it can not fail
        let _ = self.lexer.shift();
        self.consumed += 1;

        log::trace!(
            "{:indent$}token {}",
            "",
            self.describe(&token),
            indent = self.stack.len()
        );

        let grammar = self.grammar;
        let context = &mut *self.context;
        let data = match self.slots.last_mut() {
            Some(data) => data,
            None => &mut self.root,
        };
        grammar.on_terminal(production, term, &token, data, context);
    }

    /// Pops the top frame, finishing it if it was started.
    fn pop(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        log::trace!(
            "{:indent$}finish {}",
            "",
            self.language.symbols.production_name(frame.production),
            indent = self.stack.len()
        );
        if !frame.started {
            return;
        }
        let Some(data) = self.slots.pop() else {
            return;
        };
        let grammar = self.grammar;
        let context = &mut *self.context;
        let parent = match self.slots.last_mut() {
            Some(parent) => parent,
            None => &mut self.root,
        };
        grammar.on_finish(frame.production, parent, data, context);
    }

    /// Finishes every remaining frame.
    fn unwind(&mut self) {
        while !self.stack.is_empty() {
            self.pop();
        }
    }

    /// Skips input until a token which may follow one of the productions on
    /// the stack and pops frames up to the innermost such production.
    fn recover(&mut self) -> Result<(), ParseError> {
        self.recovering = true;

        if self.last_recovery == Some(self.consumed) {
            // nothing was consumed since the last recovery, the offending
            // token would make us fail at the same place again
            if let Ok(Some(token)) = self.lexer.shift() {
                log::trace!("recover: skipping {}", self.describe(&token));
                self.consumed += 1;
            }
        }

        let language = self.language;
        let anchor = loop {
            let Some(token) = self.lookahead()? else {
                break None;
            };
            let follow = &language.follow;
            if self
                .stack
                .iter()
                .any(|frame| follow.follows(frame.production, &token))
            {
                break Some(token);
            }
            log::trace!("recover: skipping {}", self.describe(&token));
            let _ = self.lexer.shift();
            self.consumed += 1;
        };

        match anchor {
            None => {
                log::debug!("recover: end of input");
                self.unwind();
            }
            Some(token) => {
                while let Some(frame) = self.stack.last() {
                    let anchored = language.follow.follows(frame.production, &token);
                    self.pop();
                    if anchored {
                        break;
                    }
                }
                log::debug!("recover: resuming at {}", self.describe(&token));
            }
        }

        self.recovering = false;
        self.last_recovery = Some(self.consumed);
        Ok(())
    }
}
