use std::collections::HashMap;

use crate::{
    lexer::Token,
    symbol::{ProductionHandle, RcString, TerminalHandle},
    table::Term,
};

/// Invoked when a production is entered, with the parent's data and the fresh data of the production.
pub type StartHandler<D, C> = Box<dyn Fn(&mut D, &mut D, &mut C)>;
/// Invoked when a production is left, with the parent's data and the data of the production.
pub type FinishHandler<D, C> = Box<dyn Fn(&mut D, D, &mut C)>;
/// Invoked when a terminal is matched, with the production it occurs in and that production's data.
pub type TerminalHandler<D, C> = Box<dyn Fn(ProductionHandle, &Token, &mut D, &mut C)>;

/// The semantic actions of a language.
///
/// `D` is the per-production data passed between parents and children, `C` is
/// the caller's context, usually the sink events are delivered to. Productions
/// and terminals without a handler are still parsed, matching them has no
/// effect beyond consuming input.
pub struct Grammar<D, C> {
    start: HashMap<ProductionHandle, StartHandler<D, C>>,
    finish: HashMap<ProductionHandle, FinishHandler<D, C>>,
    terminals: HashMap<TerminalHandle, TerminalHandler<D, C>>,
    literals: HashMap<RcString, TerminalHandler<D, C>>,
    any_literal: Option<TerminalHandler<D, C>>,
}

impl<D, C> Grammar<D, C> {
    pub fn builder() -> GrammarBuilder<D, C> {
        GrammarBuilder {
            grammar: Grammar::default(),
        }
    }

    pub(crate) fn on_start(
        &self,
        production: ProductionHandle,
        parent: &mut D,
        data: &mut D,
        context: &mut C,
    ) {
        if let Some(handler) = self.start.get(&production) {
            handler(parent, data, context);
        }
    }

    pub(crate) fn on_finish(
        &self,
        production: ProductionHandle,
        parent: &mut D,
        data: D,
        context: &mut C,
    ) {
        if let Some(handler) = self.finish.get(&production) {
            handler(parent, data, context);
        }
    }

    /// Dispatches a matched token to the handler of the term it was matched against.
    pub(crate) fn on_terminal(
        &self,
        production: ProductionHandle,
        term: &Term,
        token: &Token,
        data: &mut D,
        context: &mut C,
    ) {
        let handler = match term {
            Term::Terminal(kind) => self.terminals.get(kind),
            Term::Literal(text) => self.literals.get(text).or(self.any_literal.as_ref()),
            Term::Production(_) => None,
        };
        if let Some(handler) = handler {
            handler(production, token, data, context);
        }
    }
}

impl<D, C> Default for Grammar<D, C> {
    fn default() -> Self {
        Self {
            start: HashMap::new(),
            finish: HashMap::new(),
            terminals: HashMap::new(),
            literals: HashMap::new(),
            any_literal: None,
        }
    }
}

pub struct GrammarBuilder<D, C> {
    grammar: Grammar<D, C>,
}

impl<D, C> GrammarBuilder<D, C> {
    pub fn start(
        mut self,
        production: ProductionHandle,
        handler: impl Fn(&mut D, &mut D, &mut C) + 'static,
    ) -> Self {
        self.grammar.start.insert(production, Box::new(handler));
        self
    }

    pub fn finish(
        mut self,
        production: ProductionHandle,
        handler: impl Fn(&mut D, D, &mut C) + 'static,
    ) -> Self {
        self.grammar.finish.insert(production, Box::new(handler));
        self
    }

    pub fn terminal(
        mut self,
        terminal: TerminalHandle,
        handler: impl Fn(ProductionHandle, &Token, &mut D, &mut C) + 'static,
    ) -> Self {
        self.grammar.terminals.insert(terminal, Box::new(handler));
        self
    }

    pub fn literal(
        mut self,
        text: &str,
        handler: impl Fn(ProductionHandle, &Token, &mut D, &mut C) + 'static,
    ) -> Self {
        self.grammar.literals.insert(text.into(), Box::new(handler));
        self
    }

    /// Handles every literal terminal which has no handler of its own.
    pub fn any_literal(
        mut self,
        handler: impl Fn(ProductionHandle, &Token, &mut D, &mut C) + 'static,
    ) -> Self {
        self.grammar.any_literal = Some(Box::new(handler));
        self
    }

    pub fn build(self) -> Grammar<D, C> {
        self.grammar
    }
}
