//! Prediction tables consumed by the parser driver.
//!
//! Both tables are keyed by the *representation* of a token: its terminal kind
//! when it has one, otherwise its exact text.

use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
    rc::Rc,
};

use cranelift_entity::SecondaryMap;

use crate::{
    lexer::Token,
    symbol::{ProductionHandle, RcString, Symbols, TerminalHandle},
};

/// Something a token can be compared against.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Lookahead {
    Terminal(TerminalHandle),
    Literal(RcString),
}

impl Lookahead {
    pub fn display<'a>(&'a self, symbols: &'a Symbols) -> impl Display + 'a {
        LookaheadDisplay {
            lookahead: self,
            symbols,
        }
    }
}

struct LookaheadDisplay<'a> {
    lookahead: &'a Lookahead,
    symbols: &'a Symbols,
}

impl Display for LookaheadDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.lookahead {
            Lookahead::Terminal(t) => write!(f, "{}", self.symbols.terminal_name(*t)),
            Lookahead::Literal(text) => write!(f, "{:?}", &**text),
        }
    }
}

/// One element of an expansion.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Term {
    Production(ProductionHandle),
    Terminal(TerminalHandle),
    Literal(RcString),
}

impl Term {
    /// The terminal this term consumes, `None` for productions.
    pub fn as_lookahead(&self) -> Option<Lookahead> {
        match self {
            Term::Production(_) => None,
            Term::Terminal(t) => Some(Lookahead::Terminal(*t)),
            Term::Literal(l) => Some(Lookahead::Literal(l.clone())),
        }
    }
}

impl From<Lookahead> for Term {
    fn from(value: Lookahead) -> Self {
        match value {
            Lookahead::Terminal(t) => Term::Terminal(t),
            Lookahead::Literal(l) => Term::Literal(l),
        }
    }
}

pub type Expansion = Rc<[Term]>;

/// The expansions of a single production, by lookahead.
#[derive(Clone, Default, Debug)]
pub struct Branches {
    terminals: HashMap<TerminalHandle, Expansion>,
    literals: HashMap<RcString, Expansion>,
    empty: bool,
}

impl Branches {
    pub fn new() -> Branches {
        Self::default()
    }

    pub fn insert(&mut self, lookahead: Lookahead, expansion: Expansion) -> Option<Expansion> {
        match lookahead {
            Lookahead::Terminal(t) => self.terminals.insert(t, expansion),
            Lookahead::Literal(l) => self.literals.insert(l, expansion),
        }
    }

    /// Allows the production to expand to nothing, at end of input or when the
    /// lookahead has no entry of its own.
    pub fn set_empty(&mut self) {
        self.empty = true;
    }

    pub fn accepts_empty(&self) -> bool {
        self.empty
    }

    pub fn get(&self, token: &Token) -> Option<&Expansion> {
        match token.kind {
            Some(kind) => self.terminals.get(&kind),
            None => self.literals.get(token.text.as_str()),
        }
    }

    pub fn lookaheads(&self) -> impl Iterator<Item = Lookahead> + '_ {
        let terminals = self.terminals.keys().map(|t| Lookahead::Terminal(*t));
        let literals = self.literals.keys().map(|l| Lookahead::Literal(l.clone()));
        terminals.chain(literals)
    }

    /// The display names of every lookahead with an entry, sorted.
    pub fn expected(&self, symbols: &Symbols) -> Vec<String> {
        let mut expected = self
            .lookaheads()
            .map(|l| l.display(symbols).to_string())
            .collect::<Vec<_>>();
        expected.sort();
        expected
    }
}

#[derive(Clone, Default, Debug)]
pub struct BranchTable {
    branches: SecondaryMap<ProductionHandle, Option<Branches>>,
}

impl BranchTable {
    pub fn new() -> BranchTable {
        Self::default()
    }

    /// The entry of `production`, created empty if missing.
    pub fn entry(&mut self, production: ProductionHandle) -> &mut Branches {
        self.branches[production].get_or_insert_with(Branches::default)
    }

    /// `None` if the production has no entry at all.
    pub fn get(&self, production: ProductionHandle) -> Option<&Branches> {
        self.branches.get(production).and_then(Option::as_ref)
    }

    pub fn contains(&self, production: ProductionHandle) -> bool {
        self.get(production).is_some()
    }
}

/// The terminals which may follow a production.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct FollowSet {
    terminals: HashSet<TerminalHandle>,
    literals: HashSet<RcString>,
}

impl FollowSet {
    pub fn new() -> FollowSet {
        Self::default()
    }

    pub fn insert(&mut self, lookahead: Lookahead) -> bool {
        match lookahead {
            Lookahead::Terminal(t) => self.terminals.insert(t),
            Lookahead::Literal(l) => self.literals.insert(l),
        }
    }

    pub fn contains(&self, token: &Token) -> bool {
        match token.kind {
            Some(kind) => self.terminals.contains(&kind),
            None => self.literals.contains(token.text.as_str()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terminals.is_empty() && self.literals.is_empty()
    }
}

impl FromIterator<Lookahead> for FollowSet {
    fn from_iter<T: IntoIterator<Item = Lookahead>>(iter: T) -> Self {
        let mut set = FollowSet::new();
        for lookahead in iter {
            set.insert(lookahead);
        }
        set
    }
}

#[derive(Clone, Default, Debug)]
pub struct FollowTable {
    follow: SecondaryMap<ProductionHandle, Option<FollowSet>>,
}

impl FollowTable {
    pub fn new() -> FollowTable {
        Self::default()
    }

    pub fn entry(&mut self, production: ProductionHandle) -> &mut FollowSet {
        self.follow[production].get_or_insert_with(FollowSet::default)
    }

    /// `None` if no FOLLOW set was declared for the production.
    pub fn get(&self, production: ProductionHandle) -> Option<&FollowSet> {
        self.follow.get(production).and_then(Option::as_ref)
    }

    /// Whether `token` is in the declared FOLLOW set of `production`.
    pub fn follows(&self, production: ProductionHandle, token: &Token) -> bool {
        self.get(production).map_or(false, |set| set.contains(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: Option<TerminalHandle>, text: &str) -> Token {
        Token {
            kind,
            text: text.into(),
            line: 1,
        }
    }

    #[test]
    fn lookup_by_representation() {
        let mut symbols = Symbols::new();
        let iri = symbols.intern_terminal("IRIREF");
        let triples = symbols.intern_production("triples");

        let mut table = BranchTable::new();
        let branches = table.entry(triples);
        branches.insert(Lookahead::Terminal(iri), vec![Term::Terminal(iri)].into());
        branches.insert(
            Lookahead::Literal(".".into()),
            vec![Term::Literal(".".into())].into(),
        );

        let branches = table.get(triples).unwrap();
        assert!(branches.get(&token(Some(iri), "<a>")).is_some());
        assert!(branches.get(&token(None, ".")).is_some());
        // a named token is looked up by kind only
        assert!(branches.get(&token(Some(iri), ".")).is_some());
        assert!(branches.get(&token(None, ";")).is_none());
        assert!(!branches.accepts_empty());
        assert_eq!(branches.expected(&symbols), ["\".\"", "IRIREF"]);
    }

    #[test]
    fn missing_entries() {
        let mut symbols = Symbols::new();
        let declared = symbols.intern_production("declared");
        let undeclared = symbols.intern_production("undeclared");

        let mut branch = BranchTable::new();
        branch.entry(declared).set_empty();
        let mut follow = FollowTable::new();
        follow.entry(declared).insert(Lookahead::Literal(";".into()));

        assert!(branch.contains(declared));
        assert!(!branch.contains(undeclared));
        assert!(follow.get(undeclared).is_none());
        assert!(follow.follows(declared, &token(None, ";")));
        assert!(!follow.follows(undeclared, &token(None, ";")));
    }
}
