use std::{collections::HashMap, fmt::Debug, rc::Rc};

use cranelift_entity::{entity_impl, PrimaryMap};

pub type RcString = Rc<str>;

/// A named lexical category, the `kind` of a [`Token`](crate::lexer::Token).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TerminalHandle(u32);
entity_impl!(TerminalHandle, "terminal");

/// A non-terminal of the grammar, expanded through the branch table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductionHandle(u32);
entity_impl!(ProductionHandle, "production");

/// Interns terminal and production names into dense handles.
///
/// Terminals and productions live in separate namespaces, a name may be both.
#[derive(Clone, Default)]
pub struct Symbols {
    terminals: PrimaryMap<TerminalHandle, RcString>,
    productions: PrimaryMap<ProductionHandle, RcString>,
    terminal_lookup: HashMap<RcString, TerminalHandle>,
    production_lookup: HashMap<RcString, ProductionHandle>,
}

impl Symbols {
    pub fn new() -> Symbols {
        Self::default()
    }

    pub fn intern_terminal(&mut self, name: &str) -> TerminalHandle {
        if let Some(&handle) = self.terminal_lookup.get(name) {
            return handle;
        }
        let name: RcString = name.into();
        let handle = self.terminals.push(name.clone());
        self.terminal_lookup.insert(name, handle);
        handle
    }

    pub fn intern_production(&mut self, name: &str) -> ProductionHandle {
        if let Some(&handle) = self.production_lookup.get(name) {
            return handle;
        }
        let name: RcString = name.into();
        let handle = self.productions.push(name.clone());
        self.production_lookup.insert(name, handle);
        handle
    }

    pub fn terminal(&self, name: &str) -> Option<TerminalHandle> {
        self.terminal_lookup.get(name).copied()
    }

    pub fn production(&self, name: &str) -> Option<ProductionHandle> {
        self.production_lookup.get(name).copied()
    }

    #[track_caller]
    pub fn terminal_name(&self, handle: TerminalHandle) -> &RcString {
        &self.terminals[handle]
    }

    #[track_caller]
    pub fn production_name(&self, handle: ProductionHandle) -> &RcString {
        &self.productions[handle]
    }

    pub fn terminals(&self) -> impl Iterator<Item = (TerminalHandle, &RcString)> {
        self.terminals.iter()
    }

    pub fn productions(&self) -> impl Iterator<Item = (ProductionHandle, &RcString)> {
        self.productions.iter()
    }
}

impl Debug for Symbols {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Symbols")
            .field("terminals", &self.terminals.values().collect::<Vec<_>>())
            .field("productions", &self.productions.values().collect::<Vec<_>>())
            .finish()
    }
}

#[test]
fn test_interning_is_stable() {
    let mut symbols = Symbols::new();

    let iri = symbols.intern_terminal("IRIREF");
    let doc = symbols.intern_production("turtleDoc");
    let same_name = symbols.intern_production("IRIREF");

    assert_eq!(symbols.intern_terminal("IRIREF"), iri);
    assert_eq!(symbols.production("turtleDoc"), Some(doc));
    assert_eq!(symbols.production("IRIREF"), Some(same_name));
    assert_eq!(&**symbols.terminal_name(iri), "IRIREF");
    assert_eq!(symbols.terminal("turtleDoc"), None);
}

#[test]
fn test_handle_formatting() {
    let mut symbols = Symbols::new();
    let doc = symbols.intern_production("turtleDoc");
    let iri = symbols.intern_terminal("IRIREF");
    let string = symbols.intern_terminal("STRING");

    assert_eq!(doc.to_string(), "production0");
    assert_eq!(format!("{string:?}"), "terminal1");
    assert_eq!(format!("{:?}", [iri, string]), "[terminal0, terminal1]");
}
