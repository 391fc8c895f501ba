use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use crate::ast::NodeId;
use crate::error::{ErrorKind, PResult, ParseError};
use crate::source::Span;

/// Names are compared by text, so a span is a usable key.
pub type Name = Span;

/// What kind of binding introduced a symbol, so passes can match on role.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SymbolKind {
    Var,
    Let,
    Const,
    // A function parameter.
    Funarg,
    // A hoisted function declaration.
    Defun,
    // A function expression's own name, visible only inside it.
    Lambda,
    Catch,
    Import,
    Class,
    // Invented by the linker (namespace objects, export carriers).
    Linker,
}

impl SymbolKind {
    /// `var`-world bindings hoist to the nearest closure and tolerate
    /// redeclaration; lexical ones stay in their block and refuse it.
    pub fn hoists(self) -> bool {
        matches!(self, SymbolKind::Var | SymbolKind::Defun | SymbolKind::Funarg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(usize);

impl SymbolId {
    pub fn from_id(id: usize) -> SymbolId {
        SymbolId(id)
    }

    pub fn id(&self) -> usize {
        self.0
    }
}

/// The identity of a declared variable: name, role, defining scope, the node
/// that declared it, and (after analysis) every occurrence referring to it.
#[derive(Debug)]
pub struct SymbolDef {
    name: Name,
    kind: SymbolKind,
    scope: ScopeId,
    declarator: NodeId,
    references: Vec<NodeId>,
    reads: usize,
    writes: usize,
    // Set when collision renaming or mangling picked a different final name.
    output_name: Option<String>,
}

impl SymbolDef {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn declarator(&self) -> NodeId {
        self.declarator
    }

    pub fn references(&self) -> &[NodeId] {
        &self.references
    }

    pub fn add_reference(&mut self, node: NodeId) -> () {
        self.references.push(node);
    }

    pub fn record_read(&mut self) -> () {
        self.reads += 1;
    }

    pub fn record_write(&mut self) -> () {
        self.writes += 1;
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn set_output_name(&mut self, name: String) -> () {
        self.output_name = Some(name);
    }

    /// The name this symbol binds in emitted code.
    pub fn bound_name(&self) -> &str {
        self.output_name.as_deref().unwrap_or(self.name.text())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScopeKind {
    Global,
    // A function body, or the top level of a module.
    Closure,
    Block,
    With,
}

#[derive(Debug)]
pub struct Scope {
    id: ScopeId,
    kind: ScopeKind,
    parent: Option<ScopeId>,
    // Nearest enclosing closure, where `var` declarations land. Absent only
    // at the root.
    closure: Option<ScopeId>,
    table: HashMap<Name, SymbolId>,
    // Declaration order, for deterministic output.
    order: Vec<Name>,
    // Set by the directive prologue; inherited at creation.
    strict: bool,
    // `eval`/`with` in reach: nothing here can be proven unused.
    pinned: bool,
    // Symbols defined further out but referenced from within.
    enclosed: Vec<SymbolId>,
}

impl Scope {
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn closure(&self) -> Option<ScopeId> {
        if self.kind == ScopeKind::Closure {
            Some(self.id)
        } else {
            self.closure
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn set_strict(&mut self) -> () {
        self.strict = true;
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn pin(&mut self) -> () {
        self.pinned = true;
    }

    pub fn lookup_here(&self, name: &Name) -> Option<SymbolId> {
        self.table.get(name).copied()
    }

    pub fn names(&self) -> &[Name] {
        &self.order
    }

    pub fn binding_count(&self) -> usize {
        self.table.len()
    }

    pub fn enclosed(&self) -> &[SymbolId] {
        &self.enclosed
    }

    pub fn add_enclosed(&mut self, symbol: SymbolId) -> () {
        if !self.enclosed.contains(&symbol) {
            self.enclosed.push(symbol);
        };
    }

    /// Moves a binding to a new name after renaming; used by the linker.
    pub fn rebind(&mut self, old: &Name, new: Name, symbol: SymbolId) -> () {
        self.table.remove(old);
        match self.order.iter().position(|n| n == old) {
            Some(slot) => self.order[slot] = new.clone(),
            None => self.order.push(new.clone()),
        };
        self.table.insert(new, symbol);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    pub fn id(&self) -> usize {
        self.0
    }
}

/// Arena of scopes and symbol definitions. A symbol lives as long as its
/// defining scope, which lives as long as the tree.
pub struct ScopeMap {
    scopes: Vec<Scope>,
    symbols: Vec<SymbolDef>,
}

impl ScopeMap {
    pub fn new() -> ScopeMap {
        ScopeMap {
            scopes: Vec::new(),
            symbols: Vec::new(),
        }
    }

    pub fn new_scope(&mut self, parent: Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        let (closure, strict) = match parent {
            Some(parent) => (self[parent].closure(), self[parent].strict),
            None => (None, false),
        };
        self.scopes.push(Scope {
            id,
            kind,
            parent,
            closure,
            table: HashMap::new(),
            order: Vec::new(),
            strict,
            pinned: false,
            enclosed: Vec::new(),
        });
        id
    }

    /// Declares a name in the scope its kind dictates: hoisting kinds land
    /// in the nearest closure and merge with an existing declaration;
    /// lexical kinds land in `scope` itself and raise on duplicates. At the
    /// true global scope nothing is recorded, since free globals are not
    /// bound symbols.
    pub fn declare(
        &mut self,
        scope: ScopeId,
        name: Name,
        declarator: NodeId,
        kind: SymbolKind,
    ) -> PResult<Option<SymbolId>> {
        let home = if kind.hoists() {
            match self[scope].closure() {
                Some(closure) => closure,
                None => return Ok(None),
            }
        } else {
            scope
        };
        if self[home].kind == ScopeKind::Global {
            return Ok(None);
        };
        if let Some(existing) = self[home].lookup_here(&name) {
            if kind.hoists() {
                return Ok(Some(existing));
            };
            return Err(ParseError::at_span(ErrorKind::DuplicateBinding, &name, None));
        };
        let id = SymbolId(self.symbols.len());
        self.symbols.push(SymbolDef {
            name: name.clone(),
            kind,
            scope: home,
            declarator,
            references: Vec::new(),
            reads: 0,
            writes: 0,
            output_name: None,
        });
        let home = &mut self.scopes[home.0];
        home.table.insert(name.clone(), id);
        home.order.push(name);
        Ok(Some(id))
    }

    /// Walks the scope chain; the first hit is the definition.
    pub fn lookup(&self, scope: ScopeId, name: &Name) -> Option<SymbolId> {
        let mut cursor = Some(scope);
        while let Some(id) = cursor {
            if let Some(symbol) = self[id].lookup_here(name) {
                return Some(symbol);
            };
            cursor = self[id].parent;
        }
        None
    }

    /// True when nothing refers to the symbol and its scope is not pinned by
    /// `eval`/`with`.
    pub fn unreferenced(&self, symbol: SymbolId) -> bool {
        self[symbol].references.is_empty() && !self[self[symbol].scope].pinned
    }

    pub fn symbol_ids(&self) -> impl Iterator<Item = SymbolId> {
        (0..self.symbols.len()).map(SymbolId)
    }
}

impl Index<ScopeId> for ScopeMap {
    type Output = Scope;

    fn index(&self, index: ScopeId) -> &Self::Output {
        &self.scopes[index.0]
    }
}

impl IndexMut<ScopeId> for ScopeMap {
    fn index_mut(&mut self, index: ScopeId) -> &mut Self::Output {
        &mut self.scopes[index.0]
    }
}

impl Index<SymbolId> for ScopeMap {
    type Output = SymbolDef;

    fn index(&self, index: SymbolId) -> &Self::Output {
        &self.symbols[index.0]
    }
}

impl IndexMut<SymbolId> for ScopeMap {
    fn index_mut(&mut self, index: SymbolId) -> &mut Self::Output {
        &mut self.symbols[index.0]
    }
}
