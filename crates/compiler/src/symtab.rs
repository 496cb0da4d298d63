//! Symbol table: nested scopes, lookup, and function frame accounting.
//!
//! Scopes form a chain linked parent-ward from a single global root. All
//! symbols and scopes live in flat vectors owned by the table and are
//! referenced by [`SymbolId`] / [`ScopeId`] indices, so the whole table is
//! released en bloc with its translation unit.

use crate::ast::Stmt;
use crate::intern::Ident;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Var,
    Func,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Default,
    Static,
    Extern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Unknown,
    Global,
    Local,
    Param,
}

#[derive(Debug)]
pub struct Symbol {
    pub name: Ident,
    pub kind: SymbolKind,
    pub storage: StorageClass,
    pub var_kind: VarKind,
    pub ty: Type,
    /// Locals: byte offset within the function frame. Params: `4 * index`.
    /// On a function symbol this accumulates the total local-storage size.
    pub offset: u32,
    /// Zero-based position of a parameter, for register assignment.
    pub param_index: u32,
    pub has_body: bool,
    pub body: Option<Stmt>,
    /// Scope holding a function's parameters and top-level locals.
    pub local_scope: Option<ScopeId>,
}

impl Symbol {
    pub fn new(
        name: Ident,
        kind: SymbolKind,
        storage: StorageClass,
        var_kind: VarKind,
        ty: Type,
    ) -> Self {
        Symbol {
            name,
            kind,
            storage,
            var_kind,
            ty,
            offset: 0,
            param_index: 0,
            has_body: false,
            body: None,
            local_scope: None,
        }
    }
}

#[derive(Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    /// Symbols in declaration order; global order is the emission order.
    pub symbols: Vec<SymbolId>,
}

#[derive(Debug)]
pub struct SymTab {
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
    current: ScopeId,
    current_fn: Option<SymbolId>,
}

impl SymTab {
    pub const GLOBAL: ScopeId = ScopeId(0);

    pub fn new() -> Self {
        SymTab {
            symbols: Vec::new(),
            scopes: vec![Scope {
                parent: None,
                symbols: Vec::new(),
            }],
            current: Self::GLOBAL,
            current_fn: None,
        }
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    pub fn current_function(&self) -> Option<SymbolId> {
        self.current_fn
    }

    /// Push a child of the current scope and make it current.
    pub fn enter_scope(&mut self) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent: Some(self.current),
            symbols: Vec::new(),
        });
        self.current = id;
        id
    }

    pub fn leave_scope(&mut self) {
        debug_assert!(self.current != Self::GLOBAL, "leaving the global scope");
        if let Some(parent) = self.scopes[self.current.0 as usize].parent {
            self.current = parent;
        }
    }

    /// Push the scope that will hold a function's parameters and top-level
    /// locals, and record the function for frame accounting.
    pub fn enter_function(&mut self, func: SymbolId) -> ScopeId {
        let scope = self.enter_scope();
        self.current_fn = Some(func);
        self.symbols[func.0 as usize].local_scope = Some(scope);
        scope
    }

    pub fn leave_function(&mut self) {
        self.leave_scope();
        self.current_fn = None;
    }

    /// Search the current scope only.
    pub fn lookup_current(&self, name: Ident) -> Option<SymbolId> {
        self.lookup_in(self.current, name)
    }

    /// Search from the current scope outward to the global root.
    pub fn lookup(&self, name: Ident) -> Option<SymbolId> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if let Some(found) = self.lookup_in(id, name) {
                return Some(found);
            }
            scope = self.scopes[id.0 as usize].parent;
        }
        None
    }

    pub fn lookup_in(&self, scope: ScopeId, name: Ident) -> Option<SymbolId> {
        self.scopes[scope.0 as usize]
            .symbols
            .iter()
            .copied()
            .find(|&id| self.symbols[id.0 as usize].name == name)
    }

    /// Append a symbol to the current scope. The caller is responsible for
    /// duplicate checking via [`lookup_current`](Self::lookup_current).
    pub fn insert(&mut self, sym: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(sym);
        self.scopes[self.current.0 as usize].symbols.push(id);
        id
    }

    /// Reserve `size` bytes of frame storage in the current function and
    /// return the slot's pre-advance offset. `None` outside a function.
    pub fn alloc_local(&mut self, size: u32) -> Option<u32> {
        let func = self.current_fn?;
        let sym = &mut self.symbols[func.0 as usize];
        let offset = sym.offset;
        sym.offset += size;
        Some(offset)
    }
}

impl Default for SymTab {
    fn default() -> Self {
        SymTab::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interner;

    fn var(name: Ident, ty: Type) -> Symbol {
        Symbol::new(name, SymbolKind::Var, StorageClass::Default, VarKind::Local, ty)
    }

    #[test]
    fn test_lookup_walks_to_global() {
        let mut interner = Interner::new();
        let mut tab = SymTab::new();
        let g = interner.intern("g");
        let gid = tab.insert(Symbol::new(
            g,
            SymbolKind::Var,
            StorageClass::Default,
            VarKind::Global,
            Type::Int,
        ));
        tab.enter_scope();
        tab.enter_scope();
        assert_eq!(tab.lookup(g), Some(gid));
        assert_eq!(tab.lookup_current(g), None);
    }

    #[test]
    fn test_shadowing_resolves_innermost() {
        let mut interner = Interner::new();
        let mut tab = SymTab::new();
        let x = interner.intern("x");
        let outer = tab.insert(var(x, Type::Int));
        tab.enter_scope();
        let inner = tab.insert(var(x, Type::pointer(Type::Int)));
        assert_eq!(tab.lookup(x), Some(inner));
        tab.leave_scope();
        assert_eq!(tab.lookup(x), Some(outer));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut interner = Interner::new();
        let mut tab = SymTab::new();
        let a = tab.insert(var(interner.intern("a"), Type::Int));
        let b = tab.insert(var(interner.intern("b"), Type::Int));
        let c = tab.insert(var(interner.intern("c"), Type::Int));
        assert_eq!(tab.scope(SymTab::GLOBAL).symbols, vec![a, b, c]);
    }

    #[test]
    fn test_frame_accounting() {
        let mut interner = Interner::new();
        let mut tab = SymTab::new();
        let f = interner.intern("f");
        let func = tab.insert(Symbol::new(
            f,
            SymbolKind::Func,
            StorageClass::Default,
            VarKind::Unknown,
            Type::func(Type::Int, vec![]),
        ));
        assert_eq!(tab.alloc_local(4), None);

        let scope = tab.enter_function(func);
        assert_eq!(tab.symbol(func).local_scope, Some(scope));
        assert_eq!(tab.alloc_local(4), Some(0));
        assert_eq!(tab.alloc_local(8), Some(4));
        assert_eq!(tab.alloc_local(4), Some(12));
        tab.leave_function();

        assert_eq!(tab.symbol(func).offset, 16);
        assert_eq!(tab.current_function(), None);
        assert_eq!(tab.current_scope(), SymTab::GLOBAL);
    }
}
