//! Per-translation-unit compiler state.
//!
//! One `Context` per source file: the interner and the symbol table (with
//! its scope cursor and current-function pointer) live here and are passed
//! explicitly, so concurrent compilations never share state. Everything is
//! released together when the unit is done.

use crate::intern::Interner;
use crate::symtab::SymTab;

#[derive(Debug, Default)]
pub struct Context {
    pub interner: Interner,
    pub symtab: SymTab,
}

impl Context {
    pub fn new() -> Self {
        Context::default()
    }
}
