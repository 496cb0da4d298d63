//! mcc compiler library
//!
//! Compilation of a small C-like language ("mini C") to x86-64 assembly in
//! Intel syntax. One translation unit per call: the source is scanned and
//! parsed (populating the symbol table and type-checking expressions as the
//! AST is built), then the code generator walks the typed AST and produces
//! assembly text suitable for a standard assembler.
//!
//! ```rust
//! let asm = mcc::compile_to_asm("demo.c", "int main() { return 0; }").unwrap();
//! assert!(asm.starts_with(".intel_syntax noprefix"));
//! ```
//!
//! Errors are fatal to the translation unit and surface as
//! [`CompileError`] values with a `file(line):error:` rendering; warnings
//! print to stdout and do not abort.

pub mod ast;
pub mod codegen;
pub mod context;
pub mod diag;
pub mod intern;
pub mod parser;
pub mod scanner;
pub mod symtab;
pub mod types;

pub use codegen::CodeGen;
pub use context::Context;
pub use diag::{CompileError, ErrorKind, Pos};
pub use intern::{Ident, Interner};
pub use parser::Parser;
pub use scanner::{Scanner, Token};
pub use symtab::{Scope, ScopeId, StorageClass, SymTab, Symbol, SymbolId, SymbolKind, VarKind};
pub use types::{Param, Type};

use std::fs;
use std::path::{Path, PathBuf};

/// Parse one translation unit, returning the populated compiler context
/// (symbol table, function bodies, interner).
pub fn parse_unit(filename: &str, source: &str) -> Result<Context, CompileError> {
    let mut ctx = Context::new();
    {
        let mut parser = Parser::new(&mut ctx, filename, source)?;
        parser.parse()?;
    }
    Ok(ctx)
}

/// Compile one translation unit to assembly text.
pub fn compile_to_asm(filename: &str, source: &str) -> Result<String, CompileError> {
    let ctx = parse_unit(filename, source)?;
    CodeGen::new(&ctx).generate()
}

/// Compile a source file to its `.s` sibling. The output name replaces the
/// input's extension with `.s`, or appends `.s` when there is none.
pub fn compile_file(input: &Path) -> Result<PathBuf, String> {
    let source =
        fs::read_to_string(input).map_err(|e| format!("can't open '{}': {}", input.display(), e))?;
    let filename = input.display().to_string();
    let asm = compile_to_asm(&filename, &source).map_err(|e| e.to_string())?;
    let output = input.with_extension("s");
    fs::write(&output, asm)
        .map_err(|e| format!("can't write '{}': {}", output.display(), e))?;
    Ok(output)
}
