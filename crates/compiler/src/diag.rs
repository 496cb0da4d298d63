//! Diagnostics: source positions, fatal compile errors, warnings.
//!
//! Every token, AST node, and diagnostic carries a [`Pos`]. Errors are fatal
//! to the translation unit: each stage returns `Result<_, CompileError>` and
//! the per-file driver catches the error, reports it, and moves on to the
//! next file. Warnings print immediately and never abort.

use std::fmt;
use std::rc::Rc;

/// Source position: filename plus 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pos {
    pub file: Rc<str>,
    pub line: u32,
}

impl Pos {
    pub fn new(file: Rc<str>, line: u32) -> Self {
        Pos { file, line }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.file, self.line)
    }
}

/// User-visible diagnostic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Illegal character, unterminated comment
    Lexical,
    /// Missing token, stray token in a declarator, invalid l-value
    Syntax,
    /// Duplicate symbol in scope, conflicting function signature
    Redeclaration,
    /// Incompatible operands or assignment
    Type,
    /// Reference to an unknown identifier in an expression
    Undefined,
    /// Construct the code generator does not implement
    Unsupported,
}

/// A fatal diagnostic pinned to a source position.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub pos: Pos,
    pub message: String,
}

impl CompileError {
    pub fn new(kind: ErrorKind, pos: Pos, message: impl Into<String>) -> Self {
        CompileError {
            kind,
            pos,
            message: message.into(),
        }
    }

    pub fn lexical(pos: Pos, message: impl Into<String>) -> Self {
        CompileError::new(ErrorKind::Lexical, pos, message)
    }

    pub fn syntax(pos: Pos, message: impl Into<String>) -> Self {
        CompileError::new(ErrorKind::Syntax, pos, message)
    }

    pub fn redeclaration(pos: Pos, message: impl Into<String>) -> Self {
        CompileError::new(ErrorKind::Redeclaration, pos, message)
    }

    pub fn type_error(pos: Pos, message: impl Into<String>) -> Self {
        CompileError::new(ErrorKind::Type, pos, message)
    }

    pub fn undefined(pos: Pos, message: impl Into<String>) -> Self {
        CompileError::new(ErrorKind::Undefined, pos, message)
    }

    pub fn unsupported(pos: Pos, message: impl Into<String>) -> Self {
        CompileError::new(ErrorKind::Unsupported, pos, message)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:error:{}", self.pos, self.message)
    }
}

impl std::error::Error for CompileError {}

pub type Result<T> = std::result::Result<T, CompileError>;

/// Print a non-fatal warning to stdout.
pub fn warning(pos: &Pos, message: impl fmt::Display) {
    println!("{}:warning:{}", pos, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32) -> Pos {
        Pos::new(Rc::from("test.c"), line)
    }

    #[test]
    fn test_pos_display() {
        assert_eq!(pos(12).to_string(), "test.c(12)");
    }

    #[test]
    fn test_error_display_has_prefix() {
        let err = CompileError::syntax(pos(3), "missing token ';'");
        assert_eq!(err.to_string(), "test.c(3):error:missing token ';'");
    }

    #[test]
    fn test_error_kind_preserved() {
        let err = CompileError::undefined(pos(1), "undefined symbol 'x'");
        assert_eq!(err.kind, ErrorKind::Undefined);
        assert_eq!(err.pos.line, 1);
    }
}
