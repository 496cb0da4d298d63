//! Typed abstract syntax tree.
//!
//! One variant per node kind; every expression carries its resolved type and
//! every node carries a source position. Identifier references point into
//! the symbol table by [`SymbolId`].

use crate::context::Context;
use crate::diag::Pos;
use crate::symtab::{ScopeId, SymbolId};
use crate::types::Type;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Add,
    Sub,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    LogAnd,
    LogOr,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::LogAnd => "&&",
            BinaryOp::LogOr => "||",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `&E` - address of an l-value
    Addr,
    /// `*E` - pointer indirection
    Deref,
    /// `-E`
    Neg,
    /// `!E`
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Addr => "&",
            UnaryOp::Deref => "*",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
    pub pos: Pos,
}

#[derive(Debug)]
pub enum ExprKind {
    IntLit(i32),
    Id(SymbolId),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Assign {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Call with arguments in source order; the vector index is the
    /// zero-based argument index that drives register assignment.
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Only identifier references designate storage in this language.
    pub fn is_lvalue(&self) -> bool {
        matches!(self.kind, ExprKind::Id(_))
    }

    /// Render the expression with identifier spellings resolved.
    pub fn display<'a>(&'a self, ctx: &'a Context) -> ExprDisplay<'a> {
        ExprDisplay { expr: self, ctx }
    }
}

/// One-line expression rendering for debug output and assembly comments.
pub struct ExprDisplay<'a> {
    expr: &'a Expr,
    ctx: &'a Context,
}

impl fmt::Display for ExprDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.ctx;
        match &self.expr.kind {
            ExprKind::IntLit(n) => write!(f, "{}", n),
            ExprKind::Id(sym) => {
                let name = ctx.symtab.symbol(*sym).name;
                f.write_str(ctx.interner.resolve(name))
            }
            ExprKind::Binary { op, lhs, rhs } => {
                write!(f, "({} {} {})", lhs.display(ctx), op, rhs.display(ctx))
            }
            ExprKind::Assign { lhs, rhs } => {
                write!(f, "({} = {})", lhs.display(ctx), rhs.display(ctx))
            }
            ExprKind::Unary { op, operand } => write!(f, "({}{})", op, operand.display(ctx)),
            ExprKind::Call { callee, args } => {
                write!(f, "{}(", callee.display(ctx))?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg.display(ctx))?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: Pos,
}

#[derive(Debug)]
pub enum StmtKind {
    Compound {
        scope: ScopeId,
        body: Vec<Stmt>,
    },
    /// Expression statement; `None` for a bare `;`
    Expr(Option<Expr>),
    If {
        cond: Expr,
        then_stmt: Box<Stmt>,
        else_stmt: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<Expr>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    Continue,
    Break,
    Return(Option<Expr>),
}
