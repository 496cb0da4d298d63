//! Statement and control-flow emission.
//!
//! Control-flow labels are allocated in emission order from the generator's
//! monotone counter; an `if` always takes two labels (else target, then end)
//! so nested and sequential constructs never collide.

use super::CodeGen;
use crate::ast::{Stmt, StmtKind};
use crate::diag::{CompileError, Result};

impl CodeGen<'_> {
    pub(super) fn gen_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Compound { body, .. } => {
                self.emit(format!("; {}", stmt.pos));
                for s in body {
                    self.gen_stmt(s)?;
                }
                Ok(())
            }
            StmtKind::Expr(Some(expr)) => {
                self.emit(format!("; {} EXPR {}", stmt.pos, expr.display(self.ctx)));
                self.gen_expr(expr)
            }
            StmtKind::Expr(None) => {
                self.emit(format!("; {} EXPR", stmt.pos));
                Ok(())
            }
            StmtKind::If {
                cond,
                then_stmt,
                else_stmt,
            } => {
                self.emit(format!("; {} IF", stmt.pos));
                self.gen_expr(cond)?;
                self.emit("    cmp rax, 0");
                let else_label = self.new_label();
                self.emit(format!("    je .L{}", else_label));
                self.gen_stmt(then_stmt)?;
                let end_label = self.new_label();
                self.emit(format!("    jmp .L{}", end_label));
                self.emit(format!(".L{}:", else_label));
                if let Some(else_stmt) = else_stmt {
                    self.gen_stmt(else_stmt)?;
                }
                self.emit(format!(".L{}:", end_label));
                Ok(())
            }
            StmtKind::While { cond, body } => {
                self.emit(format!("; {} WHILE", stmt.pos));
                let top = self.new_label();
                self.emit(format!(".L{}:", top));
                self.gen_expr(cond)?;
                self.emit("    cmp rax, 0");
                let end = self.new_label();
                self.emit(format!("    je .L{}", end));
                self.gen_stmt(body)?;
                self.emit(format!("    jmp .L{}", top));
                self.emit(format!(".L{}:", end));
                Ok(())
            }
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                self.emit(format!("; {} FOR", stmt.pos));
                if let Some(init) = init {
                    self.gen_expr(init)?;
                }
                let top = self.new_label();
                self.emit(format!(".L{}:", top));
                // an absent condition loops forever
                let end = match cond {
                    Some(cond) => {
                        self.gen_expr(cond)?;
                        self.emit("    cmp rax, 0");
                        let end = self.new_label();
                        self.emit(format!("    je .L{}", end));
                        Some(end)
                    }
                    None => None,
                };
                self.gen_stmt(body)?;
                if let Some(step) = step {
                    self.gen_expr(step)?;
                }
                self.emit(format!("    jmp .L{}", top));
                if let Some(end) = end {
                    self.emit(format!(".L{}:", end));
                }
                Ok(())
            }
            StmtKind::Continue => Err(CompileError::unsupported(
                stmt.pos.clone(),
                "'continue' code generation is not implemented",
            )),
            StmtKind::Break => Err(CompileError::unsupported(
                stmt.pos.clone(),
                "'break' code generation is not implemented",
            )),
            StmtKind::Return(value) => {
                self.emit(format!("; {} RETURN", stmt.pos));
                if let Some(value) = value {
                    self.gen_expr(value)?;
                }
                self.emit_epilogue();
                Ok(())
            }
        }
    }
}
