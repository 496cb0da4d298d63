//! Expression emission.
//!
//! Results are produced in `eax`/`rax`. Binary operators evaluate the right
//! subtree first, park it on the machine stack, evaluate the left subtree,
//! and pop the right value into `rdi`. The constructs the generator does
//! not implement (`&`, `*`, `&&`, `||`, indirect calls, function values)
//! raise a fatal diagnostic rather than emitting silent empty output.

use super::{ARG_REGS32, CodeGen};
use crate::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use crate::diag::{CompileError, Result};
use crate::symtab::{Symbol, SymbolKind, VarKind};

impl CodeGen<'_> {
    pub(super) fn gen_expr(&mut self, expr: &Expr) -> Result<()> {
        let ctx = self.ctx;
        match &expr.kind {
            ExprKind::IntLit(n) => {
                self.emit(format!("    mov eax,{}", n));
                Ok(())
            }
            ExprKind::Id(sym_id) => {
                let sym = ctx.symtab.symbol(*sym_id);
                match sym.kind {
                    SymbolKind::Var => self.load_var(sym, expr),
                    SymbolKind::Func => Err(CompileError::unsupported(
                        expr.pos.clone(),
                        format!(
                            "taking the value of function '{}' is not implemented",
                            ctx.interner.resolve(sym.name)
                        ),
                    )),
                }
            }
            ExprKind::Binary { op, lhs, rhs } => self.gen_binary(*op, lhs, rhs, expr),
            ExprKind::Assign { lhs, rhs } => {
                self.gen_expr(rhs)?;
                let ExprKind::Id(sym_id) = &lhs.kind else {
                    return Err(CompileError::syntax(lhs.pos.clone(), "not variable"));
                };
                let sym = ctx.symtab.symbol(*sym_id);
                self.store_var(sym, lhs)
            }
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Neg => {
                    self.gen_expr(operand)?;
                    self.emit("    neg rax");
                    Ok(())
                }
                UnaryOp::Not => {
                    self.gen_expr(operand)?;
                    self.emit("    cmp rax, 0");
                    self.emit("    sete al");
                    self.emit("    movzb rax, al");
                    Ok(())
                }
                UnaryOp::Addr => Err(CompileError::unsupported(
                    expr.pos.clone(),
                    "'&' code generation is not implemented",
                )),
                UnaryOp::Deref => Err(CompileError::unsupported(
                    expr.pos.clone(),
                    "'*' code generation is not implemented",
                )),
            },
            ExprKind::Call { callee, args } => {
                // Right-to-left so the final register values are the
                // left-most arguments.
                for (index, arg) in args.iter().enumerate().rev() {
                    self.gen_expr(arg)?;
                    if index < ARG_REGS32.len() {
                        self.emit(format!("    mov {},eax", ARG_REGS32[index]));
                    } else {
                        self.emit("    push eax");
                    }
                }
                let ExprKind::Id(sym_id) = &callee.kind else {
                    return Err(CompileError::unsupported(
                        callee.pos.clone(),
                        "indirect call is not implemented",
                    ));
                };
                let name = ctx.interner.resolve(ctx.symtab.symbol(*sym_id).name);
                self.emit(format!("    call {}", name));
                Ok(())
            }
        }
    }

    fn gen_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr, expr: &Expr) -> Result<()> {
        if matches!(op, BinaryOp::LogAnd | BinaryOp::LogOr) {
            return Err(CompileError::unsupported(
                expr.pos.clone(),
                format!("'{}' code generation is not implemented", op),
            ));
        }
        self.gen_expr(rhs)?;
        self.emit("    push rax");
        self.gen_expr(lhs)?;
        self.emit("    pop rdi");
        match op {
            BinaryOp::Add => self.emit("    add rax, rdi"),
            BinaryOp::Sub => self.emit("    sub rax, rdi"),
            BinaryOp::Mul => self.emit("    imul rax, rdi"),
            BinaryOp::Div => {
                self.emit("    cqo");
                self.emit("    idiv rdi");
            }
            BinaryOp::Eq => self.compare("sete"),
            BinaryOp::Ne => self.compare("setne"),
            BinaryOp::Lt => self.compare("setl"),
            BinaryOp::Gt => self.compare("setg"),
            BinaryOp::Le => self.compare("setle"),
            BinaryOp::Ge => self.compare("setge"),
            // rejected above
            BinaryOp::LogAnd | BinaryOp::LogOr => {}
        }
        Ok(())
    }

    fn compare(&mut self, set: &str) {
        self.emit("    cmp rax, rdi");
        self.emit(format!("    {} al", set));
        self.emit("    movzb rax, al");
    }

    fn load_var(&mut self, sym: &Symbol, expr: &Expr) -> Result<()> {
        if sym.var_kind == VarKind::Unknown {
            return Err(CompileError::type_error(expr.pos.clone(), "invalid variable"));
        }
        let name = self.ctx.interner.resolve(sym.name).to_string();
        let addr = self.var_addr(sym);
        self.emit(format!("    mov eax,{} ; {}", addr, name));
        Ok(())
    }

    fn store_var(&mut self, sym: &Symbol, expr: &Expr) -> Result<()> {
        if sym.var_kind == VarKind::Unknown {
            return Err(CompileError::type_error(expr.pos.clone(), "invalid variable"));
        }
        let name = self.ctx.interner.resolve(sym.name).to_string();
        let addr = self.var_addr(sym);
        self.emit(format!("    mov {},eax ; {}", addr, name));
        Ok(())
    }
}
