//! x86-64 code generation, Intel syntax.
//!
//! A stack-machine-style walk over the typed AST: expression results land
//! in `eax`/`rax`, temporaries are pushed and popped around binary
//! operators, and the first six integer arguments travel in
//! `edi esi edx ecx r8d r9d`. The frame pointer is `rbp`.
//!
//! Statements are preceded by `; file(line)` trace comments so the emitted
//! assembly can be read against the source.

mod expr;
mod stmt;

use crate::context::Context;
use crate::diag::Result;
use crate::symtab::{StorageClass, SymTab, Symbol, SymbolId, SymbolKind, VarKind};
use crate::types::Type;

/// 32-bit views of the System-V integer argument registers.
const ARG_REGS32: [&str; 6] = ["edi", "esi", "edx", "ecx", "r8d", "r9d"];

pub struct CodeGen<'ctx> {
    ctx: &'ctx Context,
    out: String,
    next_label: u32,
}

impl<'ctx> CodeGen<'ctx> {
    pub fn new(ctx: &'ctx Context) -> Self {
        CodeGen {
            ctx,
            out: String::new(),
            next_label: 0,
        }
    }

    /// Emit the whole translation unit: header, then every global symbol in
    /// declaration order.
    pub fn generate(mut self) -> Result<String> {
        self.emit(".intel_syntax noprefix");
        let order = self.ctx.symtab.scope(SymTab::GLOBAL).symbols.clone();
        for id in order {
            self.gen_symbol(id)?;
        }
        Ok(self.out)
    }

    fn emit(&mut self, line: impl AsRef<str>) {
        self.out.push_str(line.as_ref());
        self.out.push('\n');
    }

    /// Labels are `.L<N>` with N monotonically increasing from 0.
    fn new_label(&mut self) -> u32 {
        let label = self.next_label;
        self.next_label += 1;
        label
    }

    fn gen_symbol(&mut self, id: SymbolId) -> Result<()> {
        let ctx = self.ctx;
        let sym = ctx.symtab.symbol(id);
        match sym.kind {
            SymbolKind::Func if sym.has_body => self.gen_function(sym),
            SymbolKind::Var if sym.storage != StorageClass::Extern => {
                let name = ctx.interner.resolve(sym.name);
                self.emit(format!("{}:", name));
                self.emit("    .zero 8");
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn gen_function(&mut self, sym: &'ctx Symbol) -> Result<()> {
        let ctx = self.ctx;
        let name = ctx.interner.resolve(sym.name);
        let reg_params = match &sym.ty {
            Type::Func { params, .. } => params.len().min(6),
            _ => 0,
        };

        if sym.storage != StorageClass::Static {
            self.emit(format!(".global {}", name));
        }
        if sym.storage != StorageClass::Extern {
            self.emit(format!("{}:", name));
        }

        self.emit("    push rbp");
        self.emit("    mov rbp, rsp");
        let frame = sym.offset + reg_params as u32 * 4 + 8;
        self.emit(format!("    sub rsp, {}", frame));
        for i in 0..reg_params {
            self.emit(format!("    mov [rbp-{}],{}", (i + 1) * 4, ARG_REGS32[i]));
        }

        if let Some(body) = &sym.body {
            self.gen_stmt(body)?;
        }

        self.emit_epilogue();
        self.emit(format!("; -- {}", name));
        Ok(())
    }

    fn emit_epilogue(&mut self) {
        self.emit("    mov rsp, rbp");
        self.emit("    pop rbp");
        self.emit("    ret");
    }

    /// Operand text for a variable reference. Register parameters are
    /// addressed through their argument register; stack parameters and
    /// locals through `rbp`.
    fn var_addr(&self, sym: &Symbol) -> String {
        match sym.var_kind {
            VarKind::Global => self.ctx.interner.resolve(sym.name).to_string(),
            VarKind::Local => format!("[rbp-{}]", sym.offset + 8),
            VarKind::Param => {
                if sym.param_index < 6 {
                    ARG_REGS32[sym.param_index as usize].to_string()
                } else {
                    format!("[rbp+{}]", sym.offset as i64 + 16 - 24)
                }
            }
            VarKind::Unknown => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::{CompileError, ErrorKind};
    use crate::parser::Parser;

    fn compile(source: &str) -> String {
        let mut ctx = Context::new();
        {
            let mut parser = Parser::new(&mut ctx, "test.c", source).expect("scanner failed");
            parser.parse().expect("parse failed");
        }
        CodeGen::new(&ctx).generate().expect("codegen failed")
    }

    fn compile_err(source: &str) -> CompileError {
        let mut ctx = Context::new();
        {
            let mut parser = Parser::new(&mut ctx, "test.c", source).expect("scanner failed");
            parser.parse().expect("parse failed");
        }
        CodeGen::new(&ctx)
            .generate()
            .expect_err("expected a codegen error")
    }

    #[test]
    fn test_header_is_first_line() {
        let asm = compile("int main() { return 0; }");
        assert!(asm.starts_with(".intel_syntax noprefix\n"));
    }

    #[test]
    fn test_global_var_storage() {
        let asm = compile("int g;");
        assert!(asm.contains("g:\n    .zero 8\n"));
    }

    #[test]
    fn test_extern_global_emits_no_storage() {
        let asm = compile("extern int g;");
        assert!(!asm.contains(".zero"));
    }

    #[test]
    fn test_static_function_is_not_global() {
        let asm = compile("static int f() { return 0; }");
        assert!(!asm.contains(".global f"));
        assert!(asm.contains("f:\n"));
    }

    #[test]
    fn test_prologue_and_epilogue_discipline() {
        let asm = compile("int foo() { return 1; }\nint main() { return 0; }");
        let prologues = asm.matches("    push rbp\n    mov rbp, rsp\n").count();
        assert_eq!(prologues, 2);
        let epilogues = asm.matches("    mov rsp, rbp\n    pop rbp\n    ret\n").count();
        // one per `return` plus the function-final epilogue
        assert_eq!(epilogues, 4);
        assert!(asm.contains("; -- foo"));
        assert!(asm.contains("; -- main"));
    }

    #[test]
    fn test_frame_size_and_param_spill() {
        let asm = compile("int f(int a, int b) { return a; }");
        assert!(asm.contains("    sub rsp, 16\n"), "{}", asm);
        assert!(asm.contains("    mov [rbp-4],edi\n"));
        assert!(asm.contains("    mov [rbp-8],esi\n"));
    }

    #[test]
    fn test_local_addressing() {
        let asm = compile("int f() { int a; a = 1; return a; }");
        assert!(asm.contains("    mov [rbp-8],eax ; a\n"));
        assert!(asm.contains("    mov eax,[rbp-8] ; a\n"));
        // one local, no params: 4 + 0 + 8
        assert!(asm.contains("    sub rsp, 12\n"));
    }

    #[test]
    fn test_register_param_addressing() {
        let asm = compile("int f(int a, int b) { return b; }");
        assert!(asm.contains("    mov eax,esi ; b\n"));
    }

    #[test]
    fn test_stack_param_addressing() {
        let asm = compile(
            "int f(int p0, int p1, int p2, int p3, int p4, int p5, int p6, int p7) { return p6; }",
        );
        assert!(asm.contains("    mov eax,[rbp+16] ; p6\n"), "{}", asm);
    }

    #[test]
    fn test_binary_evaluation_order() {
        let asm = compile("int f() { return 1 + 2; }");
        assert!(asm.contains(
            "    mov eax,2\n    push rax\n    mov eax,1\n    pop rdi\n    add rax, rdi\n"
        ));
    }

    #[test]
    fn test_division_sign_extends() {
        let asm = compile("int f(int a, int b) { return a / b; }");
        assert!(asm.contains("    cqo\n    idiv rdi\n"));
    }

    #[test]
    fn test_comparison_materializes_flag() {
        let asm = compile("int f(int a, int b) { return a < b; }");
        assert!(asm.contains("    cmp rax, rdi\n    setl al\n    movzb rax, al\n"));
    }

    #[test]
    fn test_unary_negation_and_not() {
        let asm = compile("int f(int a) { return -a; }");
        assert!(asm.contains("    neg rax\n"));
        let asm = compile("int f(int a) { return !a; }");
        assert!(asm.contains("    cmp rax, 0\n    sete al\n    movzb rax, al\n"));
    }

    #[test]
    fn test_call_register_arguments() {
        let asm = compile(
            "int foo(int a, int b) { return a + b; }\nint main() { return foo(2, 3); }",
        );
        assert!(
            asm.contains(
                "    mov eax,3\n    mov esi,eax\n    mov eax,2\n    mov edi,eax\n    call foo\n"
            ),
            "{}",
            asm
        );
    }

    #[test]
    fn test_three_ifs_use_six_labels_in_order() {
        let asm = compile(
            "int f(int a) {\n\
             if (a) a = 1;\n\
             if (a) a = 2;\n\
             if (a) a = 3;\n\
             return a;\n\
             }",
        );
        let mut last = 0;
        for n in 0..6 {
            let label = format!(".L{}:", n);
            let at = asm.find(&label).unwrap_or_else(|| panic!("missing {}", label));
            assert!(at >= last, "label {} out of order", label);
            last = at;
        }
        assert!(!asm.contains(".L6"));
    }

    #[test]
    fn test_if_else_pattern() {
        let asm = compile("int f(int a) { if (a) a = 1; else a = 2; return a; }");
        assert!(asm.contains("    cmp rax, 0\n    je .L0\n"));
        assert!(asm.contains("    jmp .L1\n.L0:\n"));
        assert!(asm.contains(".L1:\n"));
    }

    #[test]
    fn test_while_pattern() {
        let asm = compile("int f(int a) { while (a) a = a - 1; return a; }");
        assert!(asm.contains(".L0:\n"));
        assert!(asm.contains("    je .L1\n"));
        assert!(asm.contains("    jmp .L0\n.L1:\n"));
    }

    #[test]
    fn test_for_pattern_evaluates_body_before_step() {
        let asm = compile("int f() { int i; int t; t = 0; for (i = 0; i < 9; i = i + 1) t = t + i; return t; }");
        let top = asm.find(".L0:\n").expect("loop top label");
        let exit = asm.find("je .L1\n").expect("loop exit branch");
        let back = asm.find("jmp .L0\n").expect("back edge");
        assert!(top < exit && exit < back);
        assert!(asm.contains(".L1:\n"));
    }

    #[test]
    fn test_bare_return_emits_epilogue() {
        let asm = compile("void f() { return; }");
        assert!(asm.contains("; test.c(1) RETURN\n    mov rsp, rbp\n    pop rbp\n    ret\n"));
    }

    #[test]
    fn test_statement_comments_carry_position() {
        let asm = compile("int f() {\nint a;\na = 1;\nreturn a;\n}");
        assert!(asm.contains("; test.c(3) EXPR (a = 1)\n"), "{}", asm);
        assert!(asm.contains("; test.c(4) RETURN\n"));
    }

    #[test]
    fn test_continue_is_unsupported() {
        let err = compile_err("int f() { while (1) { continue; } }");
        assert_eq!(err.kind, ErrorKind::Unsupported);
        assert!(err.message.contains("continue"));
    }

    #[test]
    fn test_break_is_unsupported() {
        let err = compile_err("int f() { while (1) { break; } }");
        assert_eq!(err.kind, ErrorKind::Unsupported);
    }

    #[test]
    fn test_logical_operators_are_unsupported() {
        let err = compile_err("int f(int a) { return a && a; }");
        assert_eq!(err.kind, ErrorKind::Unsupported);
        assert!(err.message.contains("&&"));
        let err = compile_err("int f(int a) { return a || a; }");
        assert_eq!(err.kind, ErrorKind::Unsupported);
    }

    #[test]
    fn test_address_of_is_unsupported() {
        let err = compile_err("int f() { int a; int *p; p = &a; return 0; }");
        assert_eq!(err.kind, ErrorKind::Unsupported);
        assert!(err.message.contains("'&'"));
    }

    #[test]
    fn test_deref_is_unsupported() {
        let err = compile_err("int f(int *p) { return *p; }");
        assert_eq!(err.kind, ErrorKind::Unsupported);
        assert!(err.message.contains("'*'"));
    }
}
