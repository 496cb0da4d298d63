//! Recursive-descent parser with inline type checking.
//!
//! The parser drives the scanner, populates the symbol table as
//! declarations are read, and produces a typed AST for function bodies.
//! Binary and unary expressions are type-checked at node creation time
//! against the predicates in [`crate::types`]; type errors are pinned to
//! the operator's source position and abort the translation unit.

use crate::ast::{BinaryOp, Expr, ExprKind, Stmt, StmtKind, UnaryOp};
use crate::context::Context;
use crate::diag::{self, CompileError, Pos, Result};
use crate::intern::Ident;
use crate::scanner::{Scanner, Token};
use crate::symtab::{ScopeId, StorageClass, Symbol, SymbolId, SymbolKind, VarKind};
use crate::types::{self, Param, Type};
use tracing::{debug, trace};

/// Deferred declarator construction: given the base type that the
/// declaration specifiers produced, build the declared type. Innermost
/// parenthesized declarators bind last, so each level wraps the result of
/// the levels outside it.
type TypeBuilder = Box<dyn FnOnce(Type) -> Type>;

pub struct Parser<'ctx> {
    ctx: &'ctx mut Context,
    scan: Scanner,
    token: Token,
    pos: Pos,
}

impl<'ctx> Parser<'ctx> {
    pub fn new(ctx: &'ctx mut Context, filename: &str, source: &str) -> Result<Self> {
        let mut scan = Scanner::new(filename, source);
        let token = scan.next_token(&mut ctx.interner)?;
        let pos = scan.pos();
        Ok(Parser {
            ctx,
            scan,
            token,
            pos,
        })
    }

    /// translation_unit = {external_declaration}
    pub fn parse(&mut self) -> Result<()> {
        while self.token != Token::Eof {
            self.parse_external_declaration()?;
        }
        Ok(())
    }

    fn next(&mut self) -> Result<()> {
        self.token = self.scan.next_token(&mut self.ctx.interner)?;
        self.pos = self.scan.pos();
        Ok(())
    }

    fn expect(&mut self, tok: Token) -> Result<()> {
        if self.token == tok {
            self.next()
        } else {
            Err(CompileError::syntax(
                self.pos.clone(),
                format!("missing token {}", tok),
            ))
        }
    }

    fn eat(&mut self, tok: Token) -> Result<bool> {
        if self.token == tok {
            self.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn is_declaration(&self) -> bool {
        matches!(
            self.token,
            Token::Static | Token::Extern | Token::Void | Token::Int
        )
    }

    fn is_expression_start(&self) -> bool {
        matches!(
            self.token,
            Token::And
                | Token::Star
                | Token::Minus
                | Token::Not
                | Token::Id(_)
                | Token::IntLit(_)
                | Token::Lpar
        )
    }

    fn is_statement_start(&self) -> bool {
        self.is_expression_start()
            || matches!(
                self.token,
                Token::Begin
                    | Token::If
                    | Token::While
                    | Token::For
                    | Token::Continue
                    | Token::Break
                    | Token::Return
                    | Token::Semi
            )
    }

    fn name(&self, id: Ident) -> &str {
        self.ctx.interner.resolve(id)
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    /// external_declaration
    ///     = declaration_specifiers declarator {',' declarator} ';'
    ///     | declaration_specifiers declarator compound_statement
    fn parse_external_declaration(&mut self) -> Result<()> {
        trace!(target: "parser", "external declaration at {}", self.pos);
        let decl_pos = self.pos.clone();
        let (storage, base) = self.parse_declaration_specifiers()?;

        let (name, ty) = self.parse_declarator(base.clone())?;
        if self.token == Token::Begin {
            return self.parse_function_definition(storage, name, ty, decl_pos);
        }

        self.declare_global(storage, name, ty, &decl_pos)?;
        while self.eat(Token::Comma)? {
            let pos = self.pos.clone();
            let (name, ty) = self.parse_declarator(base.clone())?;
            self.declare_global(storage, name, ty, &pos)?;
        }
        self.expect(Token::Semi)
    }

    /// declaration = declaration_specifiers declarator {',' declarator} ';'
    ///
    /// Local form: inserts into the current scope and reserves frame space.
    fn parse_local_declaration(&mut self) -> Result<()> {
        trace!(target: "parser", "local declaration at {}", self.pos);
        let (storage, base) = self.parse_declaration_specifiers()?;
        loop {
            let pos = self.pos.clone();
            let (name, ty) = self.parse_declarator(base.clone())?;
            self.declare_local(storage, name, ty, &pos)?;
            if !self.eat(Token::Comma)? {
                break;
            }
        }
        self.expect(Token::Semi)
    }

    /// declaration_specifiers = declaration_specifier {declaration_specifier}
    /// declaration_specifier  = STATIC | EXTERN | VOID | INT
    ///
    /// Each storage class at most once, `void`/`int` mutually exclusive;
    /// any order is accepted.
    fn parse_declaration_specifiers(&mut self) -> Result<(StorageClass, Type)> {
        let mut storage = StorageClass::Default;
        let mut ty = Type::Unknown;
        let mut seen = false;
        loop {
            match self.token {
                Token::Static => {
                    if storage != StorageClass::Default {
                        return Err(CompileError::syntax(self.pos.clone(), "invalid 'static'"));
                    }
                    storage = StorageClass::Static;
                }
                Token::Extern => {
                    if storage != StorageClass::Default {
                        return Err(CompileError::syntax(self.pos.clone(), "invalid 'extern'"));
                    }
                    storage = StorageClass::Extern;
                }
                Token::Void => {
                    if !matches!(ty, Type::Unknown) {
                        return Err(CompileError::syntax(
                            self.pos.clone(),
                            "cannot combine 'void'",
                        ));
                    }
                    ty = Type::Void;
                }
                Token::Int => {
                    if !matches!(ty, Type::Unknown) {
                        return Err(CompileError::syntax(
                            self.pos.clone(),
                            "cannot combine 'int'",
                        ));
                    }
                    ty = Type::Int;
                }
                _ => break,
            }
            seen = true;
            self.next()?;
        }
        if !seen {
            return Err(CompileError::syntax(
                self.pos.clone(),
                "syntax error (declaration)",
            ));
        }
        Ok((storage, ty))
    }

    /// declarator = {'*'} (IDENTIFIER | '(' declarator ')') ['(' [param_list] ')']
    ///
    /// Resolves the C reading order by building a deferred wrapper instead
    /// of splicing through a sentinel: leading stars wrap the inbound base
    /// first, a parameter suffix wraps the starred type, and an inner
    /// parenthesized declarator wraps the whole result.
    fn parse_declarator(&mut self, base: Type) -> Result<(Option<Ident>, Type)> {
        let (name, build) = self.parse_declarator_shape()?;
        let ty = build(base);
        if let Some(id) = name {
            trace!(target: "parser", "declarator '{}': {}", self.name(id), ty);
        }
        Ok((name, ty))
    }

    fn parse_declarator_shape(&mut self) -> Result<(Option<Ident>, TypeBuilder)> {
        let mut stars = 0u32;
        while self.eat(Token::Star)? {
            stars += 1;
        }

        let mut name = None;
        let mut inner: Option<TypeBuilder> = None;
        let mut params: Option<Vec<Param>> = None;

        match self.token {
            Token::Id(id) => {
                name = Some(id);
                self.next()?;
            }
            Token::Lpar => {
                self.next()?;
                if matches!(self.token, Token::Star | Token::Id(_) | Token::Lpar) {
                    let (inner_name, builder) = self.parse_declarator_shape()?;
                    name = inner_name;
                    inner = Some(builder);
                    self.expect(Token::Rpar)?;
                } else {
                    // abstract declarator whose '(' opened the parameter list
                    params = Some(self.parse_parameter_list()?);
                    self.expect(Token::Rpar)?;
                }
            }
            // abstract declarator with no direct part (e.g. a bare `int *`)
            _ => {}
        }

        if params.is_none() && self.token == Token::Lpar {
            self.next()?;
            params = Some(self.parse_parameter_list()?);
            self.expect(Token::Rpar)?;
        }

        if inner.is_some() && params.is_none() {
            // e.g. `int (a)`: parentheses with no function suffix
            return Err(CompileError::syntax(
                self.pos.clone(),
                "syntax error (declarator)",
            ));
        }

        let builder: TypeBuilder = Box::new(move |base: Type| {
            let mut ty = base;
            for _ in 0..stars {
                ty = Type::pointer(ty);
            }
            if let Some(params) = params {
                ty = Type::func(ty, params);
            }
            if let Some(build_inner) = inner {
                ty = build_inner(ty);
            }
            ty
        });
        Ok((name, builder))
    }

    /// param_list = param_decl {',' param_decl}
    /// param_decl = declaration_specifiers [declarator]
    ///
    /// `(void)` is the empty parameter list.
    fn parse_parameter_list(&mut self) -> Result<Vec<Param>> {
        let mut params = Vec::new();
        if self.token == Token::Rpar {
            return Ok(params);
        }
        loop {
            let (_storage, base) = self.parse_declaration_specifiers()?;
            let (name, ty) = self.parse_declarator(base)?;
            params.push(Param { name, ty });
            if !self.eat(Token::Comma)? {
                break;
            }
        }
        if params.len() == 1 && params[0].name.is_none() && params[0].ty.is_void() {
            params.clear();
        }
        Ok(params)
    }

    fn declare_global(
        &mut self,
        storage: StorageClass,
        name: Option<Ident>,
        ty: Type,
        pos: &Pos,
    ) -> Result<SymbolId> {
        let Some(name) = name else {
            return Err(CompileError::syntax(pos.clone(), "expected identifier"));
        };
        let kind = if ty.is_func() {
            SymbolKind::Func
        } else {
            SymbolKind::Var
        };

        if let Some(existing) = self.ctx.symtab.lookup_current(name) {
            let prev = self.ctx.symtab.symbol(existing);
            return match (prev.kind, kind) {
                (SymbolKind::Func, SymbolKind::Func) => {
                    if prev.ty != ty {
                        Err(CompileError::redeclaration(
                            pos.clone(),
                            format!("'{}' type mismatch", self.name(name)),
                        ))
                    } else {
                        Ok(existing)
                    }
                }
                (prev_kind, new_kind) if prev_kind != new_kind => {
                    Err(CompileError::redeclaration(
                        pos.clone(),
                        format!("'{}' different kind of symbol", self.name(name)),
                    ))
                }
                _ => Err(CompileError::redeclaration(
                    pos.clone(),
                    format!("'{}' duplicated", self.name(name)),
                )),
            };
        }

        let var_kind = if kind == SymbolKind::Var {
            VarKind::Global
        } else {
            VarKind::Unknown
        };
        debug!(target: "symbol", "{}: declare global '{}': {}", pos, self.name(name), ty);
        Ok(self
            .ctx
            .symtab
            .insert(Symbol::new(name, kind, storage, var_kind, ty)))
    }

    fn declare_local(
        &mut self,
        storage: StorageClass,
        name: Option<Ident>,
        ty: Type,
        pos: &Pos,
    ) -> Result<SymbolId> {
        let Some(name) = name else {
            return Err(CompileError::syntax(pos.clone(), "expected identifier"));
        };
        if self.ctx.symtab.lookup_current(name).is_some() {
            return Err(CompileError::redeclaration(
                pos.clone(),
                format!("'{}' duplicated", self.name(name)),
            ));
        }

        let kind = if ty.is_func() {
            SymbolKind::Func
        } else {
            SymbolKind::Var
        };
        let mut sym = Symbol::new(
            name,
            kind,
            storage,
            if kind == SymbolKind::Var {
                VarKind::Local
            } else {
                VarKind::Unknown
            },
            ty,
        );
        if kind == SymbolKind::Var {
            let size = sym.ty.size_in_bytes().ok_or_else(|| {
                CompileError::type_error(
                    pos.clone(),
                    format!("cannot take size of type '{}'", sym.ty),
                )
            })?;
            if let Some(offset) = self.ctx.symtab.alloc_local(size) {
                sym.offset = offset;
            }
        }
        debug!(target: "symbol", "{}: declare local '{}': {}", pos, self.name(name), sym.ty);
        Ok(self.ctx.symtab.insert(sym))
    }

    fn parse_function_definition(
        &mut self,
        storage: StorageClass,
        name: Option<Ident>,
        ty: Type,
        pos: Pos,
    ) -> Result<()> {
        let Some(name) = name else {
            return Err(CompileError::syntax(pos, "expected identifier"));
        };
        let Type::Func { params, .. } = &ty else {
            return Err(CompileError::syntax(pos, "invalid function syntax"));
        };
        let params = params.clone();

        let sym_id = self.declare_global(storage, Some(name), ty, &pos)?;
        if self.ctx.symtab.symbol(sym_id).has_body {
            return Err(CompileError::redeclaration(
                pos,
                format!("'{}' redefined", self.name(name)),
            ));
        }

        debug!(target: "symbol", "{}: enter function '{}'", pos, self.name(name));
        let scope = self.ctx.symtab.enter_function(sym_id);
        for (index, param) in params.iter().enumerate() {
            let Some(param_name) = param.name else {
                continue;
            };
            if self.ctx.symtab.lookup_current(param_name).is_some() {
                return Err(CompileError::redeclaration(
                    pos,
                    format!("'{}' duplicated", self.name(param_name)),
                ));
            }
            let mut sym = Symbol::new(
                param_name,
                SymbolKind::Var,
                StorageClass::Default,
                VarKind::Param,
                param.ty.clone(),
            );
            sym.param_index = index as u32;
            sym.offset = index as u32 * 4;
            debug!(
                target: "symbol",
                "{}: declare param {} '{}': {}",
                pos, index, self.name(param_name), sym.ty
            );
            self.ctx.symtab.insert(sym);
        }

        let body = self.parse_compound_tail(scope);
        self.ctx.symtab.leave_function();
        debug!(target: "symbol", "{}: leave function '{}'", pos, self.name(name));
        let body = body?;

        let sym = self.ctx.symtab.symbol_mut(sym_id);
        sym.has_body = true;
        sym.body = Some(body);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// compound_statement = '{' {declaration} {statement} '}'
    fn parse_compound_statement(&mut self) -> Result<Stmt> {
        let scope = self.ctx.symtab.enter_scope();
        let stmt = self.parse_compound_tail(scope);
        self.ctx.symtab.leave_scope();
        stmt
    }

    /// Body of a compound statement whose scope is already current (a
    /// function body shares its scope with the parameters).
    fn parse_compound_tail(&mut self, scope: ScopeId) -> Result<Stmt> {
        let pos = self.pos.clone();
        self.expect(Token::Begin)?;
        while self.is_declaration() {
            self.parse_local_declaration()?;
        }
        let mut body = Vec::new();
        while self.is_statement_start() {
            body.push(self.parse_statement()?);
        }
        self.expect(Token::End)?;
        Ok(Stmt {
            kind: StmtKind::Compound { scope, body },
            pos,
        })
    }

    /// statement
    ///     = compound_statement
    ///     | IF '(' expression ')' statement [ELSE statement]
    ///     | WHILE '(' expression ')' statement
    ///     | FOR '(' [expression] ';' [expression] ';' [expression] ')' statement
    ///     | CONTINUE ';' | BREAK ';' | RETURN [expression] ';'
    ///     | [expression] ';'
    fn parse_statement(&mut self) -> Result<Stmt> {
        let pos = self.pos.clone();
        match self.token {
            Token::Begin => {
                trace!(target: "parser", "statement: compound");
                self.parse_compound_statement()
            }
            Token::If => {
                trace!(target: "parser", "statement: if");
                self.next()?;
                self.expect(Token::Lpar)?;
                let cond = self.parse_expression()?;
                self.expect(Token::Rpar)?;
                let then_stmt = Box::new(self.parse_statement()?);
                let else_stmt = if self.eat(Token::Else)? {
                    Some(Box::new(self.parse_statement()?))
                } else {
                    None
                };
                Ok(Stmt {
                    kind: StmtKind::If {
                        cond,
                        then_stmt,
                        else_stmt,
                    },
                    pos,
                })
            }
            Token::While => {
                trace!(target: "parser", "statement: while");
                self.next()?;
                self.expect(Token::Lpar)?;
                let cond = self.parse_expression()?;
                self.expect(Token::Rpar)?;
                let body = Box::new(self.parse_statement()?);
                Ok(Stmt {
                    kind: StmtKind::While { cond, body },
                    pos,
                })
            }
            Token::For => {
                trace!(target: "parser", "statement: for");
                self.next()?;
                self.expect(Token::Lpar)?;
                let init = self.parse_optional_expression()?;
                self.expect(Token::Semi)?;
                let cond = self.parse_optional_expression()?;
                self.expect(Token::Semi)?;
                let step = self.parse_optional_expression()?;
                self.expect(Token::Rpar)?;
                let body = Box::new(self.parse_statement()?);
                Ok(Stmt {
                    kind: StmtKind::For {
                        init,
                        cond,
                        step,
                        body,
                    },
                    pos,
                })
            }
            Token::Continue => {
                self.next()?;
                self.expect(Token::Semi)?;
                Ok(Stmt {
                    kind: StmtKind::Continue,
                    pos,
                })
            }
            Token::Break => {
                self.next()?;
                self.expect(Token::Semi)?;
                Ok(Stmt {
                    kind: StmtKind::Break,
                    pos,
                })
            }
            Token::Return => {
                trace!(target: "parser", "statement: return");
                self.next()?;
                let value = self.parse_optional_expression()?;
                self.expect(Token::Semi)?;
                Ok(Stmt {
                    kind: StmtKind::Return(value),
                    pos,
                })
            }
            _ => {
                trace!(target: "parser", "statement: expression");
                let expr = self.parse_optional_expression()?;
                self.expect(Token::Semi)?;
                Ok(Stmt {
                    kind: StmtKind::Expr(expr),
                    pos,
                })
            }
        }
    }

    fn parse_optional_expression(&mut self) -> Result<Option<Expr>> {
        if self.is_expression_start() {
            Ok(Some(self.parse_expression()?))
        } else {
            Ok(None)
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// expression = assignment_expression
    pub fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_assignment_expression()
    }

    /// assignment_expression
    ///     = logical_or_expression ['=' assignment_expression]
    ///
    /// Only an identifier may appear on the left of `=`.
    fn parse_assignment_expression(&mut self) -> Result<Expr> {
        let lhs = self.parse_logical_or_expression()?;
        if self.token != Token::Assign {
            return Ok(lhs);
        }
        let op_pos = self.pos.clone();
        self.next()?;
        if !lhs.is_lvalue() {
            return Err(CompileError::syntax(op_pos, "invalid lvalue"));
        }
        let rhs = self.parse_assignment_expression()?;

        let ty = if types::can_assign(&lhs.ty, &rhs.ty) {
            lhs.ty.clone()
        } else if types::warn_assign(&lhs.ty, &rhs.ty) {
            diag::warning(
                &op_pos,
                format_args!("incompatible assignment from '{}' to '{}'", rhs.ty, lhs.ty),
            );
            lhs.ty.clone()
        } else {
            return Err(CompileError::type_error(
                op_pos,
                format!("invalid assignment from '{}' to '{}'", rhs.ty, lhs.ty),
            ));
        };
        Ok(Expr {
            kind: ExprKind::Assign {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
            pos: op_pos,
        })
    }

    /// logical_or_expression = logical_and_expression {'||' logical_and_expression}
    fn parse_logical_or_expression(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_logical_and_expression()?;
        while self.token == Token::Lor {
            let op_pos = self.pos.clone();
            self.next()?;
            let rhs = self.parse_logical_and_expression()?;
            lhs = self.typed_binary(BinaryOp::LogOr, lhs, rhs, op_pos)?;
        }
        Ok(lhs)
    }

    /// logical_and_expression = equality_expression {'&&' equality_expression}
    fn parse_logical_and_expression(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_equality_expression()?;
        while self.token == Token::Land {
            let op_pos = self.pos.clone();
            self.next()?;
            let rhs = self.parse_equality_expression()?;
            lhs = self.typed_binary(BinaryOp::LogAnd, lhs, rhs, op_pos)?;
        }
        Ok(lhs)
    }

    /// equality_expression = relational_expression {('==' | '!=') relational_expression}
    fn parse_equality_expression(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_relational_expression()?;
        loop {
            let op = match self.token {
                Token::Eq => BinaryOp::Eq,
                Token::Neq => BinaryOp::Ne,
                _ => return Ok(lhs),
            };
            let op_pos = self.pos.clone();
            self.next()?;
            let rhs = self.parse_relational_expression()?;
            lhs = self.typed_binary(op, lhs, rhs, op_pos)?;
        }
    }

    /// relational_expression
    ///     = additive_expression {('<' | '>' | '<=' | '>=') additive_expression}
    fn parse_relational_expression(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_additive_expression()?;
        loop {
            let op = match self.token {
                Token::Lt => BinaryOp::Lt,
                Token::Gt => BinaryOp::Gt,
                Token::Le => BinaryOp::Le,
                Token::Ge => BinaryOp::Ge,
                _ => return Ok(lhs),
            };
            let op_pos = self.pos.clone();
            self.next()?;
            let rhs = self.parse_additive_expression()?;
            lhs = self.typed_binary(op, lhs, rhs, op_pos)?;
        }
    }

    /// additive_expression
    ///     = multiplicative_expression {('+' | '-') multiplicative_expression}
    fn parse_additive_expression(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_multiplicative_expression()?;
        loop {
            let op = match self.token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            let op_pos = self.pos.clone();
            self.next()?;
            let rhs = self.parse_multiplicative_expression()?;
            lhs = self.typed_binary(op, lhs, rhs, op_pos)?;
        }
    }

    /// multiplicative_expression = unary_expression {('*' | '/') unary_expression}
    fn parse_multiplicative_expression(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary_expression()?;
        loop {
            let op = match self.token {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            let op_pos = self.pos.clone();
            self.next()?;
            let rhs = self.parse_unary_expression()?;
            lhs = self.typed_binary(op, lhs, rhs, op_pos)?;
        }
    }

    /// Create a typed binary node, enforcing the operand rules for the
    /// operator. Failures are pinned to the operator position.
    fn typed_binary(&self, op: BinaryOp, lhs: Expr, rhs: Expr, pos: Pos) -> Result<Expr> {
        let ty = match op {
            BinaryOp::Mul | BinaryOp::Div => {
                if !types::can_mul_div(&lhs.ty, &rhs.ty) {
                    return Err(self.operand_error(op, &lhs, &rhs, pos));
                }
                lhs.ty.clone()
            }
            BinaryOp::Add => {
                if !types::can_add(&lhs.ty, &rhs.ty) {
                    return Err(self.operand_error(op, &lhs, &rhs, pos));
                }
                lhs.ty.clone()
            }
            BinaryOp::Sub => {
                if !types::can_sub(&lhs.ty, &rhs.ty) {
                    return Err(self.operand_error(op, &lhs, &rhs, pos));
                }
                lhs.ty.clone()
            }
            BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::Le
            | BinaryOp::Ge
            | BinaryOp::Eq
            | BinaryOp::Ne => {
                if types::warn_rel(&lhs.ty, &rhs.ty) {
                    diag::warning(
                        &pos,
                        format_args!("comparison between '{}' and '{}'", lhs.ty, rhs.ty),
                    );
                    Type::Int
                } else if types::can_rel(&lhs.ty, &rhs.ty) {
                    Type::Int
                } else {
                    return Err(self.operand_error(op, &lhs, &rhs, pos));
                }
            }
            BinaryOp::LogAnd | BinaryOp::LogOr => {
                if !types::can_logical(&lhs.ty, &rhs.ty) {
                    return Err(self.operand_error(op, &lhs, &rhs, pos));
                }
                Type::Int
            }
        };
        Ok(Expr {
            kind: ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
            pos,
        })
    }

    fn operand_error(&self, op: BinaryOp, lhs: &Expr, rhs: &Expr, pos: Pos) -> CompileError {
        CompileError::type_error(
            pos,
            format!(
                "invalid operands to binary '{}' ('{}' and '{}')",
                op, lhs.ty, rhs.ty
            ),
        )
    }

    /// unary_expression = postfix_expression | unary_operator postfix_expression
    /// unary_operator   = '&' | '*' | '-' | '!'
    fn parse_unary_expression(&mut self) -> Result<Expr> {
        let op = match self.token {
            Token::And => UnaryOp::Addr,
            Token::Star => UnaryOp::Deref,
            Token::Minus => UnaryOp::Neg,
            Token::Not => UnaryOp::Not,
            _ => return self.parse_postfix_expression(),
        };
        let op_pos = self.pos.clone();
        self.next()?;
        let operand = self.parse_postfix_expression()?;

        let ty = match op {
            UnaryOp::Addr => {
                if !operand.is_lvalue() {
                    return Err(CompileError::syntax(op_pos, "invalid lvalue"));
                }
                Type::pointer(operand.ty.clone())
            }
            UnaryOp::Deref => match &operand.ty {
                Type::Pointer(target) => (**target).clone(),
                other => {
                    return Err(CompileError::type_error(
                        op_pos,
                        format!("not a pointer: '{}'", other),
                    ));
                }
            },
            UnaryOp::Neg | UnaryOp::Not => {
                if !operand.ty.is_integer() {
                    return Err(CompileError::type_error(
                        op_pos,
                        format!("invalid operand to unary '{}' ('{}')", op, operand.ty),
                    ));
                }
                Type::Int
            }
        };
        Ok(Expr {
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
            pos: op_pos,
        })
    }

    /// postfix_expression = primary_expression ['(' [argument_list] ')']
    fn parse_postfix_expression(&mut self) -> Result<Expr> {
        let callee = self.parse_primary_expression()?;
        if self.token != Token::Lpar {
            return Ok(callee);
        }
        let call_pos = self.pos.clone();
        self.next()?;
        let mut args = Vec::new();
        if self.token != Token::Rpar {
            args.push(self.parse_assignment_expression()?);
            while self.eat(Token::Comma)? {
                args.push(self.parse_assignment_expression()?);
            }
        }
        self.expect(Token::Rpar)?;

        // No argument count or type checking is performed.
        let ret = match &callee.ty {
            Type::Func { ret, .. } => (**ret).clone(),
            other => {
                return Err(CompileError::type_error(
                    call_pos,
                    format!("not a function: '{}'", other),
                ));
            }
        };
        Ok(Expr {
            kind: ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            ty: ret,
            pos: call_pos,
        })
    }

    /// primary_expression = IDENTIFIER | INTEGER_CONSTANT | '(' expression ')'
    fn parse_primary_expression(&mut self) -> Result<Expr> {
        let pos = self.pos.clone();
        match self.token {
            Token::Id(id) => {
                let Some(sym) = self.ctx.symtab.lookup(id) else {
                    return Err(CompileError::undefined(
                        pos,
                        format!("undefined symbol '{}'", self.name(id)),
                    ));
                };
                self.next()?;
                Ok(Expr {
                    ty: self.ctx.symtab.symbol(sym).ty.clone(),
                    kind: ExprKind::Id(sym),
                    pos,
                })
            }
            Token::IntLit(n) => {
                self.next()?;
                let ty = if n == 0 { Type::Null } else { Type::Int };
                Ok(Expr {
                    kind: ExprKind::IntLit(n),
                    ty,
                    pos,
                })
            }
            Token::Lpar => {
                self.next()?;
                let expr = self.parse_expression()?;
                self.expect(Token::Rpar)?;
                Ok(expr)
            }
            _ => Err(CompileError::syntax(pos, "syntax error (expression)")),
        }
    }
}
