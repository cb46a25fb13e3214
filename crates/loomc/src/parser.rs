//! Recursive-descent parser with Pratt-style expression precedence.
//!
//! The statement grammar is indentation-sensitive: a block is either
//! `=> NEWLINE INDENT stmts DEDENT` or the one-line form `=> stmt`. On a
//! syntax error the parser reports a diagnostic at the offending token and
//! synchronizes to the next statement boundary (a `NEWLINE` at the current
//! level, a `DEDENT`, or `EOF`) so one bad statement doesn't stop the whole
//! file from being checked.

use crate::ast::{
    BinOp, Expr, ExprKind, FuncMod, IncDecOp, InterpPart, LiteralValue, MemQual, Module, Param,
    Stmt, StmtKind, UnOp,
};
use crate::lexer::Lexer;
use crate::token::{Literal, Token, TokenKind};
use crate::types::Type;
use loom_core::{Arena, Diagnostics};

pub struct Parser<'a, 'd> {
    arena: &'a Arena,
    tokens: Vec<Token<'a>>,
    pos: usize,
    filename: &'a str,
    diags: &'d mut Diagnostics,
}

impl<'a, 'd> Parser<'a, 'd> {
    pub fn new(
        arena: &'a Arena,
        tokens: Vec<Token<'a>>,
        filename: &'a str,
        diags: &'d mut Diagnostics,
    ) -> Self {
        Parser {
            arena,
            tokens,
            pos: 0,
            filename,
            diags,
        }
    }

    pub fn parse_module(&mut self) -> Module<'a> {
        tracing::trace!(filename = self.filename, tokens = self.tokens.len(), "parsing");
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !self.check(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                stmts.push(stmt);
            }
            self.skip_newlines();
        }
        tracing::debug!(filename = self.filename, top_level_stmts = stmts.len(), "parsed");
        Module {
            filename: self.filename,
            stmts: self.arena.alloc_slice_copy(&stmts),
        }
    }

    // ---- token stream primitives ----------------------------------------

    fn peek(&self) -> Token<'a> {
        self.tokens[self.pos]
    }

    fn peek_at(&self, offset: usize) -> Token<'a> {
        self.tokens
            .get(self.pos + offset)
            .copied()
            .unwrap_or(self.tokens[self.tokens.len() - 1])
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> Token<'a> {
        let tok = self.peek();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of `kind`, reporting a diagnostic and returning
    /// `None` if the next token doesn't match.
    fn expect(&mut self, kind: TokenKind, what: &str) -> Option<Token<'a>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            let tok = self.peek();
            self.error(tok, format!("expected {what}, found {}", tok.kind));
            None
        }
    }

    fn error(&mut self, tok: Token<'a>, message: String) {
        self.diags.error(self.filename, tok.line, message);
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    /// Consume a single trailing `;` and/or run of `NEWLINE`s after a simple
    /// statement; tolerant of a following `DEDENT`/`EOF` with no separator.
    fn finish_statement(&mut self) {
        self.matches(TokenKind::Semicolon);
        self.skip_newlines();
    }

    /// Skip tokens until a statement boundary (`NEWLINE`, `DEDENT`, `EOF`)
    /// is reached, then consume one `NEWLINE` if present so the caller
    /// lands cleanly on the next statement.
    fn synchronize(&mut self) {
        while !matches!(
            self.peek().kind,
            TokenKind::Newline | TokenKind::Dedent | TokenKind::Eof
        ) {
            self.advance();
        }
        self.matches(TokenKind::Newline);
    }

    // ---- statements -------------------------------------------------------

    fn parse_statement(&mut self) -> Option<&'a Stmt<'a>> {
        let result = self.parse_statement_inner();
        if result.is_none() {
            self.synchronize();
        }
        result
    }

    fn parse_statement_inner(&mut self) -> Option<&'a Stmt<'a>> {
        match self.peek().kind {
            TokenKind::Fn => self.parse_func_def(FuncMod::Default),
            TokenKind::Shared | TokenKind::Private => self.parse_modified_stmt(),
            TokenKind::Var => self.parse_var_decl(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => {
                let tok = self.advance();
                self.finish_statement();
                Some(self.stmt(StmtKind::Break, tok))
            }
            TokenKind::Continue => {
                let tok = self.advance();
                self.finish_statement();
                Some(self.stmt(StmtKind::Continue, tok))
            }
            TokenKind::Import => {
                let tok = self.advance();
                let name_tok = self.expect(TokenKind::Ident, "an import name")?;
                self.finish_statement();
                Some(self.stmt(StmtKind::Import(name_tok.lexeme), tok))
            }
            _ => self.parse_expr_statement(),
        }
    }

    fn stmt(&self, kind: StmtKind<'a>, tok: Token<'a>) -> &'a Stmt<'a> {
        self.arena.alloc(Stmt::new(kind, tok))
    }

    fn parse_modified_stmt(&mut self) -> Option<&'a Stmt<'a>> {
        let func_mod = if self.matches(TokenKind::Shared) {
            FuncMod::Shared
        } else {
            self.advance();
            FuncMod::Private
        };
        if self.check(TokenKind::Fn) {
            self.parse_func_def(func_mod)
        } else {
            let tok = self.expect(TokenKind::FatArrow, "`=>` after a block modifier")?;
            self.parse_block_body(func_mod, tok)
        }
    }

    fn parse_func_def(&mut self, func_mod: FuncMod) -> Option<&'a Stmt<'a>> {
        let fn_tok = self.advance(); // `fn`
        let name_tok = self.expect(TokenKind::Ident, "a function name")?;
        self.expect(TokenKind::LParen, "`(`")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let pname = self.expect(TokenKind::Ident, "a parameter name")?;
                self.expect(TokenKind::Colon, "`:`")?;
                let ty = self.parse_type()?;
                let mem_qual = self.parse_optional_mem_qual();
                params.push(Param {
                    name: pname.lexeme,
                    ty,
                    mem_qual,
                });
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        self.expect(TokenKind::Colon, "`:` and a return type")?;
        let ret = self.parse_type()?;
        let arrow = self.expect(TokenKind::FatArrow, "`=>`")?;
        let body_stmt = self.parse_block_body(FuncMod::Default, arrow)?;
        let body: &[&Stmt<'a>] = match &body_stmt.kind {
            StmtKind::Block { stmts, .. } => stmts,
            _ => self.arena.alloc_slice_fill_iter(std::iter::empty()),
        };
        Some(self.stmt(
            StmtKind::FuncDef {
                name: name_tok.lexeme,
                params: self.arena.alloc_slice_copy(&params),
                ret,
                body,
                func_mod,
            },
            fn_tok,
        ))
    }

    fn parse_optional_mem_qual(&mut self) -> MemQual {
        if self.matches(TokenKind::As) {
            if self.matches(TokenKind::Val) {
                MemQual::AsVal
            } else if self.matches(TokenKind::Ref) {
                MemQual::AsRef
            } else {
                let tok = self.peek();
                self.error(tok, "expected `val` or `ref` after `as`".to_string());
                MemQual::Default
            }
        } else {
            MemQual::Default
        }
    }

    fn parse_var_decl(&mut self) -> Option<&'a Stmt<'a>> {
        let var_tok = self.advance();
        let name_tok = self.expect(TokenKind::Ident, "a variable name")?;
        self.expect(TokenKind::Colon, "`:` and a type")?;
        let ty = self.parse_type()?;
        let init = if self.matches(TokenKind::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let mem_qual = self.parse_optional_mem_qual();
        self.finish_statement();
        Some(self.stmt(
            StmtKind::VarDecl {
                name: name_tok.lexeme,
                ty,
                init,
                mem_qual,
            },
            var_tok,
        ))
    }

    fn parse_type(&mut self) -> Option<Type<'a>> {
        let mut ty = match self.peek().kind {
            TokenKind::KwInt => {
                self.advance();
                Type::Int
            }
            TokenKind::KwLong => {
                self.advance();
                Type::Long
            }
            TokenKind::KwDouble => {
                self.advance();
                Type::Double
            }
            TokenKind::KwChar => {
                self.advance();
                Type::Char
            }
            TokenKind::KwBool => {
                self.advance();
                Type::Bool
            }
            TokenKind::KwStr => {
                self.advance();
                Type::Str
            }
            TokenKind::KwVoid => {
                self.advance();
                Type::Void
            }
            TokenKind::KwNil => {
                self.advance();
                Type::Nil
            }
            TokenKind::KwAny => {
                self.advance();
                Type::Any
            }
            _ => {
                let tok = self.peek();
                self.error(tok, format!("expected a type, found {}", tok.kind));
                return None;
            }
        };
        while self.check(TokenKind::LBracket) && self.peek_at(1).kind == TokenKind::RBracket {
            self.advance();
            self.advance();
            ty = Type::Array(self.arena.alloc(ty));
        }
        Some(ty)
    }

    fn parse_if(&mut self) -> Option<&'a Stmt<'a>> {
        let if_tok = self.advance();
        let cond = self.parse_expression()?;
        let arrow = self.expect(TokenKind::FatArrow, "`=>`")?;
        let then_branch = self.parse_block_body(FuncMod::Default, arrow)?;
        let else_branch = if self.check_else_after_block() {
            self.advance(); // else
            let arrow2 = self.expect(TokenKind::FatArrow, "`=>`")?;
            Some(self.parse_block_body(FuncMod::Default, arrow2)?)
        } else {
            None
        };
        Some(self.stmt(
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
            if_tok,
        ))
    }

    /// `else` may immediately follow the then-block's `DEDENT`, possibly
    /// after blank-line `NEWLINE`s, at the same statement level.
    fn check_else_after_block(&mut self) -> bool {
        let save = self.pos;
        self.skip_newlines();
        if self.check(TokenKind::Else) {
            true
        } else {
            self.pos = save;
            false
        }
    }

    fn parse_while(&mut self) -> Option<&'a Stmt<'a>> {
        let while_tok = self.advance();
        let cond = self.parse_expression()?;
        let arrow = self.expect(TokenKind::FatArrow, "`=>`")?;
        let body = self.parse_block_body(FuncMod::Default, arrow)?;
        Some(self.stmt(StmtKind::While { cond, body }, while_tok))
    }

    fn parse_for(&mut self) -> Option<&'a Stmt<'a>> {
        let for_tok = self.advance();
        if self.check(TokenKind::Var) {
            let var_tok = self.advance();
            let name_tok = self.expect(TokenKind::Ident, "a name")?;
            if self.matches(TokenKind::In) {
                let iterable = self.parse_expression()?;
                let arrow = self.expect(TokenKind::FatArrow, "`=>`")?;
                let body = self.parse_block_body(FuncMod::Default, arrow)?;
                return Some(self.stmt(
                    StmtKind::ForEach {
                        name: name_tok.lexeme,
                        iterable,
                        body,
                    },
                    for_tok,
                ));
            }
            self.expect(TokenKind::Colon, "`:` and a type")?;
            let ty = self.parse_type()?;
            let init_value = if self.matches(TokenKind::Eq) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            let init = self.stmt(
                StmtKind::VarDecl {
                    name: name_tok.lexeme,
                    ty,
                    init: init_value,
                    mem_qual: MemQual::Default,
                },
                var_tok,
            );
            self.expect(TokenKind::Semicolon, "`;`")?;
            let cond = if !self.check(TokenKind::Semicolon) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            self.expect(TokenKind::Semicolon, "`;`")?;
            let step = if !self.check(TokenKind::FatArrow) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            let arrow = self.expect(TokenKind::FatArrow, "`=>`")?;
            let body = self.parse_block_body(FuncMod::Default, arrow)?;
            return Some(self.stmt(
                StmtKind::For {
                    init: Some(init),
                    cond,
                    step,
                    body,
                },
                for_tok,
            ));
        }

        let init = if !self.check(TokenKind::Semicolon) {
            let e = self.parse_expression()?;
            let tok = e.token;
            Some(self.stmt(StmtKind::Expr(e), tok))
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, "`;`")?;
        let cond = if !self.check(TokenKind::Semicolon) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, "`;`")?;
        let step = if !self.check(TokenKind::FatArrow) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let arrow = self.expect(TokenKind::FatArrow, "`=>`")?;
        let body = self.parse_block_body(FuncMod::Default, arrow)?;
        Some(self.stmt(
            StmtKind::For {
                init,
                cond,
                step,
                body,
            },
            for_tok,
        ))
    }

    fn parse_return(&mut self) -> Option<&'a Stmt<'a>> {
        let tok = self.advance();
        let value = if matches!(
            self.peek().kind,
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Dedent | TokenKind::Eof
        ) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.finish_statement();
        Some(self.stmt(StmtKind::Return(value), tok))
    }

    fn parse_expr_statement(&mut self) -> Option<&'a Stmt<'a>> {
        let expr = self.parse_expression()?;
        let tok = expr.token;
        self.finish_statement();
        Some(self.stmt(StmtKind::Expr(expr), tok))
    }

    /// Parses the body of a block whose `=>` has already been consumed
    /// (`arrow` is that token, used for the resulting node's location).
    fn parse_block_body(&mut self, func_mod: FuncMod, arrow: Token<'a>) -> Option<&'a Stmt<'a>> {
        if self.matches(TokenKind::Newline) {
            self.expect(TokenKind::Indent, "an indented block")?;
            let mut stmts = Vec::new();
            self.skip_newlines();
            while !self.check(TokenKind::Dedent) && !self.check(TokenKind::Eof) {
                if let Some(s) = self.parse_statement() {
                    stmts.push(s);
                }
                self.skip_newlines();
            }
            self.expect(TokenKind::Dedent, "a dedent closing the block")?;
            Some(self.stmt(
                StmtKind::Block {
                    stmts: self.arena.alloc_slice_copy(&stmts),
                    func_mod,
                },
                arrow,
            ))
        } else {
            let single = self.parse_statement()?;
            Some(self.stmt(
                StmtKind::Block {
                    stmts: self.arena.alloc_slice_copy(&[single]),
                    func_mod,
                },
                arrow,
            ))
        }
    }

    // ---- expressions --------------------------------------------------

    fn expr(&self, kind: ExprKind<'a>, tok: Token<'a>) -> &'a Expr<'a> {
        self.arena.alloc(Expr::new(kind, tok))
    }

    fn parse_expression(&mut self) -> Option<&'a Expr<'a>> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Option<&'a Expr<'a>> {
        let target = self.parse_or()?;
        if self.check(TokenKind::Eq) {
            let tok = self.advance();
            let value = self.parse_assignment()?;
            return Some(self.expr(ExprKind::Assign { target, value }, tok));
        }
        Some(target)
    }

    fn parse_or(&mut self) -> Option<&'a Expr<'a>> {
        let mut left = self.parse_and()?;
        while self.check(TokenKind::OrOr) {
            let tok = self.advance();
            let right = self.parse_and()?;
            left = self.expr(
                ExprKind::Binary {
                    op: BinOp::Or,
                    left,
                    right,
                },
                tok,
            );
        }
        Some(left)
    }

    fn parse_and(&mut self) -> Option<&'a Expr<'a>> {
        let mut left = self.parse_equality()?;
        while self.check(TokenKind::AndAnd) {
            let tok = self.advance();
            let right = self.parse_equality()?;
            left = self.expr(
                ExprKind::Binary {
                    op: BinOp::And,
                    left,
                    right,
                },
                tok,
            );
        }
        Some(left)
    }

    fn parse_equality(&mut self) -> Option<&'a Expr<'a>> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::BangEq => BinOp::Ne,
                _ => break,
            };
            let tok = self.advance();
            let right = self.parse_relational()?;
            left = self.expr(ExprKind::Binary { op, left, right }, tok);
        }
        Some(left)
    }

    fn parse_relational(&mut self) -> Option<&'a Expr<'a>> {
        let mut left = self.parse_range()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::LtEq => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::GtEq => BinOp::Ge,
                _ => break,
            };
            let tok = self.advance();
            let right = self.parse_range()?;
            left = self.expr(ExprKind::Binary { op, left, right }, tok);
        }
        Some(left)
    }

    fn parse_range(&mut self) -> Option<&'a Expr<'a>> {
        let start = self.parse_additive()?;
        if self.check(TokenKind::DotDot) {
            let tok = self.advance();
            let end = self.parse_additive()?;
            return Some(self.expr(ExprKind::Range { start, end }, tok));
        }
        Some(start)
    }

    fn parse_additive(&mut self) -> Option<&'a Expr<'a>> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let tok = self.advance();
            let right = self.parse_multiplicative()?;
            left = self.expr(ExprKind::Binary { op, left, right }, tok);
        }
        Some(left)
    }

    fn parse_multiplicative(&mut self) -> Option<&'a Expr<'a>> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let tok = self.advance();
            let right = self.parse_unary()?;
            left = self.expr(ExprKind::Binary { op, left, right }, tok);
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<&'a Expr<'a>> {
        match self.peek().kind {
            TokenKind::Bang => {
                let tok = self.advance();
                let operand = self.parse_unary()?;
                Some(self.expr(
                    ExprKind::Unary {
                        op: UnOp::Not,
                        operand,
                    },
                    tok,
                ))
            }
            TokenKind::Minus => {
                let tok = self.advance();
                let operand = self.parse_unary()?;
                Some(self.expr(
                    ExprKind::Unary {
                        op: UnOp::Neg,
                        operand,
                    },
                    tok,
                ))
            }
            TokenKind::PlusPlus => {
                let tok = self.advance();
                let operand = self.parse_unary()?;
                Some(self.expr(
                    ExprKind::IncDec {
                        op: IncDecOp::PreInc,
                        operand,
                    },
                    tok,
                ))
            }
            TokenKind::MinusMinus => {
                let tok = self.advance();
                let operand = self.parse_unary()?;
                Some(self.expr(
                    ExprKind::IncDec {
                        op: IncDecOp::PreDec,
                        operand,
                    },
                    tok,
                ))
            }
            TokenKind::DotDotDot => {
                let tok = self.advance();
                let operand = self.parse_unary()?;
                Some(self.expr(ExprKind::Spread(operand), tok))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Option<&'a Expr<'a>> {
        let mut e = self.parse_primary()?;
        loop {
            match self.peek().kind {
                TokenKind::PlusPlus => {
                    let tok = self.advance();
                    e = self.expr(
                        ExprKind::IncDec {
                            op: IncDecOp::PostInc,
                            operand: e,
                        },
                        tok,
                    );
                }
                TokenKind::MinusMinus => {
                    let tok = self.advance();
                    e = self.expr(
                        ExprKind::IncDec {
                            op: IncDecOp::PostDec,
                            operand: e,
                        },
                        tok,
                    );
                }
                TokenKind::LParen => {
                    let tok = self.advance();
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expression()?);
                            if !self.matches(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen, "`)`")?;
                    e = self.expr(
                        ExprKind::Call {
                            callee: e,
                            args: self.arena.alloc_slice_copy(&args),
                        },
                        tok,
                    );
                }
                TokenKind::LBracket => {
                    let tok = self.advance();
                    e = self.parse_index_or_slice(e, tok)?;
                }
                TokenKind::Dot => {
                    let tok = self.advance();
                    let name_tok = self.expect(TokenKind::Ident, "a member name")?;
                    e = self.expr(
                        ExprKind::Member {
                            base: e,
                            name: name_tok.lexeme,
                        },
                        tok,
                    );
                }
                _ => break,
            }
        }
        Some(e)
    }

    fn parse_index_or_slice(&mut self, base: &'a Expr<'a>, tok: Token<'a>) -> Option<&'a Expr<'a>> {
        let start = if self.check(TokenKind::Colon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        if self.matches(TokenKind::Colon) {
            let end = if self.check(TokenKind::Colon) || self.check(TokenKind::RBracket) {
                None
            } else {
                Some(self.parse_expression()?)
            };
            let step = if self.matches(TokenKind::Colon) {
                if self.check(TokenKind::RBracket) {
                    None
                } else {
                    Some(self.parse_expression()?)
                }
            } else {
                None
            };
            self.expect(TokenKind::RBracket, "`]`")?;
            return Some(self.expr(
                ExprKind::Slice {
                    base,
                    start,
                    end,
                    step,
                },
                tok,
            ));
        }
        self.expect(TokenKind::RBracket, "`]`")?;
        let index = match start {
            Some(e) => e,
            None => {
                self.error(tok, "expected an index expression".to_string());
                return None;
            }
        };
        Some(self.expr(ExprKind::Index { base, index }, tok))
    }

    fn parse_primary(&mut self) -> Option<&'a Expr<'a>> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::IntLit => {
                self.advance();
                let v = match tok.literal {
                    Literal::Int(v) => v,
                    _ => 0,
                };
                Some(self.expr(ExprKind::Literal(LiteralValue::Int(v)), tok))
            }
            TokenKind::LongLit => {
                self.advance();
                let v = match tok.literal {
                    Literal::Long(v) => v,
                    _ => 0,
                };
                Some(self.expr(ExprKind::Literal(LiteralValue::Long(v)), tok))
            }
            TokenKind::DoubleLit => {
                self.advance();
                let v = match tok.literal {
                    Literal::Double(v) => v,
                    _ => 0.0,
                };
                Some(self.expr(ExprKind::Literal(LiteralValue::Double(v)), tok))
            }
            TokenKind::CharLit => {
                self.advance();
                let v = match tok.literal {
                    Literal::Char(c) => c,
                    _ => '\0',
                };
                Some(self.expr(ExprKind::Literal(LiteralValue::Char(v)), tok))
            }
            TokenKind::StringLit => {
                self.advance();
                let v = match tok.literal {
                    Literal::Str(s) => s,
                    _ => "",
                };
                Some(self.expr(ExprKind::Literal(LiteralValue::Str(v)), tok))
            }
            TokenKind::InterpStringLit => {
                self.advance();
                let raw = match tok.literal {
                    Literal::InterpRaw(s) => s,
                    _ => "",
                };
                Some(self.parse_interpolated(tok, raw))
            }
            TokenKind::True => {
                self.advance();
                Some(self.expr(ExprKind::Literal(LiteralValue::Bool(true)), tok))
            }
            TokenKind::False => {
                self.advance();
                Some(self.expr(ExprKind::Literal(LiteralValue::Bool(false)), tok))
            }
            TokenKind::KwNil => {
                self.advance();
                Some(self.expr(ExprKind::Literal(LiteralValue::Nil), tok))
            }
            TokenKind::Ident => {
                self.advance();
                Some(self.expr(ExprKind::Variable(tok.lexeme), tok))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Some(inner)
            }
            TokenKind::LBrace => {
                self.advance();
                let mut elems = Vec::new();
                if !self.check(TokenKind::RBrace) {
                    loop {
                        elems.push(self.parse_expression()?);
                        if !self.matches(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBrace, "`}`")?;
                Some(self.expr(
                    ExprKind::ArrayLiteral(self.arena.alloc_slice_copy(&elems)),
                    tok,
                ))
            }
            _ => {
                self.error(tok, format!("unexpected token {}", tok.kind));
                None
            }
        }
    }

    /// Re-scans an interpolated string's raw payload: literal runs alternate
    /// with `{expr}` placeholders, each parsed as a full expression by a
    /// fresh sub-lexer/sub-parser seeded on the bracketed text.
    fn parse_interpolated(&mut self, tok: Token<'a>, raw: &'a str) -> &'a Expr<'a> {
        let bytes = raw.as_bytes();
        let mut parts = Vec::new();
        let mut literal_buf = String::new();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' if i + 1 < bytes.len() => {
                    match crate::token::decode_escape(bytes[i + 1]) {
                        Some(c) => literal_buf.push(c),
                        None => literal_buf.push(bytes[i + 1] as char),
                    }
                    i += 2;
                }
                b'{' => {
                    if !literal_buf.is_empty() {
                        parts.push(InterpPart::Literal(self.arena.alloc_str(&literal_buf)));
                        literal_buf.clear();
                    }
                    let mut depth = 1usize;
                    let start = i + 1;
                    let mut j = start;
                    while j < bytes.len() && depth > 0 {
                        match bytes[j] {
                            b'{' => depth += 1,
                            b'}' => depth -= 1,
                            _ => {}
                        }
                        if depth > 0 {
                            j += 1;
                        }
                    }
                    let inner = std::str::from_utf8(&bytes[start..j]).unwrap_or("");
                    let sub_tokens = Lexer::init(self.arena, inner, self.filename).tokenize();
                    let mut sub_parser =
                        Parser::new(self.arena, sub_tokens, self.filename, self.diags);
                    if let Some(sub_expr) = sub_parser.parse_expression() {
                        parts.push(InterpPart::Expr(sub_expr));
                    }
                    i = j + 1;
                }
                other => {
                    literal_buf.push(other as char);
                    i += 1;
                }
            }
        }
        if !literal_buf.is_empty() {
            parts.push(InterpPart::Literal(self.arena.alloc_str(&literal_buf)));
        }
        self.expr(
            ExprKind::Interpolated(self.arena.alloc_slice_copy(&parts)),
            tok,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_core::Diagnostics;

    fn parse(src: &str) -> (Module<'_>, usize) {
        let arena = Box::leak(Box::new(Arena::new()));
        let tokens = Lexer::init(arena, src, "t.loom").tokenize();
        let mut diags = Diagnostics::new();
        let mut parser = Parser::new(arena, tokens, "t.loom", &mut diags);
        let module = parser.parse_module();
        (module, diags.entries().len())
    }

    #[test]
    fn parses_hello_world() {
        let (module, errs) = parse("fn main(): void => print(\"hello\\n\")");
        assert_eq!(errs, 0);
        assert_eq!(module.stmts.len(), 1);
        assert!(matches!(module.stmts[0].kind, StmtKind::FuncDef { .. }));
    }

    #[test]
    fn parses_var_decl_with_initializer_and_qualifier() {
        let (module, errs) = parse("var x: int = 1 as ref");
        assert_eq!(errs, 0);
        match &module.stmts[0].kind {
            StmtKind::VarDecl { mem_qual, init, .. } => {
                assert_eq!(*mem_qual, MemQual::AsRef);
                assert!(init.is_some());
            }
            other => panic!("expected VarDecl, got {other:?}"),
        }
    }

    #[test]
    fn parses_factorial_with_if_and_recursion() {
        let src = "fn factorial(n: int): int =>\n  if n <= 1 => return 1\n  return n * factorial(n - 1)\n";
        let (module, errs) = parse(src);
        assert_eq!(errs, 0);
        assert_eq!(module.stmts.len(), 1);
    }

    #[test]
    fn parses_array_literal_and_index() {
        let (module, errs) = parse("var a: int[] = {1, 2, 3}\nvar x: int = a[0]\n");
        assert_eq!(errs, 0);
        assert_eq!(module.stmts.len(), 2);
    }

    #[test]
    fn parses_member_call_chain() {
        let (module, errs) = parse("fn main(): void =>\n  var a: int[] = {1}\n  a.push(2)\n");
        assert_eq!(errs, 0);
        assert_eq!(module.stmts.len(), 1);
    }

    #[test]
    fn parses_interpolated_string_with_embedded_expression() {
        let (module, errs) = parse("fn main(): void => var x: int = 7; print($\"n={x}\\n\")\n");
        assert_eq!(errs, 0);
        assert_eq!(module.stmts.len(), 1);
    }

    #[test]
    fn parses_c_style_for_loop() {
        let src = "fn main(): void =>\n  for var i: int = 0; i < 10; i++ =>\n    print(i)\n";
        let (module, errs) = parse(src);
        assert_eq!(errs, 0);
        assert_eq!(module.stmts.len(), 1);
    }

    #[test]
    fn parses_for_each_loop() {
        let src = "fn main(): void =>\n  var a: int[] = {1, 2}\n  for var x in a =>\n    print(x)\n";
        let (module, errs) = parse(src);
        assert_eq!(errs, 0);
    }

    #[test]
    fn syntax_error_is_reported_and_recovered_from() {
        let src = "var x: int = \nvar y: int = 2\n";
        let (module, errs) = parse(src);
        assert!(errs >= 1);
        // The second, well-formed declaration should still be parsed.
        assert!(module.stmts.iter().any(|s| matches!(
            &s.kind,
            StmtKind::VarDecl { name, .. } if *name == "y"
        )));
    }

    #[test]
    fn parses_escape_violation_example() {
        let src = "private fn make(): str => return \"x\"\n";
        let (module, errs) = parse(src);
        assert_eq!(errs, 0);
        assert_eq!(module.stmts.len(), 1);
    }
}
