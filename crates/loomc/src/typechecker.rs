//! Two-pass type checker with escape analysis.
//!
//! Pass 1 walks top-level statements and registers every function's type in
//! the global scope before any body is checked, so forward reference and
//! mutual recursion just work. Pass 2 walks bodies, pushing a scope per
//! block/function and stamping `expr_type` on every expression it visits.
//! Escape analysis (the `shared`/`private`/`as val`/`as ref` rules) rides
//! along in the same walk rather than as a separate pass, since it only
//! needs to know the current region kind and each node's already-computed
//! type.

use crate::ast::{
    BinOp, Expr, ExprKind, FuncMod, IncDecOp, InterpPart, LiteralValue, MemQual, Module, Param,
    Stmt, StmtKind, UnOp,
};
use crate::methods;
use crate::symtab::{SymKind, SymbolTable};
use crate::types::Type;
use loom_core::{suggest, Diagnostics};

/// Which kind of memory region the checker is currently inside, for escape
/// analysis. `Shared` regions don't open a boundary of their own, so nesting
/// a `shared` block inside a `private` one keeps the `Private` restriction
/// in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Default,
    Shared,
    Private,
}

impl Region {
    fn enter(self, func_mod: FuncMod) -> Region {
        match func_mod {
            FuncMod::Shared => self,
            FuncMod::Private => Region::Private,
            FuncMod::Default => Region::Default,
        }
    }
}

pub struct TypeChecker<'a, 'd> {
    symtab: SymbolTable<'a>,
    diags: &'d mut Diagnostics,
    filename: &'a str,
    region: Region,
    current_ret: Type<'a>,
}

impl<'a, 'd> TypeChecker<'a, 'd> {
    pub fn new(filename: &'a str, diags: &'d mut Diagnostics) -> Self {
        TypeChecker {
            symtab: SymbolTable::new(),
            diags,
            filename,
            region: Region::Default,
            current_ret: Type::Void,
        }
    }

    /// Run both passes over a module. Returns `true` iff no error was
    /// raised, per spec.md §4.5's "boolean AND of no error raised" rule.
    pub fn check_module(&mut self, module: &Module<'a>) -> bool {
        tracing::trace!(filename = self.filename, top_level_stmts = module.stmts.len(), "type checking");
        for stmt in module.stmts {
            self.collect_signature(stmt);
        }
        for stmt in module.stmts {
            self.check_stmt(stmt);
        }
        let ok = !self.diags.has_errors();
        tracing::debug!(filename = self.filename, ok, "type checked");
        ok
    }

    fn error(&mut self, line: u32, message: impl Into<String>) {
        self.diags.error(self.filename, line, message);
    }

    fn error_with_suggestion(&mut self, line: u32, message: impl Into<String>, name: &str) {
        let candidates: Vec<&str> = self.symtab.visible_names().collect();
        match suggest(name, candidates) {
            Some(s) => self.diags.error_with_suggestion(self.filename, line, message, s),
            None => self.diags.error(self.filename, line, message),
        }
    }

    // ---- pass 1: signatures ------------------------------------------------

    fn collect_signature(&mut self, stmt: &Stmt<'a>) {
        match &stmt.kind {
            StmtKind::FuncDef {
                name,
                params,
                ret,
                func_mod,
                ..
            } => {
                self.register_function(name, params, *ret, *func_mod);
            }
            StmtKind::Block { stmts, .. } => {
                for s in *stmts {
                    self.collect_signature(s);
                }
            }
            _ => {}
        }
    }

    fn register_function(
        &mut self,
        name: &'a str,
        params: &'a [Param<'a>],
        ret: Type<'a>,
        func_mod: FuncMod,
    ) {
        let param_types: Vec<Type<'a>> = params.iter().map(|p| p.ty).collect();
        let fn_type = Type::Function {
            params: leak_slice(param_types),
            ret: leak_type(ret),
        };
        self.symtab.add_function_symbol(name, fn_type, func_mod);
    }

    // ---- pass 2: statements -------------------------------------------------

    fn check_stmt(&mut self, stmt: &Stmt<'a>) {
        match &stmt.kind {
            StmtKind::Expr(e) => {
                self.check_expr(e);
            }
            StmtKind::VarDecl {
                name,
                ty,
                init,
                mem_qual,
            } => self.check_var_decl(stmt.line(), name, *ty, *init, *mem_qual),
            StmtKind::FuncDef {
                name,
                params,
                ret,
                body,
                func_mod,
            } => self.check_func_def(name, params, *ret, body, *func_mod),
            StmtKind::Return(value) => self.check_return(stmt.line(), *value),
            StmtKind::Block { stmts, func_mod } => self.check_block(*stmts, *func_mod),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => self.check_if(cond, then_branch, *else_branch),
            StmtKind::While { cond, body } => self.check_while(cond, body),
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => self.check_for(*init, *cond, *step, body),
            StmtKind::ForEach {
                name,
                iterable,
                body,
            } => self.check_for_each(stmt.line(), name, iterable, body),
            StmtKind::Break | StmtKind::Continue | StmtKind::Import(_) => {}
        }
    }

    fn check_var_decl(
        &mut self,
        line: u32,
        name: &'a str,
        ty: Type<'a>,
        init: Option<&'a Expr<'a>>,
        mem_qual: MemQual,
    ) {
        if self.region == Region::Private && mem_qual != MemQual::AsRef && !ty.is_primitive() {
            self.error(
                line,
                format!(
                    "variable `{name}` of non-primitive type `{ty}` cannot be declared in a \
                     private region without `as ref`"
                ),
            );
        }
        if let Some(init_expr) = init {
            let init_ty = self.check_expr(init_expr);
            if !init_ty.is_assignable_to(&ty) {
                self.error(
                    line,
                    format!("cannot initialize `{name}: {ty}` with value of type `{init_ty}`"),
                );
            }
        }
        let kind = if self.symtab.depth() == 1 {
            SymKind::Global
        } else {
            SymKind::Local
        };
        self.symtab.add_symbol(name, ty, kind, mem_qual);
    }

    fn check_func_def(
        &mut self,
        name: &'a str,
        params: &'a [Param<'a>],
        ret: Type<'a>,
        body: &'a [&'a Stmt<'a>],
        func_mod: FuncMod,
    ) {
        let saved_region = self.region;
        let saved_ret = self.current_ret;
        self.region = Region::Default.enter(func_mod);
        self.current_ret = ret;

        self.symtab.begin_function_scope();
        for p in params {
            if self.region == Region::Private && p.mem_qual != MemQual::AsRef && !p.ty.is_primitive()
            {
                self.error(
                    0,
                    format!(
                        "parameter `{}` of `{name}` has non-primitive type `{}` but `{name}` is \
                         private; qualify it `as ref`",
                        p.name, p.ty
                    ),
                );
            }
            self.symtab.add_symbol(p.name, p.ty, SymKind::Param, p.mem_qual);
        }
        for s in body {
            self.check_stmt(s);
        }
        self.symtab.pop_scope();

        self.region = saved_region;
        self.current_ret = saved_ret;
    }

    fn check_return(&mut self, line: u32, value: Option<&'a Expr<'a>>) {
        let ret_ty = self.current_ret;
        let actual = match value {
            Some(e) => self.check_expr(e),
            None => Type::Void,
        };
        if value.is_none() && ret_ty != Type::Void {
            self.error(line, format!("missing return value; expected `{ret_ty}`"));
            return;
        }
        if value.is_some() && !actual.is_assignable_to(&ret_ty) {
            self.error(
                line,
                format!("return type mismatch: expected `{ret_ty}`, found `{actual}`"),
            );
        }
        if self.region == Region::Private && !actual.is_primitive() && value.is_some() {
            self.error(
                line,
                format!(
                    "cannot return non-primitive type `{actual}` out of a private region; only \
                     primitives may cross the boundary"
                ),
            );
        }
    }

    fn check_block(&mut self, stmts: &'a [&'a Stmt<'a>], func_mod: FuncMod) {
        let saved_region = self.region;
        self.region = saved_region.enter(func_mod);
        if func_mod != FuncMod::Shared {
            self.symtab.push_scope();
        }
        for s in stmts {
            self.check_stmt(s);
        }
        if func_mod != FuncMod::Shared {
            self.symtab.pop_scope();
        }
        self.region = saved_region;
    }

    fn check_if(&mut self, cond: &'a Expr<'a>, then_branch: &'a Stmt<'a>, else_branch: Option<&'a Stmt<'a>>) {
        let cond_ty = self.check_expr(cond);
        if cond_ty != Type::Bool && cond_ty != Type::Any {
            self.error(cond.line(), format!("`if` condition must be `bool`, found `{cond_ty}`"));
        }
        self.check_stmt(then_branch);
        if let Some(e) = else_branch {
            self.check_stmt(e);
        }
    }

    fn check_while(&mut self, cond: &'a Expr<'a>, body: &'a Stmt<'a>) {
        let cond_ty = self.check_expr(cond);
        if cond_ty != Type::Bool && cond_ty != Type::Any {
            self.error(cond.line(), format!("`while` condition must be `bool`, found `{cond_ty}`"));
        }
        self.check_stmt(body);
    }

    fn check_for(
        &mut self,
        init: Option<&'a Stmt<'a>>,
        cond: Option<&'a Expr<'a>>,
        step: Option<&'a Expr<'a>>,
        body: &'a Stmt<'a>,
    ) {
        self.symtab.push_scope();
        if let Some(s) = init {
            self.check_stmt(s);
        }
        if let Some(c) = cond {
            let cond_ty = self.check_expr(c);
            if cond_ty != Type::Bool && cond_ty != Type::Any {
                self.error(c.line(), format!("`for` condition must be `bool`, found `{cond_ty}`"));
            }
        }
        if let Some(s) = step {
            self.check_expr(s);
        }
        self.check_stmt(body);
        self.symtab.pop_scope();
    }

    fn check_for_each(&mut self, line: u32, name: &'a str, iterable: &'a Expr<'a>, body: &'a Stmt<'a>) {
        let iter_ty = self.check_expr(iterable);
        let elem_ty = match iter_ty {
            Type::Array(elem) => *elem,
            Type::Any => Type::Any,
            other => {
                self.error(line, format!("`for-each` requires an array, found `{other}`"));
                Type::Any
            }
        };
        self.symtab.push_scope();
        self.symtab.add_symbol(name, elem_ty, SymKind::Local, MemQual::Default);
        self.check_stmt(body);
        self.symtab.pop_scope();
    }

    // ---- expressions --------------------------------------------------

    fn check_expr(&mut self, e: &'a Expr<'a>) -> Type<'a> {
        let ty = self.infer_expr(e);
        e.set_ty(ty);
        ty
    }

    fn infer_expr(&mut self, e: &'a Expr<'a>) -> Type<'a> {
        match &e.kind {
            ExprKind::Literal(lit) => self.literal_type(lit),
            ExprKind::Variable(name) => self.variable_type(e.line(), name),
            ExprKind::Assign { target, value } => self.check_assign(e.line(), target, value),
            ExprKind::Binary { op, left, right } => self.check_binary(e.line(), *op, left, right),
            ExprKind::Unary { op, operand } => self.check_unary(e.line(), *op, operand),
            ExprKind::IncDec { op, operand } => self.check_incdec(e.line(), *op, operand),
            ExprKind::Call { callee, args } => self.check_call(e.line(), callee, args),
            ExprKind::ArrayLiteral(elems) => self.check_array_literal(e.line(), elems),
            ExprKind::Index { base, index } => self.check_index(e.line(), base, index),
            ExprKind::Slice { base, start, end, step } => {
                self.check_slice(e.line(), base, *start, *end, *step)
            }
            ExprKind::Range { start, end } => self.check_range(e.line(), start, end),
            ExprKind::Spread(inner) => self.check_expr(inner),
            ExprKind::Member { base, name } => self.check_member(e.line(), base, name),
            ExprKind::Interpolated(parts) => self.check_interpolated(e.line(), parts),
        }
    }

    fn literal_type(&self, lit: &LiteralValue<'a>) -> Type<'a> {
        match lit {
            LiteralValue::Int(_) => Type::Int,
            LiteralValue::Long(_) => Type::Long,
            LiteralValue::Double(_) => Type::Double,
            LiteralValue::Char(_) => Type::Char,
            LiteralValue::Str(_) => Type::Str,
            LiteralValue::Bool(_) => Type::Bool,
            LiteralValue::Nil => Type::Nil,
        }
    }

    fn variable_type(&mut self, line: u32, name: &'a str) -> Type<'a> {
        match self.symtab.lookup(name) {
            Some(sym) => sym.ty,
            None => {
                self.error_with_suggestion(line, format!("undefined name `{name}`"), name);
                Type::Any
            }
        }
    }

    fn check_assign(&mut self, line: u32, target: &'a Expr<'a>, value: &'a Expr<'a>) -> Type<'a> {
        let target_ty = self.check_expr(target);
        let value_ty = self.check_expr(value);
        if !target.is_lvalue() {
            self.error(line, "left-hand side of assignment is not assignable".to_string());
            return target_ty;
        }
        // Assignment requires the value's type to equal the target's
        // declared type exactly (spec's numeric promotion is scoped to call
        // arguments only, not assignment) — `any`/`nil` are the only
        // explicit exceptions, same as everywhere else in the checker.
        let assignable = value_ty == target_ty
            || value_ty == Type::Any
            || target_ty == Type::Any
            || (value_ty == Type::Nil && target_ty.is_reference());
        if !assignable {
            self.error(
                line,
                format!("cannot assign `{value_ty}` to target of type `{target_ty}`"),
            );
        }
        if self.region == Region::Private && !target_ty.is_primitive() {
            if let ExprKind::Variable(name) = &target.kind {
                if self.symtab.lookup_current(name).is_none() {
                    self.error(
                        line,
                        format!(
                            "assigning a non-primitive value to outer-scope variable `{name}` \
                             escapes this private region"
                        ),
                    );
                }
            }
        }
        target_ty
    }

    fn check_binary(&mut self, line: u32, op: BinOp, left: &'a Expr<'a>, right: &'a Expr<'a>) -> Type<'a> {
        let lt = self.check_expr(left);
        let rt = self.check_expr(right);
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                if op == BinOp::Add && (lt == Type::Str || rt == Type::Str) {
                    if lt != Type::Str && lt != Type::Any {
                        self.error(line, format!("cannot concatenate `str` with `{lt}`"));
                    }
                    if rt != Type::Str && rt != Type::Any {
                        self.error(line, format!("cannot concatenate `str` with `{rt}`"));
                    }
                    return Type::Str;
                }
                match lt.promote(&rt) {
                    Some(common) => common,
                    None => {
                        if lt != Type::Any && rt != Type::Any {
                            self.error(
                                line,
                                format!("arithmetic requires numeric operands, found `{lt}` and `{rt}`"),
                            );
                        }
                        Type::Any
                    }
                }
            }
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                let both_numeric = lt.is_numeric() && rt.is_numeric();
                let both_string = lt == Type::Str && rt == Type::Str;
                if !both_numeric && !both_string && lt != Type::Any && rt != Type::Any {
                    self.error(
                        line,
                        format!("comparison requires two numeric or two `str` operands, found `{lt}` and `{rt}`"),
                    );
                }
                Type::Bool
            }
            BinOp::And | BinOp::Or => {
                if lt != Type::Bool && lt != Type::Any {
                    self.error(line, format!("logical operator requires `bool`, found `{lt}`"));
                }
                if rt != Type::Bool && rt != Type::Any {
                    self.error(line, format!("logical operator requires `bool`, found `{rt}`"));
                }
                Type::Bool
            }
        }
    }

    fn check_unary(&mut self, line: u32, op: UnOp, operand: &'a Expr<'a>) -> Type<'a> {
        let ty = self.check_expr(operand);
        match op {
            UnOp::Not => {
                if ty != Type::Bool && ty != Type::Any {
                    self.error(line, format!("`!` requires `bool`, found `{ty}`"));
                }
                Type::Bool
            }
            UnOp::Neg => {
                if !ty.is_numeric() && ty != Type::Any {
                    self.error(line, format!("unary `-` requires a numeric operand, found `{ty}`"));
                    return Type::Any;
                }
                ty
            }
        }
    }

    fn check_incdec(&mut self, line: u32, _op: IncDecOp, operand: &'a Expr<'a>) -> Type<'a> {
        let ty = self.check_expr(operand);
        if !operand.is_lvalue() {
            self.error(line, "increment/decrement requires a modifiable variable".to_string());
        }
        if !ty.is_numeric() && ty != Type::Any {
            self.error(line, format!("increment/decrement requires a numeric operand, found `{ty}`"));
        }
        ty
    }

    fn check_call(&mut self, line: u32, callee: &'a Expr<'a>, args: &'a [&'a Expr<'a>]) -> Type<'a> {
        // `print` is a runtime builtin (spec.md §6/§8), not a user-defined
        // symbol; a program that declares its own `print` shadows it like
        // any other name, so the lookup below only treats it as the builtin
        // when nothing in scope already claims the name.
        if let ExprKind::Variable(name) = &callee.kind {
            if *name == "print" && self.symtab.lookup(name).is_none() {
                return self.check_print_call(line, args);
            }
        }
        let callee_ty = self.check_expr(callee);
        let arg_types: Vec<Type<'a>> = args.iter().map(|a| self.check_expr(a)).collect();
        match callee_ty {
            Type::Function { params, ret } => {
                if params.len() != arg_types.len() {
                    self.error(
                        line,
                        format!(
                            "expected {} argument(s), found {}",
                            params.len(),
                            arg_types.len()
                        ),
                    );
                } else {
                    for (i, (p, a)) in params.iter().zip(arg_types.iter()).enumerate() {
                        if !a.is_assignable_to(p) {
                            self.error(
                                line,
                                format!("argument {}: expected `{p}`, found `{a}`", i + 1),
                            );
                        }
                    }
                }
                *ret
            }
            Type::Any => Type::Any,
            other => {
                self.error(line, format!("cannot call a value of type `{other}`"));
                Type::Any
            }
        }
    }

    /// `print(x)` accepts exactly one printable value (the same rule as an
    /// interpolated `${x}`) and always evaluates to `void`.
    fn check_print_call(&mut self, line: u32, args: &'a [&'a Expr<'a>]) -> Type<'a> {
        if args.len() != 1 {
            self.error(
                line,
                format!("`print` takes exactly 1 argument, found {}", args.len()),
            );
        }
        for a in args {
            let t = self.check_expr(a);
            if !Self::is_printable(&t) {
                self.error(line, format!("cannot print a value of type `{t}`"));
            }
        }
        Type::Void
    }

    fn check_array_literal(&mut self, line: u32, elems: &'a [&'a Expr<'a>]) -> Type<'a> {
        if elems.is_empty() {
            return Type::Array(leak_type(Type::Nil));
        }
        let mut elem_ty = self.check_expr(elems[0]);
        for elem in &elems[1..] {
            let t = self.check_expr(elem);
            if t != elem_ty {
                if elem_ty == Type::Nil {
                    elem_ty = t;
                } else if t != Type::Nil {
                    self.error(line, format!("array elements must share a type; found `{elem_ty}` and `{t}`"));
                }
            }
        }
        Type::Array(leak_type(elem_ty))
    }

    fn check_index(&mut self, line: u32, base: &'a Expr<'a>, index: &'a Expr<'a>) -> Type<'a> {
        let base_ty = self.check_expr(base);
        let index_ty = self.check_expr(index);
        if !index_ty.is_numeric() && index_ty != Type::Any {
            self.error(line, format!("array index must be numeric, found `{index_ty}`"));
        }
        match base_ty {
            Type::Array(elem) => *elem,
            Type::Any => Type::Any,
            other => {
                self.error(line, format!("cannot index a value of type `{other}`"));
                Type::Any
            }
        }
    }

    fn check_slice(
        &mut self,
        line: u32,
        base: &'a Expr<'a>,
        start: Option<&'a Expr<'a>>,
        end: Option<&'a Expr<'a>>,
        step: Option<&'a Expr<'a>>,
    ) -> Type<'a> {
        let base_ty = self.check_expr(base);
        for bound in [start, end, step].into_iter().flatten() {
            let t = self.check_expr(bound);
            if !t.is_numeric() && t != Type::Any {
                self.error(line, format!("slice bound must be numeric, found `{t}`"));
            }
        }
        match base_ty {
            Type::Array(_) | Type::Str | Type::Any => base_ty,
            other => {
                self.error(line, format!("cannot slice a value of type `{other}`"));
                Type::Any
            }
        }
    }

    fn check_range(&mut self, line: u32, start: &'a Expr<'a>, end: &'a Expr<'a>) -> Type<'a> {
        let st = self.check_expr(start);
        let et = self.check_expr(end);
        if (!st.is_numeric() && st != Type::Any) || (!et.is_numeric() && et != Type::Any) {
            self.error(line, format!("range bounds must be numeric, found `{st}` and `{et}`"));
        }
        Type::Array(leak_type(Type::Long))
    }

    fn check_member(&mut self, line: u32, base: &'a Expr<'a>, name: &'a str) -> Type<'a> {
        let base_ty = self.check_expr(base);
        match base_ty {
            Type::Array(elem) => {
                if name == "length" {
                    return Type::Int;
                }
                match methods::lookup_array_method(name) {
                    Some(sig) => sig.resolve(*elem, Type::Array(elem)).ret,
                    None => {
                        self.error_member_not_found(line, name, methods::array_method_names());
                        Type::Any
                    }
                }
            }
            Type::Str => {
                if name == "length" {
                    return Type::Int;
                }
                match methods::lookup_string_method(name) {
                    Some(sig) => sig.resolve(Type::Char, Type::Str).ret,
                    None => {
                        self.error_member_not_found(line, name, methods::string_method_names());
                        Type::Any
                    }
                }
            }
            Type::Any => Type::Any,
            other => {
                self.error(line, format!("type `{other}` has no member `{name}`"));
                Type::Any
            }
        }
    }

    fn error_member_not_found(&mut self, line: u32, name: &str, candidates: impl Iterator<Item = &'static str>) {
        let cands: Vec<&str> = candidates.collect();
        match suggest(name, cands.iter().copied()) {
            Some(s) => self.diags.error_with_suggestion(
                self.filename,
                line,
                format!("no member `{name}` on this type"),
                s,
            ),
            None => self.error(line, format!("no member `{name}` on this type")),
        }
    }

    fn check_interpolated(&mut self, line: u32, parts: &'a [InterpPart<'a>]) -> Type<'a> {
        for part in parts {
            if let InterpPart::Expr(inner) = part {
                let t = self.check_expr(inner);
                if !Self::is_printable(&t) {
                    self.error(line, format!("cannot interpolate a value of type `{t}`"));
                }
            }
        }
        Type::Str
    }

    fn is_printable(ty: &Type<'a>) -> bool {
        match ty {
            Type::Int | Type::Long | Type::Double | Type::Char | Type::Bool | Type::Str | Type::Any => true,
            Type::Array(elem) => Self::is_printable(elem),
            _ => false,
        }
    }
}

impl<'a> Type<'a> {
    fn is_primitive(&self) -> bool {
        matches!(
            self,
            Type::Int | Type::Long | Type::Double | Type::Char | Type::Bool
        )
    }
}

fn leak_slice<'a>(items: Vec<Type<'a>>) -> &'a [Type<'a>] {
    Box::leak(items.into_boxed_slice())
}

fn leak_type<'a>(ty: Type<'a>) -> &'a Type<'a> {
    Box::leak(Box::new(ty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use loom_core::Arena;

    fn check(src: &str) -> (bool, usize) {
        let arena = Box::leak(Box::new(Arena::new()));
        let tokens = Lexer::init(arena, src, "t.loom").tokenize();
        let mut parse_diags = Diagnostics::new();
        let module = Parser::new(arena, tokens, "t.loom", &mut parse_diags).parse_module();
        assert!(parse_diags.is_empty(), "parse errors: {:?}", parse_diags.entries());
        let module = Box::leak(Box::new(module));
        let mut diags = Diagnostics::new();
        let mut checker = TypeChecker::new("t.loom", &mut diags);
        let ok = checker.check_module(module);
        (ok, diags.entries().len())
    }

    #[test]
    fn accepts_well_typed_hello_world() {
        let (ok, errs) = check("fn main(): void => print(\"hi\")");
        assert_eq!(errs, 0);
        assert!(ok);
    }

    #[test]
    fn print_rejects_the_wrong_argument_count() {
        let (ok, errs) = check("fn main(): void => print(\"a\", \"b\")");
        assert_eq!(errs, 1);
        assert!(!ok);
    }

    #[test]
    fn print_rejects_a_non_printable_argument() {
        let src = "fn f(): void => return\nfn main(): void => print(f)\n";
        let (ok, errs) = check(src);
        assert_eq!(errs, 1);
        assert!(!ok);
    }

    #[test]
    fn a_user_defined_print_function_shadows_the_builtin() {
        let src = "fn print(x: int): void => return\nfn main(): void => print(1)\n";
        let (ok, errs) = check(src);
        assert_eq!(errs, 0);
        assert!(ok);
    }

    #[test]
    fn mutual_recursion_is_allowed_by_forward_signature_collection() {
        // `n - 1` always types as `long` (spec's arithmetic result rule), so
        // the parameters have to be `long` too or the recursive call would
        // be a narrowing argument, which isn't allowed.
        let src = "fn is_even(n: long): bool => return is_odd(n - 1)\nfn is_odd(n: long): bool => return is_even(n - 1)\n";
        let (ok, errs) = check(src);
        assert!(ok, "errors: {errs}");
    }

    #[test]
    fn assignment_type_mismatch_is_reported() {
        let src = "var x: int = 1\nfn main(): void => x = \"oops\"\n";
        let (ok, _errs) = check(src);
        assert!(!ok);
    }

    #[test]
    fn numeric_promotion_allows_int_argument_to_long_parameter() {
        let src = "fn takes_long(n: long): void => return\nfn main(): void => takes_long(1)\n";
        let (ok, errs) = check(src);
        assert!(ok, "errors: {errs}");
    }

    #[test]
    fn array_method_call_resolves_through_the_shared_method_table() {
        let src = "fn main(): void =>\n  var a: int[] = {1, 2}\n  a.push(3)\n";
        let (ok, errs) = check(src);
        assert!(ok, "errors: {errs}");
    }

    #[test]
    fn private_function_may_not_return_a_string() {
        let src = "private fn make(): str => return \"x\"\n";
        let (ok, _errs) = check(src);
        assert!(!ok);
    }

    #[test]
    fn private_function_may_return_a_primitive() {
        let src = "private fn make(): int => return 1\n";
        let (ok, errs) = check(src);
        assert!(ok, "errors: {errs}");
    }

    #[test]
    fn undefined_name_suggests_a_close_match() {
        let src = "fn main(): void =>\n  var count: int = 0\n  count = coutn + 1\n";
        let (ok, _errs) = check(src);
        assert!(!ok);
    }

    #[test]
    fn interpolated_string_rejects_non_printable_embedded_function_value() {
        let src = "fn f(): void => return\nfn main(): void => var s: str = $\"{f}\"\n";
        let (ok, _errs) = check(src);
        assert!(!ok);
    }

    #[test]
    fn for_each_binds_the_element_type() {
        let src = "fn main(): void =>\n  var a: int[] = {1, 2, 3}\n  for var x in a =>\n    var y: int = x\n";
        let (ok, errs) = check(src);
        assert!(ok, "errors: {errs}");
    }
}
