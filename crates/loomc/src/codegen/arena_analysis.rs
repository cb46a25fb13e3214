//! Static `needs_arena` analysis.
//!
//! A function or block needs its own `RtArena` iff it allocates anything
//! arena-backed: a `str`/array local, an array literal, a range, a string
//! concatenation or interpolation, a method call that returns a freshly
//! allocated `str`/array, or a slice. The check is deliberately
//! conservative — it asks "could this value be arena-backed" rather than
//! proving it must be, so a block that merely forwards an existing
//! reference may open an arena it doesn't strictly need. That costs one
//! unused `rt_arena_create`/`rt_arena_destroy` pair at worst, never
//! incorrectness.

use crate::ast::{Expr, ExprKind, Stmt, StmtKind};
use crate::types::Type;

pub(super) fn stmts_need_arena(stmts: &[&Stmt<'_>]) -> bool {
    stmts.iter().any(|s| stmt_needs_arena(s))
}

fn stmt_needs_arena(stmt: &Stmt<'_>) -> bool {
    match &stmt.kind {
        StmtKind::Expr(e) => expr_needs_arena(e),
        StmtKind::VarDecl { ty, init, .. } => {
            is_heap_type(ty) || init.is_some_and(|e| expr_needs_arena(e))
        }
        StmtKind::Return(Some(e)) => expr_needs_arena(e),
        StmtKind::Return(None) => false,
        StmtKind::If { cond, then_branch, else_branch } => {
            expr_needs_arena(cond)
                || stmt_needs_arena(then_branch)
                || else_branch.is_some_and(stmt_needs_arena)
        }
        StmtKind::While { cond, body } => expr_needs_arena(cond) || stmt_needs_arena(body),
        StmtKind::For { init, cond, step, body } => {
            init.is_some_and(stmt_needs_arena)
                || cond.is_some_and(|e| expr_needs_arena(e))
                || step.is_some_and(|e| expr_needs_arena(e))
                || stmt_needs_arena(body)
        }
        StmtKind::ForEach { iterable, body, .. } => {
            expr_needs_arena(iterable) || stmt_needs_arena(body)
        }
        // A nested `private` block opens its own arena independent of the
        // enclosing one; it doesn't make the *enclosing* scope need one by
        // itself, but the nested `FuncDef`/Block is walked on its own when
        // it's codegen'd, so this check isn't reached for its own body.
        StmtKind::Block { stmts, .. } => stmts_need_arena(stmts),
        StmtKind::FuncDef { .. } | StmtKind::Break | StmtKind::Continue | StmtKind::Import(_) => {
            false
        }
    }
}

fn is_heap_type(ty: &Type<'_>) -> bool {
    matches!(ty, Type::Str | Type::Array(_))
}

fn expr_needs_arena(e: &Expr<'_>) -> bool {
    match &e.kind {
        ExprKind::Literal(_) | ExprKind::Variable(_) => false,
        ExprKind::Assign { target, value } => expr_needs_arena(target) || expr_needs_arena(value),
        ExprKind::Binary { left, right, .. } => {
            e.ty().is_some_and(|t| t == Type::Str)
                || expr_needs_arena(left)
                || expr_needs_arena(right)
        }
        ExprKind::Unary { operand, .. } => expr_needs_arena(operand),
        ExprKind::IncDec { operand, .. } => expr_needs_arena(operand),
        ExprKind::Call { callee, args } => {
            e.ty().is_some_and(is_heap_value)
                || expr_needs_arena(callee)
                || args.iter().any(|a| expr_needs_arena(a))
        }
        // Array literals, slices, and ranges always allocate their result,
        // regardless of whether their operands do.
        ExprKind::ArrayLiteral(_) | ExprKind::Slice { .. } | ExprKind::Range { .. } => true,
        ExprKind::Index { base, index } => expr_needs_arena(base) || expr_needs_arena(index),
        ExprKind::Spread(inner) => expr_needs_arena(inner),
        ExprKind::Member { base, .. } => e.ty().is_some_and(is_heap_value) || expr_needs_arena(base),
        ExprKind::Interpolated(_) => true,
    }
}

fn is_heap_value(ty: Type) -> bool {
    matches!(ty, Type::Str | Type::Array(_))
}
