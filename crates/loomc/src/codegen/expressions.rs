//! Expression lowering.
//!
//! Most expressions lower to a single C expression fragment. A few need to
//! emit statements first (array construction, interpolation, method calls
//! that allocate) — those assign into a fresh `__tmp_N__` via `self.line`
//! and return the temp's name, so callers never need to know which shape
//! they got.

use crate::ast::{BinOp, Expr, ExprKind, IncDecOp, InterpPart, LiteralValue, UnOp};
use crate::methods::{self, MethodSig};
use crate::types::Type;

use super::error::CodeGenError;
use super::state::CodeGen;
use super::types::{c_fn_name, c_type, rt_kind, rt_kind_code};

/// Methods whose runtime entry point takes the current arena as its first
/// argument, i.e. it may allocate. Matched against `MethodSig::runtime_fn`
/// rather than re-deriving it, so this stays in lockstep with `methods.rs`.
fn method_needs_arena(runtime_fn: &str) -> bool {
    matches!(
        runtime_fn,
        "rt_array_push"
            | "rt_array_concat"
            | "rt_array_reverse"
            | "rt_array_clone"
            | "rt_array_join"
            | "rt_str_substring"
            | "rt_str_trim"
            | "rt_str_to_upper"
            | "rt_str_to_lower"
            | "rt_str_replace"
            | "rt_str_split"
    )
}

impl CodeGen {
    pub(super) fn codegen_expr(&mut self, e: &Expr<'_>) -> Result<String, CodeGenError> {
        match &e.kind {
            ExprKind::Literal(lit) => Ok(self.codegen_literal(lit)),
            ExprKind::Variable(name) => Ok((*name).to_string()),
            ExprKind::Assign { target, value } => self.codegen_assign(target, value),
            ExprKind::Binary { op, left, right } => self.codegen_binary(e, *op, left, right),
            ExprKind::Unary { op, operand } => self.codegen_unary(*op, operand),
            ExprKind::IncDec { op, operand } => self.codegen_incdec(*op, operand),
            ExprKind::Call { callee, args } => self.codegen_call(callee, args),
            ExprKind::ArrayLiteral(elems) => self.codegen_array_literal(e, elems),
            ExprKind::Index { base, index } => {
                let base_c = self.codegen_expr(base)?;
                let index_c = self.codegen_expr(index)?;
                Ok(format!("{base_c}[{index_c}]"))
            }
            ExprKind::Slice { base, start, end, step } => {
                self.codegen_slice(base, *start, *end, *step)
            }
            ExprKind::Range { start, end } => self.codegen_range(start, end),
            ExprKind::Spread(inner) => self.codegen_expr(inner),
            ExprKind::Member { base, name } => self.codegen_member(base, name),
            ExprKind::Interpolated(parts) => self.codegen_interpolated(parts),
        }
    }

    fn codegen_literal(&mut self, lit: &LiteralValue) -> String {
        match lit {
            LiteralValue::Int(v) => format!("{v}LL"),
            LiteralValue::Long(v) => format!("{v}L"),
            LiteralValue::Double(v) => {
                if v.fract() == 0.0 {
                    format!("{v:.1}")
                } else {
                    format!("{v}")
                }
            }
            LiteralValue::Char(c) => format!("'{}'", escape_c_char(*c)),
            LiteralValue::Str(s) => format!("\"{}\"", escape_c_string(s)),
            LiteralValue::Bool(b) => if *b { "true" } else { "false" }.to_string(),
            LiteralValue::Nil => "NULL".to_string(),
        }
    }

    fn codegen_assign(&mut self, target: &Expr<'_>, value: &Expr<'_>) -> Result<String, CodeGenError> {
        let target_c = self.codegen_expr(target)?;
        let value_c = self.codegen_expr(value)?;
        Ok(format!("({target_c} = {value_c})"))
    }

    fn codegen_binary(
        &mut self,
        e: &Expr<'_>,
        op: BinOp,
        left: &Expr<'_>,
        right: &Expr<'_>,
    ) -> Result<String, CodeGenError> {
        let lt = left.ty().unwrap_or(Type::Any);
        let rt = right.ty().unwrap_or(Type::Any);
        let left_c = self.codegen_expr(left)?;
        let right_c = self.codegen_expr(right)?;

        match op {
            BinOp::Add if lt == Type::Str || rt == Type::Str => {
                let arena = self.current_arena();
                Ok(format!("rt_str_concat({arena}, {left_c}, {right_c})"))
            }
            BinOp::Add | BinOp::Sub | BinOp::Mul => {
                let result_ty = e.ty().unwrap_or(Type::Long);
                let rt_name = match op {
                    BinOp::Add => "add",
                    BinOp::Sub => "sub",
                    BinOp::Mul => "mul",
                    _ => unreachable!(),
                };
                let suffix = if result_ty == Type::Double { "double" } else { "long" };
                Ok(format!("rt_{rt_name}_{suffix}({left_c}, {right_c})"))
            }
            BinOp::Div | BinOp::Mod => {
                let result_ty = e.ty().unwrap_or(Type::Long);
                let suffix = if result_ty == Type::Double { "double" } else { "long" };
                let rt_name = if op == BinOp::Div { "rt_div" } else { "rt_mod" };
                Ok(format!("{rt_name}_{suffix}({left_c}, {right_c})"))
            }
            BinOp::Eq | BinOp::Ne if lt == Type::Str && rt == Type::Str => {
                let eq = format!("rt_str_eq({left_c}, {right_c})");
                Ok(if op == BinOp::Eq { eq } else { format!("(!{eq})") })
            }
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge if lt == Type::Str && rt == Type::Str => {
                let cmp = format!("rt_str_cmp({left_c}, {right_c})");
                let c_op = match op {
                    BinOp::Lt => "<",
                    BinOp::Le => "<=",
                    BinOp::Gt => ">",
                    BinOp::Ge => ">=",
                    _ => unreachable!(),
                };
                Ok(format!("({cmp} {c_op} 0)"))
            }
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                // Comparisons default to a runtime call like arithmetic does
                // (spec's "native operator" escape hatch is scoped to
                // arithmetic only); suffix picks `double` if either operand
                // promotes to it, `long` otherwise.
                let suffix = if lt == Type::Double || rt == Type::Double { "double" } else { "long" };
                let rt_name = match op {
                    BinOp::Eq => "rt_eq",
                    BinOp::Ne => "rt_ne",
                    BinOp::Lt => "rt_lt",
                    BinOp::Le => "rt_le",
                    BinOp::Gt => "rt_gt",
                    BinOp::Ge => "rt_ge",
                    _ => unreachable!(),
                };
                Ok(format!("{rt_name}_{suffix}({left_c}, {right_c})"))
            }
            BinOp::And => Ok(format!("({left_c} && {right_c})")),
            BinOp::Or => Ok(format!("({left_c} || {right_c})")),
        }
    }

    fn codegen_unary(&mut self, op: UnOp, operand: &Expr<'_>) -> Result<String, CodeGenError> {
        let c = self.codegen_expr(operand)?;
        Ok(match op {
            UnOp::Not => format!("(!{c})"),
            UnOp::Neg => format!("(-({c}))"),
        })
    }

    /// `int` and `long` both lower to C `long long` (see `c_type`), so both
    /// route through the same `_long` runtime entry points with no cast
    /// needed at the address-of site.
    fn codegen_incdec(&mut self, op: IncDecOp, operand: &Expr<'_>) -> Result<String, CodeGenError> {
        let ty = operand.ty().unwrap_or(Type::Long);
        let c = self.codegen_expr(operand)?;
        let suffix = if ty == Type::Double { "double" } else { "long" };
        let addr = format!("&({c})");
        let rt_name = match op {
            IncDecOp::PreInc => "rt_pre_inc",
            IncDecOp::PreDec => "rt_pre_dec",
            IncDecOp::PostInc => "rt_post_inc",
            IncDecOp::PostDec => "rt_post_dec",
        };
        Ok(format!("{rt_name}_{suffix}({addr})"))
    }

    fn codegen_call(&mut self, callee: &Expr<'_>, args: &[&Expr<'_>]) -> Result<String, CodeGenError> {
        if let ExprKind::Member { base, name } = &callee.kind {
            return self.codegen_method_call(base, name, args);
        }

        if let ExprKind::Variable(name) = &callee.kind {
            if *name == "print" && !self.is_local(name) && !self.globals.contains(*name) {
                return self.codegen_print_call(args);
            }
        }

        let arg_cs = args
            .iter()
            .map(|a| self.codegen_expr(a))
            .collect::<Result<Vec<_>, _>>()?;

        if let ExprKind::Variable(name) = &callee.kind {
            if !self.is_local(name) {
                let arena = self.current_arena();
                let mut call = format!("{}({arena}", c_fn_name(name));
                for a in &arg_cs {
                    call.push_str(", ");
                    call.push_str(a);
                }
                call.push(')');
                return Ok(call);
            }
        }

        // Anything else is a value of function type: call through the
        // closure's stored function pointer and its captured arena.
        let callee_c = self.codegen_expr(callee)?;
        let fn_ty = callee
            .ty()
            .ok_or_else(|| CodeGenError::Logic("call target has no resolved type".to_string()))?;
        let (params, ret) = match fn_ty {
            Type::Function { params, ret } => (params, ret),
            other => {
                return Err(CodeGenError::Logic(format!(
                    "cannot lower a call through a value of type `{other}`"
                )))
            }
        };
        let ret_c = c_type(ret);
        let mut sig = format!("{ret_c} (*)(RtArena*");
        for p in params {
            sig.push_str(", ");
            sig.push_str(&c_type(p));
        }
        sig.push(')');

        let closure = self.next_temp();
        self.line(format!("__Closure__ *{closure} = {callee_c};"));
        let mut invoke = format!("(({sig})({closure}->fn))({closure}->arena");
        for a in &arg_cs {
            invoke.push_str(", ");
            invoke.push_str(a);
        }
        invoke.push(')');

        if *ret == Type::Void {
            self.line(format!("{invoke};"));
            Ok("0".to_string())
        } else {
            let temp = self.next_temp();
            self.line(format!("{ret_c} {temp} = {invoke};"));
            Ok(temp)
        }
    }

    fn codegen_method_call(
        &mut self,
        base: &Expr<'_>,
        name: &str,
        args: &[&Expr<'_>],
    ) -> Result<String, CodeGenError> {
        let base_c = self.codegen_expr(base)?;
        let arg_cs = args
            .iter()
            .map(|a| self.codegen_expr(a))
            .collect::<Result<Vec<_>, _>>()?;

        let base_ty = base.ty().unwrap_or(Type::Any);
        if name == "length" {
            return Ok(match base_ty {
                Type::Str => format!("rt_str_length({base_c})"),
                _ => format!("rt_array_length({base_c})"),
            });
        }

        let sig: &MethodSig = match base_ty {
            Type::Array(_) => methods::lookup_array_method(name),
            Type::Str => methods::lookup_string_method(name),
            _ => None,
        }
        .ok_or_else(|| CodeGenError::Logic(format!("no runtime entry point for method `{name}`")))?;

        let mut call = String::from(sig.runtime_fn);
        call.push('(');
        let mut first = true;
        if method_needs_arena(sig.runtime_fn) {
            call.push_str(&self.current_arena());
            first = false;
        }
        for part in std::iter::once(base_c).chain(arg_cs) {
            if !first {
                call.push_str(", ");
            }
            call.push_str(&part);
            first = false;
        }
        call.push(')');
        Ok(call)
    }

    fn codegen_array_literal(&mut self, e: &Expr<'_>, elems: &[&Expr<'_>]) -> Result<String, CodeGenError> {
        if elems.is_empty() {
            return Ok("NULL".to_string());
        }
        let elem_ty = match e.ty() {
            Some(Type::Array(t)) => *t,
            _ => {
                return Err(CodeGenError::Logic(
                    "array literal missing an element type".to_string(),
                ))
            }
        };
        let c_elem = c_type(&elem_ty);
        let kind = rt_kind(&elem_ty);
        let arena = self.current_arena();

        if !elems.iter().any(|el| matches!(el.kind, ExprKind::Spread(_))) {
            let temp = self.next_temp();
            self.line(format!(
                "{c_elem} *{temp} = ({c_elem}*) rt_array_create_{kind}({arena}, {});",
                elems.len()
            ));
            for (i, el) in elems.iter().enumerate() {
                let val = self.codegen_expr(el)?;
                self.line(format!("{temp}[{i}] = {val};"));
            }
            return Ok(temp);
        }

        // At least one `...spread` element: build each contiguous run of
        // plain elements as its own small array, then fold every run and
        // spread value together with `rt_array_concat`.
        let mut pieces: Vec<String> = Vec::new();
        let mut run: Vec<&Expr<'_>> = Vec::new();
        let flush_run =
            |this: &mut Self, run: &mut Vec<&Expr<'_>>, pieces: &mut Vec<String>| -> Result<(), CodeGenError> {
                if run.is_empty() {
                    return Ok(());
                }
                let temp = this.next_temp();
                let arena = this.current_arena();
                this.line(format!(
                    "{c_elem} *{temp} = ({c_elem}*) rt_array_create_{kind}({arena}, {});",
                    run.len()
                ));
                for (i, el) in run.iter().enumerate() {
                    let val = this.codegen_expr(el)?;
                    this.line(format!("{temp}[{i}] = {val};"));
                }
                pieces.push(temp);
                run.clear();
                Ok(())
            };

        for el in elems {
            if let ExprKind::Spread(inner) = &el.kind {
                flush_run(self, &mut run, &mut pieces)?;
                pieces.push(self.codegen_expr(inner)?);
            } else {
                run.push(el);
            }
        }
        flush_run(self, &mut run, &mut pieces)?;

        let mut acc = pieces[0].clone();
        for piece in &pieces[1..] {
            let temp = self.next_temp();
            let arena = self.current_arena();
            self.line(format!(
                "{c_elem} *{temp} = ({c_elem}*) rt_array_concat({arena}, {acc}, {piece});"
            ));
            acc = temp;
        }
        Ok(acc)
    }

    fn codegen_slice(
        &mut self,
        base: &Expr<'_>,
        start: Option<&Expr<'_>>,
        end: Option<&Expr<'_>>,
        step: Option<&Expr<'_>>,
    ) -> Result<String, CodeGenError> {
        let base_c = self.codegen_expr(base)?;
        let start_c = match start {
            Some(e) => self.codegen_expr(e)?,
            None => "0LL".to_string(),
        };
        let end_c = match end {
            Some(e) => self.codegen_expr(e)?,
            None => "-1LL".to_string(),
        };
        let step_c = match step {
            Some(e) => self.codegen_expr(e)?,
            None => "1LL".to_string(),
        };
        let arena = self.current_arena();
        match base.ty().unwrap_or(Type::Any) {
            Type::Str => Ok(format!("rt_str_slice({arena}, {base_c}, {start_c}, {end_c}, {step_c})")),
            Type::Array(elem) => Ok(format!(
                "rt_array_slice({arena}, {base_c}, {start_c}, {end_c}, {step_c}, (long long) sizeof({}))",
                c_type(&elem)
            )),
            other => Err(CodeGenError::Logic(format!("cannot slice a value of type `{other}`"))),
        }
    }

    /// `a..b` always produces `Array(Long)` (spec 4.5), so the result is
    /// cast from the runtime's `void*` to `long*` regardless of whether the
    /// bounds themselves were typed `int`.
    fn codegen_range(&mut self, start: &Expr<'_>, end: &Expr<'_>) -> Result<String, CodeGenError> {
        let start_c = self.codegen_expr(start)?;
        let end_c = self.codegen_expr(end)?;
        let arena = self.current_arena();
        Ok(format!("(long*) rt_array_range({arena}, {start_c}, {end_c})"))
    }

    fn codegen_member(&mut self, base: &Expr<'_>, name: &str) -> Result<String, CodeGenError> {
        let base_c = self.codegen_expr(base)?;
        if name != "length" {
            return Err(CodeGenError::Logic(format!(
                "method `{name}` can only be used as a call"
            )));
        }
        Ok(match base.ty().unwrap_or(Type::Any) {
            Type::Str => format!("rt_str_length({base_c})"),
            _ => format!("rt_array_length({base_c})"),
        })
    }

    fn codegen_interpolated(&mut self, parts: &[InterpPart]) -> Result<String, CodeGenError> {
        let mut pieces: Vec<String> = Vec::new();
        for part in parts {
            match part {
                InterpPart::Literal(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    pieces.push(format!("\"{}\"", escape_c_string(text)));
                }
                InterpPart::Expr(inner) => {
                    let val = self.codegen_expr(inner)?;
                    let ty = inner.ty().unwrap_or(Type::Str);
                    pieces.push(self.codegen_to_string(&val, &ty)?);
                }
            }
        }
        if pieces.is_empty() {
            return Ok("\"\"".to_string());
        }
        let mut acc = pieces[0].clone();
        for piece in &pieces[1..] {
            let temp = self.next_temp();
            let arena = self.current_arena();
            self.line(format!("char *{temp} = rt_str_concat({arena}, {acc}, {piece});"));
            acc = temp;
        }
        Ok(acc)
    }

    /// `print(x)` lowers directly to the matching `rt_print_<kind>` entry
    /// point rather than through `rt_to_string_*` + a separate write, since
    /// it never needs the intermediate `char*` interpolation builds.
    fn codegen_print_call(&mut self, args: &[&Expr<'_>]) -> Result<String, CodeGenError> {
        let arg = args.first().ok_or_else(|| {
            CodeGenError::Logic("`print` called with no arguments".to_string())
        })?;
        let val = self.codegen_expr(arg)?;
        let ty = arg.ty().unwrap_or(Type::Any);
        Ok(match ty {
            Type::Int | Type::Long => format!("rt_print_long({val})"),
            Type::Double => format!("rt_print_double({val})"),
            Type::Char => format!("rt_print_char({val})"),
            Type::Bool => format!("rt_print_bool({val})"),
            Type::Str | Type::Any => format!("rt_print_str({val})"),
            Type::Array(elem) => {
                let len_expr = format!("rt_array_length({val})");
                format!("rt_print_array({val}, {len_expr}, {})", rt_kind_code(&elem))
            }
            other => {
                return Err(CodeGenError::Logic(format!(
                    "cannot print a value of type `{other}`"
                )))
            }
        })
    }

    fn codegen_to_string(&mut self, val: &str, ty: &Type<'_>) -> Result<String, CodeGenError> {
        let arena = self.current_arena();
        Ok(match ty {
            Type::Int | Type::Long => format!("rt_to_string_long({arena}, {val})"),
            Type::Double => format!("rt_to_string_double({arena}, {val})"),
            Type::Char => format!("rt_to_string_char({arena}, {val})"),
            Type::Bool => format!("rt_to_string_bool({arena}, {val})"),
            Type::Str | Type::Any => val.to_string(),
            Type::Array(elem) => {
                let len_expr = format!("rt_array_length({val})");
                format!(
                    "rt_to_string_array({arena}, {val}, {len_expr}, {})",
                    rt_kind_code(elem)
                )
            }
            other => {
                return Err(CodeGenError::Logic(format!(
                    "cannot interpolate a value of type `{other}`"
                )))
            }
        })
    }
}

fn escape_c_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

fn escape_c_char(c: char) -> String {
    match c {
        '\\' => "\\\\".to_string(),
        '\'' => "\\'".to_string(),
        '\n' => "\\n".to_string(),
        '\t' => "\\t".to_string(),
        '\r' => "\\r".to_string(),
        c => c.to_string(),
    }
}
