//! C code generation.
//!
//! Lowers an already-type-checked `Module` to a single self-contained C
//! translation unit, in the output order the runtime ABI fixes: headers and
//! `extern` declarations, forward declarations for every user function (so
//! mutual recursion just works), the function definitions themselves, and a
//! synthesized `main` stub if the source declared none.
//!
//! Split into focused submodules the way the reference compiler splits its
//! own backend: `state` (the generator's own fields), `types` (Loom → C type
//! rendering), `runtime` (the extern ABI surface), `arena_analysis` (the
//! static `needs_arena` check), `expressions` and `statements` (the actual
//! lowering, one `impl CodeGen` block each).

mod arena_analysis;
mod error;
mod expressions;
mod runtime;
mod state;
mod statements;
mod types;

pub use error::CodeGenError;
pub use state::CodeGen;

use std::fmt::Write as _;

use crate::ast::{Module, StmtKind};

impl CodeGen {
    /// Runs the whole pipeline over `module`, returning the rendered C
    /// source. The module must already be type-checked: code generation
    /// trusts every expression's `expr_type` and never re-infers one.
    pub fn generate(&mut self, module: &Module<'_>) -> Result<String, CodeGenError> {
        tracing::trace!(filename = module.filename, top_level_stmts = module.stmts.len(), "generating C");
        for stmt in module.stmts {
            if let StmtKind::FuncDef { name, .. } = &stmt.kind {
                self.globals.insert((*name).to_string());
            }
        }

        for stmt in module.stmts {
            match &stmt.kind {
                StmtKind::FuncDef { name, params, ret, body, func_mod } => {
                    self.codegen_function(name, params, *ret, body, *func_mod)?;
                }
                StmtKind::Import(_) => {}
                other => {
                    return Err(CodeGenError::Logic(format!(
                        "line {}: only function definitions and imports may appear at module scope, found {other:?}",
                        stmt.line()
                    )));
                }
            }
        }

        let mut out = String::new();
        writeln!(out, "/* Generated by loomc. Do not edit. */")?;
        writeln!(out)?;
        runtime::emit_runtime_decls(&mut out)?;
        out.push_str(&self.forward_decls);
        writeln!(out)?;
        out.push_str(&self.functions);

        if !self.has_main {
            writeln!(out, "int main(void) {{ return 0; }}")?;
        }

        tracing::debug!(filename = module.filename, bytes = out.len(), "generated C");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::typechecker::TypeChecker;
    use loom_core::{Arena, Diagnostics};

    fn generate_c(source: &str) -> Result<String, CodeGenError> {
        let arena = Arena::new();
        let mut diags = Diagnostics::new();
        let lexer = Lexer::init(&arena, source, "t.loom");
        let tokens = lexer.tokenize();
        let mut parser = Parser::new(&arena, tokens, "t.loom", &mut diags);
        let module = parser.parse_module();
        assert!(!diags.has_errors(), "parse errors: {:?}", diags.entries());

        let mut checker = TypeChecker::new("t.loom", &mut diags);
        let ok = checker.check_module(&module);
        assert!(ok && !diags.has_errors(), "type errors: {:?}", diags.entries());

        let mut codegen = CodeGen::new();
        codegen.generate(&module)
    }

    #[test]
    fn hello_world_emits_a_main_and_a_print_of_an_interpolated_greeting() {
        let c = generate_c(
            "fn main(): void =>\n    var name: str = \"world\"\n    var msg: str = $\"hello, {name}\"\n    return\n",
        )
        .expect("codegen should succeed");
        assert!(c.contains("int main"));
        assert!(c.contains("rt_str_concat"));
    }

    #[test]
    fn print_builtin_lowers_to_the_matching_rt_print_entry_point() {
        let c = generate_c("fn main(): void =>\n    print(\"hello\\n\")\n    return\n")
            .expect("codegen should succeed");
        assert!(c.contains("rt_print_str"));
    }

    #[test]
    fn print_of_an_int_expression_lowers_to_rt_print_long() {
        // Arithmetic always types as `long`, so the parameter/return/local
        // types below have to be `long` to stay assignment-compatible.
        let c = generate_c(
            "fn factorial(n: long): long =>\n    if n <= 1 => return 1\n    return n * factorial(n - 1)\n\nfn main(): void =>\n    print(factorial(5))\n    return\n",
        )
        .expect("codegen should succeed");
        assert!(c.contains("rt_print_long"));
    }

    #[test]
    fn factorial_emits_forward_declaration_and_self_call() {
        let c = generate_c(
            "fn factorial(n: long): long =>\n    if n <= 1 => return 1\n    return n * factorial(n - 1)\n\nfn main(): void =>\n    var r: long = factorial(5)\n    return\n",
        )
        .expect("codegen should succeed");
        assert!(c.contains("loom_factorial(RtArena *__parent_arena__, long long n);"));
        assert!(c.contains("loom_factorial(__parent_arena__"));
    }

    #[test]
    fn array_method_call_lowers_through_the_shared_method_table() {
        let c = generate_c(
            "fn main(): void =>\n    var xs: int[] = {1, 2, 3}\n    xs.push(4)\n    return\n",
        )
        .expect("codegen should succeed");
        assert!(c.contains("rt_array_push"));
    }

    #[test]
    fn private_function_opens_its_own_arena() {
        let c = generate_c(
            "private fn scratch(): int =>\n    var xs: int[] = {1, 2, 3}\n    return xs.length\n\nfn main(): void =>\n    var n: int = scratch()\n    return\n",
        )
        .expect("codegen should succeed");
        assert!(c.contains("rt_arena_create"));
        assert!(c.contains("rt_arena_destroy"));
    }

    #[test]
    fn missing_main_gets_a_synthesized_stub() {
        let c = generate_c("fn helper(): int =>\n    return 1\n").expect("codegen should succeed");
        assert!(c.contains("int main(void) { return 0; }"));
    }

    #[test]
    fn for_each_loop_lowers_to_an_index_style_loop_over_rt_array_length() {
        // `total + x` types as `long`, so `total` has to be declared `long`.
        let c = generate_c(
            "fn main(): void =>\n    var xs: int[] = {1, 2, 3}\n    var total: long = 0\n    for var x in xs =>\n        total = total + x\n    return\n",
        )
        .expect("codegen should succeed");
        assert!(c.contains("rt_array_length"));
        assert!(c.contains("for (long long"));
    }
}
