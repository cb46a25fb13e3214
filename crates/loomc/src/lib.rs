//! Loom compiler library.
//!
//! Loom is a small statically-typed, indentation-sensitive imperative
//! language that compiles to portable C. This crate implements the whole
//! front end and back end — lexer, parser, type checker, code generator —
//! as a pipeline over in-memory source text. It does not read or write
//! files and does not invoke a downstream C compiler; that's the driver's
//! job (see `main.rs`), kept separate so this crate stays embeddable.
//!
//! Each stage reports to a shared [`loom_core::Diagnostics`] sink rather
//! than returning its own `Result`: a lex error doesn't stop the parser
//! from also reporting what it can, and a type error in one function
//! doesn't stop the checker from checking the rest of the module. Only
//! code generation — which runs after the module is known to be
//! well-formed — can fail with a real [`CodeGenError`], since anything
//! it rejects is an internal-compiler-error case, not a user mistake.

pub mod ast;
pub mod codegen;
pub mod lexer;
pub mod methods;
pub mod parser;
pub mod symtab;
pub mod token;
pub mod typechecker;
pub mod types;

pub use ast::Module;
pub use codegen::{CodeGen, CodeGenError};
pub use lexer::Lexer;
pub use loom_core::{Arena, Diagnostic, Diagnostics, Severity};
pub use parser::Parser;
pub use typechecker::TypeChecker;
pub use types::Type;

/// Errors that can cross the library/driver boundary.
///
/// Deliberately small: the lex/parse/type-check stages never produce one of
/// these, since their failures are diagnostics in the shared sink, not Rust
/// errors. `Io` exists so the driver can fold a file-read/write failure into
/// the same exit-code decision as a codegen failure, without a separate
/// error type per stage.
#[derive(Debug)]
pub enum DriverError {
    /// Reading the source file or writing the generated C failed.
    Io(std::io::Error),
    /// Code generation rejected an AST shape it should never see after a
    /// successful type check; always an internal-compiler-error case.
    CodeGen(CodeGenError),
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverError::Io(e) => write!(f, "I/O error: {e}"),
            DriverError::CodeGen(e) => write!(f, "internal compiler error: {e}"),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DriverError::Io(e) => Some(e),
            DriverError::CodeGen(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        DriverError::Io(e)
    }
}

impl From<CodeGenError> for DriverError {
    fn from(e: CodeGenError) -> Self {
        DriverError::CodeGen(e)
    }
}

/// The result of a successful [`compile_source`] call.
pub struct CompileOutput {
    /// The generated C translation unit. Empty if `diagnostics.has_errors()`.
    pub c_source: String,
    /// Every diagnostic raised across the lex/parse/type-check stages.
    pub diagnostics: Diagnostics,
}

/// Runs the lexer and parser only, producing the parsed module alongside
/// whatever the two stages reported. Used by `check_source` and
/// `compile_source`, and directly by the driver's `--emit-tokens`/
/// `--emit-ast` debug flags, which need the intermediate forms without
/// forcing a full compile.
fn parse_source<'a>(arena: &'a Arena, source: &'a str, filename: &'a str) -> (Module<'a>, Diagnostics) {
    let mut diags = Diagnostics::new();
    let lexer = Lexer::init(arena, source, filename);
    let tokens = lexer.tokenize();
    let mut parser = Parser::new(arena, tokens, filename, &mut diags);
    let module = parser.parse_module();
    (module, diags)
}

/// Type-checks `source` without generating code. Mirrors the driver's
/// `check` subcommand: exit 0 if the returned [`Diagnostics`] is free of
/// errors, exit 1 otherwise.
pub fn check_source(source: &str, filename: &str) -> Diagnostics {
    let arena = Arena::new();
    let (module, mut diags) = parse_source(&arena, source, filename);
    if !diags.has_errors() {
        let mut checker = TypeChecker::new(filename, &mut diags);
        checker.check_module(&module);
    }
    diags
}

/// Compiles `source` all the way to C.
///
/// A lex, parse, or type error is reported through
/// [`CompileOutput::diagnostics`], not through the `Result` — the caller
/// checks `diagnostics.has_errors()` for that case (driver exit code 1).
/// The `Result` is reserved for the internal-compiler-error case codegen
/// itself can raise (driver exit code 3).
pub fn compile_source(source: &str, filename: &str) -> Result<CompileOutput, DriverError> {
    let arena = Arena::new();
    let (module, mut diags) = parse_source(&arena, source, filename);
    if diags.has_errors() {
        return Ok(CompileOutput { c_source: String::new(), diagnostics: diags });
    }

    let mut checker = TypeChecker::new(filename, &mut diags);
    let ok = checker.check_module(&module);
    if !ok || diags.has_errors() {
        return Ok(CompileOutput { c_source: String::new(), diagnostics: diags });
    }

    let mut codegen = CodeGen::new();
    let c_source = codegen.generate(&module)?;
    Ok(CompileOutput { c_source, diagnostics: diags })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_hello_world_to_c_with_no_diagnostics() {
        let out = compile_source(
            "fn main(): void =>\n    print(\"hello, world\")\n    return\n",
            "hello.loom",
        )
        .expect("compile_source should not hit an internal error");
        assert!(!out.diagnostics.has_errors());
        assert!(out.c_source.contains("int main"));
    }

    #[test]
    fn check_source_reports_a_type_error_without_generating_code() {
        let diags = check_source("fn main(): void =>\n    var x: int = \"oops\"\n    return\n", "bad.loom");
        assert!(diags.has_errors());
    }

    #[test]
    fn check_source_reports_a_parse_error_and_skips_type_checking() {
        let diags = check_source("fn main(): void =>\n    var x: =\n", "bad.loom");
        assert!(diags.has_errors());
    }

    #[test]
    fn compile_source_leaves_c_source_empty_on_a_type_error() {
        let out = compile_source("fn main(): int =>\n    return \"nope\"\n", "bad.loom")
            .expect("compile_source should not hit an internal error");
        assert!(out.diagnostics.has_errors());
        assert!(out.c_source.is_empty());
    }
}
