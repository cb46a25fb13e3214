//! Loom compiler CLI.
//!
//! Thin driver around the `loomc` library: reads a source file, runs the
//! pipeline, and writes the result. Exit codes follow the contract a
//! downstream build tool can script against: `0` success, `1` a lex/parse/
//! type error was reported, `2` an I/O error, `3` an internal compiler
//! error (codegen rejected an AST shape it should never see).

use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{Shell, generate};
use loomc::{Arena, DriverError, Lexer, Parser};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(ClapParser)]
#[command(name = "loomc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Loom compiler - compile .loom programs to portable C", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a .loom source file to C
    Compile {
        /// Input .loom source file
        input: PathBuf,

        /// Output .c file (defaults to the input filename with a .c extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the token stream instead of compiling
        #[arg(long)]
        emit_tokens: bool,

        /// Print the parsed AST instead of compiling
        #[arg(long)]
        emit_ast: bool,
    },

    /// Type-check a .loom source file without generating C
    Check {
        /// Input .loom source file
        input: PathBuf,

        /// Print the token stream instead of checking
        #[arg(long)]
        emit_tokens: bool,

        /// Print the parsed AST instead of checking
        #[arg(long)]
        emit_ast: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { input, output, emit_tokens, emit_ast } => {
            run_compile(&input, output, emit_tokens, emit_ast)
        }
        Commands::Check { input, emit_tokens, emit_ast } => run_check(&input, emit_tokens, emit_ast),
        Commands::Completions { shell } => {
            run_completions(shell);
            ExitCode::SUCCESS
        }
    }
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "loomc", &mut io::stdout());
}

/// Reads `input`, returning its contents and the filename loomc reports
/// diagnostics against. I/O failures here map to exit code 2.
fn read_source(input: &PathBuf) -> Result<(String, String), DriverError> {
    let source = fs::read_to_string(input)?;
    let filename = input.display().to_string();
    Ok((source, filename))
}

fn print_tokens(source: &str, filename: &str) {
    let arena = Arena::new();
    let lexer = Lexer::init(&arena, source, filename);
    for token in lexer.tokenize() {
        println!("{token:?}");
    }
}

fn print_ast(source: &str, filename: &str) -> bool {
    let arena = Arena::new();
    let mut diags = loomc::Diagnostics::new();
    let lexer = Lexer::init(&arena, source, filename);
    let tokens = lexer.tokenize();
    let mut parser = Parser::new(&arena, tokens, filename, &mut diags);
    let module = parser.parse_module();
    println!("{module:#?}");
    print_diagnostics(&diags);
    !diags.has_errors()
}

fn print_diagnostics(diags: &loomc::Diagnostics) {
    for d in diags.entries() {
        eprintln!("{d}");
    }
}

fn run_compile(input: &PathBuf, output: Option<PathBuf>, emit_tokens: bool, emit_ast: bool) -> ExitCode {
    let (source, filename) = match read_source(input) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    if emit_tokens {
        print_tokens(&source, &filename);
        return ExitCode::SUCCESS;
    }
    if emit_ast {
        return if print_ast(&source, &filename) { ExitCode::SUCCESS } else { ExitCode::from(1) };
    }

    let output = output.unwrap_or_else(|| input.with_extension("c"));

    match loomc::compile_source(&source, &filename) {
        Ok(result) => {
            print_diagnostics(&result.diagnostics);
            if result.diagnostics.has_errors() {
                return ExitCode::from(1);
            }
            if let Err(e) = fs::write(&output, result.c_source) {
                eprintln!("error: {e}");
                return ExitCode::from(2);
            }
            println!("compiled {} -> {}", input.display(), output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(3)
        }
    }
}

fn run_check(input: &PathBuf, emit_tokens: bool, emit_ast: bool) -> ExitCode {
    let (source, filename) = match read_source(input) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    if emit_tokens {
        print_tokens(&source, &filename);
        return ExitCode::SUCCESS;
    }
    if emit_ast {
        return if print_ast(&source, &filename) { ExitCode::SUCCESS } else { ExitCode::from(1) };
    }

    let diags = loomc::check_source(&source, &filename);
    print_diagnostics(&diags);
    if diags.has_errors() { ExitCode::from(1) } else { ExitCode::SUCCESS }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
