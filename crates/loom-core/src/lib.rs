//! Loom Core: arena allocation and diagnostics shared by every compiler
//! stage.
//!
//! This crate knows nothing about tokens, the AST, or C code generation —
//! it provides the two pieces of state every later stage is handed
//! explicitly: the [`Arena`] every allocation lives in, and the
//! [`Diagnostics`] sink every stage reports through.
//!
//! # Modules
//!
//! - `arena`: region allocator backing the whole compilation
//! - `diagnostics`: shared diagnostic sink plus "did you mean" suggestions

pub mod arena;
pub mod diagnostics;

pub use arena::Arena;
pub use diagnostics::{Diagnostic, Diagnostics, Severity, edit_distance, suggest};
