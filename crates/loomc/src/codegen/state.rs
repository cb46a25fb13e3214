//! CodeGen state and core types.
//!
//! Mirrors the rest of the pipeline's arena-root philosophy in spirit, but
//! the generator itself doesn't borrow from the compilation arena: its job
//! is to walk an already-typed tree once and accumulate C source text, so a
//! few owned `String` buffers and counters are all the state it needs.

use std::collections::HashSet;

use crate::ast::FuncMod;

/// Which kind of memory region the generator is currently inside. Mirrors
/// `typechecker::Region`: the type checker has already rejected anything
/// that would make this distinction matter for correctness, so by codegen
/// time it only decides whether a fresh `RtArena` needs to be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Region {
    Default,
    Shared,
    Private,
}

impl Region {
    /// Same transition table as `typechecker::Region::enter`: `shared`
    /// inherits whatever region it's nested in, `private` always wins, and a
    /// plain block resets to `Default`.
    pub(super) fn enter(self, func_mod: FuncMod) -> Region {
        match func_mod {
            FuncMod::Shared => self,
            FuncMod::Private => Region::Private,
            FuncMod::Default => Region::Default,
        }
    }
}

pub struct CodeGen {
    /// Completed C function definitions, in source order.
    pub(super) functions: String,
    /// Forward declarations for every user function, emitted before any
    /// definition so mutual recursion and forward reference just work in C
    /// the same way they do in the source language.
    pub(super) forward_decls: String,
    /// The function body currently being assembled; flushed into
    /// `functions` when a `FuncDef` finishes.
    pub(super) body: String,
    pub(super) indent: usize,
    pub(super) temp_counter: u32,
    pub(super) thunk_counter: u32,
    pub(super) arena_counter: u32,
    pub(super) label_counter: u32,
    /// Every top-level function name, used to tell a direct call to a
    /// global function (`foo(x)`) apart from a call through a local
    /// variable holding a closure (`f(x)` where `f` is a parameter).
    pub(super) globals: HashSet<String>,
    /// Stack of locally-bound names (params, `var` locals, loop variables)
    /// shadowing a global of the same name. Pushed/popped in lockstep with
    /// the AST's block/function nesting.
    pub(super) locals: Vec<HashSet<String>>,
    pub(super) region: Region,
    pub(super) return_target: Option<ReturnTargetOwned>,
    pub(super) has_main: bool,
    /// Stack of live arena variable names, innermost last. A function that
    /// doesn't need its own arena leaves this empty and forwards
    /// `__parent_arena__` (its implicit first parameter) to anything that
    /// needs one.
    pub(super) arena_stack: Vec<String>,
}

/// Where a `return` inside the function currently being generated should
/// jump to, and what it should assign before jumping (the single-exit
/// `goto name_return` pattern).
pub(super) struct ReturnTargetOwned {
    pub label: String,
    pub var: Option<String>,
}

impl Default for CodeGen {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGen {
    pub fn new() -> Self {
        CodeGen {
            functions: String::new(),
            forward_decls: String::new(),
            body: String::new(),
            indent: 1,
            temp_counter: 0,
            thunk_counter: 0,
            arena_counter: 0,
            label_counter: 0,
            globals: HashSet::new(),
            locals: Vec::new(),
            region: Region::Default,
            return_target: None,
            has_main: false,
            arena_stack: Vec::new(),
        }
    }

    pub(super) fn next_temp(&mut self) -> String {
        let n = self.temp_counter;
        self.temp_counter += 1;
        format!("__tmp_{n}__")
    }

    pub(super) fn next_thunk(&mut self) -> String {
        let n = self.thunk_counter;
        self.thunk_counter += 1;
        format!("__thunk_{n}__")
    }

    pub(super) fn next_arena(&mut self) -> String {
        let n = self.arena_counter;
        self.arena_counter += 1;
        format!("__arena_{n}__")
    }

    pub(super) fn next_label(&mut self, tag: &str) -> String {
        let n = self.label_counter;
        self.label_counter += 1;
        format!("__{tag}_{n}__")
    }

    pub(super) fn push_scope(&mut self) {
        self.locals.push(HashSet::new());
    }

    pub(super) fn pop_scope(&mut self) {
        self.locals.pop();
    }

    pub(super) fn bind_local(&mut self, name: &str) {
        if let Some(top) = self.locals.last_mut() {
            top.insert(name.to_string());
        }
    }

    /// True if `name` resolves to a local binding rather than a top-level
    /// function, i.e. a call to it must go through the closure calling
    /// convention instead of a direct C call.
    pub(super) fn is_local(&self, name: &str) -> bool {
        self.locals.iter().any(|scope| scope.contains(name))
    }

    pub(super) fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.indent {
            self.body.push_str("    ");
        }
        self.body.push_str(text.as_ref());
        self.body.push('\n');
    }

    pub(super) fn raw(&mut self, text: impl AsRef<str>) {
        self.body.push_str(text.as_ref());
    }

    /// The arena that a freshly allocated value should be created in: the
    /// innermost open arena, or the implicit parent-arena parameter if no
    /// block in the current function opened one of its own.
    pub(super) fn current_arena(&self) -> String {
        self.arena_stack
            .last()
            .cloned()
            .unwrap_or_else(|| "__parent_arena__".to_string())
    }
}
