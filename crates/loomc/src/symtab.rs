//! Scope stack and stack-frame offset accounting.
//!
//! Offsets recorded here are frame-slot offsets for the checker's own
//! bookkeeping and its testable invariants (§8: "after push/pop pairs, the
//! resulting active scope equals the scope before the push"); the code
//! generator does not need to reproduce a literal stack frame since C's own
//! compiler lays out locals, but the symbol table still tracks one the way
//! the reference design does so the two-pass checker can reason about
//! frame size across sibling branches.

use crate::ast::{FuncMod, MemQual};
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymKind {
    Global,
    Local,
    Param,
}

#[derive(Debug, Clone)]
pub struct Symbol<'a> {
    pub name: &'a str,
    pub ty: Type<'a>,
    pub kind: SymKind,
    /// Zero for globals; negative for locals/params, unique within the
    /// owning scope's offset range.
    pub offset: i32,
    pub mem_qual: MemQual,
    pub func_mod: FuncMod,
    pub is_function: bool,
    pub arena_depth: u32,
}

#[derive(Debug, Clone)]
struct Scope<'a> {
    symbols: Vec<Symbol<'a>>,
    /// Bytes of local storage bumped so far in this scope (magnitude; the
    /// assigned offset is the negation).
    next_local_offset: i32,
    next_param_offset: i32,
    arena_depth: u32,
}

impl<'a> Scope<'a> {
    fn new(arena_depth: u32) -> Self {
        Scope {
            symbols: Vec::new(),
            next_local_offset: 0,
            next_param_offset: 0,
            arena_depth,
        }
    }
}

/// Every stack-frame slot is treated as pointer-sized for offset-accounting
/// purposes — the table's own invariant (§4.4) is uniform 8-byte slots, not
/// the natural C size of the value (that's `Type::size_in_bytes`, used only
/// by the generator's type mapping).
pub fn get_type_size(_ty: &Type) -> u32 {
    8
}

fn align8(n: u32) -> i32 {
    (((n + 7) / 8) * 8) as i32
}

/// Scope stack plus current arena depth. The global scope is pushed once at
/// construction and is never popped.
pub struct SymbolTable<'a> {
    scopes: Vec<Scope<'a>>,
    arena_depth: u32,
}

impl<'a> SymbolTable<'a> {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::new(0)],
            arena_depth: 0,
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn arena_depth(&self) -> u32 {
        self.arena_depth
    }

    /// Push an ordinary nested scope (if/while/for/block body): it inherits
    /// the enclosing scope's offset counters so a deeper block continues
    /// bumping the same frame rather than starting a new one.
    pub fn push_scope(&mut self) {
        let parent = self.scopes.last().expect("global scope always present");
        let mut child = Scope::new(self.arena_depth);
        child.next_local_offset = parent.next_local_offset;
        child.next_param_offset = parent.next_param_offset;
        self.scopes.push(child);
    }

    /// Push a function-body scope: offset counters reset to their fixed
    /// bases (zero) since this is a new stack frame, not a continuation of
    /// the enclosing one.
    pub fn begin_function_scope(&mut self) {
        self.scopes.push(Scope::new(self.arena_depth));
    }

    /// Pop the current scope. The parent's offset counters become
    /// `max(parent, child)` so a function's recorded frame size reflects
    /// whichever branch used the most storage.
    pub fn pop_scope(&mut self) {
        let child = self.scopes.pop().expect("cannot pop the global scope");
        if let Some(parent) = self.scopes.last_mut() {
            parent.next_local_offset = parent.next_local_offset.max(child.next_local_offset);
            parent.next_param_offset = parent.next_param_offset.max(child.next_param_offset);
        }
    }

    pub fn enter_arena(&mut self) {
        self.arena_depth += 1;
    }

    pub fn exit_arena(&mut self) {
        self.arena_depth = self.arena_depth.saturating_sub(1);
    }

    /// Insert (or, within the current scope, silently replace) a symbol.
    /// Globals get offset zero; locals and params are bump-allocated from
    /// disjoint counters.
    pub fn add_symbol(
        &mut self,
        name: &'a str,
        ty: Type<'a>,
        kind: SymKind,
        mem_qual: MemQual,
    ) -> &Symbol<'a> {
        let arena_depth = self.arena_depth;
        let scope = self.scopes.last_mut().expect("global scope always present");

        if let Some(existing) = scope.symbols.iter_mut().find(|s| s.name == name) {
            existing.ty = ty;
            existing.mem_qual = mem_qual;
            return scope.symbols.iter().find(|s| s.name == name).unwrap();
        }

        let offset = match kind {
            SymKind::Global => 0,
            SymKind::Local => {
                scope.next_local_offset += align8(get_type_size(&ty));
                -scope.next_local_offset
            }
            SymKind::Param => {
                scope.next_param_offset += align8(get_type_size(&ty));
                -scope.next_param_offset
            }
        };

        scope.symbols.push(Symbol {
            name,
            ty,
            kind,
            offset,
            mem_qual,
            func_mod: FuncMod::Default,
            is_function: false,
            arena_depth,
        });
        scope.symbols.last().unwrap()
    }

    /// Like `add_symbol`, for a function: carries its modifier and marks
    /// `is_function`.
    pub fn add_function_symbol(
        &mut self,
        name: &'a str,
        ty: Type<'a>,
        func_mod: FuncMod,
    ) -> &Symbol<'a> {
        let arena_depth = self.arena_depth;
        let scope = self.scopes.last_mut().expect("global scope always present");
        if let Some(existing) = scope.symbols.iter_mut().find(|s| s.name == name) {
            existing.ty = ty;
            existing.func_mod = func_mod;
            existing.is_function = true;
            return scope.symbols.iter().find(|s| s.name == name).unwrap();
        }
        scope.symbols.push(Symbol {
            name,
            ty,
            kind: SymKind::Global,
            offset: 0,
            mem_qual: MemQual::Default,
            func_mod,
            is_function: true,
            arena_depth,
        });
        scope.symbols.last().unwrap()
    }

    /// Walk from the current scope outward to the global scope.
    pub fn lookup(&self, name: &str) -> Option<&Symbol<'a>> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.symbols.iter().rev().find(|s| s.name == name))
    }

    /// Look only in the current (innermost) scope.
    pub fn lookup_current(&self, name: &str) -> Option<&Symbol<'a>> {
        self.scopes
            .last()
            .and_then(|scope| scope.symbols.iter().rev().find(|s| s.name == name))
    }

    /// Every name visible from the current scope, innermost first; used to
    /// build "did you mean" candidate sets for undefined-name errors.
    pub fn visible_names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.symbols.iter().map(|s| s.name))
    }
}

impl<'a> Default for SymbolTable<'a> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_returns_to_the_prior_scope_depth() {
        let mut table = SymbolTable::new();
        assert_eq!(table.depth(), 1);
        table.push_scope();
        assert_eq!(table.depth(), 2);
        table.pop_scope();
        assert_eq!(table.depth(), 1);
    }

    #[test]
    fn locals_get_negative_eight_byte_aligned_offsets() {
        let mut table = SymbolTable::new();
        table.begin_function_scope();
        let s1 = table.add_symbol("x", Type::Int, SymKind::Local, MemQual::Default);
        assert_eq!(s1.offset, -8);
        let s2 = table.add_symbol("y", Type::Long, SymKind::Local, MemQual::Default);
        assert_eq!(s2.offset, -16);
    }

    #[test]
    fn local_and_param_counters_are_disjoint() {
        let mut table = SymbolTable::new();
        table.begin_function_scope();
        table.add_symbol("p", Type::Int, SymKind::Param, MemQual::Default);
        let local = table.add_symbol("x", Type::Int, SymKind::Local, MemQual::Default);
        assert_eq!(local.offset, -8);
        let param = table.lookup("p").unwrap();
        assert_eq!(param.offset, -8);
    }

    #[test]
    fn pop_propagates_the_larger_of_parent_and_child_frame_usage() {
        let mut table = SymbolTable::new();
        table.begin_function_scope();
        table.add_symbol("a", Type::Long, SymKind::Local, MemQual::Default);
        table.push_scope();
        table.add_symbol("b", Type::Long, SymKind::Local, MemQual::Default);
        table.add_symbol("c", Type::Long, SymKind::Local, MemQual::Default);
        table.pop_scope();
        // The branch scope used 3 locals worth of frame; a sibling branch
        // declared afterward should not reuse that space.
        let d = table.add_symbol("d", Type::Long, SymKind::Local, MemQual::Default);
        assert_eq!(d.offset, -32);
    }

    #[test]
    fn lookup_walks_the_enclosing_chain() {
        let mut table = SymbolTable::new();
        table.add_symbol("g", Type::Int, SymKind::Global, MemQual::Default);
        table.begin_function_scope();
        assert!(table.lookup("g").is_some());
        assert!(table.lookup_current("g").is_none());
    }

    #[test]
    fn redeclaration_in_the_same_scope_replaces_the_type() {
        let mut table = SymbolTable::new();
        table.add_symbol("x", Type::Int, SymKind::Global, MemQual::Default);
        table.add_symbol("x", Type::Str, SymKind::Global, MemQual::Default);
        assert_eq!(table.lookup("x").unwrap().ty, Type::Str);
    }
}
