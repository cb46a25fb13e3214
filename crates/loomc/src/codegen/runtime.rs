//! Runtime ABI declarations.
//!
//! Every symbol the generated C references but doesn't define lives here,
//! in one data-driven table, the same way the reference compiler keeps its
//! runtime declarations in a single list instead of scattering ad hoc
//! `writeln!` calls across the generator. Only the declared surface of the
//! runtime library matters to this crate; what implements these symbols is
//! out of scope.

use std::fmt::Write as _;

use super::error::CodeGenError;

struct RuntimeDecl {
    decl: &'static str,
    category: Option<&'static str>,
}

const RUNTIME_DECLARATIONS: &[RuntimeDecl] = &[
    RuntimeDecl {
        decl: "typedef struct RtArena RtArena;",
        category: Some("/* Arena lifecycle */"),
    },
    RuntimeDecl { decl: "RtArena *rt_arena_create(RtArena *parent);", category: None },
    RuntimeDecl { decl: "void rt_arena_destroy(RtArena *arena);", category: None },

    RuntimeDecl {
        decl: "void rt_free_string(char *s);",
        category: Some("/* String operations */"),
    },
    RuntimeDecl { decl: "char *rt_str_concat(RtArena *arena, const char *a, const char *b);", category: None },
    RuntimeDecl { decl: "long long rt_str_length(const char *s);", category: None },
    RuntimeDecl { decl: "char *rt_str_substring(RtArena *arena, const char *s, long long start, long long end);", category: None },
    RuntimeDecl { decl: "char *rt_str_slice(RtArena *arena, const char *s, long long start, long long end, long long step);", category: None },
    RuntimeDecl { decl: "char *rt_str_trim(RtArena *arena, const char *s);", category: None },
    RuntimeDecl { decl: "char *rt_str_to_upper(RtArena *arena, const char *s);", category: None },
    RuntimeDecl { decl: "char *rt_str_to_lower(RtArena *arena, const char *s);", category: None },
    RuntimeDecl { decl: "bool rt_str_starts_with(const char *s, const char *prefix);", category: None },
    RuntimeDecl { decl: "bool rt_str_ends_with(const char *s, const char *suffix);", category: None },
    RuntimeDecl { decl: "bool rt_str_contains(const char *s, const char *needle);", category: None },
    RuntimeDecl { decl: "char *rt_str_replace(RtArena *arena, const char *s, const char *from, const char *to);", category: None },
    RuntimeDecl { decl: "char rt_str_char_at(const char *s, long long index);", category: None },
    RuntimeDecl { decl: "long long rt_str_index_of(const char *s, const char *needle);", category: None },
    RuntimeDecl { decl: "char **rt_str_split(RtArena *arena, const char *s, const char *sep);", category: None },
    RuntimeDecl { decl: "bool rt_str_eq(const char *a, const char *b);", category: None },
    RuntimeDecl { decl: "int rt_str_cmp(const char *a, const char *b);", category: None },

    RuntimeDecl {
        // `int` and `long` share this one entry point (see codegen/types.rs's `c_type`).
        decl: "char *rt_to_string_long(RtArena *arena, long long v);",
        category: Some("/* Interpolation: scalar-to-string conversions */"),
    },
    RuntimeDecl { decl: "char *rt_to_string_double(RtArena *arena, double v);", category: None },
    RuntimeDecl { decl: "char *rt_to_string_char(RtArena *arena, char v);", category: None },
    RuntimeDecl { decl: "char *rt_to_string_bool(RtArena *arena, bool v);", category: None },
    RuntimeDecl { decl: "char *rt_to_string_array(RtArena *arena, void *arr, long long len, int elem_kind);", category: None },

    RuntimeDecl {
        decl: "void rt_print_long(long long v);",
        category: Some("/* `print(...)` builtin, one entry point per printable type */"),
    },
    RuntimeDecl { decl: "void rt_print_double(double v);", category: None },
    RuntimeDecl { decl: "void rt_print_char(char v);", category: None },
    RuntimeDecl { decl: "void rt_print_bool(bool v);", category: None },
    RuntimeDecl { decl: "void rt_print_str(const char *v);", category: None },
    RuntimeDecl { decl: "void rt_print_array(void *arr, long long len, int elem_kind);", category: None },

    RuntimeDecl {
        decl: "long long rt_add_long(long long a, long long b);",
        category: Some("/* Arithmetic (runtime-checked so div/mod by zero traps uniformly) */"),
    },
    RuntimeDecl { decl: "double rt_add_double(double a, double b);", category: None },
    RuntimeDecl { decl: "long long rt_sub_long(long long a, long long b);", category: None },
    RuntimeDecl { decl: "double rt_sub_double(double a, double b);", category: None },
    RuntimeDecl { decl: "long long rt_mul_long(long long a, long long b);", category: None },
    RuntimeDecl { decl: "double rt_mul_double(double a, double b);", category: None },
    RuntimeDecl { decl: "long long rt_div_long(long long a, long long b);", category: None },
    RuntimeDecl { decl: "double rt_div_double(double a, double b);", category: None },
    RuntimeDecl { decl: "long long rt_mod_long(long long a, long long b);", category: None },
    RuntimeDecl { decl: "double rt_mod_double(double a, double b);", category: None },

    RuntimeDecl {
        decl: "bool rt_eq_long(long long a, long long b);",
        category: Some("/* Numeric comparisons (string comparisons go through rt_str_eq/rt_str_cmp) */"),
    },
    RuntimeDecl { decl: "bool rt_eq_double(double a, double b);", category: None },
    RuntimeDecl { decl: "bool rt_ne_long(long long a, long long b);", category: None },
    RuntimeDecl { decl: "bool rt_ne_double(double a, double b);", category: None },
    RuntimeDecl { decl: "bool rt_lt_long(long long a, long long b);", category: None },
    RuntimeDecl { decl: "bool rt_lt_double(double a, double b);", category: None },
    RuntimeDecl { decl: "bool rt_le_long(long long a, long long b);", category: None },
    RuntimeDecl { decl: "bool rt_le_double(double a, double b);", category: None },
    RuntimeDecl { decl: "bool rt_gt_long(long long a, long long b);", category: None },
    RuntimeDecl { decl: "bool rt_gt_double(double a, double b);", category: None },
    RuntimeDecl { decl: "bool rt_ge_long(long long a, long long b);", category: None },
    RuntimeDecl { decl: "bool rt_ge_double(double a, double b);", category: None },

    RuntimeDecl {
        decl: "long long rt_post_inc_long(long long *slot);",
        category: Some("/* Increment/decrement (int and long share this 64-bit entry point) */"),
    },
    RuntimeDecl { decl: "long long rt_post_dec_long(long long *slot);", category: None },
    RuntimeDecl { decl: "long long rt_pre_inc_long(long long *slot);", category: None },
    RuntimeDecl { decl: "long long rt_pre_dec_long(long long *slot);", category: None },
    RuntimeDecl { decl: "double rt_post_inc_double(double *slot);", category: None },
    RuntimeDecl { decl: "double rt_post_dec_double(double *slot);", category: None },
    RuntimeDecl { decl: "double rt_pre_inc_double(double *slot);", category: None },
    RuntimeDecl { decl: "double rt_pre_dec_double(double *slot);", category: None },

    RuntimeDecl {
        decl: "void *rt_array_create_long(RtArena *arena, long long len);",
        category: Some("/* Array construction */"),
    },
    RuntimeDecl { decl: "void *rt_array_create_double(RtArena *arena, long long len);", category: None },
    RuntimeDecl { decl: "void *rt_array_create_char(RtArena *arena, long long len);", category: None },
    RuntimeDecl { decl: "void *rt_array_create_bool(RtArena *arena, long long len);", category: None },
    RuntimeDecl { decl: "void *rt_array_create_str(RtArena *arena, long long len);", category: None },
    RuntimeDecl { decl: "void *rt_array_range(RtArena *arena, long long start, long long end);", category: None },
    RuntimeDecl { decl: "void *rt_array_slice(RtArena *arena, void *arr, long long start, long long end, long long step, long long elem_size);", category: None },

    RuntimeDecl {
        decl: "long long rt_array_length(void *arr);",
        category: Some("/* Array methods, shared with crate::methods's table */"),
    },
    RuntimeDecl { decl: "void rt_array_push(RtArena *arena, void *arr, void *value);", category: None },
    RuntimeDecl { decl: "void *rt_array_pop(void *arr);", category: None },
    RuntimeDecl { decl: "void rt_array_clear(void *arr);", category: None },
    RuntimeDecl { decl: "void *rt_array_concat(RtArena *arena, void *a, void *b);", category: None },
    RuntimeDecl { decl: "void *rt_array_reverse(RtArena *arena, void *arr);", category: None },
    RuntimeDecl { decl: "void *rt_array_remove(void *arr, long long index);", category: None },
    RuntimeDecl { decl: "void rt_array_insert(void *arr, long long index, void *value);", category: None },
    RuntimeDecl { decl: "bool rt_array_contains(void *arr, void *value);", category: None },
    RuntimeDecl { decl: "long long rt_array_index_of(void *arr, void *value);", category: None },
    RuntimeDecl { decl: "void *rt_array_clone(RtArena *arena, void *arr);", category: None },
    RuntimeDecl { decl: "char *rt_array_join(RtArena *arena, void *arr, const char *sep);", category: None },
];

/// `__Closure__` is declared inline rather than via `RUNTIME_DECLARATIONS`
/// since it's a type definition, not an extern function, and every
/// function-valued expression lowers to it.
const CLOSURE_STRUCT: &str = "typedef struct { void *fn; RtArena *arena; } __Closure__;";

pub(super) fn emit_runtime_decls(out: &mut String) -> Result<(), CodeGenError> {
    writeln!(out, "#include <stdbool.h>")?;
    writeln!(out, "#include <stddef.h>")?;
    writeln!(out)?;
    for decl in RUNTIME_DECLARATIONS {
        if let Some(cat) = decl.category {
            writeln!(out, "{cat}")?;
        }
        writeln!(out, "{}", decl.decl)?;
    }
    writeln!(out)?;
    writeln!(out, "/* Closure representation for first-class function values */")?;
    writeln!(out, "{CLOSURE_STRUCT}")?;
    writeln!(out)?;
    Ok(())
}
