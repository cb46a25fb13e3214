//! Loom type → C type rendering.

use crate::types::Type;

/// C spelling of a Loom type, per the code generator's type mapping table.
/// Bool arrays use `int*` rather than `bool*` since the runtime's array
/// backing store is word-sized; every other array is `<elem>*`.
pub(super) fn c_type(ty: &Type<'_>) -> String {
    match ty {
        // `int` and `long` share one 64-bit C representation (spec's open
        // question about the source's inconsistent `long`/`long long`
        // split resolves to: pick one width, apply it to both).
        Type::Int | Type::Long => "long long".to_string(),
        Type::Double => "double".to_string(),
        Type::Char => "char".to_string(),
        Type::Bool => "bool".to_string(),
        Type::Void => "void".to_string(),
        Type::Str => "char*".to_string(),
        Type::Nil | Type::Any => "void*".to_string(),
        Type::Array(elem) => {
            if **elem == Type::Bool {
                "int*".to_string()
            } else {
                format!("{}*", c_type(elem))
            }
        }
        Type::Function { .. } => "__Closure__*".to_string(),
    }
}

/// The runtime kind tag used by `rt_array_create_<kind>`. Reference-typed
/// elements (nested arrays, closures) are word-sized just like `long`, so
/// they share its creation path; only the element's own type determines
/// how it's read back out.
pub(super) fn rt_kind(ty: &Type<'_>) -> &'static str {
    match ty {
        Type::Int | Type::Long => "long",
        Type::Double => "double",
        Type::Char => "char",
        Type::Bool => "bool",
        Type::Str => "str",
        _ => "long",
    }
}

/// Numeric tag `rt_to_string_array` uses to pick how to render an element;
/// matches the order the runtime's element-formatting switch is documented
/// to use.
pub(super) fn rt_kind_code(ty: &Type<'_>) -> i32 {
    match ty {
        Type::Int | Type::Long => 0,
        Type::Double => 1,
        Type::Char => 2,
        Type::Bool => 3,
        Type::Str => 4,
        _ => 0,
    }
}

/// The C function name a top-level Loom function lowers to. `main` keeps
/// its name since it's specialized into the process entry point; every
/// other function is namespaced to avoid collisions with C library names.
pub(super) fn c_fn_name(name: &str) -> String {
    if name == "main" {
        "main".to_string()
    } else {
        format!("loom_{name}")
    }
}
