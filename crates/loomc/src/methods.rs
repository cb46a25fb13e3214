//! The one method table for array and string member access.
//!
//! The type checker uses this to resolve a `.member` expression's type and
//! arity; the code generator uses the same table to pick the `rt_*` symbol
//! to call. A method that only one of the two stages knew about was a
//! standing source of drift, so this is the single place either stage
//! consults.

use crate::types::Type;

/// A member signature in terms of the receiver's element type (for arrays)
/// or `Type::Str` (for strings). `params` and `ret` are resolved against
/// `elem` by the caller via [`MethodSig::resolve`].
#[derive(Debug, Clone, Copy)]
pub struct MethodSig {
    pub name: &'static str,
    pub param_count: usize,
    pub runtime_fn: &'static str,
    kind: MethodKind,
}

#[derive(Debug, Clone, Copy)]
enum MethodKind {
    /// Returns `int`, independent of the element type.
    ReturnsInt,
    /// Returns `bool`.
    ReturnsBool,
    /// Returns `void`.
    ReturnsVoid,
    /// Returns the element type itself (e.g. `pop`, `charAt`).
    ReturnsElem,
    /// Returns an array of the element type (e.g. `clone`, `concat`).
    ReturnsSameArray,
    /// Returns `str` (string-only methods, and `join`).
    ReturnsStr,
}

pub struct ResolvedMethod<'a> {
    pub runtime_fn: &'static str,
    pub param_count: usize,
    pub ret: Type<'a>,
}

impl MethodSig {
    /// Compute the concrete return type of this method when called on a
    /// receiver of array-element-type (or string) `elem`.
    pub fn resolve<'a>(&self, elem: Type<'a>, array_of_elem: Type<'a>) -> ResolvedMethod<'a> {
        let ret = match self.kind {
            MethodKind::ReturnsInt => Type::Int,
            MethodKind::ReturnsBool => Type::Bool,
            MethodKind::ReturnsVoid => Type::Void,
            MethodKind::ReturnsElem => elem,
            MethodKind::ReturnsSameArray => array_of_elem,
            MethodKind::ReturnsStr => Type::Str,
        };
        ResolvedMethod {
            runtime_fn: self.runtime_fn,
            param_count: self.param_count,
            ret,
        }
    }
}

pub const ARRAY_METHODS: &[MethodSig] = &[
    MethodSig { name: "length", param_count: 0, runtime_fn: "rt_array_length", kind: MethodKind::ReturnsInt },
    MethodSig { name: "push", param_count: 1, runtime_fn: "rt_array_push", kind: MethodKind::ReturnsVoid },
    MethodSig { name: "pop", param_count: 0, runtime_fn: "rt_array_pop", kind: MethodKind::ReturnsElem },
    MethodSig { name: "clear", param_count: 0, runtime_fn: "rt_array_clear", kind: MethodKind::ReturnsVoid },
    MethodSig { name: "concat", param_count: 1, runtime_fn: "rt_array_concat", kind: MethodKind::ReturnsSameArray },
    MethodSig { name: "reverse", param_count: 0, runtime_fn: "rt_array_reverse", kind: MethodKind::ReturnsSameArray },
    MethodSig { name: "remove", param_count: 1, runtime_fn: "rt_array_remove", kind: MethodKind::ReturnsElem },
    MethodSig { name: "insert", param_count: 2, runtime_fn: "rt_array_insert", kind: MethodKind::ReturnsVoid },
    MethodSig { name: "contains", param_count: 1, runtime_fn: "rt_array_contains", kind: MethodKind::ReturnsBool },
    MethodSig { name: "indexOf", param_count: 1, runtime_fn: "rt_array_index_of", kind: MethodKind::ReturnsInt },
    MethodSig { name: "clone", param_count: 0, runtime_fn: "rt_array_clone", kind: MethodKind::ReturnsSameArray },
    MethodSig { name: "join", param_count: 1, runtime_fn: "rt_array_join", kind: MethodKind::ReturnsStr },
];

pub const STRING_METHODS: &[MethodSig] = &[
    MethodSig { name: "length", param_count: 0, runtime_fn: "rt_str_length", kind: MethodKind::ReturnsInt },
    MethodSig { name: "substring", param_count: 2, runtime_fn: "rt_str_substring", kind: MethodKind::ReturnsStr },
    MethodSig { name: "trim", param_count: 0, runtime_fn: "rt_str_trim", kind: MethodKind::ReturnsStr },
    MethodSig { name: "toUpper", param_count: 0, runtime_fn: "rt_str_to_upper", kind: MethodKind::ReturnsStr },
    MethodSig { name: "toLower", param_count: 0, runtime_fn: "rt_str_to_lower", kind: MethodKind::ReturnsStr },
    MethodSig { name: "startsWith", param_count: 1, runtime_fn: "rt_str_starts_with", kind: MethodKind::ReturnsBool },
    MethodSig { name: "endsWith", param_count: 1, runtime_fn: "rt_str_ends_with", kind: MethodKind::ReturnsBool },
    MethodSig { name: "contains", param_count: 1, runtime_fn: "rt_str_contains", kind: MethodKind::ReturnsBool },
    MethodSig { name: "replace", param_count: 2, runtime_fn: "rt_str_replace", kind: MethodKind::ReturnsStr },
    MethodSig { name: "charAt", param_count: 1, runtime_fn: "rt_str_char_at", kind: MethodKind::ReturnsElem },
    MethodSig { name: "indexOf", param_count: 1, runtime_fn: "rt_str_index_of", kind: MethodKind::ReturnsInt },
    MethodSig { name: "split", param_count: 1, runtime_fn: "rt_str_split", kind: MethodKind::ReturnsSameArray },
];

pub fn lookup_array_method(name: &str) -> Option<&'static MethodSig> {
    ARRAY_METHODS.iter().find(|m| m.name == name)
}

pub fn lookup_string_method(name: &str) -> Option<&'static MethodSig> {
    STRING_METHODS.iter().find(|m| m.name == name)
}

/// All member names valid on a receiver of the given shape, used to build
/// "did you mean" suggestions for a bad member access.
pub fn array_method_names() -> impl Iterator<Item = &'static str> {
    ARRAY_METHODS.iter().map(|m| m.name)
}

pub fn string_method_names() -> impl Iterator<Item = &'static str> {
    STRING_METHODS.iter().map(|m| m.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_push_takes_one_arg_and_returns_void() {
        let m = lookup_array_method("push").unwrap();
        let resolved = m.resolve(Type::Int, Type::Int);
        assert_eq!(resolved.param_count, 1);
        assert_eq!(resolved.ret, Type::Void);
        assert_eq!(resolved.runtime_fn, "rt_array_push");
    }

    #[test]
    fn array_pop_returns_the_element_type() {
        let m = lookup_array_method("pop").unwrap();
        let resolved = m.resolve(Type::Double, Type::Double);
        assert_eq!(resolved.ret, Type::Double);
    }

    #[test]
    fn array_clone_returns_an_array_of_the_same_element() {
        let m = lookup_array_method("clone").unwrap();
        let resolved = m.resolve(Type::Int, Type::Array(&Type::Int));
        assert_eq!(resolved.ret, Type::Array(&Type::Int));
    }

    #[test]
    fn unknown_member_resolves_to_none() {
        assert!(lookup_array_method("sort").is_none());
        assert!(lookup_string_method("sort").is_none());
    }

    #[test]
    fn string_char_at_returns_char() {
        let m = lookup_string_method("charAt").unwrap();
        let resolved = m.resolve(Type::Char, Type::Str);
        assert_eq!(resolved.ret, Type::Char);
        assert_eq!(resolved.param_count, 1);
    }
}
