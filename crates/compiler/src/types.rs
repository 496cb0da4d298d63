//! Type representation and compatibility predicates.
//!
//! Types are small immutable values built bottom-up by the declarator
//! parser; constructors never mutate an existing node, and sharing is by
//! cloning. `Null` is the type of the literal `0` and compares equal to
//! `Int`; it widens to whatever pointer type it is assigned or compared to.

use crate::intern::Ident;
use std::fmt;

#[derive(Debug, Clone)]
pub enum Type {
    Unknown,
    Void,
    Int,
    /// Type of the literal `0`, assignable to any pointer
    Null,
    Pointer(Box<Type>),
    Func { ret: Box<Type>, params: Vec<Param> },
}

/// A function parameter. Abstract declarators leave the name empty.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Option<Ident>,
    pub ty: Type,
}

impl Type {
    pub fn pointer(target: Type) -> Type {
        Type::Pointer(Box::new(target))
    }

    pub fn func(ret: Type, params: Vec<Param>) -> Type {
        Type::Func {
            ret: Box::new(ret),
            params,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Int | Type::Null)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn is_func(&self) -> bool {
        matches!(self, Type::Func { .. })
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    /// Pointer-valued for arithmetic purposes: a pointer, or a function
    /// (which decays to its address).
    fn is_pointer_like(&self) -> bool {
        matches!(self, Type::Pointer(_) | Type::Func { .. })
    }

    /// Object size on the LP64 target. `None` for types without a size.
    pub fn size_in_bytes(&self) -> Option<u32> {
        match self {
            Type::Int => Some(4),
            Type::Pointer(_) | Type::Func { .. } | Type::Null => Some(8),
            Type::Void | Type::Unknown => None,
        }
    }
}

impl PartialEq for Type {
    /// Structural equality. `Int` and `Null` are interchangeable, pointer
    /// targets are compared recursively, and function parameter lists are
    /// compared pairwise by type with names ignored.
    fn eq(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Unknown, Type::Unknown) => true,
            (Type::Void, Type::Void) => true,
            (Type::Int | Type::Null, Type::Int | Type::Null) => true,
            (Type::Pointer(a), Type::Pointer(b)) => a == b,
            (
                Type::Func {
                    ret: lret,
                    params: lparams,
                },
                Type::Func {
                    ret: rret,
                    params: rparams,
                },
            ) => {
                lret == rret
                    && lparams.len() == rparams.len()
                    && lparams
                        .iter()
                        .zip(rparams.iter())
                        .all(|(a, b)| a.ty == b.ty)
            }
            _ => false,
        }
    }
}

impl Eq for Type {}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unknown => write!(f, "unknown"),
            Type::Void => write!(f, "void"),
            Type::Int => write!(f, "int"),
            Type::Null => write!(f, "null"),
            Type::Pointer(target) => write!(f, "pointer to {}", target),
            Type::Func { ret, params } => {
                write!(f, "function(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p.ty)?;
                }
                write!(f, ") returning {}", ret)
            }
        }
    }
}

/// Both operands must be integer-valued.
pub fn can_mul_div(lhs: &Type, rhs: &Type) -> bool {
    lhs.is_integer() && rhs.is_integer()
}

/// Integer + integer, or pointer/function + integer on either side.
pub fn can_add(lhs: &Type, rhs: &Type) -> bool {
    (lhs.is_integer() && rhs.is_integer())
        || (lhs.is_pointer_like() && rhs.is_integer())
        || (lhs.is_integer() && rhs.is_pointer_like())
}

/// Integer - integer, or pointer/function - integer.
/// Pointer - pointer is not supported.
pub fn can_sub(lhs: &Type, rhs: &Type) -> bool {
    (lhs.is_integer() && rhs.is_integer()) || (lhs.is_pointer_like() && rhs.is_integer())
}

/// Comparable without complaint: neither side `void`, and either the types
/// are equal or one is a pointer and the other an integer.
pub fn can_rel(lhs: &Type, rhs: &Type) -> bool {
    if lhs.is_void() || rhs.is_void() {
        return false;
    }
    lhs == rhs
        || (lhs.is_pointer() && rhs.is_integer())
        || (lhs.is_integer() && rhs.is_pointer())
}

/// Comparable, but worth a warning: two incompatible pointer types, or a
/// pointer against a function.
pub fn warn_rel(lhs: &Type, rhs: &Type) -> bool {
    match (lhs, rhs) {
        (Type::Pointer(_), Type::Pointer(_)) => lhs != rhs,
        (Type::Pointer(_), Type::Func { .. }) | (Type::Func { .. }, Type::Pointer(_)) => true,
        _ => false,
    }
}

/// Assignable without complaint, recursing through pointer targets. `Null`
/// (the literal `0`) is assignable to any pointer, and a function r-value is
/// assignable to a compatible function pointer.
pub fn can_assign(lhs: &Type, rhs: &Type) -> bool {
    if lhs.is_integer() && rhs.is_integer() {
        return true;
    }
    match (lhs, rhs) {
        (Type::Pointer(_), Type::Null) => true,
        (Type::Pointer(lt), Type::Pointer(rt)) => can_assign(lt, rt),
        (Type::Pointer(lt), Type::Func { .. }) => **lt == *rhs,
        _ => false,
    }
}

/// Assignable with a warning: integer/pointer mixes and mismatched pointer
/// targets.
pub fn warn_assign(lhs: &Type, rhs: &Type) -> bool {
    match (lhs, rhs) {
        (Type::Pointer(_), Type::Null) => false,
        (Type::Pointer(lt), Type::Pointer(rt)) => !can_assign(lt, rt),
        (Type::Pointer(lt), Type::Func { .. }) => **lt != *rhs,
        (Type::Pointer(_) | Type::Func { .. }, _) => rhs.is_integer(),
        (_, Type::Pointer(_) | Type::Func { .. }) => lhs.is_integer(),
        _ => false,
    }
}

/// Usable as a logical operand: anything but `void`.
pub fn can_logical(lhs: &Type, rhs: &Type) -> bool {
    !lhs.is_void() && !rhs.is_void()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_ptr() -> Type {
        Type::pointer(Type::Int)
    }

    fn func_int() -> Type {
        Type::func(Type::Int, vec![])
    }

    #[test]
    fn test_null_equals_int() {
        assert_eq!(Type::Null, Type::Int);
        assert_eq!(Type::Int, Type::Null);
        assert_ne!(Type::Null, Type::Void);
    }

    #[test]
    fn test_pointer_equality_recurses() {
        assert_eq!(int_ptr(), int_ptr());
        assert_ne!(int_ptr(), Type::pointer(int_ptr()));
        assert_eq!(Type::pointer(Type::Null), int_ptr());
    }

    #[test]
    fn test_func_equality_ignores_param_names() {
        let mut interner = crate::intern::Interner::new();
        let a = interner.intern("a");
        let named = Type::func(
            Type::Int,
            vec![Param {
                name: Some(a),
                ty: Type::Int,
            }],
        );
        let anon = Type::func(
            Type::Int,
            vec![Param {
                name: None,
                ty: Type::Int,
            }],
        );
        assert_eq!(named, anon);
        assert_ne!(named, func_int());
    }

    #[test]
    fn test_sizes() {
        assert_eq!(Type::Int.size_in_bytes(), Some(4));
        assert_eq!(int_ptr().size_in_bytes(), Some(8));
        assert_eq!(func_int().size_in_bytes(), Some(8));
        assert_eq!(Type::Null.size_in_bytes(), Some(8));
        assert_eq!(Type::Void.size_in_bytes(), None);
        assert_eq!(Type::Unknown.size_in_bytes(), None);
    }

    #[test]
    fn test_arithmetic_predicates() {
        assert!(can_mul_div(&Type::Int, &Type::Null));
        assert!(!can_mul_div(&int_ptr(), &Type::Int));

        assert!(can_add(&Type::Int, &Type::Int));
        assert!(can_add(&int_ptr(), &Type::Int));
        assert!(can_add(&Type::Int, &int_ptr()));
        assert!(!can_add(&int_ptr(), &int_ptr()));

        assert!(can_sub(&int_ptr(), &Type::Int));
        assert!(!can_sub(&Type::Int, &int_ptr()));
        assert!(!can_sub(&int_ptr(), &int_ptr()));
    }

    #[test]
    fn test_relational_predicates() {
        assert!(can_rel(&Type::Null, &int_ptr()));
        assert!(can_rel(&int_ptr(), &int_ptr()));
        assert!(!can_rel(&Type::Void, &Type::Int));

        assert!(warn_rel(&int_ptr(), &Type::pointer(int_ptr())));
        assert!(warn_rel(&int_ptr(), &func_int()));
        assert!(!warn_rel(&int_ptr(), &int_ptr()));
        assert!(!warn_rel(&int_ptr(), &Type::Int));
    }

    #[test]
    fn test_assignment_predicates() {
        assert!(can_assign(&Type::Int, &Type::Int));
        assert!(can_assign(&int_ptr(), &Type::Null));
        assert!(can_assign(&int_ptr(), &int_ptr()));
        assert!(can_assign(&Type::pointer(func_int()), &func_int()));
        assert!(!can_assign(&int_ptr(), &Type::pointer(int_ptr())));
        assert!(!can_assign(&int_ptr(), &Type::Int));

        assert!(warn_assign(&int_ptr(), &Type::Int));
        assert!(warn_assign(&Type::Int, &int_ptr()));
        assert!(warn_assign(&int_ptr(), &Type::pointer(int_ptr())));
        assert!(!warn_assign(&int_ptr(), &Type::Null));
        assert!(!warn_assign(&Type::Int, &Type::Int));
    }

    #[test]
    fn test_logical_predicate() {
        assert!(can_logical(&Type::Int, &int_ptr()));
        assert!(!can_logical(&Type::Void, &Type::Int));
        assert!(!can_logical(&Type::Int, &Type::Void));
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::Int.to_string(), "int");
        assert_eq!(int_ptr().to_string(), "pointer to int");
        assert_eq!(
            Type::pointer(func_int()).to_string(),
            "pointer to function() returning int"
        );
    }
}
