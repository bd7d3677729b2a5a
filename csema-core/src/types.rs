//! The type model: builtin types, derived types, and qualifiers.
//!
//! Named types (`Alias`, `Struct`, `Enum`) are represented as [`DeclId`]
//! handles rather than owning pointers into the declaration they name, so
//! that alias chains can form a cyclic graph without reference counting.
//! [`QualType`] pairs a [`Type`] with a [`Qualifiers`] bitset and a lazily
//! filled canonical-form cache; the cache is populated once by
//! `TypeResolver::resolve_canonicals` and reused for every later query
//! (`is_const`, `is_pointer`, arithmetic promotion, ...).

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::ast::Expr;
use crate::ids::DeclId;

bitflags::bitflags! {
    /// Type qualifiers. Distinct from storage-class keywords: a `Qualifiers`
    /// value travels with a [`QualType`] wherever that type is used, not just
    /// at the point of declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub struct Qualifiers: u8 {
        const CONST = 0b0000_0001;
        const VOLATILE = 0b0000_0010;
        const LOCAL = 0b0000_0100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinType {
    Void,
    Bool,
    Char,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl BuiltinType {
    pub fn is_integer(self) -> bool {
        !matches!(self, BuiltinType::Void | BuiltinType::F32 | BuiltinType::F64)
    }

    pub fn is_float(self) -> bool {
        matches!(self, BuiltinType::F32 | BuiltinType::F64)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            BuiltinType::I8 | BuiltinType::I16 | BuiltinType::I32 | BuiltinType::I64
        )
    }

    /// Relative rank for usual-arithmetic-conversion purposes; higher wins.
    pub fn rank(self) -> u8 {
        match self {
            BuiltinType::Void => 0,
            BuiltinType::Bool => 1,
            BuiltinType::Char | BuiltinType::I8 | BuiltinType::U8 => 2,
            BuiltinType::I16 | BuiltinType::U16 => 3,
            BuiltinType::I32 | BuiltinType::U32 => 4,
            BuiltinType::I64 | BuiltinType::U64 => 5,
            BuiltinType::F32 => 6,
            BuiltinType::F64 => 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub ret: Box<QualType>,
    pub params: Vec<Param>,
    pub is_variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: QualType,
    pub span: crate::source::Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    Builtin(BuiltinType),
    Pointer(Box<QualType>),
    Array {
        element: Box<QualType>,
        size: Option<Box<Expr>>,
        /// Filled in once the size expression (if any) has been constant-folded.
        resolved_size: Option<u64>,
    },
    Function(FunctionSignature),
    /// Reference to an `AliasType` declaration; not yet expanded.
    Alias(DeclId),
    Struct(DeclId),
    Enum(DeclId),
    /// Sentinel used to suppress error cascades once a type has already
    /// been diagnosed as broken.
    Error,
}

impl Type {
    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }
}

/// A [`Type`] together with its qualifiers and a memoised canonical form.
///
/// Two `QualType` values compare equal when their syntactic type and
/// qualifiers match; the canonical-form cache is bookkeeping, not part of
/// the type's identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualType {
    pub ty: Type,
    pub qualifiers: Qualifiers,
    canonical: RefCell<Option<Type>>,
}

impl QualType {
    pub fn new(ty: Type, qualifiers: Qualifiers) -> Self {
        Self {
            ty,
            qualifiers,
            canonical: RefCell::new(None),
        }
    }

    pub fn unqualified(ty: Type) -> Self {
        Self::new(ty, Qualifiers::empty())
    }

    pub fn is_const(&self) -> bool {
        self.qualifiers.contains(Qualifiers::CONST)
    }

    pub fn is_volatile(&self) -> bool {
        self.qualifiers.contains(Qualifiers::VOLATILE)
    }

    pub fn is_local(&self) -> bool {
        self.qualifiers.contains(Qualifiers::LOCAL)
    }

    pub fn has_canonical(&self) -> bool {
        self.canonical.borrow().is_some()
    }

    pub fn canonical(&self) -> Option<Type> {
        self.canonical.borrow().clone()
    }

    /// Memoise a freshly computed canonical form. Idempotent: resolving the
    /// same `QualType` twice just overwrites the cache with an identical value.
    pub fn set_canonical(&self, canonical: Type) {
        *self.canonical.borrow_mut() = Some(canonical);
    }
}

impl PartialEq for QualType {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.qualifiers == other.qualifiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifiers_are_a_bitset() {
        let q = Qualifiers::CONST | Qualifiers::VOLATILE;
        assert!(q.contains(Qualifiers::CONST));
        assert!(q.contains(Qualifiers::VOLATILE));
        assert!(!q.contains(Qualifiers::LOCAL));
    }

    #[test]
    fn canonical_cache_does_not_affect_equality() {
        let a = QualType::unqualified(Type::Builtin(BuiltinType::I32));
        let b = QualType::unqualified(Type::Builtin(BuiltinType::I32));
        a.set_canonical(Type::Builtin(BuiltinType::I32));
        assert_eq!(a, b);
        assert!(a.has_canonical());
        assert!(!b.has_canonical());
    }

    #[test]
    fn rank_orders_by_width_then_float() {
        assert!(BuiltinType::I64.rank() > BuiltinType::I32.rank());
        assert!(BuiltinType::F64.rank() > BuiltinType::I64.rank());
    }
}
