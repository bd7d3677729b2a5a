//! Type structure validation and canonical-form resolution.
//!
//! `TypeResolver` is stateless between calls except for the `resolving` mark
//! each [`AliasTypeDecl`](crate::ast::AliasTypeDecl) carries, which is how
//! [`resolve_canonicals`](TypeResolver::resolve_canonicals) detects a cyclic
//! alias chain without a separate visited set: entering an alias sets the
//! mark, leaving clears it, and re-entering a marked alias is the cycle.

use std::collections::HashSet;

use crate::ast::{Decl, File};
use crate::diagnostic::{codes, Diagnostic, Diagnostics};
use crate::expr_type_analyser::eval_const_int;
use crate::ids::DeclId;
use crate::source::Span;
use crate::types::{BuiltinType, QualType, Type};

pub struct TypeResolver;

impl TypeResolver {
    pub fn new() -> Self {
        Self
    }

    /// Validate a type's structure: descend into pointee/element types, and
    /// for a named-type reference, enforce that a public declaration never
    /// depends on a private one.
    pub fn check_type(
        &self,
        file: &File,
        qt: &QualType,
        enclosing_is_public: bool,
        span: Span,
        diags: &mut Diagnostics,
    ) {
        match &qt.ty {
            Type::Builtin(_) | Type::Error => {}
            Type::Pointer(inner) => self.check_type(file, inner, enclosing_is_public, span, diags),
            Type::Array { element, .. } => {
                self.check_type(file, element, enclosing_is_public, span, diags)
            }
            Type::Function(sig) => {
                self.check_type(file, &sig.ret, enclosing_is_public, span, diags);
                for param in &sig.params {
                    self.check_type(file, &param.ty, enclosing_is_public, param.span, diags);
                }
            }
            Type::Alias(id) | Type::Struct(id) | Type::Enum(id) => {
                self.check_named_reference(file, *id, enclosing_is_public, span, diags);
            }
        }
    }

    fn check_named_reference(
        &self,
        file: &File,
        id: DeclId,
        enclosing_is_public: bool,
        span: Span,
        diags: &mut Diagnostics,
    ) {
        let target = file.decl(id);
        if enclosing_is_public && !target.common().is_public {
            diags.add(Diagnostic::from_code(
                &codes::E0204,
                span,
                format!(
                    "public declaration depends on private type `{}`",
                    target.name()
                ),
            ));
        }
    }

    /// Follow an alias chain to its canonical (non-alias) form, memoising the
    /// result on `qt`. Calling this twice on an already-resolved `qt` is a
    /// no-op: the per-declaration idempotence check happens in the caller
    /// (`resolveVarDecl`-equivalent code), not here, since `QualType` itself
    /// exposes `has_canonical`.
    pub fn resolve_canonicals(
        &self,
        file: &File,
        qt: &QualType,
        span: Span,
        diags: &mut Diagnostics,
    ) -> Type {
        if let Some(cached) = qt.canonical() {
            return cached;
        }
        let canonical = self.expand(file, &qt.ty, span, diags);
        qt.set_canonical(canonical.clone());
        canonical
    }

    fn expand(&self, file: &File, ty: &Type, span: Span, diags: &mut Diagnostics) -> Type {
        match ty {
            Type::Alias(id) => self.expand_alias(file, *id, span, diags),
            Type::Pointer(inner) => {
                let expanded = self.resolve_canonicals(file, inner, span, diags);
                Type::Pointer(Box::new(requalified(inner, expanded)))
            }
            Type::Array {
                element,
                size,
                resolved_size,
            } => {
                let expanded = self.resolve_canonicals(file, element, span, diags);
                Type::Array {
                    element: Box::new(requalified(element, expanded)),
                    size: size.clone(),
                    resolved_size: *resolved_size,
                }
            }
            other => other.clone(),
        }
    }

    fn expand_alias(&self, file: &File, id: DeclId, span: Span, diags: &mut Diagnostics) -> Type {
        let Decl::AliasType(alias) = file.decl(id) else {
            return Type::Error;
        };
        if alias.resolving.get() {
            diags.add(Diagnostic::from_code(
                &codes::E0701,
                span,
                format!(
                    "type alias `{}` refers back to itself through a chain of aliases",
                    alias.common.name
                ),
            ));
            return Type::Error;
        }
        alias.resolving.set(true);
        let canonical = self.resolve_canonicals(file, &alias.target, alias.common.span, diags);
        alias.resolving.set(false);
        canonical
    }

    /// `checkEnumValue`: assign each constant its value (sequential unless
    /// given an explicit initialiser), enforce uniqueness, and report
    /// overflow of the enum's implementation type instead of wrapping.
    pub fn resolve_enum_constants(&self, file: &File, enum_id: DeclId, diags: &mut Diagnostics) {
        let Decl::EnumType(enum_decl) = file.decl(enum_id) else {
            return;
        };
        let impl_type = enum_decl.impl_type;
        let mut next_value: i64 = 0;
        let mut seen = HashSet::new();
        for &const_id in &enum_decl.constants {
            let Decl::EnumConstant(constant) = file.decl(const_id) else {
                continue;
            };
            let value = constant
                .value
                .as_ref()
                .and_then(eval_const_int)
                .unwrap_or(next_value);

            if !fits_builtin_range(impl_type, value) {
                diags.add(Diagnostic::from_code(
                    &codes::E0801,
                    constant.common.span,
                    format!(
                        "enum constant `{}` = {} exceeds the range of {:?}",
                        constant.common.name, value, impl_type
                    ),
                ));
            }
            if !seen.insert(value) {
                diags.add(Diagnostic::from_code(
                    &codes::E0803,
                    constant.common.span,
                    format!(
                        "enum constant `{}` duplicates an earlier value ({})",
                        constant.common.name, value
                    ),
                ));
            }
            constant.resolved_value.set(Some(value));
            next_value = value + 1;
        }
    }
}

fn fits_builtin_range(ty: BuiltinType, value: i64) -> bool {
    match ty {
        BuiltinType::I8 => (i8::MIN as i64..=i8::MAX as i64).contains(&value),
        BuiltinType::U8 => (0..=u8::MAX as i64).contains(&value),
        BuiltinType::I16 => (i16::MIN as i64..=i16::MAX as i64).contains(&value),
        BuiltinType::U16 => (0..=u16::MAX as i64).contains(&value),
        BuiltinType::I32 => (i32::MIN as i64..=i32::MAX as i64).contains(&value),
        BuiltinType::U32 => (0..=u32::MAX as i64).contains(&value),
        BuiltinType::I64 | BuiltinType::U64 => true,
        BuiltinType::Char => (0..=255).contains(&value),
        BuiltinType::Bool => (0..=1).contains(&value),
        BuiltinType::Void | BuiltinType::F32 | BuiltinType::F64 => true,
    }
}

impl Default for TypeResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn requalified(original: &QualType, canonical_ty: Type) -> QualType {
    QualType::new(canonical_ty, original.qualifiers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AliasTypeDecl, DeclCommon};
    use crate::types::BuiltinType;
    use std::cell::Cell;

    fn file_with(decls: Vec<Decl>) -> File {
        File {
            name: "t.c2".into(),
            package: "main".into(),
            types: (0..decls.len() as u32).map(DeclId).collect(),
            decls,
            uses: vec![],
            vars: vec![],
            functions: vec![],
            array_values: vec![],
        }
    }

    #[test]
    fn resolving_an_alias_chain_reaches_the_builtin() {
        // type B = i32; type A = B;
        let b = Decl::AliasType(AliasTypeDecl {
            common: DeclCommon::new("B", Span::new(0, 1), false),
            target: QualType::unqualified(Type::Builtin(BuiltinType::I32)),
            resolving: Cell::new(false),
        });
        let a = Decl::AliasType(AliasTypeDecl {
            common: DeclCommon::new("A", Span::new(0, 1), false),
            target: QualType::unqualified(Type::Alias(DeclId(0))),
            resolving: Cell::new(false),
        });
        let file = file_with(vec![b, a]);
        let resolver = TypeResolver::new();
        let mut diags = Diagnostics::new();

        let Decl::AliasType(a_decl) = file.decl(DeclId(1)) else {
            unreachable!()
        };
        let canonical = resolver.resolve_canonicals(&file, &a_decl.target, a_decl.common.span, &mut diags);
        assert_eq!(canonical, Type::Builtin(BuiltinType::I32));
        assert!(!diags.has_errors());
    }

    #[test]
    fn self_referential_alias_is_a_cycle_error() {
        // type A = A;
        let a = Decl::AliasType(AliasTypeDecl {
            common: DeclCommon::new("A", Span::new(0, 1), false),
            target: QualType::unqualified(Type::Alias(DeclId(0))),
            resolving: Cell::new(false),
        });
        let file = file_with(vec![a]);
        let resolver = TypeResolver::new();
        let mut diags = Diagnostics::new();

        let Decl::AliasType(a_decl) = file.decl(DeclId(0)) else {
            unreachable!()
        };
        let canonical = resolver.resolve_canonicals(&file, &a_decl.target, a_decl.common.span, &mut diags);
        assert_eq!(canonical, Type::Error);
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn public_alias_of_a_private_type_is_flagged() {
        // type priv = i32; public type pub = priv;
        let private = Decl::AliasType(AliasTypeDecl {
            common: DeclCommon::new("priv", Span::new(0, 1), false),
            target: QualType::unqualified(Type::Builtin(BuiltinType::I32)),
            resolving: Cell::new(false),
        });
        let public = Decl::AliasType(AliasTypeDecl {
            common: DeclCommon::new("pub", Span::new(10, 13), true),
            target: QualType::unqualified(Type::Alias(DeclId(0))),
            resolving: Cell::new(false),
        });
        let file = file_with(vec![private, public]);
        let resolver = TypeResolver::new();
        let mut diags = Diagnostics::new();

        let Decl::AliasType(public_decl) = file.decl(DeclId(1)) else {
            unreachable!()
        };
        resolver.check_type(&file, &public_decl.target, true, public_decl.common.span, &mut diags);

        assert_eq!(diags.error_count(), 1);
        assert!(diags.iter().any(|d| d.code.as_deref() == Some("E0204") && d.span == Span::new(10, 13)));
    }

    #[test]
    fn resolving_twice_is_idempotent() {
        let qt = QualType::unqualified(Type::Builtin(BuiltinType::I32));
        let file = file_with(vec![]);
        let resolver = TypeResolver::new();
        let mut diags = Diagnostics::new();
        let first = resolver.resolve_canonicals(&file, &qt, Span::new(0, 1), &mut diags);
        let second = resolver.resolve_canonicals(&file, &qt, Span::new(0, 1), &mut diags);
        assert_eq!(first, second);
        assert!(diags.is_empty());
    }

    #[test]
    fn enum_constants_without_initialisers_are_sequential() {
        use crate::ast::{EnumConstantDecl, EnumTypeDecl};

        let c0 = Decl::EnumConstant(EnumConstantDecl {
            common: DeclCommon::new("RED", Span::new(0, 1), false),
            value: None,
            resolved_value: Cell::new(None),
        });
        let c1 = Decl::EnumConstant(EnumConstantDecl {
            common: DeclCommon::new("GREEN", Span::new(0, 1), false),
            value: None,
            resolved_value: Cell::new(None),
        });
        let e = Decl::EnumType(EnumTypeDecl {
            common: DeclCommon::new("Color", Span::new(0, 1), false),
            impl_type: BuiltinType::I32,
            constants: vec![DeclId(0), DeclId(1)],
        });
        let mut file = file_with(vec![c0, c1, e]);
        file.types = vec![DeclId(2)];

        let resolver = TypeResolver::new();
        let mut diags = Diagnostics::new();
        resolver.resolve_enum_constants(&file, DeclId(2), &mut diags);

        assert!(diags.is_empty());
        let Decl::EnumConstant(c0) = file.decl(DeclId(0)) else {
            unreachable!()
        };
        let Decl::EnumConstant(c1) = file.decl(DeclId(1)) else {
            unreachable!()
        };
        assert_eq!(c0.resolved_value.get(), Some(0));
        assert_eq!(c1.resolved_value.get(), Some(1));
    }

    #[test]
    fn duplicate_enum_constant_values_are_flagged() {
        use crate::ast::{EnumConstantDecl, EnumTypeDecl, ExprKind};
        use crate::ast::Expr as AstExpr;

        let zero_expr = AstExpr::new(Span::new(0, 1), ExprKind::IntLiteral(0));
        let c0 = Decl::EnumConstant(EnumConstantDecl {
            common: DeclCommon::new("A", Span::new(0, 1), false),
            value: None,
            resolved_value: Cell::new(None),
        });
        let c1 = Decl::EnumConstant(EnumConstantDecl {
            common: DeclCommon::new("B", Span::new(0, 1), false),
            value: Some(zero_expr),
            resolved_value: Cell::new(None),
        });
        let e = Decl::EnumType(EnumTypeDecl {
            common: DeclCommon::new("Flag", Span::new(0, 1), false),
            impl_type: BuiltinType::I32,
            constants: vec![DeclId(0), DeclId(1)],
        });
        let file = file_with(vec![c0, c1, e]);

        let resolver = TypeResolver::new();
        let mut diags = Diagnostics::new();
        resolver.resolve_enum_constants(&file, DeclId(2), &mut diags);
        assert_eq!(diags.error_count(), 1);
    }
}
