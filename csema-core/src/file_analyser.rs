//! Drives whole-file analysis in the fixed seven-pass order: resolving uses,
//! then types, then their canonical forms, then struct members, then
//! variables and their initialisers, then function prototypes, and finally
//! function bodies. A final sweep reports unused declarations and collects
//! the set of cross-package references (`getExternals`).
//!
//! Grounded in the original `FileAnalyser`'s fixed-order driver: each phase
//! only depends on state the previous phases have already established (a
//! function body cannot be checked before every type in the file has a
//! canonical form; a struct's members cannot be laid out before its own
//! member types resolve).

use tracing::{debug, trace};

use crate::ast::{Decl, Designator, ExprKind, File};
use crate::diagnostic::{codes, Diagnostic, Diagnostics};
use crate::function_analyser::{FunctionAnalyser, FunctionAnalysis};
use crate::ids::DeclId;
use crate::pkgs::PackageMap;
use crate::scope::{RegisterUseError, Scope};
use crate::type_resolver::TypeResolver;
use crate::types::Type;

pub struct FileAnalyser<'f> {
    file: &'f File,
    pkgs: &'f PackageMap,
    type_resolver: TypeResolver,
    uses_scope: Scope,
}

/// The per-function analyses produced by `check_function_bodies`, keyed by
/// the function's declaration id — the caller (codegen handoff) looks these
/// up by id rather than by name.
pub struct FileAnalysis {
    pub function_analyses: Vec<(DeclId, FunctionAnalysis)>,
}

impl<'f> FileAnalyser<'f> {
    pub fn new(file: &'f File, pkgs: &'f PackageMap) -> Self {
        Self {
            file,
            pkgs,
            type_resolver: TypeResolver::new(),
            uses_scope: Scope::new(),
        }
    }

    /// Run all seven passes plus the unused-declaration sweep, returning the
    /// per-function defer-walk results. Each phase still runs even if an
    /// earlier phase reported errors, so a single file yields as complete a
    /// diagnostic picture as possible in one pass.
    pub fn analyse(&mut self, diags: &mut Diagnostics) -> FileAnalysis {
        let span = tracing::info_span!("analyse_file", file = %self.file.name, package = %self.file.package);
        let _enter = span.enter();
        debug!("starting seven-pass analysis");
        self.check_uses(diags);
        self.resolve_types(diags);
        self.resolve_type_canonicals(diags);
        self.resolve_struct_members(diags);
        self.resolve_vars(diags);
        self.check_function_protos(diags);
        let function_analyses = self.check_function_bodies(diags);
        self.check_decls_for_used(diags);
        debug!(
            errors = diags.error_count(),
            warnings = diags.warning_count(),
            "finished seven-pass analysis"
        );
        FileAnalysis { function_analyses }
    }

    /// Pass 1: register each `use` as a package alias, checking for
    /// duplicate aliases and packages absent from the resolved package map.
    fn check_uses(&mut self, diags: &mut Diagnostics) {
        trace!(count = self.file.uses.len(), "pass 1: check_uses");
        for &id in &self.file.uses {
            let Decl::Use(use_decl) = self.file.decl(id) else {
                continue;
            };
            let alias = use_decl.alias.as_deref().unwrap_or(&use_decl.package);
            match self
                .uses_scope
                .register_use(alias, &use_decl.package, use_decl.common.span, self.pkgs)
            {
                Ok(()) => {}
                Err(RegisterUseError::DuplicateAlias { alias, first }) => {
                    diags.add(
                        Diagnostic::from_code(
                            &codes::E0103,
                            use_decl.common.span,
                            format!("`{alias}` is already used as a package alias"),
                        )
                        .with_related(crate::diagnostic::RelatedInfo::new(
                            first,
                            "first used here",
                        )),
                    );
                }
                Err(RegisterUseError::UnknownPackage { package }) => {
                    diags.add(Diagnostic::from_code(
                        &codes::E0102,
                        use_decl.common.span,
                        format!("package `{package}` was not found"),
                    ));
                }
            }
        }
    }

    /// Pass 2: validate every declared type's structure (public-depends-on-
    /// private, well-formed pointer/array/function nesting).
    fn resolve_types(&mut self, diags: &mut Diagnostics) {
        trace!(count = self.file.types.len(), "pass 2: resolve_types");
        for &id in &self.file.types {
            let decl = self.file.decl(id);
            let is_public = decl.common().is_public;
            match decl {
                Decl::AliasType(alias) => {
                    self.type_resolver
                        .check_type(self.file, &alias.target, is_public, alias.common.span, diags);
                }
                Decl::StructType(s) => {
                    for &member_id in &s.members {
                        if let Decl::Var(member) = self.file.decl(member_id) {
                            self.type_resolver.check_type(
                                self.file,
                                &member.ty,
                                is_public,
                                member.common.span,
                                diags,
                            );
                        }
                    }
                }
                Decl::FunctionType(f) => {
                    self.type_resolver.check_type(
                        self.file,
                        &f.signature.ret,
                        is_public,
                        f.common.span,
                        diags,
                    );
                    for param in &f.signature.params {
                        self.type_resolver
                            .check_type(self.file, &param.ty, is_public, param.span, diags);
                    }
                }
                Decl::EnumType(_) => {}
                _ => {}
            }
        }
    }

    /// Pass 3: expand every declared type to its canonical form, memoising
    /// on the `QualType` itself, then assign enum constant values.
    fn resolve_type_canonicals(&mut self, diags: &mut Diagnostics) {
        trace!(count = self.file.types.len(), "pass 3: resolve_type_canonicals");
        for &id in &self.file.types {
            match self.file.decl(id) {
                Decl::AliasType(alias) => {
                    self.type_resolver.resolve_canonicals(
                        self.file,
                        &alias.target,
                        alias.common.span,
                        diags,
                    );
                }
                Decl::EnumType(_) => {
                    self.type_resolver.resolve_enum_constants(self.file, id, diags);
                }
                _ => {}
            }
        }
    }

    /// Pass 4: resolve every struct/union member's type to its canonical
    /// form, bounding recursive struct-in-struct depth.
    fn resolve_struct_members(&mut self, diags: &mut Diagnostics) {
        trace!("pass 4: resolve_struct_members");
        for &id in &self.file.types {
            let Decl::StructType(s) = self.file.decl(id) else {
                continue;
            };
            for &member_id in &s.members {
                if let Decl::Var(member) = self.file.decl(member_id) {
                    self.type_resolver.resolve_canonicals(
                        self.file,
                        &member.ty,
                        member.common.span,
                        diags,
                    );
                }
            }
        }
    }

    /// Pass 5: resolve every top-level variable's type and check its
    /// initialiser is assignable to it (`resolveVars` + `checkVarInits`).
    fn resolve_vars(&mut self, diags: &mut Diagnostics) {
        trace!(count = self.file.vars.len(), "pass 5: resolve_vars");
        for &id in &self.file.vars {
            let Decl::Var(var) = self.file.decl(id) else {
                continue;
            };
            self.type_resolver
                .resolve_canonicals(self.file, &var.ty, var.common.span, diags);
            if var.ty.is_const() && var.init.is_none() {
                diags.add(Diagnostic::from_code(
                    &codes::E0602,
                    var.common.span,
                    format!("const variable `{}` has no initialiser", var.common.name),
                ));
            }
            // A top-level initialiser cannot reference locals or call
            // functions, so it is checked for constant-foldability rather
            // than run through the full (function-scoped) expression analyser.
            if let Some(init) = &var.init {
                if !crate::expr_type_analyser::is_constant_foldable(init) {
                    diags.add(Diagnostic::from_code(
                        &codes::E0201,
                        init.span,
                        "top-level variable initialiser must be a constant expression",
                    ));
                }
            }
        }
        self.resolve_array_values(diags);
    }

    /// Pass 5, continued: resolve each standalone array-value declaration's
    /// `target_name` against the file's own variables, require the target be
    /// array-typed, typecheck the initialiser list element-by-element against
    /// the array's element type, and size an incomplete target array from the
    /// list's element (or highest designator index) count.
    fn resolve_array_values(&mut self, diags: &mut Diagnostics) {
        trace!(count = self.file.array_values.len(), "pass 5: resolve_array_values");
        for &id in &self.file.array_values {
            let Decl::ArrayValue(array_value) = self.file.decl(id) else {
                continue;
            };
            let target_id = self.file.vars.iter().copied().find(|&var_id| {
                matches!(self.file.decl(var_id), Decl::Var(v) if v.common.name == array_value.target_name)
            });
            let Some(target_id) = target_id else {
                diags.add(Diagnostic::from_code(
                    &codes::E0107,
                    array_value.common.span,
                    format!(
                        "`{}` does not resolve to any variable declared in this file",
                        array_value.target_name
                    ),
                ));
                continue;
            };
            array_value.target.set(Some(target_id));
            let Decl::Var(target_var) = self.file.decl(target_id) else {
                continue;
            };
            target_var.common.mark_used();

            let canonical = self.type_resolver.resolve_canonicals(
                self.file,
                &target_var.ty,
                target_var.common.span,
                diags,
            );
            let Type::Array {
                element,
                size,
                resolved_size,
            } = canonical
            else {
                diags.add(Diagnostic::from_code(
                    &codes::E0306,
                    array_value.common.span,
                    format!("`{}` is not an array-typed variable", array_value.target_name),
                ));
                continue;
            };
            let element_ty = element.ty.clone();

            let ExprKind::InitList(elements) = &array_value.init.kind else {
                if !crate::expr_type_analyser::is_constant_foldable(&array_value.init) {
                    diags.add(Diagnostic::from_code(
                        &codes::E0201,
                        array_value.init.span,
                        "array value initialiser must be an initialiser list or constant expression",
                    ));
                }
                continue;
            };

            let mut cursor: u64 = 0;
            let mut max_seen: u64 = 0;
            for element in elements {
                match &element.designator {
                    Some(Designator::Index(index_expr)) => {
                        match crate::expr_type_analyser::eval_const_int(index_expr) {
                            Some(v) if v >= 0 => cursor = v as u64,
                            _ => {
                                diags.add(Diagnostic::from_code(
                                    &codes::E0201,
                                    index_expr.span,
                                    "array designator index must be a non-negative constant expression",
                                ));
                            }
                        }
                    }
                    Some(Designator::Field(_)) => {
                        diags.add(Diagnostic::from_code(
                            &codes::E0307,
                            array_value.init.span,
                            "an array initialiser cannot use a field designator",
                        ));
                    }
                    None => {}
                }
                max_seen = max_seen.max(cursor);

                if crate::expr_type_analyser::is_constant_foldable(&element.value) {
                    let value_ty = crate::expr_type_analyser::const_expr_type(&element.value);
                    crate::expr_type_analyser::check_assignable(
                        &element_ty,
                        &value_ty,
                        element.value.span,
                        diags,
                    );
                } else {
                    diags.add(Diagnostic::from_code(
                        &codes::E0201,
                        element.value.span,
                        "array initialiser element must be a constant expression",
                    ));
                }
                cursor += 1;
            }

            if resolved_size.is_none() {
                let inferred_size = if elements.is_empty() { 0 } else { max_seen + 1 };
                target_var.ty.set_canonical(Type::Array {
                    element,
                    size,
                    resolved_size: Some(inferred_size),
                });
            }
        }
    }

    /// Pass 6: resolve and validate every function's return type and
    /// parameter types (but not yet its body).
    fn check_function_protos(&mut self, diags: &mut Diagnostics) {
        trace!(count = self.file.functions.len(), "pass 6: check_function_protos");
        for &id in &self.file.functions {
            let Decl::Function(func) = self.file.decl(id) else {
                continue;
            };
            let is_public = func.common.is_public;
            self.type_resolver.check_type(
                self.file,
                &func.signature.ret,
                is_public,
                func.common.span,
                diags,
            );
            self.type_resolver
                .resolve_canonicals(self.file, &func.signature.ret, func.common.span, diags);
            for param in &func.signature.params {
                self.type_resolver
                    .check_type(self.file, &param.ty, is_public, param.span, diags);
                self.type_resolver
                    .resolve_canonicals(self.file, &param.ty, param.span, diags);
            }
        }
    }

    /// Pass 7: walk every function body with a fresh `FunctionAnalyser`.
    fn check_function_bodies(&mut self, diags: &mut Diagnostics) -> Vec<(DeclId, FunctionAnalysis)> {
        trace!(count = self.file.functions.len(), "pass 7: check_function_bodies");
        let mut results = Vec::new();
        for &id in &self.file.functions {
            let Decl::Function(func) = self.file.decl(id) else {
                continue;
            };
            trace!(function = %func.common.name, "checking function body");
            let mut analyser = FunctionAnalyser::new(self.file, &self.file.package, self.pkgs);
            let analysis = analyser.check(func, diags);
            results.push((id, analysis));
        }
        results
    }

    /// `checkDeclsForUsed`: every unused package alias, variable, function
    /// (other than `main`), type, struct member, and every public type that
    /// was only ever used privately, reported as a warning.
    fn check_decls_for_used(&mut self, diags: &mut Diagnostics) {
        trace!("sweeping for unused declarations");
        for alias in self.uses_scope.unused_aliases() {
            if let Some(&id) = self.file.uses.iter().find(|&&id| {
                matches!(self.file.decl(id), Decl::Use(u) if u.alias.as_deref().unwrap_or(&u.package) == alias)
            }) {
                let Decl::Use(use_decl) = self.file.decl(id) else {
                    continue;
                };
                diags.add(Diagnostic::from_code(
                    &codes::E0901,
                    use_decl.common.span,
                    format!("package alias `{alias}` is never used"),
                ));
            }
        }

        for &id in &self.file.vars {
            let Decl::Var(var) = self.file.decl(id) else {
                continue;
            };
            if !var.common.is_used() {
                diags.add(Diagnostic::from_code(
                    &codes::E0902,
                    var.common.span,
                    format!("variable `{}` is never used", var.common.name),
                ));
            }
        }

        for &id in &self.file.functions {
            let Decl::Function(func) = self.file.decl(id) else {
                continue;
            };
            if func.common.name != "main" && !func.common.is_used() {
                diags.add(Diagnostic::from_code(
                    &codes::E0903,
                    func.common.span,
                    format!("function `{}` is never called", func.common.name),
                ));
            }
        }

        for &id in &self.file.types {
            let decl = self.file.decl(id);
            let common = decl.common();
            if !common.is_used() {
                diags.add(Diagnostic::from_code(
                    &codes::E0904,
                    common.span,
                    format!("type `{}` is never used", common.name),
                ));
            } else if common.is_public && !common.is_used_publicly() {
                diags.add(Diagnostic::from_code(
                    &codes::E0905,
                    common.span,
                    format!(
                        "public type `{}` is only ever used privately within its own package",
                        common.name
                    ),
                ));
            }
            if let Decl::StructType(s) = decl {
                for &member_id in &s.members {
                    let member = self.file.decl(member_id);
                    if !member.common().is_used() {
                        diags.add(Diagnostic::from_code(
                            &codes::E0906,
                            member.common().span,
                            format!(
                                "member `{}` of `{}` is never accessed",
                                member.common().name,
                                common.name
                            ),
                        ));
                    }
                }
            }
        }
    }

    /// `getExternals`: every cross-package declaration this file actually
    /// referenced, in first-use order.
    pub fn externals(&self) -> impl Iterator<Item = &(String, String)> {
        self.uses_scope.externals()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DeclCommon, FunctionDecl, Stmt, StmtKind, UseDecl, VarDecl};
    use crate::source::Span;
    use crate::types::{BuiltinType, FunctionSignature, QualType, Type};

    fn file_with(
        uses: Vec<Decl>,
        types: Vec<Decl>,
        vars: Vec<Decl>,
        functions: Vec<Decl>,
    ) -> File {
        let mut decls = Vec::new();
        let mut use_ids = Vec::new();
        let mut type_ids = Vec::new();
        let mut var_ids = Vec::new();
        let mut function_ids = Vec::new();
        for d in uses {
            use_ids.push(DeclId(decls.len() as u32));
            decls.push(d);
        }
        for d in types {
            type_ids.push(DeclId(decls.len() as u32));
            decls.push(d);
        }
        for d in vars {
            var_ids.push(DeclId(decls.len() as u32));
            decls.push(d);
        }
        for d in functions {
            function_ids.push(DeclId(decls.len() as u32));
            decls.push(d);
        }
        File {
            name: "t.c2".into(),
            package: "main".into(),
            decls,
            uses: use_ids,
            types: type_ids,
            vars: var_ids,
            functions: function_ids,
            array_values: Vec::new(),
        }
    }

    fn file_with_array_value(var: Decl, array_value: Decl) -> File {
        let decls = vec![var, array_value];
        File {
            name: "t.c2".into(),
            package: "main".into(),
            decls,
            uses: Vec::new(),
            types: Vec::new(),
            vars: vec![DeclId(0)],
            functions: Vec::new(),
            array_values: vec![DeclId(1)],
        }
    }

    fn int_elements(values: &[i64]) -> Vec<crate::ast::InitListElement> {
        values
            .iter()
            .map(|v| crate::ast::InitListElement {
                designator: None,
                value: Box::new(crate::ast::Expr::new(Span::new(0, 1), crate::ast::ExprKind::IntLiteral(*v))),
            })
            .collect()
    }

    #[test]
    fn array_value_sizes_an_incomplete_target_from_its_element_count() {
        let var = Decl::Var(VarDecl {
            common: DeclCommon::new("table", Span::new(0, 5), false),
            ty: QualType::unqualified(Type::Array {
                element: Box::new(QualType::unqualified(Type::Builtin(BuiltinType::I32))),
                size: None,
                resolved_size: None,
            }),
            init: None,
            is_local: false,
        });
        let array_value = Decl::ArrayValue(crate::ast::ArrayValueDecl {
            common: DeclCommon::new("table", Span::new(10, 20), false),
            target_name: "table".into(),
            target: std::cell::Cell::new(None),
            init: crate::ast::Expr::new(
                Span::new(10, 20),
                crate::ast::ExprKind::InitList(int_elements(&[1, 2, 3])),
            ),
        });
        let file = file_with_array_value(var, array_value);
        let pkgs = PackageMap::new();
        let mut analyser = FileAnalyser::new(&file, &pkgs);
        let mut diags = Diagnostics::new();
        analyser.analyse(&mut diags);

        assert!(!diags.has_errors());
        let Decl::Var(resolved) = file.decl(DeclId(0)) else {
            unreachable!()
        };
        assert_eq!(
            resolved.ty.canonical(),
            Some(Type::Array {
                element: Box::new(QualType::unqualified(Type::Builtin(BuiltinType::I32))),
                size: None,
                resolved_size: Some(3),
            })
        );
    }

    #[test]
    fn unknown_array_value_target_is_reported() {
        let var = Decl::Var(VarDecl {
            common: DeclCommon::new("table", Span::new(0, 5), false),
            ty: QualType::unqualified(Type::Array {
                element: Box::new(QualType::unqualified(Type::Builtin(BuiltinType::I32))),
                size: None,
                resolved_size: None,
            }),
            init: None,
            is_local: false,
        });
        let array_value = Decl::ArrayValue(crate::ast::ArrayValueDecl {
            common: DeclCommon::new("missing", Span::new(10, 20), false),
            target_name: "missing".into(),
            target: std::cell::Cell::new(None),
            init: crate::ast::Expr::new(
                Span::new(10, 20),
                crate::ast::ExprKind::InitList(int_elements(&[1])),
            ),
        });
        let file = file_with_array_value(var, array_value);
        let pkgs = PackageMap::new();
        let mut analyser = FileAnalyser::new(&file, &pkgs);
        let mut diags = Diagnostics::new();
        analyser.analyse(&mut diags);

        assert!(diags.iter().any(|d| d.code.as_deref() == Some("E0107")));
    }

    #[test]
    fn array_value_target_must_be_array_typed() {
        let var = Decl::Var(VarDecl {
            common: DeclCommon::new("count", Span::new(0, 5), false),
            ty: QualType::unqualified(Type::Builtin(BuiltinType::I32)),
            init: Some(crate::ast::Expr::new(Span::new(0, 1), crate::ast::ExprKind::IntLiteral(0))),
            is_local: false,
        });
        let array_value = Decl::ArrayValue(crate::ast::ArrayValueDecl {
            common: DeclCommon::new("count", Span::new(10, 20), false),
            target_name: "count".into(),
            target: std::cell::Cell::new(None),
            init: crate::ast::Expr::new(
                Span::new(10, 20),
                crate::ast::ExprKind::InitList(int_elements(&[1])),
            ),
        });
        let file = file_with_array_value(var, array_value);
        let pkgs = PackageMap::new();
        let mut analyser = FileAnalyser::new(&file, &pkgs);
        let mut diags = Diagnostics::new();
        analyser.analyse(&mut diags);

        assert!(diags.iter().any(|d| d.code.as_deref() == Some("E0306")));
    }

    #[test]
    fn unknown_package_use_is_reported() {
        let use_decl = Decl::Use(UseDecl {
            common: DeclCommon::new("io", Span::new(0, 2), false),
            package: "io".into(),
            alias: None,
        });
        let file = file_with(vec![use_decl], vec![], vec![], vec![]);
        let pkgs = PackageMap::new();
        let mut analyser = FileAnalyser::new(&file, &pkgs);
        let mut diags = Diagnostics::new();
        analyser.analyse(&mut diags);
        assert!(diags.iter().any(|d| d.code.as_deref() == Some("E0102")));
    }

    #[test]
    fn unused_top_level_variable_is_warned() {
        let var = Decl::Var(VarDecl {
            common: DeclCommon::new("count", Span::new(0, 5), false),
            ty: QualType::unqualified(Type::Builtin(BuiltinType::I32)),
            init: Some(crate::ast::Expr::new(
                Span::new(0, 1),
                crate::ast::ExprKind::IntLiteral(0),
            )),
            is_local: false,
        });
        let file = file_with(vec![], vec![], vec![var], vec![]);
        let pkgs = PackageMap::new();
        let mut analyser = FileAnalyser::new(&file, &pkgs);
        let mut diags = Diagnostics::new();
        analyser.analyse(&mut diags);
        assert!(diags.iter().any(|d| d.code.as_deref() == Some("E0902")));
    }

    #[test]
    fn main_is_exempt_from_the_unused_function_warning() {
        let func = Decl::Function(FunctionDecl {
            common: DeclCommon::new("main", Span::new(0, 4), true),
            signature: FunctionSignature {
                ret: Box::new(QualType::unqualified(Type::Builtin(BuiltinType::I32))),
                params: vec![],
                is_variadic: false,
            },
            body: Some(Stmt::new(
                Span::new(0, 1),
                StmtKind::Compound(vec![Stmt::new(
                    Span::new(0, 1),
                    StmtKind::Return(Some(crate::ast::Expr::new(
                        Span::new(0, 1),
                        crate::ast::ExprKind::IntLiteral(0),
                    ))),
                )]),
            )),
            struct_owner: None,
        });
        let file = file_with(vec![], vec![], vec![], vec![func]);
        let pkgs = PackageMap::new();
        let mut analyser = FileAnalyser::new(&file, &pkgs);
        let mut diags = Diagnostics::new();
        analyser.analyse(&mut diags);
        assert!(!diags.iter().any(|d| d.code.as_deref() == Some("E0903")));
    }

    #[test]
    fn cyclic_alias_is_reported_during_canonical_resolution() {
        use crate::ast::AliasTypeDecl;
        use std::cell::Cell;

        let alias = Decl::AliasType(AliasTypeDecl {
            common: DeclCommon::new("A", Span::new(0, 1), false),
            target: QualType::unqualified(Type::Alias(DeclId(0))),
            resolving: Cell::new(false),
        });
        let file = file_with(vec![], vec![alias], vec![], vec![]);
        let pkgs = PackageMap::new();
        let mut analyser = FileAnalyser::new(&file, &pkgs);
        let mut diags = Diagnostics::new();
        analyser.analyse(&mut diags);
        assert!(diags.iter().any(|d| d.code.as_deref() == Some("E0701")));
    }
}
