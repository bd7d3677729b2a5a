//! End-to-end scenarios exercising the full `analyse_file` entry point
//! against small hand-built ASTs. The alias-cycle and public-depends-on-
//! private scenarios live as unit tests in `file_analyser.rs` and
//! `type_resolver.rs` instead, since they construct an `AliasTypeDecl`,
//! whose cycle-detection flag is only constructible from within the crate.

use csema_core::ast::{
    Decl, DeclCommon, Expr, ExprKind, File, FunctionDecl, Stmt, StmtKind, UseDecl, VarDecl,
};
use csema_core::ids::DeclId;
use csema_core::pkgs::{ExportedDecl, ExportedDeclKind, PackageMap};
use csema_core::source::Span;
use csema_core::types::{BuiltinType, FunctionSignature, QualType, Qualifiers, Type};

fn int_literal(value: i64) -> Expr {
    Expr::new(Span::new(0, 1), ExprKind::IntLiteral(value))
}

#[test]
fn uninitialised_const_variable_is_reported() {
    // const i32 X;
    let var = Decl::Var(VarDecl {
        common: DeclCommon::new("X", Span::new(0, 1), false),
        ty: QualType::new(Type::Builtin(BuiltinType::I32), Qualifiers::CONST),
        init: None,
        is_local: false,
    });
    let file = File {
        name: "t.c2".into(),
        package: "main".into(),
        decls: vec![var],
        uses: vec![],
        types: vec![],
        vars: vec![DeclId(0)],
        functions: vec![],
        array_values: vec![],
    };
    let pkgs = PackageMap::new();
    let (_, diags) = csema_core::analyse_file(&file, &pkgs);

    assert_eq!(diags.error_count(), 1);
    assert!(diags.iter().any(|d| d.code.as_deref() == Some("E0602")));
}

#[test]
fn defer_order_on_return_is_innermost_first() {
    // int main() { defer A; { defer B; return 0; } }
    let defer_a = Stmt::new(
        Span::new(0, 1),
        StmtKind::Defer(Box::new(Stmt::new(
            Span::new(0, 1),
            StmtKind::Expr(int_literal(0)),
        ))),
    );
    let defer_b = Stmt::new(
        Span::new(0, 1),
        StmtKind::Defer(Box::new(Stmt::new(
            Span::new(0, 1),
            StmtKind::Expr(int_literal(0)),
        ))),
    );
    let inner_return = Stmt::new(Span::new(10, 18), StmtKind::Return(Some(int_literal(0))));
    let inner_block = Stmt::new(
        Span::new(5, 20),
        StmtKind::Compound(vec![defer_b, inner_return]),
    );
    let body = Stmt::new(Span::new(0, 20), StmtKind::Compound(vec![defer_a, inner_block]));

    let func = Decl::Function(FunctionDecl {
        common: DeclCommon::new("main", Span::new(0, 4), true),
        signature: FunctionSignature {
            ret: Box::new(QualType::unqualified(Type::Builtin(BuiltinType::I32))),
            params: vec![],
            is_variadic: false,
        },
        body: Some(body),
        struct_owner: None,
    });
    let file = File {
        name: "t.c2".into(),
        package: "main".into(),
        decls: vec![func],
        uses: vec![],
        types: vec![],
        vars: vec![],
        functions: vec![DeclId(0)],
        array_values: vec![],
    };
    let pkgs = PackageMap::new();
    let (analysis, diags) = csema_core::analyse_file(&file, &pkgs);

    assert!(!diags.has_errors());
    let (_, function_analysis) = &analysis.function_analyses[0];
    assert_eq!(function_analysis.returns.len(), 1);
    let defers: Vec<usize> = function_analysis.returns[0].defers.iter().map(|d| d.0).collect();
    assert_eq!(defers, vec![1, 0], "B (registered second) must run before A");
}

#[test]
fn break_does_not_run_defers_registered_after_it() {
    // int main() { for (;;) { defer A; if (1) break; defer B; } return 0; }
    let defer_a = Stmt::new(
        Span::new(0, 1),
        StmtKind::Defer(Box::new(Stmt::new(
            Span::new(0, 1),
            StmtKind::Expr(int_literal(0)),
        ))),
    );
    let defer_b = Stmt::new(
        Span::new(0, 1),
        StmtKind::Defer(Box::new(Stmt::new(
            Span::new(0, 1),
            StmtKind::Expr(int_literal(0)),
        ))),
    );
    let break_stmt = Stmt::new(Span::new(30, 35), StmtKind::Break);
    let if_break = Stmt::new(
        Span::new(20, 35),
        StmtKind::If {
            cond: int_literal(1),
            then_branch: Box::new(break_stmt),
            else_branch: None,
        },
    );
    let loop_body = Stmt::new(
        Span::new(0, 40),
        StmtKind::Compound(vec![defer_a, if_break, defer_b]),
    );
    let for_stmt = Stmt::new(
        Span::new(0, 40),
        StmtKind::For {
            init: None,
            cond: None,
            step: None,
            body: Box::new(loop_body),
        },
    );
    let ret = Stmt::new(Span::new(40, 48), StmtKind::Return(Some(int_literal(0))));
    let body = Stmt::new(Span::new(0, 48), StmtKind::Compound(vec![for_stmt, ret]));

    let func = Decl::Function(FunctionDecl {
        common: DeclCommon::new("main", Span::new(0, 4), true),
        signature: FunctionSignature {
            ret: Box::new(QualType::unqualified(Type::Builtin(BuiltinType::I32))),
            params: vec![],
            is_variadic: false,
        },
        body: Some(body),
        struct_owner: None,
    });
    let file = File {
        name: "t.c2".into(),
        package: "main".into(),
        decls: vec![func],
        uses: vec![],
        types: vec![],
        vars: vec![],
        functions: vec![DeclId(0)],
        array_values: vec![],
    };
    let pkgs = PackageMap::new();
    let (analysis, diags) = csema_core::analyse_file(&file, &pkgs);

    assert!(!diags.has_errors());
    let (_, function_analysis) = &analysis.function_analyses[0];
    assert_eq!(function_analysis.breaks.len(), 1);
    let defers: Vec<usize> = function_analysis.breaks[0].defers.iter().map(|d| d.0).collect();
    assert_eq!(defers, vec![0], "B is not yet entered when the break runs");
}

#[test]
fn unused_import_is_a_single_warning_with_no_errors() {
    // use foo;
    let mut pkgs = PackageMap::new();
    pkgs.insert(ExportedDecl {
        package: "foo".into(),
        name: "bar".into(),
        kind: ExportedDeclKind::Function(FunctionSignature {
            ret: Box::new(QualType::unqualified(Type::Builtin(BuiltinType::Void))),
            params: vec![],
            is_variadic: false,
        }),
        is_public: true,
    });

    let use_decl = Decl::Use(UseDecl {
        common: DeclCommon::new("foo", Span::new(0, 7), false),
        package: "foo".into(),
        alias: None,
    });
    let file = File {
        name: "t.c2".into(),
        package: "main".into(),
        decls: vec![use_decl],
        uses: vec![DeclId(0)],
        types: vec![],
        vars: vec![],
        functions: vec![],
        array_values: vec![],
    };
    let (_, diags) = csema_core::analyse_file(&file, &pkgs);

    assert!(!diags.has_errors());
    assert_eq!(
        diags.iter().filter(|d| d.code.as_deref() == Some("E0901")).count(),
        1
    );
}

#[test]
fn analysing_the_same_file_twice_yields_identical_diagnostics() {
    let var = Decl::Var(VarDecl {
        common: DeclCommon::new("count", Span::new(0, 5), false),
        ty: QualType::unqualified(Type::Builtin(BuiltinType::I32)),
        init: Some(int_literal(0)),
        is_local: false,
    });
    let file = File {
        name: "t.c2".into(),
        package: "main".into(),
        decls: vec![var],
        uses: vec![],
        types: vec![],
        vars: vec![DeclId(0)],
        functions: vec![],
        array_values: vec![],
    };
    let pkgs = PackageMap::new();

    let (_, first) = csema_core::analyse_file(&file, &pkgs);
    let (_, second) = csema_core::analyse_file(&file, &pkgs);

    let first_codes: Vec<_> = first.iter().map(|d| d.code.clone()).collect();
    let second_codes: Vec<_> = second.iter().map(|d| d.code.clone()).collect();
    assert_eq!(first_codes, second_codes);
}
