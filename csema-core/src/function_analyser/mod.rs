//! Statement and expression analysis for one function body at a time.
//!
//! Maintains the current scope, the defer walk, the label table, and a
//! bounded call-depth counter for nested struct-member expression chains —
//! the same state the original `FunctionAnalyser` keeps, expressed with
//! index-based handles instead of owning pointers. Function parameters have
//! no arena `DeclId` of their own, so they resolve through a side table
//! instead of through `Scope`.

pub mod defer_walk;

use std::collections::{HashMap, HashSet};

use crate::ast::{
    BinaryOp, Decl, Expr, ExprKind, File, FunctionDecl, Stmt, StmtKind, SwitchCase, UnaryOp,
};
use crate::diagnostic::{codes, Diagnostic, Diagnostics};
use crate::expr_type_analyser;
use crate::ids::{DeclId, LabelId};
use crate::pkgs::PackageMap;
use crate::scope::{Resolved, Scope};
use crate::source::Span;
use crate::type_resolver::TypeResolver;
use crate::types::{QualType, Type};

use defer_walk::DeferWalk;

/// `MAX_STRUCT_INDIRECTION_DEPTH`: bounds nested struct-function member
/// expression chains so a malformed or adversarial AST cannot blow the
/// analyser's own call stack.
pub const MAX_STRUCT_INDIRECTION_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    LValue,
    RValue,
}

/// Everything the defer walk produced for one function body, keyed by the
/// span of the transferring statement.
#[derive(Debug, Default)]
pub struct FunctionAnalysis {
    pub returns: Vec<defer_walk::DeferResolution>,
    pub breaks: Vec<defer_walk::DeferResolution>,
    pub continues: Vec<defer_walk::DeferResolution>,
    pub gotos: Vec<defer_walk::DeferResolution>,
}

pub struct FunctionAnalyser<'f> {
    file: &'f File,
    current_package: &'f str,
    pkgs: &'f PackageMap,
    type_resolver: TypeResolver,
    scope: Scope,
    defer_walk: DeferWalk,
    /// Parameters are not entries in the file's declaration arena, so they
    /// are resolved through this side table instead of through `Scope`.
    params: HashMap<String, QualType>,
    labels: HashMap<String, LabelId>,
    declared_labels: HashSet<String>,
    pending_gotos: Vec<(String, Span)>,
    next_label_id: u32,
    break_anchors: u32,
    continue_anchors: u32,
    defer_nesting: u32,
    struct_call_depth: usize,
    /// Number of defers registered directly in each currently-open compound
    /// scope, innermost last. A defer stays active until the compound it was
    /// written in pops, not just for the extent of its own body.
    defer_frame_stack: Vec<u32>,
}

impl<'f> FunctionAnalyser<'f> {
    pub fn new(file: &'f File, current_package: &'f str, pkgs: &'f PackageMap) -> Self {
        Self {
            file,
            current_package,
            pkgs,
            type_resolver: TypeResolver::new(),
            scope: Scope::new(),
            defer_walk: DeferWalk::new(),
            params: HashMap::new(),
            labels: HashMap::new(),
            declared_labels: HashSet::new(),
            pending_gotos: Vec::new(),
            next_label_id: 0,
            break_anchors: 0,
            continue_anchors: 0,
            defer_nesting: 0,
            struct_call_depth: 0,
            defer_frame_stack: Vec::new(),
        }
    }

    pub fn check(&mut self, func: &FunctionDecl, diags: &mut Diagnostics) -> FunctionAnalysis {
        for param in &func.signature.params {
            self.params.insert(param.name.clone(), param.ty.clone());
        }
        self.scope.push_frame();
        if let Some(body) = &func.body {
            self.analyse_stmt(body, &func.signature.ret, diags);
        }
        self.scope.pop_frame();

        for (name, span) in self.pending_gotos.drain(..) {
            if !self.declared_labels.contains(&name) {
                diags.add(Diagnostic::from_code(
                    &codes::E0403,
                    span,
                    format!("goto target `{name}` does not resolve to any label in this function"),
                ));
            }
        }

        FunctionAnalysis {
            returns: self.defer_walk.analyse_return(),
            breaks: self.defer_walk.analyse_break(),
            continues: self.defer_walk.analyse_continue(),
            gotos: self.defer_walk.analyse_goto(diags),
        }
    }

    fn fresh_label_id(&mut self) -> LabelId {
        let id = LabelId(self.next_label_id);
        self.next_label_id += 1;
        id
    }

    /// The stable id for a label name, allocated on first mention whether
    /// that mention is the label's declaration or a forward `goto`.
    fn label_id_for(&mut self, name: &str) -> LabelId {
        if let Some(id) = self.labels.get(name) {
            *id
        } else {
            let id = self.fresh_label_id();
            self.labels.insert(name.to_string(), id);
            id
        }
    }

    // ---- statements ----------------------------------------------------

    fn analyse_stmt(&mut self, stmt: &Stmt, return_ty: &QualType, diags: &mut Diagnostics) {
        match &stmt.kind {
            StmtKind::Compound(children) => {
                self.scope.push_frame();
                self.defer_frame_stack.push(0);
                for child in children {
                    self.analyse_stmt(child, return_ty, diags);
                }
                let deferred = self.defer_frame_stack.pop().unwrap_or(0);
                for _ in 0..deferred {
                    self.defer_walk.exit_defer();
                }
                self.scope.pop_frame();
            }
            StmtKind::Expr(expr) => {
                self.analyse_expr(expr, Side::RValue, diags);
            }
            StmtKind::Declaration(id) => self.analyse_declaration(*id, diags),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.require_bool_convertible(cond, diags);
                self.analyse_stmt(then_branch, return_ty, diags);
                if let Some(else_branch) = else_branch {
                    self.analyse_stmt(else_branch, return_ty, diags);
                }
            }
            StmtKind::While { cond, body } => {
                self.require_bool_convertible(cond, diags);
                self.defer_walk.break_continue_start();
                self.break_anchors += 1;
                self.continue_anchors += 1;
                self.analyse_stmt(body, return_ty, diags);
                self.continue_anchors -= 1;
                self.break_anchors -= 1;
                self.defer_walk.break_continue_end();
            }
            StmtKind::Do { body, cond } => {
                self.defer_walk.break_continue_start();
                self.break_anchors += 1;
                self.continue_anchors += 1;
                self.analyse_stmt(body, return_ty, diags);
                self.continue_anchors -= 1;
                self.break_anchors -= 1;
                self.defer_walk.break_continue_end();
                self.require_bool_convertible(cond, diags);
            }
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                self.scope.push_frame();
                self.defer_frame_stack.push(0);
                if let Some(init) = init {
                    self.analyse_stmt(init, return_ty, diags);
                }
                if let Some(cond) = cond {
                    self.require_bool_convertible(cond, diags);
                }
                if let Some(step) = step {
                    self.analyse_expr(step, Side::RValue, diags);
                }
                self.defer_walk.break_continue_start();
                self.break_anchors += 1;
                self.continue_anchors += 1;
                self.analyse_stmt(body, return_ty, diags);
                self.continue_anchors -= 1;
                self.break_anchors -= 1;
                self.defer_walk.break_continue_end();
                let deferred = self.defer_frame_stack.pop().unwrap_or(0);
                for _ in 0..deferred {
                    self.defer_walk.exit_defer();
                }
                self.scope.pop_frame();
            }
            StmtKind::Switch {
                discriminant,
                cases,
                is_sealed,
            } => self.analyse_switch(discriminant, cases, *is_sealed, return_ty, diags),
            StmtKind::Break => {
                if self.break_anchors == 0 {
                    diags.add(Diagnostic::from_code(
                        &codes::E0401,
                        stmt.span,
                        "`break` with no enclosing loop or switch",
                    ));
                }
                self.defer_walk.record_break(stmt.span);
            }
            StmtKind::Continue => {
                if self.continue_anchors == 0 {
                    diags.add(Diagnostic::from_code(
                        &codes::E0402,
                        stmt.span,
                        "`continue` with no enclosing loop",
                    ));
                }
                self.defer_walk.record_continue(stmt.span);
            }
            StmtKind::Label { name, id, body } => {
                let label_id = self.label_id_for(name);
                id.set(Some(label_id));
                if !self.declared_labels.insert(name.clone()) {
                    diags.add(Diagnostic::from_code(
                        &codes::E0404,
                        stmt.span,
                        format!("label `{name}` is declared more than once"),
                    ));
                }
                self.defer_walk.label(label_id);
                self.analyse_stmt(body, return_ty, diags);
            }
            StmtKind::Goto { name, target } => {
                let label_id = self.label_id_for(name);
                target.set(Some(label_id));
                self.pending_gotos.push((name.clone(), stmt.span));
                self.defer_walk.goto(label_id, stmt.span);
            }
            StmtKind::Return(value) => {
                match value {
                    Some(expr) => {
                        let ty = self.analyse_expr(expr, Side::RValue, diags);
                        expr_type_analyser::check_assignable(&return_ty.ty, &ty, expr.span, diags);
                    }
                    None => {}
                }
                if self.defer_nesting > 0 {
                    diags.add(Diagnostic::from_code(
                        &codes::E0502,
                        stmt.span,
                        "`return` inside a `defer` body escapes the defer",
                    ));
                }
                self.defer_walk.record_return(stmt.span);
            }
            StmtKind::Defer(body) => {
                self.defer_nesting += 1;
                let span = stmt.span;
                if self.defer_nesting > 1 {
                    diags.add(Diagnostic::from_code(
                        &codes::E0501,
                        span,
                        "`defer` statements cannot be nested",
                    ));
                }
                if self.defer_walk.push_defer(span, diags).is_some() {
                    self.analyse_stmt(body, return_ty, diags);
                    if let Some(top) = self.defer_frame_stack.last_mut() {
                        *top += 1;
                    } else {
                        // No enclosing compound frame (malformed body); exit
                        // immediately rather than leak it as active forever.
                        self.defer_walk.exit_defer();
                    }
                }
                self.defer_nesting -= 1;
            }
            StmtKind::Asm(_) => {}
        }
    }

    fn analyse_declaration(&mut self, id: DeclId, diags: &mut Diagnostics) {
        let Decl::Var(var) = self.file.decl(id) else {
            return;
        };
        let canonical = self
            .type_resolver
            .resolve_canonicals(self.file, &var.ty, var.common.span, diags);
        if var.ty.is_const() && var.init.is_none() {
            diags.add(Diagnostic::from_code(
                &codes::E0602,
                var.common.span,
                format!("const variable `{}` has no initialiser", var.common.name),
            ));
        }
        if let Some(init) = &var.init {
            let init_ty = self.analyse_expr(init, Side::RValue, diags);
            expr_type_analyser::check_assignable(&canonical, &init_ty, init.span, diags);
        }
        if let Err(err) = self.scope.insert_local(&var.common.name, id) {
            let existing = self.file.decl(err.existing);
            diags.add(Diagnostic::from_code(
                &codes::E0105,
                var.common.span,
                format!(
                    "`{}` collides with another binding named `{}`",
                    var.common.name,
                    existing.name()
                ),
            ));
        }
    }

    fn analyse_switch(
        &mut self,
        discriminant: &Expr,
        cases: &[SwitchCase],
        is_sealed: bool,
        return_ty: &QualType,
        diags: &mut Diagnostics,
    ) {
        let scrutinee_ty = self.analyse_expr(discriminant, Side::RValue, diags);
        self.defer_walk.break_start();
        self.break_anchors += 1;

        let mut default_seen = false;
        let mut covered_enum_constants = HashSet::new();
        for case in cases {
            if case.values.is_empty() {
                if default_seen {
                    diags.add(Diagnostic::from_code(
                        &codes::E0406,
                        case.span,
                        "a `switch` may declare at most one `default` case",
                    ));
                }
                default_seen = true;
            }
            for value in &case.values {
                let value_ty = self.analyse_expr(value, Side::RValue, diags);
                expr_type_analyser::check_assignable(&scrutinee_ty, &value_ty, value.span, diags);
                if !expr_type_analyser::is_constant_foldable(value) {
                    diags.add(Diagnostic::from_code(
                        &codes::E0201,
                        value.span,
                        "case label must be a constant expression",
                    ));
                }
                if let ExprKind::Identifier { name, .. } = &value.kind {
                    covered_enum_constants.insert(name.clone());
                }
            }
            self.scope.push_frame();
            for stmt in &case.body {
                self.analyse_stmt(stmt, return_ty, diags);
            }
            self.scope.pop_frame();
        }

        if is_sealed {
            if let Type::Enum(enum_id) = &scrutinee_ty {
                if let Decl::EnumType(enum_decl) = self.file.decl(*enum_id) {
                    let all_covered = enum_decl.constants.iter().all(|c| {
                        covered_enum_constants.contains(self.file.decl(*c).name())
                    });
                    if !all_covered && !default_seen {
                        diags.add(Diagnostic::from_code(
                            &codes::E0407,
                            discriminant.span,
                            "switch over an enum does not cover every constant and has no default",
                        ));
                    }
                }
            }
        }

        self.break_anchors -= 1;
        self.defer_walk.break_end();
    }

    fn require_bool_convertible(&mut self, expr: &Expr, diags: &mut Diagnostics) -> Type {
        let ty = self.analyse_expr(expr, Side::RValue, diags);
        if !matches!(ty, Type::Builtin(crate::types::BuiltinType::Bool) | Type::Error)
            && !matches!(ty, Type::Builtin(b) if b.is_integer())
            && !matches!(ty, Type::Pointer(_))
        {
            diags.add(Diagnostic::from_code(
                &codes::E0205,
                expr.span,
                "condition is not convertible to bool",
            ));
        }
        ty
    }

    // ---- expressions -----------------------------------------------------

    fn analyse_expr(&mut self, expr: &Expr, side: Side, diags: &mut Diagnostics) -> Type {
        let ty = self.infer_expr(expr, side, diags);
        expr.set_resolved_type(QualType::unqualified(ty.clone()));
        ty
    }

    fn infer_expr(&mut self, expr: &Expr, side: Side, diags: &mut Diagnostics) -> Type {
        match &expr.kind {
            ExprKind::IntLiteral(v) => expr_type_analyser::smallest_fitting_int(*v),
            ExprKind::CharLiteral(_) => Type::Builtin(crate::types::BuiltinType::Char),
            ExprKind::BoolLiteral(_) => Type::Builtin(crate::types::BuiltinType::Bool),
            ExprKind::StringLiteral(_) => Type::Pointer(Box::new(QualType::new(
                Type::Builtin(crate::types::BuiltinType::Char),
                crate::types::Qualifiers::CONST,
            ))),
            ExprKind::Identifier { name, decl } => self.resolve_identifier(name, decl, expr.span, diags),
            ExprKind::Unary { op, operand } => self.infer_unary(*op, operand, expr.span, diags),
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs_ty = self.analyse_expr(lhs, Side::RValue, diags);
                let rhs_ty = self.analyse_expr(rhs, Side::RValue, diags);
                expr_type_analyser::infer_binary_op_type(*op, &lhs_ty, &rhs_ty, expr.span, diags)
            }
            ExprKind::Assign {
                compound_op,
                target,
                value,
            } => self.infer_assign(*compound_op, target, value, expr.span, diags),
            ExprKind::Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                self.require_bool_convertible(cond, diags);
                let then_ty = self.analyse_expr(then_branch, Side::RValue, diags);
                let else_ty = self.analyse_expr(else_branch, Side::RValue, diags);
                if then_ty == else_ty {
                    then_ty
                } else {
                    expr_type_analyser::check_assignable(&then_ty, &else_ty, expr.span, diags);
                    then_ty
                }
            }
            ExprKind::Call { callee, args } => self.infer_call(callee, args, expr.span, diags),
            ExprKind::Member {
                base,
                member,
                member_decl,
                ..
            } => self.infer_member(base, member, member_decl, expr.span, diags),
            ExprKind::Subscript { base, index } => self.infer_subscript(base, index, expr.span, diags),
            ExprKind::Paren(inner) => self.analyse_expr(inner, side, diags),
            ExprKind::Cast { target, operand } => {
                self.analyse_expr(operand, Side::RValue, diags);
                target.ty.clone()
            }
            ExprKind::InitList(elements) => {
                for element in elements {
                    self.analyse_expr(&element.value, Side::RValue, diags);
                }
                Type::Error
            }
            ExprKind::Builtin(builtin) => self.infer_builtin(builtin, expr.span, diags),
        }
    }

    fn resolve_identifier(
        &mut self,
        name: &str,
        decl_cell: &std::cell::Cell<Option<DeclId>>,
        span: Span,
        diags: &mut Diagnostics,
    ) -> Type {
        if let Some(ty) = self.params.get(name) {
            return ty.ty.clone();
        }
        match self
            .scope
            .lookup(name, self.file, self.current_package, self.pkgs)
        {
            Some(Resolved::Local(id, _tier)) => {
                decl_cell.set(Some(id));
                let decl = self.file.decl(id);
                decl.common().mark_used();
                decl_type(decl)
            }
            Some(Resolved::Package(exported)) => {
                self.scope.record_external(&exported.package, &exported.name);
                exported_type(exported)
            }
            None => {
                diags.add(Diagnostic::from_code(
                    &codes::E0101,
                    span,
                    format!("`{name}` does not resolve to any declaration"),
                ));
                Type::Error
            }
        }
    }

    fn infer_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span, diags: &mut Diagnostics) -> Type {
        let side = if matches!(op, UnaryOp::AddrOf | UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec) {
            Side::LValue
        } else {
            Side::RValue
        };
        if matches!(op, UnaryOp::AddrOf) && !operand.is_lvalue_shape() {
            diags.add(Diagnostic::from_code(
                &codes::E0301,
                span,
                "`&` requires an addressable operand",
            ));
        }
        let operand_ty = self.analyse_expr(operand, side, diags);
        expr_type_analyser::infer_unary_op_type(op, &operand_ty, span, diags)
    }

    fn infer_assign(
        &mut self,
        compound_op: Option<BinaryOp>,
        target: &Expr,
        value: &Expr,
        span: Span,
        diags: &mut Diagnostics,
    ) -> Type {
        if !target.is_lvalue_shape() {
            diags.add(Diagnostic::from_code(
                &codes::E0301,
                target.span,
                "left-hand side of an assignment must be an lvalue",
            ));
        }
        let target_ty = self.analyse_expr(target, Side::LValue, diags);
        if self.target_is_const(target) {
            diags.add(Diagnostic::from_code(
                &codes::E0601,
                span,
                "assignment to a const-qualified lvalue",
            ));
        }
        let value_ty = self.analyse_expr(value, Side::RValue, diags);
        let value_ty = match compound_op {
            Some(op) => expr_type_analyser::infer_binary_op_type(op, &target_ty, &value_ty, span, diags),
            None => value_ty,
        };
        expr_type_analyser::check_assignable(&target_ty, &value_ty, span, diags);
        target_ty
    }

    fn target_is_const(&self, target: &Expr) -> bool {
        if let ExprKind::Identifier { decl, .. } = &target.kind {
            if let Some(id) = decl.get() {
                if let Decl::Var(var) = self.file.decl(id) {
                    return var.ty.is_const();
                }
            }
        }
        false
    }

    fn infer_call(&mut self, callee: &Expr, args: &[Expr], span: Span, diags: &mut Diagnostics) -> Type {
        let ExprKind::Identifier { name, decl } = &callee.kind else {
            for arg in args {
                self.analyse_expr(arg, Side::RValue, diags);
            }
            diags.add(Diagnostic::from_code(
                &codes::E0303,
                callee.span,
                "callee is not a function declaration",
            ));
            return Type::Error;
        };
        let resolved = self
            .scope
            .lookup(name, self.file, self.current_package, self.pkgs);
        let (ret_ty, param_tys, is_variadic) = match resolved {
            Some(Resolved::Local(id, _)) => {
                decl.set(Some(id));
                match self.file.decl(id) {
                    Decl::Function(f) => {
                        f.common.mark_used();
                        (
                            f.signature.ret.ty.clone(),
                            f.signature.params.iter().map(|p| p.ty.ty.clone()).collect::<Vec<_>>(),
                            f.signature.is_variadic,
                        )
                    }
                    _ => {
                        diags.add(Diagnostic::from_code(
                            &codes::E0303,
                            callee.span,
                            format!("`{name}` is not callable"),
                        ));
                        (Type::Error, Vec::new(), true)
                    }
                }
            }
            Some(Resolved::Package(exported)) => {
                self.scope.record_external(&exported.package, &exported.name);
                match &exported.kind {
                    crate::pkgs::ExportedDeclKind::Function(sig) => (
                        sig.ret.ty.clone(),
                        sig.params.iter().map(|p| p.ty.ty.clone()).collect::<Vec<_>>(),
                        sig.is_variadic,
                    ),
                    _ => {
                        diags.add(Diagnostic::from_code(
                            &codes::E0303,
                            callee.span,
                            format!("`{name}` is not callable"),
                        ));
                        (Type::Error, Vec::new(), true)
                    }
                }
            }
            None => {
                diags.add(Diagnostic::from_code(
                    &codes::E0101,
                    callee.span,
                    format!("`{name}` does not resolve to any declaration"),
                ));
                (Type::Error, Vec::new(), true)
            }
        };

        if !is_variadic && args.len() != param_tys.len() {
            diags.add(Diagnostic::from_code(
                &codes::E0304,
                span,
                format!(
                    "expected {} argument(s), found {}",
                    param_tys.len(),
                    args.len()
                ),
            ));
        }
        for (i, arg) in args.iter().enumerate() {
            let arg_ty = self.analyse_expr(arg, Side::RValue, diags);
            if let Some(param_ty) = param_tys.get(i) {
                expr_type_analyser::check_assignable(param_ty, &arg_ty, arg.span, diags);
            }
        }
        ret_ty
    }

    fn infer_member(
        &mut self,
        base: &Expr,
        member: &str,
        member_decl: &std::cell::Cell<Option<DeclId>>,
        span: Span,
        diags: &mut Diagnostics,
    ) -> Type {
        self.struct_call_depth += 1;
        if self.struct_call_depth > MAX_STRUCT_INDIRECTION_DEPTH {
            diags.add(Diagnostic::from_code(
                &codes::E0802,
                span,
                format!(
                    "struct member access nesting exceeds {MAX_STRUCT_INDIRECTION_DEPTH}"
                ),
            ));
            self.struct_call_depth -= 1;
            return Type::Error;
        }
        let base_ty = self.analyse_expr(base, Side::RValue, diags);
        self.struct_call_depth -= 1;

        let struct_id = match &base_ty {
            Type::Struct(id) => Some(*id),
            Type::Pointer(inner) => match &inner.ty {
                Type::Struct(id) => Some(*id),
                _ => None,
            },
            _ => None,
        };
        let Some(struct_id) = struct_id else {
            diags.add(Diagnostic::from_code(
                &codes::E0106,
                span,
                format!("`{member}` is not a member of a struct or union type"),
            ));
            return Type::Error;
        };
        let Decl::StructType(struct_decl) = self.file.decl(struct_id) else {
            return Type::Error;
        };
        let found = struct_decl
            .members
            .iter()
            .find(|id| self.file.decl(**id).name() == member);
        match found {
            Some(id) => {
                member_decl.set(Some(*id));
                let decl = self.file.decl(*id);
                decl.common().mark_used();
                decl_type(decl)
            }
            None => {
                diags.add(Diagnostic::from_code(
                    &codes::E0106,
                    span,
                    format!("no member named `{member}` on this struct"),
                ));
                Type::Error
            }
        }
    }

    fn infer_subscript(&mut self, base: &Expr, index: &Expr, span: Span, diags: &mut Diagnostics) -> Type {
        let base_ty = self.analyse_expr(base, Side::RValue, diags);
        let index_ty = self.analyse_expr(index, Side::RValue, diags);
        if !matches!(index_ty, Type::Builtin(b) if b.is_integer()) {
            diags.add(Diagnostic::from_code(
                &codes::E0205,
                index.span,
                "subscript index must be an integer",
            ));
        }
        match base_ty {
            Type::Array { element, .. } => element.ty.clone(),
            Type::Pointer(element) => element.ty.clone(),
            _ => {
                diags.add(Diagnostic::from_code(
                    &codes::E0305,
                    span,
                    "subscript base is neither an array nor a pointer",
                ));
                Type::Error
            }
        }
    }

    fn infer_builtin(
        &mut self,
        builtin: &crate::ast::BuiltinExpr,
        span: Span,
        diags: &mut Diagnostics,
    ) -> Type {
        use crate::ast::{BuiltinExpr, SizeOfOperand};
        match builtin {
            BuiltinExpr::SizeOf(operand) => {
                match operand {
                    SizeOfOperand::Type(_) => {}
                    SizeOfOperand::Expr(expr) => {
                        self.analyse_expr(expr, Side::RValue, diags);
                    }
                }
                Type::Builtin(crate::types::BuiltinType::U64)
            }
            BuiltinExpr::ElemsOf(expr) => {
                self.analyse_expr(expr, Side::RValue, diags);
                Type::Builtin(crate::types::BuiltinType::U64)
            }
            BuiltinExpr::EnumMin(expr) | BuiltinExpr::EnumMax(expr) => {
                self.analyse_expr(expr, Side::RValue, diags);
                Type::Builtin(crate::types::BuiltinType::I32)
            }
            BuiltinExpr::BitOffsetOf { base, .. } => {
                self.analyse_expr(base, Side::RValue, diags);
                let _ = span;
                Type::Builtin(crate::types::BuiltinType::U64)
            }
        }
    }
}

fn decl_type(decl: &Decl) -> Type {
    match decl {
        Decl::Var(v) => v.ty.ty.clone(),
        Decl::Function(f) => Type::Function(f.signature.clone()),
        Decl::EnumConstant(_) => Type::Error,
        Decl::AliasType(_) | Decl::StructType(_) | Decl::EnumType(_) | Decl::FunctionType(_) => {
            Type::Error
        }
        Decl::ArrayValue(_) | Decl::Use(_) => Type::Error,
    }
}

fn exported_type(exported: &crate::pkgs::ExportedDecl) -> Type {
    match &exported.kind {
        crate::pkgs::ExportedDeclKind::Type(qt) => qt.ty.clone(),
        crate::pkgs::ExportedDeclKind::Function(sig) => Type::Function(sig.clone()),
        crate::pkgs::ExportedDeclKind::Variable(qt) => qt.ty.clone(),
        crate::pkgs::ExportedDeclKind::EnumConstant(qt) => qt.ty.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DeclCommon, FunctionDecl, VarDecl};
    use crate::source::Span;
    use crate::types::{BuiltinType, FunctionSignature, QualType, Type};
    use std::cell::Cell;

    fn empty_file() -> File {
        File {
            name: "t.c2".into(),
            package: "main".into(),
            decls: Vec::new(),
            uses: Vec::new(),
            types: Vec::new(),
            vars: Vec::new(),
            functions: Vec::new(),
            array_values: Vec::new(),
        }
    }

    #[test]
    fn break_outside_loop_is_an_error() {
        let file = empty_file();
        let pkgs = PackageMap::new();
        let mut analyser = FunctionAnalyser::new(&file, "main", &pkgs);
        let mut diags = Diagnostics::new();
        let body = Stmt::new(
            Span::new(0, 1),
            StmtKind::Compound(vec![Stmt::new(Span::new(0, 1), StmtKind::Break)]),
        );
        let func = FunctionDecl {
            common: DeclCommon::new("f", Span::new(0, 1), false),
            signature: FunctionSignature {
                ret: Box::new(QualType::unqualified(Type::Builtin(BuiltinType::Void))),
                params: vec![],
                is_variadic: false,
            },
            body: Some(body),
            struct_owner: None,
        };
        analyser.check(&func, &mut diags);
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn return_value_must_be_assignable_to_the_declared_return_type() {
        let file = empty_file();
        let pkgs = PackageMap::new();
        let mut analyser = FunctionAnalyser::new(&file, "main", &pkgs);
        let mut diags = Diagnostics::new();
        let huge = Expr::new(Span::new(0, 1), ExprKind::IntLiteral(1_i64 << 40));
        let body = Stmt::new(
            Span::new(0, 1),
            StmtKind::Compound(vec![Stmt::new(Span::new(0, 1), StmtKind::Return(Some(huge)))]),
        );
        let func = FunctionDecl {
            common: DeclCommon::new("f", Span::new(0, 1), false),
            signature: FunctionSignature {
                ret: Box::new(QualType::unqualified(Type::Builtin(BuiltinType::I32))),
                params: vec![],
                is_variadic: false,
            },
            body: Some(body),
            struct_owner: None,
        };
        analyser.check(&func, &mut diags);
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn unknown_identifier_is_reported() {
        let file = empty_file();
        let pkgs = PackageMap::new();
        let mut analyser = FunctionAnalyser::new(&file, "main", &pkgs);
        let mut diags = Diagnostics::new();
        let ident = Expr::new(
            Span::new(0, 1),
            ExprKind::Identifier {
                name: "missing".into(),
                decl: Cell::new(None),
            },
        );
        let body = Stmt::new(
            Span::new(0, 1),
            StmtKind::Compound(vec![Stmt::new(Span::new(0, 1), StmtKind::Expr(ident))]),
        );
        let func = FunctionDecl {
            common: DeclCommon::new("f", Span::new(0, 1), false),
            signature: FunctionSignature {
                ret: Box::new(QualType::unqualified(Type::Builtin(BuiltinType::Void))),
                params: vec![],
                is_variadic: false,
            },
            body: Some(body),
            struct_owner: None,
        };
        analyser.check(&func, &mut diags);
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn const_variable_without_initialiser_errors() {
        let mut file = empty_file();
        file.decls.push(Decl::Var(VarDecl {
            common: DeclCommon::new("x", Span::new(0, 1), false),
            ty: QualType::new(Type::Builtin(BuiltinType::I32), crate::types::Qualifiers::CONST),
            init: None,
            is_local: true,
        }));
        let pkgs = PackageMap::new();
        let mut analyser = FunctionAnalyser::new(&file, "main", &pkgs);
        let mut diags = Diagnostics::new();
        let body = Stmt::new(
            Span::new(0, 1),
            StmtKind::Compound(vec![Stmt::new(
                Span::new(0, 1),
                StmtKind::Declaration(DeclId(0)),
            )]),
        );
        let func = FunctionDecl {
            common: DeclCommon::new("f", Span::new(0, 1), false),
            signature: FunctionSignature {
                ret: Box::new(QualType::unqualified(Type::Builtin(BuiltinType::Void))),
                params: vec![],
                is_variadic: false,
            },
            body: Some(body),
            struct_owner: None,
        };
        analyser.check(&func, &mut diags);
        assert_eq!(diags.error_count(), 1);
    }
}
