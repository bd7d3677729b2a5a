//! The declaration, statement and expression trees produced by parsing and
//! consumed by the analyser.
//!
//! Every declaration and expression carries a [`Span`]. Named-type and
//! identifier references are [`DeclId`]/[`LabelId`] handles into a file's
//! flat `decls` arena rather than owning pointers, matching the index-based
//! storage used for [scopes](crate::scope) and [types](crate::types).

use std::cell::{Cell, RefCell};

use serde::{Deserialize, Serialize};

use crate::ids::{DeclId, LabelId};
use crate::source::Span;
use crate::types::{FunctionSignature, QualType};

/// Fields shared by every declaration kind: location, visibility, and the
/// used/used-publicly bits consulted by `FileAnalyser::check_decls_for_used`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeclCommon {
    pub name: String,
    pub span: Span,
    pub is_public: bool,
    used: Cell<bool>,
    used_publicly: Cell<bool>,
}

impl DeclCommon {
    pub fn new(name: impl Into<String>, span: Span, is_public: bool) -> Self {
        Self {
            name: name.into(),
            span,
            is_public,
            used: Cell::new(false),
            used_publicly: Cell::new(false),
        }
    }

    pub fn mark_used(&self) {
        self.used.set(true);
    }

    pub fn mark_used_publicly(&self) {
        self.used.set(true);
        self.used_publicly.set(true);
    }

    pub fn is_used(&self) -> bool {
        self.used.get()
    }

    pub fn is_used_publicly(&self) -> bool {
        self.used_publicly.get()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AliasTypeDecl {
    pub common: DeclCommon,
    pub target: QualType,
    /// Set while this alias is on the active `resolveCanonicals` call stack;
    /// re-entering a decl with this flag set is a cyclic alias chain.
    pub(crate) resolving: Cell<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StructTypeDecl {
    pub common: DeclCommon,
    pub is_union: bool,
    /// Members, in declaration order. Each points at a `Var` (or nested
    /// `StructType` for an anonymous sub-struct) in the same file's arena.
    pub members: Vec<DeclId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnumTypeDecl {
    pub common: DeclCommon,
    pub impl_type: crate::types::BuiltinType,
    pub constants: Vec<DeclId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FunctionTypeDecl {
    pub common: DeclCommon,
    pub signature: FunctionSignature,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub common: DeclCommon,
    pub signature: FunctionSignature,
    pub body: Option<Stmt>,
    /// Non-`None` for a struct method: the struct it was declared on.
    pub struct_owner: Option<DeclId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VarDecl {
    pub common: DeclCommon,
    pub ty: QualType,
    pub init: Option<Expr>,
    pub is_local: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnumConstantDecl {
    pub common: DeclCommon,
    pub value: Option<Expr>,
    pub resolved_value: Cell<Option<i64>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ArrayValueDecl {
    pub common: DeclCommon,
    pub target_name: String,
    pub target: Cell<Option<DeclId>>,
    pub init: Expr,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UseDecl {
    pub common: DeclCommon,
    pub package: String,
    pub alias: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum Decl {
    AliasType(AliasTypeDecl),
    StructType(StructTypeDecl),
    EnumType(EnumTypeDecl),
    FunctionType(FunctionTypeDecl),
    Function(FunctionDecl),
    Var(VarDecl),
    EnumConstant(EnumConstantDecl),
    ArrayValue(ArrayValueDecl),
    Use(UseDecl),
}

impl Decl {
    pub fn common(&self) -> &DeclCommon {
        match self {
            Decl::AliasType(d) => &d.common,
            Decl::StructType(d) => &d.common,
            Decl::EnumType(d) => &d.common,
            Decl::FunctionType(d) => &d.common,
            Decl::Function(d) => &d.common,
            Decl::Var(d) => &d.common,
            Decl::EnumConstant(d) => &d.common,
            Decl::ArrayValue(d) => &d.common,
            Decl::Use(d) => &d.common,
        }
    }

    pub fn name(&self) -> &str {
        &self.common().name
    }

    pub fn is_type(&self) -> bool {
        matches!(
            self,
            Decl::AliasType(_) | Decl::StructType(_) | Decl::EnumType(_) | Decl::FunctionType(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    AddrOf,
    Deref,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    LogAnd,
    LogOr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::LogAnd | BinaryOp::LogOr)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Designator {
    Index(Box<Expr>),
    Field(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitListElement {
    pub designator: Option<Designator>,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SizeOfOperand {
    Type(QualType),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BuiltinExpr {
    SizeOf(SizeOfOperand),
    ElemsOf(Box<Expr>),
    EnumMin(Box<Expr>),
    EnumMax(Box<Expr>),
    BitOffsetOf { base: Box<Expr>, member: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExprKind {
    IntLiteral(i64),
    CharLiteral(char),
    BoolLiteral(bool),
    StringLiteral(String),
    Identifier {
        name: String,
        decl: Cell<Option<DeclId>>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Assign {
        /// `Some(op)` for a compound assignment such as `+=`.
        compound_op: Option<BinaryOp>,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Member {
        base: Box<Expr>,
        member: String,
        member_decl: Cell<Option<DeclId>>,
        arrow: bool,
    },
    Subscript {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Paren(Box<Expr>),
    Cast {
        target: QualType,
        operand: Box<Expr>,
    },
    InitList(Vec<InitListElement>),
    Builtin(BuiltinExpr),
}

/// An expression node. `resolved_type` is filled in by the expression-type
/// analyser and memoised so later passes (`checkDeclsForUsed`, codegen
/// handoff) never recompute it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
    resolved_type: RefCell<Option<QualType>>,
}

impl Expr {
    pub fn new(span: Span, kind: ExprKind) -> Self {
        Self {
            span,
            kind,
            resolved_type: RefCell::new(None),
        }
    }

    pub fn resolved_type(&self) -> Option<QualType> {
        self.resolved_type.borrow().clone()
    }

    pub fn set_resolved_type(&self, ty: QualType) {
        *self.resolved_type.borrow_mut() = Some(ty);
    }

    /// An lvalue is anything that names storage: an identifier, a
    /// dereference, a member access, or a subscript. Parenthesising an
    /// lvalue does not change its lvalue-ness.
    pub fn is_lvalue_shape(&self) -> bool {
        match &self.kind {
            ExprKind::Identifier { .. }
            | ExprKind::Member { .. }
            | ExprKind::Subscript { .. } => true,
            ExprKind::Unary { op: UnaryOp::Deref, .. } => true,
            ExprKind::Paren(inner) => inner.is_lvalue_shape(),
            _ => false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SwitchCase {
    pub span: Span,
    /// Empty means the `default` case.
    pub values: Vec<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum StmtKind {
    Compound(Vec<Stmt>),
    Expr(Expr),
    /// A local declaration used as a statement.
    Declaration(DeclId),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    Do {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
        /// A "sealed" switch must exhaustively cover an enum's constants.
        is_sealed: bool,
    },
    Break,
    Continue,
    Label {
        name: String,
        id: Cell<Option<LabelId>>,
        body: Box<Stmt>,
    },
    Goto {
        name: String,
        target: Cell<Option<LabelId>>,
    },
    Return(Option<Expr>),
    Defer(Box<Stmt>),
    Asm(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Stmt {
    pub span: Span,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn new(span: Span, kind: StmtKind) -> Self {
        Self { span, kind }
    }
}

/// One parsed source file: a flat arena of declarations plus index lists
/// grouping them by kind, mirroring how [`crate::scope::Scope`] and
/// [`crate::file_analyser::FileAnalyser`] want to iterate them.
#[derive(Debug, Serialize, Deserialize)]
pub struct File {
    pub name: String,
    pub package: String,
    pub decls: Vec<Decl>,
    pub uses: Vec<DeclId>,
    pub types: Vec<DeclId>,
    pub vars: Vec<DeclId>,
    pub functions: Vec<DeclId>,
    pub array_values: Vec<DeclId>,
}

impl File {
    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn used_publicly_implies_used() {
        let common = DeclCommon::new("x", Span::new(0, 1), false);
        assert!(!common.is_used());
        common.mark_used_publicly();
        assert!(common.is_used());
        assert!(common.is_used_publicly());
    }

    #[test]
    fn paren_does_not_hide_lvalue_shape() {
        let ident = Expr::new(
            Span::new(0, 1),
            ExprKind::Identifier {
                name: "x".into(),
                decl: Cell::new(None),
            },
        );
        let wrapped = Expr::new(Span::new(0, 3), ExprKind::Paren(Box::new(ident)));
        assert!(wrapped.is_lvalue_shape());
    }

    #[test]
    fn call_is_not_an_lvalue_shape() {
        let callee = Expr::new(
            Span::new(0, 1),
            ExprKind::Identifier {
                name: "f".into(),
                decl: Cell::new(None),
            },
        );
        let call = Expr::new(
            Span::new(0, 3),
            ExprKind::Call {
                callee: Box::new(callee),
                args: vec![],
            },
        );
        assert!(!call.is_lvalue_shape());
    }
}
