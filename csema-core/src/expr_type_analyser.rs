//! Pure type arithmetic used by expression analysis: unary promotion, binary
//! common-type selection, narrowing-conversion diagnostics, and the
//! constant-foldability predicate. Owns no state beyond the diagnostics sink
//! passed in by the caller.

use crate::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use crate::diagnostic::{codes, Diagnostic, Diagnostics};
use crate::source::Span;
use crate::types::{BuiltinType, Type};

/// Integer promotion: anything narrower than `i32` promotes to `i32` before
/// taking part in arithmetic; everything else (including floats) is unchanged.
pub fn promote_unary(t: BuiltinType) -> BuiltinType {
    if t.is_integer() && t.rank() < BuiltinType::I32.rank() {
        BuiltinType::I32
    } else {
        t
    }
}

/// The usual arithmetic conversions: float outranks integer, and within a
/// rank tier an unsigned type outranks its signed counterpart.
pub fn common_numeric_type(a: BuiltinType, b: BuiltinType) -> BuiltinType {
    let a = promote_unary(a);
    let b = promote_unary(b);
    if a.is_float() || b.is_float() {
        return if a.rank() >= b.rank() { a } else { b };
    }
    match a.rank().cmp(&b.rank()) {
        std::cmp::Ordering::Greater => a,
        std::cmp::Ordering::Less => b,
        std::cmp::Ordering::Equal => {
            if a.is_signed() {
                b
            } else {
                a
            }
        }
    }
}

/// Would converting a value of type `from` to `to` lose information?
pub fn is_narrowing(from: BuiltinType, to: BuiltinType) -> bool {
    if from.is_float() && !to.is_float() {
        return true;
    }
    if !from.is_float() && to.is_float() {
        return false;
    }
    to.rank() < from.rank()
}

pub fn infer_unary_op_type(
    op: UnaryOp,
    operand: &Type,
    span: Span,
    diags: &mut Diagnostics,
) -> Type {
    match op {
        UnaryOp::AddrOf => Type::Pointer(Box::new(crate::types::QualType::unqualified(
            operand.clone(),
        ))),
        UnaryOp::Deref => match operand {
            Type::Pointer(inner) => inner.ty.clone(),
            _ => {
                diags.add(Diagnostic::from_code(
                    &codes::E0302,
                    span,
                    "dereference of a non-pointer type",
                ));
                Type::Error
            }
        },
        UnaryOp::Not => Type::Builtin(BuiltinType::Bool),
        UnaryOp::Neg | UnaryOp::BitNot | UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
            match operand {
                Type::Builtin(b) if b.is_integer() || b.is_float() => {
                    Type::Builtin(promote_unary(*b))
                }
                Type::Pointer(_) if matches!(op, UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec) => {
                    operand.clone()
                }
                _ => {
                    diags.add(Diagnostic::from_code(
                        &codes::E0205,
                        span,
                        "unary operator applied to an unsupported operand type",
                    ));
                    Type::Error
                }
            }
        }
    }
}

pub fn infer_binary_op_type(
    op: BinaryOp,
    lhs: &Type,
    rhs: &Type,
    span: Span,
    diags: &mut Diagnostics,
) -> Type {
    if op.is_comparison() || op.is_logical() {
        return Type::Builtin(BuiltinType::Bool);
    }
    match (lhs, rhs) {
        (Type::Pointer(elem), Type::Builtin(b)) if b.is_integer() && matches!(op, BinaryOp::Add | BinaryOp::Sub) => {
            Type::Pointer(elem.clone())
        }
        (Type::Builtin(b), Type::Pointer(elem)) if b.is_integer() && op == BinaryOp::Add => {
            Type::Pointer(elem.clone())
        }
        (Type::Pointer(_), Type::Pointer(_)) if op == BinaryOp::Sub => {
            // Pointer difference: a signed word-sized integer.
            Type::Builtin(BuiltinType::I64)
        }
        (Type::Builtin(a), Type::Builtin(b)) => Type::Builtin(common_numeric_type(*a, *b)),
        _ => {
            diags.add(Diagnostic::from_code(
                &codes::E0205,
                span,
                "binary operator applied to incompatible operand types",
            ));
            Type::Error
        }
    }
}

/// Is `value` assignable to `target` without loss of information? Equal
/// canonical types are always assignable; otherwise both must be numeric
/// builtins and the conversion must not narrow.
pub fn check_assignable(target: &Type, value: &Type, span: Span, diags: &mut Diagnostics) -> bool {
    if target == value {
        return true;
    }
    match (target, value) {
        (Type::Builtin(t), Type::Builtin(v)) => {
            if is_narrowing(*v, *t) {
                diags.add(Diagnostic::from_code(
                    &codes::E0202,
                    span,
                    format!("implicit conversion from {:?} to {:?} narrows the value", v, t),
                ));
                false
            } else {
                true
            }
        }
        _ => {
            diags.add(Diagnostic::from_code(
                &codes::E0201,
                span,
                "the two types are not compatible",
            ));
            false
        }
    }
}

/// Whether `expr` can be evaluated at compile time: literals, and unary or
/// binary combinations of constant-foldable operands. Identifiers are
/// foldable only if they refer to an enum constant or a const variable with
/// a known value; that check needs declaration context and is layered on by
/// the caller (`FunctionAnalyser`/`checkEnumValue`), not here.
pub fn is_constant_foldable(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::IntLiteral(_) | ExprKind::CharLiteral(_) | ExprKind::BoolLiteral(_) => true,
        ExprKind::Unary { operand, .. } => is_constant_foldable(operand),
        ExprKind::Binary { lhs, rhs, .. } => is_constant_foldable(lhs) && is_constant_foldable(rhs),
        ExprKind::Paren(inner) => is_constant_foldable(inner),
        ExprKind::Builtin(_) => true,
        _ => false,
    }
}

/// The narrowest builtin integer type an int literal's value fits in: `i32`
/// unless the value overflows it, in which case `i64`.
pub fn smallest_fitting_int(value: i64) -> Type {
    let ty = if (i32::MIN as i64..=i32::MAX as i64).contains(&value) {
        BuiltinType::I32
    } else {
        BuiltinType::I64
    };
    Type::Builtin(ty)
}

/// The type of a constant-foldable expression, without needing a function's
/// scope or parameter context. Mirrors the literal/operator typing rules
/// `FunctionAnalyser::infer_expr` applies inside a function body, for use by
/// callers (file-scope initialisers) that only ever see constant expressions.
pub fn const_expr_type(expr: &Expr) -> Type {
    match &expr.kind {
        ExprKind::IntLiteral(v) => smallest_fitting_int(*v),
        ExprKind::CharLiteral(_) => Type::Builtin(BuiltinType::Char),
        ExprKind::BoolLiteral(_) => Type::Builtin(BuiltinType::Bool),
        ExprKind::StringLiteral(_) => Type::Pointer(Box::new(crate::types::QualType::new(
            Type::Builtin(BuiltinType::Char),
            crate::types::Qualifiers::CONST,
        ))),
        ExprKind::Paren(inner) => const_expr_type(inner),
        ExprKind::Unary { op, operand } => {
            let operand_ty = const_expr_type(operand);
            match (op, &operand_ty) {
                (UnaryOp::Not, _) => Type::Builtin(BuiltinType::Bool),
                (UnaryOp::Neg | UnaryOp::BitNot, Type::Builtin(b)) => {
                    Type::Builtin(promote_unary(*b))
                }
                _ => Type::Error,
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            if op.is_comparison() || op.is_logical() {
                return Type::Builtin(BuiltinType::Bool);
            }
            match (const_expr_type(lhs), const_expr_type(rhs)) {
                (Type::Builtin(a), Type::Builtin(b)) => Type::Builtin(common_numeric_type(a, b)),
                _ => Type::Error,
            }
        }
        ExprKind::Builtin(builtin) => const_builtin_type(builtin),
        _ => Type::Error,
    }
}

fn const_builtin_type(builtin: &crate::ast::BuiltinExpr) -> Type {
    use crate::ast::BuiltinExpr;
    match builtin {
        BuiltinExpr::SizeOf(_) | BuiltinExpr::ElemsOf(_) | BuiltinExpr::BitOffsetOf { .. } => {
            Type::Builtin(BuiltinType::U64)
        }
        BuiltinExpr::EnumMin(_) | BuiltinExpr::EnumMax(_) => Type::Builtin(BuiltinType::I32),
    }
}

/// Evaluate a constant integer expression. Returns `None` for anything
/// `is_constant_foldable` would reject, or for a unary/binary combination
/// whose operands did not themselves evaluate (e.g. a non-integer literal).
pub fn eval_const_int(expr: &Expr) -> Option<i64> {
    match &expr.kind {
        ExprKind::IntLiteral(v) => Some(*v),
        ExprKind::CharLiteral(c) => Some(*c as i64),
        ExprKind::BoolLiteral(b) => Some(*b as i64),
        ExprKind::Paren(inner) => eval_const_int(inner),
        ExprKind::Unary { op, operand } => {
            let v = eval_const_int(operand)?;
            match op {
                UnaryOp::Neg => Some(-v),
                UnaryOp::BitNot => Some(!v),
                UnaryOp::Not => Some((v == 0) as i64),
                _ => None,
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let a = eval_const_int(lhs)?;
            let b = eval_const_int(rhs)?;
            match op {
                BinaryOp::Add => Some(a.wrapping_add(b)),
                BinaryOp::Sub => Some(a.wrapping_sub(b)),
                BinaryOp::Mul => Some(a.wrapping_mul(b)),
                BinaryOp::Div if b != 0 => Some(a.wrapping_div(b)),
                BinaryOp::Mod if b != 0 => Some(a.wrapping_rem(b)),
                BinaryOp::Shl => Some(a.wrapping_shl(b as u32)),
                BinaryOp::Shr => Some(a.wrapping_shr(b as u32)),
                BinaryOp::BitAnd => Some(a & b),
                BinaryOp::BitOr => Some(a | b),
                BinaryOp::BitXor => Some(a ^ b),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_promotes_to_int() {
        assert_eq!(promote_unary(BuiltinType::Char), BuiltinType::I32);
        assert_eq!(promote_unary(BuiltinType::I64), BuiltinType::I64);
    }

    #[test]
    fn unsigned_outranks_signed_at_equal_width() {
        assert_eq!(
            common_numeric_type(BuiltinType::I32, BuiltinType::U32),
            BuiltinType::U32
        );
    }

    #[test]
    fn float_outranks_integer() {
        assert_eq!(
            common_numeric_type(BuiltinType::I64, BuiltinType::F32),
            BuiltinType::F32
        );
    }

    #[test]
    fn narrowing_from_i64_to_i32_is_flagged() {
        assert!(is_narrowing(BuiltinType::I64, BuiltinType::I32));
        assert!(!is_narrowing(BuiltinType::I32, BuiltinType::I64));
    }

    #[test]
    fn pointer_plus_integer_stays_a_pointer() {
        let mut diags = Diagnostics::new();
        let ptr = Type::Pointer(Box::new(crate::types::QualType::unqualified(Type::Builtin(
            BuiltinType::I32,
        ))));
        let result = infer_binary_op_type(
            BinaryOp::Add,
            &ptr,
            &Type::Builtin(BuiltinType::I32),
            Span::new(0, 1),
            &mut diags,
        );
        assert!(result.is_pointer());
        assert!(diags.is_empty());
    }

    #[test]
    fn assigning_a_narrower_value_is_accepted_without_narrowing_diagnostic() {
        let mut diags = Diagnostics::new();
        assert!(check_assignable(
            &Type::Builtin(BuiltinType::I64),
            &Type::Builtin(BuiltinType::I32),
            Span::new(0, 1),
            &mut diags
        ));
        assert!(diags.is_empty());
    }

    #[test]
    fn assigning_a_wider_value_narrows() {
        let mut diags = Diagnostics::new();
        assert!(!check_assignable(
            &Type::Builtin(BuiltinType::I32),
            &Type::Builtin(BuiltinType::I64),
            Span::new(0, 1),
            &mut diags
        ));
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn eval_const_int_folds_arithmetic() {
        let one = Expr::new(Span::new(0, 1), ExprKind::IntLiteral(1));
        let two = Expr::new(Span::new(0, 1), ExprKind::IntLiteral(2));
        let sum = Expr::new(
            Span::new(0, 1),
            ExprKind::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(one),
                rhs: Box::new(two),
            },
        );
        assert_eq!(eval_const_int(&sum), Some(3));
    }

    #[test]
    fn eval_const_int_rejects_division_by_zero() {
        let one = Expr::new(Span::new(0, 1), ExprKind::IntLiteral(1));
        let zero = Expr::new(Span::new(0, 1), ExprKind::IntLiteral(0));
        let div = Expr::new(
            Span::new(0, 1),
            ExprKind::Binary {
                op: BinaryOp::Div,
                lhs: Box::new(one),
                rhs: Box::new(zero),
            },
        );
        assert_eq!(eval_const_int(&div), None);
    }
}
