//! Shared expression classification helpers
//!
//! The passes all need to answer the same small questions about
//! expressions: does this expression carry a declaration, is it an l-value,
//! is it a borrow or a dereference. Centralized here so every pass gives
//! the same answers.

use rill_ast::{DeclId, Expr, ExprKind, UnaryOp};

use crate::context::Sema;
use crate::decl::Decl;

/// The declaration an expression's value is bound to, if it has one:
/// a `DeclRef`'s target, a member access's child declaration, or the
/// synthesized temporary of a dereference. Parens are transparent.
pub fn expr_decl(expr: &Expr) -> Option<DeclId> {
    match &expr.kind {
        ExprKind::DeclRef { .. } | ExprKind::Member { .. } => expr.decl,
        ExprKind::Paren(inner) => expr_decl(inner),
        ExprKind::Unary {
            op: UnaryOp::Deref, ..
        } => expr.decl,
        _ => None,
    }
}

pub fn has_decl(expr: &Expr) -> bool {
    expr_decl(expr).is_some()
}

/// An l-value is an expression that denotes a storage location, i.e. one
/// whose declaration is a variable.
pub fn lvalue_decl(sema: &Sema, expr: &Expr) -> Option<DeclId> {
    expr_decl(expr).filter(|id| matches!(sema.decl(*id), Decl::Var(_)))
}

pub fn is_lvalue(sema: &Sema, expr: &Expr) -> bool {
    lvalue_decl(sema, expr).is_some()
}

/// Whether `expr` is a borrowing expression, `&e` or `&var e`.
pub fn is_ref_expr(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Unary {
            op: UnaryOp::Ref | UnaryOp::VarRef,
            ..
        }
    )
}

pub fn is_func_call(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::Call { .. })
}

/// The declaration a moved expression would leave dangling: the reference
/// behind the access path, if the path goes through one. `p` alone does
/// not go through `p`, but `*p` and `p.m`-through-a-reference do.
pub fn behind_ref(sema: &Sema, expr: &Expr) -> Option<DeclId> {
    match &expr.kind {
        ExprKind::DeclRef { .. } => None,
        ExprKind::Member { base, .. } => behind_ref(sema, base),
        ExprKind::Paren(inner) => behind_ref(sema, inner),
        ExprKind::Unary { op, operand } => match op {
            UnaryOp::Ref | UnaryOp::VarRef => None,
            UnaryOp::Deref => {
                if matches!(operand.kind, ExprKind::DeclRef { .. }) {
                    lvalue_decl(sema, operand)
                } else {
                    behind_ref(sema, operand)
                }
            }
        },
        _ => None,
    }
}
