//! Expression definitions for the AST

use super::*;

/// An expression, with the annotation slots filled in by the semantic
/// passes.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,

    /// Computed type, assigned by the type checker. Stays `None` when the
    /// expression failed to check; downstream passes treat that silently.
    pub ty: Option<TypeId>,
    /// For l-value-bearing expressions, the declaration that denotes the
    /// storage this expression refers to:
    /// - `DeclRef`: the referenced declaration,
    /// - `Member`: the child declaration materialized under the base,
    /// - `Unary(Deref)`: a synthesized unnamed declaration that carries the
    ///   mutability of the dereferenced reference.
    pub decl: Option<DeclId>,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            ty: None,
            decl: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    IntegerLiteral {
        value: i64,
    },

    StringLiteral {
        value: String,
    },

    /// A bare identifier. Whether it names a variable, a struct or an enum
    /// is only decided during analysis.
    DeclRef {
        name: Name,
    },

    /// Function call `f(a, b)`.
    Call {
        callee: Name,
        args: Vec<Expr>,
        /// The called function's declaration, bound by the name binder.
        callee_decl: Option<DeclId>,
    },

    /// Struct literal `S { .a = e1, .b = e2 }`.
    StructLit {
        /// The `S` part; always a `DeclRef`.
        name_expr: Box<Expr>,
        fields: Vec<FieldInit>,
    },

    /// Cast `[T](e)`. The result takes the target type unchecked.
    Cast {
        ty: Box<TypeExpr>,
        operand: Box<Expr>,
    },

    /// Member access `base.field`.
    Member {
        base: Box<Expr>,
        field: Name,
    },

    /// Parenthesized expression. Transparent to typing and l-valueness.
    Paren(Box<Expr>),

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Placeholder produced by parser error recovery.
    Bad,
}

/// One `.name = expr` designator of a struct literal.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInit {
    pub name: Name,
    pub init: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `&e`, a shared borrow.
    Ref,
    /// `&var e`, a unique borrow.
    VarRef,
    /// `*e`.
    Deref,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Mul,
    Div,
    Add,
    Sub,
    Eq,
    Lt,
    Gt,
}

impl BinaryOp {
    /// Binding strength; bigger binds tighter. Anything that is not an
    /// operator is below zero in the parser.
    pub fn precedence(self) -> i32 {
        match self {
            BinaryOp::Mul | BinaryOp::Div => 2,
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Eq | BinaryOp::Lt | BinaryOp::Gt => 0,
        }
    }
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Ref => write!(f, "&"),
            UnaryOp::VarRef => write!(f, "&var"),
            UnaryOp::Deref => write!(f, "*"),
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Eq => "==",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
        };
        write!(f, "{}", s)
    }
}
