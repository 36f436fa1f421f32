//! Statement definitions for the AST

use super::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Declaration statement, e.g. `let x = 1`.
    Decl(Decl),

    /// Bare expression statement.
    Expr(Expr),

    /// `lhs = rhs` (copy) or `lhs <- rhs` (move). Whether the LHS is a
    /// legal assignment target is decided during analysis, not parsing.
    Assign {
        lhs: Expr,
        rhs: Expr,
        is_move: bool,
    },

    /// `return` with an optional value.
    Return { expr: Option<Expr> },

    If(IfStmt),

    Compound(CompoundStmt),

    /// A `#`-prefixed line passed through to the emitter verbatim.
    Builtin { text: String },

    /// Placeholder produced by parser error recovery.
    Bad,
}

/// An `else if` clause is represented as a nested `IfStmt` under `else_if`,
/// so an if/else-if/else chain is a right-leaning list.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_body: CompoundStmt,
    pub else_if: Option<Box<IfStmt>>,
    pub else_body: Option<CompoundStmt>,
}

/// A braced, scoped block of statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundStmt {
    pub stmts: Vec<Stmt>,
}
