//! Declaration definitions for the AST

use super::*;

/// A declaration in statement position.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Var(VarDecl),
    Func(FuncDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Var(v) => v.span,
            Decl::Func(f) => f.span,
            Decl::Struct(s) => s.span,
            Decl::Enum(e) => e.span,
        }
    }
}

/// Syntactic position a variable declaration appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VarDeclKind {
    /// `let x` / `var x` in a function body.
    #[default]
    Local,
    /// A function parameter.
    Param,
    /// A struct field.
    Field,
}

/// `let x: T = e` / `var x: T = e`, also used for parameters and struct
/// fields. At least one of `type_expr` and `init` is present for locals.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: Name,
    pub kind: VarDeclKind,
    pub mutable: bool,
    pub type_expr: Option<TypeExpr>,
    pub init: Option<Expr>,
    pub span: Span,

    /// The semantic declaration created for this node by the name binder.
    pub decl: Option<DeclId>,
}

/// `fn name(params) -> T { body }`. `body` is `None` for `extern fn`
/// headers.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub name: Name,
    pub params: Vec<VarDecl>,
    pub ret_type_expr: Option<TypeExpr>,
    pub body: Option<CompoundStmt>,
    pub span: Span,

    pub decl: Option<DeclId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: Name,
    pub fields: Vec<VarDecl>,
    pub span: Span,

    pub decl: Option<DeclId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: Name,
    pub variants: Vec<EnumVariantDecl>,
    pub span: Span,

    pub decl: Option<DeclId>,
}

/// One variant of an enum, with an optional positional field type list,
/// e.g. `Pos(int, int)`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumVariantDecl {
    pub name: Name,
    pub fields: Vec<TypeExpr>,
    pub span: Span,

    pub decl: Option<DeclId>,
}
