//! Semantic declarations
//!
//! The name binder materializes one of these for every declaration in the
//! source; later passes attach types, lifetimes and ownership state. They
//! live in the context's arena and reference each other by `DeclId`, which
//! avoids ownership cycles between a struct variable and its lazily-created
//! field declarations.

use rill_ast::{DeclId, Name, TypeId, VarDeclKind};

use crate::lifetime::LifetimeId;

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Var(VarDecl),
    Func(FuncDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    Variant(VariantDecl),
}

impl Decl {
    /// Display name of the declared entity, if it has one. Synthesized
    /// declarations (deref temporaries) do not.
    pub fn name(&self) -> Option<Name> {
        match self {
            Decl::Var(v) => v.name,
            Decl::Func(f) => Some(f.name),
            Decl::Struct(s) => Some(s.name),
            Decl::Enum(e) => Some(e.name),
            Decl::Variant(v) => Some(v.name),
        }
    }

    /// The type this declaration gives to expressions that reference it,
    /// if any. Functions are not first-class values and expose none.
    pub fn value_type(&self) -> Option<TypeId> {
        match self {
            Decl::Var(v) => v.ty,
            Decl::Struct(s) => s.ty,
            Decl::Enum(e) => e.ty,
            Decl::Variant(v) => v.ty,
            Decl::Func(_) => None,
        }
    }

    /// Whether this declaration introduces a type name.
    pub fn is_type(&self) -> bool {
        matches!(self, Decl::Struct(_) | Decl::Enum(_))
    }
}

/// A variable, parameter, struct field, or a synthesized temporary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VarDecl {
    /// `None` for synthesized temporaries, which are never queried by name.
    pub name: Option<Name>,
    pub kind: VarDeclKind,
    pub mutable: bool,
    pub ty: Option<TypeId>,

    /// Lifetime annotation written on the declared reference type, the `a`
    /// of `&.a int`. Only meaningful for parameters.
    pub annot: Option<Name>,

    /// Set when this declaration is a field materialized under another
    /// variable; `x.a` and `y.a` get distinct child declarations.
    pub parent: Option<DeclId>,
    pub children: Vec<(Name, DeclId)>,

    /// Lifetime of this variable itself, started when it enters scope.
    pub lifetime: Option<LifetimeId>,
    /// For reference variables, the lifetime of the value borrowed from.
    pub borrowee_lifetime: Option<LifetimeId>,

    pub moved: bool,
    pub borrowed: bool,
}

impl VarDecl {
    pub fn new(name: Option<Name>, kind: VarDeclKind, mutable: bool) -> Self {
        Self {
            name,
            kind,
            mutable,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub name: Name,
    pub params: Vec<DeclId>,
    pub ret_ty: Option<TypeId>,
    /// Lifetime annotation written on the return type in the signature.
    pub sig_ret_annot: Option<Name>,
    /// Return annotation after validation against the parameter
    /// annotations. Used for lifetime coercion at call sites.
    pub ret_lifetime_annot: Option<Name>,
    pub has_body: bool,
    /// Lifetime marking the function's own scope level; anything deeper is
    /// a local.
    pub scope_lifetime: Option<LifetimeId>,
}

impl FuncDecl {
    pub fn new(name: Name, has_body: bool, sig_ret_annot: Option<Name>) -> Self {
        Self {
            name,
            params: Vec::new(),
            ret_ty: None,
            sig_ret_annot,
            ret_lifetime_annot: None,
            has_body,
            scope_lifetime: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: Name,
    pub fields: Vec<DeclId>,
    pub ty: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: Name,
    pub variants: Vec<DeclId>,
    pub ty: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantDecl {
    pub name: Name,
    pub ty: Option<TypeId>,
}
