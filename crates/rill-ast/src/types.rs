//! Type expressions
//!
//! A type expression is the syntactic spelling of a type: `int`, `&int`,
//! `&var .a Point`, `*char`. The type checker resolves each one to a
//! canonical `TypeId`.

use super::*;

/// Syntactic kind of a type expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeExprKind {
    /// A plain nominal type, e.g. `int` or `Point`.
    Value,
    /// Shared reference, `&T`.
    Ref,
    /// Unique/mutable reference, `&var T`.
    VarRef,
    /// Raw pointer, `*T`. Reserved; parsed but otherwise untouched.
    Ptr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    /// Full synthesized name of the type, e.g. `&var int`. Used as the key
    /// into the canonical type table.
    pub name: Name,
    /// Lifetime annotation on a reference form, the `a` of `&.a T`.
    pub lifetime: Option<Name>,
    /// The `T` part of `&T` / `&var T` / `*T`. `None` for value kinds.
    pub subexpr: Option<Box<TypeExpr>>,
    pub span: Span,

    /// Resolved by the type checker.
    pub ty: Option<TypeId>,
    /// For value kinds, the declaration this type name refers to. Bound by
    /// the name binder.
    pub decl: Option<DeclId>,
}

impl TypeExpr {
    pub fn new(kind: TypeExprKind, name: Name, span: Span) -> Self {
        Self {
            kind,
            name,
            lifetime: None,
            subexpr: None,
            span,
            ty: None,
            decl: None,
        }
    }

    pub fn is_ref(&self) -> bool {
        matches!(self.kind, TypeExprKind::Ref | TypeExprKind::VarRef)
    }
}

/// Builds the synthesized name for a derived type, e.g. `&T`, `&var T` or
/// `*T`. The same spelling is used as the canonical type table key, so
/// looking a derived type up by name always finds the one instance.
pub fn name_of_derived_type(names: &mut NameTable, kind: TypeExprKind, referee: Name) -> Name {
    let referee_text = names.get(referee).to_string();
    let text = match kind {
        TypeExprKind::Ref => format!("&{}", referee_text),
        TypeExprKind::VarRef => format!("&var {}", referee_text),
        TypeExprKind::Ptr => format!("*{}", referee_text),
        TypeExprKind::Value => referee_text,
    };
    names.intern(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_type_names() {
        let mut names = NameTable::new();
        let int = names.intern("int");
        let r = name_of_derived_type(&mut names, TypeExprKind::Ref, int);
        assert_eq!(names.get(r), "&int");
        let vr = name_of_derived_type(&mut names, TypeExprKind::VarRef, int);
        assert_eq!(names.get(vr), "&var int");
        let p = name_of_derived_type(&mut names, TypeExprKind::Ptr, int);
        assert_eq!(names.get(p), "*int");
    }

    #[test]
    fn derived_type_names_are_canonical() {
        let mut names = NameTable::new();
        let int = names.intern("int");
        let a = name_of_derived_type(&mut names, TypeExprKind::Ref, int);
        let b = name_of_derived_type(&mut names, TypeExprKind::Ref, int);
        assert_eq!(a, b);
    }
}
