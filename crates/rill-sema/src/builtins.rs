//! Builtin type installation
//!
//! Seeds the declaration table with the primitive types so they are visible
//! from any point in the AST. Each builtin is backed by a fieldless struct
//! declaration in the global scope, like any other nominal type.

use rill_ast::TypeId;

use crate::context::Sema;
use crate::decl::{Decl, StructDecl};
use crate::types::Type;

/// Handles to the builtin types.
///
/// `void` exists to give call expressions of value-less functions a type
/// distinct from "failed to typecheck".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builtins {
    pub void_ty: TypeId,
    pub int_ty: TypeId,
    pub char_ty: TypeId,
    pub string_ty: TypeId,
    pub bool_ty: TypeId,
}

impl Default for Builtins {
    fn default() -> Self {
        // Placeholder handles, replaced by `install` before anything can
        // look at them.
        let unset = TypeId(usize::MAX);
        Self {
            void_ty: unset,
            int_ty: unset,
            char_ty: unset,
            string_ty: unset,
            bool_ty: unset,
        }
    }
}

impl Builtins {
    pub fn contains(&self, ty: TypeId) -> bool {
        ty == self.void_ty
            || ty == self.int_ty
            || ty == self.char_ty
            || ty == self.string_ty
            || ty == self.bool_ty
    }
}

fn install_one(sema: &mut Sema, text: &str) -> TypeId {
    let name = sema.names.intern(text);
    let decl = sema.add_decl(Decl::Struct(StructDecl {
        name,
        fields: Vec::new(),
        ty: None,
    }));
    let ty = sema.add_type(Type::value(name, Some(decl)));
    match sema.decl_mut(decl) {
        Decl::Struct(s) => s.ty = Some(ty),
        _ => unreachable!(),
    }
    sema.decl_table.insert(name, decl);
    ty
}

pub fn install(sema: &mut Sema) -> Builtins {
    Builtins {
        void_ty: install_one(sema, "void"),
        int_ty: install_one(sema, "int"),
        char_ty: install_one(sema, "char"),
        string_ty: install_one(sema, "string"),
        bool_ty: install_one(sema, "bool"),
    }
}
