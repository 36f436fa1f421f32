//! # Rill Semantic Analysis
//!
//! The semantic core of the Rill compiler: a sequence of tree-walking
//! passes over the shared AST, communicating through annotations written
//! onto the nodes and through the scoped symbol tables held in the
//! analysis context.
//!
//! Passes, in order:
//!
//! 1. builtin installation (part of [`Sema::new`]),
//! 2. name binding ([`NameBinder`]),
//! 3. type checking ([`TypeChecker`]),
//! 4. return checking ([`ReturnChecker`]),
//! 5. borrow and lifetime checking ([`BorrowChecker`]).

mod borrowck;
mod builtins;
mod context;
mod decl;
mod env;
mod error;
mod helpers;
mod lifetime;
mod name_bind;
mod returnck;
mod typeck;
mod types;

pub use borrowck::BorrowChecker;
pub use builtins::Builtins;
pub use context::Sema;
pub use decl::{Decl, EnumDecl, FuncDecl, StructDecl, VarDecl, VariantDecl};
pub use env::{BorrowCounts, ScopedTable};
pub use error::{SemaError, SemaErrorKind};
pub use helpers::{expr_decl, has_decl, is_lvalue, lvalue_decl};
pub use lifetime::{Lifetime, LifetimeId};
pub use name_bind::NameBinder;
pub use returnck::{BasicBlock, BlockId, ReturnChecker};
pub use typeck::{typecheck_assign, TypeChecker};
pub use types::{Type, TypeKind};

use rill_ast::{File, NameTable};

/// Runs the full analysis pipeline over a parsed file.
///
/// Within a pass, local errors are reported and checking continues; a pass
/// that reported anything stops the pipeline, since the later passes lean
/// on the invariants it failed to establish. On success the returned
/// context holds every declaration, canonical type and lifetime the
/// emitter needs.
pub fn analyze(file: &mut File, names: NameTable, source: &str) -> Result<Sema, Vec<SemaError>> {
    let mut sema = Sema::new(names, source);

    NameBinder::run(&mut sema, file);
    if !sema.errors.is_empty() {
        return Err(sema.errors);
    }

    TypeChecker::run(&mut sema, file);
    if !sema.errors.is_empty() {
        return Err(sema.errors);
    }

    ReturnChecker::run(&mut sema, file);
    if !sema.errors.is_empty() {
        return Err(sema.errors);
    }

    BorrowChecker::run(&mut sema, file);
    if !sema.errors.is_empty() {
        return Err(sema.errors);
    }

    Ok(sema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_ast::TypeExprKind;

    fn empty_sema() -> Sema {
        Sema::new(NameTable::new(), "")
    }

    #[test]
    fn builtins_are_declared() {
        let sema = empty_sema();
        for name in ["void", "int", "char", "string", "bool"] {
            let name = sema.names.lookup(name).expect("builtin name interned");
            assert!(sema.decl_table.find(name).is_some());
        }
    }

    #[test]
    fn assign_is_reflexive_on_identical_types() {
        let sema = empty_sema();
        let int = sema.builtins.int_ty;
        assert!(typecheck_assign(&sema, int, int));
    }

    #[test]
    fn assign_admits_var_ref_promotion() {
        let mut sema = empty_sema();
        let int = sema.builtins.int_ty;
        let ref_int = sema.derived_type(TypeExprKind::Ref, int);
        let var_ref_int = sema.derived_type(TypeExprKind::VarRef, int);

        assert!(typecheck_assign(&sema, ref_int, var_ref_int));
        assert!(!typecheck_assign(&sema, var_ref_int, ref_int));
    }

    #[test]
    fn assign_promotes_through_nesting() {
        let mut sema = empty_sema();
        let int = sema.builtins.int_ty;
        let var_ref_int = sema.derived_type(TypeExprKind::VarRef, int);
        let ref_var_ref_int = sema.derived_type(TypeExprKind::Ref, var_ref_int);
        let ref_ref_int = {
            let ref_int = sema.derived_type(TypeExprKind::Ref, int);
            sema.derived_type(TypeExprKind::Ref, ref_int)
        };

        // &&int ← &&var int promotes the inner reference too.
        assert!(typecheck_assign(&sema, ref_ref_int, ref_var_ref_int));
        assert!(!typecheck_assign(&sema, ref_var_ref_int, ref_ref_int));
    }

    #[test]
    fn assign_rejects_distinct_value_types() {
        let sema = empty_sema();
        assert!(!typecheck_assign(
            &sema,
            sema.builtins.int_ty,
            sema.builtins.string_ty
        ));
    }

    #[test]
    fn derived_types_are_canonical() {
        let mut sema = empty_sema();
        let int = sema.builtins.int_ty;
        let a = sema.derived_type(TypeExprKind::Ref, int);
        let b = sema.derived_type(TypeExprKind::Ref, int);
        assert_eq!(a, b);

        let name = sema.names.lookup("&int").expect("name synthesized");
        assert_eq!(sema.type_table.find(name).map(|(t, _)| t), Some(a));

        let c = sema.derived_type(TypeExprKind::VarRef, int);
        assert_ne!(a, c);
        assert!(sema.ty(a).copyable);
        assert!(!sema.ty(c).copyable);
    }

    #[test]
    fn ref_types_are_copyable_var_refs_are_not() {
        let mut sema = empty_sema();
        let string = sema.builtins.string_ty;
        let ref_string = sema.derived_type(TypeExprKind::Ref, string);
        let var_ref_string = sema.derived_type(TypeExprKind::VarRef, string);
        assert!(sema.ty(ref_string).copyable);
        assert!(!sema.ty(var_ref_string).copyable);
    }

    #[test]
    fn lifetime_dies_with_its_scope() {
        let mut sema = empty_sema();
        let decl = sema.add_decl(Decl::Var(VarDecl::new(None, Default::default(), false)));

        sema.scope_open();
        let lifetime = sema.start_lifetime(decl);
        assert!(sema.lifetime_alive(lifetime));
        sema.scope_close();
        assert!(!sema.lifetime_alive(lifetime));
    }
}
