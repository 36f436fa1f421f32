//! The analysis context
//!
//! `Sema` owns everything the passes share: the name table, the arenas for
//! declarations, canonical types and lifetimes, the four scoped tables, the
//! enclosing-function stack and the diagnostics list. The scoped tables
//! open and close together whenever a walker enters or leaves a scope.

use rill_ast::{DeclId, Name, NameTable, Span, TypeExprKind, TypeId, VarDeclKind};

use crate::builtins::{self, Builtins};
use crate::decl::{Decl, FuncDecl, VarDecl};
use crate::env::{BorrowCounts, ScopedTable};
use crate::error::{SemaError, SemaErrorKind};
use crate::lifetime::{Lifetime, LifetimeId};
use crate::types::{Type, TypeKind};

pub struct Sema {
    pub names: NameTable,
    /// Source text, used to quote offending expressions in messages.
    pub source: String,

    decls: Vec<Decl>,
    types: Vec<Type>,
    lifetimes: Vec<Lifetime>,

    /// Declarations visible at the current scope, keyed by name.
    pub decl_table: ScopedTable<Name, DeclId>,
    /// Canonical derived types, keyed by synthesized name (`&T`, ...).
    pub type_table: ScopedTable<Name, TypeId>,
    /// Lifetimes alive at the current program point. Use
    /// `start_lifetime*()` instead of inserting directly.
    pub lifetime_table: ScopedTable<LifetimeId, LifetimeId>,
    /// Outstanding borrows per declaration.
    pub borrow_table: ScopedTable<DeclId, BorrowCounts>,

    /// Enclosing function declarations, innermost last.
    pub func_stack: Vec<DeclId>,

    pub builtins: Builtins,
    pub errors: Vec<SemaError>,
}

impl Sema {
    pub fn new(names: NameTable, source: &str) -> Self {
        let mut sema = Self {
            names,
            source: source.to_string(),
            decls: Vec::new(),
            types: Vec::new(),
            lifetimes: Vec::new(),
            decl_table: ScopedTable::new(),
            type_table: ScopedTable::new(),
            lifetime_table: ScopedTable::new(),
            borrow_table: ScopedTable::new(),
            func_stack: Vec::new(),
            builtins: Builtins::default(),
            errors: Vec::new(),
        };
        sema.builtins = builtins::install(&mut sema);
        sema
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    pub fn scope_open(&mut self) {
        self.decl_table.open();
        self.type_table.open();
        self.lifetime_table.open();
        self.borrow_table.open();
    }

    pub fn scope_close(&mut self) {
        self.decl_table.close();
        self.type_table.close();
        self.lifetime_table.close();
        self.borrow_table.close();
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub fn error(&mut self, kind: SemaErrorKind, span: Span) {
        self.errors.push(SemaError::new(kind, span));
    }

    pub fn text(&self, name: Name) -> &str {
        self.names.get(name)
    }

    /// Source slice covered by a span, for quoting expressions in messages.
    pub fn snippet(&self, span: Span) -> &str {
        self.source
            .get(span.start..span.end)
            .unwrap_or("<expression>")
    }

    // =========================================================================
    // Declaration arena
    // =========================================================================

    pub fn add_decl(&mut self, decl: Decl) -> DeclId {
        let id = DeclId(self.decls.len());
        self.decls.push(decl);
        id
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.0]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.0]
    }

    // The passes establish which ids hold which declaration kinds; a
    // mismatch here is an internal invariant violation, not a user error.

    pub fn var(&self, id: DeclId) -> &VarDecl {
        match self.decl(id) {
            Decl::Var(v) => v,
            other => panic!("expected a variable declaration, found {:?}", other),
        }
    }

    pub fn var_mut(&mut self, id: DeclId) -> &mut VarDecl {
        match self.decl_mut(id) {
            Decl::Var(v) => v,
            other => panic!("expected a variable declaration, found {:?}", other),
        }
    }

    pub fn func(&self, id: DeclId) -> &FuncDecl {
        match self.decl(id) {
            Decl::Func(f) => f,
            other => panic!("expected a function declaration, found {:?}", other),
        }
    }

    pub fn func_mut(&mut self, id: DeclId) -> &mut FuncDecl {
        match self.decl_mut(id) {
            Decl::Func(f) => f,
            other => panic!("expected a function declaration, found {:?}", other),
        }
    }

    pub fn as_var(&self, id: DeclId) -> Option<&VarDecl> {
        match self.decl(id) {
            Decl::Var(v) => Some(v),
            _ => None,
        }
    }

    /// Display name of a declaration, `<temporary>` for synthesized ones.
    pub fn decl_name(&self, id: DeclId) -> String {
        match self.decl(id).name() {
            Some(name) => self.text(name).to_string(),
            None => "<temporary>".to_string(),
        }
    }

    // =========================================================================
    // Type arena
    // =========================================================================

    pub fn add_type(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len());
        self.types.push(ty);
        id
    }

    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id.0]
    }

    pub fn ty_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.0]
    }

    pub fn type_name(&self, id: TypeId) -> String {
        self.text(self.ty(id).name).to_string()
    }

    pub fn is_builtin_type(&self, id: TypeId) -> bool {
        self.builtins.contains(id)
    }

    /// If `id` is a value type backed by a struct declaration, that
    /// declaration.
    pub fn struct_decl_of(&self, id: TypeId) -> Option<DeclId> {
        let decl = self.ty(id).decl()?;
        match self.decl(decl) {
            Decl::Struct(_) => Some(decl),
            _ => None,
        }
    }

    /// Gets or installs the canonical derived type of `kind` over
    /// `referee`. Derived types enter the type table the first time they
    /// occur; re-pushing on every occurrence keeps the table consistent.
    pub fn derived_type(&mut self, kind: TypeExprKind, referee: TypeId) -> TypeId {
        let referee_name = self.ty(referee).name;
        let name = rill_ast::name_of_derived_type(&mut self.names, kind, referee_name);
        if let Some((found, _)) = self.type_table.find(name) {
            return found;
        }

        let (kind, copyable) = match kind {
            TypeExprKind::Ref => (TypeKind::Ref { referee }, true),
            TypeExprKind::VarRef => (TypeKind::VarRef { referee }, false),
            TypeExprKind::Ptr => (TypeKind::Ptr { referee }, false),
            TypeExprKind::Value => unreachable!("value types are not derived"),
        };
        let id = self.add_type(Type {
            name,
            kind,
            copyable,
        });
        self.type_table.insert(name, id);
        id
    }

    // =========================================================================
    // Lifetime arena
    // =========================================================================

    pub fn add_lifetime(&mut self, lifetime: Lifetime) -> LifetimeId {
        let id = LifetimeId(self.lifetimes.len());
        self.lifetimes.push(lifetime);
        id
    }

    pub fn lifetime(&self, id: LifetimeId) -> &Lifetime {
        &self.lifetimes[id.0]
    }

    /// Starts a new exact lifetime bound to `decl`'s scope. It dies
    /// automatically when the current scope frame closes.
    pub fn start_lifetime(&mut self, decl: DeclId) -> LifetimeId {
        let id = self.add_lifetime(Lifetime::Exact { decl });
        self.lifetime_table.insert(id, id);
        id
    }

    /// Starts a new annotated lifetime for a reference parameter. Used when
    /// there is no referee declaration to pin the lifetime to; the
    /// annotation is the only information the signature gives.
    pub fn start_annotated_lifetime(&mut self, annot: Name) -> LifetimeId {
        let id = self.add_lifetime(Lifetime::Annotated { annot });
        self.lifetime_table.insert(id, id);
        id
    }

    /// True iff an exact lifetime is still alive at the current point.
    pub fn lifetime_alive(&self, id: LifetimeId) -> bool {
        matches!(self.lifetime_table.find(id), Some((found, _)) if found == id)
    }

    // =========================================================================
    // Helpers used across passes
    // =========================================================================

    /// Creates a fresh child declaration for field `name` under `parent`,
    /// inheriting the parent's mutability.
    pub fn add_field(&mut self, parent: DeclId, name: Name, ty: Option<TypeId>) -> DeclId {
        let mutable = self.var(parent).mutable;
        let mut field = VarDecl::new(Some(name), VarDeclKind::Field, mutable);
        field.ty = ty;
        field.parent = Some(parent);
        let id = self.add_decl(Decl::Var(field));
        self.var_mut(parent).children.push((name, id));
        id
    }

    /// Finds the already-materialized child of `parent` for field `name`.
    pub fn find_child(&self, parent: DeclId, name: Name) -> Option<DeclId> {
        self.var(parent)
            .children
            .iter()
            .find(|(child_name, _)| *child_name == name)
            .map(|(_, id)| *id)
    }

    /// Walks `parent` links up to the root of a member chain. Borrowing a
    /// field borrows from the whole struct, however deep the field is.
    pub fn root_parent(&self, id: DeclId) -> DeclId {
        let mut current = id;
        while let Some(parent) = self.as_var(current).and_then(|v| v.parent) {
            current = parent;
        }
        current
    }
}
