//! Type checking pass
//!
//! Bottom-up: each visitor computes the node's canonical type, or `None`
//! when checking failed somewhere underneath, in which case the failure has
//! already been reported and callers pass the `None` along silently.
//!
//! Runs entirely at the global scope level: name resolution already
//! happened, so there is nothing to shadow, and it keeps every derived type
//! installed in the type table canonical for the rest of the compilation.

use rill_ast as ast;
use rill_ast::{ExprKind, Name, Span, StmtKind, TypeExprKind, TypeId, VarDeclKind};

use crate::context::Sema;
use crate::decl::Decl;
use crate::error::SemaErrorKind;
use crate::helpers::{has_decl, is_lvalue, lvalue_decl};
use crate::types::{Type, TypeKind};

pub struct TypeChecker<'a> {
    sema: &'a mut Sema,
}

/// Assignment compatibility of `lhs = rhs`:
/// 1. the exact same canonical type, or
/// 2. promotion of a mutable reference to an immutable one, recursively
///    through the referees.
pub fn typecheck_assign(sema: &Sema, lhs: TypeId, rhs: TypeId) -> bool {
    if lhs == rhs {
        return true;
    }
    if let TypeKind::Ref { referee: lhs_referee } = sema.ty(lhs).kind {
        if let Some(rhs_referee) = sema.ty(rhs).referee().filter(|_| sema.ty(rhs).is_ref()) {
            return typecheck_assign(sema, lhs_referee, rhs_referee);
        }
    }
    false
}

impl<'a> TypeChecker<'a> {
    pub fn run(sema: &'a mut Sema, file: &mut ast::File) {
        log::debug!("type checking");
        let mut checker = TypeChecker { sema };
        for item in &mut file.items {
            checker.visit_item(item);
        }
    }

    fn visit_item(&mut self, item: &mut ast::Item) {
        match item {
            ast::Item::Func(f) | ast::Item::Extern(f) => {
                self.visit_func_decl(f);
            }
            ast::Item::Struct(s) => {
                self.visit_struct_decl(s);
            }
            ast::Item::Enum(e) => {
                self.visit_enum_decl(e);
            }
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn visit_var_decl(&mut self, v: &mut ast::VarDecl) -> Option<TypeId> {
        if let Some(type_expr) = &mut v.type_expr {
            self.visit_type_expr(type_expr);
        }
        if let Some(init) = &mut v.init {
            self.visit_expr(init);
        }

        let declared = v.type_expr.as_ref().and_then(|t| t.ty);
        let init_ty = v.init.as_ref().and_then(|e| e.ty);

        let ty = match (&v.type_expr, &v.init) {
            (Some(_), Some(init)) => {
                let declared = declared?;
                let init_ty = init_ty?;
                if !typecheck_assign(self.sema, declared, init_ty) {
                    self.sema.error(
                        SemaErrorKind::AssignTypeMismatch {
                            lhs: self.sema.type_name(declared),
                            rhs: self.sema.type_name(init_ty),
                        },
                        init.span,
                    );
                    return None;
                }
                declared
            }
            (Some(_), None) => declared?,
            (None, Some(init)) => {
                // A named RHS of a non-copyable type cannot be copied out
                // of; a temporary (e.g. a fresh struct literal) is fine
                // since copying it amounts to a move.
                let init_ty = init_ty?;
                if has_decl(init) && !self.sema.ty(init_ty).copyable {
                    self.sema.error(
                        SemaErrorKind::CopyNonCopyable(self.sema.type_name(init_ty)),
                        init.span,
                    );
                    return None;
                }
                init_ty
            }
            (None, None) => return None,
        };

        let id = v.decl?;
        self.sema.var_mut(id).ty = Some(ty);

        // Materialize the field children of struct-typed variables.
        if let Some(struct_decl) = self.sema.struct_decl_of(ty) {
            if self.sema.var(id).children.is_empty() {
                let fields = match self.sema.decl(struct_decl) {
                    Decl::Struct(s) => s.fields.clone(),
                    _ => unreachable!(),
                };
                for field in fields {
                    let (name, field_ty) = {
                        let field_var = self.sema.var(field);
                        (field_var.name, field_var.ty)
                    };
                    if let Some(name) = name {
                        self.sema.add_field(id, name, field_ty);
                    }
                }
            }
        }

        Some(ty)
    }

    fn visit_func_decl(&mut self, f: &mut ast::FuncDecl) -> Option<TypeId> {
        // The return type must be checked before the body so that return
        // statements have something to check against.
        if let Some(ret) = &mut f.ret_type_expr {
            self.visit_type_expr(ret);
        }
        for param in &mut f.params {
            self.visit_var_decl(param);
        }

        let id = f.decl?;
        let ret_ty = match &f.ret_type_expr {
            Some(ret) => ret.ty?,
            None => self.sema.builtins.void_ty,
        };
        self.sema.func_mut(id).ret_ty = Some(ret_ty);

        if let Some(body) = &mut f.body {
            self.sema.func_stack.push(id);
            self.visit_compound_stmt(body);
            self.sema.func_stack.pop();
        }

        Some(ret_ty)
    }

    fn visit_struct_decl(&mut self, s: &mut ast::StructDecl) -> Option<TypeId> {
        let id = s.decl?;
        let ty = self.sema.add_type(Type::value(s.name, Some(id)));
        match self.sema.decl_mut(id) {
            Decl::Struct(sd) => sd.ty = Some(ty),
            _ => unreachable!(),
        }

        // The type is created before the fields are walked so recursive
        // struct definitions are legal.
        for field in &mut s.fields {
            self.visit_var_decl(field);
        }

        // One non-copyable field (e.g. a mutable reference) makes the whole
        // struct non-copyable.
        let any_non_copyable = s.fields.iter().any(|f| {
            f.decl
                .and_then(|d| self.sema.var(d).ty)
                .is_some_and(|t| !self.sema.ty(t).copyable)
        });
        if any_non_copyable {
            self.sema.ty_mut(ty).copyable = false;
        }

        Some(ty)
    }

    fn visit_enum_decl(&mut self, e: &mut ast::EnumDecl) -> Option<TypeId> {
        let id = e.decl?;
        let ty = self.sema.add_type(Type::value(e.name, Some(id)));
        match self.sema.decl_mut(id) {
            Decl::Enum(ed) => ed.ty = Some(ty),
            _ => unreachable!(),
        }

        for variant in &mut e.variants {
            self.visit_enum_variant_decl(variant);
        }

        Some(ty)
    }

    fn visit_enum_variant_decl(&mut self, v: &mut ast::EnumVariantDecl) -> Option<TypeId> {
        let id = v.decl?;
        let ty = self.sema.add_type(Type::value(v.name, Some(id)));
        match self.sema.decl_mut(id) {
            Decl::Variant(vd) => vd.ty = Some(ty),
            _ => unreachable!(),
        }

        for field in &mut v.fields {
            self.visit_type_expr(field);
        }

        Some(ty)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn visit_compound_stmt(&mut self, cs: &mut ast::CompoundStmt) {
        for stmt in &mut cs.stmts {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &mut ast::Stmt) {
        match &mut stmt.kind {
            StmtKind::Decl(decl) => match decl {
                ast::Decl::Var(v) => {
                    self.visit_var_decl(v);
                }
                ast::Decl::Func(f) => {
                    self.visit_func_decl(f);
                }
                ast::Decl::Struct(s) => {
                    self.visit_struct_decl(s);
                }
                ast::Decl::Enum(e) => {
                    self.visit_enum_decl(e);
                }
            },
            StmtKind::Expr(expr) => {
                self.visit_expr(expr);
            }
            StmtKind::Assign { lhs, rhs, .. } => {
                self.visit_assign(lhs, rhs, stmt.span);
            }
            StmtKind::Return { expr } => {
                self.visit_return(expr.as_mut(), stmt.span);
            }
            StmtKind::If(if_stmt) => self.visit_if_stmt(if_stmt),
            StmtKind::Compound(cs) => self.visit_compound_stmt(cs),
            StmtKind::Builtin { .. } | StmtKind::Bad => {}
        }
    }

    fn visit_if_stmt(&mut self, if_stmt: &mut ast::IfStmt) {
        self.visit_expr(&mut if_stmt.cond);
        self.visit_compound_stmt(&mut if_stmt.then_body);
        if let Some(else_if) = &mut if_stmt.else_if {
            self.visit_if_stmt(else_if);
        }
        if let Some(else_body) = &mut if_stmt.else_body {
            self.visit_compound_stmt(else_body);
        }
    }

    /// The l-value check for assignments cannot be done at parse time
    /// because it depends on the resolved meaning of the LHS, not its
    /// syntactic shape (`(v)` vs `(3)`).
    fn visit_assign(&mut self, lhs: &mut ast::Expr, rhs: &mut ast::Expr, span: Span) -> Option<TypeId> {
        self.visit_expr(lhs);
        self.visit_expr(rhs);

        let lhs_ty = lhs.ty?;
        let rhs_ty = rhs.ty?;

        if !is_lvalue(self.sema, lhs) {
            self.sema.error(SemaErrorKind::AssignToRvalue, span);
            return None;
        }

        // Type compatibility before mutability: a type mismatch usually
        // signifies the larger mistake of the two.
        if !typecheck_assign(self.sema, lhs_ty, rhs_ty) {
            self.sema.error(
                SemaErrorKind::AssignTypeMismatch {
                    lhs: self.sema.type_name(lhs_ty),
                    rhs: self.sema.type_name(rhs_ty),
                },
                span,
            );
            return None;
        }

        if !self.mutcheck_assign(lhs) {
            return None;
        }

        if has_decl(rhs) && !self.sema.ty(rhs_ty).copyable {
            self.sema.error(
                SemaErrorKind::CopyNonCopyable(self.sema.type_name(rhs_ty)),
                rhs.span,
            );
            return None;
        }

        Some(lhs_ty)
    }

    /// Mutability of an assignment target. Member targets inherit
    /// assignability from the struct side of the chain; a deref target
    /// needs the reference itself to be mutable; a plain variable needs a
    /// `var` declaration.
    fn mutcheck_assign(&mut self, lhs: &ast::Expr) -> bool {
        match &lhs.kind {
            ExprKind::Member { base, .. } => self.mutcheck_assign(base),
            ExprKind::Paren(inner) => self.mutcheck_assign(inner),
            ExprKind::Unary {
                op: ast::UnaryOp::Deref,
                operand,
            } => {
                let mutable = operand
                    .ty
                    .map(|t| self.sema.ty(t).is_var_ref())
                    .unwrap_or(false);
                if !mutable {
                    let name = lvalue_decl(self.sema, operand)
                        .map(|d| self.sema.decl_name(d))
                        .unwrap_or_else(|| self.sema.snippet(operand.span).to_string());
                    self.sema
                        .error(SemaErrorKind::NotMutableRef(name), lhs.span);
                    return false;
                }
                true
            }
            _ => {
                if let Some(decl) = lvalue_decl(self.sema, lhs) {
                    if !self.sema.var(decl).mutable {
                        let name = self.sema.decl_name(decl);
                        self.sema.error(SemaErrorKind::NotMutable(name), lhs.span);
                        return false;
                    }
                }
                true
            }
        }
    }

    fn visit_return(&mut self, expr: Option<&mut ast::Expr>, span: Span) -> Option<TypeId> {
        let func_id = *self.sema.func_stack.last()?;
        let ret_ty = self.sema.func(func_id).ret_ty?;
        let void_ty = self.sema.builtins.void_ty;

        let expr = match expr {
            Some(expr) => expr,
            None => {
                if ret_ty != void_ty {
                    self.sema.error(
                        SemaErrorKind::ReturnTypeMismatch {
                            expected: self.sema.type_name(ret_ty),
                            found: "void".to_string(),
                        },
                        span,
                    );
                    return None;
                }
                return Some(void_ty);
            }
        };

        self.visit_expr(expr);
        let expr_ty = expr.ty?;

        if ret_ty == void_ty {
            let name = self.sema.decl_name(func_id);
            self.sema
                .error(SemaErrorKind::ReturnInVoidFunction(name), expr.span);
            return None;
        }

        if !typecheck_assign(self.sema, ret_ty, expr_ty) {
            self.sema.error(
                SemaErrorKind::ReturnTypeMismatch {
                    expected: self.sema.type_name(ret_ty),
                    found: self.sema.type_name(expr_ty),
                },
                expr.span,
            );
            return None;
        }

        Some(expr_ty)
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn visit_expr(&mut self, expr: &mut ast::Expr) -> Option<TypeId> {
        let ty = self.compute_expr_type(expr);
        expr.ty = ty;
        ty
    }

    fn compute_expr_type(&mut self, expr: &mut ast::Expr) -> Option<TypeId> {
        // The kinds whose checkers need the whole node (to write the decl
        // annotation slot) are dispatched up front.
        if matches!(expr.kind, ExprKind::Call { .. }) {
            return self.check_call(expr);
        }
        if matches!(expr.kind, ExprKind::StructLit { .. }) {
            return self.check_struct_lit(expr);
        }
        if matches!(expr.kind, ExprKind::Member { .. }) {
            return self.check_member(expr);
        }
        if matches!(expr.kind, ExprKind::Unary { .. }) {
            return self.check_unary(expr);
        }
        if let ExprKind::DeclRef { name } = expr.kind {
            return self.check_decl_ref(expr.decl, name, expr.span);
        }

        let span = expr.span;
        match &mut expr.kind {
            ExprKind::IntegerLiteral { .. } => Some(self.sema.builtins.int_ty),
            ExprKind::StringLiteral { .. } => Some(self.sema.builtins.string_ty),
            ExprKind::Cast { ty, operand } => {
                self.visit_type_expr(ty);
                self.visit_expr(operand);
                ty.ty
            }
            ExprKind::Paren(inner) => self.visit_expr(inner),
            ExprKind::Binary { op: _, lhs, rhs } => {
                let lhs_ty = self.visit_expr(lhs);
                let rhs_ty = self.visit_expr(rhs);
                match (lhs_ty, rhs_ty) {
                    (Some(l), Some(r)) if l == r => Some(l),
                    (Some(l), Some(r)) => {
                        self.sema.error(
                            SemaErrorKind::IncompatibleBinaryOperands {
                                lhs: self.sema.type_name(l),
                                rhs: self.sema.type_name(r),
                            },
                            span,
                        );
                        None
                    }
                    _ => None,
                }
            }
            ExprKind::Bad => None,
            ExprKind::Call { .. }
            | ExprKind::StructLit { .. }
            | ExprKind::Member { .. }
            | ExprKind::Unary { .. }
            | ExprKind::DeclRef { .. } => unreachable!("handled above"),
        }
    }

    /// Variables and nominal type declarations expose a type; functions are
    /// not first-class values.
    fn check_decl_ref(&mut self, decl: Option<rill_ast::DeclId>, name: Name, span: Span) -> Option<TypeId> {
        let decl = decl?;
        match self.sema.decl(decl).value_type() {
            Some(ty) => Some(ty),
            None => {
                let text = self.sema.text(name).to_string();
                self.sema.error(SemaErrorKind::NotValue(text), span);
                None
            }
        }
    }

    fn check_call(&mut self, expr: &mut ast::Expr) -> Option<TypeId> {
        let ExprKind::Call {
            args, callee_decl, ..
        } = &mut expr.kind
        else {
            unreachable!();
        };
        let callee_decl = *callee_decl;

        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args.iter_mut() {
            arg_types.push((self.visit_expr(arg), arg.span));
        }

        let callee = callee_decl?;
        let (params, ret_ty) = {
            let func = self.sema.func(callee);
            (func.params.clone(), func.ret_ty)
        };

        // Equality here is identity on canonical types.
        for ((arg_ty, arg_span), param) in arg_types.iter().zip(params.iter()) {
            let arg_ty = (*arg_ty)?;
            let param_ty = self.sema.var(*param).ty?;
            if arg_ty != param_ty {
                self.sema.error(
                    SemaErrorKind::ArgTypeMismatch {
                        expected: self.sema.type_name(param_ty),
                        found: self.sema.type_name(arg_ty),
                    },
                    *arg_span,
                );
                return None;
            }
        }

        ret_ty
    }

    fn check_struct_lit(&mut self, expr: &mut ast::Expr) -> Option<TypeId> {
        let span = expr.span;
        let ExprKind::StructLit { name_expr, fields } = &mut expr.kind else {
            unreachable!();
        };

        let name_ty = self.visit_expr(name_expr);
        for field in fields.iter_mut() {
            self.visit_expr(&mut field.init);
        }

        let ty = name_ty?;
        let struct_decl = match self.sema.struct_decl_of(ty) {
            Some(d) => d,
            None => {
                self.sema
                    .error(SemaErrorKind::NotStruct(self.sema.type_name(ty)), span);
                return None;
            }
        };

        for field in fields.iter() {
            let init_ty = field.init.ty?;
            let field_decl = match self.find_field(struct_decl, field.name) {
                Some(d) => d,
                None => {
                    self.sema.error(
                        SemaErrorKind::NotMember {
                            member: self.sema.text(field.name).to_string(),
                            ty: self.sema.type_name(ty),
                        },
                        field.span,
                    );
                    return None;
                }
            };

            let field_ty = self.sema.var(field_decl).ty?;
            if !typecheck_assign(self.sema, field_ty, init_ty) {
                self.sema.error(
                    SemaErrorKind::AssignTypeMismatch {
                        lhs: self.sema.type_name(field_ty),
                        rhs: self.sema.type_name(init_ty),
                    },
                    field.init.span,
                );
                return None;
            }
        }

        Some(ty)
    }

    /// Looks up the field declaration of a struct by name.
    fn find_field(&self, struct_decl: rill_ast::DeclId, name: Name) -> Option<rill_ast::DeclId> {
        let fields = match self.sema.decl(struct_decl) {
            Decl::Struct(s) => &s.fields,
            _ => return None,
        };
        fields
            .iter()
            .copied()
            .find(|f| self.sema.var(*f).name == Some(name))
    }

    /// Member accesses cannot be fully name-bound without types (e.g.
    /// `f().m`), so their binding is deferred to here.
    fn check_member(&mut self, expr: &mut ast::Expr) -> Option<TypeId> {
        let span = expr.span;
        let (base_ty, base_decl, field) = {
            let ExprKind::Member { base, field } = &mut expr.kind else {
                unreachable!();
            };
            let field = *field;
            let base_ty = self.visit_expr(base);
            let base_decl = lvalue_decl(self.sema, base);
            (base_ty, base_decl, field)
        };
        let base_ty = base_ty?;

        let struct_decl = match self.sema.struct_decl_of(base_ty) {
            Some(d) => d,
            None => {
                self.sema.error(
                    SemaErrorKind::NotStruct(self.sema.type_name(base_ty)),
                    span,
                );
                return None;
            }
        };

        let field_decl = match self.find_field(struct_decl, field) {
            Some(d) => d,
            None => {
                self.sema.error(
                    SemaErrorKind::NotMember {
                        member: self.sema.text(field).to_string(),
                        ty: self.sema.type_name(base_ty),
                    },
                    span,
                );
                return None;
            }
        };
        let field_ty = self.sema.var(field_decl).ty;

        // If the base is an l-value, this member access is one too and
        // needs its own declaration. `x.a` and `y.a` denote different
        // storage even when `x` and `y` share a struct type, so each base
        // gets its own child declaration, materialized on first use.
        if let Some(base_decl) = base_decl {
            let child = match self.sema.find_child(base_decl, field) {
                Some(child) => child,
                None => {
                    let child = self.sema.add_field(base_decl, field, field_ty);
                    let lifetime = self.sema.start_lifetime(child);
                    self.sema.var_mut(child).lifetime = Some(lifetime);
                    child
                }
            };
            expr.decl = Some(child);
        }

        field_ty
    }

    fn check_unary(&mut self, expr: &mut ast::Expr) -> Option<TypeId> {
        let span = expr.span;
        let (op, operand_ty, operand_span, operand_decl) = {
            let ExprKind::Unary { op, operand } = &mut expr.kind else {
                unreachable!();
            };
            let op = *op;
            let operand_ty = self.visit_expr(operand);
            let operand_decl = lvalue_decl(self.sema, operand);
            (op, operand_ty, operand.span, operand_decl)
        };
        let operand_ty = operand_ty?;

        match op {
            ast::UnaryOp::Deref => {
                if !self.sema.ty(operand_ty).is_ref() {
                    self.sema.error(
                        SemaErrorKind::DerefNonRef(self.sema.type_name(operand_ty)),
                        operand_span,
                    );
                    return None;
                }
                let referee = self.sema.ty(operand_ty).referee()?;

                // Bind a temporary declaration that carries the mutability
                // of the reference, so `*v` is assignable iff `v` is a
                // `&var`. Temporaries are not pushed to the scoped tables;
                // nothing ever queries them by name.
                let mutable = self.sema.ty(operand_ty).is_var_ref();
                let mut temp = crate::decl::VarDecl::new(None, VarDeclKind::Local, mutable);
                temp.ty = Some(referee);
                let temp = self.sema.add_decl(Decl::Var(temp));
                expr.decl = Some(temp);

                Some(referee)
            }
            ast::UnaryOp::Ref | ast::UnaryOp::VarRef => {
                let operand_decl = match operand_decl {
                    Some(d) => d,
                    None => {
                        self.sema.error(SemaErrorKind::AddressOfRvalue, span);
                        return None;
                    }
                };

                if op == ast::UnaryOp::VarRef && !self.sema.var(operand_decl).mutable {
                    let name = self.sema.decl_name(operand_decl);
                    self.sema
                        .error(SemaErrorKind::BorrowImmutableAsMutable(name), span);
                    return None;
                }

                let kind = match op {
                    ast::UnaryOp::VarRef => TypeExprKind::VarRef,
                    _ => TypeExprKind::Ref,
                };
                Some(self.sema.derived_type(kind, operand_ty))
            }
        }
    }

    // =========================================================================
    // Type expressions
    // =========================================================================

    /// Tags the type expression with the canonical `Type` matching its
    /// syntactic form.
    fn visit_type_expr(&mut self, t: &mut ast::TypeExpr) -> Option<TypeId> {
        if let Some(sub) = &mut t.subexpr {
            self.visit_type_expr(sub);
        }

        let ty = match t.kind {
            TypeExprKind::Value => {
                // Bound during name binding; its declaration's type is
                // resolved by now in this single sweep over the file.
                let decl = t.decl?;
                self.sema.decl(decl).value_type()?
            }
            TypeExprKind::Ref | TypeExprKind::VarRef | TypeExprKind::Ptr => {
                let sub_ty = t.subexpr.as_ref().and_then(|s| s.ty)?;
                self.sema.derived_type(t.kind, sub_ty)
            }
        };

        t.ty = Some(ty);
        Some(ty)
    }
}
