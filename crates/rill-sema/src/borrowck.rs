//! Borrow and lifetime checking pass
//!
//! Enforces the aliasing and lifetime discipline:
//!
//! - move vs copy: `<-` moves its RHS; declarations with an initializer
//!   always move. A moved-from variable is poisoned for the rest of its
//!   scope.
//! - borrow counting: outstanding `&`/`&var` borrows are tracked per
//!   declaration in a scoped table, so scope exit releases them naturally.
//! - lifetimes: every declaration gets an exact lifetime on entry; a
//!   reference variable additionally records its borrowee's lifetime,
//!   propagated through initializers, struct literals and calls (with
//!   lifetime coercion at call sites).
//! - signature rules: once one parameter carries a lifetime annotation,
//!   every reference parameter and a reference return type must be
//!   annotated consistently.

use rill_ast as ast;
use rill_ast::{DeclId, ExprKind, Name, Span, StmtKind, UnaryOp, VarDeclKind};

use crate::context::Sema;
use crate::env::BorrowCounts;
use crate::error::SemaErrorKind;
use crate::helpers::{behind_ref, is_func_call, is_lvalue, is_ref_expr, lvalue_decl};
use crate::lifetime::{Lifetime, LifetimeId};

pub struct BorrowChecker<'a> {
    sema: &'a mut Sema,
    in_annotated_func: bool,
}

impl<'a> BorrowChecker<'a> {
    pub fn run(sema: &'a mut Sema, file: &ast::File) {
        log::debug!("borrow checking");
        let mut checker = BorrowChecker {
            sema,
            in_annotated_func: false,
        };
        for item in &file.items {
            checker.visit_item(item);
        }
    }

    fn visit_item(&mut self, item: &ast::Item) {
        match item {
            ast::Item::Func(f) | ast::Item::Extern(f) => self.visit_func_decl(f),
            ast::Item::Struct(_) | ast::Item::Enum(_) => {}
        }
    }

    // =========================================================================
    // Functions and signature annotation rules
    // =========================================================================

    fn visit_func_decl(&mut self, f: &ast::FuncDecl) {
        let saved = self.in_annotated_func;
        self.in_annotated_func = f
            .params
            .iter()
            .any(|p| p.type_expr.as_ref().is_some_and(|t| t.lifetime.is_some()));

        if self.in_annotated_func && !self.check_signature_annotations(f) {
            self.in_annotated_func = saved;
            return;
        }

        // The function's own scope lifetime; anything bound deeper than
        // this is a local of the function.
        if let Some(id) = f.decl {
            let lifetime = self.sema.start_lifetime(id);
            self.sema.func_mut(id).scope_lifetime = Some(lifetime);
            self.sema.func_stack.push(id);
        }

        for param in &f.params {
            self.visit_var_decl(param);
        }
        if let Some(body) = &f.body {
            self.visit_compound_stmt(body);
        }

        if f.decl.is_some() {
            self.sema.func_stack.pop();
        }
        self.in_annotated_func = saved;
    }

    /// Once any parameter is annotated the whole signature must be: every
    /// reference parameter carries an annotation, and a reference return
    /// type carries one of the parameters' annotations.
    fn check_signature_annotations(&mut self, f: &ast::FuncDecl) -> bool {
        let mut declared = Vec::new();
        for param in &f.params {
            let Some(type_expr) = &param.type_expr else {
                continue;
            };
            if type_expr.is_ref() && type_expr.lifetime.is_none() {
                self.sema
                    .error(SemaErrorKind::MissingLifetimeAnnotation, param.span);
                return false;
            }
            declared.push(type_expr.lifetime);
        }

        if let Some(ret) = &f.ret_type_expr {
            if ret.is_ref() {
                let Some(annot) = ret.lifetime else {
                    self.sema
                        .error(SemaErrorKind::MissingLifetimeAnnotation, ret.span);
                    return false;
                };
                if !declared.contains(&Some(annot)) {
                    let text = self.sema.text(annot).to_string();
                    self.sema
                        .error(SemaErrorKind::UnknownLifetimeAnnotation(text), ret.span);
                    return false;
                }
                if let Some(id) = f.decl {
                    self.sema.func_mut(id).ret_lifetime_annot = Some(annot);
                }
            }
        }

        true
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn visit_compound_stmt(&mut self, cs: &ast::CompoundStmt) {
        self.sema.scope_open();
        for stmt in &cs.stmts {
            self.visit_stmt(stmt);
        }
        self.sema.scope_close();
    }

    fn visit_stmt(&mut self, stmt: &ast::Stmt) {
        match &stmt.kind {
            StmtKind::Decl(decl) => self.visit_decl(decl),
            StmtKind::Expr(expr) => self.visit_expr(expr),
            StmtKind::Assign { lhs, rhs, is_move } => {
                // RHS first, so a move is detected before the LHS would
                // overwrite any of its state.
                self.visit_expr(rhs);
                self.visit_expr(lhs);
                if let Some(lhs_decl) = lvalue_decl(self.sema, lhs) {
                    self.check_assign(lhs_decl, rhs, *is_move);
                }
            }
            StmtKind::Return { expr } => self.visit_return_stmt(expr.as_ref(), stmt.span),
            StmtKind::If(if_stmt) => self.visit_if_stmt(if_stmt),
            StmtKind::Compound(cs) => self.visit_compound_stmt(cs),
            StmtKind::Builtin { .. } | StmtKind::Bad => {}
        }
    }

    fn visit_if_stmt(&mut self, if_stmt: &ast::IfStmt) {
        self.visit_expr(&if_stmt.cond);
        self.visit_compound_stmt(&if_stmt.then_body);
        if let Some(else_if) = &if_stmt.else_if {
            self.visit_if_stmt(else_if);
        }
        if let Some(else_body) = &if_stmt.else_body {
            self.visit_compound_stmt(else_body);
        }
    }

    fn visit_decl(&mut self, decl: &ast::Decl) {
        match decl {
            ast::Decl::Var(v) => self.visit_var_decl(v),
            ast::Decl::Func(f) => self.visit_func_decl(f),
            ast::Decl::Struct(_) | ast::Decl::Enum(_) => {}
        }
    }

    fn visit_var_decl(&mut self, v: &ast::VarDecl) {
        if let Some(init) = &v.init {
            self.visit_expr(init);
        }

        let Some(id) = v.decl else { return };

        // The variable and its field children come alive here; scope exit
        // kills the lifetimes again via the scoped table.
        let lifetime = self.sema.start_lifetime(id);
        self.sema.var_mut(id).lifetime = Some(lifetime);
        let children: Vec<DeclId> = self
            .sema
            .var(id)
            .children
            .iter()
            .map(|(_, child)| *child)
            .collect();
        for child in children {
            let lifetime = self.sema.start_lifetime(child);
            self.sema.var_mut(child).lifetime = Some(lifetime);
        }

        if let Some(init) = &v.init {
            // A declaration initializer always transfers the value.
            self.check_assign(id, init, true);
        } else if let Some(annot) = v.type_expr.as_ref().and_then(|t| t.lifetime) {
            if v.kind == VarDeclKind::Param {
                // The annotation is the only lifetime information a
                // signature can give about the referee.
                let lifetime = self.sema.start_annotated_lifetime(annot);
                self.sema.var_mut(id).borrowee_lifetime = Some(lifetime);
            } else {
                self.sema.error(SemaErrorKind::AnnotationOnLocal, v.span);
            }
        }
    }

    fn visit_return_stmt(&mut self, expr: Option<&ast::Expr>, span: Span) {
        let Some(expr) = expr else { return };

        self.visit_expr(expr);

        // Any use-after-free inside the expression was caught just above;
        // what is left is whether the returned reference outlives the
        // function.
        let Some(ty) = expr.ty else { return };
        if !self.sema.ty(ty).is_ref() {
            return;
        }
        let Some(lifetime) = self.lifetime_of_reference(expr) else {
            return;
        };
        let Some(&func_id) = self.sema.func_stack.last() else {
            return;
        };

        match *self.sema.lifetime(lifetime) {
            Lifetime::Annotated { annot } => {
                let expected = self.sema.func(func_id).sig_ret_annot;
                if expected != Some(annot) {
                    let expected = expected
                        .map(|n| self.sema.text(n).to_string())
                        .unwrap_or_else(|| "_".to_string());
                    let found = self.sema.text(annot).to_string();
                    self.sema
                        .error(SemaErrorKind::LifetimeMismatch { expected, found }, span);
                }
            }
            Lifetime::Exact { decl } => {
                let func_level = self
                    .sema
                    .func(func_id)
                    .scope_lifetime
                    .and_then(|lt| self.sema.lifetime_table.find(lt))
                    .map(|(_, level)| level);
                let borrowee_level = self
                    .sema
                    .lifetime_table
                    .find(lifetime)
                    .map(|(_, level)| level);

                if let (Some(func_level), Some(borrowee_level)) = (func_level, borrowee_level) {
                    if borrowee_level > func_level {
                        let name = self.sema.decl_name(decl);
                        self.sema
                            .error(SemaErrorKind::ReturnsLocalRef(name), span);
                    }
                }
            }
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn visit_expr(&mut self, expr: &ast::Expr) {
        // Use-of-moved is a pre-order check so the traversal stops at the
        // first offending access.
        if let Some(decl) = lvalue_decl(self.sema, expr) {
            if self.sema.var(decl).moved {
                self.sema.error(SemaErrorKind::UseOfMoved, expr.span);
                return;
            }
        }

        match &expr.kind {
            ExprKind::DeclRef { .. } => self.check_ref_liveness(expr),
            ExprKind::Call { args, .. } => {
                for arg in args {
                    self.visit_expr(arg);
                }
            }
            ExprKind::StructLit { fields, .. } => {
                for field in fields {
                    self.visit_expr(&field.init);
                }
            }
            ExprKind::Cast { operand, .. } => self.visit_expr(operand),
            ExprKind::Member { base, .. } => self.visit_expr(base),
            ExprKind::Paren(inner) => self.visit_expr(inner),
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Ref | UnaryOp::VarRef => {
                    self.visit_expr(operand);
                    if let Some(borrowee) = lvalue_decl(self.sema, operand) {
                        self.register_borrow(borrowee, *op == UnaryOp::VarRef, expr.span);
                    }
                }
                UnaryOp::Deref => self.visit_expr(operand),
            },
            ExprKind::Binary { lhs, rhs, .. } => {
                self.visit_expr(lhs);
                self.visit_expr(rhs);
            }
            ExprKind::IntegerLiteral { .. }
            | ExprKind::StringLiteral { .. }
            | ExprKind::Bad => {}
        }
    }

    /// At every use of a reference variable, its borrowee must still be
    /// alive: a variable of some lifetime may only refer to values that
    /// outlive it.
    fn check_ref_liveness(&mut self, expr: &ast::Expr) {
        let Some(decl) = expr.decl else { return };
        let Some(var) = self.sema.as_var(decl) else {
            return;
        };
        let Some(borrowee) = var.borrowee_lifetime else {
            return;
        };

        if self.sema.lifetime(borrowee).is_exact() && !self.sema.lifetime_alive(borrowee) {
            let name = self
                .sema
                .lifetime(borrowee)
                .decl()
                .map(|d| self.sema.decl_name(d))
                .unwrap_or_else(|| "<temporary>".to_string());
            self.sema
                .error(SemaErrorKind::DoesNotLiveLongEnough(name), expr.span);
        }
    }

    // =========================================================================
    // Borrow counting
    // =========================================================================

    /// Records a borrow of `borrowee` in the current scope. A single
    /// outstanding mutable borrow excludes all others; any outstanding
    /// immutable borrow excludes a new mutable one.
    fn register_borrow(&mut self, borrowee: DeclId, mutable: bool, span: Span) {
        let counts = self
            .sema
            .borrow_table
            .find(borrowee)
            .map(|(c, _)| c)
            .unwrap_or_default();

        if counts.mutable > 0 {
            let name = self.sema.decl_name(borrowee);
            self.sema
                .error(SemaErrorKind::BorrowConflictWithMutable(name), span);
            return;
        }
        if counts.immutable > 0 && mutable {
            let name = self.sema.decl_name(borrowee);
            self.sema
                .error(SemaErrorKind::BorrowConflictWithImmutable(name), span);
            return;
        }

        self.sema.borrow_table.insert(
            borrowee,
            BorrowCounts {
                immutable: counts.immutable + u32::from(!mutable),
                mutable: counts.mutable + u32::from(mutable),
            },
        );
    }

    fn borrow_counts(&self, decl: DeclId) -> BorrowCounts {
        self.sema
            .borrow_table
            .find(decl)
            .map(|(c, _)| c)
            .unwrap_or_default()
    }

    // =========================================================================
    // Assignment flow: moves and borrowee lifetimes
    // =========================================================================

    /// Value-flow bookkeeping for `v = rhs` / `v <- rhs`, shared by
    /// assignment statements and declaration initializers.
    fn check_assign(&mut self, v: DeclId, rhs: &ast::Expr, is_move: bool) {
        let Some(rhs_ty) = rhs.ty else { return };
        // Builtin values copy freely; nothing to track.
        if self.sema.is_builtin_type(rhs_ty) {
            return;
        }

        // Struct literals recurse per designator into the matching child,
        // so reference fields are tracked like direct reference bindings.
        if let ExprKind::StructLit { fields, .. } = &rhs.kind {
            for field in fields {
                if is_ref_expr(&field.init) {
                    if let Some(child) = self.sema.find_child(v, field.name) {
                        self.check_assign(child, &field.init, is_move);
                    }
                }
            }
            return;
        }

        if self.sema.ty(rhs_ty).is_ref() {
            if let Some(lifetime) = self.lifetime_of_reference(rhs) {
                self.sema.var_mut(v).borrowee_lifetime = Some(lifetime);
            }

            if is_lvalue(self.sema, rhs) {
                // Copying (or moving) an existing borrow: the borrowee
                // lifetime travels with it.
                if is_move {
                    if let Some(rhs_decl) = lvalue_decl(self.sema, rhs) {
                        self.sema.var_mut(rhs_decl).moved = true;
                    }
                }
            } else if is_ref_expr(rhs) {
                // A fresh borrow: mark the borrowee. Borrowing a field
                // borrows from the whole struct, so the flag lands on the
                // root of the member chain.
                let ExprKind::Unary { operand, .. } = &rhs.kind else {
                    unreachable!();
                };
                if let Some(decl) = lvalue_decl(self.sema, operand) {
                    let root = self.sema.root_parent(decl);
                    self.sema.var_mut(root).borrowed = true;
                }
            }
            // A call's reference result needs no flags here; its lifetime
            // was already coerced above.
            return;
        }

        if is_move && is_lvalue(self.sema, rhs) {
            // Moving out through a reference would invalidate every later
            // access through it.
            if let Some(reference) = behind_ref(self.sema, rhs) {
                self.sema.error(
                    SemaErrorKind::MoveOutOfReference {
                        moved: self.sema.snippet(rhs.span).to_string(),
                        invalidated: self.sema.decl_name(reference),
                    },
                    rhs.span,
                );
                return;
            }

            let rhs_decl = match lvalue_decl(self.sema, rhs) {
                Some(d) => d,
                None => return,
            };

            let counts = self.borrow_counts(rhs_decl);
            if counts.mutable > 0 || counts.immutable > 0 {
                self.sema.error(
                    SemaErrorKind::MoveWhileBorrowed(self.sema.snippet(rhs.span).to_string()),
                    rhs.span,
                );
                return;
            }

            self.sema.var_mut(rhs_decl).moved = true;
        }
    }

    // =========================================================================
    // Lifetimes of references
    // =========================================================================

    /// The lifetime of the value a reference expression refers to. Not the
    /// lifetime of the reference variable itself, but of its referee.
    fn lifetime_of_reference(&mut self, expr: &ast::Expr) -> Option<LifetimeId> {
        let ty = expr.ty?;
        if !self.sema.ty(ty).is_ref() {
            return None;
        }

        if let Some(decl) = lvalue_decl(self.sema, expr) {
            // An l-value reference variable, e.g. `p: &int`.
            return self.sema.var(decl).borrowee_lifetime;
        }

        if is_ref_expr(expr) {
            // An explicit borrow, e.g. `&a` or `&m.a`. Borrowing from a
            // field borrows from the whole struct, so a member operand
            // resolves to the root of its chain.
            let ExprKind::Unary { operand, .. } = &expr.kind else {
                unreachable!();
            };
            let decl = lvalue_decl(self.sema, operand)?;
            if matches!(operand.kind, ExprKind::Member { .. }) {
                let root = self.sema.root_parent(decl);
                return self.sema.var(root).lifetime;
            }
            return self.sema.var(decl).lifetime;
        }

        if is_func_call(expr) {
            return self.lifetime_of_call(expr);
        }

        None
    }

    /// Maps each reference-typed actual's lifetime to the callee's
    /// parameter annotation and picks, among the ones matching the return
    /// annotation, the deepest scope level. That is lifetime coercion:
    /// when several inputs share the returned annotation, the result lives
    /// only as long as the shortest-lived of them.
    fn lifetime_of_call(&mut self, expr: &ast::Expr) -> Option<LifetimeId> {
        let ExprKind::Call {
            args, callee_decl, ..
        } = &expr.kind
        else {
            unreachable!();
        };
        let callee = (*callee_decl)?;

        let params = self.sema.func(callee).params.clone();
        let ret_annot = self.sema.func(callee).ret_lifetime_annot?;

        let mut map: Vec<(Name, LifetimeId)> = Vec::new();
        for (param, arg) in params.iter().zip(args.iter()) {
            let is_ref = self
                .sema
                .var(*param)
                .ty
                .is_some_and(|t| self.sema.ty(t).is_ref());
            if !is_ref {
                continue;
            }
            let annot = self.sema.var(*param).annot?;
            let lifetime = self.lifetime_of_reference(arg)?;
            map.push((annot, lifetime));
        }

        let mut shortest: Option<(LifetimeId, usize)> = None;
        for (annot, lifetime) in map {
            if annot != ret_annot {
                continue;
            }
            let level = self
                .sema
                .lifetime_table
                .find(lifetime)
                .map(|(_, level)| level)?;
            match shortest {
                Some((_, best)) if level <= best => {}
                _ => shortest = Some((lifetime, level)),
            }
        }

        shortest.map(|(lifetime, _)| lifetime)
    }
}
