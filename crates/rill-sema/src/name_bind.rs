//! Name binding pass
//!
//! Links every name-bearing AST node to a semantic declaration: it
//! materializes `Decl`s for variable/function/struct/enum declarations,
//! resolves uses through the scoped declaration table, and diagnoses
//! redefinitions, undeclared uses and call arity mismatches.

use rill_ast as ast;
use rill_ast::{DeclId, ExprKind, Span, StmtKind};

use crate::context::Sema;
use crate::decl::{self, Decl};
use crate::error::SemaErrorKind;

pub struct NameBinder<'a> {
    sema: &'a mut Sema,
}

impl<'a> NameBinder<'a> {
    pub fn run(sema: &'a mut Sema, file: &mut ast::File) {
        log::debug!("name binding: {} toplevel items", file.items.len());
        let mut binder = NameBinder { sema };
        for item in &mut file.items {
            binder.visit_item(item);
        }
    }

    fn visit_item(&mut self, item: &mut ast::Item) {
        match item {
            ast::Item::Func(f) | ast::Item::Extern(f) => self.visit_func_decl(f),
            ast::Item::Struct(s) => self.visit_struct_decl(s),
            ast::Item::Enum(e) => self.visit_enum_decl(e),
        }
    }

    /// Declares `name` at the current scope. Redefinition of the same kind
    /// of entity at the same scope level is an error; shadowing an outer
    /// scope is fine.
    fn declare(&mut self, name: ast::Name, id: DeclId, span: Span) -> bool {
        if let Some((found, level)) = self.sema.decl_table.find(name) {
            let same_kind = std::mem::discriminant(self.sema.decl(found))
                == std::mem::discriminant(self.sema.decl(id));
            if same_kind && level == self.sema.decl_table.level() {
                let text = self.sema.text(name).to_string();
                self.sema.error(SemaErrorKind::Redefinition(text), span);
                return false;
            }
        }

        self.sema.decl_table.insert(name, id);
        true
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn visit_compound_stmt(&mut self, cs: &mut ast::CompoundStmt) {
        self.sema.scope_open();
        for stmt in &mut cs.stmts {
            self.visit_stmt(stmt);
        }
        self.sema.scope_close();
    }

    fn visit_stmt(&mut self, stmt: &mut ast::Stmt) {
        match &mut stmt.kind {
            StmtKind::Decl(decl) => self.visit_decl(decl),
            StmtKind::Expr(expr) => self.visit_expr(expr),
            StmtKind::Assign { lhs, rhs, .. } => {
                self.visit_expr(lhs);
                self.visit_expr(rhs);
            }
            StmtKind::Return { expr } => {
                if let Some(expr) = expr {
                    self.visit_expr(expr);
                }
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

    // =========================================================================
    // Declarations
    // =========================================================================

    fn visit_decl(&mut self, decl: &mut ast::Decl) {
        match decl {
            ast::Decl::Var(v) => self.visit_var_decl(v),
            ast::Decl::Func(f) => self.visit_func_decl(f),
            ast::Decl::Struct(s) => self.visit_struct_decl(s),
            ast::Decl::Enum(e) => self.visit_enum_decl(e),
        }
    }

    fn visit_var_decl(&mut self, v: &mut ast::VarDecl) {
        // Children first, so `let x = x` resolves the RHS to an outer `x`
        // (or fails) before this binding exists.
        if let Some(type_expr) = &mut v.type_expr {
            self.visit_type_expr(type_expr);
        }
        if let Some(init) = &mut v.init {
            self.visit_expr(init);
        }

        let mut var = decl::VarDecl::new(Some(v.name), v.kind, v.mutable);
        var.annot = v.type_expr.as_ref().and_then(|t| t.lifetime);
        let id = self.sema.add_decl(Decl::Var(var));
        v.decl = Some(id);

        self.declare(v.name, id, v.span);
    }

    fn visit_func_decl(&mut self, f: &mut ast::FuncDecl) {
        let sig_ret_annot = f.ret_type_expr.as_ref().and_then(|t| t.lifetime);
        let func = decl::FuncDecl::new(f.name, f.body.is_some(), sig_ret_annot);
        let id = self.sema.add_decl(Decl::Func(func));
        f.decl = Some(id);

        if !self.declare(f.name, id, f.span) {
            return;
        }

        // Scope for the parameters; the body block opens its own nested
        // scope, so locals may shadow parameters.
        self.sema.decl_table.open();

        if let Some(ret) = &mut f.ret_type_expr {
            self.visit_type_expr(ret);
        }
        for param in &mut f.params {
            self.visit_var_decl(param);
        }
        let params: Vec<DeclId> = f.params.iter().filter_map(|p| p.decl).collect();
        self.sema.func_mut(id).params = params;

        if let Some(body) = &mut f.body {
            self.visit_compound_stmt(body);
        }

        self.sema.decl_table.close();
    }

    fn visit_struct_decl(&mut self, s: &mut ast::StructDecl) {
        let id = self.sema.add_decl(Decl::Struct(decl::StructDecl {
            name: s.name,
            fields: Vec::new(),
            ty: None,
        }));
        s.decl = Some(id);

        if !self.declare(s.name, id, s.span) {
            return;
        }

        // The scope exists to catch duplicate field names via the ordinary
        // redefinition check.
        self.sema.decl_table.open();
        for field in &mut s.fields {
            self.visit_var_decl(field);
        }
        self.sema.decl_table.close();

        let fields: Vec<DeclId> = s.fields.iter().filter_map(|f| f.decl).collect();
        match self.sema.decl_mut(id) {
            Decl::Struct(sd) => sd.fields = fields,
            _ => unreachable!(),
        }
    }

    fn visit_enum_decl(&mut self, e: &mut ast::EnumDecl) {
        let id = self.sema.add_decl(Decl::Enum(decl::EnumDecl {
            name: e.name,
            variants: Vec::new(),
            ty: None,
        }));
        e.decl = Some(id);

        if !self.declare(e.name, id, e.span) {
            return;
        }

        self.sema.decl_table.open();
        let mut variants = Vec::new();
        for variant in &mut e.variants {
            for field in &mut variant.fields {
                self.visit_type_expr(field);
            }
            let vid = self.sema.add_decl(Decl::Variant(decl::VariantDecl {
                name: variant.name,
                ty: None,
            }));
            variant.decl = Some(vid);
            if self.declare(variant.name, vid, variant.span) {
                variants.push(vid);
            }
        }
        self.sema.decl_table.close();

        match self.sema.decl_mut(id) {
            Decl::Enum(ed) => ed.variants = variants,
            _ => unreachable!(),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn visit_expr(&mut self, expr: &mut ast::Expr) {
        if matches!(expr.kind, ExprKind::Call { .. }) {
            self.visit_call_expr(expr);
            return;
        }
        if let ExprKind::DeclRef { name } = expr.kind {
            match self.sema.decl_table.find(name) {
                Some((id, _)) => expr.decl = Some(id),
                None => {
                    let text = self.sema.text(name).to_string();
                    self.sema
                        .error(SemaErrorKind::UndeclaredIdent(text), expr.span);
                }
            }
            return;
        }

        match &mut expr.kind {
            ExprKind::StructLit { name_expr, fields } => {
                self.visit_expr(name_expr);
                for field in fields {
                    self.visit_expr(&mut field.init);
                }
            }
            ExprKind::Cast { ty, operand } => {
                self.visit_type_expr(ty);
                self.visit_expr(operand);
            }
            ExprKind::Member { base, .. } => {
                // The member name cannot be resolved until the base's type
                // is known (e.g. `f().m`); that happens in the type checker.
                self.visit_expr(base);
            }
            ExprKind::Paren(inner) => self.visit_expr(inner),
            ExprKind::Unary { operand, .. } => self.visit_expr(operand),
            ExprKind::Binary { lhs, rhs, .. } => {
                self.visit_expr(lhs);
                self.visit_expr(rhs);
            }
            ExprKind::IntegerLiteral { .. }
            | ExprKind::StringLiteral { .. }
            | ExprKind::Bad => {}
            ExprKind::DeclRef { .. } | ExprKind::Call { .. } => unreachable!("handled above"),
        }
    }

    fn visit_call_expr(&mut self, expr: &mut ast::Expr) {
        let span = expr.span;
        let ExprKind::Call {
            callee,
            args,
            callee_decl,
        } = &mut expr.kind
        else {
            unreachable!();
        };
        let callee = *callee;

        let found = match self.sema.decl_table.find(callee) {
            Some((id, _)) => id,
            None => {
                let text = self.sema.text(callee).to_string();
                self.sema
                    .error(SemaErrorKind::UndeclaredFunction(text), span);
                return;
            }
        };

        if !matches!(self.sema.decl(found), Decl::Func(_)) {
            let text = self.sema.text(callee).to_string();
            self.sema.error(SemaErrorKind::NotFunction(text), span);
            return;
        }
        *callee_decl = Some(found);

        for arg in args.iter_mut() {
            self.visit_expr(arg);
        }

        let expected = self.sema.func(found).params.len();
        if expected != args.len() {
            let text = self.sema.text(callee).to_string();
            let found_count = args.len();
            self.sema.error(
                SemaErrorKind::ArityMismatch {
                    name: text,
                    expected,
                    found: found_count,
                },
                span,
            );
        }
    }

    // =========================================================================
    // Type expressions
    // =========================================================================

    /// Name binding of type expressions only links existing declarations to
    /// the type names used; declaring new types happens in the `*Decl`
    /// visitors. Reference and pointer forms resolve through their referee.
    fn visit_type_expr(&mut self, t: &mut ast::TypeExpr) {
        if let Some(sub) = &mut t.subexpr {
            self.visit_type_expr(sub);
            return;
        }

        match self.sema.decl_table.find(t.name) {
            Some((id, _)) if self.sema.decl(id).is_type() => {
                t.decl = Some(id);
            }
            _ => {
                let text = self.sema.text(t.name).to_string();
                self.sema.error(SemaErrorKind::UndeclaredType(text), t.span);
            }
        }
    }
}
