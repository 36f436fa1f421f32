//! # Rill Code Emitter
//!
//! Translates a fully analyzed AST into equivalent C source. The emitter
//! is a deliberate mirror of the tree: every expression and statement maps
//! one-to-one onto its C spelling, references become pointers, and builtin
//! statement lines pass through verbatim. No optimization happens here.

mod error;

pub use error::CodegenError;

use rill_ast as ast;
use rill_ast::{ExprKind, StmtKind, TypeId, UnaryOp};
use rill_sema::{Decl, Sema, TypeKind};

/// Emits C source for a checked file.
pub fn generate(sema: &Sema, file: &ast::File) -> Result<String, CodegenError> {
    let mut generator = CodeGenerator::new(sema);
    generator.emit_file(file)?;
    Ok(generator.out)
}

struct CodeGenerator<'a> {
    sema: &'a Sema,
    out: String,
    indent: usize,
}

impl<'a> CodeGenerator<'a> {
    fn new(sema: &'a Sema) -> Self {
        Self {
            sema,
            out: String::new(),
            indent: 0,
        }
    }

    // =========================================================================
    // Output helpers
    // =========================================================================

    fn emit(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn emit_line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn emit_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// C spelling of a canonical type. References and pointers both lower
    /// to C pointers; mutability is erased at this point, the checker
    /// already enforced it.
    fn c_type(&self, ty: TypeId) -> String {
        let t = self.sema.ty(ty);
        match &t.kind {
            TypeKind::Value { .. } => {
                let name = self.sema.text(t.name);
                match name {
                    "void" => "void".to_string(),
                    "int" => "long".to_string(),
                    "char" => "char".to_string(),
                    "bool" => "bool".to_string(),
                    "string" => "const char *".to_string(),
                    other => other.to_string(),
                }
            }
            TypeKind::Ref { referee } | TypeKind::VarRef { referee } | TypeKind::Ptr { referee } => {
                format!("{} *", self.c_type(*referee))
            }
        }
    }

    fn decl_type(&self, v: &ast::VarDecl) -> Result<TypeId, CodegenError> {
        v.decl
            .and_then(|d| match self.sema.decl(d) {
                Decl::Var(var) => var.ty,
                _ => None,
            })
            .ok_or_else(|| CodegenError::UntypedDecl(self.sema.text(v.name).to_string()))
    }

    // =========================================================================
    // File structure
    // =========================================================================

    fn emit_file(&mut self, file: &ast::File) -> Result<(), CodegenError> {
        self.emit_line("#include <stdbool.h>");
        self.emit_line("#include <stdio.h>");
        self.emit_line("#include <stdlib.h>");
        self.emit_line("#include <string.h>");
        self.emit_line("");

        for item in &file.items {
            match item {
                ast::Item::Struct(s) => self.emit_struct_decl(s)?,
                ast::Item::Enum(e) => self.emit_enum_decl(e)?,
                ast::Item::Extern(f) => {
                    self.emit_func_header(f)?;
                    self.emit(";\n\n");
                }
                ast::Item::Func(f) => self.emit_func_decl(f)?,
            }
        }

        Ok(())
    }

    fn emit_struct_decl(&mut self, s: &ast::StructDecl) -> Result<(), CodegenError> {
        let name = self.sema.text(s.name).to_string();
        self.emit_line(&format!("typedef struct {} {{", name));
        self.indent += 1;
        for field in &s.fields {
            let ty = self.decl_type(field)?;
            let line = format!(
                "{} {};",
                self.c_type(ty),
                self.sema.text(field.name)
            );
            self.emit_line(&line);
        }
        self.indent -= 1;
        self.emit_line(&format!("}} {};", name));
        self.emit_line("");
        Ok(())
    }

    fn emit_enum_decl(&mut self, e: &ast::EnumDecl) -> Result<(), CodegenError> {
        let name = self.sema.text(e.name).to_string();
        self.emit_line(&format!("typedef enum {} {{", name));
        self.indent += 1;
        for variant in &e.variants {
            let line = format!("{},", self.sema.text(variant.name));
            self.emit_line(&line);
        }
        self.indent -= 1;
        self.emit_line(&format!("}} {};", name));
        self.emit_line("");
        Ok(())
    }

    fn emit_func_header(&mut self, f: &ast::FuncDecl) -> Result<(), CodegenError> {
        let ret = match &f.ret_type_expr {
            Some(te) => te.ty.ok_or_else(|| {
                CodegenError::UntypedReturn(self.sema.text(f.name).to_string())
            })?,
            None => self.sema.builtins.void_ty,
        };
        let ret = self.c_type(ret);
        self.emit(&format!("{} {}(", ret, self.sema.text(f.name)));

        if f.params.is_empty() {
            self.emit("void");
        }
        for (i, param) in f.params.iter().enumerate() {
            if i > 0 {
                self.emit(", ");
            }
            let ty = self.decl_type(param)?;
            let text = format!("{} {}", self.c_type(ty), self.sema.text(param.name));
            self.emit(&text);
        }
        self.emit(")");
        Ok(())
    }

    fn emit_func_decl(&mut self, f: &ast::FuncDecl) -> Result<(), CodegenError> {
        self.emit_func_header(f)?;
        let body = f
            .body
            .as_ref()
            .ok_or_else(|| CodegenError::MissingBody(self.sema.text(f.name).to_string()))?;
        self.emit(" ");
        self.emit_compound_stmt(body)?;
        self.emit("\n");
        Ok(())
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn emit_compound_stmt(&mut self, cs: &ast::CompoundStmt) -> Result<(), CodegenError> {
        self.emit("{\n");
        self.indent += 1;
        for stmt in &cs.stmts {
            self.emit_stmt(stmt)?;
        }
        self.indent -= 1;
        self.emit_indent();
        self.emit("}");
        Ok(())
    }

    fn emit_stmt(&mut self, stmt: &ast::Stmt) -> Result<(), CodegenError> {
        match &stmt.kind {
            StmtKind::Decl(decl) => self.emit_decl_stmt(decl)?,
            StmtKind::Expr(expr) => {
                self.emit_indent();
                self.emit_expr(expr)?;
                self.emit(";\n");
            }
            StmtKind::Assign { lhs, rhs, .. } => {
                // A move writes the same C as a copy; invalidation of the
                // source is purely a compile-time notion.
                self.emit_indent();
                self.emit_expr(lhs)?;
                self.emit(" = ");
                self.emit_expr(rhs)?;
                self.emit(";\n");
            }
            StmtKind::Return { expr } => {
                self.emit_indent();
                match expr {
                    Some(expr) => {
                        self.emit("return ");
                        self.emit_expr(expr)?;
                        self.emit(";\n");
                    }
                    None => self.emit("return;\n"),
                }
            }
            StmtKind::If(if_stmt) => {
                self.emit_indent();
                self.emit_if_stmt(if_stmt)?;
                self.emit("\n");
            }
            StmtKind::Compound(cs) => {
                self.emit_indent();
                self.emit_compound_stmt(cs)?;
                self.emit("\n");
            }
            StmtKind::Builtin { text } => {
                self.emit_line(text.trim());
            }
            StmtKind::Bad => return Err(CodegenError::MalformedNode),
        }
        Ok(())
    }

    fn emit_decl_stmt(&mut self, decl: &ast::Decl) -> Result<(), CodegenError> {
        match decl {
            ast::Decl::Var(v) => {
                let ty = self.decl_type(v)?;
                self.emit_indent();
                let text = format!("{} {}", self.c_type(ty), self.sema.text(v.name));
                self.emit(&text);
                if let Some(init) = &v.init {
                    self.emit(" = ");
                    self.emit_expr(init)?;
                }
                self.emit(";\n");
            }
            ast::Decl::Struct(s) => self.emit_struct_decl(s)?,
            ast::Decl::Enum(e) => self.emit_enum_decl(e)?,
            ast::Decl::Func(f) => {
                // The checker accepts nested functions but the emitter
                // draws the line.
                return Err(CodegenError::NestedFunction(
                    self.sema.text(f.name).to_string(),
                ));
            }
        }
        Ok(())
    }

    fn emit_if_stmt(&mut self, if_stmt: &ast::IfStmt) -> Result<(), CodegenError> {
        self.emit("if (");
        self.emit_expr(&if_stmt.cond)?;
        self.emit(") ");
        self.emit_compound_stmt(&if_stmt.then_body)?;

        if let Some(else_if) = &if_stmt.else_if {
            self.emit(" else ");
            self.emit_if_stmt(else_if)?;
        } else if let Some(else_body) = &if_stmt.else_body {
            self.emit(" else ");
            self.emit_compound_stmt(else_body)?;
        }
        Ok(())
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn emit_expr(&mut self, expr: &ast::Expr) -> Result<(), CodegenError> {
        match &expr.kind {
            ExprKind::IntegerLiteral { value } => self.emit(&value.to_string()),
            ExprKind::StringLiteral { value } => {
                let escaped = escape_c_string(value);
                self.emit(&format!("\"{}\"", escaped));
            }
            ExprKind::DeclRef { name } => {
                let text = self.sema.text(*name).to_string();
                self.emit(&text);
            }
            ExprKind::Call { callee, args, .. } => {
                let name = self.sema.text(*callee).to_string();
                self.emit(&name);
                self.emit("(");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.emit(", ");
                    }
                    self.emit_expr(arg)?;
                }
                self.emit(")");
            }
            ExprKind::StructLit { fields, .. } => {
                let ty = expr.ty.ok_or(CodegenError::UntypedExpr)?;
                let text = format!("({}){{", self.c_type(ty));
                self.emit(&text);
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        self.emit(", ");
                    }
                    let designator = format!(".{} = ", self.sema.text(field.name));
                    self.emit(&designator);
                    self.emit_expr(&field.init)?;
                }
                self.emit("}");
            }
            ExprKind::Cast { ty, operand } => {
                let target = ty.ty.ok_or(CodegenError::UntypedExpr)?;
                let text = format!("(({})(", self.c_type(target));
                self.emit(&text);
                self.emit_expr(operand)?;
                self.emit("))");
            }
            ExprKind::Member { base, field } => {
                self.emit_expr(base)?;
                let text = format!(".{}", self.sema.text(*field));
                self.emit(&text);
            }
            ExprKind::Paren(inner) => {
                self.emit("(");
                self.emit_expr(inner)?;
                self.emit(")");
            }
            ExprKind::Unary { op, operand } => {
                match op {
                    UnaryOp::Ref | UnaryOp::VarRef => self.emit("&"),
                    UnaryOp::Deref => self.emit("*"),
                }
                self.emit_expr(operand)?;
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.emit_expr(lhs)?;
                let text = format!(" {} ", op);
                self.emit(&text);
                self.emit_expr(rhs)?;
            }
            ExprKind::Bad => return Err(CodegenError::MalformedNode),
        }
        Ok(())
    }
}

fn escape_c_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_ast::NameTable;
    use rill_lexer::Lexer;

    fn emit(source: &str) -> String {
        let tokens = Lexer::new(source).tokenize();
        let mut names = NameTable::new();
        let mut file = rill_parser::parse(tokens, &mut names).expect("parse");
        let sema = rill_sema::analyze(&mut file, names, source).expect("analyze");
        generate(&sema, &file).expect("generate")
    }

    #[test]
    fn emits_function_with_return() {
        let c = emit("fn answer() -> int { return 42 }");
        assert!(c.contains("long answer(void) {"), "got:\n{}", c);
        assert!(c.contains("return 42;"));
    }

    #[test]
    fn emits_struct_and_member_access() {
        let c = emit(
            "struct Point { x: int, y: int }\n\
             fn get(p: Point) -> int { return p.x }",
        );
        assert!(c.contains("typedef struct Point {"), "got:\n{}", c);
        assert!(c.contains("long x;"));
        assert!(c.contains("return p.x;"));
    }

    #[test]
    fn references_lower_to_pointers() {
        let c = emit("fn deref(p: &int) -> int { return *p }");
        assert!(c.contains("long deref(long * p)"), "got:\n{}", c);
        assert!(c.contains("return *p;"));
    }

    #[test]
    fn infers_declared_variable_types() {
        let c = emit("fn f() { let x = 1\n let s = \"hi\" }");
        assert!(c.contains("long x = 1;"), "got:\n{}", c);
        assert!(c.contains("const char * s = \"hi\";"));
    }

    #[test]
    fn builtin_lines_pass_through() {
        let c = emit("fn f() { #printf(\"hello\\n\"); \n }");
        assert!(c.contains("printf(\"hello\\n\");"), "got:\n{}", c);
    }

    #[test]
    fn extern_headers_become_prototypes() {
        let c = emit("extern fn putnum(x: int)\nfn f() { putnum(3) }");
        assert!(c.contains("void putnum(long x);"), "got:\n{}", c);
    }

    #[test]
    fn struct_literals_become_compound_literals() {
        let c = emit(
            "struct P { x: int }\n\
             fn f() { let p = P { .x = 3 } }",
        );
        assert!(c.contains("(P){.x = 3}"), "got:\n{}", c);
    }

    #[test]
    fn nested_functions_are_rejected() {
        // The checker accepts nested functions; C has no spelling for them.
        let source = "fn f() { fn g() { } }";
        let tokens = Lexer::new(source).tokenize();
        let mut names = NameTable::new();
        let mut file = rill_parser::parse(tokens, &mut names).expect("parse");
        let sema = rill_sema::analyze(&mut file, names, source).expect("analyze");

        let err = generate(&sema, &file).expect_err("nested functions have no C spelling");
        assert!(matches!(err, CodegenError::NestedFunction(ref name) if name.as_str() == "g"));
    }
}
