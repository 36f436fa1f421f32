//! Parser tests over small source snippets.

use rill_ast::{
    BinaryOp, Decl, Expr, ExprKind, File, Item, NameTable, StmtKind, TypeExprKind, UnaryOp,
};
use rill_lexer::Lexer;

fn parse(source: &str) -> File {
    let tokens = Lexer::new(source).tokenize();
    let mut names = NameTable::new();
    rill_parser::parse(tokens, &mut names)
        .unwrap_or_else(|e| panic!("parse failed: {:?}\nsource: {}", e, source))
}

fn parse_err(source: &str) -> Vec<String> {
    let tokens = Lexer::new(source).tokenize();
    let mut names = NameTable::new();
    match rill_parser::parse(tokens, &mut names) {
        Ok(_) => panic!("expected a parse error\nsource: {}", source),
        Err(errors) => errors.into_iter().map(|e| e.message).collect(),
    }
}

fn func_body(file: &File, index: usize) -> &[rill_ast::Stmt] {
    match &file.items[index] {
        Item::Func(f) => &f.body.as_ref().expect("function body").stmts,
        other => panic!("expected a function, got {:?}", other),
    }
}

#[test]
fn empty_function() {
    let file = parse("fn f() { }");
    assert_eq!(file.items.len(), 1);
    assert!(func_body(&file, 0).is_empty());
}

#[test]
fn statements_end_at_newlines_and_semicolons() {
    let file = parse("fn f() {\n let a = 1\n let b = 2; let c = 3 }");
    assert_eq!(func_body(&file, 0).len(), 3);
}

#[test]
fn let_and_var_mutability() {
    let file = parse("fn f() { let a = 1; var b = 2 }");
    let body = func_body(&file, 0);
    let mutabilities: Vec<bool> = body
        .iter()
        .map(|s| match &s.kind {
            StmtKind::Decl(Decl::Var(v)) => v.mutable,
            other => panic!("expected var decls, got {:?}", other),
        })
        .collect();
    assert_eq!(mutabilities, vec![false, true]);
}

#[test]
fn assignment_vs_move() {
    let file = parse("fn f() { var a = 1; a = 2; a <- 3 }");
    let body = func_body(&file, 0);
    assert!(matches!(body[1].kind, StmtKind::Assign { is_move: false, .. }));
    assert!(matches!(body[2].kind, StmtKind::Assign { is_move: true, .. }));
}

#[test]
fn binary_precedence() {
    let file = parse("fn f() { let x = 1 + 2 * 3 }");
    let body = func_body(&file, 0);
    let StmtKind::Decl(Decl::Var(v)) = &body[0].kind else {
        panic!("expected a var decl");
    };
    let init = v.init.as_ref().unwrap();
    // 1 + (2 * 3)
    let ExprKind::Binary { op, rhs, .. } = &init.kind else {
        panic!("expected a binary expression, got {:?}", init.kind);
    };
    assert_eq!(*op, BinaryOp::Add);
    assert!(matches!(
        rhs.kind,
        ExprKind::Binary {
            op: BinaryOp::Mul,
            ..
        }
    ));
}

#[test]
fn comparison_binds_loosest() {
    let file = parse("fn f() { let x = 1 + 2 == 3 }");
    let body = func_body(&file, 0);
    let StmtKind::Decl(Decl::Var(v)) = &body[0].kind else {
        panic!("expected a var decl");
    };
    let ExprKind::Binary { op, .. } = &v.init.as_ref().unwrap().kind else {
        panic!("expected a binary expression");
    };
    assert_eq!(*op, BinaryOp::Eq);
}

#[test]
fn reference_expressions() {
    let file = parse("fn f() { var a = 1; let p = &a; let q = &var a; let x = *p }");
    let body = func_body(&file, 0);
    let ops: Vec<UnaryOp> = body[1..]
        .iter()
        .map(|s| match &s.kind {
            StmtKind::Decl(Decl::Var(v)) => match &v.init.as_ref().unwrap().kind {
                ExprKind::Unary { op, .. } => *op,
                other => panic!("expected a unary expression, got {:?}", other),
            },
            other => panic!("expected var decls, got {:?}", other),
        })
        .collect();
    assert_eq!(ops, vec![UnaryOp::Ref, UnaryOp::VarRef, UnaryOp::Deref]);
}

#[test]
fn member_chains() {
    let file = parse("fn f(p: Point) { let x = p.pos.x }");
    let body = func_body(&file, 0);
    let StmtKind::Decl(Decl::Var(v)) = &body[0].kind else {
        panic!("expected a var decl");
    };
    let ExprKind::Member { base, .. } = &v.init.as_ref().unwrap().kind else {
        panic!("expected a member expression");
    };
    assert!(matches!(base.kind, ExprKind::Member { .. }));
}

#[test]
fn struct_literal_requires_designators() {
    // A bare brace after an identifier is a block, not a literal; the
    // leading designator dot is the tell.
    let file = parse("fn f() { let p = P { .x = 1, .y = 2 } }");
    let body = func_body(&file, 0);
    let StmtKind::Decl(Decl::Var(v)) = &body[0].kind else {
        panic!("expected a var decl");
    };
    let ExprKind::StructLit { fields, .. } = &v.init.as_ref().unwrap().kind else {
        panic!("expected a struct literal");
    };
    assert_eq!(fields.len(), 2);
}

#[test]
fn if_braces_are_not_struct_literals() {
    let file = parse("fn f(b: bool) { if b { let x = 1 } }");
    let body = func_body(&file, 0);
    assert!(matches!(body[0].kind, StmtKind::If(_)));
}

#[test]
fn else_if_chains_nest_to_the_right() {
    let file = parse("fn f(b: bool) { if b { } else if b { } else { } }");
    let body = func_body(&file, 0);
    let StmtKind::If(if_stmt) = &body[0].kind else {
        panic!("expected an if statement");
    };
    let nested = if_stmt.else_if.as_ref().expect("else-if clause");
    assert!(if_stmt.else_body.is_none());
    assert!(nested.else_body.is_some());
}

#[test]
fn cast_expression() {
    let file = parse("fn f() { let c = [int](x) }");
    let body = func_body(&file, 0);
    let StmtKind::Decl(Decl::Var(v)) = &body[0].kind else {
        panic!("expected a var decl");
    };
    let ExprKind::Cast { ty, .. } = &v.init.as_ref().unwrap().kind else {
        panic!("expected a cast expression");
    };
    assert_eq!(ty.kind, TypeExprKind::Value);
}

#[test]
fn function_headers() {
    let file = parse("fn add(a: int, b: int) -> int { return a + b }");
    let Item::Func(f) = &file.items[0] else {
        panic!("expected a function");
    };
    assert_eq!(f.params.len(), 2);
    assert!(f.ret_type_expr.is_some());
}

#[test]
fn extern_function_header() {
    let file = parse("extern fn write(s: string) -> int\n");
    let Item::Extern(f) = &file.items[0] else {
        panic!("expected an extern function");
    };
    assert!(f.body.is_none());
}

#[test]
fn struct_and_enum_items() {
    let file = parse(
        "struct Point { x: int, y: int }\n\
         enum Shape {\n Circle(int)\n Rect(int, int)\n Empty\n }",
    );
    let Item::Struct(s) = &file.items[0] else {
        panic!("expected a struct");
    };
    assert_eq!(s.fields.len(), 2);
    let Item::Enum(e) = &file.items[1] else {
        panic!("expected an enum");
    };
    assert_eq!(e.variants.len(), 3);
    assert_eq!(e.variants[0].fields.len(), 1);
    assert_eq!(e.variants[1].fields.len(), 2);
    assert!(e.variants[2].fields.is_empty());
}

#[test]
fn builtin_statement_captures_the_line() {
    let file = parse("fn f() { #printf(\"x\")\n }");
    let body = func_body(&file, 0);
    let StmtKind::Builtin { text } = &body[0].kind else {
        panic!("expected a builtin statement");
    };
    assert_eq!(text, "printf(\"x\")");
}

#[test]
fn toplevel_junk_is_an_error() {
    let errors = parse_err("let x = 1\n");
    assert!(errors[0].contains("unexpected 'let' at toplevel"), "{:?}", errors);
}

#[test]
fn missing_variable_name_is_an_error() {
    let errors = parse_err("fn f() { let = 1 }");
    assert!(errors[0].contains("expected an identifier"), "{:?}", errors);
}

#[test]
fn errors_recover_per_line() {
    let errors = parse_err("fn f() { let = 1 }\nstruct }{\n");
    assert!(errors.len() >= 2, "{:?}", errors);
}

#[test]
fn annotated_reference_parameter() {
    let file = parse("fn first(a: &.x int, b: &.x int) -> &.x int { return a }");
    let Item::Func(f) = &file.items[0] else {
        panic!("expected a function");
    };
    let ty = f.params[0].type_expr.as_ref().unwrap();
    assert_eq!(ty.kind, TypeExprKind::Ref);
    assert!(ty.lifetime.is_some());
    assert!(f.ret_type_expr.as_ref().unwrap().lifetime.is_some());
}
