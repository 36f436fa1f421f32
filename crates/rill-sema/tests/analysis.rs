//! End-to-end analysis tests: full source snippets through
//! lex → parse → analyze, asserting on the produced diagnostics.

use rill_ast::NameTable;
use rill_lexer::{Lexer, TokenKind};

fn analyze(source: &str) -> Result<(), Vec<String>> {
    let tokens = Lexer::new(source).tokenize();
    assert!(
        tokens.iter().all(|t| t.kind != TokenKind::Error),
        "lex error in test input: {:?}",
        tokens.iter().find(|t| t.kind == TokenKind::Error)
    );

    let mut names = NameTable::new();
    let mut file = rill_parser::parse(tokens, &mut names).expect("test input should parse");

    match rill_sema::analyze(&mut file, names, source) {
        Ok(_) => Ok(()),
        Err(errors) => Err(errors.iter().map(|e| e.to_string()).collect()),
    }
}

#[track_caller]
fn assert_ok(source: &str) {
    if let Err(errors) = analyze(source) {
        panic!("expected no diagnostics, got {:?}\nsource: {}", errors, source);
    }
}

#[track_caller]
fn assert_error(source: &str, expected: &str) {
    match analyze(source) {
        Ok(()) => panic!("expected {:?}, got no diagnostics\nsource: {}", expected, source),
        Err(errors) => assert!(
            errors.iter().any(|e| e.as_str() == expected),
            "expected {:?}, got {:?}\nsource: {}",
            expected,
            errors,
            source
        ),
    }
}

// =============================================================================
// Name binding
// =============================================================================

#[test]
fn redefinition_in_same_scope() {
    assert_error(
        "fn f() { let x = 1; let x = 2; }",
        "redefinition of 'x'",
    );
}

#[test]
fn shadowing_across_scopes_is_legal() {
    assert_ok("fn f() { let x = 1; { let x = 2; } }");
}

#[test]
fn locals_may_shadow_parameters() {
    assert_ok("fn f(x: int) { let x = 2 }");
}

#[test]
fn function_redefinition() {
    assert_error(
        "fn f() { }\nfn f() { }",
        "redefinition of 'f'",
    );
}

#[test]
fn duplicate_struct_field() {
    assert_error(
        "struct S { a: int, a: int }",
        "redefinition of 'a'",
    );
}

#[test]
fn use_of_undeclared_identifier() {
    assert_error("fn f() { let x = y }", "use of undeclared identifier 'y'");
}

#[test]
fn a_variable_is_not_visible_in_its_own_initializer() {
    assert_error("fn f() { let x = x }", "use of undeclared identifier 'x'");
}

#[test]
fn undeclared_function() {
    assert_error("fn f() { g() }", "undeclared function 'g'");
}

#[test]
fn calling_a_variable_is_rejected() {
    assert_error("fn f() { let x = 1; x() }", "'x' is not a function");
}

#[test]
fn call_arity_is_checked() {
    assert_error(
        "fn g(a: int) -> int { return a }\nfn f() { g(1, 2) }",
        "'g' accepts 1 arguments, got 2",
    );
}

#[test]
fn undeclared_type_in_signature() {
    assert_error("fn f(x: Foo) { }", "use of undeclared type 'Foo'");
}

#[test]
fn undeclared_type_behind_reference() {
    assert_error("fn f(x: &Foo) { }", "use of undeclared type 'Foo'");
}

// =============================================================================
// Type checking
// =============================================================================

#[test]
fn builtin_literals() {
    assert_ok("fn f() { let i = 1; let s = \"hi\" }");
}

#[test]
fn declared_type_must_match_initializer() {
    assert_error(
        "fn f() { let x: int = \"s\" }",
        "cannot assign 'string' type to 'int'",
    );
}

#[test]
fn binary_operands_must_agree() {
    assert_error(
        "fn f() { let x = 1 + \"a\" }",
        "incompatible types to binary expression ('int' and 'string')",
    );
}

#[test]
fn mutable_reference_promotes_to_shared() {
    assert_ok("fn f() { var a = 1; let r: &var int = &var a; let s: &int = r; }");
}

#[test]
fn shared_reference_does_not_promote_to_mutable() {
    assert_error(
        "fn f() { let a = 1; let r: &int = &a; let s: &var int = r; }",
        "cannot assign '&int' type to '&var int'",
    );
}

#[test]
fn assign_to_rvalue_is_rejected() {
    assert_error("fn f() { 3 = 4 }", "cannot assign to an rvalue");
}

#[test]
fn assign_to_immutable_variable() {
    assert_error(
        "fn f() { let a = 1; a = 2 }",
        "'a' is not declared as mutable",
    );
}

#[test]
fn assign_through_shared_reference() {
    assert_error(
        "fn f() { var a = 1; let p = &a; *p = 2 }",
        "'p' is not a mutable reference",
    );
}

#[test]
fn assign_through_mutable_reference() {
    assert_ok("fn f() { var a = 1; let p = &var a; *p = 2 }");
}

#[test]
fn deref_of_non_reference() {
    assert_error(
        "fn f() { let a = 1; let b = *a }",
        "dereference of a non-reference type 'int'",
    );
}

#[test]
fn address_of_rvalue() {
    assert_error("fn f() { let p = &3 }", "cannot take address of an rvalue");
}

#[test]
fn mutable_borrow_of_immutable_variable() {
    assert_error(
        "fn f() { let a = 1; let p = &var a }",
        "cannot borrow 'a' as mutable because it is declared immutable",
    );
}

#[test]
fn member_access() {
    assert_ok(
        "struct Point { x: int, y: int }\n\
         fn get(p: Point) -> int { return p.x }",
    );
}

#[test]
fn unknown_member() {
    assert_error(
        "struct Point { x: int }\n\
         fn get(p: Point) -> int { return p.z }",
        "'z' is not a member of 'Point'",
    );
}

#[test]
fn member_of_builtin() {
    assert_error(
        "fn f() { let a = 1; let b = a.x }",
        "'x' is not a member of 'int'",
    );
}

#[test]
fn struct_literal_of_enum_type() {
    assert_error(
        "enum E { A }\nfn f() { let x = E { .a = 1 } }",
        "type 'E' is not a struct",
    );
}

#[test]
fn member_through_dereferenced_reference() {
    assert_ok(
        "struct P { x: int }\n\
         fn get(ps: &P) -> int { return (*ps).x }",
    );
}

#[test]
fn struct_literal() {
    assert_ok(
        "struct P { x: int, y: int }\n\
         fn f() { let p = P { .x = 1, .y = 2 } }",
    );
}

#[test]
fn struct_literal_unknown_designator() {
    assert_error(
        "struct P { x: int }\nfn f() { let p = P { .z = 1 } }",
        "'z' is not a member of 'P'",
    );
}

#[test]
fn struct_literal_field_type_mismatch() {
    assert_error(
        "struct P { x: int }\nfn f() { let p = P { .x = \"s\" } }",
        "cannot assign 'string' type to 'int'",
    );
}

#[test]
fn call_argument_types_are_checked() {
    assert_error(
        "fn g(a: int) -> int { return a }\nfn f() { g(\"s\") }",
        "argument type mismatch: expects 'int', got 'string'",
    );
}

#[test]
fn cast_takes_the_target_type() {
    assert_ok("fn f() { let c = [int](\"123\") }");
}

#[test]
fn return_type_mismatch() {
    assert_error(
        "fn f() -> int { return \"s\" }",
        "return type mismatch: function returns 'int', but got 'string'",
    );
}

#[test]
fn bare_return_in_value_function() {
    assert_error(
        "fn f() -> int { return }",
        "return type mismatch: function returns 'int', but got 'void'",
    );
}

#[test]
fn void_function_returning_a_value() {
    assert_error(
        "fn f() { return 1 }",
        "function 'f' should not return a value",
    );
}

#[test]
fn function_name_is_not_a_value() {
    assert_error(
        "fn g() { }\nfn f() { let x = g }",
        "'g' is not a value",
    );
}

#[test]
fn enums_are_nominal_value_types() {
    assert_ok(
        "enum Color { Red, Green }\n\
         fn id(c: Color) -> Color { return c }",
    );
}

#[test]
fn extern_functions_are_callable() {
    assert_ok(
        "extern fn getnum() -> int\n\
         fn f() -> int { return getnum() }",
    );
}

// =============================================================================
// Return checking
// =============================================================================

#[test]
fn missing_return_path() {
    assert_error(
        "fn f(b: bool) -> int { if (b) { return 1 } }",
        "function not guaranteed to return a value",
    );
}

#[test]
fn straight_line_return() {
    assert_ok("fn f() -> int { return 1 }");
}

#[test]
fn both_branches_return() {
    assert_ok("fn f(b: bool) -> int { if b { return 1 } else { return 2 } }");
}

#[test]
fn else_if_chain_without_final_else() {
    assert_error(
        "fn f(b: bool) -> int { if b { return 1 } else if b { return 2 } }",
        "function not guaranteed to return a value",
    );
}

#[test]
fn else_if_chain_with_final_else() {
    assert_ok(
        "fn f(b: bool) -> int { if b { return 1 } else if b { return 2 } else { return 3 } }",
    );
}

#[test]
fn return_after_branch_join() {
    assert_ok("fn f(b: bool) -> int { if b { let x = 1 } return 2 }");
}

#[test]
fn empty_value_function_body() {
    assert_error(
        "fn f() -> int { }",
        "function not guaranteed to return a value",
    );
}

#[test]
fn void_functions_need_no_return() {
    assert_ok("fn f(b: bool) { if b { let x = 1 } }");
}

// =============================================================================
// Borrow checking
// =============================================================================

#[test]
fn conflicting_borrows_mutable_then_shared() {
    assert_error(
        "fn f() { var a = 1; let p = &var a; let q = &a; }",
        "cannot borrow 'a' as immutable because it was borrowed as mutable before",
    );
}

#[test]
fn conflicting_borrows_shared_then_mutable() {
    assert_error(
        "fn f() { var a = 1; let p = &a; let q = &var a; }",
        "cannot borrow 'a' as mutable because it was borrowed as immutable before",
    );
}

#[test]
fn two_shared_borrows_are_fine() {
    assert_ok("fn f() { let a = 1; let p = &a; let q = &a }");
}

#[test]
fn scope_exit_releases_borrows() {
    assert_ok("fn f() { var a = 1; { let p = &var a } let q = &var a }");
}

#[test]
fn use_after_move() {
    assert_error(
        "struct S { x: int }\n\
         fn f() { var a = S { .x = 1 }; var b = S { .x = 2 }; b <- a; let y = a.x }",
        "use of moved value",
    );
}

#[test]
fn declaration_initializer_transfers_struct_values() {
    // A declaration with an initializer always moves; the struct is gone
    // afterwards even though its type is copyable.
    assert_error(
        "struct S { x: int }\n\
         fn f() { var a = S { .x = 1 }; let b = a; let y = a.x }",
        "use of moved value",
    );
}

#[test]
fn builtin_values_copy_freely() {
    assert_ok("fn f() { let a = 1; let b = a; let c = a + b }");
}

#[test]
fn move_out_of_dereference() {
    assert_error(
        "struct S { x: int }\n\
         fn f() { var a = S { .x = 1 }; let p = &a; var b = S { .x = 2 }; b <- *p }",
        "cannot move out of '*p' because it will invalidate 'p'",
    );
}

#[test]
fn move_of_borrowed_value() {
    assert_error(
        "struct S { x: int }\n\
         fn f() { var a = S { .x = 1 }; let p = &a; var b = S { .x = 2 }; b <- a }",
        "cannot move out of 'a' because it is borrowed",
    );
}

#[test]
fn copy_of_non_copyable_reference() {
    assert_error(
        "fn f() { var a = 1; var b = 2; let p = &var a; var q: &var int = &var b; q = p }",
        "cannot copy non-copyable type '&var int'",
    );
}

#[test]
fn struct_with_mutable_reference_field_is_not_copyable() {
    assert_error(
        "struct H { r: &var int }\n\
         fn f() { var a = 1; var h = H { .r = &var a }; h = h }",
        "cannot copy non-copyable type 'H'",
    );
}

#[test]
fn reference_outliving_its_borrowee() {
    assert_error(
        "fn f() { var a = 1; var p = &a; { let b = 2; p = &b } let x = *p }",
        "'b' does not live long enough",
    );
}

#[test]
fn returning_reference_to_local() {
    assert_error(
        "fn f() -> &int { let a = 1; return &a; }",
        "cannot return value that references local variable 'a'",
    );
}

#[test]
fn returning_reference_to_local_struct_field() {
    assert_error(
        "struct Inner { v: int }\n\
         struct Outer { i: Inner }\n\
         fn g() -> &int { var o = Outer { .i = Inner { .v = 1 } }; return &o.i.v }",
        "cannot return value that references local variable 'o'",
    );
}

#[test]
fn conflicting_borrows_of_the_same_field() {
    assert_error(
        "struct P { x: int }\n\
         fn f() { var p = P { .x = 1 }; let r = &var p.x; let q = &p.x }",
        "cannot borrow 'x' as immutable because it was borrowed as mutable before",
    );
}

#[test]
fn mutating_through_reference_parameters() {
    assert_ok(
        "fn bump(p: &var int) { *p = *p + 1 }\n\
         fn f() { var a = 1; bump(&var a) }",
    );
}

#[test]
fn nested_references() {
    assert_ok("fn f() { var a = 1; let p = &a; let q = &p; let x = **q }");
}

#[test]
fn reference_fields_track_the_struct_lifetime() {
    assert_ok(
        "struct Holder { r: &int }\n\
         fn f() { let a = 1; let h = Holder { .r = &a }; let x = *h.r }",
    );
}

// =============================================================================
// Lifetime annotations
// =============================================================================

#[test]
fn consistent_annotations_check_out() {
    assert_ok(
        "fn pick(a: &.x int, b: &.x int) -> &.x int { return a }\n\
         fn f() -> int { var m = 1; var n = 2; let r = pick(&m, &n); return *r }",
    );
}

#[test]
fn annotation_missing_on_one_parameter() {
    assert_error(
        "fn g(a: &.x int, b: &int) -> &.x int { return a }",
        "missing lifetime annotation",
    );
}

#[test]
fn annotation_missing_on_reference_return() {
    assert_error(
        "fn g(a: &.x int) -> &int { return a }",
        "missing lifetime annotation",
    );
}

#[test]
fn unknown_annotation_on_return() {
    assert_error(
        "fn g(a: &.x int) -> &.y int { return a }",
        "unknown lifetime annotation '.y'",
    );
}

#[test]
fn returned_annotation_must_match() {
    assert_error(
        "fn g(a: &.x int, b: &.y int) -> &.x int { return b }",
        "lifetime mismatch: expected .x, got .y",
    );
}

#[test]
fn call_result_takes_the_shortest_matching_lifetime() {
    // pick's result is coerced to the shorter-lived of its two arguments,
    // so once `n` dies the stored reference is unusable.
    assert_error(
        "fn pick(a: &.x int, b: &.x int) -> &.x int { return a }\n\
         fn f() -> int { var m = 1; var r = &m; { var n = 2; r = pick(&m, &n) } return *r }",
        "'n' does not live long enough",
    );
}

#[test]
fn annotations_on_locals_are_rejected() {
    assert_error(
        "fn f() { let r: &.x int }",
        "lifetime annotations are only supported on function parameters",
    );
}

// =============================================================================
// Annotation slots after successful analysis
// =============================================================================

mod annotations {
    use super::*;
    use rill_ast::{Expr, ExprKind, File, Item, NameTable, Stmt, StmtKind};
    use rill_lexer::Lexer;

    fn analyzed(source: &str) -> File {
        let tokens = Lexer::new(source).tokenize();
        let mut names = NameTable::new();
        let mut file = rill_parser::parse(tokens, &mut names).expect("parse");
        rill_sema::analyze(&mut file, names, source).expect("analyze");
        file
    }

    fn walk_exprs<'a>(stmt: &'a Stmt, out: &mut Vec<&'a Expr>) {
        match &stmt.kind {
            StmtKind::Decl(rill_ast::Decl::Var(v)) => {
                if let Some(init) = &v.init {
                    collect(init, out);
                }
            }
            StmtKind::Expr(e) => collect(e, out),
            StmtKind::Assign { lhs, rhs, .. } => {
                collect(lhs, out);
                collect(rhs, out);
            }
            StmtKind::Return { expr: Some(e) } => collect(e, out),
            StmtKind::If(i) => {
                collect(&i.cond, out);
                for s in &i.then_body.stmts {
                    walk_exprs(s, out);
                }
            }
            StmtKind::Compound(cs) => {
                for s in &cs.stmts {
                    walk_exprs(s, out);
                }
            }
            _ => {}
        }
    }

    fn collect<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
        out.push(expr);
        match &expr.kind {
            ExprKind::Call { args, .. } => args.iter().for_each(|a| collect(a, out)),
            ExprKind::StructLit { name_expr, fields } => {
                collect(name_expr, out);
                fields.iter().for_each(|f| collect(&f.init, out));
            }
            ExprKind::Cast { operand, .. } => collect(operand, out),
            ExprKind::Member { base, .. } => collect(base, out),
            ExprKind::Paren(inner) => collect(inner, out),
            ExprKind::Unary { operand, .. } => collect(operand, out),
            ExprKind::Binary { lhs, rhs, .. } => {
                collect(lhs, out);
                collect(rhs, out);
            }
            _ => {}
        }
    }

    /// After a clean analysis every expression has a type and every
    /// identifier a declaration.
    #[test]
    fn every_expression_is_typed_and_bound() {
        let file = analyzed(
            "struct P { x: int }\n\
             fn get(p: P) -> int { return p.x }\n\
             fn f(b: bool) -> int { var a = 1; let q = &var a; *q = 2; if b { return get(P { .x = a }) } return *q }",
        );

        let mut exprs = Vec::new();
        for item in &file.items {
            if let Item::Func(func) = item {
                if let Some(body) = &func.body {
                    for stmt in &body.stmts {
                        walk_exprs(stmt, &mut exprs);
                    }
                }
            }
        }

        assert!(!exprs.is_empty());
        for expr in exprs {
            assert!(expr.ty.is_some(), "untyped expression: {:?}", expr);
            if matches!(expr.kind, ExprKind::DeclRef { .. } | ExprKind::Member { .. }) {
                assert!(expr.decl.is_some(), "unbound expression: {:?}", expr);
            }
        }
    }
}
