//! Randomized control-flow tests for the return checker.
//!
//! Generates arbitrary nestings of plain statements, returns and
//! if/else-if/else chains, renders them as source, runs the full analysis,
//! and compares the verdict against an independent recursive oracle: a
//! statement list guarantees a return iff it contains a return or an
//! if-chain whose branches all guarantee one.

use proptest::prelude::*;
use rill_ast::NameTable;
use rill_lexer::Lexer;

#[derive(Debug, Clone)]
enum Shape {
    Plain,
    Return,
    If {
        then_body: Vec<Shape>,
        else_ifs: Vec<Vec<Shape>>,
        else_body: Option<Vec<Shape>>,
    },
}

fn shape_strategy() -> impl Strategy<Value = Vec<Shape>> {
    let leaf = prop_oneof![
        2 => Just(Shape::Plain),
        1 => Just(Shape::Return),
    ];
    let stmt = leaf.prop_recursive(3, 24, 4, |inner| {
        let body = prop::collection::vec(inner.clone(), 0..4);
        (
            body.clone(),
            prop::collection::vec(body.clone(), 0..3),
            prop::option::of(body),
        )
            .prop_map(|(then_body, else_ifs, else_body)| Shape::If {
                then_body,
                else_ifs,
                else_body,
            })
    });
    prop::collection::vec(stmt, 0..6)
}

// =============================================================================
// Rendering to source
// =============================================================================

fn render_body(stmts: &[Shape], out: &mut String) {
    for stmt in stmts {
        match stmt {
            Shape::Plain => out.push_str("1 + 1\n"),
            Shape::Return => out.push_str("return 1\n"),
            Shape::If {
                then_body,
                else_ifs,
                else_body,
            } => {
                out.push_str("if c {\n");
                render_body(then_body, out);
                out.push('}');
                for else_if in else_ifs {
                    out.push_str(" else if c {\n");
                    render_body(else_if, out);
                    out.push('}');
                }
                if let Some(else_body) = else_body {
                    out.push_str(" else {\n");
                    render_body(else_body, out);
                    out.push('}');
                }
                out.push('\n');
            }
        }
    }
}

fn render(stmts: &[Shape]) -> String {
    let mut source = String::from("fn f(c: bool) -> int {\n");
    render_body(stmts, &mut source);
    source.push_str("}\n");
    source
}

// =============================================================================
// Oracle
// =============================================================================

fn guarantees_return(stmts: &[Shape]) -> bool {
    stmts.iter().any(|stmt| match stmt {
        Shape::Plain => false,
        Shape::Return => true,
        Shape::If {
            then_body,
            else_ifs,
            else_body,
        } => match else_body {
            // Without an else there is a fall-through path.
            None => false,
            Some(else_body) => {
                guarantees_return(then_body)
                    && else_ifs.iter().all(|b| guarantees_return(b))
                    && guarantees_return(else_body)
            }
        },
    })
}

fn checker_accepts(source: &str) -> bool {
    let tokens = Lexer::new(source).tokenize();
    let mut names = NameTable::new();
    let mut file = rill_parser::parse(tokens, &mut names).expect("generated source parses");
    match rill_sema::analyze(&mut file, names, source) {
        Ok(_) => true,
        Err(errors) => {
            for error in &errors {
                assert_eq!(
                    error.to_string(),
                    "function not guaranteed to return a value",
                    "generated source should only ever fail the return check: {}",
                    source
                );
            }
            false
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn return_checker_matches_the_oracle(stmts in shape_strategy()) {
        let source = render(&stmts);
        let expected = guarantees_return(&stmts);
        let accepted = checker_accepts(&source);
        prop_assert_eq!(
            accepted,
            expected,
            "checker and oracle disagree on:\n{}",
            source
        );
    }
}
