mod common;

use pretty_assertions::assert_eq;
use sable_compiler::{
    ast::{AstNode, ExprValue, FileNode},
    error::{CompileError, CompileErrorKind},
    lex::{log_syntax_error, TokenIter},
    parsing::{parse_expr, parse_file, FunctionContext, Parser},
    position::SourcePosition,
};

fn parse(source: &str) -> (FileNode<'_>, Vec<CompileError>) {
    common::init_logging();
    let mut reporter = log_syntax_error;
    let mut parser = Parser::new(TokenIter::new("test.sable", source, &mut reporter));
    parse_file(&mut parser)
}

#[test]
fn test_member_chain_temporaries() {
    common::init_logging();
    let mut reporter = log_syntax_error;
    let mut parser = Parser::new(TokenIter::new("test.sable", "x.y.z", &mut reporter));
    let mut cx = FunctionContext::new("test.sable", "main");
    let x = cx.declare("x", false, SourcePosition::start()).unwrap();

    let value = parse_expr(&mut parser, &mut cx).unwrap();
    let access = match value {
        ExprValue::Expression(node) => match *node {
            AstNode::MemberAccess(access) => access,
            other => panic!("expected member access, found {}", other),
        },
        other => panic!("expected expression, found {}", other),
    };

    assert_eq!(access.source, x);
    assert_eq!(access.members.len(), 2);
    assert_eq!(access.members[0].member.as_str(), "y");
    assert_eq!(access.members[1].member.as_str(), "z");
    assert!(access.members[0].destination < access.members[1].destination);
    assert_eq!(access.result_slot(), access.members[1].destination);

    // Exactly one temporary per member.
    assert_eq!(cx.variables.len(), 3);
    assert!(cx.variables.iter().skip(1).all(|variable| variable.is_temporary));
}

#[test]
fn test_precedence() {
    let (file, errors) = parse("fn f(a: int, b: int, c: int) { const x = a + b * c << 1 == a || b < c; }");
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(
        file.functions[0].body.to_string(),
        "{ const $9 = (((($0 + ($1 * $2)) << 1) == $0) || ($1 < $2)); }"
    );
}

#[test]
fn test_left_associative() {
    let (file, errors) = parse("fn f(a: int) { const x = a - 1 - 2; }");
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(file.functions[0].body.to_string(), "{ const $3 = (($0 - 1) - 2); }");
}

#[test]
fn test_block_scopes() {
    let source = "
        fn f(a: int) {
            if (true) {
                const a = 2;
                const b = a;
            }
            const b = a;
        }
    ";
    let (file, errors) = parse(source);
    assert!(errors.is_empty(), "{:?}", errors);

    let body = file.functions[0].body.to_string();
    // The inner `a` shadows the parameter, the outer `b` sees the parameter again.
    assert_eq!(body, "{ if (true) { const $1 = 2; const $2 = $1; }; const $3 = $0; }");
}

#[test]
fn test_variable_not_visible_outside_block() {
    let (_, errors) = parse("fn f() { while (true) { const a = 1; } const b = a; }");
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].kind(),
        &CompileErrorKind::CannotFindSymbol { name: "a".into() }
    );
}

#[test]
fn test_redeclaration_in_same_scope() {
    let (_, errors) = parse("fn f() { const a = 1; mut a = 2; }");
    assert_eq!(errors[0].kind(), &CompileErrorKind::DuplicateSymbol { name: "a".into() });
}

#[test]
fn test_dependencies_recorded() {
    let (file, errors) = parse("fn f() { g(1); h(); g(2); }");
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(file.functions[0].dependencies.dependencies(), &["g", "h"]);
}

#[test]
fn test_self_call_rejected() {
    let (_, errors) = parse("fn f() { f(); }");
    assert_eq!(errors[0].kind(), &CompileErrorKind::SelfDependency { function: "f".into() });
}

#[test]
fn test_recovery_reports_every_function() {
    let source = "
        fn a() { const x = ; }
        fn b() { const y = 1 }
        struct S { x: int }
        fn c() { const z = 1; }
    ";
    let (file, errors) = parse(source);

    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].location().position.line, 2);
    assert_eq!(errors[1].location().position.line, 3);

    assert_eq!(file.structs.len(), 1);
    let failed: Vec<(&str, bool)> = file
        .functions
        .iter()
        .map(|function| (function.name, function.parse_failed))
        .collect();
    assert_eq!(failed, vec![("a", true), ("b", true), ("c", false)]);
}
