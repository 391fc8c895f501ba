use crate::ast::{Ast, NodeId, NodeMap};
use crate::error::ErrorKind;
use crate::lex::Lexer;
use crate::operator::AssignOp;
use crate::parse::parser::Parser;
use crate::parse::toplevel::{parse_source, SourceKind};
use crate::symbol::ScopeMap;

fn parse(code: &str) -> (NodeMap, ScopeMap, NodeId) {
    let mut parser = Parser::new(Lexer::new(code.as_bytes().to_vec()));
    let parsed = parse_source(&mut parser, SourceKind::Module)
        .unwrap_or_else(|error| panic!("failed to parse {:?}: {:?}", code, error));
    let (nodes, scopes) = parser.take();
    (nodes, scopes, parsed.root)
}

fn parse_fails(code: &str) -> ErrorKind {
    let mut parser = Parser::new(Lexer::new(code.as_bytes().to_vec()));
    match parse_source(&mut parser, SourceKind::Module) {
        Ok(_) => panic!("code parsed cleanly: {}", code),
        Err(error) => error.kind(),
    }
}

fn body_of(map: &NodeMap, root: NodeId) -> &[NodeId] {
    match map[root].ast() {
        Ast::Toplevel { body } => body,
        _ => unreachable!(),
    }
}

fn expr_of(map: &NodeMap, stmt: NodeId) -> NodeId {
    match map[stmt].ast() {
        Ast::SimpleStatement { expr } => *expr,
        other => panic!("not an expression statement: {:?}", other),
    }
}

#[test]
fn test_arrow_vs_grouping() {
    let (map, _, root) = parse("(a, b) => a; (a, b);");
    let body = body_of(&map, root);
    assert!(matches!(
        map[expr_of(&map, body[0])].ast(),
        Ast::Arrow { is_async: false, .. }
    ));
    assert!(matches!(
        map[expr_of(&map, body[1])].ast(),
        Ast::Sequence { .. }
    ));
}

#[test]
fn test_async_arrow_vs_call() {
    let (map, _, root) = parse("async (a) => a; async(a);");
    let body = body_of(&map, root);
    assert!(matches!(
        map[expr_of(&map, body[0])].ast(),
        Ast::Arrow { is_async: true, .. }
    ));
    assert!(matches!(map[expr_of(&map, body[1])].ast(), Ast::Call { .. }));
}

#[test]
fn test_for_shapes() {
    let (map, _, root) = parse("for (;;) x(); for (let a of b) x(); for (let a in b) x();");
    let body = body_of(&map, root);
    assert!(matches!(
        map[body[0]].ast(),
        Ast::For {
            init: None,
            condition: None,
            update: None,
            ..
        }
    ));
    assert!(matches!(map[body[1]].ast(), Ast::ForOf { .. }));
    assert!(matches!(map[body[2]].ast(), Ast::ForIn { .. }));
}

#[test]
fn test_for_in_accepts_member_target() {
    // A member expression is a valid in/of target.
    let (map, _, root) = parse("for (obj.prop in arr) f(); for (obj[k] of xs) f();");
    let body = body_of(&map, root);
    match map[body[0]].ast() {
        Ast::ForIn { target, .. } => {
            assert!(matches!(map[*target].ast(), Ast::Dot { .. }));
        }
        other => panic!("unexpected {:?}", other),
    };
    match map[body[1]].ast() {
        Ast::ForOf { target, .. } => {
            assert!(matches!(map[*target].ast(), Ast::Sub { .. }));
        }
        other => panic!("unexpected {:?}", other),
    };
}

#[test]
fn test_for_head_errors() {
    assert_eq!(
        parse_fails("for (let a, b of c) x();"),
        ErrorKind::ForHeadMultipleDefs
    );
    assert_eq!(
        parse_fails("for (a + b in c) x();"),
        ErrorKind::ForHeadBadTarget
    );
}

#[test]
fn test_labels_and_jumps() {
    let (map, _, root) = parse("outer: for (;;) { break outer; continue outer; }");
    assert!(matches!(map[body_of(&map, root)[0]].ast(), Ast::Labeled { .. }));

    assert_eq!(parse_fails("a: a: x;"), ErrorKind::DuplicateLabel);
    assert_eq!(parse_fails("for (;;) break other;"), ErrorKind::UnknownLabel);
    assert_eq!(
        parse_fails("lbl: { continue lbl; }"),
        ErrorKind::ContinueTargetNotLoop
    );
    assert_eq!(parse_fails("break;"), ErrorKind::IllegalJump);
    assert_eq!(parse_fails("return 1;"), ErrorKind::IllegalJump);
}

#[test]
fn test_directive_prologue() {
    let (map, scopes, root) = parse("'use strict'; let a = 1;");
    let body = body_of(&map, root);
    assert!(scopes[map[body[0]].scope()].is_strict());

    assert_eq!(parse_fails("'use strict'; with (a) {}"), ErrorKind::StrictWith);
    assert_eq!(
        parse_fails("function f() { 'use strict'; eval = 1; }"),
        ErrorKind::StrictAssignToRestricted
    );
    assert_eq!(
        parse_fails("function f(a = 1) { 'use strict'; }"),
        ErrorKind::DirectiveNeedsSimpleParams
    );
    // A string after a real statement is not a directive.
    let (map, scopes, root) = parse("let a = 1; 'use strict';");
    let body = body_of(&map, root);
    assert!(!scopes[map[body[0]].scope()].is_strict());
}

#[test]
fn test_duplicate_bindings() {
    assert_eq!(parse_fails("let a = 1; let a = 2;"), ErrorKind::DuplicateBinding);
    // `var` merges.
    parse("var a = 1; var a = 2;");
}

#[test]
fn test_switch_single_default() {
    assert_eq!(
        parse_fails("switch (a) { default: x; default: y; }"),
        ErrorKind::MultipleDefaultClauses
    );
}

#[test]
fn test_module_statements() {
    let (map, _, root) = parse(
        "import def, { a as b, c } from './m'; export { b as d }; export * from './n'; export default 1;",
    );
    let body = body_of(&map, root);
    assert!(matches!(map[body[0]].ast(), Ast::Import { .. }));
    assert!(matches!(
        map[body[1]].ast(),
        Ast::Export {
            source: None,
            is_default: false,
            ..
        }
    ));
    assert!(matches!(
        map[body[2]].ast(),
        Ast::Export { source: Some(_), .. }
    ));
    assert!(matches!(
        map[body[3]].ast(),
        Ast::Export {
            is_default: true, ..
        }
    ));
}

#[test]
fn test_import_expression() {
    let (map, _, root) = parse("const p = import('./lazy');");
    let body = body_of(&map, root);
    let def = match map[body[0]].ast() {
        Ast::Declaration { defs, .. } => defs[0],
        other => panic!("unexpected {:?}", other),
    };
    let value = match map[def].ast() {
        Ast::VarDef {
            value: Some(value), ..
        } => *value,
        other => panic!("unexpected {:?}", other),
    };
    match map[value].ast() {
        Ast::ImportExpression { module } => assert_eq!(module, "./lazy"),
        other => panic!("unexpected {:?}", other),
    };
}

#[test]
fn test_template_string() {
    let (map, _, root) = parse("let t = `a${b}c${d}e`;");
    let body = body_of(&map, root);
    let def = match map[body[0]].ast() {
        Ast::Declaration { defs, .. } => defs[0],
        _ => unreachable!(),
    };
    let value = match map[def].ast() {
        Ast::VarDef {
            value: Some(value), ..
        } => *value,
        _ => unreachable!(),
    };
    match map[value].ast() {
        Ast::TemplateString { parts } => assert_eq!(parts.len(), 5),
        other => panic!("unexpected {:?}", other),
    };
}

#[test]
fn test_await_yield_contexts() {
    // Names outside their special contexts.
    parse("let yield = 1; let await = 2;");
    // Operators inside.
    let (map, _, root) = parse("async function f() { await g(); } function* h() { yield 1; yield; }");
    assert_eq!(body_of(&map, root).len(), 2);
}

#[test]
fn test_destructuring_assignment() {
    let (map, _, root) = parse("({ a, b: [c] } = obj);");
    let expr = expr_of(&map, body_of(&map, root)[0]);
    match map[expr].ast() {
        Ast::Assign {
            op: AssignOp::Assign,
            target,
            ..
        } => {
            assert!(matches!(map[*target].ast(), Ast::ObjectTarget { .. }));
        }
        other => panic!("unexpected {:?}", other),
    };
}

#[test]
fn test_bad_assignment_targets() {
    assert_eq!(parse_fails("a + b = c;"), ErrorKind::BadAssignTarget);
    assert_eq!(parse_fails("[a] += b;"), ErrorKind::BadAssignTarget);
}

#[test]
fn test_sequence_has_two_or_more() {
    let (map, _, root) = parse("a, b, c;");
    let expr = expr_of(&map, body_of(&map, root)[0]);
    match map[expr].ast() {
        Ast::Sequence { exprs, .. } => assert_eq!(exprs.len(), 3),
        other => panic!("unexpected {:?}", other),
    };
}
