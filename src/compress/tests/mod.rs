use crate::ast::{NodeId, NodeMap};
use crate::compress::{compress, CompressError, CompressOptions};
use crate::emit::emit_js;
use crate::lex::Lexer;
use crate::parse::parser::Parser;
use crate::parse::toplevel::{parse_source, SourceKind};
use crate::symbol::ScopeMap;

fn parse(src: &str) -> (NodeMap, ScopeMap, NodeId) {
    let mut parser = Parser::new(Lexer::new(src.as_bytes().to_vec()));
    let parsed = parse_source(&mut parser, SourceKind::Module).unwrap();
    let (map, scopes) = parser.take();
    (map, scopes, parsed.root)
}

fn compress_to_string(src: &str, options: &CompressOptions) -> String {
    let (mut map, scopes, root) = parse(src);
    compress(&mut map, &scopes, root, options).unwrap();
    let mut out = Vec::new();
    emit_js(&mut out, &map, root).unwrap();
    String::from_utf8(out).unwrap()
}

fn check(src: &str, expected: &str) -> () {
    assert_eq!(
        compress_to_string(src, &CompressOptions::default()),
        expected,
        "compressing {:?}",
        src
    );
}

#[test]
fn test_constant_if_selects_branch() {
    check("if (false) { x(); } else { y(); }", "y();");
    check("if (true) { x(); } else { y(); }", "x();");
    check("if (1 > 2) { x(); }", "");
    check("if (!0) { x(); }", "x();");
}

#[test]
fn test_constant_while_is_removed() {
    check("while (0) foo();", "");
    check("before(); while (false) { foo(); } after();", "before();after();");
}

#[test]
fn test_constant_do_unwraps_body() {
    check("do { x(); } while (0);", "x();");
    // A break in the body pins the loop.
    check("do { x(); break; } while (0);", "do{x();break;}while(0);");
}

#[test]
fn test_constant_for_reduces_to_init() {
    check("for (let i = 0; false; i++) f();", "let i=0;");
    check("for (init(); 0; ) f();", "init();");
    check("for (; false; ) f();", "");
    check("for (;;) { break; }", "for(;;){break;}");
}

#[test]
fn test_for_in_of_and_with_raise_not_implemented() {
    let (mut map, scopes, root) = parse("for (const k in o) f(k);");
    assert_eq!(
        compress(&mut map, &scopes, root, &CompressOptions::default()),
        Err(CompressError::NotImplemented("for-in/for-of loops"))
    );
    let (mut map, scopes, root) = parse("with (o) f();");
    assert_eq!(
        compress(&mut map, &scopes, root, &CompressOptions::default()),
        Err(CompressError::NotImplemented("with statements"))
    );
}

#[test]
fn test_unreachable_after_return() {
    check("function f() { return 1; dead(); }", "function f(){return 1;}");
}

#[test]
fn test_block_and_empty_elimination() {
    check("{ a(); } ;; b();", "a();b();");
    // A block with its own binding survives.
    check("{ let a = 1; f(a); }", "{let a=1;f(a);}");
}

#[test]
fn test_boolean_compress() {
    check("if (!!x) a();", "if(x)a();");
    check("while (!!x) a();", "while(x)a();");
    check("y = !!!x;", "y=!x;");
}

#[test]
fn test_return_compress() {
    check("function f() { a(); return; }", "function f(){a();}");
    check("function f() { a(); return undefined; }", "function f(){a();}");
    check("function f() { return 1; }", "function f(){return 1;}");
}

#[test]
fn test_variable_hoisting() {
    check(
        "function f() { a(); var x = 1; if (c()) { var y = 2; } }",
        "function f(){var x,y;a();x=1;if(c()){y=2;}}",
    );
}

#[test]
fn test_constant_folding() {
    check("x = 1 + 2 * 3;", "x=7;");
    check("x = 'a' + 'b';", "x=\"ab\";");
    check("x = true ? a : b;", "x=a;");
    check("x = false && f();", "x=false;");
    check("x = null ?? y;", "x=y;");
}

#[test]
fn test_compression_is_idempotent() {
    let sources = [
        "if (false) { x(); } else { y(); }",
        "function f() { a(); var x = 1; return; }",
        "while (0) foo(); z();",
        "{ a(); } if (!!b) c();",
    ];
    for src in sources {
        let once = compress_to_string(src, &CompressOptions::default());
        let twice = compress_to_string(&once, &CompressOptions::default());
        assert_eq!(once, twice, "compression of {:?} is not a fixed point", src);
    }
}

#[test]
fn test_disabled_passes_leave_tree_alone() {
    let options = CompressOptions {
        unreachable_code_elimination: false,
        empty_statement_elimination: false,
        block_elimination: false,
        boolean_compress: false,
        function_return_compress: false,
        variable_hoisting: false,
        max_passes: 8,
    };
    assert_eq!(compress_to_string("while (0) foo();", &options), "while(0)foo();");
    assert_eq!(compress_to_string("if (!!x) { }", &options), "if(!!x){}");
}

#[test]
fn test_max_passes_bounds_the_loop() {
    let options = CompressOptions {
        max_passes: 1,
        ..CompressOptions::default()
    };
    assert_eq!(compress_to_string("if (false) a(); else b();", &options), "b();");
}
