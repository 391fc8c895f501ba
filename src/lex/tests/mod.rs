use crate::error::ErrorKind;
use crate::lex::{lex_template_piece, next_token, Lexer, SlashGoal};
use crate::token::Tok::{self, *};

fn tokens_of(code: &str) -> Vec<Tok> {
    let mut lexer = Lexer::new(code.as_bytes().to_vec());
    let mut out = Vec::new();
    loop {
        let token = next_token(&mut lexer, SlashGoal::Div).unwrap();
        if token.tok == Eof {
            return out;
        };
        out.push(token.tok);
    }
}

fn lex_fails(code: &str) -> ErrorKind {
    let mut lexer = Lexer::new(code.as_bytes().to_vec());
    loop {
        match next_token(&mut lexer, SlashGoal::Div) {
            Err(error) => return error.kind(),
            Ok(token) if token.tok == Eof => panic!("lexed cleanly: {}", code),
            Ok(_) => {}
        };
    }
}

#[test]
fn test_words() {
    assert_eq!(tokens_of("with"), vec![With]);
    assert_eq!(tokens_of("instanceof"), vec![Instanceof]);
    // A keyword prefix does not make a keyword.
    assert_eq!(tokens_of("classes"), vec![Name]);
    assert_eq!(tokens_of("$__ h929"), vec![Name, Name]);
}

#[test]
fn test_numbers() {
    assert_eq!(tokens_of("1 929 .5 0x1f 0b101 0o17 1e3 1.5e-3"), vec![Num; 8]);
    assert_eq!(tokens_of(". 929"), vec![Dot, Num]);
    // `?.5` must not read as optional chaining.
    assert_eq!(tokens_of("a?.5:0"), vec![Name, Question, Num, Colon, Num]);
    assert_eq!(tokens_of("a?.b"), vec![Name, QuestionDot, Name]);
}

#[test]
fn test_operators() {
    assert_eq!(tokens_of(">>>= >>> >>= >> >="), vec![
        ShrZeroEq, ShrZero, ShrEq, Shr, GtEq
    ]);
    assert_eq!(tokens_of("?? ??= ?.( ?.["), vec![
        Coalesce,
        CoalesceEq,
        QuestionDotParenL,
        QuestionDotBracketL
    ]);
    assert_eq!(tokens_of("a=>b"), vec![Name, Arrow, Name]);
    assert_eq!(tokens_of("...rest"), vec![Ellipsis, Name]);
}

#[test]
fn test_strings() {
    assert_eq!(tokens_of("'hello world'"), vec![Str]);
    assert_eq!(tokens_of("\"a\\\"b\""), vec![Str]);
    assert_eq!(lex_fails("'hello\n'"), ErrorKind::NewlineInString);
}

#[test]
fn test_slash_goals() {
    // Division after an operand...
    assert_eq!(tokens_of("a / b"), vec![Name, Slash, Name]);
    // ...regex when the parser asks for it.
    let mut lexer = Lexer::new(b"/abc[/]/g".to_vec());
    let token = next_token(&mut lexer, SlashGoal::Regex).unwrap();
    assert_eq!(token.tok, Regexp);
    assert_eq!(token.span.text(), "/abc[/]/g");
}

#[test]
fn test_template_pieces() {
    let mut lexer = Lexer::new(b"`a${b}c`".to_vec());
    let head = next_token(&mut lexer, SlashGoal::Div).unwrap();
    assert_eq!(head.tok, TemplateChunk);
    assert_eq!(head.span.text(), "a");
    assert_eq!(next_token(&mut lexer, SlashGoal::Div).unwrap().tok, Name);
    assert_eq!(next_token(&mut lexer, SlashGoal::Div).unwrap().tok, BraceR);
    let tail = lex_template_piece(&mut lexer, false).unwrap();
    assert_eq!(tail.tok, TemplateEnd);
    assert_eq!(tail.span.text(), "c");
}

#[test]
fn test_newline_tracking() {
    let mut lexer = Lexer::new(b"a\nb // c\nd /* x\ny */ e".to_vec());
    assert!(!next_token(&mut lexer, SlashGoal::Div).unwrap().newline_before);
    assert!(next_token(&mut lexer, SlashGoal::Div).unwrap().newline_before);
    assert!(next_token(&mut lexer, SlashGoal::Div).unwrap().newline_before);
    // A newline inside a block comment still counts for semicolon insertion.
    assert!(next_token(&mut lexer, SlashGoal::Div).unwrap().newline_before);
}

#[test]
fn test_unterminated_comment() {
    assert_eq!(lex_fails("a /* b"), ErrorKind::UnterminatedComment);
}
