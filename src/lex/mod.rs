use std::collections::HashMap;

use aho_corasick::AhoCorasick;
use lazy_static::lazy_static;
use memchr::{memchr, memchr3};

use crate::error::{ErrorKind, PResult, ParseError};
use crate::source::{Source, Span};
use crate::token::{Tok, Token};

#[cfg(test)]
mod tests;

/// How a `/` at the next position reads: as division (after an operand) or as
/// the start of a regular expression literal (everywhere else). The parser
/// picks per call site.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SlashGoal {
    Div,
    Regex,
}

/// A resumable cursor into the lexer, used by the parser for lookahead and
/// backtracking.
#[derive(Copy, Clone)]
pub struct LexState {
    pos: usize,
}

fn is_id_start(b: u8) -> bool {
    b == b'$' || b == b'_' || b.is_ascii_alphabetic() || b >= 0x80
}

fn is_id_part(b: u8) -> bool {
    is_id_start(b) || b.is_ascii_digit()
}

fn is_space(b: u8) -> bool {
    // Tab, LF, VT, FF, CR, space. Unicode whitespace is not considered.
    matches!(b, b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r' | b' ')
}

lazy_static! {
    /// Word spelling -> keyword tag. Anything absent lexes as `Name`.
    static ref KEYWORDS: HashMap<&'static [u8], Tok> = {
        let mut words = HashMap::<&'static [u8], Tok>::new();
        words.insert(b"as".as_ref(), Tok::As);
        words.insert(b"async".as_ref(), Tok::Async);
        words.insert(b"await".as_ref(), Tok::Await);
        words.insert(b"break".as_ref(), Tok::Break);
        words.insert(b"case".as_ref(), Tok::Case);
        words.insert(b"catch".as_ref(), Tok::Catch);
        words.insert(b"class".as_ref(), Tok::Class);
        words.insert(b"const".as_ref(), Tok::Const);
        words.insert(b"continue".as_ref(), Tok::Continue);
        words.insert(b"debugger".as_ref(), Tok::Debugger);
        words.insert(b"default".as_ref(), Tok::Default);
        words.insert(b"delete".as_ref(), Tok::Delete);
        words.insert(b"do".as_ref(), Tok::Do);
        words.insert(b"else".as_ref(), Tok::Else);
        words.insert(b"export".as_ref(), Tok::Export);
        words.insert(b"extends".as_ref(), Tok::Extends);
        words.insert(b"false".as_ref(), Tok::False);
        words.insert(b"finally".as_ref(), Tok::Finally);
        words.insert(b"for".as_ref(), Tok::For);
        words.insert(b"from".as_ref(), Tok::From);
        words.insert(b"function".as_ref(), Tok::Function);
        words.insert(b"get".as_ref(), Tok::Get);
        words.insert(b"if".as_ref(), Tok::If);
        words.insert(b"import".as_ref(), Tok::Import);
        words.insert(b"in".as_ref(), Tok::In);
        words.insert(b"instanceof".as_ref(), Tok::Instanceof);
        words.insert(b"let".as_ref(), Tok::Let);
        words.insert(b"new".as_ref(), Tok::New);
        words.insert(b"null".as_ref(), Tok::Null);
        words.insert(b"of".as_ref(), Tok::Of);
        words.insert(b"return".as_ref(), Tok::Return);
        words.insert(b"set".as_ref(), Tok::Set);
        words.insert(b"static".as_ref(), Tok::Static);
        words.insert(b"super".as_ref(), Tok::Super);
        words.insert(b"switch".as_ref(), Tok::Switch);
        words.insert(b"this".as_ref(), Tok::This);
        words.insert(b"throw".as_ref(), Tok::Throw);
        words.insert(b"true".as_ref(), Tok::True);
        words.insert(b"try".as_ref(), Tok::Try);
        words.insert(b"typeof".as_ref(), Tok::Typeof);
        words.insert(b"undefined".as_ref(), Tok::Undefined);
        words.insert(b"var".as_ref(), Tok::Var);
        words.insert(b"void".as_ref(), Tok::Void);
        words.insert(b"while".as_ref(), Tok::While);
        words.insert(b"with".as_ref(), Tok::With);
        words.insert(b"yield".as_ref(), Tok::Yield);
        words
    };

    static ref BLOCK_COMMENT_END: AhoCorasick = AhoCorasick::new(&["*/"]);
}

pub struct Lexer {
    source: Source,
    pos: usize,
}

impl Lexer {
    pub fn new(bytes: Vec<u8>) -> Lexer {
        Lexer {
            source: Source::new(bytes),
            pos: 0,
        }
    }

    pub fn whole_span(&self) -> Span {
        Span {
            source: self.source.clone(),
            start: 0,
            end: self.source.len(),
        }
    }

    pub fn state(&self) -> LexState {
        LexState { pos: self.pos }
    }

    pub fn rewind(&mut self, state: LexState) -> () {
        self.pos = state.pos;
    }

    pub fn span_between(&self, from: LexState, to: LexState) -> Span {
        Span {
            source: self.source.clone(),
            start: from.pos,
            end: to.pos,
        }
    }

    fn rest(&self) -> &[u8] {
        &self.source.bytes()[self.pos..]
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn byte(&self, ahead: usize) -> Option<u8> {
        self.source.bytes().get(self.pos + ahead).copied()
    }

    fn advance(&mut self, by: usize) -> () {
        self.pos += by;
    }

    /// Advances while the predicate holds.
    fn eat_while<P: Fn(u8) -> bool>(&mut self, pred: P) -> () {
        while let Some(b) = self.byte(0) {
            if !pred(b) {
                break;
            };
            self.pos += 1;
        }
    }

    fn span_from(&self, start: usize) -> Span {
        Span {
            source: self.source.clone(),
            start,
            end: self.pos,
        }
    }

    fn error(&self, kind: ErrorKind) -> ParseError {
        ParseError::new(kind, self.source.clone(), self.pos, None)
    }
}

/// Skips whitespace and comments; returns whether a line terminator was
/// crossed (a newline inside a block comment counts).
fn skip_trivia(lexer: &mut Lexer) -> PResult<bool> {
    let mut newline = false;
    loop {
        let before = lexer.pos;
        lexer.eat_while(is_space);
        if memchr(b'\n', &lexer.source.bytes()[before..lexer.pos]).is_some() {
            newline = true;
        };
        match (lexer.byte(0), lexer.byte(1)) {
            (Some(b'/'), Some(b'/')) => {
                match memchr(b'\n', lexer.rest()) {
                    Some(offset) => {
                        lexer.advance(offset + 1);
                        newline = true;
                    }
                    None => {
                        lexer.pos = lexer.source.len();
                    }
                };
            }
            (Some(b'/'), Some(b'*')) => {
                lexer.advance(2);
                let found = BLOCK_COMMENT_END
                    .find(lexer.rest())
                    .ok_or_else(|| lexer.error(ErrorKind::UnterminatedComment))?;
                if memchr(b'\n', &lexer.rest()[..found.start()]).is_some() {
                    newline = true;
                };
                lexer.advance(found.end());
            }
            _ => return Ok(newline),
        };
    }
}

fn lex_word(lexer: &mut Lexer) -> (Tok, usize) {
    let start = lexer.pos;
    lexer.eat_while(is_id_part);
    let tok = KEYWORDS
        .get(&lexer.source.bytes()[start..lexer.pos])
        .copied()
        .unwrap_or(Tok::Name);
    (tok, start)
}

fn lex_number(lexer: &mut Lexer) -> usize {
    let start = lexer.pos;
    if lexer.byte(0) == Some(b'0')
        && matches!(
            lexer.byte(1),
            Some(b'x') | Some(b'X') | Some(b'o') | Some(b'O') | Some(b'b') | Some(b'B')
        )
    {
        lexer.advance(2);
        // Digit validity per radix is checked during value normalisation.
        lexer.eat_while(|b| b.is_ascii_alphanumeric());
        return start;
    };
    lexer.eat_while(|b| b.is_ascii_digit());
    if lexer.byte(0) == Some(b'.') {
        lexer.advance(1);
        lexer.eat_while(|b| b.is_ascii_digit());
    };
    if matches!(lexer.byte(0), Some(b'e') | Some(b'E')) {
        let mut exponent_len = 1;
        if matches!(lexer.byte(1), Some(b'+') | Some(b'-')) {
            exponent_len = 2;
        };
        if lexer.byte(exponent_len).map_or(false, |b| b.is_ascii_digit()) {
            lexer.advance(exponent_len);
            lexer.eat_while(|b| b.is_ascii_digit());
        };
    };
    start
}

fn lex_string(lexer: &mut Lexer) -> PResult<usize> {
    let start = lexer.pos;
    let quote = lexer.byte(0).unwrap();
    lexer.advance(1);
    loop {
        let offset = memchr3(quote, b'\\', b'\n', lexer.rest())
            .ok_or_else(|| lexer.error(ErrorKind::UnexpectedEof))?;
        lexer.advance(offset);
        match lexer.byte(0).unwrap() {
            b'\\' => {
                if lexer.byte(1).is_none() {
                    return Err(lexer.error(ErrorKind::UnexpectedEof));
                };
                lexer.advance(2);
            }
            b'\n' => return Err(lexer.error(ErrorKind::NewlineInString)),
            _ => {
                lexer.advance(1);
                return Ok(start);
            }
        };
    }
}

/// Scans a regular expression literal, body and flags in one span. The
/// pattern is never compiled; `/` inside a character class does not end it.
fn lex_regex(lexer: &mut Lexer) -> PResult<usize> {
    let start = lexer.pos;
    lexer.advance(1);
    let mut in_class = false;
    loop {
        match lexer.byte(0).ok_or_else(|| lexer.error(ErrorKind::UnexpectedEof))? {
            b'\\' => {
                if lexer.byte(1) == Some(b'\n') {
                    return Err(lexer.error(ErrorKind::NewlineInRegex));
                };
                lexer.advance(2);
            }
            b'\n' => return Err(lexer.error(ErrorKind::NewlineInRegex)),
            b'[' => {
                in_class = true;
                lexer.advance(1);
            }
            b']' => {
                in_class = false;
                lexer.advance(1);
            }
            b'/' if !in_class => {
                lexer.advance(1);
                break;
            }
            _ => lexer.advance(1),
        };
    }
    lexer.eat_while(is_id_part);
    Ok(start)
}

/// Scans one template piece up to the next `${` or the closing backquote,
/// starting just inside. The parser calls this again after each substitution.
pub fn lex_template_piece(lexer: &mut Lexer, newline_before: bool) -> PResult<Token> {
    let start = lexer.pos;
    loop {
        let offset = memchr3(b'`', b'$', b'\\', lexer.rest())
            .ok_or_else(|| lexer.error(ErrorKind::UnexpectedEof))?;
        lexer.advance(offset);
        match lexer.byte(0).unwrap() {
            b'\\' => {
                if lexer.byte(1).is_none() {
                    return Err(lexer.error(ErrorKind::UnexpectedEof));
                };
                lexer.advance(2);
            }
            b'`' => {
                let span = lexer.span_from(start);
                lexer.advance(1);
                return Ok(Token {
                    tok: Tok::TemplateEnd,
                    span,
                    newline_before,
                });
            }
            _ => {
                // `$`
                if lexer.byte(1) == Some(b'{') {
                    let span = lexer.span_from(start);
                    lexer.advance(2);
                    return Ok(Token {
                        tok: Tok::TemplateChunk,
                        span,
                        newline_before,
                    });
                };
                lexer.advance(1);
            }
        };
    }
}

/// Multi-byte punctuators are resolved by explicit lookahead, longest first.
/// Returns the tag and its byte length.
fn lex_operator(lexer: &Lexer) -> Option<(Tok, usize)> {
    let b0 = lexer.byte(0)?;
    let b1 = lexer.byte(1);
    let b2 = lexer.byte(2);
    let b3 = lexer.byte(3);
    Some(match b0 {
        b'{' => (Tok::BraceL, 1),
        b'}' => (Tok::BraceR, 1),
        b'[' => (Tok::BracketL, 1),
        b']' => (Tok::BracketR, 1),
        b'(' => (Tok::ParenL, 1),
        b')' => (Tok::ParenR, 1),
        b';' => (Tok::Semi, 1),
        b',' => (Tok::Comma, 1),
        b':' => (Tok::Colon, 1),
        b'~' => (Tok::Tilde, 1),
        b'.' => match (b1, b2) {
            (Some(b'.'), Some(b'.')) => (Tok::Ellipsis, 3),
            _ => (Tok::Dot, 1),
        },
        b'?' => match (b1, b2) {
            (Some(b'?'), Some(b'=')) => (Tok::CoalesceEq, 3),
            (Some(b'?'), _) => (Tok::Coalesce, 2),
            // `?.5` is a conditional with a number, not optional chaining.
            (Some(b'.'), Some(d)) if d.is_ascii_digit() => (Tok::Question, 1),
            (Some(b'.'), Some(b'[')) => (Tok::QuestionDotBracketL, 3),
            (Some(b'.'), Some(b'(')) => (Tok::QuestionDotParenL, 3),
            (Some(b'.'), _) => (Tok::QuestionDot, 2),
            _ => (Tok::Question, 1),
        },
        b'=' => match (b1, b2) {
            (Some(b'='), Some(b'=')) => (Tok::EqEqEq, 3),
            (Some(b'='), _) => (Tok::EqEq, 2),
            (Some(b'>'), _) => (Tok::Arrow, 2),
            _ => (Tok::Eq, 1),
        },
        b'!' => match (b1, b2) {
            (Some(b'='), Some(b'=')) => (Tok::BangEqEq, 3),
            (Some(b'='), _) => (Tok::BangEq, 2),
            _ => (Tok::Bang, 1),
        },
        b'+' => match b1 {
            Some(b'+') => (Tok::Inc, 2),
            Some(b'=') => (Tok::PlusEq, 2),
            _ => (Tok::Plus, 1),
        },
        b'-' => match b1 {
            Some(b'-') => (Tok::Dec, 2),
            Some(b'=') => (Tok::MinusEq, 2),
            _ => (Tok::Minus, 1),
        },
        b'*' => match (b1, b2) {
            (Some(b'*'), Some(b'=')) => (Tok::StarstarEq, 3),
            (Some(b'*'), _) => (Tok::Starstar, 2),
            (Some(b'='), _) => (Tok::StarEq, 2),
            _ => (Tok::Star, 1),
        },
        b'/' => match b1 {
            Some(b'=') => (Tok::SlashEq, 2),
            _ => (Tok::Slash, 1),
        },
        b'%' => match b1 {
            Some(b'=') => (Tok::PercentEq, 2),
            _ => (Tok::Percent, 1),
        },
        b'<' => match (b1, b2) {
            (Some(b'<'), Some(b'=')) => (Tok::ShlEq, 3),
            (Some(b'<'), _) => (Tok::Shl, 2),
            (Some(b'='), _) => (Tok::LtEq, 2),
            _ => (Tok::Lt, 1),
        },
        b'>' => match (b1, b2, b3) {
            (Some(b'>'), Some(b'>'), Some(b'=')) => (Tok::ShrZeroEq, 4),
            (Some(b'>'), Some(b'>'), _) => (Tok::ShrZero, 3),
            (Some(b'>'), Some(b'='), _) => (Tok::ShrEq, 3),
            (Some(b'>'), _, _) => (Tok::Shr, 2),
            (Some(b'='), _, _) => (Tok::GtEq, 2),
            _ => (Tok::Gt, 1),
        },
        b'&' => match (b1, b2) {
            (Some(b'&'), Some(b'=')) => (Tok::AmpAmpEq, 3),
            (Some(b'&'), _) => (Tok::AmpAmp, 2),
            (Some(b'='), _) => (Tok::AmpEq, 2),
            _ => (Tok::Amp, 1),
        },
        b'|' => match (b1, b2) {
            (Some(b'|'), Some(b'=')) => (Tok::PipePipeEq, 3),
            (Some(b'|'), _) => (Tok::PipePipe, 2),
            (Some(b'='), _) => (Tok::PipeEq, 2),
            _ => (Tok::Pipe, 1),
        },
        b'^' => match b1 {
            Some(b'=') => (Tok::CaretEq, 2),
            _ => (Tok::Caret, 1),
        },
        _ => return None,
    })
}

/// Produces the next token. `goal` controls how a leading `/` reads.
pub fn next_token(lexer: &mut Lexer, goal: SlashGoal) -> PResult<Token> {
    let newline_before = skip_trivia(lexer)?;
    if lexer.at_eof() {
        return Ok(Token {
            tok: Tok::Eof,
            span: lexer.span_from(lexer.pos),
            newline_before,
        });
    };
    let b = lexer.byte(0).unwrap();
    let (tok, start) = if is_id_start(b) {
        lex_word(lexer)
    } else if b.is_ascii_digit() {
        (Tok::Num, lex_number(lexer))
    } else if b == b'.' && lexer.byte(1).map_or(false, |d| d.is_ascii_digit()) {
        (Tok::Num, lex_number_after_dot(lexer))
    } else if b == b'"' || b == b'\'' {
        (Tok::Str, lex_string(lexer)?)
    } else if b == b'`' {
        lexer.advance(1);
        return lex_template_piece(lexer, newline_before);
    } else if b == b'/' && goal == SlashGoal::Regex {
        (Tok::Regexp, lex_regex(lexer)?)
    } else {
        match lex_operator(lexer) {
            Some((tok, len)) => {
                let start = lexer.pos;
                lexer.advance(len);
                (tok, start)
            }
            None => return Err(lexer.error(ErrorKind::UnexpectedChar)),
        }
    };
    Ok(Token {
        tok,
        span: lexer.span_from(start),
        newline_before,
    })
}

fn lex_number_after_dot(lexer: &mut Lexer) -> usize {
    let start = lexer.pos;
    lexer.advance(1);
    lexer.eat_while(|b| b.is_ascii_digit());
    if matches!(lexer.byte(0), Some(b'e') | Some(b'E')) {
        let mut exponent_len = 1;
        if matches!(lexer.byte(1), Some(b'+') | Some(b'-')) {
            exponent_len = 2;
        };
        if lexer.byte(exponent_len).map_or(false, |b| b.is_ascii_digit()) {
            lexer.advance(exponent_len);
            lexer.eat_while(|b| b.is_ascii_digit());
        };
    };
    start
}
