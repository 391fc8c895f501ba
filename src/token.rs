use crate::error::{ErrorKind, ParseError};
use crate::source::Span;

/// Token tags. Punctuators and operators are spelled after their glyphs;
/// words are one tag per keyword plus `Name` for everything else. Reserved
/// and contextual keywords share the word namespace, and the parser decides
/// where a keyword may double as a plain name.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Tok {
    Eof,

    // Words and literals.
    Name,
    Num,
    Str,
    Regexp,
    // A template piece ending in `${` (more pieces follow) or in the closing
    // backquote.
    TemplateChunk,
    TemplateEnd,

    // Brackets and separators.
    BraceL,
    BraceR,
    BracketL,
    BracketR,
    ParenL,
    ParenR,
    Semi,
    Comma,
    Colon,
    Dot,
    Ellipsis,
    Arrow,
    Question,
    QuestionDot,
    QuestionDotBracketL,
    QuestionDotParenL,

    // Operators.
    Eq,
    EqEq,
    EqEqEq,
    Bang,
    BangEq,
    BangEqEq,
    Plus,
    PlusEq,
    Inc,
    Minus,
    MinusEq,
    Dec,
    Star,
    StarEq,
    Starstar,
    StarstarEq,
    Slash,
    SlashEq,
    Percent,
    PercentEq,
    Lt,
    LtEq,
    Shl,
    ShlEq,
    Gt,
    GtEq,
    Shr,
    ShrEq,
    ShrZero,
    ShrZeroEq,
    Amp,
    AmpEq,
    AmpAmp,
    AmpAmpEq,
    Pipe,
    PipeEq,
    PipePipe,
    PipePipeEq,
    Caret,
    CaretEq,
    Tilde,
    Coalesce,
    CoalesceEq,

    // Reserved words.
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Export,
    Extends,
    False,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    New,
    Null,
    Return,
    Super,
    Switch,
    This,
    Throw,
    True,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,

    // Words reserved only in some contexts.
    As,
    Async,
    Await,
    From,
    Get,
    Let,
    Of,
    Set,
    Static,
    Undefined,
    Yield,
}

impl Tok {
    /// Any identifier-shaped token, keyword or not. Property names after `.`
    /// and object keys accept all of these.
    pub fn is_word(self) -> bool {
        self >= Tok::Break || self == Tok::Name
    }

    /// Contextual keywords are usable as plain variable names everywhere.
    pub fn is_contextual_word(self) -> bool {
        matches!(
            self,
            Tok::As | Tok::Async | Tok::From | Tok::Get | Tok::Let | Tok::Of | Tok::Set
                | Tok::Static
        )
    }
}

#[derive(Clone, Debug)]
pub struct Token {
    pub tok: Tok,
    pub span: Span,
    // Whether a line terminator appeared between the previous token and this
    // one; drives automatic semicolon insertion.
    pub newline_before: bool,
}

impl Token {
    pub fn error(&self, kind: ErrorKind) -> ParseError {
        ParseError::at_span(kind, &self.span, Some(self.tok))
    }
}
