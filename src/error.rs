use std::fmt::{self, Debug, Display, Formatter};

use crate::source::{Position, Source, Span};
use crate::token::Tok;

/// What went wrong, grouped the way the pipeline reports failures: lexical
/// errors from the character stream, syntactic errors from token structure,
/// and semantic errors from binding and context rules.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ErrorKind {
    // Lexical.
    UnexpectedChar,
    UnexpectedEof,
    UnterminatedComment,
    NewlineInString,
    NewlineInRegex,
    BadNumber,

    // Syntactic.
    Expected(&'static str),
    ExpectedToken(Tok),
    BadAssignTarget,
    RestMustBeLast,
    NewlineAfterArrowParams,
    NewlineAfterThrow,
    MultipleDefaultClauses,
    TryWithoutHandler,
    ForHeadMultipleDefs,
    ForHeadBadTarget,

    // Semantic.
    DuplicateBinding,
    DuplicateLabel,
    UnknownLabel,
    ContinueTargetNotLoop,
    IllegalJump,
    StrictAssignToRestricted,
    StrictWith,
    DirectiveNeedsSimpleParams,
}

/// A fatal parse failure. The byte offset resolves to a line/column
/// `Position` on demand. `recoverable` marks kinds a future continuation mode
/// could tolerate; today they abort identically.
#[derive(Clone)]
pub struct ParseError {
    kind: ErrorKind,
    source: Source,
    at: usize,
    found: Option<Tok>,
    recoverable: bool,
}

impl ParseError {
    pub fn new(kind: ErrorKind, source: Source, at: usize, found: Option<Tok>) -> ParseError {
        ParseError {
            kind,
            source,
            at,
            found,
            recoverable: false,
        }
    }

    pub fn at_span(kind: ErrorKind, span: &Span, found: Option<Tok>) -> ParseError {
        ParseError::new(kind, span.source.clone(), span.start, found)
    }

    pub fn recoverable_at_span(kind: ErrorKind, span: &Span, found: Option<Tok>) -> ParseError {
        let mut error = ParseError::at_span(kind, span, found);
        error.recoverable = true;
        error
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }

    pub fn position(&self) -> Position {
        self.source.position_of(self.at)
    }
}

impl Debug for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let position = self.position();
        write!(
            f,
            "{:?} at {}:{}",
            self.kind, position.line, position.column
        )?;
        if let Some(found) = self.found {
            write!(f, " (found {:?})", found)?;
        };
        Ok(())
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl std::error::Error for ParseError {}

impl PartialEq for ParseError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for ParseError {}

pub type PResult<T> = Result<T, ParseError>;
