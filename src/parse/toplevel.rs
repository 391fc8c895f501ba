use crate::ast::{Ast, NodeId};
use crate::error::PResult;
use crate::parse::parser::Parser;
use crate::parse::stmt::{apply_toplevel_directive, parse_stmt};
use crate::symbol::{ScopeId, ScopeKind};
use crate::token::Tok;

/// How the outermost scope behaves: a classic script shares the true global
/// namespace, while a module (the linker's unit) is its own closure whose
/// top-level names can be renamed.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum SourceKind {
    Script,
    Module,
}

pub struct ParsedSource {
    pub root: NodeId,
    pub scope: ScopeId,
}

pub fn parse_source(parser: &mut Parser, kind: SourceKind) -> PResult<ParsedSource> {
    let scope = parser.root_scope(match kind {
        SourceKind::Script => ScopeKind::Global,
        SourceKind::Module => ScopeKind::Closure,
    });
    let mut body = Vec::new();
    let mut prologue = true;
    while !parser.at(Tok::Eof)? {
        let stmt = parse_stmt(scope, parser)?;
        if prologue {
            prologue = apply_toplevel_directive(parser, stmt, scope)?;
        };
        body.push(stmt);
    }
    let span = parser.whole_span();
    let root = parser.add(scope, span, Ast::Toplevel { body });
    Ok(ParsedSource { root, scope })
}
