use crate::ast::{Ast, DeclKind, NodeId};
use crate::error::PResult;
use crate::parse::expr::{parse_access_like_parent, parse_assign};
use crate::parse::members::parse_class_members;
use crate::parse::parser::Parser;
use crate::parse::stmt::parse_function_body;
use crate::parse::target::{parse_binding_target, parse_params};
use crate::symbol::{ScopeId, ScopeKind, SymbolKind};
use crate::token::Tok;

/// `var`/`let`/`const` with one or more defs. In a for-statement head the
/// caller finishes the statement itself, so no semicolon is taken here.
pub fn parse_declaration(
    scope: ScopeId,
    parser: &mut Parser,
    in_for_head: bool,
) -> PResult<NodeId> {
    let leader = parser.bump()?;
    let kind = match leader.tok {
        Tok::Var => DeclKind::Var,
        Tok::Let => DeclKind::Let,
        _ => DeclKind::Const,
    };
    let symbol_kind = match kind {
        DeclKind::Var => SymbolKind::Var,
        DeclKind::Let => SymbolKind::Let,
        DeclKind::Const => SymbolKind::Const,
    };
    let mut span = leader.span.clone();
    let mut defs = Vec::new();
    loop {
        let name = parse_binding_target(scope, parser, symbol_kind)?;
        let value = if parser.eat(Tok::Eq)?.is_some() {
            let value = parse_assign(scope, parser)?;
            span.grow(parser[value].span());
            Some(value)
        } else {
            span.grow(parser[name].span());
            None
        };
        let def_span = match value {
            Some(value) => parser[name].span().to(parser[value].span()),
            None => parser[name].span().clone(),
        };
        defs.push(parser.add(scope, def_span, Ast::VarDef { name, value }));
        if parser.eat(Tok::Comma)?.is_none() {
            break;
        };
    }
    if !in_for_head {
        parser.insert_semicolon()?;
    };
    Ok(parser.add(scope, span, Ast::Declaration { kind, defs }))
}

/// A function in statement or expression position. Statement names hoist to
/// the enclosing closure; an expression's name is visible only inside its
/// own body. The name may be absent for expressions and default exports.
pub fn parse_function(scope: ScopeId, parser: &mut Parser, as_statement: bool) -> PResult<NodeId> {
    let is_async = parser.eat(Tok::Async)?.is_some();
    let start = parser.expect(Tok::Function)?.span;
    let generator = parser.eat(Tok::Star)?.is_some();
    let fn_scope = parser.open_scope(scope, ScopeKind::Closure);
    let peeked = parser.peek_tok()?;
    let name = if parser.rules.allows_name(peeked) {
        let token = parser.bump()?;
        let binding = parser.add(fn_scope, token.span.clone(), Ast::Binding {
            name: token.span.clone(),
        });
        if as_statement {
            parser.declare(scope, token.span, binding, SymbolKind::Defun)?;
        } else {
            parser.declare(fn_scope, token.span, binding, SymbolKind::Lambda)?;
        };
        Some(binding)
    } else {
        None
    };
    let saved_rules = parser.rules;
    parser.rules.await_is_name = !is_async && parser.rules.await_is_name;
    parser.rules.yield_is_name = !generator && parser.rules.yield_is_name;
    let result = (|| {
        let params = parse_params(fn_scope, parser)?;
        let body = parse_function_body(fn_scope, parser, &params)?;
        Ok((params, body))
    })();
    parser.rules = saved_rules;
    let (params, body) = result?;
    Ok(parser.add(scope, start.to(parser[body].span()), Ast::Function {
        grouped: false,
        is_async,
        generator,
        name,
        params,
        body,
    }))
}

/// A class in statement or expression position; statement names bind
/// lexically in the surrounding scope.
pub fn parse_class(scope: ScopeId, parser: &mut Parser, as_statement: bool) -> PResult<NodeId> {
    let start = parser.expect(Tok::Class)?.span;
    let name = if parser.at(Tok::Name)? {
        let token = parser.bump()?;
        let binding = parser.add(scope, token.span.clone(), Ast::Binding {
            name: token.span.clone(),
        });
        if as_statement {
            parser.declare(scope, token.span, binding, SymbolKind::Class)?;
        };
        Some(binding)
    } else {
        None
    };
    let parent = if parser.eat(Tok::Extends)?.is_some() {
        Some(parse_access_like_parent(scope, parser)?)
    } else {
        None
    };
    let (members, end) = parse_class_members(scope, parser)?;
    Ok(parser.add(scope, start.to(&end), Ast::Class {
        grouped: false,
        name,
        parent,
        members,
    }))
}
