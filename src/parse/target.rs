use crate::ast::{Ast, NodeId, PropKey};
use crate::error::{ErrorKind, PResult};
use crate::parse::expr::parse_assign;
use crate::parse::members::parse_prop_key;
use crate::parse::parser::Parser;
use crate::symbol::{ScopeId, SymbolKind};
use crate::token::Tok;

/// Parses a binding target in declaration position: a plain name, an array
/// pattern, or an object pattern. Declares every bound name with the given
/// role.
pub fn parse_binding_target(
    scope: ScopeId,
    parser: &mut Parser,
    kind: SymbolKind,
) -> PResult<NodeId> {
    match parser.peek_tok()? {
        Tok::BracketL => parse_array_target(scope, parser, kind),
        Tok::BraceL => parse_object_target(scope, parser, kind),
        _ => parse_binding_name(scope, parser, kind),
    }
}

pub fn parse_binding_name(
    scope: ScopeId,
    parser: &mut Parser,
    kind: SymbolKind,
) -> PResult<NodeId> {
    let token = parser.expect_name()?;
    let node = parser.add(scope, token.span.clone(), Ast::Binding {
        name: token.span.clone(),
    });
    parser.declare(scope, token.span, node, kind)?;
    Ok(node)
}

/// Wraps a just-parsed target with its default value if an `=` follows.
fn maybe_with_default(
    scope: ScopeId,
    parser: &mut Parser,
    target: NodeId,
) -> PResult<NodeId> {
    if parser.eat(Tok::Eq)?.is_none() {
        return Ok(target);
    };
    let value = parse_assign(scope, parser)?;
    let span = parser[target].span().to(parser[value].span());
    Ok(parser.add(scope, span, Ast::WithDefault { target, value }))
}

fn parse_array_target(
    scope: ScopeId,
    parser: &mut Parser,
    kind: SymbolKind,
) -> PResult<NodeId> {
    let open = parser.expect(Tok::BracketL)?;
    let mut items: Vec<Option<NodeId>> = Vec::new();
    let mut rest = None;
    loop {
        if parser.at(Tok::BracketR)? {
            break;
        };
        if parser.eat(Tok::Comma)?.is_some() {
            // A bare comma skips that element.
            items.push(None);
            continue;
        };
        if parser.eat(Tok::Ellipsis)?.is_some() {
            rest = Some(parse_binding_target(scope, parser, kind)?);
            if !parser.at(Tok::BracketR)? {
                return Err(parser.peek()?.error(ErrorKind::RestMustBeLast));
            };
            break;
        };
        let target = parse_binding_target(scope, parser, kind)?;
        items.push(Some(maybe_with_default(scope, parser, target)?));
        if parser.eat(Tok::Comma)?.is_none() {
            break;
        };
    }
    let close = parser.expect(Tok::BracketR)?;
    Ok(parser.add(
        scope,
        open.span.to(&close.span),
        Ast::ArrayTarget { items, rest },
    ))
}

fn parse_object_target(
    scope: ScopeId,
    parser: &mut Parser,
    kind: SymbolKind,
) -> PResult<NodeId> {
    let open = parser.expect(Tok::BraceL)?;
    let mut props: Vec<NodeId> = Vec::new();
    let mut rest = None;
    loop {
        if parser.at(Tok::BraceR)? {
            break;
        };
        if parser.eat(Tok::Ellipsis)?.is_some() {
            // Only a plain name can catch the rest of an object.
            rest = Some(parse_binding_name(scope, parser, kind)?);
            if !parser.at(Tok::BraceR)? {
                return Err(parser.peek()?.error(ErrorKind::RestMustBeLast));
            };
            break;
        };
        let key = parse_prop_key(scope, parser)?;
        let prop = if parser.eat(Tok::Colon)?.is_some() {
            let inner = parse_binding_target(scope, parser, kind)?;
            let target = maybe_with_default(scope, parser, inner)?;
            let span = key_span(parser, &key).to(parser[target].span());
            parser.add(scope, span, Ast::TargetProp {
                key,
                target: Some(target),
            })
        } else {
            // Shorthand: the key is the bound name.
            let name = match &key {
                PropKey::Direct(name) => name.clone(),
                PropKey::Computed(expr) => {
                    return Err(parser[*expr].error(ErrorKind::Expected("property target")))
                }
            };
            if parser.at(Tok::Eq)? {
                // Shorthand with default: bind the key's name, wrapped.
                let binding = parser.add(scope, name.clone(), Ast::Binding {
                    name: name.clone(),
                });
                parser.declare(scope, name.clone(), binding, kind)?;
                let target = maybe_with_default(scope, parser, binding)?;
                let span = name.to(parser[target].span());
                parser.add(scope, span, Ast::TargetProp {
                    key,
                    target: Some(target),
                })
            } else {
                let prop = parser.add(scope, name.clone(), Ast::TargetProp { key, target: None });
                parser.declare(scope, name, prop, kind)?;
                prop
            }
        };
        props.push(prop);
        if parser.eat(Tok::Comma)?.is_none() {
            break;
        };
    }
    let close = parser.expect(Tok::BraceR)?;
    Ok(parser.add(
        scope,
        open.span.to(&close.span),
        Ast::ObjectTarget { props, rest },
    ))
}

pub fn key_span(parser: &Parser, key: &PropKey) -> crate::source::Span {
    match key {
        PropKey::Direct(span) => span.clone(),
        PropKey::Computed(expr) => parser[*expr].span().clone(),
    }
}

/// Parses a parenthesised parameter list into Param nodes, declaring each
/// name into the function's scope.
pub fn parse_params(fn_scope: ScopeId, parser: &mut Parser) -> PResult<Vec<NodeId>> {
    parser.expect(Tok::ParenL)?;
    let mut params = Vec::new();
    loop {
        if parser.eat(Tok::ParenR)?.is_some() {
            break;
        };
        let rest = parser.eat(Tok::Ellipsis)?.is_some();
        let inner = parse_binding_target(fn_scope, parser, SymbolKind::Funarg)?;
        let target = maybe_with_default(fn_scope, parser, inner)?;
        let span = parser[target].span().clone();
        params.push(parser.add(fn_scope, span, Ast::Param { rest, target }));
        if rest && !parser.at(Tok::ParenR)? {
            return Err(parser.peek()?.error(ErrorKind::RestMustBeLast));
        };
        if parser.eat(Tok::Comma)?.is_none() {
            parser.expect(Tok::ParenR)?;
            break;
        };
    }
    Ok(params)
}

/// A parameter list is simple when every entry is a plain name with no
/// default and no rest; only then may a body carry a `"use strict"`
/// directive.
pub fn params_are_simple(parser: &Parser, params: &[NodeId]) -> bool {
    params.iter().all(|&param| match parser[param].ast() {
        Ast::Param { rest: false, target } => {
            matches!(parser[*target].ast(), Ast::Binding { .. })
        }
        _ => false,
    })
}
