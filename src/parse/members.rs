use crate::ast::{Ast, MethodKind, NodeId, PropKey};
use crate::error::PResult;
use crate::operator::AssignOp;
use crate::parse::expr::parse_assign;
use crate::parse::parser::Parser;
use crate::parse::stmt::parse_function_body;
use crate::parse::target::{key_span, parse_params};
use crate::source::Span;
use crate::symbol::{ScopeId, ScopeKind};
use crate::token::Tok;

/// A property name: any word, a string or number literal, or `[expr]`.
pub fn parse_prop_key(scope: ScopeId, parser: &mut Parser) -> PResult<PropKey> {
    if parser.eat(Tok::BracketL)?.is_some() {
        let expr = parse_assign(scope, parser)?;
        parser.expect(Tok::BracketR)?;
        return Ok(PropKey::Computed(expr));
    };
    let token = parser.peek()?;
    match token.tok {
        Tok::Str | Tok::Num => {
            let token = parser.bump()?;
            Ok(PropKey::Direct(token.span))
        }
        _ => {
            let token = parser.expect_word()?;
            Ok(PropKey::Direct(token.span))
        }
    }
}

/// Leading `get`/`set`/`async`/`*` markers, when they are markers and not
/// simply property names (a following `(`/`:`/`,`/`=`/`}` means the word was
/// the key itself).
fn method_marker(parser: &mut Parser) -> PResult<Option<MethodKind>> {
    let tok = parser.peek_tok()?;
    let marker = match tok {
        Tok::Get => Some(MethodKind::Get),
        Tok::Set => Some(MethodKind::Set),
        Tok::Async => Some(MethodKind::Plain {
            is_async: true,
            generator: false,
        }),
        Tok::Star => Some(MethodKind::Plain {
            is_async: false,
            generator: true,
        }),
        _ => None,
    };
    let kind = match marker {
        Some(kind) => kind,
        None => return Ok(None),
    };
    if tok != Tok::Star {
        let mark = parser.mark();
        parser.bump()?;
        let after = parser.peek_tok()?;
        if matches!(
            after,
            Tok::ParenL | Tok::Colon | Tok::Comma | Tok::Eq | Tok::BraceR | Tok::Semi
        ) {
            parser.rewind(mark);
            return Ok(None);
        };
        // `async *name() {}`.
        if after == Tok::Star && matches!(kind, MethodKind::Plain { .. }) {
            parser.bump()?;
            return Ok(Some(MethodKind::Plain {
                is_async: true,
                generator: true,
            }));
        };
        return Ok(Some(kind));
    };
    parser.bump()?;
    Ok(Some(kind))
}

fn parse_method(
    scope: ScopeId,
    parser: &mut Parser,
    is_static: bool,
    kind: MethodKind,
    key: PropKey,
) -> PResult<NodeId> {
    let fn_scope = parser.open_scope(scope, ScopeKind::Closure);
    let saved_rules = parser.rules;
    if let MethodKind::Plain {
        is_async,
        generator,
    } = kind
    {
        parser.rules.await_is_name = !is_async && parser.rules.await_is_name;
        parser.rules.yield_is_name = !generator && parser.rules.yield_is_name;
    };
    let params = parse_params(fn_scope, parser)?;
    let body = parse_function_body(fn_scope, parser, &params)?;
    parser.rules = saved_rules;
    let span = key_span(parser, &key).to(parser[body].span());
    Ok(parser.add(scope, span, Ast::Method {
        is_static,
        kind,
        key,
        params,
        body,
    }))
}

/// One entry of an object literal: a spread, a method, an accessor, a
/// `key: value` pair, shorthand, or shorthand with a cover-grammar default
/// (only legal if the whole literal converts to an assignment target).
fn parse_object_prop(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    if let Some(dots) = parser.eat(Tok::Ellipsis)? {
        let operand = parse_assign(scope, parser)?;
        let span = dots.span.to(parser[operand].span());
        return Ok(parser.add(scope, span, Ast::Spread { operand }));
    };
    if let Some(kind) = method_marker(parser)? {
        let key = parse_prop_key(scope, parser)?;
        return parse_method(scope, parser, false, kind, key);
    };
    let key = parse_prop_key(scope, parser)?;
    if parser.at(Tok::ParenL)? {
        let kind = MethodKind::Plain {
            is_async: false,
            generator: false,
        };
        return parse_method(scope, parser, false, kind, key);
    };
    if parser.eat(Tok::Colon)?.is_some() {
        let value = parse_assign(scope, parser)?;
        let span = key_span(parser, &key).to(parser[value].span());
        return Ok(parser.add(scope, span, Ast::Property {
            key,
            value: Some(value),
        }));
    };
    let name = key_span(parser, &key);
    if parser.eat(Tok::Eq)?.is_some() {
        // `{ a = 1 }` is only meaningful as a destructuring cover; store it
        // as an assignment so the conversion can pick it apart.
        let target = parser.add(scope, name.clone(), Ast::Symbol { name: name.clone() });
        let value = parse_assign(scope, parser)?;
        let span = name.to(parser[value].span());
        let assign = parser.add(scope, span.clone(), Ast::Assign {
            op: AssignOp::Assign,
            target,
            value,
            grouped: false,
        });
        return Ok(parser.add(scope, span, Ast::Property {
            key,
            value: Some(assign),
        }));
    };
    Ok(parser.add(scope, name, Ast::Property { key, value: None }))
}

pub fn parse_object_literal(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let open = parser.expect(Tok::BraceL)?;
    let mut props = Vec::new();
    loop {
        if parser.at(Tok::BraceR)? {
            break;
        };
        props.push(parse_object_prop(scope, parser)?);
        if parser.eat(Tok::Comma)?.is_none() {
            break;
        };
    }
    let close = parser.expect(Tok::BraceR)?;
    Ok(parser.add(scope, open.span.to(&close.span), Ast::Object { props }))
}

/// The `{ ... }` of a class: methods, accessors, and fields, with optional
/// `static` on each.
pub fn parse_class_members(
    scope: ScopeId,
    parser: &mut Parser,
) -> PResult<(Vec<NodeId>, Span)> {
    parser.expect(Tok::BraceL)?;
    let mut members = Vec::new();
    while !parser.at(Tok::BraceR)? {
        if parser.eat(Tok::Semi)?.is_some() {
            continue;
        };
        let is_static = match parser.peek_tok()? {
            Tok::Static => {
                let mark = parser.mark();
                parser.bump()?;
                // `static` may itself be a member name.
                if matches!(parser.peek_tok()?, Tok::ParenL | Tok::Eq | Tok::Semi) {
                    parser.rewind(mark);
                    false
                } else {
                    true
                }
            }
            _ => false,
        };
        let marker = method_marker(parser)?;
        let key = parse_prop_key(scope, parser)?;
        if let Some(kind) = marker {
            members.push(parse_method(scope, parser, is_static, kind, key)?);
            continue;
        };
        if parser.at(Tok::ParenL)? {
            let kind = MethodKind::Plain {
                is_async: false,
                generator: false,
            };
            members.push(parse_method(scope, parser, is_static, kind, key)?);
            continue;
        };
        let value = if parser.eat(Tok::Eq)?.is_some() {
            Some(parse_assign(scope, parser)?)
        } else {
            None
        };
        let span = match value {
            Some(value) => key_span(parser, &key).to(parser[value].span()),
            None => key_span(parser, &key),
        };
        members.push(parser.add(scope, span, Ast::Field {
            is_static,
            key,
            value,
        }));
        parser.eat(Tok::Semi)?;
    }
    let close = parser.expect(Tok::BraceR)?;
    Ok((members, close.span))
}
