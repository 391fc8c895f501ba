use crate::ast::{Ast, NodeId};
use crate::error::{ErrorKind, PResult};
use crate::operator::AssignOp;
use crate::parse::decl::{parse_class, parse_declaration, parse_function};
use crate::parse::expr::{parse_assign, parse_expr, to_assignable};
use crate::parse::literal::expect_string_value;
use crate::parse::parser::Parser;
use crate::parse::target::{parse_binding_target, params_are_simple};
use crate::symbol::{ScopeId, ScopeKind, SymbolKind};
use crate::token::Tok;

pub fn parse_stmt(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    match parser.peek_tok()? {
        Tok::BraceL => parse_block(scope, parser),
        Tok::Semi => {
            let token = parser.bump()?;
            Ok(parser.add(scope, token.span, Ast::EmptyStatement {}))
        }
        Tok::Var | Tok::Let | Tok::Const => parse_declaration(scope, parser, false),
        Tok::Function => parse_function(scope, parser, true),
        Tok::Async => {
            // Only `async function` opens a declaration; anything else is an
            // expression (async arrow, call, or the name `async`).
            let mark = parser.mark();
            parser.bump()?;
            let is_decl = parser.at(Tok::Function)? && !parser.peek()?.newline_before;
            parser.rewind(mark);
            if is_decl {
                parse_function(scope, parser, true)
            } else {
                parse_expr_stmt(scope, parser)
            }
        }
        Tok::Class => parse_class(scope, parser, true),
        Tok::If => parse_if(scope, parser),
        Tok::While => parse_while(scope, parser),
        Tok::Do => parse_do(scope, parser),
        Tok::For => parse_for(scope, parser),
        Tok::Switch => parse_switch(scope, parser),
        Tok::Try => parse_try(scope, parser),
        Tok::Throw => parse_throw(scope, parser),
        Tok::Return => parse_return(scope, parser),
        Tok::Break | Tok::Continue => parse_jump(scope, parser),
        Tok::With => parse_with(scope, parser),
        Tok::Debugger => {
            let token = parser.bump()?;
            parser.insert_semicolon()?;
            Ok(parser.add(scope, token.span, Ast::Debugger {}))
        }
        Tok::Import => parse_import(scope, parser),
        Tok::Export => parse_export(scope, parser),
        tok if parser.rules.allows_name(tok) => {
            // `name:` opens a labeled statement.
            let mark = parser.mark();
            let label = parser.bump()?;
            if parser.eat(Tok::Colon)?.is_some() {
                let is_loop = matches!(parser.peek_tok()?, Tok::Do | Tok::For | Tok::While);
                parser.push_label(label.span.clone(), is_loop)?;
                let body = parse_stmt(scope, parser);
                parser.pop_label();
                let body = body?;
                let span = label.span.to(parser[body].span());
                return Ok(parser.add(scope, span, Ast::Labeled {
                    label: label.span,
                    body,
                }));
            };
            parser.rewind(mark);
            parse_expr_stmt(scope, parser)
        }
        _ => parse_expr_stmt(scope, parser),
    }
}

fn parse_expr_stmt(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let expr = parse_expr(scope, parser)?;
    parser.insert_semicolon()?;
    let span = parser[expr].span().clone();
    Ok(parser.add(scope, span, Ast::SimpleStatement { expr }))
}

pub fn parse_block(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let open = parser.expect(Tok::BraceL)?;
    let inner = parser.open_scope(scope, ScopeKind::Block);
    let mut body = Vec::new();
    while !parser.at(Tok::BraceR)? {
        body.push(parse_stmt(inner, parser)?);
    }
    let close = parser.expect(Tok::BraceR)?;
    Ok(parser.add(scope, open.span.to(&close.span), Ast::Block { body }))
}

/// Checks whether a just-parsed statement continues the directive prologue
/// and applies `"use strict"` to the given scopes. Returns false once the
/// prologue is over.
fn apply_directive(
    parser: &mut Parser,
    stmt: NodeId,
    strict_scopes: &[ScopeId],
    params_simple: Option<bool>,
) -> PResult<bool> {
    let directive = match parser[stmt].ast() {
        Ast::SimpleStatement { expr } => match parser[*expr].ast() {
            Ast::Str { value } => {
                // A parenthesised string is an expression; a directive starts
                // with its own quote.
                match parser[*expr].span().bytes().first() {
                    Some(b'"') | Some(b'\'') => Some(value == "use strict"),
                    _ => None,
                }
            }
            _ => None,
        },
        _ => None,
    };
    match directive {
        None => Ok(false),
        Some(false) => Ok(true),
        Some(true) => {
            if params_simple == Some(false) {
                return Err(parser[stmt].error(ErrorKind::DirectiveNeedsSimpleParams));
            };
            for &scope in strict_scopes {
                parser[scope].set_strict();
            }
            Ok(true)
        }
    }
}

/// A `{ ... }` function body: fresh jump context and a directive prologue
/// that may flip the function strict.
pub fn parse_function_body(
    fn_scope: ScopeId,
    parser: &mut Parser,
    params: &[NodeId],
) -> PResult<NodeId> {
    let simple = params_are_simple(parser, params);
    let saved = parser.enter_function();
    let result = (|| {
        let open = parser.expect(Tok::BraceL)?;
        let inner = parser.open_scope(fn_scope, ScopeKind::Block);
        let mut body = Vec::new();
        let mut prologue = true;
        while !parser.at(Tok::BraceR)? {
            let stmt = parse_stmt(inner, parser)?;
            if prologue {
                prologue = apply_directive(parser, stmt, &[inner, fn_scope], Some(simple))?;
            };
            body.push(stmt);
        }
        let close = parser.expect(Tok::BraceR)?;
        Ok(parser.add(fn_scope, open.span.to(&close.span), Ast::Block { body }))
    })();
    parser.exit_function(saved);
    result
}

/// The directive handling for a whole source file.
pub fn apply_toplevel_directive(
    parser: &mut Parser,
    stmt: NodeId,
    scope: ScopeId,
) -> PResult<bool> {
    apply_directive(parser, stmt, &[scope], None)
}

fn parse_if(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let start = parser.expect(Tok::If)?;
    parser.expect(Tok::ParenL)?;
    let test = parse_expr(scope, parser)?;
    parser.expect(Tok::ParenR)?;
    let consequent = parse_stmt(scope, parser)?;
    let alternate = if parser.eat(Tok::Else)?.is_some() {
        Some(parse_stmt(scope, parser)?)
    } else {
        None
    };
    let end = alternate.unwrap_or(consequent);
    let span = start.span.to(parser[end].span());
    Ok(parser.add(scope, span, Ast::If {
        test,
        consequent,
        alternate,
    }))
}

fn parse_while(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let start = parser.expect(Tok::While)?;
    parser.expect(Tok::ParenL)?;
    let test = parse_expr(scope, parser)?;
    parser.expect(Tok::ParenR)?;
    parser.enter_loop();
    let body = parse_stmt(scope, parser);
    parser.exit_loop();
    let body = body?;
    let span = start.span.to(parser[body].span());
    Ok(parser.add(scope, span, Ast::While { test, body }))
}

fn parse_do(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let start = parser.expect(Tok::Do)?;
    parser.enter_loop();
    let body = parse_stmt(scope, parser);
    parser.exit_loop();
    let body = body?;
    parser.expect(Tok::While)?;
    parser.expect(Tok::ParenL)?;
    let test = parse_expr(scope, parser)?;
    let end = parser.expect(Tok::ParenR)?;
    parser.eat(Tok::Semi)?;
    Ok(parser.add(scope, start.span.to(&end.span), Ast::Do { body, test }))
}

/// The `for` family. The head is parsed leftmost-first with `in` excluded;
/// what follows decides the shape. A declaration head entering `in`/`of`
/// must be a single def without initializer; an expression head becomes an
/// assignment target, which admits plain names, destructuring shapes, and
/// member accesses like `for (obj.prop in arr)`.
fn parse_for(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let head_scope = parser.open_scope(scope, ScopeKind::Block);
    let start = parser.expect(Tok::For)?;
    parser.expect(Tok::ParenL)?;

    let init = if parser.at(Tok::Semi)? {
        None
    } else if matches!(parser.peek_tok()?, Tok::Var | Tok::Let | Tok::Const) {
        parser.no_in = true;
        let decl = parse_declaration(head_scope, parser, true);
        parser.no_in = false;
        Some(decl?)
    } else {
        parser.no_in = true;
        let expr = parse_expr(head_scope, parser);
        parser.no_in = false;
        Some(expr?)
    };

    let over = match parser.peek_tok()? {
        Tok::In => Some(false),
        Tok::Of => Some(true),
        _ => None,
    };
    if let (Some(of), Some(target)) = (over, init) {
        parser.bump()?;
        check_for_target(parser, target)?;
        let right = parse_expr(head_scope, parser)?;
        parser.expect(Tok::ParenR)?;
        parser.enter_loop();
        let body = parse_stmt(head_scope, parser);
        parser.exit_loop();
        let body = body?;
        let span = start.span.to(parser[body].span());
        let ast = if of {
            Ast::ForOf {
                target,
                iterable: right,
                body,
            }
        } else {
            Ast::ForIn {
                target,
                object: right,
                body,
            }
        };
        return Ok(parser.add(scope, span, ast));
    };

    parser.expect(Tok::Semi)?;
    let condition = if parser.at(Tok::Semi)? {
        None
    } else {
        Some(parse_expr(head_scope, parser)?)
    };
    parser.expect(Tok::Semi)?;
    let update = if parser.at(Tok::ParenR)? {
        None
    } else {
        Some(parse_expr(head_scope, parser)?)
    };
    parser.expect(Tok::ParenR)?;
    parser.enter_loop();
    let body = parse_stmt(head_scope, parser);
    parser.exit_loop();
    let body = body?;
    let span = start.span.to(parser[body].span());
    Ok(parser.add(scope, span, Ast::For {
        init,
        condition,
        update,
        body,
    }))
}

/// Validates the left side of `in`/`of`: a declaration must bind exactly one
/// def and carry no initializer; an expression must convert to an
/// assignment target.
fn check_for_target(parser: &mut Parser, target: NodeId) -> PResult<()> {
    match parser[target].ast() {
        Ast::Declaration { defs, .. } => {
            if defs.len() != 1 {
                return Err(parser[target].error(ErrorKind::ForHeadMultipleDefs));
            };
            match parser[defs[0]].ast() {
                Ast::VarDef { value: None, .. } => Ok(()),
                _ => Err(parser[target].error(ErrorKind::ForHeadBadTarget)),
            }
        }
        _ => to_assignable(parser, target, AssignOp::Assign)
            .map_err(|_| parser[target].error(ErrorKind::ForHeadBadTarget)),
    }
}

fn parse_switch(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let start = parser.expect(Tok::Switch)?;
    parser.expect(Tok::ParenL)?;
    let discriminant = parse_expr(scope, parser)?;
    parser.expect(Tok::ParenR)?;
    parser.expect(Tok::BraceL)?;
    parser.enter_switch();
    let result = (|| {
        let mut cases = Vec::new();
        let mut seen_default = false;
        while !parser.at(Tok::BraceR)? {
            let mut span = parser.peek()?.span.clone();
            let test = if parser.eat(Tok::Case)?.is_some() {
                let test = parse_expr(scope, parser)?;
                Some(test)
            } else {
                let clause = parser.expect(Tok::Default)?;
                if seen_default {
                    return Err(clause.error(ErrorKind::MultipleDefaultClauses));
                };
                seen_default = true;
                None
            };
            parser.expect(Tok::Colon)?;
            let mut body = Vec::new();
            while !matches!(parser.peek_tok()?, Tok::Case | Tok::Default | Tok::BraceR) {
                let stmt = parse_stmt(scope, parser)?;
                span.grow(parser[stmt].span());
                body.push(stmt);
            }
            cases.push(parser.add(scope, span, Ast::Case { test, body }));
        }
        Ok(cases)
    })();
    parser.exit_switch();
    let cases = result?;
    let end = parser.expect(Tok::BraceR)?;
    Ok(parser.add(scope, start.span.to(&end.span), Ast::Switch {
        discriminant,
        cases,
    }))
}

fn parse_try(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let start = parser.expect(Tok::Try)?;
    let mut span = start.span.clone();
    let block = parse_block(scope, parser)?;
    span.grow(parser[block].span());
    let catch = if parser.eat(Tok::Catch)?.is_some() {
        let catch_scope = parser.open_scope(scope, ScopeKind::Block);
        let param = if parser.eat(Tok::ParenL)?.is_some() {
            let param = parse_binding_target(catch_scope, parser, SymbolKind::Catch)?;
            parser.expect(Tok::ParenR)?;
            Some(param)
        } else {
            None
        };
        let body = parse_block(catch_scope, parser)?;
        span.grow(parser[body].span());
        let handler_span = parser[body].span().clone();
        Some(parser.add(scope, handler_span, Ast::Catch { param, body }))
    } else {
        None
    };
    let finally = if parser.eat(Tok::Finally)?.is_some() {
        let body = parse_block(scope, parser)?;
        span.grow(parser[body].span());
        Some(body)
    } else {
        None
    };
    if catch.is_none() && finally.is_none() {
        return Err(start.error(ErrorKind::TryWithoutHandler));
    };
    Ok(parser.add(scope, span, Ast::Try {
        block,
        catch,
        finally,
    }))
}

fn parse_throw(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let start = parser.expect(Tok::Throw)?;
    if parser.peek()?.newline_before {
        return Err(start.error(ErrorKind::NewlineAfterThrow));
    };
    let value = parse_expr(scope, parser)?;
    parser.insert_semicolon()?;
    let span = start.span.to(parser[value].span());
    Ok(parser.add(scope, span, Ast::Throw { value }))
}

fn parse_return(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let start = parser.expect(Tok::Return)?;
    if !parser.in_function() {
        return Err(start.error(ErrorKind::IllegalJump));
    };
    let value = if parser.can_insert_semicolon()? || parser.at(Tok::Semi)? {
        None
    } else {
        Some(parse_expr(scope, parser)?)
    };
    parser.insert_semicolon()?;
    let span = match value {
        Some(value) => start.span.to(parser[value].span()),
        None => start.span,
    };
    Ok(parser.add(scope, span, Ast::Return { value }))
}

fn parse_jump(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let start = parser.bump()?;
    let is_continue = start.tok == Tok::Continue;
    // A label must follow on the same line.
    let (newline, next_tok) = {
        let next = parser.peek()?;
        (next.newline_before, next.tok)
    };
    let label = if !newline && parser.rules.allows_name(next_tok) {
        Some(parser.bump()?.span)
    } else {
        None
    };
    parser.insert_semicolon()?;
    let span = match &label {
        Some(label) => start.span.to(label),
        None => start.span,
    };
    parser.check_jump(label.as_ref(), is_continue, &span)?;
    let ast = if is_continue {
        Ast::Continue { label }
    } else {
        Ast::Break { label }
    };
    Ok(parser.add(scope, span, ast))
}

fn parse_with(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let start = parser.expect(Tok::With)?;
    if parser[scope].is_strict() {
        return Err(start.error(ErrorKind::StrictWith));
    };
    parser.expect(Tok::ParenL)?;
    let object = parse_expr(scope, parser)?;
    parser.expect(Tok::ParenR)?;
    let with_scope = parser.open_scope(scope, ScopeKind::With);
    let body = parse_stmt(with_scope, parser)?;
    let span = start.span.to(parser[body].span());
    Ok(parser.add(scope, span, Ast::With { object, body }))
}

/// `name` or `name as alias` inside import/export braces. For imports the
/// local side binds a fresh name; for exports it references an existing
/// one.
fn parse_name_mapping(scope: ScopeId, parser: &mut Parser, importing: bool) -> PResult<NodeId> {
    let first = parser.expect_word()?;
    if importing {
        let local_span = if parser.eat(Tok::As)?.is_some() {
            parser.expect_name()?.span
        } else {
            first.span.clone()
        };
        let binding = parser.add(scope, local_span.clone(), Ast::Binding {
            name: local_span.clone(),
        });
        parser.declare(scope, local_span.clone(), binding, SymbolKind::Import)?;
        let span = first.span.to(&local_span);
        Ok(parser.add(scope, span, Ast::NameMapping {
            foreign: first.span,
            local: Some(binding),
        }))
    } else if parser.eat(Tok::As)?.is_some() {
        let exported = parser.expect_word()?;
        let local = parser.add(scope, first.span.clone(), Ast::Symbol {
            name: first.span.clone(),
        });
        let span = first.span.to(&exported.span);
        Ok(parser.add(scope, span, Ast::NameMapping {
            foreign: exported.span,
            local: Some(local),
        }))
    } else {
        let span = first.span.clone();
        Ok(parser.add(scope, span, Ast::NameMapping {
            foreign: first.span,
            local: None,
        }))
    }
}

fn parse_import(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let mark = parser.mark();
    let start = parser.expect(Tok::Import)?;
    if parser.at(Tok::ParenL)? {
        // `import(...)` is an expression.
        parser.rewind(mark);
        return parse_expr_stmt(scope, parser);
    };
    let mut mappings = Vec::new();
    let peeked = parser.peek_tok()?;
    let default = if parser.rules.allows_name(peeked) {
        let token = parser.bump()?;
        let binding = parser.add(scope, token.span.clone(), Ast::Binding {
            name: token.span.clone(),
        });
        parser.declare(scope, token.span, binding, SymbolKind::Import)?;
        parser.eat(Tok::Comma)?;
        Some(binding)
    } else {
        None
    };
    if let Some(star) = parser.eat(Tok::Star)? {
        parser.expect(Tok::As)?;
        let alias = parser.expect_name()?;
        let binding = parser.add(scope, alias.span.clone(), Ast::Binding {
            name: alias.span.clone(),
        });
        parser.declare(scope, alias.span.clone(), binding, SymbolKind::Import)?;
        let span = star.span.to(&alias.span);
        mappings.push(parser.add(scope, span, Ast::NameMapping {
            foreign: star.span,
            local: Some(binding),
        }));
    } else if parser.eat(Tok::BraceL)?.is_some() {
        while !parser.at(Tok::BraceR)? {
            mappings.push(parse_name_mapping(scope, parser, true)?);
            if parser.eat(Tok::Comma)?.is_none() {
                break;
            };
        }
        parser.expect(Tok::BraceR)?;
    };
    parser.expect(Tok::From)?;
    let source = expect_string_value(parser)?;
    parser.insert_semicolon()?;
    Ok(parser.add(scope, start.span, Ast::Import {
        source,
        default,
        mappings,
    }))
}

fn parse_export(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let start = parser.expect(Tok::Export)?;
    if let Some(star) = parser.eat(Tok::Star)? {
        // `export * from` and `export * as ns from`.
        let local = if parser.eat(Tok::As)?.is_some() {
            let alias = parser.expect_word()?;
            Some(parser.add(scope, alias.span.clone(), Ast::Binding { name: alias.span }))
        } else {
            None
        };
        let span = star.span.clone();
        let mapping = parser.add(scope, span, Ast::NameMapping {
            foreign: star.span,
            local,
        });
        parser.expect(Tok::From)?;
        let source = expect_string_value(parser)?;
        parser.insert_semicolon()?;
        return Ok(parser.add(scope, start.span, Ast::Export {
            source: Some(source),
            decl: None,
            mappings: vec![mapping],
            is_default: false,
        }));
    };
    if parser.eat(Tok::BraceL)?.is_some() {
        let mut mappings = Vec::new();
        while !parser.at(Tok::BraceR)? {
            mappings.push(parse_name_mapping(scope, parser, false)?);
            if parser.eat(Tok::Comma)?.is_none() {
                break;
            };
        }
        parser.expect(Tok::BraceR)?;
        let source = if parser.eat(Tok::From)?.is_some() {
            Some(expect_string_value(parser)?)
        } else {
            None
        };
        parser.insert_semicolon()?;
        return Ok(parser.add(scope, start.span, Ast::Export {
            source,
            decl: None,
            mappings,
            is_default: false,
        }));
    };
    if parser.eat(Tok::Default)?.is_some() {
        let decl = match parser.peek_tok()? {
            Tok::Function | Tok::Class | Tok::Async => parse_stmt(scope, parser)?,
            _ => {
                let expr = parse_assign(scope, parser)?;
                parser.insert_semicolon()?;
                expr
            }
        };
        let span = start.span.to(parser[decl].span());
        return Ok(parser.add(scope, span, Ast::Export {
            source: None,
            decl: Some(decl),
            mappings: Vec::new(),
            is_default: true,
        }));
    };
    let decl = parse_stmt(scope, parser)?;
    let span = start.span.to(parser[decl].span());
    Ok(parser.add(scope, span, Ast::Export {
        source: None,
        decl: Some(decl),
        mappings: Vec::new(),
        is_default: false,
    }))
}
