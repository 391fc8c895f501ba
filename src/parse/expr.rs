use crate::ast::{Ast, NodeId, TemplatePart};
use crate::error::{ErrorKind, PResult};
use crate::lex::lex_template_piece;
use crate::operator::{AssignOp, BinaryOp, PostfixOp, UnaryOp};
use crate::parse::literal::{expect_string_value, number_value, string_value};
use crate::parse::members::parse_object_literal;
use crate::parse::parser::Parser;
use crate::parse::stmt::parse_function_body;
use crate::parse::target::parse_params;
use crate::source::Span;
use crate::symbol::{ScopeId, ScopeKind, SymbolKind};
use crate::token::Tok;

// The expression grammar is parsed in layers: sequence over assignment over
// conditional over a precedence-climbing binary loop over unary over
// postfix over access chains over primaries. Each layer stops as soon as the
// next token is not its own, so expressions need no terminator bookkeeping.

fn assign_op_of(tok: Tok) -> Option<AssignOp> {
    Some(match tok {
        Tok::Eq => AssignOp::Assign,
        Tok::PlusEq => AssignOp::Add,
        Tok::MinusEq => AssignOp::Sub,
        Tok::StarEq => AssignOp::Mul,
        Tok::SlashEq => AssignOp::Div,
        Tok::PercentEq => AssignOp::Rem,
        Tok::StarstarEq => AssignOp::Exp,
        Tok::ShlEq => AssignOp::Shl,
        Tok::ShrEq => AssignOp::Shr,
        Tok::ShrZeroEq => AssignOp::ShrZero,
        Tok::AmpEq => AssignOp::BitAnd,
        Tok::PipeEq => AssignOp::BitOr,
        Tok::CaretEq => AssignOp::BitXor,
        Tok::AmpAmpEq => AssignOp::And,
        Tok::PipePipeEq => AssignOp::Or,
        Tok::CoalesceEq => AssignOp::Coalesce,
        _ => return None,
    })
}

fn binary_op_of(tok: Tok) -> Option<BinaryOp> {
    Some(match tok {
        Tok::Plus => BinaryOp::Add,
        Tok::Minus => BinaryOp::Sub,
        Tok::Star => BinaryOp::Mul,
        Tok::Slash => BinaryOp::Div,
        Tok::Percent => BinaryOp::Rem,
        Tok::Starstar => BinaryOp::Exp,
        Tok::Shl => BinaryOp::Shl,
        Tok::Shr => BinaryOp::Shr,
        Tok::ShrZero => BinaryOp::ShrZero,
        Tok::Amp => BinaryOp::BitAnd,
        Tok::Pipe => BinaryOp::BitOr,
        Tok::Caret => BinaryOp::BitXor,
        Tok::Lt => BinaryOp::Lt,
        Tok::LtEq => BinaryOp::LtEq,
        Tok::Gt => BinaryOp::Gt,
        Tok::GtEq => BinaryOp::GtEq,
        Tok::EqEq => BinaryOp::Eq,
        Tok::BangEq => BinaryOp::NotEq,
        Tok::EqEqEq => BinaryOp::StrictEq,
        Tok::BangEqEq => BinaryOp::StrictNotEq,
        Tok::AmpAmp => BinaryOp::And,
        Tok::PipePipe => BinaryOp::Or,
        Tok::Coalesce => BinaryOp::Coalesce,
        Tok::In => BinaryOp::In,
        Tok::Instanceof => BinaryOp::Instanceof,
        _ => return None,
    })
}

fn prefix_op_of(tok: Tok) -> Option<UnaryOp> {
    Some(match tok {
        Tok::Bang => UnaryOp::Not,
        Tok::Tilde => UnaryOp::BitNot,
        Tok::Plus => UnaryOp::Plus,
        Tok::Minus => UnaryOp::Neg,
        Tok::Inc => UnaryOp::Inc,
        Tok::Dec => UnaryOp::Dec,
        Tok::Typeof => UnaryOp::Typeof,
        Tok::Void => UnaryOp::Void,
        Tok::Delete => UnaryOp::Delete,
        _ => return None,
    })
}

/// Marks an expression as having been written in parentheses; the emitter
/// keeps them, which is what protects statement-position function
/// expressions and object literals from reparsing as declarations.
fn mark_grouped(parser: &mut Parser, node: NodeId) -> () {
    match parser[node].ast_mut() {
        Ast::Binary { grouped, .. }
        | Ast::Assign { grouped, .. }
        | Ast::Conditional { grouped, .. }
        | Ast::Sequence { grouped, .. }
        | Ast::Call { grouped, .. }
        | Ast::Dot { grouped, .. }
        | Ast::UnaryPrefix { grouped, .. }
        | Ast::UnaryPostfix { grouped, .. }
        | Ast::Function { grouped, .. }
        | Ast::Class { grouped, .. } => *grouped = true,
        _ => {}
    };
}

/// Full expression including the comma operator.
pub fn parse_expr(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let first = parse_assign(scope, parser)?;
    if !parser.at(Tok::Comma)? {
        return Ok(first);
    };
    let mut exprs = vec![first];
    while parser.eat(Tok::Comma)?.is_some() {
        exprs.push(parse_assign(scope, parser)?);
    }
    let span = parser[exprs[0]]
        .span()
        .to(parser[*exprs.last().unwrap()].span());
    Ok(parser.add(scope, span, Ast::Sequence {
        exprs,
        grouped: false,
    }))
}

/// Assignment level; also the layer where arrow functions are recognised,
/// by trying a parameter list and backtracking when no `=>` follows.
pub fn parse_assign(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    match parser.peek_tok()? {
        Tok::ParenL => {
            let mark = parser.mark();
            match parse_arrow_tail(scope, parser, false) {
                Ok(arrow) => return Ok(arrow),
                Err(error) if error.kind() == ErrorKind::NewlineAfterArrowParams => {
                    return Err(error)
                }
                Err(_) => parser.rewind(mark),
            };
        }
        Tok::Async => {
            let mark = parser.mark();
            parser.bump()?;
            let next = parser.peek()?;
            let newline = next.newline_before;
            let next_tok = next.tok;
            if !newline && next_tok == Tok::ParenL {
                match parse_arrow_tail(scope, parser, true) {
                    Ok(arrow) => return Ok(arrow),
                    Err(error) if error.kind() == ErrorKind::NewlineAfterArrowParams => {
                        return Err(error)
                    }
                    Err(_) => parser.rewind(mark),
                };
            } else if !newline && parser.rules.allows_name(next_tok) {
                // `async x => ...`; anything else backtracks to `async` as a
                // plain name.
                let param = parser.bump()?;
                if parser.at(Tok::Arrow)? {
                    return parse_single_param_arrow(scope, parser, true, param.span);
                };
                parser.rewind(mark);
            } else {
                parser.rewind(mark);
            };
        }
        tok if parser.rules.allows_name(tok) => {
            let mark = parser.mark();
            let param = parser.bump()?;
            if parser.at(Tok::Arrow)? && !parser.peek()?.newline_before {
                return parse_single_param_arrow(scope, parser, false, param.span);
            };
            parser.rewind(mark);
        }
        _ => {}
    };

    let left = parse_conditional(scope, parser)?;
    let op = match assign_op_of(parser.peek_tok()?) {
        Some(op) => op,
        None => return Ok(left),
    };
    parser.bump()?;
    to_assignable(parser, left, op)?;
    let value = parse_assign(scope, parser)?;
    let span = parser[left].span().to(parser[value].span());
    Ok(parser.add(scope, span, Ast::Assign {
        op,
        target: left,
        value,
        grouped: false,
    }))
}

fn parse_conditional(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let test = parse_binary(scope, parser, 0)?;
    if parser.eat(Tok::Question)?.is_none() {
        return Ok(test);
    };
    let consequent = parse_assign(scope, parser)?;
    parser.expect(Tok::Colon)?;
    let alternate = parse_assign(scope, parser)?;
    let span = parser[test].span().to(parser[alternate].span());
    Ok(parser.add(scope, span, Ast::Conditional {
        test,
        consequent,
        alternate,
        grouped: false,
    }))
}

/// Precedence climbing over the binary operators.
fn parse_binary(scope: ScopeId, parser: &mut Parser, min: u8) -> PResult<NodeId> {
    let mut left = parse_unary(scope, parser)?;
    loop {
        let op = match binary_op_of(parser.peek_tok()?) {
            Some(op) => op,
            None => break,
        };
        if op == BinaryOp::In && parser.no_in {
            break;
        };
        let prec = op.precedence();
        if prec < min {
            break;
        };
        parser.bump()?;
        let next_min = if op.right_associative() { prec } else { prec + 1 };
        let right = parse_binary(scope, parser, next_min)?;
        let span = parser[left].span().to(parser[right].span());
        left = parser.add(scope, span, Ast::Binary {
            op,
            left,
            right,
            grouped: false,
        });
    }
    Ok(left)
}

fn parse_unary(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let token = parser.peek()?;
    let tok = token.tok;
    if let Some(op) = prefix_op_of(tok) {
        let start = parser.bump()?;
        let operand = parse_unary(scope, parser)?;
        let span = start.span.to(parser[operand].span());
        return Ok(parser.add(scope, span, Ast::UnaryPrefix {
            op,
            operand,
            grouped: false,
        }));
    };
    if tok == Tok::Await && !parser.rules.await_is_name {
        let start = parser.bump()?;
        let operand = parse_unary(scope, parser)?;
        let span = start.span.to(parser[operand].span());
        return Ok(parser.add(scope, span, Ast::Await { operand }));
    };
    if tok == Tok::Yield && !parser.rules.yield_is_name {
        let start = parser.bump()?;
        let delegated = parser.eat(Tok::Star)?.is_some();
        // A yield with nothing after it on the line produces undefined.
        let next = parser.peek()?;
        let ends = next.newline_before
            || matches!(
                next.tok,
                Tok::Semi
                    | Tok::ParenR
                    | Tok::BracketR
                    | Tok::BraceR
                    | Tok::Comma
                    | Tok::Colon
                    | Tok::Eof
            );
        let operand = if ends && !delegated {
            None
        } else {
            Some(parse_assign(scope, parser)?)
        };
        let span = match operand {
            Some(operand) => start.span.to(parser[operand].span()),
            None => start.span,
        };
        return Ok(parser.add(scope, span, Ast::Yield { operand, delegated }));
    };
    parse_postfix(scope, parser)
}

fn parse_postfix(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let operand = parse_access(scope, parser)?;
    let token = parser.peek()?;
    // No line break may separate an operand from its suffix.
    let op = match token.tok {
        Tok::Inc if !token.newline_before => PostfixOp::Inc,
        Tok::Dec if !token.newline_before => PostfixOp::Dec,
        _ => return Ok(operand),
    };
    let end = parser.bump()?;
    let span = parser[operand].span().to(&end.span);
    to_assignable(parser, operand, AssignOp::Add)?;
    Ok(parser.add(scope, span, Ast::UnaryPostfix {
        op,
        operand,
        grouped: false,
    }))
}

/// A class heritage clause is an access-level expression.
pub fn parse_access_like_parent(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    parse_access(scope, parser)
}

/// Member access, computed access, and call chains.
fn parse_access(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let mut object = parse_primary(scope, parser)?;
    loop {
        object = match parser.peek_tok()? {
            Tok::Dot | Tok::QuestionDot => {
                let optional = parser.bump()?.tok == Tok::QuestionDot;
                let property = parser.expect_word()?;
                let span = parser[object].span().to(&property.span);
                parser.add(scope, span, Ast::Dot {
                    object,
                    property: property.span,
                    optional,
                    grouped: false,
                })
            }
            Tok::BracketL | Tok::QuestionDotBracketL => {
                let optional = parser.bump()?.tok == Tok::QuestionDotBracketL;
                let index = parse_expr(scope, parser)?;
                let end = parser.expect(Tok::BracketR)?;
                let span = parser[object].span().to(&end.span);
                parser.add(scope, span, Ast::Sub {
                    object,
                    index,
                    optional,
                })
            }
            Tok::ParenL | Tok::QuestionDotParenL => {
                let optional = parser.bump()?.tok == Tok::QuestionDotParenL;
                let (args, end) = parse_args(scope, parser)?;
                let span = parser[object].span().to(&end);
                parser.add(scope, span, Ast::Call {
                    callee: object,
                    args,
                    optional,
                    grouped: false,
                })
            }
            _ => return Ok(object),
        };
    }
}

/// Argument list after the `(` has been consumed; returns the args and the
/// closing paren's span.
fn parse_args(scope: ScopeId, parser: &mut Parser) -> PResult<(Vec<NodeId>, Span)> {
    let mut args = Vec::new();
    loop {
        if parser.at(Tok::ParenR)? {
            break;
        };
        if let Some(dots) = parser.eat(Tok::Ellipsis)? {
            let operand = parse_assign(scope, parser)?;
            let span = dots.span.to(parser[operand].span());
            args.push(parser.add(scope, span, Ast::Spread { operand }));
        } else {
            args.push(parse_assign(scope, parser)?);
        };
        if parser.eat(Tok::Comma)?.is_none() {
            break;
        };
    }
    let end = parser.expect(Tok::ParenR)?;
    Ok((args, end.span))
}

fn parse_array_literal(scope: ScopeId, parser: &mut Parser, open: Span) -> PResult<NodeId> {
    let mut elements: Vec<Option<NodeId>> = Vec::new();
    loop {
        if parser.eat(Tok::Comma)?.is_some() {
            elements.push(None);
            continue;
        };
        if parser.at(Tok::BracketR)? {
            break;
        };
        let element = if let Some(dots) = parser.eat(Tok::Ellipsis)? {
            let operand = parse_assign(scope, parser)?;
            let span = dots.span.to(parser[operand].span());
            parser.add(scope, span, Ast::Spread { operand })
        } else {
            parse_assign(scope, parser)?
        };
        elements.push(Some(element));
        if !parser.at(Tok::BracketR)? {
            parser.expect(Tok::Comma)?;
        };
    }
    let close = parser.expect(Tok::BracketR)?;
    Ok(parser.add(scope, open.to(&close.span), Ast::Array { elements }))
}

fn parse_template(scope: ScopeId, parser: &mut Parser, head: Span) -> PResult<NodeId> {
    let mut span = head.clone();
    let mut parts = vec![TemplatePart::Chunk(head)];
    loop {
        let expr = parse_expr(scope, parser)?;
        parts.push(TemplatePart::Expr(expr));
        parser.expect(Tok::BraceR)?;
        let piece = lex_template_piece(parser.lexer_for_template(), false)?;
        span.grow(&piece.span);
        let done = piece.tok == Tok::TemplateEnd;
        parts.push(TemplatePart::Chunk(piece.span));
        if done {
            break;
        };
    }
    Ok(parser.add(scope, span, Ast::TemplateString { parts }))
}

/// Tries `(params) => body` from the current position; the caller rewinds on
/// failure, except for a line break before `=>`, which is a hard error.
fn parse_arrow_tail(scope: ScopeId, parser: &mut Parser, is_async: bool) -> PResult<NodeId> {
    let fn_scope = parser.open_scope(scope, ScopeKind::Closure);
    let saved_rules = parser.rules;
    if is_async {
        parser.rules.await_is_name = false;
    };
    let result = (|| {
        let params = parse_params(fn_scope, parser)?;
        let arrow = parser.peek()?;
        if arrow.tok == Tok::Arrow && arrow.newline_before {
            return Err(arrow.error(ErrorKind::NewlineAfterArrowParams));
        };
        parser.expect(Tok::Arrow)?;
        let body = if parser.at(Tok::BraceL)? {
            parse_function_body(fn_scope, parser, &params)?
        } else {
            parse_assign(fn_scope, parser)?
        };
        let span = match params.first() {
            Some(&first) => parser[first].span().to(parser[body].span()),
            None => parser[body].span().clone(),
        };
        Ok(parser.add(scope, span, Ast::Arrow {
            is_async,
            params,
            body,
        }))
    })();
    parser.rules = saved_rules;
    result
}

fn parse_single_param_arrow(
    scope: ScopeId,
    parser: &mut Parser,
    is_async: bool,
    name: Span,
) -> PResult<NodeId> {
    let fn_scope = parser.open_scope(scope, ScopeKind::Closure);
    let binding = parser.add(fn_scope, name.clone(), Ast::Binding { name: name.clone() });
    parser.declare(fn_scope, name.clone(), binding, SymbolKind::Funarg)?;
    let params = vec![parser.add(fn_scope, name.clone(), Ast::Param {
        rest: false,
        target: binding,
    })];
    parser.expect(Tok::Arrow)?;
    let saved_rules = parser.rules;
    if is_async {
        parser.rules.await_is_name = false;
    };
    let body = if parser.at(Tok::BraceL)? {
        parse_function_body(fn_scope, parser, &params)
    } else {
        parse_assign(fn_scope, parser)
    };
    parser.rules = saved_rules;
    let body = body?;
    let span = name.to(parser[body].span());
    Ok(parser.add(scope, span, Ast::Arrow {
        is_async,
        params,
        body,
    }))
}

fn parse_primary(scope: ScopeId, parser: &mut Parser) -> PResult<NodeId> {
    let mark = parser.mark();
    let token = parser.bump_operand()?;
    let span = token.span.clone();
    Ok(match token.tok {
        Tok::Num => {
            let value = number_value(&span)?;
            parser.add(scope, span, Ast::Number { value })
        }
        Tok::Str => {
            let value = string_value(&span);
            parser.add(scope, span, Ast::Str { value })
        }
        Tok::Regexp => parser.add(scope, span, Ast::Regex {}),
        Tok::True => parser.add(scope, span, Ast::Bool { value: true }),
        Tok::False => parser.add(scope, span, Ast::Bool { value: false }),
        Tok::Null => parser.add(scope, span, Ast::Null {}),
        Tok::Undefined => parser.add(scope, span, Ast::Undefined {}),
        Tok::This => parser.add(scope, span, Ast::This {}),
        Tok::Super => parser.add(scope, span, Ast::Super {}),
        Tok::TemplateEnd => {
            let parts = vec![TemplatePart::Chunk(span.clone())];
            parser.add(scope, span, Ast::TemplateString { parts })
        }
        Tok::TemplateChunk => parse_template(scope, parser, span)?,
        Tok::BracketL => parse_array_literal(scope, parser, span)?,
        Tok::BraceL => {
            parser.rewind(mark);
            parse_object_literal(scope, parser)?
        }
        Tok::ParenL => {
            let inner = parse_expr(scope, parser)?;
            parser.expect(Tok::ParenR)?;
            mark_grouped(parser, inner);
            inner
        }
        Tok::Function => {
            parser.rewind(mark);
            super::decl::parse_function(scope, parser, false)?
        }
        Tok::Async if parser.at(Tok::Function)? && !parser.peek()?.newline_before => {
            parser.rewind(mark);
            super::decl::parse_function(scope, parser, false)?
        }
        Tok::Class => {
            parser.rewind(mark);
            super::decl::parse_class(scope, parser, false)?
        }
        Tok::New => {
            let chain = parse_access(scope, parser)?;
            let span = span.to(parser[chain].span());
            // `new x.y(args)` arrives as a call; fold its arguments into the
            // construction.
            match parser.nodes()[chain].ast() {
                Ast::Call {
                    callee,
                    optional: false,
                    grouped: false,
                    ..
                } => {
                    let callee = *callee;
                    let args = match parser[chain].replace_ast(Ast::EmptyStatement {}) {
                        Ast::Call { args, .. } => args,
                        _ => unreachable!(),
                    };
                    parser.add(scope, span, Ast::New { callee, args })
                }
                _ => parser.add(scope, span, Ast::New {
                    callee: chain,
                    args: Vec::new(),
                }),
            }
        }
        Tok::Import => {
            parser.expect(Tok::ParenL)?;
            let module = expect_string_value(parser)?;
            let end = parser.expect(Tok::ParenR)?;
            parser.add(scope, span.to(&end.span), Ast::ImportExpression { module })
        }
        tok if parser.rules.allows_name(tok) => parser.add(scope, span.clone(), Ast::Symbol {
            name: span,
        }),
        _ => return Err(token.error(ErrorKind::Expected("expression"))),
    })
}

/// Reinterprets an expression as an assignment target, in place. Plain
/// names, member accesses, and (for `=` only) array and object literals
/// qualify; the literals convert to their target forms node by node.
pub fn to_assignable(parser: &mut Parser, node: NodeId, op: AssignOp) -> PResult<()> {
    enum Shape {
        Fine,
        StrictName,
        Literal,
        Bad,
    }
    let shape = match parser[node].ast() {
        Ast::Symbol { name } => {
            if (name == "eval" || name == "arguments")
                && parser[parser[node].scope()].is_strict()
            {
                Shape::StrictName
            } else {
                Shape::Fine
            }
        }
        Ast::Dot {
            optional: false, ..
        }
        | Ast::Sub {
            optional: false, ..
        } => Shape::Fine,
        // Already in target form, e.g. re-assigned through parentheses.
        Ast::Binding { .. }
        | Ast::ArrayTarget { .. }
        | Ast::ObjectTarget { .. }
        | Ast::WithDefault { .. } => Shape::Fine,
        Ast::Array { .. } | Ast::Object { .. } => Shape::Literal,
        _ => Shape::Bad,
    };
    match shape {
        Shape::Fine => Ok(()),
        Shape::StrictName => Err(parser[node].error(ErrorKind::StrictAssignToRestricted)),
        Shape::Bad => Err(parser[node].error(ErrorKind::BadAssignTarget)),
        Shape::Literal if op.reads_target() => {
            Err(parser[node].error(ErrorKind::BadAssignTarget))
        }
        Shape::Literal => convert_literal_to_target(parser, node),
    }
}

/// `target = value` parsed as an assignment becomes a defaulted target.
fn unwrap_default(parser: &mut Parser, node: NodeId) -> PResult<()> {
    let is_plain_assign = matches!(
        parser[node].ast(),
        Ast::Assign {
            op: AssignOp::Assign,
            grouped: false,
            ..
        }
    );
    if is_plain_assign {
        let (target, value) = match parser[node].replace_ast(Ast::EmptyStatement {}) {
            Ast::Assign { target, value, .. } => (target, value),
            _ => unreachable!(),
        };
        to_assignable(parser, target, AssignOp::Assign)?;
        *parser[node].ast_mut() = Ast::WithDefault { target, value };
        return Ok(());
    };
    to_assignable(parser, node, AssignOp::Assign)
}

fn convert_literal_to_target(parser: &mut Parser, node: NodeId) -> PResult<()> {
    match parser[node].replace_ast(Ast::EmptyStatement {}) {
        Ast::Array { elements } => {
            let mut items: Vec<Option<NodeId>> = Vec::new();
            let mut rest = None;
            let count = elements.len();
            for (slot, element) in elements.into_iter().enumerate() {
                let element = match element {
                    Some(element) => element,
                    None => {
                        items.push(None);
                        continue;
                    }
                };
                if let Ast::Spread { operand } = parser[element].ast() {
                    let operand = *operand;
                    if slot + 1 != count {
                        return Err(parser[element].error(ErrorKind::RestMustBeLast));
                    };
                    to_assignable(parser, operand, AssignOp::Assign)?;
                    rest = Some(operand);
                    continue;
                };
                unwrap_default(parser, element)?;
                items.push(Some(element));
            }
            *parser[node].ast_mut() = Ast::ArrayTarget { items, rest };
            Ok(())
        }
        Ast::Object { props } => {
            let mut converted: Vec<NodeId> = Vec::new();
            let mut rest = None;
            let count = props.len();
            for (slot, prop) in props.into_iter().enumerate() {
                match parser[prop].ast() {
                    Ast::Spread { operand } => {
                        let operand = *operand;
                        if slot + 1 != count {
                            return Err(parser[prop].error(ErrorKind::RestMustBeLast));
                        };
                        to_assignable(parser, operand, AssignOp::Assign)?;
                        rest = Some(operand);
                    }
                    Ast::Property { .. } => {
                        let (key, value) = match parser[prop].replace_ast(Ast::EmptyStatement {})
                        {
                            Ast::Property { key, value } => (key, value),
                            _ => unreachable!(),
                        };
                        let target = match value {
                            None => None,
                            Some(value) => {
                                unwrap_default(parser, value)?;
                                Some(value)
                            }
                        };
                        *parser[prop].ast_mut() = Ast::TargetProp { key, target };
                        converted.push(prop);
                    }
                    _ => return Err(parser[prop].error(ErrorKind::BadAssignTarget)),
                };
            }
            *parser[node].ast_mut() = Ast::ObjectTarget {
                props: converted,
                rest,
            };
            Ok(())
        }
        _ => unreachable!(),
    }
}
