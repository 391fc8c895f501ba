use std::io::{self, Write};

use crate::ast::{Ast, MethodKind, NodeId, NodeMap, PropKey, TemplatePart};
use crate::coerce::number_to_string;
use crate::operator::{
    UnaryOp, PREC_ACCESS, PREC_ASSIGN, PREC_COALESCE, PREC_CONDITIONAL, PREC_POSTFIX,
    PREC_PRIMARY, PREC_SEQUENCE, PREC_UNARY,
};

#[cfg(test)]
mod tests;

/// How tightly an expression binds; an expression emitted into a context
/// requiring more gets wrapped in parentheses.
fn precedence_of(map: &NodeMap, node: NodeId) -> u8 {
    match map[node].ast() {
        Ast::Sequence { .. } => PREC_SEQUENCE,
        Ast::Assign { .. } | Ast::Arrow { .. } | Ast::Yield { .. } => PREC_ASSIGN,
        Ast::Conditional { .. } => PREC_CONDITIONAL,
        Ast::Binary { op, .. } => op.precedence(),
        Ast::UnaryPrefix { .. } | Ast::Await { .. } => PREC_UNARY,
        Ast::UnaryPostfix { .. } => PREC_POSTFIX,
        Ast::Call { .. } | Ast::New { .. } | Ast::Dot { .. } | Ast::Sub { .. } => PREC_ACCESS,
        _ => PREC_PRIMARY,
    }
}

fn is_grouped(map: &NodeMap, node: NodeId) -> bool {
    match map[node].ast() {
        Ast::Binary { grouped, .. }
        | Ast::Assign { grouped, .. }
        | Ast::Conditional { grouped, .. }
        | Ast::Sequence { grouped, .. }
        | Ast::Call { grouped, .. }
        | Ast::Dot { grouped, .. }
        | Ast::UnaryPrefix { grouped, .. }
        | Ast::UnaryPostfix { grouped, .. }
        | Ast::Function { grouped, .. }
        | Ast::Class { grouped, .. } => *grouped,
        _ => false,
    }
}

fn write_quoted<T: Write>(out: &mut T, value: &str) -> io::Result<()> {
    out.write_all(b"\"")?;
    for b in value.bytes() {
        match b {
            b'"' => out.write_all(b"\\\"")?,
            b'\\' => out.write_all(b"\\\\")?,
            b'\n' => out.write_all(b"\\n")?,
            b'\r' => out.write_all(b"\\r")?,
            b'\t' => out.write_all(b"\\t")?,
            b'\0' => out.write_all(b"\\0")?,
            b => out.write_all(&[b])?,
        };
    }
    out.write_all(b"\"")
}

/// Whether a `+`/`-` written before this expression needs a space to avoid
/// fusing into `++`/`--`.
fn starts_with_sign(map: &NodeMap, node: NodeId, positive: bool) -> bool {
    match map[node].ast() {
        Ast::UnaryPrefix { op, grouped: false, .. } => match op {
            UnaryOp::Plus | UnaryOp::Inc => positive,
            UnaryOp::Neg | UnaryOp::Dec => !positive,
            _ => false,
        },
        _ => false,
    }
}

pub fn emit_js<T: Write>(out: &mut T, map: &NodeMap, node: NodeId) -> io::Result<()> {
    match map[node].ast() {
        Ast::Toplevel { body } => emit_stmts(out, map, body),
        _ => emit_stmt(out, map, node),
    }
}

/// Statements that end in their own `}` need no trailing semicolon; the
/// check follows trailing statement positions down.
fn needs_semi(map: &NodeMap, node: NodeId) -> bool {
    match map[node].ast() {
        Ast::Block { .. }
        | Ast::Function { .. }
        | Ast::Class { .. }
        | Ast::Switch { .. }
        | Ast::Try { .. }
        | Ast::EmptyStatement {} => false,
        Ast::If {
            consequent,
            alternate,
            ..
        } => needs_semi(map, alternate.unwrap_or(*consequent)),
        Ast::While { body, .. }
        | Ast::For { body, .. }
        | Ast::ForIn { body, .. }
        | Ast::ForOf { body, .. }
        | Ast::With { body, .. }
        | Ast::Labeled { body, .. } => needs_semi(map, *body),
        // `export function f(){}` ends in its own brace; `export default 1`
        // does not.
        Ast::Export {
            decl: Some(decl), ..
        } => needs_semi(map, *decl),
        _ => true,
    }
}

/// Emits a statement list, separating with semicolons where statements do
/// not already end themselves. Empty statements vanish here.
pub fn emit_stmts<T: Write>(out: &mut T, map: &NodeMap, stmts: &[NodeId]) -> io::Result<()> {
    for &stmt in stmts {
        if matches!(map[stmt].ast(), Ast::EmptyStatement {}) {
            continue;
        };
        emit_stmt(out, map, stmt)?;
        if needs_semi(map, stmt) {
            out.write_all(b";")?;
        };
    }
    Ok(())
}

fn emit_stmt<T: Write>(out: &mut T, map: &NodeMap, node: NodeId) -> io::Result<()> {
    match map[node].ast() {
        Ast::EmptyStatement {} => out.write_all(b";"),
        Ast::Block { body } => {
            out.write_all(b"{")?;
            emit_stmts(out, map, body)?;
            out.write_all(b"}")
        }
        Ast::SimpleStatement { expr } => emit_expr(out, map, *expr, PREC_SEQUENCE),
        Ast::Declaration { kind, defs } => {
            out.write_all(kind.text().as_bytes())?;
            out.write_all(b" ")?;
            for (i, &def) in defs.iter().enumerate() {
                if i > 0 {
                    out.write_all(b",")?;
                };
                emit_stmt(out, map, def)?;
            }
            Ok(())
        }
        Ast::VarDef { name, value } => {
            emit_expr(out, map, *name, PREC_PRIMARY)?;
            if let Some(value) = value {
                out.write_all(b"=")?;
                emit_expr(out, map, *value, PREC_ASSIGN)?;
            };
            Ok(())
        }
        Ast::If {
            test,
            consequent,
            alternate,
        } => {
            out.write_all(b"if(")?;
            emit_expr(out, map, *test, PREC_SEQUENCE)?;
            out.write_all(b")")?;
            emit_stmt(out, map, *consequent)?;
            if let Some(alternate) = alternate {
                if needs_semi(map, *consequent) {
                    out.write_all(b";")?;
                };
                out.write_all(b"else")?;
                if !matches!(map[*alternate].ast(), Ast::Block { .. }) {
                    out.write_all(b" ")?;
                };
                emit_stmt(out, map, *alternate)?;
            };
            Ok(())
        }
        Ast::While { test, body } => {
            out.write_all(b"while(")?;
            emit_expr(out, map, *test, PREC_SEQUENCE)?;
            out.write_all(b")")?;
            emit_stmt(out, map, *body)
        }
        Ast::Do { body, test } => {
            out.write_all(b"do")?;
            if !matches!(map[*body].ast(), Ast::Block { .. }) {
                out.write_all(b" ")?;
            };
            emit_stmt(out, map, *body)?;
            if needs_semi(map, *body) {
                out.write_all(b";")?;
            };
            out.write_all(b"while(")?;
            emit_expr(out, map, *test, PREC_SEQUENCE)?;
            out.write_all(b")")
        }
        Ast::For {
            init,
            condition,
            update,
            body,
        } => {
            out.write_all(b"for(")?;
            if let Some(init) = init {
                emit_stmt(out, map, *init)?;
            };
            out.write_all(b";")?;
            if let Some(condition) = condition {
                emit_expr(out, map, *condition, PREC_SEQUENCE)?;
            };
            out.write_all(b";")?;
            if let Some(update) = update {
                emit_expr(out, map, *update, PREC_SEQUENCE)?;
            };
            out.write_all(b")")?;
            emit_stmt(out, map, *body)
        }
        Ast::ForIn {
            target,
            object,
            body,
        } => {
            out.write_all(b"for(")?;
            emit_stmt(out, map, *target)?;
            out.write_all(b" in ")?;
            emit_expr(out, map, *object, PREC_SEQUENCE)?;
            out.write_all(b")")?;
            emit_stmt(out, map, *body)
        }
        Ast::ForOf {
            target,
            iterable,
            body,
        } => {
            out.write_all(b"for(")?;
            emit_stmt(out, map, *target)?;
            out.write_all(b" of ")?;
            emit_expr(out, map, *iterable, PREC_ASSIGN)?;
            out.write_all(b")")?;
            emit_stmt(out, map, *body)
        }
        Ast::Switch {
            discriminant,
            cases,
        } => {
            out.write_all(b"switch(")?;
            emit_expr(out, map, *discriminant, PREC_SEQUENCE)?;
            out.write_all(b"){")?;
            for &case in cases {
                emit_stmt(out, map, case)?;
            }
            out.write_all(b"}")
        }
        Ast::Case { test, body } => {
            match test {
                Some(test) => {
                    out.write_all(b"case ")?;
                    emit_expr(out, map, *test, PREC_SEQUENCE)?;
                }
                None => out.write_all(b"default")?,
            };
            out.write_all(b":")?;
            emit_stmts(out, map, body)
        }
        Ast::Try {
            block,
            catch,
            finally,
        } => {
            out.write_all(b"try")?;
            emit_stmt(out, map, *block)?;
            if let Some(catch) = catch {
                emit_stmt(out, map, *catch)?;
            };
            if let Some(finally) = finally {
                out.write_all(b"finally")?;
                emit_stmt(out, map, *finally)?;
            };
            Ok(())
        }
        Ast::Catch { param, body } => {
            out.write_all(b"catch")?;
            if let Some(param) = param {
                out.write_all(b"(")?;
                emit_expr(out, map, *param, PREC_PRIMARY)?;
                out.write_all(b")")?;
            };
            emit_stmt(out, map, *body)
        }
        Ast::Throw { value } => {
            out.write_all(b"throw ")?;
            emit_expr(out, map, *value, PREC_SEQUENCE)
        }
        Ast::Return { value } => {
            out.write_all(b"return")?;
            if let Some(value) = value {
                out.write_all(b" ")?;
                emit_expr(out, map, *value, PREC_SEQUENCE)?;
            };
            Ok(())
        }
        Ast::Break { label } => {
            out.write_all(b"break")?;
            if let Some(label) = label {
                out.write_all(b" ")?;
                out.write_all(label.bytes())?;
            };
            Ok(())
        }
        Ast::Continue { label } => {
            out.write_all(b"continue")?;
            if let Some(label) = label {
                out.write_all(b" ")?;
                out.write_all(label.bytes())?;
            };
            Ok(())
        }
        Ast::Labeled { label, body } => {
            out.write_all(label.bytes())?;
            out.write_all(b":")?;
            emit_stmt(out, map, *body)
        }
        Ast::With { object, body } => {
            out.write_all(b"with(")?;
            emit_expr(out, map, *object, PREC_SEQUENCE)?;
            out.write_all(b")")?;
            emit_stmt(out, map, *body)
        }
        Ast::Debugger {} => out.write_all(b"debugger"),
        Ast::Import {
            source,
            default,
            mappings,
        } => {
            out.write_all(b"import")?;
            let mut wrote_any = false;
            if let Some(default) = default {
                out.write_all(b" ")?;
                emit_expr(out, map, *default, PREC_PRIMARY)?;
                wrote_any = true;
            };
            emit_mappings(out, map, mappings, wrote_any, true)?;
            out.write_all(b"from")?;
            write_quoted(out, source)
        }
        Ast::Export {
            source,
            decl,
            mappings,
            is_default,
        } => {
            out.write_all(b"export")?;
            if let Some(decl) = decl {
                if *is_default {
                    out.write_all(b" default")?;
                };
                out.write_all(b" ")?;
                return match map[*decl].ast() {
                    // The default can be a bare expression.
                    Ast::Function { .. }
                    | Ast::Class { .. }
                    | Ast::Declaration { .. }
                    | Ast::SimpleStatement { .. } => emit_stmt(out, map, *decl),
                    _ => emit_expr(out, map, *decl, PREC_ASSIGN),
                };
            };
            emit_mappings(out, map, mappings, false, false)?;
            if let Some(source) = source {
                out.write_all(b"from")?;
                write_quoted(out, source)?;
            };
            Ok(())
        }
        Ast::NameMapping { .. } => unreachable!("mappings emit with their statement"),
        // Targets appear in statement position only inside for-in/of heads.
        _ => emit_expr(out, map, node, PREC_SEQUENCE),
    }
}

fn emit_mappings<T: Write>(
    out: &mut T,
    map: &NodeMap,
    mappings: &[NodeId],
    after_default: bool,
    importing: bool,
) -> io::Result<()> {
    // A sole `*` mapping emits bare; named ones wrap in braces.
    if let [only] = mappings {
        if let Ast::NameMapping { foreign, local } = map[*only].ast() {
            if foreign == "*" {
                if after_default {
                    out.write_all(b",")?;
                };
                out.write_all(b"*")?;
                if let Some(local) = local {
                    out.write_all(b" as ")?;
                    emit_expr(out, map, *local, PREC_PRIMARY)?;
                };
                out.write_all(b" ")?;
                return Ok(());
            };
        };
    };
    if mappings.is_empty() {
        if after_default {
            out.write_all(b" ")?;
        };
        return Ok(());
    };
    if after_default {
        out.write_all(b",")?;
    };
    out.write_all(b"{")?;
    for (i, &mapping) in mappings.iter().enumerate() {
        if i > 0 {
            out.write_all(b",")?;
        };
        if let Ast::NameMapping { foreign, local } = map[mapping].ast() {
            match local {
                None => out.write_all(foreign.bytes())?,
                Some(local) => {
                    let local_name = match map[*local].ast() {
                        Ast::Binding { name } | Ast::Symbol { name } => name.clone(),
                        _ => foreign.clone(),
                    };
                    if &local_name == foreign {
                        out.write_all(foreign.bytes())?;
                    } else if importing {
                        // import: outside name first.
                        out.write_all(foreign.bytes())?;
                        out.write_all(b" as ")?;
                        out.write_all(local_name.bytes())?;
                    } else {
                        // export: local name first.
                        out.write_all(local_name.bytes())?;
                        out.write_all(b" as ")?;
                        out.write_all(foreign.bytes())?;
                    };
                }
            };
        };
    }
    out.write_all(b"}")
}

fn emit_prop_key<T: Write>(out: &mut T, map: &NodeMap, key: &PropKey) -> io::Result<()> {
    match key {
        PropKey::Direct(name) => out.write_all(name.bytes()),
        PropKey::Computed(expr) => {
            out.write_all(b"[")?;
            emit_expr(out, map, *expr, PREC_SEQUENCE)?;
            out.write_all(b"]")
        }
    }
}

fn emit_params<T: Write>(out: &mut T, map: &NodeMap, params: &[NodeId]) -> io::Result<()> {
    out.write_all(b"(")?;
    for (i, &param) in params.iter().enumerate() {
        if i > 0 {
            out.write_all(b",")?;
        };
        emit_expr(out, map, param, PREC_PRIMARY)?;
    }
    out.write_all(b")")
}

fn emit_method<T: Write>(
    out: &mut T,
    map: &NodeMap,
    kind: &MethodKind,
    key: &PropKey,
    params: &[NodeId],
    body: NodeId,
) -> io::Result<()> {
    match kind {
        MethodKind::Get => out.write_all(b"get ")?,
        MethodKind::Set => out.write_all(b"set ")?,
        MethodKind::Plain {
            is_async,
            generator,
        } => {
            if *is_async {
                out.write_all(b"async ")?;
            };
            if *generator {
                out.write_all(b"*")?;
            };
        }
    };
    emit_prop_key(out, map, key)?;
    emit_params(out, map, params)?;
    emit_stmt(out, map, body)
}

fn emit_function<T: Write>(
    out: &mut T,
    map: &NodeMap,
    is_async: bool,
    generator: bool,
    name: &Option<NodeId>,
    params: &[NodeId],
    body: NodeId,
) -> io::Result<()> {
    if is_async {
        out.write_all(b"async ")?;
    };
    out.write_all(b"function")?;
    if generator {
        out.write_all(b"*")?;
    };
    if let Some(name) = name {
        if !generator {
            out.write_all(b" ")?;
        };
        emit_expr(out, map, *name, PREC_PRIMARY)?;
    };
    emit_params(out, map, params)?;
    emit_stmt(out, map, body)
}

fn emit_expr<T: Write>(out: &mut T, map: &NodeMap, node: NodeId, min: u8) -> io::Result<()> {
    let wrap = precedence_of(map, node) < min || is_grouped(map, node);
    if wrap {
        out.write_all(b"(")?;
    };
    emit_expr_bare(out, map, node)?;
    if wrap {
        out.write_all(b")")?;
    };
    Ok(())
}

fn emit_expr_bare<T: Write>(out: &mut T, map: &NodeMap, node: NodeId) -> io::Result<()> {
    match map[node].ast() {
        Ast::Number { value } => out.write_all(number_to_string(value.0).as_bytes()),
        Ast::Str { value } => write_quoted(out, value),
        Ast::Regex {} => out.write_all(map[node].span().bytes()),
        Ast::Bool { value } => out.write_all(if *value { b"true" } else { b"false" }),
        Ast::Null {} => out.write_all(b"null"),
        Ast::Undefined {} => out.write_all(b"undefined"),
        Ast::This {} => out.write_all(b"this"),
        Ast::Super {} => out.write_all(b"super"),
        Ast::Symbol { name } | Ast::Binding { name } => out.write_all(name.bytes()),
        Ast::TemplateString { parts } => {
            out.write_all(b"`")?;
            for part in parts {
                match part {
                    TemplatePart::Chunk(chunk) => out.write_all(chunk.bytes())?,
                    TemplatePart::Expr(expr) => {
                        out.write_all(b"${")?;
                        emit_expr(out, map, *expr, PREC_SEQUENCE)?;
                        out.write_all(b"}")?;
                    }
                };
            }
            out.write_all(b"`")
        }
        Ast::Sequence { exprs, .. } => {
            for (i, &expr) in exprs.iter().enumerate() {
                if i > 0 {
                    out.write_all(b",")?;
                };
                emit_expr(out, map, expr, PREC_ASSIGN)?;
            }
            Ok(())
        }
        Ast::Assign { op, target, value, .. } => {
            emit_expr(out, map, *target, PREC_POSTFIX)?;
            out.write_all(op.text().as_bytes())?;
            emit_expr(out, map, *value, PREC_ASSIGN)
        }
        Ast::Conditional {
            test,
            consequent,
            alternate,
            ..
        } => {
            emit_expr(out, map, *test, PREC_COALESCE)?;
            out.write_all(b"?")?;
            emit_expr(out, map, *consequent, PREC_ASSIGN)?;
            out.write_all(b":")?;
            emit_expr(out, map, *alternate, PREC_ASSIGN)
        }
        Ast::Binary { op, left, right, .. } => {
            let prec = op.precedence();
            let (lmin, rmin) = if op.right_associative() {
                (prec + 1, prec)
            } else {
                (prec, prec + 1)
            };
            emit_expr(out, map, *left, lmin)?;
            out.write_all(op.text().as_bytes())?;
            // Keep `a+ +b` from fusing into `a++b`.
            let positive = matches!(op, crate::operator::BinaryOp::Add);
            let negative = matches!(op, crate::operator::BinaryOp::Sub);
            if (positive || negative) && starts_with_sign(map, *right, positive) {
                out.write_all(b" ")?;
            };
            emit_expr(out, map, *right, rmin)
        }
        Ast::UnaryPrefix { op, operand, .. } => {
            out.write_all(op.text().as_bytes())?;
            let positive = matches!(op, UnaryOp::Plus | UnaryOp::Inc);
            let negative = matches!(op, UnaryOp::Neg | UnaryOp::Dec);
            if (positive || negative) && starts_with_sign(map, *operand, positive) {
                out.write_all(b" ")?;
            };
            emit_expr(out, map, *operand, PREC_UNARY)
        }
        Ast::UnaryPostfix { op, operand, .. } => {
            emit_expr(out, map, *operand, PREC_POSTFIX)?;
            out.write_all(op.text().as_bytes())
        }
        Ast::Await { operand } => {
            out.write_all(b"await ")?;
            emit_expr(out, map, *operand, PREC_UNARY)
        }
        Ast::Yield { operand, delegated } => {
            out.write_all(b"yield")?;
            if *delegated {
                out.write_all(b"*")?;
            };
            if let Some(operand) = operand {
                if !delegated {
                    out.write_all(b" ")?;
                };
                emit_expr(out, map, *operand, PREC_ASSIGN)?;
            };
            Ok(())
        }
        Ast::Call {
            callee,
            args,
            optional,
            ..
        } => {
            emit_expr(out, map, *callee, PREC_ACCESS)?;
            if *optional {
                out.write_all(b"?.")?;
            };
            emit_args(out, map, args)
        }
        Ast::New { callee, args } => {
            out.write_all(b"new ")?;
            emit_expr(out, map, *callee, PREC_ACCESS)?;
            emit_args(out, map, args)
        }
        Ast::Dot {
            object,
            property,
            optional,
            ..
        } => {
            emit_expr(out, map, *object, PREC_ACCESS)?;
            out.write_all(if *optional { b"?." } else { b"." })?;
            out.write_all(property.bytes())
        }
        Ast::Sub {
            object,
            index,
            optional,
        } => {
            emit_expr(out, map, *object, PREC_ACCESS)?;
            if *optional {
                out.write_all(b"?.")?;
            };
            out.write_all(b"[")?;
            emit_expr(out, map, *index, PREC_SEQUENCE)?;
            out.write_all(b"]")
        }
        Ast::Spread { operand } => {
            out.write_all(b"...")?;
            emit_expr(out, map, *operand, PREC_ASSIGN)
        }
        Ast::Array { elements } => {
            out.write_all(b"[")?;
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    out.write_all(b",")?;
                };
                if let Some(element) = element {
                    emit_expr(out, map, *element, PREC_ASSIGN)?;
                };
            }
            out.write_all(b"]")
        }
        Ast::Object { props } => {
            out.write_all(b"{")?;
            for (i, &prop) in props.iter().enumerate() {
                if i > 0 {
                    out.write_all(b",")?;
                };
                emit_expr_bare(out, map, prop)?;
            }
            out.write_all(b"}")
        }
        Ast::Property { key, value } => {
            emit_prop_key(out, map, key)?;
            if let Some(value) = value {
                out.write_all(b":")?;
                emit_expr(out, map, *value, PREC_ASSIGN)?;
            };
            Ok(())
        }
        Ast::Field {
            is_static,
            key,
            value,
        } => {
            if *is_static {
                out.write_all(b"static ")?;
            };
            emit_prop_key(out, map, key)?;
            if let Some(value) = value {
                out.write_all(b"=")?;
                emit_expr(out, map, *value, PREC_ASSIGN)?;
            };
            out.write_all(b";")
        }
        Ast::Method {
            is_static,
            kind,
            key,
            params,
            body,
        } => {
            if *is_static {
                out.write_all(b"static ")?;
            };
            emit_method(out, map, kind, key, params, *body)
        }
        Ast::Arrow {
            is_async,
            params,
            body,
        } => {
            if *is_async {
                out.write_all(b"async")?;
            };
            let sole_name = match params.as_slice() {
                [only] => match map[*only].ast() {
                    Ast::Param {
                        rest: false,
                        target,
                    } => matches!(map[*target].ast(), Ast::Binding { .. }),
                    _ => false,
                },
                _ => false,
            };
            if sole_name && !is_async {
                emit_expr(out, map, params[0], PREC_PRIMARY)?;
            } else {
                emit_params(out, map, params)?;
            };
            out.write_all(b"=>")?;
            match map[*body].ast() {
                Ast::Block { .. } => emit_stmt(out, map, *body),
                // An expression body that is an object literal would read as
                // a block.
                Ast::Object { .. } => {
                    out.write_all(b"(")?;
                    emit_expr_bare(out, map, *body)?;
                    out.write_all(b")")
                }
                _ => emit_expr(out, map, *body, PREC_ASSIGN),
            }
        }
        Ast::Function {
            is_async,
            generator,
            name,
            params,
            body,
            ..
        } => emit_function(out, map, *is_async, *generator, name, params, *body),
        Ast::Class {
            name,
            parent,
            members,
            ..
        } => {
            out.write_all(b"class")?;
            if let Some(name) = name {
                out.write_all(b" ")?;
                emit_expr(out, map, *name, PREC_PRIMARY)?;
            };
            if let Some(parent) = parent {
                out.write_all(b" extends ")?;
                emit_expr(out, map, *parent, PREC_ACCESS)?;
            };
            out.write_all(b"{")?;
            for &member in members {
                emit_expr_bare(out, map, member)?;
            }
            out.write_all(b"}")
        }
        Ast::ImportExpression { module } => {
            out.write_all(b"import(")?;
            write_quoted(out, module)?;
            out.write_all(b")")
        }

        // Targets.
        Ast::ArrayTarget { items, rest } => {
            out.write_all(b"[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.write_all(b",")?;
                };
                if let Some(item) = item {
                    emit_expr(out, map, *item, PREC_ASSIGN)?;
                };
            }
            if let Some(rest) = rest {
                if !items.is_empty() {
                    out.write_all(b",")?;
                };
                out.write_all(b"...")?;
                emit_expr(out, map, *rest, PREC_PRIMARY)?;
            };
            out.write_all(b"]")
        }
        Ast::ObjectTarget { props, rest } => {
            out.write_all(b"{")?;
            for (i, &prop) in props.iter().enumerate() {
                if i > 0 {
                    out.write_all(b",")?;
                };
                emit_expr_bare(out, map, prop)?;
            }
            if let Some(rest) = rest {
                if !props.is_empty() {
                    out.write_all(b",")?;
                };
                out.write_all(b"...")?;
                emit_expr(out, map, *rest, PREC_PRIMARY)?;
            };
            out.write_all(b"}")
        }
        Ast::TargetProp { key, target } => {
            emit_prop_key(out, map, key)?;
            if let Some(target) = target {
                out.write_all(b":")?;
                emit_expr(out, map, *target, PREC_ASSIGN)?;
            };
            Ok(())
        }
        Ast::WithDefault { target, value } => {
            emit_expr(out, map, *target, PREC_POSTFIX)?;
            out.write_all(b"=")?;
            emit_expr(out, map, *value, PREC_ASSIGN)
        }
        Ast::Param { rest, target } => {
            if *rest {
                out.write_all(b"...")?;
            };
            emit_expr(out, map, *target, PREC_ASSIGN)
        }

        other => unreachable!("not an expression: {:?}", other),
    }
}

fn emit_args<T: Write>(out: &mut T, map: &NodeMap, args: &[NodeId]) -> io::Result<()> {
    out.write_all(b"(")?;
    for (i, &arg) in args.iter().enumerate() {
        if i > 0 {
            out.write_all(b",")?;
        };
        emit_expr(out, map, arg, PREC_ASSIGN)?;
    }
    out.write_all(b")")
}
