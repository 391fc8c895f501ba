use crate::ast::{Ast, NodeId, NodeMap, PropKey, TemplatePart};

fn push_key(key: &PropKey, out: &mut Vec<NodeId>) -> () {
    if let PropKey::Computed(expr) = key {
        out.push(*expr);
    };
}

fn push_opt(slot: &Option<NodeId>, out: &mut Vec<NodeId>) -> () {
    if let Some(node) = slot {
        out.push(*node);
    };
}

/// Every child handle of a node, in source order.
pub fn child_nodes(map: &NodeMap, node: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    collect_children(map[node].ast(), &mut out);
    out
}

fn collect_children(ast: &Ast, out: &mut Vec<NodeId>) -> () {
    match ast {
        Ast::Number { .. }
        | Ast::Str { .. }
        | Ast::Regex {}
        | Ast::Bool { .. }
        | Ast::Null {}
        | Ast::Undefined {}
        | Ast::This {}
        | Ast::Super {}
        | Ast::Symbol { .. }
        | Ast::Binding { .. }
        | Ast::EmptyStatement {}
        | Ast::Break { .. }
        | Ast::Continue { .. }
        | Ast::Debugger {}
        | Ast::ImportExpression { .. } => {}

        Ast::ArrayTarget { items, rest } => {
            for item in items {
                push_opt(item, out);
            }
            push_opt(rest, out);
        }
        Ast::ObjectTarget { props, rest } => {
            out.extend(props);
            push_opt(rest, out);
        }
        Ast::TargetProp { key, target } => {
            push_key(key, out);
            push_opt(target, out);
        }
        Ast::WithDefault { target, value } => {
            out.push(*target);
            out.push(*value);
        }
        Ast::Param { target, .. } => out.push(*target),

        Ast::UnaryPrefix { operand, .. }
        | Ast::UnaryPostfix { operand, .. }
        | Ast::Await { operand }
        | Ast::Spread { operand } => out.push(*operand),
        Ast::Yield { operand, .. } => push_opt(operand, out),
        Ast::Binary { left, right, .. } => {
            out.push(*left);
            out.push(*right);
        }
        Ast::Assign { target, value, .. } => {
            out.push(*target);
            out.push(*value);
        }
        Ast::Conditional {
            test,
            consequent,
            alternate,
            ..
        } => {
            out.push(*test);
            out.push(*consequent);
            out.push(*alternate);
        }
        Ast::Sequence { exprs, .. } => out.extend(exprs),
        Ast::Call { callee, args, .. } => {
            out.push(*callee);
            out.extend(args);
        }
        Ast::New { callee, args } => {
            out.push(*callee);
            out.extend(args);
        }
        Ast::Dot { object, .. } => out.push(*object),
        Ast::Sub { object, index, .. } => {
            out.push(*object);
            out.push(*index);
        }
        Ast::Array { elements } => {
            for element in elements {
                push_opt(element, out);
            }
        }
        Ast::Object { props } => out.extend(props),
        Ast::Property { key, value } | Ast::Field { key, value, .. } => {
            push_key(key, out);
            push_opt(value, out);
        }
        Ast::Method {
            key, params, body, ..
        } => {
            push_key(key, out);
            out.extend(params);
            out.push(*body);
        }
        Ast::Arrow { params, body, .. } => {
            out.extend(params);
            out.push(*body);
        }
        Ast::Function {
            name, params, body, ..
        } => {
            push_opt(name, out);
            out.extend(params);
            out.push(*body);
        }
        Ast::Class {
            name,
            parent,
            members,
            ..
        } => {
            push_opt(name, out);
            push_opt(parent, out);
            out.extend(members);
        }
        Ast::TemplateString { parts } => {
            for part in parts {
                if let TemplatePart::Expr(expr) = part {
                    out.push(*expr);
                };
            }
        }

        Ast::Block { body } | Ast::Toplevel { body } => out.extend(body),
        Ast::SimpleStatement { expr } => out.push(*expr),
        Ast::If {
            test,
            consequent,
            alternate,
        } => {
            out.push(*test);
            out.push(*consequent);
            push_opt(alternate, out);
        }
        Ast::While { test, body } => {
            out.push(*test);
            out.push(*body);
        }
        Ast::Do { body, test } => {
            out.push(*body);
            out.push(*test);
        }
        Ast::For {
            init,
            condition,
            update,
            body,
        } => {
            push_opt(init, out);
            push_opt(condition, out);
            push_opt(update, out);
            out.push(*body);
        }
        Ast::ForIn {
            target,
            object,
            body,
        } => {
            out.push(*target);
            out.push(*object);
            out.push(*body);
        }
        Ast::ForOf {
            target,
            iterable,
            body,
        } => {
            out.push(*target);
            out.push(*iterable);
            out.push(*body);
        }
        Ast::Switch {
            discriminant,
            cases,
        } => {
            out.push(*discriminant);
            out.extend(cases);
        }
        Ast::Case { test, body } => {
            push_opt(test, out);
            out.extend(body);
        }
        Ast::Try {
            block,
            catch,
            finally,
        } => {
            out.push(*block);
            push_opt(catch, out);
            push_opt(finally, out);
        }
        Ast::Catch { param, body } => {
            push_opt(param, out);
            out.push(*body);
        }
        Ast::Throw { value } => out.push(*value),
        Ast::Return { value } => push_opt(value, out),
        Ast::Labeled { body, .. } => out.push(*body),
        Ast::With { object, body } => {
            out.push(*object);
            out.push(*body);
        }
        Ast::Declaration { defs, .. } => out.extend(defs),
        Ast::VarDef { name, value } => {
            out.push(*name);
            push_opt(value, out);
        }

        Ast::Import {
            default, mappings, ..
        } => {
            push_opt(default, out);
            out.extend(mappings);
        }
        Ast::Export { decl, mappings, .. } => {
            push_opt(decl, out);
            out.extend(mappings);
        }
        Ast::NameMapping { local, .. } => push_opt(local, out),
    };
}

pub struct JourneyControls {
    skip: bool,
}

impl JourneyControls {
    pub fn stop_descending(&mut self) -> () {
        self.skip = true;
    }
}

/// Pre/post-order walk. The visitor may rewrite node contents in place but
/// not the tree shape; `stop_descending` suppresses the default descent.
pub trait Visitor {
    fn on_node_down(&mut self, map: &mut NodeMap, node: NodeId, ctl: &mut JourneyControls) -> ();

    fn on_node_up(&mut self, _map: &mut NodeMap, _node: NodeId) -> () {}

    fn visit(&mut self, map: &mut NodeMap, node: NodeId) -> ()
    where
        Self: Sized,
    {
        visit_node(map, self, node);
    }
}

pub fn visit_node<V: Visitor>(map: &mut NodeMap, visitor: &mut V, node: NodeId) -> () {
    let mut ctl = JourneyControls { skip: false };
    visitor.on_node_down(map, node, &mut ctl);
    if !ctl.skip {
        // Children are collected after the downward call, since the visitor
        // may have rewritten this node.
        for child in child_nodes(map, node) {
            visit_node(map, visitor, child);
        }
    };
    visitor.on_node_up(map, node);
}

/// Outcome of a transformer callback. `Remove` deletes the node from its
/// containing list; in a required statement slot it degrades to an empty
/// statement, and optional slots become empty.
pub enum TransformResult {
    Keep,
    Replace(Ast),
    Remove,
}

pub trait Transformer {
    fn before(&mut self, _map: &mut NodeMap, _node: NodeId, _in_list: bool) -> TransformResult {
        TransformResult::Keep
    }

    fn after(&mut self, _map: &mut NodeMap, _node: NodeId, _in_list: bool) -> TransformResult {
        TransformResult::Keep
    }

    fn transform(&mut self, map: &mut NodeMap, node: NodeId) -> ()
    where
        Self: Sized,
    {
        transform_node(map, self, node, false);
    }
}

fn transform_list<T: Transformer>(map: &mut NodeMap, t: &mut T, list: &mut Vec<NodeId>) -> () {
    let mut write = 0;
    for read in 0..list.len() {
        if transform_node(map, t, list[read], true) {
            list.swap(write, read);
            write += 1;
        };
    }
    list.truncate(write);
}

fn transform_stmt_slot<T: Transformer>(map: &mut NodeMap, t: &mut T, child: NodeId) -> () {
    if !transform_node(map, t, child, false) {
        *map[child].ast_mut() = Ast::EmptyStatement {};
    };
}

fn transform_expr_slot<T: Transformer>(map: &mut NodeMap, t: &mut T, child: NodeId) -> () {
    let kept = transform_node(map, t, child, false);
    debug_assert!(kept);
}

/// Returns whether the node survived; false tells the caller to drop it from
/// its list.
pub fn transform_node<T: Transformer>(
    map: &mut NodeMap,
    t: &mut T,
    node: NodeId,
    in_list: bool,
) -> bool {
    match t.before(map, node, in_list) {
        TransformResult::Remove => return false,
        TransformResult::Replace(ast) => {
            // Children of a replacement are not visited this round; the
            // fixed-point driver sees them next pass.
            *map[node].ast_mut() = ast;
        }
        TransformResult::Keep => transform_children(map, t, node),
    };
    match t.after(map, node, in_list) {
        TransformResult::Remove => false,
        TransformResult::Replace(ast) => {
            *map[node].ast_mut() = ast;
            true
        }
        TransformResult::Keep => true,
    }
}

fn transform_children<T: Transformer>(map: &mut NodeMap, t: &mut T, node: NodeId) -> () {
    // Take the syntax out of the arena so child lists can shrink while
    // recursing.
    let mut ast = map[node].replace_ast(Ast::EmptyStatement {});
    match &mut ast {
        Ast::Toplevel { body } | Ast::Block { body } => {
            transform_list(map, t, body);
        }
        Ast::Case { test, body } => {
            if let Some(test) = *test {
                transform_expr_slot(map, t, test);
            };
            transform_list(map, t, body);
        }
        Ast::If {
            test,
            consequent,
            alternate,
        } => {
            transform_expr_slot(map, t, *test);
            transform_stmt_slot(map, t, *consequent);
            if let Some(alt) = *alternate {
                if !transform_node(map, t, alt, false) {
                    *alternate = None;
                };
            };
        }
        Ast::Try {
            block,
            catch,
            finally,
        } => {
            transform_stmt_slot(map, t, *block);
            if let Some(handler) = *catch {
                if !transform_node(map, t, handler, false) {
                    *catch = None;
                };
            };
            if let Some(cleanup) = *finally {
                if !transform_node(map, t, cleanup, false) {
                    *finally = None;
                };
            };
        }
        _ => {
            let mut children = Vec::new();
            collect_children(&ast, &mut children);
            let stmt_slots = matches!(
                &ast,
                Ast::Do { .. }
                    | Ast::While { .. }
                    | Ast::For { .. }
                    | Ast::ForIn { .. }
                    | Ast::ForOf { .. }
                    | Ast::With { .. }
                    | Ast::Labeled { .. }
            );
            for child in children {
                if stmt_slots {
                    transform_stmt_slot(map, t, child);
                } else {
                    transform_expr_slot(map, t, child);
                }
            }
        }
    };
    *map[node].ast_mut() = ast;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::Lexer;
    use crate::parse::parser::Parser;
    use crate::parse::toplevel::{parse_source, SourceKind};

    fn parse(code: &str) -> (NodeMap, NodeId) {
        let mut parser = Parser::new(Lexer::new(code.as_bytes().to_vec()));
        let parsed = parse_source(&mut parser, SourceKind::Script).unwrap();
        let (map, _) = parser.take();
        (map, parsed.root)
    }

    struct CountingWalker {
        down: usize,
        up: usize,
        skip_functions: bool,
        symbols: Vec<String>,
    }

    impl Visitor for CountingWalker {
        fn on_node_down(&mut self, map: &mut NodeMap, node: NodeId, ctl: &mut JourneyControls) -> () {
            self.down += 1;
            match map[node].ast() {
                Ast::Function { .. } if self.skip_functions => ctl.stop_descending(),
                Ast::Symbol { name } => self.symbols.push(name.text().to_string()),
                _ => {}
            };
        }

        fn on_node_up(&mut self, _map: &mut NodeMap, _node: NodeId) -> () {
            self.up += 1;
        }
    }

    #[test]
    fn test_walk_is_pre_order_and_balanced() {
        let (mut map, root) = parse("let a = b + c; f(a);");
        let mut walker = CountingWalker {
            down: 0,
            up: 0,
            skip_functions: false,
            symbols: Vec::new(),
        };
        walker.visit(&mut map, root);
        assert_eq!(walker.down, walker.up);
        assert_eq!(walker.symbols, vec!["b", "c", "f", "a"]);
    }

    #[test]
    fn test_stop_descending() {
        let (mut map, root) = parse("function f() { inner_only; } outer;");
        let mut walker = CountingWalker {
            down: 0,
            up: 0,
            skip_functions: true,
            symbols: Vec::new(),
        };
        walker.visit(&mut map, root);
        assert_eq!(walker.symbols, vec!["outer"]);
    }

    struct DebuggerStripper {}

    impl Transformer for DebuggerStripper {
        fn before(&mut self, map: &mut NodeMap, node: NodeId, in_list: bool) -> TransformResult {
            match map[node].ast() {
                Ast::Debugger {} if in_list => TransformResult::Remove,
                _ => TransformResult::Keep,
            }
        }
    }

    #[test]
    fn test_transformer_removes_from_list() {
        let (mut map, root) = parse("a; debugger; b;");
        DebuggerStripper {}.transform(&mut map, root);
        match map[root].ast() {
            Ast::Toplevel { body } => assert_eq!(body.len(), 2),
            _ => unreachable!(),
        };
    }
}
