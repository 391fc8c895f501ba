use super::folding::node_to_value;
use super::{CompressError, CompressResult};
use crate::ast::{Ast, NodeId, NodeMap};
use crate::symbol::ScopeMap;
use crate::visit::{child_nodes, TransformResult, Transformer};

fn is_terminal(map: &NodeMap, node: NodeId) -> bool {
    matches!(
        map[node].ast(),
        Ast::Return { .. } | Ast::Throw { .. } | Ast::Break { .. } | Ast::Continue { .. }
    )
}

/// Looks for a `break` that would target the enclosing loop; nested loops,
/// switches, and closures are opaque. Labeled breaks count conservatively.
fn has_own_break(map: &NodeMap, node: NodeId) -> bool {
    match map[node].ast() {
        Ast::Break { .. } => true,
        Ast::While { .. }
        | Ast::Do { .. }
        | Ast::For { .. }
        | Ast::ForIn { .. }
        | Ast::ForOf { .. }
        | Ast::Switch { .. }
        | Ast::Function { .. }
        | Ast::Arrow { .. }
        | Ast::Method { .. }
        | Ast::Class { .. } => false,
        _ => child_nodes(map, node)
            .into_iter()
            .any(|child| has_own_break(map, child)),
    }
}

struct UnreachablePass<'a> {
    #[allow(dead_code)]
    scopes: &'a ScopeMap,
    changed: bool,
    error: Option<CompressError>,
}

impl<'a> Transformer for UnreachablePass<'a> {
    fn before(&mut self, map: &mut NodeMap, node: NodeId, in_list: bool) -> TransformResult {
        if self.error.is_some() {
            return TransformResult::Keep;
        };
        match map[node].ast() {
            Ast::With { .. } => {
                self.error = Some(CompressError::NotImplemented("with statements"));
                return TransformResult::Keep;
            }
            Ast::ForIn { .. } | Ast::ForOf { .. } => {
                self.error = Some(CompressError::NotImplemented("for-in/for-of loops"));
                return TransformResult::Keep;
            }
            _ => {}
        };
        enum Decision {
            Keep,
            // Remove from the containing list, or degrade to an empty
            // statement.
            Drop,
            // Take a child's syntax as this node's.
            Adopt(NodeId),
            // Keep only the for-init, as a statement.
            KeepInit(NodeId),
        }
        let decision = match map[node].ast() {
            Ast::If {
                test,
                consequent,
                alternate,
            } => match node_to_value(map, *test) {
                None => Decision::Keep,
                Some(value) => {
                    let taken = if value.to_boolean() {
                        Some(*consequent)
                    } else {
                        *alternate
                    };
                    match taken {
                        None => Decision::Drop,
                        Some(branch) => Decision::Adopt(branch),
                    }
                }
            },
            Ast::While { test, .. } => match node_to_value(map, *test) {
                Some(value) if !value.to_boolean() => Decision::Drop,
                _ => Decision::Keep,
            },
            // The body runs exactly once, provided no `break` targets this
            // loop.
            Ast::Do { body, test } => match node_to_value(map, *test) {
                Some(value) if !value.to_boolean() && !has_own_break(map, *body) => {
                    Decision::Adopt(*body)
                }
                _ => Decision::Keep,
            },
            Ast::For {
                init,
                condition: Some(condition),
                ..
            } => match node_to_value(map, *condition) {
                Some(value) if !value.to_boolean() => match init {
                    None => Decision::Drop,
                    Some(init) => Decision::KeepInit(*init),
                },
                _ => Decision::Keep,
            },
            _ => Decision::Keep,
        };
        match decision {
            Decision::Keep => TransformResult::Keep,
            Decision::Drop => {
                self.changed = true;
                if in_list {
                    TransformResult::Remove
                } else {
                    TransformResult::Replace(Ast::EmptyStatement {})
                }
            }
            Decision::Adopt(child) => {
                self.changed = true;
                TransformResult::Replace(map[child].replace_ast(Ast::EmptyStatement {}))
            }
            Decision::KeepInit(init) => {
                self.changed = true;
                let ast = map[init].replace_ast(Ast::EmptyStatement {});
                match ast {
                    // A declaration is already a statement; an expression
                    // init needs a statement wrapper.
                    Ast::Declaration { .. } => TransformResult::Replace(ast),
                    _ => {
                        *map[init].ast_mut() = ast;
                        TransformResult::Replace(Ast::SimpleStatement { expr: init })
                    }
                }
            }
        }
    }

    fn after(&mut self, map: &mut NodeMap, node: NodeId, _in_list: bool) -> TransformResult {
        // Code after a terminal statement in the same list never runs.
        let body: Vec<NodeId> = match map[node].ast() {
            Ast::Block { body } | Ast::Toplevel { body } => body.clone(),
            _ => return TransformResult::Keep,
        };
        if let Some(cut) = body.iter().position(|&stmt| is_terminal(map, stmt)) {
            if cut + 1 < body.len() {
                match map[node].ast_mut() {
                    Ast::Block { body } | Ast::Toplevel { body } => body.truncate(cut + 1),
                    _ => unreachable!(),
                };
                self.changed = true;
            };
        };
        TransformResult::Keep
    }
}

pub fn eliminate_unreachable_code(
    map: &mut NodeMap,
    scopes: &ScopeMap,
    root: NodeId,
) -> CompressResult<bool> {
    let mut pass = UnreachablePass {
        scopes,
        changed: false,
        error: None,
    };
    pass.transform(map, root);
    match pass.error {
        Some(error) => Err(error),
        None => Ok(pass.changed),
    }
}
