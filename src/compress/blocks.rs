use crate::ast::{Ast, NodeId, NodeMap};
use crate::symbol::ScopeMap;
use crate::visit::{JourneyControls, Visitor};

struct BlockPass<'a> {
    scopes: &'a ScopeMap,
    blocks: bool,
    empties: bool,
    changed: bool,
}

impl<'a> BlockPass<'a> {
    /// A block whose scope binds nothing exists only for grouping and can
    /// dissolve into the surrounding list.
    fn dissolvable(&self, map: &NodeMap, node: NodeId) -> bool {
        match map[node].ast() {
            Ast::Block { body } => match body.first() {
                None => true,
                Some(&first) => self.scopes[map[first].scope()].binding_count() == 0,
            },
            _ => false,
        }
    }
}

impl<'a> Visitor for BlockPass<'a> {
    fn on_node_down(&mut self, _map: &mut NodeMap, _node: NodeId, _ctl: &mut JourneyControls) -> () {
    }

    // Bottom-up, so dissolving nested blocks cascades outward in one run.
    fn on_node_up(&mut self, map: &mut NodeMap, node: NodeId) -> () {
        let old: Vec<NodeId> = match map[node].ast() {
            Ast::Block { body } | Ast::Toplevel { body } | Ast::Case { body, .. } => body.clone(),
            _ => return,
        };
        let mut new: Vec<NodeId> = Vec::with_capacity(old.len());
        for stmt in old {
            match map[stmt].ast() {
                Ast::EmptyStatement {} if self.empties => {
                    self.changed = true;
                }
                Ast::Block { .. } if self.blocks && self.dissolvable(map, stmt) => {
                    self.changed = true;
                    match map[stmt].replace_ast(Ast::EmptyStatement {}) {
                        Ast::Block { body } => new.extend(body),
                        _ => unreachable!(),
                    };
                }
                _ => new.push(stmt),
            };
        }
        match map[node].ast_mut() {
            Ast::Block { body } | Ast::Toplevel { body } | Ast::Case { body, .. } => {
                *body = new;
            }
            _ => unreachable!(),
        };
    }
}

pub fn eliminate_blocks_and_empties(
    map: &mut NodeMap,
    scopes: &ScopeMap,
    root: NodeId,
    blocks: bool,
    empties: bool,
) -> bool {
    let mut pass = BlockPass {
        scopes,
        blocks,
        empties,
        changed: false,
    };
    pass.visit(map, root);
    pass.changed
}
