use crate::ast::{Ast, NodeId, NodeMap};
use crate::visit::{JourneyControls, Visitor};

/// A trailing `return` adds nothing when bare or returning `undefined`.
fn is_redundant_return(map: &NodeMap, node: NodeId) -> bool {
    match map[node].ast() {
        Ast::Return { value: None } => true,
        Ast::Return { value: Some(value) } => match map[*value].ast() {
            Ast::Undefined {} => true,
            Ast::Symbol { name } => name == "undefined",
            _ => false,
        },
        _ => false,
    }
}

struct ReturnPass {
    changed: bool,
}

impl ReturnPass {
    fn trim(&mut self, map: &mut NodeMap, body: NodeId) -> () {
        let last = match map[body].ast() {
            Ast::Block { body } => match body.last() {
                Some(&last) => last,
                None => return,
            },
            _ => return,
        };
        if is_redundant_return(map, last) {
            match map[body].ast_mut() {
                Ast::Block { body } => {
                    body.pop();
                }
                _ => unreachable!(),
            };
            self.changed = true;
        };
    }
}

impl Visitor for ReturnPass {
    fn on_node_down(&mut self, map: &mut NodeMap, node: NodeId, _ctl: &mut JourneyControls) -> () {
        let body = match map[node].ast() {
            Ast::Function { body, .. } | Ast::Method { body, .. } => *body,
            Ast::Arrow { body, .. } => match map[*body].ast() {
                Ast::Block { .. } => *body,
                _ => return,
            },
            _ => return,
        };
        self.trim(map, body);
    }
}

pub fn compress_function_returns(map: &mut NodeMap, root: NodeId) -> bool {
    let mut pass = ReturnPass { changed: false };
    pass.visit(map, root);
    pass.changed
}
