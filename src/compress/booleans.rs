use crate::ast::{Ast, NodeId, NodeMap};
use crate::operator::UnaryOp;
use crate::visit::{JourneyControls, Visitor};

/// If the node is `!!x`, yields `x`.
fn strip_double_not(map: &NodeMap, node: NodeId) -> Option<NodeId> {
    match map[node].ast() {
        Ast::UnaryPrefix {
            op: UnaryOp::Not,
            operand,
            ..
        } => match map[*operand].ast() {
            Ast::UnaryPrefix {
                op: UnaryOp::Not,
                operand: inner,
                ..
            } => Some(*inner),
            _ => None,
        },
        _ => None,
    }
}

struct BooleanPass {
    changed: bool,
}

impl BooleanPass {
    // An expression slot that coerces to boolean anyway makes `!!` there
    // redundant.
    fn shorten(&mut self, map: &NodeMap, slot: &mut NodeId) -> () {
        if let Some(inner) = strip_double_not(map, *slot) {
            *slot = inner;
            self.changed = true;
        };
    }
}

impl Visitor for BooleanPass {
    fn on_node_down(&mut self, map: &mut NodeMap, node: NodeId, _ctl: &mut JourneyControls) -> () {
        let mut ast = map[node].replace_ast(Ast::EmptyStatement {});
        match &mut ast {
            Ast::If { test, .. }
            | Ast::While { test, .. }
            | Ast::Do { test, .. }
            | Ast::Conditional { test, .. }
            | Ast::For {
                condition: Some(test),
                ..
            } => self.shorten(map, test),
            // `!(!!x)` is `!x`.
            Ast::UnaryPrefix {
                op: UnaryOp::Not,
                operand,
                ..
            } => self.shorten(map, operand),
            _ => {}
        };
        *map[node].ast_mut() = ast;
    }
}

pub fn compress_booleans(map: &mut NodeMap, root: NodeId) -> bool {
    let mut pass = BooleanPass { changed: false };
    pass.visit(map, root);
    pass.changed
}
