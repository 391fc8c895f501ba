use ahash::AHashMap;

use crate::ast::{Ast, NodeId, NodeMap};
use crate::coerce::JsValue;
use crate::num::JsNumber;
use crate::operator::{BinaryOp, UnaryOp};
use crate::visit::{JourneyControls, Visitor};

/// Constants substituted for free identifiers before compression, e.g.
/// `DEBUG -> false`.
pub type GlobalDefines = AHashMap<String, JsValue>;

/// Reads a literal node back as a primitive value. Free names with constant
/// meaning (`undefined`, `NaN`, `Infinity`) count.
pub fn node_to_value(map: &NodeMap, node: NodeId) -> Option<JsValue> {
    Some(match map[node].ast() {
        Ast::Bool { value } => JsValue::Boolean(*value),
        Ast::Null {} => JsValue::Null,
        Ast::Number { value } => JsValue::Number(*value),
        Ast::Str { value } => JsValue::String(value.clone()),
        Ast::Undefined {} => JsValue::Undefined,
        Ast::Symbol { name } => match name.text() {
            "NaN" => JsValue::Number(JsNumber(f64::NAN)),
            "Infinity" => JsValue::Number(JsNumber(f64::INFINITY)),
            "undefined" => JsValue::Undefined,
            _ => return None,
        },
        _ => return None,
    })
}

pub fn value_to_ast(value: &JsValue) -> Ast {
    match value {
        JsValue::Undefined => Ast::Undefined {},
        JsValue::Null => Ast::Null {},
        JsValue::Boolean(value) => Ast::Bool { value: *value },
        JsValue::Number(value) => Ast::Number { value: *value },
        JsValue::String(value) => Ast::Str {
            value: value.clone(),
        },
    }
}

fn strictly_equal(left: &JsValue, right: &JsValue) -> bool {
    match (left, right) {
        (JsValue::Undefined, JsValue::Undefined) => true,
        (JsValue::Null, JsValue::Null) => true,
        (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
        (JsValue::String(a), JsValue::String(b)) => a == b,
        // NaN != NaN, so JsNumber's hash-key equality is not usable here.
        (JsValue::Number(a), JsValue::Number(b)) => a.0 == b.0,
        _ => false,
    }
}

fn fold_binary(op: BinaryOp, left: &JsValue, right: &JsValue) -> Option<JsValue> {
    use BinaryOp::*;
    Some(match op {
        Add => match (left, right) {
            // String concatenation wins over numeric addition.
            (JsValue::String(_), _) | (_, JsValue::String(_)) => {
                JsValue::String(format!("{}{}", left.to_js_string(), right.to_js_string()))
            }
            _ => JsValue::Number(JsNumber(left.to_number().0 + right.to_number().0)),
        },
        Sub => JsValue::Number(JsNumber(left.to_number().0 - right.to_number().0)),
        Mul => JsValue::Number(JsNumber(left.to_number().0 * right.to_number().0)),
        Div => JsValue::Number(JsNumber(left.to_number().0 / right.to_number().0)),
        Rem => JsValue::Number(JsNumber(left.to_number().0 % right.to_number().0)),
        Exp => JsValue::Number(JsNumber(left.to_number().0.powf(right.to_number().0))),
        StrictEq => JsValue::Boolean(strictly_equal(left, right)),
        StrictNotEq => JsValue::Boolean(!strictly_equal(left, right)),
        Lt => JsValue::Boolean(left.to_number().0 < right.to_number().0),
        LtEq => JsValue::Boolean(left.to_number().0 <= right.to_number().0),
        Gt => JsValue::Boolean(left.to_number().0 > right.to_number().0),
        GtEq => JsValue::Boolean(left.to_number().0 >= right.to_number().0),
        _ => return None,
    })
}

struct FoldPass {
    changed: bool,
}

enum Fold {
    Value(JsValue),
    // Adopt a child expression's syntax wholesale.
    Child(NodeId),
}

impl Visitor for FoldPass {
    fn on_node_down(&mut self, _map: &mut NodeMap, _node: NodeId, _ctl: &mut JourneyControls) -> () {
    }

    // Bottom-up, so nested literal subtrees collapse in one traversal.
    fn on_node_up(&mut self, map: &mut NodeMap, node: NodeId) -> () {
        let fold = match map[node].ast() {
            Ast::UnaryPrefix { op, operand, .. } => match (op, node_to_value(map, *operand)) {
                (UnaryOp::Not, Some(v)) => Some(Fold::Value(JsValue::Boolean(!v.to_boolean()))),
                (UnaryOp::Neg, Some(v)) => {
                    Some(Fold::Value(JsValue::Number(JsNumber(-v.to_number().0))))
                }
                (UnaryOp::Plus, Some(v)) => Some(Fold::Value(JsValue::Number(v.to_number()))),
                (UnaryOp::Void, Some(_)) => Some(Fold::Value(JsValue::Undefined)),
                (UnaryOp::Typeof, Some(v)) => Some(Fold::Value(JsValue::String(
                    match v {
                        JsValue::Undefined => "undefined",
                        JsValue::Null => "object",
                        JsValue::Boolean(_) => "boolean",
                        JsValue::Number(_) => "number",
                        JsValue::String(_) => "string",
                    }
                    .to_string(),
                ))),
                _ => None,
            },
            Ast::Binary { op, left, right, .. } => match op {
                // Short-circuit forms only need the left side.
                BinaryOp::And => node_to_value(map, *left).map(|v| {
                    Fold::Child(if v.to_boolean() { *right } else { *left })
                }),
                BinaryOp::Or => node_to_value(map, *left).map(|v| {
                    Fold::Child(if v.to_boolean() { *left } else { *right })
                }),
                BinaryOp::Coalesce => node_to_value(map, *left).map(|v| match v {
                    JsValue::Null | JsValue::Undefined => Fold::Child(*right),
                    _ => Fold::Child(*left),
                }),
                _ => match (node_to_value(map, *left), node_to_value(map, *right)) {
                    (Some(l), Some(r)) => fold_binary(*op, &l, &r).map(Fold::Value),
                    _ => None,
                },
            },
            Ast::Conditional {
                test,
                consequent,
                alternate,
                ..
            } => node_to_value(map, *test).map(|v| {
                Fold::Child(if v.to_boolean() { *consequent } else { *alternate })
            }),
            _ => None,
        };
        match fold {
            None => {}
            Some(Fold::Value(value)) => {
                *map[node].ast_mut() = value_to_ast(&value);
                self.changed = true;
            }
            Some(Fold::Child(child)) => {
                let ast = map[child].replace_ast(Ast::EmptyStatement {});
                *map[node].ast_mut() = ast;
                self.changed = true;
            }
        };
    }
}

pub fn fold_constants(map: &mut NodeMap, root: NodeId) -> bool {
    let mut pass = FoldPass { changed: false };
    pass.visit(map, root);
    pass.changed
}

/// Substitutes configured constants for free names and dotted paths
/// (`DEBUG`, `process.env.NODE_ENV`); runs once before compression.
pub fn apply_global_defines(map: &mut NodeMap, root: NodeId, defines: &GlobalDefines) -> () {
    if defines.is_empty() {
        return;
    };
    struct DefinePass<'a> {
        defines: &'a GlobalDefines,
    }
    fn dotted_path(map: &NodeMap, node: NodeId) -> Option<String> {
        match map[node].ast() {
            Ast::Symbol { name } => Some(name.text().to_string()),
            Ast::Dot {
                object,
                property,
                optional: false,
                ..
            } => Some(format!("{}.{}", dotted_path(map, *object)?, property.text())),
            _ => None,
        }
    }
    impl<'a> Visitor for DefinePass<'a> {
        fn on_node_down(
            &mut self,
            map: &mut NodeMap,
            node: NodeId,
            ctl: &mut JourneyControls,
        ) -> () {
            match map[node].ast() {
                Ast::Symbol { .. } | Ast::Dot { .. } => {
                    if let Some(path) = dotted_path(map, node) {
                        if let Some(value) = self.defines.get(&path) {
                            *map[node].ast_mut() = value_to_ast(value);
                            ctl.stop_descending();
                        };
                    };
                }
                _ => {}
            };
        }
    }
    DefinePass { defines }.visit(map, root);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_concat() {
        let v = fold_binary(
            BinaryOp::Add,
            &JsValue::String("a".to_string()),
            &JsValue::Number(JsNumber(1.0)),
        )
        .unwrap();
        assert_eq!(v, JsValue::String("a1".to_string()));
    }

    #[test]
    fn test_fold_arithmetic() {
        let v = fold_binary(
            BinaryOp::Mul,
            &JsValue::Number(JsNumber(6.0)),
            &JsValue::Number(JsNumber(7.0)),
        )
        .unwrap();
        assert_eq!(v, JsValue::Number(JsNumber(42.0)));
    }

    #[test]
    fn test_nan_not_strictly_equal() {
        let nan = JsValue::Number(JsNumber(f64::NAN));
        assert_eq!(
            fold_binary(BinaryOp::StrictEq, &nan, &nan),
            Some(JsValue::Boolean(false))
        );
    }
}
