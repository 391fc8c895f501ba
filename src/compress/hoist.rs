use crate::ast::{Ast, DeclKind, NodeId, NodeMap};
use crate::operator::AssignOp;
use crate::source::Span;
use crate::symbol::ScopeMap;
use crate::visit::{child_nodes, JourneyControls, Visitor};

/// Collects `var` declaration statements lexically inside `node` (not
/// crossing into nested closures) whose defs all bind plain names.
fn collect_var_decls(map: &NodeMap, node: NodeId, out: &mut Vec<NodeId>) -> () {
    match map[node].ast() {
        Ast::Function { .. } | Ast::Arrow { .. } | Ast::Method { .. } | Ast::Class { .. } => {
            return
        }
        Ast::Declaration {
            kind: DeclKind::Var,
            defs,
        } => {
            let simple = defs.iter().all(|&def| match map[def].ast() {
                Ast::VarDef { name, .. } => matches!(map[*name].ast(), Ast::Binding { .. }),
                _ => false,
            });
            if simple {
                out.push(node);
            };
            return;
        }
        _ => {}
    };
    for child in child_nodes(map, node) {
        collect_var_decls(map, child, out);
    }
}

struct HoistPass<'a> {
    #[allow(dead_code)]
    scopes: &'a ScopeMap,
    changed: bool,
}

impl<'a> HoistPass<'a> {
    fn hoist_into(&mut self, map: &mut NodeMap, block: NodeId) -> () {
        let body: Vec<NodeId> = match map[block].ast() {
            Ast::Block { body } => body.clone(),
            _ => return,
        };
        // Var statements already forming an initializer-free prefix are in
        // hoisted position; touching them would prevent a fixed point.
        let mut prefix = 0;
        for &stmt in &body {
            let bare_var = match map[stmt].ast() {
                Ast::Declaration {
                    kind: DeclKind::Var,
                    defs,
                } => defs.iter().all(|&def| {
                    matches!(map[def].ast(), Ast::VarDef { value: None, .. })
                }),
                _ => false,
            };
            if !bare_var {
                break;
            };
            prefix += 1;
        }
        let mut decls = Vec::new();
        collect_var_decls(map, block, &mut decls);
        let hoistable: Vec<NodeId> = decls
            .into_iter()
            .filter(|stmt| !body[..prefix].iter().any(|p| p.id() == stmt.id()))
            .collect();
        if hoistable.is_empty() {
            return;
        };
        let scope = map[body[0]].scope();
        // Gather names in declaration order; rewrite each statement into its
        // initializing assignments, or nothing.
        let mut names: Vec<Span> = Vec::new();
        for &stmt in &hoistable {
            let defs: Vec<(Span, Option<NodeId>)> = match map[stmt].ast() {
                Ast::Declaration { defs, .. } => defs
                    .iter()
                    .map(|&def| match map[def].ast() {
                        Ast::VarDef { name, value } => {
                            let spelled = match map[*name].ast() {
                                Ast::Binding { name } => name.clone(),
                                _ => unreachable!(),
                            };
                            (spelled, *value)
                        }
                        _ => unreachable!(),
                    })
                    .collect(),
                _ => unreachable!(),
            };
            let mut assigns: Vec<NodeId> = Vec::new();
            for (spelled, value) in defs {
                if !names.contains(&spelled) {
                    names.push(spelled.clone());
                };
                if let Some(value) = value {
                    let target = map.add(scope, spelled.clone(), Ast::Symbol {
                        name: spelled.clone(),
                    });
                    let span = spelled.to(map[value].span());
                    assigns.push(map.add(scope, span, Ast::Assign {
                        op: AssignOp::Assign,
                        target,
                        value,
                        grouped: false,
                    }));
                };
            }
            let replacement = match assigns.len() {
                0 => Ast::EmptyStatement {},
                1 => Ast::SimpleStatement { expr: assigns[0] },
                _ => {
                    let span = map[assigns[0]].span().to(map[*assigns.last().unwrap()].span());
                    let seq = map.add(scope, span, Ast::Sequence {
                        exprs: assigns,
                        grouped: false,
                    });
                    Ast::SimpleStatement { expr: seq }
                }
            };
            *map[stmt].ast_mut() = replacement;
        }
        // One `var a,b,c;` at the top of the body declares everything that
        // moved.
        let defs: Vec<NodeId> = names
            .iter()
            .map(|spelled| {
                let binding = map.add(scope, spelled.clone(), Ast::Binding {
                    name: spelled.clone(),
                });
                map.add(scope, spelled.clone(), Ast::VarDef {
                    name: binding,
                    value: None,
                })
            })
            .collect();
        let span = map[block].span().clone();
        let decl = map.add(scope, span, Ast::Declaration {
            kind: DeclKind::Var,
            defs,
        });
        match map[block].ast_mut() {
            Ast::Block { body } => body.insert(prefix, decl),
            _ => unreachable!(),
        };
        self.changed = true;
    }
}

impl<'a> Visitor for HoistPass<'a> {
    fn on_node_down(&mut self, map: &mut NodeMap, node: NodeId, _ctl: &mut JourneyControls) -> () {
        // Only function bodies hoist; blocks and loops inside them are
        // sources, not targets.
        let body = match map[node].ast() {
            Ast::Function { body, .. } | Ast::Method { body, .. } => *body,
            Ast::Arrow { body, .. } => match map[*body].ast() {
                Ast::Block { .. } => *body,
                _ => return,
            },
            _ => return,
        };
        let nonempty = matches!(map[body].ast(), Ast::Block { body } if !body.is_empty());
        if nonempty {
            self.hoist_into(map, body);
        };
    }
}

pub fn hoist_variables(map: &mut NodeMap, scopes: &ScopeMap, root: NodeId) -> bool {
    let mut pass = HoistPass {
        scopes,
        changed: false,
    };
    pass.visit(map, root);
    pass.changed
}
