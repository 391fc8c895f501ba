use ahash::{AHashMap, AHashSet};

use crate::ast::{Ast, NodeId, NodeMap, PropKey};
use crate::operator::AssignOp;
use crate::symbol::{ScopeId, ScopeMap, SymbolId};
use crate::visit::{JourneyControls, Visitor};

/// The back-edge table from every resolved occurrence to its definition; an
/// absent entry means the name is a free global.
pub struct ScopeAnalysis {
    thedef: AHashMap<usize, SymbolId>,
}

impl ScopeAnalysis {
    pub fn new() -> ScopeAnalysis {
        ScopeAnalysis {
            thedef: AHashMap::new(),
        }
    }

    pub fn thedef(&self, node: NodeId) -> Option<SymbolId> {
        self.thedef.get(&node.id()).copied()
    }

    pub fn set_thedef(&mut self, node: NodeId, symbol: SymbolId) -> () {
        self.thedef.insert(node.id(), symbol);
    }
}

struct ResolvePass<'a> {
    scopes: &'a mut ScopeMap,
    analysis: ScopeAnalysis,
    // Occurrences that are the target of a plain `=`: written, never read.
    pure_writes: AHashSet<usize>,
    // Occurrences under a compound assignment or `++`/`--`: both.
    read_writes: AHashSet<usize>,
}

impl<'a> ResolvePass<'a> {
    /// Records one resolved occurrence: the back-edge, the reference list,
    /// and the enclosed set of every scope crossed on the way out.
    fn record(&mut self, node: NodeId, use_scope: ScopeId, symbol: SymbolId) -> () {
        self.analysis.set_thedef(node, symbol);
        self.scopes[symbol].add_reference(node);
        let home = self.scopes[symbol].scope();
        let mut cursor = Some(use_scope);
        while let Some(scope) = cursor {
            if scope == home {
                break;
            };
            self.scopes[scope].add_enclosed(symbol);
            cursor = self.scopes[scope].parent();
        }
    }

    fn resolve(&mut self, map: &NodeMap, node: NodeId, is_write: bool) -> () {
        let scope = map[node].scope();
        let name = match map[node].ast() {
            Ast::Symbol { name } => name.clone(),
            // Shorthand object-pattern props bind through their key.
            Ast::TargetProp {
                key: PropKey::Direct(name),
                target: None,
            } => name.clone(),
            // Shorthand object-literal props read through their key.
            Ast::Property {
                key: PropKey::Direct(name),
                value: None,
            } => name.clone(),
            _ => return,
        };
        let symbol = match self.scopes.lookup(scope, &name) {
            Some(symbol) => symbol,
            None => {
                // A free `eval` can observe everything in reach.
                if name == "eval" {
                    pin_chain(self.scopes, scope);
                };
                return;
            }
        };
        if self.scopes[symbol].declarator().id() == node.id() {
            // The declaration itself is not a reference.
            return;
        };
        self.record(node, scope, symbol);
        if self.read_writes.contains(&node.id()) {
            self.scopes[symbol].record_write();
            self.scopes[symbol].record_read();
        } else if is_write || self.pure_writes.contains(&node.id()) {
            self.scopes[symbol].record_write();
        } else {
            self.scopes[symbol].record_read();
        };
    }
}

fn pin_chain(scopes: &mut ScopeMap, scope: ScopeId) -> () {
    let mut cursor = Some(scope);
    while let Some(id) = cursor {
        scopes[id].pin();
        cursor = scopes[id].parent();
    }
}

impl<'a> Visitor for ResolvePass<'a> {
    fn on_node_down(&mut self, map: &mut NodeMap, node: NodeId, _ctl: &mut JourneyControls) -> () {
        match map[node].ast() {
            Ast::Assign { op, target, .. } => {
                if let Ast::Symbol { .. } = map[*target].ast() {
                    if *op == AssignOp::Assign {
                        self.pure_writes.insert(target.id());
                    } else {
                        self.read_writes.insert(target.id());
                    };
                };
            }
            Ast::UnaryPrefix { op, operand, .. } if op.writes_operand() => {
                if let Ast::Symbol { .. } = map[*operand].ast() {
                    self.read_writes.insert(operand.id());
                };
            }
            Ast::UnaryPostfix { operand, .. } => {
                if let Ast::Symbol { .. } = map[*operand].ast() {
                    self.read_writes.insert(operand.id());
                };
            }
            Ast::VarDef {
                name,
                value: Some(_),
            } => {
                // An initialized def writes its binding.
                if let Ast::Binding { name: spelled } = map[*name].ast() {
                    let scope = map[*name].scope();
                    if let Some(symbol) = self.scopes.lookup(scope, spelled) {
                        self.scopes[symbol].record_write();
                    };
                };
            }
            Ast::With { .. } => {
                // Nothing visible around a `with` can be proven unused.
                pin_chain(self.scopes, map[node].scope());
            }
            Ast::Symbol { .. } | Ast::Property { .. } => {
                self.resolve(map, node, false);
            }
            Ast::TargetProp { .. } => {
                self.resolve(map, node, true);
            }
            _ => {}
        };
    }
}

/// Resolves every occurrence to its definition, filling reference lists,
/// usage counters, and enclosed sets.
pub fn analyse_scopes(map: &mut NodeMap, scopes: &mut ScopeMap, root: NodeId) -> ScopeAnalysis {
    let mut pass = ResolvePass {
        scopes,
        analysis: ScopeAnalysis::new(),
        pure_writes: AHashSet::new(),
        read_writes: AHashSet::new(),
    };
    pass.visit(map, root);
    pass.analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::Lexer;
    use crate::parse::parser::Parser;
    use crate::parse::toplevel::{parse_source, SourceKind};
    use crate::visit::child_nodes;

    fn analyse(code: &str) -> (NodeMap, ScopeMap, ScopeAnalysis, NodeId) {
        let mut parser = Parser::new(Lexer::new(code.as_bytes().to_vec()));
        let parsed = parse_source(&mut parser, SourceKind::Module).unwrap();
        let (mut map, mut scopes) = parser.take();
        let analysis = analyse_scopes(&mut map, &mut scopes, parsed.root);
        (map, scopes, analysis, parsed.root)
    }

    fn symbols_named(map: &NodeMap, root: NodeId, name: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if let Ast::Symbol { name: spelled } = map[node].ast() {
                if spelled == name {
                    found.push(node);
                };
            };
            stack.extend(child_nodes(map, node));
        }
        found
    }

    #[test]
    fn test_scope_totality() {
        let (map, scopes, analysis, root) =
            analyse("let a = 1; function f(b) { return a + b + free; }");
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if let Ast::Symbol { name } = map[node].ast() {
                match analysis.thedef(node) {
                    // Either a free global...
                    None => assert_eq!(name.text(), "free"),
                    // ...or the reference list holds the node and the
                    // defining scope sits on the use scope's ancestor chain.
                    Some(symbol) => {
                        assert!(scopes[symbol]
                            .references()
                            .iter()
                            .any(|r| r.id() == node.id()));
                        let home = scopes[symbol].scope();
                        let mut cursor = Some(map[node].scope());
                        let mut onchain = false;
                        while let Some(scope) = cursor {
                            if scope == home {
                                onchain = true;
                                break;
                            };
                            cursor = scopes[scope].parent();
                        }
                        assert!(onchain);
                    }
                };
            };
            stack.extend(child_nodes(&map, node));
        }
    }

    #[test]
    fn test_enclosed_sets() {
        let (map, scopes, analysis, root) = analyse("let a = 1; let f = () => a;");
        let uses = symbols_named(&map, root, "a");
        assert_eq!(uses.len(), 1);
        let symbol = analysis.thedef(uses[0]).unwrap();
        let mut cursor = Some(map[uses[0]].scope());
        while let Some(scope) = cursor {
            if scope == scopes[symbol].scope() {
                break;
            };
            assert!(scopes[scope].enclosed().contains(&symbol));
            cursor = scopes[scope].parent();
        }
    }

    #[test]
    fn test_lexical_shadowing() {
        // The lambda sees the `a` declared after it in the same block.
        let (map, scopes, analysis, root) = analyse("let a = 1; { let fn = () => a; let a = 2; }");
        let uses = symbols_named(&map, root, "a");
        assert_eq!(uses.len(), 1);
        let symbol = analysis.thedef(uses[0]).unwrap();
        assert_ne!(scopes[symbol].scope().id(), map[root].scope().id());
    }

    #[test]
    fn test_read_write_counts() {
        let (_, scopes, _, _) = analyse("let a = 1; a = 2; a += 3; let b = a;");
        let mut checked = false;
        for symbol in scopes.symbol_ids().collect::<Vec<_>>() {
            if scopes[symbol].name() == "a" {
                assert_eq!(scopes[symbol].writes(), 3);
                assert_eq!(scopes[symbol].reads(), 2);
                checked = true;
            };
        }
        assert!(checked);
    }

    #[test]
    fn test_unreferenced_and_pinning() {
        let (_, scopes, _, _) = analyse("let unused = 1;");
        let symbol = scopes.symbol_ids().next().unwrap();
        assert!(scopes.unreferenced(symbol));

        let (_, scopes, _, _) = analyse("function f() { let unused = 1; eval('x'); }");
        for symbol in scopes.symbol_ids().collect::<Vec<_>>() {
            if scopes[symbol].name() == "unused" {
                assert!(!scopes.unreferenced(symbol));
            };
        }
    }
}
