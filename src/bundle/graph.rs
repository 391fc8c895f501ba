use ahash::AHashMap;

use crate::ast::{Ast, DeclKind, NodeId, NodeMap};
use crate::coerce::JsValue;
use crate::compress::{apply_global_defines, compress, node_to_value, CompressOptions, GlobalDefines};
use crate::lex::Lexer;
use crate::operator::AssignOp;
use crate::parse::parser::Parser;
use crate::parse::toplevel::{parse_source, SourceKind};
use crate::resolve::{analyse_scopes, ScopeAnalysis};
use crate::source::Span;
use crate::symbol::{ScopeId, ScopeMap, SymbolId, SymbolKind};
use crate::visit::{JourneyControls, Visitor};

use super::host::BundleHost;
use super::BundleError;

/// Linking state of a file; transitions are monotonic and phases are full
/// passes over the fileset.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum FileState {
    Parsed,
    Analyzed,
    ExportsComputed,
    WholeExportSynthesized,
    Rewritten,
    Emitted,
}

/// One exported binding of a module.
#[derive(Debug, Clone)]
pub enum ExportBinding {
    // A module-scope variable of this file.
    Symbol(SymbolId),
    // A constant; references inline at use sites.
    Literal(JsValue),
    // Re-exported from another module; `name == "*"` is the whole namespace.
    Foreign { from: String, name: String },
}

/// What an imported local name stands for.
#[derive(Debug, Clone)]
pub enum ImportBinding {
    Whole { file: String },
    Named { file: String, foreign: String },
}

pub struct SourceFile {
    pub name: String,
    pub state: FileState,
    pub map: NodeMap,
    pub scopes: ScopeMap,
    pub analysis: ScopeAnalysis,
    pub root: NodeId,
    pub module_scope: ScopeId,
    // Resolved names of eagerly required modules, first-seen order.
    pub requires: Vec<String>,
    // Resolved names of `import()` targets.
    pub lazy_requires: Vec<String>,
    // Literal module text of each `import()` -> resolved name.
    pub lazy_specs: AHashMap<String, String>,
    // Resolved sources of `export * from`.
    pub reexports_all: Vec<String>,
    pub exports: AHashMap<String, ExportBinding>,
    pub export_order: Vec<String>,
    // Module-scope symbol id -> what it imports.
    pub import_bindings: AHashMap<usize, ImportBinding>,
    // `require(...)` call nodes outside def initializers; rewritten to the
    // target's namespace object.
    pub inline_requires: AHashMap<usize, String>,
    // `require(...)` calls that are exactly a def initializer, keyed by the
    // initializer node.
    pub def_requires: AHashMap<usize, String>,
    pub plain_js_dependencies: Vec<String>,
    pub split: usize,
    pub whole_export: Option<SymbolId>,
    pub needs_whole_export: bool,
}

impl SourceFile {
    /// A spelling of this file usable as an identifier fragment.
    pub fn ident(&self) -> String {
        let stem = self.name.trim_end_matches(".js").trim_end_matches(".json");
        stem.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect::<String>()
            .trim_matches('_')
            .to_string()
    }

    pub fn module_symbol(&self, name: &str) -> Option<SymbolId> {
        self.scopes[self.module_scope].lookup_here(&Span::synthetic(name))
    }
}

/// True when the node is `require("...")` with `require` free.
fn as_require_call(map: &NodeMap, analysis: &ScopeAnalysis, node: NodeId) -> Option<String> {
    let (callee, args) = match map[node].ast() {
        Ast::Call {
            callee,
            args,
            optional: false,
            ..
        } => (*callee, args),
        _ => return None,
    };
    match map[callee].ast() {
        Ast::Symbol { name } if name == "require" && analysis.thedef(callee).is_none() => {}
        _ => return None,
    };
    match args.as_slice() {
        [only] => match map[*only].ast() {
            Ast::Str { value } => Some(value.clone()),
            _ => None,
        },
        _ => None,
    }
}

struct EdgeCollector<'a> {
    analysis: &'a ScopeAnalysis,
    host: &'a dyn BundleHost,
    file_name: &'a str,
    requires: Vec<String>,
    lazy_requires: Vec<String>,
    lazy_specs: AHashMap<String, String>,
    inline_requires: AHashMap<usize, String>,
    def_requires: AHashMap<usize, String>,
}

impl<'a> EdgeCollector<'a> {
    fn add_require(&mut self, resolved: String) -> () {
        if !self.requires.contains(&resolved) {
            self.requires.push(resolved);
        };
    }
}

impl<'a> Visitor for EdgeCollector<'a> {
    fn on_node_down(&mut self, map: &mut NodeMap, node: NodeId, _ctl: &mut JourneyControls) -> () {
        match map[node].ast() {
            Ast::ImportExpression { module } => {
                let resolved = self.host.resolve_require(module, self.file_name);
                self.lazy_specs.insert(module.clone(), resolved.clone());
                if !self.lazy_requires.contains(&resolved) {
                    self.lazy_requires.push(resolved);
                };
            }
            // Def initializers are noted first so the Call arm below skips
            // them; a VarDef is visited before its children.
            Ast::VarDef {
                value: Some(value), ..
            } => {
                if let Some(spec) = as_require_call(map, self.analysis, *value) {
                    let resolved = self.host.resolve_require(&spec, self.file_name);
                    self.add_require(resolved.clone());
                    self.def_requires.insert(value.id(), resolved);
                };
            }
            Ast::Call { .. } => {
                if self.def_requires.contains_key(&node.id()) {
                    return;
                };
                if let Some(spec) = as_require_call(map, self.analysis, node) {
                    let resolved = self.host.resolve_require(&spec, self.file_name);
                    self.add_require(resolved.clone());
                    self.inline_requires.insert(node.id(), resolved);
                };
            }
            _ => {}
        };
    }
}

fn root_body(map: &NodeMap, root: NodeId) -> Vec<NodeId> {
    match map[root].ast() {
        Ast::Toplevel { body } => body.clone(),
        _ => unreachable!(),
    }
}

/// Parses, optionally compresses, analyses, and extracts the module shape of
/// one file.
pub fn load_source_file(
    host: &dyn BundleHost,
    name: &str,
    defines: &GlobalDefines,
    compress_options: Option<&CompressOptions>,
) -> Result<SourceFile, BundleError> {
    let content = host
        .read_content(name)
        .ok_or_else(|| BundleError::CannotFindModule {
            resolved: name.to_string(),
        })?;
    let mut parser = Parser::new(Lexer::new(content.into_bytes()));
    let parsed =
        parse_source(&mut parser, SourceKind::Module).map_err(|error| BundleError::Syntax {
            file: name.to_string(),
            error,
        })?;
    let (mut map, mut scopes) = parser.take();

    apply_global_defines(&mut map, parsed.root, defines);
    if let Some(options) = compress_options {
        compress(&mut map, &scopes, parsed.root, options).map_err(BundleError::Compress)?;
    };
    let analysis = analyse_scopes(&mut map, &mut scopes, parsed.root);

    let mut file = SourceFile {
        name: name.to_string(),
        state: FileState::Parsed,
        map,
        scopes,
        analysis,
        root: parsed.root,
        module_scope: parsed.scope,
        requires: Vec::new(),
        lazy_requires: Vec::new(),
        lazy_specs: AHashMap::new(),
        reexports_all: Vec::new(),
        exports: AHashMap::new(),
        export_order: Vec::new(),
        import_bindings: AHashMap::new(),
        inline_requires: AHashMap::new(),
        def_requires: AHashMap::new(),
        plain_js_dependencies: host.get_plain_js_dependencies(name),
        split: 0,
        whole_export: None,
        needs_whole_export: false,
    };

    collect_edges(host, &mut file);
    file.state = FileState::Analyzed;
    compute_exports(host, &mut file);
    file.state = FileState::ExportsComputed;
    Ok(file)
}

fn collect_edges(host: &dyn BundleHost, file: &mut SourceFile) -> () {
    // Import statements are hoisted require edges with named bindings.
    let body = root_body(&file.map, file.root);
    let mut requires: Vec<String> = Vec::new();
    let mut records: Vec<(String, ImportBinding)> = Vec::new();
    for &stmt in &body {
        if let Ast::Import {
            source,
            default,
            mappings,
        } = file.map[stmt].ast()
        {
            let resolved = host.resolve_require(source, &file.name);
            if !requires.contains(&resolved) {
                requires.push(resolved.clone());
            };
            if let Some(default) = default {
                if let Ast::Binding { name } = file.map[*default].ast() {
                    records.push((name.text().to_string(), ImportBinding::Named {
                        file: resolved.clone(),
                        foreign: "default".to_string(),
                    }));
                };
            };
            for &mapping in mappings {
                if let Ast::NameMapping { foreign, local } = file.map[mapping].ast() {
                    let local_name = local.and_then(|local| match file.map[local].ast() {
                        Ast::Binding { name } => Some(name.text().to_string()),
                        _ => None,
                    });
                    let local_name = match local_name {
                        Some(local_name) => local_name,
                        None => continue,
                    };
                    let binding = if foreign == "*" {
                        ImportBinding::Whole {
                            file: resolved.clone(),
                        }
                    } else {
                        ImportBinding::Named {
                            file: resolved.clone(),
                            foreign: foreign.text().to_string(),
                        }
                    };
                    records.push((local_name, binding));
                };
            }
        };
    }
    for (local, binding) in records {
        if let Some(symbol) = file.module_symbol(&local) {
            file.import_bindings.insert(symbol.id(), binding);
        };
    }

    let mut collector = EdgeCollector {
        analysis: &file.analysis,
        host,
        file_name: &file.name,
        requires,
        lazy_requires: Vec::new(),
        lazy_specs: AHashMap::new(),
        inline_requires: AHashMap::new(),
        def_requires: AHashMap::new(),
    };
    collector.visit(&mut file.map, file.root);
    let EdgeCollector {
        requires,
        lazy_requires,
        lazy_specs,
        inline_requires,
        def_requires,
        ..
    } = collector;

    // A def whose initializer is `require(...)` binds the whole namespace.
    let mut namespace_bindings: Vec<(String, String)> = Vec::new();
    for &stmt in &body {
        if let Ast::Declaration { defs, .. } = file.map[stmt].ast() {
            for &def in defs {
                if let Ast::VarDef {
                    name,
                    value: Some(value),
                } = file.map[def].ast()
                {
                    if let Some(target) = def_requires.get(&value.id()) {
                        if let Ast::Binding { name } = file.map[*name].ast() {
                            namespace_bindings.push((name.text().to_string(), target.clone()));
                        };
                    };
                };
            }
        };
    }
    for (local, target) in namespace_bindings {
        if let Some(symbol) = file.module_symbol(&local) {
            file.import_bindings
                .insert(symbol.id(), ImportBinding::Whole { file: target });
        };
    }

    file.requires = requires;
    file.lazy_requires = lazy_requires;
    file.lazy_specs = lazy_specs;
    file.inline_requires = inline_requires;
    file.def_requires = def_requires;
}

enum ExportAction {
    ReexportAll {
        from: String,
    },
    Bindings {
        from: Option<String>,
        // (exported name, binding)
        bindings: Vec<(String, ExportBinding)>,
    },
    Value {
        stmt: NodeId,
        value: NodeId,
        exported: String,
    },
    DeclNames {
        names: Vec<String>,
        default: bool,
    },
}

/// Collects the module's self-exports and initial exports map, rewriting
/// export statements whose value has no name into fresh module variables.
fn compute_exports(host: &dyn BundleHost, file: &mut SourceFile) -> () {
    let body = root_body(&file.map, file.root);
    let mut actions: Vec<ExportAction> = Vec::new();
    for stmt in body {
        match file.map[stmt].ast() {
            Ast::Export {
                source,
                decl,
                mappings,
                is_default,
            } => {
                let resolved = source
                    .as_ref()
                    .map(|source| host.resolve_require(source, &file.name));
                if let Some(decl) = decl {
                    match file.map[*decl].ast() {
                        Ast::Declaration { .. } | Ast::Function { .. } | Ast::Class { .. } => {
                            actions.push(ExportAction::DeclNames {
                                names: declared_names(&file.map, *decl),
                                default: *is_default,
                            });
                        }
                        // `export default <expr>`.
                        _ => actions.push(ExportAction::Value {
                            stmt,
                            value: *decl,
                            exported: "default".to_string(),
                        }),
                    };
                    continue;
                };
                let mut bindings = Vec::new();
                for &mapping in mappings {
                    let (foreign, local) = match file.map[mapping].ast() {
                        Ast::NameMapping { foreign, local } => (foreign.clone(), *local),
                        _ => continue,
                    };
                    if foreign == "*" {
                        match (local, &resolved) {
                            (None, Some(from)) => {
                                actions.push(ExportAction::ReexportAll { from: from.clone() })
                            }
                            (Some(alias), Some(from)) => {
                                if let Ast::Binding { name } = file.map[alias].ast() {
                                    bindings.push((
                                        name.text().to_string(),
                                        ExportBinding::Foreign {
                                            from: from.clone(),
                                            name: "*".to_string(),
                                        },
                                    ));
                                };
                            }
                            _ => {}
                        };
                        continue;
                    };
                    let local_name = local
                        .and_then(|local| match file.map[local].ast() {
                            Ast::Symbol { name } => Some(name.text().to_string()),
                            _ => None,
                        })
                        .unwrap_or_else(|| foreign.text().to_string());
                    let binding = match &resolved {
                        Some(from) => ExportBinding::Foreign {
                            from: from.clone(),
                            name: local_name,
                        },
                        // Resolved against the module scope when applied.
                        None => ExportBinding::Foreign {
                            from: String::new(),
                            name: local_name,
                        },
                    };
                    bindings.push((foreign.text().to_string(), binding));
                }
                actions.push(ExportAction::Bindings {
                    from: resolved,
                    bindings,
                });
            }
            Ast::SimpleStatement { expr } => {
                // CommonJS-style `exports.k = v;`.
                let found = match file.map[*expr].ast() {
                    Ast::Assign {
                        op: AssignOp::Assign,
                        target,
                        value,
                        ..
                    } => match file.map[*target].ast() {
                        Ast::Dot {
                            object,
                            property,
                            optional: false,
                            ..
                        } => match file.map[*object].ast() {
                            Ast::Symbol { name }
                                if name == "exports"
                                    && file.analysis.thedef(*object).is_none() =>
                            {
                                Some((property.text().to_string(), *value))
                            }
                            _ => None,
                        },
                        _ => None,
                    },
                    _ => None,
                };
                if let Some((exported, value)) = found {
                    actions.push(ExportAction::Value {
                        stmt,
                        value,
                        exported,
                    });
                };
            }
            _ => {}
        };
    }

    for action in actions {
        match action {
            ExportAction::ReexportAll { from } => {
                if !file.requires.contains(&from) {
                    file.requires.push(from.clone());
                };
                file.reexports_all.push(from);
            }
            ExportAction::Bindings { from, bindings } => {
                if let Some(from) = from {
                    if !file.requires.contains(&from) {
                        file.requires.push(from);
                    };
                };
                for (exported, binding) in bindings {
                    let binding = match binding {
                        ExportBinding::Foreign { from, name } if from.is_empty() => {
                            // A plain `export { local as exported }`.
                            match file.module_symbol(&name) {
                                Some(symbol) => ExportBinding::Symbol(symbol),
                                None => continue,
                            }
                        }
                        other => other,
                    };
                    add_export(file, exported, binding);
                }
            }
            ExportAction::DeclNames { names, default } => {
                for name in names {
                    if let Some(symbol) = file.module_symbol(&name) {
                        // `export default function f() {}` exports under
                        // `default`; `f` stays an ordinary module symbol.
                        let exported = if default {
                            "default".to_string()
                        } else {
                            name
                        };
                        add_export(file, exported, ExportBinding::Symbol(symbol));
                    };
                }
            }
            ExportAction::Value {
                stmt,
                value,
                exported,
            } => export_value(file, stmt, value, exported),
        };
    }
}

fn declared_names(map: &NodeMap, decl: NodeId) -> Vec<String> {
    match map[decl].ast() {
        Ast::Declaration { defs, .. } => defs
            .iter()
            .filter_map(|&def| match map[def].ast() {
                Ast::VarDef { name, .. } => match map[*name].ast() {
                    Ast::Binding { name } => Some(name.text().to_string()),
                    _ => None,
                },
                _ => None,
            })
            .collect(),
        Ast::Function {
            name: Some(name), ..
        }
        | Ast::Class {
            name: Some(name), ..
        } => match map[*name].ast() {
            Ast::Binding { name } => vec![name.text().to_string()],
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn add_export(file: &mut SourceFile, name: String, binding: ExportBinding) -> () {
    if !file.exports.contains_key(&name) {
        file.export_order.push(name.clone());
    };
    file.exports.insert(name, binding);
}

enum ExportedValue {
    Literal(JsValue),
    Named(Span),
    Other,
}

/// Records one exported value: constants inline, named locals alias their
/// symbol, and anything else becomes a fresh module variable replacing the
/// exporting statement.
fn export_value(file: &mut SourceFile, stmt: NodeId, value: NodeId, exported: String) -> () {
    let kind = match file.map[value].ast() {
        Ast::Bool { .. } | Ast::Null {} | Ast::Number { .. } | Ast::Str { .. }
        | Ast::Undefined {} => ExportedValue::Literal(node_to_value(&file.map, value).unwrap()),
        Ast::Symbol { name } => ExportedValue::Named(name.clone()),
        _ => ExportedValue::Other,
    };
    match kind {
        ExportedValue::Literal(literal) => {
            *file.map[stmt].ast_mut() = Ast::EmptyStatement {};
            add_export(file, exported, ExportBinding::Literal(literal));
        }
        ExportedValue::Named(name) => {
            if let Some(symbol) = file.scopes.lookup(file.module_scope, &name) {
                *file.map[stmt].ast_mut() = Ast::EmptyStatement {};
                add_export(file, exported, ExportBinding::Symbol(symbol));
            };
        }
        ExportedValue::Other => {
            // `var __export_value_<file>_<name> = <value>;`
            let spelled = Span::synthetic(format!(
                "__export_value_{}_{}",
                file.ident(),
                exported.replace(|c: char| !c.is_ascii_alphanumeric(), "_")
            ));
            let scope = file.module_scope;
            let binding = file.map.add(scope, spelled.clone(), Ast::Binding {
                name: spelled.clone(),
            });
            let symbol = match file
                .scopes
                .declare(scope, spelled.clone(), binding, SymbolKind::Linker)
            {
                Ok(Some(symbol)) => symbol,
                _ => return,
            };
            let value_span = file.map[value].span().clone();
            let def = file.map.add(scope, value_span, Ast::VarDef {
                name: binding,
                value: Some(value),
            });
            *file.map[stmt].ast_mut() = Ast::Declaration {
                kind: DeclKind::Var,
                defs: vec![def],
            };
            add_export(file, exported, ExportBinding::Symbol(symbol));
        }
    };
}

/// Loads every module reachable from the entries.
pub fn discover_files(
    host: &dyn BundleHost,
    entries: &[String],
    defines: &GlobalDefines,
    compress_options: Option<&CompressOptions>,
) -> Result<(Vec<SourceFile>, AHashMap<String, usize>), BundleError> {
    let mut files: Vec<SourceFile> = Vec::new();
    let mut index: AHashMap<String, usize> = AHashMap::new();
    let mut queue: Vec<String> = entries.to_vec();
    while let Some(name) = queue.pop() {
        if index.contains_key(&name) {
            continue;
        };
        let file = load_source_file(host, &name, defines, compress_options)?;
        for dep in file.requires.iter().chain(file.lazy_requires.iter()) {
            if !index.contains_key(dep) {
                queue.push(dep.clone());
            };
        }
        index.insert(name.clone(), files.len());
        files.push(file);
    }
    Ok((files, index))
}
