use ahash::{AHashMap, AHashSet};

use crate::ast::{Ast, DeclKind, NodeId, NodeMap, PropKey};
use crate::coerce::JsValue;
use crate::compress::value_to_ast;
use crate::emit::emit_stmts;
use crate::resolve::ScopeAnalysis;
use crate::source::Span;
use crate::symbol::{SymbolId, SymbolKind};
use crate::visit::{JourneyControls, Visitor};

use super::graph::{discover_files, ExportBinding, FileState, ImportBinding, SourceFile};
use super::host::BundleHost;
use super::{BundleError, BundleOptions};

/// One planned output bundle.
pub struct SplitInfo {
    pub name: String,
    pub main: bool,
    // Property under which this split's primary namespace is requested.
    pub prop_name: String,
    pub entries: Vec<String>,
    // Resolved file name -> export property, for every namespace another
    // split may request from this one via `import()`.
    pub exports_used: AHashMap<String, String>,
    // Transitively required splits a consumer must load before this one.
    pub forced_lazy: Vec<usize>,
    pub needs_import: bool,
}

pub fn run(host: &mut dyn BundleHost, options: &BundleOptions) -> Result<(), BundleError> {
    if options.parts.is_empty() {
        return Err(BundleError::NoMainSplit);
    };
    // Phase 1: discovery.
    let entries: Vec<String> = options
        .parts
        .iter()
        .flat_map(|part| part.entry_files.iter())
        .map(|entry| host.resolve_require(entry, ""))
        .collect();
    let (mut files, index) = discover_files(
        &*host,
        &entries,
        &options.global_defines,
        options.compress.as_ref(),
    )?;

    // Phase 2: split assignment.
    let mut splits = assign_splits(host, &mut files, &index, options);
    mark_whole_exports(&mut files, &index);

    // Phase 3: export materialization.
    let whole_objects = synthesize_whole_exports(&mut files);

    // Phase 4: renames, then per-file rewriting.
    install_root_variables(&mut files, options.mangle);
    let whole_names: Vec<Option<String>> = files
        .iter()
        .map(|file| {
            file.whole_export
                .map(|symbol| file.scopes[symbol].bound_name().to_string())
        })
        .collect();
    let tables = build_export_tables(&files, &index, &whole_names);
    plan_lazy_imports(&mut splits, &files, &index, &whole_names);
    for f in 0..files.len() {
        fill_whole_export(&mut files[f], whole_objects[f], &tables[f]);
    }
    for f in 0..files.len() {
        rewrite_file(f, &mut files, &index, &splits, &tables, &whole_names);
        files[f].state = FileState::Rewritten;
    }

    // Phase 5: emission.
    emit_bundles(host, &mut files, &index, &splits, options)
}

fn assign_splits(
    host: &dyn BundleHost,
    files: &mut Vec<SourceFile>,
    index: &AHashMap<String, usize>,
    options: &BundleOptions,
) -> Vec<SplitInfo> {
    let mut splits: Vec<SplitInfo> = options
        .parts
        .iter()
        .enumerate()
        .map(|(i, part)| SplitInfo {
            name: part.name.clone(),
            main: i == 0,
            prop_name: String::new(),
            entries: part
                .entry_files
                .iter()
                .map(|entry| host.resolve_require(entry, ""))
                .collect(),
            exports_used: AHashMap::new(),
            forced_lazy: Vec::new(),
            needs_import: false,
        })
        .collect();

    // A lazy-import target not covered by a declared split opens its own,
    // named after the file.
    let lazy_targets: Vec<String> = files
        .iter()
        .flat_map(|file| file.lazy_requires.iter().cloned())
        .collect();
    for target in lazy_targets {
        let covered = splits.iter().any(|split| split.entries.contains(&target));
        if !covered {
            let name = match index.get(&target) {
                Some(&f) => files[f].ident(),
                None => continue,
            };
            splits.push(SplitInfo {
                name,
                main: false,
                prop_name: String::new(),
                entries: vec![target],
                exports_used: AHashMap::new(),
                forced_lazy: Vec::new(),
                needs_import: false,
            });
        };
    }

    // Declared entries claim their split first; reachability expands each
    // split without crossing into files another split owns.
    const UNASSIGNED: usize = usize::MAX;
    for file in files.iter_mut() {
        file.split = UNASSIGNED;
    }
    for s in 0..splits.len() {
        for entry in splits[s].entries.clone() {
            if let Some(&f) = index.get(&entry) {
                if files[f].split == UNASSIGNED {
                    files[f].split = s;
                };
            };
        }
    }
    for s in 0..splits.len() {
        let mut visited: AHashSet<usize> = AHashSet::new();
        let mut queue: Vec<usize> = splits[s]
            .entries
            .iter()
            .filter_map(|entry| index.get(entry).copied())
            .collect();
        while let Some(f) = queue.pop() {
            if !visited.insert(f) {
                continue;
            };
            if files[f].split == UNASSIGNED {
                files[f].split = s;
            };
            if files[f].split != s {
                continue;
            };
            for dep in &files[f].requires {
                if let Some(&d) = index.get(dep) {
                    queue.push(d);
                };
            }
        }
    }
    for file in files.iter_mut() {
        if file.split == UNASSIGNED {
            file.split = 0;
        };
    }

    // forced_lazy: transitive closure of the lazy splits a split's files
    // eagerly require.
    let mut direct: Vec<AHashSet<usize>> = vec![AHashSet::new(); splits.len()];
    for file in files.iter() {
        for dep in &file.requires {
            if let Some(&d) = index.get(dep) {
                let target = files[d].split;
                if target != file.split && !splits[target].main {
                    direct[file.split].insert(target);
                };
            };
        }
    }
    for s in 0..splits.len() {
        let mut closure: AHashSet<usize> = AHashSet::new();
        let mut queue: Vec<usize> = direct[s].iter().copied().collect();
        while let Some(t) = queue.pop() {
            if t == s || !closure.insert(t) {
                continue;
            };
            queue.extend(direct[t].iter().copied());
        }
        let mut ordered: Vec<usize> = closure.into_iter().collect();
        ordered.sort();
        splits[s].forced_lazy = ordered;
    }
    splits
}

/// Collects, per file, the nodes that are the object of a plain member
/// access: a namespace binding used only that way never needs the namespace
/// object itself.
struct MemberObjectScanner {
    member_objects: AHashSet<usize>,
}

impl Visitor for MemberObjectScanner {
    fn on_node_down(&mut self, map: &mut NodeMap, node: NodeId, _ctl: &mut JourneyControls) -> () {
        if let Ast::Dot {
            object,
            optional: false,
            ..
        } = map[node].ast()
        {
            match map[*object].ast() {
                Ast::Symbol { .. } | Ast::Call { .. } => {
                    self.member_objects.insert(object.id());
                }
                _ => {}
            };
        };
    }
}

fn mark_whole_exports(files: &mut Vec<SourceFile>, index: &AHashMap<String, usize>) -> () {
    let mut marked: AHashSet<usize> = AHashSet::new();
    for f in 0..files.len() {
        let mut scanner = MemberObjectScanner {
            member_objects: AHashSet::new(),
        };
        {
            let file = &mut files[f];
            scanner.visit(&mut file.map, file.root);
        }
        let file = &files[f];
        // A namespace binding forces the namespace object only when some use
        // is not a member access rewritable to a direct reference.
        for (&symbol_id, binding) in &file.import_bindings {
            if let ImportBinding::Whole { file: target } = binding {
                let symbol = SymbolId::from_id(symbol_id);
                let bare_use = file.scopes[symbol]
                    .references()
                    .iter()
                    .any(|r| !scanner.member_objects.contains(&r.id()));
                if bare_use {
                    if let Some(&t) = index.get(target) {
                        marked.insert(t);
                    };
                };
            };
        }
        // Lazy targets are always requested as a namespace.
        for target in &file.lazy_requires {
            if let Some(&t) = index.get(target) {
                marked.insert(t);
            };
        }
        // An inline `require(...)` is the namespace value itself, unless it
        // is immediately a member access.
        for (node, target) in &file.inline_requires {
            if !scanner.member_objects.contains(node) {
                if let Some(&t) = index.get(target) {
                    marked.insert(t);
                };
            };
        }
        // `export * as ns from` hands out the source's namespace.
        for binding in file.exports.values() {
            if let ExportBinding::Foreign { from, name } = binding {
                if name == "*" {
                    if let Some(&t) = index.get(from) {
                        marked.insert(t);
                    };
                };
            };
        }
        // Cross-split eager requires go through the namespace object, which
        // multi-script loading exposes on the shared global scope.
        for dep in &file.requires {
            if let Some(&t) = index.get(dep) {
                if files[t].split != file.split {
                    marked.insert(t);
                };
            };
        }
    }
    for t in marked {
        files[t].needs_whole_export = true;
    }
}

/// Phase 3: appends `var __export_<ident> = {}` to every file whose whole
/// namespace is requested. Members fill in after renaming, when final names
/// are known.
fn synthesize_whole_exports(files: &mut Vec<SourceFile>) -> Vec<Option<NodeId>> {
    let mut objects: Vec<Option<NodeId>> = Vec::with_capacity(files.len());
    for file in files.iter_mut() {
        if !file.needs_whole_export {
            file.state = FileState::WholeExportSynthesized;
            objects.push(None);
            continue;
        };
        let mut spelled = format!("__export_{}", file.ident());
        let mut tries = 0;
        while file.module_symbol(&spelled).is_some() {
            tries += 1;
            spelled = format!("__export_{}{}", file.ident(), tries);
        }
        let spelled = Span::synthetic(spelled);
        let scope = file.module_scope;
        let binding = file.map.add(scope, spelled.clone(), Ast::Binding {
            name: spelled.clone(),
        });
        let symbol = match file
            .scopes
            .declare(scope, spelled.clone(), binding, SymbolKind::Linker)
        {
            Ok(Some(symbol)) => symbol,
            _ => unreachable!(),
        };
        let object = file
            .map
            .add(scope, spelled.clone(), Ast::Object { props: Vec::new() });
        let def = file.map.add(scope, spelled.clone(), Ast::VarDef {
            name: binding,
            value: Some(object),
        });
        let decl = file.map.add(scope, spelled, Ast::Declaration {
            kind: DeclKind::Var,
            defs: vec![def],
        });
        match file.map[file.root].ast_mut() {
            Ast::Toplevel { body } => body.push(decl),
            _ => unreachable!(),
        };
        file.whole_export = Some(symbol);
        file.state = FileState::WholeExportSynthesized;
        objects.push(Some(object));
    }
    objects
}

fn is_reserved_word(name: &str) -> bool {
    // The emitter would otherwise print a keyword in binding position.
    matches!(
        name,
        "break" | "case" | "catch" | "class" | "const" | "continue" | "debugger" | "default"
            | "delete" | "do" | "else" | "export" | "extends" | "false" | "finally" | "for"
            | "function" | "if" | "import" | "in" | "instanceof" | "let" | "new" | "null"
            | "return" | "super" | "switch" | "this" | "throw" | "true" | "try" | "typeof"
            | "undefined" | "var" | "void" | "while" | "with" | "yield" | "await" | "static"
            | "async" | "of" | "as" | "from" | "get" | "set"
    )
}

/// Short-name generator for mangling: a..z, A..Z, aa, ab, ...
struct NameGenerator {
    next: usize,
}

impl NameGenerator {
    const ALPHABET: &'static [u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

    fn new() -> NameGenerator {
        NameGenerator { next: 0 }
    }

    fn generate(&mut self) -> String {
        let mut i = self.next;
        self.next += 1;
        let n = Self::ALPHABET.len();
        let mut out = Vec::new();
        loop {
            out.push(Self::ALPHABET[i % n]);
            i /= n;
            if i == 0 {
                break;
            };
            i -= 1;
        }
        out.reverse();
        String::from_utf8(out).unwrap()
    }
}

fn rewrite_name_node(map: &mut NodeMap, node: NodeId, new_name: &Span) -> () {
    enum Fix {
        Plain,
        TargetShorthand,
        PropertyShorthand,
    }
    let fix = match map[node].ast() {
        Ast::Symbol { .. } | Ast::Binding { .. } => Fix::Plain,
        Ast::TargetProp { target: None, .. } => Fix::TargetShorthand,
        Ast::Property { value: None, .. } => Fix::PropertyShorthand,
        _ => return,
    };
    match fix {
        Fix::Plain => match map[node].ast_mut() {
            Ast::Symbol { name } | Ast::Binding { name } => *name = new_name.clone(),
            _ => unreachable!(),
        },
        // `{ a } = v` keeps its key but binds the renamed variable:
        // `{ a: a_x } = v`.
        Fix::TargetShorthand => {
            let scope = map[node].scope();
            let binding = map.add(scope, new_name.clone(), Ast::Binding {
                name: new_name.clone(),
            });
            match map[node].ast_mut() {
                Ast::TargetProp { target, .. } => *target = Some(binding),
                _ => unreachable!(),
            };
        }
        // `{ a }` expands to `{ a: a_x }`.
        Fix::PropertyShorthand => {
            let scope = map[node].scope();
            let value = map.add(scope, new_name.clone(), Ast::Symbol {
                name: new_name.clone(),
            });
            match map[node].ast_mut() {
                Ast::Property { value: slot, .. } => *slot = Some(value),
                _ => unreachable!(),
            };
        }
    };
}

fn rename_symbol(file: &mut SourceFile, symbol: SymbolId, new_name: &str) -> () {
    let old = file.scopes[symbol].name().clone();
    let spelled = Span::synthetic(new_name);
    let mut nodes: Vec<NodeId> = file.scopes[symbol].references().to_vec();
    nodes.push(file.scopes[symbol].declarator());
    for node in nodes {
        rewrite_name_node(&mut file.map, node, &spelled);
    }
    file.scopes[symbol].set_output_name(new_name.to_string());
    let module = file.module_scope;
    file.scopes[module].rebind(&old, spelled, symbol);
}

/// Phase 4a: installs every file's module-scope symbols into the shared root
/// scope. On a collision the previously installed symbol is renamed, never
/// the newly arrived one; afterwards every in-use root name maps to exactly
/// one symbol.
fn install_root_variables(files: &mut Vec<SourceFile>, mangle: bool) -> () {
    // Free globals and runtime names must never be shadowed by a rename.
    let mut taken: AHashSet<String> = AHashSet::new();
    taken.insert("__import".to_string());
    taken.insert("__bundles".to_string());
    for file in files.iter_mut() {
        let mut collector = FreeNameCollector {
            analysis: &file.analysis,
            names: AHashSet::new(),
        };
        collector.visit(&mut file.map, file.root);
        taken.extend(collector.names);
    }
    for file in files.iter() {
        for name in file.scopes[file.module_scope].names() {
            taken.insert(name.text().to_string());
        }
    }

    let mut root: AHashMap<String, (usize, SymbolId)> = AHashMap::new();
    let mut generator = NameGenerator::new();
    for f in 0..files.len() {
        let names: Vec<Span> = files[f].scopes[files[f].module_scope].names().to_vec();
        for name in names {
            let symbol = match files[f].scopes[files[f].module_scope].lookup_here(&name) {
                Some(symbol) => symbol,
                None => continue,
            };
            let spelled = name.text().to_string();
            if mangle {
                let mut short = generator.generate();
                while taken.contains(&short) || is_reserved_word(&short) || root.contains_key(&short)
                {
                    short = generator.generate();
                }
                rename_symbol(&mut files[f], symbol, &short);
                root.insert(short, (f, symbol));
            } else if let Some(&(prev_file, prev_symbol)) = root.get(&spelled) {
                let unique = pick_unique_name(&spelled, &files[prev_file].ident(), &taken, &root);
                rename_symbol(&mut files[prev_file], prev_symbol, &unique);
                taken.insert(unique.clone());
                root.insert(unique, (prev_file, prev_symbol));
                root.insert(spelled, (f, symbol));
            } else {
                root.insert(spelled, (f, symbol));
            };
        }
    }
}

fn pick_unique_name(
    base: &str,
    suffix: &str,
    taken: &AHashSet<String>,
    root: &AHashMap<String, (usize, SymbolId)>,
) -> String {
    let mut candidate = format!("{}_{}", base, suffix);
    let mut tries = 0;
    while taken.contains(&candidate) || root.contains_key(&candidate) || is_reserved_word(&candidate)
    {
        tries += 1;
        candidate = format!("{}_{}{}", base, suffix, tries);
    }
    candidate
}

struct FreeNameCollector<'a> {
    analysis: &'a ScopeAnalysis,
    names: AHashSet<String>,
}

impl<'a> Visitor for FreeNameCollector<'a> {
    fn on_node_down(&mut self, map: &mut NodeMap, node: NodeId, _ctl: &mut JourneyControls) -> () {
        if let Ast::Symbol { name } = map[node].ast() {
            if self.analysis.thedef(node).is_none() {
                self.names.insert(name.text().to_string());
            };
        };
    }
}

/// Where a cross-module reference lands after linking.
#[derive(Clone, Debug)]
pub enum RewriteTarget {
    Name(String),
    Literal(JsValue),
    Missing,
}

fn resolve_export(
    files: &Vec<SourceFile>,
    index: &AHashMap<String, usize>,
    whole_names: &Vec<Option<String>>,
    f: usize,
    name: &str,
    visited: &mut AHashSet<(usize, String)>,
) -> RewriteTarget {
    if !visited.insert((f, name.to_string())) {
        return RewriteTarget::Missing;
    };
    match files[f].exports.get(name) {
        Some(ExportBinding::Symbol(symbol)) => {
            RewriteTarget::Name(files[f].scopes[*symbol].bound_name().to_string())
        }
        Some(ExportBinding::Literal(value)) => RewriteTarget::Literal(value.clone()),
        Some(ExportBinding::Foreign { from, name: foreign }) => match index.get(from) {
            None => RewriteTarget::Missing,
            Some(&t) if foreign == "*" => match &whole_names[t] {
                Some(whole) => RewriteTarget::Name(whole.clone()),
                None => RewriteTarget::Missing,
            },
            Some(&t) => resolve_export(files, index, whole_names, t, foreign, visited),
        },
        None => {
            for from in &files[f].reexports_all {
                if let Some(&t) = index.get(from) {
                    match resolve_export(files, index, whole_names, t, name, visited) {
                        RewriteTarget::Missing => {}
                        found => return found,
                    };
                };
            }
            RewriteTarget::Missing
        }
    }
}

/// The names a file exports, including those pulled in by `export * from`.
fn export_names(
    files: &Vec<SourceFile>,
    index: &AHashMap<String, usize>,
    f: usize,
    visited: &mut AHashSet<usize>,
) -> Vec<String> {
    if !visited.insert(f) {
        return Vec::new();
    };
    let mut names: Vec<String> = files[f].export_order.clone();
    for from in &files[f].reexports_all {
        if let Some(&t) = index.get(from) {
            for name in export_names(files, index, t, visited) {
                if !names.contains(&name) {
                    names.push(name);
                };
            }
        };
    }
    names
}

fn build_export_tables(
    files: &Vec<SourceFile>,
    index: &AHashMap<String, usize>,
    whole_names: &Vec<Option<String>>,
) -> Vec<AHashMap<String, RewriteTarget>> {
    let mut tables = Vec::with_capacity(files.len());
    for f in 0..files.len() {
        let mut table = AHashMap::new();
        for name in export_names(files, index, f, &mut AHashSet::new()) {
            let target = resolve_export(files, index, whole_names, f, &name, &mut AHashSet::new());
            table.insert(name, target);
        }
        tables.push(table);
    }
    tables
}

/// Records which namespaces each split must expose for `import()` requests
/// and which splits must define `__import`.
fn plan_lazy_imports(
    splits: &mut Vec<SplitInfo>,
    files: &Vec<SourceFile>,
    index: &AHashMap<String, usize>,
    whole_names: &Vec<Option<String>>,
) -> () {
    for file in files.iter() {
        for target in &file.lazy_requires {
            let t = match index.get(target) {
                Some(&t) => t,
                None => continue,
            };
            let prop = match &whole_names[t] {
                Some(prop) => prop.clone(),
                None => continue,
            };
            let target_split = files[t].split;
            splits[target_split]
                .exports_used
                .insert(target.clone(), prop.clone());
            if splits[target_split].prop_name.is_empty() {
                splits[target_split].prop_name = prop;
            };
            // The requesting split calls __import; the providing split (and
            // everything it forces) registers namespaces.
            splits[file.split].needs_import = true;
            splits[target_split].needs_import = true;
        }
    }
    // Forced splits load through their own prop.
    let forced: Vec<usize> = splits
        .iter()
        .flat_map(|split| split.forced_lazy.iter().copied())
        .collect();
    for t in forced {
        if splits[t].prop_name.is_empty() {
            let prop = splits[t]
                .entries
                .first()
                .and_then(|entry| index.get(entry))
                .and_then(|&f| whole_names[f].clone());
            if let Some(prop) = prop {
                let entry = splits[t].entries[0].clone();
                splits[t].exports_used.insert(entry, prop.clone());
                splits[t].prop_name = prop;
                splits[t].needs_import = true;
            };
        };
    }
}

/// Fills a synthesized namespace object with one member per export, now that
/// final names are known.
fn fill_whole_export(
    file: &mut SourceFile,
    object: Option<NodeId>,
    table: &AHashMap<String, RewriteTarget>,
) -> () {
    let object = match object {
        Some(object) => object,
        None => return,
    };
    let mut names: Vec<&String> = table.keys().collect();
    names.sort();
    let mut props: Vec<NodeId> = Vec::new();
    for name in names {
        let value_ast = match &table[name] {
            RewriteTarget::Name(bound) => Ast::Symbol {
                name: Span::synthetic(bound.clone()),
            },
            RewriteTarget::Literal(value) => value_to_ast(value),
            RewriteTarget::Missing => Ast::Undefined {},
        };
        let scope = file.map[object].scope();
        let key = Span::synthetic(name.clone());
        let value = file.map.add(scope, key.clone(), value_ast);
        props.push(file.map.add(scope, key.clone(), Ast::Property {
            key: PropKey::Direct(key),
            value: Some(value),
        }));
    }
    match file.map[object].ast_mut() {
        Ast::Object { props: slot } => *slot = props,
        _ => unreachable!(),
    };
}

struct RewriteData {
    // Module symbol id -> rewrite for bare uses of the binding.
    symbol_targets: AHashMap<usize, RewriteTarget>,
    // Module symbol id -> export table of the namespace it imports.
    namespace_tables: AHashMap<usize, AHashMap<String, RewriteTarget>>,
    // Inline `require(...)` call node -> namespace variable, when one exists.
    inline_requires: AHashMap<usize, Option<String>>,
    // Inline `require(...)` call node -> target's export table, for
    // `require("m").prop`.
    inline_require_tables: AHashMap<usize, AHashMap<String, RewriteTarget>>,
    // Def initializer node -> namespace variable, or None to drop the def.
    def_inits: AHashMap<usize, Option<String>>,
    // Lazy import literal module text -> planned trampoline.
    lazy_plans: AHashMap<String, LazyPlan>,
}

struct LazyPlan {
    // None for a main-split target: the first argument is literal undefined.
    split_name: Option<String>,
    prop: String,
    // (split name, prop) pairs to load first, outermost first.
    forced: Vec<(String, String)>,
}

struct RewriteVisitor<'a> {
    analysis: ScopeAnalysis,
    data: &'a RewriteData,
}

impl<'a> RewriteVisitor<'a> {
    fn target_to_ast(&self, target: &RewriteTarget) -> Ast {
        match target {
            RewriteTarget::Name(name) => Ast::Symbol {
                name: Span::synthetic(name.clone()),
            },
            RewriteTarget::Literal(value) => value_to_ast(value),
            RewriteTarget::Missing => Ast::Undefined {},
        }
    }

    fn build_import_call(
        &self,
        map: &mut NodeMap,
        scope: crate::symbol::ScopeId,
        split_name: Option<&str>,
        prop: &str,
    ) -> NodeId {
        let span = Span::synthetic("__import");
        let callee = map.add(scope, span.clone(), Ast::Symbol { name: span.clone() });
        let split_arg = match split_name {
            Some(name) => Ast::Str {
                value: name.to_string(),
            },
            None => Ast::Undefined {},
        };
        let split_arg = map.add(scope, span.clone(), split_arg);
        let prop_arg = map.add(scope, span.clone(), Ast::Str {
            value: prop.to_string(),
        });
        map.add(scope, span, Ast::Call {
            callee,
            args: vec![split_arg, prop_arg],
            optional: false,
            grouped: false,
        })
    }

    /// `__import("Y","propY").then(function(){return __import("X","propX")})`
    fn build_lazy_trampoline(
        &self,
        map: &mut NodeMap,
        scope: crate::symbol::ScopeId,
        plan: &LazyPlan,
    ) -> Ast {
        let mut inner = self.build_import_call(map, scope, plan.split_name.as_deref(), &plan.prop);
        // The innermost call is the final target, so forced splits wrap from
        // the last to the first.
        for (split_name, prop) in plan.forced.iter().rev() {
            let span = Span::synthetic("then");
            let ret = map.add(scope, span.clone(), Ast::Return { value: Some(inner) });
            let body = map.add(scope, span.clone(), Ast::Block { body: vec![ret] });
            let callback = map.add(scope, span.clone(), Ast::Function {
                grouped: false,
                is_async: false,
                generator: false,
                name: None,
                params: Vec::new(),
                body,
            });
            let loader = self.build_import_call(map, scope, Some(split_name), prop);
            let then = map.add(scope, span.clone(), Ast::Dot {
                object: loader,
                property: Span::synthetic("then"),
                optional: false,
                grouped: false,
            });
            inner = map.add(scope, span, Ast::Call {
                callee: then,
                args: vec![callback],
                optional: false,
                grouped: false,
            });
        }
        map[inner].replace_ast(Ast::EmptyStatement {})
    }

    fn rewrite_declaration(&mut self, map: &mut NodeMap, node: NodeId) -> () {
        let defs: Vec<(NodeId, Option<NodeId>)> = match map[node].ast() {
            Ast::Declaration { defs, .. } => defs
                .iter()
                .map(|&def| match map[def].ast() {
                    Ast::VarDef { value, .. } => (def, *value),
                    _ => (def, None),
                })
                .collect(),
            _ => return,
        };
        let mut keep: Vec<NodeId> = Vec::new();
        let mut rewrites: Vec<(NodeId, String)> = Vec::new();
        let mut dropped = false;
        for (def, value) in &defs {
            match value.and_then(|value| self.data.def_inits.get(&value.id())) {
                Some(Some(whole)) => {
                    rewrites.push((value.unwrap(), whole.clone()));
                    keep.push(*def);
                }
                Some(None) => dropped = true,
                None => keep.push(*def),
            };
        }
        for (value, whole) in rewrites {
            *map[value].ast_mut() = Ast::Symbol {
                name: Span::synthetic(whole),
            };
        }
        if dropped {
            if keep.is_empty() {
                *map[node].ast_mut() = Ast::EmptyStatement {};
            } else {
                match map[node].ast_mut() {
                    Ast::Declaration { defs, .. } => {
                        defs.retain(|def| keep.iter().any(|k| k.id() == def.id()));
                    }
                    _ => unreachable!(),
                };
            };
        };
    }
}

impl<'a> Visitor for RewriteVisitor<'a> {
    fn on_node_down(&mut self, map: &mut NodeMap, node: NodeId, ctl: &mut JourneyControls) -> () {
        enum Action {
            None,
            Empty,
            AdoptChild(NodeId),
            SetAst(Ast),
            Declaration,
            LazyImport(String),
        }
        let action = match map[node].ast() {
            Ast::Import { .. } => Action::Empty,
            Ast::Export { decl: Some(decl), .. } => Action::AdoptChild(*decl),
            Ast::Export { .. } => Action::Empty,
            // A bare `require("m")` statement only establishes the edge.
            Ast::SimpleStatement { expr }
                if self.data.inline_requires.contains_key(&expr.id()) =>
            {
                Action::Empty
            }
            Ast::Declaration { .. } => Action::Declaration,
            // `x.prop` on a namespace binding becomes a direct reference, as
            // does `require("m").prop`.
            Ast::Dot {
                object,
                property,
                optional: false,
                ..
            } => {
                let table = match self.analysis.thedef(*object) {
                    Some(symbol) => self.data.namespace_tables.get(&symbol.id()),
                    None => self.data.inline_require_tables.get(&object.id()),
                };
                match table {
                    Some(table) => {
                        let target = table
                            .get(property.text())
                            .cloned()
                            .unwrap_or(RewriteTarget::Missing);
                        Action::SetAst(self.target_to_ast(&target))
                    }
                    None => Action::None,
                }
            }
            Ast::Call { .. } => match self.data.inline_requires.get(&node.id()) {
                Some(Some(whole)) => Action::SetAst(Ast::Symbol {
                    name: Span::synthetic(whole.clone()),
                }),
                _ => Action::None,
            },
            Ast::Symbol { .. } => match self.analysis.thedef(node) {
                Some(symbol) => match self.data.symbol_targets.get(&symbol.id()) {
                    Some(target) => Action::SetAst(self.target_to_ast(target)),
                    None => Action::None,
                },
                None => Action::None,
            },
            Ast::ImportExpression { module } => Action::LazyImport(module.clone()),
            _ => Action::None,
        };
        match action {
            Action::None => {}
            Action::Empty => {
                *map[node].ast_mut() = Ast::EmptyStatement {};
                ctl.stop_descending();
            }
            Action::AdoptChild(child) => {
                // Descend into the adopted declaration so its initializers
                // rewrite too.
                let ast = map[child].replace_ast(Ast::EmptyStatement {});
                *map[node].ast_mut() = ast;
            }
            Action::SetAst(ast) => {
                *map[node].ast_mut() = ast;
                ctl.stop_descending();
            }
            Action::Declaration => self.rewrite_declaration(map, node),
            Action::LazyImport(module) => {
                if let Some(plan) = self.data.lazy_plans.get(&module) {
                    let scope = map[node].scope();
                    let ast = self.build_lazy_trampoline(map, scope, plan);
                    *map[node].ast_mut() = ast;
                    ctl.stop_descending();
                };
            }
        };
    }
}

fn rewrite_file(
    f: usize,
    files: &mut Vec<SourceFile>,
    index: &AHashMap<String, usize>,
    splits: &Vec<SplitInfo>,
    tables: &Vec<AHashMap<String, RewriteTarget>>,
    whole_names: &Vec<Option<String>>,
) -> () {
    // Precompute every lookup the rewrite needs so the visitor only holds
    // this file's tree.
    let mut data = RewriteData {
        symbol_targets: AHashMap::new(),
        namespace_tables: AHashMap::new(),
        inline_requires: AHashMap::new(),
        inline_require_tables: AHashMap::new(),
        def_inits: AHashMap::new(),
        lazy_plans: AHashMap::new(),
    };
    for (&symbol, binding) in &files[f].import_bindings {
        match binding {
            ImportBinding::Whole { file: target } => {
                if let Some(&t) = index.get(target) {
                    if let Some(whole) = &whole_names[t] {
                        data.symbol_targets
                            .insert(symbol, RewriteTarget::Name(whole.clone()));
                    };
                    data.namespace_tables.insert(symbol, tables[t].clone());
                };
            }
            ImportBinding::Named { file: target, foreign } => {
                if let Some(&t) = index.get(target) {
                    let target = tables[t]
                        .get(foreign)
                        .cloned()
                        .unwrap_or(RewriteTarget::Missing);
                    data.symbol_targets.insert(symbol, target);
                };
            }
        };
    }
    for (&node, target) in &files[f].inline_requires {
        if let Some(&t) = index.get(target) {
            data.inline_requires.insert(node, whole_names[t].clone());
            data.inline_require_tables.insert(node, tables[t].clone());
        };
    }
    for (&value, target) in &files[f].def_requires {
        if let Some(&t) = index.get(target) {
            let rewrite = if files[t].needs_whole_export {
                whole_names[t].clone()
            } else {
                None
            };
            data.def_inits.insert(value, rewrite);
        };
    }
    // Plans are keyed by the literal module text still in the tree.
    for (literal, target) in &files[f].lazy_specs {
        if let Some(&t) = index.get(target) {
            let target_split = files[t].split;
            let prop = match &whole_names[t] {
                Some(prop) => prop.clone(),
                None => continue,
            };
            let forced: Vec<(String, String)> = splits[target_split]
                .forced_lazy
                .iter()
                .map(|&s| (splits[s].name.clone(), splits[s].prop_name.clone()))
                .collect();
            data.lazy_plans.insert(literal.clone(), LazyPlan {
                split_name: if splits[target_split].main {
                    None
                } else {
                    Some(splits[target_split].name.clone())
                },
                prop,
                forced,
            });
        };
    }

    let file = &mut files[f];
    let analysis = std::mem::replace(&mut file.analysis, ScopeAnalysis::new());
    let mut visitor = RewriteVisitor {
        analysis,
        data: &data,
    };
    visitor.visit(&mut file.map, file.root);
    file.analysis = visitor.analysis;
}

fn emit_order(
    files: &Vec<SourceFile>,
    index: &AHashMap<String, usize>,
    split: usize,
    entries: &[String],
) -> Vec<usize> {
    let mut order: Vec<usize> = Vec::new();
    let mut visited: AHashSet<usize> = AHashSet::new();
    fn walk(
        files: &Vec<SourceFile>,
        index: &AHashMap<String, usize>,
        split: usize,
        f: usize,
        visited: &mut AHashSet<usize>,
        order: &mut Vec<usize>,
    ) -> () {
        if files[f].split != split || !visited.insert(f) {
            return;
        };
        for dep in &files[f].requires {
            if let Some(&d) = index.get(dep) {
                walk(files, index, split, d, visited, order);
            };
        }
        order.push(f);
    }
    for entry in entries {
        if let Some(&f) = index.get(entry) {
            walk(files, index, split, f, &mut visited, &mut order);
        };
    }
    // Stragglers assigned here but unreachable from the entries.
    for f in 0..files.len() {
        if files[f].split == split && !visited.contains(&f) {
            order.push(f);
        };
    }
    order
}

fn emit_bundles(
    host: &mut dyn BundleHost,
    files: &mut Vec<SourceFile>,
    index: &AHashMap<String, usize>,
    splits: &Vec<SplitInfo>,
    options: &BundleOptions,
) -> Result<(), BundleError> {
    // Registrations go into the split that owns the requested namespace.
    let mut registrations: Vec<Vec<(String, String)>> = vec![Vec::new(); splits.len()];
    for split in splits.iter() {
        for (target, prop) in &split.exports_used {
            if let Some(&t) = index.get(target) {
                let owner = files[t].split;
                let var = match files[t].whole_export {
                    Some(symbol) => files[t].scopes[symbol].bound_name().to_string(),
                    None => continue,
                };
                if !registrations[owner].iter().any(|(p, _)| p == prop) {
                    registrations[owner].push((prop.clone(), var));
                };
            };
        }
    }

    for (s, split) in splits.iter().enumerate() {
        let order = emit_order(files, index, s, &split.entries);
        if order.is_empty() {
            continue;
        };
        let mut content = String::new();
        let needs_import = split.needs_import || !registrations[s].is_empty();
        content.push_str(&host.js_headers(&split.name, needs_import));
        let mut seen_plain: AHashSet<String> = AHashSet::new();
        for &f in &order {
            for dep in &files[f].plain_js_dependencies {
                if seen_plain.insert(dep.clone()) {
                    if let Some(text) = host.read_content(dep) {
                        content.push_str(&text);
                        content.push('\n');
                    };
                };
            }
        }
        for &f in &order {
            let body: Vec<NodeId> = match files[f].map[files[f].root].ast() {
                Ast::Toplevel { body } => body.clone(),
                _ => unreachable!(),
            };
            let mut out = Vec::new();
            if options.output.beautify {
                for &stmt in &body {
                    let mut one = Vec::new();
                    emit_stmts(&mut one, &files[f].map, &[stmt]).expect("emitting to memory");
                    if !one.is_empty() {
                        out.extend_from_slice(&one);
                        out.push(b'\n');
                    };
                }
            } else {
                emit_stmts(&mut out, &files[f].map, &body).expect("emitting to memory");
            };
            let text = String::from_utf8(out).expect("emitted output is UTF-8");
            if !text.is_empty() {
                content.push_str(&text);
                if !content.ends_with('\n') {
                    content.push('\n');
                };
            };
            files[f].state = FileState::Emitted;
        }
        for (prop, var) in &registrations[s] {
            content.push_str(&format!("__bundles[\"{}\"]={};\n", prop, var));
        }
        let out_name = host.generate_bundle_name(&split.name);
        host.write_bundle(&out_name, &content);
    }
    Ok(())
}
