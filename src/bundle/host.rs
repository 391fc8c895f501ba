use ahash::AHashMap;

/// Services the linker consumes from its embedder: file content, module
/// resolution, output naming, the runtime prelude, and the output sink.
pub trait BundleHost {
    /// Returns the source text, or None if the module does not exist.
    fn read_content(&self, name: &str) -> Option<String>;

    /// Verbatim prelude files emitted before the module code of a bundle.
    fn get_plain_js_dependencies(&self, _name: &str) -> Vec<String> {
        Vec::new()
    }

    /// Canonicalizes a require specifier relative to the requiring file,
    /// adding `.js` when no extension is present and preserving `.json`.
    fn resolve_require(&self, spec: &str, from_file: &str) -> String {
        let mut segments: Vec<&str> = Vec::new();
        if spec.starts_with("./") || spec.starts_with("../") {
            for seg in from_file.split('/') {
                segments.push(seg);
            }
            segments.pop();
        };
        for seg in spec.split('/') {
            match seg {
                "." => {}
                ".." => {
                    segments.pop();
                }
                seg => segments.push(seg),
            };
        }
        let joined = segments.join("/");
        if joined.ends_with(".js") || joined.ends_with(".json") {
            joined
        } else {
            format!("{}.js", joined)
        }
    }

    fn generate_bundle_name(&self, logical_name: &str) -> String {
        format!("{}.js", logical_name)
    }

    /// The runtime prelude for a bundle; defines `__import` when the split
    /// contains surviving lazy imports.
    fn js_headers(&self, _split_name: &str, needs_import: bool) -> String {
        if needs_import {
            "\"use strict\";\n".to_string() + RUNTIME_IMPORT_SHIM + "\n"
        } else {
            "\"use strict\";\n".to_string()
        }
    }

    fn write_bundle(&mut self, name: &str, content: &str) -> ();
}

/// The `__import(split, prop)` trampoline baked into bundles that lazy-load:
/// loading a split registers its exported namespaces under `__bundles`, and
/// `__import` resolves to the requested one. A host serving browsers replaces
/// the script loader with its own.
pub const RUNTIME_IMPORT_SHIM: &str = concat!(
    "var __bundles={};",
    "function __import(split,prop){",
    "return(split==null?Promise.resolve():__loadScript(split))",
    ".then(function(){return __bundles[prop]})",
    "}"
);

/// An in-memory host over a name -> content map. Bundler output is collected
/// into `outputs`.
pub struct MemoryHost {
    files: AHashMap<String, String>,
    pub outputs: AHashMap<String, String>,
}

impl MemoryHost {
    pub fn new() -> MemoryHost {
        MemoryHost {
            files: AHashMap::new(),
            outputs: AHashMap::new(),
        }
    }

    pub fn add_file(&mut self, name: &str, content: &str) -> () {
        self.files.insert(name.to_string(), content.to_string());
    }
}

impl BundleHost for MemoryHost {
    fn read_content(&self, name: &str) -> Option<String> {
        self.files.get(name).cloned()
    }

    fn write_bundle(&mut self, name: &str, content: &str) -> () {
        self.outputs.insert(name.to_string(), content.to_string());
    }
}
