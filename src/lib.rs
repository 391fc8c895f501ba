use std::fmt::{self, Display, Formatter};
use std::io::{self, Write};

pub mod ast;
pub mod bundle;
pub mod coerce;
pub mod compress;
pub mod emit;
pub mod error;
pub mod lex;
pub mod num;
pub mod operator;
pub mod parse;
pub mod resolve;
pub mod source;
pub mod symbol;
pub mod token;
pub mod visit;

use ast::{NodeId, NodeMap};
use compress::{CompressError, CompressOptions};
use error::ParseError;
use lex::Lexer;
use parse::parser::Parser;
use parse::toplevel::parse_source;
use resolve::{analyse_scopes, ScopeAnalysis};
use symbol::{ScopeId, ScopeMap};

pub use bundle::{bundle, BundleError, BundleHost, BundleOptions, SplitDefinition};
pub use parse::toplevel::SourceKind;

#[derive(Debug)]
pub enum ToolError {
    Parse(ParseError),
    Compress(CompressError),
    Bundle(BundleError),
    Io(io::Error),
}

impl Display for ToolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::Parse(error) => write!(f, "parse error: {}", error),
            ToolError::Compress(error) => Display::fmt(error, f),
            ToolError::Bundle(error) => Display::fmt(error, f),
            ToolError::Io(error) => write!(f, "io error: {}", error),
        }
    }
}

impl std::error::Error for ToolError {}

/// A parsed, scope-analysed source: the node arena, the scope/symbol arena,
/// the resolved back-edges, and the root handles.
pub struct Parsed {
    pub nodes: NodeMap,
    pub scopes: ScopeMap,
    pub analysis: ScopeAnalysis,
    pub root: NodeId,
    pub root_scope: ScopeId,
}

/// Parses UTF-8 JavaScript text into an AST with resolved scopes.
pub fn parse(source: Vec<u8>, kind: SourceKind) -> Result<Parsed, ParseError> {
    let mut parser = Parser::new(Lexer::new(source));
    let parsed = parse_source(&mut parser, kind)?;
    let (mut nodes, mut scopes) = parser.take();
    let analysis = analyse_scopes(&mut nodes, &mut scopes, parsed.root);
    Ok(Parsed {
        nodes,
        scopes,
        analysis,
        root: parsed.root,
        root_scope: parsed.scope,
    })
}

/// Prints a parsed tree back to JavaScript; custom transforms may run on the
/// arena in between.
pub fn emit_to<T: Write>(parsed: &Parsed, output: &mut T) -> Result<(), ToolError> {
    emit::emit_js(output, &parsed.nodes, parsed.root).map_err(ToolError::Io)
}

/// Parses, compresses, and emits one source in isolation.
///
/// # Examples
///
/// ```
/// use bundle_js::{minify, SourceKind};
/// use bundle_js::compress::CompressOptions;
///
/// let code: &[u8] = b"if (false) { sideEffect(); } else { main(); }";
/// let mut out = Vec::new();
/// minify(
///     SourceKind::Script,
///     code.to_vec(),
///     Some(&CompressOptions::default()),
///     &mut out,
/// )
/// .unwrap();
/// assert_eq!(out.as_slice(), b"main();");
/// ```
pub fn minify<T: Write>(
    kind: SourceKind,
    source: Vec<u8>,
    options: Option<&CompressOptions>,
    output: &mut T,
) -> Result<(), ToolError> {
    let mut parsed = parse(source, kind).map_err(ToolError::Parse)?;
    if let Some(options) = options {
        compress::compress(&mut parsed.nodes, &parsed.scopes, parsed.root, options)
            .map_err(ToolError::Compress)?;
    };
    emit_to(&parsed, output)
}
