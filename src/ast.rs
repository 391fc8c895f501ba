use std::fmt::{self, Debug, Formatter};
use std::ops::{Index, IndexMut};

use crate::error::{ErrorKind, ParseError};
use crate::num::JsNumber;
use crate::operator::{AssignOp, BinaryOp, PostfixOp, UnaryOp};
use crate::source::Span;
use crate::symbol::ScopeId;

// Readability aliases; all children are arena handles.
pub type Expr = NodeId;
pub type Stmt = NodeId;
pub type Target = NodeId;

/// The AST is a closed sum type held in an arena; every child handle is
/// exclusively owned by its parent, and back-edges (symbol occurrence to
/// definition) live outside the tree as integer handles.
#[derive(Debug)]
pub enum Ast {
    // ----- Atoms -----
    Number {
        value: JsNumber,
    },
    Str {
        value: String,
    },
    // Pattern and flags are the node's span; the expression is never
    // compiled.
    Regex {},
    Bool {
        value: bool,
    },
    Null {},
    Undefined {},
    This {},
    Super {},

    // ----- Names -----
    // A variable occurrence. Its definition, once resolved, is reachable
    // through the analysis table (absent for free globals).
    Symbol {
        name: Span,
    },
    // A name in defining position: variable, parameter, catch binding,
    // import alias, function or class name.
    Binding {
        name: Span,
    },

    // ----- Destructuring targets -----
    ArrayTarget {
        // A `None` item is a hole.
        items: Vec<Option<Target>>,
        rest: Option<Target>,
    },
    ObjectTarget {
        // TargetProp handles.
        props: Vec<NodeId>,
        // Must be a plain Binding.
        rest: Option<Target>,
    },
    TargetProp {
        key: PropKey,
        // None is shorthand: the key doubles as the bound name.
        target: Option<Target>,
    },
    // `target = value` inside a destructuring pattern or parameter list.
    WithDefault {
        target: Target,
        value: Expr,
    },
    Param {
        rest: bool,
        target: Target,
    },

    // ----- Expressions -----
    UnaryPrefix {
        op: UnaryOp,
        operand: Expr,
        grouped: bool,
    },
    UnaryPostfix {
        op: PostfixOp,
        operand: Expr,
        grouped: bool,
    },
    Binary {
        op: BinaryOp,
        left: Expr,
        right: Expr,
        grouped: bool,
    },
    Assign {
        op: AssignOp,
        target: NodeId,
        value: Expr,
        grouped: bool,
    },
    Conditional {
        test: Expr,
        consequent: Expr,
        alternate: Expr,
        grouped: bool,
    },
    // Always two or more expressions; the parser never builds a shorter one.
    Sequence {
        exprs: Vec<Expr>,
        grouped: bool,
    },
    Call {
        callee: Expr,
        // Expressions and Spread handles.
        args: Vec<NodeId>,
        optional: bool,
        grouped: bool,
    },
    New {
        callee: Expr,
        args: Vec<NodeId>,
    },
    // `object.property`; the property is a plain name, not a variable use.
    Dot {
        object: Expr,
        property: Span,
        optional: bool,
        grouped: bool,
    },
    // `object[index]`.
    Sub {
        object: Expr,
        index: Expr,
        optional: bool,
    },
    Array {
        // A `None` element is a hole; spreads appear as Spread handles.
        elements: Vec<Option<NodeId>>,
    },
    Object {
        // Property, Method, and Spread handles.
        props: Vec<NodeId>,
    },
    // One `key: value` entry of an object literal, or a class field when
    // `is_static`/class context applies. A `None` value is shorthand.
    Property {
        key: PropKey,
        value: Option<Expr>,
    },
    Field {
        is_static: bool,
        key: PropKey,
        value: Option<Expr>,
    },
    Method {
        is_static: bool,
        kind: MethodKind,
        key: PropKey,
        params: Vec<NodeId>,
        body: Stmt,
    },
    Arrow {
        is_async: bool,
        params: Vec<NodeId>,
        // Block statement or bare expression.
        body: NodeId,
    },
    Function {
        grouped: bool,
        is_async: bool,
        generator: bool,
        // Absent only for expressions and default exports.
        name: Option<NodeId>,
        params: Vec<NodeId>,
        body: Stmt,
    },
    Class {
        grouped: bool,
        name: Option<NodeId>,
        parent: Option<Expr>,
        // Field and Method handles.
        members: Vec<NodeId>,
    },
    TemplateString {
        parts: Vec<TemplatePart>,
    },
    Await {
        operand: Expr,
    },
    Yield {
        operand: Option<Expr>,
        delegated: bool,
    },
    Spread {
        operand: Expr,
    },
    // Lazy `import("module")`. The module must be a literal string, which is
    // what lets the linker map it onto a split.
    ImportExpression {
        module: String,
    },

    // ----- Statements -----
    Block {
        body: Vec<Stmt>,
    },
    EmptyStatement {},
    SimpleStatement {
        expr: Expr,
    },
    If {
        test: Expr,
        consequent: Stmt,
        alternate: Option<Stmt>,
    },
    While {
        test: Expr,
        body: Stmt,
    },
    Do {
        body: Stmt,
        test: Expr,
    },
    // Any of the three header fields may be absent independently; the init
    // is a Declaration or a bare expression.
    For {
        init: Option<NodeId>,
        condition: Option<Expr>,
        update: Option<Expr>,
        body: Stmt,
    },
    // The target is a single-def Declaration without initializer, or any
    // assignment target.
    ForIn {
        target: NodeId,
        object: Expr,
        body: Stmt,
    },
    ForOf {
        target: NodeId,
        iterable: Expr,
        body: Stmt,
    },
    Switch {
        discriminant: Expr,
        // Case handles; a `default` clause is a Case without a test.
        cases: Vec<NodeId>,
    },
    Case {
        test: Option<Expr>,
        body: Vec<Stmt>,
    },
    Try {
        block: Stmt,
        catch: Option<NodeId>,
        finally: Option<Stmt>,
    },
    Catch {
        param: Option<Target>,
        body: Stmt,
    },
    Throw {
        value: Expr,
    },
    Return {
        value: Option<Expr>,
    },
    Break {
        label: Option<Span>,
    },
    Continue {
        label: Option<Span>,
    },
    Labeled {
        label: Span,
        body: Stmt,
    },
    With {
        object: Expr,
        body: Stmt,
    },
    Debugger {},
    Declaration {
        kind: DeclKind,
        // VarDef handles.
        defs: Vec<NodeId>,
    },
    // One declarator: a target and an optional initializer.
    VarDef {
        name: Target,
        value: Option<Expr>,
    },

    // ----- Module -----
    Import {
        source: String,
        default: Option<NodeId>,
        // NameMapping handles; a `*` mapping is the whole namespace.
        mappings: Vec<NodeId>,
    },
    Export {
        source: Option<String>,
        // A declaration statement, or the exported expression for
        // `export default <expr>`.
        decl: Option<NodeId>,
        mappings: Vec<NodeId>,
        is_default: bool,
    },
    // `foreign` is the name on the outside (`*` for the whole namespace);
    // `local` is the name on this side: a Binding for imports, a Symbol for
    // exports, or absent when both sides coincide. For `* as ns`, `local`
    // carries the alias.
    NameMapping {
        foreign: Span,
        local: Option<NodeId>,
    },

    // ----- Root -----
    Toplevel {
        body: Vec<Stmt>,
    },
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

impl DeclKind {
    pub fn text(self) -> &'static str {
        match self {
            DeclKind::Var => "var",
            DeclKind::Let => "let",
            DeclKind::Const => "const",
        }
    }
}

/// A property name: a spelled-out word/string/number, or a computed
/// expression.
#[derive(Clone, Debug)]
pub enum PropKey {
    Direct(Span),
    Computed(Expr),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum MethodKind {
    Plain { is_async: bool, generator: bool },
    Get,
    Set,
}

#[derive(Debug)]
pub enum TemplatePart {
    Chunk(Span),
    Expr(NodeId),
}

pub struct NodeData {
    span: Span,
    ast: Ast,
    // The scope a node belongs to is the scope it is *used* from: the scope
    // opened by a function or block is recorded on the children inside it,
    // never on the opening node itself.
    scope: ScopeId,
}

impl NodeData {
    pub fn new(scope: ScopeId, span: Span, ast: Ast) -> NodeData {
        NodeData { span, ast, scope }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn ast_mut(&mut self) -> &mut Ast {
        &mut self.ast
    }

    pub fn replace_ast(&mut self, ast: Ast) -> Ast {
        std::mem::replace(&mut self.ast, ast)
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn error(&self, kind: ErrorKind) -> ParseError {
        ParseError::at_span(kind, &self.span, None)
    }
}

impl Debug for NodeData {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.ast, f)
    }
}

// Deliberately not Eq: two nodes can hold equal syntax yet be different
// places in the tree.
#[derive(Copy, Clone, Debug)]
pub struct NodeId(usize);

impl NodeId {
    pub fn id(&self) -> usize {
        self.0
    }
}

/// The node arena. Handles are indices; nothing is ever freed, orphaned
/// nodes are simply unreachable from the root.
pub struct NodeMap {
    nodes: Vec<NodeData>,
}

impl NodeMap {
    pub fn new() -> NodeMap {
        NodeMap { nodes: Vec::new() }
    }

    pub fn add(&mut self, scope: ScopeId, span: Span, ast: Ast) -> NodeId {
        self.nodes.push(NodeData::new(scope, span, ast));
        NodeId(self.nodes.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

impl Index<NodeId> for NodeMap {
    type Output = NodeData;

    fn index(&self, index: NodeId) -> &Self::Output {
        &self.nodes[index.0]
    }
}

impl IndexMut<NodeId> for NodeMap {
    fn index_mut(&mut self, index: NodeId) -> &mut Self::Output {
        &mut self.nodes[index.0]
    }
}
