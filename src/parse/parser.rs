use std::ops::{Index, IndexMut};

use crate::ast::{Ast, NodeData, NodeId, NodeMap};
use crate::error::{ErrorKind, PResult, ParseError};
use crate::lex::{next_token, LexState, Lexer, SlashGoal};
use crate::source::Span;
use crate::symbol::{Name, Scope, ScopeId, ScopeKind, ScopeMap, SymbolDef, SymbolId, SymbolKind};
use crate::token::{Tok, Token};

/// Whether `await`/`yield` currently read as plain names (outside async
/// functions / generators) or as operators.
#[derive(Copy, Clone)]
pub struct IdentRules {
    pub await_is_name: bool,
    pub yield_is_name: bool,
}

impl IdentRules {
    pub fn top() -> IdentRules {
        IdentRules {
            await_is_name: true,
            yield_is_name: true,
        }
    }

    /// True when the token can bind or reference a variable under these
    /// rules.
    pub fn allows_name(&self, tok: Tok) -> bool {
        match tok {
            Tok::Name | Tok::Undefined => true,
            t if t.is_contextual_word() => true,
            Tok::Await => self.await_is_name,
            Tok::Yield => self.yield_is_name,
            _ => false,
        }
    }
}

struct LabelEntry {
    name: Name,
    is_loop: bool,
}

/// Jump-statement context, fresh inside every function body so a
/// `break`/`continue` can never cross a closure boundary.
pub struct JumpContext {
    labels: Vec<LabelEntry>,
    loops: usize,
    switches: usize,
    in_function: bool,
}

impl JumpContext {
    fn fresh(in_function: bool) -> JumpContext {
        JumpContext {
            labels: Vec::new(),
            loops: 0,
            switches: 0,
            in_function,
        }
    }
}

struct Lookahead {
    token: Token,
    goal: SlashGoal,
    before: LexState,
    after: LexState,
}

/// A position the parser can return to; used for arrow-function
/// disambiguation and other try-then-backtrack spots.
pub struct Rewind {
    state: LexState,
}

pub struct Parser {
    lexer: Lexer,
    look: Option<Lookahead>,
    nodes: NodeMap,
    /*
      Scope declarations are recorded while parsing, but references resolve
      in a later pass; consider

          let a = 1;
          {
            let fn = () => a;
            let a = 2;
            fn();
          }

      where the lambda must see the `a` declared after it.
    */
    scopes: ScopeMap,
    pub rules: IdentRules,
    // Excludes the `in` operator while a for-statement header parses.
    pub no_in: bool,
    jump: JumpContext,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Parser {
        Parser {
            lexer,
            look: None,
            nodes: NodeMap::new(),
            scopes: ScopeMap::new(),
            rules: IdentRules::top(),
            no_in: false,
            jump: JumpContext::fresh(false),
        }
    }

    pub fn take(self) -> (NodeMap, ScopeMap) {
        (self.nodes, self.scopes)
    }

    pub fn nodes(&self) -> &NodeMap {
        &self.nodes
    }

    pub fn whole_span(&self) -> Span {
        self.lexer.whole_span()
    }

    pub fn add(&mut self, scope: ScopeId, span: Span, ast: Ast) -> NodeId {
        self.nodes.add(scope, span, ast)
    }

    // --- Scopes and bindings ---

    pub fn root_scope(&mut self, kind: ScopeKind) -> ScopeId {
        self.scopes.new_scope(None, kind)
    }

    pub fn open_scope(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        self.scopes.new_scope(Some(parent), kind)
    }

    pub fn declare(
        &mut self,
        scope: ScopeId,
        name: Name,
        declarator: NodeId,
        kind: SymbolKind,
    ) -> PResult<()> {
        self.scopes.declare(scope, name, declarator, kind)?;
        Ok(())
    }

    // --- Token access ---

    fn fill(&mut self, goal: SlashGoal) -> PResult<()> {
        if let Some(look) = &self.look {
            if look.goal == goal || !matches!(look.token.tok, Tok::Slash | Tok::SlashEq) {
                return Ok(());
            };
            // The cached token would lex differently under the requested
            // goal; relex from its start.
            let before = look.before;
            self.lexer.rewind(before);
            self.look = None;
        };
        let before = self.lexer.state();
        let token = next_token(&mut self.lexer, goal)?;
        self.look = Some(Lookahead {
            token,
            goal,
            before,
            after: self.lexer.state(),
        });
        Ok(())
    }

    pub fn peek(&mut self) -> PResult<&Token> {
        self.fill(SlashGoal::Div)?;
        Ok(&self.look.as_ref().unwrap().token)
    }

    pub fn peek_tok(&mut self) -> PResult<Tok> {
        Ok(self.peek()?.tok)
    }

    fn take_look(&mut self) -> Token {
        let look = self.look.take().unwrap();
        self.lexer.rewind(look.after);
        look.token
    }

    pub fn bump(&mut self) -> PResult<Token> {
        self.fill(SlashGoal::Div)?;
        Ok(self.take_look())
    }

    /// Consumes the next token with `/` starting a regex literal.
    pub fn bump_operand(&mut self) -> PResult<Token> {
        self.fill(SlashGoal::Regex)?;
        Ok(self.take_look())
    }

    pub fn at(&mut self, tok: Tok) -> PResult<bool> {
        Ok(self.peek_tok()? == tok)
    }

    /// Consumes the next token if it matches.
    pub fn eat(&mut self, tok: Tok) -> PResult<Option<Token>> {
        if self.at(tok)? {
            Ok(Some(self.take_look()))
        } else {
            Ok(None)
        }
    }

    pub fn expect(&mut self, tok: Tok) -> PResult<Token> {
        let token = self.bump()?;
        if token.tok != tok {
            return Err(token.error(ErrorKind::ExpectedToken(tok)));
        };
        Ok(token)
    }

    /// Expects any identifier-shaped token; property names and keys accept
    /// keywords.
    pub fn expect_word(&mut self) -> PResult<Token> {
        let token = self.bump()?;
        if !token.tok.is_word() {
            return Err(token.error(ErrorKind::Expected("name")));
        };
        Ok(token)
    }

    /// Expects a token usable as a variable name under the current rules.
    pub fn expect_name(&mut self) -> PResult<Token> {
        let token = self.bump()?;
        if !self.rules.allows_name(token.tok) {
            return Err(token.error(ErrorKind::Expected("identifier")));
        };
        Ok(token)
    }

    // --- Backtracking ---

    pub fn mark(&self) -> Rewind {
        Rewind {
            state: match &self.look {
                Some(look) => look.before,
                None => self.lexer.state(),
            },
        }
    }

    pub fn rewind(&mut self, mark: Rewind) -> () {
        self.look = None;
        self.lexer.rewind(mark.state);
    }

    pub fn span_since(&self, mark: &Rewind) -> Span {
        let here = match &self.look {
            Some(look) => look.before,
            None => self.lexer.state(),
        };
        self.lexer.span_between(mark.state, here)
    }

    /// Hands the raw lexer to template-string continuation; any lookahead is
    /// discarded first.
    pub fn lexer_for_template(&mut self) -> &mut Lexer {
        if let Some(look) = self.look.take() {
            self.lexer.rewind(look.before);
        };
        &mut self.lexer
    }

    // --- Automatic semicolon insertion ---

    /// A statement may end here without a `;`: a line break precedes, a `}`
    /// follows, or the input ends.
    pub fn can_insert_semicolon(&mut self) -> PResult<bool> {
        let token = self.peek()?;
        Ok(token.newline_before || matches!(token.tok, Tok::BraceR | Tok::Eof))
    }

    /// Accepts an explicit `;` or an insertion point; anything else is an
    /// error.
    pub fn insert_semicolon(&mut self) -> PResult<()> {
        if self.eat(Tok::Semi)?.is_some() || self.can_insert_semicolon()? {
            return Ok(());
        };
        let token = self.peek()?;
        Err(token.error(ErrorKind::ExpectedToken(Tok::Semi)))
    }

    // --- Jump statements ---

    pub fn enter_function(&mut self) -> (JumpContext, IdentRules) {
        (
            std::mem::replace(&mut self.jump, JumpContext::fresh(true)),
            self.rules,
        )
    }

    pub fn exit_function(&mut self, saved: (JumpContext, IdentRules)) -> () {
        self.jump = saved.0;
        self.rules = saved.1;
    }

    pub fn in_function(&self) -> bool {
        self.jump.in_function
    }

    pub fn push_label(&mut self, name: Name, is_loop: bool) -> PResult<()> {
        if self.jump.labels.iter().any(|entry| entry.name == name) {
            return Err(ParseError::at_span(ErrorKind::DuplicateLabel, &name, None));
        };
        self.jump.labels.push(LabelEntry { name, is_loop });
        Ok(())
    }

    pub fn pop_label(&mut self) -> () {
        self.jump.labels.pop();
    }

    pub fn enter_loop(&mut self) -> () {
        self.jump.loops += 1;
    }

    pub fn exit_loop(&mut self) -> () {
        self.jump.loops -= 1;
    }

    pub fn enter_switch(&mut self) -> () {
        self.jump.switches += 1;
    }

    pub fn exit_switch(&mut self) -> () {
        self.jump.switches -= 1;
    }

    /// `break`/`continue` must land on something: a matching label (a loop
    /// one, for `continue`) or, unlabeled, an enclosing loop or switch.
    pub fn check_jump(
        &self,
        label: Option<&Name>,
        is_continue: bool,
        at: &Span,
    ) -> PResult<()> {
        match label {
            Some(name) => {
                let entry = self
                    .jump
                    .labels
                    .iter()
                    .find(|entry| &entry.name == name)
                    .ok_or_else(|| ParseError::at_span(ErrorKind::UnknownLabel, at, None))?;
                if is_continue && !entry.is_loop {
                    return Err(ParseError::at_span(
                        ErrorKind::ContinueTargetNotLoop,
                        at,
                        None,
                    ));
                };
                Ok(())
            }
            None => {
                let ok = if is_continue {
                    self.jump.loops > 0
                } else {
                    self.jump.loops > 0 || self.jump.switches > 0
                };
                if ok {
                    Ok(())
                } else {
                    Err(ParseError::at_span(ErrorKind::IllegalJump, at, None))
                }
            }
        }
    }
}

impl Index<NodeId> for Parser {
    type Output = NodeData;

    fn index(&self, index: NodeId) -> &Self::Output {
        &self.nodes[index]
    }
}

impl IndexMut<NodeId> for Parser {
    fn index_mut(&mut self, index: NodeId) -> &mut Self::Output {
        &mut self.nodes[index]
    }
}

impl Index<ScopeId> for Parser {
    type Output = Scope;

    fn index(&self, index: ScopeId) -> &Self::Output {
        &self.scopes[index]
    }
}

impl IndexMut<ScopeId> for Parser {
    fn index_mut(&mut self, index: ScopeId) -> &mut Self::Output {
        &mut self.scopes[index]
    }
}

impl Index<SymbolId> for Parser {
    type Output = SymbolDef;

    fn index(&self, index: SymbolId) -> &Self::Output {
        &self.scopes[index]
    }
}
