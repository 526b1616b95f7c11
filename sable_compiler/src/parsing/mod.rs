//! Syntactic analysis.
//!
//! Statements are parsed straight into [`AstNode`]s. Slots for variables
//! and temporaries are allocated while parsing, so the tree already refers
//! to the final frame layout.
mod expr;
mod stmts;
mod unit;

pub use expr::parse_expr;
pub use stmts::parse_block;
pub use unit::parse_file;

use sable_core::bytecode::Slot;
use smol_str::SmolStr;

use crate::{
    ast::AstNode,
    compile::{deps::FunctionDependencies, scope::ScopeStack, symbol::StackVariables},
    error::{CompileError, CompileErrorKind, CompileResult},
    lex::TokenIter,
    position::{SourceLocation, SourcePosition},
    tokens::{Token, TokenData, TokenKind},
};

pub trait Parse<'a>: Sized {
    type Output;

    fn parse(input: &mut Parser<'a, '_>, cx: &mut FunctionContext<'a>) -> CompileResult<Self::Output>;
}

/// Deepest nesting of blocks, parentheses and operator chains accepted.
///
/// The tree is walked recursively, so this bounds the stack used by
/// every later pass.
pub const MAX_NESTING: usize = 128;

/// Token stream with the helpers the parsers share.
pub struct Parser<'a, 'r> {
    tokens: TokenIter<'a, 'r>,
    /// Nesting of the braces consumed so far.
    depth: usize,
    /// Nesting of the tree currently being built.
    nesting: usize,
}

impl<'a, 'r> Parser<'a, 'r> {
    pub fn new(tokens: TokenIter<'a, 'r>) -> Self {
        Self {
            tokens,
            depth: 0,
            nesting: 0,
        }
    }

    #[inline]
    pub fn nesting(&self) -> usize {
        self.nesting
    }

    /// Go one level deeper into the tree.
    ///
    /// Callers restore the level they started at with [`Parser::set_nesting`]
    /// once the nested part is parsed, whether it failed or not.
    pub fn nest(&mut self, position: SourcePosition) -> CompileResult<()> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error(CompileErrorKind::NestingTooDeep { limit: MAX_NESTING }, position));
        }
        self.nesting += 1;
        Ok(())
    }

    #[inline]
    pub fn set_nesting(&mut self, nesting: usize) {
        self.nesting = nesting;
    }

    #[inline]
    pub fn source_name(&self) -> &'a str {
        self.tokens.source_name()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Consumes the current token regardless of kind.
    pub fn next_token(&mut self) -> Token<'a> {
        let token = self.tokens.next_token();
        match token.kind {
            TokenKind::LeftBrace => self.depth += 1,
            TokenKind::RightBrace => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
        token
    }

    #[inline]
    pub fn peek(&mut self) -> Token<'a> {
        self.tokens.peek()
    }

    #[inline]
    pub fn peek_kind(&mut self) -> TokenKind {
        self.tokens.peek_kind()
    }

    /// Consumes the next token if it matches the given kind.
    ///
    /// Returns true when matched.
    pub fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Return the next token and advance the cursor.
    ///
    /// The cursor is not advanced if the token kind does not match.
    pub fn consume(&mut self, kind: TokenKind) -> CompileResult<Token<'a>> {
        let token = self.peek();
        if token.kind == kind {
            Ok(self.next_token())
        } else {
            Err(self.unexpected(token, &[kind]))
        }
    }

    /// Consume an identifier, returning its name and position.
    pub fn identifier(&mut self) -> CompileResult<(&'a str, SourcePosition)> {
        let token = self.consume(TokenKind::Identifier)?;
        match token.ident() {
            Some(name) => Ok((name, token.position)),
            None => Err(self.unexpected(token, &[TokenKind::Identifier])),
        }
    }

    #[cold]
    pub fn error(&self, kind: CompileErrorKind, position: SourcePosition) -> CompileError {
        CompileError::new(kind, SourceLocation::new(self.source_name(), position))
    }

    /// Error for a token the grammar doesn't allow here.
    ///
    /// Invalid tokens turn into the syntax error the lexer reported.
    #[cold]
    pub fn unexpected(&self, token: Token<'a>, expected: &[TokenKind]) -> CompileError {
        let kind = match token.data {
            TokenData::Error(kind) => CompileErrorKind::Syntax { kind },
            _ => CompileErrorKind::UnexpectedToken {
                found: token.kind,
                expected: expected.to_vec(),
            },
        };
        self.error(kind, token.position)
    }

    /// Skip tokens until the brace that brings nesting below `depth`
    /// has been consumed.
    pub fn skip_to_depth(&mut self, depth: usize) {
        while self.depth >= depth && self.peek_kind() != TokenKind::EndOfFile {
            self.next_token();
        }
    }

    /// Skip tokens until the start of the next top level item.
    pub fn skip_to_item(&mut self) {
        loop {
            match self.peek_kind() {
                TokenKind::EndOfFile => return,
                TokenKind::Fn | TokenKind::Struct if self.depth == 0 => return,
                _ => {
                    self.next_token();
                }
            }
        }
    }
}

/// Per function state built up while parsing its body.
#[derive(Debug)]
pub struct FunctionContext<'a> {
    pub source_name: &'a str,
    pub name: &'a str,
    pub variables: StackVariables,
    pub scopes: ScopeStack,
    pub dependencies: FunctionDependencies<'a>,
}

impl<'a> FunctionContext<'a> {
    pub fn new(source_name: &'a str, name: &'a str) -> Self {
        Self {
            source_name,
            name,
            variables: StackVariables::new(),
            scopes: ScopeStack::new(),
            dependencies: FunctionDependencies::new(name),
        }
    }

    #[cold]
    pub fn error(&self, kind: CompileErrorKind, position: SourcePosition) -> CompileError {
        CompileError::new(kind, SourceLocation::new(self.source_name, position))
    }

    #[cold]
    fn too_many_variables(&self, position: SourcePosition) -> CompileError {
        self.error(
            CompileErrorKind::TooManyVariables {
                function: SmolStr::new(self.name),
            },
            position,
        )
    }

    /// Allocate an unnamed slot for an intermediate result.
    pub fn temporary(&mut self, position: SourcePosition) -> CompileResult<Slot> {
        self.variables
            .push_temporary()
            .ok_or_else(|| self.too_many_variables(position))
    }

    /// Allocate a slot for a named variable and bring it into scope.
    pub fn declare(&mut self, name: &str, is_mutable: bool, position: SourcePosition) -> CompileResult<Slot> {
        if self.scopes.is_declared_here(name) {
            return Err(self.error(
                CompileErrorKind::DuplicateSymbol {
                    name: SmolStr::new(name),
                },
                position,
            ));
        }

        let slot = self
            .variables
            .push(name, is_mutable, None)
            .ok_or_else(|| self.too_many_variables(position))?;
        self.scopes.declare(name, slot);
        Ok(slot)
    }

    /// Find a visible variable.
    pub fn lookup(&self, name: &str, position: SourcePosition) -> CompileResult<Slot> {
        self.scopes.lookup(name).ok_or_else(|| {
            self.error(
                CompileErrorKind::CannotFindSymbol {
                    name: SmolStr::new(name),
                },
                position,
            )
        })
    }

    /// Record a call to another function.
    pub fn add_dependency(&mut self, callee: &'a str, position: SourcePosition) -> CompileResult<()> {
        match self.dependencies.push(callee) {
            Ok(_) => Ok(()),
            Err(_) => Err(self.error(
                CompileErrorKind::SelfDependency {
                    function: SmolStr::new(callee),
                },
                position,
            )),
        }
    }
}

/// Parse one statement. `None` marks the closing brace of the block.
pub fn parse_statement<'a>(input: &mut Parser<'a, '_>, cx: &mut FunctionContext<'a>) -> CompileResult<Option<AstNode>> {
    AstNode::parse(input, cx)
}
