//! Statement parsing.
use smol_str::SmolStr;

use super::{
    expr::{parse_call, parse_member_names, project_members},
    parse_expr, parse_statement,
    unit::parse_type,
    FunctionContext, Parse, Parser,
};
use crate::{
    ast::{
        AstNode, Block, Conditional, MemberAssign, Return, SyncBlock, SyncVariable, VariableAssignment,
        VariableDeclaration, WhileLoop,
    },
    error::{CompileErrorKind, CompileResult},
    position::SourcePosition,
    tokens::TokenKind,
};

/// Tokens that can start a statement.
const STATEMENT_START: &[TokenKind] = &[
    TokenKind::Return,
    TokenKind::Const,
    TokenKind::Mut,
    TokenKind::If,
    TokenKind::While,
    TokenKind::Sync,
    TokenKind::Identifier,
    TokenKind::RightBrace,
];

/// Statement dispatch. Returns `None` after consuming the closing brace
/// of the enclosing block.
impl<'a> Parse<'a> for AstNode {
    type Output = Option<AstNode>;

    fn parse(input: &mut Parser<'a, '_>, cx: &mut FunctionContext<'a>) -> CompileResult<Option<AstNode>> {
        use TokenKind as T;

        let token = input.peek();
        let node = match token.kind {
            T::Return => AstNode::Return(Return::parse(input, cx)?),
            T::Const | T::Mut => AstNode::VariableDeclaration(VariableDeclaration::parse(input, cx)?),
            T::If => AstNode::Conditional(Conditional::parse(input, cx)?),
            T::While => AstNode::WhileLoop(WhileLoop::parse(input, cx)?),
            T::Sync => AstNode::SyncBlock(SyncBlock::parse(input, cx)?),
            T::Identifier => {
                let (name, position) = input.identifier()?;
                match input.peek_kind() {
                    T::Assign => AstNode::VariableAssignment(parse_assignment(input, cx, name, position)?),
                    T::Dot => AstNode::MemberAssign(parse_member_assign(input, cx, name, position)?),
                    T::LeftParen => {
                        let call = parse_call(input, cx, name, position)?;
                        input.consume(T::Semicolon)?;
                        AstNode::FunctionCall(call)
                    }
                    _ => {
                        let next = input.peek();
                        return Err(input.unexpected(next, &[T::Assign, T::Dot, T::LeftParen]));
                    }
                }
            }
            T::RightBrace => {
                input.next_token();
                return Ok(None);
            }
            _ => return Err(input.unexpected(token, STATEMENT_START)),
        };

        Ok(Some(node))
    }
}

/// Parse a brace delimited block in a new scope.
///
/// Blocks of sync statements pass the number of locks they hold.
pub fn parse_block<'a>(input: &mut Parser<'a, '_>, cx: &mut FunctionContext<'a>, sync_locks: u16) -> CompileResult<Block> {
    let brace = input.consume(TokenKind::LeftBrace)?;
    let outer = input.nesting();
    input.nest(brace.position)?;

    if sync_locks > 0 {
        cx.scopes.push_sync(sync_locks);
    } else {
        cx.scopes.push();
    }

    let mut nodes = Vec::new();
    let result = loop {
        match parse_statement(input, cx) {
            Ok(Some(node)) => nodes.push(node),
            Ok(None) => break Ok(()),
            Err(err) => break Err(err),
        }
    };
    cx.scopes.pop();
    input.set_nesting(outer);
    result?;

    Ok(Block { nodes })
}

impl<'a> Parse<'a> for VariableDeclaration {
    type Output = Self;

    fn parse(input: &mut Parser<'a, '_>, cx: &mut FunctionContext<'a>) -> CompileResult<Self> {
        let keyword = input.next_token();
        let is_mutable = keyword.kind == TokenKind::Mut;
        let (name, position) = input.identifier()?;

        if cx.scopes.is_declared_here(name) {
            return Err(cx.error(
                CompileErrorKind::DuplicateSymbol {
                    name: SmolStr::new(name),
                },
                position,
            ));
        }

        let declared_type = if input.match_token(TokenKind::Colon) {
            Some(parse_type(input)?)
        } else {
            None
        };

        input.consume(TokenKind::Assign)?;
        let value = parse_expr(input, cx)?;
        input.consume(TokenKind::Semicolon)?;

        // Declared last so the initializer can't refer to the new variable.
        let slot = cx.declare(name, is_mutable, position)?;

        Ok(VariableDeclaration {
            name: SmolStr::new(name),
            slot,
            is_mutable,
            declared_type,
            value,
            position: keyword.position,
        })
    }
}

fn parse_assignment<'a>(
    input: &mut Parser<'a, '_>,
    cx: &mut FunctionContext<'a>,
    name: &'a str,
    position: SourcePosition,
) -> CompileResult<VariableAssignment> {
    let slot = cx.lookup(name, position)?;

    input.consume(TokenKind::Assign)?;
    let value = parse_expr(input, cx)?;
    input.consume(TokenKind::Semicolon)?;

    Ok(VariableAssignment { slot, value, position })
}

fn parse_member_assign<'a>(
    input: &mut Parser<'a, '_>,
    cx: &mut FunctionContext<'a>,
    name: &'a str,
    position: SourcePosition,
) -> CompileResult<MemberAssign> {
    let source = cx.lookup(name, position)?;

    let mut names = parse_member_names(input)?;
    let (member, _) = match names.pop() {
        Some(last) => last,
        None => {
            let token = input.peek();
            return Err(input.unexpected(token, &[TokenKind::Dot]));
        }
    };
    let target = project_members(cx, source, &names, position)?;

    input.consume(TokenKind::Assign)?;
    let value = parse_expr(input, cx)?;
    input.consume(TokenKind::Semicolon)?;

    Ok(MemberAssign {
        target,
        member: SmolStr::new(member),
        field: None,
        value,
        position,
    })
}

impl<'a> Parse<'a> for Return {
    type Output = Self;

    fn parse(input: &mut Parser<'a, '_>, cx: &mut FunctionContext<'a>) -> CompileResult<Self> {
        let keyword = input.consume(TokenKind::Return)?;

        let value = if input.peek_kind() == TokenKind::Semicolon {
            None
        } else {
            Some(parse_expr(input, cx)?)
        };
        input.consume(TokenKind::Semicolon)?;

        Ok(Return {
            value,
            sync_locks: cx.scopes.sync_depth(),
            position: keyword.position,
        })
    }
}

impl<'a> Parse<'a> for Conditional {
    type Output = Self;

    fn parse(input: &mut Parser<'a, '_>, cx: &mut FunctionContext<'a>) -> CompileResult<Self> {
        let keyword = input.consume(TokenKind::If)?;
        let mut conditions = Vec::new();
        let mut blocks = Vec::new();

        loop {
            input.consume(TokenKind::LeftParen)?;
            conditions.push(parse_expr(input, cx)?);
            input.consume(TokenKind::RightParen)?;
            blocks.push(parse_block(input, cx, 0)?);

            if !input.match_token(TokenKind::Else) {
                break;
            }
            if input.match_token(TokenKind::If) {
                continue;
            }

            // Final else.
            blocks.push(parse_block(input, cx, 0)?);
            break;
        }

        Ok(Conditional {
            conditions,
            blocks,
            position: keyword.position,
        })
    }
}

impl<'a> Parse<'a> for WhileLoop {
    type Output = Self;

    fn parse(input: &mut Parser<'a, '_>, cx: &mut FunctionContext<'a>) -> CompileResult<Self> {
        let keyword = input.consume(TokenKind::While)?;

        input.consume(TokenKind::LeftParen)?;
        let condition = parse_expr(input, cx)?;
        input.consume(TokenKind::RightParen)?;
        let body = parse_block(input, cx, 0)?;

        Ok(WhileLoop {
            condition,
            body,
            position: keyword.position,
        })
    }
}

impl<'a> Parse<'a> for SyncBlock {
    type Output = Self;

    fn parse(input: &mut Parser<'a, '_>, cx: &mut FunctionContext<'a>) -> CompileResult<Self> {
        let keyword = input.consume(TokenKind::Sync)?;
        let mut variables = Vec::new();

        loop {
            let exclusive = input.match_token(TokenKind::Mut);
            let (name, position) = input.identifier()?;
            let slot = cx.lookup(name, position)?;

            // Taking the same lock twice deadlocks.
            if variables.iter().any(|variable: &SyncVariable| variable.slot == slot) {
                return Err(cx.error(
                    CompileErrorKind::DuplicateSymbol {
                        name: SmolStr::new(name),
                    },
                    position,
                ));
            }

            variables.push(SyncVariable {
                name: SmolStr::new(name),
                slot,
                exclusive,
            });

            if !input.match_token(TokenKind::Comma) {
                break;
            }
        }

        let locks = u16::try_from(variables.len()).map_err(|_| {
            cx.error(
                CompileErrorKind::TooManyVariables {
                    function: SmolStr::new(cx.name),
                },
                keyword.position,
            )
        })?;
        let body = parse_block(input, cx, locks)?;

        Ok(SyncBlock {
            variables,
            body,
            position: keyword.position,
        })
    }
}
