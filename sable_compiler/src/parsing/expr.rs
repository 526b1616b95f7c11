//! Expression parsing by precedence climbing.
use sable_core::bytecode::Slot;
use smol_str::SmolStr;

use super::{FunctionContext, Parse, Parser};
use crate::{
    ast::{AstNode, BinaryExpression, BinaryOperator, ExprValue, FunctionCall, MemberAccess, MemberProjection},
    error::CompileResult,
    lex::unescape,
    position::SourcePosition,
    tokens::{TokenData, TokenKind},
};

/// Tokens that can start an operand.
const OPERAND_START: &[TokenKind] = &[
    TokenKind::Identifier,
    TokenKind::IntLiteral,
    TokenKind::FloatLiteral,
    TokenKind::StringLiteral,
    TokenKind::True,
    TokenKind::False,
    TokenKind::LeftParen,
];

impl<'a> Parse<'a> for ExprValue {
    type Output = Self;

    fn parse(input: &mut Parser<'a, '_>, cx: &mut FunctionContext<'a>) -> CompileResult<Self> {
        parse_expr(input, cx)
    }
}

pub fn parse_expr<'a>(input: &mut Parser<'a, '_>, cx: &mut FunctionContext<'a>) -> CompileResult<ExprValue> {
    parse_binary(input, cx, 1)
}

/// Parse operands joined by operators binding at least as tight as
/// `min_precedence`. Every operator gets its own destination temporary.
fn parse_binary<'a>(
    input: &mut Parser<'a, '_>,
    cx: &mut FunctionContext<'a>,
    min_precedence: u8,
) -> CompileResult<ExprValue> {
    let outer = input.nesting();
    let result = parse_operators(input, cx, min_precedence);
    input.set_nesting(outer);
    result
}

/// Each operator in a chain wraps everything to its left, so it counts
/// as one more level of nesting.
fn parse_operators<'a>(
    input: &mut Parser<'a, '_>,
    cx: &mut FunctionContext<'a>,
    min_precedence: u8,
) -> CompileResult<ExprValue> {
    let mut lhs = parse_primary(input, cx)?;

    while let Some(operator) = BinaryOperator::from_token(input.peek_kind()) {
        let precedence = operator.precedence();
        if precedence < min_precedence {
            break;
        }

        let token = input.next_token();
        input.nest(token.position)?;
        // Left associative, so the right side only takes tighter operators.
        let rhs = parse_binary(input, cx, precedence + 1)?;
        let destination = cx.temporary(token.position)?;

        lhs = ExprValue::Expression(Box::new(AstNode::BinaryExpression(BinaryExpression {
            operator,
            lhs,
            rhs,
            destination,
            position: token.position,
        })));
    }

    Ok(lhs)
}

fn parse_primary<'a>(input: &mut Parser<'a, '_>, cx: &mut FunctionContext<'a>) -> CompileResult<ExprValue> {
    use TokenKind as T;

    let token = input.peek();
    let value = match (token.kind, token.data) {
        (T::IntLiteral, TokenData::Int(value)) => ExprValue::IntLit(value),
        (T::FloatLiteral, TokenData::Float(value)) => ExprValue::FloatLit(value),
        (T::True, _) => ExprValue::BoolLit(true),
        (T::False, _) => ExprValue::BoolLit(false),
        (T::StringLiteral, TokenData::Str(raw)) => ExprValue::StringLit(unescape_string(raw)),
        (T::LeftParen, _) => {
            input.next_token();
            let outer = input.nesting();
            input.nest(token.position)?;
            let value = parse_expr(input, cx);
            input.set_nesting(outer);
            let value = value?;
            input.consume(T::RightParen)?;
            return Ok(value);
        }
        (T::Identifier, _) => {
            let (name, position) = input.identifier()?;
            return match input.peek_kind() {
                T::Dot => {
                    let source = cx.lookup(name, position)?;
                    let names = parse_member_names(input)?;
                    let access = project_members(cx, source, &names, position)?;
                    Ok(ExprValue::Expression(Box::new(AstNode::MemberAccess(access))))
                }
                T::LeftParen => {
                    let call = parse_call(input, cx, name, position)?;
                    Ok(ExprValue::FunctionCall(Box::new(call)))
                }
                _ => cx.lookup(name, position).map(ExprValue::Variable),
            };
        }
        _ => return Err(input.unexpected(token, OPERAND_START)),
    };

    input.next_token();
    Ok(value)
}

/// Parse `.m1.m2...` following an identifier.
pub(super) fn parse_member_names<'a>(input: &mut Parser<'a, '_>) -> CompileResult<Vec<(&'a str, SourcePosition)>> {
    let mut names = Vec::new();
    while input.match_token(TokenKind::Dot) {
        names.push(input.identifier()?);
    }
    Ok(names)
}

/// Build a member chain, allocating one temporary per member in order.
pub(super) fn project_members<'a>(
    cx: &mut FunctionContext<'a>,
    source: Slot,
    names: &[(&'a str, SourcePosition)],
    position: SourcePosition,
) -> CompileResult<MemberAccess> {
    let mut members = Vec::with_capacity(names.len());

    for (member, member_position) in names {
        let destination = cx.temporary(*member_position)?;
        members.push(MemberProjection {
            member: SmolStr::new(member),
            destination,
            field: None,
            position: *member_position,
        });
    }
    members.shrink_to_fit();

    Ok(MemberAccess {
        source,
        members,
        position,
    })
}

/// Parse the argument list of a call and record the callee.
pub(super) fn parse_call<'a>(
    input: &mut Parser<'a, '_>,
    cx: &mut FunctionContext<'a>,
    name: &'a str,
    position: SourcePosition,
) -> CompileResult<FunctionCall> {
    input.consume(TokenKind::LeftParen)?;

    let mut arguments = Vec::new();
    if !input.match_token(TokenKind::RightParen) {
        loop {
            arguments.push(parse_expr(input, cx)?);
            if !input.match_token(TokenKind::Comma) {
                input.consume(TokenKind::RightParen)?;
                break;
            }
        }
    }

    cx.add_dependency(name, position)?;

    Ok(FunctionCall {
        name: SmolStr::new(name),
        arguments,
        position,
    })
}

/// Decode the escapes of a string literal.
fn unescape_string(raw: &str) -> SmolStr {
    if !raw.contains('\\') {
        return SmolStr::new(raw);
    }

    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    value.push(unescape(escaped));
                }
            }
            c => value.push(c),
        }
    }
    SmolStr::new(value)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unescape_string() {
        assert_eq!(unescape_string("plain"), "plain");
        assert_eq!(unescape_string(r#"a\tb\"c\\"#), "a\tb\"c\\");
    }
}
