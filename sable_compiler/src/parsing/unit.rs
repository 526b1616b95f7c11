//! Top level items of a source file.
use std::collections::HashSet;

use smol_str::SmolStr;

use super::{parse_statement, FunctionContext, Parser};
use crate::{
    ast::{Block, FileNode, FunctionNode, Parameter, StructField, StructNode, TypeName},
    error::{CompileError, CompileErrorKind, CompileResult},
    tokens::{TokenData, TokenKind},
};

const TYPE_START: &[TokenKind] = &[
    TokenKind::Bool,
    TokenKind::Int,
    TokenKind::Float,
    TokenKind::String,
    TokenKind::Identifier,
];

/// Parse every item of the file.
///
/// Errors don't stop the parse. A function whose body fails is kept with
/// an empty body so its dependencies still take part in layering.
pub fn parse_file<'a>(input: &mut Parser<'a, '_>) -> (FileNode<'a>, Vec<CompileError>) {
    let mut file = FileNode::default();
    let mut errors = Vec::new();

    loop {
        match input.peek_kind() {
            TokenKind::EndOfFile => break,
            TokenKind::Struct => match parse_struct(input) {
                Ok(item) => file.structs.push(item),
                Err(err) => {
                    errors.push(err);
                    input.skip_to_item();
                }
            },
            TokenKind::Fn => match parse_function(input, &mut errors) {
                Some(item) => file.functions.push(item),
                None => input.skip_to_item(),
            },
            _ => {
                let token = input.next_token();
                errors.push(input.unexpected(token, &[TokenKind::Fn, TokenKind::Struct]));
                input.skip_to_item();
            }
        }
    }

    (file, errors)
}

pub(super) fn parse_type(input: &mut Parser<'_, '_>) -> CompileResult<TypeName> {
    use TokenKind as T;

    let token = input.peek();
    let name = match (token.kind, token.data) {
        (T::Bool, _) => "bool",
        (T::Int, _) => "int",
        (T::Float, _) => "float",
        (T::String, _) => "string",
        (T::Identifier, TokenData::Ident(name)) => name,
        _ => return Err(input.unexpected(token, TYPE_START)),
    };
    input.next_token();

    Ok(TypeName {
        name: SmolStr::new(name),
        position: token.position,
    })
}

fn parse_struct(input: &mut Parser<'_, '_>) -> CompileResult<StructNode> {
    let keyword = input.consume(TokenKind::Struct)?;
    let (name, _) = input.identifier()?;
    input.consume(TokenKind::LeftBrace)?;

    let mut fields: Vec<StructField> = Vec::new();
    let mut seen = HashSet::new();
    while !input.match_token(TokenKind::RightBrace) {
        let (field, position) = input.identifier()?;
        if !seen.insert(field) {
            return Err(input.error(
                CompileErrorKind::DuplicateSymbol {
                    name: SmolStr::new(field),
                },
                position,
            ));
        }

        input.consume(TokenKind::Colon)?;
        let ty = parse_type(input)?;
        fields.push(StructField {
            name: SmolStr::new(field),
            ty,
        });

        if !input.match_token(TokenKind::Comma) {
            input.consume(TokenKind::RightBrace)?;
            break;
        }
    }

    Ok(StructNode {
        name: SmolStr::new(name),
        fields,
        position: keyword.position,
    })
}

/// Parse a function, recording errors.
///
/// Returns `None` when the signature is malformed.
fn parse_function<'a>(input: &mut Parser<'a, '_>, errors: &mut Vec<CompileError>) -> Option<FunctionNode<'a>> {
    let (mut cx, mut node) = match parse_signature(input) {
        Ok(signature) => signature,
        Err(err) => {
            errors.push(err);
            return None;
        }
    };

    // Depth inside the body braces.
    let depth = input.depth();
    let mut nodes = Vec::new();

    loop {
        match parse_statement(input, &mut cx) {
            Ok(Some(statement)) => nodes.push(statement),
            Ok(None) => break,
            Err(err) => {
                errors.push(err);
                input.skip_to_depth(depth);
                node.parse_failed = true;
                nodes.clear();
                break;
            }
        }
    }

    node.body = Block { nodes };
    node.variables = cx.variables;
    node.dependencies = cx.dependencies;
    Some(node)
}

/// Parse everything up to and including the opening brace of the body.
fn parse_signature<'a>(input: &mut Parser<'a, '_>) -> CompileResult<(FunctionContext<'a>, FunctionNode<'a>)> {
    let keyword = input.consume(TokenKind::Fn)?;
    let (name, _) = input.identifier()?;
    let mut cx = FunctionContext::new(input.source_name(), name);

    input.consume(TokenKind::LeftParen)?;
    let mut parameters = Vec::new();
    if !input.match_token(TokenKind::RightParen) {
        loop {
            let is_mutable = input.match_token(TokenKind::Mut);
            let (param, position) = input.identifier()?;
            input.consume(TokenKind::Colon)?;
            let ty = parse_type(input)?;
            let slot = cx.declare(param, is_mutable, position)?;

            parameters.push(Parameter {
                name: SmolStr::new(param),
                slot,
                is_mutable,
                ty,
            });

            if !input.match_token(TokenKind::Comma) {
                input.consume(TokenKind::RightParen)?;
                break;
            }
        }
    }

    let return_type = if input.match_token(TokenKind::Arrow) {
        Some(parse_type(input)?)
    } else {
        None
    };
    input.consume(TokenKind::LeftBrace)?;

    let node = FunctionNode {
        name,
        position: keyword.position,
        parameters,
        return_type,
        body: Block::default(),
        variables: Default::default(),
        dependencies: cx.dependencies.clone(),
        parse_failed: false,
    };

    Ok((cx, node))
}
