use std::fmt;

use sable_core::{
    bytecode::{Bytecode, Immediate, Slot},
    types::TypeHandle,
};
use smol_str::SmolStr;

use super::{AstNode, FunctionCall};
use crate::{
    compile::{builder::EmitContext, resolve::ResolveContext},
    error::{CompileErrorKind, CompileResult},
    position::SourcePosition,
};

/// A single operand of an expression or statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprValue {
    Variable(Slot),
    IntLit(i64),
    FloatLit(f64),
    BoolLit(bool),
    /// Contents with escapes already decoded.
    StringLit(SmolStr),
    Expression(Box<AstNode>),
    FunctionCall(Box<FunctionCall>),
}

impl ExprValue {
    /// Literal value, if this operand is a non-string literal.
    fn immediate(&self) -> Option<Immediate> {
        match *self {
            Self::IntLit(value) => Some(Immediate::Int(value)),
            Self::FloatLit(value) => Some(Immediate::Float(value)),
            Self::BoolLit(value) => Some(Immediate::Bool(value)),
            _ => None,
        }
    }

    /// Resolve nested nodes and return the operand's type.
    pub fn resolve_type(&mut self, cx: &mut ResolveContext, position: SourcePosition) -> CompileResult<TypeHandle> {
        match self {
            Self::Variable(slot) => cx.slot_type(*slot, position),
            Self::IntLit(_) => Ok(TypeHandle::INT),
            Self::FloatLit(_) => Ok(TypeHandle::FLOAT),
            Self::BoolLit(_) => Ok(TypeHandle::BOOL),
            Self::StringLit(_) => Ok(TypeHandle::STRING),
            Self::Expression(node) => {
                node.resolve_types(cx)?;
                match node.result_slot() {
                    Some(slot) => cx.slot_type(slot, node.position()),
                    None => Err(cx.error(
                        CompileErrorKind::UnsupportedConstruct {
                            construct: "Statement used as a value",
                        },
                        node.position(),
                    )),
                }
            }
            Self::FunctionCall(call) => call.resolve_types(cx).map(|_| TypeHandle::INT),
        }
    }

    /// Emit whatever code is needed to have the value in a slot, and
    /// return that slot.
    pub fn materialize(&self, cx: &mut EmitContext, position: SourcePosition) -> CompileResult<Slot> {
        match self {
            Self::Variable(slot) => Ok(*slot),
            Self::Expression(node) => {
                node.emit_bytecode(cx)?;
                node.result_slot()
                    .ok_or_else(|| cx.error(CompileErrorKind::UnsupportedConstruct { construct: "Statement used as a value" }, position))
            }
            Self::FunctionCall(_) => Err(cx.error(CompileErrorKind::UnsupportedConstruct { construct: "Function call" }, position)),
            literal => {
                let ty = match literal {
                    Self::IntLit(_) => TypeHandle::INT,
                    Self::FloatLit(_) => TypeHandle::FLOAT,
                    Self::BoolLit(_) => TypeHandle::BOOL,
                    _ => TypeHandle::STRING,
                };
                let slot = cx.temporary(ty, position)?;
                literal.emit_into(cx, slot, position)?;
                Ok(slot)
            }
        }
    }

    /// Emit code leaving the value in `dst`.
    pub fn emit_into(&self, cx: &mut EmitContext, dst: Slot, position: SourcePosition) -> CompileResult<()> {
        if let Some(value) = self.immediate() {
            cx.builder.load_immediate(dst, value);
            return Ok(());
        }

        match self {
            Self::StringLit(value) => {
                let index = cx.builder.add_string_constant(value);
                let index = cx.at(index, position)?;
                cx.builder.push(Bytecode::load_constant(dst, index));
            }
            other => {
                let src = other.materialize(cx, position)?;
                if src != dst {
                    cx.builder.push(Bytecode::mov(dst, src));
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for ExprValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(slot) => write!(f, "${}", slot),
            Self::IntLit(value) => write!(f, "{}", value),
            Self::FloatLit(value) => write!(f, "{:?}", value),
            Self::BoolLit(value) => write!(f, "{}", value),
            Self::StringLit(value) => write!(f, "{:?}", value.as_str()),
            Self::Expression(node) => write!(f, "{}", node),
            Self::FunctionCall(call) => write!(f, "{}", call),
        }
    }
}
