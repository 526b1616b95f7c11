//! Syntax tree.
//!
//! Statements and expressions form a closed set of node kinds. Every kind
//! resolves its types, emits its bytecode and prints itself with slots
//! written as `$n`.
mod binary;
mod call;
mod cond;
mod file;
mod member;
mod ret;
mod sync;
mod value;
mod var;
mod while_loop;

use std::fmt;

use itertools::Itertools;
use sable_core::bytecode::Slot;

pub use binary::{BinaryExpression, BinaryOperator};
pub use call::FunctionCall;
pub use cond::Conditional;
pub use file::{FileNode, FunctionNode, Parameter, StructField, StructNode};
pub use member::{MemberAccess, MemberAssign, MemberProjection};
pub use ret::Return;
pub use sync::{SyncBlock, SyncVariable};
pub use value::ExprValue;
pub use var::{TypeName, VariableAssignment, VariableDeclaration};
pub use while_loop::WhileLoop;

use crate::{
    compile::{builder::EmitContext, resolve::ResolveContext},
    error::CompileResult,
    position::SourcePosition,
};

#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    VariableDeclaration(VariableDeclaration),
    VariableAssignment(VariableAssignment),
    MemberAccess(MemberAccess),
    MemberAssign(MemberAssign),
    Return(Return),
    BinaryExpression(BinaryExpression),
    FunctionCall(FunctionCall),
    Conditional(Conditional),
    WhileLoop(WhileLoop),
    SyncBlock(SyncBlock),
}

impl AstNode {
    pub fn position(&self) -> SourcePosition {
        use AstNode as N;
        match self {
            N::VariableDeclaration(node) => node.position,
            N::VariableAssignment(node) => node.position,
            N::MemberAccess(node) => node.position,
            N::MemberAssign(node) => node.position,
            N::Return(node) => node.position,
            N::BinaryExpression(node) => node.position,
            N::FunctionCall(node) => node.position,
            N::Conditional(node) => node.position,
            N::WhileLoop(node) => node.position,
            N::SyncBlock(node) => node.position,
        }
    }

    /// Slot holding the value of an expression node.
    pub fn result_slot(&self) -> Option<Slot> {
        match self {
            AstNode::BinaryExpression(node) => Some(node.destination),
            AstNode::MemberAccess(node) => Some(node.result_slot()),
            _ => None,
        }
    }

    pub fn resolve_types(&mut self, cx: &mut ResolveContext) -> CompileResult<()> {
        use AstNode as N;
        match self {
            N::VariableDeclaration(node) => node.resolve_types(cx),
            N::VariableAssignment(node) => node.resolve_types(cx),
            N::MemberAccess(node) => node.resolve_types(cx),
            N::MemberAssign(node) => node.resolve_types(cx),
            N::Return(node) => node.resolve_types(cx),
            N::BinaryExpression(node) => node.resolve_types(cx),
            N::FunctionCall(node) => node.resolve_types(cx),
            N::Conditional(node) => node.resolve_types(cx),
            N::WhileLoop(node) => node.resolve_types(cx),
            N::SyncBlock(node) => node.resolve_types(cx),
        }
    }

    pub fn emit_bytecode(&self, cx: &mut EmitContext) -> CompileResult<()> {
        use AstNode as N;
        match self {
            N::VariableDeclaration(node) => node.emit_bytecode(cx),
            N::VariableAssignment(node) => node.emit_bytecode(cx),
            N::MemberAccess(node) => node.emit_bytecode(cx),
            N::MemberAssign(node) => node.emit_bytecode(cx),
            N::Return(node) => node.emit_bytecode(cx),
            N::BinaryExpression(node) => node.emit_bytecode(cx),
            N::FunctionCall(node) => node.emit_bytecode(cx),
            N::Conditional(node) => node.emit_bytecode(cx),
            N::WhileLoop(node) => node.emit_bytecode(cx),
            N::SyncBlock(node) => node.emit_bytecode(cx),
        }
    }

    /// Indicates whether every path through the node ends in a return.
    pub fn ends_with_return(&self) -> bool {
        match self {
            AstNode::Return(_) => true,
            AstNode::Conditional(node) => node.ends_with_return(),
            AstNode::SyncBlock(node) => node.body.ends_with_return(),
            _ => false,
        }
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use AstNode as N;
        match self {
            N::VariableDeclaration(node) => fmt::Display::fmt(node, f),
            N::VariableAssignment(node) => fmt::Display::fmt(node, f),
            N::MemberAccess(node) => fmt::Display::fmt(node, f),
            N::MemberAssign(node) => fmt::Display::fmt(node, f),
            N::Return(node) => fmt::Display::fmt(node, f),
            N::BinaryExpression(node) => fmt::Display::fmt(node, f),
            N::FunctionCall(node) => fmt::Display::fmt(node, f),
            N::Conditional(node) => fmt::Display::fmt(node, f),
            N::WhileLoop(node) => fmt::Display::fmt(node, f),
            N::SyncBlock(node) => fmt::Display::fmt(node, f),
        }
    }
}

/// Statements of a brace delimited block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub nodes: Vec<AstNode>,
}

impl Block {
    pub fn resolve_types(&mut self, cx: &mut ResolveContext) -> CompileResult<()> {
        for node in self.nodes.iter_mut() {
            node.resolve_types(cx)?;
        }
        Ok(())
    }

    pub fn emit_bytecode(&self, cx: &mut EmitContext) -> CompileResult<()> {
        for node in &self.nodes {
            node.emit_bytecode(cx)?;
        }
        Ok(())
    }

    /// Statements after a return are unreachable, so any returning
    /// statement covers the block.
    pub fn ends_with_return(&self) -> bool {
        self.nodes.iter().any(AstNode::ends_with_return)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nodes.is_empty() {
            write!(f, "{{ }}")
        } else {
            write!(f, "{{ {}; }}", self.nodes.iter().join("; "))
        }
    }
}
