use std::fmt;

use sable_core::{
    bytecode::{Bytecode, OpCode, Slot},
    types::TypeHandle,
};

use super::ExprValue;
use crate::{
    compile::{builder::EmitContext, resolve::ResolveContext},
    error::{CompileErrorKind, CompileResult},
    position::SourcePosition,
    tokens::TokenKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    ShiftLeft,
    ShiftRight,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOperator {
    #[rustfmt::skip]
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        use BinaryOperator as B;
        use TokenKind as T;
        match kind {
            T::Or           => Some(B::Or),
            T::And          => Some(B::And),
            T::BitOr        => Some(B::BitOr),
            T::BitXor       => Some(B::BitXor),
            T::BitAnd       => Some(B::BitAnd),
            T::Equal        => Some(B::Equal),
            T::NotEqual     => Some(B::NotEqual),
            T::Less         => Some(B::Less),
            T::LessEqual    => Some(B::LessEqual),
            T::Greater      => Some(B::Greater),
            T::GreaterEqual => Some(B::GreaterEqual),
            T::ShiftLeft    => Some(B::ShiftLeft),
            T::ShiftRight   => Some(B::ShiftRight),
            T::Add          => Some(B::Add),
            T::Subtract     => Some(B::Subtract),
            T::Multiply     => Some(B::Multiply),
            T::Divide       => Some(B::Divide),
            T::Modulo       => Some(B::Modulo),
            _               => None,
        }
    }

    /// Binding strength, higher binds tighter.
    #[rustfmt::skip]
    pub fn precedence(&self) -> u8 {
        use BinaryOperator as B;
        match self {
            B::Or                                                 => 1,
            B::And                                                => 2,
            B::BitOr                                              => 3,
            B::BitXor                                             => 4,
            B::BitAnd                                             => 5,
            B::Equal | B::NotEqual                                => 6,
            B::Less | B::LessEqual | B::Greater | B::GreaterEqual => 7,
            B::ShiftLeft | B::ShiftRight                          => 8,
            B::Add | B::Subtract                                  => 9,
            B::Multiply | B::Divide | B::Modulo                   => 10,
        }
    }

    #[rustfmt::skip]
    pub fn opcode(&self) -> OpCode {
        use BinaryOperator as B;
        match self {
            B::Or           => OpCode::Or,
            B::And          => OpCode::And,
            B::BitOr        => OpCode::BitOr,
            B::BitXor       => OpCode::BitXor,
            B::BitAnd       => OpCode::BitAnd,
            B::Equal        => OpCode::Equal,
            B::NotEqual     => OpCode::NotEqual,
            B::Less         => OpCode::Less,
            B::LessEqual    => OpCode::LessOrEqual,
            B::Greater      => OpCode::Greater,
            B::GreaterEqual => OpCode::GreaterOrEqual,
            B::ShiftLeft    => OpCode::ShiftLeft,
            B::ShiftRight   => OpCode::ShiftRight,
            B::Add          => OpCode::Add,
            B::Subtract     => OpCode::Subtract,
            B::Multiply     => OpCode::Multiply,
            B::Divide       => OpCode::Divide,
            B::Modulo       => OpCode::Modulo,
        }
    }

    #[rustfmt::skip]
    pub fn symbol(&self) -> &'static str {
        use BinaryOperator as B;
        match self {
            B::Or           => "||",
            B::And          => "&&",
            B::BitOr        => "|",
            B::BitXor       => "^",
            B::BitAnd       => "&",
            B::Equal        => "==",
            B::NotEqual     => "!=",
            B::Less         => "<",
            B::LessEqual    => "<=",
            B::Greater      => ">",
            B::GreaterEqual => ">=",
            B::ShiftLeft    => "<<",
            B::ShiftRight   => ">>",
            B::Add          => "+",
            B::Subtract     => "-",
            B::Multiply     => "*",
            B::Divide       => "/",
            B::Modulo       => "%",
        }
    }

    /// Type of the result, or `None` when the operands are invalid.
    pub fn result_type(&self, lhs: TypeHandle, rhs: TypeHandle) -> Option<TypeHandle> {
        use BinaryOperator as B;

        if lhs != rhs {
            return None;
        }

        match self {
            B::Add if lhs == TypeHandle::STRING => Some(lhs),
            B::Add | B::Subtract | B::Multiply | B::Divide if lhs.is_numeric() => Some(lhs),
            B::Modulo | B::BitOr | B::BitXor | B::BitAnd | B::ShiftLeft | B::ShiftRight if lhs == TypeHandle::INT => {
                Some(lhs)
            }
            B::Equal | B::NotEqual => Some(TypeHandle::BOOL),
            B::Less | B::LessEqual | B::Greater | B::GreaterEqual if lhs.is_numeric() => Some(TypeHandle::BOOL),
            B::And | B::Or if lhs == TypeHandle::BOOL => Some(TypeHandle::BOOL),
            _ => None,
        }
    }
}

/// `lhs <op> rhs` written into a temporary.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub operator: BinaryOperator,
    pub lhs: ExprValue,
    pub rhs: ExprValue,
    pub destination: Slot,
    pub position: SourcePosition,
}

impl BinaryExpression {
    pub fn resolve_types(&mut self, cx: &mut ResolveContext) -> CompileResult<()> {
        let lhs = self.lhs.resolve_type(cx, self.position)?;
        let rhs = self.rhs.resolve_type(cx, self.position)?;

        let ty = self.operator.result_type(lhs, rhs).ok_or_else(|| {
            cx.error(
                CompileErrorKind::InvalidOperands {
                    operator: self.operator.symbol(),
                    lhs: cx.type_name(Some(lhs)),
                    rhs: cx.type_name(Some(rhs)),
                },
                self.position,
            )
        })?;
        cx.variables.set_type(self.destination, ty);

        Ok(())
    }

    pub fn emit_bytecode(&self, cx: &mut EmitContext) -> CompileResult<()> {
        let lhs = self.lhs.materialize(cx, self.position)?;
        let rhs = self.rhs.materialize(cx, self.position)?;
        cx.builder
            .push(Bytecode::binary(self.operator.opcode(), self.destination, lhs, rhs));
        Ok(())
    }
}

impl fmt::Display for BinaryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.lhs, self.operator.symbol(), self.rhs)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_result_types() {
        use BinaryOperator as B;
        let (int, float, string, boolean) = (TypeHandle::INT, TypeHandle::FLOAT, TypeHandle::STRING, TypeHandle::BOOL);

        assert_eq!(B::Add.result_type(string, string), Some(string));
        assert_eq!(B::Subtract.result_type(string, string), None);
        assert_eq!(B::Multiply.result_type(float, float), Some(float));
        assert_eq!(B::Add.result_type(int, float), None);
        assert_eq!(B::Modulo.result_type(float, float), None);
        assert_eq!(B::ShiftLeft.result_type(int, int), Some(int));
        assert_eq!(B::Less.result_type(float, float), Some(boolean));
        assert_eq!(B::Less.result_type(boolean, boolean), None);
        assert_eq!(B::Equal.result_type(string, string), Some(boolean));
        assert_eq!(B::And.result_type(boolean, boolean), Some(boolean));
        assert_eq!(B::Or.result_type(int, int), None);
    }
}
