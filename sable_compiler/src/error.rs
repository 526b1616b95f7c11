//! Compile errors.
use std::fmt::{self, Write as FmtWrite};

use itertools::Itertools;
use smol_str::SmolStr;
use thiserror::Error;

use crate::{
    lex::SyntaxErrorKind,
    position::{SourceLocation, Span},
    tokens::TokenKind,
};

pub type CompileResult<T> = std::result::Result<T, CompileError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileErrorKind {
    #[error("Expected {}. Found {}.", expected_list(expected), found.describe())]
    UnexpectedToken {
        found: TokenKind,
        expected: Vec<TokenKind>,
    },
    #[error("Couldn't find symbol '{name}'.")]
    CannotFindSymbol { name: SmolStr },
    #[error("Syntax error: {kind}.")]
    Syntax { kind: SyntaxErrorKind },
    #[error("Symbol '{name}' is already declared.")]
    DuplicateSymbol { name: SmolStr },
    #[error("Unknown type '{name}'.")]
    UnknownType { name: SmolStr },
    #[error("Type '{ty}' has no member '{member}'.")]
    UnknownMember { ty: SmolStr, member: SmolStr },
    #[error("Cannot access member '{member}' of non-struct type '{ty}'.")]
    NotAStruct { ty: SmolStr, member: SmolStr },
    #[error("Expected type '{expected}'. Found '{found}'.")]
    TypeMismatch { expected: SmolStr, found: SmolStr },
    #[error("Operator '{operator}' cannot be applied to '{lhs}' and '{rhs}'.")]
    InvalidOperands {
        operator: &'static str,
        lhs: SmolStr,
        rhs: SmolStr,
    },
    #[error("Cannot assign to immutable variable '{name}'.")]
    ImmutableAssignment { name: SmolStr },
    #[error("Function '{function}' does not return a value on every path.")]
    MissingReturn { function: SmolStr },
    #[error("{construct} is not supported yet.")]
    UnsupportedConstruct { construct: &'static str },
    #[error("Function '{function}' depends on itself.")]
    SelfDependency { function: SmolStr },
    #[error("Function '{function}' is part of a dependency cycle.")]
    CyclicDependency { function: SmolStr },
    #[error("Type of '{name}' could not be resolved.")]
    UnresolvedType { name: SmolStr },
    #[error("Function '{function}' uses more than 65536 variables.")]
    TooManyVariables { function: SmolStr },
    #[error("Function uses more than 65536 string constants.")]
    TooManyConstants,
    #[error("Jump of {distance} instructions does not fit in the jump offset.")]
    JumpTooFar { distance: usize },
    #[error("Struct '{name}' has more than 65536 fields.")]
    TooManyFields { name: SmolStr },
    #[error("Nesting exceeds the limit of {limit} levels.")]
    NestingTooDeep { limit: usize },
}

fn expected_list(expected: &[TokenKind]) -> String {
    match expected {
        [single] => single.describe(),
        many => format!("[{}]", many.iter().map(TokenKind::describe).join(", ")),
    }
}

/// Error produced while compiling, pointing at the offending source location.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    kind: CompileErrorKind,
    location: SourceLocation,
    message: String,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, location: SourceLocation) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            location,
            message,
        }
    }

    #[inline]
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn kind(&self) -> &CompileErrorKind {
        &self.kind
    }

    /// Render the error with the offending source line and a caret
    /// under the column.
    pub fn render(&self, source: &str) -> Result<String, fmt::Error> {
        let span = Span::new(self.location.position.index, 0);
        let (line, _) = span.surrounding_line(source);
        let gutter = self.location.position.line.to_string();

        let mut buf = String::new();
        writeln!(buf, "error: {}", self.message)?;
        writeln!(buf, "{:>width$}--> {}", "", self.location, width = gutter.len())?;
        writeln!(buf, "{} | {}", gutter, line.replace('\t', "    "))?;
        writeln!(
            buf,
            "{:>width$} | {:>col$}",
            "",
            "^",
            width = gutter.len(),
            col = self.location.position.column as usize
        )?;
        Ok(buf)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

impl std::error::Error for CompileError {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::position::SourcePosition;

    #[test]
    fn test_unexpected_token_message() {
        let single = CompileErrorKind::UnexpectedToken {
            found: TokenKind::Identifier,
            expected: vec![TokenKind::LeftParen],
        };
        assert_eq!(single.to_string(), "Expected '('. Found identifier.");

        let many = CompileErrorKind::UnexpectedToken {
            found: TokenKind::Semicolon,
            expected: vec![TokenKind::Identifier, TokenKind::IntLiteral],
        };
        assert_eq!(many.to_string(), "Expected [identifier, integer literal]. Found ';'.");
    }

    #[test]
    fn test_render_caret() {
        let source = "fn main() {\n    x = 1;\n}";
        let position = SourcePosition { index: 16, line: 2, column: 5 };
        let err = CompileError::new(
            CompileErrorKind::CannotFindSymbol { name: "x".into() },
            SourceLocation::new("main.sable", position),
        );

        assert_eq!(err.to_string(), "main.sable:2:5: Couldn't find symbol 'x'.");
        assert_eq!(
            err.render(source).unwrap(),
            "error: Couldn't find symbol 'x'.\n \
             --> main.sable:2:5\n\
             2 |     x = 1;\n  \
             |     ^\n"
        );
    }
}
