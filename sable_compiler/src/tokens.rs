use std::fmt;

use crate::{lex::SyntaxErrorKind, position::SourcePosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum TokenKind {
    // ------------------------------------------------------------------------
    // Keywords
    Const,
    Mut,
    Return,
    Fn,
    Pub,
    If,
    Else,
    Switch,
    While,
    For,
    Break,
    Continue,
    Struct,
    Enum,
    Union,
    Sync,
    True,
    False,
    Null,
    Bool,
    Int,
    Float,
    String,
    Char,
    Import,
    Extern,

    // ------------------------------------------------------------------------
    // Operators
    Assign,             // =
    Equal,              // ==
    NotEqual,           // !=
    Not,                // !
    Less,               // <
    LessEqual,          // <=
    ShiftLeft,          // <<
    ShiftLeftAssign,    // <<=
    Greater,            // >
    GreaterEqual,       // >=
    ShiftRight,         // >>
    ShiftRightAssign,   // >>=
    Add,                // +
    AddAssign,          // +=
    Subtract,           // -
    SubtractAssign,     // -=
    Multiply,           // *
    MultiplyAssign,     // *=
    Divide,             // /
    DivideAssign,       // /=
    Modulo,             // %
    ModuloAssign,       // %=
    BitAnd,             // &
    BitAndAssign,       // &=
    And,                // &&
    BitOr,              // |
    BitOrAssign,        // |=
    Or,                 // ||
    BitXor,             // ^
    BitXorAssign,       // ^=
    BitNot,             // ~

    // ------------------------------------------------------------------------
    // Symbols
    LeftParen,          // (
    RightParen,         // )
    LeftBrace,          // {
    RightBrace,         // }
    LeftBracket,        // [
    RightBracket,       // ]
    Comma,              // ,
    Dot,                // .
    Semicolon,          // ;
    Colon,              // :
    DoubleColon,        // ::
    Arrow,              // ->
    Question,           // ?
    /// Prefix `&`
    Reference,
    /// Prefix `*`
    Pointer,

    // ------------------------------------------------------------------------
    // Literals
    IntLiteral,
    FloatLiteral,
    CharLiteral,
    StringLiteral,
    Identifier,

    // ------------------------------------------------------------------------
    // Special
    /// Malformed input. The token data carries the error kind.
    Invalid,
    /// End-of-file
    EndOfFile,
}

/// Reserved words, matched only when not followed by an identifier character.
#[rustfmt::skip]
pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("const",    TokenKind::Const),
    ("mut",      TokenKind::Mut),
    ("return",   TokenKind::Return),
    ("fn",       TokenKind::Fn),
    ("pub",      TokenKind::Pub),
    ("if",       TokenKind::If),
    ("else",     TokenKind::Else),
    ("switch",   TokenKind::Switch),
    ("while",    TokenKind::While),
    ("for",      TokenKind::For),
    ("break",    TokenKind::Break),
    ("continue", TokenKind::Continue),
    ("struct",   TokenKind::Struct),
    ("enum",     TokenKind::Enum),
    ("union",    TokenKind::Union),
    ("sync",     TokenKind::Sync),
    ("true",     TokenKind::True),
    ("false",    TokenKind::False),
    ("null",     TokenKind::Null),
    ("bool",     TokenKind::Bool),
    ("int",      TokenKind::Int),
    ("float",    TokenKind::Float),
    ("string",   TokenKind::String),
    ("char",     TokenKind::Char),
    ("import",   TokenKind::Import),
    ("extern",   TokenKind::Extern),
];

/// Operators and symbols, longest first so a prefix never shadows a
/// longer match.
///
/// `&`, `*` and `-` are missing because their meaning depends on the
/// previous token.
#[rustfmt::skip]
pub const OPERATORS: &[(&str, TokenKind)] = &[
    ("<<=", TokenKind::ShiftLeftAssign),
    (">>=", TokenKind::ShiftRightAssign),
    ("==",  TokenKind::Equal),
    ("!=",  TokenKind::NotEqual),
    ("<=",  TokenKind::LessEqual),
    ("<<",  TokenKind::ShiftLeft),
    (">=",  TokenKind::GreaterEqual),
    (">>",  TokenKind::ShiftRight),
    ("+=",  TokenKind::AddAssign),
    ("-=",  TokenKind::SubtractAssign),
    ("*=",  TokenKind::MultiplyAssign),
    ("/=",  TokenKind::DivideAssign),
    ("%=",  TokenKind::ModuloAssign),
    ("&=",  TokenKind::BitAndAssign),
    ("&&",  TokenKind::And),
    ("|=",  TokenKind::BitOrAssign),
    ("||",  TokenKind::Or),
    ("^=",  TokenKind::BitXorAssign),
    ("::",  TokenKind::DoubleColon),
    ("->",  TokenKind::Arrow),
    ("=",   TokenKind::Assign),
    ("!",   TokenKind::Not),
    ("<",   TokenKind::Less),
    (">",   TokenKind::Greater),
    ("+",   TokenKind::Add),
    ("/",   TokenKind::Divide),
    ("%",   TokenKind::Modulo),
    ("|",   TokenKind::BitOr),
    ("^",   TokenKind::BitXor),
    ("~",   TokenKind::BitNot),
    ("(",   TokenKind::LeftParen),
    (")",   TokenKind::RightParen),
    ("{",   TokenKind::LeftBrace),
    ("}",   TokenKind::RightBrace),
    ("[",   TokenKind::LeftBracket),
    ("]",   TokenKind::RightBracket),
    (",",   TokenKind::Comma),
    (".",   TokenKind::Dot),
    (";",   TokenKind::Semicolon),
    (":",   TokenKind::Colon),
    ("?",   TokenKind::Question),
];

impl TokenKind {
    /// Source text of tokens with a fixed spelling.
    pub fn symbol(&self) -> Option<&'static str> {
        use TokenKind as T;
        match self {
            T::BitAnd | T::Reference => Some("&"),
            T::Multiply | T::Pointer => Some("*"),
            T::Subtract => Some("-"),
            kind => KEYWORDS
                .iter()
                .chain(OPERATORS.iter())
                .find(|(_, k)| k == kind)
                .map(|(text, _)| *text),
        }
    }

    /// Indicates whether the token can end a value, which makes a following
    /// `&`, `*` or `-` a binary operator.
    #[inline]
    pub fn ends_value(&self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral
                | TokenKind::FloatLiteral
                | TokenKind::Identifier
                | TokenKind::RightParen
                | TokenKind::RightBracket
        )
    }

    /// Human readable name used in error messages.
    ///
    /// Fixed tokens are quoted, token classes are named.
    pub fn describe(&self) -> String {
        use TokenKind as T;
        match self {
            T::IntLiteral => "integer literal".to_string(),
            T::FloatLiteral => "float literal".to_string(),
            T::CharLiteral => "char literal".to_string(),
            T::StringLiteral => "string literal".to_string(),
            T::Identifier => "identifier".to_string(),
            T::Invalid => "invalid token".to_string(),
            T::EndOfFile => "end of file".to_string(),
            kind => match kind.symbol() {
                Some(text) => format!("'{}'", text),
                None => format!("{:?}", kind),
            },
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Metadata attached to a token. Only the variant matching the
/// token kind is meaningful.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenData<'a> {
    None,
    Int(i64),
    Float(f64),
    Char(char),
    /// Contents between the quotes, escapes left as written.
    Str(&'a str),
    Ident(&'a str),
    Error(SyntaxErrorKind),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub data: TokenData<'a>,
    /// Position of the first byte of the token.
    pub position: SourcePosition,
    /// Size in bytes.
    pub len: usize,
}

impl<'a> Token<'a> {
    #[inline]
    pub fn span(&self) -> crate::position::Span {
        crate::position::Span::new(self.position.index, self.len)
    }

    pub fn ident(&self) -> Option<&'a str> {
        match self.data {
            TokenData::Ident(name) => Some(name),
            _ => None,
        }
    }
}
