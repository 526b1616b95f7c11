//! Lexical analysis (tokenizer)
//!
//! Tokens are produced on demand and borrow from the source text, so the
//! tokenizer itself never allocates.
use log::{trace, warn};
use thiserror::Error;

use crate::{
    position::{SourceLocation, SourcePosition},
    tokens::{Token, TokenData, TokenKind, KEYWORDS, OPERATORS},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("invalid number literal")]
    InvalidNumber,
    #[error("number literal contains more than one decimal point")]
    MultipleDecimalPoints,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated char literal")]
    UnterminatedChar,
    #[error("unexpected character")]
    UnexpectedCharacter,
}

/// Receiver of lexical errors.
///
/// Any closure taking `(kind, source_name, source, position)` is a reporter.
pub trait SyntaxErrorReporter {
    fn report(&mut self, kind: SyntaxErrorKind, source_name: &str, source: &str, position: SourcePosition);
}

impl<F> SyntaxErrorReporter for F
where
    F: FnMut(SyntaxErrorKind, &str, &str, SourcePosition),
{
    fn report(&mut self, kind: SyntaxErrorKind, source_name: &str, source: &str, position: SourcePosition) {
        self(kind, source_name, source, position)
    }
}

/// Reporter that writes syntax errors to the log.
pub fn log_syntax_error(kind: SyntaxErrorKind, source_name: &str, _source: &str, position: SourcePosition) {
    warn!("{}: syntax error: {}", SourceLocation::new(source_name, position), kind);
}

/// Lexical analyzer.
pub struct TokenIter<'a, 'r> {
    source_name: &'a str,
    source: &'a str,
    reporter: &'r mut dyn SyntaxErrorReporter,
    /// Position of the next byte to scan.
    position: SourcePosition,
    /// Kind of the most recently scanned token, used to disambiguate
    /// `&`, `*` and `-`.
    previous: Option<TokenKind>,
    current: Option<Token<'a>>,
    peeked: Option<Token<'a>>,
    finished: bool,
}

impl<'a, 'r> TokenIter<'a, 'r> {
    pub fn new(source_name: &'a str, source: &'a str, reporter: &'r mut dyn SyntaxErrorReporter) -> Self {
        Self {
            source_name,
            source,
            reporter,
            position: SourcePosition::start(),
            previous: None,
            current: None,
            peeked: None,
            finished: false,
        }
    }

    #[inline]
    pub fn source(&self) -> &'a str {
        self.source
    }

    #[inline]
    pub fn source_name(&self) -> &'a str {
        self.source_name
    }

    /// The most recently consumed token.
    #[inline]
    pub fn current(&self) -> Option<&Token<'a>> {
        self.current.as_ref()
    }

    /// Position of the next token that would be consumed.
    pub fn position(&mut self) -> SourcePosition {
        self.peek().position
    }

    /// Location of the most recently consumed token, or the start of
    /// the file when nothing was consumed yet.
    pub fn location(&self) -> SourceLocation {
        let position = self
            .current
            .map(|token| token.position)
            .unwrap_or_else(SourcePosition::start);
        SourceLocation::new(self.source_name, position)
    }

    /// Consume and return the next token.
    ///
    /// Keeps returning [`TokenKind::EndOfFile`] once the source is exhausted.
    pub fn next_token(&mut self) -> Token<'a> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.scan(),
        };
        self.current = Some(token);
        token
    }

    /// Return the next token without consuming it.
    ///
    /// The token is cached, so any error is only reported once.
    pub fn peek(&mut self) -> Token<'a> {
        match self.peeked {
            Some(token) => token,
            None => {
                let token = self.scan();
                self.peeked = Some(token);
                token
            }
        }
    }

    #[inline]
    pub fn peek_kind(&mut self) -> TokenKind {
        self.peek().kind
    }

    #[inline]
    fn rest(&self) -> &'a str {
        &self.source[self.position.index..]
    }

    fn advance(&mut self, len: usize) {
        let start = self.position.index;
        let consumed = &self.source[start..start + len];
        self.position.advance(consumed);
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let skip = match rest.as_bytes() {
                [b' ' | b'\t' | b'\r' | b'\n', ..] => rest
                    .bytes()
                    .take_while(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
                    .count(),
                [b'/', b'/', ..] => rest.find('\n').unwrap_or(rest.len()),
                [b'/', b'*', ..] => rest[2..].find("*/").map(|i| i + 4).unwrap_or(rest.len()),
                _ => break,
            };
            self.advance(skip);
        }
    }

    #[rustfmt::skip]
    fn scan(&mut self) -> Token<'a> {
        use TokenKind as T;

        self.skip_trivia();

        let start = self.position;
        let rest = self.rest();
        let previous = self.previous;
        let value_before = previous.map(|kind| kind.ends_value()).unwrap_or(false);

        let (kind, data, len) = match rest.as_bytes() {
            []                                          => (T::EndOfFile, TokenData::None, 0),
            [b'a'..=b'z' | b'A'..=b'Z' | b'_', ..]      => self.scan_word(rest),
            [b'0'..=b'9', ..]                           => self.scan_number(rest, false),
            [b'"', ..]                                  => self.scan_string(rest),
            [b'\'', ..]                                 => self.scan_char(rest),
            [b'&', next @ ..] if !matches!(next.first(), Some(b'&' | b'=')) => {
                // Floats can't be bitwise operands, so only integers count here.
                let binary = matches!(previous, Some(T::IntLiteral | T::Identifier | T::RightParen | T::RightBracket));
                (if binary { T::BitAnd } else { T::Reference }, TokenData::None, 1)
            }
            [b'*', next @ ..] if next.first() != Some(&b'=') => {
                (if value_before { T::Multiply } else { T::Pointer }, TokenData::None, 1)
            }
            [b'-', next @ ..] if !matches!(next.first(), Some(b'=' | b'>')) => {
                // Without a digit there is no literal, leave it to the parser.
                if value_before || !matches!(next.first(), Some(b'0'..=b'9' | b'.')) {
                    (T::Subtract, TokenData::None, 1)
                } else {
                    self.scan_number(rest, true)
                }
            }
            _                                           => self.scan_operator(rest),
        };

        let token = Token {
            kind,
            data,
            position: start,
            len,
        };
        trace!("{:>4}:{:<3} {:?} {:?}", start.line, start.column, kind, &rest[..len]);

        self.advance(len);
        self.previous = Some(kind);
        token
    }

    /// Report an error and produce the data of an invalid token.
    ///
    /// `offset` is where inside `rest` the error was detected, `len` how
    /// much input the invalid token swallows.
    #[cold]
    fn invalid(&mut self, kind: SyntaxErrorKind, rest: &str, offset: usize, len: usize) -> (TokenKind, TokenData<'a>, usize) {
        let at = self.position.advanced(&rest[..offset]);
        self.reporter.report(kind, self.source_name, self.source, at);
        (TokenKind::Invalid, TokenData::Error(kind), len)
    }

    fn scan_word(&mut self, rest: &'a str) -> (TokenKind, TokenData<'a>, usize) {
        let len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        let word = &rest[..len];

        match KEYWORDS.iter().find(|(keyword, _)| *keyword == word) {
            Some((_, kind)) => (*kind, TokenData::None, len),
            None => (TokenKind::Identifier, TokenData::Ident(word), len),
        }
    }

    /// Scan a numeric literal, with `rest` starting at the sign when
    /// `negative` is set.
    fn scan_number(&mut self, rest: &'a str, negative: bool) -> (TokenKind, TokenData<'a>, usize) {
        let body_start = negative as usize;
        let len = body_start
            + rest[body_start..]
                .bytes()
                .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'.')
                .count();
        let text = &rest[..len];
        let body = &text[body_start..];

        if let Some(offset) = body.bytes().position(|b| b.is_ascii_alphabetic() || b == b'_') {
            return self.invalid(SyntaxErrorKind::InvalidNumber, rest, body_start + offset, len);
        }
        if !body.bytes().any(|b| b.is_ascii_digit()) {
            return self.invalid(SyntaxErrorKind::InvalidNumber, rest, 0, len);
        }

        let mut dots = body.match_indices('.');
        if dots.next().is_some() {
            if let Some((offset, _)) = dots.next() {
                return self.invalid(SyntaxErrorKind::MultipleDecimalPoints, rest, body_start + offset, len);
            }
            return self.parse_float(text, rest);
        }

        let mut value: i64 = 0;
        for digit in body.bytes() {
            let digit = (digit - b'0') as i64;
            let next = value.checked_mul(10).and_then(|value| {
                if negative {
                    value.checked_sub(digit)
                } else {
                    value.checked_add(digit)
                }
            });

            match next {
                Some(next) => value = next,
                // Too large for an integer, promote to the nearest float.
                None => return self.parse_float(text, rest),
            }
        }

        (TokenKind::IntLiteral, TokenData::Int(value), len)
    }

    fn parse_float(&mut self, text: &str, rest: &'a str) -> (TokenKind, TokenData<'a>, usize) {
        match text.parse::<f64>() {
            Ok(value) => (TokenKind::FloatLiteral, TokenData::Float(value), text.len()),
            Err(_) => self.invalid(SyntaxErrorKind::InvalidNumber, rest, 0, text.len()),
        }
    }

    fn scan_string(&mut self, rest: &'a str) -> (TokenKind, TokenData<'a>, usize) {
        let bytes = rest.as_bytes();
        let mut i = 1;

        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'"' => return (TokenKind::StringLiteral, TokenData::Str(&rest[1..i]), i + 1),
                _ => i += 1,
            }
        }

        self.invalid(SyntaxErrorKind::UnterminatedString, rest, 0, rest.len())
    }

    fn scan_char(&mut self, rest: &'a str) -> (TokenKind, TokenData<'a>, usize) {
        let mut chars = rest[1..].char_indices();

        let (value, after) = match chars.next() {
            Some((_, '\\')) => match chars.next() {
                Some((i, c)) => (unescape(c), 1 + i + c.len_utf8()),
                None => return self.invalid(SyntaxErrorKind::UnterminatedChar, rest, 0, rest.len()),
            },
            Some((_, '\'')) => return self.invalid(SyntaxErrorKind::UnterminatedChar, rest, 0, 2),
            Some((_, '\n')) | None => return self.invalid(SyntaxErrorKind::UnterminatedChar, rest, 0, 1),
            Some((i, c)) => (c, 1 + i + c.len_utf8()),
        };

        if rest[after..].starts_with('\'') {
            (TokenKind::CharLiteral, TokenData::Char(value), after + 1)
        } else {
            self.invalid(SyntaxErrorKind::UnterminatedChar, rest, 0, after)
        }
    }

    fn scan_operator(&mut self, rest: &'a str) -> (TokenKind, TokenData<'a>, usize) {
        match OPERATORS.iter().find(|(text, _)| rest.starts_with(text)) {
            Some((text, kind)) => (*kind, TokenData::None, text.len()),
            None => {
                let len = rest.chars().next().map(char::len_utf8).unwrap_or(1);
                self.invalid(SyntaxErrorKind::UnexpectedCharacter, rest, 0, len)
            }
        }
    }
}

#[inline]
pub(crate) fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}

/// Yields every token up to and including the end-of-file token.
impl<'a, 'r> Iterator for TokenIter<'a, 'r> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let token = self.next_token();
        if token.kind == TokenKind::EndOfFile {
            self.finished = true;
        }
        Some(token)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut ignore = |_: SyntaxErrorKind, _: &str, _: &str, _: SourcePosition| {};
        TokenIter::new("test", source, &mut ignore).map(|token| token.kind).collect()
    }

    #[test]
    fn test_keyword_prefix() {
        use TokenKind as T;
        assert_eq!(kinds("if iffy returns return"), vec![T::If, T::Identifier, T::Identifier, T::Return, T::EndOfFile]);
    }

    #[test]
    fn test_longest_operator() {
        use TokenKind as T;
        assert_eq!(kinds("<<= << < <= ->"), vec![T::ShiftLeftAssign, T::ShiftLeft, T::Less, T::LessEqual, T::Arrow, T::EndOfFile]);
    }

    #[test]
    fn test_comments() {
        use TokenKind as T;
        assert_eq!(kinds("a // line\n/* block\n */ b / c"), vec![T::Identifier, T::Identifier, T::Divide, T::Identifier, T::EndOfFile]);
    }

    #[test]
    fn test_peek_caches() {
        let mut count = 0;
        let mut reporter = |_: SyntaxErrorKind, _: &str, _: &str, _: SourcePosition| count += 1;
        let mut iter = TokenIter::new("test", "1.2.3 x", &mut reporter);

        assert_eq!(iter.peek_kind(), TokenKind::Invalid);
        assert_eq!(iter.peek_kind(), TokenKind::Invalid);
        assert_eq!(iter.next_token().kind, TokenKind::Invalid);
        assert_eq!(iter.next_token().kind, TokenKind::Identifier);
        drop(iter);

        assert_eq!(count, 1);
    }

    #[test]
    fn test_positions() {
        let mut ignore = |_: SyntaxErrorKind, _: &str, _: &str, _: SourcePosition| {};
        let tokens = TokenIter::new("test", "a\n\tbc = 1", &mut ignore).collect::<Vec<_>>();

        assert_eq!(tokens[1].position, SourcePosition { index: 3, line: 2, column: 5 });
        assert_eq!(tokens[1].len, 2);
        assert_eq!(tokens[2].position.column, 8);
        assert_eq!(tokens[4].position.index, 9);
    }
}
