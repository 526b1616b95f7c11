mod common;

use pretty_assertions::assert_eq;
use sable_compiler::{
    lex::{SyntaxErrorKind, TokenIter},
    position::SourcePosition,
    tokens::{Token, TokenData, TokenKind as T},
};

fn lex(source: &str) -> (Vec<Token<'_>>, Vec<SyntaxErrorKind>) {
    common::init_logging();

    let mut errors = Vec::new();
    let tokens = {
        let mut reporter = |kind: SyntaxErrorKind, _: &str, _: &str, _: SourcePosition| errors.push(kind);
        TokenIter::new("test.sable", source, &mut reporter).collect::<Vec<_>>()
    };
    (tokens, errors)
}

fn kinds(source: &str) -> Vec<T> {
    lex(source).0.iter().map(|token| token.kind).collect()
}

#[test]
fn test_integer_limits() {
    let (tokens, errors) = lex("-9223372036854775808 9223372036854775807");
    assert!(errors.is_empty());
    assert_eq!(tokens[0].data, TokenData::Int(i64::MIN));
    assert_eq!(tokens[1].data, TokenData::Int(i64::MAX));
    assert_eq!(tokens[2].kind, T::EndOfFile);
}

#[test]
fn test_integer_overflow_promotes_to_float() {
    let (tokens, errors) = lex("9223372036854775808");
    assert!(errors.is_empty());
    assert_eq!(tokens[0].kind, T::FloatLiteral);
    assert_eq!(tokens[0].data, TokenData::Float(9223372036854775808.0));
}

#[test]
fn test_float_literals() {
    let (tokens, _) = lex("3.14");
    match tokens[0].data {
        TokenData::Float(value) => assert!((value - 3.14).abs() < f64::EPSILON),
        other => panic!("expected float, found {:?}", other),
    }
}

#[test]
fn test_invalid_numbers() {
    let (tokens, errors) = lex("1.2.3 12ab");
    assert_eq!(
        errors,
        vec![SyntaxErrorKind::MultipleDecimalPoints, SyntaxErrorKind::InvalidNumber]
    );
    assert_eq!(tokens[0].kind, T::Invalid);
    assert_eq!(tokens[0].data, TokenData::Error(SyntaxErrorKind::MultipleDecimalPoints));
    // The whole literal is swallowed.
    assert_eq!(tokens[0].len, 5);
    assert_eq!(tokens[1].kind, T::Invalid);
    assert_eq!(tokens[2].kind, T::EndOfFile);
}

#[test]
fn test_ampersand() {
    assert_eq!(kinds("a & b"), vec![T::Identifier, T::BitAnd, T::Identifier, T::EndOfFile]);
    assert_eq!(kinds("1 & 2"), vec![T::IntLiteral, T::BitAnd, T::IntLiteral, T::EndOfFile]);
    assert_eq!(kinds("(a) & b"), vec![T::LeftParen, T::Identifier, T::RightParen, T::BitAnd, T::Identifier, T::EndOfFile]);
    assert_eq!(kinds("= &a"), vec![T::Assign, T::Reference, T::Identifier, T::EndOfFile]);
    assert_eq!(kinds("1.5 &a"), vec![T::FloatLiteral, T::Reference, T::Identifier, T::EndOfFile]);
    assert_eq!(kinds("a && b &= c"), vec![T::Identifier, T::And, T::Identifier, T::BitAndAssign, T::Identifier, T::EndOfFile]);
}

#[test]
fn test_start_of_input() {
    assert_eq!(kinds("&a"), vec![T::Reference, T::Identifier, T::EndOfFile]);
    assert_eq!(kinds("*a"), vec![T::Pointer, T::Identifier, T::EndOfFile]);

    let (tokens, errors) = lex("-5");
    assert!(errors.is_empty());
    assert_eq!(tokens[0].kind, T::IntLiteral);
    assert_eq!(tokens[0].data, TokenData::Int(-5));
    assert_eq!(tokens[0].len, 2);
}

#[test]
fn test_asterisk() {
    assert_eq!(kinds("x * y"), vec![T::Identifier, T::Multiply, T::Identifier, T::EndOfFile]);
    assert_eq!(kinds("2.0 * y"), vec![T::FloatLiteral, T::Multiply, T::Identifier, T::EndOfFile]);
    assert_eq!(kinds("= *p"), vec![T::Assign, T::Pointer, T::Identifier, T::EndOfFile]);
    assert_eq!(kinds("x *= 2"), vec![T::Identifier, T::MultiplyAssign, T::IntLiteral, T::EndOfFile]);
}

#[test]
fn test_minus() {
    let (tokens, _) = lex("x - 1");
    assert_eq!(tokens[1].kind, T::Subtract);
    assert_eq!(tokens[2].data, TokenData::Int(1));

    let (tokens, _) = lex("x = -1");
    assert_eq!(tokens[2].kind, T::IntLiteral);
    assert_eq!(tokens[2].data, TokenData::Int(-1));

    let (tokens, _) = lex("(x)-1");
    assert_eq!(tokens[3].kind, T::Subtract);

    assert_eq!(kinds("a -= 1"), vec![T::Identifier, T::SubtractAssign, T::IntLiteral, T::EndOfFile]);
    assert_eq!(kinds("-.5"), vec![T::FloatLiteral, T::EndOfFile]);
    assert_eq!(kinds("fn f() -> int"), vec![T::Fn, T::Identifier, T::LeftParen, T::RightParen, T::Arrow, T::Int, T::EndOfFile]);
}

#[test]
fn test_minus_without_digit() {
    // Negating a variable is not a literal.
    let (tokens, errors) = lex("x = -y");
    assert!(errors.is_empty());
    assert_eq!(
        tokens.iter().map(|token| token.kind).collect::<Vec<_>>(),
        vec![T::Identifier, T::Assign, T::Subtract, T::Identifier, T::EndOfFile]
    );
    assert_eq!(tokens[3].data, TokenData::Ident("y"));
    assert_eq!(kinds("- 1"), vec![T::Subtract, T::IntLiteral, T::EndOfFile]);
}

#[test]
fn test_longest_operator_wins() {
    assert_eq!(
        kinds("<<= >>= << >> <= >= == != || |="),
        vec![
            T::ShiftLeftAssign,
            T::ShiftRightAssign,
            T::ShiftLeft,
            T::ShiftRight,
            T::LessEqual,
            T::GreaterEqual,
            T::Equal,
            T::NotEqual,
            T::Or,
            T::BitOrAssign,
            T::EndOfFile,
        ]
    );
    assert_eq!(kinds("a::b"), vec![T::Identifier, T::DoubleColon, T::Identifier, T::EndOfFile]);
}

#[test]
fn test_keywords_and_identifiers() {
    let (tokens, _) = lex("while whiles _tmp");
    assert_eq!(tokens[0].kind, T::While);
    assert_eq!(tokens[1].ident(), Some("whiles"));
    assert_eq!(tokens[2].ident(), Some("_tmp"));
}

#[test]
fn test_string_and_char_literals() {
    let (tokens, errors) = lex(r#""a\"b" '\n' 'x'"#);
    assert!(errors.is_empty());
    assert_eq!(tokens[0].data, TokenData::Str(r#"a\"b"#));
    assert_eq!(tokens[1].data, TokenData::Char('\n'));
    assert_eq!(tokens[2].data, TokenData::Char('x'));
}

#[test]
fn test_unterminated_literals() {
    let (tokens, errors) = lex("\"abc");
    assert_eq!(errors, vec![SyntaxErrorKind::UnterminatedString]);
    assert_eq!(tokens[0].kind, T::Invalid);
    assert_eq!(tokens[1].kind, T::EndOfFile);

    let (_, errors) = lex("'ab'");
    assert_eq!(errors.first(), Some(&SyntaxErrorKind::UnterminatedChar));
}

#[test]
fn test_unexpected_character_continues() {
    let (tokens, errors) = lex("a # b");
    assert_eq!(errors, vec![SyntaxErrorKind::UnexpectedCharacter]);
    assert_eq!(
        tokens.iter().map(|token| token.kind).collect::<Vec<_>>(),
        vec![T::Identifier, T::Invalid, T::Identifier, T::EndOfFile]
    );
}

#[test]
fn test_comments_and_positions() {
    let (tokens, _) = lex("// line\nfn /* block\n */ main\n\tx");

    assert_eq!(tokens[0].kind, T::Fn);
    assert_eq!((tokens[0].position.line, tokens[0].position.column), (2, 1));
    assert_eq!((tokens[1].position.line, tokens[1].position.column), (3, 5));
    assert_eq!((tokens[2].position.line, tokens[2].position.column), (4, 5));
    assert_eq!(tokens[2].position.index, 30);
}
