//! Unit tests for the lexer module.
//!
//! This module contains tests for tokenization including:
//! - Keywords and identifiers
//! - Numeric literals (integers and floats)
//! - String and character literals with escape sequences
//! - Operators, type sigils and punctuation
//! - Comments
//! - Error cases

use std::rc::Rc;

use super::{
    lexer::tokenize,
    tokens::{Token, TokenKind},
};

fn lex(source: &str) -> Vec<Token> {
    tokenize(source, Rc::new("test.moth".to_string())).unwrap()
}

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source).into_iter().map(|token| token.kind).collect()
}

#[test]
fn test_tokenize_keywords() {
    let tokens = kinds(
        "namespace with public private static foreign func class enum trait impl for global constant local",
    );

    assert_eq!(
        tokens,
        vec![
            TokenKind::Namespace,
            TokenKind::With,
            TokenKind::Public,
            TokenKind::Private,
            TokenKind::Static,
            TokenKind::Foreign,
            TokenKind::Func,
            TokenKind::Class,
            TokenKind::Enum,
            TokenKind::Trait,
            TokenKind::Impl,
            TokenKind::For,
            TokenKind::Global,
            TokenKind::Constant,
            TokenKind::Local,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_expression_keywords() {
    let tokens = kinds("if then else while return and or true false null self ref load");

    assert_eq!(tokens[0], TokenKind::If);
    assert_eq!(tokens[1], TokenKind::Then);
    assert_eq!(tokens[2], TokenKind::Else);
    assert_eq!(tokens[3], TokenKind::While);
    assert_eq!(tokens[4], TokenKind::Return);
    assert_eq!(tokens[5], TokenKind::And);
    assert_eq!(tokens[6], TokenKind::Or);
    assert_eq!(tokens[7], TokenKind::True);
    assert_eq!(tokens[8], TokenKind::False);
    assert_eq!(tokens[9], TokenKind::Null);
    assert_eq!(tokens[10], TokenKind::SelfKw);
    assert_eq!(tokens[11], TokenKind::Ref);
    assert_eq!(tokens[12], TokenKind::Load);
    assert_eq!(tokens[13], TokenKind::EOF);
}

#[test]
fn test_tokenize_identifiers() {
    let tokens = lex("foo bar baz_123 _underscore CamelCase locals");

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].value, "foo");
    assert_eq!(tokens[2].value, "baz_123");
    assert_eq!(tokens[3].value, "_underscore");
    assert_eq!(tokens[4].value, "CamelCase");
    assert_eq!(tokens[5].kind, TokenKind::Identifier);
    assert_eq!(tokens[5].value, "locals");
    assert_eq!(tokens[6].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_numbers() {
    let tokens = lex("42 3.14 0 100.5");

    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].value, "42");
    assert_eq!(tokens[1].value, "3.14");
    assert_eq!(tokens[2].value, "0");
    assert_eq!(tokens[3].value, "100.5");
    assert_eq!(tokens[4].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_strings() {
    let tokens = lex(r#""hello" "multiple words" """#);

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, "hello");
    assert_eq!(tokens[1].value, "multiple words");
    assert_eq!(tokens[2].value, "");
    assert_eq!(tokens[3].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_string_escapes() {
    let tokens = lex(r#""hello\nworld" "tab\there" "backslash\\" "hex\x41" "quote\"test""#);

    assert_eq!(tokens[0].value, "hello\nworld");
    assert_eq!(tokens[1].value, "tab\there");
    assert_eq!(tokens[2].value, "backslash\\");
    assert_eq!(tokens[3].value, "hexA");
    assert_eq!(tokens[4].value, "quote\"test");
    assert_eq!(tokens[5].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_chars() {
    let tokens = lex(r"'a' '\n'");

    assert_eq!(tokens[0].kind, TokenKind::Char);
    assert_eq!(tokens[0].value, "a");
    assert_eq!(tokens[1].kind, TokenKind::Char);
    assert_eq!(tokens[1].value, "\n");
}

#[test]
fn test_tokenize_operators() {
    let tokens = kinds("+ - * / % ^ == != < > <= >= = && || ! &");

    assert_eq!(
        tokens,
        vec![
            TokenKind::Plus,
            TokenKind::Dash,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Percent,
            TokenKind::Caret,
            TokenKind::Equals,
            TokenKind::NotEquals,
            TokenKind::Less,
            TokenKind::Greater,
            TokenKind::LessEquals,
            TokenKind::GreaterEquals,
            TokenKind::Assignment,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Not,
            TokenKind::Ampersand,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_type_sigils() {
    let tokens = kinds(r"#Box<\#i32\>* ?= <- ~~ @Export");

    assert_eq!(
        tokens,
        vec![
            TokenKind::Hash,
            TokenKind::Identifier,
            TokenKind::OpenGeneric,
            TokenKind::Hash,
            TokenKind::Identifier,
            TokenKind::CloseGeneric,
            TokenKind::Star,
            TokenKind::InferAssign,
            TokenKind::Cast,
            TokenKind::Variadic,
            TokenKind::At,
            TokenKind::Identifier,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_punctuation() {
    let tokens = kinds("( ) { } [ ] . , ; :");

    assert_eq!(
        tokens,
        vec![
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::OpenCurly,
            TokenKind::CloseCurly,
            TokenKind::OpenBracket,
            TokenKind::CloseBracket,
            TokenKind::Dot,
            TokenKind::Comma,
            TokenKind::Semicolon,
            TokenKind::Colon,
            TokenKind::EOF,
        ]
    );
}

#[test]
fn test_tokenize_compound_operators() {
    let tokens = kinds("++ -- += -=");

    assert_eq!(tokens[0], TokenKind::PlusPlus);
    assert_eq!(tokens[1], TokenKind::MinusMinus);
    assert_eq!(tokens[2], TokenKind::PlusEquals);
    assert_eq!(tokens[3], TokenKind::MinusEquals);
    assert_eq!(tokens[4], TokenKind::EOF);
}

#[test]
fn test_tokenize_comments() {
    let tokens = lex("local x = 5; // this is a comment\nlocal y = 10;");

    assert_eq!(tokens[0].kind, TokenKind::Local);
    assert_eq!(tokens[1].value, "x");
    assert_eq!(tokens[5].kind, TokenKind::Local);
    assert_eq!(tokens[6].value, "y");
    assert_eq!(tokens[8].value, "10");
    assert_eq!(tokens[10].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_tracks_byte_positions() {
    let tokens = lex("local  value");

    assert_eq!(tokens[0].span.start.0, 0);
    assert_eq!(tokens[0].span.end.0, 5);
    assert_eq!(tokens[1].span.start.0, 7);
    assert_eq!(tokens[1].span.end.0, 12);
    assert_eq!(tokens[1].span.start.1.as_str(), "test.moth");
}

#[test]
fn test_tokenize_function_declaration() {
    let tokens = lex("public func add(a #i32, b #i32) #i32 { return a + b; }");

    assert_eq!(tokens[0].kind, TokenKind::Public);
    assert_eq!(tokens[1].kind, TokenKind::Func);
    assert_eq!(tokens[2].value, "add");
    assert_eq!(tokens[3].kind, TokenKind::OpenParen);
    assert_eq!(tokens[4].value, "a");
    assert_eq!(tokens[5].kind, TokenKind::Hash);
    assert_eq!(tokens[6].value, "i32");
}

#[test]
fn test_tokenize_unrecognized_token() {
    let result = tokenize("local x = $;", Rc::new("test.moth".to_string()));

    let error = result.unwrap_err();
    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().0, 10);
}
