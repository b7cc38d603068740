use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("namespace", TokenKind::Namespace);
        map.insert("with", TokenKind::With);
        map.insert("public", TokenKind::Public);
        map.insert("private", TokenKind::Private);
        map.insert("static", TokenKind::Static);
        map.insert("foreign", TokenKind::Foreign);
        map.insert("func", TokenKind::Func);
        map.insert("class", TokenKind::Class);
        map.insert("enum", TokenKind::Enum);
        map.insert("trait", TokenKind::Trait);
        map.insert("impl", TokenKind::Impl);
        map.insert("for", TokenKind::For);
        map.insert("global", TokenKind::Global);
        map.insert("constant", TokenKind::Constant);
        map.insert("local", TokenKind::Local);
        map.insert("if", TokenKind::If);
        map.insert("then", TokenKind::Then);
        map.insert("else", TokenKind::Else);
        map.insert("while", TokenKind::While);
        map.insert("return", TokenKind::Return);
        map.insert("and", TokenKind::And);
        map.insert("or", TokenKind::Or);
        map.insert("true", TokenKind::True);
        map.insert("false", TokenKind::False);
        map.insert("null", TokenKind::Null);
        map.insert("self", TokenKind::SelfKw);
        map.insert("ref", TokenKind::Ref);
        map.insert("load", TokenKind::Load);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Number,
    String,
    Char,
    Identifier,

    Hash,         // #
    At,           // @
    OpenGeneric,  // <\
    CloseGeneric, // \>
    InferAssign,  // ?=
    Cast,         // <-
    Variadic,     // ~~

    OpenBracket,
    CloseBracket,
    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,

    Assignment, // =
    Equals,     // ==
    Not,        // !
    NotEquals,  // !=

    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    Or,
    And,

    Dot,
    Semicolon,
    Colon,
    Comma,

    PlusPlus,
    MinusMinus,
    PlusEquals,
    MinusEquals,

    Plus,
    Dash,
    Slash,
    Star,
    Percent,
    Caret,
    Ampersand,

    // Reserved
    Namespace,
    With,
    Public,
    Private,
    Static,
    Foreign,
    Func,
    Class,
    Enum,
    Trait,
    Impl,
    For,
    Global,
    Constant,
    Local,
    If,
    Then,
    Else,
    While,
    Return,
    True,
    False,
    Null,
    SelfKw,
    Ref,
    Load,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::String | TokenKind::Identifier | TokenKind::Number | TokenKind::Char => {
                write!(f, "{} ({})", self.kind, self.value)
            }
            _ => write!(f, "{}", self.kind),
        }
    }
}

impl Token {
    pub fn is_one_of(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.kind)
    }
}
