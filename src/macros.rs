//! Utility macros for the compiler.
//!
//! This module defines helper macros used throughout the compiler:
//!
//! - `MK_TOKEN!` - Creates a Token instance
//! - `MK_DEFAULT_HANDLER!` - Creates a default lexer handler for simple tokens
//! - `MK_POSITIONED_ERROR!` - Creates an Error at a position
//!
//! These macros reduce boilerplate in the lexer and compiler.

/// Creates a Token instance.
///
/// # Arguments
///
/// * `$kind` - The TokenKind
/// * `$value` - The token's string value
/// * `$span` - The source span
///
/// # Example
///
/// ```ignore
/// let token = MK_TOKEN!(TokenKind::Number, "42".to_string(), span);
/// ```
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $value:expr, $span:expr) => {
        Token {
            kind: $kind,
            value: $value,
            span: $span,
        }
    };
}

/// Creates a default lexer handler for fixed-text tokens.
///
/// Generates a handler function that pushes a token with the given kind
/// spanning the matched text and advances the lexer past it.
///
/// # Example
///
/// ```ignore
/// RegexPattern {
///     regex: Regex::new("^<-").unwrap(),
///     handler: MK_DEFAULT_HANDLER!(TokenKind::Cast, "<-"),
/// }
/// ```
#[macro_export]
macro_rules! MK_DEFAULT_HANDLER {
    ($kind:expr, $value:literal) => {
        |lexer: &mut Lexer, _matched: &str| {
            let span = lexer.span_of($value.len());
            lexer.push(MK_TOKEN!($kind, String::from($value), span));
            lexer.advance_n($value.len());
        }
    };
}

/// Creates an [`Error`](crate::errors::errors::Error) from an `ErrorImpl`
/// variant and a position.
///
/// # Example
///
/// ```ignore
/// return Err(MK_POSITIONED_ERROR!(UnknownType { type_: name }, position));
/// ```
#[macro_export]
macro_rules! MK_POSITIONED_ERROR {
    ($variant:ident { $($field:ident : $value:expr),* $(,)? }, $position:expr) => {
        $crate::errors::errors::Error::new(
            $crate::errors::errors::ErrorImpl::$variant { $($field: $value),* },
            $position.clone(),
        )
    };
}
