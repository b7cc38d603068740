//! Type parsing implementation.
//!
//! This module handles parsing of type annotations. It supports:
//!
//! - Named types (`#i32`, `#Item`)
//! - Template instances (`#Box<\#i32\>`)
//! - Pointer, reference and array suffixes (`#u8*`, `#Item&`, `#i32[]`)
//! - Function types (`#(#i32, #i32) #bool`)
//!
//! Similar to expression parsing, it uses NUD/LED handlers with
//! binding powers for parsing type suffixes.

use std::collections::HashMap;

use crate::{
    ast::ast::{TemplateArg, TypeRef},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{expr::parse_expr, lookups::BindingPower, parser::Parser};

/// Type alias for type null denotation handler functions.
pub type TypeNUDHandler = fn(&mut Parser) -> Result<TypeRef, Error>;

/// Type alias for type left denotation handler functions.
pub type TypeLEDHandler = fn(&mut Parser, TypeRef, BindingPower) -> Result<TypeRef, Error>;

/// Type alias for type NUD lookup table.
pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;

/// Type alias for type LED lookup table.
pub type TypeLEDLookup = HashMap<TokenKind, TypeLEDHandler>;

/// Type alias for type binding power lookup table.
pub type TypeBPLookup = HashMap<TokenKind, BindingPower>;

/// Initializes the type parsing lookup tables.
pub fn create_token_type_lookups(parser: &mut Parser) {
    parser.type_nud(TokenKind::Hash, parse_hash_type);
    parser.type_led(TokenKind::Star, BindingPower::Call, parse_pointer_type);
    parser.type_led(TokenKind::Ampersand, BindingPower::Call, parse_reference_type);
    parser.type_led(TokenKind::OpenBracket, BindingPower::Call, parse_array_type);
}

pub fn parse_hash_type(parser: &mut Parser) -> Result<TypeRef, Error> {
    let position = parser.expect(TokenKind::Hash)?.span.start;

    if parser.current_token_kind() == TokenKind::OpenParen {
        return parse_function_type(parser, position);
    }

    let name = parser
        .expect_detailed(TokenKind::Identifier, "expected type name after `#`")?
        .value;

    let mut arguments = vec![];
    if parser.eat(TokenKind::OpenGeneric) {
        while parser.current_token_kind() != TokenKind::CloseGeneric {
            if parser.current_token_kind() == TokenKind::Hash {
                arguments.push(TemplateArg::Type(parse_type(parser, BindingPower::Default)?));
            } else {
                arguments.push(TemplateArg::Constant(parse_expr(parser, BindingPower::Comma)?));
            }

            if !parser.eat(TokenKind::Comma) {
                break;
            }
        }

        parser.expect(TokenKind::CloseGeneric)?;
    }

    Ok(TypeRef::Named {
        name,
        arguments,
        position,
    })
}

fn parse_function_type(parser: &mut Parser, position: crate::Position) -> Result<TypeRef, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut params = vec![];
    let mut is_variadic = false;

    while parser.current_token_kind() != TokenKind::CloseParen {
        if parser.eat(TokenKind::Variadic) {
            is_variadic = true;
            break;
        }

        params.push(parse_type(parser, BindingPower::Default)?);

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::CloseParen)?;
    let return_type = parse_type(parser, BindingPower::Default)?;

    Ok(TypeRef::Function {
        params,
        return_type: Box::new(return_type),
        is_variadic,
        position,
    })
}

pub fn parse_pointer_type(
    parser: &mut Parser,
    left: TypeRef,
    _bp: BindingPower,
) -> Result<TypeRef, Error> {
    parser.expect(TokenKind::Star)?;
    Ok(TypeRef::Pointer(Box::new(left)))
}

pub fn parse_reference_type(
    parser: &mut Parser,
    left: TypeRef,
    _bp: BindingPower,
) -> Result<TypeRef, Error> {
    parser.expect(TokenKind::Ampersand)?;
    Ok(TypeRef::Reference(Box::new(left)))
}

pub fn parse_array_type(
    parser: &mut Parser,
    left: TypeRef,
    _bp: BindingPower,
) -> Result<TypeRef, Error> {
    parser.expect(TokenKind::OpenBracket)?;
    parser.expect(TokenKind::CloseBracket)?;

    Ok(TypeRef::Array(Box::new(left)))
}

pub fn parse_type(parser: &mut Parser, bp: BindingPower) -> Result<TypeRef, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let Some(nud) = parser.get_type_nud_lookup().get(&token_kind).copied() else {
        return Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected a type"),
            },
            parser.get_position(),
        ));
    };

    let mut left = nud(parser)?;

    // While the next suffix binds tighter than bp, keep wrapping lhs
    while let Some(next_bp) = parser
        .get_type_bp_lookup()
        .get(&parser.current_token_kind())
        .copied()
    {
        if next_bp <= bp {
            break;
        }

        let token_kind = parser.current_token_kind();
        let Some(led) = parser.get_type_led_lookup().get(&token_kind).copied() else {
            break;
        };

        // An `[` that is not followed by `]` belongs to an expression
        if token_kind == TokenKind::OpenBracket && parser.peek_kind(1) != TokenKind::CloseBracket {
            break;
        }

        left = led(parser, left, next_bp)?;
    }

    Ok(left)
}
