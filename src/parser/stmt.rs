use crate::{
    ast::ast::Stmt,
    errors::errors::Error,
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
    Span,
};

use super::{parser::Parser, types::parse_type};

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    if let Some(handler) = parser
        .get_stmt_lookup()
        .get(&parser.current_token_kind())
        .copied()
    {
        return handler(parser);
    }

    let expr = parse_expr(parser, BindingPower::Default)?;

    parser.expect_detailed(TokenKind::Semicolon, "expected `;` after expression")?;

    Ok(Stmt::Expression(expr))
}

/// Parses `{ ... }` and returns the statements inside.
pub fn parse_block(parser: &mut Parser) -> Result<Vec<Stmt>, Error> {
    parser.expect_detailed(TokenKind::OpenCurly, "expected `{`")?;

    let mut statements = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        if !parser.has_tokens() {
            parser.expect_detailed(TokenKind::CloseCurly, "unterminated block")?;
        }
        statements.push(parse_stmt(parser)?);
    }

    parser.expect(TokenKind::CloseCurly)?;
    Ok(statements)
}

pub fn parse_local_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let name = parser
        .expect_detailed(TokenKind::Identifier, "expected identifier during local declaration")?
        .value;

    let (type_ref, value) = if parser.eat(TokenKind::InferAssign) {
        (None, Some(parse_expr(parser, BindingPower::Default)?))
    } else {
        let type_ref = parse_type(parser, BindingPower::Default)?;
        let value = if parser.eat(TokenKind::Assignment) {
            Some(parse_expr(parser, BindingPower::Default)?)
        } else {
            None
        };

        (Some(type_ref), value)
    };

    parser.expect_detailed(TokenKind::Semicolon, "expected `;` after local declaration")?;

    Ok(Stmt::Local {
        name,
        type_ref,
        value,
        span: Span {
            start,
            end: parser.get_end_position(),
        },
    })
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let condition = parse_expr(parser, BindingPower::Default)?;
    let then_body = parse_block(parser)?;

    let else_body = if parser.eat(TokenKind::Else) {
        if parser.current_token_kind() == TokenKind::If {
            Some(vec![parse_if_stmt(parser)?])
        } else {
            Some(parse_block(parser)?)
        }
    } else {
        None
    };

    Ok(Stmt::If {
        condition,
        then_body,
        else_body,
        span: Span {
            start,
            end: parser.get_end_position(),
        },
    })
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let condition = parse_expr(parser, BindingPower::Default)?;
    let body = parse_block(parser)?;

    Ok(Stmt::While {
        condition,
        body,
        span: Span {
            start,
            end: parser.get_end_position(),
        },
    })
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.get_position();
    let body = parse_block(parser)?;

    Ok(Stmt::Block(
        body,
        Span {
            start,
            end: parser.get_end_position(),
        },
    ))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start.clone();

    let value = if parser.current_token_kind() != TokenKind::Semicolon {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    parser.expect_detailed(TokenKind::Semicolon, "expected `;` after return")?;

    Ok(Stmt::Return {
        value,
        span: Span {
            start,
            end: parser.get_end_position(),
        },
    })
}
