use crate::{
    ast::ast::{BinaryOp, Expr, ExprKind, Literal, UnaryOp},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Span,
};

use super::{lookups::BindingPower, parser::Parser, types::parse_type};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let Some(nud) = parser.get_nud_lookup().get(&token_kind).copied() else {
        return Err(Error::new(
            ErrorImpl::UnexpectedToken {
                token: parser.current_token().value.clone(),
            },
            parser.get_position(),
        ));
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    while let Some(next_bp) = parser.get_bp_lookup().get(&parser.current_token_kind()).copied() {
        if next_bp <= bp {
            break;
        }

        let token_kind = parser.current_token_kind();
        let Some(led) = parser.get_led_lookup().get(&token_kind).copied() else {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: parser.current_token().value.clone(),
                },
                parser.get_position(),
            ));
        };

        left = led(parser, left, next_bp)?;
    }

    Ok(left)
}

fn span_from(parser: &Parser, start: &Span) -> Span {
    Span {
        start: start.start.clone(),
        end: parser.get_end_position(),
    }
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.advance().clone();

    let kind = match token.kind {
        TokenKind::Number if token.value.contains('.') => match token.value.parse::<f64>() {
            Ok(value) => ExprKind::Literal(Literal::Float(value)),
            Err(_) => {
                return Err(Error::new(
                    ErrorImpl::NumberParseError { token: token.value },
                    token.span.start,
                ))
            }
        },
        TokenKind::Number => match token.value.parse::<i64>() {
            Ok(value) => ExprKind::Literal(Literal::Int(value)),
            Err(_) => {
                return Err(Error::new(
                    ErrorImpl::NumberParseError { token: token.value },
                    token.span.start,
                ))
            }
        },
        TokenKind::String => ExprKind::Literal(Literal::String(token.value.clone())),
        TokenKind::Char => match token.value.as_bytes() {
            [byte] => ExprKind::Literal(Literal::Char(*byte)),
            _ => {
                return Err(Error::new(
                    ErrorImpl::UnexpectedTokenDetailed {
                        token: token.value,
                        message: String::from("character literals hold a single byte"),
                    },
                    token.span.start,
                ))
            }
        },
        TokenKind::True => ExprKind::Literal(Literal::Bool(true)),
        TokenKind::False => ExprKind::Literal(Literal::Bool(false)),
        TokenKind::Null => ExprKind::Literal(Literal::Null),
        TokenKind::SelfKw => ExprKind::SelfRef,
        TokenKind::Identifier => ExprKind::Symbol(token.value.clone()),
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken { token: token.value },
                token.span.start,
            ))
        }
    };

    Ok(Expr::new(kind, token.span))
}

pub fn parse_binary_expr(parser: &mut Parser, left: Expr, bp: BindingPower) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();

    let op = match operator_token.kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Dash => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::Caret => BinaryOp::Pow,
        TokenKind::Equals => BinaryOp::Eq,
        TokenKind::NotEquals => BinaryOp::NotEq,
        TokenKind::Greater => BinaryOp::Gt,
        TokenKind::Less => BinaryOp::Lt,
        TokenKind::GreaterEquals => BinaryOp::GtEq,
        TokenKind::LessEquals => BinaryOp::LtEq,
        TokenKind::And => BinaryOp::And,
        TokenKind::Or => BinaryOp::Or,
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: operator_token.value,
                },
                operator_token.span.start,
            ))
        }
    };

    // Exponentiation is right associative
    let right_bp = if op == BinaryOp::Pow {
        BindingPower::Multiplicative
    } else {
        bp
    };
    let right = parse_expr(parser, right_bp)?;

    let span = Span {
        start: left.span.start.clone(),
        end: right.span.end.clone(),
    };

    Ok(Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    ))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    let operand = parse_expr(parser, BindingPower::Unary)?;
    let span = span_from(parser, &operator_token.span);

    let kind = match operator_token.kind {
        TokenKind::Dash => match operand.kind {
            ExprKind::Literal(Literal::Int(value)) => ExprKind::Literal(Literal::Int(-value)),
            ExprKind::Literal(Literal::Float(value)) => ExprKind::Literal(Literal::Float(-value)),
            _ => ExprKind::Unary {
                op: UnaryOp::Negate,
                operand: Box::new(operand),
            },
        },
        TokenKind::Not => ExprKind::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        },
        TokenKind::Ref => ExprKind::AddressOf(Box::new(operand)),
        TokenKind::Load => ExprKind::Dereference(Box::new(operand)),
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: operator_token.value,
                },
                operator_token.span.start,
            ))
        }
    };

    Ok(Expr::new(kind, span))
}

pub fn parse_assignment_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();
    // Right associative: `a = b = c` assigns `c` to `b` first
    let rhs = parse_expr(parser, BindingPower::Comma)?;

    let span = Span {
        start: left.span.start.clone(),
        end: rhs.span.end.clone(),
    };

    let value = match operator_token.kind {
        TokenKind::PlusEquals | TokenKind::MinusEquals => Expr::new(
            ExprKind::Binary {
                op: if operator_token.kind == TokenKind::PlusEquals {
                    BinaryOp::Add
                } else {
                    BinaryOp::Sub
                },
                left: Box::new(left.clone()),
                right: Box::new(rhs),
            },
            span.clone(),
        ),
        _ => rhs,
    };

    Ok(Expr::new(
        ExprKind::Assignment {
            assignee: Box::new(left),
            value: Box::new(value),
        },
        span,
    ))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Expr, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(expr)
}

fn parse_arguments(parser: &mut Parser, close: TokenKind) -> Result<Vec<Expr>, Error> {
    let mut args = vec![];

    while parser.current_token_kind() != close {
        args.push(parse_expr(parser, BindingPower::Comma)?);

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(close)?;
    Ok(args)
}

pub fn parse_call_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let arguments = parse_arguments(parser, TokenKind::CloseParen)?;
    let span = span_from(parser, &left.span);

    Ok(Expr::new(
        ExprKind::Call {
            callee: Box::new(left),
            arguments,
        },
        span,
    ))
}

pub fn parse_index_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.expect(TokenKind::OpenBracket)?;
    let index = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseBracket)?;
    let span = span_from(parser, &left.span);

    Ok(Expr::new(
        ExprKind::Index {
            object: Box::new(left),
            index: Box::new(index),
        },
        span,
    ))
}

pub fn parse_increment_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let increment = parser.advance().kind == TokenKind::PlusPlus;
    let span = span_from(parser, &left.span);

    Ok(Expr::new(
        ExprKind::Increment {
            operand: Box::new(left),
            increment,
        },
        span,
    ))
}

pub fn parse_member_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.expect(TokenKind::Dot)?;
    let member = parser
        .expect_detailed(TokenKind::Identifier, "expected member name after `.`")?
        .value;
    let span = span_from(parser, &left.span);

    Ok(Expr::new(
        ExprKind::Member {
            object: Box::new(left),
            member,
        },
        span,
    ))
}

pub fn parse_array_literal_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.current_token().span.clone();
    parser.expect(TokenKind::OpenBracket)?;
    let elements = parse_arguments(parser, TokenKind::CloseBracket)?;

    Ok(Expr::new(ExprKind::ArrayLiteral(elements), span_from(parser, &start)))
}

/// Parses an expression that starts with a type: a cast (`#T <- value`) or
/// a static access (`#T.member`).
pub fn parse_type_led_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.current_token().span.clone();
    let type_ref = parse_type(parser, BindingPower::Default)?;

    if parser.eat(TokenKind::Cast) {
        let value = parse_expr(parser, BindingPower::Unary)?;

        return Ok(Expr::new(
            ExprKind::Cast {
                type_ref,
                value: Box::new(value),
            },
            span_from(parser, &start),
        ));
    }

    parser.expect_detailed(TokenKind::Dot, "expected `<-` or `.` after type")?;
    let member = parser
        .expect_detailed(TokenKind::Identifier, "expected static member name")?
        .value;

    Ok(Expr::new(
        ExprKind::StaticAccess { type_ref, member },
        span_from(parser, &start),
    ))
}

pub fn parse_inline_if_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.current_token().span.clone();
    parser.expect(TokenKind::If)?;

    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect_detailed(TokenKind::Then, "expected `then` in inline if")?;
    let then_value = parse_expr(parser, BindingPower::Default)?;
    parser.expect_detailed(TokenKind::Else, "inline if requires an `else` value")?;
    let else_value = parse_expr(parser, BindingPower::Default)?;

    Ok(Expr::new(
        ExprKind::InlineIf {
            condition: Box::new(condition),
            then_value: Box::new(then_value),
            else_value: Box::new(else_value),
        },
        span_from(parser, &start),
    ))
}
