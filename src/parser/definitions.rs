use std::rc::Rc;

use crate::{
    ast::ast::{
        Attribute, AttributeArg, ClassDef, Definition, EnumDef, EnumFlagDef, FieldDef, FunctionDef,
        GlobalDef, ImplDef, Modifiers, ParamDef, Privacy, Script, TemplateParamDef, TraitDef, TypeRef,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Span,
};

use super::{
    expr::parse_expr, lookups::BindingPower, parser::Parser, stmt::parse_block, types::parse_type,
};

/// Parses a whole file: `namespace`, `with` imports, then definitions.
pub fn parse_script(parser: &mut Parser) -> Result<Script, Error> {
    let namespace = if parser.eat(TokenKind::Namespace) {
        let path = parse_path(parser)?;
        parser.expect_detailed(TokenKind::Semicolon, "expected `;` after namespace")?;
        path
    } else {
        vec![]
    };

    let mut imports = vec![];
    while parser.eat(TokenKind::With) {
        imports.push(parse_path(parser)?);
        parser.expect_detailed(TokenKind::Semicolon, "expected `;` after import")?;
    }

    let mut definitions = vec![];
    while parser.has_tokens() {
        definitions.push(parse_definition(parser)?);
    }

    Ok(Script {
        file: parser.get_file(),
        namespace,
        imports,
        definitions,
    })
}

fn parse_path(parser: &mut Parser) -> Result<Vec<String>, Error> {
    let mut path = vec![parser
        .expect_detailed(TokenKind::Identifier, "expected namespace name")?
        .value];

    while parser.eat(TokenKind::Dot) {
        path.push(
            parser
                .expect_detailed(TokenKind::Identifier, "expected namespace name")?
                .value,
        );
    }

    Ok(path)
}

fn conflicting(modifier: &str, parser: &Parser) -> Error {
    Error::new(
        ErrorImpl::ConflictingModifiers {
            modifier: modifier.to_string(),
        },
        parser.get_position(),
    )
}

/// Parses attributes and `public`/`private`/`static`/`foreign` in any order.
///
/// Definitions without a privacy keyword are private.
pub fn parse_modifiers(parser: &mut Parser) -> Result<Modifiers, Error> {
    let mut modifiers = Modifiers::private(parser.get_position());
    let mut privacy = None;

    loop {
        match parser.current_token_kind() {
            TokenKind::At => modifiers.attributes.push(parse_attribute(parser)?),
            TokenKind::Public | TokenKind::Private => {
                let token = parser.current_token().clone();
                if privacy.is_some() {
                    return Err(conflicting(&token.value, parser));
                }

                privacy = Some(if token.kind == TokenKind::Public {
                    Privacy::Public
                } else {
                    Privacy::Private
                });
                parser.advance();
            }
            TokenKind::Static => {
                if modifiers.is_static {
                    return Err(conflicting("static", parser));
                }
                modifiers.is_static = true;
                parser.advance();
            }
            TokenKind::Foreign => {
                if modifiers.is_foreign {
                    return Err(conflicting("foreign", parser));
                }
                modifiers.is_foreign = true;
                parser.advance();
            }
            _ => break,
        }
    }

    modifiers.privacy = privacy.unwrap_or(Privacy::Private);
    Ok(modifiers)
}

fn parse_attribute(parser: &mut Parser) -> Result<Attribute, Error> {
    let position = parser.expect(TokenKind::At)?.span.start;
    let name = parser
        .expect_detailed(TokenKind::Identifier, "expected attribute name")?
        .value;

    let mut arguments = vec![];
    if parser.eat(TokenKind::OpenParen) {
        while parser.current_token_kind() != TokenKind::CloseParen {
            let token = parser.advance().clone();
            let argument = match token.kind {
                TokenKind::String => AttributeArg::String(token.value),
                TokenKind::Number => match token.value.parse::<i64>() {
                    Ok(value) => AttributeArg::Int(value),
                    Err(_) => {
                        return Err(Error::new(
                            ErrorImpl::NumberParseError { token: token.value },
                            token.span.start,
                        ))
                    }
                },
                _ => {
                    return Err(Error::new(
                        ErrorImpl::InvalidAttributeArguments {
                            name,
                            message: format!("unexpected `{}`", token.value),
                        },
                        token.span.start,
                    ))
                }
            };
            arguments.push(argument);

            if !parser.eat(TokenKind::Comma) {
                break;
            }
        }

        parser.expect(TokenKind::CloseParen)?;
    }

    Ok(Attribute {
        name,
        arguments,
        position,
    })
}

pub fn parse_definition(parser: &mut Parser) -> Result<Definition, Error> {
    let modifiers = parse_modifiers(parser)?;

    match parser.current_token_kind() {
        TokenKind::Func => {
            parser.advance();
            Ok(Definition::Function(parse_function(parser, modifiers, false)?))
        }
        TokenKind::Class => Ok(Definition::Class(parse_class(parser, modifiers)?)),
        TokenKind::Enum => Ok(Definition::Enum(parse_enum(parser, modifiers)?)),
        TokenKind::Trait => Ok(Definition::Trait(parse_trait(parser, modifiers)?)),
        TokenKind::Impl => Ok(Definition::Impl(parse_impl(parser)?)),
        TokenKind::Global | TokenKind::Constant => Ok(Definition::Global(parse_global(parser, modifiers)?)),
        _ => Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected a definition"),
            },
            parser.get_position(),
        )),
    }
}

/// Parses a function after its `func` keyword (or, for class members, from
/// its name). A signature ending in `;` has no body.
fn parse_function(parser: &mut Parser, modifiers: Modifiers, signature_only: bool) -> Result<FunctionDef, Error> {
    let start = modifiers.position.clone();
    let name_token = parser.expect_detailed(TokenKind::Identifier, "expected function name")?;

    parser.expect(TokenKind::OpenParen)?;

    let mut params = vec![];
    let mut is_variadic = false;
    while parser.current_token_kind() != TokenKind::CloseParen {
        if parser.eat(TokenKind::Variadic) {
            is_variadic = true;
            break;
        }

        let name = parser
            .expect_detailed(TokenKind::Identifier, "expected parameter name")?
            .value;
        let type_ref = parse_type(parser, BindingPower::Default)?;
        params.push(ParamDef { name, type_ref });

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }
    parser.expect_detailed(TokenKind::CloseParen, "expected `)` after parameters")?;

    let return_type = if parser.current_token_kind() == TokenKind::Hash {
        parse_type(parser, BindingPower::Default)?
    } else {
        TypeRef::named("void", name_token.span.start.clone())
    };

    let body = if signature_only || modifiers.is_foreign {
        parser.expect_detailed(TokenKind::Semicolon, "expected `;` after signature")?;
        None
    } else {
        Some(parse_block(parser)?)
    };

    Ok(FunctionDef {
        name: name_token.value,
        modifiers,
        params,
        is_variadic,
        return_type,
        body,
        span: Span {
            start,
            end: parser.get_end_position(),
        },
    })
}

fn parse_template_params(parser: &mut Parser) -> Result<Vec<TemplateParamDef>, Error> {
    let mut params = vec![];

    if !parser.eat(TokenKind::OpenGeneric) {
        return Ok(params);
    }

    while parser.current_token_kind() != TokenKind::CloseGeneric {
        let name = parser
            .expect_detailed(TokenKind::Identifier, "expected template parameter name")?
            .value;

        if parser.current_token_kind() == TokenKind::Hash {
            let type_ref = parse_type(parser, BindingPower::Default)?;
            params.push(TemplateParamDef::Const { name, type_ref });
        } else {
            params.push(TemplateParamDef::Type { name });
        }

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::CloseGeneric)?;
    Ok(params)
}

fn parse_class(parser: &mut Parser, modifiers: Modifiers) -> Result<ClassDef, Error> {
    let start = modifiers.position.clone();
    parser.expect(TokenKind::Class)?;

    let name = parser
        .expect_detailed(TokenKind::Identifier, "expected class name")?
        .value;
    let template_params = parse_template_params(parser)?;

    parser.expect(TokenKind::OpenCurly)?;

    let mut fields = vec![];
    let mut methods = vec![];
    while parser.current_token_kind() != TokenKind::CloseCurly {
        let member = parse_modifiers(parser)?;

        if parser.eat(TokenKind::Func) || parser.peek_kind(1) == TokenKind::OpenParen {
            methods.push(Rc::new(parse_function(parser, member, false)?));
            continue;
        }

        let name_token = parser.expect_detailed(TokenKind::Identifier, "expected field or method")?;
        if member.is_static || member.is_foreign || !member.attributes.is_empty() {
            return Err(Error::new(
                ErrorImpl::ConflictingModifiers {
                    modifier: if member.is_static { "static" } else { "foreign" }.to_string(),
                },
                name_token.span.start,
            ));
        }

        let type_ref = parse_type(parser, BindingPower::Default)?;
        parser.expect_detailed(TokenKind::Semicolon, "expected `;` after field")?;

        fields.push(FieldDef {
            name: name_token.value,
            privacy: member.privacy,
            type_ref,
            position: name_token.span.start,
        });
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(ClassDef {
        name,
        modifiers,
        template_params,
        fields,
        methods,
        span: Span {
            start,
            end: parser.get_end_position(),
        },
    })
}

fn parse_enum(parser: &mut Parser, modifiers: Modifiers) -> Result<EnumDef, Error> {
    let start = modifiers.position.clone();
    parser.expect(TokenKind::Enum)?;

    let name = parser
        .expect_detailed(TokenKind::Identifier, "expected enum name")?
        .value;

    parser.expect(TokenKind::OpenCurly)?;

    let mut flags = vec![];
    while parser.current_token_kind() != TokenKind::CloseCurly {
        let flag = parser.expect_detailed(TokenKind::Identifier, "expected enum flag")?;

        let mut payload = vec![];
        if parser.eat(TokenKind::OpenParen) {
            while parser.current_token_kind() != TokenKind::CloseParen {
                payload.push(parse_type(parser, BindingPower::Default)?);

                if !parser.eat(TokenKind::Comma) {
                    break;
                }
            }
            parser.expect(TokenKind::CloseParen)?;
        }

        let value = if parser.eat(TokenKind::Assignment) {
            let token = parser.expect_detailed(TokenKind::Number, "expected flag value")?;
            match token.value.parse::<u64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    return Err(Error::new(
                        ErrorImpl::NumberParseError { token: token.value },
                        token.span.start,
                    ))
                }
            }
        } else {
            None
        };

        flags.push(EnumFlagDef {
            name: flag.value,
            value,
            payload,
            position: flag.span.start,
        });

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(EnumDef {
        name,
        modifiers,
        flags,
        span: Span {
            start,
            end: parser.get_end_position(),
        },
    })
}

fn parse_trait(parser: &mut Parser, modifiers: Modifiers) -> Result<TraitDef, Error> {
    let start = modifiers.position.clone();
    parser.expect(TokenKind::Trait)?;

    let name = parser
        .expect_detailed(TokenKind::Identifier, "expected trait name")?
        .value;

    parser.expect(TokenKind::OpenCurly)?;

    let mut methods = vec![];
    while parser.current_token_kind() != TokenKind::CloseCurly {
        let member = parse_modifiers(parser)?;
        parser.eat(TokenKind::Func);
        methods.push(Rc::new(parse_function(parser, member, true)?));
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(TraitDef {
        name,
        modifiers,
        methods,
        span: Span {
            start,
            end: parser.get_end_position(),
        },
    })
}

fn parse_impl(parser: &mut Parser) -> Result<ImplDef, Error> {
    let start = parser.expect(TokenKind::Impl)?.span.start;

    let trait_ref = parse_type(parser, BindingPower::Default)?;
    parser.expect_detailed(TokenKind::For, "expected `for` in impl")?;
    let type_ref = parse_type(parser, BindingPower::Default)?;

    parser.expect(TokenKind::OpenCurly)?;

    let mut methods = vec![];
    while parser.current_token_kind() != TokenKind::CloseCurly {
        let member = parse_modifiers(parser)?;
        parser.eat(TokenKind::Func);
        methods.push(Rc::new(parse_function(parser, member, false)?));
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(ImplDef {
        trait_ref,
        type_ref,
        methods,
        span: Span {
            start,
            end: parser.get_end_position(),
        },
    })
}

fn parse_global(parser: &mut Parser, modifiers: Modifiers) -> Result<GlobalDef, Error> {
    let start = modifiers.position.clone();
    let is_constant = parser.advance().kind == TokenKind::Constant;

    let name = parser
        .expect_detailed(TokenKind::Identifier, "expected global name")?
        .value;
    let type_ref = parse_type(parser, BindingPower::Default)?;

    let value = if parser.eat(TokenKind::Assignment) {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    parser.expect_detailed(TokenKind::Semicolon, "expected `;` after global")?;

    Ok(GlobalDef {
        name,
        modifiers,
        is_constant,
        type_ref,
        value,
        span: Span {
            start,
            end: parser.get_end_position(),
        },
    })
}
