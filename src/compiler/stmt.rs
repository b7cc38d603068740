use crate::{
    ast::ast::{Expr, Stmt},
    errors::errors::Error,
    types::types::InternalType,
    MK_POSITIONED_ERROR,
};

use super::{
    compiler::Compiler,
    expr::gen_expression,
    scope::{Scope, Variable},
};

/// Compiles statements in order until one of them returns.
///
/// Returns whether every path through the block returned. Statements after
/// a return are not compiled.
pub fn gen_block<'a>(compiler: &mut Compiler<'a>, body: &[Stmt], scope: &mut Scope<'a>) -> Result<bool, Error> {
    for statement in body {
        if gen_statement(compiler, statement, scope)? {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Compiles one statement, returning whether it guarantees a return.
pub fn gen_statement<'a>(compiler: &mut Compiler<'a>, statement: &Stmt, scope: &mut Scope<'a>) -> Result<bool, Error> {
    let position = statement.get_span().start.clone();

    let returns = match statement {
        Stmt::Expression(expression) => {
            gen_expression(compiler, expression, scope)?;
            false
        }
        Stmt::Local {
            name,
            type_ref,
            value,
            ..
        } => {
            if scope.get(name).is_some() {
                return Err(MK_POSITIONED_ERROR!(AlreadyDeclared { name: name.clone() }, position));
            }

            let value = value
                .as_ref()
                .map(|value| gen_expression(compiler, value, scope))
                .transpose()?;

            let ty = match (type_ref, &value) {
                (Some(type_ref), _) => compiler.resolve_type(type_ref).map_err(|error| error.or_at(&position))?,
                (None, Some(value)) => value.ty.dereferenced().concrete(),
                (None, None) => {
                    return Err(MK_POSITIONED_ERROR!(
                        InvalidOperation {
                            message: format!("`{}` needs a type or a value", name)
                        },
                        position
                    ))
                }
            };

            if ty.is_void() {
                return Err(MK_POSITIONED_ERROR!(
                    TypeMatchError {
                        expected: String::from("a value"),
                        received: ty.to_string()
                    },
                    position
                ));
            }

            let basic = compiler.basic_type(&ty).map_err(|error| error.or_at(&position))?;
            let pointer = compiler.entry_alloca(basic, name)?;

            if let Some(value) = value {
                let value = compiler.convert(value, &ty).map_err(|error| error.or_at(&position))?;
                compiler.builder.build_store(pointer, value.value)?;
            }

            scope.declare(Variable {
                name: name.clone(),
                ty,
                pointer,
                is_constant: false,
            });
            false
        }
        Stmt::If {
            condition,
            then_body,
            else_body,
            ..
        } => gen_if(compiler, condition, then_body, else_body.as_deref(), scope)?,
        Stmt::While { condition, body, .. } => {
            let function = compiler.current_function_value()?;
            let loop_block = compiler.context.append_basic_block(function, "loop");
            let then_block = compiler.context.append_basic_block(function, "then");
            let continue_block = compiler.context.append_basic_block(function, "continue");

            compiler.builder.build_unconditional_branch(loop_block)?;
            compiler.builder.position_at_end(loop_block);

            let condition = gen_condition(compiler, condition, scope)?;
            compiler
                .builder
                .build_conditional_branch(condition, then_block, continue_block)?;

            compiler.builder.position_at_end(then_block);
            let mut body_scope = scope.branch(then_block);
            if !gen_block(compiler, body, &mut body_scope)? {
                compiler.builder.build_unconditional_branch(loop_block)?;
            }

            compiler.builder.position_at_end(continue_block);
            scope.block = continue_block;
            false
        }
        Stmt::Return { value, .. } => {
            let return_type = current_return_type(compiler);

            match value {
                Some(value) => {
                    let value = gen_expression(compiler, value, scope)?;
                    if return_type.is_void() {
                        return Err(MK_POSITIONED_ERROR!(
                            TypeMatchError {
                                expected: return_type.to_string(),
                                received: value.ty.to_string()
                            },
                            position
                        ));
                    }

                    let value = compiler
                        .convert(value, &return_type)
                        .map_err(|error| error.or_at(&position))?;
                    compiler.builder.build_return(Some(&value.value))?;
                }
                None => {
                    if !return_type.is_void() {
                        return Err(MK_POSITIONED_ERROR!(
                            TypeMatchError {
                                expected: return_type.to_string(),
                                received: InternalType::Void.to_string()
                            },
                            position
                        ));
                    }

                    compiler.builder.build_return(None)?;
                }
            }

            true
        }
        Stmt::Block(body, _) => {
            let mut inner = scope.branch(scope.block);
            let returns = gen_block(compiler, body, &mut inner)?;
            scope.block = inner.block;
            returns
        }
    };

    if let Some(block) = compiler.builder.get_insert_block() {
        scope.block = block;
    }

    Ok(returns)
}

fn gen_if<'a>(
    compiler: &mut Compiler<'a>,
    condition: &Expr,
    then_body: &[Stmt],
    else_body: Option<&[Stmt]>,
    scope: &mut Scope<'a>,
) -> Result<bool, Error> {
    let function = compiler.current_function_value()?;
    let condition = gen_condition(compiler, condition, scope)?;

    let then_block = compiler.context.append_basic_block(function, "then");
    let else_block = compiler.context.append_basic_block(function, "else");
    compiler
        .builder
        .build_conditional_branch(condition, then_block, else_block)?;

    let mut continue_block = None;

    compiler.builder.position_at_end(then_block);
    let mut then_scope = scope.branch(then_block);
    let then_returns = gen_block(compiler, then_body, &mut then_scope)?;
    if !then_returns {
        let block = compiler.context.append_basic_block(function, "continue");
        compiler.builder.build_unconditional_branch(block)?;
        continue_block = Some(block);
    }

    compiler.builder.position_at_end(else_block);
    let mut else_scope = scope.branch(else_block);
    let else_returns = match else_body {
        Some(body) => gen_block(compiler, body, &mut else_scope)?,
        None => false,
    };
    if !else_returns {
        let block = *continue_block.get_or_insert_with(|| compiler.context.append_basic_block(function, "continue"));
        compiler.builder.build_unconditional_branch(block)?;
    }

    match continue_block {
        Some(block) => {
            compiler.builder.position_at_end(block);
            scope.block = block;
            Ok(false)
        }
        None => Ok(true),
    }
}

/// Compiles a branch condition, which must convert to `bool`.
pub fn gen_condition<'a>(
    compiler: &mut Compiler<'a>,
    condition: &Expr,
    scope: &mut Scope<'a>,
) -> Result<inkwell::values::IntValue<'a>, Error> {
    let value = gen_expression(compiler, condition, scope)?;
    let value = compiler
        .convert(value, &InternalType::Bool)
        .map_err(|error| error.or_at(condition.get_position()))?;

    Ok(value.value.into_int_value())
}

fn current_return_type(compiler: &Compiler) -> InternalType {
    compiler
        .state
        .function
        .map(|id| compiler.symbols.function(id).return_type.clone())
        .unwrap_or(InternalType::Void)
}

