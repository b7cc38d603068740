use inkwell::{
    types::BasicType,
    values::{BasicMetadataValueEnum, BasicValue, BasicValueEnum, CallableValue, PointerValue},
};

use crate::{
    ast::ast::{BinaryOp, Expr, ExprKind, Literal, Privacy, TypeRef, UnaryOp},
    errors::errors::{Error, ErrorImpl},
    symbols::{
        decls::{FuncId, FunctionOwner},
        operators::{builtin_static_methods, primitive_operators},
        overload::{Callee, OverloadList},
    },
    types::{
        abstract_int,
        types::{DeclId, InternalType},
    },
};

use super::{
    compiler::{invalid_operation, Compiler},
    scope::{Scope, Value},
    stmt::gen_condition,
};

/// Compiles an expression to a typed value. Places (locals, fields,
/// dereferenced pointers) come back as references so callers can either
/// write through them or load them.
pub fn gen_expression<'a>(compiler: &mut Compiler<'a>, expression: &Expr, scope: &mut Scope<'a>) -> Result<Value<'a>, Error> {
    gen_expression_kind(compiler, expression, scope).map_err(|error| error.or_at(expression.get_position()))
}

fn gen_expression_kind<'a>(
    compiler: &mut Compiler<'a>,
    expression: &Expr,
    scope: &mut Scope<'a>,
) -> Result<Value<'a>, Error> {
    match &expression.kind {
        ExprKind::Literal(literal) => gen_literal(compiler, literal),
        ExprKind::Symbol(name) => gen_symbol(compiler, name, scope),
        ExprKind::SelfRef => scope
            .get("self")
            .map(|variable| variable.as_value())
            .ok_or_else(|| {
                Error::unpositioned(ErrorImpl::UnknownIdentifier {
                    name: String::from("self"),
                })
            }),
        ExprKind::Binary { op, left, right } => gen_binary(compiler, *op, left, right, scope),
        ExprKind::Assignment { assignee, value } => {
            if let Some(name) = constant_target(compiler, assignee, scope) {
                return Err(invalid_operation(&format!("cannot assign to constant `{}`", name)));
            }

            let place = gen_expression(compiler, assignee, scope)?;
            let InternalType::Reference(target) = &place.ty else {
                return Err(not_addressable(assignee));
            };
            let target = (**target).clone();

            let value = gen_expression(compiler, value, scope)?;
            let value = compiler.convert(value, &target)?;
            compiler
                .builder
                .build_store(place.value.into_pointer_value(), value.value)?;

            Ok(place)
        }
        ExprKind::Unary { op, operand } => {
            let value = gen_expression(compiler, operand, scope)?;
            gen_unary(compiler, *op, value)
        }
        ExprKind::Increment { operand, increment } => {
            let place = gen_expression(compiler, operand, scope)?;
            let InternalType::Reference(base) = &place.ty else {
                return Err(not_addressable(operand));
            };
            let pointer = place.value.into_pointer_value();
            let old = compiler.builder.build_load(pointer, "")?;

            let new: BasicValueEnum<'a> = match base.as_ref() {
                InternalType::Int { .. } => {
                    let old = old.into_int_value();
                    let one = old.get_type().const_int(1, false);
                    if *increment {
                        compiler.builder.build_int_add(old, one, "")?.into()
                    } else {
                        compiler.builder.build_int_sub(old, one, "")?.into()
                    }
                }
                InternalType::Float { .. } => {
                    let old = old.into_float_value();
                    let one = old.get_type().const_float(1.0);
                    if *increment {
                        compiler.builder.build_float_add(old, one, "")?.into()
                    } else {
                        compiler.builder.build_float_sub(old, one, "")?.into()
                    }
                }
                other => {
                    return Err(invalid_operation(&format!("`{}` cannot be incremented", other)));
                }
            };
            compiler.builder.build_store(pointer, new)?;

            Ok(Value::new((**base).clone(), old))
        }
        ExprKind::Call { callee, arguments } => gen_call(compiler, callee, arguments, scope),
        ExprKind::Member { object, member } => {
            let object = gen_expression(compiler, object, scope)?;
            gen_field(compiler, object, member)
        }
        ExprKind::StaticAccess { type_ref, member } => {
            let ty = compiler.resolve_type(type_ref)?;
            let flag = ty
                .as_declared()
                .filter(|decl| {
                    compiler
                        .symbols
                        .type_decl(decl.id)
                        .enum_layout()
                        .is_some_and(|layout| layout.flag(member).is_some())
                })
                .map(|decl| decl.id);

            match flag {
                Some(id) => construct_enum(compiler, id, member, vec![]),
                None => Err(Error::unpositioned(ErrorImpl::UnknownField {
                    field: member.clone(),
                    type_: ty.to_string(),
                })),
            }
        }
        ExprKind::Index { object, index } => {
            let object = gen_expression(compiler, object, scope)?;
            let object = compiler.load(object)?;
            let (InternalType::Pointer(element) | InternalType::Array(element)) = &object.ty else {
                return Err(invalid_operation(&format!("`{}` cannot be indexed", object.ty)));
            };
            if element.is_void() {
                return Err(invalid_operation("`void*` cannot be indexed"));
            }
            let element = (**element).clone();

            let index = gen_expression(compiler, index, scope)?;
            let index = compiler.materialize(compiler.load(index)?)?;
            let InternalType::Int { signed, .. } = index.ty else {
                return Err(Error::unpositioned(ErrorImpl::TypeMatchError {
                    expected: String::from("an integer"),
                    received: index.ty.to_string(),
                }));
            };
            let index = compiler.builder.build_int_cast_sign_flag(
                index.value.into_int_value(),
                compiler.context.i64_type(),
                signed,
                "",
            )?;

            let pointer = unsafe {
                compiler
                    .builder
                    .build_in_bounds_gep(object.value.into_pointer_value(), &[index], "")?
            };

            Ok(Value::place(element, pointer))
        }
        ExprKind::Cast { type_ref, value } => {
            let target = compiler.resolve_type(type_ref)?;
            let value = gen_expression(compiler, value, scope)?;
            compiler.cast(value, &target)
        }
        ExprKind::InlineIf {
            condition,
            then_value,
            else_value,
        } => gen_inline_if(compiler, condition, then_value, else_value, scope),
        ExprKind::AddressOf(operand) => {
            let place = gen_expression(compiler, operand, scope)?;
            match place.ty {
                InternalType::Reference(base) => Ok(Value::new(base.pointer_to(), place.value)),
                _ => Err(not_addressable(operand)),
            }
        }
        ExprKind::Dereference(operand) => {
            let value = gen_expression(compiler, operand, scope)?;
            let value = compiler.load(value)?;

            match &value.ty {
                InternalType::Pointer(base) | InternalType::Array(base) if !base.is_void() => {
                    Ok(Value::place((**base).clone(), value.value.into_pointer_value()))
                }
                other => Err(invalid_operation(&format!("`{}` cannot be dereferenced", other))),
            }
        }
        ExprKind::ArrayLiteral(elements) => gen_array_literal(compiler, elements, scope),
    }
}

fn gen_literal<'a>(compiler: &Compiler<'a>, literal: &Literal) -> Result<Value<'a>, Error> {
    let context = compiler.context;

    let value = match literal {
        Literal::Int(value) => Value::new(
            InternalType::AbstractInt(*value),
            context.i64_type().const_int(*value as u64, true).into(),
        ),
        Literal::Float(value) => Value::new(InternalType::f32(), context.f32_type().const_float(*value).into()),
        Literal::String(value) => Value::new(
            InternalType::u8().pointer_to(),
            compiler
                .builder
                .build_global_string_ptr(value, "")?
                .as_pointer_value()
                .into(),
        ),
        Literal::Char(value) => Value::new(InternalType::u8(), context.i8_type().const_int(*value as u64, false).into()),
        Literal::Bool(value) => Value::new(
            InternalType::Bool,
            context.bool_type().const_int(*value as u64, false).into(),
        ),
        Literal::Null => Value::new(
            InternalType::void_pointer(),
            compiler.pointer_type(&InternalType::Void)?.const_null().into(),
        ),
    };

    Ok(value)
}

fn gen_symbol<'a>(compiler: &Compiler<'a>, name: &str, scope: &Scope<'a>) -> Result<Value<'a>, Error> {
    if let Some(variable) = scope.get(name) {
        return Ok(variable.as_value());
    }

    let state = &compiler.state;
    if let Some(id) = compiler.symbols.lookup_global(state.namespace, &state.imports, name) {
        let global = compiler.symbols.global(id);
        let pointer = compiler.globals[&id].as_pointer_value();

        return Ok(Value::place(global.ty.clone(), pointer));
    }

    // A function named on its own is a pointer to it, as long as the name
    // is not overloaded.
    if let Some(list) = compiler.symbols.lookup_functions(state.namespace, &state.imports, name) {
        if let [candidate] = list.candidates() {
            if let Callee::Function(id) = candidate.callee {
                let function = compiler.symbols.function(id);
                let ty = function.function_type(None);
                let pointer = compiler.functions[&id].as_global_value().as_pointer_value();

                return Ok(Value::new(ty, pointer.into()));
            }
        }
    }

    Err(Error::unpositioned(ErrorImpl::UnknownIdentifier {
        name: name.to_string(),
    }))
}

/// Name of the constant an assignment would write to, if it targets one.
fn constant_target(compiler: &Compiler, assignee: &Expr, scope: &Scope) -> Option<String> {
    let name = match &assignee.kind {
        ExprKind::Symbol(name) => name.as_str(),
        ExprKind::SelfRef => "self",
        _ => return None,
    };

    if let Some(variable) = scope.get(name) {
        return variable.is_constant.then(|| name.to_string());
    }

    let state = &compiler.state;
    compiler
        .symbols
        .lookup_global(state.namespace, &state.imports, name)
        .filter(|id| compiler.symbols.global(*id).is_constant)
        .map(|_| name.to_string())
}

fn gen_unary<'a>(compiler: &Compiler<'a>, op: UnaryOp, value: Value<'a>) -> Result<Value<'a>, Error> {
    match op {
        UnaryOp::Not => {
            let value = compiler.convert(value, &InternalType::Bool)?;
            let inverted = compiler.builder.build_not(value.value.into_int_value(), "")?;

            Ok(Value::new(InternalType::Bool, inverted.into()))
        }
        UnaryOp::Negate => {
            let value = compiler.load(value)?;

            let negated: BasicValueEnum<'a> = match &value.ty {
                InternalType::AbstractInt(literal) => {
                    let negated = literal
                        .checked_neg()
                        .ok_or_else(|| invalid_operation(&format!("`-{}` overflows", literal)))?;

                    return Ok(Value::new(
                        InternalType::AbstractInt(negated),
                        compiler.context.i64_type().const_int(negated as u64, true).into(),
                    ));
                }
                InternalType::Int { .. } => compiler
                    .builder
                    .build_int_neg(value.value.into_int_value(), "")?
                    .into(),
                InternalType::Float { .. } => compiler
                    .builder
                    .build_float_neg(value.value.into_float_value(), "")?
                    .into(),
                other => return Err(invalid_operation(&format!("`{}` cannot be negated", other))),
            };

            Ok(Value::new(value.ty, negated))
        }
    }
}

fn gen_binary<'a>(
    compiler: &mut Compiler<'a>,
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    scope: &mut Scope<'a>,
) -> Result<Value<'a>, Error> {
    let left = gen_expression(compiler, left, scope)?;
    let right = gen_expression(compiler, right, scope)?;

    // Both operands are always evaluated.
    if matches!(op, BinaryOp::And | BinaryOp::Or) {
        let left = compiler.convert(left, &InternalType::Bool)?.value.into_int_value();
        let right = compiler.convert(right, &InternalType::Bool)?.value.into_int_value();

        let value = match op {
            BinaryOp::And => compiler.builder.build_and(left, right, "")?,
            _ => compiler.builder.build_or(left, right, "")?,
        };
        return Ok(Value::new(InternalType::Bool, value.into()));
    }

    let left = compiler.load(left)?;
    let right = compiler.load(right)?;

    if let (InternalType::AbstractInt(a), InternalType::AbstractInt(b)) = (&left.ty, &right.ty) {
        if let Some(folded) = abstract_int::fold(op, *a, *b) {
            return Ok(Value::new(
                InternalType::AbstractInt(folded),
                compiler.context.i64_type().const_int(folded as u64, true).into(),
            ));
        }
    }

    let operand = if left.ty.is_abstract() {
        right.ty.concrete()
    } else {
        left.ty.clone()
    };

    let declared = operand
        .as_declared()
        .map(|decl| compiler.symbols.type_decl(decl.id));

    // `!=` is compiled as `==` followed by a logical not.
    let compared = if op == BinaryOp::NotEq { BinaryOp::Eq } else { op };

    let list = match declared {
        Some(decl) if decl.is_struct() => decl.static_methods.get(compared.operator_name()).cloned(),
        Some(decl) => primitive_operators(compared, &operand, decl.enum_layout().is_some()),
        None => primitive_operators(compared, &operand, false),
    };
    let list = list.ok_or_else(|| {
        invalid_operation(&format!(
            "operator `{}` is not defined for `{}`",
            op.operator_name(),
            operand
        ))
    })?;

    let result = call_overloads(compiler, &list, vec![left, right], None)?;

    if op == BinaryOp::NotEq {
        let result = compiler.convert(result, &InternalType::Bool)?;
        let inverted = compiler.builder.build_not(result.value.into_int_value(), "")?;
        return Ok(Value::new(InternalType::Bool, inverted.into()));
    }

    Ok(result)
}

fn gen_inline_if<'a>(
    compiler: &mut Compiler<'a>,
    condition: &Expr,
    then_value: &Expr,
    else_value: &Expr,
    scope: &mut Scope<'a>,
) -> Result<Value<'a>, Error> {
    let function = compiler.current_function_value()?;
    let condition = gen_condition(compiler, condition, scope)?;

    let then_block = compiler.context.append_basic_block(function, "then");
    let else_block = compiler.context.append_basic_block(function, "else");
    let continue_block = compiler.context.append_basic_block(function, "continue");
    compiler
        .builder
        .build_conditional_branch(condition, then_block, else_block)?;

    compiler.builder.position_at_end(then_block);
    let then_value = gen_expression(compiler, then_value, &mut scope.branch(then_block))?;
    let then_value = compiler.load(then_value)?;
    let then_end = compiler.builder.get_insert_block().unwrap_or(then_block);

    compiler.builder.position_at_end(else_block);
    let else_value = gen_expression(compiler, else_value, &mut scope.branch(else_block))?;
    let else_value = compiler.load(else_value)?;
    let else_end = compiler.builder.get_insert_block().unwrap_or(else_block);

    let result_type = match (&then_value.ty, &else_value.ty) {
        (InternalType::AbstractInt(a), InternalType::AbstractInt(b)) => {
            let wide = InternalType::i64();
            if abstract_int::default_type(*a) == wide || abstract_int::default_type(*b) == wide {
                wide
            } else {
                InternalType::i32()
            }
        }
        (InternalType::AbstractInt(_), other) | (other, InternalType::AbstractInt(_)) => other.clone(),
        (then_type, else_type) if then_type == else_type => then_type.clone(),
        (then_type, else_type) => {
            return Err(Error::unpositioned(ErrorImpl::TypeMatchError {
                expected: then_type.to_string(),
                received: else_type.to_string(),
            }))
        }
    };

    let slot = compiler.entry_alloca(compiler.basic_type(&result_type)?, "result")?;

    for (value, end) in [(then_value, then_end), (else_value, else_end)] {
        compiler.builder.position_at_end(end);
        let value = compiler.convert(value, &result_type)?;
        compiler.builder.build_store(slot, value.value)?;
        compiler.builder.build_unconditional_branch(continue_block)?;
    }

    compiler.builder.position_at_end(continue_block);
    scope.block = continue_block;

    let value = compiler.builder.build_load(slot, "")?;
    Ok(Value::new(result_type, value))
}

fn gen_array_literal<'a>(compiler: &mut Compiler<'a>, elements: &[Expr], scope: &mut Scope<'a>) -> Result<Value<'a>, Error> {
    let mut values = vec![];
    for element in elements {
        let value = gen_expression(compiler, element, scope)?;
        values.push(compiler.load(value)?);
    }

    let element_type = values
        .iter()
        .find(|value| !value.ty.is_abstract())
        .or_else(|| values.first())
        .map(|value| value.ty.concrete())
        .ok_or_else(|| invalid_operation("array literals need at least one element"))?;

    let basic = compiler.basic_type(&element_type)?;
    let array = compiler.entry_alloca(basic.array_type(values.len() as u32).into(), "array")?;

    let i32_type = compiler.context.i32_type();
    let zero = i32_type.const_zero();

    for (index, value) in values.into_iter().enumerate() {
        let value = compiler.convert(value, &element_type)?;
        let slot = unsafe {
            compiler
                .builder
                .build_in_bounds_gep(array, &[zero, i32_type.const_int(index as u64, false)], "")?
        };
        compiler.builder.build_store(slot, value.value)?;
    }

    let first = unsafe { compiler.builder.build_in_bounds_gep(array, &[zero, zero], "")? };
    Ok(Value::new(element_type.array_of(), first.into()))
}

/// The address of a declared value along with its declaration. Values
/// that are not in memory yet are spilled to a stack slot.
fn receiver_pointer<'a>(compiler: &Compiler<'a>, value: Value<'a>) -> Result<(DeclId, PointerValue<'a>), Error> {
    match &value.ty {
        InternalType::Reference(base) => match base.as_ref() {
            InternalType::Declared(decl) => Ok((decl.id, value.value.into_pointer_value())),
            InternalType::Pointer(inner) if inner.as_declared().is_some() => {
                let loaded = compiler.load(value.clone())?;
                receiver_pointer(compiler, loaded)
            }
            other => Err(invalid_operation(&format!("`{}` has no members", other))),
        },
        InternalType::Pointer(inner) => match inner.as_ref() {
            InternalType::Declared(decl) => Ok((decl.id, value.value.into_pointer_value())),
            other => Err(invalid_operation(&format!("`{}*` has no members", other))),
        },
        InternalType::Declared(decl) => {
            let slot = compiler.entry_alloca(compiler.basic_type(&value.ty)?, "")?;
            compiler.builder.build_store(slot, value.value)?;
            Ok((decl.id, slot))
        }
        other => Err(invalid_operation(&format!("`{}` has no members", other))),
    }
}

fn check_access(compiler: &Compiler, is_private: bool, owner: DeclId, member: &str) -> Result<(), Error> {
    if is_private && compiler.state.owner != Some(owner) {
        return Err(Error::unpositioned(ErrorImpl::PrivateAccess {
            member: member.to_string(),
            type_: compiler.symbols.type_decl(owner).full_name.clone(),
        }));
    }

    Ok(())
}

fn gen_field<'a>(compiler: &Compiler<'a>, object: Value<'a>, member: &str) -> Result<Value<'a>, Error> {
    let (owner, pointer) = receiver_pointer(compiler, object)?;
    let decl = compiler.symbols.type_decl(owner);

    let field = decl
        .field(member)
        .filter(|_| decl.is_struct())
        .ok_or_else(|| {
            Error::unpositioned(ErrorImpl::UnknownField {
                field: member.to_string(),
                type_: decl.full_name.clone(),
            })
        })?;
    check_access(compiler, field.privacy == Privacy::Private, owner, member)?;

    let field_pointer = compiler
        .builder
        .build_struct_gep(pointer, field.index, &field.name)?;

    Ok(Value::place(field.ty.clone(), field_pointer))
}

fn gen_call<'a>(
    compiler: &mut Compiler<'a>,
    callee: &Expr,
    arguments: &[Expr],
    scope: &mut Scope<'a>,
) -> Result<Value<'a>, Error> {
    let mut values = vec![];
    for argument in arguments {
        let value = gen_expression(compiler, argument, scope)?;
        values.push(compiler.load(value)?);
    }

    match &callee.kind {
        ExprKind::Symbol(name) => {
            if let Some(variable) = scope.get(name) {
                let value = compiler.load(variable.as_value())?;
                return gen_indirect_call(compiler, name, value, values);
            }

            let state = &compiler.state;
            if let Some(list) = compiler.symbols.lookup_functions(state.namespace, &state.imports, name) {
                return call_overloads(compiler, &list, values, None);
            }

            // Inside a type, sibling methods can be called without a receiver.
            if let Some(owner) = compiler.state.owner {
                let decl = compiler.symbols.type_decl(owner);
                let statics = decl.static_methods.get(name).cloned();
                let methods = decl.methods.get(name).cloned();

                if let Some(list) = statics {
                    return call_overloads(compiler, &list, values, None);
                }

                if let (Some(list), Some(receiver)) = (methods, scope.get("self")) {
                    return call_overloads(compiler, &list, values, Some(receiver.pointer));
                }
            }

            Err(Error::unpositioned(ErrorImpl::UnknownIdentifier { name: name.clone() }))
        }
        ExprKind::Member { object, member } => {
            let object = gen_expression(compiler, object, scope)?;
            let (owner, pointer) = receiver_pointer(compiler, object.clone())?;

            if let Some(list) = compiler.symbols.type_decl(owner).methods.get(member).cloned() {
                return call_overloads(compiler, &list, values, Some(pointer));
            }

            let decl = compiler.symbols.type_decl(owner);
            if decl.field(member).is_some_and(|field| field.ty.as_function().is_some()) {
                let field = gen_field(compiler, object, member)?;
                let field = compiler.load(field)?;
                return gen_indirect_call(compiler, member, field, values);
            }

            Err(Error::unpositioned(ErrorImpl::UnknownMethod {
                method: member.clone(),
                type_: decl.full_name.clone(),
            }))
        }
        ExprKind::StaticAccess { type_ref, member } => gen_static_call(compiler, type_ref, member, values),
        _ => {
            let function = gen_expression(compiler, callee, scope)?;
            let function = compiler.load(function)?;
            gen_indirect_call(compiler, &describe(callee), function, values)
        }
    }
}

fn gen_static_call<'a>(
    compiler: &mut Compiler<'a>,
    type_ref: &TypeRef,
    member: &str,
    values: Vec<Value<'a>>,
) -> Result<Value<'a>, Error> {
    let ty = compiler.resolve_type(type_ref)?;

    let list = match ty.as_declared() {
        Some(decl) => {
            let type_decl = compiler.symbols.type_decl(decl.id);

            if type_decl
                .enum_layout()
                .is_some_and(|layout| layout.flag(member).is_some())
            {
                return construct_enum(compiler, decl.id, member, values);
            }

            type_decl.static_methods.get(member).cloned()
        }
        None => builtin_static_methods(&ty)
            .into_iter()
            .find(|list| list.name == member),
    };

    let list = list.ok_or_else(|| {
        Error::unpositioned(ErrorImpl::UnknownMethod {
            method: member.to_string(),
            type_: ty.to_string(),
        })
    })?;

    call_overloads(compiler, &list, values, None)
}

/// Builds an enum value; payload flags store their arguments after the flag.
fn construct_enum<'a>(
    compiler: &Compiler<'a>,
    id: DeclId,
    flag_name: &str,
    values: Vec<Value<'a>>,
) -> Result<Value<'a>, Error> {
    let decl = compiler.symbols.type_decl(id);
    let enum_type = decl.as_type();
    let full_name = format!("{}.{}", decl.full_name, flag_name);

    let Some(layout) = decl.enum_layout() else {
        return Err(invalid_operation(&format!("`{}` is not an enum", decl.full_name)));
    };
    let Some(flag) = layout.flag(flag_name) else {
        return Err(Error::unpositioned(ErrorImpl::UnknownField {
            field: flag_name.to_string(),
            type_: decl.full_name.clone(),
        }));
    };

    if flag.payload.len() != values.len() {
        return Err(Error::unpositioned(ErrorImpl::NoCandidate { name: full_name }));
    }

    let flag_value = compiler
        .basic_type(&layout.flag_type)?
        .into_int_type()
        .const_int(flag.value, false);

    if !layout.has_payload() {
        return Ok(Value::new(enum_type, flag_value.into()));
    }

    let union_type = compiler.basic_type(&enum_type)?;
    let slot = compiler.entry_alloca(union_type, "")?;
    compiler.builder.build_store(slot, union_type.const_zero())?;

    let flag_pointer = compiler.builder.build_struct_gep(slot, 0, "flag")?;
    compiler.builder.build_store(flag_pointer, flag_value)?;

    for (index, (value, ty)) in values.into_iter().zip(flag.payload.iter()).enumerate() {
        let value = compiler.convert(value, ty)?;
        let field = compiler.builder.build_struct_gep(slot, index as u32 + 1, "")?;
        let field = compiler
            .builder
            .build_pointer_cast(field, compiler.pointer_type(ty)?, "")?;
        compiler.builder.build_store(field, value.value)?;
    }

    let value = compiler.builder.build_load(slot, "")?;
    Ok(Value::new(enum_type, value))
}

/// Resolves `list` against the argument types and emits the call.
pub fn call_overloads<'a>(
    compiler: &Compiler<'a>,
    list: &OverloadList,
    arguments: Vec<Value<'a>>,
    receiver: Option<PointerValue<'a>>,
) -> Result<Value<'a>, Error> {
    let types = arguments.iter().map(|argument| argument.ty.clone()).collect::<Vec<_>>();
    let candidate = list.get(&types)?.clone();

    let converted = convert_arguments(compiler, arguments, &candidate.signature.params)?;

    match &candidate.callee {
        Callee::Intrinsic(intrinsic) => compiler.gen_intrinsic(intrinsic, &converted),
        Callee::Function(id) => call_function(compiler, *id, receiver, converted),
    }
}

/// Converts fixed arguments to their parameter types and promotes the
/// variadic tail.
fn convert_arguments<'a>(
    compiler: &Compiler<'a>,
    arguments: Vec<Value<'a>>,
    params: &[InternalType],
) -> Result<Vec<Value<'a>>, Error> {
    arguments
        .into_iter()
        .enumerate()
        .map(|(index, argument)| match params.get(index) {
            Some(param) => compiler.convert(argument, param),
            None => promote_variadic(compiler, argument),
        })
        .collect()
}

/// Variadic arguments follow C promotion: literals take their default
/// type and floats widen to `f64`.
fn promote_variadic<'a>(compiler: &Compiler<'a>, value: Value<'a>) -> Result<Value<'a>, Error> {
    let value = compiler.materialize(value)?;

    match value.ty {
        InternalType::Float { width } if width < 64 => compiler.convert(value, &InternalType::f64()),
        _ => Ok(value),
    }
}

fn call_function<'a>(
    compiler: &Compiler<'a>,
    id: FuncId,
    receiver: Option<PointerValue<'a>>,
    arguments: Vec<Value<'a>>,
) -> Result<Value<'a>, Error> {
    let function = compiler.symbols.function(id);

    if let FunctionOwner::Type(owner) = function.owner {
        check_access(compiler, function.privacy == Privacy::Private, owner, &function.name)?;
    }

    let mut values: Vec<BasicMetadataValueEnum<'a>> = vec![];
    if function.is_method() && !function.is_static {
        let receiver = receiver.ok_or_else(|| {
            invalid_operation(&format!("`{}` needs an instance to be called on", function.full_name))
        })?;
        values.push(receiver.into());
    }
    values.extend(arguments.iter().map(|argument| BasicMetadataValueEnum::from(argument.value)));

    let name = if function.return_type.is_void() {
        ""
    } else {
        function.name.as_str()
    };

    let call = compiler
        .builder
        .build_call(compiler.functions[&id], &values, name)?;
    if let Some(convention) = function.attributes.calling_convention {
        call.set_call_convention(convention);
    }

    let value = call
        .try_as_basic_value()
        .left()
        .unwrap_or(compiler.context.i32_type().const_zero().into());

    Ok(Value::new(function.return_type.clone(), value))
}

fn gen_indirect_call<'a>(
    compiler: &Compiler<'a>,
    name: &str,
    function: Value<'a>,
    arguments: Vec<Value<'a>>,
) -> Result<Value<'a>, Error> {
    let Some(function_type) = function.ty.as_function().cloned() else {
        return Err(invalid_operation(&format!("`{}` of type `{}` is not callable", name, function.ty)));
    };

    let arity_matches = if function_type.is_variadic {
        arguments.len() >= function_type.params.len()
    } else {
        arguments.len() == function_type.params.len()
    };
    let types_match = arguments
        .iter()
        .zip(function_type.params.iter())
        .all(|(argument, param)| argument.ty.can_convert_to(param));

    if !arity_matches || !types_match {
        return Err(Error::unpositioned(ErrorImpl::NoCandidate {
            name: name.to_string(),
        }));
    }

    let converted = convert_arguments(compiler, arguments, &function_type.params)?;
    let values = converted
        .iter()
        .map(|argument| BasicMetadataValueEnum::from(argument.value))
        .collect::<Vec<_>>();

    let call_name = if function_type.return_type.is_void() { "" } else { name };
    let callee = CallableValue::try_from(function.value.into_pointer_value())
        .map_err(|_| invalid_operation(&format!("`{}` does not point to a function", name)))?;
    let call = compiler.builder.build_call(callee, &values, call_name)?;

    let value = call
        .try_as_basic_value()
        .left()
        .unwrap_or(compiler.context.i32_type().const_zero().as_basic_value_enum());

    Ok(Value::new(*function_type.return_type, value))
}

fn not_addressable(expression: &Expr) -> Error {
    Error::unpositioned(ErrorImpl::NotAddressable {
        expression: describe(expression),
    })
}

/// A short source-like rendering of an expression for error messages.
fn describe(expression: &Expr) -> String {
    match &expression.kind {
        ExprKind::Symbol(name) => name.clone(),
        ExprKind::SelfRef => String::from("self"),
        ExprKind::Member { object, member } => format!("{}.{}", describe(object), member),
        ExprKind::Call { callee, .. } => format!("{}(...)", describe(callee)),
        ExprKind::Literal(Literal::Int(value)) => value.to_string(),
        ExprKind::Literal(Literal::Float(value)) => value.to_string(),
        ExprKind::Literal(Literal::String(value)) => format!("{:?}", value),
        ExprKind::Literal(Literal::Char(value)) => format!("'{}'", *value as char),
        ExprKind::Literal(Literal::Bool(value)) => value.to_string(),
        ExprKind::Literal(Literal::Null) => String::from("null"),
        _ => String::from("expression"),
    }
}
