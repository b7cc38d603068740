use inkwell::{
    values::{BasicMetadataValueEnum, BasicValueEnum, IntValue},
    FloatPredicate, IntPredicate,
};

use crate::{
    ast::ast::BinaryOp,
    errors::errors::Error,
    symbols::operators::Intrinsic,
    types::types::InternalType,
};

use super::{
    compiler::{invalid_operation, Compiler},
    scope::Value,
};

fn int_predicate(op: BinaryOp, signed: bool) -> Option<IntPredicate> {
    let predicate = match (op, signed) {
        (BinaryOp::Eq, _) => IntPredicate::EQ,
        (BinaryOp::Gt, true) => IntPredicate::SGT,
        (BinaryOp::Gt, false) => IntPredicate::UGT,
        (BinaryOp::Lt, true) => IntPredicate::SLT,
        (BinaryOp::Lt, false) => IntPredicate::ULT,
        (BinaryOp::GtEq, true) => IntPredicate::SGE,
        (BinaryOp::GtEq, false) => IntPredicate::UGE,
        (BinaryOp::LtEq, true) => IntPredicate::SLE,
        (BinaryOp::LtEq, false) => IntPredicate::ULE,
        _ => return None,
    };

    Some(predicate)
}

fn float_predicate(op: BinaryOp) -> Option<FloatPredicate> {
    let predicate = match op {
        BinaryOp::Eq => FloatPredicate::OEQ,
        BinaryOp::Gt => FloatPredicate::OGT,
        BinaryOp::Lt => FloatPredicate::OLT,
        BinaryOp::GtEq => FloatPredicate::OGE,
        BinaryOp::LtEq => FloatPredicate::OLE,
        _ => return None,
    };

    Some(predicate)
}

fn unsupported(op: BinaryOp, operand: &InternalType) -> Error {
    invalid_operation(&format!("operator `{}` is not defined for `{}`", op.operator_name(), operand))
}

impl<'a> Compiler<'a> {
    /// Lowers a call to an intrinsic whose arguments are already converted
    /// to the candidate's parameter types.
    pub fn gen_intrinsic(&self, intrinsic: &Intrinsic, arguments: &[Value<'a>]) -> Result<Value<'a>, Error> {
        match intrinsic {
            Intrinsic::Operator { op, operand } => {
                let [left, right] = arguments else {
                    return Err(invalid_operation("binary operators take two operands"));
                };

                let result_type = if op.is_comparison() {
                    InternalType::Bool
                } else {
                    operand.clone()
                };
                let value = self.gen_operator(*op, operand, left.value, right.value)?;

                Ok(Value::new(result_type, value))
            }
            Intrinsic::SizeOf(ty) | Intrinsic::AlignOf(ty) => {
                let basic = self.basic_type(ty)?;
                let target_data = self.target_data();

                let bytes = match intrinsic {
                    Intrinsic::SizeOf(_) => target_data.get_abi_size(&basic),
                    _ => target_data.get_abi_alignment(&basic) as u64,
                };

                Ok(Value::new(
                    InternalType::u64(),
                    self.context.i64_type().const_int(bytes, false).into(),
                ))
            }
        }
    }

    fn gen_operator(
        &self,
        op: BinaryOp,
        operand: &InternalType,
        left: BasicValueEnum<'a>,
        right: BasicValueEnum<'a>,
    ) -> Result<BasicValueEnum<'a>, Error> {
        let builder = &self.builder;

        let value: BasicValueEnum<'a> = match operand {
            InternalType::Int { signed, .. } => {
                let (left, right) = (left.into_int_value(), right.into_int_value());

                match op {
                    BinaryOp::Add => builder.build_int_add(left, right, "")?.into(),
                    BinaryOp::Sub => builder.build_int_sub(left, right, "")?.into(),
                    BinaryOp::Mul => builder.build_int_mul(left, right, "")?.into(),
                    BinaryOp::Div if *signed => builder.build_int_signed_div(left, right, "")?.into(),
                    BinaryOp::Div => builder.build_int_unsigned_div(left, right, "")?.into(),
                    BinaryOp::Mod if *signed => builder.build_int_signed_rem(left, right, "")?.into(),
                    BinaryOp::Mod => builder.build_int_unsigned_rem(left, right, "")?.into(),
                    BinaryOp::Pow => self.gen_int_pow(left, right, *signed)?.into(),
                    _ => {
                        let predicate = int_predicate(op, *signed).ok_or_else(|| unsupported(op, operand))?;
                        builder.build_int_compare(predicate, left, right, "")?.into()
                    }
                }
            }
            InternalType::Float { width } => {
                let (left, right) = (left.into_float_value(), right.into_float_value());

                match op {
                    BinaryOp::Add => builder.build_float_add(left, right, "")?.into(),
                    BinaryOp::Sub => builder.build_float_sub(left, right, "")?.into(),
                    BinaryOp::Mul => builder.build_float_mul(left, right, "")?.into(),
                    BinaryOp::Div => builder.build_float_div(left, right, "")?.into(),
                    BinaryOp::Mod => builder.build_float_rem(left, right, "")?.into(),
                    BinaryOp::Pow => {
                        let float_type = left.get_type();
                        let pow = self.intrinsic(
                            &format!("llvm.pow.f{}", width),
                            float_type.fn_type(&[float_type.into(), float_type.into()], false),
                        );

                        builder
                            .build_call(pow, &[left.into(), right.into()], "pow")?
                            .try_as_basic_value()
                            .left()
                            .ok_or_else(|| invalid_operation("`llvm.pow` returned no value"))?
                    }
                    _ => {
                        let predicate = float_predicate(op).ok_or_else(|| unsupported(op, operand))?;
                        builder.build_float_compare(predicate, left, right, "")?.into()
                    }
                }
            }
            InternalType::Bool => {
                let predicate = int_predicate(op, false).ok_or_else(|| unsupported(op, operand))?;
                builder
                    .build_int_compare(predicate, left.into_int_value(), right.into_int_value(), "")?
                    .into()
            }
            InternalType::Pointer(_) => {
                let predicate = int_predicate(op, false).ok_or_else(|| unsupported(op, operand))?;
                let address_type = self.context.i64_type();
                let left = builder.build_ptr_to_int(left.into_pointer_value(), address_type, "")?;
                let right = builder.build_ptr_to_int(right.into_pointer_value(), address_type, "")?;

                builder.build_int_compare(predicate, left, right, "")?.into()
            }
            InternalType::Declared(_) => {
                let predicate = int_predicate(op, false).ok_or_else(|| unsupported(op, operand))?;
                let (left, right) = (self.enum_flag(left)?, self.enum_flag(right)?);

                builder.build_int_compare(predicate, left, right, "")?.into()
            }
            _ => return Err(unsupported(op, operand)),
        };

        Ok(value)
    }

    /// The flag of an enum value, which is either the flag itself or the
    /// first member of the payload union.
    fn enum_flag(&self, value: BasicValueEnum<'a>) -> Result<IntValue<'a>, Error> {
        match value {
            BasicValueEnum::IntValue(flag) => Ok(flag),
            BasicValueEnum::StructValue(union) => Ok(self
                .builder
                .build_extract_value(union, 0, "flag")?
                .into_int_value()),
            _ => Err(invalid_operation("enum value has no flag")),
        }
    }

    /// Integer powers go through `llvm.powi` on `f32` and convert back.
    fn gen_int_pow(&self, base: IntValue<'a>, exponent: IntValue<'a>, signed: bool) -> Result<IntValue<'a>, Error> {
        let int_type = base.get_type();
        let f32_type = self.context.f32_type();
        let i32_type = self.context.i32_type();

        let base = if signed {
            self.builder.build_signed_int_to_float(base, f32_type, "")?
        } else {
            self.builder.build_unsigned_int_to_float(base, f32_type, "")?
        };
        let exponent = self
            .builder
            .build_int_cast_sign_flag(exponent, i32_type, signed, "")?;

        let powi = self.intrinsic(
            "llvm.powi.f32.i32",
            f32_type.fn_type(&[f32_type.into(), i32_type.into()], false),
        );
        let arguments: [BasicMetadataValueEnum<'a>; 2] = [base.into(), exponent.into()];

        let result = self
            .builder
            .build_call(powi, &arguments, "pow")?
            .try_as_basic_value()
            .left()
            .ok_or_else(|| invalid_operation("`llvm.powi` returned no value"))?
            .into_float_value();

        Ok(if signed {
            self.builder.build_float_to_signed_int(result, int_type, "")?
        } else {
            self.builder.build_float_to_unsigned_int(result, int_type, "")?
        })
    }
}
