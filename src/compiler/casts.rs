use inkwell::{types::BasicTypeEnum, values::BasicValueEnum, IntPredicate};

use crate::{
    errors::errors::{Error, ErrorImpl},
    types::{
        casts::{classify_cast, CastKind},
        conversions::Conversion,
        types::InternalType,
    },
};

use super::{compiler::Compiler, scope::Value};

fn mismatch(expected: &InternalType, received: &InternalType) -> Error {
    Error::unpositioned(ErrorImpl::TypeMatchError {
        expected: expected.to_string(),
        received: received.to_string(),
    })
}

impl<'a> Compiler<'a> {
    /// Reads through a reference. Anything else is returned unchanged.
    pub fn load(&self, value: Value<'a>) -> Result<Value<'a>, Error> {
        let InternalType::Reference(base) = &value.ty else {
            return Ok(value);
        };

        let loaded = self
            .builder
            .build_load(value.value.into_pointer_value(), "")?;

        Ok(Value::new((**base).clone(), loaded))
    }

    /// Gives an integer literal its default concrete type.
    pub fn materialize(&self, value: Value<'a>) -> Result<Value<'a>, Error> {
        match &value.ty {
            InternalType::AbstractInt(_) => {
                let concrete = value.ty.concrete();
                self.convert(value, &concrete)
            }
            _ => Ok(value),
        }
    }

    /// The constant an integer literal becomes as a `target`.
    fn literal_constant(&self, literal: i64, target: &InternalType) -> Result<BasicValueEnum<'a>, Error> {
        let constant = match self.basic_type(target)? {
            BasicTypeEnum::IntType(int_type) => int_type.const_int(literal as u64, true).into(),
            BasicTypeEnum::FloatType(float_type) => float_type.const_float(literal as f64).into(),
            _ => return Err(mismatch(target, &InternalType::AbstractInt(literal))),
        };

        Ok(constant)
    }

    /// Applies the implicit conversion from `value` to `target`.
    ///
    /// A reference that does not convert directly is loaded first, so a
    /// `f32&` local can flow into an `f64` slot.
    pub fn convert(&self, value: Value<'a>, target: &InternalType) -> Result<Value<'a>, Error> {
        if value.ty == *target {
            return Ok(value);
        }

        let Some(conversion) = value.ty.conversion_to(target) else {
            if value.ty.is_reference() {
                let loaded = self.load(value)?;
                return self.convert(loaded, target);
            }

            return Err(mismatch(target, &value.ty));
        };

        let converted = match conversion {
            Conversion::Load => return self.load(value),
            Conversion::ReferenceToPointer | Conversion::ArrayToPointer => value.value,
            Conversion::PointerToVoid | Conversion::PointerFromVoid => self
                .builder
                .build_pointer_cast(value.value.into_pointer_value(), self.pointer_type_of(target)?, "")?
                .into(),
            Conversion::AbstractInt(literal) => self.literal_constant(literal, target)?,
            Conversion::FloatExtend => self
                .builder
                .build_float_ext(
                    value.value.into_float_value(),
                    self.basic_type(target)?.into_float_type(),
                    "",
                )?
                .into(),
        };

        Ok(Value::new(target.clone(), converted))
    }

    fn pointer_type_of(&self, ty: &InternalType) -> Result<inkwell::types::PointerType<'a>, Error> {
        Ok(self.basic_type(ty)?.into_pointer_type())
    }

    /// Lowers an explicit `#T <- value` cast.
    pub fn cast(&self, value: Value<'a>, target: &InternalType) -> Result<Value<'a>, Error> {
        let value = self.load(value)?;

        let Some(kind) = classify_cast(&value.ty, target) else {
            return Err(Error::unpositioned(ErrorImpl::InvalidCast {
                from: value.ty.to_string(),
                to: target.to_string(),
            }));
        };

        if kind == CastKind::Implicit {
            return self.convert(value, target);
        }

        let value = self.materialize(value)?;
        let target_type = self.basic_type(target)?;
        let signed = |ty: &InternalType| matches!(ty, InternalType::Int { signed: true, .. });

        let cast: BasicValueEnum<'a> = match kind {
            CastKind::Identity | CastKind::Implicit => value.value,
            CastKind::IntResize => self
                .builder
                .build_int_cast_sign_flag(
                    value.value.into_int_value(),
                    target_type.into_int_type(),
                    signed(&value.ty),
                    "",
                )?
                .into(),
            CastKind::IntToFloat if signed(&value.ty) => self
                .builder
                .build_signed_int_to_float(value.value.into_int_value(), target_type.into_float_type(), "")?
                .into(),
            CastKind::IntToFloat => self
                .builder
                .build_unsigned_int_to_float(value.value.into_int_value(), target_type.into_float_type(), "")?
                .into(),
            CastKind::FloatToInt if signed(target) => self
                .builder
                .build_float_to_signed_int(value.value.into_float_value(), target_type.into_int_type(), "")?
                .into(),
            CastKind::FloatToInt => self
                .builder
                .build_float_to_unsigned_int(value.value.into_float_value(), target_type.into_int_type(), "")?
                .into(),
            CastKind::FloatResize => self
                .builder
                .build_float_cast(value.value.into_float_value(), target_type.into_float_type(), "")?
                .into(),
            CastKind::IntToBool => {
                let int_value = value.value.into_int_value();
                self.builder
                    .build_int_compare(IntPredicate::NE, int_value, int_value.get_type().const_zero(), "")?
                    .into()
            }
            CastKind::BoolToInt => self
                .builder
                .build_int_z_extend(value.value.into_int_value(), target_type.into_int_type(), "")?
                .into(),
            CastKind::PointerToInt => self
                .builder
                .build_ptr_to_int(value.value.into_pointer_value(), target_type.into_int_type(), "")?
                .into(),
            CastKind::IntToPointer => self
                .builder
                .build_int_to_ptr(value.value.into_int_value(), target_type.into_pointer_type(), "")?
                .into(),
            CastKind::PointerReinterpret => self
                .builder
                .build_pointer_cast(value.value.into_pointer_value(), target_type.into_pointer_type(), "")?
                .into(),
            CastKind::Bitcast => self.builder.build_bit_cast(value.value, target_type, "")?,
        };

        Ok(Value::new(target.clone(), cast))
    }
}
