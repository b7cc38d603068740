//! Unit tests for the type system.

use crate::ast::ast::BinaryOp;

use super::{
    abstract_int::{default_type, fits, fold},
    casts::{classify_cast, CastKind},
    conversions::Conversion,
    types::{DeclId, DeclRef, InternalType},
};

fn primitives() -> Vec<InternalType> {
    vec![
        InternalType::Void,
        InternalType::Bool,
        InternalType::int(8, true),
        InternalType::int(16, true),
        InternalType::int(32, true),
        InternalType::int(64, true),
        InternalType::int(8, false),
        InternalType::int(16, false),
        InternalType::int(32, false),
        InternalType::int(64, false),
        InternalType::Float { width: 16 },
        InternalType::Float { width: 32 },
        InternalType::Float { width: 64 },
    ]
}

#[test]
fn test_conversion_is_reflexive() {
    for ty in primitives() {
        assert!(ty.can_convert_to(&ty), "{} should convert to itself", ty);
        let pointer = ty.clone().pointer_to();
        assert!(pointer.can_convert_to(&pointer));
    }
}

#[test]
fn test_literal_bounds_for_unsigned_targets() {
    assert!(!InternalType::AbstractInt(256).can_convert_to(&InternalType::u8()));
    assert!(InternalType::AbstractInt(255).can_convert_to(&InternalType::u8()));

    for width in [8, 16, 32, 64] {
        let target = InternalType::int(width, false);
        assert!(!InternalType::AbstractInt(-6).can_convert_to(&target));
    }
}

#[test]
fn test_literal_bounds_for_signed_targets() {
    let i8_ = InternalType::int(8, true);
    assert!(InternalType::AbstractInt(-128).can_convert_to(&i8_));
    assert!(InternalType::AbstractInt(127).can_convert_to(&i8_));
    assert!(!InternalType::AbstractInt(128).can_convert_to(&i8_));
    assert!(!InternalType::AbstractInt(-129).can_convert_to(&i8_));

    assert!(InternalType::AbstractInt(i64::MIN).can_convert_to(&InternalType::i64()));
    assert!(!InternalType::AbstractInt(i64::from(i32::MAX) + 1).can_convert_to(&InternalType::i32()));
}

#[test]
fn test_literal_never_converts_to_bool_or_pointer() {
    assert!(!InternalType::AbstractInt(0).can_convert_to(&InternalType::Bool));
    assert!(!InternalType::AbstractInt(1).can_convert_to(&InternalType::void_pointer()));
}

#[test]
fn test_literal_to_float_requires_exact_value() {
    let f16_ = InternalType::Float { width: 16 };
    assert!(fits(2048, &f16_));
    assert!(!fits(2049, &f16_));
    assert!(fits(1 << 24, &InternalType::f32()));
    assert!(!fits((1 << 24) + 1, &InternalType::f32()));
    assert!(fits(-(1 << 53), &InternalType::f64()));
}

#[test]
fn test_literal_default_type() {
    assert_eq!(default_type(6), InternalType::i32());
    assert_eq!(default_type(i64::from(i32::MIN)), InternalType::i32());
    assert_eq!(default_type(i64::from(i32::MAX) + 1), InternalType::i64());
    assert_eq!(InternalType::AbstractInt(3).concrete(), InternalType::i32());
}

#[test]
fn test_literal_folding() {
    assert_eq!(fold(BinaryOp::Add, 4, 2), Some(6));
    assert_eq!(fold(BinaryOp::Mod, 7, 4), Some(3));
    assert_eq!(fold(BinaryOp::Div, 1, 0), None);
    assert_eq!(fold(BinaryOp::Mul, i64::MAX, 2), None);
    assert_eq!(fold(BinaryOp::Pow, 4, 2), None);
    assert_eq!(fold(BinaryOp::Gt, 4, 2), None);
}

#[test]
fn test_reference_conversions() {
    let reference = InternalType::i32().reference_to();

    assert_eq!(reference.conversion_to(&InternalType::i32()), Some(Conversion::Load));
    assert_eq!(
        reference.conversion_to(&InternalType::i32().pointer_to()),
        Some(Conversion::ReferenceToPointer)
    );
    assert_eq!(reference.conversion_to(&InternalType::i64()), None);
}

#[test]
fn test_pointer_to_void_and_back() {
    let pointer = InternalType::u8().pointer_to();

    assert_eq!(
        pointer.conversion_to(&InternalType::void_pointer()),
        Some(Conversion::PointerToVoid)
    );
    assert_eq!(
        InternalType::void_pointer().conversion_to(&pointer),
        Some(Conversion::PointerFromVoid)
    );
    assert!(!pointer.can_convert_to(&InternalType::i32().pointer_to()));
}

#[test]
fn test_array_converts_to_element_pointer() {
    let array = InternalType::i32().array_of();
    assert_eq!(
        array.conversion_to(&InternalType::i32().pointer_to()),
        Some(Conversion::ArrayToPointer)
    );
}

#[test]
fn test_float_only_widens_implicitly() {
    assert_eq!(
        InternalType::f32().conversion_to(&InternalType::f64()),
        Some(Conversion::FloatExtend)
    );
    assert!(!InternalType::f64().can_convert_to(&InternalType::f32()));
}

#[test]
fn test_declared_types_compare_by_identity() {
    let first = DeclRef::new(DeclId::fresh(), "root::shop#Item");
    let second = DeclRef::new(DeclId::fresh(), "root::shop#Item");

    assert_ne!(
        InternalType::Declared(first.clone()),
        InternalType::Declared(second)
    );
    assert_eq!(
        InternalType::Declared(first.clone()),
        InternalType::Declared(first)
    );
}

#[test]
fn test_type_display() {
    assert_eq!(InternalType::u8().pointer_to().to_string(), "u8*");
    assert_eq!(InternalType::i32().reference_to().to_string(), "i32&");
    assert_eq!(InternalType::f64().array_of().to_string(), "f64[]");
    assert_eq!(
        InternalType::function(InternalType::Bool, vec![InternalType::i32(), InternalType::i32()], false)
            .to_string(),
        "(i32, i32) bool"
    );
    assert_eq!(
        InternalType::function(InternalType::i32(), vec![InternalType::u8().pointer_to()], true).to_string(),
        "(u8*, ~~) i32"
    );
}

#[test]
fn test_primitive_lookup() {
    assert_eq!(InternalType::primitive("u16"), Some(InternalType::int(16, false)));
    assert_eq!(InternalType::primitive("char"), Some(InternalType::u8()));
    assert_eq!(InternalType::primitive("Item"), None);
}

#[test]
fn test_cast_classification() {
    assert_eq!(classify_cast(&InternalType::i32(), &InternalType::i32()), Some(CastKind::Identity));
    assert_eq!(classify_cast(&InternalType::f32(), &InternalType::f64()), Some(CastKind::Implicit));
    assert_eq!(classify_cast(&InternalType::i64(), &InternalType::u8()), Some(CastKind::IntResize));
    assert_eq!(classify_cast(&InternalType::i32(), &InternalType::f32()), Some(CastKind::IntToFloat));
    assert_eq!(classify_cast(&InternalType::f64(), &InternalType::i32()), Some(CastKind::FloatToInt));
    assert_eq!(classify_cast(&InternalType::f64(), &InternalType::f32()), Some(CastKind::FloatResize));
    assert_eq!(classify_cast(&InternalType::i32(), &InternalType::Bool), Some(CastKind::IntToBool));
    assert_eq!(classify_cast(&InternalType::Bool, &InternalType::i32()), Some(CastKind::BoolToInt));
    assert_eq!(
        classify_cast(&InternalType::u8().pointer_to(), &InternalType::u64()),
        Some(CastKind::PointerToInt)
    );
    assert_eq!(
        classify_cast(&InternalType::u64(), &InternalType::u8().pointer_to()),
        Some(CastKind::IntToPointer)
    );
    assert_eq!(
        classify_cast(&InternalType::u8().pointer_to(), &InternalType::i32().pointer_to()),
        Some(CastKind::PointerReinterpret)
    );
    assert_eq!(
        classify_cast(&InternalType::AbstractInt(300), &InternalType::u8()),
        Some(CastKind::IntResize)
    );
    assert_eq!(classify_cast(&InternalType::Void, &InternalType::i32()), None);
}
