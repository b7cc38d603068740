use crate::ast::ast::BinaryOp;

use super::types::InternalType;

/// Whether the literal `value` fits `target` exactly.
///
/// Signed targets accept their two's-complement range, unsigned targets
/// reject negative values, floats accept integers their mantissa holds
/// without rounding. Booleans never accept integer literals.
pub fn fits(value: i64, target: &InternalType) -> bool {
    match target {
        InternalType::Int { width, signed: true } => {
            let (low, high) = match width {
                8 => (i8::MIN as i64, i8::MAX as i64),
                16 => (i16::MIN as i64, i16::MAX as i64),
                32 => (i32::MIN as i64, i32::MAX as i64),
                64 => (i64::MIN, i64::MAX),
                _ => return false,
            };

            value >= low && value <= high
        }
        InternalType::Int { width, signed: false } => {
            if value < 0 {
                return false;
            }

            let high = match width {
                8 => u8::MAX as i64,
                16 => u16::MAX as i64,
                32 => u32::MAX as i64,
                64 => i64::MAX,
                _ => return false,
            };

            value <= high
        }
        InternalType::Float { width } => {
            let mantissa_limit: i64 = match width {
                16 => 1 << 11,
                32 => 1 << 24,
                64 => 1 << 53,
                _ => return false,
            };

            value.unsigned_abs() <= mantissa_limit as u64
        }
        _ => false,
    }
}

/// The type an unconsumed literal takes: `i32` when it fits, `i64` otherwise.
pub fn default_type(value: i64) -> InternalType {
    if fits(value, &InternalType::i32()) {
        InternalType::i32()
    } else {
        InternalType::i64()
    }
}

/// Folds arithmetic on two literals.
///
/// Returns `None` when the operation is not foldable or would overflow, in
/// which case both operands are lowered with their default type instead.
pub fn fold(op: BinaryOp, left: i64, right: i64) -> Option<i64> {
    match op {
        BinaryOp::Add => left.checked_add(right),
        BinaryOp::Sub => left.checked_sub(right),
        BinaryOp::Mul => left.checked_mul(right),
        BinaryOp::Div => left.checked_div(right),
        BinaryOp::Mod => left.checked_rem(right),
        _ => None,
    }
}
