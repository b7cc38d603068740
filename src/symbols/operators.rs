use crate::{
    ast::ast::BinaryOp,
    types::types::InternalType,
};

use super::{
    decls::Signature,
    overload::{Callee, Candidate, OverloadList},
};

/// Functions the compiler lowers inline instead of calling.
#[derive(Debug, Clone, PartialEq)]
pub enum Intrinsic {
    /// A primitive binary operator on operands of `operand` type.
    Operator { op: BinaryOp, operand: InternalType },
    /// `#T.sizeof()`, the allocation size of a type in bytes.
    SizeOf(InternalType),
    /// `#T.alignof()`, its ABI alignment in bytes.
    AlignOf(InternalType),
}

fn binary(op: BinaryOp, operand: InternalType, result: InternalType) -> OverloadList {
    let name = op.operator_name();

    OverloadList::single(
        name,
        Candidate {
            signature: Signature::new(name, vec![operand.clone(), operand.clone()], false),
            return_type: result,
            callee: Callee::Intrinsic(Intrinsic::Operator { op, operand }),
        },
    )
}

/// The built-in overloads of `op` for operands of type `ty`, if `ty` has any.
///
/// `ty` should already be loaded and concrete. Arithmetic on numbers yields
/// the operand type, comparisons yield `bool`. Booleans, pointers and enums
/// only compare for equality; pointers compare as `void*`.
pub fn primitive_operators(op: BinaryOp, ty: &InternalType, is_enum: bool) -> Option<OverloadList> {
    let arithmetic = matches!(
        op,
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Pow
    );
    let equality = op == BinaryOp::Eq;

    match ty {
        InternalType::Int { .. } | InternalType::Float { .. } if arithmetic => {
            Some(binary(op, ty.clone(), ty.clone()))
        }
        InternalType::Int { .. } | InternalType::Float { .. } if op.is_comparison() => {
            Some(binary(op, ty.clone(), InternalType::Bool))
        }
        InternalType::Bool if equality || matches!(op, BinaryOp::And | BinaryOp::Or) => {
            Some(binary(op, InternalType::Bool, InternalType::Bool))
        }
        InternalType::Pointer(_) if equality => {
            Some(binary(op, InternalType::void_pointer(), InternalType::Bool))
        }
        InternalType::Declared(_) if is_enum && equality => {
            Some(binary(op, ty.clone(), InternalType::Bool))
        }
        _ => None,
    }
}

/// The static builtins every type carries.
pub fn builtin_static_methods(ty: &InternalType) -> Vec<OverloadList> {
    [
        ("sizeof", Intrinsic::SizeOf(ty.clone())),
        ("alignof", Intrinsic::AlignOf(ty.clone())),
    ]
        .into_iter()
        .map(|(name, intrinsic)| {
            OverloadList::single(
                name,
                Candidate {
                    signature: Signature::new(name, vec![], false),
                    return_type: InternalType::u64(),
                    callee: Callee::Intrinsic(intrinsic),
                },
            )
        })
        .collect()
}
