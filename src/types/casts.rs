use super::types::InternalType;

/// The instruction family an explicit cast lowers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    Identity,
    /// The value converts implicitly; the cast only documents intent.
    Implicit,
    IntResize,
    IntToFloat,
    FloatToInt,
    FloatResize,
    /// Compares against zero.
    IntToBool,
    /// Zero-extends.
    BoolToInt,
    PointerToInt,
    IntToPointer,
    PointerReinterpret,
    /// Bit pattern reinterpretation between equally wide primitives.
    Bitcast,
}

/// Decides how `from` is cast to `to`, or `None` if the cast is invalid.
///
/// `from` is expected to be loaded already; abstract integers are treated
/// as their default type unless they convert implicitly.
pub fn classify_cast(from: &InternalType, to: &InternalType) -> Option<CastKind> {
    if from == to {
        return Some(CastKind::Identity);
    }

    if from.can_convert_to(to) {
        return Some(CastKind::Implicit);
    }

    let from = from.concrete();

    let kind = match (&from, to) {
        (InternalType::Int { .. }, InternalType::Int { .. }) => CastKind::IntResize,
        (InternalType::Int { .. }, InternalType::Float { .. }) => CastKind::IntToFloat,
        (InternalType::Float { .. }, InternalType::Int { .. }) => CastKind::FloatToInt,
        (InternalType::Float { .. }, InternalType::Float { .. }) => CastKind::FloatResize,
        (InternalType::Int { .. }, InternalType::Bool) => CastKind::IntToBool,
        (InternalType::Bool, InternalType::Int { .. }) => CastKind::BoolToInt,
        (InternalType::Pointer(_), InternalType::Int { .. }) => CastKind::PointerToInt,
        (InternalType::Int { .. }, InternalType::Pointer(_)) => CastKind::IntToPointer,
        (
            InternalType::Pointer(_) | InternalType::Array(_) | InternalType::Function(_),
            InternalType::Pointer(_),
        ) => CastKind::PointerReinterpret,
        (InternalType::Pointer(_), InternalType::Function(_)) => CastKind::PointerReinterpret,
        _ => match (from.primitive_width(), to.primitive_width()) {
            (Some(a), Some(b)) if a == b => CastKind::Bitcast,
            _ => return None,
        },
    };

    Some(kind)
}
