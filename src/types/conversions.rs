use super::{abstract_int, types::InternalType};

/// How a value is rewritten when it converts implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// `T&` to `T`, by loading through the reference.
    Load,
    /// `T&` to `T*`, reinterpreting the address.
    ReferenceToPointer,
    /// `T*` to `void*`.
    PointerToVoid,
    /// `void*` (including `null`) to `T*`.
    PointerFromVoid,
    /// `T[]` to `T*`.
    ArrayToPointer,
    /// An integer literal materialised as a concrete integer or float constant.
    AbstractInt(i64),
    /// A float widened to a larger float.
    FloatExtend,
}

const INTEGER_TARGETS: [(u32, bool); 8] = [
    (8, true),
    (16, true),
    (32, true),
    (64, true),
    (8, false),
    (16, false),
    (32, false),
    (64, false),
];

const FLOAT_WIDTHS: [u32; 3] = [16, 32, 64];

impl InternalType {
    /// Every destination this type converts to implicitly, with the rewrite
    /// that performs the conversion.
    ///
    /// Conversions into `void*` from pointers and out of `void*` are listed
    /// against `void*` and the pointer itself respectively, since the set of
    /// pointer types is open; use [`InternalType::conversion_to`] to query a
    /// specific destination.
    pub fn implicit_conversions(&self) -> Vec<(InternalType, Conversion)> {
        match self {
            InternalType::Reference(base) => vec![
                ((**base).clone(), Conversion::Load),
                (base.as_ref().clone().pointer_to(), Conversion::ReferenceToPointer),
            ],
            InternalType::Pointer(base) if !base.is_void() => {
                vec![(InternalType::void_pointer(), Conversion::PointerToVoid)]
            }
            InternalType::Array(base) => vec![(
                base.as_ref().clone().pointer_to(),
                Conversion::ArrayToPointer,
            )],
            InternalType::AbstractInt(value) => INTEGER_TARGETS
                .iter()
                .map(|(width, signed)| InternalType::int(*width, *signed))
                .chain(FLOAT_WIDTHS.iter().map(|width| InternalType::Float { width: *width }))
                .filter(|target| abstract_int::fits(*value, target))
                .map(|target| (target, Conversion::AbstractInt(*value)))
                .collect(),
            InternalType::Float { width } => FLOAT_WIDTHS
                .iter()
                .filter(|target| **target > *width)
                .map(|target| (InternalType::Float { width: *target }, Conversion::FloatExtend))
                .collect(),
            _ => vec![],
        }
    }

    /// The conversion that turns a value of this type into `target`, if any.
    ///
    /// Identity is not a conversion; callers check equality first.
    pub fn conversion_to(&self, target: &InternalType) -> Option<Conversion> {
        match (self, target) {
            (InternalType::Pointer(base), InternalType::Pointer(other))
                if base.is_void() && !other.is_void() =>
            {
                Some(Conversion::PointerFromVoid)
            }
            _ => self
                .implicit_conversions()
                .into_iter()
                .find(|(destination, _)| destination == target)
                .map(|(_, conversion)| conversion),
        }
    }

    /// Whether a value of this type may be used where `target` is expected.
    pub fn can_convert_to(&self, target: &InternalType) -> bool {
        self == target || self.conversion_to(target).is_some()
    }
}
