use std::{
    fmt::Display,
    hash::{Hash, Hasher},
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

static NEXT_DECL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a type declaration.
///
/// A fresh id is handed out every time a struct, trait or enum is declared,
/// including when the same logical type is rebuilt from metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(u64);

impl DeclId {
    pub fn fresh() -> Self {
        DeclId(NEXT_DECL_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A reference to a declared type, as stored inside [`InternalType`].
///
/// Equality and hashing only look at the id; the name is kept for display.
#[derive(Debug, Clone)]
pub struct DeclRef {
    pub id: DeclId,
    pub name: Rc<str>,
}

impl DeclRef {
    pub fn new(id: DeclId, name: &str) -> Self {
        DeclRef {
            id,
            name: Rc::from(name),
        }
    }
}

impl PartialEq for DeclRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DeclRef {}

impl Hash for DeclRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType {
    pub return_type: Box<InternalType>,
    pub params: Vec<InternalType>,
    pub is_variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InternalType {
    Void,
    Bool,
    Int { width: u32, signed: bool },
    Float { width: u32 },
    /// An integer literal whose width has not been fixed yet.
    AbstractInt(i64),
    Pointer(Box<InternalType>),
    Reference(Box<InternalType>),
    Function(FunctionType),
    Array(Box<InternalType>),
    Declared(DeclRef),
}

impl InternalType {
    pub fn int(width: u32, signed: bool) -> Self {
        InternalType::Int { width, signed }
    }

    pub fn i32() -> Self {
        InternalType::int(32, true)
    }

    pub fn i64() -> Self {
        InternalType::int(64, true)
    }

    pub fn u8() -> Self {
        InternalType::int(8, false)
    }

    pub fn u64() -> Self {
        InternalType::int(64, false)
    }

    pub fn f32() -> Self {
        InternalType::Float { width: 32 }
    }

    pub fn f64() -> Self {
        InternalType::Float { width: 64 }
    }

    pub fn void_pointer() -> Self {
        InternalType::Pointer(Box::new(InternalType::Void))
    }

    pub fn pointer_to(self) -> Self {
        InternalType::Pointer(Box::new(self))
    }

    pub fn reference_to(self) -> Self {
        InternalType::Reference(Box::new(self))
    }

    pub fn array_of(self) -> Self {
        InternalType::Array(Box::new(self))
    }

    pub fn function(return_type: InternalType, params: Vec<InternalType>, is_variadic: bool) -> Self {
        InternalType::Function(FunctionType {
            return_type: Box::new(return_type),
            params,
            is_variadic,
        })
    }

    /// Looks up a primitive by its source name (`i32`, `u8`, `f64`, `bool`, `void`).
    pub fn primitive(name: &str) -> Option<Self> {
        let ty = match name {
            "void" => InternalType::Void,
            "bool" => InternalType::Bool,
            "i8" => InternalType::int(8, true),
            "i16" => InternalType::int(16, true),
            "i32" => InternalType::int(32, true),
            "i64" => InternalType::int(64, true),
            "u8" | "char" => InternalType::int(8, false),
            "u16" => InternalType::int(16, false),
            "u32" => InternalType::int(32, false),
            "u64" => InternalType::int(64, false),
            "f16" => InternalType::Float { width: 16 },
            "f32" => InternalType::Float { width: 32 },
            "f64" => InternalType::Float { width: 64 },
            _ => return None,
        };

        Some(ty)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, InternalType::Int { .. } | InternalType::AbstractInt(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, InternalType::Float { .. })
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, InternalType::AbstractInt(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, InternalType::Pointer(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, InternalType::Reference(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, InternalType::Void)
    }

    /// Whether a value of this type can be incremented or decremented.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            InternalType::Int { .. } | InternalType::Float { .. } | InternalType::Bool
        )
    }

    /// The pointee of a pointer, reference or array.
    pub fn base(&self) -> Option<&InternalType> {
        match self {
            InternalType::Pointer(base)
            | InternalType::Reference(base)
            | InternalType::Array(base) => Some(base),
            _ => None,
        }
    }

    /// Strips one level of reference, if any.
    pub fn dereferenced(&self) -> &InternalType {
        match self {
            InternalType::Reference(base) => base,
            other => other,
        }
    }

    pub fn as_declared(&self) -> Option<&DeclRef> {
        match self {
            InternalType::Declared(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionType> {
        match self {
            InternalType::Function(function) => Some(function),
            _ => None,
        }
    }

    /// The concrete type an abstract integer falls back to when nothing
    /// forces a width. Any other type is returned unchanged.
    pub fn concrete(&self) -> InternalType {
        match self {
            InternalType::AbstractInt(value) => super::abstract_int::default_type(*value),
            other => other.clone(),
        }
    }

    /// Bit width of primitive scalars, `None` for everything else.
    pub fn primitive_width(&self) -> Option<u32> {
        match self {
            InternalType::Bool => Some(1),
            InternalType::Int { width, .. } | InternalType::Float { width } => Some(*width),
            _ => None,
        }
    }
}

impl Display for InternalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InternalType::Void => write!(f, "void"),
            InternalType::Bool => write!(f, "bool"),
            InternalType::Int { width, signed } => {
                write!(f, "{}{}", if *signed { "i" } else { "u" }, width)
            }
            InternalType::Float { width } => write!(f, "f{}", width),
            InternalType::AbstractInt(value) => write!(f, "{{integer {}}}", value),
            InternalType::Pointer(base) => write!(f, "{}*", base),
            InternalType::Reference(base) => write!(f, "{}&", base),
            InternalType::Array(base) => write!(f, "{}[]", base),
            InternalType::Function(function) => {
                let params = function
                    .params
                    .iter()
                    .map(|param| param.to_string())
                    .collect::<Vec<_>>();

                write!(f, "({}", params.join(", "))?;
                if function.is_variadic {
                    write!(f, "{}~~", if params.is_empty() { "" } else { ", " })?;
                }
                write!(f, ") {}", function.return_type)
            }
            InternalType::Declared(decl) => write!(f, "{}", decl.name),
        }
    }
}
