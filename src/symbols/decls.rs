use std::{collections::HashMap, rc::Rc};

use crate::{
    ast::ast::{FunctionDef, Privacy},
    errors::errors::{Error, ErrorImpl},
    types::types::{DeclId, DeclRef, InternalType},
    Position,
};

use super::{attributes::AttributeSet, namespace::NamespaceId, overload::OverloadList};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalId(pub(crate) usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    /// Position in the struct layout; assigned once, never reordered.
    pub index: u32,
    pub ty: InternalType,
    pub privacy: Privacy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumFlag {
    pub name: String,
    pub value: u64,
    pub payload: Vec<InternalType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumLayout {
    pub flags: Vec<EnumFlag>,
    /// Unsigned integer wide enough for the largest flag value.
    pub flag_type: InternalType,
}

impl EnumLayout {
    pub fn new(flags: Vec<EnumFlag>) -> Self {
        let largest = flags.iter().map(|flag| flag.value).max().unwrap_or(0);
        let width = if largest > u32::MAX as u64 {
            64
        } else if largest > u16::MAX as u64 {
            32
        } else if largest > u8::MAX as u64 {
            16
        } else {
            8
        };

        EnumLayout {
            flags,
            flag_type: InternalType::int(width, false),
        }
    }

    pub fn has_payload(&self) -> bool {
        self.flags.iter().any(|flag| !flag.payload.is_empty())
    }

    pub fn flag(&self, name: &str) -> Option<&EnumFlag> {
        self.flags.iter().find(|flag| flag.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Struct,
    Trait,
    Enum(EnumLayout),
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub id: DeclId,
    pub name: String,
    pub namespace: NamespaceId,
    pub full_name: String,
    pub privacy: Privacy,
    pub kind: TypeKind,
    pub is_foreign: bool,
    /// Rebuilt from a dependency's metadata; has no bodies to compile.
    pub is_external: bool,
    pub is_union: bool,
    pub fields: Vec<Field>,
    pub methods: HashMap<String, OverloadList>,
    pub static_methods: HashMap<String, OverloadList>,
    pub implemented_traits: Vec<DeclId>,
    pub attributes: AttributeSet,
    pub position: Position,
}

impl TypeDecl {
    pub fn new(
        name: &str,
        namespace: NamespaceId,
        full_name: String,
        privacy: Privacy,
        kind: TypeKind,
        position: Position,
    ) -> Self {
        TypeDecl {
            id: DeclId::fresh(),
            name: name.to_string(),
            namespace,
            full_name,
            privacy,
            kind,
            is_foreign: false,
            is_external: false,
            is_union: false,
            fields: vec![],
            methods: HashMap::new(),
            static_methods: HashMap::new(),
            implemented_traits: vec![],
            attributes: AttributeSet::default(),
            position,
        }
    }

    pub fn decl_ref(&self) -> DeclRef {
        DeclRef::new(self.id, &self.full_name)
    }

    pub fn as_type(&self) -> InternalType {
        InternalType::Declared(self.decl_ref())
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct)
    }

    pub fn enum_layout(&self) -> Option<&EnumLayout> {
        match &self.kind {
            TypeKind::Enum(layout) => Some(layout),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Appends a field at the next free index.
    pub fn add_field(&mut self, name: &str, ty: InternalType, privacy: Privacy) -> Result<u32, Error> {
        if self.field(name).is_some() {
            return Err(Error::unpositioned(ErrorImpl::AlreadyDeclared {
                name: format!("{}.{}", self.full_name, name),
            }));
        }

        let index = self.fields.len() as u32;
        self.fields.push(Field {
            name: name.to_string(),
            index,
            ty,
            privacy,
        });

        Ok(index)
    }

    pub fn method_table(&self, is_static: bool) -> &HashMap<String, OverloadList> {
        if is_static {
            &self.static_methods
        } else {
            &self.methods
        }
    }

    pub fn method_table_mut(&mut self, is_static: bool) -> &mut HashMap<String, OverloadList> {
        if is_static {
            &mut self.static_methods
        } else {
            &mut self.methods
        }
    }
}

/// Name plus ordered parameter types: the key overloads are matched on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub name: String,
    pub params: Vec<InternalType>,
    pub is_variadic: bool,
}

impl Signature {
    pub fn new(name: &str, params: Vec<InternalType>, is_variadic: bool) -> Self {
        Signature {
            name: name.to_string(),
            params,
            is_variadic,
        }
    }

    /// Whether two overloads would be indistinguishable at a call site.
    pub fn same_params(&self, other: &Signature) -> bool {
        self.is_variadic == other.is_variadic
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(other.params.iter())
                .all(|(a, b)| a == b)
    }

    /// Parameter list as it appears in symbol names, e.g. `(i32, u8*)`.
    pub fn param_list(&self) -> String {
        let mut params = self
            .params
            .iter()
            .map(|param| param.to_string())
            .collect::<Vec<_>>();

        if self.is_variadic {
            params.push(String::from("~~"));
        }

        format!("({})", params.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionOwner {
    Namespace(NamespaceId),
    Type(DeclId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionState {
    Declared,
    Compiled,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub id: FuncId,
    pub name: String,
    pub owner: FunctionOwner,
    pub full_name: String,
    pub signature: Signature,
    pub return_type: InternalType,
    pub param_names: Vec<String>,
    pub is_static: bool,
    pub privacy: Privacy,
    pub is_foreign: bool,
    pub is_external: bool,
    pub attributes: AttributeSet,
    pub state: FunctionState,
    pub symbol_name: String,
    /// Source of the body, absent for foreign and external functions.
    pub definition: Option<Rc<FunctionDef>>,
}

impl Function {
    /// A private, non-static function with no body; the symbol table
    /// assigns its id and symbol name when it is added.
    pub fn new(
        name: &str,
        owner: FunctionOwner,
        full_name: String,
        signature: Signature,
        return_type: InternalType,
    ) -> Self {
        Function {
            id: FuncId(usize::MAX),
            name: name.to_string(),
            owner,
            full_name,
            signature,
            return_type,
            param_names: vec![],
            is_static: false,
            privacy: Privacy::Private,
            is_foreign: false,
            is_external: false,
            attributes: AttributeSet::default(),
            state: FunctionState::Declared,
            symbol_name: String::new(),
            definition: None,
        }
    }

    /// The symbol a function is emitted under.
    ///
    /// `main`, foreign and exported functions keep their plain name so the
    /// linker and C callers can find them; everything else is mangled with
    /// its full name and parameter types.
    pub fn symbol_name_for(
        name: &str,
        full_name: &str,
        signature: &Signature,
        is_foreign: bool,
        attributes: &AttributeSet,
        owner_is_namespace: bool,
    ) -> String {
        if is_foreign || attributes.export || (owner_is_namespace && name == "main") {
            name.to_string()
        } else {
            format!("{}{}", full_name, signature.param_list())
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(self.owner, FunctionOwner::Type(_))
    }

    pub fn has_body(&self) -> bool {
        !self.is_foreign && !self.is_external
    }

    /// The backend-level function type, with `self` prepended for
    /// instance methods.
    pub fn function_type(&self, owner: Option<&TypeDecl>) -> InternalType {
        let mut params = vec![];

        if let (false, Some(owner)) = (self.is_static, owner) {
            params.push(owner.as_type().pointer_to());
        }
        params.extend(self.signature.params.iter().cloned());

        InternalType::function(self.return_type.clone(), params, self.signature.is_variadic)
    }
}

#[derive(Debug, Clone)]
pub struct Global {
    pub id: GlobalId,
    pub name: String,
    pub namespace: NamespaceId,
    pub full_name: String,
    pub ty: InternalType,
    pub privacy: Privacy,
    pub is_constant: bool,
    pub is_external: bool,
}

impl Global {
    pub fn new(name: &str, namespace: NamespaceId, full_name: String, ty: InternalType) -> Self {
        Global {
            id: GlobalId(usize::MAX),
            name: name.to_string(),
            namespace,
            full_name,
            ty,
            privacy: Privacy::Private,
            is_constant: false,
            is_external: false,
        }
    }
}
