use std::collections::{HashMap, HashSet};

use inkwell::{module::Linkage, types::BasicTypeEnum};
use tracing::{debug, warn};

use crate::{
    compiler::{compiler::Compiler, options::Dependency},
    errors::errors::{Error, ErrorImpl},
    symbols::{
        decls::{FuncId, Function, FunctionOwner, Global, GlobalId, Signature, TypeKind},
        namespace::{parse_full_name, NamespaceId},
    },
    types::types::{DeclId, InternalType},
    Position,
};

use super::format::{
    corrupt, read_table, FieldRecord, FuncTypeRecord, FunctionRecord, GlobalRecord, Header, ParamRecord,
    ParamTypeRecord, Reader, Record, Slice, TypeRecord, TypeTag, Version, FORMAT_VERSION, FUNCTION_EXPORT,
    FUNCTION_STATIC,
};

/// Deepest pointer, reference or array wrapping, and deepest function-type
/// nesting, a type reference may carry.
pub const MAX_TYPE_DEPTH: usize = 64;

/// The decoded tables of a metadata blob.
#[derive(Debug, Clone)]
pub struct Metadata {
    pub format_version: Version,
    pub module_version: Version,
    pub types: Vec<TypeRecord>,
    pub fields: Vec<FieldRecord>,
    pub functions: Vec<FunctionRecord>,
    pub globals: Vec<GlobalRecord>,
    pub func_types: Vec<FuncTypeRecord>,
    pub params: Vec<ParamRecord>,
    pub param_types: Vec<ParamTypeRecord>,
    pub type_refs: Vec<u8>,
    pub names: Vec<u8>,
}

impl Metadata {
    /// Splits a blob into its tables.
    ///
    /// Fails on a foreign format major version, and on any table that does
    /// not hold a whole number of records or a blob with bytes missing or
    /// left over.
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        let mut reader = Reader::new(bytes);

        let format_version = Version::read(&mut reader)?;
        if format_version.major != FORMAT_VERSION.major {
            return Err(Error::unpositioned(ErrorImpl::MetadataVersionMismatch {
                expected: FORMAT_VERSION.to_string(),
                received: format_version.to_string(),
            }));
        }

        let module_version = Version::read(&mut reader)?;
        let header = Header::read(&mut reader)?;

        if header.size as usize != bytes.len() {
            return Err(corrupt(&format!(
                "header describes {} bytes but the blob has {}",
                header.size,
                bytes.len()
            )));
        }

        let table = |index: usize| {
            bytes
                .get(header.table(index))
                .ok_or_else(|| corrupt(&format!("table {} lies outside the blob", index)))
        };

        Ok(Metadata {
            format_version,
            module_version,
            types: read_table(table(0)?)?,
            fields: read_table(table(1)?)?,
            functions: read_table(table(2)?)?,
            globals: read_table(table(3)?)?,
            func_types: read_table(table(4)?)?,
            params: read_table(table(5)?)?,
            param_types: read_table(table(6)?)?,
            type_refs: table(7)?.to_vec(),
            names: table(8)?.to_vec(),
        })
    }

    pub fn name(&self, slice: Slice) -> Result<&str, Error> {
        let bytes = self.names.get(slice.range()).ok_or_else(|| {
            Error::unpositioned(ErrorImpl::MetadataIndexOutOfRange {
                table: String::from("name"),
                index: slice.index,
            })
        })?;

        std::str::from_utf8(bytes).map_err(|_| Error::unpositioned(ErrorImpl::InvalidMetadataName { index: slice.index }))
    }

    fn type_ref(&self, slice: Slice) -> Result<&[u8], Error> {
        self.type_refs
            .get(slice.range())
            .ok_or_else(|| out_of_range("type reference", slice.index))
    }
}

fn out_of_range(table: &str, index: u32) -> Error {
    Error::unpositioned(ErrorImpl::MetadataIndexOutOfRange {
        table: table.to_string(),
        index,
    })
}

/// The records of `table` that `slice` covers.
fn records<'m, R: Record>(table: &'m [R], slice: Slice) -> Result<&'m [R], Error> {
    table
        .get(slice.range())
        .ok_or_else(|| out_of_range(R::TABLE, slice.index))
}

/// What a dependency added to the symbol table.
#[derive(Debug, Clone)]
pub struct ImportedModule {
    pub name: String,
    pub version: Version,
    pub types: Vec<DeclId>,
    pub functions: Vec<FuncId>,
    pub globals: Vec<GlobalId>,
}

impl<'a> Compiler<'a> {
    /// Rebuilds a dependency's exported declarations as external stubs.
    ///
    /// Types come first so fields and signatures can name any of them,
    /// then fields, then functions and globals.
    pub fn import_dependency(&mut self, dependency: &Dependency) -> Result<ImportedModule, Error> {
        let metadata = Metadata::parse(&dependency.metadata)?;
        check_module_version(dependency, metadata.module_version)?;

        debug!(
            target: "moth::metadata",
            dependency = %dependency.name,
            version = %metadata.module_version,
            bytes = dependency.metadata.len(),
            "importing metadata"
        );

        let mut importer = Importer {
            compiler: self,
            metadata: &metadata,
            types: vec![],
            func_types: HashMap::new(),
            resolving: HashSet::new(),
        };

        importer.declare_types()?;
        importer.define_types()?;
        let functions = importer.declare_functions()?;
        let globals = importer.declare_globals()?;

        Ok(ImportedModule {
            name: dependency.name.clone(),
            version: metadata.module_version,
            types: importer.types,
            functions,
            globals,
        })
    }
}

fn check_module_version(dependency: &Dependency, found: Version) -> Result<(), Error> {
    let expected = dependency.expected_version;

    if found.major != expected.major {
        return Err(Error::unpositioned(ErrorImpl::MetadataVersionMismatch {
            expected: expected.to_string(),
            received: found.to_string(),
        }));
    }

    if found != expected {
        warn!(
            target: "moth::metadata",
            dependency = %dependency.name,
            expected = %expected,
            found = %found,
            "dependency version differs, continuing"
        );
    }

    Ok(())
}

struct Importer<'c, 'a, 'm> {
    compiler: &'c mut Compiler<'a>,
    metadata: &'m Metadata,
    /// Declarations created for the type table, by index.
    types: Vec<DeclId>,
    func_types: HashMap<u32, InternalType>,
    /// Function types being decoded, to reject records that contain
    /// themselves.
    resolving: HashSet<u32>,
}

impl<'c, 'a, 'm> Importer<'c, 'a, 'm> {
    /// Splits a full name into its namespace, created if missing, and the
    /// member path.
    fn locate(&mut self, name: Slice) -> Result<(NamespaceId, String, String), Error> {
        let full_name = self.metadata.name(name)?.to_string();
        let (path, member) = parse_full_name(&full_name);

        let Some(member) = member else {
            return Err(corrupt(&format!("`{}` names no member", full_name)));
        };

        let namespace = self.compiler.symbols.get_or_create_namespace(&path);
        Ok((namespace, member, full_name))
    }

    fn declare_types(&mut self) -> Result<(), Error> {
        let metadata = self.metadata;

        for record in &metadata.types {
            let (namespace, name, full_name) = self.locate(record.name)?;

            let id = self.compiler.symbols.declare_type(
                namespace,
                &name,
                record.privacy,
                TypeKind::Struct,
                Position::null(),
            )?;

            let decl = self.compiler.symbols.type_decl_mut(id);
            decl.is_external = true;
            decl.is_foreign = record.is_foreign;
            decl.is_union = record.is_union;

            self.compiler
                .named_structs
                .insert(id, self.compiler.context.opaque_struct_type(&full_name));
            self.types.push(id);
        }

        Ok(())
    }

    fn define_types(&mut self) -> Result<(), Error> {
        let metadata = self.metadata;

        for (record, id) in metadata.types.iter().zip(self.types.clone()) {
            // Foreign types stay opaque, without fields or builtins.
            if record.is_foreign {
                continue;
            }

            let mut body: Vec<BasicTypeEnum<'a>> = vec![];

            for field in records(&metadata.fields, record.fields)? {
                let name = metadata.name(field.name)?;
                let ty = self.resolve(field.type_ref)?;
                body.push(self.compiler.basic_type(&ty)?);

                self.compiler
                    .symbols
                    .type_decl_mut(id)
                    .add_field(name, ty, field.privacy)?;
            }

            if let Some(struct_type) = self.compiler.named_structs.get(&id) {
                struct_type.set_body(&body, false);
            }
            self.compiler.add_builtin_statics(id);
        }

        Ok(())
    }

    fn declare_functions(&mut self) -> Result<Vec<FuncId>, Error> {
        let metadata = self.metadata;
        let mut declared = vec![];

        for record in &metadata.functions {
            let (namespace, member, full_name) = self.locate(record.name)?;

            let ty = self.resolve(record.type_ref)?;
            let Some(function_type) = ty.as_function().cloned() else {
                return Err(corrupt(&format!("`{}` does not have a function type", full_name)));
            };

            let (owner, name) = if record.is_method {
                let Some((type_name, method)) = member.split_once('.') else {
                    return Err(corrupt(&format!("method `{}` names no owner", full_name)));
                };
                let owner = self
                    .compiler
                    .symbols
                    .namespace(namespace)
                    .types
                    .get(type_name)
                    .copied()
                    .ok_or_else(|| {
                        Error::unpositioned(ErrorImpl::UnknownType {
                            type_: type_name.to_string(),
                        })
                    })?;

                (FunctionOwner::Type(owner), method.to_string())
            } else {
                (FunctionOwner::Namespace(namespace), member)
            };

            let mut function = Function::new(
                &name,
                owner,
                full_name,
                Signature::new(&name, function_type.params, function_type.is_variadic),
                *function_type.return_type,
            );
            function.privacy = record.privacy;
            function.is_static = record.flags & FUNCTION_STATIC != 0;
            function.attributes.export = record.flags & FUNCTION_EXPORT != 0;
            function.is_external = true;
            function.param_names = records(&metadata.params, record.params)?
                .iter()
                .map(|param| metadata.name(param.name).map(String::from))
                .collect::<Result<_, _>>()?;

            let id = self.compiler.symbols.add_function(function)?;
            self.compiler.declare_backend_function(id)?;
            declared.push(id);
        }

        Ok(declared)
    }

    fn declare_globals(&mut self) -> Result<Vec<GlobalId>, Error> {
        let metadata = self.metadata;
        let mut declared = vec![];

        for record in &metadata.globals {
            let (namespace, name, full_name) = self.locate(record.name)?;
            let ty = self.resolve(record.type_ref)?;
            let basic = self.compiler.basic_type(&ty)?;

            let mut global = Global::new(&name, namespace, full_name.clone(), ty);
            global.privacy = record.privacy;
            global.is_constant = record.is_constant;
            global.is_external = true;
            let id = self.compiler.symbols.declare_global(global)?;

            let global_value = self.compiler.module.add_global(basic, None, &full_name);
            global_value.set_linkage(Linkage::External);
            global_value.set_constant(record.is_constant);

            self.compiler.globals.insert(id, global_value);
            declared.push(id);
        }

        Ok(declared)
    }

    /// Decodes one type-reference entry, which must be consumed exactly.
    fn resolve(&mut self, slice: Slice) -> Result<InternalType, Error> {
        let metadata = self.metadata;
        let bytes = metadata.type_ref(slice)?;
        let mut reader = Reader::new(bytes);

        let ty = self.decode(&mut reader)?;
        if !reader.is_drained() {
            return Err(corrupt(&format!(
                "type reference at {} has {} trailing bytes",
                slice.index,
                bytes.len() - reader.offset()
            )));
        }

        Ok(ty)
    }

    fn decode(&mut self, reader: &mut Reader) -> Result<InternalType, Error> {
        let mut wrappers = vec![];
        let mut tag = TypeTag::from_u8(reader.u8()?)?;

        while matches!(tag, TypeTag::Pointer | TypeTag::Reference | TypeTag::Array) {
            if wrappers.len() == MAX_TYPE_DEPTH {
                return Err(corrupt(&format!(
                    "type reference nests deeper than {} levels",
                    MAX_TYPE_DEPTH
                )));
            }

            wrappers.push(tag);
            tag = TypeTag::from_u8(reader.u8()?)?;
        }

        let base = self.decode_base(tag, reader)?;

        Ok(wrappers.into_iter().rev().fold(base, |ty, wrapper| match wrapper {
            TypeTag::Pointer => ty.pointer_to(),
            TypeTag::Reference => ty.reference_to(),
            _ => ty.array_of(),
        }))
    }

    /// Decodes a type that is not a pointer, reference or array.
    fn decode_base(&mut self, tag: TypeTag, reader: &mut Reader) -> Result<InternalType, Error> {
        let ty = match tag {
            TypeTag::Type => {
                let index = reader.u32()?;
                let id = *self
                    .types
                    .get(index as usize)
                    .ok_or_else(|| out_of_range(TypeRecord::TABLE, index))?;

                self.compiler.symbols.type_decl(id).as_type()
            }
            TypeTag::FuncType => {
                let index = reader.u32()?;
                self.func_type(index)?
            }
            TypeTag::Pointer | TypeTag::Reference | TypeTag::Array => {
                return Err(corrupt("wrapper tag decoded as a base type"))
            }
            TypeTag::Void => InternalType::Void,
            TypeTag::Bool => InternalType::Bool,
            TypeTag::UInt8 => InternalType::int(8, false),
            TypeTag::UInt16 => InternalType::int(16, false),
            TypeTag::UInt32 => InternalType::int(32, false),
            TypeTag::UInt64 => InternalType::int(64, false),
            TypeTag::Int8 => InternalType::int(8, true),
            TypeTag::Int16 => InternalType::int(16, true),
            TypeTag::Int32 => InternalType::int(32, true),
            TypeTag::Int64 => InternalType::int(64, true),
            TypeTag::Float16 => InternalType::Float { width: 16 },
            TypeTag::Float32 => InternalType::Float { width: 32 },
            TypeTag::Float64 => InternalType::Float { width: 64 },
        };

        Ok(ty)
    }

    /// Decodes a function-type record, memoized by index.
    fn func_type(&mut self, index: u32) -> Result<InternalType, Error> {
        if let Some(ty) = self.func_types.get(&index) {
            return Ok(ty.clone());
        }

        if self.resolving.len() == MAX_TYPE_DEPTH {
            return Err(corrupt(&format!(
                "function types nest deeper than {} levels",
                MAX_TYPE_DEPTH
            )));
        }
        if !self.resolving.insert(index) {
            return Err(corrupt(&format!("function type {} contains itself", index)));
        }

        let metadata = self.metadata;
        let record = metadata
            .func_types
            .get(index as usize)
            .ok_or_else(|| out_of_range(FuncTypeRecord::TABLE, index))?;

        let return_type = self.resolve(record.return_type)?;
        let params = records(&metadata.param_types, record.params)?
            .iter()
            .map(|param| self.resolve(param.type_ref))
            .collect::<Result<Vec<_>, _>>()?;

        let ty = InternalType::function(return_type, params, record.is_variadic);
        self.resolving.remove(&index);
        self.func_types.insert(index, ty.clone());

        Ok(ty)
    }
}
