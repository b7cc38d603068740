use std::collections::HashMap;

use tracing::debug;

use crate::{
    ast::ast::Privacy,
    compiler::compiler::Compiler,
    errors::errors::{Error, ErrorImpl},
    symbols::{
        decls::{Function, FunctionOwner, Global, TypeDecl},
        namespace::SymbolTable,
    },
    types::types::{DeclId, FunctionType, InternalType},
};

use super::format::{
    write_table, write_u32, FieldRecord, FuncTypeRecord, FunctionRecord, GlobalRecord, Header, ParamRecord,
    ParamTypeRecord, Slice, TypeRecord, TypeTag, Version, FORMAT_VERSION, FUNCTION_EXPORT, FUNCTION_STATIC,
};

impl<'a> Compiler<'a> {
    /// Encodes the public surface of the compiled unit.
    pub fn emit_metadata(&self) -> Result<Vec<u8>, Error> {
        let blob = MetadataWriter::new(&self.symbols).finish(self.options.version)?;

        debug!(
            target: "moth::metadata",
            module = %self.options.module_name,
            version = %self.options.version,
            bytes = blob.len(),
            "emitted metadata"
        );

        Ok(blob)
    }
}

/// Collects the exported declarations of a symbol table into tables.
///
/// Every struct declared by this unit is exported, public or not, since
/// public fields and signatures may name private types. Foreign structs
/// are exported without their fields. Functions and
/// globals are exported when public; foreign functions are left for
/// dependents to declare themselves.
pub struct MetadataWriter<'s> {
    symbols: &'s SymbolTable,
    type_indices: HashMap<DeclId, u32>,
    func_type_indices: HashMap<FunctionType, u32>,

    types: Vec<TypeRecord>,
    fields: Vec<FieldRecord>,
    functions: Vec<FunctionRecord>,
    globals: Vec<GlobalRecord>,
    func_types: Vec<FuncTypeRecord>,
    params: Vec<ParamRecord>,
    param_types: Vec<ParamTypeRecord>,
    type_refs: Vec<u8>,
    names: Vec<u8>,
}

impl<'s> MetadataWriter<'s> {
    pub fn new(symbols: &'s SymbolTable) -> Self {
        MetadataWriter {
            symbols,
            type_indices: HashMap::new(),
            func_type_indices: HashMap::new(),
            types: vec![],
            fields: vec![],
            functions: vec![],
            globals: vec![],
            func_types: vec![],
            params: vec![],
            param_types: vec![],
            type_refs: vec![],
            names: vec![],
        }
    }

    /// Writes every table and returns the finished blob.
    pub fn finish(mut self, module_version: Version) -> Result<Vec<u8>, Error> {
        let symbols = self.symbols;
        let mut exported: Vec<&TypeDecl> = symbols
            .type_decls()
            .filter(|decl| decl.is_struct() && !decl.is_external)
            .collect();
        exported.sort_by_key(|decl| decl.id);

        for (index, decl) in exported.iter().enumerate() {
            self.type_indices.insert(decl.id, index as u32);
        }
        for decl in exported {
            self.write_type(decl)?;
        }

        let functions: Vec<&Function> = symbols
            .functions()
            .iter()
            .filter(|function| self.is_exported(function))
            .collect();
        for function in functions {
            self.write_function(function)?;
        }
        for global in symbols
            .globals()
            .iter()
            .filter(|global| global.privacy == Privacy::Public && !global.is_external)
        {
            self.write_global(global)?;
        }

        Ok(self.assemble(module_version))
    }

    fn is_exported(&self, function: &Function) -> bool {
        let owner_exported = match function.owner {
            FunctionOwner::Namespace(_) => true,
            FunctionOwner::Type(decl) => self.type_indices.contains_key(&decl),
        };

        owner_exported && function.privacy == Privacy::Public && !function.is_foreign && !function.is_external
    }

    fn write_type(&mut self, decl: &TypeDecl) -> Result<(), Error> {
        let name = self.name(&decl.full_name);
        let first_field = self.fields.len();

        // Foreign types cross over opaque.
        let fields: &[_] = if decl.is_foreign { &[] } else { &decl.fields };

        for field in fields {
            let record = FieldRecord {
                privacy: field.privacy,
                name: self.name(&field.name),
                type_ref: self.type_ref(&field.ty)?,
            };
            self.fields.push(record);
        }

        self.types.push(TypeRecord {
            is_foreign: decl.is_foreign,
            is_union: decl.is_union,
            privacy: decl.privacy,
            name,
            fields: Slice::new(first_field, fields.len()),
        });

        Ok(())
    }

    fn write_function(&mut self, function: &Function) -> Result<(), Error> {
        let signature = InternalType::function(
            function.return_type.clone(),
            function.signature.params.clone(),
            function.signature.is_variadic,
        );

        let mut flags = 0;
        if function.is_static {
            flags |= FUNCTION_STATIC;
        }
        if function.attributes.export {
            flags |= FUNCTION_EXPORT;
        }

        let name = self.name(&function.full_name);
        let type_ref = self.type_ref(&signature)?;

        let first_param = self.params.len();
        for param in &function.param_names {
            let name = self.name(param);
            self.params.push(ParamRecord { name });
        }

        self.functions.push(FunctionRecord {
            privacy: function.privacy,
            is_method: function.is_method(),
            flags,
            name,
            type_ref,
            params: Slice::new(first_param, function.param_names.len()),
        });

        Ok(())
    }

    fn write_global(&mut self, global: &Global) -> Result<(), Error> {
        let record = GlobalRecord {
            privacy: global.privacy,
            is_constant: global.is_constant,
            name: self.name(&global.full_name),
            type_ref: self.type_ref(&global.ty)?,
        };

        self.globals.push(record);
        Ok(())
    }

    fn name(&mut self, name: &str) -> Slice {
        let slice = Slice::new(self.names.len(), name.len());
        self.names.extend_from_slice(name.as_bytes());
        slice
    }

    /// Appends the encoding of `ty` to the type-reference stream.
    ///
    /// The entry is built aside first: function types met along the way
    /// add their own entries to the stream, which must not land in the
    /// middle of this one.
    fn type_ref(&mut self, ty: &InternalType) -> Result<Slice, Error> {
        let mut entry = vec![];
        self.encode(ty, &mut entry)?;

        let slice = Slice::new(self.type_refs.len(), entry.len());
        self.type_refs.extend(entry);
        Ok(slice)
    }

    fn encode(&mut self, ty: &InternalType, out: &mut Vec<u8>) -> Result<(), Error> {
        let unexportable = || {
            Error::unpositioned(ErrorImpl::UnexportableType {
                type_: ty.to_string(),
            })
        };

        match ty {
            InternalType::Void => out.push(TypeTag::Void as u8),
            InternalType::Bool => out.push(TypeTag::Bool as u8),
            InternalType::Int { width, signed } => {
                out.push(TypeTag::int(*width, *signed).ok_or_else(unexportable)? as u8)
            }
            InternalType::Float { width } => out.push(TypeTag::float(*width).ok_or_else(unexportable)? as u8),
            InternalType::AbstractInt(_) => return self.encode(&ty.concrete(), out),
            InternalType::Pointer(base) => {
                out.push(TypeTag::Pointer as u8);
                self.encode(base, out)?;
            }
            InternalType::Reference(base) => {
                out.push(TypeTag::Reference as u8);
                self.encode(base, out)?;
            }
            InternalType::Array(base) => {
                out.push(TypeTag::Array as u8);
                self.encode(base, out)?;
            }
            InternalType::Declared(decl) => {
                let index = *self.type_indices.get(&decl.id).ok_or_else(unexportable)?;
                out.push(TypeTag::Type as u8);
                write_u32(out, index);
            }
            InternalType::Function(function) => {
                let index = self.func_type(function)?;
                out.push(TypeTag::FuncType as u8);
                write_u32(out, index);
            }
        }

        Ok(())
    }

    /// Index of the function-type record for `function`, added on first use.
    fn func_type(&mut self, function: &FunctionType) -> Result<u32, Error> {
        if let Some(index) = self.func_type_indices.get(function) {
            return Ok(*index);
        }

        let return_type = self.type_ref(&function.return_type)?;
        let params = function
            .params
            .iter()
            .map(|param| self.type_ref(param))
            .collect::<Result<Vec<_>, _>>()?;

        // Parameter types of one record are contiguous, so they are only
        // pushed once every nested function type has been written.
        let first_param = self.param_types.len();
        self.param_types
            .extend(params.into_iter().map(|type_ref| ParamTypeRecord { type_ref }));

        let index = self.func_types.len() as u32;
        self.func_types.push(FuncTypeRecord {
            is_variadic: function.is_variadic,
            return_type,
            params: Slice::new(first_param, function.params.len()),
        });
        self.func_type_indices.insert(function.clone(), index);

        Ok(index)
    }

    fn assemble(self, module_version: Version) -> Vec<u8> {
        let mut tables = vec![];

        let mut header = Header {
            types: (2 * Version::SIZE + Header::SIZE) as u32,
            ..Default::default()
        };

        let base = header.types as usize;
        write_table(&mut tables, &self.types);
        header.fields = (base + tables.len()) as u32;
        write_table(&mut tables, &self.fields);
        header.functions = (base + tables.len()) as u32;
        write_table(&mut tables, &self.functions);
        header.globals = (base + tables.len()) as u32;
        write_table(&mut tables, &self.globals);
        header.func_types = (base + tables.len()) as u32;
        write_table(&mut tables, &self.func_types);
        header.params = (base + tables.len()) as u32;
        write_table(&mut tables, &self.params);
        header.param_types = (base + tables.len()) as u32;
        write_table(&mut tables, &self.param_types);
        header.type_refs = (base + tables.len()) as u32;
        tables.extend_from_slice(&self.type_refs);
        header.names = (base + tables.len()) as u32;
        tables.extend_from_slice(&self.names);
        header.size = (base + tables.len()) as u32;

        let mut blob = Vec::with_capacity(header.size as usize);
        FORMAT_VERSION.write(&mut blob);
        module_version.write(&mut blob);
        header.write(&mut blob);
        blob.extend(tables);

        blob
    }
}
