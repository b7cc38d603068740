//! Unit tests for the metadata module.
//!
//! This module contains tests for:
//! - The record layout and version checks
//! - Function type records and their parameter runs
//! - Importing a compiled unit's metadata into a fresh compiler
//! - Rejection of truncated, padded and dangling blobs

use inkwell::context::Context;

use super::{
    deserializer::Metadata,
    format::{
        write_table, write_u32, FieldRecord, Header, Record, Slice, TypeRecord, TypeTag, Version, FORMAT_VERSION,
    },
    serializer::MetadataWriter,
};
use crate::{
    ast::ast::Privacy,
    compiler::{
        compiler::{compile_sources, Compiler},
        options::{BuildOptions, Dependency},
    },
    symbols::{
        decls::{Function, FunctionOwner, Signature},
        namespace::SymbolTable,
    },
    types::types::InternalType,
};

const LIBRARY: &str = "namespace lib;
public class Item {
    public Cost #i32;
    private Next #Item*;
    public func cost() #i32 { return self.Cost; }
    public static func init() #Item { return self; }
}
public func scale(value #i32, factor #f64) #i32 { return value; }
func helper() #i32 { return 1; }
public global counter #i32 = 3;
";

/// Compiles the library in its own context, so the importing compiler's
/// struct names do not collide with the producer's.
fn library_blob(version: Version) -> Vec<u8> {
    let context = Context::create();
    let options = BuildOptions::new("lib").with_version(version);
    let compiler = compile_sources(&[("lib.moth", LIBRARY)], options, &context).unwrap();
    compiler.emit_metadata().unwrap()
}

/// A blob holding only a type and a field table, with everything else
/// empty.
fn raw_blob(types: &[TypeRecord], fields: &[FieldRecord], type_refs: &[u8], names: &[u8]) -> Vec<u8> {
    let base = (2 * Version::SIZE + Header::SIZE) as u32;
    let types_end = base + (types.len() * TypeRecord::SIZE) as u32;
    let fields_end = types_end + (fields.len() * FieldRecord::SIZE) as u32;
    let names_start = fields_end + type_refs.len() as u32;

    let header = Header {
        types: base,
        fields: types_end,
        functions: fields_end,
        globals: fields_end,
        func_types: fields_end,
        params: fields_end,
        param_types: fields_end,
        type_refs: fields_end,
        names: names_start,
        size: names_start + names.len() as u32,
    };

    let mut blob = vec![];
    FORMAT_VERSION.write(&mut blob);
    Version::new(1, 0, 0).write(&mut blob);
    header.write(&mut blob);
    write_table(&mut blob, types);
    write_table(&mut blob, fields);
    blob.extend_from_slice(type_refs);
    blob.extend_from_slice(names);
    blob
}

#[test]
fn test_version_display() {
    assert_eq!(Version::new(1, 2, 3).to_string(), "1.2.3");
    assert_eq!(FORMAT_VERSION.to_string(), "1.0.0");
}

#[test]
fn test_type_tag_from_byte() {
    assert_eq!(TypeTag::from_u8(2).unwrap(), TypeTag::Pointer);
    assert_eq!(TypeTag::from_u8(16).unwrap(), TypeTag::Reference);

    let error = TypeTag::from_u8(200).unwrap_err();
    assert_eq!(error.get_error_name(), "UnknownTypeTag");
}

#[test]
fn test_empty_blob_is_versions_and_header() {
    let blob = MetadataWriter::new(&SymbolTable::new())
        .finish(Version::new(0, 3, 1))
        .unwrap();

    assert_eq!(blob.len(), 2 * Version::SIZE + Header::SIZE);

    let metadata = Metadata::parse(&blob).unwrap();
    assert_eq!(metadata.format_version, FORMAT_VERSION);
    assert_eq!(metadata.module_version, Version::new(0, 3, 1));
    assert!(metadata.types.is_empty());
    assert!(metadata.names.is_empty());
}

#[test]
fn test_nested_function_types_keep_parameter_runs_contiguous() {
    let mut symbols = SymbolTable::new();
    let root = symbols.root();

    let predicate = InternalType::function(InternalType::Bool, vec![InternalType::i32()], false);
    let params = vec![predicate, InternalType::u8().pointer_to()];

    let mut function = Function::new(
        "filter",
        FunctionOwner::Namespace(root),
        String::from("root#filter"),
        Signature::new("filter", params, false),
        InternalType::Void,
    );
    function.privacy = Privacy::Public;
    function.param_names = vec![String::from("keep"), String::from("data")];
    symbols.add_function(function).unwrap();

    let blob = MetadataWriter::new(&symbols).finish(Version::new(1, 0, 0)).unwrap();
    let metadata = Metadata::parse(&blob).unwrap();

    assert_eq!(metadata.functions.len(), 1);
    assert_eq!(metadata.params.len(), 2);
    assert_eq!(metadata.name(metadata.functions[0].name).unwrap(), "root#filter");

    // The predicate is written before the function's own signature.
    assert_eq!(metadata.func_types.len(), 2);
    let outer = &metadata.func_types[1];
    assert_eq!(outer.params, Slice::new(1, 2));

    let first_param = metadata.param_types[1].type_ref.range();
    assert_eq!(
        &metadata.type_refs[first_param],
        &[TypeTag::FuncType as u8, 0, 0, 0, 0]
    );
}

#[test]
fn test_private_functions_are_not_exported() {
    let blob = library_blob(Version::new(1, 0, 0));
    let metadata = Metadata::parse(&blob).unwrap();

    let names = metadata
        .functions
        .iter()
        .map(|record| metadata.name(record.name).unwrap().to_string())
        .collect::<Vec<_>>();

    assert!(names.contains(&String::from("root::lib#scale")));
    assert!(names.contains(&String::from("root::lib#Item.cost")));
    assert!(!names.iter().any(|name| name.ends_with("#helper")));
}

#[test]
fn test_import_rebuilds_fields_and_signatures() {
    let blob = library_blob(Version::new(1, 0, 0));

    let context = Context::create();
    let mut compiler = Compiler::new(&context, BuildOptions::new("app")).unwrap();
    let imported = compiler
        .import_dependency(&Dependency::new("lib", blob, Version::new(1, 0, 0)))
        .unwrap();

    assert_eq!(imported.types.len(), 1);
    assert_eq!(imported.globals.len(), 1);

    let item = compiler.symbols.type_decl(imported.types[0]);
    assert!(item.is_external);
    assert_eq!(item.full_name, "root::lib#Item");

    let fields = item
        .fields
        .iter()
        .map(|field| (field.name.as_str(), field.index, field.privacy))
        .collect::<Vec<_>>();
    assert_eq!(
        fields,
        vec![("Cost", 0, Privacy::Public), ("Next", 1, Privacy::Private)]
    );
    assert_eq!(item.fields[1].ty, item.as_type().pointer_to());
    assert!(item.methods.contains_key("cost"));
    assert!(item.static_methods.contains_key("init"));
    assert!(item.static_methods.contains_key("sizeof"));

    let lib = compiler
        .symbols
        .find_namespace(&[String::from("lib")])
        .unwrap();
    let scale = compiler.symbols.namespace(lib).functions["scale"].clone();
    let candidate = &scale.candidates()[0];
    assert_eq!(
        candidate.signature.params,
        vec![InternalType::i32(), InternalType::f64()]
    );
    assert_eq!(candidate.return_type, InternalType::i32());

    let ir = compiler.ir();
    assert!(ir.contains("%\"root::lib#Item\" = type { i32, %\"root::lib#Item\"* }"));
    assert!(ir.contains("@\"root::lib#counter\" = external global i32"));
    assert!(ir.contains("declare i32 @\"root::lib#scale(i32, f64)\"(i32, double)"));
}

#[test]
fn test_module_minor_mismatch_is_accepted() {
    let blob = library_blob(Version::new(1, 4, 2));

    let context = Context::create();
    let mut compiler = Compiler::new(&context, BuildOptions::new("app")).unwrap();
    assert!(compiler
        .import_dependency(&Dependency::new("lib", blob, Version::new(1, 0, 0)))
        .is_ok());
}

#[test]
fn test_module_major_mismatch_is_fatal() {
    let blob = library_blob(Version::new(2, 0, 0));

    let context = Context::create();
    let mut compiler = Compiler::new(&context, BuildOptions::new("app")).unwrap();
    let error = compiler
        .import_dependency(&Dependency::new("lib", blob, Version::new(1, 0, 0)))
        .unwrap_err();

    assert_eq!(error.get_error_name(), "MetadataVersionMismatch");
}

#[test]
fn test_format_major_mismatch_is_fatal() {
    let mut blob = MetadataWriter::new(&SymbolTable::new())
        .finish(Version::new(1, 0, 0))
        .unwrap();
    blob[0] = 9;

    let error = Metadata::parse(&blob).unwrap_err();
    assert_eq!(error.get_error_name(), "MetadataVersionMismatch");
}

#[test]
fn test_missing_or_trailing_bytes_are_corrupt() {
    let blob = library_blob(Version::new(1, 0, 0));

    let mut truncated = blob.clone();
    truncated.pop();
    assert_eq!(Metadata::parse(&truncated).unwrap_err().get_error_name(), "CorruptMetadata");

    let mut padded = blob;
    padded.push(0);
    assert_eq!(Metadata::parse(&padded).unwrap_err().get_error_name(), "CorruptMetadata");
}

#[test]
fn test_table_with_partial_record_is_corrupt() {
    let base = (2 * Version::SIZE + Header::SIZE) as u32;
    let header = Header {
        types: base,
        fields: base + 1,
        functions: base + 1,
        globals: base + 1,
        func_types: base + 1,
        params: base + 1,
        param_types: base + 1,
        type_refs: base + 1,
        names: base + 1,
        size: base + 1,
    };

    let mut blob = vec![];
    FORMAT_VERSION.write(&mut blob);
    Version::new(1, 0, 0).write(&mut blob);
    header.write(&mut blob);
    blob.push(0);

    let error = Metadata::parse(&blob).unwrap_err();
    assert_eq!(error.get_error_name(), "CorruptMetadata");
}

#[test]
fn test_dangling_type_index_is_rejected() {
    let names = b"root::lib#Itemnext";
    let mut type_refs = vec![TypeTag::Pointer as u8, TypeTag::Type as u8];
    write_u32(&mut type_refs, 7);

    let blob = raw_blob(
        &[TypeRecord {
            is_foreign: false,
            is_union: false,
            privacy: Privacy::Public,
            name: Slice::new(0, 14),
            fields: Slice::new(0, 1),
        }],
        &[FieldRecord {
            privacy: Privacy::Public,
            name: Slice::new(14, 4),
            type_ref: Slice::new(0, type_refs.len()),
        }],
        &type_refs,
        names,
    );

    let context = Context::create();
    let mut compiler = Compiler::new(&context, BuildOptions::new("app")).unwrap();
    let error = compiler
        .import_dependency(&Dependency::new("lib", blob, Version::new(1, 0, 0)))
        .unwrap_err();

    assert_eq!(error.get_error_name(), "MetadataIndexOutOfRange");
}

#[test]
fn test_unknown_tag_and_bad_name_are_rejected() {
    let record = |name: Slice| TypeRecord {
        is_foreign: false,
        is_union: false,
        privacy: Privacy::Public,
        name,
        fields: Slice::new(0, 1),
    };
    let field = FieldRecord {
        privacy: Privacy::Public,
        name: Slice::new(0, 1),
        type_ref: Slice::new(0, 1),
    };

    let context = Context::create();

    let blob = raw_blob(&[record(Slice::new(0, 10))], &[field.clone()], &[99], b"root#Thing");
    let mut compiler = Compiler::new(&context, BuildOptions::new("app")).unwrap();
    let error = compiler
        .import_dependency(&Dependency::new("lib", blob, Version::new(1, 0, 0)))
        .unwrap_err();
    assert_eq!(error.get_error_name(), "UnknownTypeTag");

    let blob = raw_blob(
        &[record(Slice::new(0, 2))],
        &[field],
        &[TypeTag::Bool as u8],
        &[0xff, 0xfe],
    );
    let mut compiler = Compiler::new(&context, BuildOptions::new("app")).unwrap();
    let error = compiler
        .import_dependency(&Dependency::new("lib", blob, Version::new(1, 0, 0)))
        .unwrap_err();
    assert_eq!(error.get_error_name(), "InvalidMetadataName");
}

#[test]
fn test_enum_in_public_signature_is_unexportable() {
    let context = Context::create();
    let compiler = compile_sources(
        &[(
            "colors.moth",
            "public enum Color { Red, Green }
            public func pick() #Color { return #Color.Green; }",
        )],
        BuildOptions::new("colors"),
        &context,
    )
    .unwrap();

    let error = compiler.emit_metadata().unwrap_err();
    assert_eq!(error.get_error_name(), "UnexportableType");
}

#[test]
fn test_foreign_struct_is_imported_opaque() {
    let blob = {
        let context = Context::create();
        let compiler = compile_sources(
            &[(
                "lib.moth",
                "namespace lib;
                public foreign class Handle { public Fd #i32; }
                public func close(handle #Handle*) #i32 { return 0; }",
            )],
            BuildOptions::new("lib"),
            &context,
        )
        .unwrap();
        compiler.emit_metadata().unwrap()
    };

    let metadata = Metadata::parse(&blob).unwrap();
    assert!(metadata.types[0].is_foreign);
    assert!(metadata.fields.is_empty());

    let context = Context::create();
    let mut compiler = Compiler::new(&context, BuildOptions::new("app")).unwrap();
    let imported = compiler
        .import_dependency(&Dependency::new("lib", blob, Version::new(0, 1, 0)))
        .unwrap();

    let handle = compiler.symbols.type_decl(imported.types[0]);
    assert!(handle.is_foreign);
    assert!(handle.fields.is_empty());
    assert!(!handle.static_methods.contains_key("sizeof"));

    let ir = compiler.ir();
    assert!(ir.contains("%\"root::lib#Handle\" = type opaque"));
    assert!(ir.contains("(%\"root::lib#Handle\"*)"));
}

#[test]
fn test_deeply_nested_type_reference_is_corrupt() {
    let mut type_refs = vec![TypeTag::Pointer as u8; 2_000_000];
    type_refs.push(TypeTag::Bool as u8);

    let blob = raw_blob(
        &[TypeRecord {
            is_foreign: false,
            is_union: false,
            privacy: Privacy::Public,
            name: Slice::new(0, 14),
            fields: Slice::new(0, 1),
        }],
        &[FieldRecord {
            privacy: Privacy::Public,
            name: Slice::new(14, 4),
            type_ref: Slice::new(0, type_refs.len()),
        }],
        &type_refs,
        b"root::lib#Itemnext",
    );

    let context = Context::create();
    let mut compiler = Compiler::new(&context, BuildOptions::new("app")).unwrap();
    let error = compiler
        .import_dependency(&Dependency::new("lib", blob, Version::new(1, 0, 0)))
        .unwrap_err();

    assert_eq!(error.get_error_name(), "CorruptMetadata");
}

#[test]
fn test_nested_type_reference_within_limit_decodes() {
    let mut type_refs = vec![TypeTag::Pointer as u8, TypeTag::Array as u8, TypeTag::Reference as u8];
    type_refs.push(TypeTag::Int32 as u8);

    let blob = raw_blob(
        &[TypeRecord {
            is_foreign: false,
            is_union: false,
            privacy: Privacy::Public,
            name: Slice::new(0, 14),
            fields: Slice::new(0, 1),
        }],
        &[FieldRecord {
            privacy: Privacy::Public,
            name: Slice::new(14, 4),
            type_ref: Slice::new(0, type_refs.len()),
        }],
        &type_refs,
        b"root::lib#Itemnext",
    );

    let context = Context::create();
    let mut compiler = Compiler::new(&context, BuildOptions::new("app")).unwrap();
    let imported = compiler
        .import_dependency(&Dependency::new("lib", blob, Version::new(1, 0, 0)))
        .unwrap();

    let item = compiler.symbols.type_decl(imported.types[0]);
    assert_eq!(
        item.fields[0].ty,
        InternalType::i32().reference_to().array_of().pointer_to()
    );
}
