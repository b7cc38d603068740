//! Integration tests for end-to-end compilation.
//!
//! These tests verify that the complete compilation pipeline works correctly
//! from source code through tokenization, parsing, the declaration passes and
//! LLVM IR generation, and that one compiled unit can be consumed by another
//! through its metadata.

use std::{fs, rc::Rc};

use inkwell::context::Context;
use moth::{
    compiler::{
        compiler::{compile, compile_sources, Compiler},
        options::{BuildOptions, Dependency},
    },
    errors::errors::Error,
    lexer::lexer::tokenize,
    metadata::format::Version,
    parser::parser::parse,
    render_error,
};

fn compile_main<'a>(context: &'a Context, source: &str) -> Result<Compiler<'a>, Error> {
    compile_sources(&[("main.moth", source)], BuildOptions::new("main"), context)
}

fn ir_of(source: &str) -> String {
    let context = Context::create();
    let compiler = compile_main(&context, source).unwrap();
    compiler.ir()
}

#[test]
fn test_compile_addition() {
    let ir = ir_of("func main() #i32 { return 4 + 2; }");

    assert!(ir.contains("define i32 @main()"));
    assert!(ir.contains("ret i32 6"));
}

#[test]
fn test_compile_exponent() {
    let ir = ir_of("func main() #i32 { return 4 ^ 2; }");

    assert!(ir.contains("call float @llvm.powi.f32.i32"));
    assert!(ir.contains("fptosi float %pow to i32"));
}

#[test]
fn test_compile_eager_boolean_local() {
    let ir = ir_of("func main() #i32 { local val ?= true and false; return 0; }");

    assert!(ir.contains("%val = alloca i1"));
    assert!(ir.contains("store i1 false, i1* %val"));
}

#[test]
fn test_compile_if_else_without_continuation() {
    let ir = ir_of("func main() #i32 { if 4 > 2 { return 4; } else { return 2; } }");

    assert!(ir.contains("br i1 true, label %then, label %else"));
    assert!(ir.contains("ret i32 4"));
    assert!(ir.contains("ret i32 2"));
    assert!(!ir.contains("continue"));
}

#[test]
fn test_compile_field_store_and_load() {
    let ir = ir_of(
        "public class Item { public Cost #i32; }
        func main() #i32 { local item #Item; item.Cost = 5; return item.Cost; }",
    );

    let store_gep = ir.find("%Cost = getelementptr inbounds").unwrap();
    let store = ir.find("store i32 5, i32* %Cost").unwrap();
    let load_gep = ir.find("%Cost1 = getelementptr inbounds").unwrap();
    let load = ir.find("load i32, i32* %Cost1").unwrap();

    assert!(store_gep < store);
    assert!(store < load_gep);
    assert!(load_gep < load);
}

#[test]
fn test_compile_multiple_scripts_with_imports() {
    let context = Context::create();
    let compiler = compile_sources(
        &[
            (
                "math.moth",
                "namespace core.math;
                public func double(x #i32) #i32 { return x * 2; }",
            ),
            (
                "main.moth",
                "namespace app;
                with core.math;
                func main() #i32 { return double(21); }",
            ),
        ],
        BuildOptions::new("main"),
        &context,
    )
    .unwrap();

    let ir = compiler.ir();
    assert!(ir.contains("define i32 @\"root::core::math#double(i32)\"(i32 %x)"));
    assert!(ir.contains("call i32 @\"root::core::math#double(i32)\"(i32 21)"));
}

#[test]
fn test_compile_from_parsed_scripts() {
    let file = Rc::new(String::from("main.moth"));
    let tokens = tokenize("func main() #i32 { return 0; }", file.clone()).unwrap();
    let script = parse(tokens, file).unwrap();

    let context = Context::create();
    let compiler = compile(&[script], BuildOptions::new("main"), &context).unwrap();

    assert!(compiler.ir().contains("ret i32 0"));
}

#[test]
fn test_compile_unknown_import_fails() {
    let context = Context::create();
    let error = compile_main(&context, "with nowhere; func main() #i32 { return 0; }").unwrap_err();

    assert_eq!(error.get_error_name(), "UnknownNamespace");
}

#[test]
fn test_compile_error_is_rendered_at_its_position() {
    let source = "func main() #i32 {\n    local x #Itme;\n    return 0;\n}\n";
    let context = Context::create();
    let error = compile_main(&context, source).unwrap_err();

    assert_eq!(error.get_error_name(), "UnknownType");

    let rendered = render_error(&error, source);
    assert!(rendered.contains("-> main.moth"));
    assert!(rendered.contains("2 | local x #Itme;"));
}

#[test]
fn test_template_is_instantiated_once_across_functions() {
    let ir = ir_of(
        r"public class Box<\T\> {
            public Value #T;
            public func get() #T { return self.Value; }
        }
        func first(b #Box<\#i32\>*) #i32 { return b.get(); }
        func second(b #Box<\#i32\>*) #i32 { return b.Value; }",
    );

    assert_eq!(ir.matches("%\"root#Box<i32>\" = type").count(), 1);
    assert_eq!(ir.matches("define i32 @\"root#Box<i32>.get()\"").count(), 1);
}

#[test]
fn test_save_module_to_file() {
    let directory = tempfile::tempdir().unwrap();
    let output = directory.path().join("main.ll");

    let context = Context::create();
    let compiler = compile_main(&context, "func main() #i32 { return 3; }").unwrap();
    compiler.save_module_to_file(&output).unwrap();

    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains("ret i32 3"));
}

const LIBRARY: &str = "namespace lib;
public class Item {
    public Cost #i32;
    public func cost() #i32 { return self.Cost; }
}
public func scale(value #i32, factor #f64) #i32 { return value; }
public global counter #i32 = 3;
";

const APP: &str = "namespace app;
with lib;
func main() #i32 {
    local item #Item;
    item.Cost = counter;
    return scale(item.cost(), 1.5);
}
";

#[test]
fn test_dependency_round_trip_through_a_file() {
    let directory = tempfile::tempdir().unwrap();
    let library_path = directory.path().join("lib.mothlib");

    {
        let context = Context::create();
        let options = BuildOptions::new("lib").with_version(Version::new(1, 2, 0));
        let library = compile_sources(&[("lib.moth", LIBRARY)], options, &context).unwrap();
        fs::write(&library_path, library.emit_metadata().unwrap()).unwrap();
    }

    let metadata = fs::read(&library_path).unwrap();
    let options =
        BuildOptions::new("app").with_dependency(Dependency::new("lib", metadata, Version::new(1, 0, 0)));

    let context = Context::create();
    let app = compile_sources(&[("app.moth", APP)], options, &context).unwrap();
    let ir = app.ir();

    assert!(ir.contains("@\"root::lib#counter\" = external global i32"));
    assert!(ir.contains("declare i32 @\"root::lib#Item.cost()\"(%\"root::lib#Item\"*)"));
    assert!(ir.contains("call i32 @\"root::lib#scale(i32, f64)\"(i32 %cost, double 1.500000e+00)"));
}

#[test]
fn test_dependency_with_other_major_version_is_rejected() {
    let metadata = {
        let context = Context::create();
        let options = BuildOptions::new("lib").with_version(Version::new(2, 0, 0));
        let library = compile_sources(&[("lib.moth", LIBRARY)], options, &context).unwrap();
        library.emit_metadata().unwrap()
    };

    let options =
        BuildOptions::new("app").with_dependency(Dependency::new("lib", metadata, Version::new(1, 0, 0)));

    let context = Context::create();
    let error = compile_sources(&[("app.moth", APP)], options, &context).unwrap_err();

    assert_eq!(error.get_error_name(), "MetadataVersionMismatch");
}

#[test]
fn test_dependents_cannot_touch_private_members() {
    let metadata = {
        let context = Context::create();
        let library = compile_sources(
            &[(
                "lib.moth",
                "namespace lib;
                public class Item { private Secret #i32; }",
            )],
            BuildOptions::new("lib"),
            &context,
        )
        .unwrap();
        library.emit_metadata().unwrap()
    };

    let options = BuildOptions::new("app").with_dependency(Dependency::new(
        "lib",
        metadata,
        BuildOptions::default().version,
    ));

    let context = Context::create();
    let error = compile_sources(
        &[(
            "app.moth",
            "namespace app;
            with lib;
            func main() #i32 { local item #Item; return item.Secret; }",
        )],
        options,
        &context,
    )
    .unwrap_err();

    assert_eq!(error.get_error_name(), "PrivateAccess");
}
