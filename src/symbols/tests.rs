use std::rc::Rc;

use crate::{
    ast::ast::{
        Attribute, AttributeArg, BinaryOp, ClassDef, Expr, ExprKind, Literal, Modifiers, Privacy,
        TemplateArg, TemplateParamDef, TypeRef,
    },
    errors::errors::ErrorImpl,
    types::types::InternalType,
    Position, Span,
};

use super::{
    attributes::{AttributeSet, TargetOs},
    decls::{EnumFlag, EnumLayout, Function, FunctionOwner, Global, Signature, TypeKind},
    namespace::{parse_full_name, SymbolTable},
    operators::{builtin_static_methods, primitive_operators, Intrinsic},
    overload::{Callee, Candidate, OverloadList},
    template::Template,
};

fn candidate(params: Vec<InternalType>, is_variadic: bool, tag: u64) -> Candidate {
    Candidate {
        signature: Signature::new("f", params, is_variadic),
        return_type: InternalType::Void,
        callee: Callee::Intrinsic(Intrinsic::Operator {
            op: BinaryOp::Add,
            operand: InternalType::int(tag as u32, true),
        }),
    }
}

fn path(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|segment| segment.to_string()).collect()
}

#[test]
fn test_exact_match_wins_over_sufficient() {
    let mut list = OverloadList::new("f");
    list.add(candidate(vec![InternalType::i64()], false, 1)).unwrap();
    list.add(candidate(vec![InternalType::i32()], false, 2)).unwrap();

    let chosen = list.get(&[InternalType::i32()]).unwrap();
    assert_eq!(chosen.signature.params, vec![InternalType::i32()]);
}

#[test]
fn test_single_sufficient_match_is_chosen() {
    let mut list = OverloadList::new("f");
    list.add(candidate(vec![InternalType::u8()], false, 1)).unwrap();
    list.add(candidate(vec![InternalType::Bool], false, 2)).unwrap();

    let chosen = list.get(&[InternalType::AbstractInt(7)]).unwrap();
    assert_eq!(chosen.signature.params, vec![InternalType::u8()]);
}

#[test]
fn test_two_sufficient_matches_are_ambiguous() {
    let mut list = OverloadList::new("add");
    list.add(candidate(vec![InternalType::i32(), InternalType::i32()], false, 1))
        .unwrap();
    list.add(candidate(vec![InternalType::i64(), InternalType::i64()], false, 2))
        .unwrap();

    let error = list
        .get(&[InternalType::AbstractInt(1), InternalType::AbstractInt(2)])
        .unwrap_err();
    assert_eq!(
        error.get_internal_error(),
        &ErrorImpl::AmbiguousCall {
            name: String::from("add")
        }
    );
    assert_eq!(error.to_string(), "cannot infer overload for call to \"add\"");
}

#[test]
fn test_no_candidate() {
    let mut list = OverloadList::new("f");
    list.add(candidate(vec![InternalType::i32()], false, 1)).unwrap();

    let error = list.get(&[InternalType::i32(), InternalType::i32()]).unwrap_err();
    assert_eq!(error.to_string(), "no candidate definition for call to \"f\"");

    let error = list.get(&[InternalType::Bool]).unwrap_err();
    assert_eq!(error.get_error_name(), "NoCandidate");
}

#[test]
fn test_variadic_candidate_accepts_extra_arguments() {
    let mut list = OverloadList::new("printf");
    list.add(candidate(vec![InternalType::u8().pointer_to()], true, 1))
        .unwrap();

    assert!(list
        .get(&[
            InternalType::u8().pointer_to(),
            InternalType::i32(),
            InternalType::f64()
        ])
        .is_ok());
    assert!(list.get(&[]).is_err());
}

#[test]
fn test_duplicate_parameters_are_rejected() {
    let mut list = OverloadList::new("f");
    list.add(candidate(vec![InternalType::i32()], false, 1)).unwrap();

    let error = list.add(candidate(vec![InternalType::i32()], false, 2)).unwrap_err();
    assert_eq!(
        error.get_internal_error(),
        &ErrorImpl::AlreadyDeclared {
            name: String::from("f(i32)")
        }
    );
    assert_eq!(list.len(), 1);
}

#[test]
fn test_primitive_operators() {
    let add = primitive_operators(BinaryOp::Add, &InternalType::i32(), false).unwrap();
    let chosen = add.get(&[InternalType::i32(), InternalType::AbstractInt(3)]).unwrap();
    assert_eq!(chosen.return_type, InternalType::i32());

    let less = primitive_operators(BinaryOp::Lt, &InternalType::f32(), false).unwrap();
    assert_eq!(less.candidates()[0].return_type, InternalType::Bool);

    let pointer_eq = primitive_operators(BinaryOp::Eq, &InternalType::u8().pointer_to(), false).unwrap();
    assert!(pointer_eq
        .get(&[InternalType::u8().pointer_to(), InternalType::void_pointer()])
        .is_ok());

    assert!(primitive_operators(BinaryOp::Add, &InternalType::Bool, false).is_none());
    assert!(primitive_operators(BinaryOp::Add, &InternalType::void_pointer(), false).is_none());
}

#[test]
fn test_namespace_lookup_walks_parents() {
    let mut symbols = SymbolTable::new();
    let outer = symbols.get_or_create_namespace(&path(&["app"]));
    let inner = symbols.get_or_create_namespace(&path(&["app", "inner"]));

    assert_eq!(symbols.namespace(inner).full_name, "root::app::inner");
    assert_eq!(symbols.find_namespace(&path(&["app", "inner"])), Some(inner));
    assert_eq!(symbols.find_namespace(&path(&["app", "missing"])), None);

    let item = symbols
        .declare_type(outer, "Item", Privacy::Private, TypeKind::Struct, Position::null())
        .unwrap();

    assert_eq!(symbols.lookup_type(inner, &[], "Item"), Some(item));
    assert_eq!(symbols.lookup_type(outer, &[], "Missing"), None);
    assert_eq!(symbols.type_decl(item).full_name, "root::app#Item");
}

#[test]
fn test_imports_only_expose_public_symbols() {
    let mut symbols = SymbolTable::new();
    let library = symbols.get_or_create_namespace(&path(&["lib"]));
    let user = symbols.get_or_create_namespace(&path(&["user"]));

    symbols
        .declare_type(library, "Open", Privacy::Public, TypeKind::Struct, Position::null())
        .unwrap();
    symbols
        .declare_type(library, "Hidden", Privacy::Private, TypeKind::Struct, Position::null())
        .unwrap();

    assert!(symbols.lookup_type(user, &[library], "Open").is_some());
    assert!(symbols.lookup_type(user, &[library], "Hidden").is_none());
    assert!(symbols.lookup_type(user, &[], "Open").is_none());
}

#[test]
fn test_add_function_assigns_symbol_names() {
    let mut symbols = SymbolTable::new();
    let namespace = symbols.get_or_create_namespace(&path(&["math"]));
    let full_name = symbols.namespace(namespace).member_name("add");

    let mut function = Function::new(
        "add",
        FunctionOwner::Namespace(namespace),
        full_name,
        Signature::new("add", vec![InternalType::i32(), InternalType::i32()], false),
        InternalType::i32(),
    );
    function.privacy = Privacy::Public;
    let id = symbols.add_function(function).unwrap();

    assert_eq!(symbols.function(id).symbol_name, "root::math#add(i32, i32)");

    let main_name = symbols.namespace(namespace).member_name("main");
    let main = Function::new(
        "main",
        FunctionOwner::Namespace(namespace),
        main_name,
        Signature::new("main", vec![], false),
        InternalType::i32(),
    );
    let main = symbols.add_function(main).unwrap();
    assert_eq!(symbols.function(main).symbol_name, "main");

    let user = symbols.get_or_create_namespace(&path(&["user"]));
    let imported = symbols.lookup_functions(user, &[namespace], "add").unwrap();
    assert_eq!(imported.len(), 1);
    assert!(symbols.lookup_functions(user, &[namespace], "main").is_none());
}

#[test]
fn test_duplicate_declarations() {
    let mut symbols = SymbolTable::new();
    let root = symbols.root();

    symbols
        .declare_type(root, "Item", Privacy::Public, TypeKind::Struct, Position::null())
        .unwrap();
    let error = symbols
        .declare_type(root, "Item", Privacy::Public, TypeKind::Trait, Position::null())
        .unwrap_err();
    assert_eq!(error.get_error_name(), "AlreadyDeclared");

    symbols
        .declare_global(Global::new("count", root, String::from("root#count"), InternalType::i32()))
        .unwrap();
    assert!(symbols
        .declare_global(Global::new("count", root, String::from("root#count"), InternalType::i64()))
        .is_err());
}

#[test]
fn test_parse_full_name() {
    assert_eq!(
        parse_full_name("root::a::b#Item.cost"),
        (path(&["a", "b"]), Some(String::from("Item.cost")))
    );
    assert_eq!(parse_full_name("root"), (vec![], None));
}

#[test]
fn test_enum_flag_width() {
    let flags = |value| {
        vec![EnumFlag {
            name: String::from("A"),
            value,
            payload: vec![],
        }]
    };

    assert_eq!(EnumLayout::new(flags(255)).flag_type, InternalType::u8());
    assert_eq!(EnumLayout::new(flags(256)).flag_type, InternalType::int(16, false));
    assert_eq!(EnumLayout::new(flags(65536)).flag_type, InternalType::int(32, false));
    assert_eq!(EnumLayout::new(flags(4294967296)).flag_type, InternalType::u64());
}

#[test]
fn test_builtin_static_methods_return_u64() {
    let mut symbols = SymbolTable::new();
    let root = symbols.root();
    let item = symbols
        .declare_type(root, "Item", Privacy::Public, TypeKind::Struct, Position::null())
        .unwrap();

    let builtins = builtin_static_methods(&symbols.type_decl(item).as_type());
    assert_eq!(builtins.len(), 2);
    assert!(builtins
        .iter()
        .all(|list| list.candidates()[0].return_type == InternalType::u64()));
}

fn template_definition(params: Vec<TemplateParamDef>) -> Rc<ClassDef> {
    Rc::new(ClassDef {
        name: String::from("Box"),
        modifiers: Modifiers::private(Position::null()),
        template_params: params,
        fields: vec![],
        methods: vec![],
        span: Span::null(),
    })
}

fn constant_argument(value: i64) -> TemplateArg {
    TemplateArg::Constant(Expr::new(ExprKind::Literal(Literal::Int(value)), Span::null()))
}

#[test]
fn test_template_binding() {
    let template = Template::new(
        "Box",
        SymbolTable::new().root(),
        vec![],
        template_definition(vec![TemplateParamDef::Type {
            name: String::from("T"),
        }]),
    );

    let bound = template
        .bind(&[TemplateArg::Type(TypeRef::named("i32", Position::null()))], |_| {
            Ok(InternalType::i32())
        })
        .unwrap();
    let signature = Template::signature(&bound);

    assert_eq!(signature, "<i32>");
    assert_eq!(template.instance_name(&signature), "Box<i32>");
    assert_eq!(template.environment(&bound)["T"], InternalType::i32());

    let error = template.bind(&[], |_| Ok(InternalType::i32())).unwrap_err();
    assert_eq!(error.get_error_name(), "TemplateArity");

    let error = template
        .bind(&[constant_argument(4)], |_| Ok(InternalType::i32()))
        .unwrap_err();
    assert_eq!(error.get_error_name(), "TypeArgumentRequired");
}

#[test]
fn test_template_constant_parameters() {
    let template = Template::new(
        "Buffer",
        SymbolTable::new().root(),
        vec![],
        template_definition(vec![TemplateParamDef::Const {
            name: String::from("N"),
            type_ref: TypeRef::named("i32", Position::null()),
        }]),
    );

    let error = template
        .bind(&[constant_argument(8)], |_| Ok(InternalType::i32()))
        .unwrap_err();
    assert_eq!(error.get_error_name(), "UnsupportedConstArgument");

    let error = template
        .bind(&[TemplateArg::Type(TypeRef::named("i32", Position::null()))], |_| {
            Ok(InternalType::i32())
        })
        .unwrap_err();
    assert_eq!(error.get_error_name(), "ConstantArgumentRequired");
}

fn attribute(name: &str, arguments: Vec<AttributeArg>) -> Attribute {
    Attribute {
        name: name.to_string(),
        arguments,
        position: Position::null(),
    }
}

#[test]
fn test_attribute_set() {
    let set = AttributeSet::from_ast(&[
        attribute("CallConv", vec![AttributeArg::String(String::from("fast"))]),
        attribute("TargetOS", vec![AttributeArg::String(String::from("windows"))]),
        attribute("Export", vec![]),
    ])
    .unwrap();

    assert_eq!(set.calling_convention, Some(8));
    assert!(set.export);
    assert!(set.targets(TargetOs::Windows));
    assert!(!set.targets(TargetOs::Linux));
    assert!(AttributeSet::default().targets(TargetOs::MacOS));
}

#[test]
fn test_attribute_errors() {
    let error = AttributeSet::from_ast(&[attribute("Inline", vec![])]).unwrap_err();
    assert_eq!(error.get_error_name(), "UnknownAttribute");

    let error = AttributeSet::from_ast(&[attribute(
        "CallConv",
        vec![AttributeArg::String(String::from("pascal"))],
    )])
    .unwrap_err();
    assert_eq!(error.get_error_name(), "InvalidAttributeArguments");

    let error = AttributeSet::from_ast(&[attribute("Export", vec![]), attribute("Export", vec![])]).unwrap_err();
    assert_eq!(
        error.get_internal_error(),
        &ErrorImpl::ConflictingModifiers {
            modifier: String::from("@Export")
        }
    );
}
