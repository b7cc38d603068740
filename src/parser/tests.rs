//! Unit tests for the parser module.
//!
//! This module contains tests for parsing various language constructs including:
//! - Namespace headers and imports
//! - Function, class, template, enum, trait and impl definitions
//! - Expressions and operator precedence
//! - Control flow statements
//! - Modifier and attribute errors

use std::rc::Rc;

use super::parser::parse;
use crate::{
    ast::ast::{
        AttributeArg, BinaryOp, Definition, ExprKind, FunctionDef, Literal, Privacy, Script, Stmt,
        TemplateArg, TemplateParamDef, TypeRef, UnaryOp,
    },
    errors::errors::Error,
    lexer::lexer::tokenize,
};

fn parse_source(source: &str) -> Result<Script, Error> {
    let file = Rc::new("test.moth".to_string());
    let tokens = tokenize(source, Rc::clone(&file))?;
    parse(tokens, file)
}

fn parse_function(source: &str) -> FunctionDef {
    let script = parse_source(source).unwrap();
    match script.definitions.into_iter().next() {
        Some(Definition::Function(function)) => function,
        other => panic!("expected a function, got {:?}", other),
    }
}

fn returned_expr(function: &FunctionDef) -> &ExprKind {
    match function.body.as_ref().and_then(|body| body.last()) {
        Some(Stmt::Return { value: Some(value), .. }) => &value.kind,
        other => panic!("expected a return, got {:?}", other),
    }
}

#[test]
fn test_parse_namespace_and_imports() {
    let script = parse_source("namespace unit.test;\nwith core.io;\nwith core;").unwrap();

    assert_eq!(script.namespace, vec!["unit", "test"]);
    assert_eq!(script.imports, vec![vec!["core", "io"], vec!["core"]]);
    assert!(script.definitions.is_empty());
}

#[test]
fn test_parse_function_declaration() {
    let function = parse_function("public func add(a #i32, b #i32) #i32 { return a + b; }");

    assert_eq!(function.name, "add");
    assert_eq!(function.modifiers.privacy, Privacy::Public);
    assert_eq!(function.params.len(), 2);
    assert!(!function.is_variadic);
    assert!(matches!(&function.return_type, TypeRef::Named { name, .. } if name == "i32"));
    assert!(matches!(
        returned_expr(&function),
        ExprKind::Binary { op: BinaryOp::Add, .. }
    ));
}

#[test]
fn test_parse_foreign_variadic_function() {
    let function = parse_function("public foreign func printf(format #u8*, ~~) #i32;");

    assert!(function.modifiers.is_foreign);
    assert!(function.is_variadic);
    assert!(function.body.is_none());
    assert!(matches!(&function.params[0].type_ref, TypeRef::Pointer(_)));
}

#[test]
fn test_parse_missing_return_type_is_void() {
    let function = parse_function("func run() { return; }");

    assert!(matches!(&function.return_type, TypeRef::Named { name, .. } if name == "void"));
}

#[test]
fn test_parse_operator_precedence() {
    let function = parse_function("func f() #i32 { return 1 + 2 * 3; }");

    match returned_expr(&function) {
        ExprKind::Binary {
            op: BinaryOp::Add,
            right,
            ..
        } => assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. })),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_exponent_is_right_associative() {
    let function = parse_function("func f() #i32 { return 2 ^ 3 ^ 2; }");

    match returned_expr(&function) {
        ExprKind::Binary {
            op: BinaryOp::Pow,
            left,
            right,
        } => {
            assert!(matches!(left.kind, ExprKind::Literal(Literal::Int(2))));
            assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Pow, .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_negation() {
    let function = parse_function("func f(x #i32) #i32 { return -x * -2; }");

    match returned_expr(&function) {
        ExprKind::Binary {
            op: BinaryOp::Mul,
            left,
            right,
        } => {
            assert!(matches!(left.kind, ExprKind::Unary { op: UnaryOp::Negate, .. }));
            assert!(matches!(right.kind, ExprKind::Literal(Literal::Int(-2))));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_subtraction_after_call_is_binary() {
    let function = parse_function("func f() #i32 { return g() - 1; }");

    assert!(matches!(
        returned_expr(&function),
        ExprKind::Binary { op: BinaryOp::Sub, .. }
    ));
}

#[test]
fn test_parse_locals() {
    let function = parse_function(
        "func f() #i32 { local x #i32 = 2; local y ?= true and false; local z #u8*; return 0; }",
    );
    let body = function.body.unwrap();

    assert!(matches!(&body[0], Stmt::Local { name, type_ref: Some(_), value: Some(_), .. } if name == "x"));
    assert!(matches!(&body[1], Stmt::Local { type_ref: None, value: Some(_), .. }));
    assert!(matches!(&body[2], Stmt::Local { value: None, .. }));
}

#[test]
fn test_parse_if_else_chain() {
    let function = parse_function(
        "func f(x #i32) #i32 { if x > 2 { return 4; } else if x > 1 { return 3; } else { return 2; } }",
    );
    let body = function.body.unwrap();

    match &body[0] {
        Stmt::If {
            else_body: Some(else_body),
            ..
        } => assert!(matches!(&else_body[0], Stmt::If { else_body: Some(_), .. })),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_while_loop() {
    let function = parse_function("func f() { local i #i32 = 0; while i < 10 { i++; i += 2; } return; }");
    let body = function.body.unwrap();

    match &body[1] {
        Stmt::While { body, .. } => {
            assert!(matches!(&body[0], Stmt::Expression(expr) if matches!(expr.kind, ExprKind::Increment { increment: true, .. })));
            match &body[1] {
                Stmt::Expression(expr) => match &expr.kind {
                    ExprKind::Assignment { value, .. } => {
                        assert!(matches!(value.kind, ExprKind::Binary { op: BinaryOp::Add, .. }))
                    }
                    other => panic!("unexpected {:?}", other),
                },
                other => panic!("unexpected {:?}", other),
            }
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_cast_static_access_and_inline_if() {
    let function = parse_function(
        "func f(x #i64) #i32 { local s ?= #Item.init(); local c ?= #i32 <- x; return if x > 1 then 1 else 2; }",
    );
    let body = function.body.as_ref().unwrap();

    match &body[0] {
        Stmt::Local { value: Some(value), .. } => match &value.kind {
            ExprKind::Call { callee, arguments } => {
                assert!(arguments.is_empty());
                assert!(matches!(&callee.kind, ExprKind::StaticAccess { member, .. } if member == "init"));
            }
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }

    assert!(matches!(&body[1], Stmt::Local { value: Some(value), .. } if matches!(value.kind, ExprKind::Cast { .. })));
    assert!(matches!(returned_expr(&function), ExprKind::InlineIf { .. }));
}

#[test]
fn test_parse_member_index_ref_and_load() {
    let function = parse_function(
        "func f(item #Item*) #i32 { item.Cost = 5; local p ?= ref item.Cost; local a ?= [1, 2, 3]; return load p + a[1]; }",
    );
    let body = function.body.as_ref().unwrap();

    match &body[0] {
        Stmt::Expression(expr) => match &expr.kind {
            ExprKind::Assignment { assignee, .. } => {
                assert!(matches!(&assignee.kind, ExprKind::Member { member, .. } if member == "Cost"))
            }
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }

    assert!(matches!(&body[1], Stmt::Local { value: Some(value), .. } if matches!(value.kind, ExprKind::AddressOf(_))));
    assert!(matches!(&body[2], Stmt::Local { value: Some(value), .. } if matches!(&value.kind, ExprKind::ArrayLiteral(items) if items.len() == 3)));

    match returned_expr(&function) {
        ExprKind::Binary { left, right, .. } => {
            assert!(matches!(left.kind, ExprKind::Dereference(_)));
            assert!(matches!(right.kind, ExprKind::Index { .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_class_with_fields_and_methods() {
    let script = parse_source(
        "public class Item {
            public Cost #i32;
            Name #u8*;
            public static init() #Item { return self; }
            public func cost() #i32 { return self.Cost; }
        }",
    )
    .unwrap();

    match &script.definitions[0] {
        Definition::Class(class) => {
            assert_eq!(class.name, "Item");
            assert!(class.template_params.is_empty());
            assert_eq!(class.fields.len(), 2);
            assert_eq!(class.fields[0].privacy, Privacy::Public);
            assert_eq!(class.fields[1].privacy, Privacy::Private);
            assert_eq!(class.methods.len(), 2);
            assert!(class.methods[0].modifiers.is_static);
            assert!(!class.methods[1].modifiers.is_static);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_template_class_and_instance_type() {
    let script = parse_source(
        r"public class Box<\T, N #i32\> { public Value #T; }
        func f(b #Box<\#i32, 4\>*) { return; }",
    )
    .unwrap();

    match &script.definitions[0] {
        Definition::Class(class) => {
            assert!(matches!(&class.template_params[0], TemplateParamDef::Type { name } if name == "T"));
            assert!(matches!(&class.template_params[1], TemplateParamDef::Const { name, .. } if name == "N"));
        }
        other => panic!("unexpected {:?}", other),
    }

    match &script.definitions[1] {
        Definition::Function(function) => match &function.params[0].type_ref {
            TypeRef::Pointer(inner) => match inner.as_ref() {
                TypeRef::Named { name, arguments, .. } => {
                    assert_eq!(name, "Box");
                    assert!(matches!(arguments[0], TemplateArg::Type(_)));
                    assert!(matches!(arguments[1], TemplateArg::Constant(_)));
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_function_type() {
    let function = parse_function("func apply(f #(#i32, #i32) #bool) { return; }");

    match &function.params[0].type_ref {
        TypeRef::Function { params, is_variadic, .. } => {
            assert_eq!(params.len(), 2);
            assert!(!is_variadic);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_parse_enum_trait_impl_and_global() {
    let script = parse_source(
        "public enum Shape { Circle(#f32), Square(#f32), Empty = 10 }
        public trait Priced { func cost() #i32; }
        impl #Priced for #Item { public func cost() #i32 { return 1; } }
        public constant LIMIT #i32 = 4;",
    )
    .unwrap();

    match &script.definitions[0] {
        Definition::Enum(shape) => {
            assert_eq!(shape.flags.len(), 3);
            assert_eq!(shape.flags[0].payload.len(), 1);
            assert_eq!(shape.flags[2].value, Some(10));
        }
        other => panic!("unexpected {:?}", other),
    }

    assert!(matches!(&script.definitions[1], Definition::Trait(t) if t.methods[0].body.is_none()));
    assert!(matches!(&script.definitions[2], Definition::Impl(i) if i.methods.len() == 1));
    assert!(matches!(&script.definitions[3], Definition::Global(g) if g.is_constant && g.value.is_some()));
}

#[test]
fn test_parse_attributes() {
    let function = parse_function("@CallConv(\"c\") @TargetOS(\"linux\", \"macos\") public func main() #i32 { return 0; }");

    assert_eq!(function.modifiers.attributes.len(), 2);
    assert_eq!(function.modifiers.attributes[0].name, "CallConv");
    assert_eq!(
        function.modifiers.attributes[1].arguments,
        vec![
            AttributeArg::String("linux".to_string()),
            AttributeArg::String("macos".to_string())
        ]
    );
}

#[test]
fn test_parse_conflicting_modifiers() {
    let error = parse_source("public static static func f() { return; }").unwrap_err();
    assert_eq!(error.get_error_name(), "ConflictingModifiers");

    let error = parse_source("public private func f() { return; }").unwrap_err();
    assert_eq!(error.get_error_name(), "ConflictingModifiers");
}

#[test]
fn test_parse_missing_semicolon() {
    let error = parse_source("func f() #i32 { return 1 }").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_parse_number_overflow() {
    let error = parse_source("func f() #i64 { return 99999999999999999999; }").unwrap_err();
    assert_eq!(error.get_error_name(), "NumberParseError");
}
