use std::rc::Rc;

use crate::{Position, Span};

/// One parsed source file.
#[derive(Debug, Clone)]
pub struct Script {
    pub file: Rc<String>,
    /// Path segments of the `namespace` declaration, without the root.
    pub namespace: Vec<String>,
    /// `with` imports, each a namespace path.
    pub imports: Vec<Vec<String>>,
    pub definitions: Vec<Definition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Privacy {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeArg {
    String(String),
    Int(i64),
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub arguments: Vec<AttributeArg>,
    pub position: Position,
}

/// Modifiers and attributes written in front of a definition.
#[derive(Debug, Clone)]
pub struct Modifiers {
    pub privacy: Privacy,
    pub is_static: bool,
    pub is_foreign: bool,
    pub attributes: Vec<Attribute>,
    pub position: Position,
}

impl Modifiers {
    pub fn private(position: Position) -> Self {
        Modifiers {
            privacy: Privacy::Private,
            is_static: false,
            is_foreign: false,
            attributes: vec![],
            position,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Definition {
    Function(FunctionDef),
    Class(ClassDef),
    Enum(EnumDef),
    Trait(TraitDef),
    Impl(ImplDef),
    Global(GlobalDef),
}

#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: String,
    pub type_ref: TypeRef,
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub modifiers: Modifiers,
    pub params: Vec<ParamDef>,
    pub is_variadic: bool,
    pub return_type: TypeRef,
    /// `None` for foreign functions and trait method signatures.
    pub body: Option<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TemplateParamDef {
    Type { name: String },
    Const { name: String, type_ref: TypeRef },
}

impl TemplateParamDef {
    pub fn name(&self) -> &str {
        match self {
            TemplateParamDef::Type { name } | TemplateParamDef::Const { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub privacy: Privacy,
    pub type_ref: TypeRef,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: String,
    pub modifiers: Modifiers,
    /// Empty for ordinary classes; a class with parameters is a template.
    pub template_params: Vec<TemplateParamDef>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<Rc<FunctionDef>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumFlagDef {
    pub name: String,
    pub value: Option<u64>,
    pub payload: Vec<TypeRef>,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct EnumDef {
    pub name: String,
    pub modifiers: Modifiers,
    pub flags: Vec<EnumFlagDef>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TraitDef {
    pub name: String,
    pub modifiers: Modifiers,
    pub methods: Vec<Rc<FunctionDef>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ImplDef {
    pub trait_ref: TypeRef,
    pub type_ref: TypeRef,
    pub methods: Vec<Rc<FunctionDef>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct GlobalDef {
    pub name: String,
    pub modifiers: Modifiers,
    pub is_constant: bool,
    pub type_ref: TypeRef,
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TemplateArg {
    Type(TypeRef),
    Constant(Expr),
}

/// A type as written in source, before resolution.
#[derive(Debug, Clone)]
pub enum TypeRef {
    Named {
        name: String,
        arguments: Vec<TemplateArg>,
        position: Position,
    },
    Pointer(Box<TypeRef>),
    Reference(Box<TypeRef>),
    Array(Box<TypeRef>),
    Function {
        params: Vec<TypeRef>,
        return_type: Box<TypeRef>,
        is_variadic: bool,
        position: Position,
    },
}

impl TypeRef {
    pub fn named(name: &str, position: Position) -> Self {
        TypeRef::Named {
            name: name.to_string(),
            arguments: vec![],
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        match self {
            TypeRef::Named { position, .. } | TypeRef::Function { position, .. } => position,
            TypeRef::Pointer(inner) | TypeRef::Reference(inner) | TypeRef::Array(inner) => {
                inner.get_position()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expression(Expr),
    Local {
        name: String,
        /// `None` for `?=` inferred locals.
        type_ref: Option<TypeRef>,
        value: Option<Expr>,
        span: Span,
    },
    If {
        condition: Expr,
        then_body: Vec<Stmt>,
        else_body: Option<Vec<Stmt>>,
        span: Span,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    Block(Vec<Stmt>, Span),
}

impl Stmt {
    pub fn get_span(&self) -> &Span {
        match self {
            Stmt::Expression(expr) => &expr.span,
            Stmt::Local { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Block(_, span) => span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
    And,
    Or,
}

impl BinaryOp {
    /// The method name operator overloads are declared under.
    pub fn operator_name(&self) -> &'static str {
        match self {
            BinaryOp::Add => "__operator_add",
            BinaryOp::Sub => "__operator_sub",
            BinaryOp::Mul => "__operator_mul",
            BinaryOp::Div => "__operator_div",
            BinaryOp::Mod => "__operator_mod",
            BinaryOp::Pow => "__operator_pow",
            BinaryOp::Eq | BinaryOp::NotEq => "__operator_eq",
            BinaryOp::Gt => "__operator_gt",
            BinaryOp::Lt => "__operator_lt",
            BinaryOp::GtEq => "__operator_gteq",
            BinaryOp::LtEq => "__operator_lteq",
            BinaryOp::And => "__operator_and",
            BinaryOp::Or => "__operator_or",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Gt | BinaryOp::Lt | BinaryOp::GtEq | BinaryOp::LtEq
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Char(u8),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    pub fn get_position(&self) -> &Position {
        &self.span.start
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    Symbol(String),
    SelfRef,
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assignment {
        assignee: Box<Expr>,
        value: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Postfix `++` / `--`; evaluates to the value before the update.
    Increment {
        operand: Box<Expr>,
        increment: bool,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        member: String,
    },
    /// `#Type.member`, a static method, enum flag or builtin.
    StaticAccess {
        type_ref: TypeRef,
        member: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Cast {
        type_ref: TypeRef,
        value: Box<Expr>,
    },
    InlineIf {
        condition: Box<Expr>,
        then_value: Box<Expr>,
        else_value: Box<Expr>,
    },
    AddressOf(Box<Expr>),
    Dereference(Box<Expr>),
    ArrayLiteral(Vec<Expr>),
}
