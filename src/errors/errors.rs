use std::fmt::Display;

use inkwell::builder::BuilderError;
use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    /// Creates an error for a failure with no source location, such as a
    /// metadata or backend failure.
    pub fn unpositioned(error_impl: ErrorImpl) -> Self {
        Error::new(error_impl, Position::null())
    }

    /// Attaches a position to an error that was raised without one.
    pub fn or_at(mut self, position: &Position) -> Self {
        if self.position.0 == 0 && self.position.1.as_str() == "<null>" {
            self.position = position.clone();
        }
        self
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_internal_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::UnknownIdentifier { .. } => "UnknownIdentifier",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::UnknownField { .. } => "UnknownField",
            ErrorImpl::UnknownMethod { .. } => "UnknownMethod",
            ErrorImpl::UnknownNamespace { .. } => "UnknownNamespace",
            ErrorImpl::UnknownTrait { .. } => "UnknownTrait",
            ErrorImpl::UnknownTemplate { .. } => "UnknownTemplate",
            ErrorImpl::PrivateAccess { .. } => "PrivateAccess",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::NotGuaranteedToReturn { .. } => "NotGuaranteedToReturn",
            ErrorImpl::InvalidCast { .. } => "InvalidCast",
            ErrorImpl::NotAddressable { .. } => "NotAddressable",
            ErrorImpl::AlreadyDeclared { .. } => "AlreadyDeclared",
            ErrorImpl::InvalidOperation { .. } => "InvalidOperation",
            ErrorImpl::MissingTraitMethod { .. } => "MissingTraitMethod",
            ErrorImpl::NoCandidate { .. } => "NoCandidate",
            ErrorImpl::AmbiguousCall { .. } => "AmbiguousCall",
            ErrorImpl::TemplateArity { .. } => "TemplateArity",
            ErrorImpl::ConstantArgumentRequired { .. } => "ConstantArgumentRequired",
            ErrorImpl::TypeArgumentRequired { .. } => "TypeArgumentRequired",
            ErrorImpl::UnsupportedConstArgument { .. } => "UnsupportedConstArgument",
            ErrorImpl::MetadataVersionMismatch { .. } => "MetadataVersionMismatch",
            ErrorImpl::CorruptMetadata { .. } => "CorruptMetadata",
            ErrorImpl::UnknownTypeTag { .. } => "UnknownTypeTag",
            ErrorImpl::MetadataIndexOutOfRange { .. } => "MetadataIndexOutOfRange",
            ErrorImpl::InvalidMetadataName { .. } => "InvalidMetadataName",
            ErrorImpl::UnexportableType { .. } => "UnexportableType",
            ErrorImpl::UnknownAttribute { .. } => "UnknownAttribute",
            ErrorImpl::InvalidAttributeArguments { .. } => "InvalidAttributeArguments",
            ErrorImpl::ConflictingModifiers { .. } => "ConflictingModifiers",
            ErrorImpl::BackendError { .. } => "BackendError",
            ErrorImpl::IoError { .. } => "IoError",
        }
    }

    pub fn get_category(&self) -> ErrorCategory {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. }
            | ErrorImpl::UnexpectedToken { .. }
            | ErrorImpl::UnexpectedTokenDetailed { .. }
            | ErrorImpl::NumberParseError { .. } => ErrorCategory::Syntax,
            ErrorImpl::NoCandidate { .. } | ErrorImpl::AmbiguousCall { .. } => {
                ErrorCategory::Overload
            }
            ErrorImpl::TemplateArity { .. }
            | ErrorImpl::ConstantArgumentRequired { .. }
            | ErrorImpl::TypeArgumentRequired { .. }
            | ErrorImpl::UnsupportedConstArgument { .. } => ErrorCategory::Template,
            ErrorImpl::MetadataVersionMismatch { .. }
            | ErrorImpl::CorruptMetadata { .. }
            | ErrorImpl::UnknownTypeTag { .. }
            | ErrorImpl::MetadataIndexOutOfRange { .. }
            | ErrorImpl::InvalidMetadataName { .. }
            | ErrorImpl::UnexportableType { .. } => ErrorCategory::Metadata,
            ErrorImpl::UnknownAttribute { .. }
            | ErrorImpl::InvalidAttributeArguments { .. }
            | ErrorImpl::ConflictingModifiers { .. } => ErrorCategory::Attribute,
            ErrorImpl::BackendError { .. } | ErrorImpl::IoError { .. } => ErrorCategory::Backend,
            _ => ErrorCategory::Semantic,
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::UnknownIdentifier { name } => {
                ErrorTip::Suggestion(format!("`{}` is not declared in this scope", name))
            }
            ErrorImpl::UnknownType { type_ } => {
                ErrorTip::Suggestion(format!("Unknown type `{}` found", type_))
            }
            ErrorImpl::UnknownField { field, type_ } => ErrorTip::Suggestion(format!(
                "Field `{}` does not exist on type `{}`",
                field, type_
            )),
            ErrorImpl::UnknownMethod { method, type_ } => ErrorTip::Suggestion(format!(
                "Method `{}` does not exist on type `{}`",
                method, type_
            )),
            ErrorImpl::UnknownNamespace { namespace } => ErrorTip::Suggestion(format!(
                "Namespace `{}` is neither compiled nor imported from a dependency",
                namespace
            )),
            ErrorImpl::PrivateAccess { member, type_ } => ErrorTip::Suggestion(format!(
                "`{}` is private to `{}`",
                member, type_
            )),
            ErrorImpl::TypeMatchError { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::NotGuaranteedToReturn { function } => ErrorTip::Suggestion(format!(
                "Add a return statement to the end of `{}`",
                function
            )),
            ErrorImpl::InvalidCast { from, to } => ErrorTip::Suggestion(format!(
                "`{}` cannot be cast to `{}`",
                from, to
            )),
            ErrorImpl::NotAddressable { expression } => ErrorTip::Suggestion(format!(
                "`{}` is a value, not a place that can be written or referenced",
                expression
            )),
            ErrorImpl::MissingTraitMethod {
                trait_,
                method,
                type_,
            } => ErrorTip::Suggestion(format!(
                "Implement `{}` from `{}` on `{}`",
                method, trait_, type_
            )),
            ErrorImpl::AmbiguousCall { name } => ErrorTip::Suggestion(format!(
                "Cast the arguments of `{}` to select one overload",
                name
            )),
            ErrorImpl::TemplateArity {
                expected, received, ..
            } => ErrorTip::Suggestion(format!(
                "Expected {} template arguments, received {}",
                expected, received
            )),
            ErrorImpl::MetadataVersionMismatch { expected, received } => {
                ErrorTip::Suggestion(format!(
                    "Rebuild the dependency: expected version {}, found {}",
                    expected, received
                ))
            }
            ErrorImpl::ConflictingModifiers { modifier } => {
                ErrorTip::Suggestion(format!("Remove the repeated `{}`", modifier))
            }
            _ => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.internal_error)
    }
}

impl std::error::Error for Error {}

impl From<BuilderError> for Error {
    fn from(error: BuilderError) -> Self {
        Error::unpositioned(ErrorImpl::BackendError {
            message: error.to_string(),
        })
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::unpositioned(ErrorImpl::IoError {
            message: error.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Syntax,
    Semantic,
    Overload,
    Template,
    Metadata,
    Attribute,
    Backend,
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },

    #[error("identifier {name:?} does not exist")]
    UnknownIdentifier { name: String },
    #[error("unknown type {type_} found")]
    UnknownType { type_: String },
    #[error("field {field:?} does not exist on type {type_:?}")]
    UnknownField { field: String, type_: String },
    #[error("method {method:?} does not exist on type {type_:?}")]
    UnknownMethod { method: String, type_: String },
    #[error("namespace {namespace:?} does not exist")]
    UnknownNamespace { namespace: String },
    #[error("trait {trait_:?} does not exist")]
    UnknownTrait { trait_: String },
    #[error("template {template:?} does not exist")]
    UnknownTemplate { template: String },
    #[error("cannot access private member {member:?} on type {type_:?}")]
    PrivateAccess { member: String, type_: String },
    #[error("types do not match: expected {expected:?}, received {received:?}")]
    TypeMatchError { expected: String, received: String },
    #[error("function {function:?} is not guaranteed to return")]
    NotGuaranteedToReturn { function: String },
    #[error("cannot cast {from:?} to {to:?}")]
    InvalidCast { from: String, to: String },
    #[error("{expression:?} is not addressable")]
    NotAddressable { expression: String },
    #[error("{name:?} is already declared")]
    AlreadyDeclared { name: String },
    #[error("invalid operation: {message}")]
    InvalidOperation { message: String },
    #[error("type {type_:?} does not implement {method:?} from trait {trait_:?}")]
    MissingTraitMethod {
        trait_: String,
        method: String,
        type_: String,
    },

    #[error("no candidate definition for call to {name:?}")]
    NoCandidate { name: String },
    #[error("cannot infer overload for call to {name:?}")]
    AmbiguousCall { name: String },

    #[error("template arguments are {received} long, expected {expected} arguments for template {template:?}")]
    TemplateArity {
        template: String,
        expected: usize,
        received: usize,
    },
    #[error("template parameter {parameter:?} of {template:?} requires a constant argument")]
    ConstantArgumentRequired { template: String, parameter: String },
    #[error("template parameter {parameter:?} of {template:?} requires a type argument")]
    TypeArgumentRequired { template: String, parameter: String },
    #[error("constant argument binding for parameter {parameter:?} of {template:?} is not supported")]
    UnsupportedConstArgument { template: String, parameter: String },

    #[error("metadata version mismatch: expected {expected}, received {received}")]
    MetadataVersionMismatch { expected: String, received: String },
    #[error("corrupt metadata: {message}")]
    CorruptMetadata { message: String },
    #[error("unknown type reference tag {tag}")]
    UnknownTypeTag { tag: u8 },
    #[error("{table} index {index} is out of range")]
    MetadataIndexOutOfRange { table: String, index: u32 },
    #[error("name at {index} is not valid utf-8")]
    InvalidMetadataName { index: u32 },
    #[error("type {type_:?} cannot be exported to metadata")]
    UnexportableType { type_: String },

    #[error("unknown attribute {name:?}")]
    UnknownAttribute { name: String },
    #[error("invalid arguments for attribute {name:?}: {message}")]
    InvalidAttributeArguments { name: String, message: String },
    #[error("conflicting modifier {modifier:?}")]
    ConflictingModifiers { modifier: String },

    #[error("backend error: {message}")]
    BackendError { message: String },
    #[error("io error: {message}")]
    IoError { message: String },
}
