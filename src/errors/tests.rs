//! Unit tests for error handling.
//!
//! This module contains tests for error types and error reporting.

use crate::errors::errors::{Error, ErrorCategory, ErrorImpl, ErrorTip};
use crate::Position;
use std::rc::Rc;

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "$".to_string(),
        },
        Position(10, Rc::new("test.moth".to_string())),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_category(), ErrorCategory::Syntax);
}

#[test]
fn test_error_position() {
    let pos = Position(42, Rc::new("test.moth".to_string()));
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "identifier".to_string(),
        },
        pos.clone(),
    );

    assert_eq!(error.get_position().0, 42);
}

#[test]
fn test_or_at_only_fills_missing_position() {
    let pos = Position(7, Rc::new("test.moth".to_string()));
    let error = Error::unpositioned(ErrorImpl::NoCandidate {
        name: "add".to_string(),
    })
    .or_at(&pos);
    assert_eq!(error.get_position().0, 7);

    let other = Position(99, Rc::new("test.moth".to_string()));
    let error = error.or_at(&other);
    assert_eq!(error.get_position().0, 7);
}

#[test]
fn test_overload_errors_are_categorised() {
    let error = Error::unpositioned(ErrorImpl::AmbiguousCall {
        name: "add".to_string(),
    });

    assert_eq!(error.get_error_name(), "AmbiguousCall");
    assert_eq!(error.get_category(), ErrorCategory::Overload);
    assert_eq!(error.to_string(), "cannot infer overload for call to \"add\"");
}

#[test]
fn test_template_arity_message() {
    let error = Error::unpositioned(ErrorImpl::TemplateArity {
        template: "Box".to_string(),
        expected: 1,
        received: 2,
    });

    assert_eq!(error.get_category(), ErrorCategory::Template);
    assert_eq!(
        error.to_string(),
        "template arguments are 2 long, expected 1 arguments for template \"Box\""
    );
}

#[test]
fn test_metadata_and_attribute_categories() {
    let corrupt = Error::unpositioned(ErrorImpl::CorruptMetadata {
        message: "trailing bytes".to_string(),
    });
    assert_eq!(corrupt.get_category(), ErrorCategory::Metadata);

    let modifier = Error::unpositioned(ErrorImpl::ConflictingModifiers {
        modifier: "static".to_string(),
    });
    assert_eq!(modifier.get_category(), ErrorCategory::Attribute);
}

#[test]
fn test_semantic_errors_default_category() {
    let error = Error::unpositioned(ErrorImpl::NotGuaranteedToReturn {
        function: "main".to_string(),
    });

    assert_eq!(error.get_category(), ErrorCategory::Semantic);
}

#[test]
fn test_type_mismatch_error() {
    let error = Error::new(
        ErrorImpl::TypeMatchError {
            expected: "i32".to_string(),
            received: "u8*".to_string(),
        },
        Position(0, Rc::new("test.moth".to_string())),
    );

    assert_eq!(error.get_error_name(), "TypeMatchError");
    assert_eq!(
        error.get_tip().to_string(),
        "Expected type `i32`, received `u8*`"
    );
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "$".to_string(),
        },
        Position(0, Rc::new("test.moth".to_string())),
    );

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_suggestion() {
    let error = Error::new(
        ErrorImpl::UnexpectedToken {
            token: "}".to_string(),
        },
        Position(0, Rc::new("test.moth".to_string())),
    );

    match error.get_tip() {
        ErrorTip::Suggestion(_) => (),
        _ => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let error: Error = io.into();

    assert_eq!(error.get_error_name(), "IoError");
    assert_eq!(error.get_category(), ErrorCategory::Backend);
}
