use std::fmt::Display;

use crate::{
    ast::ast::{Attribute, AttributeArg},
    errors::errors::{Error, ErrorImpl},
};

/// Operating systems a function can be gated on with `@TargetOS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetOs {
    Linux,
    Windows,
    MacOS,
}

impl TargetOs {
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            TargetOs::Windows
        } else if cfg!(target_os = "macos") {
            TargetOs::MacOS
        } else {
            TargetOs::Linux
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "linux" => Some(TargetOs::Linux),
            "windows" => Some(TargetOs::Windows),
            "macos" | "osx" => Some(TargetOs::MacOS),
            _ => None,
        }
    }
}

impl Display for TargetOs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetOs::Linux => write!(f, "linux"),
            TargetOs::Windows => write!(f, "windows"),
            TargetOs::MacOS => write!(f, "macos"),
        }
    }
}

/// LLVM calling convention ids accepted by `@CallConv`.
pub fn calling_convention(name: &str) -> Option<u32> {
    match name {
        "c" => Some(0),
        "fast" => Some(8),
        "cold" => Some(9),
        "stdcall" => Some(64),
        "win64" => Some(79),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSet {
    pub calling_convention: Option<u32>,
    /// `None` means the declaration is compiled for every target.
    pub target_os: Option<Vec<TargetOs>>,
    pub export: bool,
}

fn invalid(attribute: &Attribute, message: &str) -> Error {
    Error::new(
        ErrorImpl::InvalidAttributeArguments {
            name: attribute.name.clone(),
            message: message.to_string(),
        },
        attribute.position.clone(),
    )
}

fn string_arguments(attribute: &Attribute) -> Result<Vec<&str>, Error> {
    attribute
        .arguments
        .iter()
        .map(|argument| match argument {
            AttributeArg::String(value) => Ok(value.as_str()),
            AttributeArg::Int(_) => Err(invalid(attribute, "expected string arguments")),
        })
        .collect()
}

impl AttributeSet {
    pub fn from_ast(attributes: &[Attribute]) -> Result<Self, Error> {
        let mut set = AttributeSet::default();

        for attribute in attributes {
            let duplicate = match attribute.name.as_str() {
                "CallConv" => {
                    let arguments = string_arguments(attribute)?;
                    let [name] = arguments.as_slice() else {
                        return Err(invalid(attribute, "expected exactly one calling convention"));
                    };
                    let convention = calling_convention(name)
                        .ok_or_else(|| invalid(attribute, &format!("unknown calling convention `{}`", name)))?;

                    set.calling_convention.replace(convention).is_some()
                }
                "TargetOS" => {
                    let arguments = string_arguments(attribute)?;
                    if arguments.is_empty() {
                        return Err(invalid(attribute, "expected at least one operating system"));
                    }

                    let targets = arguments
                        .iter()
                        .map(|name| {
                            TargetOs::from_name(name)
                                .ok_or_else(|| invalid(attribute, &format!("unknown operating system `{}`", name)))
                        })
                        .collect::<Result<Vec<_>, _>>()?;

                    set.target_os.replace(targets).is_some()
                }
                "Export" => {
                    if !attribute.arguments.is_empty() {
                        return Err(invalid(attribute, "takes no arguments"));
                    }

                    std::mem::replace(&mut set.export, true)
                }
                _ => {
                    return Err(Error::new(
                        ErrorImpl::UnknownAttribute {
                            name: attribute.name.clone(),
                        },
                        attribute.position.clone(),
                    ))
                }
            };

            if duplicate {
                return Err(Error::new(
                    ErrorImpl::ConflictingModifiers {
                        modifier: format!("@{}", attribute.name),
                    },
                    attribute.position.clone(),
                ));
            }
        }

        Ok(set)
    }

    /// Whether a declaration with these attributes exists on `target`.
    pub fn targets(&self, target: TargetOs) -> bool {
        self.target_os
            .as_ref()
            .map_or(true, |targets| targets.contains(&target))
    }
}
