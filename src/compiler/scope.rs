use std::collections::HashMap;

use inkwell::{
    basic_block::BasicBlock,
    values::{BasicValueEnum, PointerValue},
};

use crate::types::types::InternalType;

/// A typed backend value.
///
/// A value of type `T&` holds the address of a `T`; that is what makes a
/// value addressable. Void results carry a dummy `i32 0`.
#[derive(Debug, Clone)]
pub struct Value<'a> {
    pub ty: InternalType,
    pub value: BasicValueEnum<'a>,
}

impl<'a> Value<'a> {
    pub fn new(ty: InternalType, value: BasicValueEnum<'a>) -> Self {
        Value { ty, value }
    }

    /// A place holding a `ty`, addressed by `pointer`.
    pub fn place(ty: InternalType, pointer: PointerValue<'a>) -> Self {
        Value {
            ty: ty.reference_to(),
            value: pointer.into(),
        }
    }

    pub fn is_addressable(&self) -> bool {
        self.ty.is_reference()
    }
}

#[derive(Debug, Clone)]
pub struct Variable<'a> {
    pub name: String,
    pub ty: InternalType,
    pub pointer: PointerValue<'a>,
    pub is_constant: bool,
}

impl<'a> Variable<'a> {
    pub fn as_value(&self) -> Value<'a> {
        Value::place(self.ty.clone(), self.pointer)
    }
}

/// Locals visible in one control-flow block.
///
/// Branches work on copies, so a local declared in one arm of an `if`
/// never leaks into the other arm or past the `if`.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    pub block: BasicBlock<'a>,
    pub variables: HashMap<String, Variable<'a>>,
}

impl<'a> Scope<'a> {
    pub fn new(block: BasicBlock<'a>) -> Self {
        Scope {
            block,
            variables: HashMap::new(),
        }
    }

    /// A child scope starting at `block` that sees every local of `self`.
    pub fn branch(&self, block: BasicBlock<'a>) -> Self {
        Scope {
            block,
            variables: self.variables.clone(),
        }
    }

    pub fn declare(&mut self, variable: Variable<'a>) {
        self.variables.insert(variable.name.clone(), variable);
    }

    pub fn get(&self, name: &str) -> Option<&Variable<'a>> {
        self.variables.get(name)
    }
}
