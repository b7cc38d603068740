//! The namespace and symbol graph.
//!
//! Declarations live in arenas owned by a [`namespace::SymbolTable`] and are
//! addressed by small copyable ids, so namespaces, types and functions can
//! refer to each other without shared ownership. The module contains:
//!
//! - Namespaces with parent-chain lookup and `with` imports
//! - Type declarations (structs, traits, enums) with fields and method tables
//! - Functions, globals and their symbol names
//! - Overload lists and the three-tier overload resolution
//! - Templates and their instantiation cache
//! - Attribute sets (calling convention, target OS gating, export)
//! - The intrinsic operators of primitive types
//!
//! Nothing in this module touches LLVM; the compiler keeps backend handles
//! in its own maps keyed by these ids.

pub mod attributes;
pub mod decls;
pub mod namespace;
pub mod operators;
pub mod overload;
pub mod template;

#[cfg(test)]
mod tests;

/// Name of the namespace every other namespace descends from.
pub const ROOT_NAMESPACE: &str = "root";

/// Separator between namespace segments in full names.
pub const NAMESPACE_SEPARATOR: &str = "::";
