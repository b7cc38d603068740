//! Code generation module for the compiler.
//!
//! This module contains the LLVM-based code generator that turns parsed
//! scripts into a verified LLVM module. It handles:
//!
//! - The declaration passes over types, signatures and trait impls
//! - Lazy template instantiation
//! - Compilation of expressions and statements
//! - Implicit conversions, explicit casts and operator lowering
//! - Type conversion from internal types to LLVM types

pub mod casts;
pub mod compiler;
pub mod declare;
pub mod expr;
pub mod operators;
pub mod options;
pub mod scope;
pub mod stmt;
pub mod template;
