//! Parser module for building an Abstract Syntax Tree (AST).
//!
//! This module contains the parser that transforms a stream of tokens
//! into a [`Script`](crate::ast::ast::Script). It uses a Pratt parser for
//! expressions with proper operator precedence and handles:
//!
//! - Definition parsing (namespace header, imports, classes, templates,
//!   enums, traits, impls, functions, globals, attributes and modifiers)
//! - Statement parsing (locals, control flow, returns, blocks)
//! - Expression parsing (binary ops, calls, casts, member and static access)
//! - Type parsing for type annotations
//!
//! The parser uses NUD (null denotation) and LED (left denotation) functions
//! for expression parsing with binding power for precedence handling.

pub mod definitions;
pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod types;

#[cfg(test)]
mod tests;
