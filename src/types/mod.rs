//! The internal type system.
//!
//! Every value the compiler handles carries an [`types::InternalType`]. The
//! module contains:
//!
//! - The closed set of types (primitives, pointers, references, functions,
//!   arrays and declared struct/trait/enum types)
//! - Declaration identity, where two declared types are equal only if they
//!   came from the same declaration
//! - The implicit conversion table used by assignment, returns and overload
//!   resolution
//! - Abstract integers, the type of integer literals whose width is chosen
//!   by the context that consumes them
//! - Classification of explicit casts

pub mod abstract_int;
pub mod casts;
pub mod conversions;
pub mod types;

#[cfg(test)]
mod tests;
