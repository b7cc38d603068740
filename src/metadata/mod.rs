//! Binary metadata for separate compilation.
//!
//! A compiled unit exports its structs, public functions and public
//! globals as a blob of fixed-size record tables plus a type-reference
//! byte stream and a name blob. A dependent unit imports the blob as
//! external declarations before its own passes run, without any source.
//!
//! Declarations are matched across units by full name only; every import
//! hands out fresh declaration ids.

pub mod deserializer;
pub mod format;
pub mod serializer;

#[cfg(test)]
mod tests;
