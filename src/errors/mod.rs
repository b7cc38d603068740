//! Error types and error handling for the compiler.
//!
//! Every fallible stage returns `Result<_, Error>` and the first error aborts
//! the whole compilation. Errors fall into the categories described by
//! [`errors::ErrorCategory`]:
//!
//! - Syntax errors raised by the lexer and parser
//! - Semantic errors (unknown names, privacy, type mismatches, missing returns)
//! - Overload errors (no candidate, ambiguous candidates)
//! - Template errors (arity, argument kind)
//! - Metadata errors (version mismatch, corrupt blobs, unknown tags)
//! - Attribute errors (malformed or conflicting modifiers)
//! - Backend errors reported by LLVM or the filesystem

pub mod errors;

#[cfg(test)]
mod tests;
