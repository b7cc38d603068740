/// AST (Abstract Syntax Tree) module
/// Contains the syntax tree the parser produces and the compiler consumes
///
/// Every node kind is a closed enum, so the compiler matches exhaustively
/// over definitions, statements, expressions and type references.
pub mod ast;
