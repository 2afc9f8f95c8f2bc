/*
 * Handles semantic analysis of a program tree.  This includes:
 * 1. Resolving every identifier to a declaration through a stack of lexical scopes.
 * 2. Type checking: determining the type of every expression and making sure that
 *    the types match the mini-C typing rules.
 * 3. Laying out the stack frame of every function and collecting the string literals.
 *
 * The output is a `SemanticInfo` which the code generator consumes alongside the
 * unmodified program tree.
 */
mod error;
mod stack;
mod tests;

pub mod semantic_info;
pub mod stringpool;
pub mod symbol_table;
pub mod type_checker;

pub use error::{Mismatch, SemanticError};
pub use semantic_info::{SemanticInfo, GLOBAL_SCOPE};
pub use stack::ScopeStack;
pub use type_checker::{analyze, SemanticAnalyzer};

use super::CompilerError;

/// Captures the Failure state of any Semantic Analysis operation.
/// Which will, if it fails, result in a [`SemanticError`] wrapped
/// in a [`CompilerError`]
pub type SemanticResult<T> = Result<T, CompilerError<SemanticError>>;
