use crate::compiler::ast::{BinaryOperator, TypeSpec};

/// The position within the program at which two types failed to agree.
#[derive(Clone, Debug, PartialEq)]
pub enum Mismatch {
    Initializer,
    Assignment,
    Return,
    Comparison,
    Binary(BinaryOperator),
    Condition,
    Operand,
    Index,
}

/// Errors generated during semantic analysis of a program.
#[derive(Clone, Debug, PartialEq)]
pub enum SemanticError {
    DuplicateFunction(String),
    Redeclaration(String),
    UndeclaredIdentifier(String),
    UndeclaredFunction(String),
    /// The types that disagreed: the expected (or left) type then the found
    /// (or right) type.
    TypeMismatch(Mismatch, TypeSpec, TypeSpec),
    MissingReturnValue(String),
    VoidReturnWithValue(String),
    InvalidDereference(TypeSpec),
    NotAnArray(String),
    ArgumentCountMismatch(String, usize, usize),
    ArgumentTypeMismatch(String, usize, TypeSpec, TypeSpec),
    IllegalMacroOperation(String),
    UnsupportedOperator(BinaryOperator),
    /// A global or function whose assembly label is already taken: the name
    /// and the label it maps to.
    LabelCollision(String, String),
    LiteralOutOfRange(i32),
    UnencodableCharacter(char),
}

impl std::fmt::Display for SemanticError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use SemanticError::*;
        match self {
            DuplicateFunction(name) => {
                f.write_fmt(format_args!("function {} is defined more than once", name))
            }
            Redeclaration(name) => {
                f.write_fmt(format_args!("{} is already declared in this scope", name))
            }
            UndeclaredIdentifier(name) => {
                f.write_fmt(format_args!("undeclared identifier {}", name))
            }
            UndeclaredFunction(name) => {
                f.write_fmt(format_args!("call to undeclared function {}", name))
            }
            TypeMismatch(ctx, expected, found) => match ctx {
                Mismatch::Initializer => f.write_fmt(format_args!(
                    "initializer of type {} does not match declared type {}",
                    found, expected
                )),
                Mismatch::Assignment => f.write_fmt(format_args!(
                    "cannot assign a value of type {} to {}",
                    found, expected
                )),
                Mismatch::Return => f.write_fmt(format_args!(
                    "return value of type {} does not match return type {}",
                    found, expected
                )),
                Mismatch::Comparison => f.write_fmt(format_args!(
                    "cannot compare {} with {}",
                    expected, found
                )),
                Mismatch::Binary(op) => f.write_fmt(format_args!(
                    "{} cannot be applied to {} and {}",
                    op, expected, found
                )),
                Mismatch::Condition => f.write_fmt(format_args!(
                    "condition must be {} but found {}",
                    expected, found
                )),
                Mismatch::Operand => f.write_fmt(format_args!(
                    "operand must be {} but found {}",
                    expected, found
                )),
                Mismatch::Index => f.write_fmt(format_args!(
                    "array index must be {} but found {}",
                    expected, found
                )),
            },
            MissingReturnValue(func) => f.write_fmt(format_args!(
                "missing return value in non-void function {}",
                func
            )),
            VoidReturnWithValue(func) => f.write_fmt(format_args!(
                "void function {} cannot return a value",
                func
            )),
            InvalidDereference(ty) => {
                f.write_fmt(format_args!("cannot dereference non-pointer type {}", ty))
            }
            NotAnArray(name) => {
                f.write_fmt(format_args!("{} is neither an array nor a pointer", name))
            }
            ArgumentCountMismatch(func, expected, got) => f.write_fmt(format_args!(
                "{} expects {} arguments but got {}",
                func, expected, got
            )),
            ArgumentTypeMismatch(func, idx, expected, got) => f.write_fmt(format_args!(
                "argument {} of {} expects {} but got {}",
                idx + 1,
                func,
                expected,
                got
            )),
            IllegalMacroOperation(op) => f.write_fmt(format_args!("illegal macro '{}'", op)),
            UnsupportedOperator(op) => f.write_fmt(format_args!(
                "operator {} is not supported by the target machine",
                op
            )),
            LabelCollision(name, label) => f.write_fmt(format_args!(
                "{} is emitted as label {}, which is already in use",
                name, label
            )),
            LiteralOutOfRange(n) => {
                f.write_fmt(format_args!("integer literal {} does not fit in a word", n))
            }
            UnencodableCharacter(c) => f.write_fmt(format_args!(
                "character {:?} cannot be stored in a word",
                c
            )),
        }
    }
}
