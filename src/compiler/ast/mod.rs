//! The program tree handed over by the front-end.  Nodes are plain owned data
//! and are never mutated by the analyzer or the code generator.  Every type
//! derives `serde` so that a tree can be read from JSON or YAML.
mod expression;
mod program;
mod statement;
mod ty;

pub use self::expression::{BinaryOperator, Expression, UnaryOperator};
pub use self::program::{FunctionDecl, GlobalDecl, Param, Program};
pub use self::statement::{Assign, Block, ForInit, LValue, Statement, VarDecl};
pub use self::ty::{BaseType, TypeSpec};
