use serde::{Deserialize, Serialize};

use super::ty::TypeSpec;

/// An expression in the program tree.  Every expression leaves its value in
/// the accumulator once it has been lowered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    /// Integer and character literals both arrive as integers.
    IntLit {
        value: i32,
    },
    StringLit {
        value: String,
    },
    Var {
        name: String,
    },
    Binary {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
    AddressOf {
        name: String,
    },
    Deref {
        operand: Box<Expression>,
    },
    Cast {
        ty: TypeSpec,
        operand: Box<Expression>,
    },
    ArrayElem {
        name: String,
        index: Box<Expression>,
    },
    Call {
        name: String,
        #[serde(default)]
        args: Vec<Expression>,
    },
}

impl Expression {
    pub fn int(value: i32) -> Expression {
        Expression::IntLit { value }
    }

    pub fn string(value: &str) -> Expression {
        Expression::StringLit {
            value: value.into(),
        }
    }

    pub fn var(name: &str) -> Expression {
        Expression::Var { name: name.into() }
    }

    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Expression {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOperator, operand: Expression) -> Expression {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn address_of(name: &str) -> Expression {
        Expression::AddressOf { name: name.into() }
    }

    pub fn deref(operand: Expression) -> Expression {
        Expression::Deref {
            operand: Box::new(operand),
        }
    }

    pub fn cast(ty: TypeSpec, operand: Expression) -> Expression {
        Expression::Cast {
            ty,
            operand: Box::new(operand),
        }
    }

    pub fn array_elem(name: &str, index: Expression) -> Expression {
        Expression::ArrayElem {
            name: name.into(),
            index: Box::new(index),
        }
    }

    pub fn call(name: &str, args: Vec<Expression>) -> Expression {
        Expression::Call {
            name: name.into(),
            args,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    BAnd,
    BOr,
    Eq,
    NEq,
    Ls,
    LsEq,
    Gr,
    GrEq,
}

impl BinaryOperator {
    pub fn is_comparison(&self) -> bool {
        use BinaryOperator::*;
        matches!(self, Eq | NEq | Ls | LsEq | Gr | GrEq)
    }
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        use BinaryOperator::*;
        match self {
            Add => f.write_str("+"),
            Sub => f.write_str("-"),
            Mul => f.write_str("*"),
            Div => f.write_str("/"),
            BAnd => f.write_str("&&"),
            BOr => f.write_str("||"),
            Eq => f.write_str("=="),
            NEq => f.write_str("!="),
            Ls => f.write_str("<"),
            LsEq => f.write_str("<="),
            Gr => f.write_str(">"),
            GrEq => f.write_str(">="),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOperator {
    Negate,
    Not,
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        match self {
            UnaryOperator::Negate => f.write_str("-"),
            UnaryOperator::Not => f.write_str("!"),
        }
    }
}
