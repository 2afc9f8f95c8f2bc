use serde::{Deserialize, Serialize};

use crate::compiler::Location;

use super::{expression::Expression, ty::TypeSpec};

/// A brace delimited sequence of statements.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub statements: Vec<Statement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Location>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Block {
        Block {
            statements,
            loc: None,
        }
    }

    /// Returns true if the final statement of this block is a `return`.
    pub fn ends_with_return(&self) -> bool {
        matches!(self.statements.last(), Some(Statement::Return { .. }))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    VarDecl(VarDecl),
    Assign(Assign),
    Return {
        #[serde(default)]
        value: Option<Expression>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        loc: Option<Location>,
    },
    If {
        cond: Expression,
        then_block: Block,
        #[serde(default)]
        else_block: Option<Block>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        loc: Option<Location>,
    },
    While {
        cond: Expression,
        body: Block,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        loc: Option<Location>,
    },
    For {
        #[serde(default)]
        init: Option<ForInit>,
        #[serde(default)]
        cond: Option<Expression>,
        #[serde(default)]
        update: Option<Assign>,
        body: Block,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        loc: Option<Location>,
    },
    Block(Block),
    /// A builtin I/O macro such as `_in()` or `_out()`.
    Macro {
        op: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        loc: Option<Location>,
    },
    Expr {
        expr: Expression,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        loc: Option<Location>,
    },
}

impl Statement {
    pub fn loc(&self) -> Option<&Location> {
        match self {
            Statement::VarDecl(decl) => decl.loc.as_ref(),
            Statement::Assign(assign) => assign.loc.as_ref(),
            Statement::Block(block) => block.loc.as_ref(),
            Statement::Return { loc, .. }
            | Statement::If { loc, .. }
            | Statement::While { loc, .. }
            | Statement::For { loc, .. }
            | Statement::Macro { loc, .. }
            | Statement::Expr { loc, .. } => loc.as_ref(),
        }
    }

    pub fn ret(value: Option<Expression>) -> Statement {
        Statement::Return { value, loc: None }
    }

    pub fn if_else(cond: Expression, then_block: Block, else_block: Option<Block>) -> Statement {
        Statement::If {
            cond,
            then_block,
            else_block,
            loc: None,
        }
    }

    pub fn while_loop(cond: Expression, body: Block) -> Statement {
        Statement::While {
            cond,
            body,
            loc: None,
        }
    }

    pub fn for_loop(
        init: Option<ForInit>,
        cond: Option<Expression>,
        update: Option<Assign>,
        body: Block,
    ) -> Statement {
        Statement::For {
            init,
            cond,
            update,
            body,
            loc: None,
        }
    }

    pub fn macro_op(op: &str) -> Statement {
        Statement::Macro {
            op: op.into(),
            loc: None,
        }
    }

    pub fn expr(expr: Expression) -> Statement {
        Statement::Expr { expr, loc: None }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub ty: TypeSpec,
    pub name: String,
    #[serde(default)]
    pub init: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Location>,
}

impl VarDecl {
    pub fn new(ty: TypeSpec, name: &str, init: Option<Expression>) -> VarDecl {
        VarDecl {
            ty,
            name: name.into(),
            init,
            loc: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assign {
    pub target: LValue,
    pub value: Expression,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Location>,
}

impl Assign {
    pub fn new(target: LValue, value: Expression) -> Assign {
        Assign {
            target,
            value,
            loc: None,
        }
    }
}

/// The initializer clause of a `for` header.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForInit {
    Decl(VarDecl),
    Assign(Assign),
}

/// The target of an assignment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LValue {
    Var { name: String },
    ArrayElem { name: String, index: Box<Expression> },
    Deref { target: Box<Expression> },
}

impl LValue {
    pub fn var(name: &str) -> LValue {
        LValue::Var { name: name.into() }
    }

    pub fn array_elem(name: &str, index: Expression) -> LValue {
        LValue::ArrayElem {
            name: name.into(),
            index: Box::new(index),
        }
    }

    pub fn deref(target: Expression) -> LValue {
        LValue::Deref {
            target: Box::new(target),
        }
    }
}
