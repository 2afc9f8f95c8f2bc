use serde::{Deserialize, Serialize};

use crate::compiler::Location;

use super::{statement::Block, ty::TypeSpec};

/// The root of a program tree: the global variable declarations followed by the
/// function definitions, each in source order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub globals: Vec<GlobalDecl>,
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
}

impl Program {
    pub fn new(globals: Vec<GlobalDecl>, functions: Vec<FunctionDecl>) -> Program {
        Program { globals, functions }
    }

    pub fn get_function(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions.iter().find(|f| f.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlobalDecl {
    pub ty: TypeSpec,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Location>,
}

impl GlobalDecl {
    pub fn new(ty: TypeSpec, name: &str) -> GlobalDecl {
        GlobalDecl {
            ty,
            name: name.into(),
            loc: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub ty: TypeSpec,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Location>,
}

impl Param {
    pub fn new(ty: TypeSpec, name: &str) -> Param {
        Param {
            ty,
            name: name.into(),
            loc: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub return_ty: TypeSpec,
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    pub body: Block,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Location>,
}

impl FunctionDecl {
    pub fn new(return_ty: TypeSpec, name: &str, params: Vec<Param>, body: Block) -> FunctionDecl {
        FunctionDecl {
            return_ty,
            name: name.into(),
            params,
            body,
            loc: None,
        }
    }
}
