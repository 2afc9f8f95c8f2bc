use log::trace;

use crate::compiler::ast::TypeSpec;

use super::SemanticError;

/// Where a variable lives at run time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageClass {
    /// Addressed by its own label in the data section.
    Global,
    /// Addressed above the frame pointer.
    Param,
    /// Addressed below the frame pointer.
    Local,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub ty: TypeSpec,
    pub storage: StorageClass,
    /// Globals: always 0. Params: 1, 2, 3, ... in declaration order.
    /// Locals: the running frame size after this local was added.
    pub offset: u32,
}

impl Symbol {
    pub fn new(name: &str, ty: TypeSpec, storage: StorageClass, offset: u32) -> Symbol {
        Symbol {
            name: name.into(),
            ty,
            storage,
            offset,
        }
    }

    pub fn global(name: &str, ty: TypeSpec) -> Symbol {
        Symbol::new(name, ty, StorageClass::Global, 0)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "{} | {} | {:?} | {}",
            self.name, self.ty, self.storage, self.offset
        ))
    }
}

/**
 `SymbolTable` is an ordered list of symbols.

 Used as a scope, names are unique (see [`SymbolTable::add`]).  Used as the
 declaration record of a function, every parameter and local is appended in
 declaration order with [`SymbolTable::record`], so a name shadowed in an inner
 block appears more than once.
*/
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SymbolTable {
    sym: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable { sym: vec![] }
    }

    pub fn add(&mut self, symbol: Symbol) -> Result<(), SemanticError> {
        if self.get(&symbol.name).is_some() {
            return Err(SemanticError::Redeclaration(symbol.name));
        }
        self.record(symbol);
        Ok(())
    }

    pub fn record(&mut self, symbol: Symbol) {
        trace!("Adding symbol {}", symbol);
        self.sym.push(symbol);
    }

    /// Returns the first symbol with the given name.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.sym.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Symbol> {
        self.sym.iter()
    }

    pub fn len(&self) -> usize {
        self.sym.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sym.is_empty()
    }
}

impl std::fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for s in &self.sym {
            f.write_fmt(format_args!("{}\n", s))?;
        }
        Ok(())
    }
}

/// Assigns frame offsets to the parameters and locals of one function.
///
/// Locals accumulate in declaration order regardless of block nesting: a
/// variable's offset is the running total *after* its own size is added, so
/// the frame size is the final running total.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameLayout {
    params: u32,
    locals: u32,
}

impl FrameLayout {
    pub fn new() -> FrameLayout {
        FrameLayout {
            params: 0,
            locals: 0,
        }
    }

    pub fn next_param(&mut self) -> u32 {
        self.params += 1;
        self.params
    }

    pub fn next_local(&mut self, ty: &TypeSpec) -> u32 {
        self.locals += ty.size();
        self.locals
    }

    pub fn local_size(&self) -> u32 {
        self.locals
    }
}
