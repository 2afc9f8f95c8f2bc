use std::collections::BTreeMap;

use super::{
    stringpool::StringPool,
    symbol_table::{Symbol, SymbolTable},
};

/// Name of the pseudo-function whose table holds the global variables.
pub const GLOBAL_SCOPE: &str = "_GLOBAL";

/// Everything the code generator needs to know about a program once it has
/// passed semantic analysis: every function's declaration record, the size of
/// every function's local frame, and the string literal pool.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SemanticInfo {
    tables: BTreeMap<String, SymbolTable>,
    local_sizes: BTreeMap<String, u32>,
    strings: StringPool,
}

impl SemanticInfo {
    pub fn new(globals: SymbolTable, strings: StringPool) -> SemanticInfo {
        let mut tables = BTreeMap::new();
        tables.insert(GLOBAL_SCOPE.into(), globals);
        SemanticInfo {
            tables,
            local_sizes: BTreeMap::new(),
            strings,
        }
    }

    pub fn add_function(&mut self, name: &str, table: SymbolTable, local_size: u32) {
        self.tables.insert(name.into(), table);
        self.local_sizes.insert(name.into(), local_size);
    }

    pub fn globals(&self) -> Option<&SymbolTable> {
        self.tables.get(GLOBAL_SCOPE)
    }

    /// The parameters and locals of a function in declaration order.
    pub fn symbol_table(&self, func: &str) -> Option<&SymbolTable> {
        self.tables.get(func)
    }

    /// Resolves a name as seen from the top of a function body: the function's
    /// own declarations first, then the globals.
    pub fn get_symbol(&self, func: &str, name: &str) -> Option<&Symbol> {
        self.tables
            .get(func)
            .and_then(|t| t.get(name))
            .or_else(|| self.globals().and_then(|g| g.get(name)))
    }

    pub fn local_size(&self, func: &str) -> Option<u32> {
        self.local_sizes.get(func).copied()
    }

    pub fn strings(&self) -> &StringPool {
        &self.strings
    }
}
