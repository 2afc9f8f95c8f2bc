use log::trace;

use super::{
    symbol_table::{Symbol, SymbolTable},
    SemanticError,
};

/// A stack of lexical scopes.  The bottom scope is the global scope and is
/// never popped; lookups walk from the innermost scope outwards.
#[derive(Clone, Debug, PartialEq)]
pub struct ScopeStack {
    stack: Vec<SymbolTable>,
}

impl std::fmt::Display for ScopeStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, scope) in self.stack.iter().rev().enumerate() {
            f.write_fmt(format_args!("{}: {}\n", i, scope))?;
        }
        Ok(())
    }
}

impl ScopeStack {
    pub fn new() -> ScopeStack {
        ScopeStack {
            stack: vec![SymbolTable::new()],
        }
    }

    pub fn enter_scope(&mut self) {
        trace!("Enter scope {}", self.stack.len());
        self.stack.push(SymbolTable::new());
    }

    /// Pops the innermost scope.  Returns `None` when only the global scope
    /// remains.
    pub fn exit_scope(&mut self) -> Option<SymbolTable> {
        if self.stack.len() > 1 {
            trace!("Exit scope {}", self.stack.len() - 1);
            self.stack.pop()
        } else {
            None
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Adds a symbol to the innermost scope.
    pub fn declare(&mut self, symbol: Symbol) -> Result<(), SemanticError> {
        match self.stack.last_mut() {
            Some(scope) => scope.add(symbol),
            None => Err(SemanticError::Redeclaration(symbol.name)),
        }
    }

    pub fn lookup(&self, name: &str) -> Result<&Symbol, SemanticError> {
        self.stack
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .ok_or_else(|| SemanticError::UndeclaredIdentifier(name.into()))
    }

    /// The global scope at the bottom of the stack.
    pub fn globals(&self) -> &SymbolTable {
        &self.stack[0]
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        ScopeStack::new()
    }
}
