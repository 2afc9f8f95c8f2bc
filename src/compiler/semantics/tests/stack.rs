#[cfg(test)]
mod stack_tests {
    use crate::compiler::{
        ast::{BaseType, TypeSpec},
        semantics::{
            symbol_table::{StorageClass, Symbol},
            ScopeStack, SemanticError,
        },
    };

    fn local(name: &str, offset: u32) -> Symbol {
        Symbol::new(name, TypeSpec::int(), StorageClass::Local, offset)
    }

    #[test]
    fn lookup_walks_outwards() {
        let mut stack = ScopeStack::new();
        stack
            .declare(Symbol::global("g", TypeSpec::array(BaseType::Int, 4)))
            .unwrap();
        stack.enter_scope();
        stack.declare(local("x", 1)).unwrap();
        stack.enter_scope();

        assert_eq!(stack.lookup("x").unwrap().offset, 1);
        assert_eq!(stack.lookup("g").unwrap().storage, StorageClass::Global);
        assert_eq!(
            stack.lookup("y"),
            Err(SemanticError::UndeclaredIdentifier("y".into()))
        );
    }

    #[test]
    fn inner_scope_shadows() {
        let mut stack = ScopeStack::new();
        stack.enter_scope();
        stack.declare(local("x", 1)).unwrap();
        stack.enter_scope();
        stack.declare(local("x", 2)).unwrap();
        assert_eq!(stack.lookup("x").unwrap().offset, 2);

        let inner = stack.exit_scope().unwrap();
        assert_eq!(inner.len(), 1);
        assert_eq!(stack.lookup("x").unwrap().offset, 1);
    }

    #[test]
    fn redeclaration_in_same_scope() {
        let mut stack = ScopeStack::new();
        stack.enter_scope();
        stack.declare(local("x", 1)).unwrap();
        assert_eq!(
            stack.declare(local("x", 2)),
            Err(SemanticError::Redeclaration("x".into()))
        );
    }

    #[test]
    fn global_scope_is_never_popped() {
        let mut stack = ScopeStack::new();
        stack.declare(Symbol::global("g", TypeSpec::int())).unwrap();
        stack.enter_scope();
        assert_eq!(stack.depth(), 2);
        assert!(stack.exit_scope().is_some());
        assert!(stack.exit_scope().is_none());
        assert_eq!(stack.depth(), 1);
        assert!(stack.lookup("g").is_ok());
        assert_eq!(stack.globals().len(), 1);
    }
}
