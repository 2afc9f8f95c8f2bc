use std::collections::BTreeSet;

/// The set of distinct string literals used by a program.  Iteration is in
/// sorted order so that literal labels are deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StringPool {
    pool: BTreeSet<String>,
}

impl StringPool {
    pub fn new() -> StringPool {
        StringPool {
            pool: BTreeSet::new(),
        }
    }

    /// If the given string is not in the string pool, this will insert it.
    pub fn insert(&mut self, s: &str) {
        if !self.pool.contains(s) {
            self.pool.insert(s.into());
        }
    }

    pub fn iter(&self) -> std::collections::btree_set::Iter<'_, String> {
        self.pool.iter()
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduplicated_and_sorted() {
        let mut sp = StringPool::new();
        for s in vec!["world", "hello", "world", ""] {
            sp.insert(s);
        }
        assert_eq!(sp.len(), 3);
        let all: Vec<_> = sp.iter().map(|s| s.as_str()).collect();
        assert_eq!(all, vec!["", "hello", "world"]);
    }
}
