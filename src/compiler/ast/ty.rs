use serde::{Deserialize, Serialize};

/// The primitive types a mini-C value can be built from.  `Short` and `Char`
/// occupy one machine word just like `Int`; the distinction only matters for
/// type compatibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseType {
    Void,
    Int,
    Short,
    Char,
}

impl std::fmt::Display for BaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaseType::Void => f.write_str("void"),
            BaseType::Int => f.write_str("int"),
            BaseType::Short => f.write_str("short"),
            BaseType::Char => f.write_str("char"),
        }
    }
}

/**
The type of a declaration or an expression: a base type, some levels of
pointer indirection, and an optional array extent.

An array of `T` behaves like a pointer to `T` wherever types are compared,
so the *effective* pointer depth of an array is one more than its declared
pointer depth.
 */
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSpec {
    pub base: BaseType,
    #[serde(default)]
    pub pointer_depth: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_size: Option<u32>,
}

impl TypeSpec {
    pub fn new(base: BaseType, pointer_depth: u32, array_size: Option<u32>) -> TypeSpec {
        TypeSpec {
            base,
            pointer_depth,
            array_size,
        }
    }

    pub fn scalar(base: BaseType) -> TypeSpec {
        TypeSpec::new(base, 0, None)
    }

    pub fn int() -> TypeSpec {
        TypeSpec::scalar(BaseType::Int)
    }

    pub fn void() -> TypeSpec {
        TypeSpec::scalar(BaseType::Void)
    }

    pub fn pointer(base: BaseType, depth: u32) -> TypeSpec {
        TypeSpec::new(base, depth, None)
    }

    pub fn array(base: BaseType, size: u32) -> TypeSpec {
        TypeSpec::new(base, 0, Some(size))
    }

    pub fn is_array(&self) -> bool {
        self.array_size.is_some()
    }

    pub fn is_void(&self) -> bool {
        self.base == BaseType::Void && self.effective_pointer_depth() == 0
    }

    pub fn effective_pointer_depth(&self) -> u32 {
        self.pointer_depth + if self.is_array() { 1 } else { 0 }
    }

    /// Two types are compatible when they share a base type and the same
    /// effective pointer depth.  This means `int[4]` and `int*` are compatible.
    pub fn is_compatible(&self, other: &TypeSpec) -> bool {
        self.base == other.base
            && self.effective_pointer_depth() == other.effective_pointer_depth()
    }

    pub fn is_simple_int(&self) -> bool {
        self.base == BaseType::Int && self.effective_pointer_depth() == 0
    }

    /// The type of `&x` where `x` has this type.
    pub fn address_type(&self) -> TypeSpec {
        TypeSpec::new(self.base, self.effective_pointer_depth() + 1, None)
    }

    /// The type of `*x` where `x` has this type.  Dereferencing a type with no
    /// indirection yields the base type; callers check validity first.
    pub fn deref_type(&self) -> TypeSpec {
        TypeSpec::new(
            self.base,
            self.effective_pointer_depth().saturating_sub(1),
            None,
        )
    }

    /// An array passed as a parameter is a pointer to its first element.
    /// Other types are unchanged.
    pub fn decay(&self) -> TypeSpec {
        TypeSpec::new(self.base, self.effective_pointer_depth(), None)
    }

    /// Number of machine words a variable of this type occupies.
    pub fn size(&self) -> u32 {
        self.array_size.unwrap_or(1)
    }
}

impl std::fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}", self.base))?;
        for _ in 0..self.pointer_depth {
            f.write_str("*")?;
        }
        if let Some(sz) = self.array_size {
            f.write_fmt(format_args!("[{}]", sz))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatibility() {
        for (l, r, expected) in vec![
            (TypeSpec::int(), TypeSpec::int(), true),
            (TypeSpec::int(), TypeSpec::scalar(BaseType::Char), false),
            (TypeSpec::array(BaseType::Int, 4), TypeSpec::pointer(BaseType::Int, 1), true),
            (TypeSpec::array(BaseType::Int, 4), TypeSpec::array(BaseType::Int, 9), true),
            (TypeSpec::pointer(BaseType::Int, 2), TypeSpec::pointer(BaseType::Int, 1), false),
            (TypeSpec::pointer(BaseType::Char, 1), TypeSpec::pointer(BaseType::Int, 1), false),
            (TypeSpec::void(), TypeSpec::void(), true),
        ] {
            assert_eq!(l.is_compatible(&r), expected, "{} ~ {}", l, r);
            assert_eq!(r.is_compatible(&l), expected, "{} ~ {}", r, l);
            assert!(l.is_compatible(&l));
        }
    }

    #[test]
    fn decay() {
        for (ty, expected) in vec![
            (TypeSpec::array(BaseType::Int, 4), TypeSpec::pointer(BaseType::Int, 1)),
            (
                TypeSpec::new(BaseType::Char, 1, Some(8)),
                TypeSpec::pointer(BaseType::Char, 2),
            ),
            (TypeSpec::pointer(BaseType::Int, 1), TypeSpec::pointer(BaseType::Int, 1)),
            (TypeSpec::int(), TypeSpec::int()),
        ] {
            assert_eq!(ty.decay(), expected, "{}", ty);
            assert_eq!(ty.decay().size(), 1);
        }
    }

    #[test]
    fn simple_int() {
        for (ty, expected) in vec![
            (TypeSpec::int(), true),
            (TypeSpec::pointer(BaseType::Int, 1), false),
            (TypeSpec::array(BaseType::Int, 3), false),
            (TypeSpec::scalar(BaseType::Short), false),
            (TypeSpec::void(), false),
        ] {
            assert_eq!(ty.is_simple_int(), expected, "{}", ty);
        }
    }

    #[test]
    fn address_and_deref() {
        let arr = TypeSpec::array(BaseType::Char, 16);
        assert_eq!(arr.address_type(), TypeSpec::pointer(BaseType::Char, 2));
        assert_eq!(arr.deref_type(), TypeSpec::scalar(BaseType::Char));

        let pp = TypeSpec::pointer(BaseType::Int, 2);
        assert_eq!(pp.deref_type(), TypeSpec::pointer(BaseType::Int, 1));
        assert_eq!(pp.address_type(), TypeSpec::pointer(BaseType::Int, 3));

        // Saturates rather than underflowing
        assert_eq!(TypeSpec::int().deref_type(), TypeSpec::int());
    }

    #[test]
    fn sizes() {
        assert_eq!(TypeSpec::int().size(), 1);
        assert_eq!(TypeSpec::pointer(BaseType::Int, 3).size(), 1);
        assert_eq!(TypeSpec::array(BaseType::Int, 256).size(), 256);
        assert_eq!(TypeSpec::new(BaseType::Int, 1, Some(4)).effective_pointer_depth(), 2);
    }

    #[test]
    fn display() {
        for (ty, expected) in vec![
            (TypeSpec::int(), "int"),
            (TypeSpec::pointer(BaseType::Char, 2), "char**"),
            (TypeSpec::array(BaseType::Short, 8), "short[8]"),
        ] {
            assert_eq!(ty.to_string(), expected);
        }
    }
}
