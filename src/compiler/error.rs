use serde::{Deserialize, Serialize};

/// The position in the source program that a node of the program tree was built
/// from. The front-end fills this in; the core only carries it through to
/// error messages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub line: u32,
}

impl Location {
    pub fn new(line: u32) -> Location {
        Location { file: None, line }
    }

    pub fn in_file(file: &str, line: u32) -> Location {
        Location {
            file: Some(file.into()),
            line,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => f.write_fmt(format_args!("{}:{}", file, self.line)),
            None => f.write_fmt(format_args!("line {}", self.line)),
        }
    }
}

/// Represents all errors that are generated from within the Compiler
/// module and its submodules which are caused by the input program.
///
/// This type captures common metadata which is present for all errors
/// which are caused by input source code.  E.g. the line # that the error
/// occurs on. This also handles formatting all error messages with the
/// universal metadata along with the inner metadata.
///
/// The inner error allows metadata which is specific to a submodule within
/// the compiler. E.g., the errors themselves are submodule specific and
/// are stored in the `inner` field.
#[derive(Clone, Debug, PartialEq)]
pub struct CompilerError<IE: std::fmt::Display> {
    loc: Option<Location>,
    inner: IE,
}

impl<IE> CompilerError<IE>
where
    IE: std::fmt::Display,
{
    pub fn new(loc: Option<Location>, inner: IE) -> Self {
        CompilerError { loc, inner }
    }

    pub fn inner(self) -> IE {
        self.inner
    }

    pub fn loc(&self) -> Option<&Location> {
        self.loc.as_ref()
    }
}

impl<IE> std::fmt::Display for CompilerError<IE>
where
    IE: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.loc {
            Some(loc) => f.write_fmt(format_args!("{}: {}", loc, self.inner)),
            None => f.write_fmt(format_args!("{}", self.inner)),
        }
    }
}

impl<IE> std::error::Error for CompilerError<IE> where IE: std::fmt::Display + std::fmt::Debug {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_includes_location() {
        for (loc, expected) in vec![
            (Some(Location::new(7)), "line 7: bad"),
            (Some(Location::in_file("fib.c", 3)), "fib.c:3: bad"),
            (None, "bad"),
        ] {
            let err = CompilerError::new(loc, "bad".to_string());
            assert_eq!(err.to_string(), expected);
        }
    }
}
