use log::trace;

use super::assembly::MAX_LABEL_LEN;

/// Label of the start up code which sets up the stack and calls `MAIN`.
pub const ENTRY_LABEL: &str = "ENTRY";
/// Label of the reserved stack area.
pub const STACK_LABEL: &str = "STACK";

pub const CMP_TRUE: &str = "CT";
pub const CMP_END: &str = "CE";
pub const LOGIC_SHORT: &str = "LG";
pub const LOGIC_END: &str = "LX";
pub const IF_ELSE: &str = "IE";
pub const IF_END: &str = "IX";
pub const WHILE_START: &str = "WS";
pub const WHILE_END: &str = "WX";
pub const FOR_START: &str = "FS";
pub const FOR_END: &str = "FX";
pub const STRING_LITERAL: &str = "SL";

/// Every prefix the code generator draws labels from.
pub const GENERATED_PREFIXES: [&str; 11] = [
    CMP_TRUE,
    CMP_END,
    LOGIC_SHORT,
    LOGIC_END,
    IF_ELSE,
    IF_END,
    WHILE_START,
    WHILE_END,
    FOR_START,
    FOR_END,
    STRING_LITERAL,
];

/// The label a user defined function or global is emitted under.
pub fn symbol_label(name: &str) -> String {
    name.chars()
        .take(MAX_LABEL_LEN)
        .collect::<String>()
        .to_uppercase()
}

/// True if `label` could be handed out by a generator using one of the
/// [`GENERATED_PREFIXES`].
pub fn is_generated_label(label: &str) -> bool {
    label.len() == MAX_LABEL_LEN
        && GENERATED_PREFIXES.iter().any(|prefix| {
            label
                .strip_prefix(prefix)
                .map_or(false, |id| id.chars().all(|c| c.is_ascii_digit()))
        })
}

/// Failures when creating or drawing from a [`LabelGenerator`].
#[derive(Clone, Debug, PartialEq)]
pub enum LabelError {
    InvalidLabelPrefix(String),
    LabelSpaceExhausted { description: String, limit: u32 },
}

impl std::fmt::Display for LabelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelError::InvalidLabelPrefix(prefix) => f.write_fmt(format_args!(
                "'{}' is too long for a label prefix",
                prefix
            )),
            LabelError::LabelSpaceExhausted { description, limit } => f.write_fmt(format_args!(
                "the number of labels for {} exceeds the limit of {}",
                description, limit
            )),
        }
    }
}

/// Hands out unique labels of exactly eight characters: a fixed prefix
/// followed by a zero padded counter that starts at 1.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelGenerator {
    prefix: String,
    description: String,
    width: usize,
    limit: u32,
    id: u32,
}

impl LabelGenerator {
    pub fn new(prefix: &str, description: &str) -> Result<LabelGenerator, LabelError> {
        if prefix.is_empty() || prefix.len() >= MAX_LABEL_LEN {
            return Err(LabelError::InvalidLabelPrefix(prefix.into()));
        }
        let width = MAX_LABEL_LEN - prefix.len();
        Ok(LabelGenerator {
            prefix: prefix.into(),
            description: description.into(),
            width,
            limit: 10u32.pow(width as u32),
            id: 0,
        })
    }

    pub fn next(&mut self) -> Result<String, LabelError> {
        self.id += 1;
        if self.id >= self.limit {
            return Err(LabelError::LabelSpaceExhausted {
                description: self.description.clone(),
                limit: self.limit - 1,
            });
        }
        let label = format!("{}{:0width$}", self.prefix, self.id, width = self.width);
        trace!("New {} label {}", self.description, label);
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_eight_characters() {
        let mut lg = LabelGenerator::new("CT", "comparison").unwrap();
        assert_eq!(lg.next().unwrap(), "CT000001");
        assert_eq!(lg.next().unwrap(), "CT000002");

        let mut lg = LabelGenerator::new("X", "test").unwrap();
        assert_eq!(lg.next().unwrap(), "X0000001");
    }

    #[test]
    fn invalid_prefix() {
        for prefix in vec!["", "ABCDEFGH", "TOOLONGPREFIX"] {
            assert_eq!(
                LabelGenerator::new(prefix, "test"),
                Err(LabelError::InvalidLabelPrefix(prefix.into()))
            );
        }
        assert!(LabelGenerator::new("ABCDEFG", "test").is_ok());
    }

    #[test]
    fn exhaustion() {
        let mut lg = LabelGenerator::new("ABCDEF", "loop").unwrap();
        let mut seen = std::collections::HashSet::new();
        for _ in 1..100 {
            let label = lg.next().unwrap();
            assert_eq!(label.len(), 8);
            assert!(seen.insert(label));
        }
        assert_eq!(seen.len(), 99);
        assert!(seen.contains("ABCDEF99"));
        assert_eq!(
            lg.next(),
            Err(LabelError::LabelSpaceExhausted {
                description: "loop".into(),
                limit: 99
            })
        );
    }

    #[test]
    fn symbol_labels() {
        for (name, expected) in vec![
            ("main", "MAIN"),
            ("counter_a", "COUNTER_"),
            ("Buf", "BUF"),
        ] {
            assert_eq!(symbol_label(name), expected);
        }
    }

    #[test]
    fn generated_label_shape() {
        for (label, expected) in vec![
            ("CT000001", true),
            ("SL123456", true),
            ("CT00001", false),
            ("CT00000A", false),
            ("CTX00001", false),
            ("COUNTER_", false),
            ("MAIN", false),
        ] {
            assert_eq!(is_generated_label(label), expected, "{}", label);
        }
    }
}
