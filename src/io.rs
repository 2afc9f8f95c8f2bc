use std::io::Write;
use std::path::Path;

use crate::compiler::ast::Program;
use crate::result::Result;

/// Reads a program tree from a JSON or YAML file.  The format is picked by the
/// file extension.
pub fn read_program(path: &Path) -> Result<Program> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Could not read {}: {}", path.display(), e))?;
    let ext = path
        .extension()
        .and_then(|ex| ex.to_str())
        .map(|ex| ex.to_ascii_lowercase());
    match ext.as_deref() {
        Some("json") => parse_json(&text),
        Some("yaml") | Some("yml") => parse_yaml(&text),
        Some(ex) => Err(format!(
            "Expected a .json or .yaml program tree but got .{} for {}",
            ex,
            path.display()
        )),
        None => Err(format!(
            "Expected a .json or .yaml program tree but {} has no extension",
            path.display()
        )),
    }
}

pub fn parse_json(text: &str) -> Result<Program> {
    serde_json::from_str(text).map_err(|e| format!("Invalid program tree: {}", e))
}

pub fn parse_yaml(text: &str) -> Result<Program> {
    serde_yaml::from_str(text).map_err(|e| format!("Invalid program tree: {}", e))
}

/// Writes the assembly to the given file, or to stdout if there is none.
pub fn write_output(path: Option<&Path>, asm: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, asm)
            .map_err(|e| format!("Could not write {}: {}", path.display(), e)),
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            out.write_all(asm.as_bytes())
                .and_then(|_| out.flush())
                .map_err(|e| format!("Could not write to stdout: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_and_yaml_agree() {
        let json = r#"{
            "globals": [],
            "functions": [{
                "return_ty": {"base": "int"},
                "name": "main",
                "params": [],
                "body": {"statements": [
                    {"kind": "return", "value": {"kind": "int_lit", "value": 3}}
                ]}
            }]
        }"#;
        let yaml = "
globals: []
functions:
  - return_ty: {base: int}
    name: main
    params: []
    body:
      statements:
        - kind: return
          value: {kind: int_lit, value: 3}
";
        let from_json = parse_json(json).unwrap();
        assert_eq!(from_json, parse_yaml(yaml).unwrap());
        assert!(from_json.get_function("main").is_some());
    }

    #[test]
    fn rejects_unknown_extension() {
        let path = std::env::temp_dir().join("minicc-io-test.txt");
        std::fs::write(&path, "{}").unwrap();
        let err = read_program(&path).unwrap_err();
        assert!(err.contains("got .txt"), "{}", err);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn malformed_tree() {
        assert!(parse_json("{\"globals\": 3}").is_err());
    }
}
