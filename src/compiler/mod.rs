/**
 * The compiler takes a program tree built by a front-end and converts it into
 * CASL II assembly for the COMET II machine.
 *
 * Compilation runs in two stages.  The semantic stage (see `semantics`) resolves
 * every identifier, checks every expression against the type rules, lays out the
 * stack frame of each function and collects the string literals.  This is the
 * last stage where a User error can occur, and such errors are reported as a
 * `CompilerError<SemanticError>` carrying the location of the offending
 * statement.
 *
 * The code generation stage (the `Compiler` type) will only run on a program
 * which passed semantic analysis, and reads every storage location from the
 * resulting `SemanticInfo`.  Once it reaches this point the input program has
 * been fully validated, so the generator translates exactly what it is given.
 *
 * Because of this, if any error happens in the Compiler, we assume that the
 * error cannot be caused by User input; therefore, it must be a bug in the
 * compiler itself: whether the translation, or the semantic layer allowed
 * invalid code, or something else.  Such errors are returned as a
 * `CodegenError` and kept apart from the user facing errors by
 * `CompileFailure`.
 */
pub mod ast;
pub mod casl2;
pub mod compiler;
pub mod semantics;

mod arch;
mod error;

pub use compiler::{CodegenConfig, CodegenError, Compiler};
pub use error::{CompilerError, Location};

use log::info;

use self::{ast::Program, semantics::SemanticError};

/// Why a program could not be compiled.
#[derive(Clone, Debug, PartialEq)]
pub enum CompileFailure {
    /// The program is invalid.
    Semantic(CompilerError<SemanticError>),
    /// The compiler has a bug.
    Internal(CodegenError),
}

impl std::fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileFailure::Semantic(e) => f.write_fmt(format_args!("{}", e)),
            CompileFailure::Internal(e) => f.write_fmt(format_args!("internal compiler error: {}", e)),
        }
    }
}

impl std::error::Error for CompileFailure {}

impl From<CompilerError<SemanticError>> for CompileFailure {
    fn from(e: CompilerError<SemanticError>) -> Self {
        CompileFailure::Semantic(e)
    }
}

impl From<CodegenError> for CompileFailure {
    fn from(e: CodegenError) -> Self {
        CompileFailure::Internal(e)
    }
}

/// Runs semantic analysis and then code generation over a program and returns
/// the assembly text.
pub fn compile(program: &Program, config: &CodegenConfig) -> Result<String, CompileFailure> {
    let info = semantics::SemanticAnalyzer::new()
        .reserve_label(&config.program_name)
        .analyze(program)?;
    info!(
        "Semantic analysis passed: {} functions, {} string literals",
        program.functions.len(),
        info.strings().len()
    );
    let asm = Compiler::compile(program, &info, config)?;
    info!("Generated {} lines of assembly", asm.len());
    Ok(asm.build())
}

#[cfg(test)]
mod tests {
    use super::ast::*;
    use super::*;

    #[test]
    fn semantic_errors_stop_before_code_generation() {
        let program = Program::new(
            vec![
                GlobalDecl::new(TypeSpec::int(), "x"),
                GlobalDecl::new(TypeSpec::int(), "x"),
            ],
            vec![],
        );
        match compile(&program, &CodegenConfig::default()) {
            Err(CompileFailure::Semantic(e)) => {
                assert_eq!(e.inner(), SemanticError::Redeclaration("x".into()))
            }
            other => panic!("expected a semantic error, got {:?}", other),
        }
    }

    #[test]
    fn program_name_is_a_reserved_label() {
        let program = Program::new(vec![GlobalDecl::new(TypeSpec::int(), "Sample")], vec![]);
        let config = CodegenConfig {
            program_name: "sample".into(),
            ..CodegenConfig::default()
        };
        assert!(compile(&program, &CodegenConfig::default()).is_ok());
        match compile(&program, &config) {
            Err(CompileFailure::Semantic(e)) => assert_eq!(
                e.inner(),
                SemanticError::LabelCollision("Sample".into(), "SAMPLE".into())
            ),
            other => panic!("expected a label collision, got {:?}", other),
        }
    }

    #[test]
    fn compiles_to_text() {
        let program = Program::new(
            vec![],
            vec![FunctionDecl::new(
                TypeSpec::void(),
                "main",
                vec![],
                Block::new(vec![]),
            )],
        );
        let text = compile(&program, &CodegenConfig::default()).unwrap();
        let lines: Vec<_> = text.lines().map(|l| l.trim_end()).collect();
        assert_eq!(
            lines,
            vec![
                "PRG      START  ENTRY",
                "ENTRY    LAD    GR8,STACK",
                "         LAD    GR8,256,GR8",
                "         CALL   MAIN",
                "         RET",
                "; Function: main",
                "MAIN     PUSH   0,GR7                   ; Prologue",
                "         LAD    GR7,0,GR8",
                "         POP    GR7                     ; Epilogue",
                "         RET",
                "STACK    DS     256",
                "         END",
            ]
        );
    }

    #[test]
    fn internal_errors_are_kept_apart() {
        let failure = CompileFailure::from(CodegenError::UnpooledLiteral("a".into()));
        assert_eq!(
            failure.to_string(),
            "internal compiler error: string literal \"a\" is not in the pool"
        );
    }
}
