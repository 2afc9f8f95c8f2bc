extern crate log;
extern crate simplelog;

use std::path::Path;
use std::process::exit;

use log::{error, info};
use simplelog::{Config, WriteLogger};

use minic_casl::*;

fn main() {
    let config = configure_cli().get_matches();

    if let Some(level) = get_log_level(&config) {
        configure_logging(level).expect("Failed to configure logger.")
    }

    let input = config
        .value_of("input")
        .expect("Expected a program tree to compile");
    let codegen = match get_codegen_config(&config) {
        Ok(codegen) => codegen,
        Err(msg) => {
            print_errs(&[msg]);
            exit(ERR_INPUT)
        }
    };

    let program = match read_program(Path::new(input)) {
        Ok(program) => program,
        Err(msg) => {
            print_errs(&[msg]);
            exit(ERR_INPUT)
        }
    };
    info!(
        "Read {} globals and {} functions from {}",
        program.globals.len(),
        program.functions.len(),
        input
    );

    let asm = match compile(&program, &codegen) {
        Ok(asm) => asm,
        Err(CompileFailure::Semantic(e)) => {
            print_errs(&[format!("{}: {}", input, e)]);
            exit(ERR_TYPE_CHECK)
        }
        Err(CompileFailure::Internal(e)) => {
            error!("Code generation failed: {}", e);
            print_errs(&[format!("internal compiler error: {}", e)]);
            exit(ERR_CODEGEN)
        }
    };

    if let Err(msg) = write_output(config.value_of("output").map(Path::new), &asm) {
        print_errs(&[msg]);
        exit(ERR_OUTPUT)
    }
}

fn configure_logging(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    WriteLogger::init(level, Config::default(), std::io::stderr())
}
