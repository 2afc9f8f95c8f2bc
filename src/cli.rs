use clap::{App, Arg, ArgMatches};
use log::LevelFilter;

use crate::compiler::CodegenConfig;
use crate::result::Result;

// Exit Codes for different types of errors
pub const ERR_TYPE_CHECK: i32 = 1;
pub const ERR_CODEGEN: i32 = 2;
pub const ERR_INPUT: i32 = 3;
pub const ERR_OUTPUT: i32 = 4;

pub fn print_errs(errs: &[String]) {
    for e in errs {
        eprintln!("{}", e);
    }
}

pub fn configure_cli() -> clap::App<'static, 'static> {
    App::new("Mini-C CASL II Compiler")
        .version("0.1.0")
        .author("Erich Ess")
        .about("Compiles a mini-C program tree into CASL II assembly for the COMET II machine")
        .arg(
            Arg::with_name("input")
                .short("i")
                .long("input")
                .takes_value(true)
                .required(true)
                .help("Program tree to compile, as a .json or .yaml file"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .help("File the assembly will be written to.  Writes to stdout when omitted"),
        )
        .arg(
            Arg::with_name("stack-size")
                .long("stack-size")
                .takes_value(true)
                .help("Number of words reserved for the run time stack"),
        )
        .arg(
            Arg::with_name("program-name")
                .long("program-name")
                .takes_value(true)
                .help("Label of the START line"),
        )
        .arg(
            Arg::with_name("log-level")
                .long("log-level")
                .possible_values(&["error", "warn", "info", "debug", "trace"])
                .takes_value(true)
                .help("Logs the steps of the compiler to stderr at the given level"),
        )
}

pub fn get_log_level(args: &ArgMatches) -> Option<LevelFilter> {
    match args.value_of("log-level") {
        Some("error") => Some(LevelFilter::Error),
        Some("warn") => Some(LevelFilter::Warn),
        Some("info") => Some(LevelFilter::Info),
        Some("debug") => Some(LevelFilter::Debug),
        Some("trace") => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Builds the code generator settings from the command line, falling back to
/// the defaults for anything not given.
pub fn get_codegen_config(args: &ArgMatches) -> Result<CodegenConfig> {
    let mut config = CodegenConfig::default();
    if let Some(size) = args.value_of("stack-size") {
        config.stack_size = size
            .parse()
            .map_err(|_| format!("Invalid stack size: {}", size))?;
    }
    if let Some(name) = args.value_of("program-name") {
        if name.is_empty() {
            return Err("The program name cannot be empty".into());
        }
        config.program_name = name.into();
    }
    Ok(config)
}
