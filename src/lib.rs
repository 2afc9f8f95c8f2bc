pub mod result;

pub mod cli;
pub mod compiler;
pub mod io;

pub use cli::*;
pub use compiler::{compile, CodegenConfig, CompileFailure};
pub use io::{read_program, write_output};
