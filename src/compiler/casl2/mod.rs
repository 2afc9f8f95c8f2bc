//! Text assembly for the COMET II machine: a typed instruction set, the column
//! formatted line builder, and the label generator.
pub mod assembly;
pub mod labels;

pub use assembly::{AsmLine, Assembly, Const, Inst, Mem, Reg, Src};
pub use labels::{LabelError, LabelGenerator};
