/*
 * The register convention used by generated code.  It is independent of how
 * any single construct is lowered: every expression leaves its value in `ACC`,
 * binary operators pop their saved operand into `SCRATCH`, functions return
 * in `RETVAL`, and locals and parameters are addressed relative to `FRAME`.
 */
use crate::compiler::casl2::Reg;

/// Holds the value of the expression most recently evaluated.
pub const ACC: Reg = Reg::Gr1;

/// Holds a saved operand or a computed address.
pub const SCRATCH: Reg = Reg::Gr2;

/// Carries a function's return value back to the caller.
pub const RETVAL: Reg = Reg::Gr0;

/// The frame pointer.  Parameters sit above it, locals below it.
pub const FRAME: Reg = Reg::Gr7;

pub const STACK: Reg = Reg::Sp;

/// Size of the address space; local offsets are subtracted from it so that
/// `65536 - n` wraps to `FRAME - n`.
pub const ADDRESS_SPACE: i32 = 65536;
