/*
 * Facts about the COMET II machine that both the analyzer and the code
 * generator rely on: the 16-bit word, and (in `registers`) which general
 * register plays which role in generated code.
 */
pub mod registers;

/// Smallest value a word can hold when read as a signed integer.
pub const WORD_MIN: i32 = -32768;

/// Largest value a word can hold when read as an unsigned integer.  Constants
/// up to this bound are accepted by the assembler.
pub const WORD_MAX: i32 = 65535;

/// True if `n` fits in one word, read either signed or unsigned.
pub fn fits_in_word(n: i32) -> bool {
    (WORD_MIN..=WORD_MAX).contains(&n)
}
