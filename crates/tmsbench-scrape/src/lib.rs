//! Tolerant parsers for TMS9900 toolchain and simulator output.
//!
//! Every parser here is a total function from raw text to an optional value.
//! Disassembler, size-table and simulator formats are not versioned, so a line
//! that does not look the way we expect is skipped rather than reported.

mod disasm;
mod size;
mod summary;

pub use disasm::*;
pub use size::*;
pub use summary::*;
