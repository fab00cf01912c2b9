//! The ARMv4/v5 integer instruction set.

pub mod alu_instruction;
pub mod condition;

#[cfg(feature = "disassembler")]
pub mod disassembler;

#[allow(clippy::unreadable_literal)]
pub mod encoding;
pub mod flags;

#[allow(clippy::similar_names)]
pub mod instructions;
pub mod psr;
