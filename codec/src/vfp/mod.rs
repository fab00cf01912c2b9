//! The VFPv2 floating point extension, living in coprocessor slots 10 and 11.

#[cfg(feature = "disassembler")]
pub mod disassembler;
pub mod encoding;

#[allow(clippy::similar_names)]
pub mod instructions;
pub mod registers;
