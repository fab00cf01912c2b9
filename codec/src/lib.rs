//! Encoder, decoder and disassembler for 32-bit ARM (ARMv4/v5) code with the
//! optional VFPv2 floating point extension.
//!
//! Pick the encoding once with [`registry::select_encoding`], then work
//! through an [`instruction_set::InstructionSet`].

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
pub mod bitwise;

pub mod arm;
pub mod error;
pub mod instruction_set;
pub mod registry;
pub mod vfp;

pub use error::{CodecError, Result};
pub use instruction_set::{Instruction, InstructionSet};
pub use registry::{EncodingConfig, IsaVersion, VfpMode, select_encoding};
