//! Errors reported by the codec.
//!
//! A word that matches no instruction format is not an error: decoding
//! returns `None` for it. Everything here is either a configuration fault
//! (raised once, while the encoding is being selected) or an encode-time
//! fault in the values handed to the encoder.

use std::fmt;

use crate::registry::{IsaVersion, VfpMode};

pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// No concrete encoding exists for the requested ISA or VFP profile.
    UnsupportedProfile {
        /// The requested base instruction set.
        isa: IsaVersion,
        /// The requested floating-point profile.
        vfp: VfpMode,
    },

    /// The process-wide encoding was already selected.
    DoubleInitialization,

    /// The process-wide encoding was used before being selected.
    NotConfigured,

    /// A value handed to the encoder does not fit its field.
    /// Only raised under [`FieldVerification::Checked`](crate::bitwise::FieldVerification).
    FieldRange {
        /// Name of the field being encoded.
        field: &'static str,
        /// The offending value (sign-extended for signed fields).
        value: i64,
        /// Width of the field in bits.
        width: u8,
    },

    /// No 8-bit seed rotated right by an even amount produces this constant.
    UnrepresentableImmediate {
        /// The constant that was requested.
        value: u32,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedProfile { isa, vfp } => {
                write!(f, "unsupported encoding profile: {isa} with {vfp}")
            }
            Self::DoubleInitialization => {
                f.write_str("instruction set encoding has already been selected")
            }
            Self::NotConfigured => f.write_str("instruction set encoding has not been selected"),
            Self::FieldRange {
                field,
                value,
                width,
            } => write!(f, "value {value:#X} does not fit the {width}-bit field '{field}'"),
            Self::UnrepresentableImmediate { value } => {
                write!(f, "0x{value:08X} cannot be encoded as a rotated immediate")
            }
        }
    }
}

impl std::error::Error for CodecError {}
