//! # VFP register file
//!
//! The coprocessor has 32 single precision registers `s0`..`s31` and 16
//! double precision registers `d0`..`d15` sharing the same storage:
//!
//! ```text
//! ┌────┬────┬────┬────┬────┬─────┬─────┬─────┐
//! │ s0 │ s1 │ s2 │ s3 │ .. │ s29 │ s30 │ s31 │
//! ├────┴────┼────┴────┼────┼─────┴─────┴─────┤
//! │   d0    │   d1    │ .. │  d14  │   d15   │
//! └─────────┴─────────┴────┴───────┴─────────┘
//! ```
//!
//! Register operands are kept as an index into the single precision space.
//! A double register is the even single register it starts at, so `d3` is
//! stored as `6`. An odd index read as a double names no register.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Precision {
    Single,
    Double,
}

impl From<bool> for Precision {
    /// The `sz` bit: set for double precision.
    fn from(is_double: bool) -> Self {
        if is_double { Self::Double } else { Self::Single }
    }
}

impl From<Precision> for bool {
    fn from(precision: Precision) -> Self {
        precision == Precision::Double
    }
}

impl Precision {
    /// Mnemonic suffix, `D` or `S`.
    #[must_use]
    pub const fn suffix(self) -> char {
        match self {
            Self::Single => 'S',
            Self::Double => 'D',
        }
    }

    /// Registers one element occupies in the single precision space.
    #[must_use]
    pub const fn width(self) -> u32 {
        match self {
            Self::Single => 1,
            Self::Double => 2,
        }
    }

    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Single => Self::Double,
            Self::Double => Self::Single,
        }
    }
}

/// A register operand as an index into the single precision space.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FpRegister(u32);

impl FpRegister {
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// `s{n}`.
    #[must_use]
    pub const fn single(n: u32) -> Self {
        Self(n)
    }

    /// `d{n}`.
    #[must_use]
    pub const fn double(n: u32) -> Self {
        Self(n * 2)
    }

    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// The register `steps` single registers further on.
    #[must_use]
    pub const fn offset(self, steps: u32) -> Self {
        Self(self.0.wrapping_add(steps))
    }

    /// Assembler name of the register read with `precision`; `??` when it
    /// names nothing.
    #[must_use]
    pub fn name(self, precision: Precision) -> String {
        match precision {
            Precision::Single if self.0 < 32 => format!("s{}", self.0),
            Precision::Double if self.0 < 32 && self.0 % 2 == 0 => format!("d{}", self.0 / 2),
            _ => "??".to_string(),
        }
    }
}

impl From<FpRegister> for u32 {
    fn from(register: FpRegister) -> Self {
        register.0
    }
}

/// Registers reachable through `FMRX`/`FMXR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemRegister {
    /// Implementation identification, read only.
    Fpsid = 0,
    /// Status and control.
    Fpscr = 1,
    /// Exception control.
    Fpexc = 8,
}

impl TryFrom<u32> for SystemRegister {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Fpsid),
            1 => Ok(Self::Fpscr),
            8 => Ok(Self::Fpexc),
            _ => Err(format!("unknown VFP system register {value}")),
        }
    }
}

impl From<SystemRegister> for u32 {
    fn from(register: SystemRegister) -> Self {
        register as Self
    }
}

impl std::fmt::Display for SystemRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fpsid => f.write_str("FPSID"),
            Self::Fpscr => f.write_str("FPSCR"),
            Self::Fpexc => f.write_str("FPEXC"),
        }
    }
}

/// Rounding mode held in `FPSCR.RMODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundingMode {
    Nearest = 0,
    PlusInfinity = 1,
    MinusInfinity = 2,
    Zero = 3,
}

impl From<u32> for RoundingMode {
    fn from(value: u32) -> Self {
        match value & 0b11 {
            0 => Self::Nearest,
            1 => Self::PlusInfinity,
            2 => Self::MinusInfinity,
            _ => Self::Zero,
        }
    }
}

/// Floating point status and control register.
///
/// ```text
///  31 30 29 28   25 24 23 22 21 20 18   16 15     12 11 10  9  8  7     4  3  2  1  0
/// ┌──┬──┬──┬──┬───┬──┬──┬─────┬─────┬──┬─────┬───┬───┬───┬───┬───┬───┬───┬───┬───┬───┬───┐
/// │N │Z │C │V │...│DN│FZ│RMODE│STRID│  │ LEN │IDE│IXE│UFE│OFE│DZE│IOE│IDC│IXC│UFC│OFC│DZC│IOC│
/// └──┴──┴──┴──┴───┴──┴──┴─────┴─────┴──┴─────┴───┴───┴───┴───┴───┴───┴───┴───┴───┴───┴───┴───┘
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fpscr(u32);

impl From<u32> for Fpscr {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Fpscr> for u32 {
    fn from(fpscr: Fpscr) -> Self {
        fpscr.0
    }
}

impl Fpscr {
    /// IOC, cumulative invalid operation.
    #[must_use]
    pub fn invalid_operation(self) -> bool {
        self.0.get_bit(0)
    }

    /// DZC, cumulative division by zero.
    #[must_use]
    pub fn division_by_zero(self) -> bool {
        self.0.get_bit(1)
    }

    #[must_use]
    pub fn overflow(self) -> bool {
        self.0.get_bit(2)
    }

    #[must_use]
    pub fn underflow(self) -> bool {
        self.0.get_bit(3)
    }

    #[must_use]
    pub fn inexact(self) -> bool {
        self.0.get_bit(4)
    }

    /// IDC, cumulative input denormal.
    #[must_use]
    pub fn input_denormal(self) -> bool {
        self.0.get_bit(7)
    }

    #[must_use]
    pub fn invalid_operation_trap(self) -> bool {
        self.0.get_bit(8)
    }

    #[must_use]
    pub fn division_by_zero_trap(self) -> bool {
        self.0.get_bit(9)
    }

    #[must_use]
    pub fn overflow_trap(self) -> bool {
        self.0.get_bit(10)
    }

    #[must_use]
    pub fn underflow_trap(self) -> bool {
        self.0.get_bit(11)
    }

    #[must_use]
    pub fn inexact_trap(self) -> bool {
        self.0.get_bit(12)
    }

    #[must_use]
    pub fn input_denormal_trap(self) -> bool {
        self.0.get_bit(15)
    }

    /// Vector length minus one.
    #[must_use]
    pub fn vector_length(self) -> u32 {
        self.0.get_bits(16..=18)
    }

    #[must_use]
    pub fn stride(self) -> u32 {
        self.0.get_bits(20..=21)
    }

    #[must_use]
    pub fn rounding_mode(self) -> RoundingMode {
        self.0.get_bits(22..=23).into()
    }

    /// FZ, flush to zero.
    #[must_use]
    pub fn flush_to_zero(self) -> bool {
        self.0.get_bit(24)
    }

    /// DN, default NaN.
    #[must_use]
    pub fn default_nan(self) -> bool {
        self.0.get_bit(25)
    }

    #[must_use]
    pub fn overflow_flag(self) -> bool {
        self.0.get_bit(28)
    }

    #[must_use]
    pub fn carry_flag(self) -> bool {
        self.0.get_bit(29)
    }

    #[must_use]
    pub fn zero_flag(self) -> bool {
        self.0.get_bit(30)
    }

    #[must_use]
    pub fn sign_flag(self) -> bool {
        self.0.get_bit(31)
    }

    pub fn set_rounding_mode(&mut self, mode: RoundingMode) {
        self.0 = (self.0 & !(0b11 << 22)) | ((mode as u32) << 22);
    }

    pub fn set_flush_to_zero(&mut self, value: bool) {
        self.0.set_bit(24, value);
    }

    pub fn set_default_nan(&mut self, value: bool) {
        self.0.set_bit(25, value);
    }
}

/// Floating point exception register.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fpexc(u32);

impl From<u32> for Fpexc {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Fpexc> for u32 {
    fn from(fpexc: Fpexc) -> Self {
        fpexc.0
    }
}

impl Fpexc {
    /// EN, the coprocessor is enabled.
    #[must_use]
    pub fn enabled(self) -> bool {
        self.0.get_bit(30)
    }

    /// EX, an exception is pending.
    #[must_use]
    pub fn exception(self) -> bool {
        self.0.get_bit(31)
    }

    pub fn set_enabled(&mut self, value: bool) {
        self.0.set_bit(30, value);
    }
}
