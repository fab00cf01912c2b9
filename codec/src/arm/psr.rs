//! # Program Status Registers (CPSR and SPSR)
//!
//! Only what the instruction words themselves refer to lives here: which
//! status register an `MRS`/`MSR` names, the field mask an `MSR` writes, and
//! the layout of the register value for code that builds `MSR` immediates.
//!
//! ```text
//! 31 30 29 28 27         8 7 6 5 4   0
//! ┌──┬──┬──┬──┬───────────┬─┬─┬─┬─────┐
//! │N │Z │C │V │ Reserved  │I│F│T│Mode │
//! └──┴──┴──┴──┴───────────┴─┴─┴─┴─────┘
//!  └──── f ────┘  s    x   └─── c ───┘   (MSR field mask, bits 19-16)
//! ```

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

/// Which status register an `MRS`/`MSR` accesses (bit 22).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PsrKind {
    Cpsr,
    Spsr,
}

impl From<bool> for PsrKind {
    fn from(value: bool) -> Self {
        if value { Self::Spsr } else { Self::Cpsr }
    }
}

impl From<PsrKind> for bool {
    fn from(kind: PsrKind) -> Self {
        kind == PsrKind::Spsr
    }
}

impl std::fmt::Display for PsrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpsr => f.write_str("CPSR"),
            Self::Spsr => f.write_str("SPSR"),
        }
    }
}

/// Field mask written by `MSR` (bits 19-16).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsrFields(u32);

impl PsrFields {
    pub const CONTROL: Self = Self(0b0001);
    pub const EXTENSION: Self = Self(0b0010);
    pub const STATUS: Self = Self(0b0100);
    pub const FLAGS: Self = Self(0b1000);
    pub const ALL: Self = Self(0b1111);

    #[must_use]
    pub const fn new(mask: u32) -> Self {
        Self(mask & 0b1111)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for PsrFields {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::fmt::Display for PsrFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (field, letter) in [
            (Self::CONTROL, "c"),
            (Self::EXTENSION, "x"),
            (Self::STATUS, "s"),
            (Self::FLAGS, "f"),
        ] {
            if self.contains(field) {
                f.write_str(letter)?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    User = 0b10000,
    Fiq = 0b10001,
    Irq = 0b10010,
    Supervisor = 0b10011,
    Abort = 0b10111,
    Undefined = 0b11011,
    System = 0b11111,
}

impl TryFrom<u32> for Mode {
    type Error = String;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        match n {
            0b10000 => Ok(Self::User),
            0b10001 => Ok(Self::Fiq),
            0b10010 => Ok(Self::Irq),
            0b10011 => Ok(Self::Supervisor),
            0b10111 => Ok(Self::Abort),
            0b11011 => Ok(Self::Undefined),
            0b11111 => Ok(Self::System),
            _ => Err(format!("unexpected value for Mode: 0b{n:05b}")),
        }
    }
}

impl From<Mode> for u32 {
    fn from(m: Mode) -> Self {
        m as Self
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => f.write_str("USER"),
            Self::Fiq => f.write_str("FIQ"),
            Self::Irq => f.write_str("IRQ"),
            Self::Supervisor => f.write_str("SVC"),
            Self::Abort => f.write_str("ABORT"),
            Self::Undefined => f.write_str("UNDEF"),
            Self::System => f.write_str("SYS"),
        }
    }
}

/// A status register value.
///
/// # Example
///
/// ```
/// use codec::arm::psr::{Mode, Psr};
///
/// let psr = Psr::from(0x6000_001F);
/// assert!(psr.zero_flag());
/// assert!(psr.carry_flag());
/// assert_eq!(psr.mode(), Ok(Mode::System));
/// assert_eq!(psr.mode_name(), "SYS");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Psr(u32);

impl From<u32> for Psr {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Psr> for u32 {
    fn from(psr: Psr) -> Self {
        psr.0
    }
}

impl Psr {
    /// N => Bit 31
    #[must_use]
    pub fn sign_flag(self) -> bool {
        self.0.get_bit(31)
    }

    /// Z => Bit 30
    #[must_use]
    pub fn zero_flag(self) -> bool {
        self.0.get_bit(30)
    }

    /// C => Bit 29
    #[must_use]
    pub fn carry_flag(self) -> bool {
        self.0.get_bit(29)
    }

    /// V => Bit 28
    #[must_use]
    pub fn overflow_flag(self) -> bool {
        self.0.get_bit(28)
    }

    /// I => Bit 7, (0=Enable, 1=Disable)
    #[must_use]
    pub fn irq_disable(self) -> bool {
        self.0.get_bit(7)
    }

    /// F => Bit 6, (0=Enable, 1=Disable)
    #[must_use]
    pub fn fiq_disable(self) -> bool {
        self.0.get_bit(6)
    }

    /// T => Bit 5, (0=ARM, 1=THUMB)
    #[must_use]
    pub fn state_bit(self) -> bool {
        self.0.get_bit(5)
    }

    /// M4-M0 => Bits 4-0
    ///
    /// # Errors
    ///
    /// When the mode bits hold a value that names no processor mode.
    pub fn mode(self) -> Result<Mode, String> {
        Mode::try_from(self.0.get_bits(0..=4))
    }

    /// Name of the processor mode, `"??"` for invalid mode bits.
    #[must_use]
    pub fn mode_name(self) -> String {
        self.mode()
            .map_or_else(|_| "??".to_string(), |mode| mode.to_string())
    }

    pub fn set_sign_flag(&mut self, value: bool) {
        self.0.set_bit(31, value);
    }

    pub fn set_zero_flag(&mut self, value: bool) {
        self.0.set_bit(30, value);
    }

    pub fn set_carry_flag(&mut self, value: bool) {
        self.0.set_bit(29, value);
    }

    pub fn set_overflow_flag(&mut self, value: bool) {
        self.0.set_bit(28, value);
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.0 = (self.0 & !0b11111) | u32::from(mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn field_letters() {
        assert_eq!(PsrFields::ALL.to_string(), "cxsf");
        assert_eq!((PsrFields::CONTROL | PsrFields::FLAGS).to_string(), "cf");
        assert_eq!(PsrFields::new(0).to_string(), "");
        assert_eq!(PsrFields::new(0x19).bits(), 0x9);
    }

    #[test]
    fn modes() {
        let mut psr = Psr::default();
        assert_eq!(psr.mode_name(), "??");

        psr.set_mode(Mode::Irq);
        assert_eq!(u32::from(psr), 0x12);
        assert_eq!(psr.mode_name(), "IRQ");

        psr.set_mode(Mode::Undefined);
        assert_eq!(psr.mode(), Ok(Mode::Undefined));
        assert_eq!(psr.mode_name(), "UNDEF");
    }

    #[test]
    fn flags() {
        let mut psr = Psr::from(0x10);
        psr.set_sign_flag(true);
        psr.set_overflow_flag(true);
        assert!(psr.sign_flag());
        assert!(!psr.zero_flag());
        assert!(psr.overflow_flag());
        assert_eq!(u32::from(psr), 0x9000_0010);
        assert!(!Psr::from(0xC0).state_bit());
        assert!(Psr::from(0xC0).irq_disable());
        assert!(Psr::from(0xC0).fiq_disable());
    }
}
