use serde::{Deserialize, Serialize};

/// There two different kind of write or read for memory.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadWriteKind {
    #[default]
    Word,

    Byte,
}

impl From<bool> for ReadWriteKind {
    fn from(value: bool) -> Self {
        if value { Self::Byte } else { Self::Word }
    }
}

impl From<ReadWriteKind> for bool {
    fn from(kind: ReadWriteKind) -> Self {
        kind == ReadWriteKind::Byte
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadStoreKind {
    Store,
    Load,
}

impl From<bool> for LoadStoreKind {
    fn from(b: bool) -> Self {
        match b {
            false => Self::Store,
            true => Self::Load,
        }
    }
}

impl From<LoadStoreKind> for bool {
    fn from(kind: LoadStoreKind) -> Self {
        kind == LoadStoreKind::Load
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Indexing {
    /// Add offset after transfer.
    Post,

    /// Add offset before transfer.
    Pre,
}

impl From<bool> for Indexing {
    fn from(state: bool) -> Self {
        match state {
            false => Self::Post,
            true => Self::Pre,
        }
    }
}

impl From<Indexing> for bool {
    fn from(indexing: Indexing) -> Self {
        indexing == Indexing::Pre
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Offsetting {
    /// Subtract the offset from base.
    Down,

    /// Add the offset to base.
    Up,
}

impl From<bool> for Offsetting {
    fn from(state: bool) -> Self {
        match state {
            false => Self::Down,
            true => Self::Up,
        }
    }
}

impl From<Offsetting> for bool {
    fn from(offsetting: Offsetting) -> Self {
        offsetting == Offsetting::Up
    }
}

impl Offsetting {
    /// `""` when adding, `"-"` when subtracting.
    #[must_use]
    pub const fn sign(self) -> &'static str {
        match self {
            Self::Up => "",
            Self::Down => "-",
        }
    }

    /// Applies `offset` to `base` in this direction, wrapping like the address bus.
    #[must_use]
    pub const fn apply(self, base: u32, offset: u32) -> u32 {
        match self {
            Self::Up => base.wrapping_add(offset),
            Self::Down => base.wrapping_sub(offset),
        }
    }
}

/// Barrel shifter operation applied to a register operand.
///
/// `Rrx` has no encoding of its own: it is `Ror` with a zero amount. Decoding
/// turns that pattern into `Rrx` with amount 1 and encoding turns it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftKind {
    Lsl,
    Lsr,
    Asr,
    Ror,
    Rrx,
}

impl From<u32> for ShiftKind {
    /// Reads the 2-bit shift type field.
    fn from(op_code: u32) -> Self {
        match op_code & 0b11 {
            0b00 => Self::Lsl,
            0b01 => Self::Lsr,
            0b10 => Self::Asr,
            _ => Self::Ror,
        }
    }
}

impl From<ShiftKind> for u32 {
    fn from(kind: ShiftKind) -> Self {
        match kind {
            ShiftKind::Lsl => 0b00,
            ShiftKind::Lsr => 0b01,
            ShiftKind::Asr => 0b10,
            ShiftKind::Ror | ShiftKind::Rrx => 0b11,
        }
    }
}

impl std::fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lsl => f.write_str("LSL"),
            Self::Lsr => f.write_str("LSR"),
            Self::Asr => f.write_str("ASR"),
            Self::Ror => f.write_str("ROR"),
            Self::Rrx => f.write_str("RRX"),
        }
    }
}

/// The `SH` bits (6-5) of a halfword/signed data transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HalfwordTransferKind {
    /// `SH` = 00, the swap encoding space.
    Swap,
    UnsignedHalfwords,
    SignedByte,
    SignedHalfwords,
}

impl From<u32> for HalfwordTransferKind {
    fn from(value: u32) -> Self {
        match value & 0b11 {
            0b00 => Self::Swap,
            0b01 => Self::UnsignedHalfwords,
            0b10 => Self::SignedByte,
            _ => Self::SignedHalfwords,
        }
    }
}

impl From<HalfwordTransferKind> for u32 {
    fn from(kind: HalfwordTransferKind) -> Self {
        kind as Self
    }
}

impl std::fmt::Display for HalfwordTransferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Swap => f.write_str("SWP"),
            Self::UnsignedHalfwords => f.write_str("H"),
            Self::SignedByte => f.write_str("SB"),
            Self::SignedHalfwords => f.write_str("SH"),
        }
    }
}
