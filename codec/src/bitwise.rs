//! # Bit-field primitives
//!
//! Every instruction layout in this crate is described as a set of fields,
//! each one a `(position, width)` pair inside a 32-bit word:
//!
//! ```text
//!  31        28 27                       16 15            8 7            0
//! ┌────────────┬───────────────────────────┬───────────────┬──────────────┐
//! │    cond    │            ...            │  field(8, 8)  │  field(0, 8) │
//! └────────────┴───────────────────────────┴───────────────┴──────────────┘
//!
//!   extract(word, pos, width) = (word >> pos) & mask(width)
//!   insert(value, pos, width) = (value & mask(width)) << pos
//! ```
//!
//! `insert` never fails: values wider than the field are truncated. Range
//! checking is a separate, explicit step driven by [`FieldVerification`], so
//! the caller decides whether a too-wide value is a fault or is dropped.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// Contains some helper methods to read and manipulate bits of a word,
/// the index (`bit_idx`) is supposed to be from lsb to msb (right to left).
pub trait Bits: Copy {
    fn is_bit_on(&self, bit_idx: u8) -> bool;

    fn is_bit_off(&self, bit_idx: u8) -> bool {
        !self.is_bit_on(bit_idx)
    }

    fn set_bit(&mut self, bit_idx: u8, value: bool);

    fn get_bit(&self, bit_idx: u8) -> bool {
        self.is_bit_on(bit_idx)
    }

    /// Returns the bits in `bits_range` moved down to position 0.
    fn get_bits(&self, bits_range: RangeInclusive<u8>) -> Self;

    /// Checks if a certain sequence of bit is set to 1.
    fn are_bits_on(&self, bits_range: RangeInclusive<u8>) -> bool {
        bits_range.into_iter().all(|idx| self.is_bit_on(idx))
    }
}

impl Bits for u32 {
    fn is_bit_on(&self, bit_idx: u8) -> bool {
        debug_assert!(bit_idx < 32);
        (self >> bit_idx) & 1 == 1
    }

    fn set_bit(&mut self, bit_idx: u8, value: bool) {
        debug_assert!(bit_idx < 32);
        if value {
            *self |= 1 << bit_idx;
        } else {
            *self &= !(1 << bit_idx);
        }
    }

    fn get_bits(&self, bits_range: RangeInclusive<u8>) -> Self {
        let start = *bits_range.start();
        let width = bits_range.end() - start + 1;
        extract(*self, start, width)
    }
}

/// A word with the lowest `width` bits set.
#[must_use]
pub const fn mask(width: u8) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1 << width) - 1
    }
}

/// Places the low `width` bits of `value` at `bit_pos`.
#[must_use]
pub const fn insert(value: u32, bit_pos: u8, width: u8) -> u32 {
    (value & mask(width)) << bit_pos
}

/// Places `width` bits of `value`, starting at `value_pos`, at `bit_pos`.
///
/// Used by fields that are split across the word, e.g. the halfword
/// transfer offset whose high nibble lives in bits 8..=11.
#[must_use]
pub const fn insert_slice(value: u32, value_pos: u8, width: u8, bit_pos: u8) -> u32 {
    ((value >> value_pos) & mask(width)) << bit_pos
}

#[must_use]
pub const fn extract(word: u32, bit_pos: u8, width: u8) -> u32 {
    (word >> bit_pos) & mask(width)
}

/// Inverse of [`insert_slice`]: reads `width` bits at `bit_pos` and moves
/// them to `value_pos` of the result.
#[must_use]
pub const fn extract_slice(word: u32, value_pos: u8, width: u8, bit_pos: u8) -> u32 {
    ((word >> bit_pos) & mask(width)) << value_pos
}

#[must_use]
pub const fn set_flag(flag: bool, bit_pos: u8) -> u32 {
    if flag { 1 << bit_pos } else { 0 }
}

#[must_use]
pub const fn check_flag(word: u32, bit_pos: u8) -> bool {
    (word >> bit_pos) & 1 == 1
}

/// How field setters treat values wider than their field.
///
/// `Unchecked` truncates silently and is what a code generator running in
/// production wants. `Checked` turns every too-wide value into a
/// [`CodecError::FieldRange`], which is how encoder bugs are caught in tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldVerification {
    #[default]
    Unchecked,
    Checked,
}

impl FieldVerification {
    /// An unsigned value fits when it has no bits above `width`.
    ///
    /// # Errors
    ///
    /// [`CodecError::FieldRange`] in `Checked` mode when `value` is too wide.
    pub fn unsigned(self, field: &'static str, value: u32, width: u8) -> Result<u32> {
        if self == Self::Checked && value & !mask(width) != 0 {
            return Err(CodecError::FieldRange {
                field,
                value: i64::from(value),
                width,
            });
        }

        Ok(value)
    }

    /// A signed value fits when it survives a round trip through `width`
    /// bits of two's complement, i.e. `value >> width` is all zeros or all ones.
    ///
    /// # Errors
    ///
    /// [`CodecError::FieldRange`] in `Checked` mode when `value` does not fit.
    pub fn signed(self, field: &'static str, value: i32, width: u8) -> Result<i32> {
        let top = if width >= 32 { 0 } else { value >> width };
        if self == Self::Checked && top != 0 && top != -1 {
            return Err(CodecError::FieldRange {
                field,
                value: i64::from(value),
                width,
            });
        }

        Ok(value)
    }

    /// Checked insert of an unsigned field.
    ///
    /// # Errors
    ///
    /// See [`Self::unsigned`].
    pub fn insert(self, field: &'static str, value: u32, bit_pos: u8, width: u8) -> Result<u32> {
        Ok(insert(self.unsigned(field, value, width)?, bit_pos, width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    #[test]
    fn test_is_on() {
        let b = 0b1_1001_1101_u32;
        assert!(b.is_bit_on(0));
        assert!(!b.is_bit_on(1));
        assert!(b.is_bit_on(2));
        assert!(b.is_bit_on(8));
        assert!(b.is_bit_off(31));
    }

    #[test]
    fn set_bit() {
        let mut b = 0b110_0110_u32;
        b.set_bit(0, true);
        b.set_bit(1, true);
        b.set_bit(2, false);
        b.set_bit(3, false);
        assert_eq!(b, 0b110_0011);
    }

    #[test]
    #[should_panic]
    fn invalid_index() {
        let b = 0u32;
        b.is_bit_on(32);
    }

    #[test]
    fn get_bits() {
        let b = 0b10_1100_1110_u32;
        assert_eq!(b.get_bits(0..=3), 0b1110);
        assert_eq!(b.get_bits(1..=1), 0b1);
        assert_eq!(b.get_bits(4..=7), 0b1100);
        assert_eq!(b.get_bits(8..=9), 0b10);
        assert_eq!(b.get_bits(0..=31), 0b10_1100_1110);
        assert_eq!(b.get_bits(28..=31), 0b0);
    }

    #[test]
    fn are_bits_on() {
        let b = 0xF550_F000_u32;
        assert!(b.are_bits_on(28..=31));
        assert!(b.are_bits_on(12..=15));
        assert!(!b.are_bits_on(8..=15));
    }

    #[test]
    fn masks() {
        assert_eq!(mask(0), 0);
        assert_eq!(mask(4), 0xF);
        assert_eq!(mask(24), 0x00FF_FFFF);
        assert_eq!(mask(32), u32::MAX);
    }

    #[test]
    fn insert_truncates() {
        assert_eq!(insert(0xA, 28, 4), 0xA000_0000);
        assert_eq!(insert(0x1F, 0, 4), 0xF);
        assert_eq!(insert(0x3F, 8, 4), 0xF00);
    }

    #[test]
    fn split_fields() {
        // 0xAB: high nibble at 8..=11, low nibble at 0..=3
        let word = insert_slice(0xAB, 4, 4, 8) | insert_slice(0xAB, 0, 4, 0);
        assert_eq!(word, 0xA0B);
        assert_eq!(extract_slice(word, 4, 4, 8) | extract_slice(word, 0, 4, 0), 0xAB);
    }

    #[test]
    fn insert_then_extract() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        for _ in 0..256 {
            let pos = rng.random_range(0..28);
            let width = rng.random_range(1..=(32 - pos));
            let value = rng.random::<u32>() & mask(width);
            assert_eq!(extract(insert(value, pos, width), pos, width), value);
        }
    }

    #[test]
    fn flags() {
        assert_eq!(set_flag(true, 20), 0x0010_0000);
        assert_eq!(set_flag(false, 20), 0);
        assert!(check_flag(0x0010_0000, 20));
        assert!(!check_flag(0x0010_0000, 21));
    }

    #[test]
    fn unchecked_accepts_wide_values() {
        let verification = FieldVerification::Unchecked;
        assert_eq!(verification.unsigned("rd", 0x1F, 4), Ok(0x1F));
        assert_eq!(verification.insert("rd", 0x1F, 12, 4), Ok(0xF000));
        assert_eq!(verification.signed("offset", 0x0100_0000, 24), Ok(0x0100_0000));
    }

    #[test]
    fn checked_rejects_wide_values() {
        let verification = FieldVerification::Checked;
        assert_eq!(verification.insert("rd", 0xF, 12, 4), Ok(0xF000));
        assert_eq!(
            verification.insert("rd", 0x10, 12, 4),
            Err(CodecError::FieldRange {
                field: "rd",
                value: 0x10,
                width: 4
            })
        );
        assert_eq!(verification.signed("offset", -1, 24), Ok(-1));
        assert_eq!(verification.signed("offset", -(1 << 23), 24), Ok(-(1 << 23)));
        assert!(verification.signed("offset", 1 << 24, 24).is_err());
        assert!(verification.signed("offset", -(1 << 24) - 1, 24).is_err());
    }
}
