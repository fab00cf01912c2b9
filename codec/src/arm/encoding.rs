//! # Base instruction set encoding
//!
//! The instruction formats in [`instructions`](super::instructions) never
//! touch bit positions directly. They read and write every operand through
//! [`EncodingDefinition`], one getter/setter pair per semantic field, so a
//! different concrete layout can be slotted in without touching them.
//!
//! Getters extract a field from a whole word. Setters return a word with only
//! that field's bits populated; a format's encoder ORs the fragments together
//! with its fixed opcode pattern.
//!
//! ## Generic register slots
//!
//! ```text
//!  31  28 27        20 19   16 15   12 11    8 7            0
//! ┌──────┬────────────┬───────┬───────┬───────┬──────────────┐
//! │ cond │  opcode..  │ Reg1  │ Reg2  │ Reg3  │ ....  Reg4   │
//! └──────┴────────────┴───────┴───────┴───────┴──────────────┘
//!   DataProcessing:     Rn      Rd      Rs      Rm
//!   Multiply:           Rd      Rn      Rs      Rm
//!   MultiplyLong:       RdHi    RdLo    Rs      Rm
//!   Load/Store:         Rn      Rd      Rs      Rm
//! ```
//!
//! ## Classification
//!
//! [`ArmV5Encoding`] also owns the ordered table of [`MatchRule`]s used to
//! pick a format for a raw word. The first rule whose `(word & mask) == value`
//! holds wins, so narrow patterns that live inside wider ones (Breakpoint,
//! the status register transfers, BX) come first.

use serde::{Deserialize, Serialize};

use crate::bitwise::{
    FieldVerification, check_flag, extract, extract_slice, insert, insert_slice, set_flag,
};
use crate::error::Result;

/// Fetch-advance of the pipeline: reading `pc` yields the instruction address plus 8.
pub const PC_OFFSET: u32 = 8;

pub const REGISTER_SP: u32 = 13;
pub const REGISTER_LR: u32 = 14;
pub const REGISTER_PC: u32 = 15;

/// A word belongs to `format` iff `(word & mask) == value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRule<F> {
    pub format: F,
    pub mask: u32,
    pub value: u32,
}

impl<F: Copy> MatchRule<F> {
    pub const fn new(format: F, value: u32, mask: u32) -> Self {
        Self {
            format,
            mask,
            value,
        }
    }

    #[must_use]
    pub const fn matches(&self, word: u32) -> bool {
        word & self.mask == self.value
    }

    /// Whether some word could satisfy both rules.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        (self.value ^ other.value) & (self.mask & other.mask) == 0
    }
}

/// Scans `table` top to bottom and returns the first format matching `word`.
pub fn classify<F: Copy>(table: &[MatchRule<F>], word: u32) -> Option<F> {
    table
        .iter()
        .find(|rule| rule.matches(word))
        .map(|rule| rule.format)
}

/// Instruction format tags of the base instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArmFormat {
    Mrs,
    MsrRegister,
    MsrImmediate,
    DataProcessingImmediate,
    DataProcessingShiftImmediate,
    DataProcessingShiftRegister,
    Multiply,
    MultiplyLong,
    SingleDataSwap,
    BranchAndExchange,
    HalfwordTransferRegister,
    HalfwordTransferImmediate,
    SingleTransferImmediate,
    SingleTransferShiftImmediate,
    SingleTransferShiftRegister,
    /// Architecturally undefined space. Classifying into it yields no instruction.
    Undefined,
    BlockDataTransfer,
    Branch,
    CoprocessorDataTransfer,
    CoprocessorDataOperation,
    CoprocessorRegisterTransfer,
    SoftwareInterrupt,
    Breakpoint,
}

/// Per-field accessors for the base instruction set.
///
/// Register and small unsigned fields are plain `u32`; flags are `bool`.
/// Setters of multi-bit fields fail with
/// [`CodecError::FieldRange`](crate::error::CodecError::FieldRange) when the
/// layout runs with [`FieldVerification::Checked`] and the value is too wide.
#[allow(clippy::missing_errors_doc)]
pub trait EncodingDefinition: std::fmt::Debug + Send + Sync {
    /// Ordered classification table.
    fn match_table(&self) -> &'static [MatchRule<ArmFormat>];

    /// Fixed bits of `format`, ORed into every encoded word of that format.
    fn opcode(&self, format: ArmFormat) -> u32 {
        self.match_table()
            .iter()
            .find(|rule| rule.format == format)
            .map_or(0, |rule| rule.value)
    }

    fn condition_codes(&self, op: u32) -> u32;
    fn set_condition_codes(&self, value: u32) -> Result<u32>;

    fn should_set_conditions(&self, op: u32) -> bool;
    fn set_should_set_conditions(&self, value: bool) -> u32;

    /// Bits 19-16: `rn`, or `rd` of the multiplies. Range errors name it `rn`.
    fn register1(&self, op: u32) -> u32;
    fn set_register1(&self, value: u32) -> Result<u32>;
    /// Bits 15-12: `rd`, or `rn` of the multiplies.
    fn register2(&self, op: u32) -> u32;
    fn set_register2(&self, value: u32) -> Result<u32>;
    fn register3(&self, op: u32) -> u32;
    fn set_register3(&self, value: u32) -> Result<u32>;
    fn register4(&self, op: u32) -> u32;
    fn set_register4(&self, value: u32) -> Result<u32>;

    fn multiply_is_accumulate(&self, op: u32) -> bool;
    fn set_multiply_is_accumulate(&self, value: bool) -> u32;
    fn multiply_is_signed(&self, op: u32) -> bool;
    fn set_multiply_is_signed(&self, value: bool) -> u32;

    fn status_register_is_spsr(&self, op: u32) -> bool;
    fn set_status_register_is_spsr(&self, value: bool) -> u32;
    fn status_register_fields(&self, op: u32) -> u32;
    fn set_status_register_fields(&self, value: u32) -> Result<u32>;

    fn shift_type(&self, op: u32) -> u32;
    fn set_shift_type(&self, value: u32) -> Result<u32>;
    fn shift_immediate(&self, op: u32) -> u32;
    fn set_shift_immediate(&self, value: u32) -> Result<u32>;
    fn shift_register(&self, op: u32) -> u32;
    fn set_shift_register(&self, value: u32) -> Result<u32>;

    fn data_processing_operation(&self, op: u32) -> u32;
    fn set_data_processing_operation(&self, value: u32) -> Result<u32>;
    fn data_processing_immediate_seed(&self, op: u32) -> u32;
    fn set_data_processing_immediate_seed(&self, value: u32) -> Result<u32>;
    fn data_processing_immediate_rotation(&self, op: u32) -> u32;
    fn set_data_processing_immediate_rotation(&self, value: u32) -> Result<u32>;

    /// The 32-bit value a seed/rotation pair stands for.
    fn data_processing_immediate_value(&self, seed: u32, rotation: u32) -> u32;

    /// Some `(seed, rotation)` reproducing `value`, if there is one.
    fn data_processing_find_immediate(&self, value: u32) -> Option<(u32, u32)>;

    fn data_transfer_is_load(&self, op: u32) -> bool;
    fn set_data_transfer_is_load(&self, value: bool) -> u32;
    fn data_transfer_should_write_back(&self, op: u32) -> bool;
    fn set_data_transfer_should_write_back(&self, value: bool) -> u32;
    fn data_transfer_is_byte_transfer(&self, op: u32) -> bool;
    fn set_data_transfer_is_byte_transfer(&self, value: bool) -> u32;
    fn data_transfer_is_up(&self, op: u32) -> bool;
    fn set_data_transfer_is_up(&self, value: bool) -> u32;
    fn data_transfer_is_pre_indexing(&self, op: u32) -> bool;
    fn set_data_transfer_is_pre_indexing(&self, value: bool) -> u32;
    fn data_transfer_offset(&self, op: u32) -> u32;
    fn set_data_transfer_offset(&self, value: u32) -> Result<u32>;

    fn halfword_transfer_kind(&self, op: u32) -> u32;
    fn set_halfword_transfer_kind(&self, value: u32) -> Result<u32>;
    fn halfword_transfer_offset(&self, op: u32) -> u32;
    fn set_halfword_transfer_offset(&self, value: u32) -> Result<u32>;

    fn block_transfer_load_psr(&self, op: u32) -> bool;
    fn set_block_transfer_load_psr(&self, value: bool) -> u32;
    fn block_transfer_register_list(&self, op: u32) -> u32;
    fn set_block_transfer_register_list(&self, value: u32) -> Result<u32>;

    fn branch_is_link(&self, op: u32) -> bool;
    fn set_branch_is_link(&self, value: bool) -> u32;
    /// Byte offset relative to `pc`, already sign extended and scaled.
    fn branch_offset(&self, op: u32) -> i32;
    fn set_branch_offset(&self, value: i32) -> Result<u32>;

    fn coproc_number(&self, op: u32) -> u32;
    fn set_coproc_number(&self, value: u32) -> Result<u32>;

    fn coproc_register_transfer_is_mrc(&self, op: u32) -> bool;
    fn set_coproc_register_transfer_is_mrc(&self, value: bool) -> u32;
    fn coproc_register_transfer_op1(&self, op: u32) -> u32;
    fn set_coproc_register_transfer_op1(&self, value: u32) -> Result<u32>;
    fn coproc_register_transfer_op2(&self, op: u32) -> u32;
    fn set_coproc_register_transfer_op2(&self, value: u32) -> Result<u32>;
    fn coproc_register_transfer_crn(&self, op: u32) -> u32;
    fn set_coproc_register_transfer_crn(&self, value: u32) -> Result<u32>;
    fn coproc_register_transfer_crm(&self, op: u32) -> u32;
    fn set_coproc_register_transfer_crm(&self, value: u32) -> Result<u32>;
    fn coproc_register_transfer_rd(&self, op: u32) -> u32;
    fn set_coproc_register_transfer_rd(&self, value: u32) -> Result<u32>;

    fn coproc_data_transfer_is_load(&self, op: u32) -> bool;
    fn set_coproc_data_transfer_is_load(&self, value: bool) -> u32;
    fn coproc_data_transfer_should_write_back(&self, op: u32) -> bool;
    fn set_coproc_data_transfer_should_write_back(&self, value: bool) -> u32;
    fn coproc_data_transfer_is_wide(&self, op: u32) -> bool;
    fn set_coproc_data_transfer_is_wide(&self, value: bool) -> u32;
    fn coproc_data_transfer_is_up(&self, op: u32) -> bool;
    fn set_coproc_data_transfer_is_up(&self, value: bool) -> u32;
    fn coproc_data_transfer_is_pre_indexing(&self, op: u32) -> bool;
    fn set_coproc_data_transfer_is_pre_indexing(&self, value: bool) -> u32;
    fn coproc_data_transfer_rn(&self, op: u32) -> u32;
    fn set_coproc_data_transfer_rn(&self, value: u32) -> Result<u32>;
    fn coproc_data_transfer_crd(&self, op: u32) -> u32;
    fn set_coproc_data_transfer_crd(&self, value: u32) -> Result<u32>;
    fn coproc_data_transfer_offset(&self, op: u32) -> u32;
    fn set_coproc_data_transfer_offset(&self, value: u32) -> Result<u32>;

    fn coproc_data_operation_op1(&self, op: u32) -> u32;
    fn set_coproc_data_operation_op1(&self, value: u32) -> Result<u32>;
    fn coproc_data_operation_op2(&self, op: u32) -> u32;
    fn set_coproc_data_operation_op2(&self, value: u32) -> Result<u32>;
    fn coproc_data_operation_crn(&self, op: u32) -> u32;
    fn set_coproc_data_operation_crn(&self, value: u32) -> Result<u32>;
    fn coproc_data_operation_crm(&self, op: u32) -> u32;
    fn set_coproc_data_operation_crm(&self, value: u32) -> Result<u32>;
    fn coproc_data_operation_crd(&self, op: u32) -> u32;
    fn set_coproc_data_operation_crd(&self, value: u32) -> Result<u32>;

    fn software_interrupt_immediate(&self, op: u32) -> u32;
    fn set_software_interrupt_immediate(&self, value: u32) -> Result<u32>;

    fn breakpoint_immediate(&self, op: u32) -> u32;
    fn set_breakpoint_immediate(&self, value: u32) -> Result<u32>;
}

/// Classification table of the ARMv4/v5 layout, highest priority first.
///
/// BX sits in the middle of the data processing space (it looks like a
/// `TEQ` with `S` clear and a register shift), so it is tested before the
/// data processing rules. Undefined must precede the block, branch and
/// coprocessor rules because it terminates the scan.
pub const ARM_V5_MATCH_TABLE: [MatchRule<ArmFormat>; 23] = [
    MatchRule::new(ArmFormat::Breakpoint, 0xE120_0070, 0xFFF0_00F0),
    MatchRule::new(ArmFormat::Mrs, 0x010F_0000, 0x0FBF_0FFF),
    MatchRule::new(ArmFormat::MsrRegister, 0x0120_F000, 0x0FB0_FFF0),
    MatchRule::new(ArmFormat::MsrImmediate, 0x0320_F000, 0x0FB0_F000),
    MatchRule::new(ArmFormat::BranchAndExchange, 0x012F_FF10, 0x0FFF_FFF0),
    MatchRule::new(ArmFormat::DataProcessingImmediate, 0x0200_0000, 0x0E00_0000),
    MatchRule::new(ArmFormat::DataProcessingShiftImmediate, 0x0000_0000, 0x0E00_0010),
    MatchRule::new(ArmFormat::DataProcessingShiftRegister, 0x0000_0010, 0x0E00_0090),
    MatchRule::new(ArmFormat::Multiply, 0x0000_0090, 0x0FC0_00F0),
    MatchRule::new(ArmFormat::MultiplyLong, 0x0080_0090, 0x0F80_00F0),
    MatchRule::new(ArmFormat::SingleDataSwap, 0x0100_0090, 0x0FB0_0FF0),
    MatchRule::new(ArmFormat::HalfwordTransferRegister, 0x0000_0090, 0x0E40_0F90),
    MatchRule::new(ArmFormat::HalfwordTransferImmediate, 0x0040_0090, 0x0E40_0090),
    MatchRule::new(ArmFormat::SingleTransferImmediate, 0x0400_0000, 0x0E00_0000),
    MatchRule::new(ArmFormat::SingleTransferShiftImmediate, 0x0600_0000, 0x0E00_0010),
    MatchRule::new(ArmFormat::SingleTransferShiftRegister, 0x0600_0010, 0x0E00_0090),
    MatchRule::new(ArmFormat::Undefined, 0x0600_0090, 0x0E00_0090),
    MatchRule::new(ArmFormat::BlockDataTransfer, 0x0800_0000, 0x0E00_0000),
    MatchRule::new(ArmFormat::Branch, 0x0A00_0000, 0x0E00_0000),
    MatchRule::new(ArmFormat::CoprocessorDataTransfer, 0x0C00_0000, 0x0E00_0000),
    MatchRule::new(ArmFormat::CoprocessorDataOperation, 0x0E00_0000, 0x0F00_0010),
    MatchRule::new(ArmFormat::CoprocessorRegisterTransfer, 0x0E00_0010, 0x0F00_0010),
    MatchRule::new(ArmFormat::SoftwareInterrupt, 0x0F00_0000, 0x0F00_0000),
];

/// Bit layout of the ARMv4/v5 integer instruction set.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArmV5Encoding {
    verification: FieldVerification,
}

impl ArmV5Encoding {
    #[must_use]
    pub const fn new(verification: FieldVerification) -> Self {
        Self { verification }
    }

    #[must_use]
    pub const fn verification(&self) -> FieldVerification {
        self.verification
    }

    fn put(&self, field: &'static str, value: u32, bit_pos: u8, width: u8) -> Result<u32> {
        self.verification.insert(field, value, bit_pos, width)
    }
}

impl EncodingDefinition for ArmV5Encoding {
    fn match_table(&self) -> &'static [MatchRule<ArmFormat>] {
        &ARM_V5_MATCH_TABLE
    }

    fn condition_codes(&self, op: u32) -> u32 {
        extract(op, 28, 4)
    }

    fn set_condition_codes(&self, value: u32) -> Result<u32> {
        self.put("condition", value, 28, 4)
    }

    fn should_set_conditions(&self, op: u32) -> bool {
        check_flag(op, 20)
    }

    fn set_should_set_conditions(&self, value: bool) -> u32 {
        set_flag(value, 20)
    }

    fn register1(&self, op: u32) -> u32 {
        extract(op, 16, 4)
    }

    fn set_register1(&self, value: u32) -> Result<u32> {
        self.put("rn", value, 16, 4)
    }

    fn register2(&self, op: u32) -> u32 {
        extract(op, 12, 4)
    }

    fn set_register2(&self, value: u32) -> Result<u32> {
        self.put("rd", value, 12, 4)
    }

    fn register3(&self, op: u32) -> u32 {
        extract(op, 8, 4)
    }

    fn set_register3(&self, value: u32) -> Result<u32> {
        self.put("rs", value, 8, 4)
    }

    fn register4(&self, op: u32) -> u32 {
        extract(op, 0, 4)
    }

    fn set_register4(&self, value: u32) -> Result<u32> {
        self.put("rm", value, 0, 4)
    }

    fn multiply_is_accumulate(&self, op: u32) -> bool {
        check_flag(op, 21)
    }

    fn set_multiply_is_accumulate(&self, value: bool) -> u32 {
        set_flag(value, 21)
    }

    fn multiply_is_signed(&self, op: u32) -> bool {
        check_flag(op, 22)
    }

    fn set_multiply_is_signed(&self, value: bool) -> u32 {
        set_flag(value, 22)
    }

    fn status_register_is_spsr(&self, op: u32) -> bool {
        check_flag(op, 22)
    }

    fn set_status_register_is_spsr(&self, value: bool) -> u32 {
        set_flag(value, 22)
    }

    fn status_register_fields(&self, op: u32) -> u32 {
        extract(op, 16, 4)
    }

    fn set_status_register_fields(&self, value: u32) -> Result<u32> {
        self.put("status register fields", value, 16, 4)
    }

    fn shift_type(&self, op: u32) -> u32 {
        extract(op, 5, 2)
    }

    fn set_shift_type(&self, value: u32) -> Result<u32> {
        self.put("shift type", value, 5, 2)
    }

    fn shift_immediate(&self, op: u32) -> u32 {
        extract(op, 7, 5)
    }

    fn set_shift_immediate(&self, value: u32) -> Result<u32> {
        self.put("shift amount", value, 7, 5)
    }

    fn shift_register(&self, op: u32) -> u32 {
        extract(op, 8, 4)
    }

    fn set_shift_register(&self, value: u32) -> Result<u32> {
        self.put("shift register", value, 8, 4)
    }

    fn data_processing_operation(&self, op: u32) -> u32 {
        extract(op, 21, 4)
    }

    fn set_data_processing_operation(&self, value: u32) -> Result<u32> {
        self.put("alu operation", value, 21, 4)
    }

    fn data_processing_immediate_seed(&self, op: u32) -> u32 {
        extract(op, 0, 8)
    }

    fn set_data_processing_immediate_seed(&self, value: u32) -> Result<u32> {
        self.put("immediate seed", value, 0, 8)
    }

    fn data_processing_immediate_rotation(&self, op: u32) -> u32 {
        extract(op, 8, 4)
    }

    fn set_data_processing_immediate_rotation(&self, value: u32) -> Result<u32> {
        self.put("immediate rotation", value, 8, 4)
    }

    fn data_processing_immediate_value(&self, seed: u32, rotation: u32) -> u32 {
        seed.rotate_right(rotation * 2)
    }

    fn data_processing_find_immediate(&self, value: u32) -> Option<(u32, u32)> {
        let mut seed = value;
        for rotation in 0..16 {
            if seed & !0xFF == 0 {
                return Some((seed, rotation));
            }
            seed = seed.rotate_left(2);
        }

        None
    }

    fn data_transfer_is_load(&self, op: u32) -> bool {
        check_flag(op, 20)
    }

    fn set_data_transfer_is_load(&self, value: bool) -> u32 {
        set_flag(value, 20)
    }

    fn data_transfer_should_write_back(&self, op: u32) -> bool {
        check_flag(op, 21)
    }

    fn set_data_transfer_should_write_back(&self, value: bool) -> u32 {
        set_flag(value, 21)
    }

    fn data_transfer_is_byte_transfer(&self, op: u32) -> bool {
        check_flag(op, 22)
    }

    fn set_data_transfer_is_byte_transfer(&self, value: bool) -> u32 {
        set_flag(value, 22)
    }

    fn data_transfer_is_up(&self, op: u32) -> bool {
        check_flag(op, 23)
    }

    fn set_data_transfer_is_up(&self, value: bool) -> u32 {
        set_flag(value, 23)
    }

    fn data_transfer_is_pre_indexing(&self, op: u32) -> bool {
        check_flag(op, 24)
    }

    fn set_data_transfer_is_pre_indexing(&self, value: bool) -> u32 {
        set_flag(value, 24)
    }

    fn data_transfer_offset(&self, op: u32) -> u32 {
        extract(op, 0, 12)
    }

    fn set_data_transfer_offset(&self, value: u32) -> Result<u32> {
        self.put("transfer offset", value, 0, 12)
    }

    fn halfword_transfer_kind(&self, op: u32) -> u32 {
        extract(op, 5, 2)
    }

    fn set_halfword_transfer_kind(&self, value: u32) -> Result<u32> {
        self.put("halfword kind", value, 5, 2)
    }

    fn halfword_transfer_offset(&self, op: u32) -> u32 {
        extract_slice(op, 4, 4, 8) | extract_slice(op, 0, 4, 0)
    }

    fn set_halfword_transfer_offset(&self, value: u32) -> Result<u32> {
        let value = self.verification.unsigned("halfword offset", value, 8)?;
        Ok(insert_slice(value, 4, 4, 8) | insert_slice(value, 0, 4, 0))
    }

    fn block_transfer_load_psr(&self, op: u32) -> bool {
        check_flag(op, 22)
    }

    fn set_block_transfer_load_psr(&self, value: bool) -> u32 {
        set_flag(value, 22)
    }

    fn block_transfer_register_list(&self, op: u32) -> u32 {
        extract(op, 0, 16)
    }

    fn set_block_transfer_register_list(&self, value: u32) -> Result<u32> {
        self.put("register list", value, 0, 16)
    }

    fn branch_is_link(&self, op: u32) -> bool {
        check_flag(op, 24)
    }

    fn set_branch_is_link(&self, value: bool) -> u32 {
        set_flag(value, 24)
    }

    #[allow(clippy::cast_possible_wrap)]
    fn branch_offset(&self, op: u32) -> i32 {
        // move the 24-bit field to the top, then an arithmetic shift both
        // sign extends it and multiplies it by 4
        ((op << 8) as i32) >> 6
    }

    #[allow(clippy::cast_sign_loss)]
    fn set_branch_offset(&self, value: i32) -> Result<u32> {
        let words = self.verification.signed("branch offset", value >> 2, 24)?;
        Ok(insert(words as u32, 0, 24))
    }

    fn coproc_number(&self, op: u32) -> u32 {
        extract(op, 8, 4)
    }

    fn set_coproc_number(&self, value: u32) -> Result<u32> {
        self.put("coprocessor number", value, 8, 4)
    }

    fn coproc_register_transfer_is_mrc(&self, op: u32) -> bool {
        check_flag(op, 20)
    }

    fn set_coproc_register_transfer_is_mrc(&self, value: bool) -> u32 {
        set_flag(value, 20)
    }

    fn coproc_register_transfer_op1(&self, op: u32) -> u32 {
        extract(op, 21, 3)
    }

    fn set_coproc_register_transfer_op1(&self, value: u32) -> Result<u32> {
        self.put("coprocessor op1", value, 21, 3)
    }

    fn coproc_register_transfer_op2(&self, op: u32) -> u32 {
        extract(op, 5, 3)
    }

    fn set_coproc_register_transfer_op2(&self, value: u32) -> Result<u32> {
        self.put("coprocessor op2", value, 5, 3)
    }

    fn coproc_register_transfer_crn(&self, op: u32) -> u32 {
        extract(op, 16, 4)
    }

    fn set_coproc_register_transfer_crn(&self, value: u32) -> Result<u32> {
        self.put("CRn", value, 16, 4)
    }

    fn coproc_register_transfer_crm(&self, op: u32) -> u32 {
        extract(op, 0, 4)
    }

    fn set_coproc_register_transfer_crm(&self, value: u32) -> Result<u32> {
        self.put("CRm", value, 0, 4)
    }

    fn coproc_register_transfer_rd(&self, op: u32) -> u32 {
        extract(op, 12, 4)
    }

    fn set_coproc_register_transfer_rd(&self, value: u32) -> Result<u32> {
        self.put("Rd", value, 12, 4)
    }

    fn coproc_data_transfer_is_load(&self, op: u32) -> bool {
        check_flag(op, 20)
    }

    fn set_coproc_data_transfer_is_load(&self, value: bool) -> u32 {
        set_flag(value, 20)
    }

    fn coproc_data_transfer_should_write_back(&self, op: u32) -> bool {
        check_flag(op, 21)
    }

    fn set_coproc_data_transfer_should_write_back(&self, value: bool) -> u32 {
        set_flag(value, 21)
    }

    fn coproc_data_transfer_is_wide(&self, op: u32) -> bool {
        check_flag(op, 22)
    }

    fn set_coproc_data_transfer_is_wide(&self, value: bool) -> u32 {
        set_flag(value, 22)
    }

    fn coproc_data_transfer_is_up(&self, op: u32) -> bool {
        check_flag(op, 23)
    }

    fn set_coproc_data_transfer_is_up(&self, value: bool) -> u32 {
        set_flag(value, 23)
    }

    fn coproc_data_transfer_is_pre_indexing(&self, op: u32) -> bool {
        check_flag(op, 24)
    }

    fn set_coproc_data_transfer_is_pre_indexing(&self, value: bool) -> u32 {
        set_flag(value, 24)
    }

    fn coproc_data_transfer_rn(&self, op: u32) -> u32 {
        extract(op, 16, 4)
    }

    fn set_coproc_data_transfer_rn(&self, value: u32) -> Result<u32> {
        self.put("Rn", value, 16, 4)
    }

    fn coproc_data_transfer_crd(&self, op: u32) -> u32 {
        extract(op, 12, 4)
    }

    fn set_coproc_data_transfer_crd(&self, value: u32) -> Result<u32> {
        self.put("CRd", value, 12, 4)
    }

    fn coproc_data_transfer_offset(&self, op: u32) -> u32 {
        extract(op, 0, 8)
    }

    fn set_coproc_data_transfer_offset(&self, value: u32) -> Result<u32> {
        self.put("coprocessor offset", value, 0, 8)
    }

    fn coproc_data_operation_op1(&self, op: u32) -> u32 {
        extract(op, 20, 4)
    }

    fn set_coproc_data_operation_op1(&self, value: u32) -> Result<u32> {
        self.put("coprocessor op1", value, 20, 4)
    }

    fn coproc_data_operation_op2(&self, op: u32) -> u32 {
        extract(op, 5, 3)
    }

    fn set_coproc_data_operation_op2(&self, value: u32) -> Result<u32> {
        self.put("coprocessor op2", value, 5, 3)
    }

    fn coproc_data_operation_crn(&self, op: u32) -> u32 {
        extract(op, 16, 4)
    }

    fn set_coproc_data_operation_crn(&self, value: u32) -> Result<u32> {
        self.put("CRn", value, 16, 4)
    }

    fn coproc_data_operation_crm(&self, op: u32) -> u32 {
        extract(op, 0, 4)
    }

    fn set_coproc_data_operation_crm(&self, value: u32) -> Result<u32> {
        self.put("CRm", value, 0, 4)
    }

    fn coproc_data_operation_crd(&self, op: u32) -> u32 {
        extract(op, 12, 4)
    }

    fn set_coproc_data_operation_crd(&self, value: u32) -> Result<u32> {
        self.put("CRd", value, 12, 4)
    }

    fn software_interrupt_immediate(&self, op: u32) -> u32 {
        extract(op, 0, 24)
    }

    fn set_software_interrupt_immediate(&self, value: u32) -> Result<u32> {
        self.put("swi immediate", value, 0, 24)
    }

    fn breakpoint_immediate(&self, op: u32) -> u32 {
        extract_slice(op, 4, 12, 8) | extract_slice(op, 0, 4, 0)
    }

    fn set_breakpoint_immediate(&self, value: u32) -> Result<u32> {
        let value = self.verification.unsigned("breakpoint immediate", value, 16)?;
        Ok(insert_slice(value, 4, 12, 8) | insert_slice(value, 0, 4, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use pretty_assertions::assert_eq;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    const ENCODING: ArmV5Encoding = ArmV5Encoding::new(FieldVerification::Checked);

    /// Pairs whose patterns intersect and rely on table order to resolve.
    const PRIORITY_PAIRS: [(ArmFormat, ArmFormat); 10] = [
        (ArmFormat::Breakpoint, ArmFormat::DataProcessingShiftRegister),
        (ArmFormat::Mrs, ArmFormat::DataProcessingShiftImmediate),
        (ArmFormat::MsrRegister, ArmFormat::DataProcessingShiftImmediate),
        (ArmFormat::MsrImmediate, ArmFormat::DataProcessingImmediate),
        (ArmFormat::BranchAndExchange, ArmFormat::DataProcessingShiftRegister),
        (ArmFormat::Multiply, ArmFormat::HalfwordTransferRegister),
        (ArmFormat::MultiplyLong, ArmFormat::HalfwordTransferRegister),
        (ArmFormat::MultiplyLong, ArmFormat::HalfwordTransferImmediate),
        (ArmFormat::SingleDataSwap, ArmFormat::HalfwordTransferRegister),
        (ArmFormat::SingleDataSwap, ArmFormat::HalfwordTransferImmediate),
    ];

    #[test]
    fn table_overlaps_only_where_ordered() {
        let table = ENCODING.match_table();
        for (i, first) in table.iter().enumerate() {
            for second in &table[i + 1..] {
                let pair = (first.format, second.format);
                assert_eq!(
                    first.overlaps(second),
                    PRIORITY_PAIRS.contains(&pair),
                    "{pair:?}"
                );
            }
        }
    }

    #[test]
    fn every_format_has_a_rule() {
        let table = ENCODING.match_table();
        for rule in table {
            assert_eq!(rule.value & !rule.mask, 0, "{:?}", rule.format);
            assert_eq!(ENCODING.opcode(rule.format), rule.value);
        }
    }

    #[test]
    fn classify_priority() {
        let table = ENCODING.match_table();
        assert_eq!(classify(table, 0xE120_0070), Some(ArmFormat::Breakpoint));
        assert_eq!(classify(table, 0xE12F_FF1E), Some(ArmFormat::BranchAndExchange));
        assert_eq!(classify(table, 0xE10F_0000), Some(ArmFormat::Mrs));
        assert_eq!(classify(table, 0xE000_0091), Some(ArmFormat::Multiply));
        assert_eq!(classify(table, 0xE1D0_00B0), Some(ArmFormat::HalfwordTransferImmediate));
        assert_eq!(classify(table, 0xE7F0_00F0), Some(ArmFormat::Undefined));
        assert_eq!(classify(table, 0xEF00_0000), Some(ArmFormat::SoftwareInterrupt));
    }

    #[test]
    fn rotated_immediates() {
        assert_eq!(ENCODING.data_processing_immediate_value(0xFF, 0), 0xFF);
        assert_eq!(ENCODING.data_processing_immediate_value(0xFF, 4), 0xFF00_0000);
        assert_eq!(ENCODING.data_processing_immediate_value(0x3F, 15), 0xFC);
        assert_eq!(ENCODING.data_processing_find_immediate(0xFF00_0000), Some((0xFF, 4)));
        assert_eq!(ENCODING.data_processing_find_immediate(0), Some((0, 0)));
        assert_eq!(ENCODING.data_processing_find_immediate(0x101), None);
        assert_eq!(ENCODING.data_processing_find_immediate(0xFFFF), None);
    }

    #[test]
    fn every_representable_immediate_is_found() {
        for rotation in 0..16 {
            for seed in 0..=0xFF {
                let value = ENCODING.data_processing_immediate_value(seed, rotation);
                let (found_seed, found_rotation) = ENCODING
                    .data_processing_find_immediate(value)
                    .unwrap_or_else(|| panic!("0x{value:08X} not found"));
                assert_eq!(
                    ENCODING.data_processing_immediate_value(found_seed, found_rotation),
                    value
                );
            }
        }
    }

    #[test]
    fn branch_offsets() {
        // BL with a 0x7F word offset
        assert_eq!(ENCODING.branch_offset(0xEB00_007F), 0x1FC);
        // all ones: one word back
        assert_eq!(ENCODING.branch_offset(0xEAFF_FFFF), -4);
        assert_eq!(ENCODING.set_branch_offset(-4), Ok(0x00FF_FFFF));
        assert_eq!(ENCODING.set_branch_offset(0x100), Ok(0x40));
        assert!(ENCODING.set_branch_offset(1 << 26).is_err());
    }

    #[test]
    fn split_fields() {
        assert_eq!(ENCODING.halfword_transfer_offset(0xE1D0_1AB4), 0xA4);
        assert_eq!(ENCODING.set_halfword_transfer_offset(0xA4), Ok(0xA04));
        assert_eq!(ENCODING.breakpoint_immediate(0xE121_2374), 0x1234);
        assert_eq!(ENCODING.set_breakpoint_immediate(0x1234), Ok(0x0001_2304));
    }

    #[test]
    fn checked_setters_reject_wide_values() {
        assert_eq!(
            ENCODING.set_register2(16),
            Err(CodecError::FieldRange {
                field: "rd",
                value: 16,
                width: 4
            })
        );
        assert!(ENCODING.set_shift_immediate(32).is_err());
        assert!(ENCODING.set_breakpoint_immediate(0x1_0000).is_err());

        let unchecked = ArmV5Encoding::default();
        assert_eq!(unchecked.set_register2(0x1F), Ok(0xF000));
    }

    #[test]
    fn register_slots() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..64 {
            let word: u32 = rng.random();
            let rebuilt = ENCODING.set_condition_codes(ENCODING.condition_codes(word)).unwrap()
                | ENCODING.set_register1(ENCODING.register1(word)).unwrap()
                | ENCODING.set_register2(ENCODING.register2(word)).unwrap()
                | ENCODING.set_register3(ENCODING.register3(word)).unwrap()
                | ENCODING.set_register4(ENCODING.register4(word)).unwrap();
            assert_eq!(rebuilt, word & 0xF00F_FF0F);
        }
    }
}
