//! # VFP instruction encoding
//!
//! VFP instructions live in the coprocessor space of the base instruction
//! set (coprocessor numbers 10 and 11). They get their own accessor contract,
//! [`VfpEncodingDefinition`], and their own classification table, tried
//! before the base table so that the generic coprocessor formats only see
//! words that are not VFP.
//!
//! ## Register fields
//!
//! A 5-bit single precision register number is split into a 4-bit field and
//! one extra bit elsewhere in the word:
//!
//! ```text
//!          4-bit field    extra bit (low bit of Sx)
//!   Fd     bits 15-12     bit 22
//!   Fn     bits 19-16     bit 7
//!   Fm     bits 3-0       bit 5
//! ```
//!
//! For double precision operands the 4-bit field is the `d` number and the
//! extra bit must be zero, so in single precision numbering a double is
//! always even.

use serde::{Deserialize, Serialize};

use crate::arm::encoding::MatchRule;
use crate::bitwise::{
    FieldVerification, check_flag, extract, extract_slice, insert, insert_slice, set_flag,
};
use crate::error::Result;
use crate::vfp::registers::FpRegister;

/// Instruction format tags of the VFP extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VfpFormat {
    /// `FMSTAT`.
    ConditionCodeTransfer,
    /// `FMRX`/`FMXR`.
    SystemRegisterTransfer,
    /// `FMRDL`/`FMDLR`.
    RegisterTransferLow,
    /// `FMRDH`/`FMDHR`.
    RegisterTransferHigh,
    /// `FMRS`/`FMSR`.
    RegisterTransfer32,
    /// `FMRRD`/`FMDRR`/`FMRRS`/`FMSRR`.
    RegisterTransfer64,
    /// `FLD`/`FST`.
    DataTransfer,
    /// `FCMPZ`/`FCMPEZ`.
    CompareToZero,
    /// `FCVTDS`/`FCVTSD`.
    ConvertFloatToFloat,
    UnaryDataOperation,
    BinaryDataOperation,
    /// `FLDM`/`FSTM`.
    BlockDataTransfer,
}

/// Classification table of VFPv2, highest priority first.
pub const VFP_V2_MATCH_TABLE: [MatchRule<VfpFormat>; 12] = [
    MatchRule::new(VfpFormat::ConditionCodeTransfer, 0x0EF1_FA10, 0x0FFF_FFFF),
    MatchRule::new(VfpFormat::SystemRegisterTransfer, 0x0EE0_0A10, 0x0FE0_0FFF),
    MatchRule::new(VfpFormat::RegisterTransferLow, 0x0E00_0B10, 0x0FE0_0FFF),
    MatchRule::new(VfpFormat::RegisterTransferHigh, 0x0E20_0B10, 0x0FE0_0FFF),
    MatchRule::new(VfpFormat::RegisterTransfer32, 0x0E00_0A10, 0x0FE0_0F7F),
    MatchRule::new(VfpFormat::RegisterTransfer64, 0x0C40_0A10, 0x0FE0_0ED0),
    MatchRule::new(VfpFormat::DataTransfer, 0x0D00_0A00, 0x0F20_0E00),
    MatchRule::new(VfpFormat::CompareToZero, 0x0EB5_0A40, 0x0FBF_0E7F),
    MatchRule::new(VfpFormat::ConvertFloatToFloat, 0x0EB7_0AC0, 0x0FBF_0ED0),
    MatchRule::new(VfpFormat::UnaryDataOperation, 0x0EB0_0A40, 0x0FB0_0E50),
    MatchRule::new(VfpFormat::BinaryDataOperation, 0x0E00_0A00, 0x0F00_0E10),
    MatchRule::new(VfpFormat::BlockDataTransfer, 0x0C00_0A00, 0x0E00_0E00),
];

/// Per-field accessors for the VFP instructions.
#[allow(clippy::missing_errors_doc)]
pub trait VfpEncodingDefinition: std::fmt::Debug + Send + Sync {
    fn match_table(&self) -> &'static [MatchRule<VfpFormat>];

    fn opcode(&self, format: VfpFormat) -> u32 {
        self.match_table()
            .iter()
            .find(|rule| rule.format == format)
            .map_or(0, |rule| rule.value)
    }

    fn condition_codes(&self, op: u32) -> u32;
    fn set_condition_codes(&self, value: u32) -> Result<u32>;

    /// ARM register `Rn`.
    fn rn(&self, op: u32) -> u32;
    fn set_rn(&self, value: u32) -> Result<u32>;
    /// ARM register `Rd`.
    fn rd(&self, op: u32) -> u32;
    fn set_rd(&self, value: u32) -> Result<u32>;

    fn fd(&self, op: u32) -> FpRegister;
    fn set_fd(&self, value: FpRegister) -> Result<u32>;
    fn fn_(&self, op: u32) -> FpRegister;
    fn set_fn(&self, value: FpRegister) -> Result<u32>;
    fn fm(&self, op: u32) -> FpRegister;
    fn set_fm(&self, value: FpRegister) -> Result<u32>;

    fn system_register(&self, op: u32) -> u32;
    fn set_system_register(&self, value: u32) -> Result<u32>;

    fn is_double(&self, op: u32) -> bool;
    fn set_is_double(&self, value: bool) -> u32;

    /// The `E` bit of compares: signal on quiet NaN operands too.
    fn check_nan(&self, op: u32) -> bool;
    fn set_check_nan(&self, value: bool) -> u32;

    fn binary_operation(&self, op: u32) -> u32;
    fn set_binary_operation(&self, value: u32) -> Result<u32>;
    fn unary_operation(&self, op: u32) -> u32;
    fn set_unary_operation(&self, value: u32) -> Result<u32>;

    /// The `L` bit of register transfers: set when the value moves to the ARM side.
    fn is_from_coprocessor(&self, op: u32) -> bool;
    fn set_is_from_coprocessor(&self, value: bool) -> u32;

    fn data_transfer_is_load(&self, op: u32) -> bool;
    fn set_data_transfer_is_load(&self, value: bool) -> u32;
    fn data_transfer_should_write_back(&self, op: u32) -> bool;
    fn set_data_transfer_should_write_back(&self, value: bool) -> u32;
    fn data_transfer_is_up(&self, op: u32) -> bool;
    fn set_data_transfer_is_up(&self, value: bool) -> u32;
    fn data_transfer_is_pre_indexing(&self, op: u32) -> bool;
    fn set_data_transfer_is_pre_indexing(&self, value: bool) -> u32;
    /// Offset in words.
    fn data_transfer_offset(&self, op: u32) -> u32;
    fn set_data_transfer_offset(&self, value: u32) -> Result<u32>;
}

/// Bit layout of the VFPv2 extension.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VfpV2Encoding {
    verification: FieldVerification,
}

impl VfpV2Encoding {
    #[must_use]
    pub const fn new(verification: FieldVerification) -> Self {
        Self { verification }
    }

    fn put(&self, field: &'static str, value: u32, bit_pos: u8, width: u8) -> Result<u32> {
        self.verification.insert(field, value, bit_pos, width)
    }

    fn put_register(
        &self,
        field: &'static str,
        value: FpRegister,
        field_pos: u8,
        extra_pos: u8,
    ) -> Result<u32> {
        let index = self.verification.unsigned(field, value.index(), 5)?;
        Ok(insert_slice(index, 1, 4, field_pos) | insert_slice(index, 0, 1, extra_pos))
    }
}

fn register(op: u32, field_pos: u8, extra_pos: u8) -> FpRegister {
    FpRegister::new(extract_slice(op, 1, 4, field_pos) | extract_slice(op, 0, 1, extra_pos))
}

impl VfpEncodingDefinition for VfpV2Encoding {
    fn match_table(&self) -> &'static [MatchRule<VfpFormat>] {
        &VFP_V2_MATCH_TABLE
    }

    fn condition_codes(&self, op: u32) -> u32 {
        extract(op, 28, 4)
    }

    fn set_condition_codes(&self, value: u32) -> Result<u32> {
        self.put("condition", value, 28, 4)
    }

    fn rn(&self, op: u32) -> u32 {
        extract(op, 16, 4)
    }

    fn set_rn(&self, value: u32) -> Result<u32> {
        self.put("Rn", value, 16, 4)
    }

    fn rd(&self, op: u32) -> u32 {
        extract(op, 12, 4)
    }

    fn set_rd(&self, value: u32) -> Result<u32> {
        self.put("Rd", value, 12, 4)
    }

    fn fd(&self, op: u32) -> FpRegister {
        register(op, 12, 22)
    }

    fn set_fd(&self, value: FpRegister) -> Result<u32> {
        self.put_register("Fd", value, 12, 22)
    }

    fn fn_(&self, op: u32) -> FpRegister {
        register(op, 16, 7)
    }

    fn set_fn(&self, value: FpRegister) -> Result<u32> {
        self.put_register("Fn", value, 16, 7)
    }

    fn fm(&self, op: u32) -> FpRegister {
        register(op, 0, 5)
    }

    fn set_fm(&self, value: FpRegister) -> Result<u32> {
        self.put_register("Fm", value, 0, 5)
    }

    fn system_register(&self, op: u32) -> u32 {
        extract(op, 16, 4)
    }

    fn set_system_register(&self, value: u32) -> Result<u32> {
        self.put("system register", value, 16, 4)
    }

    fn is_double(&self, op: u32) -> bool {
        check_flag(op, 8)
    }

    fn set_is_double(&self, value: bool) -> u32 {
        set_flag(value, 8)
    }

    fn check_nan(&self, op: u32) -> bool {
        check_flag(op, 7)
    }

    fn set_check_nan(&self, value: bool) -> u32 {
        set_flag(value, 7)
    }

    fn binary_operation(&self, op: u32) -> u32 {
        extract_slice(op, 3, 1, 23)
            | extract_slice(op, 2, 1, 21)
            | extract_slice(op, 1, 1, 20)
            | extract_slice(op, 0, 1, 6)
    }

    fn set_binary_operation(&self, value: u32) -> Result<u32> {
        let value = self.verification.unsigned("binary operation", value, 4)?;
        Ok(insert_slice(value, 3, 1, 23)
            | insert_slice(value, 2, 1, 21)
            | insert_slice(value, 1, 1, 20)
            | insert_slice(value, 0, 1, 6))
    }

    fn unary_operation(&self, op: u32) -> u32 {
        extract_slice(op, 1, 4, 16) | extract_slice(op, 0, 1, 7)
    }

    fn set_unary_operation(&self, value: u32) -> Result<u32> {
        let value = self.verification.unsigned("unary operation", value, 5)?;
        Ok(insert_slice(value, 1, 4, 16) | insert_slice(value, 0, 1, 7))
    }

    fn is_from_coprocessor(&self, op: u32) -> bool {
        check_flag(op, 20)
    }

    fn set_is_from_coprocessor(&self, value: bool) -> u32 {
        set_flag(value, 20)
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
        extract(op, 0, 8)
    }

    fn set_data_transfer_offset(&self, value: u32) -> Result<u32> {
        Ok(insert(
            self.verification.unsigned("transfer offset", value, 8)?,
            0,
            8,
        ))
    }
}
