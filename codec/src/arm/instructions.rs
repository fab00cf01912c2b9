//! # Base instruction model
//!
//! [`ArmInstruction`] is the typed form of one base-ISA word: one variant per
//! [`ArmFormat`], each carrying only the fields that format has. Decoding
//! classifies a word against the active [`EncodingDefinition`] table and
//! pulls the fields out through its accessors; encoding pushes them back in.
//!
//! ## Shift normalization
//!
//! Two immediate shift encodings are overloaded:
//!
//! ```text
//!  raw type  raw amount   meaning
//! ┌────────┬────────────┬──────────────────────┐
//! │ LSR    │     0      │ LSR #32              │
//! │ ASR    │     0      │ ASR #32              │
//! │ ROR    │     0      │ RRX (rotate by 1     │
//! │        │            │ through the carry)   │
//! └────────┴────────────┴──────────────────────┘
//! ```
//!
//! Decoding produces the right-hand column, encoding maps it back, so
//! `decode(encode(i)) == i` for every decoded `i`.
//!
//! ```
//! use codec::arm::encoding::ArmV5Encoding;
//! use codec::arm::flags::ShiftKind;
//! use codec::arm::instructions::ArmInstruction;
//!
//! let encoding = ArmV5Encoding::default();
//! // MOV r0, r1, ROR #0
//! let instruction = ArmInstruction::decode(&encoding, 0xE1A0_0061).unwrap();
//! let ArmInstruction::DataProcessingShiftImmediate { operand, .. } = instruction else {
//!     panic!("not a data processing instruction");
//! };
//! assert_eq!(operand.shift_kind, ShiftKind::Rrx);
//! assert_eq!(operand.shift_amount, 1);
//! assert_eq!(instruction.encode(&encoding), Ok(0xE1A0_0061));
//! ```

use serde::{Deserialize, Serialize};

use crate::arm::alu_instruction::ArmModeAluInstr;
use crate::arm::condition::Condition;
use crate::arm::encoding::{ArmFormat, EncodingDefinition, classify};
use crate::arm::flags::{
    HalfwordTransferKind, Indexing, LoadStoreKind, Offsetting, ReadWriteKind, ShiftKind,
};
use crate::arm::psr::{PsrFields, PsrKind};
use crate::error::{CodecError, Result};

/// Addressing flags shared by every memory transfer (bits 24, 23, 21, 20).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addressing {
    pub load_store: LoadStoreKind,
    pub indexing: Indexing,
    pub offsetting: Offsetting,
    pub write_back: bool,
}

impl Addressing {
    /// Pre-indexed, no write back: the plain `[Rn, #offset]` form.
    #[must_use]
    pub const fn offset(load_store: LoadStoreKind, offsetting: Offsetting) -> Self {
        Self {
            load_store,
            indexing: Indexing::Pre,
            offsetting,
            write_back: false,
        }
    }

    fn decode(encoding: &dyn EncodingDefinition, op: u32) -> Self {
        Self {
            load_store: encoding.data_transfer_is_load(op).into(),
            indexing: encoding.data_transfer_is_pre_indexing(op).into(),
            offsetting: encoding.data_transfer_is_up(op).into(),
            write_back: encoding.data_transfer_should_write_back(op),
        }
    }

    fn encode(self, encoding: &dyn EncodingDefinition) -> u32 {
        encoding.set_data_transfer_is_load(self.load_store.into())
            | encoding.set_data_transfer_is_pre_indexing(self.indexing.into())
            | encoding.set_data_transfer_is_up(self.offsetting.into())
            | encoding.set_data_transfer_should_write_back(self.write_back)
    }
}

/// `Rm` shifted by a constant. Amounts are already normalized (see module docs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftedOperand {
    pub rm: u32,
    pub shift_kind: ShiftKind,
    pub shift_amount: u32,
}

impl ShiftedOperand {
    fn decode(encoding: &dyn EncodingDefinition, op: u32) -> Self {
        let raw_kind = ShiftKind::from(encoding.shift_type(op));
        let raw_amount = encoding.shift_immediate(op);
        let (shift_kind, shift_amount) = match (raw_kind, raw_amount) {
            (ShiftKind::Lsr | ShiftKind::Asr, 0) => (raw_kind, 32),
            (ShiftKind::Ror, 0) => (ShiftKind::Rrx, 1),
            _ => (raw_kind, raw_amount),
        };

        Self {
            rm: encoding.register4(op),
            shift_kind,
            shift_amount,
        }
    }

    fn encode(self, encoding: &dyn EncodingDefinition) -> Result<u32> {
        let raw_amount = match (self.shift_kind, self.shift_amount) {
            (ShiftKind::Rrx, _) | (ShiftKind::Lsr | ShiftKind::Asr, 32) => 0,
            (_, amount) => amount,
        };

        Ok(encoding.set_register4(self.rm)?
            | encoding.set_shift_type(self.shift_kind.into())?
            | encoding.set_shift_immediate(raw_amount)?)
    }
}

/// `Rm` shifted by the bottom byte of `Rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterShiftedOperand {
    pub rm: u32,
    pub shift_kind: ShiftKind,
    pub rs: u32,
}

impl RegisterShiftedOperand {
    fn decode(encoding: &dyn EncodingDefinition, op: u32) -> Self {
        Self {
            rm: encoding.register4(op),
            shift_kind: encoding.shift_type(op).into(),
            rs: encoding.shift_register(op),
        }
    }

    fn encode(self, encoding: &dyn EncodingDefinition) -> Result<u32> {
        Ok(encoding.set_register4(self.rm)?
            | encoding.set_shift_type(self.shift_kind.into())?
            | encoding.set_shift_register(self.rs)?)
    }
}

/// A decoded base-ISA instruction.
///
/// | Variant                          | Example                      |
/// |----------------------------------|------------------------------|
/// | `Mrs`                            | `MRS r0,CPSR`                |
/// | `MsrRegister`/`MsrImmediate`     | `MSR CPSR_cf,r0`             |
/// | `DataProcessing*`                | `ADD r0,r1,#0x4`             |
/// | `Multiply`/`MultiplyLong`        | `MLA`, `UMULL`               |
/// | `SingleDataSwap`                 | `SWPB r0,r1,[r2]`            |
/// | `BranchAndExchange`              | `BX lr`                      |
/// | `HalfwordTransfer*`              | `LDRSH r0,[r1,#2]`           |
/// | `SingleTransfer*`                | `LDR r0,[pc,#0x10]`, `PLD`   |
/// | `BlockDataTransfer`              | `STMFD sp!,{r4-r6,lr}`       |
/// | `Branch`                         | `BL 0x00001108`              |
/// | `Coprocessor*`                   | `LDC`, `CDP`, `MRC`          |
/// | `SoftwareInterrupt`/`Breakpoint` | `SWI #0x000011`, `BKPT`      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmInstruction {
    Mrs {
        condition: Condition,
        psr: PsrKind,
        rd: u32,
    },
    MsrRegister {
        condition: Condition,
        psr: PsrKind,
        fields: PsrFields,
        rm: u32,
    },
    MsrImmediate {
        condition: Condition,
        psr: PsrKind,
        fields: PsrFields,
        seed: u32,
        rotation: u32,
    },
    DataProcessingImmediate {
        condition: Condition,
        alu_instruction: ArmModeAluInstr,
        set_conditions: bool,
        rn: u32,
        rd: u32,
        seed: u32,
        rotation: u32,
    },
    DataProcessingShiftImmediate {
        condition: Condition,
        alu_instruction: ArmModeAluInstr,
        set_conditions: bool,
        rn: u32,
        rd: u32,
        operand: ShiftedOperand,
    },
    DataProcessingShiftRegister {
        condition: Condition,
        alu_instruction: ArmModeAluInstr,
        set_conditions: bool,
        rn: u32,
        rd: u32,
        operand: RegisterShiftedOperand,
    },
    Multiply {
        condition: Condition,
        set_conditions: bool,
        accumulate: bool,
        rd: u32,
        rn: u32,
        rs: u32,
        rm: u32,
    },
    MultiplyLong {
        condition: Condition,
        set_conditions: bool,
        accumulate: bool,
        signed: bool,
        rd_hi: u32,
        rd_lo: u32,
        rs: u32,
        rm: u32,
    },
    SingleDataSwap {
        condition: Condition,
        quantity: ReadWriteKind,
        rn: u32,
        rd: u32,
        rm: u32,
    },
    BranchAndExchange {
        condition: Condition,
        rn: u32,
    },
    HalfwordTransferRegister {
        condition: Condition,
        transfer_kind: HalfwordTransferKind,
        addressing: Addressing,
        rn: u32,
        rd: u32,
        rm: u32,
    },
    HalfwordTransferImmediate {
        condition: Condition,
        transfer_kind: HalfwordTransferKind,
        addressing: Addressing,
        rn: u32,
        rd: u32,
        offset: u32,
    },
    SingleTransferImmediate {
        condition: Condition,
        quantity: ReadWriteKind,
        addressing: Addressing,
        rn: u32,
        rd: u32,
        offset: u32,
    },
    SingleTransferShiftImmediate {
        condition: Condition,
        quantity: ReadWriteKind,
        addressing: Addressing,
        rn: u32,
        rd: u32,
        operand: ShiftedOperand,
    },
    SingleTransferShiftRegister {
        condition: Condition,
        quantity: ReadWriteKind,
        addressing: Addressing,
        rn: u32,
        rd: u32,
        operand: RegisterShiftedOperand,
    },
    BlockDataTransfer {
        condition: Condition,
        addressing: Addressing,
        load_psr: bool,
        rn: u32,
        register_list: u32,
    },
    Branch {
        condition: Condition,
        link: bool,
        /// Byte offset from the instruction address plus 8.
        offset: i32,
    },
    CoprocessorDataTransfer {
        condition: Condition,
        addressing: Addressing,
        /// The `N` bit, transfer length selected by the coprocessor.
        wide: bool,
        cp_number: u32,
        rn: u32,
        crd: u32,
        offset: u32,
    },
    CoprocessorDataOperation {
        condition: Condition,
        cp_number: u32,
        op1: u32,
        op2: u32,
        crn: u32,
        crm: u32,
        crd: u32,
    },
    CoprocessorRegisterTransfer {
        condition: Condition,
        /// `MRC` (coprocessor to ARM) when `Load`, `MCR` otherwise.
        direction: LoadStoreKind,
        cp_number: u32,
        op1: u32,
        op2: u32,
        crn: u32,
        crm: u32,
        rd: u32,
    },
    SoftwareInterrupt {
        condition: Condition,
        comment: u32,
    },
    /// Always unconditional: the condition nibble is part of the pattern.
    Breakpoint {
        immediate: u32,
    },
}

impl ArmInstruction {
    /// Classifies `op` and extracts its fields.
    ///
    /// Returns `None` when the word matches no rule or lands in the
    /// architecturally undefined space.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn decode(encoding: &dyn EncodingDefinition, op: u32) -> Option<Self> {
        let Some(format) = classify(encoding.match_table(), op) else {
            tracing::debug!("0x{op:08X} matches no base instruction format");
            return None;
        };

        let condition = Condition::from(encoding.condition_codes(op));
        let instruction = match format {
            ArmFormat::Undefined => {
                tracing::debug!("0x{op:08X} lies in the undefined instruction space");
                return None;
            }
            ArmFormat::Mrs => Self::Mrs {
                condition,
                psr: encoding.status_register_is_spsr(op).into(),
                rd: encoding.register2(op),
            },
            ArmFormat::MsrRegister => Self::MsrRegister {
                condition,
                psr: encoding.status_register_is_spsr(op).into(),
                fields: PsrFields::new(encoding.status_register_fields(op)),
                rm: encoding.register4(op),
            },
            ArmFormat::MsrImmediate => Self::MsrImmediate {
                condition,
                psr: encoding.status_register_is_spsr(op).into(),
                fields: PsrFields::new(encoding.status_register_fields(op)),
                seed: encoding.data_processing_immediate_seed(op),
                rotation: encoding.data_processing_immediate_rotation(op),
            },
            ArmFormat::DataProcessingImmediate => Self::DataProcessingImmediate {
                condition,
                alu_instruction: encoding.data_processing_operation(op).into(),
                set_conditions: encoding.should_set_conditions(op),
                rn: encoding.register1(op),
                rd: encoding.register2(op),
                seed: encoding.data_processing_immediate_seed(op),
                rotation: encoding.data_processing_immediate_rotation(op),
            },
            ArmFormat::DataProcessingShiftImmediate => Self::DataProcessingShiftImmediate {
                condition,
                alu_instruction: encoding.data_processing_operation(op).into(),
                set_conditions: encoding.should_set_conditions(op),
                rn: encoding.register1(op),
                rd: encoding.register2(op),
                operand: ShiftedOperand::decode(encoding, op),
            },
            ArmFormat::DataProcessingShiftRegister => Self::DataProcessingShiftRegister {
                condition,
                alu_instruction: encoding.data_processing_operation(op).into(),
                set_conditions: encoding.should_set_conditions(op),
                rn: encoding.register1(op),
                rd: encoding.register2(op),
                operand: RegisterShiftedOperand::decode(encoding, op),
            },
            ArmFormat::Multiply => Self::Multiply {
                condition,
                set_conditions: encoding.should_set_conditions(op),
                accumulate: encoding.multiply_is_accumulate(op),
                rd: encoding.register1(op),
                rn: encoding.register2(op),
                rs: encoding.register3(op),
                rm: encoding.register4(op),
            },
            ArmFormat::MultiplyLong => Self::MultiplyLong {
                condition,
                set_conditions: encoding.should_set_conditions(op),
                accumulate: encoding.multiply_is_accumulate(op),
                signed: encoding.multiply_is_signed(op),
                rd_hi: encoding.register1(op),
                rd_lo: encoding.register2(op),
                rs: encoding.register3(op),
                rm: encoding.register4(op),
            },
            ArmFormat::SingleDataSwap => Self::SingleDataSwap {
                condition,
                quantity: encoding.data_transfer_is_byte_transfer(op).into(),
                rn: encoding.register1(op),
                rd: encoding.register2(op),
                rm: encoding.register4(op),
            },
            ArmFormat::BranchAndExchange => Self::BranchAndExchange {
                condition,
                rn: encoding.register4(op),
            },
            ArmFormat::HalfwordTransferRegister => Self::HalfwordTransferRegister {
                condition,
                transfer_kind: encoding.halfword_transfer_kind(op).into(),
                addressing: Addressing::decode(encoding, op),
                rn: encoding.register1(op),
                rd: encoding.register2(op),
                rm: encoding.register4(op),
            },
            ArmFormat::HalfwordTransferImmediate => Self::HalfwordTransferImmediate {
                condition,
                transfer_kind: encoding.halfword_transfer_kind(op).into(),
                addressing: Addressing::decode(encoding, op),
                rn: encoding.register1(op),
                rd: encoding.register2(op),
                offset: encoding.halfword_transfer_offset(op),
            },
            ArmFormat::SingleTransferImmediate => Self::SingleTransferImmediate {
                condition,
                quantity: encoding.data_transfer_is_byte_transfer(op).into(),
                addressing: Addressing::decode(encoding, op),
                rn: encoding.register1(op),
                rd: encoding.register2(op),
                offset: encoding.data_transfer_offset(op),
            },
            ArmFormat::SingleTransferShiftImmediate => Self::SingleTransferShiftImmediate {
                condition,
                quantity: encoding.data_transfer_is_byte_transfer(op).into(),
                addressing: Addressing::decode(encoding, op),
                rn: encoding.register1(op),
                rd: encoding.register2(op),
                operand: ShiftedOperand::decode(encoding, op),
            },
            ArmFormat::SingleTransferShiftRegister => Self::SingleTransferShiftRegister {
                condition,
                quantity: encoding.data_transfer_is_byte_transfer(op).into(),
                addressing: Addressing::decode(encoding, op),
                rn: encoding.register1(op),
                rd: encoding.register2(op),
                operand: RegisterShiftedOperand::decode(encoding, op),
            },
            ArmFormat::BlockDataTransfer => Self::BlockDataTransfer {
                condition,
                addressing: Addressing::decode(encoding, op),
                load_psr: encoding.block_transfer_load_psr(op),
                rn: encoding.register1(op),
                register_list: encoding.block_transfer_register_list(op),
            },
            ArmFormat::Branch => Self::Branch {
                condition,
                link: encoding.branch_is_link(op),
                offset: encoding.branch_offset(op),
            },
            ArmFormat::CoprocessorDataTransfer => Self::CoprocessorDataTransfer {
                condition,
                addressing: Addressing {
                    load_store: encoding.coproc_data_transfer_is_load(op).into(),
                    indexing: encoding.coproc_data_transfer_is_pre_indexing(op).into(),
                    offsetting: encoding.coproc_data_transfer_is_up(op).into(),
                    write_back: encoding.coproc_data_transfer_should_write_back(op),
                },
                wide: encoding.coproc_data_transfer_is_wide(op),
                cp_number: encoding.coproc_number(op),
                rn: encoding.coproc_data_transfer_rn(op),
                crd: encoding.coproc_data_transfer_crd(op),
                offset: encoding.coproc_data_transfer_offset(op),
            },
            ArmFormat::CoprocessorDataOperation => Self::CoprocessorDataOperation {
                condition,
                cp_number: encoding.coproc_number(op),
                op1: encoding.coproc_data_operation_op1(op),
                op2: encoding.coproc_data_operation_op2(op),
                crn: encoding.coproc_data_operation_crn(op),
                crm: encoding.coproc_data_operation_crm(op),
                crd: encoding.coproc_data_operation_crd(op),
            },
            ArmFormat::CoprocessorRegisterTransfer => Self::CoprocessorRegisterTransfer {
                condition,
                direction: encoding.coproc_register_transfer_is_mrc(op).into(),
                cp_number: encoding.coproc_number(op),
                op1: encoding.coproc_register_transfer_op1(op),
                op2: encoding.coproc_register_transfer_op2(op),
                crn: encoding.coproc_register_transfer_crn(op),
                crm: encoding.coproc_register_transfer_crm(op),
                rd: encoding.coproc_register_transfer_rd(op),
            },
            ArmFormat::SoftwareInterrupt => Self::SoftwareInterrupt {
                condition,
                comment: encoding.software_interrupt_immediate(op),
            },
            ArmFormat::Breakpoint => Self::Breakpoint {
                immediate: encoding.breakpoint_immediate(op),
            },
        };

        Some(instruction)
    }

    /// Rebuilds the instruction word.
    ///
    /// # Errors
    ///
    /// [`CodecError::FieldRange`] when `encoding` verifies fields and one of
    /// them does not fit.
    #[allow(clippy::too_many_lines)]
    pub fn encode(&self, encoding: &dyn EncodingDefinition) -> Result<u32> {
        let fixed = encoding.opcode(self.format());
        let condition = match self.condition() {
            Some(condition) => encoding.set_condition_codes(condition.into())?,
            None => 0,
        };

        let fields = match *self {
            Self::Mrs { psr, rd, .. } => {
                encoding.set_status_register_is_spsr(psr.into()) | encoding.set_register2(rd)?
            }
            Self::MsrRegister { psr, fields, rm, .. } => {
                encoding.set_status_register_is_spsr(psr.into())
                    | encoding.set_status_register_fields(fields.bits())?
                    | encoding.set_register4(rm)?
            }
            Self::MsrImmediate {
                psr,
                fields,
                seed,
                rotation,
                ..
            } => {
                encoding.set_status_register_is_spsr(psr.into())
                    | encoding.set_status_register_fields(fields.bits())?
                    | encoding.set_data_processing_immediate_seed(seed)?
                    | encoding.set_data_processing_immediate_rotation(rotation)?
            }
            Self::DataProcessingImmediate {
                alu_instruction,
                set_conditions,
                rn,
                rd,
                seed,
                rotation,
                ..
            } => {
                encode_alu_header(encoding, alu_instruction, set_conditions, rn, rd)?
                    | encoding.set_data_processing_immediate_seed(seed)?
                    | encoding.set_data_processing_immediate_rotation(rotation)?
            }
            Self::DataProcessingShiftImmediate {
                alu_instruction,
                set_conditions,
                rn,
                rd,
                operand,
                ..
            } => {
                encode_alu_header(encoding, alu_instruction, set_conditions, rn, rd)?
                    | operand.encode(encoding)?
            }
            Self::DataProcessingShiftRegister {
                alu_instruction,
                set_conditions,
                rn,
                rd,
                operand,
                ..
            } => {
                encode_alu_header(encoding, alu_instruction, set_conditions, rn, rd)?
                    | operand.encode(encoding)?
            }
            Self::Multiply {
                set_conditions,
                accumulate,
                rd,
                rn,
                rs,
                rm,
                ..
            } => {
                encoding.set_should_set_conditions(set_conditions)
                    | encoding.set_multiply_is_accumulate(accumulate)
                    | encoding.set_register1(rd)?
                    | encoding.set_register2(rn)?
                    | encoding.set_register3(rs)?
                    | encoding.set_register4(rm)?
            }
            Self::MultiplyLong {
                set_conditions,
                accumulate,
                signed,
                rd_hi,
                rd_lo,
                rs,
                rm,
                ..
            } => {
                encoding.set_should_set_conditions(set_conditions)
                    | encoding.set_multiply_is_accumulate(accumulate)
                    | encoding.set_multiply_is_signed(signed)
                    | encoding.set_register1(rd_hi)?
                    | encoding.set_register2(rd_lo)?
                    | encoding.set_register3(rs)?
                    | encoding.set_register4(rm)?
            }
            Self::SingleDataSwap {
                quantity, rn, rd, rm, ..
            } => {
                encoding.set_data_transfer_is_byte_transfer(quantity.into())
                    | encoding.set_register1(rn)?
                    | encoding.set_register2(rd)?
                    | encoding.set_register4(rm)?
            }
            Self::BranchAndExchange { rn, .. } => encoding.set_register4(rn)?,
            Self::HalfwordTransferRegister {
                transfer_kind,
                addressing,
                rn,
                rd,
                rm,
                ..
            } => {
                encoding.set_halfword_transfer_kind(transfer_kind.into())?
                    | addressing.encode(encoding)
                    | encoding.set_register1(rn)?
                    | encoding.set_register2(rd)?
                    | encoding.set_register4(rm)?
            }
            Self::HalfwordTransferImmediate {
                transfer_kind,
                addressing,
                rn,
                rd,
                offset,
                ..
            } => {
                encoding.set_halfword_transfer_kind(transfer_kind.into())?
                    | addressing.encode(encoding)
                    | encoding.set_register1(rn)?
                    | encoding.set_register2(rd)?
                    | encoding.set_halfword_transfer_offset(offset)?
            }
            Self::SingleTransferImmediate {
                quantity,
                addressing,
                rn,
                rd,
                offset,
                ..
            } => {
                encode_transfer_header(encoding, quantity, addressing, rn, rd)?
                    | encoding.set_data_transfer_offset(offset)?
            }
            Self::SingleTransferShiftImmediate {
                quantity,
                addressing,
                rn,
                rd,
                operand,
                ..
            } => {
                encode_transfer_header(encoding, quantity, addressing, rn, rd)?
                    | operand.encode(encoding)?
            }
            Self::SingleTransferShiftRegister {
                quantity,
                addressing,
                rn,
                rd,
                operand,
                ..
            } => {
                encode_transfer_header(encoding, quantity, addressing, rn, rd)?
                    | operand.encode(encoding)?
            }
            Self::BlockDataTransfer {
                addressing,
                load_psr,
                rn,
                register_list,
                ..
            } => {
                addressing.encode(encoding)
                    | encoding.set_block_transfer_load_psr(load_psr)
                    | encoding.set_register1(rn)?
                    | encoding.set_block_transfer_register_list(register_list)?
            }
            Self::Branch { link, offset, .. } => {
                encoding.set_branch_is_link(link) | encoding.set_branch_offset(offset)?
            }
            Self::CoprocessorDataTransfer {
                addressing,
                wide,
                cp_number,
                rn,
                crd,
                offset,
                ..
            } => {
                encoding.set_coproc_data_transfer_is_load(addressing.load_store.into())
                    | encoding.set_coproc_data_transfer_is_pre_indexing(addressing.indexing.into())
                    | encoding.set_coproc_data_transfer_is_up(addressing.offsetting.into())
                    | encoding.set_coproc_data_transfer_should_write_back(addressing.write_back)
                    | encoding.set_coproc_data_transfer_is_wide(wide)
                    | encoding.set_coproc_number(cp_number)?
                    | encoding.set_coproc_data_transfer_rn(rn)?
                    | encoding.set_coproc_data_transfer_crd(crd)?
                    | encoding.set_coproc_data_transfer_offset(offset)?
            }
            Self::CoprocessorDataOperation {
                cp_number,
                op1,
                op2,
                crn,
                crm,
                crd,
                ..
            } => {
                encoding.set_coproc_number(cp_number)?
                    | encoding.set_coproc_data_operation_op1(op1)?
                    | encoding.set_coproc_data_operation_op2(op2)?
                    | encoding.set_coproc_data_operation_crn(crn)?
                    | encoding.set_coproc_data_operation_crm(crm)?
                    | encoding.set_coproc_data_operation_crd(crd)?
            }
            Self::CoprocessorRegisterTransfer {
                direction,
                cp_number,
                op1,
                op2,
                crn,
                crm,
                rd,
                ..
            } => {
                encoding.set_coproc_register_transfer_is_mrc(direction.into())
                    | encoding.set_coproc_number(cp_number)?
                    | encoding.set_coproc_register_transfer_op1(op1)?
                    | encoding.set_coproc_register_transfer_op2(op2)?
                    | encoding.set_coproc_register_transfer_crn(crn)?
                    | encoding.set_coproc_register_transfer_crm(crm)?
                    | encoding.set_coproc_register_transfer_rd(rd)?
            }
            Self::SoftwareInterrupt { comment, .. } => {
                encoding.set_software_interrupt_immediate(comment)?
            }
            Self::Breakpoint { immediate } => encoding.set_breakpoint_immediate(immediate)?,
        };

        Ok(fixed | condition | fields)
    }

    #[must_use]
    pub const fn format(&self) -> ArmFormat {
        match self {
            Self::Mrs { .. } => ArmFormat::Mrs,
            Self::MsrRegister { .. } => ArmFormat::MsrRegister,
            Self::MsrImmediate { .. } => ArmFormat::MsrImmediate,
            Self::DataProcessingImmediate { .. } => ArmFormat::DataProcessingImmediate,
            Self::DataProcessingShiftImmediate { .. } => ArmFormat::DataProcessingShiftImmediate,
            Self::DataProcessingShiftRegister { .. } => ArmFormat::DataProcessingShiftRegister,
            Self::Multiply { .. } => ArmFormat::Multiply,
            Self::MultiplyLong { .. } => ArmFormat::MultiplyLong,
            Self::SingleDataSwap { .. } => ArmFormat::SingleDataSwap,
            Self::BranchAndExchange { .. } => ArmFormat::BranchAndExchange,
            Self::HalfwordTransferRegister { .. } => ArmFormat::HalfwordTransferRegister,
            Self::HalfwordTransferImmediate { .. } => ArmFormat::HalfwordTransferImmediate,
            Self::SingleTransferImmediate { .. } => ArmFormat::SingleTransferImmediate,
            Self::SingleTransferShiftImmediate { .. } => ArmFormat::SingleTransferShiftImmediate,
            Self::SingleTransferShiftRegister { .. } => ArmFormat::SingleTransferShiftRegister,
            Self::BlockDataTransfer { .. } => ArmFormat::BlockDataTransfer,
            Self::Branch { .. } => ArmFormat::Branch,
            Self::CoprocessorDataTransfer { .. } => ArmFormat::CoprocessorDataTransfer,
            Self::CoprocessorDataOperation { .. } => ArmFormat::CoprocessorDataOperation,
            Self::CoprocessorRegisterTransfer { .. } => ArmFormat::CoprocessorRegisterTransfer,
            Self::SoftwareInterrupt { .. } => ArmFormat::SoftwareInterrupt,
            Self::Breakpoint { .. } => ArmFormat::Breakpoint,
        }
    }

    /// `None` only for `Breakpoint`, which has no condition field.
    #[must_use]
    pub const fn condition(&self) -> Option<Condition> {
        match self {
            Self::Mrs { condition, .. }
            | Self::MsrRegister { condition, .. }
            | Self::MsrImmediate { condition, .. }
            | Self::DataProcessingImmediate { condition, .. }
            | Self::DataProcessingShiftImmediate { condition, .. }
            | Self::DataProcessingShiftRegister { condition, .. }
            | Self::Multiply { condition, .. }
            | Self::MultiplyLong { condition, .. }
            | Self::SingleDataSwap { condition, .. }
            | Self::BranchAndExchange { condition, .. }
            | Self::HalfwordTransferRegister { condition, .. }
            | Self::HalfwordTransferImmediate { condition, .. }
            | Self::SingleTransferImmediate { condition, .. }
            | Self::SingleTransferShiftImmediate { condition, .. }
            | Self::SingleTransferShiftRegister { condition, .. }
            | Self::BlockDataTransfer { condition, .. }
            | Self::Branch { condition, .. }
            | Self::CoprocessorDataTransfer { condition, .. }
            | Self::CoprocessorDataOperation { condition, .. }
            | Self::CoprocessorRegisterTransfer { condition, .. }
            | Self::SoftwareInterrupt { condition, .. } => Some(*condition),
            Self::Breakpoint { .. } => None,
        }
    }

    /// `B{L}{cond}` to `offset` bytes past `pc`.
    #[must_use]
    pub const fn branch(condition: Condition, link: bool, offset: i32) -> Self {
        Self::Branch {
            condition,
            link,
            offset,
        }
    }

    /// `BX{cond} rn`.
    #[must_use]
    pub const fn branch_and_exchange(condition: Condition, rn: u32) -> Self {
        Self::BranchAndExchange { condition, rn }
    }

    /// Data processing with a constant second operand.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnrepresentableImmediate`] when no 8-bit seed rotated by
    /// an even amount equals `value`. The caller has to materialize the
    /// constant some other way.
    pub fn data_processing_immediate(
        encoding: &dyn EncodingDefinition,
        condition: Condition,
        alu_instruction: ArmModeAluInstr,
        set_conditions: bool,
        rn: u32,
        rd: u32,
        value: u32,
    ) -> Result<Self> {
        let (seed, rotation) = encoding
            .data_processing_find_immediate(value)
            .ok_or(CodecError::UnrepresentableImmediate { value })?;

        Ok(Self::DataProcessingImmediate {
            condition,
            alu_instruction,
            set_conditions,
            rn,
            rd,
            seed,
            rotation,
        })
    }

    /// Data processing with `Rm` shifted by a constant as second operand.
    #[must_use]
    pub const fn data_processing_register(
        condition: Condition,
        alu_instruction: ArmModeAluInstr,
        set_conditions: bool,
        rn: u32,
        rd: u32,
        operand: ShiftedOperand,
    ) -> Self {
        Self::DataProcessingShiftImmediate {
            condition,
            alu_instruction,
            set_conditions,
            rn,
            rd,
            operand,
        }
    }

    /// `LDR`/`STR{B} rd,[rn,#offset]`; a negative offset selects down.
    #[must_use]
    pub const fn load_store_immediate(
        condition: Condition,
        load_store: LoadStoreKind,
        quantity: ReadWriteKind,
        rd: u32,
        rn: u32,
        offset: i32,
    ) -> Self {
        let offsetting = if offset < 0 {
            Offsetting::Down
        } else {
            Offsetting::Up
        };

        Self::SingleTransferImmediate {
            condition,
            quantity,
            addressing: Addressing::offset(load_store, offsetting),
            rn,
            rd,
            offset: offset.unsigned_abs(),
        }
    }

    /// `LDM`/`STM` of the registers set in `register_list`.
    #[must_use]
    pub const fn block_transfer(
        condition: Condition,
        addressing: Addressing,
        rn: u32,
        register_list: u32,
    ) -> Self {
        Self::BlockDataTransfer {
            condition,
            addressing,
            load_psr: false,
            rn,
            register_list,
        }
    }

    #[must_use]
    pub const fn software_interrupt(condition: Condition, comment: u32) -> Self {
        Self::SoftwareInterrupt { condition, comment }
    }

    #[must_use]
    pub const fn breakpoint(immediate: u32) -> Self {
        Self::Breakpoint { immediate }
    }
}

fn encode_alu_header(
    encoding: &dyn EncodingDefinition,
    alu_instruction: ArmModeAluInstr,
    set_conditions: bool,
    rn: u32,
    rd: u32,
) -> Result<u32> {
    Ok(encoding.set_data_processing_operation(alu_instruction.into())?
        | encoding.set_should_set_conditions(set_conditions)
        | encoding.set_register1(rn)?
        | encoding.set_register2(rd)?)
}

fn encode_transfer_header(
    encoding: &dyn EncodingDefinition,
    quantity: ReadWriteKind,
    addressing: Addressing,
    rn: u32,
    rd: u32,
) -> Result<u32> {
    Ok(encoding.set_data_transfer_is_byte_transfer(quantity.into())
        | addressing.encode(encoding)
        | encoding.set_register1(rn)?
        | encoding.set_register2(rd)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::encoding::ArmV5Encoding;
    use crate::bitwise::FieldVerification;
    use pretty_assertions::assert_eq;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    const ENCODING: ArmV5Encoding = ArmV5Encoding::new(FieldVerification::Checked);

    fn decode(op: u32) -> ArmInstruction {
        ArmInstruction::decode(&ENCODING, op).unwrap()
    }

    #[test]
    fn decode_data_processing() {
        // ADD r0, r1, r2, LSL #3
        assert_eq!(
            decode(0b1110_0000_1000_0001_0000_0001_1000_0010),
            ArmInstruction::DataProcessingShiftImmediate {
                condition: Condition::AL,
                alu_instruction: ArmModeAluInstr::Add,
                set_conditions: false,
                rn: 1,
                rd: 0,
                operand: ShiftedOperand {
                    rm: 2,
                    shift_kind: ShiftKind::Lsl,
                    shift_amount: 3,
                },
            }
        );

        // MOVS r2, #0xFF000000
        assert_eq!(
            decode(0xE3B0_24FF),
            ArmInstruction::DataProcessingImmediate {
                condition: Condition::AL,
                alu_instruction: ArmModeAluInstr::Mov,
                set_conditions: true,
                rn: 0,
                rd: 2,
                seed: 0xFF,
                rotation: 4,
            }
        );
    }

    #[test]
    fn shift_normalization() {
        // MOV r0, r1, ROR #0 is RRX
        let rrx = decode(0xE1A0_0061);
        let ArmInstruction::DataProcessingShiftImmediate { operand, .. } = rrx else {
            panic!("{rrx:?}");
        };
        assert_eq!(operand.shift_kind, ShiftKind::Rrx);
        assert_eq!(operand.shift_amount, 1);
        assert_eq!(rrx.encode(&ENCODING), Ok(0xE1A0_0061));

        // LDR r0, [r1, r2, LSR #0] is LSR #32
        let lsr = decode(0xE791_0022);
        let ArmInstruction::SingleTransferShiftImmediate { operand, .. } = lsr else {
            panic!("{lsr:?}");
        };
        assert_eq!(operand.shift_kind, ShiftKind::Lsr);
        assert_eq!(operand.shift_amount, 32);
        assert_eq!(lsr.encode(&ENCODING), Ok(0xE791_0022));

        // LSL #0 stays as it is
        let lsl = decode(0xE1A0_0001);
        let ArmInstruction::DataProcessingShiftImmediate { operand, .. } = lsl else {
            panic!("{lsl:?}");
        };
        assert_eq!((operand.shift_kind, operand.shift_amount), (ShiftKind::Lsl, 0));
    }

    #[test]
    fn decode_multiply_and_swap() {
        // UMLALS r1, r2, r3, r4 (RdLo=r1, RdHi=r2)
        assert_eq!(
            decode(0xE0B2_1493),
            ArmInstruction::MultiplyLong {
                condition: Condition::AL,
                set_conditions: true,
                accumulate: true,
                signed: false,
                rd_hi: 2,
                rd_lo: 1,
                rs: 4,
                rm: 3,
            }
        );

        // SWPB r0, r1, [r2]
        assert_eq!(
            decode(0xE142_0091),
            ArmInstruction::SingleDataSwap {
                condition: Condition::AL,
                quantity: ReadWriteKind::Byte,
                rn: 2,
                rd: 0,
                rm: 1,
            }
        );
    }

    #[test]
    fn decode_branch_and_exchange() {
        assert_eq!(
            decode(0xE12F_FF1E),
            ArmInstruction::branch_and_exchange(Condition::AL, 14)
        );
    }

    #[test]
    fn decode_halfword_transfer() {
        // LDRSH r1, [r0, #-0xA4]!
        assert_eq!(
            decode(0xE170_1AF4),
            ArmInstruction::HalfwordTransferImmediate {
                condition: Condition::AL,
                transfer_kind: HalfwordTransferKind::SignedHalfwords,
                addressing: Addressing {
                    load_store: LoadStoreKind::Load,
                    indexing: Indexing::Pre,
                    offsetting: Offsetting::Down,
                    write_back: true,
                },
                rn: 0,
                rd: 1,
                offset: 0xA4,
            }
        );
    }

    #[test]
    fn undefined_space_is_not_an_instruction() {
        assert_eq!(ArmInstruction::decode(&ENCODING, 0xE7F0_00F0), None);
        // multiply-shaped, but neither a multiply nor a swap nor a halfword transfer
        assert_eq!(ArmInstruction::decode(&ENCODING, 0x0100_0F90), None);
    }

    #[test]
    fn breakpoint_has_no_condition() {
        let bkpt = decode(0xE121_2374);
        assert_eq!(bkpt, ArmInstruction::breakpoint(0x1234));
        assert_eq!(bkpt.condition(), None);
        assert_eq!(bkpt.encode(&ENCODING), Ok(0xE121_2374));
    }

    #[test]
    fn coprocessor_forms() {
        // MRC p15, 0, r0, c1, c0, 0
        assert_eq!(
            decode(0xEE11_0F10),
            ArmInstruction::CoprocessorRegisterTransfer {
                condition: Condition::AL,
                direction: LoadStoreKind::Load,
                cp_number: 15,
                op1: 0,
                op2: 0,
                crn: 1,
                crm: 0,
                rd: 0,
            }
        );

        let cdp = decode(0xEE12_3405);
        assert_eq!(cdp.format(), ArmFormat::CoprocessorDataOperation);
        assert_eq!(cdp.encode(&ENCODING), Ok(0xEE12_3405));
    }

    #[test]
    fn constructors() {
        assert_eq!(
            ArmInstruction::branch(Condition::AL, true, 0x100).encode(&ENCODING),
            Ok(0xEB00_0040)
        );
        assert_eq!(
            ArmInstruction::software_interrupt(Condition::AL, 0x11).encode(&ENCODING),
            Ok(0xEF00_0011)
        );

        // MOV r0, #0x3FC
        let mov = ArmInstruction::data_processing_immediate(
            &ENCODING,
            Condition::AL,
            ArmModeAluInstr::Mov,
            false,
            0,
            0,
            0x3FC,
        )
        .unwrap();
        assert_eq!(mov.encode(&ENCODING), Ok(0xE3A0_0FFF));

        assert_eq!(
            ArmInstruction::data_processing_immediate(
                &ENCODING,
                Condition::AL,
                ArmModeAluInstr::Mov,
                false,
                0,
                0,
                0x101,
            ),
            Err(CodecError::UnrepresentableImmediate { value: 0x101 })
        );

        // LDR r0, [pc, #-4]
        let ldr = ArmInstruction::load_store_immediate(
            Condition::AL,
            LoadStoreKind::Load,
            ReadWriteKind::Word,
            0,
            15,
            -4,
        );
        assert_eq!(ldr.encode(&ENCODING), Ok(0xE51F_0004));

        // STMDB sp!, {r4, lr}
        let push = ArmInstruction::block_transfer(
            Condition::AL,
            Addressing {
                load_store: LoadStoreKind::Store,
                indexing: Indexing::Pre,
                offsetting: Offsetting::Down,
                write_back: true,
            },
            13,
            0x4010,
        );
        assert_eq!(push.encode(&ENCODING), Ok(0xE92D_4010));

        let mov_reg = ArmInstruction::data_processing_register(
            Condition::NE,
            ArmModeAluInstr::Mov,
            false,
            0,
            1,
            ShiftedOperand {
                rm: 2,
                shift_kind: ShiftKind::Asr,
                shift_amount: 32,
            },
        );
        assert_eq!(mov_reg.encode(&ENCODING), Ok(0x11A0_1042));
    }

    #[test]
    fn field_range_is_reported() {
        let swi = ArmInstruction::software_interrupt(Condition::AL, 0x0100_0000);
        assert!(matches!(
            swi.encode(&ENCODING),
            Err(CodecError::FieldRange { width: 24, .. })
        ));

        let unchecked = ArmV5Encoding::default();
        assert_eq!(swi.encode(&unchecked), Ok(0xEF00_0000));
    }

    #[test]
    fn random_words_round_trip() {
        let mut rng = StdRng::seed_from_u64(0x00C0_FFEE);
        for _ in 0..20_000 {
            let op: u32 = rng.random();
            let Some(instruction) = ArmInstruction::decode(&ENCODING, op) else {
                continue;
            };

            let encoded = instruction.encode(&ENCODING).unwrap();
            assert_eq!(encoded, op, "{instruction:?}");
            assert_eq!(ArmInstruction::decode(&ENCODING, encoded), Some(instruction));
        }
    }
}
