//! Typed VFP instructions: decode, encode and the code generator constructors.

use serde::{Deserialize, Serialize};

use crate::arm::condition::Condition;
use crate::arm::encoding::classify;
use crate::arm::flags::{LoadStoreKind, Offsetting};
use crate::arm::instructions::Addressing;
use crate::error::Result;
use crate::vfp::encoding::{VfpEncodingDefinition, VfpFormat};
use crate::vfp::registers::{FpRegister, Precision};

/// Two operand arithmetic, selected by bits 23, 21, 20 and 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperation {
    /// `Fd + Fn * Fm`
    MultiplyAccumulate,
    /// `Fd - Fn * Fm`
    NegatedMultiplyAccumulate,
    /// `-Fd + Fn * Fm`
    MultiplySubtract,
    /// `-Fd - Fn * Fm`
    NegatedMultiplySubtract,
    Multiply,
    NegatedMultiply,
    Add,
    Subtract,
    Divide,
    /// Unallocated operation code.
    Other(u32),
}

impl From<u32> for BinaryOperation {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::MultiplyAccumulate,
            1 => Self::NegatedMultiplyAccumulate,
            2 => Self::MultiplySubtract,
            3 => Self::NegatedMultiplySubtract,
            4 => Self::Multiply,
            5 => Self::NegatedMultiply,
            6 => Self::Add,
            7 => Self::Subtract,
            8 => Self::Divide,
            other => Self::Other(other),
        }
    }
}

impl From<BinaryOperation> for u32 {
    fn from(operation: BinaryOperation) -> Self {
        match operation {
            BinaryOperation::MultiplyAccumulate => 0,
            BinaryOperation::NegatedMultiplyAccumulate => 1,
            BinaryOperation::MultiplySubtract => 2,
            BinaryOperation::NegatedMultiplySubtract => 3,
            BinaryOperation::Multiply => 4,
            BinaryOperation::NegatedMultiply => 5,
            BinaryOperation::Add => 6,
            BinaryOperation::Subtract => 7,
            BinaryOperation::Divide => 8,
            BinaryOperation::Other(other) => other,
        }
    }
}

impl BinaryOperation {
    /// Mnemonic without precision and condition, `??` when unallocated.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::MultiplyAccumulate => "FMAC",
            Self::NegatedMultiplyAccumulate => "FNMAC",
            Self::MultiplySubtract => "FMSC",
            Self::NegatedMultiplySubtract => "FNMSC",
            Self::Multiply => "FMUL",
            Self::NegatedMultiply => "FNMUL",
            Self::Add => "FADD",
            Self::Subtract => "FSUB",
            Self::Divide => "FDIV",
            Self::Other(_) => "??",
        }
    }
}

/// One operand operations, selected by bits 19-16 and 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperation {
    Copy,
    Absolute,
    Negate,
    SquareRoot,
    Compare,
    /// Compare, raising invalid operation on quiet NaNs too.
    CompareWithException,
    UnsignedToFloat,
    SignedToFloat,
    ToUnsigned,
    ToUnsignedRoundZero,
    ToSigned,
    ToSignedRoundZero,
    /// Unallocated operation code.
    Other(u32),
}

impl From<u32> for UnaryOperation {
    fn from(value: u32) -> Self {
        match value {
            0x00 => Self::Copy,
            0x01 => Self::Absolute,
            0x02 => Self::Negate,
            0x03 => Self::SquareRoot,
            0x08 => Self::Compare,
            0x09 => Self::CompareWithException,
            0x10 => Self::UnsignedToFloat,
            0x11 => Self::SignedToFloat,
            0x18 => Self::ToUnsigned,
            0x19 => Self::ToUnsignedRoundZero,
            0x1A => Self::ToSigned,
            0x1B => Self::ToSignedRoundZero,
            other => Self::Other(other),
        }
    }
}

impl From<UnaryOperation> for u32 {
    fn from(operation: UnaryOperation) -> Self {
        match operation {
            UnaryOperation::Copy => 0x00,
            UnaryOperation::Absolute => 0x01,
            UnaryOperation::Negate => 0x02,
            UnaryOperation::SquareRoot => 0x03,
            UnaryOperation::Compare => 0x08,
            UnaryOperation::CompareWithException => 0x09,
            UnaryOperation::UnsignedToFloat => 0x10,
            UnaryOperation::SignedToFloat => 0x11,
            UnaryOperation::ToUnsigned => 0x18,
            UnaryOperation::ToUnsignedRoundZero => 0x19,
            UnaryOperation::ToSigned => 0x1A,
            UnaryOperation::ToSignedRoundZero => 0x1B,
            UnaryOperation::Other(other) => other,
        }
    }
}

impl UnaryOperation {
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Copy => "FCPY",
            Self::Absolute => "FABS",
            Self::Negate => "FNEG",
            Self::SquareRoot => "FSQRT",
            Self::Compare => "FCMP",
            Self::CompareWithException => "FCMPE",
            Self::UnsignedToFloat => "FUITO",
            Self::SignedToFloat => "FSITO",
            Self::ToUnsigned => "FTOUI",
            Self::ToUnsignedRoundZero => "FTOUIZ",
            Self::ToSigned => "FTOSI",
            Self::ToSignedRoundZero => "FTOSIZ",
            Self::Other(_) => "??",
        }
    }

    /// Float to integer conversions write an integer into a single register.
    #[must_use]
    pub const fn has_integer_destination(self) -> bool {
        matches!(
            self,
            Self::ToUnsigned | Self::ToUnsignedRoundZero | Self::ToSigned | Self::ToSignedRoundZero
        )
    }

    /// Integer to float conversions read an integer from a single register.
    #[must_use]
    pub const fn has_integer_source(self) -> bool {
        matches!(self, Self::UnsignedToFloat | Self::SignedToFloat)
    }
}

/// A decoded VFP instruction. Register operands use single precision
/// numbering, see [`FpRegister`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VfpInstruction {
    /// `FLD`/`FST`, always pre-indexed without write back.
    DataTransfer {
        condition: Condition,
        load_store: LoadStoreKind,
        offsetting: Offsetting,
        precision: Precision,
        rn: u32,
        fd: FpRegister,
        /// Offset in words.
        offset: u32,
    },
    BlockDataTransfer {
        condition: Condition,
        addressing: Addressing,
        precision: Precision,
        rn: u32,
        fd: FpRegister,
        /// Number of words transferred.
        count: u32,
    },
    ConditionCodeTransfer {
        condition: Condition,
    },
    SystemRegisterTransfer {
        condition: Condition,
        /// `Load` moves the system register into `rd` (`FMRX`).
        direction: LoadStoreKind,
        system_register: u32,
        rd: u32,
    },
    RegisterTransferLow {
        condition: Condition,
        direction: LoadStoreKind,
        dn: FpRegister,
        rd: u32,
    },
    RegisterTransferHigh {
        condition: Condition,
        direction: LoadStoreKind,
        dn: FpRegister,
        rd: u32,
    },
    RegisterTransfer32 {
        condition: Condition,
        direction: LoadStoreKind,
        fn_: FpRegister,
        rd: u32,
    },
    RegisterTransfer64 {
        condition: Condition,
        direction: LoadStoreKind,
        precision: Precision,
        fm: FpRegister,
        rd: u32,
        rn: u32,
    },
    CompareToZero {
        condition: Condition,
        precision: Precision,
        check_nan: bool,
        fd: FpRegister,
    },
    ConvertFloatToFloat {
        condition: Condition,
        /// Precision of the source `fm`; `fd` has the other one.
        precision: Precision,
        fd: FpRegister,
        fm: FpRegister,
    },
    UnaryDataOperation {
        condition: Condition,
        operation: UnaryOperation,
        precision: Precision,
        fd: FpRegister,
        fm: FpRegister,
    },
    BinaryDataOperation {
        condition: Condition,
        operation: BinaryOperation,
        precision: Precision,
        fd: FpRegister,
        fn_: FpRegister,
        fm: FpRegister,
    },
}

impl VfpInstruction {
    /// Classifies `op` against the VFP table only. `None` leaves the word to
    /// the base instruction set.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn decode(encoding: &dyn VfpEncodingDefinition, op: u32) -> Option<Self> {
        let Some(format) = classify(encoding.match_table(), op) else {
            tracing::debug!("0x{op:08X} is not a VFP instruction, falling back to the base set");
            return None;
        };

        let condition = Condition::from(encoding.condition_codes(op));
        let direction = LoadStoreKind::from(encoding.is_from_coprocessor(op));
        let precision = Precision::from(encoding.is_double(op));

        let instruction = match format {
            VfpFormat::DataTransfer => Self::DataTransfer {
                condition,
                load_store: encoding.data_transfer_is_load(op).into(),
                offsetting: encoding.data_transfer_is_up(op).into(),
                precision,
                rn: encoding.rn(op),
                fd: encoding.fd(op),
                offset: encoding.data_transfer_offset(op),
            },
            VfpFormat::BlockDataTransfer => Self::BlockDataTransfer {
                condition,
                addressing: Addressing {
                    load_store: encoding.data_transfer_is_load(op).into(),
                    indexing: encoding.data_transfer_is_pre_indexing(op).into(),
                    offsetting: encoding.data_transfer_is_up(op).into(),
                    write_back: encoding.data_transfer_should_write_back(op),
                },
                precision,
                rn: encoding.rn(op),
                fd: encoding.fd(op),
                count: encoding.data_transfer_offset(op),
            },
            VfpFormat::ConditionCodeTransfer => Self::ConditionCodeTransfer { condition },
            VfpFormat::SystemRegisterTransfer => Self::SystemRegisterTransfer {
                condition,
                direction,
                system_register: encoding.system_register(op),
                rd: encoding.rd(op),
            },
            VfpFormat::RegisterTransferLow => Self::RegisterTransferLow {
                condition,
                direction,
                dn: encoding.fn_(op),
                rd: encoding.rd(op),
            },
            VfpFormat::RegisterTransferHigh => Self::RegisterTransferHigh {
                condition,
                direction,
                dn: encoding.fn_(op),
                rd: encoding.rd(op),
            },
            VfpFormat::RegisterTransfer32 => Self::RegisterTransfer32 {
                condition,
                direction,
                fn_: encoding.fn_(op),
                rd: encoding.rd(op),
            },
            VfpFormat::RegisterTransfer64 => Self::RegisterTransfer64 {
                condition,
                direction,
                precision,
                fm: encoding.fm(op),
                rd: encoding.rd(op),
                rn: encoding.rn(op),
            },
            VfpFormat::CompareToZero => Self::CompareToZero {
                condition,
                precision,
                check_nan: encoding.check_nan(op),
                fd: encoding.fd(op),
            },
            VfpFormat::ConvertFloatToFloat => Self::ConvertFloatToFloat {
                condition,
                precision,
                fd: encoding.fd(op),
                fm: encoding.fm(op),
            },
            VfpFormat::UnaryDataOperation => Self::UnaryDataOperation {
                condition,
                operation: encoding.unary_operation(op).into(),
                precision,
                fd: encoding.fd(op),
                fm: encoding.fm(op),
            },
            VfpFormat::BinaryDataOperation => Self::BinaryDataOperation {
                condition,
                operation: encoding.binary_operation(op).into(),
                precision,
                fd: encoding.fd(op),
                fn_: encoding.fn_(op),
                fm: encoding.fm(op),
            },
        };

        Some(instruction)
    }

    /// Rebuilds the instruction word.
    ///
    /// # Errors
    ///
    /// [`CodecError::FieldRange`](crate::error::CodecError::FieldRange) when
    /// `encoding` verifies fields and one of them does not fit.
    pub fn encode(&self, encoding: &dyn VfpEncodingDefinition) -> Result<u32> {
        let fixed = encoding.opcode(self.format());
        let condition = encoding.set_condition_codes(self.condition().into())?;

        let fields = match *self {
            Self::DataTransfer {
                load_store,
                offsetting,
                precision,
                rn,
                fd,
                offset,
                ..
            } => {
                encoding.set_data_transfer_is_load(load_store.into())
                    | encoding.set_data_transfer_is_up(offsetting.into())
                    | encoding.set_is_double(precision.into())
                    | encoding.set_rn(rn)?
                    | encoding.set_fd(fd)?
                    | encoding.set_data_transfer_offset(offset)?
            }
            Self::BlockDataTransfer {
                addressing,
                precision,
                rn,
                fd,
                count,
                ..
            } => {
                encoding.set_data_transfer_is_load(addressing.load_store.into())
                    | encoding.set_data_transfer_is_pre_indexing(addressing.indexing.into())
                    | encoding.set_data_transfer_is_up(addressing.offsetting.into())
                    | encoding.set_data_transfer_should_write_back(addressing.write_back)
                    | encoding.set_is_double(precision.into())
                    | encoding.set_rn(rn)?
                    | encoding.set_fd(fd)?
                    | encoding.set_data_transfer_offset(count)?
            }
            Self::ConditionCodeTransfer { .. } => 0,
            Self::SystemRegisterTransfer {
                direction,
                system_register,
                rd,
                ..
            } => {
                encoding.set_is_from_coprocessor(direction.into())
                    | encoding.set_system_register(system_register)?
                    | encoding.set_rd(rd)?
            }
            Self::RegisterTransferLow {
                direction, dn, rd, ..
            }
            | Self::RegisterTransferHigh {
                direction, dn, rd, ..
            } => {
                encoding.set_is_from_coprocessor(direction.into())
                    | encoding.set_fn(dn)?
                    | encoding.set_rd(rd)?
            }
            Self::RegisterTransfer32 {
                direction, fn_, rd, ..
            } => {
                encoding.set_is_from_coprocessor(direction.into())
                    | encoding.set_fn(fn_)?
                    | encoding.set_rd(rd)?
            }
            Self::RegisterTransfer64 {
                direction,
                precision,
                fm,
                rd,
                rn,
                ..
            } => {
                encoding.set_is_from_coprocessor(direction.into())
                    | encoding.set_is_double(precision.into())
                    | encoding.set_fm(fm)?
                    | encoding.set_rd(rd)?
                    | encoding.set_rn(rn)?
            }
            Self::CompareToZero {
                precision,
                check_nan,
                fd,
                ..
            } => {
                encoding.set_is_double(precision.into())
                    | encoding.set_check_nan(check_nan)
                    | encoding.set_fd(fd)?
            }
            Self::ConvertFloatToFloat {
                precision, fd, fm, ..
            } => encoding.set_is_double(precision.into()) | encoding.set_fd(fd)? | encoding.set_fm(fm)?,
            Self::UnaryDataOperation {
                operation,
                precision,
                fd,
                fm,
                ..
            } => {
                encoding.set_unary_operation(operation.into())?
                    | encoding.set_is_double(precision.into())
                    | encoding.set_fd(fd)?
                    | encoding.set_fm(fm)?
            }
            Self::BinaryDataOperation {
                operation,
                precision,
                fd,
                fn_,
                fm,
                ..
            } => {
                encoding.set_binary_operation(operation.into())?
                    | encoding.set_is_double(precision.into())
                    | encoding.set_fd(fd)?
                    | encoding.set_fn(fn_)?
                    | encoding.set_fm(fm)?
            }
        };

        Ok(fixed | condition | fields)
    }

    #[must_use]
    pub const fn format(&self) -> VfpFormat {
        match self {
            Self::DataTransfer { .. } => VfpFormat::DataTransfer,
            Self::BlockDataTransfer { .. } => VfpFormat::BlockDataTransfer,
            Self::ConditionCodeTransfer { .. } => VfpFormat::ConditionCodeTransfer,
            Self::SystemRegisterTransfer { .. } => VfpFormat::SystemRegisterTransfer,
            Self::RegisterTransferLow { .. } => VfpFormat::RegisterTransferLow,
            Self::RegisterTransferHigh { .. } => VfpFormat::RegisterTransferHigh,
            Self::RegisterTransfer32 { .. } => VfpFormat::RegisterTransfer32,
            Self::RegisterTransfer64 { .. } => VfpFormat::RegisterTransfer64,
            Self::CompareToZero { .. } => VfpFormat::CompareToZero,
            Self::ConvertFloatToFloat { .. } => VfpFormat::ConvertFloatToFloat,
            Self::UnaryDataOperation { .. } => VfpFormat::UnaryDataOperation,
            Self::BinaryDataOperation { .. } => VfpFormat::BinaryDataOperation,
        }
    }

    #[must_use]
    pub const fn condition(&self) -> Condition {
        match self {
            Self::DataTransfer { condition, .. }
            | Self::BlockDataTransfer { condition, .. }
            | Self::ConditionCodeTransfer { condition }
            | Self::SystemRegisterTransfer { condition, .. }
            | Self::RegisterTransferLow { condition, .. }
            | Self::RegisterTransferHigh { condition, .. }
            | Self::RegisterTransfer32 { condition, .. }
            | Self::RegisterTransfer64 { condition, .. }
            | Self::CompareToZero { condition, .. }
            | Self::ConvertFloatToFloat { condition, .. }
            | Self::UnaryDataOperation { condition, .. }
            | Self::BinaryDataOperation { condition, .. } => *condition,
        }
    }

    /// `FLD`/`FST{S|D} fd,[rn,#offset_words*4]`; a negative offset selects down.
    #[must_use]
    pub const fn data_transfer(
        condition: Condition,
        load_store: LoadStoreKind,
        precision: Precision,
        fd: FpRegister,
        rn: u32,
        offset_words: i32,
    ) -> Self {
        let offsetting = if offset_words < 0 {
            Offsetting::Down
        } else {
            Offsetting::Up
        };

        Self::DataTransfer {
            condition,
            load_store,
            offsetting,
            precision,
            rn,
            fd,
            offset: offset_words.unsigned_abs(),
        }
    }

    #[must_use]
    pub const fn binary(
        condition: Condition,
        operation: BinaryOperation,
        precision: Precision,
        fd: FpRegister,
        fn_: FpRegister,
        fm: FpRegister,
    ) -> Self {
        Self::BinaryDataOperation {
            condition,
            operation,
            precision,
            fd,
            fn_,
            fm,
        }
    }

    #[must_use]
    pub const fn unary(
        condition: Condition,
        operation: UnaryOperation,
        precision: Precision,
        fd: FpRegister,
        fm: FpRegister,
    ) -> Self {
        Self::UnaryDataOperation {
            condition,
            operation,
            precision,
            fd,
            fm,
        }
    }
}
