use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Data processing operation, bits 24-21.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum ArmModeAluInstr {
    And = 0x0,
    Eor = 0x1,
    Sub = 0x2,
    Rsb = 0x3,
    Add = 0x4,
    Adc = 0x5,
    Sbc = 0x6,
    Rsc = 0x7,
    Tst = 0x8,
    Teq = 0x9,
    Cmp = 0xA,
    Cmn = 0xB,
    Orr = 0xC,
    Mov = 0xD,
    Bic = 0xE,
    Mvn = 0xF,
}

impl Display for ArmModeAluInstr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::And => f.write_str("AND"),
            Self::Eor => f.write_str("EOR"),
            Self::Sub => f.write_str("SUB"),
            Self::Rsb => f.write_str("RSB"),
            Self::Add => f.write_str("ADD"),
            Self::Adc => f.write_str("ADC"),
            Self::Sbc => f.write_str("SBC"),
            Self::Rsc => f.write_str("RSC"),
            Self::Tst => f.write_str("TST"),
            Self::Teq => f.write_str("TEQ"),
            Self::Cmp => f.write_str("CMP"),
            Self::Cmn => f.write_str("CMN"),
            Self::Orr => f.write_str("ORR"),
            Self::Mov => f.write_str("MOV"),
            Self::Bic => f.write_str("BIC"),
            Self::Mvn => f.write_str("MVN"),
        }
    }
}

/// Which registers an operation names besides its second operand.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum AluOperands {
    /// `MOV`/`MVN`: only `Rd`.
    Destination,

    /// `TST`/`TEQ`/`CMP`/`CMN`: only `Rn`, the result is discarded.
    Source,

    /// Everything else: `Rd, Rn`.
    DestinationAndSource,
}

impl ArmModeAluInstr {
    #[must_use]
    pub const fn operands(self) -> AluOperands {
        use ArmModeAluInstr::{Cmn, Cmp, Mov, Mvn, Teq, Tst};
        match self {
            Mov | Mvn => AluOperands::Destination,
            Tst | Teq | Cmp | Cmn => AluOperands::Source,
            _ => AluOperands::DestinationAndSource,
        }
    }

    /// Test operations always set the flags, so the `S` suffix is implied.
    #[must_use]
    pub const fn is_test(self) -> bool {
        matches!(self.operands(), AluOperands::Source)
    }
}

impl From<u32> for ArmModeAluInstr {
    fn from(alu_op_code: u32) -> Self {
        use ArmModeAluInstr::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };
        match alu_op_code & 0xF {
            0x0 => And,
            0x1 => Eor,
            0x2 => Sub,
            0x3 => Rsb,
            0x4 => Add,
            0x5 => Adc,
            0x6 => Sbc,
            0x7 => Rsc,
            0x8 => Tst,
            0x9 => Teq,
            0xA => Cmp,
            0xB => Cmn,
            0xC => Orr,
            0xD => Mov,
            0xE => Bic,
            _ => Mvn,
        }
    }
}

impl From<ArmModeAluInstr> for u32 {
    fn from(op: ArmModeAluInstr) -> Self {
        op as Self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn check_operands() {
        use ArmModeAluInstr::*;
        let alu_op_code = 0..=0xF_u32;
        let operands = [
            AluOperands::DestinationAndSource, // And
            AluOperands::DestinationAndSource, // Eor
            AluOperands::DestinationAndSource, // Sub
            AluOperands::DestinationAndSource, // Rsb
            AluOperands::DestinationAndSource, // Add
            AluOperands::DestinationAndSource, // Adc
            AluOperands::DestinationAndSource, // Sbc
            AluOperands::DestinationAndSource, // Rsc
            AluOperands::Source,               // Tst
            AluOperands::Source,               // Teq
            AluOperands::Source,               // Cmp
            AluOperands::Source,               // Cmn
            AluOperands::DestinationAndSource, // Orr
            AluOperands::Destination,          // Mov
            AluOperands::DestinationAndSource, // Bic
            AluOperands::Destination,          // Mvn
        ];

        for (op_code, expected) in alu_op_code.zip(operands) {
            let op = ArmModeAluInstr::from(op_code);
            assert_eq!(op.operands(), expected, "{op}");
            assert_eq!(u32::from(op), op_code);
        }

        assert!(Cmp.is_test());
        assert!(!Mov.is_test());
    }

    #[test]
    fn mnemonics() {
        assert_eq!(ArmModeAluInstr::Rsc.to_string(), "RSC");
        assert_eq!(ArmModeAluInstr::Mvn.to_string(), "MVN");
    }
}
