//! # Instruction set
//!
//! [`InstructionSet`] puts the two decoding levels together. A word is first
//! offered to the VFP table, when the coprocessor is present, and anything it
//! does not claim goes to the base table unchanged. Generic coprocessor words
//! therefore still come out as `MRC`/`CDP`/`LDC` forms.
//!
//! ```no_run
//! use codec::instruction_set::InstructionSet;
//! use codec::registry::{EncodingConfig, IsaVersion, VfpMode, select_encoding};
//!
//! select_encoding(EncodingConfig {
//!     isa: IsaVersion::ArmV5,
//!     vfp: VfpMode::Hard,
//!     ..EncodingConfig::default()
//! })?;
//!
//! let set = InstructionSet::from_registry()?;
//! println!("{}", set.decode_and_print(0x8000, 0xEE72_1AA3).text);
//! # Ok::<(), codec::CodecError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::arm::encoding::EncodingDefinition;
use crate::arm::instructions::ArmInstruction;
use crate::error::{CodecError, Result};
use crate::registry::{ActiveEncoding, IsaVersion, VfpMode, active_encoding};
use crate::vfp::encoding::VfpEncodingDefinition;
use crate::vfp::instructions::VfpInstruction;

#[cfg(feature = "disassembler")]
use crate::arm::disassembler::Disassembly;

/// A decoded word of either level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    Arm(ArmInstruction),
    Vfp(VfpInstruction),
}

impl From<ArmInstruction> for Instruction {
    fn from(instruction: ArmInstruction) -> Self {
        Self::Arm(instruction)
    }
}

impl From<VfpInstruction> for Instruction {
    fn from(instruction: VfpInstruction) -> Self {
        Self::Vfp(instruction)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InstructionSet<'a> {
    version: IsaVersion,
    base: &'a dyn EncodingDefinition,
    vfp: Option<&'a dyn VfpEncodingDefinition>,
}

impl<'a> InstructionSet<'a> {
    #[must_use]
    pub const fn new(
        version: IsaVersion,
        base: &'a dyn EncodingDefinition,
        vfp: Option<&'a dyn VfpEncodingDefinition>,
    ) -> Self {
        Self { version, base, vfp }
    }

    #[must_use]
    pub fn from_active(active: &'a ActiveEncoding) -> Self {
        Self {
            version: active.version,
            base: &active.base,
            vfp: active
                .vfp
                .as_ref()
                .map(|vfp| vfp as &dyn VfpEncodingDefinition),
        }
    }

    #[must_use]
    pub const fn version(&self) -> IsaVersion {
        self.version
    }

    #[must_use]
    pub const fn has_vfp(&self) -> bool {
        self.vfp.is_some()
    }

    /// `None` when neither level recognizes `word`.
    #[must_use]
    pub fn decode(&self, word: u32) -> Option<Instruction> {
        if let Some(vfp) = self.vfp
            && let Some(instruction) = VfpInstruction::decode(vfp, word)
        {
            return Some(instruction.into());
        }

        ArmInstruction::decode(self.base, word).map(Instruction::from)
    }

    /// # Errors
    ///
    /// - [`CodecError::FieldRange`] when a field does not fit and the
    ///   encoding verifies fields.
    /// - [`CodecError::UnsupportedProfile`] for a VFP instruction on a set
    ///   without the coprocessor.
    pub fn encode(&self, instruction: &Instruction) -> Result<u32> {
        match instruction {
            Instruction::Arm(instruction) => instruction.encode(self.base),
            Instruction::Vfp(instruction) => {
                let vfp = self.vfp.ok_or(CodecError::UnsupportedProfile {
                    isa: self.version,
                    vfp: VfpMode::None,
                })?;
                instruction.encode(vfp)
            }
        }
    }

    /// Disassembles `instruction` as located at `address`.
    #[cfg(feature = "disassembler")]
    #[must_use]
    pub fn print(&self, instruction: &Instruction, address: u32) -> Disassembly {
        match instruction {
            Instruction::Arm(instruction) => instruction.disassembler(self.base, address),
            Instruction::Vfp(instruction) => instruction.disassembler(address),
        }
    }

    /// Decodes and prints in one go; the text is empty when `word` is not an
    /// instruction.
    #[cfg(feature = "disassembler")]
    #[must_use]
    pub fn decode_and_print(&self, address: u32, word: u32) -> Disassembly {
        self.decode(word)
            .map(|instruction| self.print(&instruction, address))
            .unwrap_or_default()
    }
}

impl InstructionSet<'static> {
    /// The instruction set of the process-wide selection.
    ///
    /// # Errors
    ///
    /// [`CodecError::NotConfigured`] before
    /// [`select_encoding`](crate::registry::select_encoding) succeeded.
    pub fn from_registry() -> Result<Self> {
        active_encoding().map(Self::from_active)
    }
}

/// Two sets are equal when they share the revision and VFP presence.
/// The field verification mode of their encodings is not compared.
impl PartialEq for InstructionSet<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version && self.has_vfp() == other.has_vfp()
    }
}

impl Eq for InstructionSet<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::condition::Condition;
    use crate::arm::encoding::ArmFormat;
    use crate::arm::flags::{LoadStoreKind, ReadWriteKind};
    use crate::bitwise::FieldVerification;
    use crate::registry::{EncodingConfig, select_encoding};
    use crate::vfp::instructions::BinaryOperation;
    use crate::vfp::registers::{FpRegister, Precision};
    use pretty_assertions::assert_eq;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn active(vfp: VfpMode) -> ActiveEncoding {
        ActiveEncoding::resolve(EncodingConfig {
            isa: IsaVersion::ArmV5,
            vfp,
            verification: FieldVerification::Checked,
        })
        .unwrap()
    }

    fn round_trip(set: &InstructionSet<'_>, seed: u64) -> (usize, usize) {
        let mut rng = StdRng::seed_from_u64(seed);
        let (mut arm, mut vfp) = (0, 0);
        for _ in 0..50_000 {
            let word = rng.random::<u32>();
            let Some(instruction) = set.decode(word) else {
                continue;
            };
            match instruction {
                Instruction::Arm(_) => arm += 1,
                Instruction::Vfp(_) => vfp += 1,
            }

            let encoded = set.encode(&instruction).unwrap();
            assert_eq!(set.decode(encoded), Some(instruction), "0x{word:08X}");
        }
        (arm, vfp)
    }

    #[test]
    fn random_round_trip_without_vfp() {
        let active = active(VfpMode::None);
        let set = InstructionSet::from_active(&active);
        let (arm, vfp) = round_trip(&set, 1);
        assert!(arm > 10_000);
        assert_eq!(vfp, 0);
    }

    #[test]
    fn random_round_trip_with_vfp() {
        let active = active(VfpMode::Hard);
        let set = InstructionSet::from_active(&active);
        let (arm, vfp) = round_trip(&set, 2);
        assert!(arm > 10_000);
        assert!(vfp > 100);
    }

    #[test]
    fn vfp_words_fall_back_to_coprocessor_forms() {
        let without = active(VfpMode::None);
        let with = active(VfpMode::Hard);
        let without = InstructionSet::from_active(&without);
        let with = InstructionSet::from_active(&with);

        // FADDS s3, s5, s7
        let word = 0xEE72_1AA3;
        assert!(matches!(with.decode(word), Some(Instruction::Vfp(_))));
        assert!(matches!(
            without.decode(word),
            Some(Instruction::Arm(instruction))
                if instruction.format() == ArmFormat::CoprocessorDataOperation
        ));

        // MRC p15 is not a VFP word even with the coprocessor present
        assert!(matches!(
            with.decode(0xEE11_0F10),
            Some(Instruction::Arm(instruction))
                if instruction.format() == ArmFormat::CoprocessorRegisterTransfer
        ));
    }

    #[test]
    fn vfp_encode_needs_the_coprocessor() {
        let active = active(VfpMode::None);
        let set = InstructionSet::from_active(&active);
        let add = VfpInstruction::binary(
            Condition::AL,
            BinaryOperation::Add,
            Precision::Single,
            FpRegister::single(0),
            FpRegister::single(0),
            FpRegister::single(0),
        );
        assert_eq!(
            set.encode(&add.into()),
            Err(CodecError::UnsupportedProfile {
                isa: IsaVersion::ArmV5,
                vfp: VfpMode::None
            })
        );
    }

    #[cfg(feature = "disassembler")]
    #[test]
    fn branch_with_link_end_to_end() {
        use crate::arm::disassembler::ResolvedTarget;

        let active = active(VfpMode::Hard);
        let set = InstructionSet::from_active(&active);

        let word = set
            .encode(&ArmInstruction::branch(Condition::AL, true, 0x100).into())
            .unwrap();
        let instruction = set.decode(word).unwrap();
        let printed = set.print(&instruction, 0x1000);

        assert_eq!(printed.mnemonic(), "BL");
        assert_eq!(
            printed.target,
            Some(ResolvedTarget {
                address: 0x1108,
                is_code: true
            })
        );
    }

    #[cfg(feature = "disassembler")]
    #[test]
    fn decode_and_print() {
        let active = active(VfpMode::Hard);
        let set = InstructionSet::from_active(&active);
        assert_eq!(set.decode_and_print(0, 0xEE72_1AA3).text, "FADDS    s3,s5,s7");
        assert_eq!(set.decode_and_print(0, 0xE081_0182).text, "ADD      r0,r1,r2,LSL #3");
        // undefined space
        assert_eq!(set.decode_and_print(0, 0xE7F0_00F0), Disassembly::default());
    }

    #[test]
    fn encode_checks_field_ranges() {
        let wide_offset = ArmInstruction::load_store_immediate(
            Condition::AL,
            LoadStoreKind::Load,
            ReadWriteKind::Word,
            0,
            1,
            0x1000,
        );
        let wide_register = ArmInstruction::load_store_immediate(
            Condition::AL,
            LoadStoreKind::Load,
            ReadWriteKind::Word,
            16,
            1,
            4,
        );

        let checked = active(VfpMode::None);
        let checked = InstructionSet::from_active(&checked);
        assert_eq!(
            checked.encode(&wide_offset.into()),
            Err(CodecError::FieldRange {
                field: "transfer offset",
                value: 0x1000,
                width: 12
            })
        );
        assert_eq!(
            checked.encode(&wide_register.into()),
            Err(CodecError::FieldRange {
                field: "rd",
                value: 16,
                width: 4
            })
        );

        // unchecked encodings truncate
        let unchecked = ActiveEncoding::resolve(EncodingConfig::default()).unwrap();
        let unchecked = InstructionSet::from_active(&unchecked);
        assert_eq!(unchecked.encode(&wide_offset.into()), Ok(0xE591_0000));
        assert_eq!(unchecked.encode(&wide_register.into()), Ok(0xE591_0004));

        // verification is not part of the identity
        assert_eq!(checked, unchecked);
    }

    #[test]
    fn identity() {
        let v5 = active(VfpMode::None);
        let v5_vfp = active(VfpMode::Hard);
        let v4 = ActiveEncoding::resolve(EncodingConfig {
            isa: IsaVersion::ArmV4,
            ..EncodingConfig::default()
        })
        .unwrap();

        let set = InstructionSet::from_active(&v5);
        assert_eq!(set.version(), IsaVersion::ArmV5);
        assert_eq!(set, InstructionSet::from_active(&v5));
        assert_ne!(set, InstructionSet::from_active(&v5_vfp));
        assert_ne!(set, InstructionSet::from_active(&v4));
    }

    // the only test touching the process-wide registry
    #[test]
    fn process_wide_selection() {
        select_encoding(EncodingConfig {
            isa: IsaVersion::ArmV5,
            vfp: VfpMode::Hard,
            verification: FieldVerification::Checked,
        })
        .unwrap();
        assert_eq!(
            select_encoding(EncodingConfig::default()),
            Err(CodecError::DoubleInitialization)
        );

        let set = InstructionSet::from_registry().unwrap();
        assert_eq!(set.version(), IsaVersion::ArmV5);
        assert!(set.has_vfp());
    }
}
