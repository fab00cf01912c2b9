//! VFP listings, in the same column layout as the base instruction set.
//!
//! Mnemonics carry the precision (`S`/`D`) before the condition, so
//! `FADDD` executed on `NE` prints as `FADDDNE`.

use crate::arm::condition::Condition;
use crate::arm::disassembler::{Disassembly, block_suffix, line, register_name};
use crate::arm::encoding::{PC_OFFSET, REGISTER_PC};
use crate::arm::flags::LoadStoreKind;
use crate::vfp::instructions::VfpInstruction;
use crate::vfp::registers::{FpRegister, Precision, SystemRegister};

fn system_register_name(register: u32) -> String {
    SystemRegister::try_from(register).map_or_else(|_| "??".to_string(), |r| r.to_string())
}

fn single(register: FpRegister) -> String {
    register.name(Precision::Single)
}

fn double(register: FpRegister) -> String {
    register.name(Precision::Double)
}

/// `FMR*` when the value moves to the ARM side, `FM*R` otherwise.
fn register_transfer(
    condition: Condition,
    direction: LoadStoreKind,
    to_arm: &str,
    from_arm: &str,
    arm: &str,
    vfp: &str,
) -> String {
    match direction {
        LoadStoreKind::Load => line(&format!("{to_arm}{condition}"), &format!("{arm},{vfp}")),
        LoadStoreKind::Store => line(&format!("{from_arm}{condition}"), &format!("{vfp},{arm}")),
    }
}

impl VfpInstruction {
    /// Disassembles the instruction as located at `address`.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn disassembler(&self, address: u32) -> Disassembly {
        match *self {
            Self::DataTransfer {
                condition,
                load_store,
                offsetting,
                precision,
                rn,
                fd,
                offset,
            } => {
                let name = match load_store {
                    LoadStoreKind::Load => "FLD",
                    LoadStoreKind::Store => "FST",
                };
                let bytes = offset.wrapping_mul(4);
                let displacement = if offset == 0 {
                    String::new()
                } else {
                    format!(",#{}0x{bytes:X}", offsetting.sign())
                };
                let text = line(
                    &format!("{name}{}{condition}", precision.suffix()),
                    &format!(
                        "{},[{}{displacement}]",
                        fd.name(precision),
                        register_name(rn)
                    ),
                );

                if rn == REGISTER_PC {
                    let base = address.wrapping_add(PC_OFFSET);
                    Disassembly::data(text, offsetting.apply(base, bytes))
                } else {
                    Disassembly::plain(text)
                }
            }
            Self::BlockDataTransfer {
                condition,
                addressing,
                precision,
                rn,
                fd,
                count,
            } => {
                let name = match addressing.load_store {
                    LoadStoreKind::Load => "FLDM",
                    LoadStoreKind::Store => "FSTM",
                };
                let (first, second) = block_suffix(rn, addressing);
                let registers = (0..count)
                    .step_by(precision.width() as usize)
                    .map(|step| fd.offset(step).name(precision))
                    .collect::<Vec<_>>()
                    .join(",");
                let write_back = if addressing.write_back { "!" } else { "" };

                Disassembly::plain(line(
                    &format!("{name}{first}{second}{}{condition}", precision.suffix()),
                    &format!("{}{write_back},{{{registers}}}", register_name(rn)),
                ))
            }
            Self::ConditionCodeTransfer { condition } => {
                Disassembly::plain(format!("FMSTAT{condition}"))
            }
            Self::SystemRegisterTransfer {
                condition,
                direction,
                system_register,
                rd,
            } => Disassembly::plain(register_transfer(
                condition,
                direction,
                "FMRX",
                "FMXR",
                register_name(rd),
                &system_register_name(system_register),
            )),
            Self::RegisterTransferLow {
                condition,
                direction,
                dn,
                rd,
            } => Disassembly::plain(register_transfer(
                condition,
                direction,
                "FMRDL",
                "FMDLR",
                register_name(rd),
                &double(dn),
            )),
            Self::RegisterTransferHigh {
                condition,
                direction,
                dn,
                rd,
            } => Disassembly::plain(register_transfer(
                condition,
                direction,
                "FMRDH",
                "FMDHR",
                register_name(rd),
                &double(dn),
            )),
            Self::RegisterTransfer32 {
                condition,
                direction,
                fn_,
                rd,
            } => Disassembly::plain(register_transfer(
                condition,
                direction,
                "FMRS",
                "FMSR",
                register_name(rd),
                &single(fn_),
            )),
            Self::RegisterTransfer64 {
                condition,
                direction,
                precision,
                fm,
                rd,
                rn,
            } => {
                let arm = format!("{},{}", register_name(rd), register_name(rn));
                let text = match precision {
                    Precision::Double => {
                        register_transfer(condition, direction, "FMRRD", "FMDRR", &arm, &double(fm))
                    }
                    Precision::Single => {
                        // a pair of consecutive single registers
                        let pair = format!(
                            "{},{}",
                            single(fm),
                            single(FpRegister::single((fm.index() + 1) % 32))
                        );
                        register_transfer(condition, direction, "FMRRS", "FMSRR", &arm, &pair)
                    }
                };
                Disassembly::plain(text)
            }
            Self::CompareToZero {
                condition,
                precision,
                check_nan,
                fd,
            } => {
                let e = if check_nan { "E" } else { "" };
                Disassembly::plain(line(
                    &format!("FCMP{e}Z{}{condition}", precision.suffix()),
                    &fd.name(precision),
                ))
            }
            Self::ConvertFloatToFloat {
                condition,
                precision,
                fd,
                fm,
            } => {
                let direction = match precision {
                    Precision::Single => "DS",
                    Precision::Double => "SD",
                };
                Disassembly::plain(line(
                    &format!("FCVT{direction}{condition}"),
                    &format!("{},{}", fd.name(precision.other()), fm.name(precision)),
                ))
            }
            Self::UnaryDataOperation {
                condition,
                operation,
                precision,
                fd,
                fm,
            } => {
                let destination = if operation.has_integer_destination() {
                    Precision::Single
                } else {
                    precision
                };
                let source = if operation.has_integer_source() {
                    Precision::Single
                } else {
                    precision
                };
                Disassembly::plain(line(
                    &format!("{}{}{condition}", operation.mnemonic(), precision.suffix()),
                    &format!("{},{}", fd.name(destination), fm.name(source)),
                ))
            }
            Self::BinaryDataOperation {
                condition,
                operation,
                precision,
                fd,
                fn_,
                fm,
            } => Disassembly::plain(line(
                &format!("{}{}{condition}", operation.mnemonic(), precision.suffix()),
                &format!(
                    "{},{},{}",
                    fd.name(precision),
                    fn_.name(precision),
                    fm.name(precision)
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::disassembler::ResolvedTarget;
    use crate::bitwise::FieldVerification;
    use crate::vfp::encoding::VfpV2Encoding;
    use pretty_assertions::assert_eq;

    const ENCODING: VfpV2Encoding = VfpV2Encoding::new(FieldVerification::Unchecked);

    const MNEMONICS: [(&str, u32); 92] = [
        ("FCPYS", 0xEEB0_0A40),
        ("FMRS", 0xEE10_0A10),
        ("FMSR", 0xEE00_0A10),
        ("FMSTAT", 0xEEF1_FA10),
        ("FSITOS", 0xEEB8_0AC0),
        ("FUITOS", 0xEEB8_0A40),
        ("FTOSIS", 0xEEBD_0A40),
        ("FTOSIZS", 0xEEBD_0AC0),
        ("FTOUIS", 0xEEBC_0A40),
        ("FTOUIZS", 0xEEBC_0AC0),
        ("FMRX", 0xEEF0_0A10),
        ("FMXR", 0xEEE0_0A10),
        ("FLDS", 0xED10_0A00),
        ("FSTS", 0xED00_0A00),
        ("FLDMIAS", 0xEC90_0A00),
        ("FLDMDBS", 0xED30_0A00),
        ("FSTMIAS", 0xEC80_0A00),
        ("FSTMDBS", 0xED20_0A00),
        ("FABSS", 0xEEB0_0AC0),
        ("FNEGS", 0xEEB1_0A40),
        ("FSQRTS", 0xEEB1_0AC0),
        ("FADDS", 0xEE30_0A00),
        ("FSUBS", 0xEE30_0A40),
        ("FMULS", 0xEE20_0A00),
        ("FDIVS", 0xEE80_0A00),
        ("FMACS", 0xEE00_0A00),
        ("FMSCS", 0xEE10_0A00),
        ("FNMULS", 0xEE20_0A40),
        ("FNMACS", 0xEE00_0A40),
        ("FNMSCS", 0xEE10_0A40),
        ("FCMPS", 0xEEB4_0A40),
        ("FCMPZS", 0xEEB5_0A40),
        ("FCMPES", 0xEEB4_0AC0),
        ("FCMPEZS", 0xEEB5_0AC0),
        ("FCPYD", 0xEEB0_0B40),
        ("FCVTDS", 0xEEB7_0AC0),
        ("FCVTSD", 0xEEB7_0BC0),
        ("FMDHR", 0xEE20_0B10),
        ("FMDLR", 0xEE00_0B10),
        ("FMRDH", 0xEE30_0B10),
        ("FMRDL", 0xEE10_0B10),
        ("FSITOD", 0xEEB8_0BC0),
        ("FUITOD", 0xEEB8_0B40),
        ("FTOSID", 0xEEBD_0B40),
        ("FTOSIZD", 0xEEBD_0BC0),
        ("FTOUID", 0xEEBC_0B40),
        ("FTOUIZD", 0xEEBC_0BC0),
        ("FLDD", 0xED10_0B00),
        ("FSTD", 0xED00_0B00),
        ("FLDMIAD", 0xEC90_0B00),
        ("FLDMDBD", 0xED30_0B00),
        ("FSTMIAD", 0xEC80_0B00),
        ("FSTMDBD", 0xED20_0B00),
        ("FABSD", 0xEEB0_0BC0),
        ("FNEGD", 0xEEB1_0B40),
        ("FSQRTD", 0xEEB1_0BC0),
        ("FADDD", 0xEE30_0B00),
        ("FSUBD", 0xEE30_0B40),
        ("FMULD", 0xEE20_0B00),
        ("FDIVD", 0xEE80_0B00),
        ("FMACD", 0xEE00_0B00),
        ("FMSCD", 0xEE10_0B00),
        ("FNMULD", 0xEE20_0B40),
        ("FNMACD", 0xEE00_0B40),
        ("FNMSCD", 0xEE10_0B40),
        ("FCMPD", 0xEEB4_0B40),
        ("FCMPZD", 0xEEB5_0B40),
        ("FCMPED", 0xEEB4_0BC0),
        ("FCMPEZD", 0xEEB5_0BC0),
        ("FMSRR", 0xEC40_0A10),
        ("FMRRS", 0xEC50_0A10),
        ("FMDRR", 0xEC40_0B10),
        ("FMRRD", 0xEC50_0B10),
        // conditional forms keep the precision before the condition
        ("FADDSNE", 0x1E30_0A00),
        ("FADDDGT", 0xCE30_0B00),
        ("FLDSEQ", 0x0D10_0A00),
        ("FSTDMI", 0x4D00_0B00),
        ("FMSTATLT", 0xBEF1_FA10),
        ("FMRXCS", 0x2EF0_0A10),
        ("FMSRVS", 0x6E00_0A10),
        ("FMRRDLS", 0x9C50_0B10),
        ("FCMPZSHI", 0x8EB5_0A40),
        ("FCVTSDGE", 0xAEB7_0BC0),
        ("FSQRTDLE", 0xDEB1_0BC0),
        ("FTOSIZSPL", 0x5EBD_0AC0),
        ("FLDMIADCC", 0x3C90_0B00),
        ("FNMSCDVC", 0x7E10_0B40),
        ("FMDHRNE", 0x1E20_0B10),
        ("FMRDLEQ", 0x0E10_0B10),
        ("FCPYDHI", 0x8EB0_0B40),
        ("FMULSLS", 0x9E20_0A00),
        ("FSTMDBSGE", 0xAD20_0A00),
    ];

    fn print_at(address: u32, op: u32) -> Disassembly {
        VfpInstruction::decode(&ENCODING, op)
            .unwrap()
            .disassembler(address)
    }

    fn print(op: u32) -> String {
        print_at(0, op).text
    }

    #[test]
    fn mnemonics() {
        for (name, op) in MNEMONICS {
            assert_eq!(print(op).split_whitespace().next(), Some(name), "0x{op:08X}");
        }
    }

    #[test]
    fn register_aliasing() {
        assert_eq!(print(0xEEB0_3B40), "FCPYD    d3,d0");
        assert_eq!(print(0xEEB0_3A40), "FCPYS    s6,s0");
    }

    #[test]
    fn arithmetic() {
        assert_eq!(print(0xEE72_1AA3), "FADDS    s3,s5,s7");
        assert_eq!(print(0x1EB0_0A40), "FCPYSNE  s0,s0");
        assert_eq!(print(0xEEB5_0BC0), "FCMPEZD  d0");
        assert_eq!(print(0xEEB7_0AC0), "FCVTDS   d0,s0");
    }

    #[test]
    fn integer_conversions_use_single_registers() {
        assert_eq!(print(0xEEBD_0AC0), "FTOSIZS  s0,s0");
        assert_eq!(print(0xEEB8_0BC0), "FSITOD   d0,s0");
        assert_eq!(print(0xEEBD_0BC0), "FTOSIZD  s0,d0");
    }

    #[test]
    fn register_transfers() {
        assert_eq!(print(0xEE00_2A90), "FMSR     s1,r2");
        assert_eq!(print(0xEC51_0B12), "FMRRD    r0,r1,d2");
        assert_eq!(print(0xEEF1_0A10), "FMRX     r0,FPSCR");
        assert_eq!(print(0xEEE8_3A10), "FMXR     FPEXC,r3");
        assert_eq!(print(0xEEF2_0A10), "FMRX     r0,??");
        assert_eq!(print(0xEEF1_FA10), "FMSTAT");
    }

    #[test]
    fn block_transfers() {
        assert_eq!(print(0xED2D_8B04), "FSTMFDD  sp!,{d8,d9}");
        assert_eq!(print(0xEC90_0A03), "FLDMIAS  r0,{s0,s1,s2}");
    }

    #[test]
    fn literal_loads() {
        assert_eq!(print(0xED10_0A00), "FLDS     s0,[r0]");
        assert_eq!(print(0xED00_1B02), "FSTD     d1,[r0,#-0x8]");

        let literal = print_at(0x1000, 0xED9F_0B02);
        assert_eq!(literal.text, "FLDD     d0,[pc,#0x8] ; 0x00001010");
        assert_eq!(
            literal.target,
            Some(ResolvedTarget {
                address: 0x1010,
                is_code: false
            })
        );
    }

    #[test]
    fn oversized_offsets_print_like_they_encode() {
        let load = VfpInstruction::data_transfer(
            Condition::AL,
            LoadStoreKind::Load,
            Precision::Single,
            FpRegister::single(0),
            15,
            0x4000_0001,
        );
        assert_eq!(load.encode(&ENCODING), Ok(0xED9F_0A01));

        let printed = load.disassembler(0x8000);
        assert_eq!(printed.text, "FLDS     s0,[pc,#0x4] ; 0x0000800C");
        assert_eq!(
            printed.target,
            Some(ResolvedTarget {
                address: 0x800C,
                is_code: false
            })
        );
        assert_eq!(print_at(0x8000, 0xED9F_0A01), printed);
    }
}
