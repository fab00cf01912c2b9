//! # Base instruction disassembler
//!
//! Renders an [`ArmInstruction`] the way the code generator's listings show
//! it: the mnemonic (with condition and suffixes) left-aligned in a 9
//! character column, followed by comma-separated operands without spaces.
//!
//! ```text
//! LDR      r0,[pc,#0x10] ; 0x00008018
//! └─ 9 ──┘ └── operands ─┘ └ resolved PC-relative target
//! ```
//!
//! Instructions reading `pc` as their base (branches, literal loads, `ADR`-like
//! `ADD`/`SUB`) also report the resolved address in [`Disassembly::target`],
//! flagged as code or data, so callers can build cross references.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::arm::alu_instruction::{AluOperands, ArmModeAluInstr};
use crate::arm::condition::Condition;
use crate::arm::encoding::{EncodingDefinition, PC_OFFSET, REGISTER_PC, REGISTER_SP};
use crate::arm::flags::{Indexing, LoadStoreKind, Offsetting, ReadWriteKind, ShiftKind};
use crate::arm::instructions::{
    Addressing, ArmInstruction, RegisterShiftedOperand, ShiftedOperand,
};

const REGISTER_NAMES: [&str; 16] = [
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10", "r11", "r12", "sp", "lr",
    "pc",
];

/// Address an instruction refers to, resolved against its own location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    pub address: u32,
    /// `true` for branch destinations, `false` for literal data.
    pub is_code: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disassembly {
    pub text: String,
    pub target: Option<ResolvedTarget>,
}

impl Disassembly {
    pub(crate) const fn plain(text: String) -> Self {
        Self { text, target: None }
    }

    pub(crate) fn data(text: String, address: u32) -> Self {
        Self {
            text: format!("{text} ; 0x{address:08X}"),
            target: Some(ResolvedTarget {
                address,
                is_code: false,
            }),
        }
    }

    /// First word of the text, `""` for an unrecognized word.
    #[must_use]
    pub fn mnemonic(&self) -> &str {
        self.text.split_whitespace().next().unwrap_or_default()
    }
}

/// `r0`..`r12`, `sp`, `lr`, `pc`; `??` for anything that is not a register.
pub(crate) fn register_name(register: u32) -> &'static str {
    usize::try_from(register)
        .ok()
        .and_then(|index| REGISTER_NAMES.get(index))
        .copied()
        .unwrap_or("??")
}

/// Mnemonic padded to the operand column, then the operands.
pub(crate) fn line(mnemonic: &str, operands: &str) -> String {
    if operands.is_empty() {
        mnemonic.to_string()
    } else {
        format!("{mnemonic:<8} {operands}")
    }
}

/// `IA`/`IB`/`DA`/`DB`, or the stack flavoured `FD`/`ED`/`FA`/`EA` when the
/// base is `sp`.
pub(crate) const fn block_suffix(rn: u32, addressing: Addressing) -> (char, char) {
    let pre = matches!(addressing.indexing, Indexing::Pre);
    let up = matches!(addressing.offsetting, Offsetting::Up);
    if rn == REGISTER_SP {
        match addressing.load_store {
            LoadStoreKind::Load => (if pre { 'E' } else { 'F' }, if up { 'D' } else { 'A' }),
            LoadStoreKind::Store => (if pre { 'F' } else { 'E' }, if up { 'A' } else { 'D' }),
        }
    } else {
        (if up { 'I' } else { 'D' }, if pre { 'B' } else { 'A' })
    }
}

/// Compresses a register bitmask into `r0-r3,r5,r6,lr` notation.
///
/// Three or more consecutive registers become a range, two are listed.
pub(crate) fn register_list(list: u32) -> String {
    let mut text = String::new();
    let mut register = 0;
    while register < 16 {
        if list & (1 << register) == 0 {
            register += 1;
            continue;
        }

        let first = register;
        while register < 16 && list & (1 << register) != 0 {
            register += 1;
        }
        let last = register - 1;

        if !text.is_empty() {
            text.push(',');
        }
        match last - first {
            0 => text.push_str(register_name(first)),
            1 => {
                let _ = write!(text, "{},{}", register_name(first), register_name(last));
            }
            _ => {
                let _ = write!(text, "{}-{}", register_name(first), register_name(last));
            }
        }
    }

    text
}

fn shifted(operand: ShiftedOperand) -> String {
    let rm = register_name(operand.rm);
    match (operand.shift_kind, operand.shift_amount) {
        (ShiftKind::Rrx, _) => format!("{rm},RRX"),
        (_, 0) => rm.to_string(),
        (kind, amount) => format!("{rm},{kind} #{amount}"),
    }
}

fn register_shifted(operand: RegisterShiftedOperand) -> String {
    format!(
        "{},{} {}",
        register_name(operand.rm),
        operand.shift_kind,
        register_name(operand.rs)
    )
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

fn load_store(kind: LoadStoreKind) -> &'static str {
    match kind {
        LoadStoreKind::Load => "LDR",
        LoadStoreKind::Store => "STR",
    }
}

fn alu_mnemonic(alu_instruction: ArmModeAluInstr, condition: Condition, set: bool) -> String {
    let s = if set && !alu_instruction.is_test() {
        "S"
    } else {
        ""
    };
    format!("{alu_instruction}{condition}{s}")
}

fn alu_registers(alu_instruction: ArmModeAluInstr, rn: u32, rd: u32) -> String {
    match alu_instruction.operands() {
        AluOperands::Destination => register_name(rd).to_string(),
        AluOperands::Source => register_name(rn).to_string(),
        AluOperands::DestinationAndSource => {
            format!("{},{}", register_name(rd), register_name(rn))
        }
    }
}

/// Renders `{rd},[{rn}` + `offset` + closing bracket and write back.
fn transfer_operands(rd: u32, rn: u32, addressing: Addressing, offset: &str) -> String {
    let pre = addressing.indexing == Indexing::Pre;
    let mut text = format!("{},[{}", register_name(rd), register_name(rn));
    if !pre {
        text.push(']');
    }
    text.push_str(offset);
    if pre {
        text.push(']');
    }
    if addressing.write_back {
        text.push('!');
    }

    text
}

/// Literal address of a `pc`-based transfer.
const fn literal_address(address: u32, addressing: Addressing, offset: u32) -> u32 {
    let base = address.wrapping_add(PC_OFFSET);
    match addressing.indexing {
        Indexing::Pre => addressing.offsetting.apply(base, offset),
        Indexing::Post => base,
    }
}

const fn is_preload(condition: Condition, rd: u32, addressing: Addressing) -> bool {
    matches!(condition, Condition::NV)
        && rd == REGISTER_PC
        && matches!(addressing.load_store, LoadStoreKind::Load)
        && matches!(addressing.indexing, Indexing::Pre)
        && !addressing.write_back
}

/// Single data transfer mnemonic and the operand prefix up to the offset.
///
/// A load of `pc` with the reserved condition, pre-indexed and without write
/// back is the `PLD` hint, printed with its base register only.
fn single_transfer(
    condition: Condition,
    quantity: ReadWriteKind,
    addressing: Addressing,
    rn: u32,
    rd: u32,
    offset: &str,
) -> String {
    if is_preload(condition, rd, addressing) {
        return line("PLD", &format!("{}{offset}", register_name(rn)));
    }

    let byte = if quantity == ReadWriteKind::Byte {
        "B"
    } else {
        ""
    };
    line(
        &format!("{}{condition}{byte}", load_store(addressing.load_store)),
        &transfer_operands(rd, rn, addressing, offset),
    )
}

impl ArmInstruction {
    /// Disassembles the instruction as located at `address`.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn disassembler(&self, encoding: &dyn EncodingDefinition, address: u32) -> Disassembly {
        match *self {
            Self::Mrs { condition, psr, rd } => Disassembly::plain(line(
                &format!("MRS{condition}"),
                &format!("{},{psr}", register_name(rd)),
            )),
            Self::MsrRegister {
                condition,
                psr,
                fields,
                rm,
            } => Disassembly::plain(line(
                &format!("MSR{condition}"),
                &format!("{psr}_{fields},{}", register_name(rm)),
            )),
            Self::MsrImmediate {
                condition,
                psr,
                fields,
                seed,
                rotation,
            } => {
                let value = encoding.data_processing_immediate_value(seed, rotation);
                Disassembly::plain(line(
                    &format!("MSR{condition}"),
                    &format!("{psr}_{fields},#0x{value:X}"),
                ))
            }
            Self::DataProcessingImmediate {
                condition,
                alu_instruction,
                set_conditions,
                rn,
                rd,
                seed,
                rotation,
            } => {
                let value = encoding.data_processing_immediate_value(seed, rotation);
                let text = line(
                    &alu_mnemonic(alu_instruction, condition, set_conditions),
                    &format!("{},#0x{value:X}", alu_registers(alu_instruction, rn, rd)),
                );

                let base = address.wrapping_add(PC_OFFSET);
                match alu_instruction {
                    ArmModeAluInstr::Add if rn == REGISTER_PC => {
                        Disassembly::data(text, base.wrapping_add(value))
                    }
                    ArmModeAluInstr::Sub if rn == REGISTER_PC => {
                        Disassembly::data(text, base.wrapping_sub(value))
                    }
                    _ => Disassembly::plain(text),
                }
            }
            Self::DataProcessingShiftImmediate {
                condition,
                alu_instruction,
                set_conditions,
                rn,
                rd,
                operand,
            } => Disassembly::plain(line(
                &alu_mnemonic(alu_instruction, condition, set_conditions),
                &format!(
                    "{},{}",
                    alu_registers(alu_instruction, rn, rd),
                    shifted(operand)
                ),
            )),
            Self::DataProcessingShiftRegister {
                condition,
                alu_instruction,
                set_conditions,
                rn,
                rd,
                operand,
            } => Disassembly::plain(line(
                &alu_mnemonic(alu_instruction, condition, set_conditions),
                &format!(
                    "{},{}",
                    alu_registers(alu_instruction, rn, rd),
                    register_shifted(operand)
                ),
            )),
            Self::Multiply {
                condition,
                set_conditions,
                accumulate,
                rd,
                rn,
                rs,
                rm,
            } => {
                let name = if accumulate { "MLA" } else { "MUL" };
                let s = if set_conditions { "S" } else { "" };
                let mut operands = format!(
                    "{},{},{}",
                    register_name(rd),
                    register_name(rm),
                    register_name(rs)
                );
                if accumulate {
                    operands.push(',');
                    operands.push_str(register_name(rn));
                }

                Disassembly::plain(line(&format!("{name}{condition}{s}"), &operands))
            }
            Self::MultiplyLong {
                condition,
                set_conditions,
                accumulate,
                signed,
                rd_hi,
                rd_lo,
                rs,
                rm,
            } => {
                let sign = if signed { "S" } else { "U" };
                let name = if accumulate { "MLAL" } else { "MULL" };
                let s = if set_conditions { "S" } else { "" };
                Disassembly::plain(line(
                    &format!("{sign}{name}{condition}{s}"),
                    &format!(
                        "{},{},{},{}",
                        register_name(rd_lo),
                        register_name(rd_hi),
                        register_name(rm),
                        register_name(rs)
                    ),
                ))
            }
            Self::SingleDataSwap {
                condition,
                quantity,
                rn,
                rd,
                rm,
            } => {
                let byte = if quantity == ReadWriteKind::Byte {
                    "B"
                } else {
                    ""
                };
                Disassembly::plain(line(
                    &format!("SWP{condition}{byte}"),
                    &format!(
                        "{},{},[{}]",
                        register_name(rd),
                        register_name(rm),
                        register_name(rn)
                    ),
                ))
            }
            Self::BranchAndExchange { condition, rn } => {
                Disassembly::plain(line(&format!("BX{condition}"), register_name(rn)))
            }
            Self::HalfwordTransferRegister {
                condition,
                transfer_kind,
                addressing,
                rn,
                rd,
                rm,
            } => {
                let offset = format!(",{}{}", addressing.offsetting.sign(), register_name(rm));
                Disassembly::plain(line(
                    &format!(
                        "{}{condition}{transfer_kind}",
                        load_store(addressing.load_store)
                    ),
                    &transfer_operands(rd, rn, addressing, &offset),
                ))
            }
            Self::HalfwordTransferImmediate {
                condition,
                transfer_kind,
                addressing,
                rn,
                rd,
                offset,
            } => {
                let text = line(
                    &format!(
                        "{}{condition}{transfer_kind}",
                        load_store(addressing.load_store)
                    ),
                    &transfer_operands(
                        rd,
                        rn,
                        addressing,
                        &format!(",#{}{offset}", addressing.offsetting.sign()),
                    ),
                );

                if rn == REGISTER_PC {
                    Disassembly::data(text, literal_address(address, addressing, offset))
                } else {
                    Disassembly::plain(text)
                }
            }
            Self::SingleTransferImmediate {
                condition,
                quantity,
                addressing,
                rn,
                rd,
                offset,
            } => {
                let offset_text = if offset == 0 {
                    String::new()
                } else {
                    format!(",#{}0x{offset:X}", addressing.offsetting.sign())
                };
                let text = single_transfer(condition, quantity, addressing, rn, rd, &offset_text);

                if rn == REGISTER_PC {
                    Disassembly::data(text, literal_address(address, addressing, offset))
                } else {
                    Disassembly::plain(text)
                }
            }
            Self::SingleTransferShiftImmediate {
                condition,
                quantity,
                addressing,
                rn,
                rd,
                operand,
            } => {
                let offset = format!(",{}{}", addressing.offsetting.sign(), shifted(operand));
                Disassembly::plain(single_transfer(
                    condition, quantity, addressing, rn, rd, &offset,
                ))
            }
            Self::SingleTransferShiftRegister {
                condition,
                quantity,
                addressing,
                rn,
                rd,
                operand,
            } => {
                let offset = format!(
                    ",{}{}",
                    addressing.offsetting.sign(),
                    register_shifted(operand)
                );
                Disassembly::plain(single_transfer(
                    condition, quantity, addressing, rn, rd, &offset,
                ))
            }
            Self::BlockDataTransfer {
                condition,
                addressing,
                load_psr,
                rn,
                register_list: list,
            } => {
                let (first, second) = block_suffix(rn, addressing);
                let name = match addressing.load_store {
                    LoadStoreKind::Load => "LDM",
                    LoadStoreKind::Store => "STM",
                };
                let write_back = if addressing.write_back { "!" } else { "" };
                let psr = if load_psr { "^" } else { "" };
                Disassembly::plain(line(
                    &format!("{name}{first}{second}{condition}"),
                    &format!(
                        "{}{write_back},{{{}}}{psr}",
                        register_name(rn),
                        register_list(list)
                    ),
                ))
            }
            Self::Branch {
                condition,
                link,
                offset,
            } => {
                let target = address
                    .wrapping_add(PC_OFFSET)
                    .wrapping_add_signed(offset);
                let l = if link { "L" } else { "" };
                Disassembly {
                    text: line(&format!("B{l}{condition}"), &format!("0x{target:08X}")),
                    target: Some(ResolvedTarget {
                        address: target,
                        is_code: true,
                    }),
                }
            }
            Self::CoprocessorDataTransfer {
                condition,
                addressing,
                wide,
                cp_number,
                rn,
                crd,
                offset,
            } => {
                let name = match addressing.load_store {
                    LoadStoreKind::Load => "LDC",
                    LoadStoreKind::Store => "STC",
                };
                Disassembly::plain(line(
                    &format!("{name}{condition}"),
                    &format!(
                        "CP{cp_number}, P={}, U={}, N={}, W={}, C{crd}, {}, 0x{offset:X}",
                        flag(addressing.indexing.into()),
                        flag(addressing.offsetting.into()),
                        flag(wide),
                        flag(addressing.write_back),
                        register_name(rn)
                    ),
                ))
            }
            Self::CoprocessorDataOperation {
                condition,
                cp_number,
                op1,
                op2,
                crn,
                crm,
                crd,
            } => Disassembly::plain(format!(
                "CDP{condition} CP{cp_number},0x{op1:X},C{crd},C{crn},C{crm},0x{op2:X}"
            )),
            Self::CoprocessorRegisterTransfer {
                condition,
                direction,
                cp_number,
                op1,
                op2,
                crn,
                crm,
                rd,
            } => {
                let name = match direction {
                    LoadStoreKind::Load => "MRC",
                    LoadStoreKind::Store => "MCR",
                };
                Disassembly::plain(line(
                    &format!("{name}{condition}"),
                    &format!(
                        "CP{cp_number},0x{op1:X},{},C{crn},C{crm},0x{op2:X}",
                        register_name(rd)
                    ),
                ))
            }
            Self::SoftwareInterrupt { condition, comment } => Disassembly::plain(line(
                &format!("SWI{condition}"),
                &format!("#0x{comment:06X}"),
            )),
            Self::Breakpoint { immediate } => {
                Disassembly::plain(line("BKPT", &format!("#0x{immediate:06X}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::encoding::ArmV5Encoding;
    use pretty_assertions::assert_eq;

    const ENCODING: ArmV5Encoding = ArmV5Encoding::new(crate::bitwise::FieldVerification::Checked);

    fn print_at(address: u32, op: u32) -> Disassembly {
        ArmInstruction::decode(&ENCODING, op)
            .unwrap()
            .disassembler(&ENCODING, address)
    }

    fn print(op: u32) -> String {
        print_at(0, op).text
    }

    #[test]
    fn register_names() {
        assert_eq!(register_name(0), "r0");
        assert_eq!(register_name(12), "r12");
        assert_eq!(register_name(13), "sp");
        assert_eq!(register_name(14), "lr");
        assert_eq!(register_name(15), "pc");
        assert_eq!(register_name(16), "??");
    }

    #[test]
    fn register_ranges() {
        assert_eq!(register_list(0b1111), "r0-r3");
        assert_eq!(register_list(0b0011), "r0,r1");
        assert_eq!(register_list(0x4070), "r4-r6,lr");
        assert_eq!(register_list(0xC0A5), "r0,r2,r5,r7,lr,pc");
        assert_eq!(register_list(0xFFFF), "r0-pc");
        assert_eq!(register_list(0), "");
    }

    #[test]
    fn data_processing() {
        assert_eq!(print(0xE081_0182), "ADD      r0,r1,r2,LSL #3");
        assert_eq!(print(0xE3B0_24FF), "MOVS     r2,#0xFF000000");
        assert_eq!(print(0xE351_0004), "CMP      r1,#0x4");
        assert_eq!(print(0xE1A0_0312), "MOV      r0,r2,LSL r3");
        assert_eq!(print(0xE1A0_0061), "MOV      r0,r1,RRX");
        assert_eq!(print(0x11A0_1042), "MOVNE    r1,r2,ASR #32");
    }

    #[test]
    fn pc_relative_address_generation() {
        // ADD r0, pc, #8
        let add = print_at(0x1000, 0xE28F_0008);
        assert_eq!(add.text, "ADD      r0,pc,#0x8 ; 0x00001010");
        assert_eq!(
            add.target,
            Some(ResolvedTarget {
                address: 0x1010,
                is_code: false
            })
        );

        // SUB r0, pc, #8
        assert_eq!(print_at(0x1000, 0xE24F_0008).target.map(|t| t.address), Some(0x1000));
    }

    #[test]
    fn status_registers() {
        assert_eq!(print(0xE10F_0000), "MRS      r0,CPSR");
        assert_eq!(print(0xE129_F000), "MSR      CPSR_cf,r0");
        assert_eq!(print(0xE368_F20F), "MSR      SPSR_f,#0xF0000000");
    }

    #[test]
    fn multiplies_and_swaps() {
        assert_eq!(print(0xE020_3291), "MLA      r0,r1,r2,r3");
        assert_eq!(print(0xE0B2_1493), "UMLALS   r1,r2,r3,r4");
        assert_eq!(print(0xE142_0091), "SWPB     r0,r1,[r2]");
        assert_eq!(print(0xE12F_FF1E), "BX       lr");
    }

    #[test]
    fn transfers() {
        assert_eq!(print(0xE170_1AF4), "LDRSH    r1,[r0,#-164]!");
        assert_eq!(print(0xE011_00B2), "LDRH     r0,[r1],-r2");
        assert_eq!(print(0xE771_0142), "LDRB     r0,[r1,-r2,ASR #2]!");
        assert_eq!(print(0xE491_0004), "LDR      r0,[r1],#0x4");
        assert_eq!(print(0xE581_2000), "STR      r2,[r1]");
    }

    #[test]
    fn literal_pool_load() {
        // LDR r0, [pc, #0x10]
        let ldr = print_at(0x8000, 0xE59F_0010);
        assert_eq!(ldr.text, "LDR      r0,[pc,#0x10] ; 0x00008018");
        assert_eq!(
            ldr.target,
            Some(ResolvedTarget {
                address: 0x8018,
                is_code: false
            })
        );
    }

    #[test]
    fn preload_overlay() {
        let pld = print(0xF550_F000);
        assert_eq!(pld, "PLD      r0");

        // same shape with a real condition is an ordinary load
        assert_eq!(print(0xE550_F000), "LDRB     pc,[r0]");
    }

    #[test]
    fn block_transfers() {
        assert_eq!(print(0xE92D_4070), "STMFD    sp!,{r4-r6,lr}");
        assert_eq!(print(0xE8BD_8030), "LDMFD    sp!,{r4,r5,pc}");
        assert_eq!(print(0xE890_000F), "LDMIA    r0,{r0-r3}");
        assert_eq!(print(0xE9D0_0003), "LDMIB    r0,{r0,r1}^");
    }

    #[test]
    fn branches() {
        let bne = print_at(0x2000, 0x1AFF_FFFE);
        assert_eq!(bne.text, "BNE      0x00002000");
        assert_eq!(
            bne.target,
            Some(ResolvedTarget {
                address: 0x2000,
                is_code: true
            })
        );
        assert_eq!(bne.mnemonic(), "BNE");
    }

    #[test]
    fn coprocessor_and_exceptions() {
        assert_eq!(print(0xEE11_0F10), "MRC      CP15,0x0,r0,C1,C0,0x0");
        assert_eq!(print(0xEE12_3405), "CDP CP4,0x1,C3,C2,C5,0x0");
        assert_eq!(
            print(0xED93_1204),
            "LDC      CP2, P=1, U=1, N=0, W=0, C1, r3, 0x4"
        );
        assert_eq!(print(0xEF00_0011), "SWI      #0x000011");
        assert_eq!(print(0xE121_2374), "BKPT     #0x001234");
    }
}
