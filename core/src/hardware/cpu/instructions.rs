use once_cell::sync::Lazy;

use crate::hardware::registers::{Reg16, Reg8};

/// Identifies the routine that executes an instruction. The operand fields
/// themselves are decoded out of the opcode bits at execution time.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InstrKind {
    Illegal,
    Nop,
    Stop,
    Halt,
    Di,
    Ei,
    Rst,
    LdR8R8,
    LdR8Imm8,
    LdR8IHl,
    LdIHlR8,
    LdIHlImm8,
    LdR16Imm16,
    LdIR16A,
    LdAIR16,
    LdHlIncA,
    LdHlDecA,
    LdAHlInc,
    LdAHlDec,
    LdhIImm8A,
    LdhAIImm8,
    LdhICA,
    LdhAIC,
    LdIImm16A,
    LdAIImm16,
    LdIImm16Sp,
    LdHlSpImm8,
    LdSpHl,
    PushR16,
    PopR16,
    IncR16,
    DecR16,
    IncR8,
    DecR8,
    IncIHl,
    DecIHl,
    AddHlR16,
    AddSpImm8,
    AddR8,
    AddImm8,
    AddIHl,
    AdcR8,
    AdcImm8,
    AdcIHl,
    SubR8,
    SubImm8,
    SubIHl,
    SbcR8,
    SbcImm8,
    SbcIHl,
    AndR8,
    AndImm8,
    AndIHl,
    XorR8,
    XorImm8,
    XorIHl,
    OrR8,
    OrImm8,
    OrIHl,
    CpR8,
    CpImm8,
    CpIHl,
    Rlca,
    Rla,
    Daa,
    Scf,
    Rrca,
    Rra,
    Cpl,
    Ccf,
    Jp,
    JpCond,
    JpIHl,
    Jr,
    JrCond,
    Call,
    CallCond,
    Ret,
    RetCond,
    Reti,
    // 0xCB-prefixed bit operations.
    RlcR8,
    RlcIHl,
    RrcR8,
    RrcIHl,
    RlR8,
    RlIHl,
    RrR8,
    RrIHl,
    SlaR8,
    SlaIHl,
    SraR8,
    SraIHl,
    SwapR8,
    SwapIHl,
    SrlR8,
    SrlIHl,
    BitR8,
    BitIHl,
    ResR8,
    ResIHl,
    SetR8,
    SetIHl,
}

/// The operand shape of an instruction: decides how many immediate bytes
/// follow the opcode and how the operands are rendered.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OperandFormat {
    None,
    Illegal,
    Imm8,
    SrcR8,
    DstR8,
    R8Imm8,
    R8R8,
    ICA,
    AIC,
    IHl,
    IHlR8,
    R8IHl,
    IImm8A,
    AIImm8,
    Cond,
    CondImm8,
    CondImm16,
    Imm16,
    R16,
    IR16Imm8,
    R16Imm16,
    IR16A,
    AIR16,
    IR16IncA,
    IR16DecA,
    AIR16Inc,
    AIR16Dec,
    IImm16A,
    AIImm16,
    IImm16Sp,
    SpImm8,
    HlSpImm8,
    SpHl,
}

impl OperandFormat {
    pub fn has_imm8(self) -> bool {
        matches!(
            self,
            OperandFormat::Imm8
                | OperandFormat::R8Imm8
                | OperandFormat::IImm8A
                | OperandFormat::AIImm8
                | OperandFormat::CondImm8
                | OperandFormat::IR16Imm8
                | OperandFormat::SpImm8
                | OperandFormat::HlSpImm8
        )
    }

    pub fn has_imm16(self) -> bool {
        matches!(
            self,
            OperandFormat::CondImm16
                | OperandFormat::Imm16
                | OperandFormat::R16Imm16
                | OperandFormat::IImm16A
                | OperandFormat::AIImm16
                | OperandFormat::IImm16Sp
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct InstructionDescriptor {
    pub kind: InstrKind,
    pub format: OperandFormat,
    pub mnemonic: &'static str,
}

const ILLEGAL: InstructionDescriptor = InstructionDescriptor {
    kind: InstrKind::Illegal,
    format: OperandFormat::Illegal,
    mnemonic: "ILLEGAL",
};

/// The base opcode table. Anything not explicitly built stays illegal.
pub static INSTRUCTION_TABLE: Lazy<[InstructionDescriptor; 256]> = Lazy::new(build_instruction_table);

/// The secondary table behind the 0xCB prefix byte.
pub static PREFIX_TABLE: Lazy<[InstructionDescriptor; 256]> = Lazy::new(build_prefix_table);

pub fn descriptor_for(opcode: u8) -> &'static InstructionDescriptor {
    &INSTRUCTION_TABLE[opcode as usize]
}

pub fn prefix_descriptor_for(sub_op: u8) -> &'static InstructionDescriptor {
    &PREFIX_TABLE[sub_op as usize]
}

fn build_instruction_table() -> [InstructionDescriptor; 256] {
    use InstrKind::*;
    use OperandFormat as F;

    let mut table = [ILLEGAL; 256];
    let mut build = |opcode: u8, mnemonic: &'static str, format: F, kind: InstrKind| {
        table[opcode as usize] = InstructionDescriptor { kind, format, mnemonic };
    };

    build(0x00, "NOP", F::None, Nop);
    build(0x10, "STOP", F::Imm8, Stop);
    build(0x20, "JR", F::CondImm8, JrCond);
    build(0x30, "JR", F::CondImm8, JrCond);

    build(0x01, "LD", F::R16Imm16, LdR16Imm16);
    build(0x11, "LD", F::R16Imm16, LdR16Imm16);
    build(0x21, "LD", F::R16Imm16, LdR16Imm16);
    build(0x31, "LD", F::R16Imm16, LdR16Imm16);

    build(0x02, "LD", F::IR16A, LdIR16A);
    build(0x12, "LD", F::IR16A, LdIR16A);
    build(0x22, "LD", F::IR16IncA, LdHlIncA);
    build(0x32, "LD", F::IR16DecA, LdHlDecA);

    build(0x03, "INC", F::R16, IncR16);
    build(0x13, "INC", F::R16, IncR16);
    build(0x23, "INC", F::R16, IncR16);
    build(0x33, "INC", F::R16, IncR16);
    build(0x0B, "DEC", F::R16, DecR16);
    build(0x1B, "DEC", F::R16, DecR16);
    build(0x2B, "DEC", F::R16, DecR16);
    build(0x3B, "DEC", F::R16, DecR16);

    for opcode in [0x04u8, 0x14, 0x24, 0x0C, 0x1C, 0x2C, 0x3C].iter() {
        build(*opcode, "INC", F::DstR8, IncR8);
    }
    build(0x34, "INC", F::IHl, IncIHl);
    for opcode in [0x05u8, 0x15, 0x25, 0x0D, 0x1D, 0x2D, 0x3D].iter() {
        build(*opcode, "DEC", F::DstR8, DecR8);
    }
    build(0x35, "DEC", F::IHl, DecIHl);

    for opcode in [0x06u8, 0x16, 0x26, 0x0E, 0x1E, 0x2E, 0x3E].iter() {
        build(*opcode, "LD", F::R8Imm8, LdR8Imm8);
    }
    build(0x36, "LD", F::IR16Imm8, LdIHlImm8);

    build(0x07, "RLCA", F::None, Rlca);
    build(0x17, "RLA", F::None, Rla);
    build(0x27, "DAA", F::None, Daa);
    build(0x37, "SCF", F::None, Scf);

    build(0x08, "LD", F::IImm16Sp, LdIImm16Sp);
    build(0x18, "JR", F::Imm8, Jr);
    build(0x28, "JR", F::CondImm8, JrCond);
    build(0x38, "JR", F::CondImm8, JrCond);

    build(0x09, "ADD HL,", F::R16, AddHlR16);
    build(0x19, "ADD HL,", F::R16, AddHlR16);
    build(0x29, "ADD HL,", F::R16, AddHlR16);
    build(0x39, "ADD HL,", F::R16, AddHlR16);

    build(0x0A, "LD", F::AIR16, LdAIR16);
    build(0x1A, "LD", F::AIR16, LdAIR16);
    build(0x2A, "LD", F::AIR16Inc, LdAHlInc);
    build(0x3A, "LD", F::AIR16Dec, LdAHlDec);

    build(0x0F, "RRCA", F::None, Rrca);
    build(0x1F, "RRA", F::None, Rra);
    build(0x2F, "CPL", F::None, Cpl);
    build(0x3F, "CCF", F::None, Ccf);

    for opcode in 0x40..=0x7F {
        if opcode == 0x76 {
            build(0x76, "HALT", F::None, Halt);
        } else if opcode & 0x07 == 0x06 {
            build(opcode, "LD", F::R8IHl, LdR8IHl);
        } else if opcode & 0xF8 == 0x70 {
            build(opcode, "LD", F::IHlR8, LdIHlR8);
        } else {
            build(opcode, "LD", F::R8R8, LdR8R8);
        }
    }

    let alu_rows: [(u8, &'static str, InstrKind, InstrKind); 8] = [
        (0x80, "ADD", AddR8, AddIHl),
        (0x88, "ADC", AdcR8, AdcIHl),
        (0x90, "SUB", SubR8, SubIHl),
        (0x98, "SBC", SbcR8, SbcIHl),
        (0xA0, "AND", AndR8, AndIHl),
        (0xA8, "XOR", XorR8, XorIHl),
        (0xB0, "OR", OrR8, OrIHl),
        (0xB8, "CP", CpR8, CpIHl),
    ];
    for &(base, mnemonic, reg_kind, hl_kind) in alu_rows.iter() {
        for column in 0..8u8 {
            let opcode = base + column;
            if column == 6 {
                build(opcode, mnemonic, F::IHl, hl_kind);
            } else {
                build(opcode, mnemonic, F::SrcR8, reg_kind);
            }
        }
    }

    build(0xC0, "RET", F::Cond, RetCond);
    build(0xD0, "RET", F::Cond, RetCond);
    build(0xE0, "LDH", F::IImm8A, LdhIImm8A);
    build(0xF0, "LDH", F::AIImm8, LdhAIImm8);

    build(0xC1, "POP", F::R16, PopR16);
    build(0xD1, "POP", F::R16, PopR16);
    build(0xE1, "POP", F::R16, PopR16);
    build(0xF1, "POP", F::R16, PopR16);

    build(0xC2, "JP", F::CondImm16, JpCond);
    build(0xD2, "JP", F::CondImm16, JpCond);
    build(0xE2, "LD", F::ICA, LdhICA);
    build(0xF2, "LD", F::AIC, LdhAIC);

    build(0xC3, "JP", F::Imm16, Jp);
    build(0xF3, "DI", F::None, Di);

    build(0xC4, "CALL", F::CondImm16, CallCond);
    build(0xD4, "CALL", F::CondImm16, CallCond);

    build(0xC5, "PUSH", F::R16, PushR16);
    build(0xD5, "PUSH", F::R16, PushR16);
    build(0xE5, "PUSH", F::R16, PushR16);
    build(0xF5, "PUSH", F::R16, PushR16);

    build(0xC6, "ADD", F::Imm8, AddImm8);
    build(0xD6, "SUB", F::Imm8, SubImm8);
    build(0xE6, "AND", F::Imm8, AndImm8);
    build(0xF6, "OR", F::Imm8, OrImm8);

    build(0xC7, "RST 00H", F::None, Rst);
    build(0xD7, "RST 10H", F::None, Rst);
    build(0xE7, "RST 20H", F::None, Rst);
    build(0xF7, "RST 30H", F::None, Rst);

    build(0xC8, "RET", F::Cond, RetCond);
    build(0xD8, "RET", F::Cond, RetCond);
    build(0xE8, "ADD", F::SpImm8, AddSpImm8);
    build(0xF8, "LD", F::HlSpImm8, LdHlSpImm8);

    build(0xC9, "RET", F::None, Ret);
    build(0xD9, "RETI", F::None, Reti);
    build(0xE9, "JP (HL)", F::None, JpIHl);
    build(0xF9, "LD SP, HL", F::SpHl, LdSpHl);

    build(0xCA, "JP", F::CondImm16, JpCond);
    build(0xDA, "JP", F::CondImm16, JpCond);
    build(0xEA, "LD", F::IImm16A, LdIImm16A);
    build(0xFA, "LD", F::AIImm16, LdAIImm16);

    build(0xFB, "EI", F::None, Ei);

    build(0xCC, "CALL", F::CondImm16, CallCond);
    build(0xDC, "CALL", F::CondImm16, CallCond);
    build(0xCD, "CALL", F::Imm16, Call);

    build(0xCE, "ADC", F::Imm8, AdcImm8);
    build(0xDE, "SBC", F::Imm8, SbcImm8);
    build(0xEE, "XOR", F::Imm8, XorImm8);
    build(0xFE, "CP", F::Imm8, CpImm8);

    build(0xCF, "RST 08H", F::None, Rst);
    build(0xDF, "RST 18H", F::None, Rst);
    build(0xEF, "RST 28H", F::None, Rst);
    build(0xFF, "RST 38H", F::None, Rst);

    table
}

fn build_prefix_table() -> [InstructionDescriptor; 256] {
    use InstrKind::*;
    use OperandFormat as F;

    let mut table = [ILLEGAL; 256];

    let rows: [(u8, &'static str, InstrKind, InstrKind); 8] = [
        (0x00, "RLC", RlcR8, RlcIHl),
        (0x08, "RRC", RrcR8, RrcIHl),
        (0x10, "RL", RlR8, RlIHl),
        (0x18, "RR", RrR8, RrIHl),
        (0x20, "SLA", SlaR8, SlaIHl),
        (0x28, "SRA", SraR8, SraIHl),
        (0x30, "SWAP", SwapR8, SwapIHl),
        (0x38, "SRL", SrlR8, SrlIHl),
    ];
    for &(base, mnemonic, reg_kind, hl_kind) in rows.iter() {
        for column in 0..8u8 {
            let opcode = base + column;
            let (kind, format) = if column == 6 { (hl_kind, F::IHl) } else { (reg_kind, F::SrcR8) };
            table[opcode as usize] = InstructionDescriptor {
                kind,
                format,
                mnemonic,
            };
        }
    }

    // BIT/RES/SET: 8 bit indices by 8 operand columns each.
    let bit_rows: [(u8, &'static str, InstrKind, InstrKind); 3] = [
        (0x40, "BIT", BitR8, BitIHl),
        (0x80, "RES", ResR8, ResIHl),
        (0xC0, "SET", SetR8, SetIHl),
    ];
    for &(base, mnemonic, reg_kind, hl_kind) in bit_rows.iter() {
        for offset in 0..64u8 {
            let opcode = base + offset;
            let (kind, format) = if offset & 0x07 == 6 {
                (hl_kind, F::IHl)
            } else {
                (reg_kind, F::SrcR8)
            };
            table[opcode as usize] = InstructionDescriptor {
                kind,
                format,
                mnemonic,
            };
        }
    }

    table
}

/// The condition-code field of conditional jumps/calls/returns.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum JumpCondition {
    NotZero,
    Zero,
    NotCarry,
    Carry,
}

/// Register field encoding used by most 8-bit operations
/// (0 B, 1 C, 2 D, 3 E, 4 H, 5 L, 7 A; 6 means `(HL)` and never reaches
/// this table).
fn reg8_map(code: u8) -> Reg8 {
    match code {
        0x0 => Reg8::B,
        0x1 => Reg8::C,
        0x2 => Reg8::D,
        0x3 => Reg8::E,
        0x4 => Reg8::H,
        0x5 => Reg8::L,
        0x7 => Reg8::A,
        _ => panic!("Register code {} is the (HL) indirection", code),
    }
}

pub fn src_reg8(opcode: u8) -> Reg8 {
    reg8_map(opcode & 0x7)
}

pub fn dst_reg8(opcode: u8) -> Reg8 {
    reg8_map((opcode >> 3) & 0x7)
}

/// The 16-bit register pair field. Slot 3 is SP everywhere except in the
/// 0xC0..=0xFF rows (PUSH/POP), where it is AF.
pub fn reg16(opcode: u8) -> Reg16 {
    match (opcode >> 4) & 0x3 {
        0 => Reg16::BC,
        1 => Reg16::DE,
        2 => Reg16::HL,
        _ => {
            if opcode >= 0xC0 {
                Reg16::AF
            } else {
                Reg16::SP
            }
        }
    }
}

pub fn condition(opcode: u8) -> JumpCondition {
    match (opcode >> 3) & 0x3 {
        0 => JumpCondition::NotZero,
        1 => JumpCondition::Zero,
        2 => JumpCondition::NotCarry,
        _ => JumpCondition::Carry,
    }
}

/// The bit index field of the 0xCB BIT/RES/SET rows.
pub fn bit_index(sub_op: u8) -> u8 {
    (sub_op >> 3) & 0x7
}

/// The target vector of an RST instruction.
pub fn rst_vector(opcode: u8) -> u16 {
    (opcode & 0x38) as u16
}

/// A fully decoded instruction: opcode, optional 0xCB sub-opcode, and any
/// immediates. Used for tracing and for exercising the decoder; execution
/// itself pulls immediates off the bus as it goes, for cycle accuracy.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: u8,
    pub sub_op: Option<u8>,
    pub imm8: Option<u8>,
    pub imm16: Option<u16>,
}

impl Instruction {
    pub fn decode(bytes: &[u8]) -> Instruction {
        let opcode = bytes[0];
        if opcode == 0xCB {
            return Instruction {
                opcode,
                sub_op: Some(bytes[1]),
                imm8: None,
                imm16: None,
            };
        }

        let descriptor = descriptor_for(opcode);
        let imm8 = if descriptor.format.has_imm8() {
            Some(bytes[1])
        } else {
            None
        };
        let imm16 = if descriptor.format.has_imm16() {
            Some((bytes[1] as u16) | ((bytes[2] as u16) << 8))
        } else {
            None
        };

        Instruction {
            opcode,
            sub_op: None,
            imm8,
            imm16,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = vec![self.opcode];
        if let Some(sub_op) = self.sub_op {
            bytes.push(sub_op);
        }
        if let Some(imm8) = self.imm8 {
            bytes.push(imm8);
        }
        if let Some(imm16) = self.imm16 {
            bytes.push(imm16 as u8);
            bytes.push((imm16 >> 8) as u8);
        }
        bytes
    }

    pub fn descriptor(&self) -> &'static InstructionDescriptor {
        match self.sub_op {
            Some(sub_op) => prefix_descriptor_for(sub_op),
            None => descriptor_for(self.opcode),
        }
    }

    /// Human readable rendering, e.g. `LD B, 0x42`.
    pub fn describe(&self) -> String {
        let descriptor = self.descriptor();
        let effective = self.sub_op.unwrap_or(self.opcode);

        let condition_name = |opcode: u8| match condition(opcode) {
            JumpCondition::NotZero => "NZ",
            JumpCondition::Zero => "Z",
            JumpCondition::NotCarry => "NC",
            JumpCondition::Carry => "C",
        };
        let reg16_name = |opcode: u8| match reg16(opcode) {
            Reg16::AF => "AF",
            Reg16::BC => "BC",
            Reg16::DE => "DE",
            Reg16::HL => "HL",
            Reg16::SP => "SP",
        };

        use OperandFormat as F;
        match descriptor.format {
            F::None | F::SpHl => descriptor.mnemonic.to_string(),
            F::Illegal => match self.sub_op {
                Some(sub_op) => format!("illegal instruction 0xCB {:#04x}", sub_op),
                None => format!("illegal instruction {:#04x}", self.opcode),
            },
            F::Imm8 => format!("{} {:#04x}", descriptor.mnemonic, self.imm8.unwrap_or(0)),
            F::SrcR8
                if matches!(
                    descriptor.kind,
                    InstrKind::BitR8 | InstrKind::ResR8 | InstrKind::SetR8
                ) =>
            {
                // BIT/RES/SET carry the bit number as their first operand.
                format!(
                    "{} {}, {:?}",
                    descriptor.mnemonic,
                    bit_index(effective),
                    src_reg8(effective)
                )
            }
            F::SrcR8 => format!("{} {:?}", descriptor.mnemonic, src_reg8(effective)),
            F::DstR8 => format!("{} {:?}", descriptor.mnemonic, dst_reg8(effective)),
            F::R8Imm8 => format!(
                "{} {:?}, {:#04x}",
                descriptor.mnemonic,
                dst_reg8(effective),
                self.imm8.unwrap_or(0)
            ),
            F::R8R8 => format!(
                "{} {:?}, {:?}",
                descriptor.mnemonic,
                dst_reg8(effective),
                src_reg8(effective)
            ),
            F::ICA => format!("{} (C), A", descriptor.mnemonic),
            F::AIC => format!("{} A, (C)", descriptor.mnemonic),
            F::IHl
                if matches!(
                    descriptor.kind,
                    InstrKind::BitIHl | InstrKind::ResIHl | InstrKind::SetIHl
                ) =>
            {
                format!("{} {}, (HL)", descriptor.mnemonic, bit_index(effective))
            }
            F::IHl => format!("{} (HL)", descriptor.mnemonic),
            F::IHlR8 => format!("{} (HL), {:?}", descriptor.mnemonic, src_reg8(effective)),
            F::R8IHl => format!("{} {:?}, (HL)", descriptor.mnemonic, dst_reg8(effective)),
            F::IImm8A => format!("{} ({:#04x}), A", descriptor.mnemonic, self.imm8.unwrap_or(0)),
            F::AIImm8 => format!("{} A, ({:#04x})", descriptor.mnemonic, self.imm8.unwrap_or(0)),
            F::Cond => format!("{} {}", descriptor.mnemonic, condition_name(self.opcode)),
            F::CondImm8 => format!(
                "{} {}, {:#04x}",
                descriptor.mnemonic,
                condition_name(self.opcode),
                self.imm8.unwrap_or(0)
            ),
            F::CondImm16 => format!(
                "{} {}, {:#06x}",
                descriptor.mnemonic,
                condition_name(self.opcode),
                self.imm16.unwrap_or(0)
            ),
            F::Imm16 => format!("{} {:#06x}", descriptor.mnemonic, self.imm16.unwrap_or(0)),
            F::R16 => format!("{} {}", descriptor.mnemonic, reg16_name(self.opcode)),
            F::IR16Imm8 => format!("{} (HL), {:#04x}", descriptor.mnemonic, self.imm8.unwrap_or(0)),
            F::R16Imm16 => format!(
                "{} {}, {:#06x}",
                descriptor.mnemonic,
                reg16_name(self.opcode),
                self.imm16.unwrap_or(0)
            ),
            F::IR16A => format!("{} ({}), A", descriptor.mnemonic, reg16_name(self.opcode)),
            F::AIR16 => format!("{} A, ({})", descriptor.mnemonic, reg16_name(self.opcode)),
            F::IR16IncA => format!("{} (HL+), A", descriptor.mnemonic),
            F::IR16DecA => format!("{} (HL-), A", descriptor.mnemonic),
            F::AIR16Inc => format!("{} A, (HL+)", descriptor.mnemonic),
            F::AIR16Dec => format!("{} A, (HL-)", descriptor.mnemonic),
            F::IImm16A => format!("{} ({:#06x}), A", descriptor.mnemonic, self.imm16.unwrap_or(0)),
            F::AIImm16 => format!("{} A, ({:#06x})", descriptor.mnemonic, self.imm16.unwrap_or(0)),
            F::IImm16Sp => format!("{} ({:#06x}), SP", descriptor.mnemonic, self.imm16.unwrap_or(0)),
            F::SpImm8 => format!("{} SP, {:#04x}", descriptor.mnemonic, self.imm8.unwrap_or(0)),
            F::HlSpImm8 => format!("{} HL, SP+{:#04x}", descriptor.mnemonic, self.imm8.unwrap_or(0)),
        }
    }
}
