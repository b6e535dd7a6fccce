use crate::hardware::cpu::instructions::*;
use crate::hardware::registers::{Reg16, Reg8};

/// The eleven holes in the base opcode table.
const ILLEGAL_OPCODES: [u8; 11] = [
    0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD,
];

#[test]
fn test_base_table_round_trip() {
    for opcode in 0..=255u8 {
        if opcode == 0xCB {
            continue;
        }
        let descriptor = descriptor_for(opcode);

        let instruction = Instruction {
            opcode,
            sub_op: None,
            imm8: if descriptor.format.has_imm8() { Some(0x5A) } else { None },
            imm16: if descriptor.format.has_imm16() { Some(0xBEEF) } else { None },
        };

        let encoded = instruction.encode();
        let decoded = Instruction::decode(&encoded);

        assert_eq!(decoded, instruction, "opcode {:#04X}", opcode);
        assert_eq!(decoded.descriptor(), descriptor);
    }
}

#[test]
fn test_prefix_table_round_trip() {
    for sub_op in 0..=255u8 {
        let instruction = Instruction {
            opcode: 0xCB,
            sub_op: Some(sub_op),
            imm8: None,
            imm16: None,
        };

        let encoded = instruction.encode();
        assert_eq!(encoded.len(), 2);

        let decoded = Instruction::decode(&encoded);
        assert_eq!(decoded, instruction, "sub-op {:#04X}", sub_op);
        assert_eq!(decoded.descriptor(), prefix_descriptor_for(sub_op));
    }
}

#[test]
fn test_immediate_lengths() {
    // The format tag alone decides how many bytes follow the opcode.
    let lengths = |opcode: u8| Instruction::decode(&[opcode, 0x11, 0x22]).encode().len();

    assert_eq!(lengths(0x00), 1); // NOP
    assert_eq!(lengths(0x06), 2); // LD B, imm8
    assert_eq!(lengths(0x01), 3); // LD BC, imm16
    assert_eq!(lengths(0x18), 2); // JR
    assert_eq!(lengths(0xC3), 3); // JP
    assert_eq!(lengths(0xE0), 2); // LDH (imm8), A
    assert_eq!(lengths(0x08), 3); // LD (imm16), SP
}

#[test]
fn test_every_base_opcode_is_classified() {
    for opcode in 0..=255u8 {
        if opcode == 0xCB {
            continue;
        }
        let descriptor = descriptor_for(opcode);
        if ILLEGAL_OPCODES.contains(&opcode) {
            assert_eq!(descriptor.kind, InstrKind::Illegal, "opcode {:#04X}", opcode);
        } else {
            assert_ne!(descriptor.kind, InstrKind::Illegal, "opcode {:#04X}", opcode);
        }
    }
}

#[test]
fn test_prefix_table_has_no_holes() {
    for sub_op in 0..=255u8 {
        assert_ne!(
            prefix_descriptor_for(sub_op).kind,
            InstrKind::Illegal,
            "sub-op {:#04X}",
            sub_op
        );
    }
}

#[test]
fn test_register_field_encoding() {
    assert_eq!(src_reg8(0x78), Reg8::B); // LD A, B
    assert_eq!(src_reg8(0x79), Reg8::C);
    assert_eq!(src_reg8(0x7F), Reg8::A);
    assert_eq!(dst_reg8(0x06), Reg8::B); // LD B, imm8
    assert_eq!(dst_reg8(0x3E), Reg8::A); // LD A, imm8
}

#[test]
fn test_reg16_slot_three_depends_on_row() {
    // Rows below 0xC0 use SP in slot 3.
    assert_eq!(reg16(0x31), Reg16::SP); // LD SP, imm16
    assert_eq!(reg16(0x39), Reg16::SP); // ADD HL, SP
    // PUSH/POP rows use AF instead.
    assert_eq!(reg16(0xF5), Reg16::AF); // PUSH AF
    assert_eq!(reg16(0xF1), Reg16::AF); // POP AF
    assert_eq!(reg16(0xC5), Reg16::BC);
    assert_eq!(reg16(0xD5), Reg16::DE);
    assert_eq!(reg16(0xE5), Reg16::HL);
}

#[test]
fn test_condition_codes() {
    assert_eq!(condition(0xC2), JumpCondition::NotZero);
    assert_eq!(condition(0xCA), JumpCondition::Zero);
    assert_eq!(condition(0xD2), JumpCondition::NotCarry);
    assert_eq!(condition(0xDA), JumpCondition::Carry);
}

#[test]
fn test_rst_vectors() {
    assert_eq!(rst_vector(0xC7), 0x00);
    assert_eq!(rst_vector(0xCF), 0x08);
    assert_eq!(rst_vector(0xD7), 0x10);
    assert_eq!(rst_vector(0xFF), 0x38);
}

#[test]
fn test_describe_renders_operands() {
    let ld = Instruction::decode(&[0x06, 0x42]);
    assert_eq!(ld.describe(), "LD B, 0x42");

    let jp = Instruction::decode(&[0xC2, 0x34, 0x12]);
    assert_eq!(jp.describe(), "JP NZ, 0x1234");

    let bit = Instruction::decode(&[0xCB, 0x7E]);
    assert_eq!(bit.describe(), "BIT 7, (HL)");

    let halt = Instruction::decode(&[0x76]);
    assert_eq!(halt.describe(), "HALT");
}
