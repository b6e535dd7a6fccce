use crate::hardware::cpu::instructions::*;
use crate::hardware::cpu::CPU;
use crate::hardware::mmu::MemoryMapper;
use crate::hardware::registers::{Reg16, Reg8};

impl<M: MemoryMapper> CPU<M> {
    pub(super) fn read_reg8(&self, register: Reg8) -> u8 {
        use Reg8::*;
        match register {
            A => self.registers.a,
            B => self.registers.b,
            C => self.registers.c,
            D => self.registers.d,
            E => self.registers.e,
            H => self.registers.h,
            L => self.registers.l,
        }
    }

    pub(super) fn write_reg8(&mut self, register: Reg8, value: u8) {
        use Reg8::*;
        match register {
            A => self.registers.a = value,
            B => self.registers.b = value,
            C => self.registers.c = value,
            D => self.registers.d = value,
            E => self.registers.e = value,
            H => self.registers.h = value,
            L => self.registers.l = value,
        }
    }

    pub(super) fn read_reg16(&self, register: Reg16) -> u16 {
        use Reg16::*;
        match register {
            AF => self.registers.af(),
            BC => self.registers.bc(),
            DE => self.registers.de(),
            HL => self.registers.hl(),
            SP => self.registers.sp,
        }
    }

    pub(super) fn write_reg16(&mut self, register: Reg16, value: u16) {
        use Reg16::*;
        match register {
            AF => self.registers.set_af(value),
            BC => self.registers.set_bc(value),
            DE => self.registers.set_de(value),
            HL => self.registers.set_hl(value),
            SP => self.registers.sp = value,
        }
    }

    fn condition_met(&self, condition: JumpCondition) -> bool {
        match condition {
            JumpCondition::NotZero => !self.registers.zf(),
            JumpCondition::Zero => self.registers.zf(),
            JumpCondition::NotCarry => !self.registers.cf(),
            JumpCondition::Carry => self.registers.cf(),
        }
    }

    /// Execute one instruction of the base table. The opcode byte has
    /// already been fetched; immediates are pulled off the bus here so the
    /// peripheral ticks line up with the real fetch pattern.
    pub(super) fn execute(&mut self, opcode: u8) {
        use InstrKind::*;

        match descriptor_for(opcode).kind {
            Nop => {}
            Stop => self.fatal_instruction(opcode, None),
            Halt => self.halt(),
            Di => self.ime = false,
            Ei => self.ime = true,
            Rst => {
                self.add_cycles();
                let pc = self.registers.pc;
                self.push16(pc);
                self.registers.pc = rst_vector(opcode);
            }

            LdR8R8 => {
                let value = self.read_reg8(src_reg8(opcode));
                self.write_reg8(dst_reg8(opcode), value);
            }
            LdR8Imm8 => {
                let value = self.get_instr_u8();
                self.write_reg8(dst_reg8(opcode), value);
            }
            LdR8IHl => {
                let value = self.read_byte_cycle(self.registers.hl());
                self.write_reg8(dst_reg8(opcode), value);
            }
            LdIHlR8 => {
                let value = self.read_reg8(src_reg8(opcode));
                self.write_byte_cycle(self.registers.hl(), value);
            }
            LdIHlImm8 => {
                let value = self.get_instr_u8();
                self.write_byte_cycle(self.registers.hl(), value);
            }
            LdR16Imm16 => {
                let value = self.get_instr_u16();
                self.write_reg16(reg16(opcode), value);
            }
            LdIR16A => {
                let address = self.read_reg16(reg16(opcode));
                self.write_byte_cycle(address, self.registers.a);
            }
            LdAIR16 => {
                let address = self.read_reg16(reg16(opcode));
                self.registers.a = self.read_byte_cycle(address);
            }
            LdHlIncA => {
                let hl = self.registers.hl();
                self.write_byte_cycle(hl, self.registers.a);
                self.registers.set_hl(hl.wrapping_add(1));
            }
            LdHlDecA => {
                let hl = self.registers.hl();
                self.write_byte_cycle(hl, self.registers.a);
                self.registers.set_hl(hl.wrapping_sub(1));
            }
            LdAHlInc => {
                let hl = self.registers.hl();
                self.registers.a = self.read_byte_cycle(hl);
                self.registers.set_hl(hl.wrapping_add(1));
            }
            LdAHlDec => {
                let hl = self.registers.hl();
                self.registers.a = self.read_byte_cycle(hl);
                self.registers.set_hl(hl.wrapping_sub(1));
            }
            LdhIImm8A => {
                let offset = self.get_instr_u8();
                self.write_byte_cycle(0xFF00 | offset as u16, self.registers.a);
            }
            LdhAIImm8 => {
                let offset = self.get_instr_u8();
                self.registers.a = self.read_byte_cycle(0xFF00 | offset as u16);
            }
            LdhICA => {
                let address = 0xFF00 | self.registers.c as u16;
                self.write_byte_cycle(address, self.registers.a);
            }
            LdhAIC => {
                let address = 0xFF00 | self.registers.c as u16;
                self.registers.a = self.read_byte_cycle(address);
            }
            LdIImm16A => {
                let address = self.get_instr_u16();
                self.write_byte_cycle(address, self.registers.a);
            }
            LdAIImm16 => {
                let address = self.get_instr_u16();
                self.registers.a = self.read_byte_cycle(address);
            }
            LdIImm16Sp => {
                let address = self.get_instr_u16();
                let sp = self.registers.sp;
                self.write_short_cycle(address, sp);
            }
            LdHlSpImm8 => {
                let offset = self.get_instr_u8();
                let result = self.sp_plus_offset(offset);
                self.registers.set_hl(result);
                self.add_cycles();
            }
            LdSpHl => {
                self.registers.sp = self.registers.hl();
                self.add_cycles();
            }

            PushR16 => {
                self.add_cycles();
                let value = self.read_reg16(reg16(opcode));
                self.push16(value);
            }
            PopR16 => {
                let value = self.pop16();
                self.write_reg16(reg16(opcode), value);
            }

            IncR16 => {
                let register = reg16(opcode);
                let value = self.read_reg16(register).wrapping_add(1);
                self.write_reg16(register, value);
                self.add_cycles();
            }
            DecR16 => {
                let register = reg16(opcode);
                let value = self.read_reg16(register).wrapping_sub(1);
                self.write_reg16(register, value);
                self.add_cycles();
            }
            IncR8 => {
                let register = dst_reg8(opcode);
                let value = self.read_reg8(register);
                let result = self.inc8(value);
                self.write_reg8(register, result);
            }
            DecR8 => {
                let register = dst_reg8(opcode);
                let value = self.read_reg8(register);
                let result = self.dec8(value);
                self.write_reg8(register, result);
            }
            IncIHl => {
                let hl = self.registers.hl();
                let value = self.read_byte_cycle(hl);
                let result = self.inc8(value);
                self.write_byte_cycle(hl, result);
            }
            DecIHl => {
                let hl = self.registers.hl();
                let value = self.read_byte_cycle(hl);
                let result = self.dec8(value);
                self.write_byte_cycle(hl, result);
            }

            AddHlR16 => {
                let value = self.read_reg16(reg16(opcode));
                self.add16_hl(value);
                self.add_cycles();
            }
            AddSpImm8 => {
                let offset = self.get_instr_u8();
                self.registers.sp = self.sp_plus_offset(offset);
                self.add_cycles();
                self.add_cycles();
            }

            AddR8 => {
                let value = self.read_reg8(src_reg8(opcode));
                self.add(value);
            }
            AddImm8 => {
                let value = self.get_instr_u8();
                self.add(value);
            }
            AddIHl => {
                let value = self.read_byte_cycle(self.registers.hl());
                self.add(value);
            }
            AdcR8 => {
                let value = self.read_reg8(src_reg8(opcode));
                self.adc(value);
            }
            AdcImm8 => {
                let value = self.get_instr_u8();
                self.adc(value);
            }
            AdcIHl => {
                let value = self.read_byte_cycle(self.registers.hl());
                self.adc(value);
            }
            SubR8 => {
                let value = self.read_reg8(src_reg8(opcode));
                self.sub(value);
            }
            SubImm8 => {
                let value = self.get_instr_u8();
                self.sub(value);
            }
            SubIHl => {
                let value = self.read_byte_cycle(self.registers.hl());
                self.sub(value);
            }
            SbcR8 => {
                let value = self.read_reg8(src_reg8(opcode));
                self.sbc(value);
            }
            SbcImm8 => {
                let value = self.get_instr_u8();
                self.sbc(value);
            }
            SbcIHl => {
                let value = self.read_byte_cycle(self.registers.hl());
                self.sbc(value);
            }
            AndR8 => {
                let value = self.read_reg8(src_reg8(opcode));
                self.and(value);
            }
            AndImm8 => {
                let value = self.get_instr_u8();
                self.and(value);
            }
            AndIHl => {
                let value = self.read_byte_cycle(self.registers.hl());
                self.and(value);
            }
            XorR8 => {
                let value = self.read_reg8(src_reg8(opcode));
                self.xor(value);
            }
            XorImm8 => {
                let value = self.get_instr_u8();
                self.xor(value);
            }
            XorIHl => {
                let value = self.read_byte_cycle(self.registers.hl());
                self.xor(value);
            }
            OrR8 => {
                let value = self.read_reg8(src_reg8(opcode));
                self.or(value);
            }
            OrImm8 => {
                let value = self.get_instr_u8();
                self.or(value);
            }
            OrIHl => {
                let value = self.read_byte_cycle(self.registers.hl());
                self.or(value);
            }
            CpR8 => {
                let value = self.read_reg8(src_reg8(opcode));
                self.compare(value);
            }
            CpImm8 => {
                let value = self.get_instr_u8();
                self.compare(value);
            }
            CpIHl => {
                let value = self.read_byte_cycle(self.registers.hl());
                self.compare(value);
            }

            // The accumulator rotates always clear the zero flag.
            Rlca => {
                let result = self.rlc(self.registers.a);
                self.registers.a = result;
                self.registers.set_zf(false);
            }
            Rla => {
                let result = self.rl(self.registers.a);
                self.registers.a = result;
                self.registers.set_zf(false);
            }
            Rrca => {
                let result = self.rrc(self.registers.a);
                self.registers.a = result;
                self.registers.set_zf(false);
            }
            Rra => {
                let result = self.rr(self.registers.a);
                self.registers.a = result;
                self.registers.set_zf(false);
            }
            Daa => self.daa(),
            Scf => {
                self.registers.set_n(false);
                self.registers.set_h(false);
                self.registers.set_cf(true);
            }
            Cpl => {
                self.registers.a = !self.registers.a;
                self.registers.set_n(true);
                self.registers.set_h(true);
            }
            Ccf => {
                let carry = self.registers.cf();
                self.registers.set_n(false);
                self.registers.set_h(false);
                self.registers.set_cf(!carry);
            }

            Jp => {
                let address = self.get_instr_u16();
                self.registers.pc = address;
                self.add_cycles();
            }
            JpCond => {
                let address = self.get_instr_u16();
                if self.condition_met(condition(opcode)) {
                    self.registers.pc = address;
                    self.add_cycles();
                }
            }
            JpIHl => self.registers.pc = self.registers.hl(),
            Jr => {
                let offset = self.get_instr_u8();
                self.relative_jump(offset);
            }
            JrCond => {
                let offset = self.get_instr_u8();
                if self.condition_met(condition(opcode)) {
                    self.relative_jump(offset);
                }
            }
            Call => {
                let address = self.get_instr_u16();
                self.add_cycles();
                let pc = self.registers.pc;
                self.push16(pc);
                self.registers.pc = address;
            }
            CallCond => {
                let address = self.get_instr_u16();
                if self.condition_met(condition(opcode)) {
                    self.add_cycles();
                    let pc = self.registers.pc;
                    self.push16(pc);
                    self.registers.pc = address;
                }
            }
            Ret => {
                self.registers.pc = self.pop16();
                self.add_cycles();
            }
            RetCond => {
                self.add_cycles();
                if self.condition_met(condition(opcode)) {
                    self.registers.pc = self.pop16();
                    self.add_cycles();
                }
            }
            Reti => {
                self.ime = true;
                self.registers.pc = self.pop16();
                self.add_cycles();
            }

            Illegal => self.fatal_instruction(opcode, None),
            _ => unreachable!("Prefix instruction {:02X} in the base table", opcode),
        }
    }

    /// Execute one instruction of the 0xCB table; the sub-opcode has already
    /// been fetched.
    pub(super) fn execute_prefix(&mut self, sub_op: u8) {
        use InstrKind::*;

        match prefix_descriptor_for(sub_op).kind {
            RlcR8 => self.prefix_on_reg(sub_op, Self::rlc),
            RlcIHl => self.prefix_on_hl(Self::rlc),
            RrcR8 => self.prefix_on_reg(sub_op, Self::rrc),
            RrcIHl => self.prefix_on_hl(Self::rrc),
            RlR8 => self.prefix_on_reg(sub_op, Self::rl),
            RlIHl => self.prefix_on_hl(Self::rl),
            RrR8 => self.prefix_on_reg(sub_op, Self::rr),
            RrIHl => self.prefix_on_hl(Self::rr),
            SlaR8 => self.prefix_on_reg(sub_op, Self::sla),
            SlaIHl => self.prefix_on_hl(Self::sla),
            SraR8 => self.prefix_on_reg(sub_op, Self::sra),
            SraIHl => self.prefix_on_hl(Self::sra),
            SwapR8 => self.prefix_on_reg(sub_op, Self::swap),
            SwapIHl => self.prefix_on_hl(Self::swap),
            SrlR8 => self.prefix_on_reg(sub_op, Self::srl),
            SrlIHl => self.prefix_on_hl(Self::srl),

            BitR8 => {
                let value = self.read_reg8(src_reg8(sub_op));
                self.bit(bit_index(sub_op), value);
            }
            BitIHl => {
                let value = self.read_byte_cycle(self.registers.hl());
                self.bit(bit_index(sub_op), value);
            }
            ResR8 => {
                let register = src_reg8(sub_op);
                let value = self.read_reg8(register) & !(1 << bit_index(sub_op));
                self.write_reg8(register, value);
            }
            ResIHl => {
                let hl = self.registers.hl();
                let value = self.read_byte_cycle(hl) & !(1 << bit_index(sub_op));
                self.write_byte_cycle(hl, value);
            }
            SetR8 => {
                let register = src_reg8(sub_op);
                let value = self.read_reg8(register) | (1 << bit_index(sub_op));
                self.write_reg8(register, value);
            }
            SetIHl => {
                let hl = self.registers.hl();
                let value = self.read_byte_cycle(hl) | (1 << bit_index(sub_op));
                self.write_byte_cycle(hl, value);
            }

            _ => unreachable!("Base instruction {:02X} in the prefix table", sub_op),
        }
    }

    fn prefix_on_reg(&mut self, sub_op: u8, operation: fn(&mut Self, u8) -> u8) {
        let register = src_reg8(sub_op);
        let value = self.read_reg8(register);
        let result = operation(self, value);
        self.write_reg8(register, result);
    }

    fn prefix_on_hl(&mut self, operation: fn(&mut Self, u8) -> u8) {
        let hl = self.registers.hl();
        let value = self.read_byte_cycle(hl);
        let result = operation(self, value);
        self.write_byte_cycle(hl, result);
    }

    fn relative_jump(&mut self, offset: u8) {
        self.registers.pc = self.registers.pc.wrapping_add(offset as i8 as i16 as u16);
        self.add_cycles();
    }
}
