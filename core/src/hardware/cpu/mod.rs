use crate::hardware::cpu::instructions::{descriptor_for, prefix_descriptor_for, Instruction};
use crate::hardware::mmu::{MemoryMapper, VRAM_END, VRAM_START};
use crate::hardware::registers::Registers;

mod alu;
mod execute;
mod fetch;
pub mod instructions;

#[cfg(test)]
mod tests;

/// The LR35902 interpreter. Generic over its memory mapper so the
/// instruction tests can drive it against a flat memory image.
pub struct CPU<M: MemoryMapper> {
    pub registers: Registers,
    pub mmu: M,
    halted: bool,
    /// Interrupt master enable; gates servicing, never the IF bits.
    ime: bool,
    pub cycles_performed: u64,
    tracing: bool,
}

impl<M: MemoryMapper> CPU<M> {
    pub fn new(mmu: M) -> Self {
        CPU {
            registers: Registers::new(),
            mmu,
            halted: false,
            ime: false,
            cycles_performed: 0,
            tracing: false,
        }
    }

    /// Execute exactly one instruction, or service one pending interrupt, or
    /// burn one machine cycle while halted.
    pub fn step_instruction(&mut self) {
        if let VRAM_START..=VRAM_END = self.registers.pc {
            panic!(
                "Executing code from VRAM, the program has run away: {}",
                self.registers
            );
        }

        if self.handle_interrupts() {
            return;
        }

        if self.halted {
            self.add_cycles();
            return;
        }

        let instruction_start = self.registers.pc;
        let opcode = self.get_instr_u8();

        if opcode == 0xCB {
            let sub_op = self.get_instr_u8();
            if self.tracing {
                self.trace_instruction(instruction_start, opcode, Some(sub_op));
            }
            self.execute_prefix(sub_op);
        } else {
            if self.tracing {
                self.trace_instruction(instruction_start, opcode, None);
            }
            self.execute(opcode);
        }
    }

    /// `halt until interrupt occurs (low power)`
    fn halt(&mut self) {
        self.halted = true;
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    pub fn ime(&self) -> bool {
        self.ime
    }

    /// Emit one `PC / opcode / mnemonic` line per executed instruction.
    pub fn set_tracing(&mut self, tracing: bool) {
        self.tracing = tracing;
    }

    fn trace_instruction(&self, pc: u16, opcode: u8, sub_op: Option<u8>) {
        let descriptor = match sub_op {
            Some(sub_op) => prefix_descriptor_for(sub_op),
            None => descriptor_for(opcode),
        };
        match sub_op {
            Some(sub_op) => log::trace!("{:#06x}: 0xCB {:#04x} {}", pc, sub_op, descriptor.mnemonic),
            None => log::trace!("{:#06x}: {:#04x}      {}", pc, opcode, descriptor.mnemonic),
        }
    }

    /// Fatal exit for opcodes the hardware does not define (or STOP, which
    /// this machine never enters). Dumps the register file alongside.
    fn fatal_instruction(&mut self, opcode: u8, sub_op: Option<u8>) -> ! {
        let rendered = Instruction {
            opcode,
            sub_op,
            imm8: None,
            imm16: None,
        };
        panic!(
            "Encountered unusable instruction {} at {}",
            rendered.describe(),
            self.registers
        );
    }
}
