//! Machine-cycle plumbing: every bus access the CPU makes, and every
//! internal delay, advances all peripherals by one machine cycle. Keeping
//! the ticks at these boundaries is what phase-locks the PPU, APU, timer and
//! DMA engine to the instruction stream.

use crate::hardware::cpu::CPU;
use crate::hardware::mmu::MemoryMapper;
use crate::io::interrupts::Interrupt;

impl<M: MemoryMapper> CPU<M> {
    /// Advance the machine by one cycle (4 dots).
    pub fn add_cycles(&mut self) {
        self.cycles_performed += 4;
        self.mmu.do_m_cycle();
    }

    /// Based on the current `PC`, interpret the value at that location in
    /// memory as a `u8` value. Advances the `PC` by 1.
    pub fn get_instr_u8(&mut self) -> u8 {
        let result = self.read_byte_cycle(self.registers.pc);
        self.registers.pc = self.registers.pc.wrapping_add(1);

        result
    }

    /// Based on the current `PC`, interpret the `current` and `current + 1`
    /// bytes at those locations in memory as a `u16` value resolved as
    /// little endian (least significant byte first). Advances the `PC` by 2.
    pub fn get_instr_u16(&mut self) -> u16 {
        let least_s_byte = self.get_instr_u8() as u16;
        let most_s_byte = self.get_instr_u8() as u16;

        (most_s_byte << 8) | least_s_byte
    }

    /// Read a byte from the bus and advance the machine by one cycle.
    pub fn read_byte_cycle(&mut self, address: u16) -> u8 {
        self.add_cycles();
        self.mmu.read_byte(address)
    }

    /// Write a byte to the bus and advance the machine by one cycle.
    pub fn write_byte_cycle(&mut self, address: u16, value: u8) {
        self.add_cycles();
        self.mmu.write_byte(address, value);
    }

    /// Read a `u16` from the bus, little endian, costing two cycles.
    pub fn read_short_cycle(&mut self, address: u16) -> u16 {
        let least_s_byte = self.read_byte_cycle(address) as u16;
        let most_s_byte = self.read_byte_cycle(address.wrapping_add(1)) as u16;

        (most_s_byte << 8) | least_s_byte
    }

    /// Write a `u16` to the bus, little endian, costing two cycles.
    pub fn write_short_cycle(&mut self, address: u16, value: u16) {
        self.write_byte_cycle(address, (value & 0xFF) as u8);
        self.write_byte_cycle(address.wrapping_add(1), (value >> 8) as u8);
    }

    pub fn push16(&mut self, value: u16) {
        self.registers.sp = self.registers.sp.wrapping_sub(1);
        self.write_byte_cycle(self.registers.sp, (value >> 8) as u8);
        self.registers.sp = self.registers.sp.wrapping_sub(1);
        self.write_byte_cycle(self.registers.sp, (value & 0xFF) as u8);
    }

    pub fn pop16(&mut self) -> u16 {
        let least_s_byte = self.read_byte_cycle(self.registers.sp) as u16;
        self.registers.sp = self.registers.sp.wrapping_add(1);
        let most_s_byte = self.read_byte_cycle(self.registers.sp) as u16;
        self.registers.sp = self.registers.sp.wrapping_add(1);

        (most_s_byte << 8) | least_s_byte
    }

    /// Interrupt check at the instruction boundary, before the next fetch.
    ///
    /// A pending `IE & IF` bit always lifts HALT, but the service routine
    /// only runs with IME set. Returns `true` when an interrupt was
    /// dispatched this boundary.
    pub fn handle_interrupts(&mut self) -> bool {
        if self.mmu.interrupts().interrupts_pending() {
            self.halted = false;
        }

        if !self.ime {
            return false;
        }

        let interrupt = match self.mmu.interrupts().next_pending() {
            Some(interrupt) => interrupt,
            None => return false,
        };

        self.interrupts_routine(interrupt);
        true
    }

    /// Dispatch `interrupt`: 5 machine cycles in total, mirroring the
    /// hardware's two wait states, the PC push and the vector load.
    pub fn interrupts_routine(&mut self, interrupt: Interrupt) {
        log::trace!("Servicing {:?} interrupt", interrupt);

        self.mmu.interrupts_mut().acknowledge(interrupt);
        self.ime = false;

        self.add_cycles();
        self.add_cycles();
        let pc = self.registers.pc;
        self.push16(pc);
        self.registers.pc = interrupt.vector();
        self.add_cycles();
    }
}
