use bitflags::*;

/// The five interrupt sources in service priority order (lowest bit first).
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq)]
pub enum Interrupt {
    VBlank = 0b0000_0001,
    LcdStat = 0b0000_0010,
    Timer = 0b0000_0100,
    Serial = 0b0000_1000,
    Joypad = 0b0001_0000,
}

impl Interrupt {
    pub fn iter() -> impl Iterator<Item = Interrupt> {
        use Interrupt::*;
        [VBlank, LcdStat, Timer, Serial, Joypad].iter().copied()
    }

    /// The address the CPU jumps to when servicing this interrupt.
    pub fn vector(self) -> u16 {
        match self {
            Interrupt::VBlank => 0x40,
            Interrupt::LcdStat => 0x48,
            Interrupt::Timer => 0x50,
            Interrupt::Serial => 0x58,
            Interrupt::Joypad => 0x60,
        }
    }
}

bitflags! {
    #[derive(Default)]
    pub struct InterruptFlags: u8 {
        /// V-Blank
        const VBLANK = 0b0000_0001;
        /// LCD Stat
        const LCD    = 0b0000_0010;
        /// Timer
        const TIMER  = 0b0000_0100;
        /// Serial
        const SERIAL = 0b0000_1000;
        /// Joypad
        const JOYPAD = 0b0001_0000;
    }
}

/// The IE (0xFFFF) and IF (0xFF0F) register pair.
#[derive(Default, Debug, Clone)]
pub struct Interrupts {
    pub interrupt_enable: InterruptFlags,
    pub interrupt_flag: InterruptFlags,
}

impl Interrupts {
    pub fn request(&mut self, interrupt: Interrupt) {
        self.interrupt_flag
            .insert(InterruptFlags::from_bits_truncate(interrupt as u8));
    }

    pub fn insert_interrupt(&mut self, interrupt: InterruptFlags) {
        self.interrupt_flag.insert(interrupt);
    }

    pub fn overwrite_if(&mut self, value: u8) {
        self.interrupt_flag = InterruptFlags::from_bits_truncate(value);
    }

    pub fn overwrite_ie(&mut self, value: u8) {
        self.interrupt_enable = InterruptFlags::from_bits_truncate(value);
    }

    /// Check that `IF != 0` and that the corresponding bit is also set in `IE`.
    pub fn interrupts_pending(&self) -> bool {
        !(self.interrupt_flag & self.interrupt_enable).is_empty()
    }

    /// Returns the pending interrupt with the lowest bit number, if any.
    pub fn next_pending(&self) -> Option<Interrupt> {
        let pending = self.interrupt_flag & self.interrupt_enable;
        Interrupt::iter().find(|i| !(InterruptFlags::from_bits_truncate(*i as u8) & pending).is_empty())
    }

    /// Acknowledge `interrupt` by clearing its IF bit.
    pub fn acknowledge(&mut self, interrupt: Interrupt) {
        self.interrupt_flag
            .remove(InterruptFlags::from_bits_truncate(interrupt as u8));
    }
}
