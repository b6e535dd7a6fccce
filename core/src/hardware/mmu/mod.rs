use crate::hardware::apu::audio_buffer::AudioSink;
use crate::hardware::apu::{APU, APU_MEM_END, APU_MEM_START, WAVE_SAMPLE_END, WAVE_SAMPLE_START};
use crate::hardware::cartridge::Cartridge;
use crate::hardware::mmu::dma::OamDma;
use crate::hardware::mmu::hram::Hram;
use crate::hardware::mmu::wram::Wram;
use crate::hardware::ppu::palette::DisplayColour;
use crate::hardware::ppu::PPU;
use crate::io::interrupts::Interrupts;
use crate::io::joypad::{JoyPad, JOYPAD_REGISTER};
use crate::io::serial::{Serial, SIO_CONT, SIO_DATA};
use crate::io::timer::{TimerRegisters, DIVIDER_REGISTER, TIMER_CONTROL, TIMER_COUNTER, TIMER_MODULO};

pub mod dma;
mod hram;
mod wram;

/// 16 KB ROM bank 00. From cartridge, read-only.
pub const ROM_BANK_00_START: u16 = 0x0000;
pub const ROM_BANK_00_END: u16 = 0x3FFF;
/// 16 KB ROM bank 01..NN, switchable through the memory bank controller.
pub const ROM_BANK_NN_START: u16 = 0x4000;
pub const ROM_BANK_NN_END: u16 = 0x7FFF;
/// 8 KB of VRAM, observable only outside pixel transfer.
pub const VRAM_START: u16 = 0x8000;
pub const VRAM_END: u16 = 0x9FFF;
/// 8 KB of external RAM, in the cartridge, bank-switched if present.
pub const EXTERNAL_RAM_START: u16 = 0xA000;
pub const EXTERNAL_RAM_END: u16 = 0xBFFF;
/// 8 KB of work RAM.
pub const WRAM_START: u16 = 0xC000;
pub const WRAM_END: u16 = 0xDFFF;
/// Mirror of 0xC000..=0xDDFF (ECHO RAM). Typically not used.
pub const ECHO_RAM_START: u16 = 0xE000;
pub const ECHO_RAM_END: u16 = 0xFDFF;
/// Sprite attribute table (OAM).
pub const OAM_ATTRIBUTE_START: u16 = 0xFE00;
pub const OAM_ATTRIBUTE_END: u16 = 0xFE9F;
/// Not usable.
pub const NOT_USABLE_START: u16 = 0xFEA0;
pub const NOT_USABLE_END: u16 = 0xFEFF;
/// I/O registers.
pub const IO_START: u16 = 0xFF00;
pub const IO_END: u16 = 0xFF7F;
/// The flag used to signal that an interrupt is pending (IF).
pub const INTERRUPTS_FLAG: u16 = 0xFF0F;
/// High RAM (HRAM), the only region reachable during OAM DMA.
pub const HRAM_START: u16 = 0xFF80;
pub const HRAM_END: u16 = 0xFFFE;
/// Interrupt enable register (IE).
pub const INTERRUPTS_ENABLE: u16 = 0xFFFF;
/// The value returned for an invalid read.
pub const INVALID_READ: u8 = 0xFF;

/// Byte access plus the machine-cycle fan-out. The CPU is generic over this
/// so its instruction tests can run against a flat memory image.
pub trait MemoryMapper {
    fn read_byte(&self, address: u16) -> u8;
    fn write_byte(&mut self, address: u16, value: u8);
    fn interrupts(&self) -> &Interrupts;
    fn interrupts_mut(&mut self) -> &mut Interrupts;
    /// Perform one machine cycle (4 dots) on every component of the system.
    fn do_m_cycle(&mut self);
}

/// The memory mapper: routes every guest address to the component that owns
/// it and advances all components in lockstep once per machine cycle.
pub struct Memory {
    cartridge: Cartridge,
    pub ppu: PPU,
    pub apu: APU,
    pub hram: Hram,
    pub wram: Wram,
    pub dma: OamDma,

    pub joypad_register: JoyPad,
    pub serial: Serial,
    pub timers: TimerRegisters,
    pub interrupts: Interrupts,
}

impl Memory {
    pub fn new(cartridge: Cartridge, display_colour: DisplayColour, audio_sink: Box<dyn AudioSink>) -> Self {
        Memory {
            cartridge,
            ppu: PPU::new(display_colour),
            apu: APU::new(audio_sink),
            hram: Hram::new(),
            wram: Wram::new(),
            dma: OamDma::default(),
            joypad_register: JoyPad::new(),
            serial: Serial::new(),
            timers: Default::default(),
            interrupts: Default::default(),
        }
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    pub fn read_byte(&self, address: u16) -> u8 {
        // While the DMA engine owns the bus the CPU only reaches HRAM.
        if self.dma.active() && !matches!(address, HRAM_START..=HRAM_END) {
            return INVALID_READ;
        }

        self.read_byte_bypass(address)
    }

    pub fn write_byte(&mut self, address: u16, value: u8) {
        if self.dma.active() && !matches!(address, HRAM_START..=HRAM_END) {
            return;
        }

        self.write_byte_bypass(address, value);
    }

    /// The raw routing table, used by the DMA engine itself and by anything
    /// else that must not observe the DMA bus lock.
    pub fn read_byte_bypass(&self, address: u16) -> u8 {
        match address {
            ROM_BANK_00_START..=ROM_BANK_00_END => self.cartridge.read_0000_3fff(address),
            ROM_BANK_NN_START..=ROM_BANK_NN_END => self.cartridge.read_4000_7fff(address),
            VRAM_START..=VRAM_END => self.ppu.get_vram_byte(address),
            EXTERNAL_RAM_START..=EXTERNAL_RAM_END => self.cartridge.read_external_ram(address),
            WRAM_START..=WRAM_END => self.wram.read_byte(address),
            ECHO_RAM_START..=ECHO_RAM_END => self.wram.read_echo_ram(address),
            OAM_ATTRIBUTE_START..=OAM_ATTRIBUTE_END => self.ppu.get_oam_byte(address),
            NOT_USABLE_START..=NOT_USABLE_END => self.non_usable_call(address),
            IO_START..=IO_END => self.read_io_byte(address),
            HRAM_START..=HRAM_END => self.hram.read_byte(address),
            INTERRUPTS_ENABLE => self.interrupts.interrupt_enable.bits(),
        }
    }

    pub fn write_byte_bypass(&mut self, address: u16, value: u8) {
        match address {
            ROM_BANK_00_START..=ROM_BANK_NN_END => self.cartridge.write_byte(address, value),
            VRAM_START..=VRAM_END => self.ppu.set_vram_byte(address, value),
            EXTERNAL_RAM_START..=EXTERNAL_RAM_END => self.cartridge.write_external_ram(address, value),
            WRAM_START..=WRAM_END => self.wram.set_byte(address, value),
            ECHO_RAM_START..=ECHO_RAM_END => self.wram.write_echo_ram(address, value),
            OAM_ATTRIBUTE_START..=OAM_ATTRIBUTE_END => self.ppu.set_oam_byte(address, value),
            NOT_USABLE_START..=NOT_USABLE_END => {
                log::trace!("Write to non-usable memory: {:04X}", address)
            }
            IO_START..=IO_END => self.write_io_byte(address, value),
            HRAM_START..=HRAM_END => self.hram.set_byte(address, value),
            INTERRUPTS_ENABLE => self.interrupts.overwrite_ie(value),
        }
    }

    /// Specific method for all reads of the I/O registers.
    fn read_io_byte(&self, address: u16) -> u8 {
        use crate::hardware::ppu::*;
        match address {
            JOYPAD_REGISTER => self.joypad_register.get_register(),
            SIO_DATA => self.serial.read_data(),
            SIO_CONT => self.serial.read_control(),
            DIVIDER_REGISTER => self.timers.divider_register(),
            TIMER_COUNTER => self.timers.timer_counter,
            TIMER_MODULO => self.timers.timer_modulo,
            TIMER_CONTROL => self.timers.timer_control(),
            INTERRUPTS_FLAG => self.interrupts.interrupt_flag.bits(),
            APU_MEM_START..=APU_MEM_END => self.apu.read_register(address),
            WAVE_SAMPLE_START..=WAVE_SAMPLE_END => self.apu.read_wave_sample(address),
            LCD_CONTROL_REGISTER => self.ppu.get_lcd_control(),
            LCD_STATUS_REGISTER => self.ppu.get_lcd_status(),
            SCY_REGISTER => self.ppu.get_scy(),
            SCX_REGISTER => self.ppu.get_scx(),
            LY_REGISTER => self.ppu.get_ly(),
            LYC_REGISTER => self.ppu.get_lyc(),
            DMA_TRANSFER => self.dma.source_high(),
            BG_PALETTE => self.ppu.get_bg_palette(),
            OB_PALETTE_0 => self.ppu.get_oam_palette_0(),
            OB_PALETTE_1 => self.ppu.get_oam_palette_1(),
            WY_REGISTER => self.ppu.get_window_y(),
            WX_REGISTER => self.ppu.get_window_x(),
            // Colour-machine registers on the monochrome unit.
            0xFF4D | 0xFF4F | 0xFF55 | 0xFF70 => {
                log::warn!("Read from colour-only register {:04X}", address);
                INVALID_READ
            }
            // Registers with no hardware behind them read open bus.
            _ => {
                log::trace!("Read from unmapped I/O register {:04X}", address);
                INVALID_READ
            }
        }
    }

    /// Specific method for all writes to the I/O registers.
    fn write_io_byte(&mut self, address: u16, value: u8) {
        use crate::hardware::ppu::*;
        match address {
            JOYPAD_REGISTER => self.joypad_register.set_register(value),
            SIO_DATA => self.serial.write_data(value),
            SIO_CONT => self.serial.write_control(value),
            DIVIDER_REGISTER => self.timers.set_divider(),
            TIMER_COUNTER => self.timers.set_timer_counter(value),
            TIMER_MODULO => self.timers.set_tma(value),
            TIMER_CONTROL => self.timers.set_timer_control(value),
            INTERRUPTS_FLAG => self.interrupts.overwrite_if(value),
            APU_MEM_START..=APU_MEM_END => self.apu.write_register(address, value),
            WAVE_SAMPLE_START..=WAVE_SAMPLE_END => self.apu.write_wave_sample(address, value),
            LCD_CONTROL_REGISTER => self.ppu.set_lcd_control(value),
            LCD_STATUS_REGISTER => self.ppu.set_lcd_status(value),
            SCY_REGISTER => self.ppu.set_scy(value),
            SCX_REGISTER => self.ppu.set_scx(value),
            LY_REGISTER => log::debug!("Ignoring write to the read-only LY register"),
            LYC_REGISTER => self.ppu.set_lyc(value, &mut self.interrupts),
            DMA_TRANSFER => self.dma.start(value),
            BG_PALETTE => self.ppu.set_bg_palette(value),
            OB_PALETTE_0 => self.ppu.set_oam_palette_0(value),
            OB_PALETTE_1 => self.ppu.set_oam_palette_1(value),
            WY_REGISTER => self.ppu.set_window_y(value),
            WX_REGISTER => self.ppu.set_window_x(value),
            // Colour-machine registers on the monochrome unit.
            0xFF4D | 0xFF4F | 0xFF51..=0xFF55 | 0xFF68 | 0xFF69 | 0xFF70 => {
                log::warn!("Write to colour-only register {:04X}", address)
            }
            // Registers with no hardware behind them drop the write.
            _ => log::trace!(
                "Write to unmapped I/O register {:04X} with value {:02X}",
                address,
                value
            ),
        }
    }

    /// Simply returns 0xFF while also leaving a note in the log.
    fn non_usable_call(&self, address: u16) -> u8 {
        log::warn!("Accessed non-usable memory: {:04X}", address);
        INVALID_READ
    }
}

impl MemoryMapper for Memory {
    fn read_byte(&self, address: u16) -> u8 {
        self.read_byte(address)
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        self.write_byte(address, value)
    }

    fn interrupts(&self) -> &Interrupts {
        &self.interrupts
    }

    fn interrupts_mut(&mut self) -> &mut Interrupts {
        &mut self.interrupts
    }

    /// The machine-cycle fan-out. The order is fixed: PPU, joypad, timer,
    /// APU, then the DMA engine.
    fn do_m_cycle(&mut self) {
        self.ppu.tick(&mut self.interrupts);
        self.joypad_register.tick(&mut self.interrupts);
        self.timers.tick(&mut self.interrupts);
        self.apu.tick();
        self.tick_dma();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::apu::audio_buffer::NullSink;
    use crate::hardware::cartridge::header::compute_header_checksum;

    fn test_memory() -> Memory {
        let mut rom = vec![0u8; 0x8000];
        rom[0x147] = 0x00;
        rom[0x14D] = compute_header_checksum(&rom);
        let cartridge = Cartridge::new(&rom, None).unwrap();
        Memory::new(cartridge, DisplayColour::default(), Box::new(NullSink))
    }

    #[test]
    fn test_ram_regions_round_trip() {
        let mut memory = test_memory();

        for address in [0xC000u16, 0xDFFF, 0x8000, 0x9FFF, 0xFF80, 0xFFFE].iter() {
            memory.write_byte(*address, 0x5A);
            assert_eq!(memory.read_byte(*address), 0x5A, "address {:04X}", address);
        }
    }

    #[test]
    fn test_echo_ram_mirrors_wram() {
        let mut memory = test_memory();

        memory.write_byte(0xC123, 0x42);
        assert_eq!(memory.read_byte(0xE123), 0x42);

        memory.write_byte(0xF000, 0x99);
        assert_eq!(memory.read_byte(0xD000), 0x99);
    }

    #[test]
    fn test_rom_is_read_only() {
        let mut memory = test_memory();

        memory.write_byte(0x1000, 0x42);
        assert_eq!(memory.read_byte(0x1000), 0x00);
    }

    #[test]
    fn test_unusable_region() {
        let mut memory = test_memory();

        memory.write_byte(0xFEA0, 0x42);
        assert_eq!(memory.read_byte(0xFEA0), INVALID_READ);
        assert_eq!(memory.read_byte(0xFEFF), INVALID_READ);
    }

    #[test]
    fn test_ie_round_trip() {
        let mut memory = test_memory();

        memory.write_byte(0xFFFF, 0x15);
        assert_eq!(memory.read_byte(0xFFFF), 0x15);
    }

    #[test]
    fn test_dma_engine_copies_oam() {
        let mut memory = test_memory();

        for i in 0..0xA0u16 {
            memory.write_byte(0xC100 + i, i as u8);
        }
        memory.write_byte(0xFF46, 0xC1);

        for _ in 0..160 {
            memory.do_m_cycle();
        }
        assert!(!memory.dma.active());

        // OAM may be mode-blocked through the bus; inspect it directly.
        for i in 0..0xA0u8 {
            assert_eq!(memory.ppu.get_oam_byte_unchecked(i), i);
        }
    }

    #[test]
    fn test_dma_locks_the_bus() {
        let mut memory = test_memory();

        memory.write_byte(0xC000, 0x42);
        memory.write_byte(0xFF46, 0xC1);

        assert!(memory.dma.active());
        assert_eq!(memory.read_byte(0xC000), INVALID_READ);
        memory.write_byte(0xC000, 0x99);

        // HRAM stays reachable.
        memory.write_byte(0xFF90, 0x11);
        assert_eq!(memory.read_byte(0xFF90), 0x11);

        for _ in 0..160 {
            memory.do_m_cycle();
        }
        assert_eq!(memory.read_byte(0xC000), 0x42);
    }

    #[test]
    fn test_unmapped_io_registers_are_open_bus() {
        let mut memory = test_memory();

        for address in [0xFF03u16, 0xFF08, 0xFF0E, 0xFF4C, 0xFF50, 0xFF7F].iter() {
            memory.write_byte(*address, 0x42);
            assert_eq!(memory.read_byte(*address), INVALID_READ, "address {:04X}", address);
        }
    }

    #[test]
    fn test_io_dispatch() {
        let mut memory = test_memory();

        memory.write_byte(0xFF47, 0xE4);
        assert_eq!(memory.read_byte(0xFF47), 0xE4);

        memory.write_byte(0xFF42, 0x13);
        assert_eq!(memory.read_byte(0xFF42), 0x13);

        memory.write_byte(0xFF06, 0xAB);
        assert_eq!(memory.read_byte(0xFF06), 0xAB);
    }
}
