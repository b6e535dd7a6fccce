use crate::hardware::mmu::Memory;
use crate::hardware::ppu::tiledata::OAM_SIZE;

/// The OAM DMA engine: once armed by a write to 0xFF46 it moves one byte
/// from `(source_high << 8) | progress` into OAM per machine cycle,
/// finishing after 160 cycles. While it runs the CPU can only reach HRAM.
#[derive(Debug, Default)]
pub struct OamDma {
    active: bool,
    source_high: u8,
    progress: u8,
}

impl OamDma {
    pub fn start(&mut self, source_high: u8) {
        // A new request simply restarts a running transfer.
        self.active = true;
        self.source_high = source_high;
        self.progress = 0;
    }

    pub fn active(&self) -> bool {
        self.active
    }

    /// The last written source page, which is what reads of 0xFF46 return.
    pub fn source_high(&self) -> u8 {
        self.source_high
    }
}

impl Memory {
    /// One machine cycle of DMA work, called from the bus tick.
    pub(super) fn tick_dma(&mut self) {
        if !self.dma.active {
            return;
        }

        let offset = self.dma.progress;
        let source = ((self.dma.source_high as u16) << 8) | offset as u16;
        let value = self.read_byte_bypass(source);
        self.ppu.set_oam_byte_direct(offset, value);

        self.dma.progress += 1;
        if self.dma.progress as usize >= OAM_SIZE {
            self.dma.active = false;
            log::trace!("OAM DMA from page {:02X}00 complete", self.dma.source_high);
        }
    }
}
