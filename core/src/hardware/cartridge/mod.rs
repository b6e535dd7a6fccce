use std::fmt;
use std::fmt::{Debug, Formatter};

use thiserror::Error;

use crate::hardware::cartridge::header::CartridgeHeader;
use crate::hardware::cartridge::mbc::{CartMemory, Mbc};

pub mod header;
pub mod mbc;

#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("ROM image of {0} bytes is too small to contain a header")]
    RomTooSmall(usize),
    #[error("unsupported cartridge type: {0:#04X}")]
    UnsupportedCartridgeType(u8),
    #[error("unknown ROM size code: {0:#04X}")]
    UnknownRomSize(u8),
    #[error("unknown RAM size code: {0:#04X}")]
    UnknownRamSize(u8),
}

/// A cartridge: the ROM image, optional battery backed external RAM, and the
/// bank controller that maps both into the guest address space.
pub struct Cartridge {
    header: CartridgeHeader,
    memory: CartMemory,
    mbc: Mbc,
}

impl Cartridge {
    pub fn new(rom: &[u8], saved_ram: Option<Vec<u8>>) -> Result<Self, CartridgeError> {
        let header = CartridgeHeader::parse(rom)?;

        log::info!("Loaded cartridge [{}]", header.title);
        log::info!("Memory bank controller: {}", header.mbc_kind.name());
        log::info!(
            "ROM size: {} bytes, RAM size: {} bytes",
            header.rom_size(),
            header.ram_size
        );
        if header.checksum_valid(rom) {
            log::info!("Header checksum valid");
        } else {
            log::warn!(
                "Header checksum mismatch, expected {:#04X}",
                header.header_checksum
            );
        }

        let memory = CartMemory::new(rom.to_vec(), &header, saved_ram);
        let mbc = Mbc::new(header.mbc_kind);

        Ok(Cartridge { header, memory, mbc })
    }

    pub fn cartridge_header(&self) -> &CartridgeHeader {
        &self.header
    }

    /// The external RAM contents, for hosts that persist battery backed saves.
    pub fn battery_ram(&self) -> Option<&[u8]> {
        if self.header.has_battery {
            Some(&self.memory.ram)
        } else {
            None
        }
    }

    pub fn read_0000_3fff(&self, address: u16) -> u8 {
        self.mbc.read_rom_low(&self.memory, address)
    }

    pub fn read_4000_7fff(&self, address: u16) -> u8 {
        self.mbc.read_rom_high(&self.memory, address)
    }

    pub fn read_external_ram(&self, address: u16) -> u8 {
        self.mbc.read_ram(&self.memory, address)
    }

    pub fn write_external_ram(&mut self, address: u16, value: u8) {
        self.mbc.write_ram(&mut self.memory, address, value);
    }

    /// A write into ROM space drives the controller latches.
    pub fn write_byte(&mut self, address: u16, value: u8) {
        self.mbc.write_rom(address, value);
    }
}

impl Debug for Cartridge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Cartridge {{ header: {:?} }}", self.header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::cartridge::header::compute_header_checksum;

    fn plain_rom() -> Vec<u8> {
        let mut rom = vec![0u8; 0x8000];
        rom[0x147] = 0x00;
        rom[0x14D] = compute_header_checksum(&rom);
        rom
    }

    #[test]
    fn test_plain_cartridge_loads() {
        let cartridge = Cartridge::new(&plain_rom(), None).unwrap();
        assert_eq!(cartridge.read_0000_3fff(0x0000), 0);
        assert!(cartridge.battery_ram().is_none());
    }

    #[test]
    fn test_unknown_type_is_fatal() {
        let mut rom = plain_rom();
        rom[0x147] = 0x22;
        assert!(matches!(
            Cartridge::new(&rom, None),
            Err(CartridgeError::UnsupportedCartridgeType(0x22))
        ));
    }

    #[test]
    fn test_rom_writes_do_not_stick() {
        let mut cartridge = Cartridge::new(&plain_rom(), None).unwrap();
        cartridge.write_byte(0x1234, 0x99);
        assert_eq!(cartridge.read_0000_3fff(0x1234), 0x00);
    }

    #[test]
    fn test_battery_ram_surfaces() {
        let mut rom = plain_rom();
        // MBC1 + RAM + battery, one 8 KB bank.
        rom[0x147] = 0x03;
        rom[0x149] = 0x02;
        rom[0x14D] = compute_header_checksum(&rom);

        let mut cartridge = Cartridge::new(&rom, None).unwrap();
        cartridge.write_byte(0x0000, 0x0A);
        cartridge.write_external_ram(0xA010, 0x42);

        assert_eq!(cartridge.battery_ram().unwrap()[0x10], 0x42);
    }
}
