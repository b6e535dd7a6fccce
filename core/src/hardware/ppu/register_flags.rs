use bitflags::*;

use crate::hardware::ppu::Mode;

bitflags! {
    /// FF40 -- LCDC. Each bit controls a lot of behaviour and can be
    /// modified at any time during the frame; unlike VRAM the PPU never
    /// locks it.
    #[derive(Default)]
    pub struct LcdControl: u8 {
        /// When cleared, both background and window become blank (white) and
        /// the window display bit is ignored. Only sprites keep drawing.
        const BG_WINDOW_PRIORITY = 0b0000_0001;
        /// Toggles whether sprites are displayed, switchable mid-frame.
        const SPRITE_DISPLAY_ENABLE = 0b0000_0010;
        /// Sprite size: 0 = 8x8, 1 = 8x16 (two stacked tiles).
        const SPRITE_SIZE = 0b0000_0100;
        /// Background tilemap select: 0 = $9800, 1 = $9C00.
        const BG_TILE_MAP_SELECT = 0b0000_1000;
        /// Addressing mode for BG/window tile data: 1 = $8000 unsigned,
        /// 0 = $8800 signed. Sprites always use $8000 addressing.
        const BG_WINDOW_TILE_SELECT = 0b0001_0000;
        /// Whether the window is displayed, overridden by bit 0.
        const WINDOW_DISPLAY = 0b0010_0000;
        /// Window tilemap select: 0 = $9800, 1 = $9C00.
        const WINDOW_MAP_SELECT = 0b0100_0000;
        /// LCD power. Clearing grants immediate full access to VRAM and OAM.
        const LCD_DISPLAY = 0b1000_0000;
    }
}

bitflags! {
    /// FF41 -- STAT. The lower three bits are read only (current mode and
    /// the LY=LYC coincidence flag); the upper ones select which PPU events
    /// raise the LCD-stat interrupt.
    #[derive(Default)]
    pub struct LcdStatus: u8 {
        /// Mode flag bit 0 (read only).
        const MODE_FLAG_0 = 0b0000_0001;
        /// Mode flag bit 1 (read only).
        const MODE_FLAG_1 = 0b0000_0010;
        /// 1 when LY == LYC (read only).
        const COINCIDENCE_FLAG = 0b0000_0100;
        /// Mode 0 H-Blank interrupt enable.
        const MODE_0_H_INTERRUPT = 0b0000_1000;
        /// Mode 1 V-Blank interrupt enable.
        const MODE_1_V_INTERRUPT = 0b0001_0000;
        /// Mode 2 OAM interrupt enable.
        const MODE_2_OAM_INTERRUPT = 0b0010_0000;
        /// LY=LYC coincidence interrupt enable.
        const COINCIDENCE_INTERRUPT = 0b0100_0000;
    }
}

bitflags! {
    /// The attribute byte of an OAM entry.
    #[derive(Default)]
    pub struct AttributeFlags: u8 {
        /// 0 = OBP0, 1 = OBP1.
        const PALETTE_NUMBER = 0b0001_0000;
        /// 0 = normal, 1 = horizontally mirrored.
        const X_FLIP = 0b0010_0000;
        /// 0 = normal, 1 = vertically mirrored.
        const Y_FLIP = 0b0100_0000;
        /// 0 = sprite above BG, 1 = sprite behind BG colours 1-3.
        /// BG colour 0 is always behind the sprite.
        const OBJ_TO_BG_PRIORITY = 0b1000_0000;
    }
}

impl LcdStatus {
    pub fn mode_flag(&self) -> Mode {
        match self.bits & 0x3 {
            0 => Mode::HBlank,
            1 => Mode::VBlank,
            2 => Mode::OamSearch,
            3 => Mode::LcdTransfer,
            _ => unreachable!("Invalid value entered for mode flag"),
        }
    }

    pub fn set_mode_flag(&mut self, value: Mode) {
        self.bits = (self.bits & 0xFC)
            | match value {
                Mode::HBlank => 0,
                Mode::VBlank => 1,
                Mode::OamSearch => 2,
                Mode::LcdTransfer => 3,
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_flag_round_trip() {
        let mut status = LcdStatus::default();
        for mode in [Mode::HBlank, Mode::VBlank, Mode::OamSearch, Mode::LcdTransfer].iter() {
            status.set_mode_flag(*mode);
            assert_eq!(status.mode_flag(), *mode);
        }
    }

    #[test]
    fn test_mode_flag_preserves_interrupt_bits() {
        let mut status = LcdStatus::MODE_2_OAM_INTERRUPT | LcdStatus::COINCIDENCE_INTERRUPT;
        status.set_mode_flag(Mode::LcdTransfer);
        assert!(status.contains(LcdStatus::MODE_2_OAM_INTERRUPT));
        assert!(status.contains(LcdStatus::COINCIDENCE_INTERRUPT));
    }
}
