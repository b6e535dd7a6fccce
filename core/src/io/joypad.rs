use bitflags::*;

use crate::io::interrupts::{Interrupt, Interrupts};

pub const JOYPAD_REGISTER: u16 = 0xFF00;

/// The eight physical buttons of the handheld.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputKey {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Start,
    Select,
}

bitflags! {
    /// The JOYP register. Everything is active-low: a 0 bit means
    /// "selected"/"pressed".
    #[derive(Default)]
    pub struct JoypadFlags: u8 {
        /// Right or A
        const RIGHT_A    = 0b0000_0001;
        /// Left or B
        const LEFT_B     = 0b0000_0010;
        /// Up or Select
        const UP_SELECT  = 0b0000_0100;
        /// Down or Start
        const DOWN_START = 0b0000_1000;
        /// Select direction keys (active low)
        const DIRECTION_KEYS = 0b0001_0000;
        /// Select button keys (active low)
        const BUTTON_KEYS = 0b0010_0000;
    }
}

/// The 8-button matrix projected through the selector bits of JOYP.
///
/// The register low nibble is recomputed every machine cycle; when any of the
/// four input lines becomes newly asserted (1 -> 0) a joypad interrupt is
/// raised.
#[derive(Debug)]
pub struct JoyPad {
    register: u8,
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    a: bool,
    b: bool,
    start: bool,
    select: bool,
}

impl JoyPad {
    pub fn new() -> Self {
        JoyPad {
            // All lines released, nothing selected.
            register: 0x3F,
            up: false,
            down: false,
            left: false,
            right: false,
            a: false,
            b: false,
            start: false,
            select: false,
        }
    }

    pub fn get_register(&self) -> u8 {
        self.register
    }

    /// Only the two selector bits are writable; the low nibble is owned by
    /// the matrix scan.
    pub fn set_register(&mut self, value: u8) {
        self.register = (self.register & !0x30) | (value & 0x30);
    }

    pub fn set_button(&mut self, key: InputKey, pressed: bool) {
        match key {
            InputKey::Up => self.up = pressed,
            InputKey::Down => self.down = pressed,
            InputKey::Left => self.left = pressed,
            InputKey::Right => self.right = pressed,
            InputKey::A => self.a = pressed,
            InputKey::B => self.b = pressed,
            InputKey::Start => self.start = pressed,
            InputKey::Select => self.select = pressed,
        }
    }

    fn buttons_selected(&self) -> bool {
        self.register & JoypadFlags::BUTTON_KEYS.bits() == 0
    }

    fn directions_selected(&self) -> bool {
        self.register & JoypadFlags::DIRECTION_KEYS.bits() == 0
    }

    /// Rescan the selected rows into the low nibble. Raises the joypad
    /// interrupt for every line that transitions from released to asserted.
    pub fn tick(&mut self, interrupts: &mut Interrupts) {
        let previous = self.register;

        let buttons = self.buttons_selected();
        let directions = self.directions_selected();

        let mut nibble = 0x0F;
        if (buttons && self.a) || (directions && self.right) {
            nibble &= !JoypadFlags::RIGHT_A.bits();
        }
        if (buttons && self.b) || (directions && self.left) {
            nibble &= !JoypadFlags::LEFT_B.bits();
        }
        if (buttons && self.select) || (directions && self.up) {
            nibble &= !JoypadFlags::UP_SELECT.bits();
        }
        if (buttons && self.start) || (directions && self.down) {
            nibble &= !JoypadFlags::DOWN_START.bits();
        }

        self.register = (self.register & 0x30) | nibble;

        // Any newly grounded line fires the interrupt.
        if previous & !self.register & 0x0F != 0 {
            log::trace!("Joypad line asserted: {:02X}", self.register);
            interrupts.request(Interrupt::Joypad);
        }
    }
}

impl Default for JoyPad {
    fn default() -> Self {
        JoyPad::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::interrupts::InterruptFlags;

    #[test]
    fn test_selected_row_reads_low() {
        let mut joypad = JoyPad::new();
        let mut interrupts = Interrupts::default();

        joypad.set_button(InputKey::A, true);
        // Select the button row (active low).
        joypad.set_register(0x10);
        joypad.tick(&mut interrupts);

        assert_eq!(joypad.get_register() & 0x0F, 0x0E);
    }

    #[test]
    fn test_unselected_row_stays_high() {
        let mut joypad = JoyPad::new();
        let mut interrupts = Interrupts::default();

        joypad.set_button(InputKey::A, true);
        // Select the direction row instead.
        joypad.set_register(0x20);
        joypad.tick(&mut interrupts);

        assert_eq!(joypad.get_register() & 0x0F, 0x0F);
        assert!(interrupts.interrupt_flag.is_empty());
    }

    #[test]
    fn test_interrupt_on_new_press_only() {
        let mut joypad = JoyPad::new();
        let mut interrupts = Interrupts::default();

        joypad.set_register(0x10);
        joypad.set_button(InputKey::Start, true);
        joypad.tick(&mut interrupts);
        assert!(interrupts.interrupt_flag.contains(InterruptFlags::JOYPAD));

        // Holding the button must not retrigger.
        interrupts.overwrite_if(0);
        joypad.tick(&mut interrupts);
        assert!(interrupts.interrupt_flag.is_empty());
    }

    #[test]
    fn test_both_rows_or_together() {
        let mut joypad = JoyPad::new();
        let mut interrupts = Interrupts::default();

        joypad.set_button(InputKey::Right, true);
        joypad.set_button(InputKey::B, true);
        // Both rows selected at once.
        joypad.set_register(0x00);
        joypad.tick(&mut interrupts);

        assert_eq!(joypad.get_register() & 0x0F, 0b1100);
    }
}
