//! IC32: the 74LS259 addressable latch on System VIA port B.
//!
//! PB0-PB2 select one of the eight latch outputs and PB3 is the value
//! written to it. The outputs gate the slow data bus and carry some video
//! and LED state:
//!
//! | Bit | Output                                        |
//! |-----|-----------------------------------------------|
//! | 0   | Sound chip write enable (active low)          |
//! | 1   | Speech processor read select (active low)     |
//! | 2   | Speech processor write select (active low)    |
//! | 3   | Keyboard auto-scan enable (1 = auto-scan)     |
//! | 4   | Screen size C0                                |
//! | 5   | Screen size C1                                |
//! | 6   | Caps lock LED (active low)                    |
//! | 7   | Shift lock LED (active low)                   |

pub const SOUND_DISABLE: u8 = 0x01;
pub const SPEECH_READ: u8 = 0x02;
pub const SPEECH_WRITE: u8 = 0x04;
pub const KEYBOARD_AUTOSCAN: u8 = 0x08;
pub const SCREEN_C0: u8 = 0x10;
pub const SCREEN_C1: u8 = 0x20;
pub const CAPS_LOCK_OFF: u8 = 0x40;
pub const SHIFT_LOCK_OFF: u8 = 0x80;

/// Screen wrap length in bytes for each screen size code.
const WRAP_LENGTHS: [u16; 4] = [0x4000, 0x5000, 0x2000, 0x2800];

/// Keyboard LEDs driven from IC32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Led {
    CapsLock,
    ShiftLock,
}

/// The latch contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ic32(u8);

impl Ic32 {
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Apply a port B write: bits 0-2 address the latch bit, bit 3 is the
    /// value stored in it.
    pub fn write(&mut self, pins: u8) {
        let bit = pins & 0x07;
        let set = pins & 0x08 != 0;
        log::trace!("IC32 bit {bit} = {}: {}", u8::from(set), describe(bit, set));
        if set {
            self.0 |= 1 << bit;
        } else {
            self.0 &= !(1 << bit);
        }
    }

    /// True while the sound chip write enable is asserted (bit 0 low).
    #[must_use]
    pub const fn sound_enabled(self) -> bool {
        self.0 & SOUND_DISABLE == 0
    }

    /// True while the keyboard scans itself (bit 3 high).
    #[must_use]
    pub const fn keyboard_autoscan(self) -> bool {
        self.0 & KEYBOARD_AUTOSCAN != 0
    }

    /// Screen size code: C0 weighs 2, C1 weighs 1.
    #[must_use]
    pub const fn screen_size(self) -> u8 {
        ((self.0 & SCREEN_C0) >> 3) | ((self.0 & SCREEN_C1) >> 5)
    }

    /// LED state. Both LEDs are lit while their bit is low.
    #[must_use]
    pub const fn led(self, led: Led) -> bool {
        let mask = match led {
            Led::CapsLock => CAPS_LOCK_OFF,
            Led::ShiftLock => SHIFT_LOCK_OFF,
        };
        self.0 & mask == 0
    }
}

/// Hardware scroll wrap length in bytes for a screen size code.
#[must_use]
pub const fn wrap_length(screen_size: u8) -> u16 {
    WRAP_LENGTHS[(screen_size & 0x03) as usize]
}

fn describe(bit: u8, set: bool) -> &'static str {
    match (bit, set) {
        (0, false) => "sound chip write enabled",
        (0, true) => "sound chip write disabled",
        (1, false) => "speech read selected",
        (1, true) => "speech read deselected",
        (2, false) => "speech write selected",
        (2, true) => "speech write deselected",
        (3, false) => "keyboard auto-scan off",
        (3, true) => "keyboard auto-scan on",
        (4, false) => "screen size C0 = 0",
        (4, true) => "screen size C0 = 1",
        (5, false) => "screen size C1 = 0",
        (5, true) => "screen size C1 = 1",
        (6, false) => "caps lock LED on",
        (6, true) => "caps lock LED off",
        (7, false) => "shift lock LED on",
        _ => "shift lock LED off",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptions_carry_the_new_value() {
        for bit in 0..8 {
            assert_ne!(describe(bit, false), describe(bit, true), "bit {bit}");
        }
        assert_eq!(describe(5, true), "screen size C1 = 1");
    }

    #[test]
    fn write_addresses_single_bits() {
        let mut ic32 = Ic32::new();
        ic32.write(0x08 | 3);
        ic32.write(0x08 | 7);
        assert_eq!(ic32.value(), 0x88);
        ic32.write(3);
        assert_eq!(ic32.value(), 0x80);
    }

    #[test]
    fn upper_pins_are_ignored() {
        let mut ic32 = Ic32::new();
        ic32.write(0xF8);
        assert_eq!(ic32.value(), 0x01);
    }

    #[test]
    fn screen_size_codes() {
        let mut ic32 = Ic32::new();
        assert_eq!(ic32.screen_size(), 0);
        ic32.write(0x0D); // C1
        assert_eq!(ic32.screen_size(), 1);
        ic32.write(0x0C); // C0
        assert_eq!(ic32.screen_size(), 3);
        ic32.write(0x05);
        assert_eq!(ic32.screen_size(), 2);
    }

    #[test]
    fn wrap_lengths_follow_size_code() {
        assert_eq!(wrap_length(0), 0x4000);
        assert_eq!(wrap_length(1), 0x5000);
        assert_eq!(wrap_length(2), 0x2000);
        assert_eq!(wrap_length(3), 0x2800);
    }

    #[test]
    fn leds_are_active_low() {
        let mut ic32 = Ic32::new();
        assert!(ic32.led(Led::CapsLock));
        assert!(ic32.led(Led::ShiftLock));
        ic32.write(0x0E);
        assert!(!ic32.led(Led::CapsLock));
        assert!(ic32.led(Led::ShiftLock));
    }
}
